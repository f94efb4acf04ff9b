//! Buzzer feedback at lifecycle milestones.
//!
//! Chimes are fixed note sequences played synchronously through any
//! [`ToneOutput`]. They run only before the control loop starts or after
//! it stops, never inside a cycle.

use embedded_hal::delay::DelayNs;

use crate::traits::ToneOutput;

/// One note: frequency (0 = rest) and duration.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Note {
    /// Tone frequency in Hz; 0 is a rest.
    pub freq_hz: u32,
    /// How long the note lasts.
    pub duration_ms: u32,
}

impl Note {
    /// Creates a note.
    pub const fn new(freq_hz: u32, duration_ms: u32) -> Self {
        Self {
            freq_hz,
            duration_ms,
        }
    }

    /// Creates a rest.
    pub const fn rest(duration_ms: u32) -> Self {
        Self::new(0, duration_ms)
    }
}

const BEEP_HZ: u32 = 2000;

const BOOT: &[Note] = &[Note::new(BEEP_HZ, 100)];
const READY: &[Note] = &[Note::new(BEEP_HZ, 500)];
// C5 E5 G5 C6
const STARTUP: &[Note] = &[
    Note::new(523, 120),
    Note::new(659, 120),
    Note::new(784, 120),
    Note::new(1047, 240),
];
const FAULT: &[Note] = &[Note::new(440, 200), Note::rest(100), Note::new(440, 200)];

/// Named feedback patterns.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Chime {
    /// Short beep when power comes up.
    Boot,
    /// Rising arpeggio after peripherals initialize.
    Startup,
    /// Long beep when calibration finishes and the loop is about to start.
    Ready,
    /// Double low beep on a sensor fault.
    Fault,
}

impl Chime {
    /// The notes of this chime.
    pub const fn notes(self) -> &'static [Note] {
        match self {
            Chime::Boot => BOOT,
            Chime::Startup => STARTUP,
            Chime::Ready => READY,
            Chime::Fault => FAULT,
        }
    }

    /// Total playing time.
    pub fn duration_ms(self) -> u32 {
        self.notes().iter().map(|n| n.duration_ms).sum()
    }

    /// Plays the chime, blocking for its duration, and leaves the output silent.
    pub fn play<T: ToneOutput, D: DelayNs>(self, tone: &mut T, delay: &mut D) -> Result<(), T::Error> {
        for note in self.notes() {
            tone.tone(note.freq_hz)?;
            delay.delay_ms(note.duration_ms);
        }
        tone.silence()
    }
}
