//! Hardware abstraction traits for the sensor array, drive motors, and peripherals.
//!
//! This module defines the hardware interfaces that let speedybee run the
//! same control loop on the robot (ESP32) and on the desktop (mocks).
//!
//! # Key Traits
//!
//! | Trait | Purpose |
//! |-------|---------|
//! | [`LineSensor`] | Calibrated line position from a reflectance array |
//! | [`DifferentialDrive`] | Signed speed commands to the two wheels |
//! | [`ButtonSource`] | Button events from the expander |
//! | [`MenuHandler`] | Consumer of button events |
//! | [`ToneOutput`] | Buzzer tones for audible feedback |
//! | [`MotionSensor`] | Accelerometer and gyroscope samples |
//! | [`Clock`] | Time source for `no_std` environments |
//!
//! # Implementation
//!
//! For testing and desktop development, use the mock implementations
//! from [`crate::hal::mock`]. For ESP32 hardware, use the
//! implementations from `hal::esp32` (requires `esp32` feature).
//!
//! # Example
//!
//! ```rust
//! use speedybee::traits::DifferentialDrive;
//! use speedybee::hal::MockDrive;
//!
//! let mut drive = MockDrive::new();
//! drive.drive(80, -20).unwrap();
//! assert_eq!(drive.last(), Some((80, -20)));
//!
//! drive.stop().unwrap();
//! assert_eq!(drive.last(), Some((0, 0)));
//! ```

use heapless::Vec as HVec;

use crate::sensor::MAX_CHANNELS;

/// Rotation direction of one wheel.
///
/// Selects the H-bridge input polarity for that motor channel.
///
/// # Default
///
/// Defaults to [`Stopped`](Self::Stopped) for safety.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum Direction {
    /// Wheel turns to drive the robot forward.
    Forward,
    /// Wheel turns to drive the robot backward.
    Reverse,
    /// Both bridge inputs held low.
    #[default]
    Stopped,
}

impl Direction {
    /// Returns the direction as a lowercase string.
    ///
    /// ```
    /// use speedybee::Direction;
    ///
    /// assert_eq!(Direction::Forward.as_str(), "forward");
    /// assert_eq!(Direction::Reverse.as_str(), "reverse");
    /// assert_eq!(Direction::Stopped.as_str(), "stopped");
    /// ```
    #[inline]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Direction::Forward => "forward",
            Direction::Reverse => "reverse",
            Direction::Stopped => "stopped",
        }
    }
}

/// One reading of the reflectance array.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LineReading {
    /// Weighted-centroid line position, `0..=(channels - 1) * 1000`.
    pub position: u16,
    /// Calibrated intensity per channel, `0..=1000`.
    pub intensities: HVec<u16, MAX_CHANNELS>,
}

/// Line position source - abstracts a calibrated reflectance array.
///
/// # Implementation Notes
///
/// - `calibrate()` performs `samples` read cycles and tracks per-channel
///   min/max; the robot should be swept across the line meanwhile
/// - `read_line()` must report positions on the same scale and sign
///   convention the controller assumes (channel 0 is the right-most sensor)
pub trait LineSensor {
    /// Error type for sensor reads.
    type Error;

    /// Number of channels in the array.
    fn channel_count(&self) -> usize;

    /// Runs `samples` calibration read cycles.
    fn calibrate(&mut self, samples: u16) -> Result<(), Self::Error>;

    /// Reads the current line position and per-channel intensities.
    fn read_line(&mut self) -> Result<LineReading, Self::Error>;
}

/// Two-wheel drive - abstracts an H-bridge with one PWM channel per wheel.
///
/// Sign selects rotation direction, magnitude sets duty cycle. Commands
/// take effect immediately; there is no ramping.
///
/// # Example Implementation
///
/// ```rust,ignore
/// use speedybee::traits::DifferentialDrive;
///
/// struct MyBridge { /* pin handles */ }
///
/// impl DifferentialDrive for MyBridge {
///     type Error = ();
///
///     fn drive(&mut self, left: i32, right: i32) -> Result<(), ()> {
///         // Set direction pins from sign, PWM duty from magnitude...
///         Ok(())
///     }
/// }
/// ```
pub trait DifferentialDrive {
    /// Error type for motor operations.
    type Error;

    /// Commands both wheels. Callers pre-clamp to the supported range.
    fn drive(&mut self, left: i32, right: i32) -> Result<(), Self::Error>;

    /// Convenience method to stop both wheels.
    fn stop(&mut self) -> Result<(), Self::Error> {
        self.drive(0, 0)
    }
}

/// Buttons wired to the expander.
///
/// Pins 0..5 of the expander's port A, in order.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Keypad {
    /// Keypad key 1 (pin 0).
    Key1,
    /// Keypad key 2 (pin 1).
    Key2,
    /// Keypad key 3 (pin 2).
    Key3,
    /// Keypad key 4 (pin 3).
    Key4,
    /// Push button 0 (pin 4).
    Btn0,
    /// Push button 1 (pin 5).
    Btn1,
}

impl Keypad {
    /// Maps an expander pin number to its button.
    ///
    /// ```
    /// use speedybee::Keypad;
    ///
    /// assert_eq!(Keypad::from_pin(0), Some(Keypad::Key1));
    /// assert_eq!(Keypad::from_pin(5), Some(Keypad::Btn1));
    /// assert_eq!(Keypad::from_pin(6), None);
    /// ```
    pub const fn from_pin(pin: u8) -> Option<Self> {
        match pin {
            0 => Some(Keypad::Key1),
            1 => Some(Keypad::Key2),
            2 => Some(Keypad::Key3),
            3 => Some(Keypad::Key4),
            4 => Some(Keypad::Btn0),
            5 => Some(Keypad::Btn1),
            _ => None,
        }
    }

    /// Expander pin the button is wired to.
    pub const fn pin(self) -> u8 {
        match self {
            Keypad::Key1 => 0,
            Keypad::Key2 => 1,
            Keypad::Key3 => 2,
            Keypad::Key4 => 3,
            Keypad::Btn0 => 4,
            Keypad::Btn1 => 5,
        }
    }
}

/// Button event source polled once per loop cycle.
pub trait ButtonSource {
    /// Error type for bus transactions.
    type Error;

    /// Returns the button behind a pending interrupt, clearing it.
    ///
    /// Returns `Ok(None)` when nothing is pending.
    fn poll_button(&mut self) -> Result<Option<Keypad>, Self::Error>;
}

/// Consumer of button events.
///
/// Runs outside the control loop; it never sees controller state.
pub trait MenuHandler {
    /// Handles one button press.
    fn on_button(&mut self, key: Keypad);
}

/// Square-wave tone output (buzzer).
pub trait ToneOutput {
    /// Error type for PWM operations.
    type Error;

    /// Starts a tone at `freq_hz`. Zero silences the output.
    fn tone(&mut self, freq_hz: u32) -> Result<(), Self::Error>;

    /// Silences the output.
    fn silence(&mut self) -> Result<(), Self::Error> {
        self.tone(0)
    }
}

/// Raw inertial sample in sensor register units.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ImuSample {
    /// Accelerometer X, Y, Z.
    pub accel: [i16; 3],
    /// Gyroscope X, Y, Z.
    pub gyro: [i16; 3],
    /// Die temperature in degrees Celsius.
    pub temperature_c: f32,
}

/// Accelerometer/gyroscope source.
pub trait MotionSensor {
    /// Error type for bus transactions.
    type Error;

    /// Reads one sample.
    fn read_sample(&mut self) -> Result<ImuSample, Self::Error>;
}

/// Time source trait for `no_std` compatibility.
///
/// Provides monotonic time in milliseconds for loop timing.
///
/// ```rust
/// use speedybee::traits::Clock;
/// use speedybee::hal::MockClock;
///
/// let mut clock = MockClock::new();
/// assert_eq!(clock.now_ms(), 0);
///
/// clock.advance(100);
/// assert_eq!(clock.now_ms(), 100);
/// ```
pub trait Clock {
    /// Returns current time in milliseconds since an arbitrary epoch.
    ///
    /// Must be monotonically increasing.
    fn now_ms(&self) -> u64;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn direction_default() {
        assert_eq!(Direction::default(), Direction::Stopped);
    }

    #[test]
    fn keypad_pin_mapping_round_trips() {
        for pin in 0..6 {
            let key = Keypad::from_pin(pin).unwrap();
            assert_eq!(key.pin(), pin);
        }
        assert_eq!(Keypad::from_pin(255), None);
    }

    struct TestDrive {
        last: (i32, i32),
        calls: usize,
    }

    impl DifferentialDrive for TestDrive {
        type Error = ();

        fn drive(&mut self, left: i32, right: i32) -> Result<(), ()> {
            self.last = (left, right);
            self.calls += 1;
            Ok(())
        }
    }

    #[test]
    fn drive_stop_default_impl() {
        let mut drive = TestDrive {
            last: (0, 0),
            calls: 0,
        };
        drive.drive(50, 70).unwrap();
        drive.stop().unwrap();

        assert_eq!(drive.last, (0, 0));
        assert_eq!(drive.calls, 2);
    }

    struct TestTone {
        freq: u32,
    }

    impl ToneOutput for TestTone {
        type Error = ();

        fn tone(&mut self, freq_hz: u32) -> Result<(), ()> {
            self.freq = freq_hz;
            Ok(())
        }
    }

    #[test]
    fn tone_silence_default_impl() {
        let mut buzzer = TestTone { freq: 0 };
        buzzer.tone(440).unwrap();
        assert_eq!(buzzer.freq, 440);

        buzzer.silence().unwrap();
        assert_eq!(buzzer.freq, 0);
    }
}
