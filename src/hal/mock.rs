//! Mock implementations for testing without hardware.
//!
//! This module provides test doubles for every hardware trait, enabling
//! development and testing of the control loop on the desktop.
//!
//! # Available Mocks
//!
//! | Mock | Trait | Purpose |
//! |------|-------|---------|
//! | [`MockLineSensor`] | [`LineSensor`] | Queued positions, injectable read failure |
//! | [`MockReflectance`] | [`ReflectanceReader`] | Queued raw channel frames |
//! | [`MockDrive`] | [`DifferentialDrive`] | Records every wheel command |
//! | [`MockButtons`] | [`ButtonSource`] | Queued key presses |
//! | [`MockTone`] | [`ToneOutput`] | Records buzzer frequencies |
//! | [`MockDisplay`] | [`StatusDisplay`] | Records messages and sensor renders |
//! | [`MockClock`] | [`Clock`] | Controllable time source |
//! | [`MockDelay`] | [`DelayNs`] | Sums requested delays without sleeping |
//! | [`MockI2c`] | [`I2c`] | Records writes, replays queued reads |
//! | [`MockInputPin`] | [`InputPin`] | Settable level, counts reads |
//!
//! # Example
//!
//! ```rust
//! use speedybee::{LineFollower, RobotConfig};
//! use speedybee::hal::{MockDrive, MockLineSensor};
//!
//! let mut sensor = MockLineSensor::new(5);
//! sensor.queue_positions(&[2000, 2600]);
//!
//! let mut robot = LineFollower::new(sensor, MockDrive::new(), RobotConfig::default()).unwrap();
//! robot.step().unwrap();
//! robot.step().unwrap();
//!
//! assert_eq!(robot.drive().commands.len(), 2);
//! ```
//!
//! [`LineSensor`]: crate::traits::LineSensor
//! [`ReflectanceReader`]: crate::sensor::ReflectanceReader
//! [`DifferentialDrive`]: crate::traits::DifferentialDrive
//! [`ButtonSource`]: crate::traits::ButtonSource
//! [`ToneOutput`]: crate::traits::ToneOutput
//! [`StatusDisplay`]: crate::traits::StatusDisplay
//! [`Clock`]: crate::traits::Clock
//! [`DelayNs`]: embedded_hal::delay::DelayNs
//! [`I2c`]: embedded_hal::i2c::I2c
//! [`InputPin`]: embedded_hal::digital::InputPin

extern crate alloc;
use alloc::collections::VecDeque;
use alloc::string::String;
use alloc::vec::Vec;

use embedded_hal::delay::DelayNs;
use embedded_hal::digital::{self, InputPin};
use embedded_hal::i2c::{self, ErrorKind, NoAcknowledgeSource, Operation};
use heapless::Vec as HVec;

use crate::sensor::{ReflectanceReader, POSITION_STEP};
use crate::traits::{
    ButtonSource, Clock, DifferentialDrive, Keypad, LineReading, LineSensor, StatusDisplay,
    ToneOutput,
};

// ============================================================================
// Sensor Mocks
// ============================================================================

/// Mock line sensor returning queued positions.
///
/// Positions come out in FIFO order. Once the queue is empty the last
/// position repeats (initially the array center).
///
/// # Example
///
/// ```rust
/// use speedybee::hal::MockLineSensor;
/// use speedybee::traits::LineSensor;
///
/// let mut sensor = MockLineSensor::new(5);
/// sensor.queue_positions(&[1000, 3000]);
///
/// assert_eq!(sensor.read_line().unwrap().position, 1000);
/// assert_eq!(sensor.read_line().unwrap().position, 3000);
/// assert_eq!(sensor.read_line().unwrap().position, 3000);
/// ```
#[derive(Debug)]
pub struct MockLineSensor {
    channels: usize,
    positions: VecDeque<u16>,
    last: u16,
    fail_next: bool,
    /// Sample count passed to the most recent `calibrate` call.
    pub calibration_samples: u16,
    /// Number of successful reads.
    pub reads: usize,
}

impl MockLineSensor {
    /// Creates a sensor with `channels` channels, centered.
    pub fn new(channels: usize) -> Self {
        Self {
            channels,
            positions: VecDeque::new(),
            last: (channels.saturating_sub(1) as i32 * POSITION_STEP / 2) as u16,
            fail_next: false,
            calibration_samples: 0,
            reads: 0,
        }
    }

    /// Queues positions for subsequent reads.
    pub fn queue_positions(&mut self, positions: &[u16]) {
        self.positions.extend(positions.iter().copied());
    }

    /// Makes the next read (or calibration) fail.
    pub fn fail_next_read(&mut self) {
        self.fail_next = true;
    }
}

impl LineSensor for MockLineSensor {
    type Error = ();

    fn channel_count(&self) -> usize {
        self.channels
    }

    fn calibrate(&mut self, samples: u16) -> Result<(), ()> {
        if core::mem::take(&mut self.fail_next) {
            return Err(());
        }
        self.calibration_samples = samples;
        Ok(())
    }

    fn read_line(&mut self) -> Result<LineReading, ()> {
        if core::mem::take(&mut self.fail_next) {
            return Err(());
        }
        if let Some(position) = self.positions.pop_front() {
            self.last = position;
        }
        self.reads += 1;
        Ok(LineReading {
            position: self.last,
            intensities: HVec::new(),
        })
    }
}

/// Mock raw reflectance reader for exercising calibration.
///
/// Frames come out in FIFO order; the last frame repeats when the queue
/// runs dry.
#[derive(Debug)]
pub struct MockReflectance<const N: usize> {
    frames: VecDeque<[u16; N]>,
    last: [u16; N],
    /// Number of frames read.
    pub reads: usize,
}

impl<const N: usize> MockReflectance<N> {
    /// Creates a reader that returns all zeros until frames are queued.
    pub fn new() -> Self {
        Self {
            frames: VecDeque::new(),
            last: [0; N],
            reads: 0,
        }
    }

    /// Queues one raw frame.
    pub fn queue(&mut self, frame: [u16; N]) {
        self.frames.push_back(frame);
    }
}

impl<const N: usize> Default for MockReflectance<N> {
    fn default() -> Self {
        Self::new()
    }
}

impl<const N: usize> ReflectanceReader<N> for MockReflectance<N> {
    type Error = ();

    fn read_raw(&mut self) -> Result<[u16; N], ()> {
        if let Some(frame) = self.frames.pop_front() {
            self.last = frame;
        }
        self.reads += 1;
        Ok(self.last)
    }
}

// ============================================================================
// Actuator Mocks
// ============================================================================

/// Mock wheel drive that records commands.
///
/// # Example
///
/// ```rust
/// use speedybee::hal::MockDrive;
/// use speedybee::traits::DifferentialDrive;
///
/// let mut drive = MockDrive::new();
/// drive.drive(60, 40).unwrap();
/// assert_eq!(drive.commands, vec![(60, 40)]);
/// ```
#[derive(Debug, Default)]
pub struct MockDrive {
    /// Every `(left, right)` pair received, oldest first.
    pub commands: Vec<(i32, i32)>,
    /// When set, commands are rejected.
    pub fail: bool,
}

impl MockDrive {
    /// Creates an empty recorder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Most recent command.
    pub fn last(&self) -> Option<(i32, i32)> {
        self.commands.last().copied()
    }
}

impl DifferentialDrive for MockDrive {
    type Error = ();

    fn drive(&mut self, left: i32, right: i32) -> Result<(), ()> {
        if self.fail {
            return Err(());
        }
        self.commands.push((left, right));
        Ok(())
    }
}

/// Mock buzzer.
#[derive(Debug, Default)]
pub struct MockTone {
    /// Every frequency requested, 0 for silence.
    pub history: Vec<u32>,
    /// Frequency currently sounding.
    pub current: u32,
}

impl MockTone {
    /// Creates a silent buzzer.
    pub fn new() -> Self {
        Self::default()
    }
}

impl ToneOutput for MockTone {
    type Error = ();

    fn tone(&mut self, freq_hz: u32) -> Result<(), ()> {
        self.history.push(freq_hz);
        self.current = freq_hz;
        Ok(())
    }
}

/// Mock display for testing status output.
///
/// # Example
///
/// ```rust
/// use speedybee::hal::MockDisplay;
/// use speedybee::traits::StatusDisplay;
///
/// let mut display = MockDisplay::new();
/// display.show_message("Calibrating", None).unwrap();
/// assert_eq!(display.last_message(), Some("Calibrating"));
/// ```
#[derive(Debug, Default)]
pub struct MockDisplay {
    /// Whether `init` has been called.
    pub initialized: bool,
    /// Number of `clear` calls.
    pub clear_count: usize,
    /// Messages shown, oldest first.
    pub messages: Vec<(String, Option<String>)>,
    /// Sensor renders: intensities and position.
    pub renders: Vec<(Vec<u16>, u16)>,
}

impl MockDisplay {
    /// Creates a blank display.
    pub fn new() -> Self {
        Self::default()
    }

    /// First line of the most recent message.
    pub fn last_message(&self) -> Option<&str> {
        self.messages.last().map(|(line1, _)| line1.as_str())
    }
}

impl StatusDisplay for MockDisplay {
    type Error = ();

    fn init(&mut self) -> Result<(), ()> {
        self.initialized = true;
        Ok(())
    }

    fn clear(&mut self) -> Result<(), ()> {
        self.clear_count += 1;
        Ok(())
    }

    fn show_message(&mut self, line1: &str, line2: Option<&str>) -> Result<(), ()> {
        self.messages.push((line1.into(), line2.map(Into::into)));
        Ok(())
    }

    fn render_sensors(&mut self, intensities: &[u16], position: u16) -> Result<(), ()> {
        self.renders.push((intensities.to_vec(), position));
        Ok(())
    }
}

// ============================================================================
// Input Mocks
// ============================================================================

/// Mock keypad with queued presses.
#[derive(Debug, Default)]
pub struct MockButtons {
    pending: VecDeque<Keypad>,
}

impl MockButtons {
    /// Creates a keypad with nothing pressed.
    pub fn new() -> Self {
        Self::default()
    }

    /// Queues a press for a later poll.
    pub fn press(&mut self, key: Keypad) {
        self.pending.push_back(key);
    }
}

impl ButtonSource for MockButtons {
    type Error = ();

    fn poll_button(&mut self) -> Result<Option<Keypad>, ()> {
        Ok(self.pending.pop_front())
    }
}

/// Mock digital input, e.g. an interrupt line.
#[derive(Debug, Default)]
pub struct MockInputPin {
    /// Current level; `true` reads as low.
    pub low: bool,
    /// Number of level reads.
    pub reads: usize,
    /// When set, every read fails.
    pub fail: bool,
}

impl MockInputPin {
    /// Creates a pin reading high.
    pub fn high() -> Self {
        Self::default()
    }

    /// Creates a pin reading low.
    pub fn low() -> Self {
        Self {
            low: true,
            ..Self::default()
        }
    }

    fn read(&mut self) -> Result<bool, digital::ErrorKind> {
        self.reads += 1;
        if self.fail {
            return Err(digital::ErrorKind::Other);
        }
        Ok(self.low)
    }
}

impl digital::ErrorType for MockInputPin {
    type Error = digital::ErrorKind;
}

impl InputPin for MockInputPin {
    fn is_high(&mut self) -> Result<bool, Self::Error> {
        self.read().map(|low| !low)
    }

    fn is_low(&mut self) -> Result<bool, Self::Error> {
        self.read()
    }
}

// ============================================================================
// Timing Mocks
// ============================================================================

/// Mock clock for testing time-dependent behavior.
///
/// # Example
///
/// ```rust
/// use speedybee::hal::MockClock;
/// use speedybee::traits::Clock;
///
/// let mut clock = MockClock::new();
/// clock.set(1000);
/// clock.advance(5);
/// assert_eq!(clock.now_ms(), 1005);
/// ```
#[derive(Debug, Default)]
pub struct MockClock {
    current_ms: u64,
}

impl MockClock {
    /// Creates a clock at time 0.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the current time in milliseconds.
    pub fn set(&mut self, ms: u64) {
        self.current_ms = ms;
    }

    /// Advances the clock by the given duration.
    pub fn advance(&mut self, ms: u64) {
        self.current_ms += ms;
    }
}

impl Clock for MockClock {
    fn now_ms(&self) -> u64 {
        self.current_ms
    }
}

/// Delay that only adds up what it was asked to wait.
#[derive(Debug, Default)]
pub struct MockDelay {
    total_ns: u64,
}

impl MockDelay {
    /// Creates a delay with nothing waited.
    pub fn new() -> Self {
        Self::default()
    }

    /// Total requested delay in whole milliseconds.
    pub fn total_ms(&self) -> u64 {
        self.total_ns / 1_000_000
    }
}

impl DelayNs for MockDelay {
    fn delay_ns(&mut self, ns: u32) {
        self.total_ns += u64::from(ns);
    }

    fn delay_ms(&mut self, ms: u32) {
        self.total_ns += u64::from(ms) * 1_000_000;
    }
}

// ============================================================================
// Bus Mocks
// ============================================================================

/// Mock I2C bus.
///
/// Write operations are recorded as `(address, bytes)`. Read operations
/// take the next queued response (zero-filled when none is queued).
///
/// # Example
///
/// ```rust
/// use embedded_hal::i2c::I2c;
/// use speedybee::hal::MockI2c;
///
/// let mut bus = MockI2c::new();
/// bus.queue_read(&[0xAB]);
///
/// let mut buf = [0u8; 1];
/// bus.write_read(0x22, &[0x0E], &mut buf).unwrap();
/// assert_eq!(buf, [0xAB]);
/// assert_eq!(bus.writes, vec![(0x22, vec![0x0E])]);
/// ```
#[derive(Debug, Default)]
pub struct MockI2c {
    /// Writes seen, oldest first.
    pub writes: Vec<(u8, Vec<u8>)>,
    /// When set, every transaction fails with a NACK.
    pub fail: bool,
    reads: VecDeque<Vec<u8>>,
}

impl MockI2c {
    /// Creates an idle bus.
    pub fn new() -> Self {
        Self::default()
    }

    /// Queues bytes for the next read operation.
    pub fn queue_read(&mut self, bytes: &[u8]) {
        self.reads.push_back(bytes.to_vec());
    }
}

impl i2c::ErrorType for MockI2c {
    type Error = ErrorKind;
}

impl i2c::I2c for MockI2c {
    fn transaction(
        &mut self,
        address: u8,
        operations: &mut [Operation<'_>],
    ) -> Result<(), Self::Error> {
        if self.fail {
            return Err(ErrorKind::NoAcknowledge(NoAcknowledgeSource::Address));
        }
        for op in operations {
            match op {
                Operation::Write(bytes) => self.writes.push((address, bytes.to_vec())),
                Operation::Read(buf) => {
                    buf.fill(0);
                    if let Some(response) = self.reads.pop_front() {
                        let n = response.len().min(buf.len());
                        buf[..n].copy_from_slice(&response[..n]);
                    }
                }
            }
        }
        Ok(())
    }
}
