//! Line follower runner that ties sensor, controller, and drive together.
//!
//! This module provides [`LineFollower`], the owner of the per-cycle
//! pipeline: read position, clamp it to the sensor range, run the
//! controller, drive the wheels. Timing (the fixed inter-cycle delay) stays
//! with the caller so the same runner works under `std::thread::sleep`, a
//! hardware delay, or a test loop that never sleeps.
//!
//! # Example
//!
//! ```rust
//! use speedybee::{LineFollower, MotorCommand, RobotConfig};
//! use speedybee::hal::{MockDrive, MockLineSensor};
//!
//! let mut sensor = MockLineSensor::new(5);
//! sensor.queue_positions(&[2000, 2000]);
//!
//! let mut robot = LineFollower::new(sensor, MockDrive::new(), RobotConfig::default()).unwrap();
//! robot.calibrate().unwrap();
//!
//! let report = robot.step().unwrap();
//! assert_eq!(report.command, MotorCommand::new(60, 60));
//! assert_eq!(robot.drive().last(), Some((60, 60)));
//! ```
//!
//! # Sensor Faults
//!
//! With [`LoopConfig::line_lost_cycles`] set, a long run of pinned readings
//! stops the wheels and freezes controller state until the line returns:
//!
//! ```rust
//! use speedybee::{LineFollower, MotorCommand, RobotConfig, SensorFault};
//! use speedybee::config::LoopConfig;
//! use speedybee::hal::{MockDrive, MockLineSensor};
//!
//! let config = RobotConfig::default()
//!     .with_loop(LoopConfig::default().with_line_lost_cycles(2));
//! let mut sensor = MockLineSensor::new(5);
//! sensor.queue_positions(&[4000, 4000]);
//!
//! let mut robot = LineFollower::new(sensor, MockDrive::new(), config).unwrap();
//! robot.step().unwrap();
//! let report = robot.step().unwrap();
//! assert_eq!(report.fault, Some(SensorFault::LineLost));
//! assert_eq!(report.command, MotorCommand::STOP);
//! ```
//!
//! [`LoopConfig::line_lost_cycles`]: crate::config::LoopConfig::line_lost_cycles

use core::fmt;

use crate::config::{ConfigError, RobotConfig};
use crate::controller::{LineController, MotorCommand};
use crate::fault::{SaturationMonitor, SensorFault};
use crate::telemetry::CycleTelemetry;
use crate::traits::{ButtonSource, DifferentialDrive, Keypad, LineReading, LineSensor, MenuHandler};

/// Log target of the per-cycle telemetry lines.
///
/// Lines go out at `Info` so the firmware's default log level shows them.
pub const TELEMETRY_TARGET: &str = "speedybee::telemetry";

/// Hardware failure during a control cycle.
#[derive(Debug, PartialEq, Eq)]
pub enum RobotError<SE, DE> {
    /// The sensor array failed to read.
    Sensor(SE),
    /// The motor driver rejected a command.
    Drive(DE),
}

impl<SE: fmt::Debug, DE: fmt::Debug> fmt::Display for RobotError<SE, DE> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RobotError::Sensor(e) => write!(f, "sensor read failed: {:?}", e),
            RobotError::Drive(e) => write!(f, "drive command failed: {:?}", e),
        }
    }
}

/// Outcome of one control cycle.
#[derive(Clone, Debug, PartialEq)]
pub struct CycleReport {
    /// Reading as returned by the sensor (before clamping).
    pub reading: LineReading,
    /// Controller breakdown; `None` while a sensor fault holds the wheels.
    pub telemetry: Option<CycleTelemetry>,
    /// Command sent to the drive.
    pub command: MotorCommand,
    /// Active sensor fault.
    pub fault: Option<SensorFault>,
    /// Set only on the first cycle of a fault.
    pub fault_onset: bool,
}

/// Main line-following runner.
///
/// # Type Parameters
///
/// - `S`: the line sensor ([`LineSensor`] trait)
/// - `D`: the wheel drive ([`DifferentialDrive`] trait)
///
/// Single-threaded by construction: one [`step`](Self::step) runs to
/// completion before the next begins.
pub struct LineFollower<S: LineSensor, D: DifferentialDrive> {
    sensor: S,
    drive: D,
    controller: LineController,
    monitor: SaturationMonitor,
    config: RobotConfig,
    cycles: u64,
}

impl<S: LineSensor, D: DifferentialDrive> LineFollower<S, D> {
    /// Validates `config` against itself and the attached sensor.
    pub fn new(sensor: S, drive: D, config: RobotConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        if sensor.channel_count() != config.sensor.channel_count {
            return Err(ConfigError::ChannelMismatch {
                configured: config.sensor.channel_count,
                sensor: sensor.channel_count(),
            });
        }

        let controller = LineController::new(config.control, config.sensor.center_position)?;
        let monitor = SaturationMonitor::new(
            config.looping.line_lost_cycles,
            config.sensor.max_position(),
        );

        Ok(Self {
            sensor,
            drive,
            controller,
            monitor,
            config,
            cycles: 0,
        })
    }

    /// Calibrates the sensor array and zeroes controller memory.
    pub fn calibrate(&mut self) -> Result<(), S::Error> {
        let samples = self.config.sensor.calibration_samples;
        log::info!("Calibrating sensor array ({} samples)", samples);
        self.sensor.calibrate(samples)?;
        self.controller.reset();
        self.monitor.reset();
        Ok(())
    }

    /// Runs one control cycle: read, control, drive.
    pub fn step(&mut self) -> Result<CycleReport, RobotError<S::Error, D::Error>> {
        let reading = self.sensor.read_line().map_err(RobotError::Sensor)?;
        let position = i32::from(reading.position).clamp(0, self.config.sensor.max_position());

        let was_faulted = self.monitor.active_fault().is_some();
        if let Some(fault) = self.monitor.observe(position) {
            if !was_faulted {
                log::warn!("Sensor fault: {} after {} cycles", fault, self.monitor.pinned_cycles());
            }
            self.drive.stop().map_err(RobotError::Drive)?;
            self.cycles += 1;
            return Ok(CycleReport {
                reading,
                telemetry: None,
                command: MotorCommand::STOP,
                fault: Some(fault),
                fault_onset: !was_faulted,
            });
        }
        if was_faulted {
            log::info!("Line reacquired at position {}", position);
        }

        let telemetry = self.controller.step(position);
        let command = telemetry.command();
        self.drive
            .drive(command.left, command.right)
            .map_err(RobotError::Drive)?;

        if self.config.looping.telemetry {
            log::info!(target: TELEMETRY_TARGET, "{}", telemetry);
        }
        self.cycles += 1;

        Ok(CycleReport {
            reading,
            telemetry: Some(telemetry),
            command,
            fault: None,
            fault_onset: false,
        })
    }

    /// Stops both wheels.
    pub fn stop(&mut self) -> Result<(), D::Error> {
        self.drive.stop()
    }

    /// Fixed delay the caller should wait between cycles.
    pub fn cycle_delay_ms(&self) -> u32 {
        self.config.looping.cycle_delay_ms
    }

    /// Completed cycles since construction.
    pub fn cycles(&self) -> u64 {
        self.cycles
    }

    /// Steering controller.
    pub fn controller(&self) -> &LineController {
        &self.controller
    }

    /// Configuration in effect.
    pub fn config(&self) -> &RobotConfig {
        &self.config
    }

    /// Attached sensor.
    pub fn sensor(&self) -> &S {
        &self.sensor
    }

    /// Attached sensor, mutably.
    pub fn sensor_mut(&mut self) -> &mut S {
        &mut self.sensor
    }

    /// Attached drive.
    pub fn drive(&self) -> &D {
        &self.drive
    }

    /// Releases the hardware.
    pub fn into_parts(self) -> (S, D) {
        (self.sensor, self.drive)
    }
}

/// Polls one button event and forwards it to `handler`.
///
/// Call once per loop cycle; it shares no state with the controller.
pub fn forward_button<B: ButtonSource, H: MenuHandler>(
    source: &mut B,
    handler: &mut H,
) -> Result<Option<Keypad>, B::Error> {
    let key = source.poll_button()?;
    if let Some(key) = key {
        handler.on_button(key);
    }
    Ok(key)
}

/// Menu handler that logs presses and remembers the last one.
#[derive(Debug, Default)]
pub struct LoggingMenu {
    last: Option<Keypad>,
    presses: u32,
}

impl LoggingMenu {
    /// Creates a handler with no presses recorded.
    pub fn new() -> Self {
        Self::default()
    }

    /// Most recent button.
    pub fn last(&self) -> Option<Keypad> {
        self.last
    }

    /// Number of presses handled.
    pub fn presses(&self) -> u32 {
        self.presses
    }
}

impl MenuHandler for LoggingMenu {
    fn on_button(&mut self, key: Keypad) {
        log::info!("Button {:?} pressed", key);
        self.last = Some(key);
        self.presses += 1;
    }
}
