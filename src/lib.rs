//! # speedybee
//!
//! Firmware core for a line-following robot: a reflectance sensor array,
//! a filtered and shaped PD steering controller, and a differential drive.
//!
//! ## Features
//!
//! - **Hardware abstraction**: Traits for the line sensor, wheel drive, buttons, buzzer, and IMU
//! - **Steering controller**: Low-pass filtered error, cubic-sigmoid shaping, PD correction
//! - **Sensor calibration**: Per-channel min/max normalization and weighted-centroid position
//! - **Line-lost detection**: Optional stop after a run of range-end readings
//! - **Telemetry**: Per-cycle breakdown as a CSV line or JSON
//!
//! ## Architecture
//!
//! The crate is structured to allow testing on desktop without hardware:
//!
//! - `traits` - Hardware abstractions
//! - `controller` - Steering law and its state
//! - `sensor` - Calibration and position estimation for reflectance arrays
//! - `robot` - Runner that ties sensor, controller, and drive together
//! - `hal` - Concrete implementations (mock for testing, esp32 for hardware)
//!
//! ## Example
//!
//! ```rust
//! use speedybee::{LineFollower, MotorCommand, RobotConfig};
//! use speedybee::hal::{MockDrive, MockLineSensor};
//!
//! let mut sensor = MockLineSensor::new(5);
//! // Line drifts to the left of center
//! sensor.queue_positions(&[2000, 2600, 2600]);
//!
//! let mut robot = LineFollower::new(sensor, MockDrive::new(), RobotConfig::default()).unwrap();
//! robot.calibrate().unwrap();
//!
//! let first = robot.step().unwrap();
//! assert_eq!(first.command, MotorCommand::new(60, 60));
//!
//! // Right wheel speeds up to steer left
//! let second = robot.step().unwrap();
//! assert!(second.command.right > second.command.left);
//! ```

#![cfg_attr(not(feature = "std"), no_std)]
#![warn(missing_docs)]

extern crate alloc;

/// Beep patterns for startup and fault feedback.
pub mod chime;
/// Robot configuration with validation and JSON loading.
pub mod config;
/// Steering controller: filtering, shaping, PD correction, wheel speeds.
pub mod controller;
/// MCP23017 GPIO expander driving the keypad.
pub mod expander;
/// Line-lost detection.
pub mod fault;
/// Hardware abstraction layer with mock implementations for testing.
pub mod hal;
/// BMI323 accelerometer and gyroscope.
pub mod imu;
/// Signed speed to H-bridge output mapping.
pub mod motor;
/// Control-cycle runner.
pub mod robot;
/// Reflectance array calibration and line position.
pub mod sensor;
/// Per-cycle controller telemetry.
pub mod telemetry;
/// Core traits for hardware abstraction.
pub mod traits;

// Re-exports for convenience
pub use config::{
    ConfigError, ControlParams, DeviceConfig, LoopConfig, RobotConfig, SensorConfig,
    SpeedModulation,
};
pub use controller::{clamp_speed, shape_error, ControllerState, LineController, MotorCommand};
pub use fault::{SaturationMonitor, SensorFault};
pub use robot::{forward_button, CycleReport, LineFollower, LoggingMenu, RobotError};
pub use sensor::{LinePolarity, QtrArray};
pub use telemetry::CycleTelemetry;
pub use traits::{
    ButtonSource, Clock, DifferentialDrive, Direction, ImuSample, Keypad, LineReading,
    LineSensor, MenuHandler, MotionSensor, StatusDisplay, ToneOutput,
};
