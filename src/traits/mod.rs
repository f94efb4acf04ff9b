//! Trait definitions for hardware abstraction.
//!
//! This module defines the core abstractions that allow speedybee to run
//! on the robot (ESP32) and on the desktop (mocks).
//!
//! # Submodules
//!
//! - `hardware`: Line sensor, drive motors, buttons, buzzer, IMU, clock
//! - `display`: Status display trait
//!
//! # Hardware Abstraction
//!
//! The control loop needs only two of them:
//!
//! - [`LineSensor`]: calibrated line position
//! - [`DifferentialDrive`]: signed wheel speeds
//!
//! The rest are peripherals driven at lifecycle milestones or polled
//! independently of the control loop.

pub mod display;
pub mod hardware;

pub use display::*;
pub use hardware::*;
