//! ESP32 hardware abstraction layer for the line-following robot.
//!
//! # Hardware Configuration
//!
//! - **MCU**: ESP32 (Xtensa 240MHz)
//! - **Motor Driver**: TB6612FNG dual H-bridge (STBY tied high)
//! - **Line Sensor**: 5-channel RC reflectance array (QTR-5RC style)
//! - **Expander**: MCP23017 with six buttons on port A
//! - **IMU**: BMI323 (shares the expander bus)
//! - **Display**: SSD1306 128x64 OLED (I2C, optional)
//! - **Buzzer**: passive piezo on an LEDC channel
//!
//! # Pin Assignments
//!
//! See the [`pins`] module for GPIO assignments.

mod buzzer;
mod clock;
mod line_sensor;
mod motor;

pub use buzzer::Esp32Buzzer;
pub use clock::Esp32Clock;
pub use line_sensor::Esp32QtrReader;
pub use motor::{Esp32Drive, WheelPins};

#[cfg(feature = "display")]
mod display;
#[cfg(feature = "display")]
pub use display::{DisplayError, Esp32Display};

/// Pin assignments for the robot board.
pub mod pins {
    // =========================================================================
    // Motor Control (TB6612FNG)
    // =========================================================================

    /// Left motor direction input 1 (AIN1)
    pub const AIN1: i32 = 25;

    /// Left motor direction input 2 (AIN2)
    pub const AIN2: i32 = 26;

    /// Left motor PWM (PWMA)
    pub const PWMA: i32 = 27;

    /// Right motor direction input 1 (BIN1)
    pub const BIN1: i32 = 14;

    /// Right motor direction input 2 (BIN2)
    pub const BIN2: i32 = 12;

    /// Right motor PWM (PWMB)
    pub const PWMB: i32 = 13;

    // =========================================================================
    // Reflectance Array
    // =========================================================================

    /// RC sensor pins, channel 0 (right-most) first
    pub const QTR: [i32; 5] = [15, 16, 17, 18, 19];

    // =========================================================================
    // I2C Buses
    // =========================================================================

    /// Expander + IMU data line
    pub const I2C_SDA: i32 = 21;

    /// Expander + IMU clock line
    pub const I2C_SCL: i32 = 22;

    /// Display data line
    pub const OLED_SDA: i32 = 4;

    /// Display clock line
    pub const OLED_SCL: i32 = 5;

    /// Default I2C address for SSD1306 OLED
    pub const OLED_I2C_ADDR: u8 = 0x3C;

    /// Expander interrupt output (INTA, active low, mirrored)
    pub const EXPANDER_INT: i32 = 32;

    // =========================================================================
    // Buzzer
    // =========================================================================

    /// Passive buzzer
    pub const BUZZER: i32 = 23;
}
