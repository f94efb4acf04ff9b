//! TB6612FNG dual motor driver using ESP32 LEDC PWM.
//!
//! Each wheel takes two direction inputs and one PWM input. The mapping
//! from signed speed to bridge levels lives in [`WheelOutput`]; this file
//! only pushes those levels to the pins.
//!
//! Left wheel is channel A, right wheel is channel B.

use crate::motor::WheelOutput;
use crate::traits::DifferentialDrive;
use esp_idf_hal::gpio::{AnyOutputPin, Output, PinDriver};
use esp_idf_hal::ledc::{config::TimerConfig, LedcDriver, LedcTimerDriver, Resolution};
use esp_idf_hal::peripheral::Peripheral;
use esp_idf_hal::prelude::*;
use esp_idf_hal::sys::EspError;

/// One bridge channel.
struct Wheel<'d> {
    in1: PinDriver<'d, AnyOutputPin, Output>,
    in2: PinDriver<'d, AnyOutputPin, Output>,
    pwm: LedcDriver<'d>,
    output: WheelOutput,
}

impl Wheel<'_> {
    fn apply(&mut self, speed: i32) -> Result<(), EspError> {
        let output = WheelOutput::from_speed(speed, Esp32Drive::MAX_DUTY);
        let (in1, in2) = output.input_levels();
        self.in1.set_level(in1.into())?;
        self.in2.set_level(in2.into())?;
        self.pwm.set_duty(output.duty)?;
        self.output = output;
        Ok(())
    }
}

/// Direction and PWM pins of one bridge channel.
pub struct WheelPins {
    /// Direction input 1.
    pub in1: AnyOutputPin,
    /// Direction input 2.
    pub in2: AnyOutputPin,
    /// PWM input.
    pub pwm: AnyOutputPin,
}

/// Differential drive on a TB6612FNG.
///
/// Uses one LEDC timer at 20kHz with 8-bit resolution, so a speed maps
/// directly to duty (`0..=255`).
///
/// # Example
///
/// ```ignore
/// use speedybee::hal::esp32::{Esp32Drive, WheelPins};
/// use speedybee::traits::DifferentialDrive;
///
/// let p = Peripherals::take()?;
/// let mut drive = Esp32Drive::new(
///     p.ledc.timer0,
///     p.ledc.channel0,
///     p.ledc.channel1,
///     WheelPins { in1: p.pins.gpio25.into(), in2: p.pins.gpio26.into(), pwm: p.pins.gpio27.into() },
///     WheelPins { in1: p.pins.gpio14.into(), in2: p.pins.gpio12.into(), pwm: p.pins.gpio13.into() },
/// )?;
/// drive.drive(60, 60)?;
/// ```
pub struct Esp32Drive<'d> {
    left: Wheel<'d>,
    right: Wheel<'d>,
}

impl<'d> Esp32Drive<'d> {
    /// PWM frequency in Hz (above audible range)
    const PWM_FREQ_HZ: u32 = 20_000;

    /// PWM resolution (8-bit = 256 steps)
    const PWM_RESOLUTION: Resolution = Resolution::Bits8;

    /// Maximum duty value for 8-bit resolution
    pub const MAX_DUTY: u32 = 255;

    /// Creates the drive with both wheels stopped.
    ///
    /// # Errors
    ///
    /// Returns an error if PWM or GPIO initialization fails.
    pub fn new<T, TI, LC, LCI, RC, RCI>(
        timer: T,
        left_channel: LC,
        right_channel: RC,
        left: WheelPins,
        right: WheelPins,
    ) -> Result<Self, EspError>
    where
        TI: esp_idf_hal::ledc::LedcTimer + 'd,
        T: Peripheral<P = TI> + 'd,
        LCI: esp_idf_hal::ledc::LedcChannel<SpeedMode = TI::SpeedMode> + 'd,
        LC: Peripheral<P = LCI> + 'd,
        RCI: esp_idf_hal::ledc::LedcChannel<SpeedMode = TI::SpeedMode> + 'd,
        RC: Peripheral<P = RCI> + 'd,
    {
        let timer_config = TimerConfig::default()
            .frequency(Self::PWM_FREQ_HZ.Hz())
            .resolution(Self::PWM_RESOLUTION);
        let timer = LedcTimerDriver::new(timer, &timer_config)?;

        let left = Wheel {
            pwm: LedcDriver::new(left_channel, &timer, left.pwm)?,
            in1: PinDriver::output(left.in1)?,
            in2: PinDriver::output(left.in2)?,
            output: WheelOutput::default(),
        };
        let right = Wheel {
            pwm: LedcDriver::new(right_channel, &timer, right.pwm)?,
            in1: PinDriver::output(right.in1)?,
            in2: PinDriver::output(right.in2)?,
            output: WheelOutput::default(),
        };

        let mut drive = Self {
            left,
            right,
        };
        drive.stop()?;

        Ok(drive)
    }

    /// Bridge state last applied to each wheel `(left, right)`.
    pub fn outputs(&self) -> (WheelOutput, WheelOutput) {
        (self.left.output, self.right.output)
    }
}

impl DifferentialDrive for Esp32Drive<'_> {
    type Error = EspError;

    fn drive(&mut self, left: i32, right: i32) -> Result<(), Self::Error> {
        self.left.apply(left)?;
        self.right.apply(right)
    }
}
