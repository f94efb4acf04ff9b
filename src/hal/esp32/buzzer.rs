//! Passive buzzer on an LEDC channel.
//!
//! The buzzer gets its own LEDC timer so note changes never disturb the
//! motor PWM frequency.

use crate::traits::ToneOutput;
use esp_idf_hal::gpio::OutputPin;
use esp_idf_hal::ledc::{config::TimerConfig, LedcDriver, LedcTimerDriver, LowSpeed, Resolution};
use esp_idf_hal::peripheral::Peripheral;
use esp_idf_hal::prelude::*;
use esp_idf_hal::sys::EspError;

/// Square-wave buzzer driver.
///
/// A tone is a 50% duty square wave at the note frequency; silence is 0%
/// duty.
pub struct Esp32Buzzer<'d> {
    timer: LedcTimerDriver<'d, LowSpeed>,
    channel: LedcDriver<'d>,
    current_hz: u32,
}

impl<'d> Esp32Buzzer<'d> {
    /// Timer frequency before the first note
    const IDLE_FREQ_HZ: u32 = 2_000;

    /// Creates a silent buzzer.
    pub fn new<T, C>(
        timer: impl Peripheral<P = T> + 'd,
        channel: impl Peripheral<P = C> + 'd,
        pin: impl Peripheral<P = impl OutputPin> + 'd,
    ) -> Result<Self, EspError>
    where
        T: esp_idf_hal::ledc::LedcTimer<SpeedMode = LowSpeed> + 'd,
        C: esp_idf_hal::ledc::LedcChannel<SpeedMode = LowSpeed> + 'd,
    {
        let config = TimerConfig::default()
            .frequency(Self::IDLE_FREQ_HZ.Hz())
            .resolution(Resolution::Bits10);
        let timer = LedcTimerDriver::new(timer, &config)?;
        let mut channel = LedcDriver::new(channel, &timer, pin)?;
        channel.set_duty(0)?;

        Ok(Self {
            timer,
            channel,
            current_hz: 0,
        })
    }

    /// Frequency currently sounding, 0 when silent.
    pub fn current_hz(&self) -> u32 {
        self.current_hz
    }
}

impl ToneOutput for Esp32Buzzer<'_> {
    type Error = EspError;

    fn tone(&mut self, freq_hz: u32) -> Result<(), Self::Error> {
        if freq_hz == 0 {
            self.channel.set_duty(0)?;
        } else {
            if freq_hz != self.current_hz {
                self.timer.set_frequency(freq_hz.Hz())?;
            }
            let half = self.channel.get_max_duty() / 2;
            self.channel.set_duty(half)?;
        }
        self.current_hz = freq_hz;
        Ok(())
    }
}
