//! RC-type reflectance array read by capacitor discharge timing.
//!
//! Each channel is charged by driving its pin high for 10µs, then released
//! to input. The time until the pin reads low is the raw value: less
//! reflected light (a dark line) means a longer discharge. Channels that
//! have not discharged by the timeout read the timeout.

use crate::sensor::ReflectanceReader;
use esp_idf_hal::delay::Ets;
use esp_idf_hal::gpio::{AnyIOPin, InputOutput, PinDriver};
use esp_idf_hal::sys::{
    esp, gpio_mode_t_GPIO_MODE_INPUT, gpio_mode_t_GPIO_MODE_INPUT_OUTPUT, gpio_set_direction,
    EspError,
};
use heapless::Vec as HVec;

/// Charge pulse length
const CHARGE_US: u32 = 10;

/// RC reflectance reader over `N` GPIOs.
///
/// Pins are given channel 0 (right-most sensor) first.
pub struct Esp32QtrReader<'d, const N: usize> {
    pins: HVec<PinDriver<'d, AnyIOPin, InputOutput>, N>,
    timeout_us: u16,
}

impl<'d, const N: usize> Esp32QtrReader<'d, N> {
    /// Discharge timeout used by the reference RC arrays.
    pub const DEFAULT_TIMEOUT_US: u16 = 2500;

    /// Takes ownership of the sensor pins.
    pub fn new(pins: [AnyIOPin; N]) -> Result<Self, EspError> {
        let mut drivers = HVec::new();
        for pin in pins {
            let driver = PinDriver::input_output(pin)?;
            // Capacity is exactly N
            let _ = drivers.push(driver);
        }
        Ok(Self {
            pins: drivers,
            timeout_us: Self::DEFAULT_TIMEOUT_US,
        })
    }

    /// Overrides the discharge timeout.
    pub fn with_timeout_us(mut self, timeout_us: u16) -> Self {
        self.timeout_us = timeout_us;
        self
    }

    fn charge(&mut self) -> Result<(), EspError> {
        for pin in self.pins.iter_mut() {
            esp!(unsafe { gpio_set_direction(pin.pin(), gpio_mode_t_GPIO_MODE_INPUT_OUTPUT) })?;
            pin.set_high()?;
        }
        Ets::delay_us(CHARGE_US);
        for pin in self.pins.iter() {
            esp!(unsafe { gpio_set_direction(pin.pin(), gpio_mode_t_GPIO_MODE_INPUT) })?;
        }
        Ok(())
    }
}

fn now_us() -> i64 {
    // Safe: read-only query of the system timer
    unsafe { esp_idf_hal::sys::esp_timer_get_time() }
}

impl<const N: usize> ReflectanceReader<N> for Esp32QtrReader<'_, N> {
    type Error = EspError;

    fn read_raw(&mut self) -> Result<[u16; N], Self::Error> {
        let mut values = [self.timeout_us; N];
        let mut pending = [true; N];

        self.charge()?;
        let start = now_us();
        loop {
            let elapsed = (now_us() - start).clamp(0, i64::from(self.timeout_us)) as u16;
            if elapsed >= self.timeout_us {
                break;
            }
            let mut waiting = false;
            for (i, pin) in self.pins.iter().enumerate() {
                if !pending[i] {
                    continue;
                }
                if pin.is_low() {
                    values[i] = elapsed;
                    pending[i] = false;
                } else {
                    waiting = true;
                }
            }
            if !waiting {
                break;
            }
        }

        Ok(values)
    }
}
