//! BMI323 inertial measurement unit over I2C.
//!
//! Registers are 16 bits wide, little-endian. Every I2C read returns two
//! dummy bytes before the payload. The IMU is read for diagnostics only;
//! nothing in the control loop depends on it.

use embedded_hal::delay::DelayNs;
use embedded_hal::i2c::I2c;

use crate::traits::{ImuSample, MotionSensor};

/// Default bus address.
pub const DEFAULT_ADDRESS: u8 = 0x68;

/// Value of the chip id register.
pub const CHIP_ID: u8 = 0x43;

/// Register addresses.
pub mod reg {
    /// Chip identification.
    pub const CHIP_ID: u8 = 0x00;
    /// First data register (accelerometer X).
    pub const ACC_DATA_X: u8 = 0x03;
    /// Accelerometer configuration.
    pub const ACC_CONF: u8 = 0x20;
    /// Gyroscope configuration.
    pub const GYR_CONF: u8 = 0x21;
    /// Command register.
    pub const CMD: u8 = 0x7E;
}

/// Soft reset command.
const CMD_SOFT_RESET: u16 = 0xDEAF;

/// High-performance mode, no averaging, ODR/4 bandwidth, 800 Hz ODR,
/// minimum range (2 g / 125 dps).
pub const SENSOR_CONF: u16 = 0x708B;

const DUMMY_BYTES: usize = 2;

/// Dummy bytes + accel (3 words) + gyro (3 words) + temperature (1 word),
/// plus the sensor-time word the burst runs into.
const BURST_LEN: usize = DUMMY_BYTES + 18;

/// Raw temperature LSB per degree Celsius.
const TEMP_LSB_PER_C: f32 = 512.0;

/// Temperature at raw value 0.
const TEMP_OFFSET_C: f32 = 23.0;

/// BMI323 driver.
///
/// # Example
///
/// ```rust
/// use speedybee::imu::Bmi323;
/// use speedybee::hal::MockI2c;
/// use speedybee::traits::MotionSensor;
///
/// let mut i2c = MockI2c::new();
/// let mut burst = [0u8; 20];
/// burst[2] = 0x10; // accel X = 16
/// i2c.queue_read(&burst);
///
/// let mut imu = Bmi323::new(i2c);
/// let sample = imu.read_sample().unwrap();
/// assert_eq!(sample.accel[0], 16);
/// assert_eq!(sample.temperature_c, 23.0);
/// ```
pub struct Bmi323<I2C> {
    i2c: I2C,
    address: u8,
}

impl<I2C: I2c> Bmi323<I2C> {
    /// Creates a driver at [`DEFAULT_ADDRESS`].
    pub fn new(i2c: I2C) -> Self {
        Self {
            i2c,
            address: DEFAULT_ADDRESS,
        }
    }

    /// Resets the chip and enables both sensors at [`SENSOR_CONF`].
    pub fn begin<D: DelayNs>(&mut self, delay: &mut D) -> Result<(), I2C::Error> {
        self.soft_reset(delay)?;
        self.write_register16(reg::ACC_CONF, SENSOR_CONF)?;
        self.write_register16(reg::GYR_CONF, SENSOR_CONF)?;
        delay.delay_ms(50);
        log::info!("IMU configured");
        Ok(())
    }

    /// Software reset; waits for the chip to come back.
    pub fn soft_reset<D: DelayNs>(&mut self, delay: &mut D) -> Result<(), I2C::Error> {
        self.write_register16(reg::CMD, CMD_SOFT_RESET)?;
        delay.delay_ms(50);
        Ok(())
    }

    /// Low byte of the chip id register.
    pub fn chip_id(&mut self) -> Result<u8, I2C::Error> {
        Ok(self.read_register16(reg::CHIP_ID)? as u8)
    }

    /// Releases the bus.
    pub fn release(self) -> I2C {
        self.i2c
    }

    fn write_register16(&mut self, register: u8, value: u16) -> Result<(), I2C::Error> {
        let [lo, hi] = value.to_le_bytes();
        self.i2c.write(self.address, &[register, lo, hi])
    }

    fn read_register16(&mut self, register: u8) -> Result<u16, I2C::Error> {
        let mut buf = [0u8; DUMMY_BYTES + 2];
        self.i2c.write_read(self.address, &[register], &mut buf)?;
        Ok(u16::from_le_bytes([buf[DUMMY_BYTES], buf[DUMMY_BYTES + 1]]))
    }
}

impl<I2C: I2c> MotionSensor for Bmi323<I2C> {
    type Error = I2C::Error;

    fn read_sample(&mut self) -> Result<ImuSample, Self::Error> {
        let mut buf = [0u8; BURST_LEN];
        self.i2c
            .write_read(self.address, &[reg::ACC_DATA_X], &mut buf)?;

        let word = |index: usize| {
            let at = DUMMY_BYTES + index * 2;
            i16::from_le_bytes([buf[at], buf[at + 1]])
        };

        Ok(ImuSample {
            accel: [word(0), word(1), word(2)],
            gyro: [word(3), word(4), word(5)],
            temperature_c: f32::from(word(6)) / TEMP_LSB_PER_C + TEMP_OFFSET_C,
        })
    }
}
