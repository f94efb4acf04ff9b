//! MCP23017 I2C GPIO expander wired to the button keypad.
//!
//! Port A pins 0..5 carry the buttons, active low with internal pull-ups.
//! Each pin raises an interrupt when it differs from its DEFVAL bit (high),
//! i.e. when pressed. INTA and INTB are mirrored so a single host pin sees
//! both ports.
//!
//! Works with any [`embedded_hal::i2c::I2c`] bus. With the host's interrupt
//! input attached, polling touches the bus only while INT is asserted.

use core::convert::Infallible;
use core::fmt;

use embedded_hal::digital::{self, InputPin};
use embedded_hal::i2c::I2c;

use crate::traits::{ButtonSource, Keypad};

/// Default bus address of the expander on the robot.
pub const DEFAULT_ADDRESS: u8 = 0x22;

/// Register addresses (IOCON.BANK = 0).
pub mod reg {
    /// Port A direction.
    pub const IODIRA: u8 = 0x00;
    /// Port A interrupt-on-change enable.
    pub const GPINTENA: u8 = 0x04;
    /// Port A default compare value.
    pub const DEFVALA: u8 = 0x06;
    /// Port A interrupt control (compare against DEFVAL).
    pub const INTCONA: u8 = 0x08;
    /// Configuration.
    pub const IOCON: u8 = 0x0A;
    /// Port A pull-ups.
    pub const GPPUA: u8 = 0x0C;
    /// Port A interrupt flags (port B follows).
    pub const INTFA: u8 = 0x0E;
    /// Port A interrupt capture (port B follows).
    pub const INTCAPA: u8 = 0x10;
}

/// IOCON.MIRROR: INTA and INTB internally connected.
const IOCON_MIRROR: u8 = 1 << 6;

/// Pins 0..5 of port A.
const BUTTON_MASK: u8 = 0b0011_1111;

/// Stand-in for an unwired INT line: always reports an interrupt pending,
/// so every poll reads the flag registers.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoInterruptPin;

impl digital::ErrorType for NoInterruptPin {
    type Error = Infallible;
}

impl InputPin for NoInterruptPin {
    fn is_high(&mut self) -> Result<bool, Infallible> {
        Ok(false)
    }

    fn is_low(&mut self) -> Result<bool, Infallible> {
        Ok(true)
    }
}

/// Failure while polling for a button.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ExpanderError<B, P> {
    /// I2C transaction failed.
    Bus(B),
    /// The interrupt input could not be read.
    Interrupt(P),
}

impl<B: fmt::Debug, P: fmt::Debug> fmt::Display for ExpanderError<B, P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExpanderError::Bus(e) => write!(f, "expander bus error: {:?}", e),
            ExpanderError::Interrupt(e) => write!(f, "expander interrupt pin error: {:?}", e),
        }
    }
}

/// MCP23017 button expander.
///
/// # Example
///
/// ```rust
/// use speedybee::expander::Mcp23017;
/// use speedybee::hal::{MockI2c, MockInputPin};
/// use speedybee::traits::{ButtonSource, Keypad};
///
/// let mut i2c = MockI2c::new();
/// i2c.queue_read(&[0b0000_0010, 0]); // INTFA: pin 1
///
/// // INT idles high: no bus traffic
/// let mut expander = Mcp23017::new(i2c).with_interrupt_pin(MockInputPin::high());
/// assert_eq!(expander.poll_button().unwrap(), None);
///
/// expander.interrupt_pin_mut().low = true;
/// assert_eq!(expander.poll_button().unwrap(), Some(Keypad::Key2));
/// ```
pub struct Mcp23017<I2C, INT = NoInterruptPin> {
    i2c: I2C,
    address: u8,
    interrupt: INT,
}

impl<I2C: I2c> Mcp23017<I2C> {
    /// Creates a driver at [`DEFAULT_ADDRESS`]. Call [`setup`](Self::setup) before polling.
    pub fn new(i2c: I2C) -> Self {
        Self::with_address(i2c, DEFAULT_ADDRESS)
    }

    /// Creates a driver at a custom address.
    pub fn with_address(i2c: I2C, address: u8) -> Self {
        Self {
            i2c,
            address,
            interrupt: NoInterruptPin,
        }
    }
}

impl<I2C: I2c, INT: InputPin> Mcp23017<I2C, INT> {
    /// Gates polling on the host input wired to INTA (active low).
    pub fn with_interrupt_pin<P: InputPin>(self, pin: P) -> Mcp23017<I2C, P> {
        Mcp23017 {
            i2c: self.i2c,
            address: self.address,
            interrupt: pin,
        }
    }

    /// The interrupt input.
    pub fn interrupt_pin_mut(&mut self) -> &mut INT {
        &mut self.interrupt
    }

    /// Whether INT is asserted. Reads only the host pin.
    pub fn interrupt_pending(&mut self) -> Result<bool, INT::Error> {
        self.interrupt.is_low()
    }

    /// Configures the button pins and clears any stale interrupt.
    pub fn setup(&mut self) -> Result<(), I2C::Error> {
        // Mirrored, push-pull, active-low interrupt output
        self.write_register(reg::IOCON, IOCON_MIRROR)?;
        self.write_register(reg::IODIRA, 0xFF)?;
        self.write_register(reg::GPPUA, BUTTON_MASK)?;
        self.write_register(reg::DEFVALA, BUTTON_MASK)?;
        self.write_register(reg::INTCONA, BUTTON_MASK)?;
        self.write_register(reg::GPINTENA, BUTTON_MASK)?;
        self.clear_interrupts()?;
        log::info!("Expander ready at 0x{:02X}", self.address);
        Ok(())
    }

    /// Pin (0..16) that raised the pending interrupt, if any.
    pub fn last_interrupt_pin(&mut self) -> Result<Option<u8>, I2C::Error> {
        let mut flags = [0u8; 2];
        self.i2c
            .write_read(self.address, &[reg::INTFA], &mut flags)?;
        let combined = u16::from_le_bytes(flags);
        if combined == 0 {
            Ok(None)
        } else {
            Ok(Some(combined.trailing_zeros() as u8))
        }
    }

    /// Reads the capture registers, which releases the interrupt line.
    pub fn clear_interrupts(&mut self) -> Result<(), I2C::Error> {
        let mut capture = [0u8; 2];
        self.i2c
            .write_read(self.address, &[reg::INTCAPA], &mut capture)
    }

    /// Releases the bus.
    pub fn release(self) -> I2C {
        self.i2c
    }

    fn write_register(&mut self, register: u8, value: u8) -> Result<(), I2C::Error> {
        self.i2c.write(self.address, &[register, value])
    }
}

impl<I2C: I2c, INT: InputPin> ButtonSource for Mcp23017<I2C, INT> {
    type Error = ExpanderError<I2C::Error, INT::Error>;

    fn poll_button(&mut self) -> Result<Option<Keypad>, Self::Error> {
        if !self.interrupt_pending().map_err(ExpanderError::Interrupt)? {
            return Ok(None);
        }
        let Some(pin) = self.last_interrupt_pin().map_err(ExpanderError::Bus)? else {
            return Ok(None);
        };
        self.clear_interrupts().map_err(ExpanderError::Bus)?;
        Ok(Keypad::from_pin(pin))
    }
}
