//! SSD1306 OLED display implementation for ESP32.
//!
//! Shows startup milestones as text and, while running, one bar per
//! reflectance channel with a marker under the estimated line position.
//!
//! # Wiring
//!
//! - SDA → GPIO4
//! - SCL → GPIO5
//! - VCC → 3.3V
//! - GND → GND

use core::fmt::Write;

use crate::sensor::{INTENSITY_MAX, POSITION_STEP};
use crate::traits::StatusDisplay;
use embedded_graphics::{
    mono_font::{ascii::FONT_6X10, MonoTextStyle},
    pixelcolor::BinaryColor,
    prelude::*,
    primitives::{PrimitiveStyle, Rectangle},
    text::Text,
};
use esp_idf_hal::i2c::I2cDriver;
use ssd1306::{mode::BufferedGraphicsMode, prelude::*, I2CDisplayInterface, Ssd1306};

/// SSD1306 display type alias for cleaner code.
type DisplayDriver<'d> = Ssd1306<
    I2CInterface<I2cDriver<'d>>,
    DisplaySize128x64,
    BufferedGraphicsMode<DisplaySize128x64>,
>;

const WIDTH: i32 = 128;
const BAR_TOP: i32 = 14;
const BAR_BOTTOM: i32 = 56;
const MARKER_Y: i32 = 59;

/// SSD1306 OLED display for ESP32.
///
/// # Display Layout
///
/// ```text
/// ┌────────────────────────────┐
/// │ Pos: 2000                  │
/// │        ██                  │  Bars: channel 4 left,
/// │   ██   ██   ██             │  channel 0 right
/// │   ██   ██   ██   ▁▁   ▁▁   │
/// │         ^                  │  Line position marker
/// └────────────────────────────┘
/// ```
pub struct Esp32Display<'d> {
    display: DisplayDriver<'d>,
}

impl<'d> Esp32Display<'d> {
    /// Creates a new display instance.
    ///
    /// # Arguments
    ///
    /// * `i2c` - I2C driver dedicated to the display
    pub fn new(i2c: I2cDriver<'d>) -> Result<Self, DisplayError> {
        let interface = I2CDisplayInterface::new(i2c);
        let display = Ssd1306::new(interface, DisplaySize128x64, DisplayRotation::Rotate0)
            .into_buffered_graphics_mode();

        Ok(Self { display })
    }
}

impl StatusDisplay for Esp32Display<'_> {
    type Error = DisplayError;

    fn init(&mut self) -> Result<(), Self::Error> {
        self.display.init()?;
        self.clear()
    }

    fn clear(&mut self) -> Result<(), Self::Error> {
        self.display.clear(BinaryColor::Off)?;
        self.display.flush()?;
        Ok(())
    }

    fn show_message(&mut self, line1: &str, line2: Option<&str>) -> Result<(), Self::Error> {
        self.display.clear(BinaryColor::Off)?;

        let text_style = MonoTextStyle::new(&FONT_6X10, BinaryColor::On);

        Text::new(line1, Point::new(4, 24), text_style).draw(&mut self.display)?;

        if let Some(l2) = line2 {
            Text::new(l2, Point::new(4, 40), text_style).draw(&mut self.display)?;
        }

        self.display.flush()?;
        Ok(())
    }

    fn render_sensors(&mut self, intensities: &[u16], position: u16) -> Result<(), Self::Error> {
        self.display.clear(BinaryColor::Off)?;

        let text_style = MonoTextStyle::new(&FONT_6X10, BinaryColor::On);
        let fill_style = PrimitiveStyle::with_fill(BinaryColor::On);

        let mut label: heapless::String<16> = heapless::String::new();
        let _ = write!(label, "Pos: {}", position);
        Text::new(&label, Point::new(4, 10), text_style).draw(&mut self.display)?;

        let n = intensities.len() as i32;
        if n == 0 {
            self.display.flush()?;
            return Ok(());
        }

        // Channel 0 is the right-most sensor, so draw right to left
        let slot = WIDTH / n;
        let bar_width = (slot - 4).max(1);
        let max_height = BAR_BOTTOM - BAR_TOP;
        for (i, &value) in intensities.iter().enumerate() {
            let x = WIDTH - (i as i32 + 1) * slot + 2;
            let value = i32::from(value.min(INTENSITY_MAX));
            let height = (value * max_height / i32::from(INTENSITY_MAX)).max(1);
            Rectangle::new(
                Point::new(x, BAR_BOTTOM - height),
                Size::new(bar_width as u32, height as u32),
            )
            .into_styled(fill_style)
            .draw(&mut self.display)?;
        }

        let max_position = (n - 1) * POSITION_STEP;
        let center_x = if max_position > 0 {
            let offset = i32::from(position).min(max_position) * (WIDTH - slot) / max_position;
            WIDTH - slot / 2 - offset
        } else {
            WIDTH / 2
        };
        Rectangle::new(Point::new(center_x - 2, MARKER_Y), Size::new(4, 4))
            .into_styled(fill_style)
            .draw(&mut self.display)?;

        self.display.flush()?;
        Ok(())
    }
}

/// Display error type.
#[derive(Debug)]
pub struct DisplayError;

impl From<display_interface::DisplayError> for DisplayError {
    fn from(_: display_interface::DisplayError) -> Self {
        DisplayError
    }
}
