//! Display abstraction for status and sensor visualization.
//!
//! This module defines the [`StatusDisplay`] trait for rendering startup
//! milestones and live sensor data to a small display (OLED, LCD, etc.).

/// Display trait for status messages and sensor bars.
///
/// Implementors provide hardware-specific rendering for displays like
/// SSD1306 OLED or simulated displays for testing. Nothing in the control
/// loop depends on the display; rendering failures are reported but never
/// stop the robot.
///
/// # Example
///
/// ```ignore
/// use speedybee::traits::StatusDisplay;
///
/// struct MyDisplay { /* ... */ }
///
/// impl StatusDisplay for MyDisplay {
///     type Error = ();
///
///     fn init(&mut self) -> Result<(), ()> { Ok(()) }
///     fn clear(&mut self) -> Result<(), ()> { Ok(()) }
///     fn show_message(&mut self, line1: &str, line2: Option<&str>) -> Result<(), ()> {
///         Ok(())
///     }
///     fn render_sensors(&mut self, intensities: &[u16], position: u16) -> Result<(), ()> {
///         // Draw one bar per channel, plus a position marker...
///         Ok(())
///     }
/// }
/// ```
pub trait StatusDisplay {
    /// Error type for display operations.
    type Error;

    /// Initializes the display hardware.
    ///
    /// Called once at startup.
    fn init(&mut self) -> Result<(), Self::Error>;

    /// Clears the display.
    fn clear(&mut self) -> Result<(), Self::Error>;

    /// Shows a simple message (startup, calibration, faults).
    ///
    /// # Arguments
    ///
    /// * `line1` - First line of text
    /// * `line2` - Optional second line of text
    fn show_message(&mut self, line1: &str, line2: Option<&str>) -> Result<(), Self::Error>;

    /// Renders per-channel intensities (`0..=1000`) and the line position.
    fn render_sensors(&mut self, intensities: &[u16], position: u16) -> Result<(), Self::Error>;
}
