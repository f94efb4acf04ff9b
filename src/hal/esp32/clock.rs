//! Monotonic time from the ESP-IDF high-resolution timer.

use crate::traits::Clock;

/// Milliseconds since boot.
///
/// Used by the firmware to measure the achieved loop rate; the control law
/// itself never reads the clock.
pub struct Esp32Clock;

impl Esp32Clock {
    /// Creates a clock handle.
    #[inline]
    pub fn new() -> Self {
        Self
    }

    /// Microseconds since boot.
    #[inline]
    pub fn now_us(&self) -> i64 {
        // Safe: read-only query of the system timer
        unsafe { esp_idf_hal::sys::esp_timer_get_time() }
    }
}

impl Default for Esp32Clock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for Esp32Clock {
    #[inline]
    fn now_ms(&self) -> u64 {
        (self.now_us() / 1000) as u64
    }
}
