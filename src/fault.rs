//! Optional line-lost detection.
//!
//! When the array loses the line, the position estimate pins to one end of
//! its range. A few pinned cycles are a normal sharp turn; a long run of
//! them means the robot left the track. [`SaturationMonitor`] counts
//! consecutive pinned readings and reports [`SensorFault::LineLost`] once a
//! threshold is reached. Any reading off the range ends clears it.
//!
//! # Example
//!
//! ```rust
//! use speedybee::fault::{SaturationMonitor, SensorFault};
//!
//! let mut monitor = SaturationMonitor::new(3, 4000);
//! assert_eq!(monitor.observe(4000), None);
//! assert_eq!(monitor.observe(4000), None);
//! assert_eq!(monitor.observe(4000), Some(SensorFault::LineLost));
//!
//! // Line found again
//! assert_eq!(monitor.observe(3200), None);
//! ```

use core::fmt;

/// Sensor conditions the control loop reacts to.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum SensorFault {
    /// Position pinned at a range end for too many consecutive cycles.
    LineLost,
}

impl fmt::Display for SensorFault {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SensorFault::LineLost => f.write_str("line lost"),
        }
    }
}

/// Counts consecutive range-end readings.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SaturationMonitor {
    threshold: u32,
    max_position: i32,
    pinned: u32,
}

impl SaturationMonitor {
    /// Creates a monitor. A `threshold` of 0 disables detection.
    pub const fn new(threshold: u32, max_position: i32) -> Self {
        Self {
            threshold,
            max_position,
            pinned: 0,
        }
    }

    /// Feeds one position and returns the active fault, if any.
    pub fn observe(&mut self, position: i32) -> Option<SensorFault> {
        if self.threshold == 0 {
            return None;
        }
        if position <= 0 || position >= self.max_position {
            self.pinned = self.pinned.saturating_add(1);
        } else {
            self.pinned = 0;
        }
        self.active_fault()
    }

    /// Fault currently in effect.
    pub fn active_fault(&self) -> Option<SensorFault> {
        if self.threshold > 0 && self.pinned >= self.threshold {
            Some(SensorFault::LineLost)
        } else {
            None
        }
    }

    /// Consecutive pinned readings so far.
    pub fn pinned_cycles(&self) -> u32 {
        self.pinned
    }

    /// Clears the count.
    pub fn reset(&mut self) {
        self.pinned = 0;
    }
}
