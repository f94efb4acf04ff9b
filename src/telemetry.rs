//! Per-cycle controller telemetry.
//!
//! Every control cycle can report its intermediate values. The text form is
//! one CSV line (`pos,err,filt,shaped,corr,left,right`) meant for a serial
//! console; the JSON form (feature `serde-json-core`) is for host tools.
//! Neither is a stable machine format.

use core::fmt::{self, Write};

use heapless::String as HString;

use crate::controller::MotorCommand;

/// Capacity of a CSV telemetry line.
pub const LINE_CAPACITY: usize = 96;

/// Capacity of a JSON telemetry record.
pub const JSON_CAPACITY: usize = 192;

/// Intermediate values of one control cycle.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CycleTelemetry {
    /// Clamped line position fed to the controller.
    pub position: i32,
    /// `position - center`.
    pub raw_error: i32,
    /// Low-pass filtered error.
    pub filtered_error: f32,
    /// Filtered error after the shaping curve, in `(-1, 1)`.
    pub shaped_error: f32,
    /// PD correction before turn scaling.
    pub correction: f32,
    /// Base speed after optional modulation.
    pub base_speed: f32,
    /// Left wheel command.
    pub left: i32,
    /// Right wheel command.
    pub right: i32,
}

impl CycleTelemetry {
    /// The wheel command produced this cycle.
    #[inline]
    pub const fn command(&self) -> MotorCommand {
        MotorCommand::new(self.left, self.right)
    }

    /// Formats the CSV line without heap allocation.
    ///
    /// ```
    /// use speedybee::telemetry::CycleTelemetry;
    ///
    /// let t = CycleTelemetry {
    ///     position: 2600,
    ///     raw_error: 600,
    ///     filtered_error: 300.0,
    ///     shaped_error: 0.111,
    ///     correction: 10.0,
    ///     base_speed: 100.0,
    ///     left: 90,
    ///     right: 110,
    /// };
    /// assert_eq!(t.to_line().as_str(), "2600,600,300.00,0.111,10.00,90,110");
    /// ```
    pub fn to_line(&self) -> HString<LINE_CAPACITY> {
        let mut line = HString::new();
        // Values are range-bounded; the line always fits
        let _ = write!(line, "{}", self);
        line
    }

    /// Serializes the record as JSON.
    #[cfg(feature = "serde-json-core")]
    pub fn to_json(&self) -> Result<HString<JSON_CAPACITY>, TelemetryError> {
        serde_json_core::to_string(self).map_err(|_| TelemetryError::BufferFull)
    }
}

impl fmt::Display for CycleTelemetry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{},{},{:.2},{:.3},{:.2},{},{}",
            self.position,
            self.raw_error,
            self.filtered_error,
            self.shaped_error,
            self.correction,
            self.left,
            self.right
        )
    }
}

/// Telemetry encoding failure.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TelemetryError {
    /// The record does not fit the output buffer.
    BufferFull,
}

impl fmt::Display for TelemetryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TelemetryError::BufferFull => f.write_str("telemetry buffer full"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn negative_values_format() {
        let t = CycleTelemetry {
            position: 0,
            raw_error: -2000,
            filtered_error: -1234.5678,
            shaped_error: -0.9,
            correction: -81.0,
            base_speed: 60.0,
            left: 141,
            right: -21,
        };
        assert_eq!(t.to_line().as_str(), "0,-2000,-1234.57,-0.900,-81.00,141,-21");
    }

    #[test]
    fn worst_case_line_fits() {
        let t = CycleTelemetry {
            position: i32::MIN,
            raw_error: i32::MIN,
            filtered_error: -99999.99,
            shaped_error: -0.999,
            correction: -99999.99,
            base_speed: 0.0,
            left: i32::MIN,
            right: i32::MIN,
        };
        assert!(t.to_line().ends_with(&std::format!("{}", i32::MIN)));
    }

    #[test]
    fn command_matches_fields() {
        let t = CycleTelemetry {
            left: 12,
            right: -4,
            ..Default::default()
        };
        assert_eq!(t.command(), MotorCommand::new(12, -4));
    }

    #[cfg(feature = "serde-json-core")]
    #[test]
    fn json_contains_wheel_speeds() {
        let t = CycleTelemetry {
            position: 2600,
            left: 90,
            right: 110,
            ..Default::default()
        };
        let json = t.to_json().unwrap();
        assert!(json.contains("\"position\":2600"));
        assert!(json.contains("\"left\":90"));
        assert!(json.contains("\"right\":110"));
    }
}
