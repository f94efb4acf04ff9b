//! Mapping from signed wheel speeds to H-bridge outputs.
//!
//! A TB6612-style bridge takes two direction inputs and one PWM input per
//! motor channel:
//!
//! | Speed | IN1 | IN2 | PWM |
//! |-------|-----|-----|-----|
//! | `> 0` | low | high | `speed` |
//! | `< 0` | high | low | `-speed` |
//! | `0` | low | low | 0 |

use crate::traits::Direction;

/// Bridge state for one wheel.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub struct WheelOutput {
    /// Rotation direction (sets the two bridge inputs).
    pub direction: Direction,
    /// PWM duty, `0..=max_duty`.
    pub duty: u32,
}

impl WheelOutput {
    /// Converts a signed speed into direction and duty, saturating at `max_duty`.
    ///
    /// ```
    /// use speedybee::motor::WheelOutput;
    /// use speedybee::Direction;
    ///
    /// let out = WheelOutput::from_speed(-120, 255);
    /// assert_eq!(out.direction, Direction::Reverse);
    /// assert_eq!(out.duty, 120);
    ///
    /// assert_eq!(WheelOutput::from_speed(400, 255).duty, 255);
    /// assert_eq!(WheelOutput::from_speed(0, 255).direction, Direction::Stopped);
    /// ```
    pub fn from_speed(speed: i32, max_duty: u32) -> Self {
        let direction = match speed {
            s if s > 0 => Direction::Forward,
            s if s < 0 => Direction::Reverse,
            _ => Direction::Stopped,
        };
        Self {
            direction,
            duty: speed.unsigned_abs().min(max_duty),
        }
    }

    /// Logic levels for the two bridge inputs `(in1, in2)`.
    pub const fn input_levels(&self) -> (bool, bool) {
        match self.direction {
            Direction::Forward => (false, true),
            Direction::Reverse => (true, false),
            Direction::Stopped => (false, false),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn forward_levels() {
        let out = WheelOutput::from_speed(60, 255);
        assert_eq!(out.direction, Direction::Forward);
        assert_eq!(out.duty, 60);
        assert_eq!(out.input_levels(), (false, true));
    }

    #[test]
    fn reverse_levels() {
        let out = WheelOutput::from_speed(-200, 255);
        assert_eq!(out.duty, 200);
        assert_eq!(out.input_levels(), (true, false));
    }

    #[test]
    fn zero_brakes() {
        let out = WheelOutput::from_speed(0, 255);
        assert_eq!(out, WheelOutput::default());
        assert_eq!(out.input_levels(), (false, false));
    }

    #[test]
    fn extreme_values_saturate() {
        assert_eq!(WheelOutput::from_speed(i32::MIN, 1023).duty, 1023);
        assert_eq!(WheelOutput::from_speed(i32::MAX, 1023).duty, 1023);
    }
}
