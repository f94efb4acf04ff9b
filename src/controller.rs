//! Line-position steering controller.
//!
//! Converts one line position per cycle into a pair of wheel speeds. The
//! pipeline, in order:
//!
//! 1. `error = position - center`
//! 2. Low-pass filter: `filtered = alpha * filtered_prev + (1 - alpha) * error`
//! 3. Cubic-sigmoid shaping of the filtered error (see [`shape_error`])
//! 4. PD correction: `kp * shaped + kd * (filtered - last_filtered)`
//! 5. Differential mapping: `left = base - turn_scale * correction`,
//!    `right = base + turn_scale * correction`
//! 6. Round to nearest and clamp both speeds to `[-max_speed, max_speed]`
//! 7. `last_filtered = filtered`
//!
//! # Sign Convention
//!
//! Channel 0 of the array is the right-most sensor. A position above center
//! therefore means the line is to the robot's left, the error is positive,
//! and a positive correction speeds up the right wheel to turn left.
//!
//! # Example
//!
//! ```rust
//! use speedybee::config::ControlParams;
//! use speedybee::controller::{LineController, MotorCommand};
//!
//! let params = ControlParams::default()
//!     .with_gains(1.0, 0.0)
//!     .with_alpha(0.5)
//!     .with_base_speed(100)
//!     .with_max_speed(200);
//! let mut controller = LineController::new(params, 2000).unwrap();
//!
//! // Centered: no correction
//! assert_eq!(controller.update(2000), MotorCommand::new(100, 100));
//! ```
//!
//! # Limitations
//!
//! The controller trusts its input. A stuck or saturated sensor looks the
//! same as a hard turn; see [`crate::fault`] for the optional detector.

#[cfg(not(feature = "std"))]
#[allow(unused_imports)]
use micromath::F32Ext;

use crate::config::{ConfigError, ControlParams};
use crate::telemetry::CycleTelemetry;

/// Wheel speed pair for one cycle.
///
/// Both speeds are clamped to `[-max_speed, max_speed]`; sign selects
/// rotation direction.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct MotorCommand {
    /// Left wheel speed.
    pub left: i32,
    /// Right wheel speed.
    pub right: i32,
}

impl MotorCommand {
    /// Both wheels stopped.
    pub const STOP: Self = Self { left: 0, right: 0 };

    /// Creates a command.
    #[inline]
    pub const fn new(left: i32, right: i32) -> Self {
        Self { left, right }
    }

    /// Swaps the wheels, as seen by a mirrored robot.
    #[inline]
    pub const fn mirrored(self) -> Self {
        Self {
            left: self.right,
            right: self.left,
        }
    }
}

/// Saturating odd shaping curve: `u / (1 + |u|)` with `u = (e / scale)^3`.
///
/// Near-flat around zero so small tracking errors barely steer, and bounded
/// by ±1 so a dropout or sharp turn cannot drive the correction without
/// limit. Reaches ±0.5 at `e = ±scale`.
///
/// ```
/// use speedybee::controller::shape_error;
///
/// assert_eq!(shape_error(0.0, 600.0), 0.0);
/// assert!((shape_error(600.0, 600.0) - 0.5).abs() < 1e-6);
/// assert!(shape_error(1.0e6, 600.0) <= 1.0);
/// ```
pub fn shape_error(error: f32, scale: f32) -> f32 {
    let x = error / scale;
    let cube = x * x * x;
    if cube.is_infinite() {
        return if cube > 0.0 { 1.0 } else { -1.0 };
    }
    cube / (1.0 + cube.abs())
}

/// Clamps a speed into `[-max, max]`.
#[inline]
pub fn clamp_speed(speed: i32, max: i32) -> i32 {
    let max = max.max(0);
    speed.clamp(-max, max)
}

/// Rounds a float speed to the nearest integer, saturating at the `i32` range.
#[inline]
fn to_speed(value: f32) -> i32 {
    value.round() as i32
}

/// Base speed after optional modulation by error magnitude.
fn effective_base_speed(params: &ControlParams, filtered_error: f32) -> f32 {
    let base = params.base_speed as f32;
    match params.speed_modulation {
        None => base,
        Some(m) => {
            let x = (filtered_error / m.scale).abs();
            base + m.gain * (m.offset - (x / (1.0 + x)).sqrt())
        }
    }
}

/// Filter and derivative memory carried across cycles.
///
/// Both fields start at zero. Each cycle updates the filter first, then
/// uses `last_error` for the derivative, then overwrites `last_error`.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ControllerState {
    /// Exponentially smoothed error, in position units.
    pub filtered_error: f32,
    /// Filtered error from the previous cycle.
    pub last_error: f32,
}

impl ControllerState {
    /// Validates `params` and returns a zeroed state.
    pub fn initialize(params: &ControlParams) -> Result<Self, ConfigError> {
        params.validate()?;
        Ok(Self::default())
    }

    /// Creates a state with explicit memory, e.g. to resume or mirror a run.
    pub const fn with_errors(filtered_error: f32, last_error: f32) -> Self {
        Self {
            filtered_error,
            last_error,
        }
    }

    /// Runs one cycle and returns only the wheel command.
    ///
    /// `position` must already be clamped to the sensor range.
    pub fn update(&mut self, params: &ControlParams, position: i32, center: i32) -> MotorCommand {
        self.step(params, position, center).command()
    }

    /// Runs one cycle and returns every intermediate value.
    ///
    /// Never panics: an error beyond the `i32` range saturates.
    pub fn step(&mut self, params: &ControlParams, position: i32, center: i32) -> CycleTelemetry {
        let raw_error = position.saturating_sub(center);
        let error = raw_error as f32;

        let filtered = params.alpha * self.filtered_error + (1.0 - params.alpha) * error;
        let shaped = shape_error(filtered, params.shape_scale);
        let correction = params.kp * shaped + params.kd * (filtered - self.last_error);

        let base = effective_base_speed(params, filtered);
        let contribution = correction * params.turn_scale;
        let left = clamp_speed(to_speed(base - contribution), params.max_speed);
        let right = clamp_speed(to_speed(base + contribution), params.max_speed);

        self.filtered_error = filtered;
        self.last_error = filtered;

        CycleTelemetry {
            position,
            raw_error,
            filtered_error: filtered,
            shaped_error: shaped,
            correction,
            base_speed: base,
            left,
            right,
        }
    }
}

/// Controller bundled with its parameters and center position.
#[derive(Clone, Debug)]
pub struct LineController {
    params: ControlParams,
    center: i32,
    state: ControllerState,
}

impl LineController {
    /// Validates the parameters and creates a zeroed controller.
    ///
    /// `center` must lie in the range a [`LineReading`] can report.
    ///
    /// [`LineReading`]: crate::traits::LineReading
    pub fn new(params: ControlParams, center: i32) -> Result<Self, ConfigError> {
        let state = ControllerState::initialize(&params)?;
        let max = i32::from(u16::MAX);
        if !(0..=max).contains(&center) {
            return Err(ConfigError::CenterOutOfRange { center, max });
        }
        Ok(Self {
            params,
            center,
            state,
        })
    }

    /// Runs one cycle, returning the wheel command.
    pub fn update(&mut self, position: i32) -> MotorCommand {
        self.state.update(&self.params, position, self.center)
    }

    /// Runs one cycle, returning the full breakdown.
    pub fn step(&mut self, position: i32) -> CycleTelemetry {
        self.state.step(&self.params, position, self.center)
    }

    /// Zeroes filter and derivative memory.
    pub fn reset(&mut self) {
        self.state = ControllerState::default();
    }

    /// Current state.
    pub fn state(&self) -> &ControllerState {
        &self.state
    }

    /// Tuning in effect.
    pub fn params(&self) -> &ControlParams {
        &self.params
    }

    /// Position treated as centered.
    pub fn center(&self) -> i32 {
        self.center
    }
}
