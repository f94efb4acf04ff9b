//! Robot configuration: control tuning, sensor array layout, and loop timing.
//!
//! Uses `heapless::String` for `no_std` compatibility while remaining
//! ergonomic to use on desktop with `std`. All values are fixed for the
//! lifetime of a run; [`RobotConfig::validate`] is the only fail-fast path
//! and must pass before the control loop starts.
//!
//! # Example
//!
//! ```rust
//! use speedybee::config::{ControlParams, LoopConfig, RobotConfig};
//!
//! // Use the tuned defaults
//! let config = RobotConfig::default();
//! assert!(config.validate().is_ok());
//!
//! // Or customize
//! let config = RobotConfig::default()
//!     .with_control(ControlParams::default().with_gains(45.0, 0.5))
//!     .with_loop(LoopConfig::default().with_cycle_delay_ms(10));
//! assert_eq!(config.looping.cycle_delay_ms, 10);
//! ```

use core::fmt;

use heapless::String as HString;

use crate::sensor::{LinePolarity, MAX_CHANNELS, POSITION_STEP};

/// Maximum length for short config strings (robot name)
pub const MAX_SHORT_STRING: usize = 32;

/// Type alias for short config strings
pub type ShortString = HString<MAX_SHORT_STRING>;

/// Create a ShortString from a &str, truncating if too long
pub fn short_string(s: &str) -> ShortString {
    let mut hs = ShortString::new();
    let take = s.len().min(MAX_SHORT_STRING);
    // Find valid UTF-8 boundary
    let valid_end = s
        .char_indices()
        .take_while(|(i, c)| i + c.len_utf8() <= take)
        .last()
        .map(|(i, c)| i + c.len_utf8())
        .unwrap_or(0);
    let _ = hs.push_str(&s[..valid_end]);
    hs
}

// ============================================================================
// Errors
// ============================================================================

/// Invalid tuning or layout parameters, detected once at startup.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum ConfigError {
    /// Smoothing factor must lie strictly inside (0, 1).
    AlphaOutOfRange(f32),
    /// Speed clamp bound must be positive.
    NonPositiveMaxSpeed(i32),
    /// Error shaping scale must be positive.
    NonPositiveShapeScale,
    /// A gain or scale factor is NaN or infinite.
    NonFiniteGain,
    /// Sensor array needs at least one channel.
    NoChannels,
    /// More channels than the driver supports.
    TooManyChannels(usize),
    /// Center position lies outside the sensor range.
    CenterOutOfRange {
        /// Configured center.
        center: i32,
        /// Largest position the array can report.
        max: i32,
    },
    /// Inter-cycle delay outside `1..=1000` ms.
    CycleDelayOutOfRange(u32),
    /// Configured channel count differs from the attached array.
    ChannelMismatch {
        /// Channels in the configuration.
        configured: usize,
        /// Channels the sensor reports.
        sensor: usize,
    },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::AlphaOutOfRange(a) => write!(f, "alpha {} outside (0, 1)", a),
            ConfigError::NonPositiveMaxSpeed(m) => write!(f, "max speed {} must be > 0", m),
            ConfigError::NonPositiveShapeScale => f.write_str("shape scale must be > 0"),
            ConfigError::NonFiniteGain => f.write_str("gains must be finite"),
            ConfigError::NoChannels => f.write_str("sensor array has no channels"),
            ConfigError::TooManyChannels(n) => {
                write!(f, "{} channels exceeds the supported {}", n, MAX_CHANNELS)
            }
            ConfigError::CenterOutOfRange { center, max } => {
                write!(f, "center {} outside sensor range 0..={}", center, max)
            }
            ConfigError::CycleDelayOutOfRange(ms) => {
                write!(f, "cycle delay {}ms outside 1..=1000", ms)
            }
            ConfigError::ChannelMismatch { configured, sensor } => write!(
                f,
                "configured {} channels but the array has {}",
                configured, sensor
            ),
        }
    }
}

/// Failure while loading configuration from JSON.
#[cfg(feature = "serde-json-core")]
#[derive(Debug)]
pub enum ConfigLoadError {
    /// The document is not valid JSON for [`RobotConfig`].
    Parse(serde_json_core::de::Error),
    /// The document parsed but holds invalid values.
    Invalid(ConfigError),
}

#[cfg(feature = "serde-json-core")]
impl fmt::Display for ConfigLoadError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigLoadError::Parse(e) => write!(f, "config parse error: {}", e),
            ConfigLoadError::Invalid(e) => write!(f, "invalid config: {}", e),
        }
    }
}

// ============================================================================
// Main Config
// ============================================================================

/// Complete robot configuration
#[derive(Clone, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct RobotConfig {
    /// Steering controller tuning
    pub control: ControlParams,
    /// Reflectance array layout
    pub sensor: SensorConfig,
    /// Main loop timing and diagnostics
    pub looping: LoopConfig,
    /// Device identification
    pub device: DeviceConfig,
}

impl RobotConfig {
    /// Set control configuration
    pub fn with_control(mut self, control: ControlParams) -> Self {
        self.control = control;
        self
    }

    /// Set sensor configuration
    pub fn with_sensor(mut self, sensor: SensorConfig) -> Self {
        self.sensor = sensor;
        self
    }

    /// Set loop configuration
    pub fn with_loop(mut self, looping: LoopConfig) -> Self {
        self.looping = looping;
        self
    }

    /// Set device configuration
    pub fn with_device(mut self, device: DeviceConfig) -> Self {
        self.device = device;
        self
    }

    /// Checks every section. Values are never silently clamped.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.control.validate()?;
        self.sensor.validate()?;
        self.looping.validate()
    }

    /// Parses a JSON document and validates the result.
    ///
    /// Missing fields fall back to their defaults.
    ///
    /// ```rust
    /// use speedybee::config::RobotConfig;
    ///
    /// let json = br#"{"control":{"kp":40.0,"alpha":0.7}}"#;
    /// let config = RobotConfig::from_json(json).unwrap();
    /// assert_eq!(config.control.kp, 40.0);
    /// assert_eq!(config.sensor.channel_count, 5);
    /// ```
    #[cfg(feature = "serde-json-core")]
    pub fn from_json(bytes: &[u8]) -> Result<Self, ConfigLoadError> {
        let (config, _) =
            serde_json_core::from_slice::<RobotConfig>(bytes).map_err(ConfigLoadError::Parse)?;
        config.validate().map_err(ConfigLoadError::Invalid)?;
        Ok(config)
    }
}

// ============================================================================
// Control Params
// ============================================================================

/// Secondary base-speed modulation by error magnitude.
///
/// `base = base_speed + gain * (offset - sqrt(|x| / (1 + |x|)))` with
/// `x = filtered_error / scale`. Slows the robot in curves and lets it run
/// slightly faster on straights.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SpeedModulation {
    /// Speed units added per unit of modulation
    pub gain: f32,
    /// Modulation value at zero error
    pub offset: f32,
    /// Error scale of the modulation curve
    pub scale: f32,
}

impl Default for SpeedModulation {
    fn default() -> Self {
        Self {
            gain: 20.0,
            offset: 0.15,
            scale: 300.0,
        }
    }
}

/// Steering controller tuning.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct ControlParams {
    /// Proportional gain applied to the shaped error
    pub kp: f32,
    /// Derivative gain applied to the change in filtered error
    pub kd: f32,
    /// Low-pass smoothing factor, strictly inside (0, 1)
    pub alpha: f32,
    /// Forward speed of both wheels with no correction
    pub base_speed: i32,
    /// Multiplier applied to the correction before it splits across wheels
    pub turn_scale: f32,
    /// Symmetric clamp bound for wheel speeds
    pub max_speed: i32,
    /// Error magnitude at which the shaping curve reaches half its range
    pub shape_scale: f32,
    /// Optional base-speed modulation; `None` holds base speed constant
    pub speed_modulation: Option<SpeedModulation>,
}

impl Default for ControlParams {
    fn default() -> Self {
        Self {
            kp: 90.0,
            kd: 0.35,
            alpha: 0.82,
            base_speed: 60,
            turn_scale: 1.0,
            max_speed: 200,
            shape_scale: 600.0,
            speed_modulation: None,
        }
    }
}

impl ControlParams {
    /// Set proportional and derivative gains
    pub fn with_gains(mut self, kp: f32, kd: f32) -> Self {
        self.kp = kp;
        self.kd = kd;
        self
    }

    /// Set the smoothing factor
    pub fn with_alpha(mut self, alpha: f32) -> Self {
        self.alpha = alpha;
        self
    }

    /// Set the base speed
    pub fn with_base_speed(mut self, speed: i32) -> Self {
        self.base_speed = speed;
        self
    }

    /// Set the turn scale
    pub fn with_turn_scale(mut self, scale: f32) -> Self {
        self.turn_scale = scale;
        self
    }

    /// Set the speed clamp bound
    pub fn with_max_speed(mut self, max: i32) -> Self {
        self.max_speed = max;
        self
    }

    /// Set the shaping scale
    pub fn with_shape_scale(mut self, scale: f32) -> Self {
        self.shape_scale = scale;
        self
    }

    /// Enable or disable base-speed modulation
    pub fn with_speed_modulation(mut self, modulation: Option<SpeedModulation>) -> Self {
        self.speed_modulation = modulation;
        self
    }

    /// Rejects parameters the controller cannot run with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        // NaN fails both comparisons and lands here too
        if !(self.alpha > 0.0 && self.alpha < 1.0) {
            return Err(ConfigError::AlphaOutOfRange(self.alpha));
        }
        if self.max_speed <= 0 {
            return Err(ConfigError::NonPositiveMaxSpeed(self.max_speed));
        }
        if !self.kp.is_finite() || !self.kd.is_finite() || !self.turn_scale.is_finite() {
            return Err(ConfigError::NonFiniteGain);
        }
        if !(self.shape_scale > 0.0) || !self.shape_scale.is_finite() {
            return Err(ConfigError::NonPositiveShapeScale);
        }
        if let Some(m) = self.speed_modulation {
            if !m.gain.is_finite() || !m.offset.is_finite() || !(m.scale > 0.0) {
                return Err(ConfigError::NonFiniteGain);
            }
        }
        Ok(())
    }
}

// ============================================================================
// Sensor Config
// ============================================================================

/// Reflectance array layout and calibration.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct SensorConfig {
    /// Number of reflectance channels
    pub channel_count: usize,
    /// Position that means the line is centered
    pub center_position: i32,
    /// Line color relative to the floor
    pub polarity: LinePolarity,
    /// Read cycles performed during calibration
    pub calibration_samples: u16,
    /// Normalized values at or below this are treated as floor
    pub noise_floor: u16,
}

impl Default for SensorConfig {
    fn default() -> Self {
        Self {
            channel_count: 5,
            center_position: 2000,
            polarity: LinePolarity::DarkOnLight,
            calibration_samples: 150,
            noise_floor: 50,
        }
    }
}

impl SensorConfig {
    /// Set the channel count and center the line position on the array
    pub fn with_channels(mut self, count: usize) -> Self {
        self.channel_count = count;
        self.center_position = (count.saturating_sub(1) as i32 * POSITION_STEP) / 2;
        self
    }

    /// Set the center position explicitly
    pub fn with_center(mut self, center: i32) -> Self {
        self.center_position = center;
        self
    }

    /// Set the line polarity
    pub fn with_polarity(mut self, polarity: LinePolarity) -> Self {
        self.polarity = polarity;
        self
    }

    /// Set the calibration sample count
    pub fn with_calibration_samples(mut self, samples: u16) -> Self {
        self.calibration_samples = samples;
        self
    }

    /// Largest position the array reports: `(channels - 1) * 1000`.
    pub fn max_position(&self) -> i32 {
        self.channel_count.saturating_sub(1) as i32 * POSITION_STEP
    }

    /// Rejects layouts the sensor driver cannot represent.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.channel_count == 0 {
            return Err(ConfigError::NoChannels);
        }
        if self.channel_count > MAX_CHANNELS {
            return Err(ConfigError::TooManyChannels(self.channel_count));
        }
        let max = self.max_position();
        if self.center_position < 0 || self.center_position > max {
            return Err(ConfigError::CenterOutOfRange {
                center: self.center_position,
                max,
            });
        }
        Ok(())
    }
}

// ============================================================================
// Loop Config
// ============================================================================

/// Main loop timing and diagnostics.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct LoopConfig {
    /// Fixed delay between control cycles in milliseconds
    pub cycle_delay_ms: u32,
    /// Emit per-cycle telemetry at debug level
    pub telemetry: bool,
    /// Consecutive pinned readings before a line-lost fault (0 = disabled)
    pub line_lost_cycles: u32,
}

impl Default for LoopConfig {
    fn default() -> Self {
        Self {
            cycle_delay_ms: 5,
            telemetry: false,
            line_lost_cycles: 0,
        }
    }
}

impl LoopConfig {
    /// Set the inter-cycle delay
    pub fn with_cycle_delay_ms(mut self, ms: u32) -> Self {
        self.cycle_delay_ms = ms;
        self
    }

    /// Enable or disable telemetry
    pub fn with_telemetry(mut self, enabled: bool) -> Self {
        self.telemetry = enabled;
        self
    }

    /// Set the line-lost threshold (0 disables detection)
    pub fn with_line_lost_cycles(mut self, cycles: u32) -> Self {
        self.line_lost_cycles = cycles;
        self
    }

    /// Rejects delays outside `1..=1000` ms.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(1..=1000).contains(&self.cycle_delay_ms) {
            return Err(ConfigError::CycleDelayOutOfRange(self.cycle_delay_ms));
        }
        Ok(())
    }
}

// ============================================================================
// Device Config
// ============================================================================

/// Device identification configuration
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct DeviceConfig {
    /// Name shown on the display at startup
    pub name: ShortString,
}

impl Default for DeviceConfig {
    fn default() -> Self {
        Self {
            name: short_string("SpeedyBee!"),
        }
    }
}

impl DeviceConfig {
    /// Set the device name
    pub fn with_name(mut self, name: &str) -> Self {
        self.name = short_string(name);
        self
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        let config = RobotConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.control.kp, 90.0);
        assert_eq!(config.sensor.center_position, 2000);
        assert_eq!(config.looping.cycle_delay_ms, 5);
    }

    #[test]
    fn alpha_outside_open_interval_rejected() {
        for alpha in [0.0, 1.0, 1.5, -0.2, f32::NAN] {
            let params = ControlParams::default().with_alpha(alpha);
            assert!(matches!(
                params.validate(),
                Err(ConfigError::AlphaOutOfRange(_))
            ));
        }
    }

    #[test]
    fn zero_max_speed_rejected() {
        let params = ControlParams::default().with_alpha(0.5).with_max_speed(0);
        assert_eq!(params.validate(), Err(ConfigError::NonPositiveMaxSpeed(0)));
    }

    #[test]
    fn non_finite_gain_rejected() {
        let params = ControlParams::default().with_gains(f32::INFINITY, 0.0);
        assert_eq!(params.validate(), Err(ConfigError::NonFiniteGain));
    }

    #[test]
    fn shape_scale_must_be_positive() {
        let params = ControlParams::default().with_shape_scale(0.0);
        assert_eq!(params.validate(), Err(ConfigError::NonPositiveShapeScale));
    }

    #[test]
    fn with_channels_recenters() {
        let sensor = SensorConfig::default().with_channels(8);
        assert_eq!(sensor.max_position(), 7000);
        assert_eq!(sensor.center_position, 3500);
        assert!(sensor.validate().is_ok());
    }

    #[test]
    fn sensor_layout_errors() {
        assert_eq!(
            SensorConfig::default().with_channels(0).validate(),
            Err(ConfigError::NoChannels)
        );
        assert_eq!(
            SensorConfig::default().with_channels(MAX_CHANNELS + 1).validate(),
            Err(ConfigError::TooManyChannels(MAX_CHANNELS + 1))
        );
        assert_eq!(
            SensorConfig::default().with_center(4500).validate(),
            Err(ConfigError::CenterOutOfRange {
                center: 4500,
                max: 4000
            })
        );
    }

    #[test]
    fn cycle_delay_bounds() {
        assert!(LoopConfig::default().with_cycle_delay_ms(0).validate().is_err());
        assert!(LoopConfig::default().with_cycle_delay_ms(1).validate().is_ok());
        assert!(LoopConfig::default().with_cycle_delay_ms(100).validate().is_ok());
        assert!(LoopConfig::default().with_cycle_delay_ms(1001).validate().is_err());
    }

    #[test]
    fn root_validate_reports_first_failure() {
        let config = RobotConfig::default()
            .with_control(ControlParams::default().with_alpha(1.5))
            .with_loop(LoopConfig::default().with_cycle_delay_ms(0));
        assert_eq!(config.validate(), Err(ConfigError::AlphaOutOfRange(1.5)));
    }

    #[test]
    fn short_string_truncation() {
        let long_input = "a".repeat(100);
        let s = short_string(&long_input);
        assert_eq!(s.len(), MAX_SHORT_STRING);

        // Multi-byte chars are never split
        let s = short_string(&"é".repeat(40));
        assert!(s.len() <= MAX_SHORT_STRING);
        assert!(s.chars().all(|c| c == 'é'));
    }

    #[test]
    fn builder_pattern() {
        let config = RobotConfig::default()
            .with_control(
                ControlParams::default()
                    .with_base_speed(80)
                    .with_turn_scale(0.5)
                    .with_speed_modulation(Some(SpeedModulation::default())),
            )
            .with_sensor(SensorConfig::default().with_polarity(LinePolarity::LightOnDark))
            .with_loop(LoopConfig::default().with_telemetry(true))
            .with_device(DeviceConfig::default().with_name("Bee 2"));

        assert_eq!(config.control.base_speed, 80);
        assert_eq!(config.control.turn_scale, 0.5);
        assert!(config.control.speed_modulation.is_some());
        assert_eq!(config.sensor.polarity, LinePolarity::LightOnDark);
        assert!(config.looping.telemetry);
        assert_eq!(config.device.name.as_str(), "Bee 2");
    }

    #[test]
    fn error_display() {
        let msg = std::format!("{}", ConfigError::AlphaOutOfRange(1.5));
        assert!(msg.contains("1.5"));
    }

    #[cfg(feature = "serde-json-core")]
    #[test]
    fn json_rejects_invalid_values() {
        let json = br#"{"control":{"alpha":1.5}}"#;
        assert!(matches!(
            RobotConfig::from_json(json),
            Err(ConfigLoadError::Invalid(ConfigError::AlphaOutOfRange(_)))
        ));
    }

    #[cfg(feature = "serde-json-core")]
    #[test]
    fn json_rejects_garbage() {
        assert!(matches!(
            RobotConfig::from_json(b"{not json"),
            Err(ConfigLoadError::Parse(_))
        ));
    }
}
