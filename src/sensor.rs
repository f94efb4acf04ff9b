//! Reflectance ("QTR") array: calibration and line position estimation.
//!
//! Raw readings come from a [`ReflectanceReader`]. For RC-type sensors the
//! raw value is the capacitor decay time in microseconds, so a dark surface
//! reads high. Calibration tracks per-channel min/max and normalizes each
//! channel to `0..=1000`.
//!
//! # Position Scale
//!
//! Channel `i` sits at position `i * 1000`; a five-channel array reports
//! `0..=4000` with the center at `2000`. Channel 0 is the right-most
//! sensor, so a position above center means the line is left of the robot.
//!
//! # Example
//!
//! ```rust
//! use speedybee::sensor::{estimate_position, LinePolarity};
//!
//! // Dark line under the middle channel
//! let values = [0, 0, 1000, 0, 0];
//! assert_eq!(estimate_position(&values, LinePolarity::DarkOnLight, 50, 2000), 2000);
//!
//! // Split between channels 3 and 4
//! let values = [0, 0, 0, 500, 500];
//! assert_eq!(estimate_position(&values, LinePolarity::DarkOnLight, 50, 2000), 3500);
//! ```

use heapless::Vec as HVec;

use crate::traits::{LineReading, LineSensor};

/// Largest array the driver supports.
pub const MAX_CHANNELS: usize = 8;

/// Position distance between adjacent channels.
pub const POSITION_STEP: i32 = 1000;

/// Normalized full-scale intensity.
pub const INTENSITY_MAX: u16 = 1000;

/// A channel above this normalized value means the line is seen.
pub const LINE_PRESENT_THRESHOLD: u16 = 200;

/// Line color relative to the floor.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum LinePolarity {
    /// Black tape on a white floor.
    #[default]
    DarkOnLight,
    /// White tape on a black floor.
    LightOnDark,
}

/// Raw channel reads from the physical array.
pub trait ReflectanceReader<const N: usize> {
    /// Error type for reads.
    type Error;

    /// Reads every channel once. Larger values mean less reflected light.
    fn read_raw(&mut self) -> Result<[u16; N], Self::Error>;
}

/// Per-channel dynamic range observed during calibration.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Calibration<const N: usize> {
    min: [u16; N],
    max: [u16; N],
}

impl<const N: usize> Default for Calibration<N> {
    fn default() -> Self {
        Self::new()
    }
}

impl<const N: usize> Calibration<N> {
    /// Creates an empty calibration (every channel normalizes to 0).
    pub const fn new() -> Self {
        Self {
            min: [u16::MAX; N],
            max: [0; N],
        }
    }

    /// Widens each channel's range to include `raw`.
    pub fn record(&mut self, raw: &[u16; N]) {
        for (i, &value) in raw.iter().enumerate() {
            self.min[i] = self.min[i].min(value);
            self.max[i] = self.max[i].max(value);
        }
    }

    /// True once every channel has seen a non-empty range.
    pub fn is_calibrated(&self) -> bool {
        self.min.iter().zip(self.max.iter()).all(|(lo, hi)| hi > lo)
    }

    /// Per-channel minimum.
    pub fn min(&self) -> &[u16; N] {
        &self.min
    }

    /// Per-channel maximum.
    pub fn max(&self) -> &[u16; N] {
        &self.max
    }

    /// Scales raw readings into `0..=1000`, clamping outside the range.
    ///
    /// Channels without a usable range read 0.
    pub fn normalize(&self, raw: &[u16; N]) -> [u16; N] {
        let mut out = [0u16; N];
        for (i, &value) in raw.iter().enumerate() {
            let (lo, hi) = (self.min[i], self.max[i]);
            if hi <= lo {
                continue;
            }
            let span = u32::from(hi - lo);
            let offset = u32::from(value.clamp(lo, hi) - lo);
            out[i] = (offset * u32::from(INTENSITY_MAX) / span) as u16;
        }
        out
    }
}

/// Weighted-centroid line position over normalized intensities.
///
/// Channels at or below `noise_floor` are ignored. If no channel exceeds
/// [`LINE_PRESENT_THRESHOLD`], the line is considered lost and the result
/// snaps to whichever end of the range `last` was closer to.
pub fn estimate_position(
    values: &[u16],
    polarity: LinePolarity,
    noise_floor: u16,
    last: u16,
) -> u16 {
    if values.is_empty() {
        return 0;
    }
    let max_position = (values.len() as u32 - 1) * POSITION_STEP as u32;

    let mut on_line = false;
    let mut weighted: u32 = 0;
    let mut sum: u32 = 0;

    for (i, &raw) in values.iter().enumerate() {
        let value = match polarity {
            LinePolarity::DarkOnLight => raw.min(INTENSITY_MAX),
            LinePolarity::LightOnDark => INTENSITY_MAX - raw.min(INTENSITY_MAX),
        };
        if value > LINE_PRESENT_THRESHOLD {
            on_line = true;
        }
        if value > noise_floor {
            weighted += u32::from(value) * i as u32 * POSITION_STEP as u32;
            sum += u32::from(value);
        }
    }

    if !on_line || sum == 0 {
        return if u32::from(last) < max_position / 2 {
            0
        } else {
            max_position as u16
        };
    }

    (weighted / sum) as u16
}

/// Calibrated line sensor over any [`ReflectanceReader`].
///
/// # Example
///
/// ```rust
/// use speedybee::hal::MockReflectance;
/// use speedybee::sensor::{LinePolarity, QtrArray};
/// use speedybee::traits::LineSensor;
///
/// let mut reader = MockReflectance::<5>::new();
/// // Calibration sweep: floor everywhere, then line everywhere
/// reader.queue([100; 5]);
/// reader.queue([2500; 5]);
/// // Line under channel 1
/// reader.queue([100, 2500, 100, 100, 100]);
///
/// let mut qtr = QtrArray::new(reader, LinePolarity::DarkOnLight, 50);
/// qtr.calibrate(2).unwrap();
/// let reading = qtr.read_line().unwrap();
/// assert_eq!(reading.position, 1000);
/// ```
pub struct QtrArray<R, const N: usize> {
    reader: R,
    calibration: Calibration<N>,
    polarity: LinePolarity,
    noise_floor: u16,
    last_position: u16,
}

impl<R: ReflectanceReader<N>, const N: usize> QtrArray<R, N> {
    /// Wraps a reader. The array is uncalibrated until [`LineSensor::calibrate`] runs.
    pub fn new(reader: R, polarity: LinePolarity, noise_floor: u16) -> Self {
        Self {
            reader,
            calibration: Calibration::new(),
            polarity,
            noise_floor,
            last_position: ((N.saturating_sub(1)) as i32 * POSITION_STEP / 2) as u16,
        }
    }

    /// Current calibration bounds.
    pub fn calibration(&self) -> &Calibration<N> {
        &self.calibration
    }

    /// Discards calibration bounds.
    pub fn reset_calibration(&mut self) {
        self.calibration = Calibration::new();
    }

    /// Returns the underlying reader.
    pub fn reader_mut(&mut self) -> &mut R {
        &mut self.reader
    }
}

impl<R: ReflectanceReader<N>, const N: usize> LineSensor for QtrArray<R, N> {
    type Error = R::Error;

    fn channel_count(&self) -> usize {
        N
    }

    fn calibrate(&mut self, samples: u16) -> Result<(), Self::Error> {
        for _ in 0..samples {
            let raw = self.reader.read_raw()?;
            self.calibration.record(&raw);
        }
        if self.calibration.is_calibrated() {
            log::info!("QTR calibrated over {} samples", samples);
        } else {
            log::warn!("QTR calibration incomplete: some channels saw no range");
        }
        Ok(())
    }

    fn read_line(&mut self) -> Result<LineReading, Self::Error> {
        let raw = self.reader.read_raw()?;
        let values = self.calibration.normalize(&raw);
        let position = estimate_position(&values, self.polarity, self.noise_floor, self.last_position);
        self.last_position = position;

        let mut intensities = HVec::new();
        for v in values.iter().take(MAX_CHANNELS) {
            let _ = intensities.push(*v);
        }
        Ok(LineReading {
            position,
            intensities,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn calibration_normalizes_into_range() {
        let mut cal = Calibration::<3>::new();
        cal.record(&[100, 200, 300]);
        cal.record(&[1100, 1200, 1300]);
        assert!(cal.is_calibrated());

        assert_eq!(cal.normalize(&[100, 700, 1300]), [0, 500, 1000]);
        // Outside the observed range clamps
        assert_eq!(cal.normalize(&[0, 5000, 300]), [0, 1000, 0]);
    }

    #[test]
    fn uncalibrated_channel_reads_zero() {
        let mut cal = Calibration::<2>::new();
        cal.record(&[500, 100]);
        cal.record(&[500, 900]);
        assert!(!cal.is_calibrated());
        assert_eq!(cal.normalize(&[500, 500]), [0, 500]);
    }

    #[test]
    fn centroid_between_channels() {
        let values = [0, 1000, 1000, 0, 0];
        assert_eq!(
            estimate_position(&values, LinePolarity::DarkOnLight, 50, 2000),
            1500
        );
    }

    #[test]
    fn noise_floor_ignored() {
        // 40 is below the floor and must not pull the centroid
        let values = [40, 0, 1000, 0, 0];
        assert_eq!(
            estimate_position(&values, LinePolarity::DarkOnLight, 50, 2000),
            2000
        );
    }

    #[test]
    fn light_line_inverts_intensities() {
        let values = [1000, 1000, 1000, 0, 1000];
        assert_eq!(
            estimate_position(&values, LinePolarity::LightOnDark, 50, 2000),
            3000
        );
    }

    #[test]
    fn lost_line_snaps_to_last_side() {
        let blank = [0, 0, 0, 0, 0];
        assert_eq!(
            estimate_position(&blank, LinePolarity::DarkOnLight, 50, 500),
            0
        );
        assert_eq!(
            estimate_position(&blank, LinePolarity::DarkOnLight, 50, 3500),
            4000
        );
    }

    #[test]
    fn weak_signal_counts_as_lost() {
        // Above the floor but nothing above the presence threshold
        let values = [0, 150, 150, 0, 0];
        assert_eq!(
            estimate_position(&values, LinePolarity::DarkOnLight, 50, 3000),
            4000
        );
    }

    #[test]
    fn empty_array_reads_zero() {
        assert_eq!(estimate_position(&[], LinePolarity::DarkOnLight, 50, 0), 0);
    }
}
