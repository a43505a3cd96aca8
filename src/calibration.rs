//! Magnetometer min/max calibration
//!
//! The operator wiggles the board through every orientation while the
//! calibrator tracks the extreme reading seen on each axis. Offsets and gains
//! are derived from those extrema and reported for manual transcription; they
//! are never fed back into live readings.

use nalgebra::Vector3;

use crate::types::NOMINAL_FIELD;

/// Hard-iron offset and per-axis gain derived from the observed extrema
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MagCalibration {
    /// Midpoint of the observed range per axis, in gauss
    pub offset: Vector3<f32>,
    /// Scale that maps the observed range onto ±nominal field per axis
    pub gain: Vector3<f32>,
}

impl MagCalibration {
    /// Applies the calibration: `(uncalibrated - offset) * gain` per axis
    ///
    /// # Example
    /// ```
    /// use nalgebra::Vector3;
    /// use imu_harness::calibration::MagCalibration;
    ///
    /// let cal = MagCalibration {
    ///     offset: Vector3::new(0.1, 0.0, 0.0),
    ///     gain: Vector3::new(2.0, 1.0, 1.0),
    /// };
    /// let calibrated = cal.apply(Vector3::new(0.3, 0.2, 0.1));
    /// assert!((calibrated - Vector3::new(0.4, 0.2, 0.1)).norm() < 1e-6);
    /// ```
    pub fn apply(&self, uncalibrated: Vector3<f32>) -> Vector3<f32> {
        (uncalibrated - self.offset).component_mul(&self.gain)
    }
}

/// Running per-axis min/max accumulator
///
/// Extrema start at zero, so each axis range always includes zero until the
/// calibrator is reset. An axis that never moved keeps `min == max` and its
/// derived gain is infinite or NaN; that is left visible to the operator.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MagCalibrator {
    /// Expected total geomagnetic field strength in gauss
    nominal_field: f32,
    /// Smallest reading seen per axis
    min: Vector3<f32>,
    /// Largest reading seen per axis
    max: Vector3<f32>,
}

impl MagCalibrator {
    /// Create a calibrator referenced to [`NOMINAL_FIELD`]
    pub fn new() -> Self {
        Self::with_nominal_field(NOMINAL_FIELD)
    }

    /// Create a calibrator referenced to a location-specific field strength
    pub fn with_nominal_field(nominal_field: f32) -> Self {
        Self {
            nominal_field,
            min: Vector3::zeros(),
            max: Vector3::zeros(),
        }
    }

    /// Restart the session, reseeding all extrema at zero
    pub fn reset(&mut self) {
        self.min = Vector3::zeros();
        self.max = Vector3::zeros();
    }

    /// Fold one magnetometer reading into the extrema
    pub fn observe(&mut self, magnetometer: Vector3<f32>) {
        for axis in 0..3 {
            if magnetometer[axis] > self.max[axis] {
                self.max[axis] = magnetometer[axis];
            }
            if magnetometer[axis] < self.min[axis] {
                self.min[axis] = magnetometer[axis];
            }
        }
    }

    /// Smallest reading seen per axis
    pub fn min(&self) -> Vector3<f32> {
        self.min
    }

    /// Largest reading seen per axis
    pub fn max(&self) -> Vector3<f32> {
        self.max
    }

    /// Reference field strength in gauss
    pub fn nominal_field(&self) -> f32 {
        self.nominal_field
    }

    /// Derive offset and gain from the current extrema
    ///
    /// `offset = (max + min) / 2`, `gain = 2 * nominal / (max - min)`.
    pub fn derive_calibration(&self) -> MagCalibration {
        let offset = (self.max + self.min) / 2.0;
        let span = self.max - self.min;
        let gain = span.map(|s| 2.0 * self.nominal_field / s);

        MagCalibration { offset, gain }
    }
}

impl Default for MagCalibrator {
    fn default() -> Self {
        Self::new()
    }
}
