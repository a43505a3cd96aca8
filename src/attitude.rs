//! Attitude filter adapter
//!
//! Owns the running orientation quaternion and feeds the orientation filter
//! once per synchronized sample, converting the gyroscope from degrees to
//! radians per second on the way in.

use nalgebra::{UnitQuaternion, Vector3};

use crate::madgwick::{Madgwick, OrientationFilter};
use crate::math::Vector3Ext;

/// Adapter between raw sensor units and an [`OrientationFilter`]
pub struct AttitudeEstimator<F = Madgwick> {
    /// Orientation fusion algorithm
    filter: F,
    /// Sensor frame orientation relative to the earth frame
    quaternion: UnitQuaternion<f32>,
}

impl<F: OrientationFilter> AttitudeEstimator<F> {
    /// Wrap a filter, starting from the identity orientation
    pub fn new(filter: F) -> Self {
        Self {
            filter,
            quaternion: UnitQuaternion::identity(),
        }
    }

    /// Fuse one sample
    ///
    /// # Arguments
    /// * `gyroscope` - Gyroscope reading in degrees per second
    /// * `accelerometer` - Accelerometer reading in g
    /// * `magnetometer` - Magnetometer reading in gauss
    /// * `delta_time` - Measured time since the previous update in seconds
    ///
    /// # Example
    /// ```
    /// use nalgebra::Vector3;
    /// use imu_harness::{AttitudeEstimator, Madgwick};
    ///
    /// let mut attitude = AttitudeEstimator::new(Madgwick::new());
    /// let q = attitude.update(
    ///     Vector3::zeros(),
    ///     Vector3::new(0.0, 0.0, 1.0),
    ///     Vector3::new(0.25, 0.0, 0.0),
    ///     0.005,
    /// );
    /// assert!((q.as_ref().norm() - 1.0).abs() < 1e-3);
    /// ```
    pub fn update(
        &mut self,
        gyroscope: Vector3<f32>,
        accelerometer: Vector3<f32>,
        magnetometer: Vector3<f32>,
        delta_time: f32,
    ) -> UnitQuaternion<f32> {
        let gyroscope_rad = gyroscope.deg_to_rad();
        self.filter.update(
            gyroscope_rad,
            accelerometer,
            magnetometer,
            delta_time,
            &mut self.quaternion,
        );
        self.quaternion
    }
}

impl<F> AttitudeEstimator<F> {
    /// Current orientation
    pub fn quaternion(&self) -> UnitQuaternion<f32> {
        self.quaternion
    }

    /// Return to the identity orientation
    pub fn reset(&mut self) {
        self.quaternion = UnitQuaternion::identity();
    }

    /// Underlying filter
    pub fn filter(&self) -> &F {
        &self.filter
    }
}

impl Default for AttitudeEstimator<Madgwick> {
    fn default() -> Self {
        Self::new(Madgwick::new())
    }
}
