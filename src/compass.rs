//! Filter-independent heading, pitch and roll
//!
//! These are computed straight from one accelerometer and one magnetometer
//! reading, so they can be compared against the attitude filter output.

use crate::math::Vector3Ext;
use nalgebra::{ComplexField, RealField, Vector3};

/// Heading, pitch and roll derived without the attitude filter, in radians
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CompassReading {
    /// Magnetic heading ignoring tilt
    pub heading: f32,
    /// Tilt-compensated magnetic heading
    pub tilt_compensated_heading: f32,
    /// Pitch from the accelerometer
    pub pitch: f32,
    /// Roll from the accelerometer
    pub roll: f32,
}

impl CompassReading {
    /// Normalize both readings and derive heading, pitch and roll
    ///
    /// # Example
    /// ```
    /// use nalgebra::Vector3;
    /// use imu_harness::compass::CompassReading;
    ///
    /// let accel = Vector3::new(0.0, 0.0, 1.0);  // level
    /// let mag = Vector3::new(0.25, 0.0, -0.4);  // pointing north, dipping down
    /// let reading = CompassReading::from_raw(accel, mag);
    /// assert!(reading.tilt_compensated_heading.abs() < 1e-3);
    /// ```
    pub fn from_raw(accelerometer: Vector3<f32>, magnetometer: Vector3<f32>) -> Self {
        let a = accelerometer.safe_normalize();
        let m = magnetometer.safe_normalize();

        Self {
            heading: heading(m),
            tilt_compensated_heading: heading_tilt_compensated(m, a),
            pitch: pitch(a),
            roll: roll(a),
        }
    }

    /// Same reading with every angle converted to degrees
    pub fn to_degrees(self) -> Self {
        Self {
            heading: self.heading.to_degrees(),
            tilt_compensated_heading: self.tilt_compensated_heading.to_degrees(),
            pitch: self.pitch.to_degrees(),
            roll: self.roll.to_degrees(),
        }
    }
}

/// Magnetic heading of a normalized magnetometer reading, assuming the device is level
pub fn heading(magnetometer: Vector3<f32>) -> f32 {
    magnetometer.y.atan2(magnetometer.x)
}

/// Pitch of a normalized accelerometer reading
pub fn pitch(accelerometer: Vector3<f32>) -> f32 {
    // `+ 0.0` folds the -0.0 of a level device into 0.0
    (-accelerometer.x).clamp(-1.0, 1.0).asin() + 0.0
}

/// Roll of a normalized accelerometer reading
pub fn roll(accelerometer: Vector3<f32>) -> f32 {
    let cos_pitch = pitch(accelerometer).cos();
    if cos_pitch == 0.0 {
        return 0.0;
    }
    (accelerometer.y / cos_pitch).clamp(-1.0, 1.0).asin()
}

/// Tilt-compensated magnetic heading from normalized readings
///
/// Rotates the magnetic vector back into the horizontal plane using the pitch
/// and roll measured by the accelerometer before taking the heading.
pub fn heading_tilt_compensated(magnetometer: Vector3<f32>, accelerometer: Vector3<f32>) -> f32 {
    let pitch = pitch(accelerometer);
    let roll = roll(accelerometer);

    let (sin_pitch, cos_pitch) = (pitch.sin(), pitch.cos());
    let (sin_roll, cos_roll) = (roll.sin(), roll.cos());

    let xh = magnetometer.x * cos_pitch + magnetometer.z * sin_pitch;
    let yh = magnetometer.x * sin_roll * sin_pitch + magnetometer.y * cos_roll
        - magnetometer.z * sin_roll * cos_pitch;

    yh.atan2(xh)
}
