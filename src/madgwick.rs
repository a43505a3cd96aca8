//! Madgwick gradient-descent orientation filter
//!
//! Fuses angular rate, gravity and magnetic field into a quaternion. The
//! gyroscope is integrated every step while a gradient-descent step pulls the
//! estimate towards the orientation that best explains the measured gravity
//! and magnetic directions. The same gradient drives a slow estimate of the
//! gyroscope bias which is subtracted from the rate before integration.

use nalgebra::{ComplexField, Quaternion, UnitQuaternion, Vector3, Vector4};

use crate::math::Vector3Ext;
use crate::types::MadgwickSettings;

/// Orientation fusion algorithm driven by the attitude adapter
///
/// Implementations receive angular rate in radians per second and must leave
/// `quaternion` normalized.
pub trait OrientationFilter {
    /// Advance the estimate by `delta_time` seconds
    fn update(
        &mut self,
        gyroscope: Vector3<f32>,
        accelerometer: Vector3<f32>,
        magnetometer: Vector3<f32>,
        delta_time: f32,
        quaternion: &mut UnitQuaternion<f32>,
    );
}

/// Madgwick MARG filter with gyroscope bias drift compensation
#[derive(Debug, Clone, Copy)]
pub struct Madgwick {
    /// Filter settings
    settings: MadgwickSettings,
    /// Estimated gyroscope bias in rad/s
    gyroscope_bias: Vector3<f32>,
}

impl Madgwick {
    /// Create a filter with default settings
    pub fn new() -> Self {
        Self::with_settings(MadgwickSettings::default())
    }

    /// Create a filter with the given settings
    pub fn with_settings(settings: MadgwickSettings) -> Self {
        Self {
            settings,
            gyroscope_bias: Vector3::zeros(),
        }
    }

    /// Current filter settings
    pub fn settings(&self) -> MadgwickSettings {
        self.settings
    }

    /// Estimated gyroscope bias in rad/s
    pub fn gyroscope_bias(&self) -> Vector3<f32> {
        self.gyroscope_bias
    }

    /// Forget the bias estimate
    pub fn reset(&mut self) {
        self.gyroscope_bias = Vector3::zeros();
    }

    /// Gradient of the gravity and magnetic field objective
    fn marg_gradient(q: &Quaternion<f32>, a: Vector3<f32>, m: Vector3<f32>) -> Vector4<f32> {
        let (q0, q1, q2, q3) = (q.w, q.i, q.j, q.k);
        let (ax, ay, az) = (a.x, a.y, a.z);
        let (mx, my, mz) = (m.x, m.y, m.z);

        let two_q0mx = 2.0 * q0 * mx;
        let two_q0my = 2.0 * q0 * my;
        let two_q0mz = 2.0 * q0 * mz;
        let two_q1mx = 2.0 * q1 * mx;
        let two_q0 = 2.0 * q0;
        let two_q1 = 2.0 * q1;
        let two_q2 = 2.0 * q2;
        let two_q3 = 2.0 * q3;
        let two_q0q2 = 2.0 * q0 * q2;
        let two_q2q3 = 2.0 * q2 * q3;
        let q0q0 = q0 * q0;
        let q0q1 = q0 * q1;
        let q0q2 = q0 * q2;
        let q0q3 = q0 * q3;
        let q1q1 = q1 * q1;
        let q1q2 = q1 * q2;
        let q1q3 = q1 * q3;
        let q2q2 = q2 * q2;
        let q2q3 = q2 * q3;
        let q3q3 = q3 * q3;

        // Earth magnetic reference, rotated into the horizontal/vertical plane
        let hx = mx * q0q0 - two_q0my * q3 + two_q0mz * q2 + mx * q1q1 + two_q1 * my * q2
            + two_q1 * mz * q3
            - mx * q2q2
            - mx * q3q3;
        let hy = two_q0mx * q3 + my * q0q0 - two_q0mz * q1 + two_q1mx * q2 - my * q1q1
            + my * q2q2
            + two_q2 * mz * q3
            - my * q3q3;
        let bx = (hx * hx + hy * hy).sqrt();
        let bz = -two_q0mx * q2 + two_q0my * q1 + mz * q0q0 + two_q1mx * q3 - mz * q1q1
            + two_q2 * my * q3
            - mz * q2q2
            + mz * q3q3;
        let two_bx = 2.0 * bx;
        let two_bz = 2.0 * bz;
        let four_bx = 4.0 * bx;
        let four_bz = 4.0 * bz;

        // objective function residuals
        let fa_x = 2.0 * q1q3 - two_q0q2 - ax;
        let fa_y = 2.0 * q0q1 + two_q2q3 - ay;
        let fa_z = 1.0 - 2.0 * q1q1 - 2.0 * q2q2 - az;
        let fm_x = two_bx * (0.5 - q2q2 - q3q3) + two_bz * (q1q3 - q0q2) - mx;
        let fm_y = two_bx * (q1q2 - q0q3) + two_bz * (q0q1 + q2q3) - my;
        let fm_z = two_bx * (q0q2 + q1q3) + two_bz * (0.5 - q1q1 - q2q2) - mz;

        let s0 = -two_q2 * fa_x + two_q1 * fa_y - two_bz * q2 * fm_x
            + (-two_bx * q3 + two_bz * q1) * fm_y
            + two_bx * q2 * fm_z;
        let s1 = two_q3 * fa_x + two_q0 * fa_y - 4.0 * q1 * fa_z
            + two_bz * q3 * fm_x
            + (two_bx * q2 + two_bz * q0) * fm_y
            + (two_bx * q3 - four_bz * q1) * fm_z;
        let s2 = -two_q0 * fa_x + two_q3 * fa_y - 4.0 * q2 * fa_z
            + (-four_bx * q2 - two_bz * q0) * fm_x
            + (two_bx * q1 + two_bz * q3) * fm_y
            + (two_bx * q0 - four_bz * q2) * fm_z;
        let s3 = two_q1 * fa_x
            + two_q2 * fa_y
            + (-four_bx * q3 + two_bz * q1) * fm_x
            + (-two_bx * q0 + two_bz * q2) * fm_y
            + two_bx * q1 * fm_z;

        Vector4::new(s0, s1, s2, s3)
    }

    /// Gradient of the gravity-only objective
    fn imu_gradient(q: &Quaternion<f32>, a: Vector3<f32>) -> Vector4<f32> {
        let (q0, q1, q2, q3) = (q.w, q.i, q.j, q.k);
        let (ax, ay, az) = (a.x, a.y, a.z);

        let two_q0 = 2.0 * q0;
        let two_q1 = 2.0 * q1;
        let two_q2 = 2.0 * q2;
        let two_q3 = 2.0 * q3;
        let four_q0 = 4.0 * q0;
        let four_q1 = 4.0 * q1;
        let four_q2 = 4.0 * q2;
        let eight_q1 = 8.0 * q1;
        let eight_q2 = 8.0 * q2;
        let q0q0 = q0 * q0;
        let q1q1 = q1 * q1;
        let q2q2 = q2 * q2;
        let q3q3 = q3 * q3;

        let s0 = four_q0 * q2q2 + two_q2 * ax + four_q0 * q1q1 - two_q1 * ay;
        let s1 = four_q1 * q3q3 - two_q3 * ax + 4.0 * q0q0 * q1 - two_q0 * ay - four_q1
            + eight_q1 * q1q1
            + eight_q1 * q2q2
            + four_q1 * az;
        let s2 = 4.0 * q0q0 * q2 + two_q0 * ax + four_q2 * q3q3 - two_q3 * ay - four_q2
            + eight_q2 * q1q1
            + eight_q2 * q2q2
            + four_q2 * az;
        let s3 = 4.0 * q1q1 * q3 - two_q1 * ax + 4.0 * q2q2 * q3 - two_q2 * ay;

        Vector4::new(s0, s1, s2, s3)
    }
}

impl Default for Madgwick {
    fn default() -> Self {
        Self::new()
    }
}

impl OrientationFilter for Madgwick {
    fn update(
        &mut self,
        gyroscope: Vector3<f32>,
        accelerometer: Vector3<f32>,
        magnetometer: Vector3<f32>,
        delta_time: f32,
        quaternion: &mut UnitQuaternion<f32>,
    ) {
        let q = *quaternion.as_ref();

        // Corrective step is skipped entirely without a gravity reference
        let step = if accelerometer.norm() > 0.0 {
            let a = accelerometer.safe_normalize();
            let gradient = if magnetometer.norm() > 0.0 {
                Self::marg_gradient(&q, a, magnetometer.safe_normalize())
            } else {
                Self::imu_gradient(&q, a)
            };
            let norm = gradient.norm();
            if norm > 0.0 { gradient / norm } else { Vector4::zeros() }
        } else {
            Vector4::zeros()
        };

        // Gyroscope error direction drives the bias estimate
        let step_quaternion = Quaternion::new(step[0], step[1], step[2], step[3]);
        let rate_error = (q.conjugate() * step_quaternion).imag() * 2.0;
        self.gyroscope_bias += rate_error * (delta_time * self.settings.zeta);
        let rate = gyroscope - self.gyroscope_bias;

        // q_dot = 0.5 * q * omega - beta * step
        let omega = Quaternion::from_imag(rate);
        let q_dot = q * omega * 0.5 - step_quaternion * self.settings.beta;

        *quaternion = UnitQuaternion::from_quaternion(q + q_dot * delta_time);
    }
}
