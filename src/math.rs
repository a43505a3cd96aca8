//! Unit conversions and nalgebra extensions used by the harness

use nalgebra::{ComplexField, RealField, UnitQuaternion, Vector3};

/// Mathematical constants
pub const DEG_TO_RAD: f32 = core::f32::consts::PI / 180.0;
pub const RAD_TO_DEG: f32 = 180.0 / core::f32::consts::PI;

/// Extension trait for Vector3 operations
pub trait Vector3Ext {
    /// Normalize the vector, returning zero vector if magnitude is zero
    fn safe_normalize(&self) -> Vector3<f32>;

    /// Convert degrees to radians
    fn deg_to_rad(&self) -> Vector3<f32>;

    /// Convert radians to degrees
    fn rad_to_deg(&self) -> Vector3<f32>;
}

impl Vector3Ext for Vector3<f32> {
    fn safe_normalize(&self) -> Vector3<f32> {
        let mag = self.norm();
        if mag > 0.0 {
            *self / mag
        } else {
            Vector3::zeros()
        }
    }

    fn deg_to_rad(&self) -> Vector3<f32> {
        *self * DEG_TO_RAD
    }

    fn rad_to_deg(&self) -> Vector3<f32> {
        *self * RAD_TO_DEG
    }
}

/// Extension trait for UnitQuaternion operations
pub trait QuaternionExt {
    /// Yaw, pitch and roll in radians, returned as `(yaw, pitch, roll)`
    ///
    /// Pitch and roll come from the gravity direction implied by the
    /// quaternion, yaw from the first column of its rotation matrix.
    fn yaw_pitch_roll(&self) -> Vector3<f32>;

    /// Yaw, pitch and roll in degrees
    fn yaw_pitch_roll_degrees(&self) -> Vector3<f32>;
}

impl QuaternionExt for UnitQuaternion<f32> {
    fn yaw_pitch_roll(&self) -> Vector3<f32> {
        let q = self.as_ref();
        let (q0, q1, q2, q3) = (q.w, q.i, q.j, q.k);

        // estimated gravity direction
        let gx = 2.0 * (q1 * q3 - q0 * q2);
        let gy = 2.0 * (q0 * q1 + q2 * q3);
        let gz = q0 * q0 - q1 * q1 - q2 * q2 + q3 * q3;

        let yaw = (2.0 * q1 * q2 - 2.0 * q0 * q3).atan2(2.0 * q0 * q0 + 2.0 * q1 * q1 - 1.0);
        let pitch = gx.atan2((gy * gy + gz * gz).sqrt());
        let roll = gy.atan2((gx * gx + gz * gz).sqrt());

        Vector3::new(yaw, pitch, roll)
    }

    fn yaw_pitch_roll_degrees(&self) -> Vector3<f32> {
        self.yaw_pitch_roll().rad_to_deg()
    }
}
