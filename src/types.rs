//! Core types and settings for the IMU diagnostic harness

use nalgebra::Vector3;

/// Earth magnetic field strength used as the calibration reference, in gauss
///
/// IGRF/WMM total intensity for the bench location (CA 95409).
pub const NOMINAL_FIELD: f32 = 0.49118;

/// One synchronized reading of all three sensors
///
/// Units are whatever the drivers deliver: acceleration in g, magnetic field
/// in gauss and angular rate in degrees per second.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ImuSample {
    /// Accelerometer reading in g
    pub accel: Vector3<f32>,
    /// Magnetometer reading in gauss
    pub mag: Vector3<f32>,
    /// Gyroscope reading in degrees per second
    pub gyro: Vector3<f32>,
}

impl Default for ImuSample {
    fn default() -> Self {
        Self {
            accel: Vector3::zeros(),
            mag: Vector3::zeros(),
            gyro: Vector3::zeros(),
        }
    }
}

/// Diagnostic output mode
///
/// Selected by the operator with the user button. Each press advances to the
/// next mode; the last mode wraps back to [`DiagnosticMode::Orientation`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u8)]
pub enum DiagnosticMode {
    /// Yaw, pitch and roll from the filter plus the sample rate
    #[default]
    Orientation = 0,
    /// Raw accelerometer
    Accelerometer = 1,
    /// Raw gyroscope in degrees per second
    GyroDegrees = 2,
    /// Gyroscope in radians per second, scaled by 100
    GyroRadians = 3,
    /// Magnetometer scaled by 100 plus magnitude; collects calibration extrema
    Magnetometer = 4,
    /// Magnetometer calibration report
    CalibrationReport = 5,
    /// All three readings on one line, gyroscope in radians per second
    AllSensors = 6,
    /// Filter quaternion plus the sample rate
    Quaternion = 7,
    /// Tilt-compensated heading, pitch and roll without the filter
    Heading = 8,
}

impl DiagnosticMode {
    /// Number of defined modes
    pub const COUNT: u8 = 9;

    /// Map an index onto a mode, wrapping anything out of range to
    /// [`DiagnosticMode::Orientation`]
    pub fn from_index(index: u8) -> Self {
        match index {
            1 => DiagnosticMode::Accelerometer,
            2 => DiagnosticMode::GyroDegrees,
            3 => DiagnosticMode::GyroRadians,
            4 => DiagnosticMode::Magnetometer,
            5 => DiagnosticMode::CalibrationReport,
            6 => DiagnosticMode::AllSensors,
            7 => DiagnosticMode::Quaternion,
            8 => DiagnosticMode::Heading,
            _ => DiagnosticMode::Orientation,
        }
    }

    /// Numeric index of the mode
    pub fn index(self) -> u8 {
        self as u8
    }
}

/// Orientation filter settings
///
/// # Example
/// ```
/// use imu_harness::MadgwickSettings;
///
/// let settings = MadgwickSettings {
///     beta: 0.3,
///     ..Default::default()
/// };
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MadgwickSettings {
    /// Gradient-descent gain
    ///
    /// 0.3 is the usual value; 0.5 converges faster from the identity start.
    pub beta: f32,
    /// Gyroscope bias drift gain in rad/s per second of error
    ///
    /// Set to 0 to disable bias estimation.
    pub zeta: f32,
}

impl Default for MadgwickSettings {
    fn default() -> Self {
        Self {
            beta: 0.5,
            zeta: 0.015,
        }
    }
}

/// Harness settings
///
/// # Example
/// ```
/// use imu_harness::HarnessSettings;
///
/// let settings = HarnessSettings {
///     poll_spin_limit: Some(100_000), // give up on a silent sensor
///     ..Default::default()
/// };
/// assert_eq!(settings.report_pause_ms, 100);
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HarnessSettings {
    /// Expected total geomagnetic field strength in gauss
    pub nominal_field: f32,
    /// Orientation filter settings
    pub filter: MadgwickSettings,
    /// Upper bound on readiness polls per sample
    ///
    /// `None` waits forever for all three sensors.
    pub poll_spin_limit: Option<u32>,
    /// Pause after each calibration report, in milliseconds
    pub report_pause_ms: u32,
}

impl Default for HarnessSettings {
    fn default() -> Self {
        Self {
            nominal_field: NOMINAL_FIELD,
            filter: MadgwickSettings::default(),
            poll_spin_limit: None,
            report_pause_ms: 100,
        }
    }
}
