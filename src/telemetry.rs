//! Text telemetry for each diagnostic mode
//!
//! Every mode renders one comma-separated line terminated by `\r\n`, except
//! the calibration report which spans three lines. Values that are infinite
//! or NaN are printed as-is so the operator can see them.

use core::fmt::{self, Write};

use nalgebra::{UnitQuaternion, Vector3};

use crate::calibration::MagCalibrator;
use crate::compass::CompassReading;
use crate::math::{QuaternionExt, Vector3Ext};
use crate::types::{DiagnosticMode, ImuSample};

/// Line terminator expected by serial terminals
const EOL: &str = "\r\n";

/// Everything a telemetry line can draw from in one iteration
#[derive(Debug, Clone, Copy)]
pub struct Snapshot<'a> {
    /// Synchronized raw sample; gyroscope in degrees per second
    pub sample: &'a ImuSample,
    /// Filter orientation after this sample
    pub quaternion: UnitQuaternion<f32>,
    /// Measured sample period in seconds
    pub period: f32,
    /// Magnetometer calibration session
    pub calibrator: &'a MagCalibrator,
}

impl Snapshot<'_> {
    /// Samples per second implied by the measured period
    pub fn sample_rate(&self) -> f32 {
        1.0 / self.period
    }
}

/// Render the telemetry for `mode`
pub fn render<W: Write>(out: &mut W, mode: DiagnosticMode, snapshot: &Snapshot<'_>) -> fmt::Result {
    let sample = snapshot.sample;
    match mode {
        DiagnosticMode::Orientation => write_orientation(out, snapshot.quaternion, snapshot.sample_rate()),
        DiagnosticMode::Accelerometer => write_vector(out, sample.accel, "ACC"),
        DiagnosticMode::GyroDegrees => write_vector(out, sample.gyro, "GDEG"),
        DiagnosticMode::GyroRadians => write_vector(out, sample.gyro.map(f32::to_radians) * 100.0, "GRAD"),
        DiagnosticMode::Magnetometer => write_magnetometer(out, sample.mag),
        DiagnosticMode::CalibrationReport => write_calibration_report(out, snapshot.calibrator),
        DiagnosticMode::AllSensors => write_all_sensors(out, sample),
        DiagnosticMode::Quaternion => write_quaternion(out, snapshot.quaternion, snapshot.sample_rate()),
        DiagnosticMode::Heading => write_heading(out, &CompassReading::from_raw(sample.accel, sample.mag)),
    }
}

/// `yaw,pitch,roll,YPR <rate>Hz` in whole degrees
pub fn write_orientation<W: Write>(out: &mut W, quaternion: UnitQuaternion<f32>, rate: f32) -> fmt::Result {
    let ypr = quaternion.yaw_pitch_roll_degrees();
    write!(out, "{:4.0},{:4.0},{:4.0},YPR {:3}Hz{}", ypr.x, ypr.y, ypr.z, rate as i32, EOL)
}

/// `x,y,z,<tag>` with three decimals
pub fn write_vector<W: Write>(out: &mut W, v: Vector3<f32>, tag: &str) -> fmt::Result {
    write!(out, "{:7.3},{:7.3},{:7.3},{}{}", v.x, v.y, v.z, tag, EOL)
}

/// Magnetometer in hundredths of a gauss followed by the field magnitude
pub fn write_magnetometer<W: Write>(out: &mut W, mag: Vector3<f32>) -> fmt::Result {
    let scaled = mag * 100.0;
    write!(
        out,
        "{:7.3},{:7.3},{:7.3},MAGx0.01Ga {:7.3}Ga{}",
        scaled.x,
        scaled.y,
        scaled.z,
        mag.norm(),
        EOL
    )
}

/// Extrema, derived offset/gain and the calibrated extrema
pub fn write_calibration_report<W: Write>(out: &mut W, calibrator: &MagCalibrator) -> fmt::Result {
    let (min, max) = (calibrator.min(), calibrator.max());
    let cal = calibrator.derive_calibration();
    let (lo, hi) = (cal.apply(min), cal.apply(max));

    write!(
        out,
        "Mag cal (min:max): {:5.3},{:5.3} {:5.3},{:5.3} {:5.3},{:5.3}{}",
        min.x, max.x, min.y, max.y, min.z, max.z, EOL
    )?;
    write!(
        out,
        "ofs:gain {:5.3},{:5.3} {:5.3},{:5.3} {:5.3},{:5.3}{}",
        cal.offset.x, cal.gain.x, cal.offset.y, cal.gain.y, cal.offset.z, cal.gain.z, EOL
    )?;
    write!(
        out,
        "calibrated {:5.3},{:5.3} {:5.3},{:5.3} {:5.3},{:5.3}{}",
        lo.x, hi.x, lo.y, hi.y, lo.z, hi.z, EOL
    )
}

/// All three readings on one line, gyroscope in radians per second
pub fn write_all_sensors<W: Write>(out: &mut W, sample: &ImuSample) -> fmt::Result {
    let (a, g, m) = (sample.accel, sample.gyro.deg_to_rad(), sample.mag);
    write!(
        out,
        "A {:5.2},{:5.2},{:5.2} G {:5.2},{:5.2},{:5.2} M {:5.2},{:5.2},{:5.2}{}",
        a.x, a.y, a.z, g.x, g.y, g.z, m.x, m.y, m.z, EOL
    )
}

/// `w,x,y,z,<rate>Hz,Q`
pub fn write_quaternion<W: Write>(out: &mut W, quaternion: UnitQuaternion<f32>, rate: f32) -> fmt::Result {
    let q = quaternion.as_ref();
    write!(out, "{:6.3},{:6.3},{:6.3},{:6.3},{:3.0}Hz,Q{}", q.w, q.i, q.j, q.k, rate, EOL)
}

/// `heading,tilt_heading,pitch,roll,HDG+PR` in whole degrees
pub fn write_heading<W: Write>(out: &mut W, reading: &CompassReading) -> fmt::Result {
    let deg = reading.to_degrees();
    write!(
        out,
        "{:4.0},{:4.0},{:4.0},{:4.0},HDG+PR{}",
        deg.heading, deg.tilt_compensated_heading, deg.pitch, deg.roll, EOL
    )
}
