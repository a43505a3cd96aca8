#![no_std]

//! IMU Harness - a bare-metal diagnostic loop for accelerometer, magnetometer and gyroscope stacks
//!
//! The harness waits until all three sensors have delivered fresh data,
//! fuses the synchronized sample into an orientation quaternion with a
//! Madgwick filter driven by the measured sample period, and prints one line
//! of telemetry per iteration. The user button cycles through nine
//! diagnostic views: filter orientation, each raw sensor, a magnetometer
//! min/max calibration session and its report, the raw quaternion, and a
//! filter-independent tilt-compensated compass for cross-checking.
//!
//! # Features
//!
//! - Readiness polling that reads every sensor exactly once per sample
//! - Variable sample period measured from a millisecond tick counter
//! - Madgwick MARG filter with gyroscope bias drift compensation
//! - Magnetometer hard-iron offset and gain from observed extrema
//! - `#![no_std]`; hardware is reached through traits and `embedded-hal`
//! - Optional `defmt` logging
//!
//! # Quick Start
//!
//! ```rust
//! use nalgebra::{UnitQuaternion, Vector3};
//! use imu_harness::{AttitudeEstimator, Madgwick, MagCalibrator, SampleClock};
//!
//! let mut attitude = AttitudeEstimator::new(Madgwick::new());
//! let mut clock = SampleClock::start(0);
//!
//! // Sensor readings
//! let gyroscope = Vector3::new(0.0, 0.0, 0.0);       // deg/s
//! let accelerometer = Vector3::new(0.0, 0.0, 1.0);   // g
//! let magnetometer = Vector3::new(0.25, 0.0, -0.4);  // gauss
//!
//! // Period comes from the tick counter, never a constant
//! let period = clock.mark(5);
//! let quaternion = attitude.update(gyroscope, accelerometer, magnetometer, period);
//! assert!((quaternion.as_ref().norm() - 1.0).abs() < 1e-3);
//!
//! // Calibration session
//! let mut calibrator = MagCalibrator::new();
//! calibrator.observe(magnetometer);
//! let calibration = calibrator.derive_calibration();
//! ```

#[macro_use]
mod log;

pub mod attitude;
pub mod calibration;
pub mod compass;
mod error;
pub mod harness;
pub mod indicator;
pub mod madgwick;
mod math;
pub mod modes;
pub mod poller;
pub mod telemetry;
pub mod time;
mod types;

// Re-export all public types and functions
pub use attitude::AttitudeEstimator;
pub use calibration::{MagCalibration, MagCalibrator};
pub use compass::CompassReading;
pub use error::{HarnessError, Result};
pub use harness::{Board, DiagnosticHarness, StepReport};
pub use indicator::LedChaser;
pub use madgwick::{Madgwick, OrientationFilter};
pub use math::{DEG_TO_RAD, QuaternionExt, RAD_TO_DEG, Vector3Ext};
pub use modes::{KeyPresses, ModeCycler, PressCounter};
pub use poller::{ReadyMask, ReadySensor, SensorPoller};
pub use time::{SampleClock, TickCounter, TimeBase};
pub use types::*;
