//! Sensor readiness polling
//!
//! The accelerometer, magnetometer and gyroscope each raise their own
//! data-ready flag at their own rate. The poller spins over the three flags,
//! reads each sensor as soon as it has fresh data and hands back one
//! synchronized sample once every sensor has been read exactly once.

use core::ops::{BitOr, BitOrAssign};

use nalgebra::Vector3;

use crate::error::{HarnessError, Result};
use crate::types::ImuSample;

/// One sensor that reports fresh data through a status flag
pub trait ReadySensor {
    /// Whether a new sample is available
    fn data_ready(&mut self) -> bool;

    /// Read the latest sample in physical units
    fn read(&mut self) -> Vector3<f32>;
}

impl<S: ReadySensor + ?Sized> ReadySensor for &mut S {
    fn data_ready(&mut self) -> bool {
        (**self).data_ready()
    }

    fn read(&mut self) -> Vector3<f32> {
        (**self).read()
    }
}

/// Which sensors have delivered data in the current cycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ReadyMask(u8);

impl ReadyMask {
    /// Nothing read yet
    pub const NONE: Self = Self(0);
    /// Accelerometer read
    pub const ACCEL: Self = Self(0x1);
    /// Magnetometer read
    pub const MAG: Self = Self(0x2);
    /// Gyroscope read
    pub const GYRO: Self = Self(0x4);
    /// All three sensors read
    pub const ALL: Self = Self(0x7);

    /// Raw bit pattern
    pub fn bits(self) -> u8 {
        self.0
    }

    /// Whether every bit of `other` is set
    pub fn contains(self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }

    /// Whether all three sensors have been read
    pub fn is_complete(self) -> bool {
        self.contains(Self::ALL)
    }
}

impl BitOr for ReadyMask {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}

impl BitOrAssign for ReadyMask {
    fn bitor_assign(&mut self, rhs: Self) {
        self.0 |= rhs.0;
    }
}

/// Assembles synchronized samples from three independently clocked sensors
pub struct SensorPoller<A, M, G> {
    accelerometer: A,
    magnetometer: M,
    gyroscope: G,
    /// Sensors read in the cycle being assembled
    status: ReadyMask,
    /// Readings collected so far in this cycle
    pending: ImuSample,
}

impl<A, M, G> SensorPoller<A, M, G>
where
    A: ReadySensor,
    M: ReadySensor,
    G: ReadySensor,
{
    /// Create a poller over the three sensors
    pub fn new(accelerometer: A, magnetometer: M, gyroscope: G) -> Self {
        Self {
            accelerometer,
            magnetometer,
            gyroscope,
            status: ReadyMask::NONE,
            pending: ImuSample::default(),
        }
    }

    /// Sensors already read in the unfinished cycle
    pub fn status(&self) -> ReadyMask {
        self.status
    }

    /// One pass over the readiness flags
    ///
    /// Sensors are checked in fixed order: accelerometer, magnetometer,
    /// gyroscope. A sensor already read in this cycle is not polled again, so
    /// a fast sensor can not overwrite its reading before the slow ones catch
    /// up. Returns the sample when the pass completes the cycle.
    pub fn poll_once(&mut self) -> Option<ImuSample> {
        if !self.status.contains(ReadyMask::ACCEL) && self.accelerometer.data_ready() {
            self.pending.accel = self.accelerometer.read();
            self.status |= ReadyMask::ACCEL;
        }
        if !self.status.contains(ReadyMask::MAG) && self.magnetometer.data_ready() {
            self.pending.mag = self.magnetometer.read();
            self.status |= ReadyMask::MAG;
        }
        if !self.status.contains(ReadyMask::GYRO) && self.gyroscope.data_ready() {
            self.pending.gyro = self.gyroscope.read();
            self.status |= ReadyMask::GYRO;
        }

        if self.status.is_complete() {
            self.status = ReadyMask::NONE;
            Some(self.pending)
        } else {
            None
        }
    }

    /// Block until all three sensors have delivered fresh data
    ///
    /// There is no timeout: a sensor that never raises its flag stalls the
    /// caller forever. Use [`SensorPoller::assemble_within`] for a bounded wait.
    pub fn assemble(&mut self) -> ImuSample {
        loop {
            if let Some(sample) = self.poll_once() {
                return sample;
            }
            core::hint::spin_loop();
        }
    }

    /// Like [`SensorPoller::assemble`] but gives up after `max_spins` passes
    ///
    /// Readings collected before giving up are kept, so the next call resumes
    /// the same cycle.
    pub fn assemble_within(&mut self, max_spins: u32) -> Result<ImuSample> {
        for _ in 0..max_spins {
            if let Some(sample) = self.poll_once() {
                return Ok(sample);
            }
            core::hint::spin_loop();
        }

        warn!("sensor poll gave up after {} spins, ready mask {}", max_spins, self.status.bits());
        Err(HarnessError::SensorTimeout {
            pending: self.status,
        })
    }
}
