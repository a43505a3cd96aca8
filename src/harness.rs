//! The diagnostic loop
//!
//! [`DiagnosticHarness`] owns every piece of loop state: the sensor poller,
//! the sample clock, the attitude estimate, the calibration session and the
//! selected mode. Each [`DiagnosticHarness::step`] runs one iteration:
//! poll, fuse, optionally calibrate, format and emit.

use core::fmt::Write;

use embedded_hal::delay::DelayNs;
use embedded_hal::digital::OutputPin;
use nalgebra::UnitQuaternion;
use portable_atomic::{AtomicBool, Ordering};

use crate::attitude::AttitudeEstimator;
use crate::calibration::MagCalibrator;
use crate::error::Result;
use crate::indicator::{LedChaser, RING_SIZE};
use crate::madgwick::{Madgwick, OrientationFilter};
use crate::modes::{KeyPresses, ModeCycler};
use crate::poller::{ReadySensor, SensorPoller};
use crate::telemetry::{self, Snapshot};
use crate::time::{SampleClock, TimeBase};
use crate::types::{DiagnosticMode, HarnessSettings, ImuSample};

/// Board-side collaborators the harness drives besides the sensors
pub struct Board<T, K, W, D, P> {
    /// Millisecond tick source
    pub time: T,
    /// User button press counter
    pub keys: K,
    /// Telemetry output, usually a serial port
    pub sink: W,
    /// Blocking delay
    pub delay: D,
    /// LED ring
    pub leds: [P; RING_SIZE],
}

/// What one iteration produced
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StepReport {
    /// Mode whose telemetry was emitted
    pub mode: DiagnosticMode,
    /// Sample that was fused
    pub sample: ImuSample,
    /// Measured period fed to the filter, in seconds
    pub period: f32,
    /// Orientation after the update
    pub quaternion: UnitQuaternion<f32>,
}

/// Explicit context for the IMU diagnostic loop
pub struct DiagnosticHarness<A, M, G, T, K, W, D, P, F = Madgwick> {
    settings: HarnessSettings,
    poller: SensorPoller<A, M, G>,
    time: T,
    clock: SampleClock,
    attitude: AttitudeEstimator<F>,
    calibrator: MagCalibrator,
    cycler: ModeCycler,
    keys: K,
    sink: W,
    delay: D,
    chaser: LedChaser<P>,
}

impl<A, M, G, T, K, W, D, P> DiagnosticHarness<A, M, G, T, K, W, D, P, Madgwick>
where
    A: ReadySensor,
    M: ReadySensor,
    G: ReadySensor,
    T: TimeBase,
    K: KeyPresses,
    W: Write,
    D: DelayNs,
    P: OutputPin,
{
    /// Create a harness fusing with the Madgwick filter from `settings`
    pub fn new(poller: SensorPoller<A, M, G>, board: Board<T, K, W, D, P>, settings: HarnessSettings) -> Self {
        let filter = Madgwick::with_settings(settings.filter);
        Self::with_filter(poller, board, filter, settings)
    }
}

impl<A, M, G, T, K, W, D, P, F> DiagnosticHarness<A, M, G, T, K, W, D, P, F>
where
    A: ReadySensor,
    M: ReadySensor,
    G: ReadySensor,
    T: TimeBase,
    K: KeyPresses,
    W: Write,
    D: DelayNs,
    P: OutputPin,
    F: OrientationFilter,
{
    /// Create a harness around any orientation filter
    ///
    /// The first sample period is measured from this call.
    pub fn with_filter(
        poller: SensorPoller<A, M, G>,
        board: Board<T, K, W, D, P>,
        filter: F,
        settings: HarnessSettings,
    ) -> Self {
        let clock = SampleClock::start(board.time.ticks_ms());
        info!("imu harness started at {} ms", clock.last_ms());

        Self {
            settings,
            poller,
            time: board.time,
            clock,
            attitude: AttitudeEstimator::new(filter),
            calibrator: MagCalibrator::with_nominal_field(settings.nominal_field),
            cycler: ModeCycler::new(),
            keys: board.keys,
            sink: board.sink,
            delay: board.delay,
            chaser: LedChaser::new(board.leds),
        }
    }

    /// Run one loop iteration
    pub fn step(&mut self) -> Result<StepReport> {
        self.chaser.bump()?;

        let sample = match self.settings.poll_spin_limit {
            Some(limit) => self.poller.assemble_within(limit)?,
            None => self.poller.assemble(),
        };

        self.chaser.adjust_speed(sample.gyro.x);

        let period = self.clock.mark(self.time.ticks_ms());
        trace!("sample period {} s", period);

        let quaternion = self.attitude.update(sample.gyro, sample.accel, sample.mag, period);

        let previous = self.cycler.mode();
        let mode = self.cycler.advance(self.keys.take_presses());
        if mode != previous {
            info!("diagnostic mode {} -> {}", previous.index(), mode.index());
            if mode == DiagnosticMode::Magnetometer {
                debug!("magnetometer calibration restarted");
                self.calibrator.reset();
            }
        }

        let snapshot = Snapshot {
            sample: &sample,
            quaternion,
            period,
            calibrator: &self.calibrator,
        };
        telemetry::render(&mut self.sink, mode, &snapshot)?;

        match mode {
            DiagnosticMode::Magnetometer => self.calibrator.observe(sample.mag),
            DiagnosticMode::CalibrationReport => self.delay.delay_ms(self.settings.report_pause_ms),
            _ => {}
        }

        Ok(StepReport {
            mode,
            sample,
            period,
            quaternion,
        })
    }

    /// Iterate until `stop` is raised or an iteration fails
    pub fn run(&mut self, stop: &AtomicBool) -> Result<()> {
        while !stop.load(Ordering::Acquire) {
            self.step()?;
        }
        info!("imu harness stopped");
        Ok(())
    }

    /// Current diagnostic mode
    pub fn mode(&self) -> DiagnosticMode {
        self.cycler.mode()
    }

    /// Current orientation estimate
    pub fn quaternion(&self) -> UnitQuaternion<f32> {
        self.attitude.quaternion()
    }

    /// Magnetometer calibration session
    pub fn calibrator(&self) -> &MagCalibrator {
        &self.calibrator
    }

    /// Telemetry sink
    pub fn sink(&self) -> &W {
        &self.sink
    }

    /// Telemetry sink, e.g. to drain a buffer between iterations
    pub fn sink_mut(&mut self) -> &mut W {
        &mut self.sink
    }

    /// LED chaser
    pub fn chaser(&self) -> &LedChaser<P> {
        &self.chaser
    }

    /// Harness settings
    pub fn settings(&self) -> &HarnessSettings {
        &self.settings
    }
}
