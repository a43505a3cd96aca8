use std::collections::VecDeque;
use std::convert::Infallible;
use std::fmt;

use embedded_hal::delay::DelayNs;
use embedded_hal::digital::{ErrorType, OutputPin};
use imu_harness::{
    Board, DiagnosticHarness, DiagnosticMode, HarnessError, HarnessSettings, NOMINAL_FIELD, PressCounter, ReadyMask,
    ReadySensor, SensorPoller, TickCounter, TimeBase,
};
use nalgebra::Vector3;
use portable_atomic::{AtomicBool, Ordering};

const EPSILON: f32 = 1e-6;

/// Sensor replaying scripted readings, ready every `ready_every` polls
///
/// Reading can advance the shared tick counter to model the time a cycle takes.
struct ScriptedSensor<'a> {
    readings: VecDeque<Vector3<f32>>,
    last: Vector3<f32>,
    ready_every: u32,
    polls: u32,
    reads: u32,
    clock: Option<(&'a TickCounter, VecDeque<u32>, u32)>,
    stop_after: Option<(&'a AtomicBool, u32)>,
}

impl<'a> ScriptedSensor<'a> {
    fn constant(value: Vector3<f32>) -> Self {
        Self::scripted(vec![value])
    }

    fn scripted(readings: Vec<Vector3<f32>>) -> Self {
        Self {
            last: readings.first().copied().unwrap_or_else(|| Vector3::zeros()),
            readings: readings.into(),
            ready_every: 1,
            polls: 0,
            reads: 0,
            clock: None,
            stop_after: None,
        }
    }

    fn ready_every(mut self, polls: u32) -> Self {
        self.ready_every = polls;
        self
    }

    /// Advance `ticks` by the scripted gaps on each read, then by `default_ms`
    fn advancing(mut self, ticks: &'a TickCounter, gaps_ms: Vec<u32>, default_ms: u32) -> Self {
        self.clock = Some((ticks, gaps_ms.into(), default_ms));
        self
    }

    fn stopping(mut self, stop: &'a AtomicBool, after_reads: u32) -> Self {
        self.stop_after = Some((stop, after_reads));
        self
    }
}

impl ReadySensor for ScriptedSensor<'_> {
    fn data_ready(&mut self) -> bool {
        self.polls += 1;
        self.polls % self.ready_every == 0
    }

    fn read(&mut self) -> Vector3<f32> {
        self.reads += 1;
        if let Some(next) = self.readings.pop_front() {
            self.last = next;
        }
        if let Some((ticks, gaps, default_ms)) = self.clock.as_mut() {
            ticks.advance(gaps.pop_front().unwrap_or(*default_ms));
        }
        if let Some((stop, after)) = self.stop_after {
            if self.reads >= after {
                stop.store(true, Ordering::Release);
            }
        }
        self.last
    }
}

/// Sensor that never reports data
struct DeadSensor;

impl ReadySensor for DeadSensor {
    fn data_ready(&mut self) -> bool {
        false
    }

    fn read(&mut self) -> Vector3<f32> {
        Vector3::zeros()
    }
}

#[derive(Debug, Default, Clone, Copy)]
struct Led;

impl ErrorType for Led {
    type Error = Infallible;
}

impl OutputPin for Led {
    fn set_low(&mut self) -> Result<(), Self::Error> {
        Ok(())
    }

    fn set_high(&mut self) -> Result<(), Self::Error> {
        Ok(())
    }
}

/// Delay that lets time pass on the shared tick counter
struct TickDelay<'a>(&'a TickCounter);

impl DelayNs for TickDelay<'_> {
    fn delay_ns(&mut self, ns: u32) {
        self.0.advance(ns / 1_000_000);
    }

    fn delay_ms(&mut self, ms: u32) {
        self.0.advance(ms);
    }
}

struct FailingSink;

impl fmt::Write for FailingSink {
    fn write_str(&mut self, _: &str) -> fmt::Result {
        Err(fmt::Error)
    }
}

fn level_accel() -> Vector3<f32> {
    Vector3::new(0.0, 0.0, 1.0)
}

fn north_mag() -> Vector3<f32> {
    Vector3::new(0.25, 0.0, 0.0)
}

fn board<'a, W: fmt::Write>(ticks: &'a TickCounter, keys: &'a PressCounter, sink: W) -> Board<&'a TickCounter, &'a PressCounter, W, TickDelay<'a>, Led> {
    Board {
        time: ticks,
        keys,
        sink,
        delay: TickDelay(ticks),
        leds: [Led; 8],
    }
}

/// Poller over a still, level board sampled every 5 ms
fn still_poller(ticks: &TickCounter) -> SensorPoller<ScriptedSensor<'_>, ScriptedSensor<'_>, ScriptedSensor<'_>> {
    SensorPoller::new(
        ScriptedSensor::constant(level_accel()).advancing(ticks, vec![], 5),
        ScriptedSensor::constant(north_mag()),
        ScriptedSensor::constant(Vector3::zeros()),
    )
}

#[test]
fn test_level_board_reports_zero_orientation() {
    let ticks = TickCounter::new();
    let keys = PressCounter::new();
    let mut harness = DiagnosticHarness::new(still_poller(&ticks), board(&ticks, &keys, String::new()), HarnessSettings::default());

    for _ in 0..200 {
        let report = harness.step().unwrap();
        assert_eq!(report.mode, DiagnosticMode::Orientation);
        assert!((report.period - 0.005).abs() < EPSILON);
    }

    let last = harness.sink().lines().last().unwrap().to_string();
    assert_eq!(last, "   0,   0,   0,YPR 200Hz");
}

#[test]
fn test_slow_cycle_period_reaches_filter() {
    let ticks = TickCounter::new();
    let keys = PressCounter::new();
    let poller = SensorPoller::new(
        ScriptedSensor::constant(level_accel()).advancing(&ticks, vec![5, 150, 5], 5),
        ScriptedSensor::constant(north_mag()),
        ScriptedSensor::constant(Vector3::zeros()),
    );
    let mut harness = DiagnosticHarness::new(poller, board(&ticks, &keys, String::new()), HarnessSettings::default());

    let periods: Vec<f32> = (0..3).map(|_| harness.step().unwrap().period).collect();

    assert!((periods[0] - 0.005).abs() < EPSILON);
    assert!((periods[1] - 0.150).abs() < EPSILON);
    assert!((periods[2] - 0.005).abs() < EPSILON);

    let lines: Vec<&str> = harness.sink().lines().collect();
    assert!(lines[1].ends_with("YPR   6Hz"), "line {:?}", lines[1]);
}

#[test]
fn test_uneven_sensor_rates_give_one_sample_per_cycle() {
    let ticks = TickCounter::new();
    let keys = PressCounter::new();
    let accel: Vec<Vector3<f32>> = (1..=10).map(|i| Vector3::new(0.0, 0.0, i as f32)).collect();
    let poller = SensorPoller::new(
        ScriptedSensor::scripted(accel).advancing(&ticks, vec![], 1),
        ScriptedSensor::constant(north_mag()).ready_every(7),
        ScriptedSensor::constant(Vector3::zeros()).ready_every(3),
    );
    let mut harness = DiagnosticHarness::new(poller, board(&ticks, &keys, String::new()), HarnessSettings::default());

    // The accelerometer is ready on every poll but only its next reading is used per sample
    for i in 1..=3 {
        let report = harness.step().unwrap();
        assert_eq!(report.sample.accel, Vector3::new(0.0, 0.0, i as f32));
    }
}

#[test]
fn test_button_presses_cycle_modes() {
    let ticks = TickCounter::new();
    let keys = PressCounter::new();
    let mut harness = DiagnosticHarness::new(still_poller(&ticks), board(&ticks, &keys, String::new()), HarnessSettings::default());

    let mut total = 0u32;
    for presses in [1u32, 0, 2, 5, 9, 3, 1] {
        for _ in 0..presses {
            keys.press();
        }
        total += presses;
        let report = harness.step().unwrap();
        assert_eq!(u32::from(report.mode.index()), total % 9);
    }
}

#[test]
fn test_each_mode_emits_its_tag() {
    let ticks = TickCounter::new();
    let keys = PressCounter::new();
    let mut harness = DiagnosticHarness::new(still_poller(&ticks), board(&ticks, &keys, String::new()), HarnessSettings::default());

    let tags = ["YPR", "ACC", "GDEG", "GRAD", "MAGx0.01Ga", "ofs:gain", "A ", ",Q", "HDG+PR"];
    for (index, tag) in tags.iter().enumerate() {
        if index > 0 {
            keys.press();
        }
        harness.sink_mut().clear();
        let report = harness.step().unwrap();
        assert_eq!(usize::from(report.mode.index()), index);
        assert!(harness.sink().contains(tag), "mode {} output {:?}", index, harness.sink());
    }

    // one more press wraps back to the orientation view
    keys.press();
    harness.sink_mut().clear();
    assert_eq!(harness.step().unwrap().mode, DiagnosticMode::Orientation);
    assert!(harness.sink().contains("YPR"));
}

#[test]
fn test_calibration_session_and_report() {
    let ticks = TickCounter::new();
    let keys = PressCounter::new();
    let sweep: Vec<Vector3<f32>> = (0..=10).map(|i| Vector3::new(i as f32 / 10.0 - 0.5, 0.0, 0.0)).collect();
    let poller = SensorPoller::new(
        ScriptedSensor::constant(level_accel()).advancing(&ticks, vec![], 5),
        ScriptedSensor::scripted(sweep),
        ScriptedSensor::constant(Vector3::zeros()),
    );
    let mut harness = DiagnosticHarness::new(poller, board(&ticks, &keys, String::new()), HarnessSettings::default());

    // straight to the magnetometer view
    for _ in 0..4 {
        keys.press();
    }
    for _ in 0..11 {
        assert_eq!(harness.step().unwrap().mode, DiagnosticMode::Magnetometer);
    }

    let calibration = harness.calibrator().derive_calibration();
    assert!(calibration.offset.x.abs() < EPSILON);
    assert!((calibration.gain.x - 2.0 * NOMINAL_FIELD).abs() < 1e-5);
    assert!(calibration.gain.y.is_infinite());
    assert!(calibration.gain.z.is_infinite());

    // report view
    keys.press();
    harness.sink_mut().clear();
    assert_eq!(harness.step().unwrap().mode, DiagnosticMode::CalibrationReport);
    let lines: Vec<&str> = harness.sink().lines().collect();
    assert_eq!(lines.len(), 3);
    assert_eq!(lines[0], "Mag cal (min:max): -0.500,0.500 0.000,0.000 0.000,0.000");
    assert_eq!(lines[1], "ofs:gain 0.000,0.982 0.000,  inf 0.000,  inf");

    // the report pause shows up in the next measured period
    keys.press();
    let report = harness.step().unwrap();
    assert_eq!(report.mode, DiagnosticMode::AllSensors);
    assert!((report.period - 0.105).abs() < EPSILON, "period {}", report.period);
}

#[test]
fn test_reentering_magnetometer_mode_restarts_calibration() {
    let ticks = TickCounter::new();
    let keys = PressCounter::new();
    let mags = vec![
        Vector3::new(0.4, -0.3, 0.2),
        Vector3::new(0.9, 0.9, 0.9),
        Vector3::new(0.1, 0.1, 0.1),
    ];
    let poller = SensorPoller::new(
        ScriptedSensor::constant(level_accel()).advancing(&ticks, vec![], 5),
        ScriptedSensor::scripted(mags),
        ScriptedSensor::constant(Vector3::zeros()),
    );
    let mut harness = DiagnosticHarness::new(poller, board(&ticks, &keys, String::new()), HarnessSettings::default());

    for _ in 0..4 {
        keys.press();
    }
    harness.step().unwrap();
    assert_eq!(harness.calibrator().max(), Vector3::new(0.4, 0.0, 0.2));

    // over to the report, which does not observe
    keys.press();
    assert_eq!(harness.step().unwrap().mode, DiagnosticMode::CalibrationReport);
    assert_eq!(harness.calibrator().max(), Vector3::new(0.4, 0.0, 0.2));

    // eight more presses wrap back into the magnetometer view
    for _ in 0..8 {
        keys.press();
    }
    assert_eq!(harness.step().unwrap().mode, DiagnosticMode::Magnetometer);
    assert_eq!(harness.calibrator().min(), Vector3::zeros());
    assert_eq!(harness.calibrator().max(), Vector3::new(0.1, 0.1, 0.1));
}

#[test]
fn test_run_until_stopped() {
    let ticks = TickCounter::new();
    let keys = PressCounter::new();
    let stop = AtomicBool::new(false);
    let poller = SensorPoller::new(
        ScriptedSensor::constant(level_accel()).advancing(&ticks, vec![], 5),
        ScriptedSensor::constant(north_mag()),
        ScriptedSensor::constant(Vector3::zeros()).stopping(&stop, 3),
    );
    let mut harness = DiagnosticHarness::new(poller, board(&ticks, &keys, String::new()), HarnessSettings::default());

    harness.run(&stop).unwrap();

    assert_eq!(harness.sink().lines().count(), 3);
    assert_eq!(ticks.ticks_ms(), 15);
}

#[test]
fn test_bounded_poll_reports_dead_sensor() {
    let ticks = TickCounter::new();
    let keys = PressCounter::new();
    let poller = SensorPoller::new(
        ScriptedSensor::constant(level_accel()),
        DeadSensor,
        ScriptedSensor::constant(Vector3::zeros()),
    );
    let settings = HarnessSettings {
        poll_spin_limit: Some(1_000),
        ..Default::default()
    };
    let mut harness = DiagnosticHarness::new(poller, board(&ticks, &keys, String::new()), settings);

    let err = harness.step().unwrap_err();
    assert_eq!(
        err,
        HarnessError::SensorTimeout {
            pending: ReadyMask::ACCEL | ReadyMask::GYRO
        }
    );
    assert!(harness.sink().is_empty());
}

#[test]
fn test_sink_failure_is_reported() {
    let ticks = TickCounter::new();
    let keys = PressCounter::new();
    let mut harness = DiagnosticHarness::new(still_poller(&ticks), board(&ticks, &keys, FailingSink), HarnessSettings::default());

    assert_eq!(harness.step().unwrap_err(), HarnessError::Telemetry);
}

#[test]
fn test_led_chaser_follows_gyroscope() {
    let ticks = TickCounter::new();
    let keys = PressCounter::new();
    let poller = SensorPoller::new(
        ScriptedSensor::constant(level_accel()).advancing(&ticks, vec![], 5),
        ScriptedSensor::constant(north_mag()),
        ScriptedSensor::constant(Vector3::new(360.0, 0.0, 0.0)),
    );
    let mut harness = DiagnosticHarness::new(poller, board(&ticks, &keys, String::new()), HarnessSettings::default());

    harness.step().unwrap();
    assert_eq!(harness.chaser().speed(), 3);
    harness.step().unwrap();
    assert_eq!(harness.chaser().speed(), 5);
}
