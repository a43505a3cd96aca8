//! Millisecond time base and sample period measurement

use portable_atomic::{AtomicU32, Ordering};

/// Monotonic millisecond tick source
pub trait TimeBase {
    /// Ticks elapsed since start, in milliseconds; wraps at `u32::MAX`
    fn ticks_ms(&self) -> u32;
}

impl<T: TimeBase + ?Sized> TimeBase for &T {
    fn ticks_ms(&self) -> u32 {
        (**self).ticks_ms()
    }
}

/// Tick counter advanced from a 1 ms timer interrupt
///
/// The interrupt is the only writer; the main loop only reads. Designed to
/// live in a `static`.
///
/// # Example
/// ```
/// use imu_harness::{TickCounter, TimeBase};
///
/// static SYS_TICK: TickCounter = TickCounter::new();
///
/// // from the SysTick handler
/// SYS_TICK.tick();
/// assert_eq!(SYS_TICK.ticks_ms(), 1);
/// ```
#[derive(Debug, Default)]
pub struct TickCounter {
    ticks: AtomicU32,
}

impl TickCounter {
    /// Create a counter at zero
    pub const fn new() -> Self {
        Self {
            ticks: AtomicU32::new(0),
        }
    }

    /// Advance by one millisecond
    pub fn tick(&self) {
        self.advance(1);
    }

    /// Advance by `ms` milliseconds
    pub fn advance(&self, ms: u32) {
        self.ticks.fetch_add(ms, Ordering::Release);
    }
}

impl TimeBase for TickCounter {
    fn ticks_ms(&self) -> u32 {
        self.ticks.load(Ordering::Acquire)
    }
}

/// Measures the real period between consecutive completed samples
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SampleClock {
    /// Tick count at the previous sample
    last_ms: u32,
}

impl SampleClock {
    /// Start measuring from the given tick count
    pub fn start(now_ms: u32) -> Self {
        Self { last_ms: now_ms }
    }

    /// Record a sample taken at `now_ms` and return the elapsed time in seconds
    ///
    /// # Example
    /// ```
    /// use imu_harness::SampleClock;
    ///
    /// let mut clock = SampleClock::start(1_000);
    /// assert!((clock.mark(1_150) - 0.15).abs() < 1e-6);
    /// assert!((clock.mark(1_155) - 0.005).abs() < 1e-6);
    /// ```
    pub fn mark(&mut self, now_ms: u32) -> f32 {
        let elapsed = now_ms.wrapping_sub(self.last_ms);
        self.last_ms = now_ms;
        elapsed as f32 / 1000.0
    }

    /// Tick count of the previous sample
    pub fn last_ms(&self) -> u32 {
        self.last_ms
    }
}
