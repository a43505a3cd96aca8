//! Button-driven diagnostic mode cycling

use portable_atomic::{AtomicU32, Ordering};

use crate::types::DiagnosticMode;

/// Source of user button presses
pub trait KeyPresses {
    /// Presses since the previous call; the count is consumed
    fn take_presses(&mut self) -> u32;
}

impl<K: KeyPresses + ?Sized> KeyPresses for &mut K {
    fn take_presses(&mut self) -> u32 {
        (**self).take_presses()
    }
}

/// Press counter incremented from the key interrupt
///
/// # Example
/// ```
/// use imu_harness::{KeyPresses, PressCounter};
///
/// static KEY: PressCounter = PressCounter::new();
///
/// KEY.press(); // from the EXTI handler
/// assert_eq!((&KEY).take_presses(), 1);
/// assert_eq!((&KEY).take_presses(), 0);
/// ```
#[derive(Debug, Default)]
pub struct PressCounter {
    presses: AtomicU32,
}

impl PressCounter {
    /// Create a counter with no pending presses
    pub const fn new() -> Self {
        Self {
            presses: AtomicU32::new(0),
        }
    }

    /// Record one press
    pub fn press(&self) {
        self.presses.fetch_add(1, Ordering::AcqRel);
    }
}

impl KeyPresses for &PressCounter {
    fn take_presses(&mut self) -> u32 {
        self.presses.swap(0, Ordering::AcqRel)
    }
}

impl KeyPresses for PressCounter {
    fn take_presses(&mut self) -> u32 {
        self.presses.swap(0, Ordering::AcqRel)
    }
}

/// Finite state machine over the nine diagnostic modes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ModeCycler {
    mode: DiagnosticMode,
}

impl ModeCycler {
    /// Start in [`DiagnosticMode::Orientation`]
    pub fn new() -> Self {
        Self::default()
    }

    /// Current mode
    pub fn mode(&self) -> DiagnosticMode {
        self.mode
    }

    /// Advance by `presses` modes, wrapping after the last one
    ///
    /// # Example
    /// ```
    /// use imu_harness::{DiagnosticMode, ModeCycler};
    ///
    /// let mut cycler = ModeCycler::new();
    /// assert_eq!(cycler.advance(4), DiagnosticMode::Magnetometer);
    /// assert_eq!(cycler.advance(5), DiagnosticMode::Orientation);
    /// ```
    pub fn advance(&mut self, presses: u32) -> DiagnosticMode {
        let count = u32::from(DiagnosticMode::COUNT);
        let steps = presses % count;
        let index = (u32::from(self.mode.index()) + steps) % count;
        self.mode = DiagnosticMode::from_index(index as u8);
        self.mode
    }
}
