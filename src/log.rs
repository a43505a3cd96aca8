//! Logging facade
//!
//! Forwards to `defmt` when the `defmt` feature is enabled. Without it the
//! macros expand to nothing so host builds and tests carry no logger.
//!
//! The macros are textually scoped: the module is declared first in the crate
//! root with `#[macro_use]` and callers never `use` them, since `warn` would
//! clash with the built-in attribute of the same name.

#[cfg(feature = "defmt")]
macro_rules! warn {
    ($($arg:tt)*) => { defmt::warn!($($arg)*) };
}

#[cfg(feature = "defmt")]
macro_rules! info {
    ($($arg:tt)*) => { defmt::info!($($arg)*) };
}

#[cfg(feature = "defmt")]
macro_rules! debug {
    ($($arg:tt)*) => { defmt::debug!($($arg)*) };
}

#[cfg(feature = "defmt")]
macro_rules! trace {
    ($($arg:tt)*) => { defmt::trace!($($arg)*) };
}

// Stub macros when defmt is not available
#[cfg(not(feature = "defmt"))]
macro_rules! warn {
    ($($arg:tt)*) => {{}};
}

#[cfg(not(feature = "defmt"))]
macro_rules! info {
    ($($arg:tt)*) => {{}};
}

#[cfg(not(feature = "defmt"))]
macro_rules! debug {
    ($($arg:tt)*) => {{}};
}

#[cfg(not(feature = "defmt"))]
macro_rules! trace {
    ($($arg:tt)*) => {{}};
}

#[cfg(all(test, not(feature = "defmt")))]
mod tests {
    #[test]
    fn test_stub_macros_expand_in_statement_position() {
        let spins = 3u32;
        warn!("sensor poll gave up after {} spins", spins);
        info!("mode {} -> {}", 0, 1);
        debug!("calibration restarted");
        trace!("period {} s", 0.005f32);
        assert_eq!(spins, 3);
    }
}
