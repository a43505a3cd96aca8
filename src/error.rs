//! Error types for the diagnostic harness

use core::fmt;

use crate::poller::ReadyMask;

/// Result type for harness operations
pub type Result<T> = core::result::Result<T, HarnessError>;

/// Harness-level errors
///
/// Sensor non-readiness is not an error on its own: it only becomes one when
/// the caller asked for a bounded wait and the spin budget ran out.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum HarnessError {
    /// Bounded poll gave up before every sensor reported fresh data
    SensorTimeout {
        /// Sensors already read in the unfinished cycle
        pending: ReadyMask,
    },
    /// Telemetry sink rejected a write
    Telemetry,
    /// An indicator LED pin reported an error
    Indicator,
}

impl fmt::Display for HarnessError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HarnessError::SensorTimeout { pending } => {
                write!(f, "sensor poll timed out (ready mask {:#05b})", pending.bits())
            }
            HarnessError::Telemetry => write!(f, "telemetry sink write failed"),
            HarnessError::Indicator => write!(f, "indicator pin write failed"),
        }
    }
}

impl From<fmt::Error> for HarnessError {
    fn from(_: fmt::Error) -> Self {
        HarnessError::Telemetry
    }
}

#[cfg(test)]
mod tests {
    extern crate std;

    use super::*;
    use std::string::ToString;

    #[test]
    fn test_display_reports_ready_mask() {
        let err = HarnessError::SensorTimeout {
            pending: ReadyMask::ACCEL | ReadyMask::GYRO,
        };
        assert_eq!(err.to_string(), "sensor poll timed out (ready mask 0b101)");
    }

    #[test]
    fn test_fmt_error_maps_to_telemetry() {
        let err: HarnessError = fmt::Error.into();
        assert_eq!(err, HarnessError::Telemetry);
    }
}
