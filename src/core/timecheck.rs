use crate::types::{WindError, WindResult};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// No reliable wind estimate is possible when the auxiliary field is more
/// than this many hours away from the SAR acquisition
pub const MAX_HOURS_FATAL: f64 = 12.0;
/// Gaps above this are surfaced as a warning but processing continues
pub const MAX_HOURS_OK: f64 = 3.0;

/// Classification of the gap between the SAR acquisition time and the
/// auxiliary wind field time
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TimeGapSeverity {
    Ok,
    Warn,
    Fatal,
}

/// Absolute gap between two timestamps in hours
pub fn hours_between(sar_time: DateTime<Utc>, aux_time: DateTime<Utc>) -> f64 {
    let seconds = (sar_time - aux_time).num_milliseconds() as f64 / 1000.0;
    (seconds / 3600.0).abs()
}

/// Classify the time gap. Boundary-exact: 3.0 h is Ok, 12.0 h is Warn.
pub fn check(sar_time: DateTime<Utc>, aux_time: DateTime<Utc>) -> TimeGapSeverity {
    let hours = hours_between(sar_time, aux_time);
    if hours <= MAX_HOURS_OK {
        TimeGapSeverity::Ok
    } else if hours <= MAX_HOURS_FATAL {
        TimeGapSeverity::Warn
    } else {
        TimeGapSeverity::Fatal
    }
}

/// Classify the gap and turn a fatal gap into a hard error carrying the
/// computed hour difference
pub fn enforce(sar_time: DateTime<Utc>, aux_time: DateTime<Utc>) -> WindResult<TimeGapSeverity> {
    let hours = hours_between(sar_time, aux_time);
    let severity = check(sar_time, aux_time);
    log::info!(
        "Time difference between SAR image and wind direction: {:.2} hours",
        hours
    );
    match severity {
        TimeGapSeverity::Fatal => Err(WindError::TimeDiff { hours }),
        TimeGapSeverity::Warn => {
            log::warn!("Time difference exceeds 3 hours!");
            Ok(severity)
        }
        TimeGapSeverity::Ok => Ok(severity),
    }
}
