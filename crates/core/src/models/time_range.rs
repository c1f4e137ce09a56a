use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};

use crate::errors::{MeetError, MeetResult};

/// A half-open time window `[start, end)` in absolute UTC instants.
///
/// The portal's clients historically submitted two body shapes for time
/// windows: `{ "start": ..., "end": ... }` with RFC 3339 instants, and the
/// legacy `{ "date": "YYYY-MM-DD", "startTime": "HH:MM", "endTime": "HH:MM" }`
/// form. Both deserialize into this single validated type so nothing past the
/// HTTP boundary has to care which shape arrived.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "TimeRangeBody")]
pub struct TimeRange {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl TimeRange {
    pub fn new(start: DateTime<Utc>, end: DateTime<Utc>) -> Self {
        Self { start, end }
    }

    /// Checks the structural and temporal validity of the window.
    ///
    /// Returns `InvalidRange` when `end <= start` and `PastWindow` when the
    /// window has fully elapsed relative to `now`. Order matters: a reversed
    /// range in the past reports `InvalidRange`.
    pub fn validate(&self, now: DateTime<Utc>) -> MeetResult<()> {
        if self.end <= self.start {
            return Err(MeetError::InvalidRange);
        }
        if self.end <= now {
            return Err(MeetError::PastWindow);
        }
        Ok(())
    }

    /// Half-open interval overlap: `[a, b)` and `[c, d)` overlap iff
    /// `a < d && c < b`. Touching endpoints do not overlap.
    pub fn overlaps(&self, other: &TimeRange) -> bool {
        self.start < other.end && other.start < self.end
    }

    pub fn contains(&self, other: &TimeRange) -> bool {
        self.start <= other.start && other.end <= self.end
    }
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum TimeRangeBody {
    Instants {
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    },
    Legacy {
        date: NaiveDate,
        #[serde(rename = "startTime")]
        start_time: String,
        #[serde(rename = "endTime")]
        end_time: String,
    },
}

fn parse_clock(value: &str) -> Result<NaiveTime, String> {
    NaiveTime::parse_from_str(value, "%H:%M")
        .or_else(|_| NaiveTime::parse_from_str(value, "%H:%M:%S"))
        .map_err(|_| format!("invalid clock time: {value}"))
}

impl TryFrom<TimeRangeBody> for TimeRange {
    type Error = String;

    fn try_from(body: TimeRangeBody) -> Result<Self, Self::Error> {
        match body {
            TimeRangeBody::Instants { start, end } => Ok(TimeRange { start, end }),
            TimeRangeBody::Legacy {
                date,
                start_time,
                end_time,
            } => {
                // Legacy bodies carry no zone information and are read as UTC.
                let start = date.and_time(parse_clock(&start_time)?).and_utc();
                let end = date.and_time(parse_clock(&end_time)?).and_utc();
                Ok(TimeRange { start, end })
            }
        }
    }
}
