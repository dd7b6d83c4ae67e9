use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Datelike, Duration, NaiveDate, Utc};
use serde::Serialize;
use tracing::warn;

use crate::error::MetricsError;

/// Applied when no lookback is given on the command line.
pub const DEFAULT_LOOKBACK_DAYS: i64 = 90;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LookbackUnit {
    Day,
    Week,
    Month,
    Quarter,
    Year,
}

impl LookbackUnit {
    /// Fixed-length approximations. Month/quarter/year deliberately ignore
    /// the calendar so the same string always yields the same span.
    fn days(self) -> i64 {
        match self {
            LookbackUnit::Day => 1,
            LookbackUnit::Week => 7,
            LookbackUnit::Month => 30,
            LookbackUnit::Quarter => 90,
            LookbackUnit::Year => 365,
        }
    }
}

/// A parsed lookback string such as `"10d"` or `"-3w"`. The sign is kept
/// separate from the magnitude: a negative lookback flips the window into
/// look-ahead mode rather than producing a negative span.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LookbackSpec {
    pub magnitude: u32,
    pub unit: LookbackUnit,
    pub negative: bool,
}

impl LookbackSpec {
    pub fn parse(s: &str) -> Result<Self, MetricsError> {
        let invalid = || MetricsError::InvalidFormat(s.to_string());

        let (negative, rest) = match s.strip_prefix('-') {
            Some(rest) => (true, rest),
            None => (false, s.strip_prefix('+').unwrap_or(s)),
        };
        let (digits, unit) = rest.split_at(rest.len().saturating_sub(1));
        let unit = match unit {
            "d" => LookbackUnit::Day,
            "w" => LookbackUnit::Week,
            "m" => LookbackUnit::Month,
            "q" => LookbackUnit::Quarter,
            "y" => LookbackUnit::Year,
            _ => return Err(invalid()),
        };
        if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
            return Err(invalid());
        }
        let magnitude = digits.parse().map_err(|_| invalid())?;

        Ok(Self {
            magnitude,
            unit,
            negative,
        })
    }

    /// The unsigned span this lookback covers.
    pub fn span(&self) -> Duration {
        Duration::days(self.magnitude as i64 * self.unit.days())
    }

    pub fn is_negative(&self) -> bool {
        self.negative
    }
}

impl FromStr for LookbackSpec {
    type Err = MetricsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for LookbackSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let unit = match self.unit {
            LookbackUnit::Day => 'd',
            LookbackUnit::Week => 'w',
            LookbackUnit::Month => 'm',
            LookbackUnit::Quarter => 'q',
            LookbackUnit::Year => 'y',
        };
        if self.negative {
            write!(f, "-{}{}", self.magnitude, unit)
        } else {
            write!(f, "{}{}", self.magnitude, unit)
        }
    }
}

/// UTC midnight on the Monday on or before `t`. Monday-midnight inputs are
/// returned unchanged.
pub fn start_of_week(t: DateTime<Utc>) -> DateTime<Utc> {
    let midnight = t.date_naive().and_hms_opt(0, 0, 0).unwrap().and_utc();
    midnight - Duration::days(t.weekday().num_days_from_monday() as i64)
}

/// The resolved reporting window. Both bounds are inclusive day boundaries
/// at UTC midnight.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct TimeWindow {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

/// Raw window inputs as they arrive from the command line.
#[derive(Debug, Clone, Default)]
pub struct WindowConfig {
    pub reference_date: Option<NaiveDate>,
    pub lookback: Option<LookbackSpec>,
    pub complete_weeks: bool,
}

impl WindowConfig {
    /// Combine reference date, signed lookback and the complete-weeks flag
    /// into a window. `now` is passed in so the resolution is testable.
    ///
    /// Four cases: a negative lookback looks ahead from the reference date;
    /// a non-negative lookback looks back to it; a reference date without a
    /// lookback runs from that date to now; neither falls back to a
    /// 90-day look-back ending now. Complete-weeks truncation only ever
    /// touches the bound that was derived, never the one the user supplied,
    /// and derived start bounds shift forward a week before aligning so the
    /// window never silently grows past the user's intent.
    pub fn resolve(&self, now: DateTime<Utc>) -> Result<TimeWindow, MetricsError> {
        let mut reference = match self.reference_date {
            Some(d) => d.and_hms_opt(0, 0, 0).unwrap().and_utc(),
            None => now.date_naive().and_hms_opt(0, 0, 0).unwrap().and_utc(),
        };

        if self.complete_weeks {
            let look_ahead = self
                .lookback
                .map_or(self.reference_date.is_some(), |l| l.is_negative());
            // start_of_week rounds down; a look-ahead window anchored at its
            // start would shrink unless the reference first moves forward.
            if look_ahead && reference != start_of_week(reference) {
                reference += Duration::days(7);
            }
            reference = start_of_week(reference);
        }

        let (start, end) = match self.lookback {
            Some(lookback) if lookback.is_negative() => {
                let mut end = reference + lookback.span();
                if self.complete_weeks {
                    end = start_of_week(end);
                }
                (reference, end)
            }
            Some(lookback) => {
                let mut start = reference - lookback.span();
                if self.complete_weeks && start != start_of_week(start) {
                    start = start_of_week(start + Duration::days(7));
                }
                (start, reference)
            }
            None if self.reference_date.is_some() => {
                let mut end = now;
                if self.complete_weeks {
                    end = start_of_week(end);
                }
                (reference, end)
            }
            None => {
                warn!(
                    "no lookback given, defaulting to {} days",
                    DEFAULT_LOOKBACK_DAYS
                );
                let mut start = reference - Duration::days(DEFAULT_LOOKBACK_DAYS);
                if self.complete_weeks && start != start_of_week(start) {
                    start = start_of_week(start + Duration::days(7));
                }
                (start, reference)
            }
        };

        if start > now {
            return Err(MetricsError::FutureWindow { start });
        }
        if end > now {
            warn!(end = %end, "window end is in the future, results may be partial");
        }

        Ok(TimeWindow { start, end })
    }
}
