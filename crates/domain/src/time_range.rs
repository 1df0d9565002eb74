//! Time ranges for variable query evaluation
//!
//! A time range is either relative to "now" (`1h`, `7d`, `1h30m`) or an
//! absolute window. Ranges are shared through the `start`/`end` query
//! parameters: a relative start is written as its duration string, absolute
//! bounds as Unix milliseconds.

use std::fmt;
use std::str::FromStr;
use std::sync::LazyLock;

use chrono::{DateTime, Duration, TimeZone, Utc};
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::{DomainError, DomainResult};

/// Relative range used when nothing else is configured.
pub const DEFAULT_TIME_RANGE: &str = "1h";

/// Query parameter holding the range start.
pub const START_PARAM: &str = "start";

/// Query parameter holding the range end.
pub const END_PARAM: &str = "end";

static DURATION_PATTERN: LazyLock<Result<Regex, regex::Error>> = LazyLock::new(|| {
    Regex::new(
        r"^(?:(\d+)y)?(?:(\d+)w)?(?:(\d+)d)?(?:(\d+)h)?(?:(\d+)m)?(?:(\d+)s)?(?:(\d+)ms)?$",
    )
});

/// A validated duration such as `1h`, `30m` or `1d12h`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct DurationString(String);

impl DurationString {
    /// Parses a duration string.
    ///
    /// # Errors
    /// Returns `DomainError::InvalidDuration` if `input` is empty, malformed,
    /// amounts to zero, or reaches back further than a timestamp can.
    pub fn parse(input: &str) -> DomainResult<Self> {
        let duration = Self::compute(input)?;
        if duration <= Duration::zero() {
            return Err(DomainError::InvalidDuration(format!(
                "'{input}' must be greater than zero"
            )));
        }
        if DateTime::<Utc>::UNIX_EPOCH
            .checked_sub_signed(duration)
            .is_none()
        {
            return Err(DomainError::InvalidDuration(format!(
                "'{input}' is out of range"
            )));
        }
        Ok(Self(input.to_string()))
    }

    /// Returns the duration string as written.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns the duration.
    #[must_use]
    pub fn to_duration(&self) -> Duration {
        Self::compute(&self.0).unwrap_or_else(|_| Duration::zero())
    }

    fn compute(input: &str) -> DomainResult<Duration> {
        let pattern = DURATION_PATTERN
            .as_ref()
            .map_err(|e| DomainError::InvalidDuration(e.to_string()))?;
        let captures = pattern
            .captures(input)
            .filter(|_| !input.is_empty())
            .ok_or_else(|| DomainError::InvalidDuration(input.to_string()))?;

        // (capture group, milliseconds per unit)
        const UNITS: [(usize, i64); 7] = [
            (1, 365 * 24 * 3_600_000),
            (2, 7 * 24 * 3_600_000),
            (3, 24 * 3_600_000),
            (4, 3_600_000),
            (5, 60_000),
            (6, 1_000),
            (7, 1),
        ];

        let mut millis: i64 = 0;
        for (group, unit) in UNITS {
            if let Some(m) = captures.get(group) {
                let amount: i64 = m
                    .as_str()
                    .parse()
                    .map_err(|_| DomainError::InvalidDuration(input.to_string()))?;
                millis = amount
                    .checked_mul(unit)
                    .and_then(|v| millis.checked_add(v))
                    .ok_or_else(|| DomainError::InvalidDuration(input.to_string()))?;
            }
        }
        Ok(Duration::milliseconds(millis))
    }
}

impl FromStr for DurationString {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for DurationString {
    type Error = DomainError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<DurationString> for String {
    fn from(value: DurationString) -> Self {
        value.0
    }
}

impl fmt::Display for DurationString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A concrete time window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AbsoluteTimeRange {
    /// Inclusive start.
    pub start: DateTime<Utc>,
    /// Exclusive end.
    pub end: DateTime<Utc>,
}

impl AbsoluteTimeRange {
    /// Creates a window.
    ///
    /// # Errors
    /// Returns `DomainError::InvalidTimeRange` if `start` is not before `end`.
    pub fn new(start: DateTime<Utc>, end: DateTime<Utc>) -> DomainResult<Self> {
        if start >= end {
            return Err(DomainError::InvalidTimeRange(format!(
                "start {start} is not before end {end}"
            )));
        }
        Ok(Self { start, end })
    }
}

/// The time range a variable query is evaluated over.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum TimeRange {
    /// A window ending at `end` (or now) and reaching back `past_duration`.
    #[serde(rename_all = "camelCase")]
    Relative {
        /// How far back the window reaches.
        past_duration: DurationString,
        /// Fixed end, or `None` for "now".
        #[serde(default, skip_serializing_if = "Option::is_none")]
        end: Option<DateTime<Utc>>,
    },
    /// A fixed window.
    Absolute(AbsoluteTimeRange),
}

impl Default for TimeRange {
    fn default() -> Self {
        Self::Relative {
            past_duration: DurationString(DEFAULT_TIME_RANGE.to_string()),
            end: None,
        }
    }
}

impl TimeRange {
    /// Creates a relative range ending now.
    ///
    /// # Errors
    /// Returns an error if `duration` is not a valid duration string.
    pub fn relative(duration: &str) -> DomainResult<Self> {
        Ok(Self::Relative {
            past_duration: DurationString::parse(duration)?,
            end: None,
        })
    }

    /// Resolves the range into a concrete window at `now`.
    ///
    /// A start before the earliest representable instant is clamped to it.
    #[must_use]
    pub fn to_absolute(&self, now: DateTime<Utc>) -> AbsoluteTimeRange {
        match self {
            Self::Relative { past_duration, end } => {
                let end = end.unwrap_or(now);
                let start = end
                    .checked_sub_signed(past_duration.to_duration())
                    .unwrap_or(DateTime::<Utc>::MIN_UTC);
                AbsoluteTimeRange { start, end }
            }
            Self::Absolute(range) => *range,
        }
    }

    /// Encodes the range as `start`/`end` query parameters.
    #[must_use]
    pub fn to_query_params(&self) -> Vec<(String, String)> {
        match self {
            Self::Relative { past_duration, end } => {
                let mut params = vec![(START_PARAM.to_string(), past_duration.to_string())];
                if let Some(end) = end {
                    params.push((END_PARAM.to_string(), end.timestamp_millis().to_string()));
                }
                params
            }
            Self::Absolute(range) => vec![
                (
                    START_PARAM.to_string(),
                    range.start.timestamp_millis().to_string(),
                ),
                (END_PARAM.to_string(), range.end.timestamp_millis().to_string()),
            ],
        }
    }

    /// Decodes a range from `start`/`end` query parameters.
    ///
    /// Returns `None` when no `start` parameter is present.
    #[must_use]
    pub fn from_query_params(params: &[(String, String)]) -> Option<DomainResult<Self>> {
        let find = |key: &str| {
            params
                .iter()
                .find(|(k, _)| k == key)
                .map(|(_, v)| v.as_str())
        };
        let start = find(START_PARAM)?;
        let end = find(END_PARAM).map(parse_millis).transpose();

        Some(end.and_then(|end| {
            if let Ok(start_millis) = start.parse::<i64>() {
                let start = from_millis(start_millis)?;
                let end = end.ok_or_else(|| {
                    DomainError::InvalidTimeRange("absolute start without end".to_string())
                })?;
                AbsoluteTimeRange::new(start, end).map(Self::Absolute)
            } else {
                Ok(Self::Relative {
                    past_duration: DurationString::parse(start)?,
                    end,
                })
            }
        }))
    }
}

fn parse_millis(value: &str) -> DomainResult<DateTime<Utc>> {
    let millis = value
        .parse::<i64>()
        .map_err(|_| DomainError::InvalidTimeRange(format!("'{value}' is not a timestamp")))?;
    from_millis(millis)
}

fn from_millis(millis: i64) -> DomainResult<DateTime<Utc>> {
    Utc.timestamp_millis_opt(millis)
        .single()
        .ok_or_else(|| DomainError::InvalidTimeRange(format!("'{millis}' is out of range")))
}
