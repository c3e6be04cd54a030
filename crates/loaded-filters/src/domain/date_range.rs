//! `_lastUpdated` date ranges
//!
//! A range is two independent optional bounds. Each bound carries a
//! comparison prefix; only `gt`/`ge` are meaningful on the lower side and
//! only `lt`/`le` on the upper side. Anything else is a client-input error.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::entities::Timestamp;
use crate::error::FilterError;

/// Comparison prefix of a search date parameter
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ComparisonPrefix {
    Equal,
    NotEqual,
    GreaterThan,
    GreaterThanOrEquals,
    LessThan,
    LessThanOrEquals,
    StartsAfter,
    EndsBefore,
    Approximate,
}

impl ComparisonPrefix {
    pub fn as_str(&self) -> &'static str {
        match self {
            ComparisonPrefix::Equal => "eq",
            ComparisonPrefix::NotEqual => "ne",
            ComparisonPrefix::GreaterThan => "gt",
            ComparisonPrefix::GreaterThanOrEquals => "ge",
            ComparisonPrefix::LessThan => "lt",
            ComparisonPrefix::LessThanOrEquals => "le",
            ComparisonPrefix::StartsAfter => "sa",
            ComparisonPrefix::EndsBefore => "eb",
            ComparisonPrefix::Approximate => "ap",
        }
    }
}

impl fmt::Display for ComparisonPrefix {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ComparisonPrefix {
    type Err = FilterError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "eq" => Ok(ComparisonPrefix::Equal),
            "ne" => Ok(ComparisonPrefix::NotEqual),
            "gt" => Ok(ComparisonPrefix::GreaterThan),
            "ge" => Ok(ComparisonPrefix::GreaterThanOrEquals),
            "lt" => Ok(ComparisonPrefix::LessThan),
            "le" => Ok(ComparisonPrefix::LessThanOrEquals),
            "sa" => Ok(ComparisonPrefix::StartsAfter),
            "eb" => Ok(ComparisonPrefix::EndsBefore),
            "ap" => Ok(ComparisonPrefix::Approximate),
            other => Err(FilterError::InvalidDateParam(format!(
                "unknown comparison prefix '{}'",
                other
            ))),
        }
    }
}

/// Which end of a range a bound sits on
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BoundSide {
    Lower,
    Upper,
}

impl fmt::Display for BoundSide {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BoundSide::Lower => f.write_str("lower"),
            BoundSide::Upper => f.write_str("upper"),
        }
    }
}

/// One end of a date range
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateBound {
    pub prefix: ComparisonPrefix,
    pub value: Timestamp,
}

impl DateBound {
    pub fn new(prefix: ComparisonPrefix, value: Timestamp) -> Self {
        Self { prefix, value }
    }

    pub fn gt(value: Timestamp) -> Self {
        Self::new(ComparisonPrefix::GreaterThan, value)
    }

    pub fn ge(value: Timestamp) -> Self {
        Self::new(ComparisonPrefix::GreaterThanOrEquals, value)
    }

    pub fn lt(value: Timestamp) -> Self {
        Self::new(ComparisonPrefix::LessThan, value)
    }

    pub fn le(value: Timestamp) -> Self {
        Self::new(ComparisonPrefix::LessThanOrEquals, value)
    }
}

/// Parses `ge2021-03-27T21:14:52.316Z`; a bare timestamp means `eq`
impl FromStr for DateBound {
    type Err = FilterError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let has_prefix = s.len() > 2 && s.as_bytes()[..2].iter().all(u8::is_ascii_alphabetic);
        let (prefix, rest) = if has_prefix {
            (s[..2].parse()?, &s[2..])
        } else {
            (ComparisonPrefix::Equal, s)
        };

        let value = DateTime::parse_from_rfc3339(rest)
            .map_err(|e| FilterError::InvalidDateParam(format!("'{}': {}", rest, e)))?
            .with_timezone(&Utc);

        Ok(Self { prefix, value })
    }
}

/// A `_lastUpdated` range with independent optional bounds
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateRange {
    lower: Option<DateBound>,
    upper: Option<DateBound>,
}

impl DateRange {
    /// Build a range from raw bounds; prefixes are checked when the range is used
    pub fn new(lower: Option<DateBound>, upper: Option<DateBound>) -> Self {
        Self { lower, upper }
    }

    /// `[lower, upper]`, both inclusive
    pub fn closed(lower: Timestamp, upper: Timestamp) -> Self {
        Self::new(Some(DateBound::ge(lower)), Some(DateBound::le(upper)))
    }

    /// `[lower, +inf)`
    pub fn starting_at(lower: Timestamp) -> Self {
        Self::new(Some(DateBound::ge(lower)), None)
    }

    /// Parse the repeated `_lastUpdated` values of a search request
    ///
    /// `gt`/`ge`/`sa` values become the lower bound, `lt`/`le`/`eb` the upper
    /// bound, and `eq` (or no prefix) pins both ends to the instant.
    pub fn from_params<I, S>(params: I) -> Result<Self, FilterError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut range = DateRange::default();

        for param in params {
            let bound: DateBound = param.as_ref().parse()?;
            match bound.prefix {
                ComparisonPrefix::GreaterThan
                | ComparisonPrefix::GreaterThanOrEquals
                | ComparisonPrefix::StartsAfter => range.set_bound(BoundSide::Lower, bound)?,
                ComparisonPrefix::LessThan
                | ComparisonPrefix::LessThanOrEquals
                | ComparisonPrefix::EndsBefore => range.set_bound(BoundSide::Upper, bound)?,
                ComparisonPrefix::Equal => {
                    range.set_bound(BoundSide::Lower, DateBound::ge(bound.value))?;
                    range.set_bound(BoundSide::Upper, DateBound::le(bound.value))?;
                }
                prefix => {
                    return Err(FilterError::InvalidBound {
                        side: BoundSide::Lower,
                        prefix,
                    })
                }
            }
        }

        range.validate()?;
        Ok(range)
    }

    fn set_bound(&mut self, side: BoundSide, bound: DateBound) -> Result<(), FilterError> {
        let slot = match side {
            BoundSide::Lower => &mut self.lower,
            BoundSide::Upper => &mut self.upper,
        };
        if slot.is_some() {
            return Err(FilterError::InvalidDateParam(format!(
                "more than one {} bound in _lastUpdated",
                side
            )));
        }
        *slot = Some(bound);
        Ok(())
    }

    pub fn lower(&self) -> Option<&DateBound> {
        self.lower.as_ref()
    }

    pub fn upper(&self) -> Option<&DateBound> {
        self.upper.as_ref()
    }

    /// Instant of the lower bound, whatever its prefix
    pub fn lower_instant(&self) -> Option<Timestamp> {
        self.lower.map(|b| b.value)
    }

    /// Instant of the upper bound, whatever its prefix
    pub fn upper_instant(&self) -> Option<Timestamp> {
        self.upper.map(|b| b.value)
    }

    /// Reject prefixes that cannot be used on their side
    pub fn validate(&self) -> Result<(), FilterError> {
        if let Some(lower) = &self.lower {
            check_lower(lower)?;
        }
        if let Some(upper) = &self.upper {
            check_upper(upper)?;
        }
        Ok(())
    }

    /// Whether `[first, last]` overlaps this range
    ///
    /// The upper bound is compared against `first`, the lower bound against
    /// `last`. Missing bounds are open.
    pub fn overlaps(&self, first: Timestamp, last: Timestamp) -> Result<bool, FilterError> {
        if let Some(upper) = &self.upper {
            let inclusive = check_upper(upper)?;
            let before = if inclusive {
                upper.value < first
            } else {
                upper.value <= first
            };
            if before {
                return Ok(false);
            }
        }

        if let Some(lower) = &self.lower {
            let inclusive = check_lower(lower)?;
            let after = if inclusive {
                lower.value > last
            } else {
                lower.value >= last
            };
            if after {
                return Ok(false);
            }
        }

        Ok(true)
    }
}

/// Returns whether the lower bound is inclusive
fn check_lower(bound: &DateBound) -> Result<bool, FilterError> {
    match bound.prefix {
        ComparisonPrefix::GreaterThanOrEquals => Ok(true),
        ComparisonPrefix::GreaterThan => Ok(false),
        prefix => Err(FilterError::InvalidBound {
            side: BoundSide::Lower,
            prefix,
        }),
    }
}

/// Returns whether the upper bound is inclusive
fn check_upper(bound: &DateBound) -> Result<bool, FilterError> {
    match bound.prefix {
        ComparisonPrefix::LessThanOrEquals => Ok(true),
        ComparisonPrefix::LessThan => Ok(false),
        prefix => Err(FilterError::InvalidBound {
            side: BoundSide::Upper,
            prefix,
        }),
    }
}
