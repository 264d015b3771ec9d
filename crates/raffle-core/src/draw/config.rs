// Raffle configuration: number range, quota, and permanent exceptions.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Largest range the engine will materialize as a pool.
pub const MAX_RANGE_SIZE: u64 = 1_000_000;

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

/// Why a configuration was rejected. The `Display` text is shown to the user
/// as-is, so every variant reads as a complete sentence.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InvalidConfiguration {
    #[error("please enter a valid number for {field} (got {value:?})")]
    NotANumber { field: &'static str, value: String },

    #[error("end number ({end}) must be greater than start number ({start})")]
    EmptyRange { start: i64, end: i64 },

    #[error("total draws must be greater than 0 (got {total})")]
    NonPositiveTotal { total: i64 },

    #[error("invalid exception number: {value:?}")]
    MalformedException { value: String },

    #[error("exception number {value} is outside range {start}-{end}")]
    ExceptionOutOfRange { value: i64, start: i64, end: i64 },

    #[error("total draws ({total}) cannot exceed the available numbers ({available})")]
    TotalExceedsAvailable { total: i64, available: u64 },

    #[error("range holds {size} numbers; at most {max} are supported")]
    RangeTooLarge { size: u64, max: u64 },
}

// ---------------------------------------------------------------------------
// DrawConfig
// ---------------------------------------------------------------------------

/// A validated raffle configuration. Immutable once built; the only way to
/// get one is through [`DrawConfig::new`] or [`parse_form`].
///
/// Persisted as `{"start", "end", "total", "exceptions"}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DrawConfig {
    start: i64,
    end: i64,
    #[serde(rename = "total")]
    total_draws: u32,
    #[serde(default)]
    exceptions: BTreeSet<i64>,
}

impl DrawConfig {
    /// Validate and build a configuration.
    ///
    /// Checks run in the order the setup form reports them: range shape,
    /// quota sign, range size, exception bounds, then availability.
    pub fn new(
        start: i64,
        end: i64,
        total: i64,
        exceptions: impl IntoIterator<Item = i64>,
    ) -> Result<Self, InvalidConfiguration> {
        if start >= end {
            return Err(InvalidConfiguration::EmptyRange { start, end });
        }
        if total <= 0 {
            return Err(InvalidConfiguration::NonPositiveTotal { total });
        }

        let size = range_size(start, end);
        if size > MAX_RANGE_SIZE {
            return Err(InvalidConfiguration::RangeTooLarge {
                size,
                max: MAX_RANGE_SIZE,
            });
        }

        let mut set = BTreeSet::new();
        for value in exceptions {
            if value < start || value > end {
                return Err(InvalidConfiguration::ExceptionOutOfRange { value, start, end });
            }
            set.insert(value);
        }

        let available = size - set.len() as u64;
        if total as u64 > available {
            return Err(InvalidConfiguration::TotalExceedsAvailable { total, available });
        }

        // available <= MAX_RANGE_SIZE, so the quota fits in u32
        let total_draws = u32::try_from(total).map_err(|_| {
            InvalidConfiguration::TotalExceedsAvailable { total, available }
        })?;

        Ok(DrawConfig {
            start,
            end,
            total_draws,
            exceptions: set,
        })
    }

    /// Re-run validation on a value that came from outside (e.g. storage).
    pub fn validated(self) -> Result<Self, InvalidConfiguration> {
        DrawConfig::new(
            self.start,
            self.end,
            i64::from(self.total_draws),
            self.exceptions,
        )
    }

    pub fn start(&self) -> i64 {
        self.start
    }

    pub fn end(&self) -> i64 {
        self.end
    }

    pub fn total_draws(&self) -> u32 {
        self.total_draws
    }

    pub fn exceptions(&self) -> &BTreeSet<i64> {
        &self.exceptions
    }

    /// Does `n` fall inside `[start, end]`?
    pub fn in_range(&self, n: i64) -> bool {
        (self.start..=self.end).contains(&n)
    }

    pub fn range_size(&self) -> u64 {
        range_size(self.start, self.end)
    }

    /// Numbers eligible at configure time: the range minus exceptions.
    pub fn available(&self) -> u64 {
        self.range_size() - self.exceptions.len() as u64
    }

    /// Every number in `[start, end]` that is not an exception, ascending.
    pub fn eligible_numbers(&self) -> impl Iterator<Item = i64> + '_ {
        (self.start..=self.end).filter(move |n| !self.exceptions.contains(n))
    }

    /// Display width (in digits) wide enough for any number in the range.
    pub fn number_width(&self) -> usize {
        digits(self.start).max(digits(self.end))
    }
}

// ---------------------------------------------------------------------------
// Form parsing
// ---------------------------------------------------------------------------

/// Build a configuration from the raw text of the setup form.
///
/// `exceptions` is a comma-separated list (`"5, 10, 15"`); blank means none.
pub fn parse_form(
    start: &str,
    end: &str,
    total: &str,
    exceptions: &str,
) -> Result<DrawConfig, InvalidConfiguration> {
    let start = parse_field("start number", start)?;
    let end = parse_field("end number", end)?;
    let total = parse_field("total draws", total)?;

    if start >= end {
        return Err(InvalidConfiguration::EmptyRange { start, end });
    }
    if total <= 0 {
        return Err(InvalidConfiguration::NonPositiveTotal { total });
    }

    DrawConfig::new(start, end, total, parse_exceptions(exceptions)?)
}

/// Parse a comma-separated exception list.
pub fn parse_exceptions(text: &str) -> Result<Vec<i64>, InvalidConfiguration> {
    if text.trim().is_empty() {
        return Ok(Vec::new());
    }
    text.split(',')
        .map(str::trim)
        .map(|part| {
            part.parse::<i64>()
                .map_err(|_| InvalidConfiguration::MalformedException {
                    value: part.to_string(),
                })
        })
        .collect()
}

fn parse_field(field: &'static str, text: &str) -> Result<i64, InvalidConfiguration> {
    text.trim()
        .parse::<i64>()
        .map_err(|_| InvalidConfiguration::NotANumber {
            field,
            value: text.to_string(),
        })
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn range_size(start: i64, end: i64) -> u64 {
    // i128 so that extreme bounds cannot overflow
    let size = i128::from(end) - i128::from(start) + 1;
    u64::try_from(size.max(0)).unwrap_or(u64::MAX)
}

fn digits(n: i64) -> usize {
    n.unsigned_abs().to_string().len()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
