//! # Month-Granular Periods
//!
//! The benefit is paid per calendar month. Every date-bearing decision in
//! the engine — termination effective dates, clawback coverage, payment
//! suppression — is made at month granularity, so the core types here are
//! [`Maaned`] (a specific year-month) and [`Periode`] (a contiguous,
//! inclusive month range).
//!
//! Invalid values are rejected at construction; there is no "empty period"
//! and no month number outside 1..=12.

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

/// A specific calendar month (year + month), the atomic unit of benefit
/// payment.
///
/// Ordering is chronological. Serializes as `{ "year": .., "month": .. }`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Maaned {
    year: i32,
    month: u32,
}

impl Maaned {
    /// Create a month from a year and a calendar month number (1..=12).
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::InvalidMonthNumber`] when `month` is
    /// outside 1..=12.
    pub fn new(year: i32, month: u32) -> Result<Self, ValidationError> {
        if !(1..=12).contains(&month) {
            return Err(ValidationError::InvalidMonthNumber(month));
        }
        Ok(Self { year, month })
    }

    /// The month containing the given date.
    pub fn from_date(date: NaiveDate) -> Self {
        Self {
            year: date.year(),
            month: date.month(),
        }
    }

    /// The year component.
    pub fn year(&self) -> i32 {
        self.year
    }

    /// The calendar month number (1..=12).
    pub fn month(&self) -> u32 {
        self.month
    }

    /// The first day of this month.
    ///
    /// Infallible: the (year, month, 1) triple is always a valid date for a
    /// validated month.
    pub fn first_day(&self) -> NaiveDate {
        NaiveDate::from_ymd_opt(self.year, self.month, 1)
            .unwrap_or_else(|| unreachable!("validated month {self} has a first day"))
    }

    /// The month immediately after this one.
    pub fn next(&self) -> Self {
        if self.month == 12 {
            Self {
                year: self.year + 1,
                month: 1,
            }
        } else {
            Self {
                year: self.year,
                month: self.month + 1,
            }
        }
    }

    /// The month immediately before this one.
    pub fn previous(&self) -> Self {
        if self.month == 1 {
            Self {
                year: self.year - 1,
                month: 12,
            }
        } else {
            Self {
                year: self.year,
                month: self.month - 1,
            }
        }
    }
}

impl std::fmt::Display for Maaned {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:04}-{:02}", self.year, self.month)
    }
}

/// A contiguous, inclusive range of months.
///
/// A period always contains at least one month; `fra_og_med > til_og_med`
/// is rejected at construction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Periode {
    fra_og_med: Maaned,
    til_og_med: Maaned,
}

impl Periode {
    /// Create a period covering `fra_og_med..=til_og_med`.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::PeriodeIsReversed`] when the bounds are
    /// out of order.
    pub fn new(fra_og_med: Maaned, til_og_med: Maaned) -> Result<Self, ValidationError> {
        if fra_og_med > til_og_med {
            return Err(ValidationError::PeriodeIsReversed {
                fra_og_med: fra_og_med.to_string(),
                til_og_med: til_og_med.to_string(),
            });
        }
        Ok(Self {
            fra_og_med,
            til_og_med,
        })
    }

    /// A period covering exactly one month.
    pub fn single(maaned: Maaned) -> Self {
        Self {
            fra_og_med: maaned,
            til_og_med: maaned,
        }
    }

    /// First month of the period (inclusive).
    pub fn fra_og_med(&self) -> Maaned {
        self.fra_og_med
    }

    /// Last month of the period (inclusive).
    pub fn til_og_med(&self) -> Maaned {
        self.til_og_med
    }

    /// Whether the given month falls inside the period.
    pub fn inneholder(&self, maaned: Maaned) -> bool {
        self.fra_og_med <= maaned && maaned <= self.til_og_med
    }

    /// Whether `other` is fully contained in this period.
    pub fn inneholder_periode(&self, other: &Periode) -> bool {
        self.fra_og_med <= other.fra_og_med && other.til_og_med <= self.til_og_med
    }

    /// Whether the two periods share at least one month.
    pub fn overlapper(&self, other: &Periode) -> bool {
        self.fra_og_med <= other.til_og_med && other.fra_og_med <= self.til_og_med
    }

    /// Number of months in the period.
    pub fn antall_maaneder(&self) -> usize {
        let from = self.fra_og_med.year as i64 * 12 + i64::from(self.fra_og_med.month);
        let to = self.til_og_med.year as i64 * 12 + i64::from(self.til_og_med.month);
        (to - from + 1) as usize
    }

    /// Iterate the months of the period in chronological order.
    pub fn maaneder(&self) -> impl Iterator<Item = Maaned> + '_ {
        let mut current = Some(self.fra_og_med);
        let last = self.til_og_med;
        std::iter::from_fn(move || {
            let maaned = current?;
            current = if maaned < last {
                Some(maaned.next())
            } else {
                None
            };
            Some(maaned)
        })
    }

    /// The sub-period starting at `fra` (clamped to this period's start).
    ///
    /// Returns `None` when `fra` is after the period's last month.
    pub fn fra(&self, fra: Maaned) -> Option<Periode> {
        if fra > self.til_og_med {
            return None;
        }
        Some(Periode {
            fra_og_med: fra.max(self.fra_og_med),
            til_og_med: self.til_og_med,
        })
    }
}

impl std::fmt::Display for Periode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}..={}", self.fra_og_med, self.til_og_med)
    }
}
