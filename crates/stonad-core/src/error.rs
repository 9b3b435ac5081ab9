//! Shared validation errors for value-type constructors.
//!
//! All errors use `thiserror` for derive-based `Display` and `Error`
//! implementations. Constructors reject invalid input instead of clamping
//! or coercing it.

use thiserror::Error;

/// A value-type constructor rejected its input.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// A period was constructed with `til_og_med` before `fra_og_med`.
    #[error("invalid period: {fra_og_med} is after {til_og_med}")]
    PeriodeIsReversed {
        /// Requested first month (inclusive).
        fra_og_med: String,
        /// Requested last month (inclusive).
        til_og_med: String,
    },

    /// A month was constructed with a calendar month outside 1..=12.
    #[error("invalid month number: {0}")]
    InvalidMonthNumber(u32),

    /// An actor identifier was empty or whitespace-only.
    #[error("actor ident must be non-empty, got {0:?}")]
    EmptyIdent(String),
}
