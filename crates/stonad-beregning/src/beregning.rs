//! # Calculation Result (Beregning)
//!
//! The external calculation collaborator turns grounds + period into one
//! amount per month. The engine never recomputes amounts; it only inspects
//! them: is a month's total zero, is it below the legal floor, and how does
//! it differ from what the prior decision paid.
//!
//! Amounts are whole kroner as `i64`. The legal floor (a share of the high
//! rate) varies per month and is supplied by the collaborator alongside the
//! amount, so the engine needs no rate tables of its own.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use stonad_core::{Maaned, Periode};
use stonad_vilkar::{Fradrag, Fradragstype};

/// One month of a calculation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Maanedsberegning {
    /// The month this row covers.
    pub maaned: Maaned,
    /// Total benefit amount for the month, in whole kroner.
    pub belop: i64,
    /// The legal floor for the month: a computed amount that is non-zero
    /// but below this floor terminates the benefit rather than paying out.
    pub minstegrense: i64,
    /// Deduction rows applied in this month.
    pub fradrag: Vec<Fradrag>,
}

impl Maanedsberegning {
    /// Non-zero but below the legal floor.
    pub fn er_under_minstegrense(&self) -> bool {
        self.belop > 0 && self.belop < self.minstegrense
    }

    /// Exactly zero.
    pub fn er_null(&self) -> bool {
        self.belop == 0
    }

    /// Sum of deduction amounts of the given type in this month.
    pub fn fradrag_av_type(&self, fradragstype: Fradragstype) -> i64 {
        self.fradrag
            .iter()
            .filter(|f| f.fradragstype == fradragstype)
            .map(|f| f.maanedsbelop)
            .sum()
    }
}

/// The calculation rows did not cover the period month for month.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("calculation does not cover {periode} month for month")]
pub struct UgyldigBeregning {
    /// The period the calculation was requested for.
    pub periode: Periode,
}

/// A month-by-month amount delta between two calculations.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Belopsendring {
    /// The month the delta applies to.
    pub maaned: Maaned,
    /// Amount in the prior calculation; `None` when the prior calculation
    /// did not cover the month.
    pub tidligere_belop: Option<i64>,
    /// Amount in the new calculation.
    pub nytt_belop: i64,
}

impl Belopsendring {
    /// Whether the amount actually changed.
    pub fn er_endret(&self) -> bool {
        self.tidligere_belop != Some(self.nytt_belop)
    }
}

/// A full calculation over a reassessment period.
///
/// Invariant: exactly one row per month of the period, in chronological
/// order. Enforced at construction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Beregning {
    periode: Periode,
    maaneder: Vec<Maanedsberegning>,
}

impl Beregning {
    /// Create a calculation, verifying month-for-month coverage of the
    /// period.
    ///
    /// # Errors
    ///
    /// Returns [`UgyldigBeregning`] when the rows do not match the period's
    /// months exactly, in order.
    pub fn new(periode: Periode, maaneder: Vec<Maanedsberegning>) -> Result<Self, UgyldigBeregning> {
        let expected: Vec<Maaned> = periode.maaneder().collect();
        let actual: Vec<Maaned> = maaneder.iter().map(|m| m.maaned).collect();
        if expected != actual {
            return Err(UgyldigBeregning { periode });
        }
        Ok(Self { periode, maaneder })
    }

    /// The period this calculation covers.
    pub fn periode(&self) -> Periode {
        self.periode
    }

    /// The monthly rows, chronologically.
    pub fn maaneder(&self) -> &[Maanedsberegning] {
        &self.maaneder
    }

    /// The row for a specific month, if covered.
    pub fn maaned(&self, maaned: Maaned) -> Option<&Maanedsberegning> {
        self.maaneder.iter().find(|m| m.maaned == maaned)
    }

    /// Whether every month is non-zero but below the legal floor.
    pub fn alle_maaneder_under_minstegrense(&self) -> bool {
        self.maaneder.iter().all(Maanedsberegning::er_under_minstegrense)
    }

    /// Whether every month computes to exactly zero.
    pub fn alle_maaneder_er_null(&self) -> bool {
        self.maaneder.iter().all(Maanedsberegning::er_null)
    }

    /// Whether any month carries a deduction row of the given type.
    pub fn har_fradrag_av_type(&self, fradragstype: Fradragstype) -> bool {
        self.maaneder
            .iter()
            .any(|m| m.fradrag.iter().any(|f| f.fradragstype == fradragstype))
    }

    /// Month-by-month deltas of this calculation versus a prior one.
    ///
    /// Months of `self` not covered by the prior calculation yield
    /// `tidligere_belop: None`.
    pub fn endringer_fra(&self, tidligere: &Beregning) -> Vec<Belopsendring> {
        self.maaneder
            .iter()
            .map(|m| Belopsendring {
                maaned: m.maaned,
                tidligere_belop: tidligere.maaned(m.maaned).map(|t| t.belop),
                nytt_belop: m.belop,
            })
            .collect()
    }
}
