//! # Grounds (Grunnlag)
//!
//! The facts a reassessment is decided on: expected income, deduction rows
//! against the benefit, and household situation. The calculation
//! collaborator consumes these; the engine itself only stores, patches, and
//! forwards them.
//!
//! Updating grounds is a field-level patch, not a replace: fields present
//! in the patch overwrite, absent fields keep their prior value. This is
//! what lets a caseworker correct one figure on a sent-back case without
//! re-entering everything.

use serde::{Deserialize, Serialize};

use stonad_core::Periode;

/// Classification of a deduction row.
///
/// The unsupported-outcome detector treats [`ForventetInntekt`] specially:
/// expected-income changes are considered part of an income-driven
/// termination rather than an unrelated amount change. Rows of type
/// [`AvkortingUtenlandsopphold`] are planned clawback instalments; a
/// termination that would orphan them is blocked at calculation time.
///
/// [`ForventetInntekt`]: Fradragstype::ForventetInntekt
/// [`AvkortingUtenlandsopphold`]: Fradragstype::AvkortingUtenlandsopphold
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Fradragstype {
    /// Expected income reported by the recipient.
    ForventetInntekt,
    /// Actual employment income.
    Arbeidsinntekt,
    /// Capital income.
    Kapitalinntekt,
    /// Public pension payments.
    OffentligPensjon,
    /// Instalment of a raised clawback warning being collected.
    AvkortingUtenlandsopphold,
    /// Other deduction, kept for completeness of the row model.
    Annet,
}

/// A monthly deduction row applying over a sub-period of the case.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Fradrag {
    /// Classification of the row.
    pub fradragstype: Fradragstype,
    /// Deducted amount per month, in whole kroner.
    pub maanedsbelop: i64,
    /// Months the row applies to.
    pub periode: Periode,
}

/// Household situation, which selects the benefit rate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Bosituasjon {
    /// Lives alone.
    Enslig,
    /// Shares a household with an adult.
    DelerBolig,
    /// Lives with a spouse or partner receiving their own benefit.
    EktefelleMedYtelse,
}

/// The grounds a case is assessed and calculated on.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Grunnlag {
    /// Expected income per month, in whole kroner.
    pub forventet_inntekt: i64,
    /// Deduction rows.
    pub fradrag: Vec<Fradrag>,
    /// Household situation.
    pub bosituasjon: Bosituasjon,
}

impl Grunnlag {
    /// Apply a field-level patch, returning the merged grounds.
    ///
    /// Fields set in the patch overwrite; unset fields keep their prior
    /// value. The receiver is unchanged.
    pub fn patch(&self, patch: GrunnlagPatch) -> Grunnlag {
        Grunnlag {
            forventet_inntekt: patch.forventet_inntekt.unwrap_or(self.forventet_inntekt),
            fradrag: patch.fradrag.unwrap_or_else(|| self.fradrag.clone()),
            bosituasjon: patch.bosituasjon.unwrap_or(self.bosituasjon),
        }
    }
}

/// A partial update of [`Grunnlag`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GrunnlagPatch {
    /// New expected income per month, if changed.
    pub forventet_inntekt: Option<i64>,
    /// Full replacement of the deduction rows, if changed.
    pub fradrag: Option<Vec<Fradrag>>,
    /// New household situation, if changed.
    pub bosituasjon: Option<Bosituasjon>,
}

impl GrunnlagPatch {
    /// Whether the patch changes nothing.
    pub fn is_empty(&self) -> bool {
        self.forventet_inntekt.is_none() && self.fradrag.is_none() && self.bosituasjon.is_none()
    }
}
