//! # Unsupported-Outcome Detection
//!
//! Some termination shapes cannot be paid out safely by the downstream
//! payment system and must be handled by a caseworker instead of flowing
//! through attestation. This module inspects a termination verdict together
//! with the month-by-month deltas against the currently paid amounts and
//! returns the full set of blocking flags.
//!
//! The flags are a validation gate, recomputed per recalculation; they are
//! never stored on the case.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use stonad_beregning::beregning::Maanedsberegning;
use stonad_beregning::Beregning;
use stonad_core::Periode;
use stonad_vilkar::Fradragstype;

use crate::opphor::{Opphor, Opphorsgrunn};

/// A termination shape the system cannot process automatically.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum UtfallSomIkkeStottes {
    /// The reason set names more than one failing criterion.
    OpphorAvFlereVilkar,
    /// The termination takes effect later than the period's first month.
    OpphorErIkkeFraForsteMaaned,
    /// Only some months of the period meet the termination condition.
    DelvisOpphor,
    /// Months outside the termination also change amount.
    OpphorOgAndreEndringerIKombinasjon,
}

impl UtfallSomIkkeStottes {
    /// The canonical string identifier for logging.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::OpphorAvFlereVilkar => "opphor_av_flere_vilkar",
            Self::OpphorErIkkeFraForsteMaaned => "opphor_er_ikke_fra_forste_maaned",
            Self::DelvisOpphor => "delvis_opphor",
            Self::OpphorOgAndreEndringerIKombinasjon => "opphor_og_andre_endringer_i_kombinasjon",
        }
    }
}

impl std::fmt::Display for UtfallSomIkkeStottes {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Identify every reason the termination cannot go to attestation.
///
/// `beregning` is the new calculation, `gjeldende` the calculation behind
/// the decision being reassessed. An empty set means the termination is
/// safe to process.
pub fn identifiser(
    opphor: &Opphor,
    revurderingsperiode: Periode,
    beregning: &Beregning,
    gjeldende: &Beregning,
) -> BTreeSet<UtfallSomIkkeStottes> {
    let mut utfall = BTreeSet::new();

    if opphor.grunner().len() > 1 {
        utfall.insert(UtfallSomIkkeStottes::OpphorAvFlereVilkar);
    }

    if opphor.fra_og_med() > revurderingsperiode.fra_og_med() {
        utfall.insert(UtfallSomIkkeStottes::OpphorErIkkeFraForsteMaaned);
    }

    if !opphor.skyldes_vilkar() && !er_fullstendig_opphor(opphor, beregning) {
        utfall.insert(UtfallSomIkkeStottes::DelvisOpphor);
    }

    if har_andre_endringer(opphor, beregning, gjeldende) {
        utfall.insert(UtfallSomIkkeStottes::OpphorOgAndreEndringerIKombinasjon);
    }

    if !utfall.is_empty() {
        tracing::debug!(
            opphorsmaaned = %opphor.fra_og_med(),
            antall = utfall.len(),
            "termination outcome is not supported for automatic processing"
        );
    }

    utfall
}

/// Whether every month of the calculation meets the verdict's amount
/// condition. Criterion-driven verdicts are "complete" when every month
/// stops paying entirely.
fn er_fullstendig_opphor(opphor: &Opphor, beregning: &Beregning) -> bool {
    if opphor.er_kun(Opphorsgrunn::UnderMinstegrense) {
        beregning.alle_maaneder_under_minstegrense()
    } else if opphor.er_kun(Opphorsgrunn::ForHoyInntekt) {
        beregning.alle_maaneder_er_null()
    } else {
        beregning.alle_maaneder_er_null() || beregning.alle_maaneder_under_minstegrense()
    }
}

/// Whether any month outside the terminated class changes amount versus
/// the prior calculation.
///
/// For criterion-driven verdicts the terminated class is every month from
/// the effective month onward. For amount-driven verdicts it is the months
/// meeting the verdict's condition, and a change explained solely by
/// expected-income deduction rows is part of the termination, not an
/// unrelated change.
fn har_andre_endringer(opphor: &Opphor, beregning: &Beregning, gjeldende: &Beregning) -> bool {
    // `endringer_fra` emits one delta per month of the new calculation, in
    // the same order as its rows.
    beregning
        .maaneder()
        .iter()
        .zip(beregning.endringer_fra(gjeldende))
        .filter(|(ny, _)| !i_opphorsklasse(opphor, ny))
        .any(|(ny, endring)| {
            endring.er_endret()
                && !(!opphor.skyldes_vilkar()
                    && kun_forventet_inntekt_endret(ny, gjeldende.maaned(ny.maaned)))
        })
}

fn i_opphorsklasse(opphor: &Opphor, maaned: &Maanedsberegning) -> bool {
    if opphor.skyldes_vilkar() {
        maaned.maaned >= opphor.fra_og_med()
    } else if opphor.er_kun(Opphorsgrunn::UnderMinstegrense) {
        maaned.er_under_minstegrense()
    } else {
        maaned.er_null()
    }
}

/// Whether the month's deduction rows differ from the prior month's rows
/// only in expected-income entries.
fn kun_forventet_inntekt_endret(
    ny: &Maanedsberegning,
    tidligere: Option<&Maanedsberegning>,
) -> bool {
    let Some(tidligere) = tidligere else {
        return false;
    };
    let uten_forventet = |m: &Maanedsberegning| {
        m.fradrag
            .iter()
            .filter(|f| f.fradragstype != Fradragstype::ForventetInntekt)
            .cloned()
            .collect::<Vec<_>>()
    };
    uten_forventet(ny) == uten_forventet(tidligere)
}
