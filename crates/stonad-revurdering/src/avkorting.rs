//! # Clawback (Avkorting)
//!
//! When a termination leaves an over-payment behind, the preferred remedy
//! is avkorting: the overpaid amount is collected by shortening future
//! benefit months instead of invoicing the recipient. Avkorting is only
//! lawful for terminations caused solely by unauthorized residence abroad;
//! every other over-payment goes to manual recovery (tilbakekreving).
//!
//! A case holds at most one active clawback warning. A new warning annuls
//! the prior one, and a revision whose outcome no longer supports the
//! outstanding warning annuls it without a replacement. An over-payment
//! that must be recovered manually while a warning is outstanding cannot
//! be reconciled automatically and fails the transition.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use stonad_beregning::Simulering;
use stonad_core::{AvkortingsvarselId, Periode};

use crate::opphor::Opphor;
use crate::opphorsperiode;

/// A raised clawback warning: the months the clawback will shorten and
/// the total amount to collect.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Avkortingsvarsel {
    /// Warning identity.
    pub id: AvkortingsvarselId,
    /// Months the clawback instalments apply to.
    pub periode: Periode,
    /// Total overpaid amount to collect, in whole kroner.
    pub belop: i64,
}

impl Avkortingsvarsel {
    /// Raise a new warning.
    pub fn ny(periode: Periode, belop: i64) -> Self {
        Self {
            id: AvkortingsvarselId::new(),
            periode,
            belop,
        }
    }
}

/// The case's outstanding clawback obligation going into a revision.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum UtestaaendeAvkorting {
    /// No outstanding warning.
    Ingen,
    /// An active warning from a prior revision.
    Utestaaende(Avkortingsvarsel),
}

impl UtestaaendeAvkorting {
    /// The outstanding warning, if any.
    pub fn varsel(&self) -> Option<&Avkortingsvarsel> {
        match self {
            Self::Ingen => None,
            Self::Utestaaende(varsel) => Some(varsel),
        }
    }
}

/// What the revision does to the case's clawback state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum AvkortingVedRevurdering {
    /// Nothing outstanding and nothing raised.
    IngenUtestaaende,
    /// The outstanding warning no longer matches the outcome and is
    /// annulled without replacement.
    AnnullerUtestaaende {
        /// The warning being annulled.
        annullert: Avkortingsvarsel,
    },
    /// A new warning is raised; any prior warning is annulled with it.
    OpprettNyttVarsel {
        /// The newly raised warning.
        varsel: Avkortingsvarsel,
        /// Prior warning annulled in the same revision, if one existed.
        annullert: Option<Avkortingsvarsel>,
    },
}

impl AvkortingVedRevurdering {
    /// Whether the case has an active warning after this revision.
    pub fn har_utestaaende(&self) -> bool {
        matches!(self, Self::OpprettNyttVarsel { .. })
    }
}

/// Whether a manual recovery decision is pending after the revision.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Tilbakekrevingsbehov {
    /// No over-payment to recover manually.
    IkkeBehov,
    /// The over-payment is not covered by a clawback warning; a caseworker
    /// must decide on manual recovery.
    TrengerAvgjorelse,
}

/// The over-payment requires manual recovery while a clawback warning is
/// outstanding; the two cannot be reconciled in one revision.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("outstanding clawback warning {utestaaende} conflicts with manual recovery")]
pub struct AvkortingKonflikt {
    /// The conflicting outstanding warning.
    pub utestaaende: AvkortingsvarselId,
}

/// Apply the clawback transition table to one simulated revision outcome.
///
/// `opphor` is `None` for an approved (non-terminating) outcome.
///
/// # Panics
///
/// Panics when a warning period cannot be resolved inside
/// `revurderingsperiode` (see [`opphorsperiode::utled`]).
pub fn vurder_avkorting(
    utestaaende: &UtestaaendeAvkorting,
    opphor: Option<&Opphor>,
    simulering: &Simulering,
    revurderingsperiode: Periode,
) -> Result<AvkortingVedRevurdering, AvkortingKonflikt> {
    if simulering.har_feilutbetaling() {
        match opphor {
            Some(opphor) if opphor.kan_avkortes() => {
                let periode =
                    opphorsperiode::utled(opphor.fra_og_med(), revurderingsperiode, simulering, true);
                let varsel = Avkortingsvarsel::ny(periode, simulering.total_feilutbetaling());
                let annullert = utestaaende.varsel().cloned();
                if let Some(forrige) = &annullert {
                    tracing::debug!(
                        annullert = %forrige.id,
                        nytt = %varsel.id,
                        "prior clawback warning annulled by replacement"
                    );
                }
                Ok(AvkortingVedRevurdering::OpprettNyttVarsel { varsel, annullert })
            }
            _ => match utestaaende.varsel() {
                Some(varsel) => {
                    tracing::warn!(
                        utestaaende = %varsel.id,
                        "manual recovery conflicts with outstanding clawback warning"
                    );
                    Err(AvkortingKonflikt {
                        utestaaende: varsel.id,
                    })
                }
                None => Ok(AvkortingVedRevurdering::IngenUtestaaende),
            },
        }
    } else {
        match utestaaende.varsel() {
            Some(varsel) => {
                tracing::debug!(annullert = %varsel.id, "stale clawback warning annulled");
                Ok(AvkortingVedRevurdering::AnnullerUtestaaende {
                    annullert: varsel.clone(),
                })
            }
            None => Ok(AvkortingVedRevurdering::IngenUtestaaende),
        }
    }
}
