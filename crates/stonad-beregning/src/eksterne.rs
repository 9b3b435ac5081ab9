//! Collaborator seams for the calculation and payment systems.
//!
//! The lifecycle engine never computes amounts or talks to the payment
//! ledger itself; it drives these traits. Production wires them to the
//! benefit calculation service and the payment system's simulation
//! endpoint, tests substitute fixed fixtures.

use thiserror::Error;

use stonad_core::Periode;
use stonad_vilkar::Grunnlag;

use crate::beregning::Beregning;
use crate::simulering::Simulering;

/// Calculation failures surfaced to the caller.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BeregningFeilet {
    /// A rate or floor table needed for the period is not yet published.
    #[error("rate tables for {periode} are not yet available")]
    SatserIkkeTilgjengelige { periode: Periode },
    /// The calculation service could not be reached; retry later.
    #[error("calculation service unavailable: {0}")]
    TjenesteUtilgjengelig(String),
}

/// Computes a per-month benefit calculation from a basis.
pub trait Beregner {
    fn beregn(&self, grunnlag: &Grunnlag, periode: Periode) -> Result<Beregning, BeregningFeilet>;
}

/// Simulation failures surfaced to the caller.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SimuleringFeilet {
    /// The payment system rejected the simulation request.
    #[error("payment system rejected the simulation: {0}")]
    Avvist(String),
    /// The payment system could not be reached; retry later.
    #[error("payment system unavailable: {0}")]
    TjenesteUtilgjengelig(String),
}

/// Simulates a proposed outcome against the payment ledger.
pub trait Utbetalingssimulator {
    /// Simulates paying out `beregning` for its period.
    fn simuler(&self, beregning: &Beregning) -> Result<Simulering, SimuleringFeilet>;

    /// Simulates stopping all payment for `periode`.
    fn simuler_opphor(&self, periode: Periode) -> Result<Simulering, SimuleringFeilet>;
}
