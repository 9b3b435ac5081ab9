//! # Operation Errors
//!
//! One error enum per transition operation. Every business-rule failure is
//! returned as a typed value; the only fatal paths in the crate are the
//! payment-stop resolution invariants (see [`crate::opphorsperiode`]).
//!
//! An illegal transition carries both state discriminants so a caller can
//! report exactly which move was refused.

use std::collections::BTreeSet;

use thiserror::Error;

use stonad_beregning::{BeregningFeilet, SimuleringFeilet};
use stonad_vilkar::Inngangsvilkar;

use crate::avkorting::AvkortingKonflikt;
use crate::revurdering::RevurderingState;
use crate::utfall::UtfallSomIkkeStottes;

/// The requested operation is not legal from the case's current state.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
#[error("illegal transition: {fra} -> {til}")]
pub struct UgyldigTilstandsovergang {
    /// The case's current state.
    pub fra: RevurderingState,
    /// The state the operation would have produced.
    pub til: RevurderingState,
}

/// Failures of `oppdater_grunnlag`.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum OppdaterGrunnlagError {
    /// The case is not open for grounds updates.
    #[error(transparent)]
    UgyldigTilstand(#[from] UgyldigTilstandsovergang),
}

/// Failures of `beregn`.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BeregnError {
    /// The case is not open for calculation.
    #[error(transparent)]
    UgyldigTilstand(#[from] UgyldigTilstandsovergang),

    /// At least one criterion assessment is unconcluded; the case cannot
    /// be calculated before every criterion is resolved.
    #[error("cannot calculate while criteria are unconcluded: {vilkar:?}")]
    VilkarsvurderingUavklart {
        /// The unconcluded criteria.
        vilkar: Vec<Inngangsvilkar>,
    },

    /// The termination would orphan planned clawback instalments in the
    /// calculation; the clawback must be handled before the benefit can
    /// terminate.
    #[error("termination would orphan planned clawback instalments")]
    OpphorAvYtelseSomSkalAvkortes,

    /// The calculation collaborator failed; retry later.
    #[error(transparent)]
    Beregningsfeil(#[from] BeregningFeilet),
}

/// Failures of `simuler`.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SimulerError {
    /// Only a calculated case can be simulated.
    #[error(transparent)]
    UgyldigTilstand(#[from] UgyldigTilstandsovergang),

    /// The over-payment requires manual recovery while a clawback warning
    /// is outstanding.
    #[error(transparent)]
    AvkortingKonflikt(#[from] AvkortingKonflikt),

    /// The payment simulator failed; retry later.
    #[error(transparent)]
    Simuleringsfeil(#[from] SimuleringFeilet),
}

/// Failures of `velg_brevvalg`.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum VelgBrevvalgError {
    /// The letter choice is made on a simulated case.
    #[error(transparent)]
    UgyldigTilstand(#[from] UgyldigTilstandsovergang),

    /// "Not chosen" is the initial marker, not a choice.
    #[error("a committed letter choice is required")]
    IkkeEtValg,
}

/// Failures of `til_attestering`.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TilAttesteringError {
    /// Only a simulated case can go to attestation.
    #[error(transparent)]
    UgyldigTilstand(#[from] UgyldigTilstandsovergang),

    /// The termination outcome cannot be processed automatically; every
    /// blocking flag is included.
    #[error("outcome is not supported for automatic processing: {utfall:?}")]
    UtfallStottesIkke {
        /// The full set of blocking flags.
        utfall: BTreeSet<UtfallSomIkkeStottes>,
    },

    /// No letter choice has been committed for the case.
    #[error("a letter choice must be committed before attestation")]
    BrevvalgMangler,
}

/// Failures of `attester`.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AttesterError {
    /// The case is not pending attestation.
    #[error(transparent)]
    UgyldigTilstand(#[from] UgyldigTilstandsovergang),

    /// The attestant prepared the case themselves.
    #[error("attestant and caseworker must be different people")]
    AttestantOgSaksbehandlerErSammePerson,
}

/// Failures of `avslutt`.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AvsluttError {
    /// An executed decision cannot be abandoned.
    #[error("an executed case cannot be abandoned")]
    ErIverksatt,

    /// The case is already abandoned.
    #[error("the case is already abandoned")]
    AlleredeAvsluttet,

    /// A case pending attestation must be decided before it can be
    /// abandoned.
    #[error("a case pending attestation cannot be abandoned")]
    ErTilAttestering,

    /// Abandonment requires a justification.
    #[error("abandonment requires a justification")]
    BegrunnelseMangler,
}
