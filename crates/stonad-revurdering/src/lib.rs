//! # stonad-revurdering — Reassessment Lifecycle Engine
//!
//! The core of the stønad workspace: adjudicates reassessment
//! (revurdering) cases for a running benefit, from creation through
//! calculation, payment simulation, maker-checker attestation, and
//! execution.
//!
//! The aggregate is [`Revurdering`] ([`revurdering`]), an enum over the
//! lifecycle states whose transition operations consume the case by value
//! and return the successor or a typed error. The transitions are gated by
//! four decision components:
//!
//! - **Opphør** ([`opphor`]): does the recalculation terminate the
//!   benefit, why, and from which month.
//! - **Utfall** ([`utfall`]): is the termination a shape the payment
//!   system can process automatically, or must a caseworker take over.
//! - **Opphørsperiode** ([`opphorsperiode`]): which months must the
//!   payment system actually stop or reverse.
//! - **Avkorting** ([`avkorting`]): does the revision create, annul, or
//!   conflict with a clawback warning for the over-payment it leaves.
//!
//! [`attestering`] holds the append-only maker-checker ledger, and
//! [`error`] the per-operation error taxonomy.
//!
//! ## Crate Policy
//!
//! - Pure and synchronous: no I/O, no retries, no shared mutable state.
//!   External effects live behind the `Beregner`, `Utbetalingssimulator`,
//!   and `Clock` seams.
//! - Every business-rule failure is a returned error; only the
//!   payment-stop resolution invariants abort.
//! - All case states serialize; persistence belongs to the caller.

pub mod attestering;
pub mod avkorting;
pub mod error;
pub mod opphor;
pub mod opphorsperiode;
pub mod utfall;

pub mod revurdering;

// Re-export primary types for ergonomic imports.
pub use attestering::{Attestering, Attesteringshistorikk, Underkjennelsesgrunn};
pub use avkorting::{
    vurder_avkorting, AvkortingKonflikt, AvkortingVedRevurdering, Avkortingsvarsel,
    Tilbakekrevingsbehov, UtestaaendeAvkorting,
};
pub use error::{
    AttesterError, AvsluttError, BeregnError, OppdaterGrunnlagError, SimulerError,
    TilAttesteringError, UgyldigTilstandsovergang, VelgBrevvalgError,
};
pub use opphor::{vurder_opphor, Opphor, OpphorVedRevurdering, Opphorsgrunn};
pub use revurdering::{
    Aarsak, Attesteringsbeslutning, Brevvalg, InnvilgetUtfall, NyRevurdering, OpphortUtfall,
    Revurdering, RevurderingState, Revurderingsaarsak, Revurderingsinfo,
};
pub use utfall::UtfallSomIkkeStottes;
