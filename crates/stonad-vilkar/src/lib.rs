//! # stonad-vilkar — Eligibility Model
//!
//! Criteria and assessments feeding the reassessment engine:
//!
//! - **Vilkår** ([`vilkar`]): the entry criteria (inngangsvilkår), the
//!   per-criterion assessment (met / not met / unclear) with the month the
//!   assessment takes effect, and the aggregate fold to a single outcome.
//!
//! - **Grunnlag** ([`grunnlag`]): the facts a case is assessed and
//!   calculated on — expected income, deduction rows, household situation —
//!   and the field-level patch used when a caseworker updates them.

pub mod grunnlag;
pub mod vilkar;

// Re-export primary types for ergonomic imports.
pub use grunnlag::{Bosituasjon, Fradrag, Fradragstype, Grunnlag, GrunnlagPatch};
pub use vilkar::{
    Inngangsvilkar, Vilkarsvurdering, Vilkarsvurderinger, Vilkarsvurderingsresultat, Vurdering,
};
