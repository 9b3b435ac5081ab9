//! # stonad-core — Foundational Types for the Stønad Engine
//!
//! This crate is the leaf of the workspace DAG. It defines the value types
//! every other crate builds on:
//!
//! - **Periode** ([`periode`]): month-granular period arithmetic. The
//!   benefit is granted, recalculated, and terminated in whole months —
//!   [`Maaned`] and [`Periode`] make "half a month" unrepresentable.
//!
//! - **Identity** ([`ident`]): newtype identifiers. A [`RevurderingId`]
//!   cannot be passed where a [`VedtakId`] is expected, and the actor
//!   newtypes ([`Saksbehandler`], [`Attestant`]) keep the maker-checker
//!   guard honest at the type level.
//!
//! - **Tid** ([`tid`]): the injected [`Clock`] seam. Nothing in the engine
//!   calls `Utc::now()` directly; decisions anchored on "the current month"
//!   are deterministic under [`FixedClock`].
//!
//! - **Error** ([`error`]): [`ValidationError`] for rejected constructor
//!   inputs.
//!
//! ## Crate Policy
//!
//! - No dependencies on other `stonad-*` crates.
//! - No `panic!()` or `.unwrap()` outside tests and unreachable invariant
//!   branches.
//! - All public types derive `Debug`, `Clone`, and implement
//!   `Serialize`/`Deserialize`.

pub mod error;
pub mod ident;
pub mod periode;
pub mod tid;

// Re-export primary types for ergonomic imports.
pub use error::ValidationError;
pub use ident::{Attestant, AvkortingsvarselId, RevurderingId, Saksbehandler, VedtakId};
pub use periode::{Maaned, Periode};
pub use tid::{Clock, FixedClock, SystemClock};
