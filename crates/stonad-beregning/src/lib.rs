//! # stonad-beregning — Calculation & Simulation Model
//!
//! Result types produced by the two external collaborators the engine
//! depends on, plus the collaborator contracts themselves:
//!
//! - **Beregning** ([`beregning`]): per-month computed benefit amounts with
//!   the month's legal floor, and delta computation against the calculation
//!   behind the decision being reassessed.
//!
//! - **Simulering** ([`simulering`]): the payment simulator's view of what
//!   has already been paid versus what the new calculation says, including
//!   the over-payment signal the clawback machinery keys off.
//!
//! - **Eksterne** ([`eksterne`]): the [`Beregner`] and
//!   [`Utbetalingssimulator`] traits. The engine is generic over them and
//!   performs no retries — an unavailable collaborator surfaces as a typed
//!   "retry later" error.

pub mod beregning;
pub mod eksterne;
pub mod simulering;

// Re-export primary types for ergonomic imports.
pub use beregning::{Belopsendring, Beregning, Maanedsberegning, UgyldigBeregning};
pub use eksterne::{Beregner, BeregningFeilet, SimuleringFeilet, Utbetalingssimulator};
pub use simulering::{SimulertMaaned, Simulering};
