//! # Payment Simulation (Simulering)
//!
//! Before a case goes to attestation, the proposed outcome is simulated
//! against the payment ledger. The simulation answers two questions the
//! engine cannot answer alone: which months have already been paid out, and
//! does the new outcome leave an over-payment (feilutbetaling) behind.
//!
//! The simulator also reports the ledger's last reconciled month; clawback
//! coverage starts no earlier than that.

use serde::{Deserialize, Serialize};

use stonad_core::{Maaned, Periode};

/// One month of a payment simulation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SimulertMaaned {
    /// The simulated month.
    pub maaned: Maaned,
    /// Amount already paid out for the month under the prior decision.
    pub tidligere_utbetalt: i64,
    /// Amount the new outcome would pay for the month.
    pub nytt_belop: i64,
    /// Whether the ledger has already disbursed the month.
    pub er_utbetalt: bool,
}

impl SimulertMaaned {
    /// Over-paid amount for the month: what was disbursed beyond what the
    /// new outcome allows. Zero for months not yet disbursed.
    pub fn feilutbetaling(&self) -> i64 {
        if self.er_utbetalt {
            (self.tidligere_utbetalt - self.nytt_belop).max(0)
        } else {
            0
        }
    }
}

/// The simulator's view of a proposed outcome against the payment ledger.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Simulering {
    /// The simulated period.
    pub periode: Periode,
    /// Per-month simulation rows, chronologically.
    pub maaneder: Vec<SimulertMaaned>,
    /// The ledger's last reconciled month, if any reconciliation has run.
    pub siste_avstemte_maaned: Option<Maaned>,
}

impl Simulering {
    /// Whether the simulation shows any over-payment.
    pub fn har_feilutbetaling(&self) -> bool {
        self.total_feilutbetaling() > 0
    }

    /// Total over-paid amount across the simulated period.
    pub fn total_feilutbetaling(&self) -> i64 {
        self.maaneder.iter().map(SimulertMaaned::feilutbetaling).sum()
    }

    /// The first month at or after `fra` that the ledger has not yet
    /// disbursed.
    pub fn forste_ikke_utbetalte_maaned(&self, fra: Maaned) -> Option<Maaned> {
        self.maaneder
            .iter()
            .filter(|m| m.maaned >= fra && !m.er_utbetalt)
            .map(|m| m.maaned)
            .min()
    }
}
