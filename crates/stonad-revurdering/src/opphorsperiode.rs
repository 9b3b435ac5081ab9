//! # Termination Period for Payment
//!
//! A termination verdict says when the benefit legally stops; the payment
//! system needs to know which months to actually stop or reverse. The two
//! differ when months have already been disbursed: overpaid months that the
//! clawback mechanism will collect are left alone, and payment only stops
//! from the first month not yet disbursed.
//!
//! A resolved month outside the reassessment period means the prior
//! decision or the simulator handed us inconsistent data. That is a defect,
//! not a business outcome, and resolution aborts loudly instead of
//! coercing the date.

use stonad_beregning::Simulering;
use stonad_core::{Maaned, Periode};

/// The period over which a termination is simulated and payment is
/// stopped when no clawback is involved: the effective month (clamped to
/// the period start, eligibility failures may predate the period) through
/// the period's end.
///
/// # Panics
///
/// Panics when the effective month is after the reassessment period; a
/// verdict cannot terminate months the case does not cover.
pub fn stansperiode(opphorsmaaned: Maaned, revurderingsperiode: Periode) -> Periode {
    revurderingsperiode
        .fra(opphorsmaaned.max(revurderingsperiode.fra_og_med()))
        .unwrap_or_else(|| {
            panic!(
                "termination month {opphorsmaaned} is after the reassessment period \
                 {revurderingsperiode}"
            )
        })
}

/// Resolve the period for which payment instructions must be suppressed.
///
/// Without an over-payment, and for over-payments routed to manual
/// recovery, payment stops from the verdict's effective month. When the
/// over-payment is collected through the clawback mechanism instead
/// (`avkortes`), already-disbursed months are left to the clawback and
/// payment stops from the first month, at or after the ledger's last
/// reconciled month, that has not yet been disbursed.
///
/// # Panics
///
/// Panics when the resolved month falls outside the reassessment period
/// or no undisbursed month exists; both indicate inconsistent upstream
/// data.
pub fn utled(
    opphorsmaaned: Maaned,
    revurderingsperiode: Periode,
    simulering: &Simulering,
    avkortes: bool,
) -> Periode {
    if !avkortes || !simulering.har_feilutbetaling() {
        return stansperiode(opphorsmaaned, revurderingsperiode);
    }

    let anker = simulering
        .siste_avstemte_maaned
        .unwrap_or_else(|| simulering.periode.fra_og_med());
    let fra = simulering
        .forste_ikke_utbetalte_maaned(anker)
        .unwrap_or_else(|| {
            panic!(
                "no undisbursed month at or after {anker} in the simulated period \
                 {}",
                simulering.periode
            )
        });
    if !revurderingsperiode.inneholder(fra) {
        panic!(
            "resolved payment-stop month {fra} is outside the reassessment period \
             {revurderingsperiode}"
        );
    }
    revurderingsperiode
        .fra(fra)
        .unwrap_or_else(|| unreachable!("{fra} is inside {revurderingsperiode}"))
}
