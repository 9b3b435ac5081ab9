//! # Termination Verdict (Opphør)
//!
//! Combines the criterion assessment and the new calculation into a single
//! termination verdict. The eligibility outcome is evaluated first and
//! short-circuits the amount scan: a failing criterion always terminates,
//! and criterion reasons are never mixed with amount reasons in one
//! verdict.
//!
//! The amount scan anchors on the current month from the injected clock:
//! a below-floor or zero month in the past does not by itself terminate a
//! benefit forward from today. The one exception is a calculation where
//! *every* month fails, which backdates the verdict to the start of the
//! whole period.

use std::collections::BTreeSet;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use stonad_beregning::Beregning;
use stonad_core::Maaned;
use stonad_vilkar::{Inngangsvilkar, Vilkarsvurderinger, Vilkarsvurderingsresultat};

/// Why the benefit terminates.
///
/// Criterion reasons mirror [`Inngangsvilkar`]; the two amount reasons come
/// from the calculation scan. `Ord` gives verdict reason sets a canonical
/// order independent of assessment order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Opphorsgrunn {
    /// The uførhet criterion failed.
    Uforhet,
    /// The formue criterion failed.
    Formue,
    /// Unauthorized residence abroad.
    Utenlandsopphold,
    /// The lawful-residence criterion failed.
    LovligOpphold,
    /// The institutional-care criterion failed.
    Institusjonsopphold,
    /// The duty-of-disclosure criterion failed.
    Opplysningsplikt,
    /// The personal-attendance criterion failed.
    PersonligOppmote,
    /// The computed amount is non-zero but below the legal floor.
    UnderMinstegrense,
    /// The computed amount is exactly zero.
    ForHoyInntekt,
}

impl Opphorsgrunn {
    /// The termination reason for a failing criterion.
    pub fn fra_vilkar(vilkar: Inngangsvilkar) -> Self {
        match vilkar {
            Inngangsvilkar::Uforhet => Self::Uforhet,
            Inngangsvilkar::Formue => Self::Formue,
            Inngangsvilkar::Utenlandsopphold => Self::Utenlandsopphold,
            Inngangsvilkar::LovligOpphold => Self::LovligOpphold,
            Inngangsvilkar::Institusjonsopphold => Self::Institusjonsopphold,
            Inngangsvilkar::Opplysningsplikt => Self::Opplysningsplikt,
            Inngangsvilkar::PersonligOppmote => Self::PersonligOppmote,
        }
    }

    /// Whether this reason comes from a failing entry criterion, as
    /// opposed to the calculation scan.
    pub fn skyldes_vilkar(&self) -> bool {
        !matches!(self, Self::UnderMinstegrense | Self::ForHoyInntekt)
    }

    /// The canonical string identifier for serialization and logging.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Uforhet => "uforhet",
            Self::Formue => "formue",
            Self::Utenlandsopphold => "utenlandsopphold",
            Self::LovligOpphold => "lovlig_opphold",
            Self::Institusjonsopphold => "institusjonsopphold",
            Self::Opplysningsplikt => "opplysningsplikt",
            Self::PersonligOppmote => "personlig_oppmote",
            Self::UnderMinstegrense => "under_minstegrense",
            Self::ForHoyInntekt => "for_hoy_inntekt",
        }
    }
}

impl std::fmt::Display for Opphorsgrunn {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A termination: the deduplicated reason set and the first month the
/// termination takes effect.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Opphor {
    grunner: BTreeSet<Opphorsgrunn>,
    fra_og_med: Maaned,
}

impl Opphor {
    fn ny(grunner: impl IntoIterator<Item = Opphorsgrunn>, fra_og_med: Maaned) -> Self {
        Self {
            grunner: grunner.into_iter().collect(),
            fra_og_med,
        }
    }

    /// The termination reasons, in canonical order.
    pub fn grunner(&self) -> &BTreeSet<Opphorsgrunn> {
        &self.grunner
    }

    /// First month the termination applies.
    pub fn fra_og_med(&self) -> Maaned {
        self.fra_og_med
    }

    /// The termination's effective date (first day of the effective month).
    pub fn opphorsdato(&self) -> NaiveDate {
        self.fra_og_med.first_day()
    }

    /// Whether the reason set is exactly the given single reason.
    pub fn er_kun(&self, grunn: Opphorsgrunn) -> bool {
        self.grunner.len() == 1 && self.grunner.contains(&grunn)
    }

    /// Whether the termination is driven by failing entry criteria rather
    /// than the calculation. A verdict never mixes the two classes.
    pub fn skyldes_vilkar(&self) -> bool {
        self.grunner.iter().any(Opphorsgrunn::skyldes_vilkar)
    }

    /// Whether the over-payment left behind by this termination may be
    /// collected through the clawback mechanism. Only terminations caused
    /// solely by unauthorized residence abroad qualify.
    pub fn kan_avkortes(&self) -> bool {
        self.er_kun(Opphorsgrunn::Utenlandsopphold)
    }
}

/// The outcome of the termination check for one recalculation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum OpphorVedRevurdering {
    /// The benefit continues (possibly with changed amounts).
    Nei,
    /// The benefit terminates.
    Ja(Opphor),
}

impl OpphorVedRevurdering {
    /// Whether the verdict is a termination.
    pub fn er_opphor(&self) -> bool {
        matches!(self, Self::Ja(_))
    }

    /// The termination payload, when the verdict is a termination.
    pub fn opphor(&self) -> Option<&Opphor> {
        match self {
            Self::Nei => None,
            Self::Ja(opphor) => Some(opphor),
        }
    }
}

/// Decide whether the recalculation terminates the benefit.
///
/// Criterion failures are checked first: any failing criterion yields a
/// termination whose reasons are the mapped failing criteria and whose
/// effective month is the earliest month any of them applies, regardless
/// of the calculated amounts. With every criterion met, the calculation is
/// scanned: if every month is below the floor or zero, the termination is
/// backdated to the period start; otherwise the first below-floor month at
/// or after `naavaerende_maaned` wins, then the first zero month.
///
/// Unclear assessments never reach this function in the lifecycle
/// (calculation is refused while any criterion is unconcluded); an unclear
/// set conservatively yields no termination here.
pub fn vurder_opphor(
    vilkarsvurderinger: &Vilkarsvurderinger,
    beregning: &Beregning,
    naavaerende_maaned: Maaned,
) -> OpphorVedRevurdering {
    match vilkarsvurderinger.resultat() {
        Vilkarsvurderingsresultat::Avslag { vilkar } => {
            let grunner = vilkar
                .iter()
                .map(|(v, _)| Opphorsgrunn::fra_vilkar(*v));
            let fra_og_med = vilkar
                .iter()
                .map(|(_, gjelder_fra)| *gjelder_fra)
                .min()
                .unwrap_or_else(|| unreachable!("rejection carries at least one criterion"));
            OpphorVedRevurdering::Ja(Opphor::ny(grunner, fra_og_med))
        }
        Vilkarsvurderingsresultat::Uavklart { .. } => OpphorVedRevurdering::Nei,
        Vilkarsvurderingsresultat::Innvilget => vurder_beregning(beregning, naavaerende_maaned),
    }
}

fn vurder_beregning(beregning: &Beregning, naavaerende_maaned: Maaned) -> OpphorVedRevurdering {
    let periode = beregning.periode();

    // Every month failing the amount condition, past months included,
    // backdates the termination to the period start. The classes may mix;
    // a below-floor month anywhere picks the below-floor reason.
    if beregning
        .maaneder()
        .iter()
        .all(|m| m.er_under_minstegrense() || m.er_null())
    {
        let grunn = if beregning
            .maaneder()
            .iter()
            .any(|m| m.er_under_minstegrense())
        {
            Opphorsgrunn::UnderMinstegrense
        } else {
            Opphorsgrunn::ForHoyInntekt
        };
        return OpphorVedRevurdering::Ja(Opphor::ny([grunn], periode.fra_og_med()));
    }

    let fremtidige = beregning
        .maaneder()
        .iter()
        .filter(|m| m.maaned >= naavaerende_maaned);
    if let Some(under) = fremtidige.clone().find(|m| m.er_under_minstegrense()) {
        return OpphorVedRevurdering::Ja(Opphor::ny(
            [Opphorsgrunn::UnderMinstegrense],
            under.maaned,
        ));
    }
    if let Some(null) = fremtidige.clone().find(|m| m.er_null()) {
        return OpphorVedRevurdering::Ja(Opphor::ny([Opphorsgrunn::ForHoyInntekt], null.maaned));
    }

    OpphorVedRevurdering::Nei
}
