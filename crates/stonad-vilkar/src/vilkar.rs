//! # Entry Criteria (Inngangsvilkår)
//!
//! Each benefit period rests on a set of entry criteria. An external
//! evaluator assesses every criterion for the reassessment period; the
//! engine only consumes the result. A criterion assessment is one of
//! met / not met / unclear, and a failing assessment carries the first
//! month the failure takes effect.
//!
//! One enum, exhaustive `match` everywhere: adding a criterion forces every
//! consumer — in particular the opphør reason mapping — to handle it.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use stonad_core::Maaned;

/// The entry criteria for the benefit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Inngangsvilkar {
    /// Degree of disability (uførhet).
    Uforhet,
    /// Net wealth below the statutory cap (formue).
    Formue,
    /// No unauthorized residence abroad (utenlandsopphold).
    Utenlandsopphold,
    /// Lawful residence in the country (lovlig opphold).
    LovligOpphold,
    /// Not in publicly funded institutional care (institusjonsopphold).
    Institusjonsopphold,
    /// Duty of disclosure satisfied (opplysningsplikt).
    Opplysningsplikt,
    /// Personal attendance requirement (personlig oppmøte).
    PersonligOppmote,
}

impl Inngangsvilkar {
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
        }
    }
}

impl std::fmt::Display for Inngangsvilkar {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Outcome of assessing one criterion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Vurdering {
    /// The criterion is met for the whole period.
    Oppfylt,
    /// The criterion is not met from [`Vilkarsvurdering::gjelder_fra`].
    IkkeOppfylt,
    /// The evaluator could not reach a conclusion.
    Uavklart,
}

/// One criterion's assessment, effective from a given month.
///
/// For a met criterion the effective month is the start of the assessed
/// period; for a failing one it is the first month the failure applies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Vilkarsvurdering {
    /// The assessed criterion.
    pub vilkar: Inngangsvilkar,
    /// The assessment outcome.
    pub vurdering: Vurdering,
    /// First month the outcome applies.
    pub gjelder_fra: Maaned,
}

/// A criterion was assessed twice in the same set.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("criterion {0} assessed more than once")]
pub struct DuplicateVilkar(pub Inngangsvilkar);

/// The full set of criterion assessments for a reassessment period.
///
/// At most one assessment per criterion. The aggregate outcome is computed
/// by [`Vilkarsvurderinger::resultat`]: any failing criterion makes the
/// whole set a rejection, any unclear criterion (absent failures) makes it
/// unclear, otherwise the set is fully met.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Vilkarsvurderinger {
    vurderinger: Vec<Vilkarsvurdering>,
}

impl Vilkarsvurderinger {
    /// Create an assessment set.
    ///
    /// # Errors
    ///
    /// Returns [`DuplicateVilkar`] if any criterion appears twice.
    pub fn new(vurderinger: Vec<Vilkarsvurdering>) -> Result<Self, DuplicateVilkar> {
        for (i, vurdering) in vurderinger.iter().enumerate() {
            if vurderinger[..i].iter().any(|v| v.vilkar == vurdering.vilkar) {
                return Err(DuplicateVilkar(vurdering.vilkar));
            }
        }
        Ok(Self { vurderinger })
    }

    /// The individual assessments.
    pub fn vurderinger(&self) -> &[Vilkarsvurdering] {
        &self.vurderinger
    }

    /// Replace or add one criterion's assessment, returning a new set.
    pub fn med(&self, vurdering: Vilkarsvurdering) -> Self {
        let mut vurderinger: Vec<Vilkarsvurdering> = self
            .vurderinger
            .iter()
            .copied()
            .filter(|v| v.vilkar != vurdering.vilkar)
            .collect();
        vurderinger.push(vurdering);
        Self { vurderinger }
    }

    /// Fold the set to a single outcome.
    pub fn resultat(&self) -> Vilkarsvurderingsresultat {
        let avslag: Vec<(Inngangsvilkar, Maaned)> = self
            .vurderinger
            .iter()
            .filter(|v| v.vurdering == Vurdering::IkkeOppfylt)
            .map(|v| (v.vilkar, v.gjelder_fra))
            .collect();
        if !avslag.is_empty() {
            return Vilkarsvurderingsresultat::Avslag { vilkar: avslag };
        }

        let uavklart: Vec<Inngangsvilkar> = self
            .vurderinger
            .iter()
            .filter(|v| v.vurdering == Vurdering::Uavklart)
            .map(|v| v.vilkar)
            .collect();
        if !uavklart.is_empty() {
            return Vilkarsvurderingsresultat::Uavklart { vilkar: uavklart };
        }

        Vilkarsvurderingsresultat::Innvilget
    }

    /// Whether every criterion is met.
    pub fn er_innvilget(&self) -> bool {
        matches!(self.resultat(), Vilkarsvurderingsresultat::Innvilget)
    }
}

/// Aggregate outcome of a criterion assessment set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Vilkarsvurderingsresultat {
    /// Every criterion is met.
    Innvilget,
    /// At least one criterion failed; carries each failing criterion with
    /// the first month its failure applies.
    Avslag {
        /// Failing criteria, in assessment order.
        vilkar: Vec<(Inngangsvilkar, Maaned)>,
    },
    /// No criterion failed, but at least one could not be concluded.
    Uavklart {
        /// Unconcluded criteria, in assessment order.
        vilkar: Vec<Inngangsvilkar>,
    },
}
