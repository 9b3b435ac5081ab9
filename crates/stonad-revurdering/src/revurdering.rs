//! # The Reassessment Case (Revurdering)
//!
//! The aggregate tying the engine together. A case is an immutable value
//! in exactly one lifecycle state; every operation consumes the case and
//! returns either the successor value or a typed error, and the payload a
//! state carries is exactly what that state has established — a calculated
//! case always holds its calculation, a created one never does.
//!
//! ```text
//! Opprettet -> VilkarOppdatert -> Beregnet{Innvilget|Opphort}
//!     -> Simulert{Innvilget|Opphort} -> TilAttestering{Innvilget|Opphort}
//!     -> Iverksatt{Innvilget|Opphort} | Underkjent | Avsluttet
//! ```
//!
//! `Underkjent` re-opens the case with its calculation and grounds intact;
//! `Iverksatt` and `Avsluttet` accept no further transitions. The only
//! ambient inputs are the injected [`Clock`] and the two external
//! collaborators, so identical inputs always produce identical outputs.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use stonad_beregning::{Beregner, Beregning, Simulering, Utbetalingssimulator};
use stonad_core::{Attestant, Clock, Periode, RevurderingId, Saksbehandler, VedtakId};
use stonad_vilkar::{
    Fradragstype, Grunnlag, GrunnlagPatch, Vilkarsvurdering, Vilkarsvurderinger,
    Vilkarsvurderingsresultat,
};

use crate::attestering::{Attestering, Attesteringshistorikk, Underkjennelsesgrunn};
use crate::avkorting::{
    vurder_avkorting, AvkortingVedRevurdering, Tilbakekrevingsbehov, UtestaaendeAvkorting,
};
use crate::error::{
    AttesterError, AvsluttError, BeregnError, OppdaterGrunnlagError, SimulerError,
    TilAttesteringError, UgyldigTilstandsovergang, VelgBrevvalgError,
};
use crate::opphor::{vurder_opphor, Opphor, OpphorVedRevurdering};
use crate::opphorsperiode;

// ---------------------------------------------------------------------------
// Case metadata & supporting value types
// ---------------------------------------------------------------------------

/// Why the reassessment was opened.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Aarsak {
    /// The recipient reported a change.
    MeldingFraBruker,
    /// Findings from a control interview.
    InformasjonFraKontrollsamtale,
    /// Death of the recipient or a household member.
    Dodsfall,
    /// Annual regulation of the base amount.
    ReguleringAvGrunnbelop,
    /// Information from other sources.
    AndreKilder,
}

/// The recorded reason a reassessment was opened, with the caseworker's
/// explanation. Descriptive only; it never gates a transition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Revurderingsaarsak {
    /// The structured reason.
    pub aarsak: Aarsak,
    /// Free-text explanation.
    pub begrunnelse: String,
}

/// Whether a decision letter is sent for the case.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Brevvalg {
    /// The caseworker has not yet decided.
    IkkeValgt,
    /// Send a letter, optionally with a free-text paragraph.
    SendBrev {
        /// Free text included in the letter.
        fritekst: Option<String>,
    },
    /// No letter is sent.
    IkkeSendBrev,
}

impl Brevvalg {
    /// Whether a choice has been committed.
    pub fn er_valgt(&self) -> bool {
        !matches!(self, Self::IkkeValgt)
    }
}

/// Data every lifecycle state carries: identity, scope, actors, grounds,
/// the calculation behind the decision being reassessed, the case's
/// outstanding clawback, and the attestation history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Revurderingsinfo {
    /// Case identity.
    pub id: RevurderingId,
    /// The decision being reassessed.
    pub tidligere_vedtak: VedtakId,
    /// The period under reassessment.
    pub periode: Periode,
    /// Why the reassessment was opened.
    pub aarsak: Revurderingsaarsak,
    /// The caseworker preparing the case.
    pub saksbehandler: Saksbehandler,
    /// When the case was opened.
    pub opprettet: DateTime<Utc>,
    /// The grounds the case is calculated on.
    pub grunnlag: Grunnlag,
    /// The criterion assessments for the period.
    pub vilkarsvurderinger: Vilkarsvurderinger,
    /// The calculation behind the prior decision, for delta computation.
    pub gjeldende_beregning: Beregning,
    /// Outstanding clawback going into the revision.
    pub utestaaende_avkorting: UtestaaendeAvkorting,
    /// Append-only attestation history, retained across re-openings.
    pub attesteringer: Attesteringshistorikk,
}

/// Payload of an approved (continuing) outcome from simulation onward.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InnvilgetUtfall {
    /// The new calculation.
    pub beregning: Beregning,
    /// The payment simulation of the new calculation.
    pub simulering: Simulering,
    /// What the revision does to the case's clawback state.
    pub avkorting: AvkortingVedRevurdering,
    /// Whether a manual recovery decision is pending.
    pub tilbakekrevingsbehov: Tilbakekrevingsbehov,
    /// The letter choice.
    pub brevvalg: Brevvalg,
}

/// Payload of a terminating outcome from simulation onward.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OpphortUtfall {
    /// The new calculation.
    pub beregning: Beregning,
    /// The termination verdict.
    pub opphor: Opphor,
    /// The payment simulation of the termination.
    pub simulering: Simulering,
    /// Months for which payment instructions are suppressed.
    pub opphorsperiode_for_utbetaling: Periode,
    /// What the revision does to the case's clawback state.
    pub avkorting: AvkortingVedRevurdering,
    /// Whether a manual recovery decision is pending.
    pub tilbakekrevingsbehov: Tilbakekrevingsbehov,
    /// The letter choice.
    pub brevvalg: Brevvalg,
}

// ---------------------------------------------------------------------------
// State discriminant
// ---------------------------------------------------------------------------

/// The lifecycle state of a case, without its payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RevurderingState {
    /// Opened, nothing assessed yet.
    Opprettet,
    /// Grounds and criterion assessments updated.
    VilkarOppdatert,
    /// Calculated; the benefit continues.
    BeregnetInnvilget,
    /// Calculated; the benefit terminates.
    BeregnetOpphort,
    /// Simulated continuing outcome.
    SimulertInnvilget,
    /// Simulated termination.
    SimulertOpphort,
    /// Continuing outcome pending attestation.
    TilAttesteringInnvilget,
    /// Termination pending attestation.
    TilAttesteringOpphort,
    /// Continuing outcome approved and executed. Terminal.
    IverksattInnvilget,
    /// Termination approved and executed. Terminal.
    IverksattOpphort,
    /// Sent back by the attestant; open for rework.
    Underkjent,
    /// Abandoned with a justification. Terminal.
    Avsluttet,
}

impl RevurderingState {
    /// The canonical string identifier for serialization and logging.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Opprettet => "opprettet",
            Self::VilkarOppdatert => "vilkar_oppdatert",
            Self::BeregnetInnvilget => "beregnet_innvilget",
            Self::BeregnetOpphort => "beregnet_opphort",
            Self::SimulertInnvilget => "simulert_innvilget",
            Self::SimulertOpphort => "simulert_opphort",
            Self::TilAttesteringInnvilget => "til_attestering_innvilget",
            Self::TilAttesteringOpphort => "til_attestering_opphort",
            Self::IverksattInnvilget => "iverksatt_innvilget",
            Self::IverksattOpphort => "iverksatt_opphort",
            Self::Underkjent => "underkjent",
            Self::Avsluttet => "avsluttet",
        }
    }

    /// Whether the state accepts no further transitions.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            Self::IverksattInnvilget | Self::IverksattOpphort | Self::Avsluttet
        )
    }

    /// The states reachable from this one.
    pub fn valid_transitions(&self) -> &'static [RevurderingState] {
        use RevurderingState::*;
        match self {
            Opprettet => &[VilkarOppdatert, Avsluttet],
            VilkarOppdatert => &[
                VilkarOppdatert,
                BeregnetInnvilget,
                BeregnetOpphort,
                Avsluttet,
            ],
            BeregnetInnvilget => &[
                VilkarOppdatert,
                BeregnetInnvilget,
                BeregnetOpphort,
                SimulertInnvilget,
                Avsluttet,
            ],
            BeregnetOpphort => &[
                VilkarOppdatert,
                BeregnetInnvilget,
                BeregnetOpphort,
                SimulertOpphort,
                Avsluttet,
            ],
            SimulertInnvilget => &[
                VilkarOppdatert,
                BeregnetInnvilget,
                BeregnetOpphort,
                SimulertInnvilget,
                TilAttesteringInnvilget,
                Avsluttet,
            ],
            SimulertOpphort => &[
                VilkarOppdatert,
                BeregnetInnvilget,
                BeregnetOpphort,
                SimulertOpphort,
                TilAttesteringOpphort,
                Avsluttet,
            ],
            TilAttesteringInnvilget => &[IverksattInnvilget, Underkjent],
            TilAttesteringOpphort => &[IverksattOpphort, Underkjent],
            IverksattInnvilget | IverksattOpphort | Avsluttet => &[],
            Underkjent => &[
                VilkarOppdatert,
                BeregnetInnvilget,
                BeregnetOpphort,
                SimulertInnvilget,
                SimulertOpphort,
                Avsluttet,
            ],
        }
    }
}

impl std::fmt::Display for RevurderingState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

// ---------------------------------------------------------------------------
// The aggregate
// ---------------------------------------------------------------------------

/// Parameters for opening a reassessment case.
#[derive(Debug, Clone)]
pub struct NyRevurdering {
    /// The decision being reassessed.
    pub tidligere_vedtak: VedtakId,
    /// The period under reassessment.
    pub periode: Periode,
    /// Why the reassessment was opened.
    pub aarsak: Revurderingsaarsak,
    /// The preparing caseworker.
    pub saksbehandler: Saksbehandler,
    /// Initial grounds, copied from the prior decision.
    pub grunnlag: Grunnlag,
    /// Initial criterion assessments, copied from the prior decision.
    pub vilkarsvurderinger: Vilkarsvurderinger,
    /// The calculation behind the prior decision.
    pub gjeldende_beregning: Beregning,
    /// Outstanding clawback on the case, if any.
    pub utestaaende_avkorting: UtestaaendeAvkorting,
}

/// The attestant's decision on a case pending attestation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Attesteringsbeslutning {
    /// Approve and execute.
    Iverksett,
    /// Send back for rework.
    Underkjenn {
        /// Structured rejection ground.
        grunn: Underkjennelsesgrunn,
        /// Free-text explanation for the caseworker.
        kommentar: String,
    },
}

/// A reassessment case in one of its lifecycle states.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Revurdering {
    /// Opened, nothing assessed yet.
    Opprettet {
        /// Case data.
        info: Revurderingsinfo,
    },
    /// Grounds and criterion assessments updated.
    VilkarOppdatert {
        /// Case data.
        info: Revurderingsinfo,
    },
    /// Calculated; the benefit continues.
    BeregnetInnvilget {
        /// Case data.
        info: Revurderingsinfo,
        /// The new calculation.
        beregning: Beregning,
    },
    /// Calculated; the benefit terminates.
    BeregnetOpphort {
        /// Case data.
        info: Revurderingsinfo,
        /// The new calculation.
        beregning: Beregning,
        /// The termination verdict.
        opphor: Opphor,
    },
    /// Simulated continuing outcome.
    SimulertInnvilget {
        /// Case data.
        info: Revurderingsinfo,
        /// The simulated outcome.
        utfall: InnvilgetUtfall,
    },
    /// Simulated termination.
    SimulertOpphort {
        /// Case data.
        info: Revurderingsinfo,
        /// The simulated outcome.
        utfall: OpphortUtfall,
    },
    /// Continuing outcome pending attestation.
    TilAttesteringInnvilget {
        /// Case data.
        info: Revurderingsinfo,
        /// The outcome sent to attestation.
        utfall: InnvilgetUtfall,
    },
    /// Termination pending attestation.
    TilAttesteringOpphort {
        /// Case data.
        info: Revurderingsinfo,
        /// The outcome sent to attestation.
        utfall: OpphortUtfall,
    },
    /// Continuing outcome approved and executed. Terminal.
    IverksattInnvilget {
        /// Case data.
        info: Revurderingsinfo,
        /// The executed outcome.
        utfall: InnvilgetUtfall,
    },
    /// Termination approved and executed. Terminal.
    IverksattOpphort {
        /// Case data.
        info: Revurderingsinfo,
        /// The executed outcome.
        utfall: OpphortUtfall,
    },
    /// Sent back by the attestant; calculation and grounds retained.
    Underkjent {
        /// Case data, including the rejection in the attestation history.
        info: Revurderingsinfo,
        /// The calculation from before the rejection.
        beregning: Beregning,
        /// The termination verdict, when the rejected outcome terminated.
        opphor: Option<Opphor>,
    },
    /// Abandoned. Terminal.
    Avsluttet {
        /// Case data as of abandonment.
        info: Revurderingsinfo,
        /// Mandatory justification.
        begrunnelse: String,
        /// When the case was abandoned.
        avsluttet_tidspunkt: DateTime<Utc>,
    },
}

impl Revurdering {
    /// Open a reassessment case against a prior decision.
    pub fn opprett(ny: NyRevurdering, clock: &impl Clock) -> Self {
        let info = Revurderingsinfo {
            id: RevurderingId::new(),
            tidligere_vedtak: ny.tidligere_vedtak,
            periode: ny.periode,
            aarsak: ny.aarsak,
            saksbehandler: ny.saksbehandler,
            opprettet: clock.now(),
            grunnlag: ny.grunnlag,
            vilkarsvurderinger: ny.vilkarsvurderinger,
            gjeldende_beregning: ny.gjeldende_beregning,
            utestaaende_avkorting: ny.utestaaende_avkorting,
            attesteringer: Attesteringshistorikk::ny(),
        };
        tracing::debug!(id = %info.id, periode = %info.periode, "reassessment case opened");
        Revurdering::Opprettet { info }
    }

    // -- transitions --------------------------------------------------------

    /// Merge a field-level grounds patch and replacement criterion
    /// assessments into the case.
    ///
    /// Any prior calculation or simulation is discarded; the case returns
    /// to [`RevurderingState::VilkarOppdatert`].
    pub fn oppdater_grunnlag(
        self,
        patch: GrunnlagPatch,
        vilkar: Vec<Vilkarsvurdering>,
    ) -> Result<Revurdering, OppdaterGrunnlagError> {
        let fra = self.state();
        let mut info = match self {
            Revurdering::Opprettet { info }
            | Revurdering::VilkarOppdatert { info }
            | Revurdering::BeregnetInnvilget { info, .. }
            | Revurdering::BeregnetOpphort { info, .. }
            | Revurdering::SimulertInnvilget { info, .. }
            | Revurdering::SimulertOpphort { info, .. }
            | Revurdering::Underkjent { info, .. } => info,
            _ => {
                return Err(UgyldigTilstandsovergang {
                    fra,
                    til: RevurderingState::VilkarOppdatert,
                }
                .into())
            }
        };
        info.grunnlag = info.grunnlag.patch(patch);
        for vurdering in vilkar {
            info.vilkarsvurderinger = info.vilkarsvurderinger.med(vurdering);
        }
        Ok(Revurdering::VilkarOppdatert { info })
    }

    /// Calculate the case and decide whether the benefit continues or
    /// terminates.
    pub fn beregn(
        self,
        beregner: &impl Beregner,
        clock: &impl Clock,
    ) -> Result<Revurdering, BeregnError> {
        let fra = self.state();
        let info = match self {
            Revurdering::VilkarOppdatert { info }
            | Revurdering::BeregnetInnvilget { info, .. }
            | Revurdering::BeregnetOpphort { info, .. }
            | Revurdering::SimulertInnvilget { info, .. }
            | Revurdering::SimulertOpphort { info, .. }
            | Revurdering::Underkjent { info, .. } => info,
            _ => {
                return Err(UgyldigTilstandsovergang {
                    fra,
                    til: RevurderingState::BeregnetInnvilget,
                }
                .into())
            }
        };

        if let Vilkarsvurderingsresultat::Uavklart { vilkar } = info.vilkarsvurderinger.resultat()
        {
            return Err(BeregnError::VilkarsvurderingUavklart { vilkar });
        }

        let beregning = beregner.beregn(&info.grunnlag, info.periode)?;
        match vurder_opphor(
            &info.vilkarsvurderinger,
            &beregning,
            clock.naavaerende_maaned(),
        ) {
            OpphorVedRevurdering::Nei => {
                tracing::debug!(id = %info.id, "recalculation keeps the benefit running");
                Ok(Revurdering::BeregnetInnvilget { info, beregning })
            }
            OpphorVedRevurdering::Ja(opphor) => {
                // Terminating while the calculation still carries planned
                // clawback instalments would leave them uncollectable.
                if beregning.har_fradrag_av_type(Fradragstype::AvkortingUtenlandsopphold) {
                    return Err(BeregnError::OpphorAvYtelseSomSkalAvkortes);
                }
                tracing::debug!(
                    id = %info.id,
                    fra_og_med = %opphor.fra_og_med(),
                    grunner = ?opphor.grunner(),
                    "recalculation terminates the benefit"
                );
                Ok(Revurdering::BeregnetOpphort {
                    info,
                    beregning,
                    opphor,
                })
            }
        }
    }

    /// Simulate the calculated outcome against the payment ledger and
    /// reconcile the case's clawback state.
    ///
    /// A sent-back case keeps its calculation, so it can be re-simulated
    /// directly without recalculating first.
    pub fn simuler(
        self,
        simulator: &impl Utbetalingssimulator,
    ) -> Result<Revurdering, SimulerError> {
        let fra = self.state();
        let (info, beregning, opphor) = match self {
            Revurdering::BeregnetInnvilget { info, beregning } => (info, beregning, None),
            Revurdering::BeregnetOpphort {
                info,
                beregning,
                opphor,
            } => (info, beregning, Some(opphor)),
            Revurdering::Underkjent {
                info,
                beregning,
                opphor,
            } => (info, beregning, opphor),
            _ => {
                return Err(UgyldigTilstandsovergang {
                    fra,
                    til: RevurderingState::SimulertInnvilget,
                }
                .into())
            }
        };
        match opphor {
            None => {
                let simulering = simulator.simuler(&beregning)?;
                let avkorting = vurder_avkorting(
                    &info.utestaaende_avkorting,
                    None,
                    &simulering,
                    info.periode,
                )?;
                let tilbakekrevingsbehov = utled_tilbakekrevingsbehov(&simulering, &avkorting);
                Ok(Revurdering::SimulertInnvilget {
                    info,
                    utfall: InnvilgetUtfall {
                        beregning,
                        simulering,
                        avkorting,
                        tilbakekrevingsbehov,
                        brevvalg: Brevvalg::IkkeValgt,
                    },
                })
            }
            Some(opphor) => {
                let stans = opphorsperiode::stansperiode(opphor.fra_og_med(), info.periode);
                let simulering = simulator.simuler_opphor(stans)?;
                let avkorting = vurder_avkorting(
                    &info.utestaaende_avkorting,
                    Some(&opphor),
                    &simulering,
                    info.periode,
                )?;
                let opphorsperiode_for_utbetaling = opphorsperiode::utled(
                    opphor.fra_og_med(),
                    info.periode,
                    &simulering,
                    opphor.kan_avkortes(),
                );
                let tilbakekrevingsbehov = utled_tilbakekrevingsbehov(&simulering, &avkorting);
                Ok(Revurdering::SimulertOpphort {
                    info,
                    utfall: OpphortUtfall {
                        beregning,
                        opphor,
                        simulering,
                        opphorsperiode_for_utbetaling,
                        avkorting,
                        tilbakekrevingsbehov,
                        brevvalg: Brevvalg::IkkeValgt,
                    },
                })
            }
        }
    }

    /// Commit the letter choice on a simulated case.
    pub fn velg_brevvalg(self, brevvalg: Brevvalg) -> Result<Revurdering, VelgBrevvalgError> {
        if !brevvalg.er_valgt() {
            return Err(VelgBrevvalgError::IkkeEtValg);
        }
        let fra = self.state();
        match self {
            Revurdering::SimulertInnvilget { info, mut utfall } => {
                utfall.brevvalg = brevvalg;
                Ok(Revurdering::SimulertInnvilget { info, utfall })
            }
            Revurdering::SimulertOpphort { info, mut utfall } => {
                utfall.brevvalg = brevvalg;
                Ok(Revurdering::SimulertOpphort { info, utfall })
            }
            _ => Err(UgyldigTilstandsovergang {
                fra,
                til: RevurderingState::SimulertInnvilget,
            }
            .into()),
        }
    }

    /// Send the simulated outcome to attestation.
    ///
    /// A termination is first checked against the unsupported-outcome
    /// detector, and a committed letter choice is required.
    pub fn til_attestering(self) -> Result<Revurdering, TilAttesteringError> {
        let fra = self.state();
        match self {
            Revurdering::SimulertInnvilget { info, utfall } => {
                if !utfall.brevvalg.er_valgt() {
                    return Err(TilAttesteringError::BrevvalgMangler);
                }
                Ok(Revurdering::TilAttesteringInnvilget { info, utfall })
            }
            Revurdering::SimulertOpphort { info, utfall } => {
                let flagg = crate::utfall::identifiser(
                    &utfall.opphor,
                    info.periode,
                    &utfall.beregning,
                    &info.gjeldende_beregning,
                );
                if !flagg.is_empty() {
                    tracing::warn!(
                        id = %info.id,
                        flagg = ?flagg,
                        "termination refused attestation"
                    );
                    return Err(TilAttesteringError::UtfallStottesIkke { utfall: flagg });
                }
                if !utfall.brevvalg.er_valgt() {
                    return Err(TilAttesteringError::BrevvalgMangler);
                }
                Ok(Revurdering::TilAttesteringOpphort { info, utfall })
            }
            _ => Err(UgyldigTilstandsovergang {
                fra,
                til: RevurderingState::TilAttesteringInnvilget,
            }
            .into()),
        }
    }

    /// Record the attestant's decision.
    ///
    /// Approval executes the case; rejection appends to the attestation
    /// history and re-opens the case with its calculation intact. The
    /// attestant must differ from the preparing caseworker.
    pub fn attester(
        self,
        attestant: Attestant,
        beslutning: Attesteringsbeslutning,
        clock: &impl Clock,
    ) -> Result<Revurdering, AttesterError> {
        enum Utfall {
            Innvilget(InnvilgetUtfall),
            Opphort(OpphortUtfall),
        }

        let fra = self.state();
        let (mut info, utfall) = match self {
            Revurdering::TilAttesteringInnvilget { info, utfall } => {
                (info, Utfall::Innvilget(utfall))
            }
            Revurdering::TilAttesteringOpphort { info, utfall } => (info, Utfall::Opphort(utfall)),
            _ => {
                return Err(UgyldigTilstandsovergang {
                    fra,
                    til: RevurderingState::IverksattInnvilget,
                }
                .into())
            }
        };

        if attestant.er_samme_person(&info.saksbehandler) {
            return Err(AttesterError::AttestantOgSaksbehandlerErSammePerson);
        }

        match beslutning {
            Attesteringsbeslutning::Iverksett => {
                info.attesteringer = info.attesteringer.med(Attestering::Iverksatt {
                    attestant,
                    tidspunkt: clock.now(),
                });
                tracing::debug!(id = %info.id, "case approved and executed");
                Ok(match utfall {
                    Utfall::Innvilget(utfall) => Revurdering::IverksattInnvilget { info, utfall },
                    Utfall::Opphort(utfall) => Revurdering::IverksattOpphort { info, utfall },
                })
            }
            Attesteringsbeslutning::Underkjenn { grunn, kommentar } => {
                info.attesteringer = info.attesteringer.med(Attestering::Underkjent {
                    attestant,
                    grunn,
                    kommentar,
                    tidspunkt: clock.now(),
                });
                tracing::debug!(id = %info.id, "case sent back by attestant");
                let (beregning, opphor) = match utfall {
                    Utfall::Innvilget(utfall) => (utfall.beregning, None),
                    Utfall::Opphort(utfall) => (utfall.beregning, Some(utfall.opphor)),
                };
                Ok(Revurdering::Underkjent {
                    info,
                    beregning,
                    opphor,
                })
            }
        }
    }

    /// Abandon the case with a mandatory justification.
    pub fn avslutt(
        self,
        begrunnelse: String,
        clock: &impl Clock,
    ) -> Result<Revurdering, AvsluttError> {
        if begrunnelse.trim().is_empty() {
            return Err(AvsluttError::BegrunnelseMangler);
        }
        let info = match self {
            Revurdering::Opprettet { info }
            | Revurdering::VilkarOppdatert { info }
            | Revurdering::BeregnetInnvilget { info, .. }
            | Revurdering::BeregnetOpphort { info, .. }
            | Revurdering::SimulertInnvilget { info, .. }
            | Revurdering::SimulertOpphort { info, .. }
            | Revurdering::Underkjent { info, .. } => info,
            Revurdering::TilAttesteringInnvilget { .. }
            | Revurdering::TilAttesteringOpphort { .. } => {
                return Err(AvsluttError::ErTilAttestering)
            }
            Revurdering::IverksattInnvilget { .. } | Revurdering::IverksattOpphort { .. } => {
                return Err(AvsluttError::ErIverksatt)
            }
            Revurdering::Avsluttet { .. } => return Err(AvsluttError::AlleredeAvsluttet),
        };
        tracing::debug!(id = %info.id, "case abandoned");
        Ok(Revurdering::Avsluttet {
            info,
            begrunnelse,
            avsluttet_tidspunkt: clock.now(),
        })
    }

    // -- inspection ---------------------------------------------------------

    /// The case's current lifecycle state.
    pub fn state(&self) -> RevurderingState {
        match self {
            Self::Opprettet { .. } => RevurderingState::Opprettet,
            Self::VilkarOppdatert { .. } => RevurderingState::VilkarOppdatert,
            Self::BeregnetInnvilget { .. } => RevurderingState::BeregnetInnvilget,
            Self::BeregnetOpphort { .. } => RevurderingState::BeregnetOpphort,
            Self::SimulertInnvilget { .. } => RevurderingState::SimulertInnvilget,
            Self::SimulertOpphort { .. } => RevurderingState::SimulertOpphort,
            Self::TilAttesteringInnvilget { .. } => RevurderingState::TilAttesteringInnvilget,
            Self::TilAttesteringOpphort { .. } => RevurderingState::TilAttesteringOpphort,
            Self::IverksattInnvilget { .. } => RevurderingState::IverksattInnvilget,
            Self::IverksattOpphort { .. } => RevurderingState::IverksattOpphort,
            Self::Underkjent { .. } => RevurderingState::Underkjent,
            Self::Avsluttet { .. } => RevurderingState::Avsluttet,
        }
    }

    /// Whether the case still accepts transitions.
    pub fn er_apen(&self) -> bool {
        !self.state().is_terminal()
    }

    /// Case data shared by every state.
    pub fn info(&self) -> &Revurderingsinfo {
        match self {
            Self::Opprettet { info }
            | Self::VilkarOppdatert { info }
            | Self::BeregnetInnvilget { info, .. }
            | Self::BeregnetOpphort { info, .. }
            | Self::SimulertInnvilget { info, .. }
            | Self::SimulertOpphort { info, .. }
            | Self::TilAttesteringInnvilget { info, .. }
            | Self::TilAttesteringOpphort { info, .. }
            | Self::IverksattInnvilget { info, .. }
            | Self::IverksattOpphort { info, .. }
            | Self::Underkjent { info, .. }
            | Self::Avsluttet { info, .. } => info,
        }
    }

    /// Case identity.
    pub fn id(&self) -> RevurderingId {
        self.info().id
    }

    /// The period under reassessment.
    pub fn periode(&self) -> Periode {
        self.info().periode
    }

    /// The preparing caseworker.
    pub fn saksbehandler(&self) -> &Saksbehandler {
        &self.info().saksbehandler
    }

    /// The grounds the case is calculated on.
    pub fn grunnlag(&self) -> &Grunnlag {
        &self.info().grunnlag
    }

    /// The criterion assessments.
    pub fn vilkarsvurderinger(&self) -> &Vilkarsvurderinger {
        &self.info().vilkarsvurderinger
    }

    /// The attestation history.
    pub fn attesteringer(&self) -> &Attesteringshistorikk {
        &self.info().attesteringer
    }

    /// The new calculation, in states that have one.
    pub fn beregning(&self) -> Option<&Beregning> {
        match self {
            Self::Opprettet { .. } | Self::VilkarOppdatert { .. } | Self::Avsluttet { .. } => None,
            Self::BeregnetInnvilget { beregning, .. }
            | Self::BeregnetOpphort { beregning, .. }
            | Self::Underkjent { beregning, .. } => Some(beregning),
            Self::SimulertInnvilget { utfall, .. }
            | Self::TilAttesteringInnvilget { utfall, .. }
            | Self::IverksattInnvilget { utfall, .. } => Some(&utfall.beregning),
            Self::SimulertOpphort { utfall, .. }
            | Self::TilAttesteringOpphort { utfall, .. }
            | Self::IverksattOpphort { utfall, .. } => Some(&utfall.beregning),
        }
    }

    /// The termination verdict, in states where the outcome terminates.
    pub fn opphor(&self) -> Option<&Opphor> {
        match self {
            Self::BeregnetOpphort { opphor, .. } => Some(opphor),
            Self::SimulertOpphort { utfall, .. }
            | Self::TilAttesteringOpphort { utfall, .. }
            | Self::IverksattOpphort { utfall, .. } => Some(&utfall.opphor),
            Self::Underkjent { opphor, .. } => opphor.as_ref(),
            _ => None,
        }
    }

    /// The payment simulation, in states that have one.
    pub fn simulering(&self) -> Option<&Simulering> {
        match self {
            Self::SimulertInnvilget { utfall, .. }
            | Self::TilAttesteringInnvilget { utfall, .. }
            | Self::IverksattInnvilget { utfall, .. } => Some(&utfall.simulering),
            Self::SimulertOpphort { utfall, .. }
            | Self::TilAttesteringOpphort { utfall, .. }
            | Self::IverksattOpphort { utfall, .. } => Some(&utfall.simulering),
            _ => None,
        }
    }

    /// The revision's clawback outcome, in states that have simulated.
    pub fn avkorting(&self) -> Option<&AvkortingVedRevurdering> {
        match self {
            Self::SimulertInnvilget { utfall, .. }
            | Self::TilAttesteringInnvilget { utfall, .. }
            | Self::IverksattInnvilget { utfall, .. } => Some(&utfall.avkorting),
            Self::SimulertOpphort { utfall, .. }
            | Self::TilAttesteringOpphort { utfall, .. }
            | Self::IverksattOpphort { utfall, .. } => Some(&utfall.avkorting),
            _ => None,
        }
    }

    /// Whether a manual recovery decision is pending, in states that have
    /// simulated.
    pub fn tilbakekrevingsbehov(&self) -> Option<Tilbakekrevingsbehov> {
        match self {
            Self::SimulertInnvilget { utfall, .. }
            | Self::TilAttesteringInnvilget { utfall, .. }
            | Self::IverksattInnvilget { utfall, .. } => Some(utfall.tilbakekrevingsbehov),
            Self::SimulertOpphort { utfall, .. }
            | Self::TilAttesteringOpphort { utfall, .. }
            | Self::IverksattOpphort { utfall, .. } => Some(utfall.tilbakekrevingsbehov),
            _ => None,
        }
    }

    /// The letter choice, in states that carry one.
    pub fn brevvalg(&self) -> Option<&Brevvalg> {
        match self {
            Self::SimulertInnvilget { utfall, .. }
            | Self::TilAttesteringInnvilget { utfall, .. }
            | Self::IverksattInnvilget { utfall, .. } => Some(&utfall.brevvalg),
            Self::SimulertOpphort { utfall, .. }
            | Self::TilAttesteringOpphort { utfall, .. }
            | Self::IverksattOpphort { utfall, .. } => Some(&utfall.brevvalg),
            _ => None,
        }
    }
}

fn utled_tilbakekrevingsbehov(
    simulering: &Simulering,
    avkorting: &AvkortingVedRevurdering,
) -> Tilbakekrevingsbehov {
    if simulering.har_feilutbetaling() && !avkorting.har_utestaaende() {
        Tilbakekrevingsbehov::TrengerAvgjorelse
    } else {
        Tilbakekrevingsbehov::IkkeBehov
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use stonad_beregning::beregning::Maanedsberegning;
    use stonad_core::{FixedClock, Maaned};
    use stonad_vilkar::{Bosituasjon, Inngangsvilkar, Vurdering};

    fn m(month: u32) -> Maaned {
        Maaned::new(2021, month).unwrap()
    }

    fn periode() -> Periode {
        Periode::new(m(1), m(6)).unwrap()
    }

    fn clock() -> FixedClock {
        FixedClock::at(Utc.with_ymd_and_hms(2021, 1, 15, 12, 0, 0).unwrap())
    }

    fn beregning(belop: i64) -> Beregning {
        let maaneder = periode()
            .maaneder()
            .map(|maaned| Maanedsberegning {
                maaned,
                belop,
                minstegrense: 500,
                fradrag: vec![],
            })
            .collect();
        Beregning::new(periode(), maaneder).unwrap()
    }

    fn sak() -> Revurdering {
        Revurdering::opprett(
            NyRevurdering {
                tidligere_vedtak: VedtakId::new(),
                periode: periode(),
                aarsak: Revurderingsaarsak {
                    aarsak: Aarsak::MeldingFraBruker,
                    begrunnelse: "ny inntekt meldt".to_string(),
                },
                saksbehandler: Saksbehandler::new("Z990297").unwrap(),
                grunnlag: Grunnlag {
                    forventet_inntekt: 0,
                    fradrag: vec![],
                    bosituasjon: Bosituasjon::Enslig,
                },
                vilkarsvurderinger: Vilkarsvurderinger::new(vec![Vilkarsvurdering {
                    vilkar: Inngangsvilkar::Uforhet,
                    vurdering: Vurdering::Oppfylt,
                    gjelder_fra: m(1),
                }])
                .unwrap(),
                gjeldende_beregning: beregning(5000),
                utestaaende_avkorting: UtestaaendeAvkorting::Ingen,
            },
            &clock(),
        )
    }

    #[test]
    fn a_new_case_starts_open_and_unassessed() {
        let sak = sak();
        assert_eq!(sak.state(), RevurderingState::Opprettet);
        assert!(sak.er_apen());
        assert!(sak.beregning().is_none());
        assert!(sak.simulering().is_none());
        assert!(sak.attesteringer().is_empty());
    }

    #[test]
    fn updating_grounds_patches_and_replaces_assessments() {
        let oppdatert = sak()
            .oppdater_grunnlag(
                GrunnlagPatch {
                    forventet_inntekt: Some(12000),
                    ..Default::default()
                },
                vec![Vilkarsvurdering {
                    vilkar: Inngangsvilkar::Utenlandsopphold,
                    vurdering: Vurdering::IkkeOppfylt,
                    gjelder_fra: m(3),
                }],
            )
            .unwrap();
        assert_eq!(oppdatert.state(), RevurderingState::VilkarOppdatert);
        assert_eq!(oppdatert.grunnlag().forventet_inntekt, 12000);
        assert_eq!(oppdatert.vilkarsvurderinger().vurderinger().len(), 2);
        assert!(!oppdatert.vilkarsvurderinger().er_innvilget());
    }

    #[test]
    fn letter_choice_requires_a_simulated_case() {
        let result = sak().velg_brevvalg(Brevvalg::IkkeSendBrev);
        assert!(matches!(
            result,
            Err(VelgBrevvalgError::UgyldigTilstand(
                UgyldigTilstandsovergang {
                    fra: RevurderingState::Opprettet,
                    ..
                }
            ))
        ));
    }

    #[test]
    fn not_chosen_is_not_a_letter_choice() {
        let result = sak().velg_brevvalg(Brevvalg::IkkeValgt);
        assert_eq!(result.unwrap_err(), VelgBrevvalgError::IkkeEtValg);
    }

    #[test]
    fn abandonment_requires_a_justification() {
        let result = sak().avslutt("  ".to_string(), &clock());
        assert_eq!(result.unwrap_err(), AvsluttError::BegrunnelseMangler);
    }

    #[test]
    fn an_abandoned_case_cannot_be_abandoned_again() {
        let avsluttet = sak()
            .avslutt("feilopprettet".to_string(), &clock())
            .unwrap();
        assert_eq!(avsluttet.state(), RevurderingState::Avsluttet);
        assert!(!avsluttet.er_apen());
        let result = avsluttet.avslutt("igjen".to_string(), &clock());
        assert_eq!(result.unwrap_err(), AvsluttError::AlleredeAvsluttet);
    }

    #[test]
    fn terminal_states_allow_no_transitions() {
        for state in [
            RevurderingState::IverksattInnvilget,
            RevurderingState::IverksattOpphort,
            RevurderingState::Avsluttet,
        ] {
            assert!(state.is_terminal());
            assert!(state.valid_transitions().is_empty());
        }
        assert!(!RevurderingState::Underkjent.is_terminal());
    }

    #[test]
    fn transition_table_only_reaches_non_initial_states() {
        // No state transitions back to Opprettet; it exists only at case
        // creation.
        let alle = [
            RevurderingState::Opprettet,
            RevurderingState::VilkarOppdatert,
            RevurderingState::BeregnetInnvilget,
            RevurderingState::BeregnetOpphort,
            RevurderingState::SimulertInnvilget,
            RevurderingState::SimulertOpphort,
            RevurderingState::TilAttesteringInnvilget,
            RevurderingState::TilAttesteringOpphort,
            RevurderingState::IverksattInnvilget,
            RevurderingState::IverksattOpphort,
            RevurderingState::Underkjent,
            RevurderingState::Avsluttet,
        ];
        for state in alle {
            assert!(!state
                .valid_transitions()
                .contains(&RevurderingState::Opprettet));
        }
    }

    #[test]
    fn a_created_case_round_trips_through_serde() {
        let sak = sak();
        let json = serde_json::to_string(&sak).unwrap();
        let tilbake: Revurdering = serde_json::from_str(&json).unwrap();
        assert_eq!(tilbake, sak);
    }

    #[test]
    fn state_names_are_stable() {
        assert_eq!(RevurderingState::BeregnetOpphort.as_str(), "beregnet_opphort");
        assert_eq!(
            RevurderingState::TilAttesteringInnvilget.to_string(),
            "til_attestering_innvilget"
        );
    }
}
