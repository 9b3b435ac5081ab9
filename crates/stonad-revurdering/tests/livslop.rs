//! Full-lifecycle tests for the reassessment engine, with fixed-fixture
//! calculation and payment-simulation collaborators.

use chrono::{TimeZone, Utc};

use stonad_beregning::beregning::Maanedsberegning;
use stonad_beregning::{
    Beregner, Beregning, BeregningFeilet, Simulering, SimuleringFeilet, SimulertMaaned,
    Utbetalingssimulator,
};
use stonad_core::{Attestant, FixedClock, Maaned, Periode, Saksbehandler, VedtakId};
use stonad_revurdering::{
    Aarsak, Attesteringsbeslutning, AvkortingVedRevurdering, Avkortingsvarsel, AvsluttError,
    BeregnError, Brevvalg, NyRevurdering, Revurdering, RevurderingState, Revurderingsaarsak,
    AttesterError, TilAttesteringError, Tilbakekrevingsbehov, Underkjennelsesgrunn,
    UtestaaendeAvkorting, UtfallSomIkkeStottes,
};
use stonad_vilkar::{
    Bosituasjon, Fradrag, Fradragstype, Grunnlag, GrunnlagPatch, Inngangsvilkar,
    Vilkarsvurdering, Vilkarsvurderinger, Vurdering,
};

const SATS: i64 = 5000;
const MINSTEGRENSE: i64 = 500;

fn m(month: u32) -> Maaned {
    Maaned::new(2021, month).unwrap()
}

fn p(fra: u32, til: u32) -> Periode {
    Periode::new(m(fra), m(til)).unwrap()
}

fn clock_i(month: u32) -> FixedClock {
    FixedClock::at(Utc.with_ymd_and_hms(2021, month, 15, 12, 0, 0).unwrap())
}

/// Fixture calculation: monthly rate minus expected income and applicable
/// deduction rows, floored at zero.
struct TestBeregner;

impl Beregner for TestBeregner {
    fn beregn(&self, grunnlag: &Grunnlag, periode: Periode) -> Result<Beregning, BeregningFeilet> {
        let maaneder = periode
            .maaneder()
            .map(|maaned| {
                let fradrag: Vec<Fradrag> = grunnlag
                    .fradrag
                    .iter()
                    .filter(|f| f.periode.inneholder(maaned))
                    .cloned()
                    .collect();
                let trekk: i64 =
                    grunnlag.forventet_inntekt + fradrag.iter().map(|f| f.maanedsbelop).sum::<i64>();
                Maanedsberegning {
                    maaned,
                    belop: (SATS - trekk).max(0),
                    minstegrense: MINSTEGRENSE,
                    fradrag,
                }
            })
            .collect();
        Ok(Beregning::new(periode, maaneder).expect("rows cover the period"))
    }
}

/// Fixture simulator with a configurable disbursement ledger.
struct TestSimulator {
    utbetalt: Vec<(Maaned, i64)>,
    siste_avstemte: Option<Maaned>,
}

impl TestSimulator {
    fn ingen_utbetalinger() -> Self {
        Self {
            utbetalt: vec![],
            siste_avstemte: None,
        }
    }

    fn med_utbetalinger(utbetalt: Vec<(Maaned, i64)>) -> Self {
        Self {
            utbetalt,
            siste_avstemte: None,
        }
    }

    fn sim(&self, periode: Periode, nytt: impl Fn(Maaned) -> i64) -> Simulering {
        Simulering {
            periode,
            maaneder: periode
                .maaneder()
                .map(|maaned| {
                    let utbetalt = self.utbetalt.iter().find(|(um, _)| *um == maaned);
                    SimulertMaaned {
                        maaned,
                        tidligere_utbetalt: utbetalt.map(|(_, belop)| *belop).unwrap_or(0),
                        nytt_belop: nytt(maaned),
                        er_utbetalt: utbetalt.is_some(),
                    }
                })
                .collect(),
            siste_avstemte_maaned: self.siste_avstemte,
        }
    }
}

impl Utbetalingssimulator for TestSimulator {
    fn simuler(&self, beregning: &Beregning) -> Result<Simulering, SimuleringFeilet> {
        Ok(self.sim(beregning.periode(), |maaned| {
            beregning.maaned(maaned).map(|mb| mb.belop).unwrap_or(0)
        }))
    }

    fn simuler_opphor(&self, periode: Periode) -> Result<Simulering, SimuleringFeilet> {
        Ok(self.sim(periode, |_| 0))
    }
}

fn gjeldende_beregning(periode: Periode) -> Beregning {
    let maaneder = periode
        .maaneder()
        .map(|maaned| Maanedsberegning {
            maaned,
            belop: SATS,
            minstegrense: MINSTEGRENSE,
            fradrag: vec![],
        })
        .collect();
    Beregning::new(periode, maaneder).unwrap()
}

fn oppfylt(vilkar: Inngangsvilkar, fra: Maaned) -> Vilkarsvurdering {
    Vilkarsvurdering {
        vilkar,
        vurdering: Vurdering::Oppfylt,
        gjelder_fra: fra,
    }
}

fn ikke_oppfylt(vilkar: Inngangsvilkar, fra: Maaned) -> Vilkarsvurdering {
    Vilkarsvurdering {
        vilkar,
        vurdering: Vurdering::IkkeOppfylt,
        gjelder_fra: fra,
    }
}

struct Oppsett {
    periode: Periode,
    vilkar: Vec<Vilkarsvurdering>,
    grunnlag: Grunnlag,
    utestaaende: UtestaaendeAvkorting,
}

impl Oppsett {
    fn innvilget(periode: Periode) -> Self {
        Self {
            periode,
            vilkar: vec![oppfylt(Inngangsvilkar::Uforhet, periode.fra_og_med())],
            grunnlag: Grunnlag {
                forventet_inntekt: 0,
                fradrag: vec![],
                bosituasjon: Bosituasjon::Enslig,
            },
            utestaaende: UtestaaendeAvkorting::Ingen,
        }
    }

    fn opprett(self) -> Revurdering {
        Revurdering::opprett(
            NyRevurdering {
                tidligere_vedtak: VedtakId::new(),
                periode: self.periode,
                aarsak: Revurderingsaarsak {
                    aarsak: Aarsak::MeldingFraBruker,
                    begrunnelse: "endring meldt".to_string(),
                },
                saksbehandler: Saksbehandler::new("Z990297").unwrap(),
                grunnlag: self.grunnlag,
                vilkarsvurderinger: Vilkarsvurderinger::new(self.vilkar).unwrap(),
                gjeldende_beregning: gjeldende_beregning(self.periode),
                utestaaende_avkorting: self.utestaaende,
            },
            &clock_i(1),
        )
    }
}

fn attestant() -> Attestant {
    Attestant::new("Z111111").unwrap()
}

fn til_vilkar_oppdatert(sak: Revurdering) -> Revurdering {
    sak.oppdater_grunnlag(GrunnlagPatch::default(), vec![]).unwrap()
}

// ---------------------------------------------------------------------------
// Scenario A: fully eligible, amounts above the floor.
// ---------------------------------------------------------------------------

#[test]
fn scenario_a_fully_eligible_calculation_is_approved() {
    let sak = til_vilkar_oppdatert(Oppsett::innvilget(p(1, 6)).opprett());
    let beregnet = sak.beregn(&TestBeregner, &clock_i(1)).unwrap();
    assert_eq!(beregnet.state(), RevurderingState::BeregnetInnvilget);
    assert!(beregnet
        .beregning()
        .unwrap()
        .maaneder()
        .iter()
        .all(|mb| mb.belop == SATS));
    assert!(beregnet.opphor().is_none());
}

// ---------------------------------------------------------------------------
// Scenario B: termination from unauthorized foreign residence with an
// over-payment collected through a clawback warning.
// ---------------------------------------------------------------------------

#[test]
fn scenario_b_foreign_residence_termination_raises_clawback_and_attests() {
    let mut oppsett = Oppsett::innvilget(p(3, 6));
    oppsett.vilkar = vec![ikke_oppfylt(Inngangsvilkar::Utenlandsopphold, m(3))];
    let sak = til_vilkar_oppdatert(oppsett.opprett());

    let beregnet = sak.beregn(&TestBeregner, &clock_i(3)).unwrap();
    assert_eq!(beregnet.state(), RevurderingState::BeregnetOpphort);

    // March was already disbursed when the termination is simulated.
    let simulator = TestSimulator::med_utbetalinger(vec![(m(3), SATS)]);
    let simulert = beregnet.simuler(&simulator).unwrap();
    assert_eq!(simulert.state(), RevurderingState::SimulertOpphort);

    match simulert.avkorting().unwrap() {
        AvkortingVedRevurdering::OpprettNyttVarsel { varsel, annullert } => {
            assert_eq!(varsel.periode, p(4, 6));
            assert_eq!(varsel.belop, SATS);
            assert!(annullert.is_none());
        }
        other => panic!("expected a new clawback warning, got {other:?}"),
    }
    assert_eq!(
        simulert.tilbakekrevingsbehov().unwrap(),
        Tilbakekrevingsbehov::IkkeBehov
    );

    let iverksatt = simulert
        .velg_brevvalg(Brevvalg::SendBrev {
            fritekst: Some("ytelsen opphører på grunn av utenlandsopphold".to_string()),
        })
        .unwrap()
        .til_attestering()
        .unwrap()
        .attester(attestant(), Attesteringsbeslutning::Iverksett, &clock_i(3))
        .unwrap();
    assert_eq!(iverksatt.state(), RevurderingState::IverksattOpphort);
    assert_eq!(iverksatt.attesteringer().len(), 1);
}

#[test]
fn scenario_b_mid_period_termination_is_refused_attestation() {
    let mut oppsett = Oppsett::innvilget(p(1, 6));
    oppsett.vilkar = vec![ikke_oppfylt(Inngangsvilkar::Utenlandsopphold, m(3))];
    let simulert = til_vilkar_oppdatert(oppsett.opprett())
        .beregn(&TestBeregner, &clock_i(1))
        .unwrap()
        .simuler(&TestSimulator::ingen_utbetalinger())
        .unwrap()
        .velg_brevvalg(Brevvalg::IkkeSendBrev)
        .unwrap();

    match simulert.til_attestering() {
        Err(TilAttesteringError::UtfallStottesIkke { utfall }) => {
            assert!(utfall.contains(&UtfallSomIkkeStottes::OpphorErIkkeFraForsteMaaned));
        }
        other => panic!("expected unsupported outcome, got {other:?}"),
    }
}

// ---------------------------------------------------------------------------
// Scenario C: two independent failing criteria.
// ---------------------------------------------------------------------------

#[test]
fn scenario_c_multiple_failing_criteria_are_refused_attestation() {
    let mut oppsett = Oppsett::innvilget(p(1, 6));
    oppsett.vilkar = vec![
        ikke_oppfylt(Inngangsvilkar::Utenlandsopphold, m(1)),
        ikke_oppfylt(Inngangsvilkar::Formue, m(1)),
    ];
    let beregnet = til_vilkar_oppdatert(oppsett.opprett())
        .beregn(&TestBeregner, &clock_i(1))
        .unwrap();
    assert_eq!(beregnet.opphor().unwrap().grunner().len(), 2);

    let simulert = beregnet
        .simuler(&TestSimulator::ingen_utbetalinger())
        .unwrap()
        .velg_brevvalg(Brevvalg::IkkeSendBrev)
        .unwrap();
    match simulert.til_attestering() {
        Err(TilAttesteringError::UtfallStottesIkke { utfall }) => {
            assert!(utfall.contains(&UtfallSomIkkeStottes::OpphorAvFlereVilkar));
        }
        other => panic!("expected unsupported outcome, got {other:?}"),
    }
}

// ---------------------------------------------------------------------------
// Scenario D: a stale clawback warning is annulled by a clean outcome.
// ---------------------------------------------------------------------------

#[test]
fn scenario_d_clean_outcome_annuls_a_stale_clawback_warning() {
    let forrige = Avkortingsvarsel::ny(p(1, 2), 3000);
    let mut oppsett = Oppsett::innvilget(p(1, 6));
    oppsett.utestaaende = UtestaaendeAvkorting::Utestaaende(forrige.clone());

    let simulert = til_vilkar_oppdatert(oppsett.opprett())
        .beregn(&TestBeregner, &clock_i(1))
        .unwrap()
        .simuler(&TestSimulator::ingen_utbetalinger())
        .unwrap();

    assert_eq!(simulert.state(), RevurderingState::SimulertInnvilget);
    let avkorting = simulert.avkorting().unwrap();
    assert_eq!(
        avkorting,
        &AvkortingVedRevurdering::AnnullerUtestaaende { annullert: forrige }
    );
    assert!(!avkorting.har_utestaaende());
}

// ---------------------------------------------------------------------------
// Maker-checker and attestation history.
// ---------------------------------------------------------------------------

fn til_attestering_innvilget() -> Revurdering {
    til_vilkar_oppdatert(Oppsett::innvilget(p(1, 6)).opprett())
        .beregn(&TestBeregner, &clock_i(1))
        .unwrap()
        .simuler(&TestSimulator::ingen_utbetalinger())
        .unwrap()
        .velg_brevvalg(Brevvalg::IkkeSendBrev)
        .unwrap()
        .til_attestering()
        .unwrap()
}

#[test]
fn the_preparing_caseworker_cannot_attest_their_own_case() {
    let selv = Attestant::new("Z990297").unwrap();
    for beslutning in [
        Attesteringsbeslutning::Iverksett,
        Attesteringsbeslutning::Underkjenn {
            grunn: Underkjennelsesgrunn::AndreForhold,
            kommentar: "inhabil".to_string(),
        },
    ] {
        let result = til_attestering_innvilget().attester(selv.clone(), beslutning, &clock_i(2));
        assert_eq!(
            result.unwrap_err(),
            AttesterError::AttestantOgSaksbehandlerErSammePerson
        );
    }
}

#[test]
fn a_rejected_case_keeps_its_work_and_its_history() {
    let underkjent = til_attestering_innvilget()
        .attester(
            attestant(),
            Attesteringsbeslutning::Underkjenn {
                grunn: Underkjennelsesgrunn::BeregningenErFeil,
                kommentar: "feil fradrag".to_string(),
            },
            &clock_i(2),
        )
        .unwrap();

    assert_eq!(underkjent.state(), RevurderingState::Underkjent);
    assert!(underkjent.beregning().is_some());
    assert_eq!(underkjent.attesteringer().len(), 1);
    assert!(!underkjent.attesteringer().siste().unwrap().er_iverksatt());

    // Rework and approve; the rejection stays in the ledger.
    let iverksatt = underkjent
        .beregn(&TestBeregner, &clock_i(2))
        .unwrap()
        .simuler(&TestSimulator::ingen_utbetalinger())
        .unwrap()
        .velg_brevvalg(Brevvalg::IkkeSendBrev)
        .unwrap()
        .til_attestering()
        .unwrap()
        .attester(attestant(), Attesteringsbeslutning::Iverksett, &clock_i(2))
        .unwrap();
    assert_eq!(iverksatt.state(), RevurderingState::IverksattInnvilget);
    assert_eq!(iverksatt.attesteringer().len(), 2);
    assert!(iverksatt.attesteringer().siste().unwrap().er_iverksatt());
}

#[test]
fn a_rejected_case_can_be_resimulated_without_recalculating() {
    let underkjent = til_attestering_innvilget()
        .attester(
            attestant(),
            Attesteringsbeslutning::Underkjenn {
                grunn: Underkjennelsesgrunn::VedtaksbrevetErFeil,
                kommentar: "nytt brev".to_string(),
            },
            &clock_i(2),
        )
        .unwrap();
    assert!(underkjent.beregning().is_some());

    // The calculation survives the rejection, so simulation picks it up
    // directly.
    let simulert = underkjent
        .simuler(&TestSimulator::ingen_utbetalinger())
        .unwrap();
    assert_eq!(simulert.state(), RevurderingState::SimulertInnvilget);

    let iverksatt = simulert
        .velg_brevvalg(Brevvalg::SendBrev {
            fritekst: Some("korrigert brev".to_string()),
        })
        .unwrap()
        .til_attestering()
        .unwrap()
        .attester(attestant(), Attesteringsbeslutning::Iverksett, &clock_i(2))
        .unwrap();
    assert_eq!(iverksatt.state(), RevurderingState::IverksattInnvilget);
    assert_eq!(iverksatt.attesteringer().len(), 2);
}

#[test]
fn attestation_requires_a_committed_letter_choice() {
    let simulert = til_vilkar_oppdatert(Oppsett::innvilget(p(1, 6)).opprett())
        .beregn(&TestBeregner, &clock_i(1))
        .unwrap()
        .simuler(&TestSimulator::ingen_utbetalinger())
        .unwrap();
    assert_eq!(
        simulert.til_attestering().unwrap_err(),
        TilAttesteringError::BrevvalgMangler
    );
}

// ---------------------------------------------------------------------------
// Terminal states and transition guards.
// ---------------------------------------------------------------------------

#[test]
fn an_executed_case_rejects_every_operation() {
    let iverksatt = til_attestering_innvilget()
        .attester(attestant(), Attesteringsbeslutning::Iverksett, &clock_i(2))
        .unwrap();
    assert!(!iverksatt.er_apen());

    assert!(iverksatt
        .clone()
        .oppdater_grunnlag(GrunnlagPatch::default(), vec![])
        .is_err());
    assert!(iverksatt.clone().beregn(&TestBeregner, &clock_i(2)).is_err());
    assert!(iverksatt
        .clone()
        .simuler(&TestSimulator::ingen_utbetalinger())
        .is_err());
    assert!(iverksatt.clone().velg_brevvalg(Brevvalg::IkkeSendBrev).is_err());
    assert!(iverksatt.clone().til_attestering().is_err());
    assert!(iverksatt
        .clone()
        .attester(attestant(), Attesteringsbeslutning::Iverksett, &clock_i(2))
        .is_err());
    assert_eq!(
        iverksatt.avslutt("angrer".to_string(), &clock_i(2)).unwrap_err(),
        AvsluttError::ErIverksatt
    );
}

#[test]
fn a_case_pending_attestation_cannot_be_abandoned() {
    let result = til_attestering_innvilget().avslutt("trekkes".to_string(), &clock_i(2));
    assert_eq!(result.unwrap_err(), AvsluttError::ErTilAttestering);
}

// ---------------------------------------------------------------------------
// Calculation guards.
// ---------------------------------------------------------------------------

#[test]
fn unconcluded_criteria_block_calculation() {
    let mut oppsett = Oppsett::innvilget(p(1, 6));
    oppsett.vilkar = vec![Vilkarsvurdering {
        vilkar: Inngangsvilkar::Formue,
        vurdering: Vurdering::Uavklart,
        gjelder_fra: m(1),
    }];
    let result = til_vilkar_oppdatert(oppsett.opprett()).beregn(&TestBeregner, &clock_i(1));
    assert_eq!(
        result.unwrap_err(),
        BeregnError::VilkarsvurderingUavklart {
            vilkar: vec![Inngangsvilkar::Formue],
        }
    );
}

#[test]
fn terminating_over_planned_clawback_instalments_is_blocked() {
    let mut oppsett = Oppsett::innvilget(p(1, 6));
    // Income pushes every month to zero while clawback instalments are
    // still being collected in the calculation.
    oppsett.grunnlag = Grunnlag {
        forventet_inntekt: 10_000,
        fradrag: vec![Fradrag {
            fradragstype: Fradragstype::AvkortingUtenlandsopphold,
            maanedsbelop: 1000,
            periode: p(1, 6),
        }],
        bosituasjon: Bosituasjon::Enslig,
    };
    let result = til_vilkar_oppdatert(oppsett.opprett()).beregn(&TestBeregner, &clock_i(1));
    assert_eq!(
        result.unwrap_err(),
        BeregnError::OpphorAvYtelseSomSkalAvkortes
    );
}

#[test]
fn income_pushing_every_month_to_zero_terminates_from_period_start() {
    let mut oppsett = Oppsett::innvilget(p(1, 6));
    oppsett.grunnlag.forventet_inntekt = 10_000;
    let beregnet = til_vilkar_oppdatert(oppsett.opprett())
        .beregn(&TestBeregner, &clock_i(4))
        .unwrap();
    assert_eq!(beregnet.state(), RevurderingState::BeregnetOpphort);
    assert_eq!(beregnet.opphor().unwrap().fra_og_med(), m(1));
}

// ---------------------------------------------------------------------------
// Purity / idempotence.
// ---------------------------------------------------------------------------

#[test]
fn operations_are_idempotent_for_identical_inputs() {
    let sak = til_vilkar_oppdatert(Oppsett::innvilget(p(1, 6)).opprett());

    let en = sak.clone().beregn(&TestBeregner, &clock_i(1)).unwrap();
    let to = sak.clone().beregn(&TestBeregner, &clock_i(1)).unwrap();
    assert_eq!(en, to);

    let patch = GrunnlagPatch {
        forventet_inntekt: Some(2000),
        ..Default::default()
    };
    let a = sak.clone().oppdater_grunnlag(patch.clone(), vec![]).unwrap();
    let b = sak.oppdater_grunnlag(patch, vec![]).unwrap();
    assert_eq!(a, b);

    let simulator = TestSimulator::ingen_utbetalinger();
    let sim_en = en.clone().simuler(&simulator).unwrap();
    let sim_to = to.simuler(&simulator).unwrap();
    assert_eq!(sim_en, sim_to);
}
