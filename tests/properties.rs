//! Property-based checks of the assessment invariants.

use std::collections::HashSet;

use proptest::prelude::*;

use hrt_safety::config::EngineSettings;
use hrt_safety::models::{
    AlertLevel, MedicationEntry, MedicationRecord, RiskDomain, Snapshot, SymptomEntry,
    SymptomRecord, TransitionMode,
};
use hrt_safety::safety::{DefaultSafetyEngine, SafetyAssessor};

const MEDICATIONS: &[&str] = &[
    "estradiol_valerate",
    "estradiol_gel",
    "spironolactone",
    "bicalutamide",
    "cyproterone_acetate",
    "testosterone_enanthate",
    "testosterone_gel",
    "anadrol",
    "finasteride",
    "unknown_med",
];

const SYMPTOMS: &[&str] = &[
    "dvt_symptoms",
    "chest_pain",
    "palpitations",
    "headache",
    "jaundice",
    "snoring",
    "depression",
    "self_harm",
    "fatigue",
    "unknown_symptom",
];

fn engine(mode: TransitionMode) -> DefaultSafetyEngine {
    DefaultSafetyEngine::bundled(EngineSettings::new("en", mode)).unwrap()
}

fn medication() -> impl Strategy<Value = MedicationEntry> {
    (
        prop::sample::select(MEDICATIONS),
        prop::option::of(0.0f64..2000.0),
    )
        .prop_map(|(id, dose)| {
            MedicationEntry::Record(MedicationRecord {
                id: Some(id.to_string()),
                dose,
                ..Default::default()
            })
        })
}

fn symptom() -> impl Strategy<Value = SymptomEntry> {
    (prop::sample::select(SYMPTOMS), prop::option::of(-2.0f64..9.0)).prop_map(
        |(id, severity)| {
            SymptomEntry::Record(SymptomRecord {
                id: Some(id.to_string()),
                symptom_id: None,
                severity,
            })
        },
    )
}

fn snapshot() -> impl Strategy<Value = Snapshot> {
    (
        prop::option::of(120.0f64..210.0),
        prop::option::of(35.0f64..200.0),
        prop::option::of(50.0f64..160.0),
        prop::option::of(25.0f64..55.0),
        prop::collection::vec(medication(), 0..6),
        prop::collection::vec(symptom(), 0..6),
    )
        .prop_map(|(height, weight, waist, neck, medications, symptoms)| Snapshot {
            height,
            weight,
            waist,
            neck,
            medications,
            symptoms,
            ..Default::default()
        })
}

fn mode() -> impl Strategy<Value = TransitionMode> {
    prop::sample::select(TransitionMode::ALL)
}

proptest! {
    #[test]
    fn scores_and_confidence_stay_bounded(
        current in snapshot(),
        history in prop::collection::vec(snapshot(), 0..4),
        mode in mode(),
    ) {
        let report = engine(mode).run_safety_assessment(Some(&current), &history);
        for (_, score) in report.domain_scores.iter() {
            prop_assert!(score <= 100);
        }
        prop_assert!(report.confidence <= 100);
        prop_assert!(!report.disclaimer.is_empty());
        for alert in &report.alerts {
            prop_assert!(alert.score > 0);
            prop_assert!(alert.is_not_diagnosis);
        }
    }

    #[test]
    fn identical_inputs_serialize_identically(
        current in snapshot(),
        history in prop::collection::vec(snapshot(), 0..3),
    ) {
        let engine = engine(TransitionMode::Mtf);
        let first = serde_json::to_string(&engine.run_safety_assessment(Some(&current), &history)).unwrap();
        let second = serde_json::to_string(&engine.run_safety_assessment(Some(&current), &history)).unwrap();
        prop_assert_eq!(first, second);
    }

    #[test]
    fn recommended_test_names_are_unique(current in snapshot()) {
        let report = engine(TransitionMode::Mtf).run_safety_assessment(Some(&current), &[]);
        let names: HashSet<_> = report.recommended_tests.iter().map(|t| t.name.as_str()).collect();
        prop_assert_eq!(names.len(), report.recommended_tests.len());
        for test in &report.recommended_tests {
            prop_assert!(report.domain_scores.get(test.domain) >= 15);
        }
    }

    #[test]
    fn alerts_sorted_most_severe_first(current in snapshot()) {
        let report = engine(TransitionMode::Mtf).run_safety_assessment(Some(&current), &[]);
        for pair in report.alerts.windows(2) {
            let (a, b) = (&pair[0], &pair[1]);
            prop_assert!(
                a.level > b.level || (a.level == b.level && a.score >= b.score)
            );
        }
    }

    #[test]
    fn raising_dose_past_threshold_never_lowers_score(
        base in snapshot(),
        med_index in 0usize..MEDICATIONS.len(),
        low in 0.0f64..1.0,
    ) {
        let id = MEDICATIONS[med_index];
        let engine = engine(TransitionMode::Mtf);
        let rules = engine.knowledge().drug_rules(id).to_vec();

        let with_dose = |dose: f64| {
            let mut snapshot = base.clone();
            snapshot.medications.push(MedicationEntry::Record(MedicationRecord {
                id: Some(id.to_string()),
                dose: Some(dose),
                ..Default::default()
            }));
            engine.run_safety_assessment(Some(&snapshot), &[])
        };

        let below = with_dose(low);
        let above = with_dose(5000.0);
        for rule in rules {
            prop_assert!(
                above.domain_scores.get(rule.domain) >= below.domain_scores.get(rule.domain)
            );
        }
    }
}

#[test]
fn critical_symptom_forces_critical_for_every_domain() {
    let engine = engine(TransitionMode::Mtf);
    for (symptom_id, entries) in &engine.knowledge().symptom_risks {
        for (domain, entry) in entries.iter().filter(|(_, e)| e.critical) {
            let snapshot = Snapshot {
                symptoms: vec![SymptomEntry::Record(SymptomRecord {
                    id: Some(symptom_id.clone()),
                    symptom_id: None,
                    severity: Some(1.0),
                })],
                ..Default::default()
            };
            let report = engine.run_safety_assessment(Some(&snapshot), &[]);
            let alert = report
                .alerts
                .iter()
                .find(|a| a.domain == *domain)
                .unwrap_or_else(|| panic!("{symptom_id} should alert on {domain}"));
            assert_eq!(alert.level, AlertLevel::Critical, "{symptom_id} / {domain}");
            assert!(entry.score > 0.0);
        }
    }
}

#[test]
fn every_domain_has_a_label() {
    let engine = engine(TransitionMode::Mtf);
    for domain in RiskDomain::ALL {
        assert_ne!(engine.domain_label(*domain), domain.as_str());
        assert!(!engine.domain_short_label(*domain).is_empty());
    }
}
