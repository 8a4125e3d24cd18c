use std::collections::{BTreeMap, BTreeSet};

use crate::models::{
    MedicationChangeKind, MedicationEntry, MedicationIntake, Snapshot, SymptomEntry, SymptomReport,
};

use super::knowledge::ScoringRules;
use super::types::{Features, MedicationChange};

/// Number of indicators behind the confidence score.
pub const CONFIDENCE_INDICATORS: u32 = 8;

/// History longer than this counts as "has history" for confidence.
const MIN_HISTORY_FOR_CONFIDENCE: usize = 2;

/// Relative slack when comparing a dose against the increase ratio.
const DOSE_RATIO_EPSILON: f64 = 1e-9;

/// Build the canonical feature set for one snapshot.
pub fn extract_features(
    snapshot: &Snapshot,
    history: &[Snapshot],
    scoring: &ScoringRules,
) -> Features {
    let previous = history.last();
    if let Some(previous) = previous {
        check_chronology(snapshot, previous);
    }

    let medications = normalize_medications(&snapshot.medications);
    let symptoms = normalize_symptoms(&snapshot.symptoms, scoring.default_severity);
    let symptom_ids: BTreeSet<String> = symptoms.iter().map(|s| s.id.clone()).collect();

    let height = positive(snapshot.height);
    let weight = positive(snapshot.weight);
    let bmi = match (weight, height) {
        (Some(w), Some(h)) => Some(w / (h / 100.0).powi(2)),
        _ => None,
    };
    let waist_to_height = match (positive(snapshot.waist), height) {
        (Some(waist), Some(h)) => Some(waist / h),
        _ => None,
    };

    let weight_delta = previous.and_then(|prev| match (weight, positive(prev.weight)) {
        (Some(current), Some(before)) => Some(current - before),
        _ => None,
    });
    let body_fat_delta = previous.and_then(|prev| match (snapshot.body_fat, prev.body_fat) {
        (Some(current), Some(before)) => Some(current - before),
        _ => None,
    });

    let recent_med_changes = previous
        .map(|prev| detect_recent_changes(&medications, prev, scoring.dose_increase_ratio))
        .unwrap_or_default();

    let mut features = Features {
        medications,
        symptoms,
        symptom_ids,
        bmi,
        waist: snapshot.waist,
        hips: snapshot.hips,
        neck: snapshot.neck,
        waist_to_height,
        estrogen: snapshot.estrogen(),
        testosterone: snapshot.testosterone(),
        libido: snapshot.libido,
        weight_delta,
        body_fat_delta,
        recent_med_changes,
        confidence: 0,
    };
    features.confidence = confidence(&features, snapshot, history.len());
    features
}

pub fn normalize_medications(entries: &[MedicationEntry]) -> Vec<MedicationIntake> {
    entries
        .iter()
        .filter_map(|entry| {
            let intake = entry.normalize();
            if intake.is_none() {
                tracing::debug!(entry = ?entry, "Dropped medication entry without id");
            }
            intake
        })
        .collect()
}

pub fn normalize_symptoms(entries: &[SymptomEntry], default_severity: f64) -> Vec<SymptomReport> {
    entries
        .iter()
        .filter_map(|entry| {
            let report = entry.normalize(default_severity);
            if report.is_none() {
                tracing::debug!(entry = ?entry, "Dropped symptom entry without id");
            }
            report
        })
        .collect()
}

/// Tag each current medication that is new or dosed up since `previous`.
pub fn detect_recent_changes(
    current: &[MedicationIntake],
    previous: &Snapshot,
    increase_ratio: f64,
) -> BTreeMap<String, MedicationChange> {
    // later duplicates overwrite earlier ones
    let before: BTreeMap<String, Option<f64>> = previous
        .medications
        .iter()
        .filter_map(MedicationEntry::normalize)
        .map(|m| (m.id, m.dose))
        .collect();

    let mut changes = BTreeMap::new();
    for intake in current {
        let kind = match before.get(&intake.id) {
            None => Some(MedicationChangeKind::New),
            Some(prev_dose) => match (intake.dose, *prev_dose) {
                (Some(now), Some(prev)) if is_dose_increase(now, prev, increase_ratio) => {
                    Some(MedicationChangeKind::Increased)
                }
                _ => None,
            },
        };
        if let Some(kind) = kind {
            changes.insert(intake.id.clone(), MedicationChange { kind });
        }
    }
    changes
}

fn is_dose_increase(now: f64, prev: f64, ratio: f64) -> bool {
    let cutoff = prev * ratio;
    now > prev && now >= cutoff - cutoff.abs() * DOSE_RATIO_EPSILON
}

fn confidence(features: &Features, snapshot: &Snapshot, history_len: usize) -> u8 {
    let filled = [
        features.bmi.is_some(),
        features.estrogen.is_some(),
        features.testosterone.is_some(),
        features.waist.is_some(),
        !features.medications.is_empty(),
        !features.symptoms.is_empty(),
        history_len > MIN_HISTORY_FOR_CONFIDENCE,
        snapshot.has_date(),
    ]
    .into_iter()
    .filter(|filled| *filled)
    .count() as u32;

    (100.0 * f64::from(filled) / f64::from(CONFIDENCE_INDICATORS)).round() as u8
}

fn check_chronology(snapshot: &Snapshot, previous: &Snapshot) {
    if let (Some(current), Some(before)) = (snapshot.measured_on(), previous.measured_on()) {
        if before > current {
            tracing::warn!(
                snapshot_date = %current,
                history_date = %before,
                "Last history entry is newer than the snapshot"
            );
        }
    }
}

fn positive(value: Option<f64>) -> Option<f64> {
    value.filter(|v| *v > 0.0)
}
