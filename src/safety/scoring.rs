//! Per-domain additive risk scoring.
//!
//! Contributions are applied in a fixed order (medication, symptom, body
//! composition, trend) and the running total is clamped after every
//! addition, so a large negative or positive step cannot be undone by a
//! later one.

use std::collections::BTreeMap;

use crate::models::{RiskDomain, TransitionMode};

use super::knowledge::{KnowledgeBase, ScoringRules};
use super::types::{DomainScores, Features, SCORE_CEILING, SCORE_FLOOR};

/// Running per-domain totals, clamped on every addition.
#[derive(Debug, Clone)]
pub struct ScoreAccumulator {
    totals: BTreeMap<RiskDomain, f64>,
}

impl Default for ScoreAccumulator {
    fn default() -> Self {
        Self::new()
    }
}

impl ScoreAccumulator {
    pub fn new() -> Self {
        Self {
            totals: RiskDomain::ALL.iter().map(|d| (*d, SCORE_FLOOR)).collect(),
        }
    }

    pub fn add(&mut self, domain: RiskDomain, amount: f64) {
        let total = self.totals.entry(domain).or_insert(SCORE_FLOOR);
        *total = (*total + amount).clamp(SCORE_FLOOR, SCORE_CEILING);
    }

    /// Each bonus of a table, in domain order.
    pub fn add_all(&mut self, bonuses: &BTreeMap<RiskDomain, f64>) {
        for (domain, amount) in bonuses {
            self.add(*domain, *amount);
        }
    }

    pub fn get(&self, domain: RiskDomain) -> f64 {
        self.totals.get(&domain).copied().unwrap_or(SCORE_FLOOR)
    }

    /// Round half away from zero.
    pub fn finish(self) -> DomainScores {
        DomainScores::from_rounded(
            self.totals
                .into_iter()
                .map(|(domain, total)| (domain, total.round() as u32))
                .collect(),
        )
    }
}

/// Score every domain from the extracted features.
pub fn score_domains(features: &Features, kb: &KnowledgeBase, mode: TransitionMode) -> DomainScores {
    let mut acc = ScoreAccumulator::new();
    add_medication_risk(&mut acc, features, kb);
    add_symptom_risk(&mut acc, features, kb);
    add_body_composition_risk(&mut acc, features, &kb.scoring, mode);
    add_trend_risk(&mut acc, features, &kb.scoring);
    acc.finish()
}

fn add_medication_risk(acc: &mut ScoreAccumulator, features: &Features, kb: &KnowledgeBase) {
    for intake in &features.medications {
        let recently_changed = features.recent_med_changes.contains_key(&intake.id);
        for rule in kb.drug_rules(&intake.id) {
            let mut contribution = rule.base_score;
            if rule.is_high_dose(intake.dose) {
                contribution += rule.high_dose_bonus.unwrap_or(0.0);
            }
            if recently_changed {
                contribution += rule.window_bonus;
            }
            acc.add(rule.domain, contribution);
        }
    }
}

fn add_symptom_risk(acc: &mut ScoreAccumulator, features: &Features, kb: &KnowledgeBase) {
    let anchor = kb.scoring.severity_anchor;
    for symptom in &features.symptoms {
        for (domain, entry) in kb.symptom_entries(&symptom.id) {
            acc.add(domain, entry.score * (symptom.severity / anchor));
        }
    }
}

fn add_body_composition_risk(
    acc: &mut ScoreAccumulator,
    features: &Features,
    scoring: &ScoringRules,
    mode: TransitionMode,
) {
    if let Some(tier) = features
        .bmi
        .and_then(|bmi| ScoringRules::matching_tier(&scoring.bmi, bmi))
    {
        acc.add_all(&tier.bonuses);
    }

    if let Some(tier) = features
        .waist_to_height
        .and_then(|ratio| ScoringRules::matching_tier(&scoring.waist_to_height, ratio))
    {
        acc.add_all(&tier.bonuses);
    }

    if let (Some(neck), Some(cutoff)) = (features.neck, scoring.neck.thresholds.get(&mode)) {
        if neck > *cutoff {
            acc.add_all(&scoring.neck.bonuses);
        }
    }
}

fn add_trend_risk(acc: &mut ScoreAccumulator, features: &Features, scoring: &ScoringRules) {
    if features
        .weight_delta
        .is_some_and(|gain| gain > scoring.weight_gain.min_kg)
    {
        acc.add_all(&scoring.weight_gain.bonuses);
    }
}
