use crate::models::{AlertLevel, RiskDomain};

use super::knowledge::KnowledgeBase;
use super::locale::Localizer;
use super::types::{Alert, DomainScores, Features};

/// Threshold level of `score` for `domain`. Domains without a threshold
/// stay at `Info`.
pub fn classify_level(kb: &KnowledgeBase, domain: RiskDomain, score: u32) -> AlertLevel {
    kb.threshold(domain)
        .map(|t| t.classify(f64::from(score)))
        .unwrap_or(AlertLevel::Info)
}

/// Whether any reported symptom alone forces `domain` to critical.
pub fn has_critical_symptom(kb: &KnowledgeBase, features: &Features, domain: RiskDomain) -> bool {
    features
        .symptom_ids
        .iter()
        .any(|id| kb.symptom_entry(id, domain).is_some_and(|e| e.critical))
}

/// One alert per scored domain, most severe first.
pub fn build_alerts(
    features: &Features,
    scores: &DomainScores,
    kb: &KnowledgeBase,
    loc: &Localizer<'_>,
) -> Vec<Alert> {
    let mut alerts: Vec<Alert> = scores
        .iter()
        .filter(|(_, score)| *score > 0)
        .map(|(domain, score)| {
            let level = if has_critical_symptom(kb, features, domain) {
                AlertLevel::Critical
            } else {
                classify_level(kb, domain, score)
            };
            build_alert(features, kb, loc, domain, level, score)
        })
        .collect();

    alerts.sort_by(|a, b| {
        a.level
            .rank()
            .cmp(&b.level.rank())
            .then_with(|| b.score.cmp(&a.score))
    });
    alerts
}

fn build_alert(
    features: &Features,
    kb: &KnowledgeBase,
    loc: &Localizer<'_>,
    domain: RiskDomain,
    level: AlertLevel,
    score: u32,
) -> Alert {
    let text = kb.domain_text(domain);
    let title = text
        .and_then(|t| loc.try_text(&t.label.title))
        .unwrap_or_else(|| domain.to_string());
    let message = text
        .map(|t| loc.text(t.messages.for_level(level)))
        .unwrap_or_default();

    let triggered_medication_ids = features
        .medications
        .iter()
        .filter(|m| kb.drug_affects(&m.id, domain))
        .map(|m| m.id.clone())
        .collect();
    let triggered_symptom_ids = features
        .symptoms
        .iter()
        .filter(|s| kb.symptom_entry(&s.id, domain).is_some())
        .map(|s| s.id.clone())
        .collect();

    Alert {
        domain,
        level,
        score,
        title,
        message,
        triggered_medication_ids,
        triggered_symptom_ids,
        is_not_diagnosis: true,
    }
}
