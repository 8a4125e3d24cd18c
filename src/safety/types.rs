use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::models::{
    AlertLevel, EducationKind, InvalidEnumValue, MedicationChangeKind, MedicationIntake,
    RiskDomain, Snapshot, SymptomReport,
};

/// Lower and upper bound of every domain score.
pub const SCORE_FLOOR: f64 = 0.0;
pub const SCORE_CEILING: f64 = 100.0;

// ---------------------------------------------------------------------------
// Features
// ---------------------------------------------------------------------------

/// Canonical view of one snapshot plus what could be derived from history.
#[derive(Debug, Clone, Default, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Features {
    pub medications: Vec<MedicationIntake>,
    pub symptoms: Vec<SymptomReport>,
    pub symptom_ids: BTreeSet<String>,
    pub bmi: Option<f64>,
    pub waist: Option<f64>,
    pub hips: Option<f64>,
    pub neck: Option<f64>,
    pub waist_to_height: Option<f64>,
    pub estrogen: Option<f64>,
    pub testosterone: Option<f64>,
    pub libido: Option<f64>,
    /// Against the last history entry; absent without history.
    pub weight_delta: Option<f64>,
    pub body_fat_delta: Option<f64>,
    pub recent_med_changes: BTreeMap<String, MedicationChange>,
    /// Completeness, 0..=100.
    pub confidence: u8,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct MedicationChange {
    #[serde(rename = "type")]
    pub kind: MedicationChangeKind,
}

// ---------------------------------------------------------------------------
// DomainScores
// ---------------------------------------------------------------------------

/// One rounded score per risk domain, each within 0..=100.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(transparent)]
pub struct DomainScores(BTreeMap<RiskDomain, u32>);

/// Highest-scoring domain of an assessment.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct TopRisk {
    pub domain: RiskDomain,
    pub score: u32,
}

impl DomainScores {
    /// Every domain at zero.
    pub fn zeroed() -> Self {
        Self(RiskDomain::ALL.iter().map(|d| (*d, 0)).collect())
    }

    pub(crate) fn from_rounded(scores: BTreeMap<RiskDomain, u32>) -> Self {
        let mut total = Self::zeroed();
        total.0.extend(scores);
        total
    }

    pub fn get(&self, domain: RiskDomain) -> u32 {
        self.0.get(&domain).copied().unwrap_or(0)
    }

    /// In domain declaration order.
    pub fn iter(&self) -> impl Iterator<Item = (RiskDomain, u32)> + '_ {
        self.0.iter().map(|(d, s)| (*d, *s))
    }

    /// Non-zero domains, highest first; equal scores keep declaration order.
    pub fn ranked(&self) -> Vec<(RiskDomain, u32)> {
        let mut ranked: Vec<_> = self.iter().filter(|(_, s)| *s > 0).collect();
        ranked.sort_by(|a, b| b.1.cmp(&a.1));
        ranked
    }

    pub fn top_risk(&self) -> Option<TopRisk> {
        self.ranked()
            .first()
            .map(|(domain, score)| TopRisk {
                domain: *domain,
                score: *score,
            })
    }

    pub fn is_all_zero(&self) -> bool {
        self.0.values().all(|s| *s == 0)
    }
}

// ---------------------------------------------------------------------------
// Report items
// ---------------------------------------------------------------------------

/// A leveled, localized observation for one risk domain.
/// Never a diagnosis: `is_not_diagnosis` is always true.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Alert {
    pub domain: RiskDomain,
    pub level: AlertLevel,
    pub score: u32,
    pub title: String,
    pub message: String,
    pub triggered_medication_ids: Vec<String>,
    pub triggered_symptom_ids: Vec<String>,
    pub is_not_diagnosis: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct RecommendedTest {
    pub domain: RiskDomain,
    pub domain_label: String,
    pub name: String,
    /// Level of the owning domain's score.
    pub priority: AlertLevel,
    /// Priority hint carried by the test catalog.
    pub catalog_priority: AlertLevel,
    pub urgency: Option<String>,
    pub reason: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct EducationPoint {
    pub kind: EducationKind,
    pub icon: String,
    pub text: String,
}

/// Everything one assessment produces. Immutable once built.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SafetyReport {
    pub alerts: Vec<Alert>,
    pub domain_scores: DomainScores,
    pub recommended_tests: Vec<RecommendedTest>,
    pub education_points: Vec<EducationPoint>,
    pub disclaimer: String,
    pub confidence: u8,
}

impl SafetyReport {
    pub fn top_risk(&self) -> Option<TopRisk> {
        self.domain_scores.top_risk()
    }

    pub fn critical_alerts(&self) -> impl Iterator<Item = &Alert> {
        self.alerts
            .iter()
            .filter(|a| a.level == AlertLevel::Critical)
    }
}

// ---------------------------------------------------------------------------
// SafetyError
// ---------------------------------------------------------------------------

/// Construction-time failures. Assessment itself never fails.
#[derive(Error, Debug)]
pub enum SafetyError {
    #[error("Knowledge base load failed ({0}): {1}")]
    KnowledgeBaseLoad(String, String),

    #[error("Knowledge base parse failed ({0}): {1}")]
    KnowledgeBaseParse(String, String),

    #[error("Knowledge base table '{table}' has no entry for domain '{domain}'")]
    IncompleteTable {
        table: &'static str,
        domain: RiskDomain,
    },

    #[error("Threshold for '{0}' has warning above critical")]
    InvalidThreshold(RiskDomain),

    #[error("Knowledge base has no disclaimer for locale '{0}'")]
    MissingDisclaimer(String),

    #[error("Invalid scoring parameter {0}: {1}")]
    InvalidParameter(&'static str, f64),

    #[error(transparent)]
    InvalidEnum(#[from] InvalidEnumValue),
}

// ---------------------------------------------------------------------------
// SafetyAssessor trait
// ---------------------------------------------------------------------------

/// The main safety assessment trait.
pub trait SafetyAssessor {
    /// Score the snapshot against its history. An absent snapshot yields the
    /// empty report.
    fn run_safety_assessment(
        &self,
        snapshot: Option<&Snapshot>,
        history: &[Snapshot],
    ) -> SafetyReport;

    /// Localized domain title.
    fn domain_label(&self, domain: RiskDomain) -> String;

    /// Localized short domain label.
    fn domain_short_label(&self, domain: RiskDomain) -> String;
}
