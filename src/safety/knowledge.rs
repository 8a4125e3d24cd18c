use std::collections::BTreeMap;
use std::path::Path;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::models::{AlertLevel, EducationKind, RiskDomain, TransitionMode};

use super::locale::LocalizedText;
use super::types::SafetyError;

pub const MANIFEST_FILE: &str = "manifest.json";
pub const DRUG_RULES_FILE: &str = "drug_risk_rules.json";
pub const SYMPTOM_RISK_FILE: &str = "symptom_risk.json";
pub const THRESHOLDS_FILE: &str = "domain_thresholds.json";
pub const TEST_CATALOG_FILE: &str = "test_catalog.json";
pub const DOMAIN_TEXT_FILE: &str = "domain_text.json";
pub const EDUCATION_FILE: &str = "education.json";
pub const SCORING_RULES_FILE: &str = "scoring_rules.json";

// ---------------------------------------------------------------------------
// Table entries
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Manifest {
    pub version: String,
    pub default_locale: String,
    #[serde(default)]
    pub locales: Vec<String>,
}

/// One medication → domain contribution.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct DrugRiskRule {
    pub domain: RiskDomain,
    pub base_score: f64,
    #[serde(default)]
    pub high_dose_threshold: Option<f64>,
    #[serde(default)]
    pub high_dose_bonus: Option<f64>,
    /// Carried for reference; recency uses the single-lookback change map.
    pub recent_window_days: u32,
    #[serde(default)]
    pub window_bonus: f64,
}

impl DrugRiskRule {
    /// Whether `dose` reaches the high-dose cutoff. Rules without a positive
    /// cutoff never do.
    pub fn is_high_dose(&self, dose: Option<f64>) -> bool {
        match (self.high_dose_threshold, dose) {
            (Some(threshold), Some(dose)) if threshold > 0.0 => dose >= threshold,
            _ => false,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct SymptomRiskEntry {
    pub score: f64,
    #[serde(default)]
    pub critical: bool,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct DomainThreshold {
    pub critical: f64,
    pub warning: f64,
}

impl DomainThreshold {
    pub fn classify(&self, score: f64) -> AlertLevel {
        if score >= self.critical {
            AlertLevel::Critical
        } else if score >= self.warning {
            AlertLevel::Warning
        } else {
            AlertLevel::Info
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TestCatalogEntry {
    pub name: LocalizedText,
    pub priority: AlertLevel,
    #[serde(default)]
    pub urgency: Option<LocalizedText>,
    pub reason: LocalizedText,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DomainLabel {
    pub title: LocalizedText,
    pub short: LocalizedText,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LevelMessages {
    pub critical: LocalizedText,
    pub warning: LocalizedText,
    pub info: LocalizedText,
}

impl LevelMessages {
    pub fn for_level(&self, level: AlertLevel) -> &LocalizedText {
        match level {
            AlertLevel::Critical => &self.critical,
            AlertLevel::Warning => &self.warning,
            AlertLevel::Info => &self.info,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DomainText {
    pub label: DomainLabel,
    pub messages: LevelMessages,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DomainTexts {
    pub disclaimer: LocalizedText,
    pub domains: BTreeMap<RiskDomain, DomainText>,
}

/// Which current medications trigger an education notice.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub enum MedicationPredicate {
    /// Any of these ids is present.
    AnyOf(Vec<String>),
    /// Some present id contains this fragment.
    IdContains(String),
}

impl MedicationPredicate {
    pub fn matches<'a>(&self, mut ids: impl Iterator<Item = &'a str>) -> bool {
        match self {
            Self::AnyOf(wanted) => ids.any(|id| wanted.iter().any(|w| w == id)),
            Self::IdContains(fragment) => ids.any(|id| id.contains(fragment.as_str())),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct EducationRule {
    pub kind: EducationKind,
    pub icon: String,
    pub trigger: MedicationPredicate,
    pub text: LocalizedText,
}

/// A value cutoff with per-domain bonuses.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ScoreTier {
    pub min: f64,
    pub bonuses: BTreeMap<RiskDomain, f64>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct NeckRule {
    /// Circumference (cm) that must be exceeded, per transition mode.
    pub thresholds: BTreeMap<TransitionMode, f64>,
    pub bonuses: BTreeMap<RiskDomain, f64>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct WeightGainRule {
    /// Gain (kg) that must be exceeded since the last entry.
    pub min_kg: f64,
    pub bonuses: BTreeMap<RiskDomain, f64>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ScoringRules {
    pub severity_anchor: f64,
    pub default_severity: f64,
    pub dose_increase_ratio: f64,
    pub recommendation_min_score: f64,
    /// Highest tier first after loading.
    pub bmi: Vec<ScoreTier>,
    pub waist_to_height: Vec<ScoreTier>,
    pub neck: NeckRule,
    pub weight_gain: WeightGainRule,
}

impl ScoringRules {
    /// First (highest) tier whose cutoff `value` reaches.
    pub fn matching_tier(tiers: &[ScoreTier], value: f64) -> Option<&ScoreTier> {
        tiers.iter().find(|tier| value >= tier.min)
    }

    fn sort_tiers(&mut self) {
        for tiers in [&mut self.bmi, &mut self.waist_to_height] {
            tiers.sort_by(|a, b| b.min.total_cmp(&a.min));
        }
    }
}

// ---------------------------------------------------------------------------
// KnowledgeBase
// ---------------------------------------------------------------------------

/// Static rule, threshold and text tables the engine consumes.
#[derive(Debug, Clone, PartialEq)]
pub struct KnowledgeBase {
    pub manifest: Manifest,
    pub drug_rules: BTreeMap<String, Vec<DrugRiskRule>>,
    pub symptom_risks: BTreeMap<String, BTreeMap<RiskDomain, SymptomRiskEntry>>,
    pub thresholds: BTreeMap<RiskDomain, DomainThreshold>,
    pub test_catalogs: BTreeMap<RiskDomain, Vec<TestCatalogEntry>>,
    pub texts: DomainTexts,
    pub education: Vec<EducationRule>,
    pub scoring: ScoringRules,
}

impl KnowledgeBase {
    /// Load the tables from a directory of JSON files.
    pub fn load(dir: &Path) -> Result<Self, SafetyError> {
        let kb = Self {
            manifest: read_table(dir, MANIFEST_FILE)?,
            drug_rules: read_table(dir, DRUG_RULES_FILE)?,
            symptom_risks: read_table(dir, SYMPTOM_RISK_FILE)?,
            thresholds: read_table(dir, THRESHOLDS_FILE)?,
            test_catalogs: read_table(dir, TEST_CATALOG_FILE)?,
            texts: read_table(dir, DOMAIN_TEXT_FILE)?,
            education: read_table(dir, EDUCATION_FILE)?,
            scoring: read_table(dir, SCORING_RULES_FILE)?,
        }
        .finish()?;

        tracing::info!(
            dir = %dir.display(),
            version = %kb.manifest.version,
            "Loaded knowledge base"
        );
        Ok(kb)
    }

    /// The tables compiled into the crate.
    pub fn bundled() -> Result<Self, SafetyError> {
        macro_rules! bundled_table {
            ($file:literal) => {
                parse_table(
                    $file,
                    include_str!(concat!("../../resources/knowledge_base/", $file)),
                )?
            };
        }

        Self {
            manifest: bundled_table!("manifest.json"),
            drug_rules: bundled_table!("drug_risk_rules.json"),
            symptom_risks: bundled_table!("symptom_risk.json"),
            thresholds: bundled_table!("domain_thresholds.json"),
            test_catalogs: bundled_table!("test_catalog.json"),
            texts: bundled_table!("domain_text.json"),
            education: bundled_table!("education.json"),
            scoring: bundled_table!("scoring_rules.json"),
        }
        .finish()
    }

    fn finish(mut self) -> Result<Self, SafetyError> {
        self.scoring.sort_tiers();
        self.validate()?;
        Ok(self)
    }

    /// Reject tables that are not total over the risk domains or that carry
    /// values the scorer cannot use.
    pub fn validate(&self) -> Result<(), SafetyError> {
        for domain in RiskDomain::ALL {
            let threshold = self.thresholds.get(domain).ok_or(SafetyError::IncompleteTable {
                table: THRESHOLDS_FILE,
                domain: *domain,
            })?;
            if threshold.warning > threshold.critical {
                return Err(SafetyError::InvalidThreshold(*domain));
            }
            if !self.test_catalogs.contains_key(domain) {
                return Err(SafetyError::IncompleteTable {
                    table: TEST_CATALOG_FILE,
                    domain: *domain,
                });
            }
            if !self.texts.domains.contains_key(domain) {
                return Err(SafetyError::IncompleteTable {
                    table: DOMAIN_TEXT_FILE,
                    domain: *domain,
                });
            }
        }

        let declared =
            std::iter::once(&self.manifest.default_locale).chain(&self.manifest.locales);
        for locale in declared {
            if self.texts.disclaimer.get(locale).is_none() {
                return Err(SafetyError::MissingDisclaimer(locale.clone()));
            }
        }

        let scoring = &self.scoring;
        if !(scoring.severity_anchor > 0.0) {
            return Err(SafetyError::InvalidParameter(
                "severityAnchor",
                scoring.severity_anchor,
            ));
        }
        if !(scoring.dose_increase_ratio >= 1.0) {
            return Err(SafetyError::InvalidParameter(
                "doseIncreaseRatio",
                scoring.dose_increase_ratio,
            ));
        }
        if !(1.0..=5.0).contains(&scoring.default_severity) {
            return Err(SafetyError::InvalidParameter(
                "defaultSeverity",
                scoring.default_severity,
            ));
        }

        Ok(())
    }

    pub fn default_locale(&self) -> &str {
        &self.manifest.default_locale
    }

    pub fn drug_rules(&self, medication_id: &str) -> &[DrugRiskRule] {
        self.drug_rules
            .get(medication_id)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    /// Whether the medication has any rule for `domain`.
    pub fn drug_affects(&self, medication_id: &str, domain: RiskDomain) -> bool {
        self.drug_rules(medication_id)
            .iter()
            .any(|rule| rule.domain == domain)
    }

    pub fn symptom_entry(&self, symptom_id: &str, domain: RiskDomain) -> Option<&SymptomRiskEntry> {
        self.symptom_risks.get(symptom_id)?.get(&domain)
    }

    pub fn symptom_entries(
        &self,
        symptom_id: &str,
    ) -> impl Iterator<Item = (RiskDomain, &SymptomRiskEntry)> {
        self.symptom_risks
            .get(symptom_id)
            .into_iter()
            .flat_map(|entries| entries.iter().map(|(d, e)| (*d, e)))
    }

    pub fn threshold(&self, domain: RiskDomain) -> Option<&DomainThreshold> {
        self.thresholds.get(&domain)
    }

    pub fn test_catalog(&self, domain: RiskDomain) -> &[TestCatalogEntry] {
        self.test_catalogs
            .get(&domain)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    pub fn domain_text(&self, domain: RiskDomain) -> Option<&DomainText> {
        self.texts.domains.get(&domain)
    }
}

fn read_table<T: DeserializeOwned>(dir: &Path, file: &str) -> Result<T, SafetyError> {
    let path = dir.join(file);
    let json = std::fs::read_to_string(&path).map_err(|e| {
        SafetyError::KnowledgeBaseLoad(path.display().to_string(), e.to_string())
    })?;
    parse_table(file, &json)
}

fn parse_table<T: DeserializeOwned>(file: &str, json: &str) -> Result<T, SafetyError> {
    serde_json::from_str(json)
        .map_err(|e| SafetyError::KnowledgeBaseParse(file.into(), e.to_string()))
}
