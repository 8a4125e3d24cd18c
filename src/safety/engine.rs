use std::sync::Arc;
use std::time::Instant;

use crate::config::EngineSettings;
use crate::models::{RiskDomain, Snapshot, TransitionMode};

use super::alerts::build_alerts;
use super::education::build_education_points;
use super::features::extract_features;
use super::knowledge::KnowledgeBase;
use super::locale::Localizer;
use super::recommendations::build_recommended_tests;
use super::scoring::score_domains;
use super::types::{DomainScores, SafetyAssessor, SafetyError, SafetyReport};

/// Default implementation of the safety assessor.
/// Runs feature extraction, scoring, alerting, recommendations and education
/// against a shared, read-only knowledge base.
#[derive(Debug, Clone)]
pub struct DefaultSafetyEngine {
    knowledge: Arc<KnowledgeBase>,
    settings: EngineSettings,
}

impl DefaultSafetyEngine {
    pub fn new(knowledge: Arc<KnowledgeBase>, settings: EngineSettings) -> Self {
        Self {
            knowledge,
            settings,
        }
    }

    /// Engine over the compiled-in knowledge base.
    pub fn bundled(settings: EngineSettings) -> Result<Self, SafetyError> {
        Ok(Self::new(Arc::new(KnowledgeBase::bundled()?), settings))
    }

    pub fn knowledge(&self) -> &KnowledgeBase {
        &self.knowledge
    }

    pub fn language(&self) -> &str {
        &self.settings.language
    }

    pub fn mode(&self) -> TransitionMode {
        self.settings.mode
    }

    fn localizer(&self) -> Localizer<'_> {
        Localizer::new(&self.settings.language, self.knowledge.default_locale())
    }

    fn disclaimer(&self) -> String {
        self.localizer().text(&self.knowledge.texts.disclaimer)
    }

    /// Report for an absent snapshot.
    pub fn empty_report(&self) -> SafetyReport {
        SafetyReport {
            alerts: Vec::new(),
            domain_scores: DomainScores::zeroed(),
            recommended_tests: Vec::new(),
            education_points: Vec::new(),
            disclaimer: self.disclaimer(),
            confidence: 0,
        }
    }
}

impl SafetyAssessor for DefaultSafetyEngine {
    fn run_safety_assessment(
        &self,
        snapshot: Option<&Snapshot>,
        history: &[Snapshot],
    ) -> SafetyReport {
        let Some(snapshot) = snapshot else {
            return self.empty_report();
        };
        let start = Instant::now();
        let kb = self.knowledge.as_ref();
        let loc = self.localizer();

        let features = extract_features(snapshot, history, &kb.scoring);
        let domain_scores = score_domains(&features, kb, self.settings.mode);

        let alerts = build_alerts(&features, &domain_scores, kb, &loc);
        let recommended_tests = build_recommended_tests(&domain_scores, kb, &loc);
        let education_points = build_education_points(&features, kb, &loc);

        tracing::debug!(
            medications = features.medications.len(),
            symptoms = features.symptoms.len(),
            history = history.len(),
            alerts = alerts.len(),
            tests = recommended_tests.len(),
            top_risk = ?domain_scores.top_risk(),
            confidence = features.confidence,
            processing_us = start.elapsed().as_micros() as u64,
            "Safety assessment complete"
        );

        SafetyReport {
            alerts,
            domain_scores,
            recommended_tests,
            education_points,
            disclaimer: self.disclaimer(),
            confidence: features.confidence,
        }
    }

    fn domain_label(&self, domain: RiskDomain) -> String {
        self.knowledge
            .domain_text(domain)
            .and_then(|t| self.localizer().try_text(&t.label.title))
            .unwrap_or_else(|| domain.to_string())
    }

    fn domain_short_label(&self, domain: RiskDomain) -> String {
        self.knowledge
            .domain_text(domain)
            .and_then(|t| self.localizer().try_text(&t.label.short))
            .unwrap_or_else(|| domain.to_string())
    }
}
