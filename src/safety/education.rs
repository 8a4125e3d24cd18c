use super::knowledge::KnowledgeBase;
use super::locale::Localizer;
use super::types::{EducationPoint, Features};

/// Notices for the medications currently taken, in knowledge-base order.
pub fn build_education_points(
    features: &Features,
    kb: &KnowledgeBase,
    loc: &Localizer<'_>,
) -> Vec<EducationPoint> {
    kb.education
        .iter()
        .filter(|rule| {
            rule.trigger
                .matches(features.medications.iter().map(|m| m.id.as_str()))
        })
        .map(|rule| EducationPoint {
            kind: rule.kind,
            icon: rule.icon.clone(),
            text: loc.text(&rule.text),
        })
        .collect()
}
