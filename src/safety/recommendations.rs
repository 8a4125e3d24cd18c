use std::collections::HashSet;

use super::alerts::classify_level;
use super::knowledge::KnowledgeBase;
use super::locale::Localizer;
use super::types::{DomainScores, RecommendedTest};

/// Tests for actionable domains, highest risk first, each name at most once.
pub fn build_recommended_tests(
    scores: &DomainScores,
    kb: &KnowledgeBase,
    loc: &Localizer<'_>,
) -> Vec<RecommendedTest> {
    let min_score = kb.scoring.recommendation_min_score;
    let mut seen: HashSet<String> = HashSet::new();
    let mut tests = Vec::new();

    for (domain, score) in scores.ranked() {
        if f64::from(score) < min_score {
            continue;
        }
        let priority = classify_level(kb, domain, score);
        let domain_label = kb
            .domain_text(domain)
            .and_then(|t| loc.try_text(&t.label.title))
            .unwrap_or_else(|| domain.to_string());

        for entry in kb.test_catalog(domain) {
            let name = loc.text(&entry.name);
            if !seen.insert(name.clone()) {
                continue;
            }
            tests.push(RecommendedTest {
                domain,
                domain_label: domain_label.clone(),
                name,
                priority,
                catalog_priority: entry.priority,
                urgency: entry.urgency.as_ref().and_then(|u| loc.try_text(u)),
                reason: loc.text(&entry.reason),
            });
        }
    }

    tests.sort_by_key(|t| t.priority.rank());
    tests
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use super::*;
    use crate::models::{AlertLevel, RiskDomain};

    fn scores(entries: &[(RiskDomain, u32)]) -> DomainScores {
        DomainScores::from_rounded(entries.iter().copied().collect::<BTreeMap<_, _>>())
    }

    #[test]
    fn below_minimum_score_is_skipped() {
        let kb = KnowledgeBase::bundled().unwrap();
        let tests = build_recommended_tests(
            &scores(&[(RiskDomain::Vte, 14)]),
            &kb,
            &Localizer::new("en", "ko"),
        );
        assert!(tests.is_empty());

        let tests = build_recommended_tests(
            &scores(&[(RiskDomain::Vte, 15)]),
            &kb,
            &Localizer::new("en", "ko"),
        );
        assert_eq!(tests.len(), kb.test_catalog(RiskDomain::Vte).len());
        assert!(tests.iter().all(|t| t.priority == AlertLevel::Info));
    }

    #[test]
    fn ordered_by_domain_priority() {
        let kb = KnowledgeBase::bundled().unwrap();
        let tests = build_recommended_tests(
            &scores(&[(RiskDomain::Metabolic, 20), (RiskDomain::Hyperkalemia, 40)]),
            &kb,
            &Localizer::new("en", "ko"),
        );
        assert_eq!(tests[0].domain, RiskDomain::Hyperkalemia);
        assert_eq!(tests[0].priority, AlertLevel::Warning);
        assert_eq!(tests[0].name, "Serum Potassium (K⁺)");
        assert!(tests[0].urgency.is_some());
        assert_eq!(tests.last().map(|t| t.domain), Some(RiskDomain::Metabolic));
    }

    #[test]
    fn names_are_unique() {
        let kb = KnowledgeBase::bundled().unwrap();
        let all: Vec<_> = RiskDomain::ALL.iter().map(|d| (*d, 80)).collect();
        let tests = build_recommended_tests(&scores(&all), &kb, &Localizer::new("ko", "ko"));
        let names: HashSet<_> = tests.iter().map(|t| t.name.as_str()).collect();
        assert_eq!(names.len(), tests.len());
        assert!(!tests.is_empty());
    }

    #[test]
    fn shared_test_kept_for_highest_domain() {
        let mut kb = KnowledgeBase::bundled().unwrap();
        let shared = kb.test_catalog(RiskDomain::Polycythemia)[0].clone();
        kb.test_catalogs
            .get_mut(&RiskDomain::SleepApnea)
            .unwrap()
            .insert(0, shared.clone());

        let tests = build_recommended_tests(
            &scores(&[(RiskDomain::SleepApnea, 50), (RiskDomain::Polycythemia, 20)]),
            &kb,
            &Localizer::new("en", "ko"),
        );
        let owners: Vec<_> = tests
            .iter()
            .filter(|t| t.name == shared.name.resolve("en", "ko").unwrap())
            .map(|t| t.domain)
            .collect();
        assert_eq!(owners, vec![RiskDomain::SleepApnea]);
    }

    #[test]
    fn domain_label_is_localized() {
        let kb = KnowledgeBase::bundled().unwrap();
        let tests = build_recommended_tests(
            &scores(&[(RiskDomain::Hyperkalemia, 40)]),
            &kb,
            &Localizer::new("en", "ko"),
        );
        assert_eq!(tests[0].domain_label, "Hyperkalemia Risk (estimated)");
    }
}
