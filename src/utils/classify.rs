//! Heuristic study classification.
//!
//! Each dimension (type, method, population) is an ordered list of rules
//! over a lowercase haystack built from title, abstract and the current
//! type. The first matching rule wins; when nothing matches the prior value
//! is kept. Every pattern covers English and Portuguese spellings.

use regex::Regex;
use std::sync::LazyLock;

use crate::models::Record;

/// One pattern and the label it assigns
struct Rule {
    regex: Regex,
    label: &'static str,
    /// Only fill the dimension when it is still empty
    keep_existing: bool,
}

fn rule(pattern: &str, label: &'static str) -> Rule {
    Rule {
        regex: Regex::new(pattern).expect("valid classification pattern"),
        label,
        keep_existing: false,
    }
}

static TYPE_RULES: LazyLock<Vec<Rule>> = LazyLock::new(|| {
    vec![
        rule(r"meta[- ]?analys|meta[- ]?an[aá]lise", "Meta-analysis"),
        rule(
            r"systematic review|revis[aã]o sistem[aá]tica|review\b",
            "Review",
        ),
        rule(
            r"randomi[sz]ed|randomi[sz]ad[oa]|ensaio|controlled trial|clinical trial",
            "Clinical trial",
        ),
        rule(r"case study|estudo de caso", "Case study"),
        Rule {
            keep_existing: true,
            ..rule(r"qualitative|qualitativ[oa]", "Field study")
        },
    ]
});

static METHOD_RULES: LazyLock<Vec<Rule>> = LazyLock::new(|| {
    vec![
        rule(r"qualitative|qualitativ[oa]", "Qualitative"),
        rule(
            r"randomi[sz]ed|randomi[sz]ad[oa]|trial|ensaio|quantitativ[eoa]|meta[- ]?analys|meta[- ]?an[aá]lise",
            "Quantitative",
        ),
        rule(r"mixed methods|m[eé]todos mistos|misto", "Mixed"),
    ]
});

static POPULATION_RULES: LazyLock<Vec<Rule>> = LazyLock::new(|| {
    vec![
        rule(r"adolescen", "Adolescents"),
        rule(r"\bchild|crian[cç]a|infantil\b", "Children"),
        rule(r"\badult|adulto[s]?\b", "Adults"),
        rule(r"older|elderly|idoso[s]?", "Elderly"),
        rule(r"caregiver|cuidador|cuidadores", "Caregivers"),
    ]
});

/// Resolve one dimension against its rule list
fn apply(rules: &[Rule], haystack: &str, current: Option<String>) -> Option<String> {
    match rules.iter().find(|r| r.regex.is_match(haystack)) {
        Some(r) if r.keep_existing => current.or_else(|| Some(r.label.to_string())),
        Some(r) => Some(r.label.to_string()),
        None => current,
    }
}

/// Infer or override `type`, `method` and `population` from the record text.
pub fn classify(record: Record) -> Record {
    let haystack = format!(
        "{} {} {}",
        record.title,
        record.abstract_text,
        record.study_type.as_deref().unwrap_or("")
    )
    .to_lowercase();

    let study_type = apply(&TYPE_RULES, &haystack, record.study_type.clone());
    let method = apply(&METHOD_RULES, &haystack, record.method.clone());
    let population = apply(&POPULATION_RULES, &haystack, record.population.clone());

    Record {
        study_type,
        method,
        population,
        ..record
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Provider, RecordBuilder};

    fn record(title: &str, abstract_text: &str, study_type: Option<&str>) -> Record {
        RecordBuilder::new("pubmed:1", title, Provider::PubMed)
            .abstract_text(abstract_text)
            .study_type(study_type.map(String::from))
            .build()
    }

    #[test]
    fn test_type_order() {
        let r = classify(record(
            "A systematic review and meta-analysis of randomized trials",
            "",
            None,
        ));
        assert_eq!(r.study_type.as_deref(), Some("Meta-analysis"));

        let r = classify(record("Exercise in older adults: a systematic review", "", None));
        assert_eq!(r.study_type.as_deref(), Some("Review"));

        let r = classify(record("Ensaio clínico randomizado", "", None));
        assert_eq!(r.study_type.as_deref(), Some("Clinical trial"));

        let r = classify(record("Um estudo de caso", "", None));
        assert_eq!(r.study_type.as_deref(), Some("Case study"));
    }

    #[test]
    fn test_portuguese_variants() {
        let r = classify(record("Revisão sistemática sobre ansiedade", "", None));
        assert_eq!(r.study_type.as_deref(), Some("Review"));

        let r = classify(record("Uma meta-análise", "", None));
        assert_eq!(r.study_type.as_deref(), Some("Meta-analysis"));
        assert_eq!(r.method.as_deref(), Some("Quantitative"));

        let r = classify(record("Pesquisa qualitativa com cuidadores", "", None));
        assert_eq!(r.method.as_deref(), Some("Qualitative"));
        assert_eq!(r.population.as_deref(), Some("Caregivers"));

        let r = classify(record("Ansiedade em crianças", "", None));
        assert_eq!(r.population.as_deref(), Some("Children"));

        let r = classify(record("Depressão em idosos", "métodos mistos", None));
        assert_eq!(r.population.as_deref(), Some("Elderly"));
        assert_eq!(r.method.as_deref(), Some("Mixed"));
    }

    #[test]
    fn test_qualitative_fallback_preserves_existing_type() {
        let r = classify(record("A qualitative inquiry", "", Some("Journal Article")));
        assert_eq!(r.study_type.as_deref(), Some("Journal Article"));

        let r = classify(record("A qualitative inquiry", "", None));
        assert_eq!(r.study_type.as_deref(), Some("Field study"));
    }

    #[test]
    fn test_other_type_rules_override_existing() {
        let r = classify(record("Case study of a clinic", "", Some("Journal Article")));
        assert_eq!(r.study_type.as_deref(), Some("Case study"));
    }

    #[test]
    fn test_pubmed_seeded_type_feeds_haystack() {
        let r = classify(record("Sleep and mood", "", Some("Randomized Controlled Trial")));
        assert_eq!(r.study_type.as_deref(), Some("Clinical trial"));
        assert_eq!(r.method.as_deref(), Some("Quantitative"));
    }

    #[test]
    fn test_no_match_keeps_prior_values() {
        let mut input = record("Notes on a theory", "", None);
        input.population = Some("Adults".to_string());
        let r = classify(input);
        assert!(r.study_type.is_none());
        assert!(r.method.is_none());
        assert_eq!(r.population.as_deref(), Some("Adults"));
    }

    #[test]
    fn test_population_order() {
        let r = classify(record("Adolescents and adults", "", None));
        assert_eq!(r.population.as_deref(), Some("Adolescents"));

        let r = classify(record("Childhood trauma in adults", "", None));
        assert_eq!(r.population.as_deref(), Some("Children"));
    }

    #[test]
    fn test_classify_is_idempotent() {
        let inputs = vec![
            record("A randomized controlled trial in adolescents", "", None),
            record("Revisão sistemática", "estudo qualitativo com adultos", None),
            record("Meta-análise de ensaios", "", None),
            record("Estudo de caso", "métodos mistos; idosos", None),
            record("A qualitative inquiry with caregivers", "", None),
            record("Sleep and mood", "", Some("Randomized Controlled Trial")),
            record("Untitled", "", Some("Journal Article")),
        ];

        for input in inputs {
            let once = classify(input);
            let twice = classify(once.clone());
            assert_eq!(once.study_type, twice.study_type, "type for {}", once.title);
            assert_eq!(once.method, twice.method, "method for {}", once.title);
            assert_eq!(once.population, twice.population, "population for {}", once.title);
        }
    }
}
