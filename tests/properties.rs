//! Property-based tests for the analysis engine.

use std::collections::HashSet;

use creepy_parser::{analyze, creepiness_score, extract_authors, extract_emails, extract_entities};
use proptest::prelude::*;

const LEXICON_SAMPLE: &[&str] = &["ghost", "blood", "mirror", "teeth", "whisper", "shadow"];

// Words of one or two letters can never contain a lexicon entry.
fn arb_neutral_words() -> impl Strategy<Value = Vec<String>> {
    prop::collection::vec("[a-z]{1,2}", 10..60)
}

proptest! {
    #[test]
    fn analyze_is_total_and_deterministic(text in any::<String>()) {
        let first = analyze(&text);
        let second = analyze(&text);
        prop_assert_eq!(first, second);
    }

    #[test]
    fn dialogue_percentage_is_bounded(text in any::<String>()) {
        let pct = analyze(&text).dialogue_stats.percentage;
        prop_assert!((0.0..=100.0).contains(&pct), "percentage out of range: {}", pct);
    }

    #[test]
    fn dialogue_percentage_zero_without_quotes(text in "[a-zA-Z .,!?\n]{0,200}") {
        let stats = analyze(&text).dialogue_stats;
        prop_assert_eq!(stats.dialogue_count, 0);
        prop_assert_eq!(stats.percentage, 0.0);
    }

    #[test]
    fn creepiness_score_is_bounded(text in any::<String>()) {
        let score = creepiness_score(&text);
        prop_assert!((0.0..=100.0).contains(&score), "score out of range: {}", score);
    }

    #[test]
    fn creepiness_score_never_decreases_with_more_lexicon_words(
        base in arb_neutral_words(),
        fewer in 0usize..3,
        extra in 1usize..4,
    ) {
        let more = fewer + extra;
        let build = |k: usize| {
            let mut words = base.clone();
            words.extend(LEXICON_SAMPLE.iter().take(k).map(|w| w.to_string()));
            words.join(" ")
        };
        prop_assert!(creepiness_score(&build(fewer)) <= creepiness_score(&build(more)));
    }

    #[test]
    fn repetition_does_not_raise_creepiness(base in arb_neutral_words(), times in 1usize..10) {
        let once = format!("{} ghost", base.join(" "));
        let many = format!("{} {}", base.join(" "), vec!["ghost"; times].join(" "));
        prop_assert!(creepiness_score(&many) <= creepiness_score(&once));
    }

    #[test]
    fn entities_are_capped_and_filtered(text in "([A-Z]?[a-z]{0,6}[ .?!,]){0,80}") {
        let entities = extract_entities(&text);
        prop_assert!(entities.len() <= 5);
        for entity in &entities {
            prop_assert!(entity.chars().count() >= 3, "short entity {}", entity);
            prop_assert!(!["The", "They", "These", "This", "That", "And", "But"].contains(&entity.as_str()));
        }
        let unique: HashSet<&String> = entities.iter().collect();
        prop_assert_eq!(unique.len(), entities.len());
    }

    #[test]
    fn emails_are_unique(local in "[a-z]{1,8}", domain in "[a-z]{1,8}", times in 1usize..5) {
        let address = format!("{local}@{domain}.com");
        let text = vec![address.as_str(); times].join(" and ");
        prop_assert_eq!(extract_emails(&text), vec![address.clone()]);
    }

    #[test]
    fn authors_are_unique_ignoring_case(handle in "[A-Za-z][A-Za-z0-9_]{0,10}") {
        let text = format!("u/{} u/{} Written by {}", handle, handle.to_lowercase(), handle.to_uppercase());
        prop_assert_eq!(extract_authors(&text), vec![handle.clone()]);
    }
}
