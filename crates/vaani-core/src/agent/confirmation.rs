//! Yes/no resolution for pending confirmations.
//!
//! Keyword matching is deliberately simple. It sits behind
//! `ConfirmationClassifier` so a better classifier can replace it without
//! touching the planner or executor.

use serde::Serialize;

use crate::constants::agent::{AFFIRMATIVE_KEYWORDS, NEGATIVE_KEYWORDS};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Confirmation {
    Affirmative,
    Negative,
    /// No keyword, or contradictory keywords.
    Ambiguous,
}

pub trait ConfirmationClassifier: Send + Sync {
    fn classify(&self, utterance: &str) -> Confirmation;
}

/// Telugu keywords with English fallbacks.
#[derive(Debug, Clone, Copy, Default)]
pub struct KeywordClassifier;

impl ConfirmationClassifier for KeywordClassifier {
    fn classify(&self, utterance: &str) -> Confirmation {
        parse_confirmation(utterance)
    }
}

/// Map free text to a confirmation. Total and side-effect free.
pub fn parse_confirmation(utterance: &str) -> Confirmation {
    let text = utterance.trim().to_lowercase();
    if text.is_empty() {
        return Confirmation::Ambiguous;
    }

    let found_yes = AFFIRMATIVE_KEYWORDS.iter().any(|k| text.contains(k));
    let found_no = NEGATIVE_KEYWORDS.iter().any(|k| text.contains(k));

    match (found_yes, found_no) {
        (true, false) => Confirmation::Affirmative,
        (false, true) => Confirmation::Negative,
        _ => Confirmation::Ambiguous,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn affirmative_tokens() {
        assert_eq!(parse_confirmation("అవును"), Confirmation::Affirmative);
        assert_eq!(parse_confirmation("సరే, చేయండి"), Confirmation::Affirmative);
        assert_eq!(parse_confirmation("YES please"), Confirmation::Affirmative);
    }

    #[test]
    fn negative_tokens() {
        assert_eq!(parse_confirmation("లేదు"), Confirmation::Negative);
        assert_eq!(parse_confirmation("No"), Confirmation::Negative);
    }

    #[test]
    fn contradictory_input_is_ambiguous() {
        assert_eq!(parse_confirmation("yes and no"), Confirmation::Ambiguous);
        assert_eq!(parse_confirmation("అవును లేదు"), Confirmation::Ambiguous);
    }

    #[test]
    fn empty_and_unrelated_input_is_ambiguous() {
        assert_eq!(parse_confirmation(""), Confirmation::Ambiguous);
        assert_eq!(parse_confirmation("   "), Confirmation::Ambiguous);
        assert_eq!(parse_confirmation("maybe later"), Confirmation::Ambiguous);
    }

    #[test]
    fn classification_is_stable_across_calls() {
        let classifier = KeywordClassifier;
        for input in ["yes", "no", "hmm", "అవును", ""] {
            assert_eq!(classifier.classify(input), classifier.classify(input));
        }
    }
}
