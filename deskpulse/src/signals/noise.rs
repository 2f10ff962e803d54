use std::sync::Arc;

use common::consts::DEFAULT_SIMILARITY_THRESHOLD;
use tracing::debug;

use super::text::{contains_words, normalize, LevenshteinSimilarity, TextSimilarity};

/// Closing remarks that do not need a reply from the team.
pub const DEFAULT_CLOSING_PHRASES: &[&str] = &[
    // Portuguese
    "obrigado",
    "obrigada",
    "muito obrigado",
    "muito obrigada",
    "obg",
    "brigado",
    "valeu",
    "vlw",
    "ok",
    "okay",
    "beleza",
    "blz",
    "tudo certo",
    // English
    "thanks",
    "thank you",
    "thx",
];

#[derive(Debug, Clone, PartialEq)]
struct ClosingPhrase {
    raw: String,
    normalized: String,
}

/// Why a message was classified as noise.
#[derive(Debug, Clone, PartialEq)]
pub enum NoiseReason {
    /// Missing text, or text with nothing left after normalization.
    Empty,
    /// Whole message is close enough to a closing phrase.
    Similar { phrase: String, score: f64 },
    /// A closing phrase appears as whole words inside the message.
    ContainsPhrase { phrase: String },
}

/// Decides whether a customer message is a trivial closing remark.
#[derive(Clone)]
pub struct NoiseClassifier {
    phrases: Vec<ClosingPhrase>,
    similarity: Arc<dyn TextSimilarity>,
    threshold: f64,
}

impl NoiseClassifier {
    pub fn new() -> Self {
        Self::with_phrases(DEFAULT_CLOSING_PHRASES.iter().copied())
    }

    pub fn with_phrases<I, S>(phrases: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self::with_settings(
            phrases,
            Arc::new(LevenshteinSimilarity),
            DEFAULT_SIMILARITY_THRESHOLD,
        )
    }

    /// # Arguments
    /// * `phrases` - Closing phrases, normalized once here
    /// * `similarity` - Scorer returning 0–100 for two normalized strings
    /// * `threshold` - Scores strictly above this mark a message as noise
    pub fn with_settings<I, S>(
        phrases: I,
        similarity: Arc<dyn TextSimilarity>,
        threshold: f64,
    ) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let phrases = phrases
            .into_iter()
            .map(|p| ClosingPhrase {
                raw: p.as_ref().to_string(),
                normalized: normalize(p.as_ref()),
            })
            .filter(|p| !p.normalized.is_empty())
            .collect();

        Self {
            phrases,
            similarity,
            threshold,
        }
    }

    /// Returns the reason the text counts as noise, or `None` for a substantive message.
    pub fn classify(&self, text: Option<&str>) -> Option<NoiseReason> {
        let normalized = normalize(text.unwrap_or_default());
        if normalized.is_empty() {
            return Some(NoiseReason::Empty);
        }

        for phrase in &self.phrases {
            let score = self.similarity.score(&normalized, &phrase.normalized);
            if score > self.threshold {
                return Some(NoiseReason::Similar {
                    phrase: phrase.raw.clone(),
                    score,
                });
            }
            if contains_words(&normalized, &phrase.normalized) {
                return Some(NoiseReason::ContainsPhrase {
                    phrase: phrase.raw.clone(),
                });
            }
        }
        None
    }

    pub fn is_irrelevant(&self, text: Option<&str>) -> bool {
        match self.classify(text) {
            Some(reason) => {
                debug!(reason = ?reason, "message classified as closing remark");
                true
            }
            None => false,
        }
    }
}

impl Default for NoiseClassifier {
    fn default() -> Self {
        Self::new()
    }
}
