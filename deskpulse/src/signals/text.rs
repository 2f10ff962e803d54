//! Text canonicalization and similarity scoring shared by the noise classifier.

use unicode_normalization::char::is_combining_mark;
use unicode_normalization::UnicodeNormalization;

/// Canonical form used for every comparison: lowercase, diacritics stripped,
/// punctuation removed, whitespace collapsed to single spaces.
///
/// `normalize(normalize(x)) == normalize(x)` holds for any input.
pub fn normalize(text: &str) -> String {
    text.to_lowercase()
        .nfd()
        .filter(|c| !is_combining_mark(*c))
        .filter(|c| c.is_alphanumeric() || c.is_whitespace())
        .collect::<String>()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

/// Whole-word containment on already normalized text. Multi-word phrases must
/// appear as a contiguous run of tokens.
pub fn contains_words(normalized_text: &str, normalized_phrase: &str) -> bool {
    let phrase_tokens: Vec<&str> = normalized_phrase.split_whitespace().collect();
    if phrase_tokens.is_empty() {
        return false;
    }

    let tokens: Vec<&str> = normalized_text.split_whitespace().collect();
    tokens
        .windows(phrase_tokens.len())
        .any(|window| window == phrase_tokens.as_slice())
}

/// Similarity between two normalized strings on a 0–100 scale.
pub trait TextSimilarity: Send + Sync {
    fn score(&self, a: &str, b: &str) -> f64;
}

/// Normalized Levenshtein similarity scaled to 0–100.
#[derive(Debug, Clone, Copy, Default)]
pub struct LevenshteinSimilarity;

impl TextSimilarity for LevenshteinSimilarity {
    fn score(&self, a: &str, b: &str) -> f64 {
        strsim::normalized_levenshtein(a, b) * 100.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_strips_case_accents_and_punctuation() {
        assert_eq!(normalize("Obrigado!!!"), "obrigado");
        assert_eq!(normalize("  Já   RESOLVEU? "), "ja resolveu");
        assert_eq!(normalize("Não, ainda não."), "nao ainda nao");
        assert_eq!(normalize("ÇÃO"), "cao");
        assert_eq!(normalize("👍"), "");
    }

    #[test]
    fn test_normalize_is_idempotent() {
        let samples = [
            "Muito obrigada pela ajuda, Zé!",
            "İstanbul ﬁle Ångström",
            "ok ok OK...",
            "",
            "\t\n",
        ];
        for sample in samples {
            let once = normalize(sample);
            assert_eq!(normalize(&once), once, "not idempotent for {:?}", sample);
        }
    }

    #[test]
    fn test_contains_words_respects_boundaries() {
        assert!(contains_words("ok obrigado", "ok"));
        assert!(contains_words("tudo certo por aqui", "tudo certo"));
        assert!(!contains_words("okay then", "ok"));
        assert!(!contains_words("book", "ok"));
        assert!(!contains_words("certo tudo", "tudo certo"));
        assert!(!contains_words("anything", ""));
    }

    #[test]
    fn test_levenshtein_similarity_scale() {
        let similarity = LevenshteinSimilarity;
        assert_eq!(similarity.score("valeu", "valeu"), 100.0);
        assert_eq!(similarity.score("", "abc"), 0.0);
        let typo = similarity.score("obrigado", "obrigada");
        assert!(typo > 85.0 && typo < 100.0);
        assert!(similarity.score("o sistema caiu", "obrigado") < 50.0);
    }
}
