//! Text signals used to tell open customer requests apart from closing remarks.

pub mod noise;
pub mod text;

pub use noise::{NoiseClassifier, NoiseReason, DEFAULT_CLOSING_PHRASES};
pub use text::{normalize, LevenshteinSimilarity, TextSimilarity};
