//! Word-level text utilities that prepare the per-word feature tables.

pub mod lexicon;
pub mod words;

pub use lexicon::{annotate_tokens, word_class, AnnotatedToken, FrequencyLexicon, TaggedToken, WordClass};
pub use words::{normalize_text, reconstruct_words, Aggregation, WordValue};
