//! Text statistics over generated captions.
//!
//! Everything here is a pure function over caption texts, except
//! [`read_caption_texts`] which loads them from sidecar files.

mod corpus;
mod counter;
mod frequency;
mod stopwords;
mod tokenize;

pub use corpus::{read_caption_texts, CaptionText};
pub use frequency::{
    ngrams, word_correlations, word_frequency, CorrelationOptions, FrequencyOptions,
    NgramFrequency, NgramOptions, WordCorrelation, WordFrequency,
};
pub use stopwords::{StopwordPreset, Stopwords, ENGLISH_STOPWORDS, MINIMAL_STOPWORDS};
pub use tokenize::tokenize;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum AnalyticsError {
    #[error("Invalid parameter {name}: {reason}")]
    InvalidParameter { name: &'static str, reason: String },

    #[error("Failed to scan captions: {0}")]
    Walk(#[from] walkdir::Error),
}
