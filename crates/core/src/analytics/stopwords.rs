use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::str::FromStr;

/// Common English function words plus words that carry no signal in video
/// descriptions.
#[rustfmt::skip]
pub const ENGLISH_STOPWORDS: &[&str] = &[
    // Articles
    "a", "an", "the",
    // Pronouns
    "i", "me", "my", "myself", "we", "our", "ours", "ourselves", "you", "your", "yours",
    "yourself", "yourselves", "he", "him", "his", "himself", "she", "her", "hers", "herself",
    "it", "its", "itself", "they", "them", "their", "theirs", "themselves", "what", "which",
    "who", "whom", "this", "that", "these", "those",
    // Verbs
    "am", "is", "are", "was", "were", "be", "been", "being", "have", "has", "had", "having",
    "do", "does", "did", "doing", "would", "should", "could", "ought", "might", "must",
    "shall", "will", "can", "may",
    // Prepositions
    "at", "by", "for", "from", "in", "into", "of", "on", "to", "with", "about", "against",
    "between", "through", "during", "before", "after", "above", "below", "up", "down", "out",
    "off", "over", "under", "again", "further", "then", "once",
    // Conjunctions
    "and", "but", "or", "nor", "so", "yet", "both", "either", "neither", "not", "only", "own",
    "same", "than", "too", "very",
    // Other
    "as", "if", "when", "where", "why", "how", "all", "each", "every", "few", "more", "most",
    "other", "some", "such", "no", "any", "here", "there", "just", "also", "now", "even",
    "well", "back", "still", "way", "because", "while", "although", "though", "since", "until",
    "unless",
    // Video descriptions
    "video", "shows", "appears", "seen", "visible", "scene", "frame", "clip",
];

/// Only the most frequent function words.
#[rustfmt::skip]
pub const MINIMAL_STOPWORDS: &[&str] = &[
    "a", "an", "the", "is", "are", "was", "were", "be", "been", "being", "and", "or", "but",
    "in", "on", "at", "to", "for", "of", "with", "by",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StopwordPreset {
    None,
    Minimal,
    #[default]
    English,
}

impl FromStr for StopwordPreset {
    type Err = String;

    /// Unknown names fall back to `english`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s.to_ascii_lowercase().as_str() {
            "none" => Self::None,
            "minimal" => Self::Minimal,
            _ => Self::English,
        })
    }
}

/// Words excluded from every statistic.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Stopwords(HashSet<String>);

impl Stopwords {
    /// The preset's words plus `custom`, lowercased.
    pub fn new<S: AsRef<str>>(preset: StopwordPreset, custom: &[S]) -> Self {
        let base: &[&str] = match preset {
            StopwordPreset::None => &[],
            StopwordPreset::Minimal => MINIMAL_STOPWORDS,
            StopwordPreset::English => ENGLISH_STOPWORDS,
        };
        let mut words: HashSet<String> = base.iter().map(|w| w.to_string()).collect();
        words.extend(custom.iter().map(|w| w.as_ref().to_lowercase()));
        Self(words)
    }

    pub fn none() -> Self {
        Self(HashSet::new())
    }

    pub fn contains(&self, word: &str) -> bool {
        self.0.contains(word)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl Default for Stopwords {
    fn default() -> Self {
        Self::new::<&str>(StopwordPreset::English, &[])
    }
}
