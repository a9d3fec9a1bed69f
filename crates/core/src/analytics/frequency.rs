//! Word frequency, n-gram and co-occurrence statistics.

use serde::{Deserialize, Serialize};

use super::counter::Counter;
use super::stopwords::Stopwords;
use super::tokenize::tokenize;
use super::AnalyticsError;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WordFrequency {
    pub word: String,
    pub count: usize,
    /// Share of all counted words, in `[0, 1]`.
    pub frequency: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NgramFrequency {
    pub ngram: Vec<String>,
    pub count: usize,
    pub frequency: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WordCorrelation {
    pub word1: String,
    pub word2: String,
    pub co_occurrence_count: usize,
    /// Pointwise mutual information, base 2.
    pub pmi_score: f64,
}

#[derive(Debug, Clone)]
pub struct FrequencyOptions {
    pub stopwords: Stopwords,
    pub min_word_length: usize,
    pub top_n: usize,
}

impl Default for FrequencyOptions {
    fn default() -> Self {
        Self {
            stopwords: Stopwords::default(),
            min_word_length: 2,
            top_n: 50,
        }
    }
}

#[derive(Debug, Clone)]
pub struct NgramOptions {
    pub stopwords: Stopwords,
    pub min_word_length: usize,
    pub top_n: usize,
    /// N-grams seen fewer times are ignored entirely.
    pub min_count: usize,
}

impl Default for NgramOptions {
    fn default() -> Self {
        Self {
            stopwords: Stopwords::default(),
            min_word_length: 2,
            top_n: 30,
            min_count: 2,
        }
    }
}

#[derive(Debug, Clone)]
pub struct CorrelationOptions {
    pub stopwords: Stopwords,
    pub min_word_length: usize,
    /// Words closer than this many positions co-occur.
    pub window_size: usize,
    pub min_co_occurrence: usize,
    pub top_n: usize,
}

impl Default for CorrelationOptions {
    fn default() -> Self {
        Self {
            stopwords: Stopwords::default(),
            min_word_length: 2,
            window_size: 5,
            min_co_occurrence: 3,
            top_n: 50,
        }
    }
}

fn content_words(text: &str, stopwords: &Stopwords, min_word_length: usize) -> Vec<String> {
    tokenize(text, min_word_length)
        .into_iter()
        .filter(|w| !stopwords.contains(w))
        .collect()
}

/// Most frequent words across `texts`, by count descending.
pub fn word_frequency<T: AsRef<str>>(texts: &[T], opts: &FrequencyOptions) -> Vec<WordFrequency> {
    let mut counter = Counter::new();
    for text in texts {
        for word in content_words(text.as_ref(), &opts.stopwords, opts.min_word_length) {
            counter.add(word);
        }
    }

    let total = counter.total();
    if total == 0 {
        return Vec::new();
    }

    counter
        .most_common(opts.top_n)
        .into_iter()
        .map(|(word, count)| WordFrequency {
            word,
            count,
            frequency: count as f64 / total as f64,
        })
        .collect()
}

/// Most frequent sequences of `n` consecutive content words.
///
/// N-grams never span two texts. Frequencies are relative to the n-grams
/// that pass `min_count`.
pub fn ngrams<T: AsRef<str>>(
    texts: &[T],
    n: usize,
    opts: &NgramOptions,
) -> Result<Vec<NgramFrequency>, AnalyticsError> {
    if n == 0 {
        return Err(AnalyticsError::InvalidParameter {
            name: "n",
            reason: "must be at least 1".to_string(),
        });
    }

    let mut counter = Counter::new();
    for text in texts {
        let words = content_words(text.as_ref(), &opts.stopwords, opts.min_word_length);
        for window in words.windows(n) {
            counter.add(window.to_vec());
        }
    }

    let mut kept: Vec<(Vec<String>, usize)> = counter
        .into_entries()
        .into_iter()
        .filter(|(_, count)| *count >= opts.min_count)
        .collect();
    let total: usize = kept.iter().map(|(_, count)| count).sum();
    if total == 0 {
        return Ok(Vec::new());
    }

    kept.sort_by(|a, b| b.1.cmp(&a.1));
    kept.truncate(opts.top_n);

    Ok(kept
        .into_iter()
        .map(|(ngram, count)| NgramFrequency {
            ngram,
            count,
            frequency: count as f64 / total as f64,
        })
        .collect())
}

/// Word pairs that co-occur more often than chance, by PMI descending.
///
/// Every ordered position pair `(i, j)` with `0 < j - i < window_size`
/// counts once toward the pair and once toward the window total. Pairs are
/// reported with the words in lexicographic order.
pub fn word_correlations<T: AsRef<str>>(
    texts: &[T],
    opts: &CorrelationOptions,
) -> Vec<WordCorrelation> {
    let mut words_seen: Counter<String> = Counter::new();
    let mut pairs: Counter<(String, String)> = Counter::new();
    let mut total_windows = 0usize;

    for text in texts {
        let words = content_words(text.as_ref(), &opts.stopwords, opts.min_word_length);
        for word in &words {
            words_seen.add(word.clone());
        }

        for i in 0..words.len() {
            let end = (i + opts.window_size).min(words.len());
            for j in (i + 1)..end {
                let (a, b) = (&words[i], &words[j]);
                let pair = if a <= b {
                    (a.clone(), b.clone())
                } else {
                    (b.clone(), a.clone())
                };
                pairs.add(pair);
                total_windows += 1;
            }
        }
    }

    if total_windows == 0 {
        return Vec::new();
    }
    let total_words = words_seen.total() as f64;
    let total_windows = total_windows as f64;

    let mut results: Vec<WordCorrelation> = pairs
        .entries()
        .iter()
        .filter(|(_, co)| *co >= opts.min_co_occurrence)
        .filter_map(|((word1, word2), co)| {
            let p_x = words_seen.get(word1) as f64 / total_words;
            let p_y = words_seen.get(word2) as f64 / total_words;
            let p_xy = *co as f64 / total_windows;
            if p_x > 0.0 && p_y > 0.0 && p_xy > 0.0 {
                Some(WordCorrelation {
                    word1: word1.clone(),
                    word2: word2.clone(),
                    co_occurrence_count: *co,
                    pmi_score: (p_xy / (p_x * p_y)).log2(),
                })
            } else {
                None
            }
        })
        .collect();

    results.sort_by(|a, b| b.pmi_score.total_cmp(&a.pmi_score));
    results.truncate(opts.top_n);
    results
}
