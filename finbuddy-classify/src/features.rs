//! TF-IDF feature extraction over merchant descriptions.
//!
//! Descriptions are normalized (uppercase, punctuation stripped, trailing
//! store numbers and corporate suffixes dropped) and tokenized on
//! alphanumeric runs. Fitting is deterministic: the vocabulary is sorted, so
//! the same corpus and configuration always produce the same feature space.

use serde::{Deserialize, Serialize};

use crate::error::{ClassifyError, Result};

/// Trailing tokens that carry no merchant signal
const JUNK_SUFFIXES: [&str; 7] = ["LLC", "INC", "CORP", "USA", "VA", "MD", "DC"];

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct FeatureConfig {
    /// Minimum number of corpus descriptions a term must appear in
    pub min_term_frequency: usize,
}

impl Default for FeatureConfig {
    fn default() -> Self {
        Self {
            min_term_frequency: 1,
        }
    }
}

/// Normalize a description for matching: uppercase, punctuation to spaces,
/// collapsed whitespace, trailing junk tokens removed.
pub fn normalize(text: &str) -> String {
    let upper: String = text
        .to_uppercase()
        .chars()
        .map(|c| {
            if c.is_alphanumeric() || c == '_' || c.is_whitespace() {
                c
            } else {
                ' '
            }
        })
        .collect();

    let mut tokens: Vec<&str> = upper.split_whitespace().collect();
    while let Some(last) = tokens.last() {
        let junk = last.chars().all(|c| c.is_ascii_digit()) || JUNK_SUFFIXES.contains(last);
        if junk && tokens.len() > 1 {
            tokens.pop();
        } else {
            break;
        }
    }

    tokens.join(" ")
}

fn tokenize(text: &str) -> Vec<String> {
    normalize(text)
        .split(|c: char| !c.is_alphanumeric())
        .filter(|t| !t.is_empty())
        .map(|t| t.to_string())
        .collect()
}

/// Fitted vectorizer state: sorted term vocabulary plus per-term IDF weights.
/// Created by the trainer, read-only afterwards.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FeatureModel {
    pub config: FeatureConfig,
    terms: Vec<String>,
    idf: Vec<f64>,
}

impl FeatureModel {
    /// Fit the vocabulary and IDF weights over a corpus of descriptions.
    pub fn fit(corpus: &[String], config: FeatureConfig) -> Result<Self> {
        if corpus.is_empty() {
            return Err(ClassifyError::Config(
                "cannot fit feature extractor on an empty corpus".to_string(),
            ));
        }

        // document frequency per term
        let mut df: std::collections::BTreeMap<String, usize> = std::collections::BTreeMap::new();
        for doc in corpus {
            let mut seen: Vec<String> = tokenize(doc);
            seen.sort();
            seen.dedup();
            for term in seen {
                *df.entry(term).or_insert(0) += 1;
            }
        }

        let n = corpus.len();
        let min_tf = config.min_term_frequency.max(1);
        let (terms, idf): (Vec<String>, Vec<f64>) = df
            .into_iter()
            .filter(|(_, count)| *count >= min_tf)
            .map(|(term, count)| {
                // smoothed idf, never zero
                let weight = (((1 + n) as f64) / ((1 + count) as f64)).ln() + 1.0;
                (term, weight)
            })
            .unzip();

        if terms.is_empty() {
            return Err(ClassifyError::Config(
                "corpus produced an empty vocabulary".to_string(),
            ));
        }

        Ok(Self { config, terms, idf })
    }

    /// Number of feature dimensions
    pub fn dimension(&self) -> usize {
        self.terms.len()
    }

    /// Transform a description into an L2-normalized TF-IDF vector.
    ///
    /// Text containing only out-of-vocabulary terms yields the zero vector,
    /// which is a valid value, not an error.
    pub fn transform(&self, text: &str) -> Vec<f64> {
        let mut vector = vec![0.0; self.terms.len()];
        for token in tokenize(text) {
            if let Ok(i) = self.terms.binary_search(&token) {
                vector[i] += self.idf[i];
            }
        }

        let norm = vector.iter().map(|v| v * v).sum::<f64>().sqrt();
        if norm > 0.0 {
            for v in &mut vector {
                *v /= norm;
            }
        }
        vector
    }
}
