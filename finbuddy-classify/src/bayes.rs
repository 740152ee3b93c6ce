//! Multinomial naive Bayes over TF-IDF vectors.
//!
//! Classes are stored in category-vocabulary order, so equal top
//! probabilities always resolve to the lowest canonical index.

use finbuddy_core::Category;
use serde::{Deserialize, Serialize};

use crate::error::{ClassifyError, Result};

/// Fitted classifier state: per-class log priors and smoothed per-term log
/// likelihoods. Created by the trainer, read-only afterwards.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MultinomialNb {
    alpha: f64,
    classes: Vec<Category>,
    class_log_prior: Vec<f64>,
    feature_log_prob: Vec<Vec<f64>>,
}

impl MultinomialNb {
    /// Fit the classifier on (feature vector, label) pairs.
    ///
    /// `alpha` is the Laplace smoothing weight. Fewer than two distinct
    /// labels is an error: a classifier needs contrast to learn.
    pub fn fit(vectors: &[Vec<f64>], labels: &[Category], alpha: f64) -> Result<Self> {
        if vectors.is_empty() || vectors.len() != labels.len() {
            return Err(ClassifyError::Config(format!(
                "need matching vectors and labels, got {} and {}",
                vectors.len(),
                labels.len()
            )));
        }
        let n_features = vectors[0].len();
        if vectors.iter().any(|v| v.len() != n_features) {
            return Err(ClassifyError::Config(
                "feature vectors have inconsistent dimensions".to_string(),
            ));
        }

        let mut classes: Vec<Category> = labels.to_vec();
        classes.sort_by_key(|c| c.index());
        classes.dedup();
        if classes.len() < 2 {
            return Err(ClassifyError::InsufficientData(format!(
                "need at least 2 distinct categories, got {}",
                classes.len()
            )));
        }

        let mut class_log_prior = Vec::with_capacity(classes.len());
        let mut feature_log_prob = Vec::with_capacity(classes.len());

        for class in &classes {
            let members: Vec<&Vec<f64>> = labels
                .iter()
                .zip(vectors)
                .filter(|(l, _)| **l == *class)
                .map(|(_, v)| v)
                .collect();

            class_log_prior.push((members.len() as f64 / labels.len() as f64).ln());

            let mut counts = vec![0.0; n_features];
            for vector in &members {
                for (count, value) in counts.iter_mut().zip(vector.iter()) {
                    *count += value;
                }
            }
            let total: f64 = counts.iter().sum();
            let denom = (total + alpha * n_features as f64).ln();
            feature_log_prob.push(counts.iter().map(|c| (c + alpha).ln() - denom).collect());
        }

        Ok(Self {
            alpha,
            classes,
            class_log_prior,
            feature_log_prob,
        })
    }

    pub fn classes(&self) -> &[Category] {
        &self.classes
    }

    /// Per-class probabilities for a feature vector, summing to 1.
    pub fn predict_proba(&self, vector: &[f64]) -> Vec<f64> {
        debug_assert_eq!(vector.len(), self.feature_log_prob[0].len());

        let jll: Vec<f64> = self
            .class_log_prior
            .iter()
            .zip(&self.feature_log_prob)
            .map(|(prior, log_prob)| {
                prior
                    + vector
                        .iter()
                        .zip(log_prob)
                        .map(|(x, lp)| x * lp)
                        .sum::<f64>()
            })
            .collect();

        // log-sum-exp keeps the normalization stable
        let max = jll.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
        let log_sum = max + jll.iter().map(|l| (l - max).exp()).sum::<f64>().ln();
        jll.iter().map(|l| (l - log_sum).exp()).collect()
    }

    /// The most probable class and its probability. Ties break to the lowest
    /// vocabulary index: only a strictly greater probability displaces the
    /// current winner.
    pub fn top(&self, vector: &[f64]) -> (Category, f64) {
        let proba = self.predict_proba(vector);
        let mut best = 0;
        for (i, p) in proba.iter().enumerate().skip(1) {
            if *p > proba[best] {
                best = i;
            }
        }
        (self.classes[best], proba[best])
    }
}
