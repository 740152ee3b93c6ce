//! Review Loop: low-confidence predictions queue up for a human decision,
//! and accepted corrections flow back into the training corpus.
//!
//! Retraining stays an explicit, separate operation; resolving entries only
//! appends to the corpus store.

use std::collections::HashSet;
use std::fs;
use std::path::Path;

use finbuddy_core::Category;
use serde::{Deserialize, Serialize};

use crate::corpus::TrainingExample;
use crate::error::Result;
use crate::predict::Prediction;

/// A prediction at or below the confidence threshold, awaiting a decision
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ReviewEntry {
    pub description: String,
    pub category: Category,
    pub confidence: f64,
}

impl From<&Prediction> for ReviewEntry {
    fn from(p: &Prediction) -> Self {
        Self {
            description: p.description.clone(),
            category: p.category,
            confidence: p.confidence,
        }
    }
}

/// Human verdict on a review entry
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ReviewDecision {
    /// Keep the predicted category
    Accept,
    /// Substitute a human-chosen category
    Reassign(Category),
    /// Discard without creating a training example
    MarkUnknown,
}

/// Select predictions needing review: confidence at or below the threshold
/// (exactly-at counts as needing review; only strictly-above is
/// auto-accepted). Repeated descriptions collapse to one entry, preserving
/// first-seen order.
pub fn filter_for_review(predictions: &[Prediction], threshold: f64) -> Vec<ReviewEntry> {
    let mut seen: HashSet<&str> = HashSet::new();
    predictions
        .iter()
        .filter(|p| p.confidence <= threshold)
        .filter(|p| seen.insert(p.description.as_str()))
        .map(ReviewEntry::from)
        .collect()
}

/// Apply a decision. `Accept` on an `unknown` prediction and `MarkUnknown`
/// both yield nothing: unknown never enters the corpus.
pub fn resolve(entry: &ReviewEntry, decision: ReviewDecision) -> Option<TrainingExample> {
    let category = match decision {
        ReviewDecision::Accept => entry.category,
        ReviewDecision::Reassign(category) => category,
        ReviewDecision::MarkUnknown => return None,
    };
    category
        .is_trainable()
        .then(|| TrainingExample::new(entry.description.clone(), category))
}

/// Order entries least-confident first for the review listing.
pub fn sort_for_report(entries: &mut [ReviewEntry]) {
    entries.sort_by(|a, b| a.confidence.partial_cmp(&b.confidence).unwrap());
}

/// Read a persisted review queue; an absent file is an empty queue.
pub fn read_queue(path: impl AsRef<Path>) -> Result<Vec<ReviewEntry>> {
    let path = path.as_ref();
    if !path.exists() {
        return Ok(Vec::new());
    }
    Ok(serde_json::from_str(&fs::read_to_string(path)?)?)
}

/// Persist the review queue as pretty-printed JSON.
pub fn write_queue(path: impl AsRef<Path>, entries: &[ReviewEntry]) -> Result<()> {
    fs::write(path, serde_json::to_string_pretty(entries)?)?;
    Ok(())
}
