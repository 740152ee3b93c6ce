//! Trainer: fits the feature extractor and classifier as a matched pair and
//! persists both artifacts atomically under a shared pairing identifier.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use finbuddy_core::Category;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use tracing::info;

use crate::bayes::MultinomialNb;
use crate::corpus::{TrainingExample, check_conflicts};
use crate::error::{ClassifyError, Result};
use crate::features::{FeatureConfig, FeatureModel};

pub const FEATURES_FILE: &str = "features.json";
pub const CLASSIFIER_FILE: &str = "classifier.json";

/// Training descriptions are augmented with the merchant-string shapes banks
/// actually emit, so "CHIPOTLE" generalizes to "SQ *CHIPOTLE" and friends.
const VARIATION_SUFFIXES: [&str; 4] = [" #", " STORE", " LLC", " INC"];

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct TrainOptions {
    pub features: FeatureConfig,
    /// Laplace smoothing weight for the classifier
    pub alpha: f64,
}

impl Default for TrainOptions {
    fn default() -> Self {
        Self {
            features: FeatureConfig::default(),
            alpha: 1.0,
        }
    }
}

/// Advisory training diagnostics for the human curator
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrainingReport {
    /// Trainable examples (before augmentation)
    pub examples: usize,
    /// Corpus entries labeled `unknown`, excluded from the fit set
    pub skipped_unknown: usize,
    /// Example count per category, for spotting underrepresented labels
    pub category_counts: BTreeMap<String, usize>,
    /// Accuracy on a deterministic 1-in-5 hold-out split; absent when the
    /// corpus is too small to split without losing a class
    pub holdout_accuracy: Option<f64>,
    /// Pairing identifier shared by both persisted artifacts
    pub pair_id: String,
}

/// On-disk shape of the persisted feature model
#[derive(Debug, Serialize, Deserialize)]
pub struct FeatureArtifact {
    pub pair_id: String,
    pub features: FeatureModel,
}

/// On-disk shape of the persisted classifier
#[derive(Debug, Serialize, Deserialize)]
pub struct ClassifierArtifact {
    pub pair_id: String,
    pub classifier: MultinomialNb,
}

fn augment(examples: &[TrainingExample]) -> (Vec<String>, Vec<Category>) {
    let mut descriptions = Vec::new();
    let mut labels = Vec::new();
    for ex in examples {
        let d = &ex.description;
        descriptions.push(d.clone());
        for suffix in VARIATION_SUFFIXES {
            descriptions.push(format!("{d}{suffix}"));
        }
        descriptions.push(format!("SQ *{d}"));
        descriptions.push(format!("{d}*"));
        for _ in 0..7 {
            labels.push(ex.category);
        }
    }
    (descriptions, labels)
}

fn fit_pair(
    examples: &[TrainingExample],
    options: &TrainOptions,
) -> Result<(FeatureModel, MultinomialNb)> {
    let (descriptions, labels) = augment(examples);
    let features = FeatureModel::fit(&descriptions, options.features)?;
    let vectors: Vec<Vec<f64>> = descriptions.iter().map(|d| features.transform(d)).collect();
    let classifier = MultinomialNb::fit(&vectors, &labels, options.alpha)?;
    Ok((features, classifier))
}

fn distinct_categories(examples: &[TrainingExample]) -> usize {
    let mut cats: Vec<Category> = examples.iter().map(|e| e.category).collect();
    cats.sort_by_key(|c| c.index());
    cats.dedup();
    cats.len()
}

/// Deterministic 1-in-5 stride split. Returns None when holding out would
/// drop a class from the training side.
fn holdout_split(
    examples: &[TrainingExample],
) -> Option<(Vec<TrainingExample>, Vec<TrainingExample>)> {
    let (held, kept): (Vec<_>, Vec<_>) = examples
        .iter()
        .enumerate()
        .partition(|(i, _)| i % 5 == 0);
    let held: Vec<TrainingExample> = held.into_iter().map(|(_, e)| e.clone()).collect();
    let kept: Vec<TrainingExample> = kept.into_iter().map(|(_, e)| e.clone()).collect();

    if held.is_empty() || kept.is_empty() {
        return None;
    }
    if distinct_categories(&kept) < distinct_categories(examples) {
        return None;
    }
    Some((kept, held))
}

fn fingerprint(examples: &[TrainingExample], options: &TrainOptions) -> String {
    let mut pairs: Vec<(&str, &str)> = examples
        .iter()
        .map(|e| (e.description.as_str(), e.category.label()))
        .collect();
    pairs.sort();

    let mut hasher = Sha256::new();
    for (description, label) in pairs {
        hasher.update(description.as_bytes());
        hasher.update(b"\t");
        hasher.update(label.as_bytes());
        hasher.update(b"\n");
    }
    hasher.update(
        format!(
            "min_term_frequency={};alpha={}\n",
            options.features.min_term_frequency, options.alpha
        )
        .as_bytes(),
    );

    hasher
        .finalize()
        .iter()
        .map(|b| format!("{b:02x}"))
        .collect()
}

/// Train a matched (feature model, classifier) pair from the corpus.
///
/// Unknown-labeled entries are excluded from the fit set (unknown is a
/// fallback, not a trainable class) and counted in the report. Duplicate
/// descriptions with conflicting categories abort the run.
pub fn train(
    examples: &[TrainingExample],
    options: &TrainOptions,
) -> Result<(FeatureModel, MultinomialNb, TrainingReport)> {
    check_conflicts(examples)?;

    let (trainable, skipped): (Vec<_>, Vec<_>) = examples
        .iter()
        .cloned()
        .partition(|e| e.category.is_trainable());

    if distinct_categories(&trainable) < 2 {
        return Err(ClassifyError::InsufficientData(format!(
            "need at least 2 distinct categories, got {}",
            distinct_categories(&trainable)
        )));
    }

    let holdout_accuracy = match holdout_split(&trainable) {
        Some((kept, held)) => {
            let (features, classifier) = fit_pair(&kept, options)?;
            let correct = held
                .iter()
                .filter(|ex| classifier.top(&features.transform(&ex.description)).0 == ex.category)
                .count();
            Some(correct as f64 / held.len() as f64)
        }
        None => None,
    };

    let (features, classifier) = fit_pair(&trainable, options)?;

    let mut category_counts: BTreeMap<String, usize> = BTreeMap::new();
    for ex in &trainable {
        *category_counts
            .entry(ex.category.label().to_string())
            .or_insert(0) += 1;
    }

    let report = TrainingReport {
        examples: trainable.len(),
        skipped_unknown: skipped.len(),
        category_counts,
        holdout_accuracy,
        pair_id: fingerprint(&trainable, options),
    };

    Ok((features, classifier, report))
}

fn write_artifact<T: Serialize>(dir: &Path, name: &str, artifact: &T) -> Result<()> {
    let tmp = tempfile::NamedTempFile::new_in(dir)?;
    serde_json::to_writer_pretty(&tmp, artifact)?;
    tmp.persist(dir.join(name))
        .map_err(|e| ClassifyError::Io(e.error))?;
    Ok(())
}

/// Train and persist the pair under `dir` as `features.json` and
/// `classifier.json`, each embedding the shared pairing identifier.
///
/// Each artifact is written to a temp file in `dir` and atomically renamed;
/// a crash between the two renames leaves artifacts whose identifiers
/// disagree, which the loader refuses.
pub fn train_to_dir(
    examples: &[TrainingExample],
    options: &TrainOptions,
    dir: impl AsRef<Path>,
) -> Result<TrainingReport> {
    let dir = dir.as_ref();
    fs::create_dir_all(dir)?;

    let (features, classifier, report) = train(examples, options)?;

    write_artifact(
        dir,
        FEATURES_FILE,
        &FeatureArtifact {
            pair_id: report.pair_id.clone(),
            features,
        },
    )?;
    write_artifact(
        dir,
        CLASSIFIER_FILE,
        &ClassifierArtifact {
            pair_id: report.pair_id.clone(),
            classifier,
        },
    )?;

    info!(
        examples = report.examples,
        skipped = report.skipped_unknown,
        pair_id = %report.pair_id,
        "trained and persisted model pair"
    );
    Ok(report)
}
