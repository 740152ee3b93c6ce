//! Prediction Service: loads a persisted model pair once and classifies
//! merchant descriptions.
//!
//! The loaded pair is an explicit immutable handle, never process-wide
//! state, so multiple versions can coexist (and it is freely shareable
//! across threads once loaded).

use std::fs;
use std::path::Path;

use finbuddy_core::Category;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::bayes::MultinomialNb;
use crate::corpus::PatternSet;
use crate::error::{ClassifyError, Result};
use crate::features::FeatureModel;
use crate::trainer::{CLASSIFIER_FILE, ClassifierArtifact, FEATURES_FILE, FeatureArtifact};

/// One classification outcome. Ephemeral: persisted only if the review loop
/// accepts it into the corpus.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Prediction {
    pub description: String,
    pub category: Category,
    /// Probability mass assigned to the winning category, in [0, 1]
    pub confidence: f64,
}

impl Prediction {
    fn unknown(description: impl Into<String>) -> Self {
        Self {
            description: description.into(),
            category: Category::Unknown,
            confidence: 0.0,
        }
    }
}

/// A matched (feature model, classifier) pair loaded from disk.
#[derive(Debug)]
pub struct ModelPair {
    features: FeatureModel,
    classifier: MultinomialNb,
    pair_id: String,
}

impl ModelPair {
    /// Load the persisted pair from `dir`.
    ///
    /// Fails with `ModelNotFound` when either artifact is absent and
    /// `ModelMismatch` when their pairing identifiers disagree; a mismatched
    /// pair is never silently combined.
    pub fn load(dir: impl AsRef<Path>) -> Result<Self> {
        let dir = dir.as_ref();
        let features_path = dir.join(FEATURES_FILE);
        let classifier_path = dir.join(CLASSIFIER_FILE);
        if !features_path.exists() || !classifier_path.exists() {
            return Err(ClassifyError::ModelNotFound(dir.to_path_buf()));
        }

        let features: FeatureArtifact =
            serde_json::from_str(&fs::read_to_string(&features_path)?)?;
        let classifier: ClassifierArtifact =
            serde_json::from_str(&fs::read_to_string(&classifier_path)?)?;

        if features.pair_id != classifier.pair_id {
            return Err(ClassifyError::ModelMismatch {
                features: features.pair_id,
                classifier: classifier.pair_id,
            });
        }

        debug!(pair_id = %features.pair_id, "loaded model pair");
        Ok(Self {
            features: features.features,
            classifier: classifier.classifier,
            pair_id: features.pair_id,
        })
    }

    pub fn pair_id(&self) -> &str {
        &self.pair_id
    }

    /// Classify one description.
    ///
    /// Empty and whitespace-only descriptions degrade to `(unknown, 0.0)`
    /// without touching the model, as does text whose every term is out of
    /// vocabulary; nothing here aborts a batch.
    pub fn predict(&self, description: &str) -> Prediction {
        if description.trim().is_empty() {
            return Prediction::unknown(description);
        }

        let vector = self.features.transform(description);
        if vector.iter().all(|v| *v == 0.0) {
            // nothing recognized: no evidence to score
            return Prediction::unknown(description);
        }

        let (category, confidence) = self.classifier.top(&vector);
        Prediction {
            description: description.to_string(),
            category,
            confidence,
        }
    }

    /// Classify a batch, preserving input order.
    pub fn predict_batch<S: AsRef<str>>(&self, descriptions: &[S]) -> Vec<Prediction> {
        descriptions
            .iter()
            .map(|d| self.predict(d.as_ref()))
            .collect()
    }

    /// Classify with corpus-pattern overrides: a matching curated pattern
    /// wins outright at confidence 1.0, the model is the fallback.
    pub fn predict_with_overrides(&self, patterns: &PatternSet, description: &str) -> Prediction {
        if !description.trim().is_empty()
            && let Some(category) = patterns.find(description)
        {
            debug!(description, category = category.label(), "pattern override");
            return Prediction {
                description: description.to_string(),
                category,
                confidence: 1.0,
            };
        }
        self.predict(description)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::corpus::TrainingExample;
    use crate::trainer::{TrainOptions, train_to_dir};

    fn trained_pair(dir: &Path) -> ModelPair {
        let mut examples = Vec::new();
        for _ in 0..5 {
            examples.push(TrainingExample::new("CHIPOTLE USAPAVAFL", Category::Food));
            examples.push(TrainingExample::new("GRAMMARLY CO", Category::Software));
        }
        train_to_dir(&examples, &TrainOptions::default(), dir).unwrap();
        ModelPair::load(dir).unwrap()
    }

    #[test]
    fn test_load_missing_pair() {
        let dir = tempfile::tempdir().unwrap();
        let err = ModelPair::load(dir.path()).unwrap_err();
        assert!(matches!(err, ClassifyError::ModelNotFound(_)));
    }

    #[test]
    fn test_known_merchant_scores_high() {
        let dir = tempfile::tempdir().unwrap();
        let pair = trained_pair(dir.path());

        let p = pair.predict("CHIPOTLE 123");
        assert_eq!(p.category, Category::Food);
        assert!(p.confidence > 0.5, "confidence was {}", p.confidence);

        let p = pair.predict("GRAMMARLY");
        assert_eq!(p.category, Category::Software);
    }

    #[test]
    fn test_unseen_merchant_degrades_to_unknown() {
        let dir = tempfile::tempdir().unwrap();
        let pair = trained_pair(dir.path());

        let p = pair.predict("TOTALLY NOVEL MERCHANT XYZ");
        assert_eq!(p.category, Category::Unknown);
        assert_eq!(p.confidence, 0.0);
    }

    #[test]
    fn test_empty_description_skips_model() {
        let dir = tempfile::tempdir().unwrap();
        let pair = trained_pair(dir.path());

        for description in ["", "   ", "\t\n"] {
            let p = pair.predict(description);
            assert_eq!(p.category, Category::Unknown);
            assert_eq!(p.confidence, 0.0);
        }
    }

    #[test]
    fn test_prediction_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let pair = trained_pair(dir.path());
        assert_eq!(pair.predict("CHIPOTLE 123"), pair.predict("CHIPOTLE 123"));
    }

    #[test]
    fn test_batch_preserves_order() {
        let dir = tempfile::tempdir().unwrap();
        let pair = trained_pair(dir.path());

        let batch = pair.predict_batch(&["GRAMMARLY CO", "", "CHIPOTLE 123"]);
        assert_eq!(batch.len(), 3);
        assert_eq!(batch[0].category, Category::Software);
        assert_eq!(batch[1].category, Category::Unknown);
        assert_eq!(batch[2].category, Category::Food);
    }

    #[test]
    fn test_confidence_bounds() {
        let dir = tempfile::tempdir().unwrap();
        let pair = trained_pair(dir.path());

        for description in ["CHIPOTLE", "GRAMMARLY CO LLC", "WHO KNOWS", ""] {
            let p = pair.predict(description);
            assert!((0.0..=1.0).contains(&p.confidence));
        }
    }

    #[test]
    fn test_pattern_override_wins() {
        let dir = tempfile::tempdir().unwrap();
        let pair = trained_pair(dir.path());
        let patterns = PatternSet::compile(&[TrainingExample::new(
            r"GIANT\s*\d*",
            Category::Groceries,
        )]);

        let p = pair.predict_with_overrides(&patterns, "GIANT 0423");
        assert_eq!(p.category, Category::Groceries);
        assert_eq!(p.confidence, 1.0);

        // no pattern match falls back to the model
        let p = pair.predict_with_overrides(&patterns, "CHIPOTLE 123");
        assert_eq!(p.category, Category::Food);
    }

    #[test]
    fn test_mismatched_pair_refused() {
        let dir_a = tempfile::tempdir().unwrap();
        let dir_b = tempfile::tempdir().unwrap();

        trained_pair(dir_a.path());
        let mut examples = Vec::new();
        for _ in 0..3 {
            examples.push(TrainingExample::new("NETFLIX", Category::Entertainment));
            examples.push(TrainingExample::new("GIANT FOOD", Category::Groceries));
        }
        train_to_dir(&examples, &TrainOptions::default(), dir_b.path()).unwrap();

        // graft run B's classifier onto run A's features
        fs::copy(
            dir_b.path().join(CLASSIFIER_FILE),
            dir_a.path().join(CLASSIFIER_FILE),
        )
        .unwrap();

        let err = ModelPair::load(dir_a.path()).unwrap_err();
        assert!(matches!(err, ClassifyError::ModelMismatch { .. }));
    }
}
