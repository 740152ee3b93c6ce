//! finbuddy-classify: the transaction categorization core — training corpus
//! store, TF-IDF feature extraction, naive Bayes classifier, model-pair
//! persistence, prediction service, and the human review loop.

pub mod bayes;
pub mod corpus;
pub mod error;
pub mod features;
pub mod predict;
pub mod review;
pub mod trainer;

pub use bayes::MultinomialNb;
pub use corpus::{PatternSet, TrainingExample, append_to_corpus, load_corpus};
pub use error::{ClassifyError, Result};
pub use features::{FeatureConfig, FeatureModel};
pub use predict::{ModelPair, Prediction};
pub use review::{ReviewDecision, ReviewEntry, filter_for_review, resolve, sort_for_report};
pub use trainer::{TrainOptions, TrainingReport, train, train_to_dir};
