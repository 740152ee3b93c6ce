//! End-to-end pipeline: curated corpus file -> trained model pair -> batch
//! predictions -> review queue -> resolved corrections back into the corpus.

use std::fs;

use finbuddy_classify::{
    ModelPair, ReviewDecision, TrainOptions, append_to_corpus, filter_for_review, load_corpus,
    resolve, sort_for_report, train_to_dir,
};
use finbuddy_core::Category;

const THRESHOLD: f64 = 0.3;

fn seed_corpus(path: &std::path::Path) {
    let mut entries = Vec::new();
    for i in 0..5 {
        entries.push((format!("CHIPOTLE USAPAVAFL {i}"), "food"));
        entries.push((format!("GRAMMARLY CO {i}"), "software"));
    }
    let map: std::collections::BTreeMap<_, _> = entries.into_iter().collect();
    fs::write(path, serde_json::to_string_pretty(&map).unwrap()).unwrap();
}

#[test]
fn test_full_pipeline() {
    let dir = tempfile::tempdir().unwrap();
    let corpus_path = dir.path().join("training-categories.json");
    let model_dir = dir.path().join("model");
    seed_corpus(&corpus_path);

    // train from the corpus file and persist the pair
    let examples = load_corpus(&corpus_path).unwrap();
    let report = train_to_dir(&examples, &TrainOptions::default(), &model_dir).unwrap();
    assert_eq!(report.examples, 10);
    assert_eq!(report.category_counts.get("food"), Some(&5));

    // classify a batch the way the importer does
    let pair = ModelPair::load(&model_dir).unwrap();
    let batch = pair.predict_batch(&["CHIPOTLE 123", "UNKNOWN MERCHANT XYZ", "GRAMMARLY CO"]);

    assert_eq!(batch[0].category, Category::Food);
    assert!(batch[0].confidence > 0.5);
    assert_eq!(batch[2].category, Category::Software);
    assert!(batch[1].confidence < THRESHOLD);

    // everything at or below the threshold lands in the review queue
    let mut queue = filter_for_review(&batch, THRESHOLD);
    sort_for_report(&mut queue);
    assert_eq!(queue.len(), 1);
    assert_eq!(queue[0].description, "UNKNOWN MERCHANT XYZ");

    // the human reassigns it; the correction is appended to the corpus
    let example = resolve(&queue[0], ReviewDecision::Reassign(Category::Shopping)).unwrap();
    append_to_corpus(&corpus_path, &[example]).unwrap();

    let reloaded = load_corpus(&corpus_path).unwrap();
    assert_eq!(reloaded.len(), 11);
    assert!(
        reloaded
            .iter()
            .any(|e| e.description == "UNKNOWN MERCHANT XYZ" && e.category == Category::Shopping)
    );

    // retraining is explicit: the grown corpus trains a fresh pair with a
    // new pairing identifier
    let report2 = train_to_dir(&reloaded, &TrainOptions::default(), &model_dir).unwrap();
    assert_ne!(report2.pair_id, report.pair_id);
    let pair2 = ModelPair::load(&model_dir).unwrap();
    assert_eq!(pair2.pair_id(), report2.pair_id);
}

#[test]
fn test_predictions_stay_in_vocabulary() {
    let dir = tempfile::tempdir().unwrap();
    let corpus_path = dir.path().join("training-categories.json");
    let model_dir = dir.path().join("model");
    seed_corpus(&corpus_path);

    let examples = load_corpus(&corpus_path).unwrap();
    train_to_dir(&examples, &TrainOptions::default(), &model_dir).unwrap();
    let pair = ModelPair::load(&model_dir).unwrap();

    for description in ["CHIPOTLE", "GRAMMARLY", "", "   ", "ZZZ UNSEEN", "SQ *CHIPOTLE"] {
        let p = pair.predict(description);
        assert!((0.0..=1.0).contains(&p.confidence));
        assert!(Category::ALL.contains(&p.category));
    }
}
