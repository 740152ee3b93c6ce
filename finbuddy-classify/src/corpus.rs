//! Training Corpus Store: a human-editable JSON file mapping merchant
//! descriptions (or regex patterns) to category labels.
//!
//! Two shapes load: a `{"DESCRIPTION": "label", ...}` mapping, and a
//! `[{"transaction": ..., "category": ...}, ...]` record list. Appends always
//! rewrite the file as a sorted, pretty-printed mapping so manual edits stay
//! diffable.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use finbuddy_core::Category;
use regex::RegexBuilder;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{ClassifyError, Result};

/// A curated (description, category) pair. The category is always a
/// vocabulary member; construction from a raw label rejects drift early.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TrainingExample {
    pub description: String,
    pub category: Category,
}

impl TrainingExample {
    pub fn new(description: impl Into<String>, category: Category) -> Self {
        Self {
            description: description.into(),
            category,
        }
    }

    pub fn from_label(description: impl Into<String>, label: &str) -> Result<Self> {
        let category = Category::from_label(label)
            .ok_or_else(|| ClassifyError::UnknownLabel(label.to_string()))?;
        Ok(Self::new(description, category))
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum CorpusFile {
    Map(BTreeMap<String, String>),
    Records(Vec<CorpusRecord>),
}

#[derive(Deserialize)]
struct CorpusRecord {
    transaction: String,
    category: String,
}

/// Load the corpus file, accepting both the mapping and record-list shapes.
pub fn load_corpus(path: impl AsRef<Path>) -> Result<Vec<TrainingExample>> {
    let text = fs::read_to_string(path.as_ref())?;
    let file: CorpusFile = serde_json::from_str(&text)?;

    match file {
        CorpusFile::Map(map) => map
            .into_iter()
            .map(|(description, label)| TrainingExample::from_label(description, &label))
            .collect(),
        CorpusFile::Records(records) => records
            .into_iter()
            .map(|r| TrainingExample::from_label(r.transaction, &r.category))
            .collect(),
    }
}

/// Reject corpora where one description maps to two different categories.
/// Exact duplicates (same description, same category) are fine.
pub fn check_conflicts(examples: &[TrainingExample]) -> Result<()> {
    let mut seen: BTreeMap<&str, Category> = BTreeMap::new();
    for ex in examples {
        if let Some(prev) = seen.insert(ex.description.as_str(), ex.category)
            && prev != ex.category
        {
            return Err(ClassifyError::CorpusConflict {
                description: ex.description.clone(),
                first: prev.label().to_string(),
                second: ex.category.label().to_string(),
            });
        }
    }
    Ok(())
}

/// Append accepted corrections to the corpus file, creating it if absent.
///
/// Rewrites the whole file as a sorted mapping via temp-file-then-rename, so
/// a crash never leaves a truncated store. Entries already present are
/// updated in place; unknown-labeled examples are never written. Returns the
/// number of entries written or updated.
pub fn append_to_corpus(path: impl AsRef<Path>, examples: &[TrainingExample]) -> Result<usize> {
    let path = path.as_ref();
    let mut map: BTreeMap<String, String> = if path.exists() {
        load_corpus(path)?
            .into_iter()
            .map(|ex| (ex.description, ex.category.label().to_string()))
            .collect()
    } else {
        BTreeMap::new()
    };

    let mut changed = 0;
    for ex in examples {
        if !ex.category.is_trainable() {
            continue;
        }
        let label = ex.category.label().to_string();
        if map.get(&ex.description) != Some(&label) {
            map.insert(ex.description.clone(), label);
            changed += 1;
        }
    }

    let dir = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };
    let tmp = tempfile::NamedTempFile::new_in(dir)?;
    serde_json::to_writer_pretty(&tmp, &map)?;
    tmp.persist(path).map_err(|e| ClassifyError::Io(e.error))?;

    Ok(changed)
}

/// Corpus keys compiled as case-insensitive regex overrides, tried before the
/// statistical model. Invalid patterns and unknown-labeled entries are
/// skipped.
pub struct PatternSet {
    patterns: Vec<(regex::Regex, Category)>,
}

impl PatternSet {
    pub fn compile(examples: &[TrainingExample]) -> Self {
        let mut patterns = Vec::new();
        for ex in examples {
            if !ex.category.is_trainable() {
                continue;
            }
            match RegexBuilder::new(&ex.description)
                .case_insensitive(true)
                .build()
            {
                Ok(re) => patterns.push((re, ex.category)),
                Err(e) => debug!(pattern = %ex.description, error = %e, "skipping invalid pattern"),
            }
        }
        Self { patterns }
    }

    /// First matching pattern wins, in corpus order.
    pub fn find(&self, description: &str) -> Option<Category> {
        self.patterns
            .iter()
            .find(|(re, _)| re.is_match(description))
            .map(|(_, category)| *category)
    }

    pub fn len(&self) -> usize {
        self.patterns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_load_mapping_shape() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("corpus.json");
        fs::write(&path, r#"{"CHIPOTLE": "food", "GRAMMARLY": "software"}"#).unwrap();

        let examples = load_corpus(&path).unwrap();
        assert_eq!(examples.len(), 2);
        assert_eq!(examples[0].category, Category::Food);
    }

    #[test]
    fn test_load_record_list_shape() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("corpus.json");
        fs::write(
            &path,
            r#"[{"transaction": "GIANT 123", "category": "groceries"},
                {"transaction": "NETFLIX", "category": "entertainment"}]"#,
        )
        .unwrap();

        let examples = load_corpus(&path).unwrap();
        assert_eq!(examples.len(), 2);
        assert_eq!(examples[1].category, Category::Entertainment);
    }

    #[test]
    fn test_load_rejects_bad_label() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("corpus.json");
        fs::write(&path, r#"{"CHIPOTLE": "fastfood"}"#).unwrap();

        let err = load_corpus(&path).unwrap_err();
        assert!(matches!(err, ClassifyError::UnknownLabel(l) if l == "fastfood"));
    }

    #[test]
    fn test_conflict_detection() {
        let examples = vec![
            TrainingExample::new("WALMART", Category::Shopping),
            TrainingExample::new("WALMART", Category::Shopping),
            TrainingExample::new("WALMART", Category::Groceries),
        ];
        let err = check_conflicts(&examples).unwrap_err();
        assert!(matches!(err, ClassifyError::CorpusConflict { .. }));

        assert!(check_conflicts(&examples[..2]).is_ok());
    }

    #[test]
    fn test_append_creates_and_updates() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("corpus.json");

        let n = append_to_corpus(
            &path,
            &[TrainingExample::new("CHIPOTLE", Category::Food)],
        )
        .unwrap();
        assert_eq!(n, 1);

        // reassignment updates in place; unknown never lands
        let n = append_to_corpus(
            &path,
            &[
                TrainingExample::new("CHIPOTLE", Category::Groceries),
                TrainingExample::new("MYSTERY", Category::Unknown),
            ],
        )
        .unwrap();
        assert_eq!(n, 1);

        let examples = load_corpus(&path).unwrap();
        assert_eq!(examples.len(), 1);
        assert_eq!(examples[0].category, Category::Groceries);
    }

    #[test]
    fn test_pattern_set_matches_case_insensitive() {
        let examples = vec![
            TrainingExample::new(r"GIANT\s*\d*", Category::Groceries),
            TrainingExample::new(r"((broken", Category::Food),
        ];
        let patterns = PatternSet::compile(&examples);
        assert_eq!(patterns.len(), 1);
        assert_eq!(patterns.find("giant 1234"), Some(Category::Groceries));
        assert_eq!(patterns.find("CHIPOTLE"), None);
    }
}
