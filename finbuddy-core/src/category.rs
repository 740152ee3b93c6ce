//! The fixed spending-category vocabulary.
//!
//! Every training example and every non-unknown prediction must carry one of
//! these labels. `Unknown` is the fallback for unclassifiable transactions and
//! is never a trainable class.

use serde::{Deserialize, Serialize};

/// Spending categories, in canonical order. Tie-breaks between equally
/// probable predictions resolve to the lowest index.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum Category {
    #[serde(rename = "bills")]
    Bills,
    #[serde(rename = "entertainment")]
    Entertainment,
    #[serde(rename = "food")]
    Food,
    #[serde(rename = "groceries")]
    Groceries,
    #[serde(rename = "health")]
    Health,
    #[serde(rename = "insurance")]
    Insurance,
    #[serde(rename = "miscellaneous")]
    Miscellaneous,
    #[serde(rename = "other")]
    Other,
    #[serde(rename = "personal-care")]
    PersonalCare,
    #[serde(rename = "rent")]
    Rent,
    #[serde(rename = "services")]
    Services,
    #[serde(rename = "shopping")]
    Shopping,
    #[serde(rename = "software")]
    Software,
    #[serde(rename = "subscriptions")]
    Subscriptions,
    #[serde(rename = "transportation")]
    Transportation,
    #[serde(rename = "utilities")]
    Utilities,
    #[serde(rename = "unknown")]
    Unknown,
}

impl Category {
    /// All categories in canonical order, `Unknown` last.
    pub const ALL: [Category; 17] = [
        Category::Bills,
        Category::Entertainment,
        Category::Food,
        Category::Groceries,
        Category::Health,
        Category::Insurance,
        Category::Miscellaneous,
        Category::Other,
        Category::PersonalCare,
        Category::Rent,
        Category::Services,
        Category::Shopping,
        Category::Software,
        Category::Subscriptions,
        Category::Transportation,
        Category::Utilities,
        Category::Unknown,
    ];

    /// The wire/file label for this category
    pub fn label(&self) -> &'static str {
        match self {
            Category::Bills => "bills",
            Category::Entertainment => "entertainment",
            Category::Food => "food",
            Category::Groceries => "groceries",
            Category::Health => "health",
            Category::Insurance => "insurance",
            Category::Miscellaneous => "miscellaneous",
            Category::Other => "other",
            Category::PersonalCare => "personal-care",
            Category::Rent => "rent",
            Category::Services => "services",
            Category::Shopping => "shopping",
            Category::Software => "software",
            Category::Subscriptions => "subscriptions",
            Category::Transportation => "transportation",
            Category::Utilities => "utilities",
            Category::Unknown => "unknown",
        }
    }

    /// Decode a label, rejecting anything outside the vocabulary.
    pub fn from_label(label: &str) -> Option<Category> {
        let label = label.trim().to_lowercase();
        Category::ALL.iter().copied().find(|c| c.label() == label)
    }

    /// Position in the canonical ordering
    pub fn index(&self) -> usize {
        *self as usize
    }

    pub fn is_unknown(&self) -> bool {
        matches!(self, Category::Unknown)
    }

    /// Returns true if examples with this label may enter the training set
    pub fn is_trainable(&self) -> bool {
        !self.is_unknown()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_label_round_trip() {
        for cat in Category::ALL {
            assert_eq!(Category::from_label(cat.label()), Some(cat));
        }
    }

    #[test]
    fn test_from_label_rejects_drift() {
        assert_eq!(Category::from_label("grocery"), None);
        assert_eq!(Category::from_label(""), None);
        assert_eq!(Category::from_label("FOOD "), Some(Category::Food));
    }

    #[test]
    fn test_canonical_order() {
        assert_eq!(Category::Bills.index(), 0);
        assert!(Category::Food.index() < Category::Software.index());
        assert_eq!(Category::Unknown.index(), Category::ALL.len() - 1);
    }

    #[test]
    fn test_unknown_is_not_trainable() {
        assert!(!Category::Unknown.is_trainable());
        assert!(Category::Food.is_trainable());
    }

    #[test]
    fn test_serde_uses_kebab_labels() {
        let json = serde_json::to_string(&Category::PersonalCare).unwrap();
        assert_eq!(json, "\"personal-care\"");
        let back: Category = serde_json::from_str("\"transportation\"").unwrap();
        assert_eq!(back, Category::Transportation);
    }
}
