//! Per-category spend aggregation for the classify report

use serde::{Deserialize, Serialize};

use crate::category::Category;
use crate::record::CategorizedTransaction;

/// Aggregate spend for one category
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CategorySpend {
    pub category: Category,
    /// Net amount across the category (charges minus credits)
    pub total: f64,
    pub count: usize,
}

/// Group transactions into per-category totals, largest spend first.
pub fn spending_by_category(txns: &[CategorizedTransaction]) -> Vec<CategorySpend> {
    let mut totals = [0.0f64; Category::ALL.len()];
    let mut counts = [0usize; Category::ALL.len()];

    for txn in txns {
        let i = txn.category.index();
        totals[i] += txn.amount;
        counts[i] += 1;
    }

    let mut spends: Vec<CategorySpend> = Category::ALL
        .iter()
        .filter(|c| counts[c.index()] > 0)
        .map(|c| CategorySpend {
            category: *c,
            total: totals[c.index()],
            count: counts[c.index()],
        })
        .collect();

    spends.sort_by(|a, b| b.total.partial_cmp(&a.total).unwrap());
    spends
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn txn(description: &str, amount: f64, category: Category) -> CategorizedTransaction {
        let date = NaiveDate::from_ymd_opt(2025, 7, 1).unwrap();
        CategorizedTransaction::new(date, description, amount, category, 0.9)
    }

    #[test]
    fn test_groups_and_sorts_by_total() {
        let txns = vec![
            txn("CHIPOTLE", 12.50, Category::Food),
            txn("WHOLEFDS", 82.10, Category::Groceries),
            txn("GONG CHA", 6.75, Category::Food),
            txn("GRAMMARLY", 30.00, Category::Software),
        ];

        let spends = spending_by_category(&txns);
        assert_eq!(spends.len(), 3);
        assert_eq!(spends[0].category, Category::Groceries);
        assert_eq!(spends[1].category, Category::Software);
        assert_eq!(spends[2].count, 2);
        assert!((spends[2].total - 19.25).abs() < 1e-9);
    }

    #[test]
    fn test_credits_reduce_totals() {
        let txns = vec![
            txn("TARGET", 50.00, Category::Shopping),
            txn("TARGET RETURN", -20.00, Category::Shopping),
        ];
        let spends = spending_by_category(&txns);
        assert_eq!(spends.len(), 1);
        assert!((spends[0].total - 30.00).abs() < 1e-9);
    }

    #[test]
    fn test_empty_input() {
        assert!(spending_by_category(&[]).is_empty());
    }
}
