//! Categorized transaction records produced by the import pipeline

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::category::Category;

/// A statement transaction joined with its predicted category
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CategorizedTransaction {
    /// Transaction date from the statement
    pub trans_date: NaiveDate,
    /// Raw merchant description
    pub description: String,
    /// Positive = charge/spend, negative = credit/refund
    pub amount: f64,
    /// Cardholder name for shared statements
    pub cardholder: Option<String>,
    /// Assigned category (`unknown` when below the confidence threshold)
    pub category: Category,
    /// Probability mass the classifier put on the assigned category
    pub confidence: f64,
}

impl CategorizedTransaction {
    pub fn new(
        trans_date: NaiveDate,
        description: impl Into<String>,
        amount: f64,
        category: Category,
        confidence: f64,
    ) -> Self {
        Self {
            trans_date,
            description: description.into(),
            amount,
            cardholder: None,
            category,
            confidence,
        }
    }

    pub fn with_cardholder(mut self, cardholder: impl Into<String>) -> Self {
        self.cardholder = Some(cardholder.into());
        self
    }

    /// Returns true if this is a charge (positive amount)
    pub fn is_charge(&self) -> bool {
        self.amount > 0.0
    }

    /// Returns true if this is a credit or refund
    pub fn is_credit(&self) -> bool {
        self.amount < 0.0
    }
}
