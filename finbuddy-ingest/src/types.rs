use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Normalized output of statement parsers (bank-agnostic)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatementTransaction {
    pub trans_date: NaiveDate,
    pub post_date: Option<NaiveDate>,
    pub description: String,
    /// Positive number means charge/spend; negative means credit/refund.
    pub amount: f64,
    /// Cardholder name for statements with per-user sections
    pub cardholder: Option<String>,
    pub currency: String,
    /// Category string reported by the bank, if any
    pub raw_category: Option<String>,
}
