//! Parse Capital One CSV transaction exports into typed transactions.
//!
//! Export header:
//! Transaction Date,Posted Date,Card No.,Description,Category,Debit,Credit

use std::io::Read;
use std::path::Path;

use anyhow::{Context, Result, bail};
use chrono::NaiveDate;

use crate::types::StatementTransaction;

fn parse_date(s: &str) -> Option<NaiveDate> {
    let s = s.trim();
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .or_else(|_| NaiveDate::parse_from_str(s, "%m/%d/%Y"))
        .ok()
}

/// Parse a Capital One CSV export, returning all valid transactions.
/// Rows with unparseable dates or amounts are skipped.
pub fn parse_csv(reader: impl Read) -> Result<Vec<StatementTransaction>> {
    let mut rdr = csv::ReaderBuilder::new().flexible(true).from_reader(reader);

    let headers = rdr.headers().context("reading CSV header")?.clone();
    let col = |name: &str| headers.iter().position(|h| h.trim() == name);

    let (Some(trans_col), Some(desc_col)) = (col("Transaction Date"), col("Description")) else {
        bail!("not a Capital One CSV export (missing Transaction Date/Description columns)");
    };
    let posted_col = col("Posted Date");
    let category_col = col("Category");
    let debit_col = col("Debit");
    let credit_col = col("Credit");

    let mut txns = Vec::new();

    for result in rdr.records() {
        let record = result?;
        let get = |i: Option<usize>| i.and_then(|i| record.get(i)).unwrap_or("").trim();

        let Some(trans_date) = parse_date(get(Some(trans_col))) else {
            continue; // skip unparseable rows
        };

        let debit: Option<f64> = get(debit_col).parse().ok();
        let credit: Option<f64> = get(credit_col).parse().ok();
        let amount = match (debit, credit) {
            (Some(d), _) => d,
            (None, Some(c)) => -c,
            (None, None) => continue,
        };

        let raw_category = match get(category_col) {
            "" => None,
            c => Some(c.to_string()),
        };

        txns.push(StatementTransaction {
            trans_date,
            post_date: parse_date(get(posted_col)),
            description: get(Some(desc_col)).to_string(),
            amount,
            cardholder: None,
            currency: "USD".to_string(),
            raw_category,
        });
    }

    Ok(txns)
}

/// Parse a Capital One CSV export from a file path.
pub fn parse_csv_path(path: impl AsRef<Path>) -> Result<Vec<StatementTransaction>> {
    let file = std::fs::File::open(path.as_ref())
        .with_context(|| format!("opening {}", path.as_ref().display()))?;
    parse_csv(file)
}
