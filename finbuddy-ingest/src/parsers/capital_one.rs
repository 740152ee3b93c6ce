//! Capital One credit-card statement parser (extracted PDF text)
//!
//! Shared statements group transactions into per-cardholder sections:
//!
//!   JANE DOE #1234: Transactions
//!   Trans Date Post Date Description Amount
//!   Jul 20 Jul 22 H-E-B #455SAN MARCOSTX $5.82
//!   ...
//!   Transactions (Continued)        <- next page
//!   ...
//!   JANE DOE #1234: Total Transactions $123.45
//!
//! Each section's stated total is verified against the sum of parsed rows;
//! a mismatch means rows were dropped and is a hard error.

use std::collections::HashMap;

use anyhow::{Result, bail};
use chrono::NaiveDate;
use regex::Regex;
use tracing::debug;

use crate::types::StatementTransaction;

fn parse_mmm_dd_with_year(s: &str, year: i32) -> Option<NaiveDate> {
    // Example: "Jul 20"
    let s = s.trim();
    let parts: Vec<_> = s.split_whitespace().collect();
    if parts.len() != 2 {
        return None;
    }
    let month_str = parts[0];
    let day: u32 = parts[1].parse().ok()?;

    let month = match month_str {
        "Jan" => 1,
        "Feb" => 2,
        "Mar" => 3,
        "Apr" => 4,
        "May" => 5,
        "Jun" => 6,
        "Jul" => 7,
        "Aug" => 8,
        "Sep" => 9,
        "Oct" => 10,
        "Nov" => 11,
        "Dec" => 12,
        _ => return None,
    };

    NaiveDate::from_ymd_opt(year, month, day)
}

fn dollars_to_cents(s: &str) -> Option<i64> {
    let amount: f64 = s.replace(",", "").parse().ok()?;
    Some((amount * 100.0).round() as i64)
}

/// Parse extracted statement text into transactions.
///
/// `statement_year` is required because transaction rows only include MMM DD.
pub fn parse_statement_text(text: &str, statement_year: i32) -> Result<Vec<StatementTransaction>> {
    let section_re = Regex::new(r"^(?P<name>[A-Z][A-Z\s]*?)\s+#(?P<acct>\d+):\s+Transactions\s*$")?;
    let total_re = Regex::new(concat!(
        r"^(?P<name>[A-Z][A-Z\s]*?)\s+#(?P<acct>\d+):\s+Total\s+Transactions\s+",
        r"\$(?P<amt>\d{1,3}(?:,\d{3})*\.\d{2})\s*$"
    ))?;
    let header_re = Regex::new(r"Trans\s+Date\s+Post\s+Date\s+Description\s+Amount")?;
    let txn_re = Regex::new(concat!(
        r"^\s*(?P<trans>[A-Za-z]{3}\s+\d{1,2})\s+",
        r"(?P<post>[A-Za-z]{3}\s+\d{1,2})\s+",
        r"(?P<desc>.+?)\s+",
        r"(?P<polarity>-)?\s*\$(?P<amt>\d{1,3}(?:,\d{3})*\.\d{2})\s*$"
    ))?;

    let mut current: Option<String> = None;
    let mut processing = false;
    let mut section_cents: HashMap<String, i64> = HashMap::new();
    let mut out = Vec::new();

    for line in text.lines() {
        if let Some(caps) = total_re.captures(line) {
            let name = caps["name"].trim().to_string();
            let parsed = section_cents.get(&name).copied().unwrap_or(0);
            if parsed == 0 {
                bail!("no transactions parsed for '{}' before its total line", name);
            }
            let stated = dollars_to_cents(&caps["amt"])
                .ok_or_else(|| anyhow::anyhow!("unreadable total for '{}'", name))?;
            if parsed != stated {
                bail!(
                    "transaction total mismatch for '{}': parsed ${:.2}, statement says ${:.2}",
                    name,
                    parsed as f64 / 100.0,
                    stated as f64 / 100.0
                );
            }
            debug!(cardholder = %name, total = stated, "section total verified");
            current = None;
            processing = false;
            continue;
        }

        if let Some(caps) = section_re.captures(line) {
            let name = caps["name"].trim().to_string();
            debug!(cardholder = %name, account = &caps["acct"], "entering section");
            current = Some(name);
            processing = false;
            continue;
        }

        if line.contains("Transactions (Continued)") {
            processing = true;
            continue;
        }

        if header_re.is_match(line) && current.is_some() {
            processing = true;
            continue;
        }

        if !processing {
            continue;
        }
        let Some(name) = current.as_deref() else {
            continue;
        };

        if let Some(caps) = txn_re.captures(line) {
            let Some(trans) = parse_mmm_dd_with_year(&caps["trans"], statement_year) else {
                continue;
            };
            let post = parse_mmm_dd_with_year(&caps["post"], statement_year);

            let Some(mut cents) = dollars_to_cents(&caps["amt"]) else {
                continue;
            };
            if caps.name("polarity").is_some() {
                cents = -cents;
            }

            *section_cents.entry(name.to_string()).or_insert(0) += cents;
            out.push(StatementTransaction {
                trans_date: trans,
                post_date: post,
                description: caps["desc"].trim().to_string(),
                amount: cents as f64 / 100.0,
                cardholder: Some(name.to_string()),
                currency: "USD".to_string(),
                raw_category: None,
            });
        } else {
            debug!(line, "discarding non-transaction line");
        }
    }

    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    const STATEMENT: &str = "\
JANE DOE #1234: Transactions
Trans Date Post Date Description Amount
Jul 20 Jul 22 H-E-B #455SAN MARCOSTX $5.82
Jul 28 Jul 29 WALMART.COMWALMART.COMAR $14.05
Transactions (Continued)
Aug 1 Aug 2 CHIPOTLE 1234AUSTINTX $12.13
JANE DOE #1234: Total Transactions $32.00
JOHN DOE #5678: Transactions
Trans Date Post Date Description Amount
Jul 21 Jul 23 NETFLIX.COM $15.49
JOHN DOE #5678: Total Transactions $15.49
";

    #[test]
    fn test_parses_cardholder_sections() {
        let txns = parse_statement_text(STATEMENT, 2025).unwrap();
        assert_eq!(txns.len(), 4);
        assert_eq!(txns[0].cardholder.as_deref(), Some("JANE DOE"));
        assert_eq!(txns[0].amount, 5.82);
        assert!(txns[0].description.contains("H-E-B"));
        assert_eq!(txns[3].cardholder.as_deref(), Some("JOHN DOE"));
        assert_eq!(txns[3].amount, 15.49);
    }

    #[test]
    fn test_continuation_page_rows_kept() {
        let txns = parse_statement_text(STATEMENT, 2025).unwrap();
        let jane: Vec<_> = txns
            .iter()
            .filter(|t| t.cardholder.as_deref() == Some("JANE DOE"))
            .collect();
        assert_eq!(jane.len(), 3);
        assert_eq!(
            jane[2].trans_date,
            NaiveDate::from_ymd_opt(2025, 8, 1).unwrap()
        );
    }

    #[test]
    fn test_total_mismatch_is_error() {
        let text = "\
JANE DOE #1234: Transactions
Trans Date Post Date Description Amount
Jul 20 Jul 22 H-E-B #455SAN MARCOSTX $5.82
JANE DOE #1234: Total Transactions $99.99
";
        let err = parse_statement_text(text, 2025).unwrap_err();
        assert!(err.to_string().contains("mismatch"));
    }

    #[test]
    fn test_total_without_rows_is_error() {
        let text = "JANE DOE #1234: Total Transactions $10.00\n";
        assert!(parse_statement_text(text, 2025).is_err());
    }
}
