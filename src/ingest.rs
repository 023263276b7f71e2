//! CSV ingest with column-presence validation

use anyhow::{Context, Result};
use chrono::{DateTime, NaiveDate, NaiveDateTime};
use std::collections::HashMap;
use std::fs::File;
use std::io::Read;
use std::path::Path;
use thiserror::Error;

use crate::types::RawListing;

pub const TITLE: &str = "title";
pub const PRICE: &str = "price";
pub const QUANTITY: &str = "quantity";
pub const CONDITION: &str = "condition";
pub const DEPARTMENT: &str = "department";
pub const MOVEMENT: &str = "movement";
pub const SALE_DATE: &str = "sale_date";
pub const BRAND: &str = "brand";

/// Columns the attribute generator needs
pub const ATTRIBUTE_COLUMNS: &[&str] = &[TITLE, PRICE];
/// Columns the report needs
pub const REPORT_COLUMNS: &[&str] = &[TITLE, PRICE, QUANTITY];

#[derive(Debug, Error, PartialEq, Eq)]
pub enum IngestError {
    #[error("CSV is missing required column(s): {}", .0.join(", "))]
    MissingColumns(Vec<String>),
}

/// A row that could not be used, with the reason
#[derive(Debug, Clone, PartialEq)]
pub struct SkippedRow {
    /// 1-based line number in the file (header is line 1)
    pub line: usize,
    pub reason: String,
}

#[derive(Debug, Clone, Default)]
pub struct Ingested {
    pub rows: Vec<RawListing>,
    pub skipped: Vec<SkippedRow>,
}

/// Normalize a header cell: trimmed, lowercase, spaces and hyphens as `_`
fn normalize_header(h: &str) -> String {
    h.trim()
        .trim_start_matches('\u{feff}')
        .to_lowercase()
        .replace([' ', '-'], "_")
}

/// Parse a price cell such as "$1,234.50", "US $80" or "¥12,000"
pub fn parse_price(s: &str) -> Option<f64> {
    let s = s.trim();
    let s = s.strip_prefix("US").unwrap_or(s);
    let cleaned: String = s
        .chars()
        .filter(|c| !matches!(c, '$' | '¥' | '￥' | ',' | ' '))
        .collect();
    let value: f64 = cleaned.parse().ok()?;
    if value.is_finite() && value >= 0.0 {
        Some(value)
    } else {
        None
    }
}

/// Parse a quantity cell; blank means one sale
pub fn parse_quantity(s: &str) -> Option<u32> {
    let s = s.trim().replace(',', "");
    if s.is_empty() {
        return Some(1);
    }
    if let Ok(q) = s.parse::<u32>() {
        return Some(q);
    }
    let f: f64 = s.parse().ok()?;
    if f >= 0.0 && f.fract() == 0.0 && f <= u32::MAX as f64 {
        Some(f as u32)
    } else {
        None
    }
}

/// Parse a sale date in any of the accepted formats; None when unrecognized
pub fn parse_sale_date(s: &str) -> Option<NaiveDate> {
    let s = s.trim();
    if s.is_empty() {
        return None;
    }
    for fmt in ["%Y-%m-%d", "%Y/%m/%d", "%m/%d/%Y", "%b %d, %Y", "%B %d, %Y"] {
        if let Ok(d) = NaiveDate::parse_from_str(s, fmt) {
            return Some(d);
        }
    }
    for fmt in ["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S", "%Y/%m/%d %H:%M"] {
        if let Ok(dt) = NaiveDateTime::parse_from_str(s, fmt) {
            return Some(dt.date());
        }
    }
    DateTime::parse_from_rfc3339(s).ok().map(|dt| dt.date_naive())
}

fn optional_cell(record: &csv::StringRecord, idx: Option<usize>) -> Option<String> {
    let value = record.get(idx?)?.trim();
    if value.is_empty() {
        None
    } else {
        Some(value.to_string())
    }
}

/// Load listings from a CSV reader, failing if any `required` column is absent
pub fn load_listings<R: Read>(reader: R, required: &[&str]) -> Result<Ingested> {
    let mut csv_reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(reader);

    let headers = csv_reader.headers().context("Failed to read CSV header")?.clone();
    let columns: HashMap<String, usize> = headers
        .iter()
        .enumerate()
        .map(|(i, h)| (normalize_header(h), i))
        .collect();

    let missing: Vec<String> = required
        .iter()
        .filter(|c| !columns.contains_key(**c))
        .map(|c| c.to_string())
        .collect();
    if !missing.is_empty() {
        return Err(IngestError::MissingColumns(missing).into());
    }

    let col = |name: &str| columns.get(name).copied();
    let (title_idx, price_idx) = (col(TITLE), col(PRICE));

    let mut ingested = Ingested::default();
    for (i, result) in csv_reader.records().enumerate() {
        let line = i + 2;
        let record = result.with_context(|| format!("CSV parse error at line {}", line))?;

        let title = optional_cell(&record, title_idx).unwrap_or_default();
        if title.is_empty() {
            ingested.skipped.push(SkippedRow {
                line,
                reason: "empty title".to_string(),
            });
            continue;
        }

        let price_cell = optional_cell(&record, price_idx).unwrap_or_default();
        let Some(price) = parse_price(&price_cell) else {
            ingested.skipped.push(SkippedRow {
                line,
                reason: format!("invalid price '{}'", price_cell),
            });
            continue;
        };

        let quantity_cell = optional_cell(&record, col(QUANTITY)).unwrap_or_default();
        let Some(quantity) = parse_quantity(&quantity_cell) else {
            ingested.skipped.push(SkippedRow {
                line,
                reason: format!("invalid quantity '{}'", quantity_cell),
            });
            continue;
        };

        ingested.rows.push(RawListing {
            title,
            price,
            quantity,
            sale_date: optional_cell(&record, col(SALE_DATE)).and_then(|d| parse_sale_date(&d)),
            brand: optional_cell(&record, col(BRAND)),
            condition: optional_cell(&record, col(CONDITION)),
            department: optional_cell(&record, col(DEPARTMENT)),
            movement: optional_cell(&record, col(MOVEMENT)),
        });
    }

    Ok(ingested)
}

pub fn load_listings_file(path: &Path, required: &[&str]) -> Result<Ingested> {
    let file = File::open(path).with_context(|| format!("Failed to open CSV: {}", path.display()))?;
    load_listings(file, required).with_context(|| format!("Failed to load {}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE_CSV: &str = "\
Title,Price,Quantity,Condition,Department,Movement,Sale Date,Brand
CASIO G-SHOCK DW-5600 AUTOMATIC,$50.00,2,,,,2025-06-17,CASIO
CASIO BAND ONLY,5,,parts,,,06/20/2025,
Grand Seiko SBGA211,\"$4,250.00\",1,,Men,Spring Drive,\"Jun 21, 2025\",SEIKO
Broken price,abc,1,,,,,
Negative,-5,1,,,,,
";

    #[test]
    fn test_load_sample_csv() {
        let ingested = load_listings(SAMPLE_CSV.as_bytes(), REPORT_COLUMNS).unwrap();
        assert_eq!(ingested.rows.len(), 3);

        let first = &ingested.rows[0];
        assert_eq!(first.title, "CASIO G-SHOCK DW-5600 AUTOMATIC");
        assert_eq!(first.price, 50.0);
        assert_eq!(first.quantity, 2);
        assert_eq!(first.sale_date, NaiveDate::from_ymd_opt(2025, 6, 17));
        assert_eq!(first.brand.as_deref(), Some("CASIO"));
        assert_eq!(first.condition, None);

        let second = &ingested.rows[1];
        assert_eq!(second.quantity, 1);
        assert_eq!(second.brand, None);
        assert_eq!(second.condition.as_deref(), Some("parts"));
        assert_eq!(second.sale_date, NaiveDate::from_ymd_opt(2025, 6, 20));

        let third = &ingested.rows[2];
        assert_eq!(third.price, 4250.0);
        assert_eq!(third.sale_date, NaiveDate::from_ymd_opt(2025, 6, 21));
        assert_eq!(third.movement.as_deref(), Some("Spring Drive"));
    }

    #[test]
    fn test_bad_rows_are_skipped_with_line_numbers() {
        let ingested = load_listings(SAMPLE_CSV.as_bytes(), REPORT_COLUMNS).unwrap();
        let lines: Vec<usize> = ingested.skipped.iter().map(|s| s.line).collect();
        assert_eq!(lines, vec![5, 6]);
        assert!(ingested.skipped[0].reason.contains("abc"));
    }

    #[test]
    fn test_missing_columns_are_all_listed() {
        let csv = "name,cost\nfoo,1\n";
        let err = load_listings(csv.as_bytes(), REPORT_COLUMNS).unwrap_err();
        let ingest_err = err.downcast_ref::<IngestError>().unwrap();
        assert_eq!(
            ingest_err,
            &IngestError::MissingColumns(vec![
                "title".to_string(),
                "price".to_string(),
                "quantity".to_string()
            ])
        );
        assert_eq!(
            err.to_string(),
            "CSV is missing required column(s): title, price, quantity"
        );
    }

    #[test]
    fn test_attribute_columns_do_not_need_quantity() {
        let csv = "title,price\nSeiko watch,10\n";
        let ingested = load_listings(csv.as_bytes(), ATTRIBUTE_COLUMNS).unwrap();
        assert_eq!(ingested.rows[0].quantity, 1);
    }

    #[test]
    fn test_parse_price() {
        assert_eq!(parse_price("US $1,234.50"), Some(1234.5));
        assert_eq!(parse_price("¥12,000"), Some(12000.0));
        assert_eq!(parse_price(" 80 "), Some(80.0));
        assert_eq!(parse_price("-1"), None);
        assert_eq!(parse_price(""), None);
        assert_eq!(parse_price("NaN"), None);
    }

    #[test]
    fn test_parse_sale_date_formats() {
        let expected = NaiveDate::from_ymd_opt(2025, 7, 4);
        for s in [
            "2025-07-04",
            "2025/07/04",
            "07/04/2025",
            "Jul 04, 2025",
            "July 4, 2025",
            "2025-07-04 13:45:00",
            "2025-07-04T13:45:00+09:00",
        ] {
            assert_eq!(parse_sale_date(s), expected, "{}", s);
        }
        assert_eq!(parse_sale_date("sometime"), None);
    }
}
