//! Attribute generator: writes the classified attributes of every listing
//! back out as CSV

use anyhow::{Context, Result};
use serde::Serialize;
use std::collections::BTreeMap;
use std::io::Write;
use std::path::{Path, PathBuf};

use crate::config::ReportConfig;
use crate::ingest::ATTRIBUTE_COLUMNS;
use crate::report::load_classified;
use crate::types::Listing;
use crate::utils::{osc8_file_link, write_with_backup};

#[derive(Debug, Serialize)]
struct AttributeRow<'a> {
    title: &'a str,
    price: f64,
    quantity: u32,
    sale_date: Option<String>,
    brand: &'a str,
    condition: &'static str,
    movement: &'static str,
    department: &'static str,
    line: &'a str,
    model: Option<&'a str>,
    jdm: bool,
    vintage: bool,
    boxed: bool,
    papered: bool,
    collab: bool,
    character: Option<&'a str>,
}

impl<'a> From<&'a Listing> for AttributeRow<'a> {
    fn from(l: &'a Listing) -> Self {
        Self {
            title: &l.title,
            price: l.price,
            quantity: l.quantity,
            sale_date: l.sale_date.map(|d| d.to_string()),
            brand: &l.brand,
            condition: l.condition.as_str(),
            movement: l.movement.as_str(),
            department: l.department.as_str(),
            line: &l.line,
            model: l.model.as_deref(),
            jdm: l.flags.jdm,
            vintage: l.flags.vintage,
            boxed: l.flags.boxed,
            papered: l.flags.papered,
            collab: l.flags.collab,
            character: l.character.as_deref(),
        }
    }
}

/// `sales.csv` -> `sales.attributes.csv`
pub fn default_output(input: &Path) -> PathBuf {
    let stem = input
        .file_stem()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_else(|| "listings".to_string());
    input.with_file_name(format!("{}.attributes.csv", stem))
}

pub fn write_attributes<W: Write>(writer: W, listings: &[Listing]) -> Result<()> {
    let mut wtr = csv::Writer::from_writer(writer);
    for listing in listings {
        wtr.serialize(AttributeRow::from(listing))
            .context("Failed to write attribute row")?;
    }
    wtr.flush()?;
    Ok(())
}

fn count_by<F: Fn(&Listing) -> &str>(listings: &[Listing], key: F) -> BTreeMap<String, usize> {
    let mut counts = BTreeMap::new();
    for l in listings {
        *counts.entry(key(l).to_string()).or_insert(0) += 1;
    }
    counts
}

fn print_counts(label: &str, counts: &BTreeMap<String, usize>) {
    let parts: Vec<String> = counts.iter().map(|(k, n)| format!("{} {}", k, n)).collect();
    println!("  {}: {}", label, parts.join(", "));
}

pub fn run_attributes(input: &Path, output: Option<&Path>, config: Option<&Path>, quiet: bool) -> Result<()> {
    let config = ReportConfig::load(config)?;
    let listings = load_classified(input, ATTRIBUTE_COLUMNS, &config, quiet)?;

    let mut buf = Vec::new();
    write_attributes(&mut buf, &listings)?;
    let output = output.map(Path::to_path_buf).unwrap_or_else(|| default_output(input));
    let csv = String::from_utf8(buf).context("Attribute CSV is not valid UTF-8")?;
    let backup = write_with_backup(&output, &csv)?;

    if !quiet {
        if let Some(backup) = backup {
            println!("Backed up previous file to {}", backup.display());
        }
        print_counts("Conditions", &count_by(&listings, |l| l.condition.as_str()));
        print_counts("Movements", &count_by(&listings, |l| l.movement.as_str()));
        print_counts("Brands", &count_by(&listings, |l| l.brand.as_str()));
        let output_str = output.to_string_lossy();
        println!(
            "Done! Wrote {} listings to {}",
            listings.len(),
            osc8_file_link(&output_str, &output_str)
        );
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    const CSV: &str = "\
title,price,sale date
CASIO G-SHOCK DW-5600 AUTOMATIC,50,2025-06-17
CASIO BAND ONLY,5,
UNKNOWN WATCH,80,
";

    #[test]
    fn test_default_output() {
        assert_eq!(
            default_output(Path::new("data/sales.csv")),
            PathBuf::from("data/sales.attributes.csv")
        );
    }

    #[test]
    fn test_run_attributes_writes_classified_csv() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("sales.csv");
        fs::write(&input, CSV).unwrap();

        run_attributes(&input, None, Some(&write_empty_config(dir.path())), true).unwrap();

        let out = fs::read_to_string(dir.path().join("sales.attributes.csv")).unwrap();
        let mut rdr = csv::Reader::from_reader(out.as_bytes());
        let headers = rdr.headers().unwrap().clone();
        assert_eq!(&headers[0], "title");
        assert_eq!(headers.len(), 16);

        let col = |name: &str| headers.iter().position(|h| h == name).unwrap();
        let rows: Vec<csv::StringRecord> = rdr.records().map(|r| r.unwrap()).collect();
        let conditions: Vec<&str> = rows.iter().map(|r| &r[col("condition")]).collect();
        assert_eq!(conditions, vec!["complete", "parts", "complete"]);
        assert_eq!(&rows[0][col("line")], "G-SHOCK");
        assert_eq!(&rows[0][col("model")], "DW-5600");
        assert_eq!(&rows[0][col("sale_date")], "2025-06-17");
        assert_eq!(&rows[2][col("brand")], "OTHER");
    }

    fn write_empty_config(dir: &Path) -> PathBuf {
        let path = dir.join("watch-report.conl");
        fs::write(&path, "; built-in brands\n").unwrap();
        path
    }
}
