//! Golden master snapshots of report tabs
//!
//! `save` stores a tab's element as rendered; `check` compares the current
//! report's tab with the stored one and lists anything that went missing:
//! a table id, body rows of a table, or a heading.

use anyhow::{anyhow, bail, Context, Result};
use scraper::{ElementRef, Html, Selector};
use std::fs;
use std::path::{Path, PathBuf};

use crate::region::{count_id, RegionError};
use crate::utils::osc8_file_link;

/// Headings and table sizes of a tab
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ContentSummary {
    /// `(table id, body row count)` in document order
    pub tables: Vec<(String, usize)>,
    pub headings: Vec<String>,
}

fn selector(css: &str) -> Result<Selector> {
    Selector::parse(css).map_err(|e| anyhow!("Invalid selector {}: {:?}", css, e))
}

/// Outer HTML of the element with `id`
pub fn extract_tab(doc: &str, id: &str) -> Result<String, RegionError> {
    match count_id(doc, id)? {
        0 => return Err(RegionError::NotFound(id.to_string())),
        1 => {}
        count => {
            return Err(RegionError::Duplicate {
                id: id.to_string(),
                count,
            })
        }
    }
    let html = Html::parse_document(doc);
    let by_id = Selector::parse(&format!("[id=\"{}\"]", id))
        .map_err(|_| RegionError::InvalidId(id.to_string()))?;
    html.select(&by_id)
        .next()
        .map(|el| el.html())
        .ok_or_else(|| RegionError::NotFound(id.to_string()))
}

fn text_of(el: ElementRef) -> String {
    el.text()
        .collect::<String>()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

pub fn summarize(fragment: &str) -> Result<ContentSummary> {
    let html = Html::parse_fragment(fragment);
    let tables = selector("table[id]")?;
    let rows = selector("tbody > tr")?;
    let headings = selector("h1, h2, h3, h4")?;

    Ok(ContentSummary {
        tables: html
            .select(&tables)
            .filter_map(|t| {
                let id = t.value().attr("id")?;
                Some((id.to_string(), t.select(&rows).count()))
            })
            .collect(),
        headings: html.select(&headings).map(text_of).collect(),
    })
}

/// Human-readable list of content in `saved` that `current` no longer has
pub fn lost_content(saved: &ContentSummary, current: &ContentSummary) -> Vec<String> {
    let mut lost = Vec::new();
    for (id, saved_rows) in &saved.tables {
        match current.tables.iter().find(|(cid, _)| cid == id) {
            None => lost.push(format!("table #{} is missing", id)),
            Some((_, rows)) if rows < saved_rows => lost.push(format!(
                "table #{} has {} rows, snapshot had {}",
                id, rows, saved_rows
            )),
            Some(_) => {}
        }
    }
    for heading in &saved.headings {
        if !current.headings.contains(heading) {
            lost.push(format!("heading \"{}\" is missing", heading));
        }
    }
    lost
}

/// Text of every `td.num` cell of a table, parsed back to numbers
pub fn numeric_cells(fragment: &str, table_id: &str) -> Result<Vec<Vec<f64>>> {
    let html = Html::parse_fragment(fragment);
    let rows = selector(&format!("table[id=\"{}\"] tbody > tr", table_id))?;
    let cells = selector("td.num")?;
    Ok(html
        .select(&rows)
        .map(|row| {
            row.select(&cells)
                .filter_map(|td| parse_number(&text_of(td)))
                .collect()
        })
        .collect())
}

/// Parse a rendered number such as `1,234.50`
pub fn parse_number(s: &str) -> Option<f64> {
    s.trim().replace(',', "").parse().ok()
}

pub fn snapshot_path(dir: &Path, tab_id: &str) -> PathBuf {
    dir.join(format!("{}.html", tab_id))
}

fn read_report(report: &Path) -> Result<String> {
    fs::read_to_string(report).with_context(|| format!("Failed to read report: {}", report.display()))
}

pub fn run_snapshot_save(tab_id: &str, report: &Path, dir: &Path, quiet: bool) -> Result<()> {
    let doc = read_report(report)?;
    let tab = extract_tab(&doc, tab_id).with_context(|| format!("In {}", report.display()))?;
    let summary = summarize(&tab)?;

    fs::create_dir_all(dir).with_context(|| format!("Failed to create {}", dir.display()))?;
    let path = snapshot_path(dir, tab_id);
    fs::write(&path, &tab).with_context(|| format!("Failed to write {}", path.display()))?;

    if !quiet {
        println!(
            "Saved {} ({} tables, {} headings) to {}",
            tab_id,
            summary.tables.len(),
            summary.headings.len(),
            osc8_file_link(&path.to_string_lossy(), &path.to_string_lossy())
        );
    }
    Ok(())
}

pub fn run_snapshot_check(tab_id: &str, report: &Path, dir: &Path, quiet: bool) -> Result<()> {
    let path = snapshot_path(dir, tab_id);
    let saved = fs::read_to_string(&path)
        .with_context(|| format!("No snapshot for {} at {}", tab_id, path.display()))?;
    let doc = read_report(report)?;
    let current = extract_tab(&doc, tab_id).with_context(|| format!("In {}", report.display()))?;

    let lost = lost_content(&summarize(&saved)?, &summarize(&current)?);
    if !lost.is_empty() {
        for item in &lost {
            eprintln!("  {}", item);
        }
        bail!("{} lost {} item(s) compared to {}", tab_id, lost.len(), path.display());
    }

    if !quiet {
        println!("{} matches snapshot {}", tab_id, path.display());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    const REPORT: &str = r#"<!DOCTYPE html><html><body>
<div id="tab-casio" class="tab-panel">
<h2>CASIO</h2>
<section class="card"><h3>Lines</h3>
<table id="tab-casio-lines" class="stats">
<thead><tr><th>Line</th><th>Sold</th></tr></thead>
<tbody>
<tr><td>G-SHOCK</td><td class="num">1,204</td></tr>
<tr><td>BABY-G</td><td class="num">37.50</td></tr>
</tbody>
</table>
</section>
</div>
</body></html>
"#;

    #[test]
    fn test_extract_and_summarize() {
        let tab = extract_tab(REPORT, "tab-casio").unwrap();
        assert!(tab.starts_with("<div"));
        assert!(tab.contains(r#"id="tab-casio""#));
        assert!(!tab.contains("<body>"));
        let summary = summarize(&tab).unwrap();
        assert_eq!(summary.tables, vec![("tab-casio-lines".to_string(), 2)]);
        assert_eq!(summary.headings, vec!["CASIO", "Lines"]);
    }

    #[test]
    fn test_extract_missing_tab() {
        assert_eq!(
            extract_tab(REPORT, "tab-seiko"),
            Err(RegionError::NotFound("tab-seiko".to_string()))
        );
    }

    #[test]
    fn test_numeric_cells() {
        assert_eq!(
            numeric_cells(REPORT, "tab-casio-lines").unwrap(),
            vec![vec![1204.0], vec![37.5]]
        );
        assert_eq!(parse_number(" 12,000 "), Some(12000.0));
        assert_eq!(parse_number("-"), None);
    }

    #[test]
    fn test_lost_content() {
        let saved = ContentSummary {
            tables: vec![("a".to_string(), 3), ("b".to_string(), 1)],
            headings: vec!["Lines".to_string(), "Models".to_string()],
        };
        let current = ContentSummary {
            tables: vec![("a".to_string(), 2), ("c".to_string(), 9)],
            headings: vec!["Lines".to_string()],
        };
        assert_eq!(
            lost_content(&saved, &current),
            vec![
                "table #a has 2 rows, snapshot had 3".to_string(),
                "table #b is missing".to_string(),
                "heading \"Models\" is missing".to_string(),
            ]
        );
        assert!(lost_content(&current, &current).is_empty());
    }

    #[test]
    fn test_save_then_check() {
        let dir = tempfile::tempdir().unwrap();
        let report = dir.path().join("report.html");
        let snapshots = dir.path().join("snapshots");
        fs::write(&report, REPORT).unwrap();

        run_snapshot_save("tab-casio", &report, &snapshots, true).unwrap();
        assert!(snapshot_path(&snapshots, "tab-casio").exists());
        run_snapshot_check("tab-casio", &report, &snapshots, true).unwrap();

        let shrunk = REPORT.replace("<tr><td>BABY-G</td><td class=\"num\">37.50</td></tr>\n", "");
        fs::write(&report, shrunk).unwrap();
        let err = run_snapshot_check("tab-casio", &report, &snapshots, true).unwrap_err();
        assert!(err.to_string().contains("lost 1 item(s)"));
    }
}
