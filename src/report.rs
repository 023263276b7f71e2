use anyhow::{anyhow, Context, Result};
use chrono::Local;
use std::fs;
use std::path::Path;

use crate::classify::classify_listing;
use crate::config::ReportConfig;
use crate::ingest::{load_listings_file, REPORT_COLUMNS};
use crate::region::splice_div;
use crate::render::{assumptions, render_report, render_tab, Tab};
use crate::types::Listing;
use crate::utils::{osc8_file_link, write_with_backup};

/// Load and classify a CSV, warning about rows that had to be skipped
pub fn load_classified(path: &Path, required: &[&str], config: &ReportConfig, quiet: bool) -> Result<Vec<Listing>> {
    if !quiet {
        println!("Loading listings from {}...", path.display());
    }
    let ingested = load_listings_file(path, required)?;
    for skipped in &ingested.skipped {
        eprintln!("Warning: skipping line {}: {}", skipped.line, skipped.reason);
    }

    let listings: Vec<Listing> = ingested
        .rows
        .into_iter()
        .map(|raw| classify_listing(raw, &config.brands))
        .collect();

    if !quiet {
        println!(
            "Loaded {} listings ({} skipped)",
            listings.len(),
            ingested.skipped.len()
        );
    }
    Ok(listings)
}

fn print_written(output: &Path, backup: Option<&Path>) {
    if let Some(backup) = backup {
        println!("Backed up previous report to {}", backup.display());
    }
    let output_str = output.to_string_lossy();
    println!("Done! Wrote {}", osc8_file_link(&output_str, &output_str));
}

/// Regenerate the whole report
pub fn run_report(input: &Path, output: &Path, config: Option<&Path>, quiet: bool) -> Result<()> {
    let config = ReportConfig::load(config)?;
    let listings = load_classified(input, REPORT_COLUMNS, &config, quiet)?;
    if listings.is_empty() {
        eprintln!("Warning: no usable listings in {}", input.display());
    }

    if !quiet {
        println!(
            "Rendering {} tabs ({})...",
            config.brands.len() + 1,
            assumptions(&config.settings)
        );
    }
    let generated = Local::now().format("%Y-%m-%d %H:%M").to_string();
    let html = render_report(&listings, &config, &generated);
    let backup = write_with_backup(output, &html)?;

    if !quiet {
        print_written(output, backup.as_deref());
    }
    Ok(())
}

/// Regenerate one tab (`overview`, a brand name or a tab id) in an existing
/// report. The report is left untouched unless the splice verifies.
pub fn run_rebuild_tab(
    target: &str,
    input: &Path,
    report: &Path,
    config: Option<&Path>,
    quiet: bool,
) -> Result<()> {
    let config = ReportConfig::load(config)?;
    let key = target.trim().trim_start_matches("tab-");
    let tab = if key.eq_ignore_ascii_case("overview") {
        Tab::Overview
    } else {
        let profile = config.brands.find(key).ok_or_else(|| {
            let known: Vec<&str> = config.brands.iter().map(|p| p.name.as_str()).collect();
            anyhow!(
                "Unknown tab '{}'; expected overview or one of: {}",
                target,
                known.join(", ")
            )
        })?;
        Tab::Brand(profile)
    };

    let doc = fs::read_to_string(report)
        .with_context(|| format!("Failed to read report: {}", report.display()))?;
    let listings = load_classified(input, REPORT_COLUMNS, &config, quiet)?;

    let tab_id = tab.id();
    let markup = render_tab(&tab, &listings, &config);
    let updated = splice_div(&doc, &tab_id, &markup)
        .with_context(|| format!("Failed to replace #{} in {}", tab_id, report.display()))?;

    if updated == doc {
        if !quiet {
            println!("#{} is already up to date", tab_id);
        }
        return Ok(());
    }

    let backup = write_with_backup(report, &updated)?;
    if !quiet {
        println!("Replaced #{}", tab_id);
        print_written(report, backup.as_deref());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    const CSV: &str = "\
Title,Price,Quantity,Sale Date
CASIO G-SHOCK DW-5600 AUTOMATIC,50,2,2025-06-17
CASIO BAND ONLY,5,1,2025-06-18
Grand Seiko SBGA211 Spring Drive,\"$4,250\",1,2025-06-20
UNKNOWN WATCH,80,1,
";

    struct Fixture {
        dir: tempfile::TempDir,
    }

    impl Fixture {
        fn new(csv: &str) -> Self {
            let dir = tempfile::tempdir().unwrap();
            fs::write(dir.path().join("sales.csv"), csv).unwrap();
            fs::write(dir.path().join("watch-report.conl"), "top_n = 5\n").unwrap();
            Self { dir }
        }

        fn path(&self, name: &str) -> std::path::PathBuf {
            self.dir.path().join(name)
        }

        fn report(&self) {
            run_report(
                &self.path("sales.csv"),
                &self.path("report.html"),
                Some(&self.path("watch-report.conl")),
                true,
            )
            .unwrap();
        }

        fn rebuild(&self, target: &str) -> Result<()> {
            run_rebuild_tab(
                target,
                &self.path("sales.csv"),
                &self.path("report.html"),
                Some(&self.path("watch-report.conl")),
                true,
            )
        }

        fn backups(&self) -> usize {
            fs::read_dir(self.dir.path())
                .unwrap()
                .filter(|e| e.as_ref().unwrap().file_name().to_string_lossy().contains(".bak."))
                .count()
        }
    }

    #[test]
    fn test_missing_columns_fail_before_writing() {
        let fx = Fixture::new("title,price\nCASIO,1\n");
        let err = run_report(
            &fx.path("sales.csv"),
            &fx.path("report.html"),
            Some(&fx.path("watch-report.conl")),
            true,
        )
        .unwrap_err();
        assert!(format!("{:#}", err).contains("missing required column(s): quantity"));
        assert!(!fx.path("report.html").exists());
    }

    #[test]
    fn test_report_then_rebuild_unchanged_tab_is_a_no_op() {
        let fx = Fixture::new(CSV);
        fx.report();
        let before = fs::read_to_string(fx.path("report.html")).unwrap();
        assert!(before.contains(r#"id="tab-casio""#));

        fx.rebuild("casio").unwrap();
        fx.rebuild("tab-overview").unwrap();
        assert_eq!(fs::read_to_string(fx.path("report.html")).unwrap(), before);
        assert_eq!(fx.backups(), 0);
    }

    #[test]
    fn test_rebuild_tab_picks_up_new_data() {
        let fx = Fixture::new(CSV);
        fx.report();
        let before = fs::read_to_string(fx.path("report.html")).unwrap();

        let more = format!("{}Seiko Presage SARX035 automatic,300,1,2025-06-21\n", CSV);
        fs::write(fx.path("sales.csv"), more).unwrap();
        fx.rebuild("SEIKO").unwrap();

        let after = fs::read_to_string(fx.path("report.html")).unwrap();
        assert_ne!(after, before);
        assert!(after.contains("SARX035"));
        assert_eq!(fx.backups(), 1);

        // Only the SEIKO tab changed
        let casio = |doc: &str| crate::snapshot::extract_tab(doc, "tab-casio").unwrap();
        assert_eq!(casio(&after), casio(&before));
    }

    #[test]
    fn test_rebuild_unknown_or_missing_tab_fails() {
        let fx = Fixture::new(CSV);
        fx.report();
        let err = fx.rebuild("rolex").unwrap_err();
        assert!(err.to_string().contains("Unknown tab 'rolex'"));

        fs::write(fx.path("report.html"), "<html><body><p>old</p></body></html>").unwrap();
        let err = fx.rebuild("casio").unwrap_err();
        assert!(format!("{:#}", err).contains("no <div> with id=\"tab-casio\""));
        assert_eq!(
            fs::read_to_string(fx.path("report.html")).unwrap(),
            "<html><body><p>old</p></body></html>"
        );
    }
}
