//! Report configuration loaded from a CONL file
//!
//! Every key is optional. A minimal file looks like:
//!
//! ```text
//! title = Secondhand watch sales
//! exchange_rate = 152.5
//! fee_rate = 0.18
//! top_n = 30
//! ```

use anyhow::{bail, Context, Result};
use serde::Deserialize;
use std::fs;
use std::path::Path;

use crate::brands::{slugify, BrandProfile, BrandTable};

/// Loaded when `--config` is not given and the file exists
pub const DEFAULT_CONFIG_FILE: &str = "watch-report.conl";

/// Upper bound on `band_cap / band_width`
const MAX_BANDS: f64 = 10_000.0;

const DEFAULT_COLORS: &[&str] = &["#e4572e", "#2e86ab", "#44bba4", "#f3a712", "#8e6c8a", "#5c6f68"];

#[derive(Debug, Default, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
struct ConfigFile {
    title: Option<String>,
    exchange_rate: Option<f64>,
    fee_rate: Option<f64>,
    shipping_cost: Option<f64>,
    band_width: Option<f64>,
    band_cap: Option<f64>,
    top_n: Option<usize>,
    #[serde(default)]
    brands: Vec<BrandConfig>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
struct BrandConfig {
    name: String,
    color: Option<String>,
    #[serde(default)]
    aliases: Vec<String>,
    #[serde(default)]
    lines: Vec<LineConfig>,
    #[serde(default)]
    models: Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
struct LineConfig {
    name: String,
    #[serde(default)]
    keywords: Vec<String>,
}

/// Numeric knobs shared by the aggregator and renderer
#[derive(Debug, Clone, PartialEq)]
pub struct ReportSettings {
    pub title: String,
    /// Sourcing currency units per sale currency unit (JPY per USD)
    pub exchange_rate: f64,
    /// Marketplace fee as a fraction of the sale price
    pub fee_rate: f64,
    /// Shipping cost in sourcing currency
    pub shipping_cost: f64,
    pub band_width: f64,
    pub band_cap: f64,
    pub top_n: usize,
}

impl Default for ReportSettings {
    fn default() -> Self {
        Self {
            title: "Secondhand Watch Sales Report".to_string(),
            exchange_rate: 150.0,
            fee_rate: 0.2,
            shipping_cost: 3000.0,
            band_width: 50.0,
            band_cap: 500.0,
            top_n: 15,
        }
    }
}

#[derive(Debug, Clone)]
pub struct ReportConfig {
    pub settings: ReportSettings,
    pub brands: BrandTable,
}

impl ReportConfig {
    pub fn builtin() -> Result<Self> {
        Ok(Self {
            settings: ReportSettings::default(),
            brands: BrandTable::builtin()?,
        })
    }

    /// Load the given file, or the default file when present, or built-ins
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let path = match path {
            Some(p) => p,
            None => {
                let default = Path::new(DEFAULT_CONFIG_FILE);
                if !default.exists() {
                    return Self::builtin();
                }
                default
            }
        };
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        Self::from_conl(&content)
            .with_context(|| format!("Failed to load config file: {}", path.display()))
    }

    pub fn from_conl(content: &str) -> Result<Self> {
        let has_entries = content.lines().any(|line| {
            let line = line.trim();
            !line.is_empty() && !line.starts_with(';')
        });
        if !has_entries {
            return Self::from_file(ConfigFile::default());
        }
        let file: ConfigFile = serde_conl::from_str(content).context("Failed to parse CONL")?;
        Self::from_file(file)
    }

    fn from_file(file: ConfigFile) -> Result<Self> {
        let defaults = ReportSettings::default();
        let settings = ReportSettings {
            title: file.title.unwrap_or(defaults.title),
            exchange_rate: file.exchange_rate.unwrap_or(defaults.exchange_rate),
            fee_rate: file.fee_rate.unwrap_or(defaults.fee_rate),
            shipping_cost: file.shipping_cost.unwrap_or(defaults.shipping_cost),
            band_width: file.band_width.unwrap_or(defaults.band_width),
            band_cap: file.band_cap.unwrap_or(defaults.band_cap),
            top_n: file.top_n.unwrap_or(defaults.top_n),
        };
        validate(&settings)?;

        let brands = if file.brands.is_empty() {
            BrandTable::builtin()?
        } else {
            let profiles = file
                .brands
                .into_iter()
                .enumerate()
                .map(|(i, b)| brand_profile(b, DEFAULT_COLORS[i % DEFAULT_COLORS.len()]))
                .collect::<Result<Vec<_>>>()?;
            check_tab_slugs(&profiles)?;
            BrandTable::new(profiles)
        };

        Ok(Self { settings, brands })
    }
}

fn brand_profile(config: BrandConfig, fallback_color: &str) -> Result<BrandProfile> {
    if config.name.trim().is_empty() {
        bail!("Brand entry with an empty name");
    }
    let color = config.color.as_deref().unwrap_or(fallback_color);
    let mut profile = BrandProfile::new(&config.name, color).alias(config.aliases.as_slice());
    for line in &config.lines {
        profile = profile.line(&line.name, line.keywords.as_slice());
    }
    for pattern in &config.models {
        profile = profile.model_pattern(pattern)?;
    }
    Ok(profile)
}

/// Every brand needs its own non-empty tab slug that cannot shadow the overview tab
fn check_tab_slugs(profiles: &[BrandProfile]) -> Result<()> {
    let overview = slugify("overview");
    for (i, profile) in profiles.iter().enumerate() {
        let slug = profile.slug();
        if slug.is_empty() {
            bail!(
                "Brand '{}' has no ASCII letters or digits to build a tab id from; use a romanized name and list the original as an alias",
                profile.name
            );
        }
        if slug == overview {
            bail!("Brand '{}' would use the reserved tab id tab-{}", profile.name, slug);
        }
        if let Some(earlier) = profiles[..i].iter().find(|p| p.slug() == slug) {
            bail!(
                "Brands '{}' and '{}' would share the tab id tab-{}",
                earlier.name,
                profile.name,
                slug
            );
        }
    }
    Ok(())
}

fn validate(settings: &ReportSettings) -> Result<()> {
    if !(settings.band_width > 0.0) {
        bail!("band_width must be positive, got {}", settings.band_width);
    }
    if !(settings.band_cap >= settings.band_width) {
        bail!(
            "band_cap ({}) must be at least band_width ({})",
            settings.band_cap,
            settings.band_width
        );
    }
    let bands = settings.band_cap / settings.band_width;
    if !bands.is_finite() || bands > MAX_BANDS {
        bail!(
            "band_cap / band_width gives {} price bands, at most {} are allowed",
            bands,
            MAX_BANDS
        );
    }
    if !(0.0..1.0).contains(&settings.fee_rate) {
        bail!("fee_rate must be in [0, 1), got {}", settings.fee_rate);
    }
    if !(settings.exchange_rate > 0.0) {
        bail!("exchange_rate must be positive, got {}", settings.exchange_rate);
    }
    if settings.shipping_cost < 0.0 {
        bail!("shipping_cost must not be negative, got {}", settings.shipping_cost);
    }
    if settings.top_n == 0 {
        bail!("top_n must be at least 1");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scalar_settings() {
        let config = ReportConfig::from_conl("exchange_rate = 140\nfee_rate = 0.15\ntop_n = 30\n").unwrap();
        assert_eq!(config.settings.exchange_rate, 140.0);
        assert_eq!(config.settings.fee_rate, 0.15);
        assert_eq!(config.settings.top_n, 30);
        assert_eq!(config.settings.band_width, 50.0);
        assert_eq!(config.brands.len(), 4);
    }

    #[test]
    fn test_brand_list_from_conl() {
        let content = "\
top_n = 10
brands
  =
    name = tissot
    color = #7b2cbf
    lines
      =
        name = PRX
        keywords
          = PRX
    models
      = (T[0-9]{3})
";
        let config = ReportConfig::from_conl(content).unwrap();
        assert_eq!(config.settings.top_n, 10);
        let tissot = config.brands.get("TISSOT").unwrap();
        assert_eq!(tissot.color, "#7b2cbf");
        assert_eq!(tissot.line_for("Tissot PRX 40"), "PRX");
        assert_eq!(tissot.extract_model("tissot t137"), Some("T137".to_string()));
    }

    #[test]
    fn test_empty_file_uses_defaults() {
        let config = ReportConfig::from_conl("").unwrap();
        assert_eq!(config.settings, ReportSettings::default());
    }

    #[test]
    fn test_invalid_settings_fail() {
        let err = ReportConfig::from_file(ConfigFile {
            fee_rate: Some(1.5),
            ..Default::default()
        })
        .unwrap_err();
        assert!(err.to_string().contains("fee_rate"));

        let err = ReportConfig::from_file(ConfigFile {
            band_width: Some(0.0),
            ..Default::default()
        })
        .unwrap_err();
        assert!(err.to_string().contains("band_width"));

        for (width, cap) in [(0.5, 1e300), (1.0, 1e10), (1.0, f64::INFINITY)] {
            let err = ReportConfig::from_file(ConfigFile {
                band_width: Some(width),
                band_cap: Some(cap),
                ..Default::default()
            })
            .unwrap_err();
            assert!(err.to_string().contains("price bands"), "{}", err);
        }
        let ok = ReportConfig::from_file(ConfigFile {
            band_width: Some(1.0),
            band_cap: Some(10_000.0),
            ..Default::default()
        });
        assert!(ok.is_ok());
    }

    fn named(name: &str) -> BrandConfig {
        BrandConfig {
            name: name.to_string(),
            color: None,
            aliases: vec![],
            lines: vec![],
            models: vec![],
        }
    }

    fn brands_error(names: &[&str]) -> String {
        ReportConfig::from_file(ConfigFile {
            brands: names.iter().map(|n| named(n)).collect(),
            ..Default::default()
        })
        .unwrap_err()
        .to_string()
    }

    #[test]
    fn test_brand_tab_ids_must_be_unique() {
        assert!(brands_error(&["セイコー"]).contains("no ASCII letters"));
        assert!(brands_error(&["Overview"]).contains("reserved tab id tab-overview"));
        assert_eq!(
            brands_error(&["Grand Seiko", "grand-seiko"]),
            "Brands 'GRAND SEIKO' and 'GRAND-SEIKO' would share the tab id tab-grand-seiko"
        );

        let ok = ReportConfig::from_file(ConfigFile {
            brands: vec![named("Seiko"), named("Grand Seiko")],
            ..Default::default()
        })
        .unwrap();
        let ids: Vec<String> = ok.brands.iter().map(|p| p.tab_id()).collect();
        assert_eq!(ids, vec!["tab-seiko", "tab-grand-seiko"]);
    }

    #[test]
    fn test_brand_entries_replace_builtins() {
        let file = ConfigFile {
            brands: vec![BrandConfig {
                name: "tissot".to_string(),
                color: None,
                aliases: vec![],
                lines: vec![LineConfig {
                    name: "PRX".to_string(),
                    keywords: vec!["prx".to_string()],
                }],
                models: vec![r"\b(T[0-9]{3}\.[0-9]{3})".to_string()],
            }],
            ..Default::default()
        };
        let config = ReportConfig::from_file(file).unwrap();
        assert_eq!(config.brands.len(), 1);
        let tissot = config.brands.get("TISSOT").unwrap();
        assert_eq!(tissot.color, DEFAULT_COLORS[0]);
        assert_eq!(tissot.line_for("Tissot PRX Powermatic"), "PRX");
        assert_eq!(tissot.extract_model("TISSOT T137.407"), Some("T137.407".to_string()));
    }
}
