//! Brand profiles: line taxonomy, model-number patterns and chart colors
//!
//! A profile is pure data. The built-in tables below are the defaults; a
//! config file can replace them (see `config.rs`).

use anyhow::{Context, Result};
use regex::Regex;

/// Brand bucket for listings that name no configured brand
pub const OTHER_BRAND: &str = "OTHER";

#[derive(Debug, Clone)]
pub struct LineRule {
    pub name: String,
    /// Upper-cased substrings
    pub keywords: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct BrandProfile {
    /// Upper-cased brand name, also the grouping key
    pub name: String,
    pub color: String,
    /// Title keywords that identify the brand besides its name
    pub aliases: Vec<String>,
    pub lines: Vec<LineRule>,
    pub models: Vec<Regex>,
}

impl BrandProfile {
    pub fn new(name: &str, color: &str) -> Self {
        Self {
            name: name.trim().to_uppercase(),
            color: color.to_string(),
            aliases: Vec::new(),
            lines: Vec::new(),
            models: Vec::new(),
        }
    }

    pub fn alias<S: AsRef<str>>(mut self, aliases: &[S]) -> Self {
        self.aliases
            .extend(aliases.iter().map(|a| a.as_ref().to_uppercase()));
        self
    }

    /// Append a line; lines are matched in insertion order
    pub fn line<S: AsRef<str>>(mut self, name: &str, keywords: &[S]) -> Self {
        self.lines.push(LineRule {
            name: name.to_string(),
            keywords: keywords.iter().map(|k| k.as_ref().to_uppercase()).collect(),
        });
        self
    }

    /// Append a model-number pattern; capture group 1 is the model when present
    pub fn model_pattern(mut self, pattern: &str) -> Result<Self> {
        let re = Regex::new(pattern)
            .with_context(|| format!("Invalid model pattern for {}: {}", self.name, pattern))?;
        self.models.push(re);
        Ok(self)
    }

    pub fn other_line(&self) -> String {
        format!("other-{}", self.name)
    }

    /// First line whose keyword occurs in the title, or `other-<BRAND>`
    pub fn line_for(&self, title: &str) -> String {
        let upper = title.to_uppercase();
        self.lines
            .iter()
            .find(|line| line.keywords.iter().any(|k| upper.contains(k.as_str())))
            .map(|line| line.name.clone())
            .unwrap_or_else(|| self.other_line())
    }

    /// First model number matched by the brand's patterns, in pattern order
    pub fn extract_model(&self, title: &str) -> Option<String> {
        let upper = title.to_uppercase();
        self.models.iter().find_map(|re| {
            let caps = re.captures(&upper)?;
            caps.get(1)
                .or_else(|| caps.get(0))
                .map(|m| m.as_str().to_string())
        })
    }

    pub fn matches_title(&self, upper_title: &str) -> bool {
        upper_title.contains(self.name.as_str())
            || self.aliases.iter().any(|a| upper_title.contains(a.as_str()))
    }

    pub fn slug(&self) -> String {
        slugify(&self.name)
    }

    pub fn tab_id(&self) -> String {
        format!("tab-{}", self.slug())
    }
}

/// Lowercase, with runs of non-alphanumerics collapsed to single hyphens
pub fn slugify(name: &str) -> String {
    name.to_lowercase()
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() { c } else { '-' })
        .collect::<String>()
        .split('-')
        .filter(|s| !s.is_empty())
        .collect::<Vec<_>>()
        .join("-")
}

/// Ordered set of brand profiles
#[derive(Debug, Clone, Default)]
pub struct BrandTable {
    profiles: Vec<BrandProfile>,
}

impl BrandTable {
    pub fn new(profiles: Vec<BrandProfile>) -> Self {
        Self { profiles }
    }

    pub fn builtin() -> Result<Self> {
        Ok(Self::new(vec![casio()?, seiko()?, citizen()?, orient()?]))
    }

    pub fn get(&self, name: &str) -> Option<&BrandProfile> {
        let name = name.trim();
        self.profiles
            .iter()
            .find(|p| p.name.eq_ignore_ascii_case(name))
    }

    /// Resolve a profile by brand name or tab slug
    pub fn find(&self, key: &str) -> Option<&BrandProfile> {
        self.get(key).or_else(|| {
            let slug = slugify(key);
            self.profiles.iter().find(|p| p.slug() == slug)
        })
    }

    /// First profile whose name or alias occurs in the title
    pub fn detect(&self, title: &str) -> Option<&BrandProfile> {
        let upper = title.to_uppercase();
        self.profiles.iter().find(|p| p.matches_title(&upper))
    }

    pub fn iter(&self) -> impl Iterator<Item = &BrandProfile> {
        self.profiles.iter()
    }

    pub fn len(&self) -> usize {
        self.profiles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.profiles.is_empty()
    }
}

fn casio() -> Result<BrandProfile> {
    BrandProfile::new("CASIO", "#e4572e")
        .alias(&["G-SHOCK", "G SHOCK", "BABY-G", "PRO TREK", "OCEANUS"])
        // BGA-/BGD- contain GA-/GD-, so Baby-G is tested first
        .line("BABY-G", &["BABY-G", "BABY G", "BGD-", "BGA-"])
        .line(
            "G-SHOCK",
            &[
                "G-SHOCK", "G SHOCK", "GSHOCK", "DW-", "GA-", "GW-", "GMW-", "GM-", "GBD-", "GST-",
                "GBA-", "GD-", "GWG-", "GPR-", "MTG-", "MRG-", "MUDMASTER", "FROGMAN", "RANGEMAN",
            ],
        )
        .line("PRO TREK", &["PRO TREK", "PROTREK", "PRW-", "PRG-"])
        .line("OCEANUS", &["OCEANUS", "OCW-"])
        .line("EDIFICE", &["EDIFICE", "EQB-", "EFR-", "EFV-"])
        .line(
            "Classic digital",
            &["F-91", "F91W", "A168", "A158", "A700", "DATA BANK", "DATABANK", "CA-53", "AE-1200"],
        )
        .model_pattern(
            r"\b((?:DW|GA|GW|GMW|GM|GBD|GST|GBA|GD|GWG|GPR|MTG|MRG|BGD|BGA|PRW|PRG|OCW|EQB|EFR|EFV)-[A-Z]?[0-9]{3,5}[A-Z]{0,2})",
        )?
        .model_pattern(r"\b((?:A|F|AE|W|LA|AQ|CA|DB)-?[0-9]{2,4}[A-Z]{0,2})\b")
}

fn seiko() -> Result<BrandProfile> {
    BrandProfile::new("SEIKO", "#2e86ab")
        .alias(&["GRAND SEIKO", "KING SEIKO", "CREDOR", "PROSPEX", "PRESAGE"])
        .line(
            "Grand Seiko",
            &["GRAND SEIKO", "SBGA", "SBGH", "SBGJ", "SBGR", "SBGW", "SBGX", "SBGY", "SBGM"],
        )
        .line("Credor", &["CREDOR"])
        .line("King Seiko", &["KING SEIKO"])
        .line("Lord Marvel", &["LORD MARVEL", "LORD MATIC", "LORDMATIC"])
        .line(
            "Seiko 5",
            &["SEIKO 5", "SEIKO5", "5 SPORTS", "SNK", "SNZG", "SRPD", "SRPE", "SBSA"],
        )
        .line(
            "Prospex",
            &["PROSPEX", "SBDC", "SBDY", "SBDX", "SPB", "SRP", "TURTLE", "SAMURAI", "SUMO", "MONSTER"],
        )
        .line("Presage", &["PRESAGE", "SARX", "SARY", "SSA", "COCKTAIL"])
        .line("Astron", &["ASTRON", "SBXB", "SBXC", "SSH", "SSE"])
        .line("Dolce & Exceline", &["DOLCE", "EXCELINE"])
        .line("Spirit", &["SPIRIT", "SBTM"])
        .line("Alba", &["ALBA"])
        .line("Lukia", &["LUKIA"])
        .model_pattern(r"\b(S[A-Z]{2,3}[0-9]{2,3}[A-Z]?[0-9]?)\b")?
        .model_pattern(r"\b([0-9]{4}-[0-9]{4})\b")
}

fn citizen() -> Result<BrandProfile> {
    BrandProfile::new("CITIZEN", "#44bba4")
        .alias(&["ECO-DRIVE", "PROMASTER", "CAMPANOLA"])
        .line("The Citizen", &["THE CITIZEN"])
        .line("Campanola", &["CAMPANOLA"])
        .line("Promaster", &["PROMASTER", "PRO MASTER", "NY0", "BN0", "BJ8"])
        .line("Attesa", &["ATTESA"])
        .line("Exceed", &["EXCEED"])
        .line("xC", &["CROSS SEA", "CROSSSEA", " XC "])
        .line("Series 8", &["SERIES 8", "SERIES8"])
        .line(
            "Vintage",
            &["CHALLENGE TIMER", "LEOPARD", "CRYSTRON", "SEVEN STAR", "HOMER"],
        )
        .line("Eco-Drive", &["ECO-DRIVE", "ECO DRIVE"])
        .model_pattern(r"\b([A-Z]{2}[0-9]{4}-[0-9A-Z]{2,4})\b")?
        .model_pattern(r"\b([A-Z][0-9]{3}-[A-Z0-9]{6})\b")
}

fn orient() -> Result<BrandProfile> {
    BrandProfile::new("ORIENT", "#f3a712")
        .alias(&["ORIENT STAR", "ORIENTSTAR"])
        .line("Orient Star", &["ORIENT STAR", "ORIENTSTAR"])
        .line("Royal Orient", &["ROYAL ORIENT"])
        .line("Bambino", &["BAMBINO"])
        .line("Divers", &["MAKO", "KAMASU", "RAY II", "RAY RAVEN", "DIVER"])
        .line("King Master", &["KING MASTER", "KINGMASTER"])
        .model_pattern(r"\b((?:RA|FAC|FAA|FEM|FER|SEL|SAA|SAF|WZ|RN)-?[A-Z]{0,2}[0-9]{2,4}[A-Z0-9]*)\b")
}
