//! Grouping and per-brand summaries
//!
//! Groups keep the order in which their key was first seen. Rankings use a
//! stable sort, so groups with equal sold quantity stay in first-seen order.

use chrono::NaiveDate;
use std::collections::{BTreeMap, HashMap};

use crate::config::ReportSettings;
use crate::stats::{breakeven_ceiling, median, PriceBands, PriceStats};
use crate::types::{Condition, Listing};

/// Aggregate for one grouping key
#[derive(Debug, Clone, PartialEq)]
pub struct GroupStats {
    pub key: String,
    /// Total units sold
    pub quantity: u64,
    pub prices: PriceStats,
    /// Sourcing ceiling derived from the median price
    pub ceiling: f64,
}

impl GroupStats {
    fn from_listings(key: String, listings: &[&Listing], settings: &ReportSettings) -> Self {
        let prices: Vec<f64> = listings.iter().map(|l| l.price).collect();
        let stats = PriceStats::from_prices(&prices);
        Self {
            key,
            quantity: listings.iter().map(|l| l.quantity as u64).sum(),
            ceiling: breakeven_ceiling(stats.median, settings),
            prices: stats,
        }
    }

    pub fn listings(&self) -> usize {
        self.prices.count
    }
}

/// Group listings by key in first-seen order; a `None` key drops the listing
pub fn group_by<'a, F>(listings: &'a [Listing], key: F) -> Vec<(String, Vec<&'a Listing>)>
where
    F: Fn(&Listing) -> Option<String>,
{
    let mut index: HashMap<String, usize> = HashMap::new();
    let mut groups: Vec<(String, Vec<&Listing>)> = Vec::new();
    for listing in listings {
        let Some(k) = key(listing) else { continue };
        match index.get(&k) {
            Some(&i) => groups[i].1.push(listing),
            None => {
                index.insert(k.clone(), groups.len());
                groups.push((k, vec![listing]));
            }
        }
    }
    groups
}

pub fn aggregate<F>(listings: &[Listing], key: F, settings: &ReportSettings) -> Vec<GroupStats>
where
    F: Fn(&Listing) -> Option<String>,
{
    group_by(listings, key)
        .into_iter()
        .map(|(k, members)| GroupStats::from_listings(k, &members, settings))
        .collect()
}

/// Sort by sold quantity, descending; ties keep their input order
pub fn rank_by_quantity(mut groups: Vec<GroupStats>) -> Vec<GroupStats> {
    groups.sort_by(|a, b| b.quantity.cmp(&a.quantity));
    groups
}

/// The `n` best-selling groups
pub fn top_n(groups: Vec<GroupStats>, n: usize) -> Vec<GroupStats> {
    let mut ranked = rank_by_quantity(groups);
    ranked.truncate(n);
    ranked
}

/// Median price of JDM listings over the median of the rest
pub fn jdm_premium(listings: &[&Listing]) -> Option<f64> {
    let (jdm, other): (Vec<&Listing>, Vec<&Listing>) =
        listings.iter().copied().partition(|l| l.flags.jdm);
    if jdm.is_empty() || other.is_empty() {
        return None;
    }
    let jdm_median = median(&jdm.iter().map(|l| l.price).collect::<Vec<_>>());
    let other_median = median(&other.iter().map(|l| l.price).collect::<Vec<_>>());
    if other_median > 0.0 {
        Some(jdm_median / other_median)
    } else {
        None
    }
}

/// Units sold per calendar month (`YYYY-MM`), ascending
pub fn monthly_quantity(listings: &[&Listing]) -> Vec<(String, u64)> {
    let mut months: BTreeMap<String, u64> = BTreeMap::new();
    for listing in listings {
        if let Some(date) = listing.sale_date {
            *months.entry(date.format("%Y-%m").to_string()).or_default() += listing.quantity as u64;
        }
    }
    months.into_iter().collect()
}

/// Earliest and latest sale date, if any listing has one
pub fn sale_period(listings: &[Listing]) -> Option<(NaiveDate, NaiveDate)> {
    let mut dates = listings.iter().filter_map(|l| l.sale_date);
    let first = dates.next()?;
    Some(dates.fold((first, first), |(lo, hi), d| (lo.min(d), hi.max(d))))
}

/// Everything rendered on one brand tab
#[derive(Debug, Clone)]
pub struct BrandSummary {
    pub brand: String,
    pub total: GroupStats,
    pub lines: Vec<GroupStats>,
    pub movements: Vec<GroupStats>,
    pub conditions: Vec<GroupStats>,
    pub models: Vec<GroupStats>,
    pub characters: Vec<GroupStats>,
    pub bands: PriceBands,
    pub monthly: Vec<(String, u64)>,
    pub jdm_premium: Option<f64>,
    /// Listings with no extractable model number
    pub unmodeled: usize,
}

/// Summarize the listings of one brand. Listings of other brands are ignored.
pub fn summarize_brand(brand: &str, listings: &[Listing], settings: &ReportSettings) -> BrandSummary {
    let own: Vec<Listing> = listings
        .iter()
        .filter(|l| l.brand.eq_ignore_ascii_case(brand))
        .cloned()
        .collect();
    let refs: Vec<&Listing> = own.iter().collect();

    let mut bands = PriceBands::from_settings(settings);
    for l in &own {
        bands.add(l.price, l.quantity as u64);
    }

    // Parts-only sales would drag line and model medians down
    let watches: Vec<Listing> = own
        .iter()
        .filter(|l| l.condition != Condition::Parts)
        .cloned()
        .collect();

    BrandSummary {
        brand: brand.to_string(),
        total: GroupStats::from_listings(brand.to_string(), &refs, settings),
        lines: rank_by_quantity(aggregate(&watches, |l| Some(l.line.clone()), settings)),
        movements: rank_by_quantity(aggregate(
            &own,
            |l| Some(l.movement.as_str().to_string()),
            settings,
        )),
        conditions: aggregate_conditions(&own, settings),
        models: top_n(
            aggregate(&watches, |l| l.model.clone(), settings),
            settings.top_n,
        ),
        characters: top_n(aggregate(&own, |l| l.character.clone(), settings), settings.top_n),
        bands,
        monthly: monthly_quantity(&refs),
        jdm_premium: jdm_premium(&refs),
        unmodeled: own.iter().filter(|l| l.model.is_none()).count(),
    }
}

/// Condition groups in the fixed `Condition::ALL` order, empty ones omitted
pub fn aggregate_conditions(listings: &[Listing], settings: &ReportSettings) -> Vec<GroupStats> {
    let mut groups = aggregate(listings, |l| Some(l.condition.as_str().to_string()), settings);
    groups.sort_by_key(|g| {
        Condition::ALL
            .iter()
            .position(|c| c.as_str() == g.key)
            .unwrap_or(Condition::ALL.len())
    });
    groups
}

/// One row of the overview brand table
#[derive(Debug, Clone)]
pub struct BrandRow {
    pub stats: GroupStats,
    pub jdm_premium: Option<f64>,
}

/// Cross-brand aggregates for the overview tab
#[derive(Debug, Clone)]
pub struct Overview {
    pub total: GroupStats,
    pub brands: Vec<BrandRow>,
    pub movements: Vec<GroupStats>,
    pub conditions: Vec<GroupStats>,
    pub period: Option<(NaiveDate, NaiveDate)>,
}

pub fn build_overview(listings: &[Listing], settings: &ReportSettings) -> Overview {
    let all: Vec<&Listing> = listings.iter().collect();
    let mut brands = group_by(listings, |l| Some(l.brand.clone()))
        .into_iter()
        .map(|(brand, members)| BrandRow {
            stats: GroupStats::from_listings(brand, &members, settings),
            jdm_premium: jdm_premium(&members),
        })
        .collect::<Vec<_>>();
    brands.sort_by(|a, b| b.stats.quantity.cmp(&a.stats.quantity));

    Overview {
        total: GroupStats::from_listings("All brands".to_string(), &all, settings),
        brands,
        movements: rank_by_quantity(aggregate(
            listings,
            |l| Some(l.movement.as_str().to_string()),
            settings,
        )),
        conditions: aggregate_conditions(listings, settings),
        period: sale_period(listings),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Department, Flags, Movement};

    fn listing(brand: &str, line: &str, price: f64, quantity: u32) -> Listing {
        Listing {
            title: format!("{} {}", brand, line),
            price,
            quantity,
            sale_date: None,
            brand: brand.to_string(),
            condition: Condition::Complete,
            movement: Movement::Unknown,
            department: Department::Unknown,
            line: line.to_string(),
            model: None,
            flags: Flags::default(),
            character: None,
        }
    }

    #[test]
    fn test_group_by_keeps_first_seen_order() {
        let listings = vec![
            listing("SEIKO", "Prospex", 1.0, 1),
            listing("CASIO", "G-SHOCK", 1.0, 1),
            listing("SEIKO", "Presage", 1.0, 1),
        ];
        let groups = group_by(&listings, |l| Some(l.brand.clone()));
        let keys: Vec<&str> = groups.iter().map(|(k, _)| k.as_str()).collect();
        assert_eq!(keys, vec!["SEIKO", "CASIO"]);
        assert_eq!(groups[0].1.len(), 2);
    }

    #[test]
    fn test_top_n_ties_keep_first_seen_order() {
        let settings = ReportSettings::default();
        let listings = vec![
            listing("CASIO", "A", 10.0, 2),
            listing("CASIO", "B", 10.0, 5),
            listing("CASIO", "C", 10.0, 2),
            listing("CASIO", "D", 10.0, 2),
        ];
        let groups = aggregate(&listings, |l| Some(l.line.clone()), &settings);
        let top: Vec<String> = top_n(groups, 3).into_iter().map(|g| g.key).collect();
        assert_eq!(top, vec!["B", "A", "C"]);
    }

    #[test]
    fn test_none_keys_are_tolerated() {
        let settings = ReportSettings::default();
        let mut listings = vec![listing("CASIO", "G-SHOCK", 50.0, 1); 9];
        listings[0].model = Some("DW-5600".to_string());
        let groups = aggregate(&listings, |l| l.model.clone(), &settings);
        assert_eq!(groups.len(), 1);
        assert_eq!(groups[0].listings(), 1);
    }

    #[test]
    fn test_summarize_brand() {
        let settings = ReportSettings::default();
        let mut listings = vec![
            listing("CASIO", "G-SHOCK", 100.0, 3),
            listing("CASIO", "G-SHOCK", 60.0, 1),
            listing("CASIO", "other-CASIO", 5.0, 1),
            listing("SEIKO", "Prospex", 400.0, 1),
        ];
        listings[0].flags.jdm = true;
        listings[0].sale_date = NaiveDate::from_ymd_opt(2025, 5, 2);
        listings[1].sale_date = NaiveDate::from_ymd_opt(2025, 6, 9);
        listings[2].condition = Condition::Parts;

        let summary = summarize_brand("CASIO", &listings, &settings);
        assert_eq!(summary.total.quantity, 5);
        assert_eq!(summary.total.listings(), 3);
        // The parts listing is excluded from line statistics
        assert_eq!(summary.lines.len(), 1);
        assert_eq!(summary.lines[0].key, "G-SHOCK");
        assert_eq!(summary.lines[0].prices.median, 80.0);
        assert_eq!(summary.conditions[0].key, "complete");
        assert_eq!(summary.conditions[1].key, "parts");
        assert_eq!(
            summary.monthly,
            vec![("2025-05".to_string(), 3), ("2025-06".to_string(), 1)]
        );
        // JDM median 100 over non-JDM median of (60, 5) = 32.5
        let premium = summary.jdm_premium.unwrap();
        assert!((premium - 100.0 / 32.5).abs() < 1e-9);
        assert_eq!(summary.unmodeled, 3);
        assert_eq!(summary.bands.total(), 5);
    }

    #[test]
    fn test_overview_ranks_brands() {
        let settings = ReportSettings::default();
        let mut listings = vec![
            listing("SEIKO", "Prospex", 300.0, 1),
            listing("CASIO", "G-SHOCK", 80.0, 4),
        ];
        listings[1].sale_date = NaiveDate::from_ymd_opt(2025, 1, 31);
        let overview = build_overview(&listings, &settings);
        assert_eq!(overview.brands[0].stats.key, "CASIO");
        assert_eq!(overview.total.quantity, 5);
        let day = NaiveDate::from_ymd_opt(2025, 1, 31).unwrap();
        assert_eq!(overview.period, Some((day, day)));
    }
}
