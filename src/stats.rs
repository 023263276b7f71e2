use statrs::statistics::Statistics;

use crate::config::ReportSettings;

/// Price statistics for one group of listings
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct PriceStats {
    pub count: usize,
    pub sum: f64,
    pub mean: f64,
    pub median: f64,
    /// Population standard deviation
    pub std_dev: f64,
    /// Sample standard deviation, 0 below two samples
    pub sample_std_dev: f64,
    /// Coefficient of variation, population std / mean
    pub cv: f64,
    pub min: f64,
    pub max: f64,
}

impl PriceStats {
    pub fn from_prices(prices: &[f64]) -> Self {
        if prices.is_empty() {
            return Self::default();
        }
        let mean = prices.mean();
        let std_dev = prices.population_std_dev();
        let sample_std_dev = if prices.len() > 1 { prices.std_dev() } else { 0.0 };
        Self {
            count: prices.len(),
            sum: prices.iter().sum(),
            mean,
            median: median(prices),
            std_dev,
            sample_std_dev,
            cv: cv_from(std_dev, mean),
            min: prices.min(),
            max: prices.max(),
        }
    }
}

fn cv_from(std_dev: f64, mean: f64) -> f64 {
    if mean == 0.0 || !std_dev.is_finite() {
        0.0
    } else {
        std_dev / mean
    }
}

/// Median of unsorted values; 0 when empty
pub fn median(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.total_cmp(b));
    let mid = sorted.len() / 2;
    if sorted.len() % 2 == 0 {
        (sorted[mid - 1] + sorted[mid]) / 2.0
    } else {
        sorted[mid]
    }
}

/// Population std / mean, defined as 0 when the mean is 0 or there are no values
pub fn coefficient_of_variation(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    cv_from(values.population_std_dev(), values.mean())
}

/// Sourcing price ceiling (仕入上限) in sourcing currency, floored at 0
pub fn breakeven_ceiling(median_price: f64, settings: &ReportSettings) -> f64 {
    let ceiling =
        median_price * settings.exchange_rate * (1.0 - settings.fee_rate) - settings.shipping_cost;
    ceiling.max(0.0)
}

/// Fixed-width price histogram with an overflow bucket
#[derive(Debug, Clone, PartialEq)]
pub struct PriceBands {
    pub width: f64,
    pub cap: f64,
    pub counts: Vec<u64>,
    /// Prices at or above `cap`
    pub overflow: u64,
}

impl PriceBands {
    pub fn new(width: f64, cap: f64) -> Self {
        let bins = (cap / width).ceil() as usize;
        Self {
            width,
            cap,
            counts: vec![0; bins],
            overflow: 0,
        }
    }

    pub fn from_settings(settings: &ReportSettings) -> Self {
        Self::new(settings.band_width, settings.band_cap)
    }

    /// Count `weight` sales at `price`
    pub fn add(&mut self, price: f64, weight: u64) {
        if price >= self.cap {
            self.overflow += weight;
            return;
        }
        let bin = ((price / self.width).floor() as usize).min(self.counts.len().saturating_sub(1));
        self.counts[bin] += weight;
    }

    pub fn labels(&self) -> Vec<String> {
        let mut labels: Vec<String> = (0..self.counts.len())
            .map(|i| {
                let lo = i as f64 * self.width;
                let hi = (lo + self.width).min(self.cap);
                format!("{}-{}", lo, hi)
            })
            .collect();
        labels.push(format!("{}+", self.cap));
        labels
    }

    /// Bin counts followed by the overflow count, aligned with `labels()`
    pub fn values(&self) -> Vec<u64> {
        let mut values = self.counts.clone();
        values.push(self.overflow);
        values
    }

    pub fn total(&self) -> u64 {
        self.counts.iter().sum::<u64>() + self.overflow
    }
}
