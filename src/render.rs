use serde::Serialize;
use serde_json::json;

use crate::aggregate::{build_overview, summarize_brand, BrandSummary, GroupStats, Overview};
use crate::brands::{BrandProfile, BrandTable};
use crate::config::{ReportConfig, ReportSettings};
use crate::links::{ebay_url, mercari_url};
use crate::types::Listing;

pub const OVERVIEW_TAB_ID: &str = "tab-overview";

const CHART_JS_URL: &str = "https://cdn.jsdelivr.net/npm/chart.js@4.4.1/dist/chart.umd.min.js";
const NEUTRAL_COLOR: &str = "#a0aec0";

/// A report tab: the overview or one configured brand
#[derive(Debug, Clone, Copy)]
pub enum Tab<'a> {
    Overview,
    Brand(&'a BrandProfile),
}

impl Tab<'_> {
    pub fn id(&self) -> String {
        match self {
            Tab::Overview => OVERVIEW_TAB_ID.to_string(),
            Tab::Brand(profile) => profile.tab_id(),
        }
    }

    pub fn label(&self) -> String {
        match self {
            Tab::Overview => "Overview".to_string(),
            Tab::Brand(profile) => profile.name.clone(),
        }
    }
}

/// Overview first, then every configured brand in table order
pub fn tabs(brands: &BrandTable) -> Vec<Tab<'_>> {
    std::iter::once(Tab::Overview)
        .chain(brands.iter().map(Tab::Brand))
        .collect()
}

// HTML generation helpers
pub fn html_escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#39;")
}

/// Fixed decimals with `,` thousands separators
pub fn format_number(value: f64, decimals: usize) -> String {
    if !value.is_finite() {
        return "n/a".to_string();
    }
    let formatted = format!("{:.*}", decimals, value.abs());
    let (int_part, frac_part) = match formatted.split_once('.') {
        Some((i, f)) => (i, Some(f)),
        None => (formatted.as_str(), None),
    };

    let mut out = String::new();
    if value < 0.0 && formatted.chars().any(|c| c.is_ascii_digit() && c != '0') {
        out.push('-');
    }
    for (i, c) in int_part.chars().enumerate() {
        if i > 0 && (int_part.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(c);
    }
    if let Some(frac) = frac_part {
        out.push('.');
        out.push_str(frac);
    }
    out
}

fn num_cell(value: f64, decimals: usize) -> String {
    format!(r#"<td class="num">{}</td>"#, format_number(value, decimals))
}

fn ratio_cell(ratio: Option<f64>) -> String {
    match ratio {
        Some(r) => num_cell(r, 2),
        None => r#"<td class="na">-</td>"#.to_string(),
    }
}

fn stat_cells(g: &GroupStats) -> String {
    [
        num_cell(g.listings() as f64, 0),
        num_cell(g.quantity as f64, 0),
        num_cell(g.prices.median, 2),
        num_cell(g.prices.mean, 2),
        num_cell(g.prices.std_dev, 2),
        num_cell(g.prices.cv, 3),
        num_cell(g.prices.min, 2),
        num_cell(g.prices.max, 2),
        num_cell(g.ceiling, 0),
    ]
    .concat()
}

const STAT_HEADERS: &[&str] = &[
    "Listings", "Sold", "Median", "Mean", "Std dev", "CV", "Min", "Max", "Ceiling (JPY)",
];

fn table(id: &str, headers: &[&str], rows: &[String]) -> String {
    let head: String = headers
        .iter()
        .map(|h| format!("<th>{}</th>", html_escape(h)))
        .collect();
    let body: String = rows.iter().map(|r| format!("<tr>{}</tr>\n", r)).collect();
    format!(
        r#"<table id="{}" class="stats">
<thead><tr>{}</tr></thead>
<tbody>
{}</tbody>
</table>"#,
        id, head, body
    )
}

/// Stats table keyed by the group key; with `links_for`, each row links to
/// marketplace searches for `BRAND key`
fn stats_table(id: &str, key_header: &str, groups: &[GroupStats], links_for: Option<&str>) -> String {
    let mut headers = vec![key_header];
    headers.extend_from_slice(STAT_HEADERS);
    if links_for.is_some() {
        headers.push("Search");
    }
    let rows: Vec<String> = groups
        .iter()
        .map(|g| {
            let links = match links_for {
                Some(brand) => format!(
                    r#"<td class="links"><a href="{}" target="_blank" rel="noopener">eBay</a> <a href="{}" target="_blank" rel="noopener">Mercari</a></td>"#,
                    html_escape(&ebay_url(brand, &g.key)),
                    html_escape(&mercari_url(brand, &g.key))
                ),
                None => String::new(),
            };
            format!(
                "<td>{}</td>{}{}",
                html_escape(&g.key),
                stat_cells(g),
                links
            )
        })
        .collect();
    table(id, &headers, &rows)
}

/// Canvas plus a `new Chart(...)` call with JSON-serialized labels and values
fn bar_chart<T: Serialize>(canvas_id: &str, label: &str, labels: &[String], values: &[T], colors: &[String]) -> String {
    let config = json!({
        "type": "bar",
        "data": {
            "labels": labels,
            "datasets": [{
                "label": label,
                "data": values,
                "backgroundColor": colors,
            }],
        },
        "options": {
            "responsive": true,
            "maintainAspectRatio": false,
            "plugins": { "legend": { "display": false } },
            "scales": { "y": { "beginAtZero": true } },
        },
    });
    // `</script>` inside a string literal would end the script element
    let payload = config.to_string().replace("</", "<\\/");
    format!(
        r#"<div class="chart"><canvas id="{}"></canvas></div>
<script>new Chart(document.getElementById('{}'), {});</script>"#,
        canvas_id, canvas_id, payload
    )
}

fn metric(label: &str, value: String) -> String {
    format!(
        r#"<div class="metric"><span class="metric-label">{}</span><span class="metric-value">{}</span></div>"#,
        html_escape(label),
        value
    )
}

fn section(title: &str, body: &str) -> String {
    format!(
        "<section class=\"card\">\n<h3>{}</h3>\n{}\n</section>\n",
        html_escape(title),
        body
    )
}

fn panel(id: &str, active: bool, heading: &str, body: &str) -> String {
    let class = if active { "tab-panel active" } else { "tab-panel" };
    format!(
        "<div id=\"{}\" class=\"{}\">\n<h2>{}</h2>\n{}</div>",
        id,
        class,
        html_escape(heading),
        body
    )
}

fn summary_metrics(total: &GroupStats, jdm_premium: Option<f64>) -> String {
    let premium = jdm_premium
        .map(|p| format!("{}x", format_number(p, 2)))
        .unwrap_or_else(|| "-".to_string());
    format!(
        "<div class=\"metrics\">{}{}{}{}{}{}</div>\n",
        metric("Listings", format_number(total.listings() as f64, 0)),
        metric("Units sold", format_number(total.quantity as f64, 0)),
        metric("Median price", format_number(total.prices.median, 2)),
        metric("CV", format_number(total.prices.cv, 3)),
        metric("Sourcing ceiling (JPY)", format_number(total.ceiling, 0)),
        metric("JDM premium", premium),
    )
}

pub fn render_overview_tab(overview: &Overview, brands: &BrandTable) -> String {
    let id = OVERVIEW_TAB_ID;
    let mut body = summary_metrics(&overview.total, None);

    let mut headers = vec!["Brand"];
    headers.extend_from_slice(STAT_HEADERS);
    headers.push("JDM premium");
    let rows: Vec<String> = overview
        .brands
        .iter()
        .map(|row| {
            format!(
                "<td>{}</td>{}{}",
                html_escape(&row.stats.key),
                stat_cells(&row.stats),
                ratio_cell(row.jdm_premium)
            )
        })
        .collect();
    body.push_str(&section("Brands", &table(&format!("{}-brands", id), &headers, &rows)));

    let labels: Vec<String> = overview.brands.iter().map(|b| b.stats.key.clone()).collect();
    let values: Vec<u64> = overview.brands.iter().map(|b| b.stats.quantity).collect();
    let colors: Vec<String> = overview
        .brands
        .iter()
        .map(|b| {
            brands
                .get(&b.stats.key)
                .map(|p| p.color.clone())
                .unwrap_or_else(|| NEUTRAL_COLOR.to_string())
        })
        .collect();
    body.push_str(&section(
        "Units sold by brand",
        &bar_chart(&format!("{}-brands-chart", id), "Units sold", &labels, &values, &colors),
    ));

    body.push_str(&section(
        "Movements",
        &stats_table(&format!("{}-movements", id), "Movement", &overview.movements, None),
    ));
    body.push_str(&section(
        "Conditions",
        &stats_table(&format!("{}-conditions", id), "Condition", &overview.conditions, None),
    ));

    panel(id, true, "All brands", &body)
}

pub fn render_brand_tab(summary: &BrandSummary, profile: &BrandProfile) -> String {
    let id = profile.tab_id();
    let brand = profile.name.as_str();
    let mut body = summary_metrics(&summary.total, summary.jdm_premium);

    if summary.total.listings() == 0 {
        body.push_str("<p class=\"empty\">No sales recorded for this brand.</p>\n");
    }

    body.push_str(&section(
        "Lines",
        &stats_table(&format!("{}-lines", id), "Line", &summary.lines, Some(brand)),
    ));

    let band_colors = vec![profile.color.clone(); summary.bands.labels().len()];
    body.push_str(&section(
        "Price bands",
        &bar_chart(
            &format!("{}-bands-chart", id),
            "Units sold",
            &summary.bands.labels(),
            &summary.bands.values(),
            &band_colors,
        ),
    ));

    let months: Vec<String> = summary.monthly.iter().map(|(m, _)| m.clone()).collect();
    let monthly: Vec<u64> = summary.monthly.iter().map(|(_, q)| *q).collect();
    body.push_str(&section(
        "Monthly sales",
        &bar_chart(
            &format!("{}-monthly-chart", id),
            "Units sold",
            &months,
            &monthly,
            &vec![profile.color.clone(); months.len()],
        ),
    ));

    body.push_str(&section(
        "Movements",
        &stats_table(&format!("{}-movements", id), "Movement", &summary.movements, None),
    ));
    body.push_str(&section(
        "Conditions",
        &stats_table(&format!("{}-conditions", id), "Condition", &summary.conditions, None),
    ));

    let models_title = format!(
        "Top {} models ({} listings without a model number)",
        summary.models.len(),
        summary.unmodeled
    );
    body.push_str(&section(
        "Top models",
        &format!(
            "<p class=\"note\">{}</p>\n{}",
            html_escape(&models_title),
            stats_table(&format!("{}-models", id), "Model", &summary.models, Some(brand))
        ),
    ));
    body.push_str(&section(
        "Characters and collaborations",
        &stats_table(&format!("{}-characters", id), "Character", &summary.characters, Some(brand)),
    ));

    panel(&id, false, brand, &body)
}

/// Markup for one tab. Contains no timestamps, so re-rendering unchanged
/// data yields identical output.
pub fn render_tab(tab: &Tab, listings: &[Listing], config: &ReportConfig) -> String {
    match tab {
        Tab::Overview => render_overview_tab(&build_overview(listings, &config.settings), &config.brands),
        Tab::Brand(profile) => {
            render_brand_tab(&summarize_brand(&profile.name, listings, &config.settings), profile)
        }
    }
}

/// CSS styles for the report
fn css_styles() -> &'static str {
    r#"
:root {
    --primary: #1a365d;
    --primary-light: #2a4a7f;
    --bg: #f7fafc;
    --card-bg: #ffffff;
    --text: #1a202c;
    --text-muted: #718096;
    --border: #e2e8f0;
    --shadow: 0 4px 6px -1px rgba(0, 0, 0, 0.1), 0 2px 4px -1px rgba(0, 0, 0, 0.06);
    --radius: 8px;
}

* {
    box-sizing: border-box;
    margin: 0;
    padding: 0;
}

body {
    font-family: -apple-system, BlinkMacSystemFont, 'Segoe UI', Roboto, 'Helvetica Neue', Arial, sans-serif;
    background: var(--bg);
    color: var(--text);
    line-height: 1.6;
}

.container {
    max-width: 1400px;
    margin: 0 auto;
    padding: 0 24px;
}

/* Header */
header {
    background: linear-gradient(135deg, var(--primary) 0%, var(--primary-light) 100%);
    color: white;
    padding: 24px 0;
    box-shadow: var(--shadow);
}

header h1 {
    font-size: 1.75rem;
    font-weight: 700;
    letter-spacing: -0.025em;
}

header .meta {
    font-size: 0.875rem;
    color: rgba(255, 255, 255, 0.8);
}

header nav {
    margin-top: 16px;
    display: flex;
    gap: 8px;
    flex-wrap: wrap;
}

.tab-button {
    background: rgba(255, 255, 255, 0.12);
    border: none;
    border-radius: 4px;
    color: rgba(255, 255, 255, 0.9);
    cursor: pointer;
    font-size: 0.875rem;
    font-weight: 500;
    padding: 6px 14px;
}

.tab-button.active {
    background: white;
    color: var(--primary);
}

main {
    padding: 32px 0 48px;
}

.tab-panel {
    display: none;
}

.tab-panel.active {
    display: block;
}

h2 {
    font-size: 1.5rem;
    font-weight: 700;
    margin-bottom: 24px;
    color: var(--primary);
}

h3 {
    font-size: 1.125rem;
    font-weight: 600;
    margin-bottom: 12px;
}

.card {
    background: var(--card-bg);
    border-radius: var(--radius);
    box-shadow: var(--shadow);
    padding: 20px;
    margin-bottom: 24px;
    overflow-x: auto;
}

.metrics {
    display: grid;
    grid-template-columns: repeat(auto-fill, minmax(180px, 1fr));
    gap: 16px;
    margin-bottom: 24px;
}

.metric {
    background: var(--card-bg);
    border-radius: var(--radius);
    box-shadow: var(--shadow);
    padding: 16px;
    display: flex;
    flex-direction: column;
}

.metric-label {
    font-size: 0.75rem;
    text-transform: uppercase;
    color: var(--text-muted);
}

.metric-value {
    font-size: 1.5rem;
    font-weight: 700;
}

table.stats {
    border-collapse: collapse;
    width: 100%;
    font-size: 0.875rem;
}

table.stats th,
table.stats td {
    border-bottom: 1px solid var(--border);
    padding: 6px 10px;
    text-align: left;
    white-space: nowrap;
}

table.stats th {
    background: var(--bg);
    font-weight: 600;
}

td.num,
td.na {
    text-align: right;
    font-variant-numeric: tabular-nums;
}

td.links a {
    color: var(--primary-light);
    margin-right: 6px;
}

.chart {
    position: relative;
    height: 280px;
}

.note,
.empty {
    color: var(--text-muted);
    font-size: 0.875rem;
    margin-bottom: 12px;
}

footer {
    color: var(--text-muted);
    font-size: 0.75rem;
    padding: 24px 0;
    text-align: center;
}
"#
}

/// Page header with tab navigation; the overview button starts active
fn page_header(title: &str, generated: &str, period: &str, tabs: &[Tab]) -> String {
    let nav_html: String = tabs
        .iter()
        .map(|tab| {
            let active = if matches!(tab, Tab::Overview) { " active" } else { "" };
            format!(
                r#"<button class="tab-button{}" data-tab="{}">{}</button>"#,
                active,
                tab.id(),
                html_escape(&tab.label())
            )
        })
        .collect();

    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="UTF-8">
    <meta name="viewport" content="width=device-width, initial-scale=1.0">
    <title>{}</title>
    <style>{}</style>
    <script src="{}"></script>
</head>
<body>
    <header>
        <div class="container">
            <h1>{}</h1>
            <p class="meta">Generated {} &middot; Sales period {}</p>
            <nav>{}</nav>
        </div>
    </header>
    <main>
        <div class="container">
"#,
        html_escape(title),
        css_styles(),
        CHART_JS_URL,
        html_escape(title),
        html_escape(generated),
        html_escape(period),
        nav_html
    )
}

/// Page footer with the tab-switch script
fn page_footer() -> &'static str {
    r#"
        </div>
    </main>
    <footer>
        <div class="container">
            <p>Prices are sold-listing prices. Ceilings assume the configured exchange rate, fee rate and shipping cost.</p>
        </div>
    </footer>
    <script>
    document.addEventListener('DOMContentLoaded', function() {
        const buttons = document.querySelectorAll('.tab-button');
        const panels = document.querySelectorAll('.tab-panel');

        buttons.forEach(function(button) {
            button.addEventListener('click', function() {
                buttons.forEach(function(b) { b.classList.remove('active'); });
                panels.forEach(function(p) { p.classList.remove('active'); });
                this.classList.add('active');

                const panel = document.getElementById(this.dataset.tab);
                if (!panel) return;
                panel.classList.add('active');

                // Charts drawn while hidden have zero size
                panel.querySelectorAll('canvas').forEach(function(canvas) {
                    const chart = Chart.getChart(canvas);
                    if (chart) chart.resize();
                });
            });
        });
    });
    </script>
</body>
</html>
"#
}

/// Render the full report page
pub fn render_report(listings: &[Listing], config: &ReportConfig, generated: &str) -> String {
    let tabs = tabs(&config.brands);
    let period = match crate::aggregate::sale_period(listings) {
        Some((first, last)) => format!("{} to {}", first, last),
        None => "unknown".to_string(),
    };

    let mut html = page_header(&config.settings.title, generated, &period, &tabs);
    for tab in &tabs {
        html.push_str(&render_tab(tab, listings, config));
        html.push('\n');
    }
    html.push_str(page_footer());
    html
}

/// Sourcing assumptions, printed alongside the report
pub fn assumptions(settings: &ReportSettings) -> String {
    format!(
        "exchange rate {}, fee {}%, shipping {} JPY",
        settings.exchange_rate,
        format_number(settings.fee_rate * 100.0, 1),
        format_number(settings.shipping_cost, 0)
    )
}
