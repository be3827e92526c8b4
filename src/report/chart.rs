//! Bar chart of fare per km, one bar per provider.

use crate::domain::model::FareReport;
use crate::utils::error::Result;
use std::fmt::Write;

#[derive(Debug, Clone)]
pub struct ChartOptions {
    pub width: u32,
    pub height: u32,
    pub y_label: String,
    /// Headroom above the tallest bar, as a multiple of its height.
    pub y_headroom: f64,
    pub grid_lines: usize,
}

impl Default for ChartOptions {
    fn default() -> Self {
        Self {
            width: 900,
            height: 500,
            y_label: "Average Fare per Km (₹)".to_string(),
            y_headroom: 1.2,
            grid_lines: 5,
        }
    }
}

const MARGIN_LEFT: f64 = 80.0;
const MARGIN_RIGHT: f64 = 30.0;
const MARGIN_TOP: f64 = 60.0;
const MARGIN_BOTTOM: f64 = 60.0;
const BAR_FILL_RATIO: f64 = 0.8;

fn escape_xml(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            _ => out.push(c),
        }
    }
    out
}

pub fn format_value(symbol: &str, value: f64) -> String {
    format!("{}{:.2}", symbol, value)
}

/// Renders the report as a standalone SVG document.
pub fn render_bar_chart(report: &FareReport, options: &ChartOptions) -> Result<String> {
    let width = f64::from(options.width);
    let height = f64::from(options.height);
    let plot_width = width - MARGIN_LEFT - MARGIN_RIGHT;
    let plot_height = height - MARGIN_TOP - MARGIN_BOTTOM;
    let baseline = MARGIN_TOP + plot_height;

    let max = report.max_fare_per_km();
    let y_max = if max > 0.0 { max * options.y_headroom } else { 1.0 };
    let scale = |value: f64| value / y_max * plot_height;

    let mut svg = String::new();
    writeln!(
        svg,
        r#"<svg xmlns="http://www.w3.org/2000/svg" width="{w}" height="{h}" viewBox="0 0 {w} {h}" font-family="sans-serif">"#,
        w = options.width,
        h = options.height
    )?;
    writeln!(
        svg,
        r#"  <rect x="0" y="0" width="{}" height="{}" fill="white"/>"#,
        options.width, options.height
    )?;
    writeln!(
        svg,
        r#"  <text x="{:.1}" y="{:.1}" text-anchor="middle" font-size="18">{}</text>"#,
        width / 2.0,
        MARGIN_TOP / 2.0,
        escape_xml(&report.title)
    )?;

    // 水平格線與刻度
    let divisions = options.grid_lines.max(1);
    for i in 0..=divisions {
        let value = y_max * i as f64 / divisions as f64;
        let y = baseline - scale(value);
        writeln!(
            svg,
            r##"  <line x1="{:.1}" y1="{y:.1}" x2="{:.1}" y2="{y:.1}" stroke="#999999" stroke-dasharray="4 4" opacity="0.7"/>"##,
            MARGIN_LEFT,
            MARGIN_LEFT + plot_width,
            y = y
        )?;
        writeln!(
            svg,
            r#"  <text x="{:.1}" y="{:.1}" text-anchor="end" font-size="11">{:.0}</text>"#,
            MARGIN_LEFT - 8.0,
            y + 4.0,
            value
        )?;
    }

    writeln!(
        svg,
        r#"  <text x="{x:.1}" y="{y:.1}" text-anchor="middle" font-size="13" transform="rotate(-90 {x:.1} {y:.1})">{label}</text>"#,
        x = MARGIN_LEFT / 3.0,
        y = MARGIN_TOP + plot_height / 2.0,
        label = escape_xml(&options.y_label)
    )?;

    let count = report.providers.len().max(1) as f64;
    let slot = plot_width / count;
    let bar_width = slot * BAR_FILL_RATIO;
    for (i, provider) in report.providers.iter().enumerate() {
        let x = MARGIN_LEFT + slot * i as f64 + (slot - bar_width) / 2.0;
        let bar_height = scale(provider.fare_per_km);
        let top = baseline - bar_height;
        let center = x + bar_width / 2.0;

        writeln!(
            svg,
            r#"  <rect x="{:.1}" y="{:.1}" width="{:.1}" height="{:.1}" fill="{}"><title>{}</title></rect>"#,
            x,
            top,
            bar_width,
            bar_height,
            escape_xml(&provider.color),
            escape_xml(&provider.provider)
        )?;
        writeln!(
            svg,
            r#"  <text x="{:.1}" y="{:.1}" text-anchor="middle" font-size="12">{}</text>"#,
            center,
            top - 6.0,
            escape_xml(&format_value(&report.currency_symbol, provider.fare_per_km))
        )?;
        writeln!(
            svg,
            r#"  <text x="{:.1}" y="{:.1}" text-anchor="middle" font-size="13">{}</text>"#,
            center,
            baseline + 22.0,
            escape_xml(&provider.provider)
        )?;
    }

    writeln!(
        svg,
        r##"  <line x1="{:.1}" y1="{b:.1}" x2="{:.1}" y2="{b:.1}" stroke="#333333"/>"##,
        MARGIN_LEFT,
        MARGIN_LEFT + plot_width,
        b = baseline
    )?;
    svg.push_str("</svg>\n");
    Ok(svg)
}

/// Horizontal bars for the terminal.
pub fn render_text_chart(report: &FareReport, bar_width: usize) -> Result<String> {
    let max = report.max_fare_per_km();
    let label_width = report
        .providers
        .iter()
        .map(|p| p.provider.chars().count())
        .max()
        .unwrap_or(0);

    let mut out = String::new();
    for provider in &report.providers {
        let filled = if max > 0.0 {
            ((provider.fare_per_km / max) * bar_width as f64).round() as usize
        } else {
            0
        };
        writeln!(
            out,
            "{:<lw$} | {} {}",
            provider.provider,
            "█".repeat(filled),
            format_value(&report.currency_symbol, provider.fare_per_km),
            lw = label_width
        )?;
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::model::{DropCounts, ProviderStats};
    use chrono::Utc;

    fn stats(name: &str, fare_per_km: f64, color: &str) -> ProviderStats {
        ProviderStats {
            provider: name.to_string(),
            rows_read: 1,
            trips_retained: 1,
            dropped: DropCounts::default(),
            mean_distance_km: 1.0,
            mean_fare: fare_per_km,
            conversion_rate: 1.0,
            fare_per_km,
            first_pickup: None,
            last_pickup: None,
            color: color.to_string(),
        }
    }

    fn report() -> FareReport {
        FareReport {
            title: "Ola vs Uber & Co".to_string(),
            currency_symbol: "₹".to_string(),
            generated_at: Utc::now(),
            providers: vec![
                stats("Ola", 58.76, "skyblue"),
                stats("Uber", 41.22, "orange"),
                stats("Namma Yatri", 53.11, "lightgreen"),
            ],
        }
    }

    #[test]
    fn test_svg_has_one_bar_per_provider_in_order() {
        let svg = render_bar_chart(&report(), &ChartOptions::default()).unwrap();

        assert!(svg.starts_with("<svg"));
        assert!(svg.trim_end().ends_with("</svg>"));
        assert_eq!(svg.matches("<title>").count(), 3);

        let ola = svg.find(r#"fill="skyblue""#).unwrap();
        let uber = svg.find(r#"fill="orange""#).unwrap();
        let namma = svg.find(r#"fill="lightgreen""#).unwrap();
        assert!(ola < uber && uber < namma);
    }

    #[test]
    fn test_svg_labels_pair_with_their_own_values() {
        let svg = render_bar_chart(&report(), &ChartOptions::default()).unwrap();
        let ola_bar = svg.find("<title>Ola</title>").unwrap();
        let ola_value = svg.find("₹58.76").unwrap();
        let uber_bar = svg.find("<title>Uber</title>").unwrap();
        assert!(ola_bar < ola_value && ola_value < uber_bar);
        assert!(svg.contains("₹41.22"));
        assert!(svg.contains("₹53.11"));
    }

    #[test]
    fn test_svg_escapes_text_and_draws_dashed_grid() {
        let svg = render_bar_chart(&report(), &ChartOptions::default()).unwrap();
        assert!(svg.contains("Ola vs Uber &amp; Co"));
        assert!(svg.contains("Average Fare per Km (₹)"));
        assert_eq!(svg.matches("stroke-dasharray").count(), 6);
    }

    #[test]
    fn test_tallest_bar_leaves_headroom() {
        let options = ChartOptions::default();
        let svg = render_bar_chart(&report(), &options).unwrap();
        let plot_height = f64::from(options.height) - MARGIN_TOP - MARGIN_BOTTOM;
        let expected = format!(r#"height="{:.1}" fill="skyblue""#, plot_height / 1.2);
        assert!(svg.contains(&expected), "missing {}", expected);
    }

    #[test]
    fn test_empty_report_still_renders() {
        let mut report = report();
        report.providers.clear();
        let svg = render_bar_chart(&report, &ChartOptions::default()).unwrap();
        assert!(svg.contains("</svg>"));
        assert_eq!(render_text_chart(&report, 20).unwrap(), "");
    }

    #[test]
    fn test_text_chart_scales_to_longest_bar() {
        let text = render_text_chart(&report(), 10).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 3);
        assert!(lines[0].starts_with("Ola         | ██████████ ₹58.76"));
        assert_eq!(lines[1].matches('█').count(), 7);
    }
}
