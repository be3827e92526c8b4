use crate::domain::model::FareReport;
use crate::utils::error::{EtlError, Result};
use std::fmt::Write;

/// Console summary: distances first, then fares, one line per provider.
pub fn render_console_summary(report: &FareReport) -> Result<String> {
    let mut out = String::new();
    writeln!(out)?;
    for provider in &report.providers {
        writeln!(
            out,
            "Average {} distance : {:.2} km",
            provider.provider, provider.mean_distance_km
        )?;
    }
    writeln!(out)?;
    for provider in &report.providers {
        writeln!(
            out,
            "Average {} fare : {}{:.2} per km",
            provider.provider, report.currency_symbol, provider.fare_per_km
        )?;
    }
    Ok(out)
}

pub fn render_json(report: &FareReport) -> Result<String> {
    Ok(serde_json::to_string_pretty(report)?)
}

pub fn render_csv(report: &FareReport) -> Result<String> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    writer.write_record([
        "provider",
        "rows_read",
        "trips_retained",
        "rows_dropped",
        "mean_distance_km",
        "mean_fare",
        "conversion_rate",
        "fare_per_km",
        "first_pickup",
        "last_pickup",
    ])?;

    for p in &report.providers {
        writer.write_record([
            p.provider.clone(),
            p.rows_read.to_string(),
            p.trips_retained.to_string(),
            p.dropped.total().to_string(),
            format!("{:.4}", p.mean_distance_km),
            format!("{:.4}", p.mean_fare),
            p.conversion_rate.to_string(),
            format!("{:.4}", p.fare_per_km),
            p.first_pickup.map(|t| t.to_rfc3339()).unwrap_or_default(),
            p.last_pickup.map(|t| t.to_rfc3339()).unwrap_or_default(),
        ])?;
    }

    let bytes = writer.into_inner().map_err(|e| EtlError::IoError(e.into_error()))?;
    String::from_utf8(bytes).map_err(|e| EtlError::ValidationError {
        message: format!("CSV summary is not valid UTF-8: {}", e),
    })
}
