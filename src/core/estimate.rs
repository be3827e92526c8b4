use crate::config::toml_config::TariffConfig;
use crate::domain::model::FareReport;
use crate::utils::error::{EtlError, Result};
use crate::utils::validation::validate_range;
use serde::{Deserialize, Serialize};

pub const KM_PER_MILE: f64 = 1.60934;
pub const MIN_SURGE: f64 = 1.0;
pub const MAX_SURGE: f64 = 3.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[cfg_attr(feature = "cli", derive(clap::ValueEnum))]
#[serde(rename_all = "lowercase")]
pub enum DistanceUnit {
    #[default]
    Km,
    Miles,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[cfg_attr(feature = "cli", derive(clap::ValueEnum))]
#[serde(rename_all = "lowercase")]
pub enum TimeUnit {
    #[default]
    Minutes,
    Hours,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TripRequest {
    pub distance: f64,
    pub distance_unit: DistanceUnit,
    pub duration: f64,
    pub time_unit: TimeUnit,
    pub surge: f64,
}

impl TripRequest {
    pub fn distance_km(&self) -> f64 {
        match self.distance_unit {
            DistanceUnit::Km => self.distance,
            DistanceUnit::Miles => self.distance * KM_PER_MILE,
        }
    }

    pub fn duration_minutes(&self) -> f64 {
        match self.time_unit {
            TimeUnit::Minutes => self.duration,
            TimeUnit::Hours => self.duration * 60.0,
        }
    }

    fn validate(&self) -> Result<()> {
        for (field, value) in [("distance", self.distance), ("time", self.duration)] {
            if !value.is_finite() || value <= 0.0 {
                return Err(EtlError::ValidationError {
                    message: format!("{} must be a positive number, got {}", field, value),
                });
            }
        }
        validate_range("surge", self.surge, MIN_SURGE, MAX_SURGE).map_err(|e| {
            EtlError::ValidationError {
                message: e.to_string(),
            }
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FareEstimate {
    pub provider: String,
    pub distance_km: f64,
    pub duration_minutes: f64,
    pub surge: f64,
    pub per_km: f64,
    pub price: f64,
}

/// `(base + per_km * km + per_min * minutes) * surge`
pub fn estimate_fare(tariff: &TariffConfig, trip: &TripRequest) -> Result<FareEstimate> {
    trip.validate()?;

    let distance_km = trip.distance_km();
    let duration_minutes = trip.duration_minutes();
    let price = (tariff.base_fare + tariff.per_km * distance_km + tariff.per_min * duration_minutes)
        * trip.surge;

    Ok(FareEstimate {
        provider: tariff.provider.clone(),
        distance_km,
        duration_minutes,
        surge: trip.surge,
        per_km: tariff.per_km,
        price,
    })
}

/// Replaces each tariff's per-km rate with the measured fare per km.
/// Tariffs for providers absent from the report keep their configured rate.
pub fn calibrate_tariffs(tariffs: &[TariffConfig], report: &FareReport) -> Vec<TariffConfig> {
    tariffs
        .iter()
        .map(|tariff| match report.provider(&tariff.provider) {
            Some(stats) => TariffConfig {
                per_km: stats.fare_per_km,
                ..tariff.clone()
            },
            None => tariff.clone(),
        })
        .collect()
}
