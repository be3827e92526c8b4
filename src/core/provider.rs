//! Per-provider cleaning: fare coercion, distance resolution, outlier
//! removal and the fare-per-km aggregate.

use crate::config::toml_config::{DistanceSource, ProviderConfig};
use crate::core::cleaning::{fill_missing, parse_amount, parse_pickup_time};
use crate::core::columns::normalize_column_name;
use crate::core::stats::{mean, zscore_retain_mask};
use crate::domain::model::{
    Coordinate, DropCounts, ProviderStats, RawTable, TripPoints, TripRecord,
};
use crate::utils::error::{EtlError, Result};

#[derive(Debug, Clone)]
pub struct CleanedProvider {
    pub trips: Vec<TripRecord>,
    pub stats: ProviderStats,
}

enum DistanceColumns {
    Column(usize),
    Points {
        pickup_lat: usize,
        pickup_lon: usize,
        dropoff_lat: usize,
        dropoff_lon: usize,
    },
}

impl DistanceColumns {
    fn indices(&self) -> Vec<usize> {
        match *self {
            DistanceColumns::Column(idx) => vec![idx],
            DistanceColumns::Points {
                pickup_lat,
                pickup_lon,
                dropoff_lat,
                dropoff_lon,
            } => vec![pickup_lat, pickup_lon, dropoff_lat, dropoff_lon],
        }
    }

    fn requires_positive_fare(&self) -> bool {
        matches!(self, DistanceColumns::Points { .. })
    }
}

enum DistanceOutcome {
    Resolved(f64, Option<TripPoints>),
    InvalidDistance,
    InvalidCoordinates,
}

fn resolve_distance(columns: &DistanceColumns, row: &[String]) -> DistanceOutcome {
    match *columns {
        DistanceColumns::Column(idx) => match parse_amount(&row[idx]) {
            Some(d) if d >= 0.0 => DistanceOutcome::Resolved(d, None),
            _ => DistanceOutcome::InvalidDistance,
        },
        DistanceColumns::Points {
            pickup_lat,
            pickup_lon,
            dropoff_lat,
            dropoff_lon,
        } => {
            let parsed = (
                parse_amount(&row[pickup_lat]),
                parse_amount(&row[pickup_lon]),
                parse_amount(&row[dropoff_lat]),
                parse_amount(&row[dropoff_lon]),
            );
            let (Some(p_lat), Some(p_lon), Some(d_lat), Some(d_lon)) = parsed else {
                return DistanceOutcome::InvalidCoordinates;
            };

            let points = TripPoints {
                pickup: Coordinate::new(p_lat, p_lon),
                dropoff: Coordinate::new(d_lat, d_lon),
            };
            if !points.is_valid() {
                return DistanceOutcome::InvalidCoordinates;
            }
            DistanceOutcome::Resolved(points.distance_km(), Some(points))
        }
    }
}

const NOT_FINITE: &str = "aggregate is not finite";

fn empty(provider: &str, reason: &str) -> EtlError {
    EtlError::EmptyDatasetError {
        provider: provider.to_string(),
        reason: reason.to_string(),
    }
}

/// Runs one provider's table through every cleaning stage.
///
/// The mean distance is taken over geo-valid trips *before* fare outliers
/// are removed; the mean fare is taken after.
pub fn clean_provider(table: RawTable, config: &ProviderConfig) -> Result<CleanedProvider> {
    let name = config.name.as_str();
    let column = |c: &str| {
        let c = if config.normalize_columns {
            normalize_column_name(c)
        } else {
            c.to_string()
        };
        table.column_index(&c)
    };

    let fare_idx = column(config.fare_column.as_str())?;
    let distance_columns = match &config.distance {
        DistanceSource::Column { column: c } => DistanceColumns::Column(column(c.as_str())?),
        DistanceSource::Haversine {
            pickup_lat,
            pickup_lon,
            dropoff_lat,
            dropoff_lon,
        } => DistanceColumns::Points {
            pickup_lat: column(pickup_lat.as_str())?,
            pickup_lon: column(pickup_lon.as_str())?,
            dropoff_lat: column(dropoff_lat.as_str())?,
            dropoff_lon: column(dropoff_lon.as_str())?,
        },
    };
    let datetime_idx = config
        .datetime_column
        .as_deref()
        .map(column)
        .transpose()?;

    let mut dropped = DropCounts {
        unreadable: table.unreadable_rows,
        ..DropCounts::default()
    };
    let rows_read = table.rows.len() + table.unreadable_rows;

    // 票價
    let positive_only = distance_columns.requires_positive_fare();
    let (fares, mut rows): (Vec<f64>, Vec<Vec<String>>) = table
        .rows
        .into_iter()
        .filter_map(|row| {
            let fare = parse_amount(&row[fare_idx])?;
            let keep = if positive_only { fare > 0.0 } else { fare >= 0.0 };
            keep.then_some((fare, row))
        })
        .unzip();
    dropped.invalid_fare = rows_read - dropped.unreadable - fares.len();
    tracing::debug!("{}: {} rows dropped for invalid fare", name, dropped.invalid_fare);

    if config.fill_missing {
        let mut fill_columns = distance_columns.indices();
        fill_columns.extend(datetime_idx);
        fill_missing(&mut rows, &fill_columns);
    }

    // 距離
    let mut trips = Vec::with_capacity(rows.len());
    for (fare, row) in fares.into_iter().zip(rows) {
        match resolve_distance(&distance_columns, &row) {
            DistanceOutcome::Resolved(distance_km, points) => trips.push(TripRecord {
                fare,
                distance_km,
                pickup_at: datetime_idx.and_then(|idx| parse_pickup_time(&row[idx])),
                points,
            }),
            DistanceOutcome::InvalidDistance => dropped.invalid_distance += 1,
            DistanceOutcome::InvalidCoordinates => dropped.invalid_coordinates += 1,
        }
    }
    tracing::debug!(
        "{}: {} rows dropped for invalid distance, {} for invalid coordinates",
        name,
        dropped.invalid_distance,
        dropped.invalid_coordinates
    );

    let distances: Vec<f64> = trips.iter().map(|t| t.distance_km).collect();
    let mean_distance_km =
        mean(&distances).ok_or_else(|| empty(name, "no trip has a usable distance"))?;
    if mean_distance_km <= 0.0 {
        return Err(empty(name, "mean trip distance is zero"));
    }
    if !mean_distance_km.is_finite() {
        return Err(empty(name, NOT_FINITE));
    }

    // 離群值
    if let Some(threshold) = config.zscore_threshold {
        let fares: Vec<f64> = trips.iter().map(|t| t.fare).collect();
        let mask = zscore_retain_mask(&fares, threshold);
        let before = trips.len();
        let mut keep = mask.into_iter();
        trips.retain(|_| keep.next().unwrap_or(false));
        dropped.outliers = before - trips.len();
        tracing::debug!(
            "{}: {} fare outliers removed (|z| >= {})",
            name,
            dropped.outliers,
            threshold
        );
    }

    let fares: Vec<f64> = trips.iter().map(|t| t.fare).collect();
    let mean_fare = mean(&fares).ok_or_else(|| empty(name, "every fare was an outlier"))?;
    let fare_per_km = mean_fare * config.conversion_rate / mean_distance_km;
    // 極大但有限的票價加總後仍可能溢位成 inf
    if !mean_fare.is_finite() || !fare_per_km.is_finite() {
        return Err(empty(name, NOT_FINITE));
    }

    let first_pickup = trips.iter().filter_map(|t| t.pickup_at).min();
    let last_pickup = trips.iter().filter_map(|t| t.pickup_at).max();

    tracing::info!(
        "{}: {} of {} trips retained, {:.2} km average, {:.2} per km",
        name,
        trips.len(),
        rows_read,
        mean_distance_km,
        fare_per_km
    );

    let stats = ProviderStats {
        provider: name.to_string(),
        rows_read,
        trips_retained: trips.len(),
        dropped,
        mean_distance_km,
        mean_fare,
        conversion_rate: config.conversion_rate,
        fare_per_km,
        first_pickup,
        last_pickup,
        color: config.color.clone(),
    };

    Ok(CleanedProvider { trips, stats })
}
