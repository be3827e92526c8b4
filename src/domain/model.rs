use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One CSV file as read from storage: a header row plus string cells.
#[derive(Debug, Clone, Default)]
pub struct RawTable {
    /// Provider the file belongs to.
    pub provider: String,
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
    /// Records the CSV reader rejected outright.
    pub unreadable_rows: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinate {
    pub lat: f64,
    pub lon: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TripPoints {
    pub pickup: Coordinate,
    pub dropoff: Coordinate,
}

/// A trip that survived cleaning.
#[derive(Debug, Clone, PartialEq)]
pub struct TripRecord {
    pub fare: f64,
    pub distance_km: f64,
    pub pickup_at: Option<DateTime<Utc>>,
    pub points: Option<TripPoints>,
}

/// Rows removed at each cleaning stage.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DropCounts {
    pub unreadable: usize,
    pub invalid_fare: usize,
    pub invalid_distance: usize,
    pub invalid_coordinates: usize,
    pub outliers: usize,
}

impl DropCounts {
    pub fn total(&self) -> usize {
        self.unreadable
            + self.invalid_fare
            + self.invalid_distance
            + self.invalid_coordinates
            + self.outliers
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProviderStats {
    pub provider: String,
    pub rows_read: usize,
    pub trips_retained: usize,
    pub dropped: DropCounts,
    /// Mean trip length over geo-valid trips, before outlier removal.
    pub mean_distance_km: f64,
    /// Mean fare after outlier removal, in the dataset's own currency.
    pub mean_fare: f64,
    pub conversion_rate: f64,
    /// `mean_fare * conversion_rate / mean_distance_km`
    pub fare_per_km: f64,
    pub first_pickup: Option<DateTime<Utc>>,
    pub last_pickup: Option<DateTime<Utc>>,
    pub color: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FareReport {
    pub title: String,
    pub currency_symbol: String,
    pub generated_at: DateTime<Utc>,
    pub providers: Vec<ProviderStats>,
}

impl FareReport {
    pub fn max_fare_per_km(&self) -> f64 {
        self.providers
            .iter()
            .map(|p| p.fare_per_km)
            .fold(0.0, f64::max)
    }

    pub fn provider(&self, name: &str) -> Option<&ProviderStats> {
        self.providers
            .iter()
            .find(|p| p.provider.eq_ignore_ascii_case(name))
    }
}
