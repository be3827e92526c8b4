use crate::domain::model::{Coordinate, TripPoints};

/// Mean earth radius in kilometres.
pub const EARTH_RADIUS_KM: f64 = 6371.0088;

impl Coordinate {
    pub fn new(lat: f64, lon: f64) -> Self {
        Self { lat, lon }
    }

    /// Inclusive bounds; NaN is never valid.
    pub fn is_valid(&self) -> bool {
        (-90.0..=90.0).contains(&self.lat) && (-180.0..=180.0).contains(&self.lon)
    }
}

impl TripPoints {
    pub fn is_valid(&self) -> bool {
        self.pickup.is_valid() && self.dropoff.is_valid()
    }

    pub fn distance_km(&self) -> f64 {
        haversine_km(self.pickup, self.dropoff)
    }
}

/// Great-circle distance between two points.
pub fn haversine_km(a: Coordinate, b: Coordinate) -> f64 {
    let lat1 = a.lat.to_radians();
    let lat2 = b.lat.to_radians();
    let d_lat = (b.lat - a.lat).to_radians();
    let d_lon = (b.lon - a.lon).to_radians();

    let h = (d_lat / 2.0).sin().powi(2) + lat1.cos() * lat2.cos() * (d_lon / 2.0).sin().powi(2);
    // 浮點誤差可能讓 h 略大於 1
    2.0 * EARTH_RADIUS_KM * h.sqrt().min(1.0).asin()
}
