//! Geo-distance filtering primitives.
//!
//! Tantivy has no native geo query, so distance filtering is done the way a
//! geocoder index does it: latitude and longitude live in plain f64 columns,
//! a candidate set is drawn with a bounding-box range conjunction, and the
//! exact great-circle distance is checked per hit.

use crate::search::error::{SearchError, SearchResult};

/// Mean Earth radius in meters (IUGG).
const EARTH_RADIUS_M: f64 = 6_371_000.0;

/// A WGS84 point.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GeoPoint {
    pub lon: f64,
    pub lat: f64,
}

impl GeoPoint {
    pub const fn new(lon: f64, lat: f64) -> Self {
        Self { lon, lat }
    }
}

/// Parse a distance string like `100mi`, `5km` or `2000m` into meters.
pub fn parse_distance(input: &str) -> SearchResult<f64> {
    let trimmed = input.trim();
    let split = trimmed
        .find(|c: char| c.is_ascii_alphabetic())
        .unwrap_or(trimmed.len());
    let (number, unit) = trimmed.split_at(split);
    let value: f64 = number
        .parse()
        .map_err(|_| SearchError::InvalidDistance(input.to_string()))?;
    if value < 0.0 {
        return Err(SearchError::InvalidDistance(input.to_string()));
    }
    let meters_per_unit = match unit {
        "mi" => 1_609.344,
        "km" => 1_000.0,
        // Bare numbers are meters, matching the engine's grammar.
        "m" | "" => 1.0,
        _ => return Err(SearchError::InvalidDistance(input.to_string())),
    };
    Ok(value * meters_per_unit)
}

/// Great-circle distance between two points in meters (haversine).
pub fn haversine_m(a: GeoPoint, b: GeoPoint) -> f64 {
    let d_lat = (b.lat - a.lat).to_radians();
    let d_lon = (b.lon - a.lon).to_radians();
    let h = (d_lat / 2.0).sin().powi(2)
        + a.lat.to_radians().cos() * b.lat.to_radians().cos() * (d_lon / 2.0).sin().powi(2);
    2.0 * EARTH_RADIUS_M * h.sqrt().asin()
}

/// Inclusive lat/lon ranges covering a circle around `center`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundingBox {
    pub min_lat: f64,
    pub max_lat: f64,
    pub min_lon: f64,
    pub max_lon: f64,
}

impl BoundingBox {
    /// Box around `center` with the given radius in meters.
    ///
    /// Returns `None` when the radius covers the whole globe, or when the
    /// box would cross a pole or the antimeridian; callers fall back to a
    /// match-all candidate set and rely on the exact distance check.
    pub fn around(center: GeoPoint, radius_m: f64) -> Option<Self> {
        let half_circumference = std::f64::consts::PI * EARTH_RADIUS_M;
        if radius_m >= half_circumference {
            return None;
        }
        let lat_delta = (radius_m / EARTH_RADIUS_M).to_degrees();
        let min_lat = center.lat - lat_delta;
        let max_lat = center.lat + lat_delta;
        if min_lat < -90.0 || max_lat > 90.0 {
            return None;
        }
        let cos_lat = center.lat.to_radians().cos();
        if cos_lat <= f64::EPSILON {
            return None;
        }
        let lon_delta = lat_delta / cos_lat;
        let min_lon = center.lon - lon_delta;
        let max_lon = center.lon + lon_delta;
        if min_lon < -180.0 || max_lon > 180.0 {
            return None;
        }
        Some(Self {
            min_lat,
            max_lat,
            min_lon,
            max_lon,
        })
    }
}
