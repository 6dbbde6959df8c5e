use geo::algorithm::haversine_bearing::HaversineBearing;
use geo::algorithm::haversine_distance::HaversineDistance;
use geo_types::Point;
use serde::Serialize;

/// Punto geográfico inmutable en grados (WGS84).
///
/// Solo se construye a través de [`GeoCoordinate::new`], que garantiza
/// `-90 <= lat <= 90` y `-180 <= lon <= 180`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct GeoCoordinate {
    latitude: f64,
    longitude: f64,
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum CoordinateError {
    #[error("Latitude out of range: {0}")]
    LatitudeOutOfRange(f64),
    #[error("Longitude out of range: {0}")]
    LongitudeOutOfRange(f64),
}

impl GeoCoordinate {
    pub fn new(latitude: f64, longitude: f64) -> Result<Self, CoordinateError> {
        if !(-90.0..=90.0).contains(&latitude) {
            return Err(CoordinateError::LatitudeOutOfRange(latitude));
        }
        if !(-180.0..=180.0).contains(&longitude) {
            return Err(CoordinateError::LongitudeOutOfRange(longitude));
        }
        Ok(Self { latitude, longitude })
    }

    /// Construye desde el orden de los servicios externos: (longitud, latitud).
    pub fn from_lon_lat(pair: [f64; 2]) -> Result<Self, CoordinateError> {
        Self::new(pair[1], pair[0])
    }

    pub fn latitude(&self) -> f64 {
        self.latitude
    }

    pub fn longitude(&self) -> f64 {
        self.longitude
    }

    /// Devuelve el par en orden (longitud, latitud), como lo esperan GeoJSON y OSRM.
    pub fn lon_lat(&self) -> [f64; 2] {
        [self.longitude, self.latitude]
    }

    fn point(&self) -> Point<f64> {
        Point::new(self.longitude, self.latitude)
    }

    pub fn distance_to(&self, other: &GeoCoordinate) -> f64 {
        distance_meters(self, other)
    }

    pub fn bearing_to(&self, other: &GeoCoordinate) -> f64 {
        bearing_degrees(self, other)
    }
}

/// Distancia haversine en metros, con el radio medio terrestre de `geo`.
pub fn distance_meters(a: &GeoCoordinate, b: &GeoCoordinate) -> f64 {
    if a == b {
        return 0.0;
    }
    a.point().haversine_distance(&b.point())
}

/// Rumbo inicial de `from` hacia `to` en [0, 360). Por convención 0 si los puntos coinciden.
pub fn bearing_degrees(from: &GeoCoordinate, to: &GeoCoordinate) -> f64 {
    if from == to {
        return 0.0;
    }
    let bearing = from.point().haversine_bearing(to.point()).rem_euclid(360.0);
    // rem_euclid puede redondear a 360.0 exacto para ángulos apenas negativos
    if bearing >= 360.0 {
        0.0
    } else {
        bearing
    }
}

/// Longitud total de un camino en metros.
pub fn path_length(path: &[GeoCoordinate]) -> f64 {
    path.windows(2)
        .map(|w| distance_meters(&w[0], &w[1]))
        .sum()
}
