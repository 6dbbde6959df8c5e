pub mod format;
pub mod geo_path;

pub use format::{format_distance, format_duration};
pub use geo_path::{bearing_degrees, distance_meters, path_length, CoordinateError, GeoCoordinate};
