pub mod export;
pub mod find_places;
pub mod find_route;
pub mod traffic;

pub use export::route_as_geojson;
pub use find_places::find_places_by_name;
pub use find_route::find_route;
pub use traffic::TrafficSegmenter;
