pub mod _structs;
pub mod place_parser;
pub mod requests;
pub mod route_parser;

pub use requests::{geocode_url, route_url};
pub use route_parser::RouteError;
