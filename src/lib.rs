pub mod config;
pub mod functions;
pub mod middlewares;
pub mod navigation;
pub mod queries;
pub mod transport;
pub mod utils;

#[cfg(test)]
pub(crate) mod test_support;

pub use config::{ConfigError, NavConfig};
pub use functions::*;
pub use navigation::{NavError, NavEvent, NavField, NavigationController, NavigationHandle, NavigationSnapshot};
pub use transport::{HttpTransport, Transport, TransportError};
pub use utils::*;
