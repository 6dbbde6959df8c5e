pub mod _structs;
pub mod controller;
pub mod events;
pub mod route_session;
pub mod search;
pub mod simulator;

pub use _structs::{
    Maneuver, NavError, NavigationState, Place, RecentSearch, Route, RouteStep, Severity, TrafficSegment,
};
pub use controller::{NavigationController, NavigationHandle, NavigationSnapshot};
pub use events::{ChannelObserver, EventBus, NavEvent, NavField, Observer};
pub use route_session::{RouteApplied, RouteSession, RouteTicket, SessionSettings};
pub use search::{PlaceSearchEngine, SearchSettings};
pub use simulator::{TickOutcome, VehicleSimState};
