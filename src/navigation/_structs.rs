use crate::transport::TransportError;
use crate::utils::GeoCoordinate;
use chrono::{DateTime, Utc};
use serde::Serialize;

/// Modificador de maniobra de un paso de la ruta.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum Maneuver {
    Straight,
    Left,
    Right,
    SlightLeft,
    SlightRight,
    UTurn,
    Depart,
    Arrive,
}

impl Maneuver {
    /// Clasifica a partir del `type` y `modifier` del servicio de rutas.
    pub fn from_wire(kind: &str, modifier: &str) -> Self {
        match kind {
            "depart" => return Maneuver::Depart,
            "arrive" => return Maneuver::Arrive,
            _ => {}
        }
        match modifier {
            "left" | "sharp left" => Maneuver::Left,
            "right" | "sharp right" => Maneuver::Right,
            "slight left" => Maneuver::SlightLeft,
            "slight right" => Maneuver::SlightRight,
            "uturn" => Maneuver::UTurn,
            _ => Maneuver::Straight,
        }
    }

    /// Nombre del icono que la capa de presentación asocia a la maniobra.
    pub fn icon_name(&self) -> &'static str {
        match self {
            Maneuver::Straight => "straight",
            Maneuver::Left => "turn-left",
            Maneuver::Right => "turn-right",
            Maneuver::SlightLeft => "slight-left",
            Maneuver::SlightRight => "slight-right",
            Maneuver::UTurn => "u-turn",
            Maneuver::Depart => "depart",
            Maneuver::Arrive => "arrive",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RouteStep {
    pub instruction: String,
    pub maneuver: Maneuver,
    pub road_name: String,
    /// Distancia hasta el siguiente paso, en metros.
    pub distance_m: f64,
    pub duration_s: f64,
    pub location: GeoCoordinate,
}

/// Ruta calculada. Nunca se modifica en sitio: una ruta nueva reemplaza a la anterior.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Route {
    path: Vec<GeoCoordinate>,
    steps: Vec<RouteStep>,
    distance_m: f64,
    duration_s: f64,
    traffic: Vec<TrafficSegment>,
}

impl Route {
    pub fn new(path: Vec<GeoCoordinate>, steps: Vec<RouteStep>, distance_m: f64, duration_s: f64) -> Self {
        Self {
            path,
            steps,
            distance_m,
            duration_s,
            traffic: Vec::new(),
        }
    }

    /// Consume la ruta y devuelve una con los segmentos de tráfico asociados.
    pub fn with_traffic(self, traffic: Vec<TrafficSegment>) -> Self {
        Self { traffic, ..self }
    }

    pub fn path(&self) -> &[GeoCoordinate] {
        &self.path
    }

    pub fn steps(&self) -> &[RouteStep] {
        &self.steps
    }

    pub fn distance_m(&self) -> f64 {
        self.distance_m
    }

    pub fn duration_s(&self) -> f64 {
        self.duration_s
    }

    pub fn traffic(&self) -> &[TrafficSegment] {
        &self.traffic
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Clear,
    Slow,
    Congested,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Clear => "clear",
            Severity::Slow => "slow",
            Severity::Congested => "congested",
        }
    }

    pub fn color(&self) -> &'static str {
        match self {
            Severity::Clear => "#2ecc71",
            Severity::Slow => "#f39c12",
            Severity::Congested => "#e74c3c",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TrafficSegment {
    pub points: Vec<GeoCoordinate>,
    pub severity: Severity,
}

/// Lugar devuelto por la búsqueda (o sintetizado por categoría).
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Place {
    pub name: String,
    pub address: String,
    pub location: GeoCoordinate,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RecentSearch {
    pub text: String,
    pub searched_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum NavigationState {
    Idle,
    RouteCalculating,
    Navigating,
    Arrived,
}

// Errores que llegan a la UI como eventos
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum NavError {
    #[error("Network error: {0}")]
    Transport(#[from] TransportError),
    #[error("No route found")]
    NoRouteFound,
    #[error("Malformed response: {0}")]
    MalformedResponse(String),
    #[error("Invalid command: {0}")]
    InvalidCommand(String),
    #[error("Background task failed: {0}")]
    BackgroundTask(String),
    #[error("Navigation controller stopped")]
    ControllerClosed,
}

impl From<tokio::task::JoinError> for NavError {
    fn from(e: tokio::task::JoinError) -> Self {
        NavError::BackgroundTask(e.to_string())
    }
}
