use crate::navigation::{Maneuver, NavError, Route, RouteStep};
use crate::queries::_structs::{RoutingResponse, WireRoute, WireStep};
use crate::utils::GeoCoordinate;
use tracing::{debug, warn};

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum RouteError {
    #[error("No route found")]
    NoRouteFound,
    #[error("Malformed routing response: {0}")]
    MalformedResponse(String),
}

impl From<RouteError> for NavError {
    fn from(e: RouteError) -> Self {
        match e {
            RouteError::NoRouteFound => NavError::NoRouteFound,
            RouteError::MalformedResponse(msg) => NavError::MalformedResponse(msg),
        }
    }
}

/// Convierte la respuesta cruda del servicio de rutas en una [`Route`].
///
/// Solo se toma el primer candidato. Las coordenadas llegan como
/// (longitud, latitud) y se invierten al modelo interno.
pub fn parse(raw: &[u8]) -> Result<Route, RouteError> {
    let response: RoutingResponse = serde_json::from_slice(raw)
        .map_err(|e| RouteError::MalformedResponse(e.to_string()))?;

    let first = match response.routes.into_iter().next() {
        Some(route) => route,
        None => {
            warn!("Routing service returned no routes (code: {:?})", response.code);
            return Err(RouteError::NoRouteFound);
        }
    };

    let wire: WireRoute =
        serde_json::from_value(first).map_err(|e| RouteError::MalformedResponse(e.to_string()))?;

    let path = wire
        .geometry
        .coordinates
        .iter()
        .map(|pair| to_coordinate(*pair))
        .collect::<Result<Vec<_>, _>>()?;

    if path.is_empty() {
        return Err(RouteError::MalformedResponse("route geometry has no coordinates".into()));
    }

    let leg = wire
        .legs
        .into_iter()
        .next()
        .ok_or_else(|| RouteError::MalformedResponse("route has no legs".into()))?;

    let steps = leg
        .steps
        .into_iter()
        .map(to_step)
        .collect::<Result<Vec<_>, _>>()?;

    debug!(
        "Parsed route: {} points, {} steps, {:.0} m, {:.0} s",
        path.len(),
        steps.len(),
        wire.distance,
        wire.duration
    );

    Ok(Route::new(path, steps, wire.distance, wire.duration))
}

fn to_coordinate(pair: [f64; 2]) -> Result<GeoCoordinate, RouteError> {
    GeoCoordinate::from_lon_lat(pair).map_err(|e| RouteError::MalformedResponse(e.to_string()))
}

fn to_step(step: WireStep) -> Result<RouteStep, RouteError> {
    let location = to_coordinate(step.maneuver.location)?;
    let instruction = instruction_text(&step.maneuver.kind, &step.maneuver.modifier, &step.name);

    Ok(RouteStep {
        instruction,
        maneuver: Maneuver::from_wire(&step.maneuver.kind, &step.maneuver.modifier),
        road_name: step.name,
        distance_m: step.distance,
        duration_s: step.duration,
        location,
    })
}

/// Texto de la instrucción a partir de tipo, modificador y nombre de la vía.
pub fn instruction_text(kind: &str, modifier: &str, name: &str) -> String {
    let text = match kind {
        "depart" => format!("Head to {}", name),
        "arrive" => "Arrive at destination".to_string(),
        _ if name.is_empty() => format!("{} {}", kind, modifier),
        _ => format!("{} {} on {}", kind, modifier, name),
    };
    capitalize_first(&text)
}

fn capitalize_first(text: &str) -> String {
    let mut chars = text.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
