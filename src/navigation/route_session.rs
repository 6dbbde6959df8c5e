use crate::navigation::events::{NavEvent, NavField};
use crate::navigation::simulator::{TickOutcome, VehicleSimState};
use crate::navigation::{Maneuver, NavError, NavigationState, Route, RouteStep};
use crate::utils::GeoCoordinate;
use std::sync::Arc;
use tracing::{debug, info, warn};

pub const DEFAULT_SPEED_LIMIT: u32 = 90;
pub const DEFAULT_MANEUVER_THRESHOLD_M: f64 = 30.0;

const ARRIVED_TEXT: &str = "You have arrived at your destination";

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SessionSettings {
    pub maneuver_threshold_m: f64,
    pub default_speed_limit: u32,
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self {
            maneuver_threshold_m: DEFAULT_MANEUVER_THRESHOLD_M,
            default_speed_limit: DEFAULT_SPEED_LIMIT,
        }
    }
}

/// Identifica una petición de ruta en curso.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RouteTicket {
    pub generation: u64,
}

#[derive(Debug, Clone, PartialEq)]
pub enum RouteApplied {
    Ready,
    Failed(NavError),
    /// La petición fue reemplazada o cancelada; el resultado se descarta.
    Stale,
}

// Único valor autoritativo de la máquina de estados; se reemplaza en cada transición
#[derive(Debug)]
enum SessionState {
    Idle {
        route: Option<Arc<Route>>,
    },
    Calculating {
        generation: u64,
        held: Option<Arc<Route>>,
    },
    Navigating {
        route: Arc<Route>,
        sim: VehicleSimState,
        destination: String,
    },
    Arrived,
}

/// Máquina de estados de la ruta activa y del vehículo simulado.
#[derive(Debug)]
pub struct RouteSession {
    state: SessionState,
    generation: u64,
    position: GeoCoordinate,
    bearing: f64,
    speed_limit: u32,
    settings: SessionSettings,
}

impl RouteSession {
    pub fn new(home: GeoCoordinate, settings: SessionSettings) -> Self {
        Self {
            state: SessionState::Idle { route: None },
            generation: 0,
            position: home,
            bearing: 0.0,
            speed_limit: settings.default_speed_limit,
            settings,
        }
    }

    pub fn state(&self) -> NavigationState {
        match self.state {
            SessionState::Idle { .. } => NavigationState::Idle,
            SessionState::Calculating { .. } => NavigationState::RouteCalculating,
            SessionState::Navigating { .. } => NavigationState::Navigating,
            SessionState::Arrived => NavigationState::Arrived,
        }
    }

    pub fn is_navigating(&self) -> bool {
        matches!(self.state, SessionState::Navigating { .. })
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Ruta retenida: la lista para navegar, la que se recorre o la anterior mientras se calcula otra.
    pub fn route(&self) -> Option<&Arc<Route>> {
        match &self.state {
            SessionState::Idle { route } => route.as_ref(),
            SessionState::Calculating { held, .. } => held.as_ref(),
            SessionState::Navigating { route, .. } => Some(route),
            SessionState::Arrived => None,
        }
    }

    pub fn position(&self) -> GeoCoordinate {
        self.position
    }

    pub fn bearing(&self) -> f64 {
        self.bearing
    }

    pub fn speed_limit(&self) -> u32 {
        self.speed_limit
    }

    pub fn destination(&self) -> &str {
        match &self.state {
            SessionState::Navigating { destination, .. } => destination,
            _ => "",
        }
    }

    pub fn step_index(&self) -> Option<usize> {
        match &self.state {
            SessionState::Navigating { sim, .. } => Some(sim.step_index),
            _ => None,
        }
    }

    pub fn current_step(&self) -> Option<&RouteStep> {
        match &self.state {
            SessionState::Navigating { route, sim, .. } => sim.current_step(route),
            _ => None,
        }
    }

    pub fn road_name(&self) -> &str {
        self.current_step().map(|s| s.road_name.as_str()).unwrap_or("")
    }

    pub fn distance_to_maneuver(&self) -> Option<f64> {
        match &self.state {
            SessionState::Navigating { route, sim, .. } => Some(sim.distance_to_maneuver(route)),
            _ => None,
        }
    }

    /// Solo tiene sentido mientras se navega.
    pub fn distance_remaining(&self) -> Option<f64> {
        match &self.state {
            SessionState::Navigating { sim, .. } => Some(sim.remaining_m),
            _ => None,
        }
    }

    /// Duración restante proporcional a la distancia que queda.
    pub fn duration_remaining(&self) -> Option<f64> {
        match &self.state {
            SessionState::Navigating { route, sim, .. } if route.distance_m() > 0.0 => {
                Some(route.duration_s() * sim.remaining_m / route.distance_m())
            }
            SessionState::Navigating { .. } => Some(0.0),
            _ => None,
        }
    }

    /// Idle/Arrived → RouteCalculating. Si se navegaba, la simulación se detiene.
    pub fn calculate_route(
        &mut self,
        start: &GeoCoordinate,
        end: &GeoCoordinate,
        out: &mut Vec<NavEvent>,
    ) -> RouteTicket {
        self.generation += 1;
        let generation = self.generation;

        let previous = std::mem::replace(&mut self.state, SessionState::Arrived);
        let held = match previous {
            SessionState::Idle { route } => route,
            SessionState::Calculating { held, .. } => held,
            SessionState::Navigating { .. } => {
                info!("Route recalculation requested while navigating; stopping simulation");
                push_guidance_fields(out);
                out.push(NavEvent::Changed(NavField::Steps));
                out.push(NavEvent::Changed(NavField::Traffic));
                None
            }
            SessionState::Arrived => None,
        };
        self.state = SessionState::Calculating { generation, held };

        self.speed_limit = self.settings.default_speed_limit;
        out.push(NavEvent::Changed(NavField::State));
        out.push(NavEvent::Changed(NavField::SpeedLimit));

        info!(
            "Calculating route from ({}, {}) to ({}, {}) [generation {}]",
            start.latitude(),
            start.longitude(),
            end.latitude(),
            end.longitude(),
            generation
        );
        RouteTicket { generation }
    }

    /// Aplica el resultado de una petición en segundo plano si sigue vigente.
    pub fn apply_route(
        &mut self,
        generation: u64,
        result: Result<Route, NavError>,
        out: &mut Vec<NavEvent>,
    ) -> RouteApplied {
        let current = match &self.state {
            SessionState::Calculating { generation: pending, .. } => *pending == generation,
            _ => false,
        };
        if !current || generation != self.generation {
            debug!(
                "Discarding stale route result (generation {}, current {})",
                generation, self.generation
            );
            return RouteApplied::Stale;
        }

        let held = match std::mem::replace(&mut self.state, SessionState::Arrived) {
            SessionState::Calculating { held, .. } => held,
            _ => None,
        };

        match result {
            Ok(route) => {
                info!(
                    "Route ready: {:.0} m, {:.0} s, {} steps",
                    route.distance_m(),
                    route.duration_s(),
                    route.steps().len()
                );
                out.push(NavEvent::RouteReady {
                    distance_m: route.distance_m(),
                    duration_s: route.duration_s(),
                });
                self.state = SessionState::Idle {
                    route: Some(Arc::new(route)),
                };
                out.push(NavEvent::Changed(NavField::State));
                out.push(NavEvent::Changed(NavField::Steps));
                out.push(NavEvent::Changed(NavField::Traffic));
                RouteApplied::Ready
            }
            Err(e) => {
                warn!("Route calculation failed: {}", e);
                self.state = SessionState::Idle { route: held };
                out.push(NavEvent::Changed(NavField::State));
                RouteApplied::Failed(e)
            }
        }
    }

    /// Idle con ruta → Navigating.
    pub fn start_navigation(&mut self, destination: &str, out: &mut Vec<NavEvent>) -> Result<(), NavError> {
        let route = match &self.state {
            SessionState::Idle { route: Some(route) } => Arc::clone(route),
            SessionState::Calculating { .. } => {
                return Err(NavError::InvalidCommand("route calculation in progress".into()))
            }
            SessionState::Navigating { .. } => {
                return Err(NavError::InvalidCommand("navigation already active".into()))
            }
            _ => return Err(NavError::InvalidCommand("no route available".into())),
        };

        let sim = VehicleSimState::start(&route, self.position);
        self.position = sim.position;
        self.bearing = sim.bearing;

        let (text, distance_m) = match sim.current_step(&route) {
            Some(step) => (step.instruction.clone(), Some(step.distance_m.round() as u32)),
            None => (format!("Head to {}", destination), None),
        };

        info!("Navigation started towards '{}'", destination);
        self.state = SessionState::Navigating {
            route,
            sim,
            destination: destination.to_string(),
        };

        out.push(NavEvent::Changed(NavField::State));
        push_guidance_fields(out);
        out.push(NavEvent::Changed(NavField::Position));
        out.push(NavEvent::Changed(NavField::Bearing));
        out.push(NavEvent::Position {
            coordinate: self.position,
            bearing: self.bearing,
        });
        out.push(NavEvent::Guidance { text, distance_m });
        Ok(())
    }

    /// Detiene la simulación y descarta la ruta y cualquier petición en curso.
    pub fn stop_navigation(&mut self, out: &mut Vec<NavEvent>) {
        // Cualquier resultado en vuelo queda obsoleto
        self.generation += 1;

        let previous = std::mem::replace(&mut self.state, SessionState::Idle { route: None });
        match previous {
            SessionState::Navigating { .. } => {
                info!("Navigation stopped");
                out.push(NavEvent::Changed(NavField::State));
                push_guidance_fields(out);
                out.push(NavEvent::Changed(NavField::Steps));
                out.push(NavEvent::Changed(NavField::Traffic));
            }
            SessionState::Calculating { held, .. } => {
                info!("Route calculation cancelled");
                out.push(NavEvent::Changed(NavField::State));
                if held.is_some() {
                    out.push(NavEvent::Changed(NavField::Steps));
                    out.push(NavEvent::Changed(NavField::Traffic));
                }
            }
            SessionState::Idle { route: Some(_) } => {
                out.push(NavEvent::Changed(NavField::Steps));
                out.push(NavEvent::Changed(NavField::Traffic));
            }
            SessionState::Idle { route: None } => {}
            SessionState::Arrived => out.push(NavEvent::Changed(NavField::State)),
        }
    }

    /// Un tick de simulación. Fuera de Navigating no hace nada.
    pub fn tick(&mut self, out: &mut Vec<NavEvent>) -> TickOutcome {
        let threshold = self.settings.maneuver_threshold_m;
        let (outcome, guidance) = match &mut self.state {
            SessionState::Navigating { route, sim, .. } => {
                let outcome = sim.advance(route, threshold);
                self.position = sim.position;
                self.bearing = sim.bearing;
                let guidance = outcome
                    .maneuver
                    .and_then(|index| route.steps().get(index))
                    .map(|step| (step.instruction.clone(), step.distance_m.round() as u32, step.maneuver));
                (outcome, guidance)
            }
            _ => return TickOutcome::default(),
        };

        if outcome.moved {
            out.push(NavEvent::Position {
                coordinate: self.position,
                bearing: self.bearing,
            });
            out.push(NavEvent::Changed(NavField::Position));
            out.push(NavEvent::Changed(NavField::Bearing));
            out.push(NavEvent::Changed(NavField::DistanceToManeuver));
            out.push(NavEvent::Changed(NavField::DistanceRemaining));
            out.push(NavEvent::Changed(NavField::Eta));
        }

        if let Some((text, distance_m, maneuver)) = guidance {
            debug!("Maneuver reached: {}", text);
            out.push(NavEvent::Changed(NavField::Maneuver));
            out.push(NavEvent::Changed(NavField::RoadName));
            // En el último punto solo se anuncia la llegada
            if !(outcome.arrived && maneuver == Maneuver::Arrive) {
                out.push(NavEvent::Guidance {
                    text,
                    distance_m: Some(distance_m),
                });
            }
        }

        if outcome.arrived {
            info!("Destination reached");
            out.push(NavEvent::Guidance {
                text: ARRIVED_TEXT.to_string(),
                distance_m: None,
            });
            self.state = SessionState::Arrived;
            out.push(NavEvent::Changed(NavField::State));
            push_guidance_fields(out);
            out.push(NavEvent::Changed(NavField::Steps));
            out.push(NavEvent::Changed(NavField::Traffic));
        }

        outcome
    }
}

fn push_guidance_fields(out: &mut Vec<NavEvent>) {
    out.extend(
        [
            NavField::Navigating,
            NavField::Destination,
            NavField::Maneuver,
            NavField::DistanceToManeuver,
            NavField::DistanceRemaining,
            NavField::Eta,
            NavField::RoadName,
        ]
        .into_iter()
        .map(NavEvent::Changed),
    );
}
