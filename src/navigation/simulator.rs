use crate::navigation::{Route, RouteStep};
use crate::utils::GeoCoordinate;

/// Estado del vehículo simulado sobre la ruta activa.
///
/// Solo el tick de simulación lo modifica; la UI lo lee a través de la
/// instantánea del controlador.
#[derive(Debug, Clone, PartialEq)]
pub struct VehicleSimState {
    pub path_index: usize,
    pub step_index: usize,
    pub position: GeoCoordinate,
    pub bearing: f64,
    pub remaining_m: f64,
}

/// Resultado de un tick.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TickOutcome {
    pub moved: bool,
    /// Índice del paso recién alcanzado, si hubo transición de maniobra.
    pub maneuver: Option<usize>,
    pub arrived: bool,
}

impl VehicleSimState {
    /// Coloca el vehículo en el primer punto del camino.
    pub fn start(route: &Route, fallback: GeoCoordinate) -> Self {
        let path = route.path();
        let position = path.first().copied().unwrap_or(fallback);
        let bearing = match path.get(1) {
            Some(next) => position.bearing_to(next),
            None => 0.0,
        };
        Self {
            path_index: 0,
            step_index: 0,
            position,
            bearing,
            remaining_m: route.distance_m(),
        }
    }

    pub fn current_step<'a>(&self, route: &'a Route) -> Option<&'a RouteStep> {
        route.steps().get(self.step_index)
    }

    /// Siguiente paso pendiente: el que dispara la próxima maniobra.
    pub fn pending_step<'a>(&self, route: &'a Route) -> Option<&'a RouteStep> {
        route.steps().get(self.step_index + 1)
    }

    /// Distancia a la próxima maniobra, o al final del camino si no quedan pasos.
    pub fn distance_to_maneuver(&self, route: &Route) -> f64 {
        match self.pending_step(route) {
            Some(step) => self.position.distance_to(&step.location),
            None => route
                .path()
                .last()
                .map(|end| self.position.distance_to(end))
                .unwrap_or(0.0),
        }
    }

    /// Avanza un punto del camino y revisa la proximidad a la siguiente maniobra.
    pub fn advance(&mut self, route: &Route, threshold_m: f64) -> TickOutcome {
        let path = route.path();
        let mut outcome = TickOutcome::default();

        let next_index = self.path_index + 1;
        if let Some(next) = path.get(next_index) {
            let previous = self.position;
            self.bearing = previous.bearing_to(next);
            self.remaining_m = (self.remaining_m - previous.distance_to(next)).max(0.0);
            self.position = *next;
            self.path_index = next_index;
            outcome.moved = true;

            // Como mucho una transición por tick
            if let Some(step) = self.pending_step(route) {
                if self.position.distance_to(&step.location) < threshold_m {
                    self.step_index += 1;
                    outcome.maneuver = Some(self.step_index);
                }
            }
        }

        if self.path_index + 1 >= path.len() {
            self.remaining_m = 0.0;
            outcome.arrived = true;
        }

        outcome
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::navigation::Maneuver;

    fn pt(lat: f64, lon: f64) -> GeoCoordinate {
        GeoCoordinate::new(lat, lon).unwrap()
    }

    fn step(text: &str, maneuver: Maneuver, at: GeoCoordinate, distance_m: f64) -> RouteStep {
        RouteStep {
            instruction: text.into(),
            maneuver,
            road_name: String::new(),
            distance_m,
            duration_s: 0.0,
            location: at,
        }
    }

    /// 10 puntos hacia el norte, ~111 m entre cada uno.
    fn route_with_turn_at(turn_index: usize) -> Route {
        let path: Vec<_> = (0..10).map(|i| pt(59.0 + i as f64 * 0.001, 18.0)).collect();
        let steps = vec![
            step("Head to Main St", Maneuver::Depart, path[0], 500.0),
            step("Turn left on Oak Ave", Maneuver::Left, path[turn_index], 400.0),
            step("Arrive at destination", Maneuver::Arrive, path[9], 0.0),
        ];
        let distance = crate::utils::path_length(&path);
        Route::new(path, steps, distance, 100.0)
    }

    #[test]
    fn test_start_snaps_to_first_point() {
        let route = route_with_turn_at(4);
        let sim = VehicleSimState::start(&route, pt(0.0, 0.0));
        assert_eq!(sim.position, route.path()[0]);
        assert_eq!(sim.path_index, 0);
        assert_eq!(sim.step_index, 0);
        assert!(sim.bearing.abs() < 0.1);
        assert_eq!(sim.remaining_m, route.distance_m());
    }

    #[test]
    fn test_advance_moves_one_point_and_subtracts_distance() {
        let route = route_with_turn_at(4);
        let mut sim = VehicleSimState::start(&route, pt(0.0, 0.0));
        let before = sim.remaining_m;

        let outcome = sim.advance(&route, 30.0);
        assert!(outcome.moved);
        assert!(!outcome.arrived);
        assert_eq!(sim.path_index, 1);
        assert_eq!(sim.position, route.path()[1]);
        let travelled = route.path()[0].distance_to(&route.path()[1]);
        assert!((before - sim.remaining_m - travelled).abs() < 1e-6);
    }

    #[test]
    fn test_maneuver_advances_exactly_once() {
        let route = route_with_turn_at(2);
        let mut sim = VehicleSimState::start(&route, pt(0.0, 0.0));

        // punto 1: el giro está a ~111 m
        assert_eq!(sim.advance(&route, 30.0).maneuver, None);
        assert_eq!(sim.step_index, 0);

        // punto 2: sobre la maniobra
        assert_eq!(sim.advance(&route, 30.0).maneuver, Some(1));
        assert_eq!(sim.step_index, 1);

        // los ticks siguientes no vuelven a avanzar hasta la llegada
        for _ in 3..8 {
            assert_eq!(sim.advance(&route, 30.0).maneuver, None);
            assert_eq!(sim.step_index, 1);
        }
    }

    #[test]
    fn test_one_transition_per_tick_even_with_stacked_maneuvers() {
        let path: Vec<_> = (0..4).map(|i| pt(59.0 + i as f64 * 0.001, 18.0)).collect();
        let steps = vec![
            step("Head to A", Maneuver::Depart, path[0], 100.0),
            step("Turn left", Maneuver::Left, path[1], 5.0),
            step("Turn right", Maneuver::Right, path[1], 100.0),
            step("Arrive at destination", Maneuver::Arrive, path[3], 0.0),
        ];
        let route = Route::new(path, steps, 333.0, 30.0);
        let mut sim = VehicleSimState::start(&route, pt(0.0, 0.0));

        assert_eq!(sim.advance(&route, 30.0).maneuver, Some(1));
        assert_eq!(sim.advance(&route, 30.0).maneuver, None);
        // el segundo giro quedó atrás: ya no está dentro del umbral
        assert_eq!(sim.step_index, 1);
    }

    #[test]
    fn test_arrival_on_last_point() {
        let route = route_with_turn_at(4);
        let mut sim = VehicleSimState::start(&route, pt(0.0, 0.0));
        let mut arrived_at = None;
        for tick in 1..=9 {
            let outcome = sim.advance(&route, 30.0);
            if outcome.arrived {
                arrived_at = Some(tick);
                break;
            }
        }
        assert_eq!(arrived_at, Some(9));
        assert_eq!(sim.position, *route.path().last().unwrap());
        assert_eq!(sim.remaining_m, 0.0);
        // el paso de llegada se alcanzó en el mismo tick
        assert_eq!(sim.step_index, 2);
    }

    #[test]
    fn test_single_point_route_arrives_immediately() {
        let only = pt(59.0, 18.0);
        let route = Route::new(vec![only], Vec::new(), 0.0, 0.0);
        let mut sim = VehicleSimState::start(&route, pt(0.0, 0.0));
        let outcome = sim.advance(&route, 30.0);
        assert!(!outcome.moved);
        assert!(outcome.arrived);
    }

    #[test]
    fn test_distance_to_maneuver() {
        let route = route_with_turn_at(4);
        let mut sim = VehicleSimState::start(&route, pt(0.0, 0.0));
        let expected = route.path()[0].distance_to(&route.path()[4]);
        assert!((sim.distance_to_maneuver(&route) - expected).abs() < 1e-6);

        sim.step_index = 2;
        let to_end = route.path()[0].distance_to(&route.path()[9]);
        assert!((sim.distance_to_maneuver(&route) - to_end).abs() < 1e-6);
    }
}
