use crate::navigation::NavError;
use crate::utils::GeoCoordinate;
use tokio::sync::mpsc;

/// Campo de la instantánea que cambió. Permite a la UI enlazarse de forma acotada.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NavField {
    State,
    Position,
    Bearing,
    Navigating,
    Destination,
    Maneuver,
    DistanceToManeuver,
    DistanceRemaining,
    /// Cadena de llegada estimada, derivada de la distancia restante.
    Eta,
    Steps,
    Traffic,
    SpeedLimit,
    RoadName,
    QueryText,
    RecentSearches,
    SearchResults,
    MapPins,
}

#[derive(Debug, Clone, PartialEq)]
pub enum NavEvent {
    Changed(NavField),
    /// Posición simulada, una vez por tick mientras se navega.
    Position { coordinate: GeoCoordinate, bearing: f64 },
    /// Texto de guía para la voz: inicio, cada maniobra y la llegada.
    Guidance { text: String, distance_m: Option<u32> },
    RouteReady { distance_m: f64, duration_s: f64 },
    Error(NavError),
}

/// Receptor de eventos. Se invoca siempre desde la tarea dueña del estado.
pub trait Observer: Send {
    fn on_event(&mut self, event: &NavEvent);
}

impl<F> Observer for F
where
    F: FnMut(&NavEvent) + Send,
{
    fn on_event(&mut self, event: &NavEvent) {
        self(event)
    }
}

/// Reenvía los eventos a un canal para consumirlos desde otra tarea.
pub struct ChannelObserver {
    tx: mpsc::UnboundedSender<NavEvent>,
}

impl ChannelObserver {
    pub fn new() -> (Self, mpsc::UnboundedReceiver<NavEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }
}

impl Observer for ChannelObserver {
    fn on_event(&mut self, event: &NavEvent) {
        // Un receptor cerrado no debe afectar al resto de observadores
        let _ = self.tx.send(event.clone());
    }
}

/// Entrega en orden de registro.
#[derive(Default)]
pub struct EventBus {
    observers: Vec<Box<dyn Observer>>,
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe(&mut self, observer: Box<dyn Observer>) {
        self.observers.push(observer);
    }

    pub fn len(&self) -> usize {
        self.observers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.observers.is_empty()
    }

    pub fn dispatch(&mut self, events: &[NavEvent]) {
        for event in events {
            for observer in self.observers.iter_mut() {
                observer.on_event(event);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    #[test]
    fn test_dispatch_in_registration_order() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let mut bus = EventBus::new();
        for name in ["first", "second", "third"] {
            let log = Arc::clone(&log);
            bus.subscribe(Box::new(move |event: &NavEvent| {
                if let NavEvent::Changed(field) = event {
                    log.lock().unwrap().push(format!("{name}:{field:?}"));
                }
            }));
        }

        bus.dispatch(&[NavEvent::Changed(NavField::Position), NavEvent::Changed(NavField::Bearing)]);

        assert_eq!(
            *log.lock().unwrap(),
            vec![
                "first:Position",
                "second:Position",
                "third:Position",
                "first:Bearing",
                "second:Bearing",
                "third:Bearing",
            ]
        );
    }

    #[test]
    fn test_channel_observer_survives_closed_receiver() {
        let (observer, rx) = ChannelObserver::new();
        drop(rx);
        let mut bus = EventBus::new();
        bus.subscribe(Box::new(observer));
        bus.dispatch(&[NavEvent::Changed(NavField::MapPins)]);
        assert_eq!(bus.len(), 1);
    }
}
