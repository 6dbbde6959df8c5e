use crate::navigation::events::{NavEvent, NavField};
use crate::navigation::{NavError, Place, RecentSearch};
use crate::utils::GeoCoordinate;
use chrono::Utc;
use rand::Rng;
use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;
use tracing::{debug, info, warn};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SearchSettings {
    pub debounce: Duration,
    pub recent_limit: usize,
    pub category_results: usize,
    pub category_spread_deg: f64,
}

impl Default for SearchSettings {
    fn default() -> Self {
        Self {
            debounce: Duration::from_millis(600),
            recent_limit: 5,
            category_results: 3,
            category_spread_deg: 0.01,
        }
    }
}

/// Consulta cuyo temporizador venció y debe enviarse al geocodificador.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingQuery {
    pub generation: u64,
    pub text: String,
}

/// Búsqueda de lugares con debounce, historial reciente y pines del mapa.
#[derive(Debug)]
pub struct PlaceSearchEngine {
    settings: SearchSettings,
    query_text: String,
    deadline: Option<Instant>,
    generation: u64,
    recent: VecDeque<RecentSearch>,
    results: Arc<Vec<Place>>,
    pins: Arc<Vec<Place>>,
}

impl PlaceSearchEngine {
    pub fn new(settings: SearchSettings) -> Self {
        Self {
            settings,
            query_text: String::new(),
            deadline: None,
            generation: 0,
            recent: VecDeque::with_capacity(settings.recent_limit),
            results: Arc::new(Vec::new()),
            pins: Arc::new(Vec::new()),
        }
    }

    pub fn query_text(&self) -> &str {
        &self.query_text
    }

    pub fn recent(&self) -> Vec<RecentSearch> {
        self.recent.iter().cloned().collect()
    }

    pub fn results(&self) -> &Arc<Vec<Place>> {
        &self.results
    }

    pub fn pins(&self) -> &Arc<Vec<Place>> {
        &self.pins
    }

    /// Cada llamada reinicia el temporizador; solo la última de la ventana llega a la red.
    pub fn submit_query(&mut self, text: &str, now: Instant, out: &mut Vec<NavEvent>) {
        self.query_text = text.to_string();
        out.push(NavEvent::Changed(NavField::QueryText));

        if text.trim().is_empty() {
            if self.deadline.take().is_some() {
                debug!("Blank query, pending search cancelled");
            }
            return;
        }

        self.deadline = Some(now + self.settings.debounce);
        if self.record_recent(text) {
            out.push(NavEvent::Changed(NavField::RecentSearches));
        }
    }

    pub fn next_deadline(&self) -> Option<Instant> {
        self.deadline
    }

    /// Devuelve la consulta a enviar si el temporizador ya venció.
    pub fn take_due(&mut self, now: Instant) -> Option<PendingQuery> {
        match self.deadline {
            Some(deadline) if deadline <= now => {
                self.deadline = None;
                self.generation += 1;
                debug!("Search '{}' due [generation {}]", self.query_text, self.generation);
                Some(PendingQuery {
                    generation: self.generation,
                    text: self.query_text.clone(),
                })
            }
            _ => None,
        }
    }

    /// Aplica la respuesta del geocodificador. Devuelve `false` si era de una consulta anterior.
    pub fn apply_results(
        &mut self,
        generation: u64,
        result: Result<Vec<Place>, NavError>,
        out: &mut Vec<NavEvent>,
    ) -> bool {
        if generation != self.generation {
            debug!(
                "Discarding stale search result (generation {}, current {})",
                generation, self.generation
            );
            return false;
        }

        match result {
            Ok(places) => {
                info!("Search returned {} places", places.len());
                let places = Arc::new(places);
                self.results = Arc::clone(&places);
                self.pins = places;
                out.push(NavEvent::Changed(NavField::SearchResults));
                out.push(NavEvent::Changed(NavField::MapPins));
            }
            Err(e) => {
                warn!("Search failed: {}", e);
                out.push(NavEvent::Error(e));
            }
        }
        true
    }

    /// Sintetiza lugares cercanos para una categoría, sin red.
    pub fn submit_category<R: Rng + ?Sized>(
        &mut self,
        category: &str,
        around: GeoCoordinate,
        rng: &mut R,
        out: &mut Vec<NavEvent>,
    ) {
        let spread = self.settings.category_spread_deg;
        let places: Vec<Place> = (1..=self.settings.category_results)
            .filter_map(|i| {
                let lat = (around.latitude() + rng.gen_range(-spread..=spread)).clamp(-90.0, 90.0);
                let lon = (around.longitude() + rng.gen_range(-spread..=spread)).clamp(-180.0, 180.0);
                let location = GeoCoordinate::new(lat, lon).ok()?;
                Some(Place {
                    name: format!("{} {}", category, i),
                    address: format!("Nearby {}", category.to_lowercase()),
                    location,
                })
            })
            .collect();

        info!("Category '{}' produced {} pins", category, places.len());
        self.pins = Arc::new(places);
        out.push(NavEvent::Changed(NavField::MapPins));
    }

    pub fn clear_pins(&mut self, out: &mut Vec<NavEvent>) {
        if !self.pins.is_empty() {
            self.pins = Arc::new(Vec::new());
            out.push(NavEvent::Changed(NavField::MapPins));
        }
    }

    fn record_recent(&mut self, text: &str) -> bool {
        if self.recent.iter().any(|r| r.text == text) {
            return false;
        }
        self.recent.push_front(RecentSearch {
            text: text.to_string(),
            searched_at: Utc::now(),
        });
        self.recent.truncate(self.settings.recent_limit);
        true
    }
}
