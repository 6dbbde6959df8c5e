use crate::config::{ConfigError, NavConfig};
use crate::functions::{find_places_by_name, find_route, TrafficSegmenter};
use crate::navigation::events::{EventBus, NavEvent, Observer};
use crate::navigation::route_session::{RouteApplied, RouteSession};
use crate::navigation::search::{PendingQuery, PlaceSearchEngine};
use crate::navigation::{NavError, NavigationState, Place, RecentSearch, Route, RouteStep, TrafficSegment};
use crate::queries::{geocode_url, route_url};
use crate::transport::Transport;
use crate::utils::{format_distance, format_duration, GeoCoordinate};
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::future::pending;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, oneshot, watch};
use tokio::task::JoinHandle;
use tokio::time::{interval_at, sleep_until, Instant, Interval, MissedTickBehavior};
use tracing::{debug, info, warn};

/// Vista inmutable del estado del motor que consume la capa de presentación.
#[derive(Debug, Clone)]
pub struct NavigationSnapshot {
    pub state: NavigationState,
    pub position: GeoCoordinate,
    pub bearing: f64,
    pub is_navigating: bool,
    pub destination: String,
    pub next_maneuver: String,
    pub maneuver_icon: String,
    pub distance_to_maneuver_m: Option<f64>,
    pub distance_to_maneuver: String,
    pub distance_remaining_m: Option<f64>,
    pub distance_remaining: String,
    pub eta: String,
    pub route: Option<Arc<Route>>,
    pub speed_limit: u32,
    pub road_name: String,
    pub query_text: String,
    pub recent_searches: Vec<RecentSearch>,
    pub search_results: Arc<Vec<Place>>,
    pub map_pins: Arc<Vec<Place>>,
}

impl NavigationSnapshot {
    pub fn steps(&self) -> &[RouteStep] {
        self.route.as_deref().map(Route::steps).unwrap_or(&[])
    }

    pub fn traffic(&self) -> &[TrafficSegment] {
        self.route.as_deref().map(Route::traffic).unwrap_or(&[])
    }
}

enum Command {
    SubmitQuery(String),
    SubmitCategory(String),
    ClearPins,
    CalculateRoute {
        start: Option<GeoCoordinate>,
        end: GeoCoordinate,
    },
    StartNavigation(String),
    StopNavigation,
    Subscribe(Box<dyn Observer>),
    Sync(oneshot::Sender<()>),
}

enum Completion {
    Route {
        generation: u64,
        result: Result<Route, NavError>,
    },
    Places {
        generation: u64,
        result: Result<Vec<Place>, NavError>,
    },
}

enum Wakeup {
    Command(Option<Command>),
    Completion(Completion),
    Tick,
    Debounce,
}

/// Handle clonable para enviar órdenes al controlador. Las órdenes no esperan respuesta.
#[derive(Clone)]
pub struct NavigationHandle {
    commands: mpsc::UnboundedSender<Command>,
    snapshot: watch::Receiver<NavigationSnapshot>,
}

impl NavigationHandle {
    fn send(&self, command: Command) -> Result<(), NavError> {
        self.commands.send(command).map_err(|_| NavError::ControllerClosed)
    }

    pub fn submit_query(&self, text: impl Into<String>) -> Result<(), NavError> {
        self.send(Command::SubmitQuery(text.into()))
    }

    pub fn submit_category(&self, category: impl Into<String>) -> Result<(), NavError> {
        self.send(Command::SubmitCategory(category.into()))
    }

    pub fn clear_pins(&self) -> Result<(), NavError> {
        self.send(Command::ClearPins)
    }

    pub fn calculate_route(&self, start: GeoCoordinate, end: GeoCoordinate) -> Result<(), NavError> {
        self.send(Command::CalculateRoute {
            start: Some(start),
            end,
        })
    }

    /// Calcula una ruta desde la posición actual del vehículo.
    pub fn route_from_position(&self, end: GeoCoordinate) -> Result<(), NavError> {
        self.send(Command::CalculateRoute { start: None, end })
    }

    pub fn start_navigation(&self, destination: impl Into<String>) -> Result<(), NavError> {
        self.send(Command::StartNavigation(destination.into()))
    }

    pub fn stop_navigation(&self) -> Result<(), NavError> {
        self.send(Command::StopNavigation)
    }

    pub fn subscribe(&self, observer: impl Observer + 'static) -> Result<(), NavError> {
        self.send(Command::Subscribe(Box::new(observer)))
    }

    pub fn snapshot(&self) -> NavigationSnapshot {
        self.snapshot.borrow().clone()
    }

    pub fn watch(&self) -> watch::Receiver<NavigationSnapshot> {
        self.snapshot.clone()
    }

    /// Se resuelve cuando el controlador procesó todas las órdenes enviadas antes.
    pub async fn sync(&self) -> Result<(), NavError> {
        let (tx, rx) = oneshot::channel();
        self.send(Command::Sync(tx))?;
        rx.await.map_err(|_| NavError::ControllerClosed)
    }
}

/// Tarea dueña de todo el estado mutable del motor.
///
/// Las peticiones de red, el análisis de respuestas y la segmentación de
/// tráfico corren en otras tareas y vuelven como `Completion`; solo este
/// bucle modifica la sesión y la búsqueda, y publica cada cambio en la
/// instantánea antes de avisar a los observadores.
pub struct NavigationController {
    transport: Arc<dyn Transport>,
    routing_base: String,
    geocode_base: String,
    geocode_limit: usize,
    segmenter: TrafficSegmenter,
    tick_period: Duration,
    session: RouteSession,
    search: PlaceSearchEngine,
    bus: EventBus,
    rng: StdRng,
    commands: mpsc::UnboundedReceiver<Command>,
    completions_tx: mpsc::UnboundedSender<Completion>,
    completions: mpsc::UnboundedReceiver<Completion>,
    snapshot_tx: watch::Sender<NavigationSnapshot>,
}

impl NavigationController {
    pub fn new(config: &NavConfig, transport: Arc<dyn Transport>) -> Result<(Self, NavigationHandle), ConfigError> {
        config.validate()?;
        let session = RouteSession::new(config.home()?, config.session_settings());
        let search = PlaceSearchEngine::new(config.search_settings());
        let (commands_tx, commands) = mpsc::unbounded_channel();
        let (completions_tx, completions) = mpsc::unbounded_channel();
        let (snapshot_tx, snapshot_rx) = watch::channel(build_snapshot(&session, &search));

        let controller = Self {
            transport,
            routing_base: config.routing.base_url.clone(),
            geocode_base: config.geocoding.base_url.clone(),
            geocode_limit: config.geocoding.limit,
            segmenter: config.segmenter(),
            tick_period: config.tick_interval(),
            session,
            search,
            bus: EventBus::new(),
            rng: StdRng::from_entropy(),
            commands,
            completions_tx,
            completions,
            snapshot_tx,
        };
        let handle = NavigationHandle {
            commands: commands_tx,
            snapshot: snapshot_rx,
        };
        Ok((controller, handle))
    }

    /// Fija la semilla de las búsquedas por categoría.
    pub fn with_rng(mut self, rng: StdRng) -> Self {
        self.rng = rng;
        self
    }

    pub fn subscribe(&mut self, observer: Box<dyn Observer>) {
        self.bus.subscribe(observer);
    }

    pub fn spawn(self) -> JoinHandle<()> {
        tokio::spawn(self.run())
    }

    /// Bucle principal. Termina cuando se sueltan todos los handles.
    pub async fn run(mut self) {
        info!("Navigation controller started");
        let mut ticker: Option<Interval> = None;

        loop {
            let deadline = self.search.next_deadline();
            let wakeup = tokio::select! {
                command = self.commands.recv() => Wakeup::Command(command),
                Some(done) = self.completions.recv() => Wakeup::Completion(done),
                _ = next_tick(&mut ticker) => Wakeup::Tick,
                _ = wait_until(deadline) => Wakeup::Debounce,
            };

            match wakeup {
                Wakeup::Command(Some(command)) => self.handle_command(command),
                Wakeup::Command(None) => break,
                Wakeup::Completion(done) => self.handle_completion(done),
                Wakeup::Tick => self.on_tick(),
                Wakeup::Debounce => self.on_debounce(),
            }

            self.sync_ticker(&mut ticker);
        }

        info!("Navigation controller stopped");
    }

    fn handle_command(&mut self, command: Command) {
        let mut out = Vec::new();
        match command {
            Command::SubmitQuery(text) => self.search.submit_query(&text, Instant::now(), &mut out),
            Command::SubmitCategory(category) => {
                let around = self.session.position();
                self.search.submit_category(&category, around, &mut self.rng, &mut out);
            }
            Command::ClearPins => self.search.clear_pins(&mut out),
            Command::CalculateRoute { start, end } => {
                let start = start.unwrap_or_else(|| self.session.position());
                let ticket = self.session.calculate_route(&start, &end, &mut out);
                self.request_route(ticket.generation, &start, &end);
            }
            Command::StartNavigation(destination) => {
                if let Err(e) = self.session.start_navigation(&destination, &mut out) {
                    warn!("Cannot start navigation: {}", e);
                    out.push(NavEvent::Error(e));
                }
            }
            Command::StopNavigation => self.session.stop_navigation(&mut out),
            Command::Subscribe(observer) => self.bus.subscribe(observer),
            Command::Sync(reply) => {
                let _ = reply.send(());
            }
        }
        self.emit(out);
    }

    fn handle_completion(&mut self, done: Completion) {
        let mut out = Vec::new();
        match done {
            Completion::Route { generation, result } => {
                if let RouteApplied::Failed(e) = self.session.apply_route(generation, result, &mut out) {
                    out.push(NavEvent::Error(e));
                }
            }
            Completion::Places { generation, result } => {
                self.search.apply_results(generation, result, &mut out);
            }
        }
        self.emit(out);
    }

    fn on_tick(&mut self) {
        let mut out = Vec::new();
        self.session.tick(&mut out);
        self.emit(out);
    }

    fn on_debounce(&mut self) {
        if let Some(query) = self.search.take_due(Instant::now()) {
            self.request_places(query);
        }
    }

    fn sync_ticker(&self, ticker: &mut Option<Interval>) {
        match (self.session.is_navigating(), ticker.is_some()) {
            (true, false) => {
                // El primer tick llega un periodo después de arrancar
                let mut interval = interval_at(Instant::now() + self.tick_period, self.tick_period);
                interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
                *ticker = Some(interval);
                debug!("Simulation tick started ({:?})", self.tick_period);
            }
            (false, true) => {
                *ticker = None;
                debug!("Simulation tick halted");
            }
            _ => {}
        }
    }

    fn request_route(&self, generation: u64, start: &GeoCoordinate, end: &GeoCoordinate) {
        let url = route_url(&self.routing_base, start, end);
        info!("Requesting route [generation {}]: {}", generation, url);
        let request = self.transport.get(&url);
        let segmenter = self.segmenter;
        let tx = self.completions_tx.clone();
        tokio::spawn(async move {
            let result = find_route(request, segmenter, generation).await;
            let _ = tx.send(Completion::Route { generation, result });
        });
    }

    fn request_places(&mut self, query: PendingQuery) {
        let url = match geocode_url(&self.geocode_base, &query.text, self.geocode_limit) {
            Ok(url) => url,
            Err(e) => {
                let mut out = Vec::new();
                self.search.apply_results(query.generation, Err(e), &mut out);
                self.emit(out);
                return;
            }
        };
        info!("Searching places [generation {}]: {}", query.generation, url);
        let request = self.transport.get(&url);
        let tx = self.completions_tx.clone();
        tokio::spawn(async move {
            let result = find_places_by_name(request, query.text).await;
            let _ = tx.send(Completion::Places {
                generation: query.generation,
                result,
            });
        });
    }

    fn emit(&mut self, events: Vec<NavEvent>) {
        if events.is_empty() {
            return;
        }
        self.snapshot_tx
            .send_replace(build_snapshot(&self.session, &self.search));
        self.bus.dispatch(&events);
    }
}

fn build_snapshot(session: &RouteSession, search: &PlaceSearchEngine) -> NavigationSnapshot {
    let step = session.current_step();
    let distance_to_maneuver_m = session.distance_to_maneuver();
    let distance_remaining_m = session.distance_remaining();

    NavigationSnapshot {
        state: session.state(),
        position: session.position(),
        bearing: session.bearing(),
        is_navigating: session.is_navigating(),
        destination: session.destination().to_string(),
        next_maneuver: step.map(|s| s.instruction.clone()).unwrap_or_default(),
        maneuver_icon: step.map(|s| s.maneuver.icon_name().to_string()).unwrap_or_default(),
        distance_to_maneuver_m,
        distance_to_maneuver: distance_to_maneuver_m.map(format_distance).unwrap_or_default(),
        distance_remaining_m,
        distance_remaining: distance_remaining_m.map(format_distance).unwrap_or_default(),
        eta: session.duration_remaining().map(format_duration).unwrap_or_default(),
        route: session.route().cloned(),
        speed_limit: session.speed_limit(),
        road_name: session.road_name().to_string(),
        query_text: search.query_text().to_string(),
        recent_searches: search.recent(),
        search_results: Arc::clone(search.results()),
        map_pins: Arc::clone(search.pins()),
    }
}

async fn next_tick(ticker: &mut Option<Interval>) {
    match ticker {
        Some(interval) => {
            interval.tick().await;
        }
        None => pending::<()>().await,
    }
}

async fn wait_until(deadline: Option<Instant>) {
    match deadline {
        Some(deadline) => sleep_until(deadline).await,
        None => pending::<()>().await,
    }
}
