use nav_engine::middlewares::RequestLogger;
use nav_engine::navigation::{NavEvent, NavField, NavigationSnapshot};
use nav_engine::{GeoCoordinate, HttpTransport, NavConfig, NavigationController, NavigationHandle, Transport};
use std::io::{self, Write};
use std::sync::Arc;
use tokio::sync::watch;
use tracing::error;

fn main() {
    tracing_subscriber::fmt::init();

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .worker_threads(num_cpus::get())
        .enable_all()
        .build();

    match runtime {
        Ok(runtime) => {
            if let Err(e) = runtime.block_on(run()) {
                error!("{}", e);
                std::process::exit(1);
            }
        }
        Err(e) => {
            error!("Failed to start runtime: {}", e);
            std::process::exit(1);
        }
    }
}

async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let config = NavConfig::from_env()?;
    let transport = HttpTransport::new(&config.geocoding.user_agent, config.request_timeout())?;
    let transport: Arc<dyn Transport> = Arc::new(RequestLogger::new(transport));

    let (mut controller, handle) = NavigationController::new(&config, transport)?;
    controller.subscribe(Box::new(console_observer(handle.watch())));
    let task = controller.spawn();

    loop {
        println!();
        println!("Navigation Console");
        println!("1. Search places by name");
        println!("2. Nearby places by category");
        println!("3. Calculate route from current position");
        println!("4. Start navigation");
        println!("5. Stop navigation");
        println!("6. Status");
        println!("7. Clear map pins");
        println!("8. Exit");

        let Some(choice) = prompt("Choose an option: ") else {
            break;
        };

        let sent = match choice.as_str() {
            "1" => match prompt("Enter place name: ") {
                Some(name) => handle.submit_query(name),
                None => continue,
            },
            "2" => match prompt("Enter category (e.g. Fuel, Coffee, Parking): ") {
                Some(category) => handle.submit_category(category),
                None => continue,
            },
            "3" => match read_coordinate() {
                Some(end) => handle.route_from_position(end),
                None => continue,
            },
            "4" => {
                let destination = prompt("Destination name: ").unwrap_or_default();
                handle.start_navigation(destination)
            }
            "5" => handle.stop_navigation(),
            "6" => {
                print_status(&handle);
                Ok(())
            }
            "7" => handle.clear_pins(),
            "8" => break,
            _ => {
                println!("Invalid choice, please try again.");
                Ok(())
            }
        };

        if let Err(e) = sent {
            eprintln!("Error: {}", e);
            break;
        }
        // Deja que el controlador procese la orden antes de volver a pintar el menú
        handle.sync().await?;
    }

    drop(handle);
    task.await?;
    Ok(())
}

/// Imprime guía, posiciones y errores; los cambios de búsqueda se leen de la instantánea.
fn console_observer(snapshot: watch::Receiver<NavigationSnapshot>) -> impl FnMut(&NavEvent) + Send {
    move |event: &NavEvent| match event {
        NavEvent::Guidance { text, distance_m: Some(d) } => println!(">> {} (in {} m)", text, d),
        NavEvent::Guidance { text, distance_m: None } => println!(">> {}", text),
        NavEvent::Position { coordinate, bearing } => println!(
            "   position {:.5}, {:.5} heading {:.0}°",
            coordinate.latitude(),
            coordinate.longitude(),
            bearing
        ),
        NavEvent::RouteReady { distance_m, duration_s } => println!(
            "Route ready: {} / {}",
            nav_engine::format_distance(*distance_m),
            nav_engine::format_duration(*duration_s)
        ),
        NavEvent::Error(e) => eprintln!("Error: {}", e),
        NavEvent::Changed(NavField::SearchResults) => {
            for place in snapshot.borrow().search_results.iter() {
                println!(
                    "Found: {} - {} ({}, {})",
                    place.name,
                    place.address,
                    place.location.latitude(),
                    place.location.longitude()
                );
            }
        }
        NavEvent::Changed(NavField::MapPins) => println!("{} pins on map", snapshot.borrow().map_pins.len()),
        NavEvent::Changed(_) => {}
    }
}

fn print_status(handle: &NavigationHandle) {
    let s = handle.snapshot();
    println!("State: {:?}", s.state);
    println!(
        "Position: {:.5}, {:.5} (heading {:.0}°)",
        s.position.latitude(),
        s.position.longitude(),
        s.bearing
    );
    println!("Speed limit: {} km/h", s.speed_limit);
    if s.is_navigating {
        println!("Destination: {}", s.destination);
        println!("Next: {} [{}] in {}", s.next_maneuver, s.maneuver_icon, s.distance_to_maneuver);
        println!("Road: {}", s.road_name);
        println!("Remaining: {} (ETA {})", s.distance_remaining, s.eta);
    }
    if let Some(route) = &s.route {
        println!("Route: {} steps, {} traffic segments", route.steps().len(), route.traffic().len());
    }
    for recent in &s.recent_searches {
        println!("Recent: {} ({})", recent.text, recent.searched_at.format("%H:%M:%S"));
    }
}

fn read_coordinate() -> Option<GeoCoordinate> {
    let lat = prompt_for_float("Enter destination latitude: ")?;
    let lon = prompt_for_float("Enter destination longitude: ")?;
    match GeoCoordinate::new(lat, lon) {
        Ok(coordinate) => Some(coordinate),
        Err(e) => {
            eprintln!("Invalid coordinate: {}", e);
            None
        }
    }
}

fn prompt_for_float(text: &str) -> Option<f64> {
    match prompt(text)?.parse::<f64>() {
        Ok(value) => Some(value),
        Err(_) => {
            eprintln!("Invalid input. Please enter a valid number.");
            None
        }
    }
}

fn prompt(text: &str) -> Option<String> {
    print!("{}", text);
    io::stdout().flush().ok()?;

    let mut input = String::new();
    match io::stdin().read_line(&mut input) {
        Ok(0) | Err(_) => None,
        Ok(_) => Some(input.trim().to_string()),
    }
}
