use nav_engine::functions::{route_as_geojson, TrafficSegmenter};
use nav_engine::queries::{route_parser, RouteError};
use std::fs::File;
use std::io::{BufReader, BufWriter, Read};
use std::path::Path;
use tracing::{error, info, instrument};

#[derive(Debug, thiserror::Error)]
enum ConversionError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Route error: {0}")]
    Route(#[from] RouteError),
}

/// Convierte una respuesta guardada del servicio de rutas en un FeatureCollection.
#[instrument(skip(input_path, output_path))]
fn convert_route_to_geojson(
    input_path: &Path,
    output_path: &Path,
    segmenter: TrafficSegmenter,
) -> Result<usize, ConversionError> {
    info!("Reading routing response from {}", input_path.display());

    let mut raw = Vec::new();
    BufReader::new(File::open(input_path)?).read_to_end(&mut raw)?;

    let route = route_parser::parse(&raw)?;
    let traffic = segmenter.segment(route.path());
    let route = route.with_traffic(traffic);

    if let Some(parent) = output_path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let collection = route_as_geojson(&route);
    let writer = BufWriter::new(File::create(output_path)?);
    serde_json::to_writer_pretty(writer, &collection)?;

    info!(
        "Wrote {} features ({} points, {} steps) to {}",
        collection.features.len(),
        route.path().len(),
        route.steps().len(),
        output_path.display()
    );
    Ok(collection.features.len())
}

fn main() {
    tracing_subscriber::fmt::init();

    let args: Vec<String> = std::env::args().collect();
    if args.len() < 3 {
        eprintln!("Usage: {} <route.json> <output.geojson> [chunk_size]", args[0]);
        std::process::exit(2);
    }

    let segmenter = match args.get(3).map(|s| s.parse::<usize>()) {
        Some(Ok(size)) => TrafficSegmenter::new(size),
        Some(Err(e)) => {
            error!("Invalid chunk size '{}': {}", args[3], e);
            std::process::exit(2);
        }
        None => TrafficSegmenter::default(),
    };

    if let Err(e) = convert_route_to_geojson(Path::new(&args[1]), Path::new(&args[2]), segmenter) {
        error!("Conversion failed: {}", e);
        std::process::exit(1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{json, Value};
    use tempfile::tempdir;

    #[test]
    fn test_convert_saved_response() {
        let dir = tempdir().unwrap();
        let input = dir.path().join("route.json");
        let output = dir.path().join("out/route.geojson");

        let coordinates: Vec<Value> = (0..25).map(|i| json!([18.0, 59.0 + i as f64 * 0.0001])).collect();
        let body = json!({
            "code": "Ok",
            "routes": [{
                "geometry": { "type": "LineString", "coordinates": coordinates },
                "legs": [{ "steps": [
                    { "distance": 270.0, "duration": 27.0, "name": "Main St",
                      "maneuver": { "type": "depart", "location": [18.0, 59.0] } },
                    { "distance": 0.0, "duration": 0.0, "name": "",
                      "maneuver": { "type": "arrive", "location": [18.0, 59.0024] } }
                ]}],
                "distance": 270.0,
                "duration": 27.0
            }]
        });
        std::fs::write(&input, body.to_string()).unwrap();

        let written = convert_route_to_geojson(&input, &output, TrafficSegmenter::new(20)).unwrap();
        // la ruta más dos tramos de tráfico
        assert_eq!(written, 3);

        let text = std::fs::read_to_string(&output).unwrap();
        let parsed: Value = serde_json::from_str(&text).unwrap();
        assert_eq!(parsed["type"], "FeatureCollection");
        assert_eq!(parsed["features"][0]["properties"]["kind"], "route");
    }

    #[test]
    fn test_missing_route_is_reported() {
        let dir = tempdir().unwrap();
        let input = dir.path().join("empty.json");
        std::fs::write(&input, r#"{"code": "NoRoute", "routes": []}"#).unwrap();

        let result = convert_route_to_geojson(&input, &dir.path().join("out.geojson"), TrafficSegmenter::default());
        assert!(matches!(result, Err(ConversionError::Route(RouteError::NoRouteFound))));
    }
}
