use crate::navigation::{NavError, Place};
use crate::queries::_structs::GeocodeEntry;
use crate::utils::GeoCoordinate;
use tracing::{debug, warn};

/// Convierte la respuesta del geocodificador en una lista de lugares.
pub fn parse(raw: &[u8]) -> Result<Vec<Place>, NavError> {
    let entries: Vec<GeocodeEntry> =
        serde_json::from_slice(raw).map_err(|e| NavError::MalformedResponse(e.to_string()))?;

    let places: Vec<Place> = entries
        .into_iter()
        .filter_map(|entry| match GeoCoordinate::new(entry.lat, entry.lon) {
            Ok(location) => Some(Place {
                name: short_name(&entry.display_name),
                address: entry.display_name,
                location,
            }),
            Err(e) => {
                warn!("Skipping geocode result '{}': {}", entry.display_name, e);
                None
            }
        })
        .collect();

    debug!("Parsed {} places", places.len());
    Ok(places)
}

/// Primer segmento del nombre completo, hasta la primera coma.
fn short_name(display_name: &str) -> String {
    display_name
        .split(',')
        .next()
        .unwrap_or_default()
        .trim()
        .to_string()
}
