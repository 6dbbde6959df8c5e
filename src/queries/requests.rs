use crate::navigation::NavError;
use crate::transport::TransportError;
use crate::utils::GeoCoordinate;
use reqwest::Url;

/// URL del servicio de rutas: `{base}/{lon},{lat};{lon},{lat}` con geometría completa y pasos.
pub fn route_url(base: &str, start: &GeoCoordinate, end: &GeoCoordinate) -> String {
    format!(
        "{}/{},{};{},{}?overview=full&geometries=geojson&steps=true",
        base.trim_end_matches('/'),
        start.longitude(),
        start.latitude(),
        end.longitude(),
        end.latitude()
    )
}

/// URL de búsqueda del geocodificador con el texto codificado.
pub fn geocode_url(base: &str, query: &str, limit: usize) -> Result<String, NavError> {
    let limit = limit.to_string();
    let url = Url::parse_with_params(
        base,
        &[
            ("q", query),
            ("format", "json"),
            ("addressdetails", "1"),
            ("limit", limit.as_str()),
        ],
    )
    .map_err(|e| TransportError::Request(format!("invalid geocode url: {}", e)))?;
    Ok(url.to_string())
}
