use serde::de::{self, Deserializer, Visitor};
use serde::Deserialize;
use serde_json::Value;
use std::fmt;

// Respuesta del servicio de rutas (formato OSRM)
#[derive(Debug, Deserialize)]
pub struct RoutingResponse {
    #[serde(default)]
    pub code: Option<String>,
    // Se valida cada candidato por separado para distinguir "sin rutas" de "mal formada"
    #[serde(default)]
    pub routes: Vec<Value>,
}

#[derive(Debug, Deserialize)]
pub struct WireRoute {
    pub geometry: WireGeometry,
    pub legs: Vec<WireLeg>,
    pub distance: f64,
    pub duration: f64,
}

#[derive(Debug, Deserialize)]
pub struct WireGeometry {
    pub coordinates: Vec<[f64; 2]>,
}

#[derive(Debug, Deserialize)]
pub struct WireLeg {
    pub steps: Vec<WireStep>,
}

#[derive(Debug, Deserialize)]
pub struct WireStep {
    pub distance: f64,
    #[serde(default)]
    pub duration: f64,
    #[serde(default)]
    pub name: String,
    pub maneuver: WireManeuver,
}

#[derive(Debug, Deserialize)]
pub struct WireManeuver {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub modifier: String,
    pub location: [f64; 2],
}

// Respuesta del geocodificador (formato Nominatim)
#[derive(Debug, Deserialize)]
pub struct GeocodeEntry {
    pub display_name: String,
    #[serde(deserialize_with = "number_or_string")]
    pub lat: f64,
    #[serde(deserialize_with = "number_or_string")]
    pub lon: f64,
}

/// Acepta tanto `59.33` como `"59.33"`.
fn number_or_string<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    struct NumberOrString;

    impl<'de> Visitor<'de> for NumberOrString {
        type Value = f64;

        fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
            formatter.write_str("a number or a numeric string")
        }

        fn visit_f64<E: de::Error>(self, value: f64) -> Result<f64, E> {
            Ok(value)
        }

        fn visit_i64<E: de::Error>(self, value: i64) -> Result<f64, E> {
            Ok(value as f64)
        }

        fn visit_u64<E: de::Error>(self, value: u64) -> Result<f64, E> {
            Ok(value as f64)
        }

        fn visit_str<E: de::Error>(self, value: &str) -> Result<f64, E> {
            value
                .trim()
                .parse::<f64>()
                .map_err(|_| E::invalid_value(de::Unexpected::Str(value), &self))
        }
    }

    deserializer.deserialize_any(NumberOrString)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_geocode_entry_accepts_numbers_and_strings() {
        let entries: Vec<GeocodeEntry> = serde_json::from_str(
            r#"[
                {"display_name": "A", "lat": "59.33", "lon": "18.06"},
                {"display_name": "B", "lat": 59.5, "lon": 18}
            ]"#,
        )
        .unwrap();
        assert_eq!(entries[0].lat, 59.33);
        assert_eq!(entries[0].lon, 18.06);
        assert_eq!(entries[1].lat, 59.5);
        assert_eq!(entries[1].lon, 18.0);
    }

    #[test]
    fn test_geocode_entry_rejects_garbage() {
        let res: Result<Vec<GeocodeEntry>, _> =
            serde_json::from_str(r#"[{"display_name": "A", "lat": "north", "lon": 1}]"#);
        assert!(res.is_err());
    }

    #[test]
    fn test_routing_response_without_routes() {
        let res: RoutingResponse = serde_json::from_str(r#"{"code": "NoRoute"}"#).unwrap();
        assert_eq!(res.code.as_deref(), Some("NoRoute"));
        assert!(res.routes.is_empty());
    }
}
