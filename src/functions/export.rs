use crate::navigation::Route;
use crate::utils::GeoCoordinate;
use geojson::{Feature, FeatureCollection, Geometry, JsonObject, Value};
use serde_json::json;

/// Representa la ruta y sus tramos de tráfico como GeoJSON para la capa de mapa.
pub fn route_as_geojson(route: &Route) -> FeatureCollection {
    let mut features = Vec::with_capacity(route.traffic().len() + 1);

    let mut properties = JsonObject::new();
    properties.insert("kind".into(), json!("route"));
    properties.insert("distance_m".into(), json!(route.distance_m()));
    properties.insert("duration_s".into(), json!(route.duration_s()));
    properties.insert("steps".into(), json!(route.steps().len()));
    features.push(line_feature(route.path(), properties));

    for (index, segment) in route.traffic().iter().enumerate() {
        let mut properties = JsonObject::new();
        properties.insert("kind".into(), json!("traffic"));
        properties.insert("index".into(), json!(index));
        properties.insert("severity".into(), json!(segment.severity.as_str()));
        properties.insert("color".into(), json!(segment.severity.color()));
        features.push(line_feature(&segment.points, properties));
    }

    FeatureCollection {
        bbox: None,
        features,
        foreign_members: None,
    }
}

fn line_feature(points: &[GeoCoordinate], properties: JsonObject) -> Feature {
    let coordinates = points.iter().map(|p| p.lon_lat().to_vec()).collect();
    Feature {
        bbox: None,
        geometry: Some(Geometry::new(Value::LineString(coordinates))),
        id: None,
        properties: Some(properties),
        foreign_members: None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::functions::traffic::TrafficSegmenter;
    use crate::queries::route_parser;
    use crate::test_support::northbound_route;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_route_as_geojson() {
        let route = route_parser::parse(northbound_route(45).to_string().as_bytes()).unwrap();
        let traffic = TrafficSegmenter::new(20).segment_with(route.path(), &mut StdRng::seed_from_u64(1));
        let route = route.with_traffic(traffic);

        let collection = route_as_geojson(&route);
        assert_eq!(collection.features.len(), 4);

        let main = &collection.features[0];
        match &main.geometry.as_ref().unwrap().value {
            Value::LineString(coords) => {
                assert_eq!(coords.len(), 45);
                // GeoJSON usa (lon, lat)
                assert_eq!(coords[0], vec![18.0, 59.0]);
            }
            other => panic!("unexpected geometry {other:?}"),
        }
        let props = main.properties.as_ref().unwrap();
        assert_eq!(props["kind"], json!("route"));

        let traffic = collection.features[1].properties.as_ref().unwrap();
        assert_eq!(traffic["kind"], json!("traffic"));
        assert!(["clear", "slow", "congested"].contains(&traffic["severity"].as_str().unwrap()));

        let text = serde_json::to_string(&collection).unwrap();
        assert!(text.contains("FeatureCollection"));
    }
}
