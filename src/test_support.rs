//! Utilidades compartidas por las pruebas: transporte simulado y fixtures JSON.

use crate::transport::{Transport, TransportError};
use futures::future::BoxFuture;
use serde_json::{json, Value};
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use tokio::sync::oneshot;

pub enum MockReply {
    Body(Vec<u8>),
    Fail(TransportError),
    Gated(oneshot::Receiver<Result<Vec<u8>, TransportError>>),
}

#[derive(Default)]
struct MockState {
    replies: VecDeque<MockReply>,
    requests: Vec<String>,
}

/// Transporte con respuestas programadas que registra las URLs pedidas.
#[derive(Clone, Default)]
pub struct MockTransport {
    state: Arc<Mutex<MockState>>,
}

impl MockTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&self, reply: MockReply) {
        self.state.lock().unwrap().replies.push_back(reply);
    }

    pub fn push_json(&self, body: &Value) {
        self.push(MockReply::Body(body.to_string().into_bytes()));
    }

    /// Respuesta que no se entrega hasta que la prueba envía por el canal devuelto.
    pub fn push_gated(&self) -> oneshot::Sender<Result<Vec<u8>, TransportError>> {
        let (tx, rx) = oneshot::channel();
        self.push(MockReply::Gated(rx));
        tx
    }

    pub fn requests(&self) -> Vec<String> {
        self.state.lock().unwrap().requests.clone()
    }
}

impl Transport for MockTransport {
    fn get(&self, url: &str) -> BoxFuture<'static, Result<Vec<u8>, TransportError>> {
        let reply = {
            let mut state = self.state.lock().unwrap();
            state.requests.push(url.to_string());
            state.replies.pop_front()
        };
        Box::pin(async move {
            match reply {
                Some(MockReply::Body(body)) => Ok(body),
                Some(MockReply::Fail(e)) => Err(e),
                Some(MockReply::Gated(rx)) => rx
                    .await
                    .unwrap_or_else(|_| Err(TransportError::Request("gate dropped".into()))),
                None => Err(TransportError::Request("no scripted reply".into())),
            }
        })
    }
}

/// Paso de ruta en formato del servicio: (type, modifier, name, (lat, lon), distance).
pub type WireStep<'a> = (&'a str, &'a str, &'a str, (f64, f64), f64);

/// Construye una respuesta de rutas con un único candidato.
pub fn route_response(path: &[(f64, f64)], steps: &[WireStep<'_>], distance: f64, duration: f64) -> Value {
    let coordinates: Vec<Value> = path.iter().map(|(lat, lon)| json!([lon, lat])).collect();
    let steps: Vec<Value> = steps
        .iter()
        .map(|(kind, modifier, name, (lat, lon), dist)| {
            let mut maneuver = json!({ "type": kind, "location": [lon, lat] });
            if !modifier.is_empty() {
                maneuver["modifier"] = json!(modifier);
            }
            json!({
                "distance": dist,
                "duration": dist / 10.0,
                "name": name,
                "maneuver": maneuver,
            })
        })
        .collect();

    json!({
        "code": "Ok",
        "routes": [{
            "geometry": { "type": "LineString", "coordinates": coordinates },
            "legs": [{ "steps": steps, "distance": distance, "duration": duration }],
            "distance": distance,
            "duration": duration,
        }]
    })
}

/// Camino recto hacia el norte con `n` puntos separados ~11 m (0.0001°).
pub fn northbound_path(n: usize) -> Vec<(f64, f64)> {
    (0..n).map(|i| (59.0 + i as f64 * 0.0001, 18.0)).collect()
}

/// Ruta recta: salida en el primer punto, giro a mitad de camino y llegada al final.
pub fn northbound_route(n: usize) -> Value {
    let path = northbound_path(n);
    let mid = path[n / 2];
    let last = path[n - 1];
    let step_len = 11.1 * (n / 2) as f64;
    route_response(
        &path,
        &[
            ("depart", "", "Main St", path[0], step_len),
            ("turn", "left", "Oak Ave", mid, step_len),
            ("arrive", "", "", last, 0.0),
        ],
        step_len * 2.0,
        step_len / 5.0,
    )
}
