use crate::functions::traffic::TrafficSegmenter;
use crate::navigation::{NavError, Route};
use crate::queries::route_parser;
use crate::transport::TransportError;
use futures::future::BoxFuture;
use tracing::{info, instrument};

/// Espera la respuesta del servicio de rutas y la procesa en el pool de tareas bloqueantes.
///
/// El análisis y la segmentación del tráfico nunca corren en la tarea dueña
/// del estado. La ruta devuelta ya incluye sus tramos de tráfico.
#[instrument(skip(request, segmenter))]
pub async fn find_route(
    request: BoxFuture<'static, Result<Vec<u8>, TransportError>>,
    segmenter: TrafficSegmenter,
    generation: u64,
) -> Result<Route, NavError> {
    let raw = request.await?;
    info!("Route response received ({} bytes) [generation {}]", raw.len(), generation);

    let route = tokio::task::spawn_blocking(move || -> Result<Route, NavError> {
        let route = route_parser::parse(&raw)?;
        let traffic = segmenter.segment(route.path());
        Ok(route.with_traffic(traffic))
    })
    .await??;

    info!(
        "Route ready: {} points, {} steps, {} traffic segments [generation {}]",
        route.path().len(),
        route.steps().len(),
        route.traffic().len(),
        generation
    );
    Ok(route)
}
