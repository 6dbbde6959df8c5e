use crate::navigation::{NavError, Place};
use crate::queries::place_parser;
use crate::transport::TransportError;
use futures::future::BoxFuture;
use tracing::{debug, instrument};

/// Espera la respuesta del geocodificador y la analiza fuera de la tarea dueña.
#[instrument(skip(request))]
pub async fn find_places_by_name(
    request: BoxFuture<'static, Result<Vec<u8>, TransportError>>,
    query: String,
) -> Result<Vec<Place>, NavError> {
    let raw = request.await?;
    let places = tokio::task::spawn_blocking(move || place_parser::parse(&raw)).await??;
    debug!("Found {} places for '{}'", places.len(), query);
    Ok(places)
}
