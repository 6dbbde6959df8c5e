// src/middlewares/logger.rs
use crate::transport::{Transport, TransportError};
use futures::future::BoxFuture;
use std::time::Instant;
use tracing::{info, warn};

/// Envoltorio de un transporte que registra cada GET con su duración.
pub struct RequestLogger<T> {
    inner: T,
}

impl<T: Transport> RequestLogger<T> {
    pub fn new(inner: T) -> Self {
        Self { inner }
    }

    pub fn inner(&self) -> &T {
        &self.inner
    }
}

impl<T: Transport> Transport for RequestLogger<T> {
    fn get(&self, url: &str) -> BoxFuture<'static, Result<Vec<u8>, TransportError>> {
        let start = Instant::now();
        let url = url.to_string();
        let fut = self.inner.get(&url);

        Box::pin(async move {
            let res = fut.await;
            let duration = start.elapsed();

            // Formato similar a Morgan
            match &res {
                Ok(body) => info!(
                    "GET {} 200 {}ms ({} bytes)",
                    url,
                    duration.as_millis(),
                    body.len()
                ),
                Err(TransportError::Status(status)) => {
                    warn!("GET {} {} {}ms", url, status, duration.as_millis())
                }
                Err(e) => warn!("GET {} ERR {}ms: {}", url, duration.as_millis(), e),
            }

            res
        })
    }
}
