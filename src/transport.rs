use futures::future::BoxFuture;
use std::time::Duration;
use tracing::error;

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum TransportError {
    #[error("Request failed: {0}")]
    Request(String),
    #[error("Server returned status {0}")]
    Status(u16),
}

/// Capacidad externa "hacer GET y devolver los bytes crudos".
///
/// Cada petición es independiente, así que la implementación se comparte
/// entre tareas sin ningún candado.
pub trait Transport: Send + Sync + 'static {
    fn get(&self, url: &str) -> BoxFuture<'static, Result<Vec<u8>, TransportError>>;
}

/// Transporte HTTP real sobre `reqwest`.
pub struct HttpTransport {
    client: reqwest::Client,
}

impl HttpTransport {
    pub fn new(user_agent: &str, timeout: Duration) -> Result<Self, TransportError> {
        let client = reqwest::Client::builder()
            .connect_timeout(Duration::from_secs(10))
            .timeout(timeout)
            .user_agent(user_agent)
            .build()
            .map_err(|e| TransportError::Request(e.to_string()))?;
        Ok(Self { client })
    }
}

impl Transport for HttpTransport {
    fn get(&self, url: &str) -> BoxFuture<'static, Result<Vec<u8>, TransportError>> {
        let request = self.client.get(url);
        Box::pin(async move {
            let response = request.send().await.map_err(|e| {
                error!("GET request failed: {}", e);
                TransportError::Request(e.to_string())
            })?;

            let status = response.status();
            if !status.is_success() {
                return Err(TransportError::Status(status.as_u16()));
            }

            let body = response
                .bytes()
                .await
                .map_err(|e| TransportError::Request(e.to_string()))?;
            Ok(body.to_vec())
        })
    }
}
