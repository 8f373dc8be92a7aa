use super::{Gateway, GatewayError};
use crate::codec::GatewayRows;
use async_trait::async_trait;
use reqwest::Client;
use serde_json::{Map, Value};
use std::time::Duration;

/// Gateway reached over HTTP: `GET` to read, `POST` with a JSON body to write.
pub struct HttpGateway {
    /// Full endpoint URL, e.g. `http://127.0.0.1:8888/.netlify/functions/sheets`.
    endpoint: String,
    /// HTTP client configured with a request timeout.
    client: Client,
}

impl HttpGateway {
    /// Builds a gateway client for `endpoint`.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::Transport`] when the HTTP client cannot be built.
    pub fn new(endpoint: impl Into<String>, request_timeout: Duration) -> Result<Self, GatewayError> {
        let client = Client::builder()
            .timeout(request_timeout)
            .build()
            .map_err(|err| GatewayError::Transport(err.to_string()))?;
        Ok(Self {
            endpoint: endpoint.into(),
            client,
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[async_trait]
impl Gateway for HttpGateway {
    async fn read(&self) -> Result<GatewayRows, GatewayError> {
        let response = self
            .client
            .get(&self.endpoint)
            .send()
            .await
            .map_err(|err| GatewayError::Transport(err.to_string()))?;
        let status = response.status();
        if !status.is_success() {
            return Err(GatewayError::Status(status.as_u16()));
        }
        response
            .json::<GatewayRows>()
            .await
            .map_err(|err| GatewayError::Decode(err.to_string()))
    }

    async fn write(&self, document: &Map<String, Value>) -> Result<(), GatewayError> {
        let response = self
            .client
            .post(&self.endpoint)
            .json(document)
            .send()
            .await
            .map_err(|err| GatewayError::Transport(err.to_string()))?;
        let status = response.status();
        if !status.is_success() {
            return Err(GatewayError::Status(status.as_u16()));
        }
        Ok(())
    }
}
