//! Access to the persistence gateway.
//!
//! The gateway is a flat key/value store in front of a spreadsheet range.
//! A read returns every stored key with its string value; a write replaces
//! the stored entries with those of a JSON object. There is no versioning,
//! so the last writer wins.

mod http;

pub use http::HttpGateway;

use crate::codec::GatewayRows;
use async_trait::async_trait;
use serde_json::{Map, Value};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum GatewayError {
    #[error("gateway request failed: {0}")]
    Transport(String),

    #[error("gateway answered with status {0}")]
    Status(u16),

    #[error("gateway response could not be decoded: {0}")]
    Decode(String),

    #[error("document could not be encoded: {0}")]
    Encode(String),
}

/// Read and write access to the stored document.
#[async_trait]
pub trait Gateway: Send + Sync {
    /// Reads every stored key/value pair.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError`] on transport failure, a non-success status or
    /// an undecodable body.
    async fn read(&self) -> Result<GatewayRows, GatewayError>;

    /// Overwrites storage with the entries of `document`.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError`] on transport failure or a non-success status.
    async fn write(&self, document: &Map<String, Value>) -> Result<(), GatewayError>;
}
