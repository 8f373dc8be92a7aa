#![allow(dead_code)]

use async_trait::async_trait;
use project_dashboard::codec::GatewayRows;
use project_dashboard::{Gateway, GatewayError};
use serde_json::{Map, Value};
use std::sync::Mutex;
use std::time::Duration;

/// In-memory gateway that records every completed write.
#[derive(Default)]
pub struct RecordingGateway {
    pub stored: GatewayRows,
    pub fail_reads: bool,
    pub fail_writes: bool,
    pub write_delay: Option<Duration>,
    pub writes: Mutex<Vec<Map<String, Value>>>,
    pub attempts: Mutex<usize>,
}

impl RecordingGateway {
    pub fn with_rows(pairs: &[(&str, &str)]) -> Self {
        RecordingGateway {
            stored: pairs
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
            ..Default::default()
        }
    }

    /// Documents written successfully, oldest first.
    pub fn writes(&self) -> Vec<Map<String, Value>> {
        self.writes.lock().unwrap().clone()
    }

    pub fn attempts(&self) -> usize {
        *self.attempts.lock().unwrap()
    }
}

#[async_trait]
impl Gateway for RecordingGateway {
    async fn read(&self) -> Result<GatewayRows, GatewayError> {
        if self.fail_reads {
            return Err(GatewayError::Status(500));
        }
        Ok(self.stored.clone())
    }

    async fn write(&self, document: &Map<String, Value>) -> Result<(), GatewayError> {
        *self.attempts.lock().unwrap() += 1;
        if let Some(delay) = self.write_delay {
            tokio::time::sleep(delay).await;
        }
        if self.fail_writes {
            return Err(GatewayError::Transport("connection refused".to_string()));
        }
        self.writes.lock().unwrap().push(document.clone());
        Ok(())
    }
}

pub fn text(document: &Map<String, Value>, key: &str) -> String {
    document
        .get(key)
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string()
}
