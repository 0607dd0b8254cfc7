use crate::domain::models::{LightInfo, LightStateBody};
use crate::infra::bridge::client::{LightClient, SyncError};
use serde_json::{json, Value};
use std::collections::HashSet;
use std::sync::Mutex;
use std::time::Duration;
use tokio::time::Instant;

#[derive(Debug, Clone, Copy)]
pub struct RecordedWrite {
    pub light_id: u8,
    pub on: bool,
    pub at: Instant,
}

/// In-memory bridge that records every write with its (tokio) timestamp.
#[derive(Debug, Default)]
pub struct FakeBridge {
    reference_on: bool,
    unreachable: bool,
    failing: HashSet<u8>,
    hanging: HashSet<u8>,
    panicking: HashSet<u8>,
    writes: Mutex<Vec<RecordedWrite>>,
}

impl FakeBridge {
    pub fn failing(mut self, light_id: u8) -> Self {
        self.failing.insert(light_id);
        self
    }

    pub fn hanging(mut self, light_id: u8) -> Self {
        self.hanging.insert(light_id);
        self
    }

    pub fn panicking(mut self, light_id: u8) -> Self {
        self.panicking.insert(light_id);
        self
    }

    pub fn reporting(mut self, on: bool) -> Self {
        self.reference_on = on;
        self
    }

    pub fn unreachable(mut self) -> Self {
        self.unreachable = true;
        self
    }

    pub fn writes(&self) -> Vec<RecordedWrite> {
        self.writes.lock().map(|writes| writes.clone()).unwrap_or_default()
    }
}

impl LightClient for FakeBridge {
    async fn fetch_light(&self, light_id: u8) -> Result<LightInfo, SyncError> {
        if self.unreachable {
            return Err(SyncError::Network {
                light_id,
                detail: "connection refused".to_string(),
            });
        }
        Ok(LightInfo {
            state: LightStateBody {
                on: self.reference_on,
            },
        })
    }

    async fn put_light_state(&self, light_id: u8, on: bool) -> Result<Value, SyncError> {
        if let Ok(mut writes) = self.writes.lock() {
            writes.push(RecordedWrite {
                light_id,
                on,
                at: Instant::now(),
            });
        }
        if self.panicking.contains(&light_id) {
            panic!("simulated crash writing light {light_id}");
        }
        if self.hanging.contains(&light_id) {
            tokio::time::sleep(Duration::from_secs(60)).await;
        }
        if self.unreachable || self.failing.contains(&light_id) {
            return Err(SyncError::Network {
                light_id,
                detail: "simulated transport failure".to_string(),
            });
        }
        let address = format!("/lights/{light_id}/state/on");
        Ok(json!([{ "success": { address: on } }]))
    }
}
