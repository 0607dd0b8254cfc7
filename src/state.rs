use crate::domain::models::{DragOffset, SyncStatus};
use crate::domain::state_machine::GesturePhase;
use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

/// Everything the gesture transition function reads and returns. The
/// offset only changes when a release commits to a resting layout.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ToggleState {
    pub phase: GesturePhase,
    pub offset: DragOffset,
    pub is_on: bool,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncRun {
    pub run_id: Uuid,
    pub target: bool,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub succeeded: Vec<u8>,
    pub failed: Vec<LightFailure>,
    /// False when a newer run had already taken over the status label.
    pub published: bool,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LightFailure {
    pub light_id: u8,
    pub reason: String,
}

impl SyncRun {
    pub fn is_complete(&self) -> bool {
        self.failed.is_empty()
    }

    pub fn terminal_status(&self) -> SyncStatus {
        let mut failed = self
            .failed
            .iter()
            .map(|failure| failure.light_id)
            .collect::<Vec<_>>();
        failed.sort_unstable();
        SyncStatus::Settled {
            run_id: self.run_id,
            target: self.target,
            failed,
        }
    }
}
