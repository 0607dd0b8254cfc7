use crate::domain::models::{LightTarget, SyncConfig, SyncStatus};
use crate::domain::state_machine::SyncMachine;
use crate::infra::bridge::client::LightClient;
use crate::state::{LightFailure, SyncRun};
use chrono::{DateTime, Utc};
use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinSet;
use tokio::time::{sleep, timeout_at, Instant};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SyncTicket {
    pub run_id: Uuid,
    pub target: bool,
    pub started_at: DateTime<Utc>,
}

/// Pushes a decided on/off state to every configured light and keeps the
/// shared [`SyncStatus`] in step with the run.
pub struct LightSynchronizer<C: LightClient> {
    client: Arc<C>,
    config: SyncConfig,
    machine: SyncMachine,
    status: watch::Sender<SyncStatus>,
}

impl<C: LightClient> LightSynchronizer<C> {
    pub fn new(client: Arc<C>, config: SyncConfig) -> Self {
        let (status, _) = watch::channel(SyncStatus::Idle);
        Self {
            client,
            config,
            machine: SyncMachine,
            status,
        }
    }

    pub fn subscribe(&self) -> watch::Receiver<SyncStatus> {
        self.status.subscribe()
    }

    pub fn status(&self) -> SyncStatus {
        self.status.borrow().clone()
    }

    pub fn targets(&self, on: bool) -> Vec<LightTarget> {
        self.config
            .light_ids
            .iter()
            .map(|&id| LightTarget { id, on })
            .collect()
    }

    /// Publishes the pending status for a new run. Called at decision time
    /// so the label changes before any light has been written.
    pub fn begin(&self, target_on: bool) -> SyncTicket {
        let ticket = SyncTicket {
            run_id: Uuid::new_v4(),
            target: target_on,
            started_at: Utc::now(),
        };
        self.status
            .send_replace(self.machine.begin(ticket.run_id, target_on));
        ticket
    }

    pub async fn apply_state(&self, target_on: bool) -> SyncRun {
        let ticket = self.begin(target_on);
        self.run(ticket).await
    }

    /// Writes the first light immediately and every other light once the
    /// shared stagger delay has elapsed from the start of the run. The run
    /// always ends in a settled status, at the latest when the batch
    /// deadline passes.
    pub async fn run(&self, ticket: SyncTicket) -> SyncRun {
        let SyncTicket {
            run_id,
            target: target_on,
            started_at,
        } = ticket;
        let targets = self.targets(target_on);
        tracing::info!(%run_id, target_on, lights = targets.len(), "light sync started");

        let deadline = Instant::now() + Duration::from_millis(self.config.batch_timeout_ms);
        let stagger = Duration::from_millis(self.config.stagger_ms);
        let mut pending = targets.iter().map(|target| target.id).collect::<BTreeSet<_>>();
        let mut tasks = JoinSet::new();
        let mut lights = HashMap::new();
        for (index, target) in targets.iter().copied().enumerate() {
            let client = Arc::clone(&self.client);
            let delay = if index == 0 { Duration::ZERO } else { stagger };
            let handle = tasks.spawn(async move {
                if !delay.is_zero() {
                    sleep(delay).await;
                }
                client.put_light_state(target.id, target.on).await
            });
            lights.insert(handle.id(), target.id);
        }

        let mut succeeded = Vec::new();
        let mut failed = Vec::new();
        loop {
            match timeout_at(deadline, tasks.join_next_with_id()).await {
                Ok(Some(Ok((task_id, Ok(_))))) => {
                    if let Some(light_id) = lights.get(&task_id).copied() {
                        pending.remove(&light_id);
                        succeeded.push(light_id);
                    }
                }
                Ok(Some(Ok((task_id, Err(error))))) => {
                    let light_id = error.light_id();
                    tracing::warn!(%run_id, light_id, %error, "light write failed");
                    if let Some(light_id) = lights.get(&task_id).copied() {
                        pending.remove(&light_id);
                    }
                    failed.push(LightFailure {
                        light_id,
                        reason: error.to_string(),
                    });
                }
                Ok(Some(Err(join_error))) => {
                    let Some(light_id) = lights.get(&join_error.id()).copied() else {
                        continue;
                    };
                    tracing::warn!(
                        %run_id,
                        light_id,
                        error = %join_error,
                        "light write task ended abnormally"
                    );
                    pending.remove(&light_id);
                    failed.push(LightFailure {
                        light_id,
                        reason: format!("write task ended abnormally: {join_error}"),
                    });
                }
                Ok(None) => break,
                Err(_) => {
                    tracing::warn!(
                        %run_id,
                        outstanding = pending.len(),
                        "light sync deadline passed"
                    );
                    tasks.abort_all();
                    break;
                }
            }
        }
        for light_id in pending {
            failed.push(LightFailure {
                light_id,
                reason: "no acknowledgement before the batch deadline".to_string(),
            });
        }

        let mut run = SyncRun {
            run_id,
            target: target_on,
            started_at,
            finished_at: Utc::now(),
            succeeded,
            failed,
            published: false,
        };
        let terminal = run.terminal_status();
        run.published = self.status.send_if_modified(|current| {
            match self.machine.settle(current, terminal) {
                Some(next) => {
                    *current = next;
                    true
                }
                None => false,
            }
        });
        if run.published {
            tracing::info!(
                %run_id,
                succeeded = run.succeeded.len(),
                failed = run.failed.len(),
                "light sync settled"
            );
        } else {
            tracing::warn!(%run_id, "light sync finished after a newer run took over");
        }
        run
    }

    /// One-shot read of the reference light at startup. Publishes a settled
    /// status only while nothing else has touched the status yet; a failed
    /// read leaves the idle label in place.
    pub async fn reconcile(&self) -> Option<bool> {
        let light_id = self.config.reference_light_id;
        let info = match self.client.fetch_light(light_id).await {
            Ok(info) => info,
            Err(error) => {
                tracing::warn!(%error, "startup reconciliation failed");
                return None;
            }
        };
        let on = info.state.on;
        let published = self.status.send_if_modified(|current| {
            match self.machine.reconcile(current, on) {
                Some(next) => {
                    *current = next;
                    true
                }
                None => false,
            }
        });
        if !published {
            tracing::info!(on, "reconciled state ignored, a sync run already started");
            return None;
        }
        tracing::info!(light_id, on, "reconciled with bridge");
        Some(on)
    }
}
