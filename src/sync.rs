//! Load and autosave of the report.
//!
//! A [`Synchronizer`] reads the stored document exactly once. Loading
//! consumes it and hands back a [`Session`], the only type that can edit the
//! document, so nothing can be edited before the initial load has settled.
//!
//! Every edit swaps in a new immutable snapshot and re-arms a single
//! debounce timer. When the timer survives a full quiet period, the latest
//! snapshot (not the one current when the timer was armed) is written to the
//! gateway. Saves are best effort: failures are logged and otherwise only
//! show up as a `saved_at` that does not move.

use crate::codec::{self, DecodePolicy, HEADER_KEY};
use crate::gateway::{Gateway, GatewayError};
use crate::report::{Collection, EditError, Field, ProjectReport, RowField};
use chrono::{DateTime, Utc};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;

/// Quiet period used unless configured otherwise.
pub const DEFAULT_QUIET_PERIOD: Duration = Duration::from_millis(800);

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SyncConfig {
    /// Delay after the last edit before the document is saved.
    pub quiet_period: Duration,
    /// How stored scalar values are decoded on load.
    pub decode: DecodePolicy,
}

impl Default for SyncConfig {
    fn default() -> Self {
        SyncConfig {
            quiet_period: DEFAULT_QUIET_PERIOD,
            decode: DecodePolicy::default(),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Lifecycle {
    Unloaded,
    Loading,
    Ready,
}

/// What the initial load produced.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LoadOutcome {
    /// Stored values were merged into the default document.
    Restored,
    /// The gateway had nothing stored; defaults are in use.
    Empty,
    /// The gateway could not be read; defaults are in use.
    Failed,
}

/// Observable state of the synchronizer, published on every change.
#[derive(Clone, Debug, PartialEq)]
pub struct SyncStatus {
    pub lifecycle: Lifecycle,
    pub load_outcome: Option<LoadOutcome>,
    /// A save timer is armed and has not fired yet.
    pub pending: bool,
    /// Writes currently in flight. Usually 0 or 1.
    pub saves_in_flight: usize,
    /// Completion time of the last successful write.
    pub saved_at: Option<DateTime<Utc>>,
    /// Completion time of the last write, successful or not.
    pub last_attempt_at: Option<DateTime<Utc>>,
}

impl SyncStatus {
    fn unloaded() -> Self {
        SyncStatus {
            lifecycle: Lifecycle::Unloaded,
            load_outcome: None,
            pending: false,
            saves_in_flight: 0,
            saved_at: None,
            last_attempt_at: None,
        }
    }

    pub fn saving(&self) -> bool {
        self.saves_in_flight > 0
    }
}

/// A single change to the document.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Edit {
    SetField {
        field: Field,
        value: String,
    },
    SetRowField {
        collection: Collection,
        index: usize,
        field: RowField,
        value: String,
    },
    AddRow {
        collection: Collection,
    },
    RemoveRow {
        collection: Collection,
        index: usize,
    },
}

impl Edit {
    /// Produces the edited copy of `report`; `report` itself is unchanged.
    pub fn apply(&self, report: &ProjectReport) -> Result<ProjectReport, EditError> {
        match self {
            Edit::SetField { field, value } => Ok(report.with_field(*field, value.as_str())),
            Edit::SetRowField {
                collection,
                index,
                field,
                value,
            } => report.with_row_field(*collection, *index, *field, value.as_str()),
            Edit::AddRow { collection } => Ok(report.with_row_added(*collection)),
            Edit::RemoveRow { collection, index } => report.with_row_removed(*collection, *index),
        }
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Owner of the document before the initial load.
pub struct Synchronizer {
    gateway: Arc<dyn Gateway>,
    config: SyncConfig,
    status: watch::Sender<SyncStatus>,
}

impl Synchronizer {
    pub fn new(gateway: Arc<dyn Gateway>, config: SyncConfig) -> Self {
        let (status, _) = watch::channel(SyncStatus::unloaded());
        Synchronizer {
            gateway,
            config,
            status,
        }
    }

    /// Subscribes to status updates, starting at `Unloaded`.
    pub fn status(&self) -> watch::Receiver<SyncStatus> {
        self.status.subscribe()
    }

    /// Reads the stored document and returns the editing session.
    ///
    /// Never fails: an unreachable gateway, an error status, an undecodable
    /// body or an empty store all leave the default document in place.
    pub async fn load(self) -> Session {
        self.status
            .send_modify(|status| status.lifecycle = Lifecycle::Loading);

        let (document, outcome) = match self.gateway.read().await {
            Ok(rows) if rows.keys().all(|key| key == HEADER_KEY) => {
                log::info!("gateway holds no saved report, starting from defaults");
                (ProjectReport::default(), LoadOutcome::Empty)
            }
            Ok(rows) => {
                log::info!("restored {} stored fields", rows.len());
                (
                    codec::decode_document(&rows, self.config.decode),
                    LoadOutcome::Restored,
                )
            }
            Err(err) => {
                log::warn!("could not load saved report, starting from defaults: {err}");
                (ProjectReport::default(), LoadOutcome::Failed)
            }
        };

        self.status.send_modify(|status| {
            status.lifecycle = Lifecycle::Ready;
            status.load_outcome = Some(outcome);
        });

        Session {
            shared: Arc::new(Shared {
                gateway: self.gateway,
                quiet_period: self.config.quiet_period,
                document: Mutex::new(Arc::new(document)),
                timer: Mutex::new(TimerSlot::default()),
                status: self.status,
            }),
        }
    }
}

#[derive(Default)]
struct TimerSlot {
    handle: Option<JoinHandle<()>>,
    // bumped on every arm and cancel; a timer only fires if it still matches
    generation: u64,
}

impl TimerSlot {
    fn cancel(&mut self) {
        self.generation = self.generation.wrapping_add(1);
        if let Some(handle) = self.handle.take() {
            handle.abort();
        }
    }
}

struct Shared {
    gateway: Arc<dyn Gateway>,
    quiet_period: Duration,
    document: Mutex<Arc<ProjectReport>>,
    timer: Mutex<TimerSlot>,
    status: watch::Sender<SyncStatus>,
}

impl Shared {
    fn current(&self) -> Arc<ProjectReport> {
        Arc::clone(&lock(&self.document))
    }
}

/// Editing handle for a loaded document.
///
/// Cloning is cheap and every clone edits the same document. Edit methods
/// must be called from within a tokio runtime, since they arm the save timer.
#[derive(Clone)]
pub struct Session {
    shared: Arc<Shared>,
}

impl Session {
    /// The current document snapshot.
    pub fn snapshot(&self) -> Arc<ProjectReport> {
        self.shared.current()
    }

    pub fn status(&self) -> watch::Receiver<SyncStatus> {
        self.shared.status.subscribe()
    }

    /// Applies `edit` and schedules a save.
    ///
    /// # Errors
    /// * Returns the [`EditError`] of a rejected row edit; nothing is
    ///   scheduled in that case
    pub fn apply(&self, edit: Edit) -> Result<Arc<ProjectReport>, EditError> {
        let next = {
            let mut document = lock(&self.shared.document);
            let next = Arc::new(edit.apply(&document)?);
            *document = Arc::clone(&next);
            next
        };
        self.schedule_save();
        Ok(next)
    }

    pub fn set_field(&self, field: Field, value: impl Into<String>) -> Arc<ProjectReport> {
        let edit = Edit::SetField {
            field,
            value: value.into(),
        };
        match self.apply(edit) {
            Ok(next) => next,
            // scalar updates cannot be rejected
            Err(_) => self.snapshot(),
        }
    }

    pub fn set_row_field(
        &self,
        collection: Collection,
        index: usize,
        field: RowField,
        value: impl Into<String>,
    ) -> Result<Arc<ProjectReport>, EditError> {
        self.apply(Edit::SetRowField {
            collection,
            index,
            field,
            value: value.into(),
        })
    }

    pub fn add_row(&self, collection: Collection) -> Arc<ProjectReport> {
        match self.apply(Edit::AddRow { collection }) {
            Ok(next) => next,
            Err(_) => self.snapshot(),
        }
    }

    pub fn remove_row(
        &self,
        collection: Collection,
        index: usize,
    ) -> Result<Arc<ProjectReport>, EditError> {
        self.apply(Edit::RemoveRow { collection, index })
    }

    /// Cancels any armed timer and arms a fresh one for the quiet period.
    fn schedule_save(&self) {
        let mut slot = lock(&self.shared.timer);
        slot.cancel();
        let generation = slot.generation;
        let shared = Arc::clone(&self.shared);
        slot.handle = Some(tokio::spawn(async move {
            tokio::time::sleep(shared.quiet_period).await;
            {
                let slot = lock(&shared.timer);
                if slot.generation != generation {
                    return;
                }
                // counted as in flight before the lock is released, so observers
                // never see the save as neither pending nor running
                shared.status.send_modify(|status| {
                    status.pending = false;
                    status.saves_in_flight += 1;
                });
            }
            // detached so that re-arming the timer never cancels a running save
            tokio::spawn(save_latest(shared));
        }));
        self.shared.status.send_modify(|status| status.pending = true);
    }

    /// Saves the current snapshot now, cancelling any armed timer.
    pub async fn flush(&self) -> Result<(), GatewayError> {
        {
            let mut slot = lock(&self.shared.timer);
            slot.cancel();
            self.shared.status.send_modify(|status| {
                status.pending = false;
                status.saves_in_flight += 1;
            });
        }
        save_latest(Arc::clone(&self.shared)).await
    }

    /// Cancels any armed timer without saving.
    pub fn close(&self) {
        self.cancel_pending();
    }

    fn cancel_pending(&self) {
        let mut slot = lock(&self.shared.timer);
        slot.cancel();
        self.shared
            .status
            .send_modify(|status| status.pending = false);
    }
}

/// Writes the current snapshot. The caller has already counted this save in
/// `saves_in_flight`.
async fn save_latest(shared: Arc<Shared>) -> Result<(), GatewayError> {
    let snapshot = shared.current();
    let outcome = match codec::to_wire(&snapshot) {
        Ok(wire) => shared.gateway.write(&wire).await,
        Err(err) => Err(GatewayError::Encode(err.to_string())),
    };

    let finished = Utc::now();
    match &outcome {
        Ok(()) => log::debug!("report saved at {finished}"),
        Err(err) => log::warn!("autosave failed, report left unsaved: {err}"),
    }
    shared.status.send_modify(|status| {
        status.saves_in_flight = status.saves_in_flight.saturating_sub(1);
        status.last_attempt_at = Some(finished);
        if outcome.is_ok() {
            status.saved_at = Some(finished);
        }
    });
    outcome
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn edits_apply_to_a_copy() {
        let report = ProjectReport::default();
        let edit = Edit::SetRowField {
            collection: Collection::CurrentActions,
            index: 0,
            field: RowField::Action,
            value: "Issue tender pack".to_string(),
        };
        let next = edit.apply(&report).unwrap();
        assert_eq!(next.current_actions[0].action, "Issue tender pack");
        assert_eq!(report.current_actions[0].action, "");
    }

    #[test]
    fn rejected_edit_reports_why() {
        let edit = Edit::RemoveRow {
            collection: Collection::ProgramRows,
            index: 7,
        };
        assert!(matches!(
            edit.apply(&ProjectReport::default()),
            Err(EditError::RowOutOfRange { index: 7, len: 3, .. })
        ));
    }

    #[test]
    fn fresh_status_is_unloaded_and_idle() {
        let status = SyncStatus::unloaded();
        assert_eq!(status.lifecycle, Lifecycle::Unloaded);
        assert!(!status.saving());
        assert!(!status.pending);
    }
}
