use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use snapshot_core::{first_in_progress, next_snapshot_name, reconcile_snapshots, SnapshotInfo};
use tokio::sync::watch;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::api::{ApiError, ErrorPayload, SnapshotApi};
use crate::poll;

/// Default number of in-flight records captured per batch.
pub const DEFAULT_SNAPSHOT_BATCH_SIZE: u32 = 10;

/// Identity and tunables for one snapshot session.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Pipeline whose snapshots this session manages.
    pub pipeline: String,
    /// Active pipeline revision, passed through on every request.
    pub revision: String,
    /// Records captured per batch on capture-start.
    pub batch_size: u32,
    /// Delay between successive status checks of an in-progress capture.
    pub poll_interval: Duration,
    /// Deadline for a single status check.
    pub status_timeout: Duration,
    /// Whether the pipeline is currently running. Passed through to the
    /// rendering layer, not interpreted here.
    pub pipeline_running: bool,
}

impl SessionConfig {
    /// Config with defaults for the given pipeline and revision.
    pub fn new(pipeline: impl Into<String>, revision: impl Into<String>) -> Self {
        Self {
            pipeline: pipeline.into(),
            revision: revision.into(),
            batch_size: DEFAULT_SNAPSHOT_BATCH_SIZE,
            poll_interval: Duration::from_millis(1_000),
            status_timeout: Duration::from_secs(30),
            pipeline_running: true,
        }
    }
}

/// Reconciled state published to the rendering layer.
#[derive(Debug, Clone)]
pub struct SessionView {
    /// Snapshots of this session's pipeline, sorted ascending by id.
    pub snapshots: Vec<SnapshotInfo>,
    /// True until the first refresh settles (success or failure).
    pub show_loading: bool,
    /// True while a capture is believed to be in progress.
    pub snapshot_in_progress: bool,
    /// Single-slot error surface; replaced wholesale on every failure.
    pub errors: Vec<ErrorPayload>,
    /// Passthrough of [`SessionConfig::pipeline_running`].
    pub pipeline_running: bool,
}

/// How a session was resolved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionOutcome {
    /// The user chose a snapshot to view.
    Viewed(String),
    /// The session was dismissed without choosing one.
    Dismissed,
}

pub(crate) struct SessionInner {
    pub(crate) api: Arc<dyn SnapshotApi>,
    pub(crate) config: SessionConfig,
    pub(crate) session_id: Uuid,
    pub(crate) view: watch::Sender<SessionView>,
    pub(crate) poll: Mutex<poll::PollSlot>,
    refresh_epoch: AtomicU64,
    outcome: watch::Sender<Option<SessionOutcome>>,
}

/// Client-side manager for the snapshot lifecycle of one pipeline.
///
/// All operations catch their own failures and surface them on the view's
/// error slot; none of them return errors or panic the session.
pub struct SnapshotSession {
    inner: Arc<SessionInner>,
}

impl SnapshotSession {
    /// Opens a session and runs the initial refresh before returning.
    pub async fn open(api: Arc<dyn SnapshotApi>, config: SessionConfig) -> Self {
        let session_id = Uuid::new_v4();
        let initial = SessionView {
            snapshots: Vec::new(),
            show_loading: true,
            snapshot_in_progress: false,
            errors: Vec::new(),
            pipeline_running: config.pipeline_running,
        };
        let (view, _) = watch::channel(initial);
        let (outcome, _) = watch::channel(None);
        let inner = Arc::new(SessionInner {
            api,
            config,
            session_id,
            view,
            poll: Mutex::new(poll::PollSlot::idle()),
            refresh_epoch: AtomicU64::new(0),
            outcome,
        });
        info!(session = %session_id, pipeline = %inner.config.pipeline, "snapshot session opened");
        refresh_inner(&inner).await;
        Self { inner }
    }

    /// Snapshot of the current view.
    pub fn view(&self) -> SessionView {
        self.inner.view.borrow().clone()
    }

    /// Subscribes to view changes.
    pub fn subscribe(&self) -> watch::Receiver<SessionView> {
        self.inner.view.subscribe()
    }

    /// Re-fetches the server list and replaces the view wholesale.
    pub async fn refresh(&self) {
        refresh_inner(&self.inner).await;
    }

    /// Starts capturing a new snapshot under the next derived name.
    ///
    /// On success the view gains a provisional in-progress entry and a poll
    /// loop starts watching it; the entry is replaced by server truth on the
    /// next refresh.
    pub async fn capture_snapshot(&self) {
        let inner = &self.inner;
        let name = {
            let view = inner.view.borrow();
            next_snapshot_name(&view.snapshots)
        };
        let started = inner
            .api
            .capture_snapshot(
                &inner.config.pipeline,
                &inner.config.revision,
                &name,
                inner.config.batch_size,
            )
            .await;
        match started {
            Ok(()) => {
                info!(session = %inner.session_id, snapshot = %name, "snapshot capture started");
                inner.view.send_modify(|v| {
                    v.snapshots.push(SnapshotInfo::provisional(
                        inner.config.pipeline.clone(),
                        name.clone(),
                    ));
                    v.snapshot_in_progress = true;
                });
                poll::start(inner, name);
            }
            Err(err) => {
                warn!(session = %inner.session_id, error = %err, "snapshot capture request failed");
                surface_error(inner, &err);
            }
        }
    }

    /// Deletes a snapshot, removing it from the view before the request
    /// settles. A failed request surfaces its error but the optimistic
    /// removal stands until the next refresh.
    pub async fn delete_snapshot(&self, name: &str, index: usize) {
        let inner = &self.inner;
        inner.view.send_modify(|v| remove_entry(v, name, index));
        let deleted = inner
            .api
            .delete_snapshot(&inner.config.pipeline, &inner.config.revision, name)
            .await;
        if let Err(err) = deleted {
            warn!(session = %inner.session_id, snapshot = %name, error = %err, "snapshot delete failed");
            surface_error(inner, &err);
        }
    }

    /// Cancels an in-progress capture: stops the poll loop, removes the
    /// entry, clears the in-progress flag, then deletes the incomplete
    /// snapshot server-side.
    pub async fn cancel_snapshot(&self, name: &str, index: usize) {
        let inner = &self.inner;
        poll::stop(inner);
        inner.view.send_modify(|v| {
            remove_entry(v, name, index);
            v.snapshot_in_progress = false;
        });
        let deleted = inner
            .api
            .delete_snapshot(&inner.config.pipeline, &inner.config.revision, name)
            .await;
        if let Err(err) = deleted {
            warn!(session = %inner.session_id, snapshot = %name, error = %err, "snapshot cancel failed");
            surface_error(inner, &err);
        }
    }

    /// Resolves the session with the chosen snapshot and tears it down.
    pub fn view_snapshot(&self, name: &str) {
        poll::stop(&self.inner);
        self.resolve(SessionOutcome::Viewed(name.to_string()));
    }

    /// Dismisses the session and tears it down.
    pub fn close(&self) {
        poll::stop(&self.inner);
        self.resolve(SessionOutcome::Dismissed);
    }

    /// Waits until the session is resolved via [`SnapshotSession::view_snapshot`]
    /// or [`SnapshotSession::close`].
    pub async fn outcome(&self) -> SessionOutcome {
        let mut rx = self.inner.outcome.subscribe();
        let result = match rx.wait_for(|o| o.is_some()).await {
            Ok(resolved) => resolved.clone().unwrap_or(SessionOutcome::Dismissed),
            Err(_) => SessionOutcome::Dismissed,
        };
        result
    }

    fn resolve(&self, outcome: SessionOutcome) {
        self.inner.outcome.send_if_modified(|slot| {
            if slot.is_none() {
                *slot = Some(outcome);
                true
            } else {
                false
            }
        });
    }
}

impl Drop for SnapshotSession {
    fn drop(&mut self) {
        // A dropped session must not leave an orphaned poll loop behind.
        poll::stop(&self.inner);
    }
}

/// Honors the caller's index only while it still matches `name`; a
/// concurrent refresh may have reordered the list underneath the caller.
fn remove_entry(view: &mut SessionView, name: &str, index: usize) {
    match view.snapshots.get(index) {
        Some(entry) if entry.id == name => {
            view.snapshots.remove(index);
        }
        _ => {
            if let Some(pos) = view.snapshots.iter().position(|s| s.id == name) {
                view.snapshots.remove(pos);
            }
        }
    }
}

pub(crate) fn surface_error(inner: &SessionInner, err: &ApiError) {
    inner.view.send_modify(|v| v.errors = vec![err.to_payload()]);
}

/// Full reconciliation against server truth.
///
/// Each call takes a fresh epoch before the request; a response that is no
/// longer the latest issued is discarded instead of overwriting newer state.
/// The loading indicator is cleared exactly once per applied refresh, on
/// both the success and the failure path.
pub(crate) async fn refresh_inner(inner: &Arc<SessionInner>) {
    let epoch = inner.refresh_epoch.fetch_add(1, Ordering::SeqCst) + 1;
    let result = inner.api.get_snapshots_info().await;
    if inner.refresh_epoch.load(Ordering::SeqCst) != epoch {
        debug!(session = %inner.session_id, "discarding stale snapshot list response");
        return;
    }
    match result {
        Ok(all) => {
            let snapshots = reconcile_snapshots(&inner.config.pipeline, all);
            let resume = first_in_progress(&snapshots).map(|s| s.id.clone());
            inner.view.send_modify(|v| {
                v.snapshots = snapshots;
                v.snapshot_in_progress = resume.is_some();
                v.show_loading = false;
            });
            match resume {
                // Covers a capture started by another client or one that
                // survives a session reload.
                Some(id) => poll::start(inner, id),
                None => poll::stop(inner),
            }
        }
        Err(err) => {
            warn!(session = %inner.session_id, error = %err, "snapshot list refresh failed");
            inner.view.send_modify(|v| {
                v.show_loading = false;
                v.errors = vec![err.to_payload()];
            });
        }
    }
}
