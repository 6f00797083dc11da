//! Single-flight poll loop watching one in-progress capture.

use std::sync::Arc;

use tokio::sync::watch;
use tokio::time::{sleep, timeout};
use tracing::{debug, info, warn};

use crate::api::ApiError;
use crate::session::{refresh_inner, surface_error, SessionInner};

/// Slot for the (at most one) active poll loop of a session.
///
/// `generation` grows monotonically. A loop only acts while its own
/// generation is still current, so superseding a watch can never leave two
/// live watchers, and a response from a superseded loop can never apply.
pub(crate) struct PollSlot {
    pub(crate) generation: u64,
    pub(crate) stop: Option<watch::Sender<bool>>,
}

impl PollSlot {
    pub(crate) fn idle() -> Self {
        Self {
            generation: 0,
            stop: None,
        }
    }
}

/// Starts watching `name`, superseding any previous watch.
pub(crate) fn start(inner: &Arc<SessionInner>, name: String) {
    let (stop_tx, stop_rx) = watch::channel(false);
    let generation = {
        let mut slot = inner.poll.lock();
        slot.generation += 1;
        if let Some(prev) = slot.stop.replace(stop_tx) {
            let _ = prev.send(true);
        }
        slot.generation
    };
    debug!(session = %inner.session_id, snapshot = %name, generation, "watching snapshot capture");
    tokio::spawn(run(Arc::clone(inner), name, generation, stop_rx));
}

/// Stops any active watch, cancelling its pending delay before it fires.
pub(crate) fn stop(inner: &SessionInner) {
    let mut slot = inner.poll.lock();
    slot.generation += 1;
    if let Some(prev) = slot.stop.take() {
        let _ = prev.send(true);
    }
}

fn is_current(inner: &SessionInner, generation: u64) -> bool {
    inner.poll.lock().generation == generation
}

/// Clears the slot if this loop still owns it.
fn release(inner: &SessionInner, generation: u64) -> bool {
    let mut slot = inner.poll.lock();
    if slot.generation != generation {
        return false;
    }
    slot.stop = None;
    true
}

async fn run(
    inner: Arc<SessionInner>,
    name: String,
    generation: u64,
    mut stop_rx: watch::Receiver<bool>,
) {
    loop {
        // Waiting: the delay is the only cancellable resource; the next one
        // is only armed after the previous status check resolved.
        tokio::select! {
            _ = stop_rx.changed() => {
                debug!(session = %inner.session_id, snapshot = %name, "snapshot watch stopped");
                return;
            }
            _ = sleep(inner.config.poll_interval) => {}
        }
        if !is_current(&inner, generation) {
            return;
        }

        // Checking, under an explicit deadline so a hung request cannot
        // leave the loop in this state forever.
        let checked = timeout(
            inner.config.status_timeout,
            inner
                .api
                .get_snapshot_status(&inner.config.pipeline, &inner.config.revision, &name),
        )
        .await;
        let result = match checked {
            Ok(result) => result,
            Err(_) => Err(ApiError::Timeout(inner.config.status_timeout)),
        };
        if !is_current(&inner, generation) {
            return;
        }

        match result {
            Ok(status) if status.in_progress => continue,
            Ok(_) => {
                if !release(&inner, generation) {
                    return;
                }
                info!(session = %inner.session_id, snapshot = %name, "snapshot capture completed");
                inner.view.send_modify(|v| v.snapshot_in_progress = false);
                refresh_inner(&inner).await;
                return;
            }
            Err(err) => {
                // Terminal for this loop: surfaced, never retried. A manual
                // refresh recovers the watch if the capture is still live.
                warn!(session = %inner.session_id, snapshot = %name, error = %err, "snapshot status check failed");
                surface_error(&inner, &err);
                release(&inner, generation);
                return;
            }
        }
    }
}
