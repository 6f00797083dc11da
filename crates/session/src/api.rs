use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use snapshot_core::SnapshotInfo;
use thiserror::Error;

/// Failure of a snapshot API request.
#[derive(Debug, Error)]
pub enum ApiError {
    /// The server answered with a non-success status; `payload` is the raw
    /// error body.
    #[error("server returned {status}: {payload}")]
    Server {
        /// HTTP status code.
        status: u16,
        /// Server-provided error body, verbatim.
        payload: String,
    },
    /// The request never produced a usable response.
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),
    /// A status check exceeded its deadline.
    #[error("snapshot status check timed out after {0:?}")]
    Timeout(Duration),
}

impl ApiError {
    /// Converts the failure into the payload surfaced on the session view.
    pub fn to_payload(&self) -> ErrorPayload {
        match self {
            ApiError::Server { status, payload } => ErrorPayload {
                status: Some(*status),
                message: payload.clone(),
            },
            ApiError::Transport(err) => ErrorPayload {
                status: err.status().map(|s| s.as_u16()),
                message: err.to_string(),
            },
            ApiError::Timeout(_) => ErrorPayload {
                status: None,
                message: self.to_string(),
            },
        }
    }
}

/// Entry on the session's single-slot error surface.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorPayload {
    /// HTTP status, when the server produced one.
    pub status: Option<u16>,
    /// Server error body, or a transport-level description.
    pub message: String,
}

/// Boundary to the pipeline server's snapshot endpoints.
///
/// `revision` is an opaque pipeline version identifier; sessions pass the
/// currently-active revision through on every call.
#[async_trait]
pub trait SnapshotApi: Send + Sync {
    /// Starts capturing up to `batch_size` in-flight records into a new
    /// snapshot named `name`.
    async fn capture_snapshot(
        &self,
        pipeline: &str,
        revision: &str,
        name: &str,
        batch_size: u32,
    ) -> Result<(), ApiError>;

    /// Deletes snapshot `name`. Also used to cancel an incomplete capture.
    async fn delete_snapshot(
        &self,
        pipeline: &str,
        revision: &str,
        name: &str,
    ) -> Result<(), ApiError>;

    /// Lists snapshots across all pipelines known to the server.
    async fn get_snapshots_info(&self) -> Result<Vec<SnapshotInfo>, ApiError>;

    /// Current state of snapshot `name`.
    async fn get_snapshot_status(
        &self,
        pipeline: &str,
        revision: &str,
        name: &str,
    ) -> Result<SnapshotInfo, ApiError>;
}
