#![forbid(unsafe_code)]
#![warn(missing_docs)]

//! Client-side lifecycle management for pipeline snapshots.
//!
//! A [`SnapshotSession`] owns the reconciled view of one pipeline's
//! snapshots: it starts captures, watches an in-progress capture through a
//! single self-rescheduling poll loop, and replaces the view wholesale with
//! server truth whenever a capture settles. The server is reached through
//! the [`SnapshotApi`] boundary; [`HttpSnapshotApi`] is the stock
//! implementation against the pipeline server's REST surface.

pub mod api;
pub mod http;
mod poll;
mod session;

pub use api::{ApiError, ErrorPayload, SnapshotApi};
pub use http::HttpSnapshotApi;
pub use session::{
    SessionConfig, SessionOutcome, SessionView, SnapshotSession, DEFAULT_SNAPSHOT_BATCH_SIZE,
};
