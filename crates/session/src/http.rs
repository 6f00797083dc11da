//! Reqwest-backed implementation of the snapshot API boundary.

use async_trait::async_trait;
use reqwest::{Client, Response};
use snapshot_core::SnapshotInfo;

use crate::api::{ApiError, SnapshotApi};

/// Snapshot API client against the pipeline server's REST surface.
pub struct HttpSnapshotApi {
    base: String,
    client: Client,
}

impl HttpSnapshotApi {
    /// Client for the server at `base_url`, e.g. `http://127.0.0.1:18630`.
    pub fn new(base_url: &str) -> Self {
        Self::with_client(Client::new(), base_url)
    }

    /// Client reusing an existing connection pool.
    pub fn with_client(client: Client, base_url: &str) -> Self {
        Self {
            base: base_url.trim_end_matches('/').to_string(),
            client,
        }
    }

    fn snapshot_url(&self, pipeline: &str, name: &str) -> String {
        format!("{}/rest/v1/pipeline/{}/snapshot/{}", self.base, pipeline, name)
    }

    async fn into_api_result(resp: Response) -> Result<Response, ApiError> {
        let status = resp.status();
        if status.is_success() {
            return Ok(resp);
        }
        let payload = resp.text().await.unwrap_or_default();
        Err(ApiError::Server {
            status: status.as_u16(),
            payload,
        })
    }
}

#[async_trait]
impl SnapshotApi for HttpSnapshotApi {
    async fn capture_snapshot(
        &self,
        pipeline: &str,
        revision: &str,
        name: &str,
        batch_size: u32,
    ) -> Result<(), ApiError> {
        let batch = batch_size.to_string();
        let resp = self
            .client
            .put(self.snapshot_url(pipeline, name))
            .query(&[("rev", revision), ("batchSize", batch.as_str())])
            .send()
            .await?;
        Self::into_api_result(resp).await?;
        Ok(())
    }

    async fn delete_snapshot(
        &self,
        pipeline: &str,
        revision: &str,
        name: &str,
    ) -> Result<(), ApiError> {
        let resp = self
            .client
            .delete(self.snapshot_url(pipeline, name))
            .query(&[("rev", revision)])
            .send()
            .await?;
        Self::into_api_result(resp).await?;
        Ok(())
    }

    async fn get_snapshots_info(&self) -> Result<Vec<SnapshotInfo>, ApiError> {
        let resp = self
            .client
            .get(format!("{}/rest/v1/pipelines/snapshots", self.base))
            .send()
            .await?;
        let list = Self::into_api_result(resp).await?.json().await?;
        Ok(list)
    }

    async fn get_snapshot_status(
        &self,
        pipeline: &str,
        revision: &str,
        name: &str,
    ) -> Result<SnapshotInfo, ApiError> {
        let resp = self
            .client
            .get(format!("{}/status", self.snapshot_url(pipeline, name)))
            .query(&[("rev", revision)])
            .send()
            .await?;
        let info = Self::into_api_result(resp).await?.json().await?;
        Ok(info)
    }
}
