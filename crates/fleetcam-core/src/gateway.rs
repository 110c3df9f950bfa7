// ── Command gateway seam ──
//
// Everything in this crate talks to devices through `CommandGateway`.
// `GatewayClient` is the production implementation; tests substitute an
// in-memory fake.

use std::future::Future;

use fleetcam_api::GatewayClient;
use fleetcam_api::types::{FeedStatus, RegionWire, StartStreamRequest};

use crate::error::CoreError;
use crate::model::{ClipRequestDraft, StreamKey};

/// Result of a status query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StreamStatus {
    pub status: FeedStatus,
    pub stream_url: Option<String>,
}

/// Typed device commands. Implementations own no session state.
pub trait CommandGateway: Send + Sync + 'static {
    /// Start the live feed; returns the stream URL the gateway reported.
    fn start_stream(
        &self,
        key: &StreamKey,
        period: u32,
    ) -> impl Future<Output = Result<Option<String>, CoreError>> + Send;

    fn stream_status(
        &self,
        key: &StreamKey,
    ) -> impl Future<Output = Result<StreamStatus, CoreError>> + Send;

    fn stop_stream(&self, key: &StreamKey) -> impl Future<Output = Result<(), CoreError>> + Send;

    /// Raw regions for the key's profile, unvalidated.
    fn ring_summary(
        &self,
        key: &StreamKey,
    ) -> impl Future<Output = Result<Vec<RegionWire>, CoreError>> + Send;

    fn request_clip(
        &self,
        draft: &ClipRequestDraft,
    ) -> impl Future<Output = Result<(), CoreError>> + Send;
}

impl CommandGateway for GatewayClient {
    async fn start_stream(&self, key: &StreamKey, period: u32) -> Result<Option<String>, CoreError> {
        let request = StartStreamRequest {
            camera: key.camera.index(),
            profile: key.profile.index(),
            period,
        };
        let resp = GatewayClient::start_stream(self, &key.serial, &request).await?;
        Ok(resp.stream_url)
    }

    async fn stream_status(&self, key: &StreamKey) -> Result<StreamStatus, CoreError> {
        let resp = GatewayClient::stream_status(self, &key.serial, key.selector()).await?;
        Ok(StreamStatus {
            status: resp.status,
            stream_url: resp.stream_url,
        })
    }

    async fn stop_stream(&self, key: &StreamKey) -> Result<(), CoreError> {
        GatewayClient::stop_stream(self, &key.serial, key.selector()).await?;
        Ok(())
    }

    async fn ring_summary(&self, key: &StreamKey) -> Result<Vec<RegionWire>, CoreError> {
        let resp = GatewayClient::ring_summary(self, &key.serial, key.selector()).await?;
        Ok(resp.regions_for(key.profile.index()).to_vec())
    }

    async fn request_clip(&self, draft: &ClipRequestDraft) -> Result<(), CoreError> {
        GatewayClient::request_clip(self, draft.serial(), &draft.to_wire()).await?;
        Ok(())
    }
}
