// Device command gateway HTTP client
//
// Wraps `reqwest::Client` with unit-scoped URL construction, bearer auth,
// and `{ ok, error }` envelope handling. Owns no session state: every call
// is a self-contained request/response addressed by device serial.

use reqwest::StatusCode;
use secrecy::SecretString;
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::debug;
use url::Url;

use crate::error::Error;
use crate::transport::TransportConfig;
use crate::types::{
    ClipRequest, ClipRequestResponse, CommandRequest, Envelope, RING_SUMMARY_COMMAND,
    RingSummaryResponse, StartStreamRequest, StartStreamResponse, StopStreamResponse,
    StreamSelector, StreamStatusResponse,
};

const DEFAULT_REJECTION: &str = "device returned an error";

/// Async client for the device command gateway.
///
/// All endpoints live under `{base}/api/units/{serial}/`. The serial is
/// percent-encoded as a single path segment.
#[derive(Debug, Clone)]
pub struct GatewayClient {
    http: reqwest::Client,
    base_url: Url,
    timeout_secs: u64,
}

impl GatewayClient {
    // ── Constructors ─────────────────────────────────────────────────

    /// Build from a gateway URL, API key, and transport config.
    ///
    /// Injects `Authorization: Bearer <key>` as a default header.
    pub fn new(
        base_url: &str,
        api_key: &SecretString,
        transport: &TransportConfig,
    ) -> Result<Self, Error> {
        let http = transport.build_bearer_client(api_key)?;
        let mut client = Self::from_reqwest(base_url, http)?;
        client.timeout_secs = transport.timeout.as_secs();
        Ok(client)
    }

    /// Wrap an existing `reqwest::Client` (caller manages auth headers).
    pub fn from_reqwest(base_url: &str, http: reqwest::Client) -> Result<Self, Error> {
        let base_url = Url::parse(base_url)?;
        if base_url.cannot_be_a_base() {
            return Err(Error::InvalidUrl(url::ParseError::RelativeUrlWithCannotBeABaseBase));
        }
        Ok(Self {
            http,
            base_url,
            timeout_secs: 0,
        })
    }

    /// The gateway base URL.
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    // ── Endpoints ────────────────────────────────────────────────────

    /// Ask the device to start pushing a live feed.
    pub async fn start_stream(
        &self,
        serial: &str,
        request: &StartStreamRequest,
    ) -> Result<StartStreamResponse, Error> {
        let url = self.unit_url(serial, &["stream", "start"])?;
        let resp: StartStreamResponse = self.post(url, request).await?;
        ensure_ok(resp.ok, resp.error.as_deref())?;
        Ok(resp)
    }

    /// Query whether the live feed is up.
    pub async fn stream_status(
        &self,
        serial: &str,
        selector: StreamSelector,
    ) -> Result<StreamStatusResponse, Error> {
        let url = self.unit_url(serial, &["stream", "status"])?;
        let params = [
            ("camera", selector.camera.to_string()),
            ("profile", selector.profile.to_string()),
        ];
        self.get(url, &params).await
    }

    /// Ask the device to stop the live feed.
    pub async fn stop_stream(
        &self,
        serial: &str,
        selector: StreamSelector,
    ) -> Result<StopStreamResponse, Error> {
        let url = self.unit_url(serial, &["stream", "stop"])?;
        let resp: StopStreamResponse = self.post(url, &selector).await?;
        ensure_ok(resp.ok, resp.error.as_deref())?;
        Ok(resp)
    }

    /// Fetch the ring-buffer summary (retained recording regions).
    pub async fn ring_summary(
        &self,
        serial: &str,
        selector: StreamSelector,
    ) -> Result<RingSummaryResponse, Error> {
        let body = CommandRequest {
            command_type: RING_SUMMARY_COMMAND.to_owned(),
            payload: selector,
        };
        let url = self.unit_url(serial, &["command"])?;
        let resp: RingSummaryResponse = self.post(url, &body).await?;
        ensure_ok(resp.ok, resp.error.as_deref())?;
        Ok(resp)
    }

    /// Ask the device to upload a clip for the given time range.
    ///
    /// Success only means the device accepted the request; transfer progress
    /// shows up later in the clip records.
    pub async fn request_clip(
        &self,
        serial: &str,
        request: &ClipRequest,
    ) -> Result<ClipRequestResponse, Error> {
        let url = self.unit_url(serial, &["clips", "request"])?;
        let resp: ClipRequestResponse = self.post(url, request).await?;
        ensure_ok(resp.ok, resp.error.as_deref())?;
        Ok(resp)
    }

    /// Send an arbitrary `{ type, payload }` command and return the raw reply.
    pub async fn send_command<P: Serialize + Sync>(
        &self,
        serial: &str,
        command_type: &str,
        payload: P,
    ) -> Result<serde_json::Value, Error> {
        let body = CommandRequest {
            command_type: command_type.to_owned(),
            payload,
        };
        let url = self.unit_url(serial, &["command"])?;
        self.post(url, &body).await
    }

    // ── URL builder ──────────────────────────────────────────────────

    /// Build `{base}/api/units/{serial}/{segments...}`.
    fn unit_url(&self, serial: &str, segments: &[&str]) -> Result<Url, Error> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|()| Error::InvalidUrl(url::ParseError::RelativeUrlWithCannotBeABaseBase))?
            .pop_if_empty()
            .extend(["api", "units", serial])
            .extend(segments);
        Ok(url)
    }

    // ── HTTP verbs ───────────────────────────────────────────────────

    async fn get<T: DeserializeOwned>(
        &self,
        url: Url,
        params: &[(&str, String)],
    ) -> Result<T, Error> {
        debug!("GET {url} params={params:?}");

        let resp = self
            .http
            .get(url)
            .query(params)
            .send()
            .await
            .map_err(|e| self.transport_error(e))?;
        self.handle_response(resp).await
    }

    async fn post<T: DeserializeOwned, B: Serialize + Sync + ?Sized>(
        &self,
        url: Url,
        body: &B,
    ) -> Result<T, Error> {
        debug!("POST {url}");

        let resp = self
            .http
            .post(url)
            .json(body)
            .send()
            .await
            .map_err(|e| self.transport_error(e))?;
        self.handle_response(resp).await
    }

    // ── Response handling ────────────────────────────────────────────

    /// Map status codes and the `{ ok, error }` envelope onto `Error`, then
    /// decode the body.
    async fn handle_response<T: DeserializeOwned>(
        &self,
        resp: reqwest::Response,
    ) -> Result<T, Error> {
        let status = resp.status();

        if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
            return Err(Error::Unauthorized {
                status: status.as_u16(),
            });
        }

        let body = resp.text().await.map_err(|e| self.transport_error(e))?;
        let envelope = serde_json::from_str::<Envelope>(&body).ok();

        if let Some(env) = envelope.as_ref().filter(|e| e.is_rejection()) {
            return Err(Error::Rejected {
                message: env
                    .error
                    .clone()
                    .unwrap_or_else(|| DEFAULT_REJECTION.to_owned()),
                status: status.as_u16(),
            });
        }

        if !status.is_success() {
            return Err(match envelope.and_then(|e| e.error) {
                Some(message) => Error::Rejected {
                    message,
                    status: status.as_u16(),
                },
                None => Error::Http {
                    status: status.as_u16(),
                    body,
                },
            });
        }

        serde_json::from_str(&body).map_err(|e| Error::Deserialization {
            message: e.to_string(),
            body,
        })
    }

    fn transport_error(&self, err: reqwest::Error) -> Error {
        if err.is_timeout() {
            Error::Timeout {
                timeout_secs: self.timeout_secs,
            }
        } else {
            Error::Transport(err)
        }
    }
}

/// Typed responses carry `ok` themselves; treat a decoded `ok: false` the
/// same way as an envelope rejection.
fn ensure_ok(ok: bool, error: Option<&str>) -> Result<(), Error> {
    if ok {
        return Ok(());
    }
    Err(Error::Rejected {
        message: error.unwrap_or(DEFAULT_REJECTION).to_owned(),
        status: StatusCode::OK.as_u16(),
    })
}
