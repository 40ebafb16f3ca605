//! Contents-API client for the hosted snapshot file.
//!
//! # Responsibility
//! - Fetch the remote file (base64 content + version token) in one round
//!   trip and decode it into a snapshot.
//! - Submit whole-snapshot updates conditioned on the last observed token,
//!   with a human-auditable commit message.
//!
//! # Invariants
//! - A version-conflict rejection never mutates the remote file.
//! - Transport and decode failures surface as `SyncError`; callers keep
//!   operating on their last known in-memory snapshot.

use crate::model::snapshot::Snapshot;
use crate::wire::{decode_snapshot, encode_snapshot, DecodeError};
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use log::{info, warn};
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::time::{Duration, Instant};

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Seconds between read-only background refreshes.
pub const DEFAULT_POLL_INTERVAL_SECS: u64 = 30;

/// Remote backing-store configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RemoteConfig {
    /// Contents API root, e.g. `https://api.github.com`.
    pub api_base_url: String,
    /// Repository owner (user or organization).
    pub owner: String,
    /// Repository name.
    pub repo: String,
    /// File path inside the repository, e.g. `db/inventory.json`.
    pub path: String,
    /// Branch holding the file.
    pub branch: String,
    /// Personal access credential used as bearer auth.
    pub token: String,
    /// How often callers should re-load remote state.
    pub poll_interval_secs: u64,
}

impl Default for RemoteConfig {
    fn default() -> Self {
        Self {
            api_base_url: "https://api.github.com".to_string(),
            owner: String::new(),
            repo: String::new(),
            path: String::new(),
            branch: "main".to_string(),
            token: String::new(),
            poll_interval_secs: DEFAULT_POLL_INTERVAL_SECS,
        }
    }
}

impl RemoteConfig {
    /// Rejects configurations that cannot address a remote file.
    pub fn validate(&self) -> Result<(), SyncError> {
        for (field, value) in [
            ("api_base_url", &self.api_base_url),
            ("owner", &self.owner),
            ("repo", &self.repo),
            ("path", &self.path),
            ("branch", &self.branch),
            ("token", &self.token),
        ] {
            if value.trim().is_empty() {
                return Err(SyncError::InvalidConfig(format!("{field} cannot be empty")));
            }
        }
        Ok(())
    }
}

/// Opaque identifier of one revision of the remote file.
///
/// Obtained fresh on every read, discarded and replaced after every
/// successful write.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VersionToken(String);

impl VersionToken {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for VersionToken {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

pub type SyncResult<T> = Result<T, SyncError>;

/// Remote read/write failures, including version-conflict rejection.
#[derive(Debug)]
pub enum SyncError {
    /// Configuration cannot address a remote file.
    InvalidConfig(String),
    /// Transport-level failure (connect, timeout, malformed response).
    Network(String),
    /// Credential rejected by the API.
    Auth(String),
    /// Remote file or repository path does not exist.
    NotFound(String),
    /// The write was conditioned on a token the remote has moved past.
    Conflict { status: u16 },
    /// Unexpected API response.
    Api { status: u16, detail: String },
    /// Transport encoding (base64/UTF-8) could not be unwrapped.
    Encoding(String),
    /// Remote payload is not a valid snapshot document.
    Decode(DecodeError),
    /// A write was attempted before any successful read.
    NotSynced,
}

impl Display for SyncError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidConfig(detail) => write!(f, "invalid remote configuration: {detail}"),
            Self::Network(detail) => write!(f, "network error: {detail}"),
            Self::Auth(detail) => write!(f, "authentication rejected: {detail}"),
            Self::NotFound(path) => write!(f, "remote file not found: {path}"),
            Self::Conflict { status } => write!(
                f,
                "remote version moved since last read (status {status}); re-load before retrying"
            ),
            Self::Api { status, detail } => {
                write!(f, "unexpected API response {status}: {detail}")
            }
            Self::Encoding(detail) => write!(f, "transport encoding error: {detail}"),
            Self::Decode(err) => write!(f, "remote payload decode failed: {err}"),
            Self::NotSynced => write!(f, "no version token held; load remote state first"),
        }
    }
}

impl Error for SyncError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Decode(err) => Some(err),
            _ => None,
        }
    }
}

impl From<DecodeError> for SyncError {
    fn from(value: DecodeError) -> Self {
        Self::Decode(value)
    }
}

#[derive(Debug, Deserialize)]
struct ContentsResponse {
    sha: String,
    #[serde(default)]
    content: Option<String>,
}

#[derive(Debug, Serialize)]
struct UpdateRequest<'a> {
    message: &'a str,
    content: String,
    sha: &'a str,
    branch: &'a str,
}

#[derive(Debug, Deserialize)]
struct UpdateResponse {
    content: UpdatedContent,
}

#[derive(Debug, Deserialize)]
struct UpdatedContent {
    sha: String,
}

/// Async client for the hosted snapshot file.
pub struct RemoteSnapshotStore {
    config: RemoteConfig,
    client: Client,
}

impl RemoteSnapshotStore {
    /// Creates a client for a validated configuration.
    pub fn new(config: RemoteConfig) -> SyncResult<Self> {
        config.validate()?;
        let client = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|err| SyncError::Network(format!("failed to construct HTTP client: {err}")))?;
        Ok(Self { config, client })
    }

    /// Fetches the current file content and its version token.
    pub async fn load(&self) -> SyncResult<(Snapshot, VersionToken)> {
        let started_at = Instant::now();
        let response = self
            .client
            .get(self.contents_url())
            .query(&[("ref", self.config.branch.as_str())])
            .bearer_auth(&self.config.token)
            .header("Accept", "application/vnd.github+json")
            .send()
            .await
            .map_err(|err| SyncError::Network(format!("load request failed: {err}")))?;

        let status = response.status();
        if !status.is_success() {
            return Err(self.api_error(status, response.text().await.unwrap_or_default()));
        }

        let body: ContentsResponse = response
            .json()
            .await
            .map_err(|err| SyncError::Network(format!("malformed contents response: {err}")))?;
        let payload = unwrap_transport_encoding(body.content.as_deref().unwrap_or_default())?;
        let snapshot = decode_snapshot(&payload)?;

        info!(
            "event=remote_load module=sync status=ok items={} duration_ms={}",
            snapshot.items.len(),
            started_at.elapsed().as_millis()
        );
        Ok((snapshot, VersionToken(body.sha)))
    }

    /// Submits the snapshot as an update conditioned on `token`.
    ///
    /// Returns the new token, the baseline for the next write. A moved
    /// remote version yields `SyncError::Conflict` and leaves the file
    /// untouched; the caller must re-load before retrying.
    pub async fn save(
        &self,
        snapshot: &Snapshot,
        token: &VersionToken,
        message: &str,
    ) -> SyncResult<VersionToken> {
        let started_at = Instant::now();
        let payload = encode_snapshot(snapshot)?;
        let request = UpdateRequest {
            message,
            content: BASE64.encode(payload),
            sha: token.as_str(),
            branch: &self.config.branch,
        };

        let response = self
            .client
            .put(self.contents_url())
            .bearer_auth(&self.config.token)
            .header("Accept", "application/vnd.github+json")
            .json(&request)
            .send()
            .await
            .map_err(|err| SyncError::Network(format!("save request failed: {err}")))?;

        let status = response.status();
        if !status.is_success() {
            let error = self.api_error(status, response.text().await.unwrap_or_default());
            if matches!(error, SyncError::Conflict { .. }) {
                warn!(
                    "event=remote_save module=sync status=conflict duration_ms={}",
                    started_at.elapsed().as_millis()
                );
            }
            return Err(error);
        }

        let body: UpdateResponse = response
            .json()
            .await
            .map_err(|err| SyncError::Network(format!("malformed update response: {err}")))?;

        info!(
            "event=remote_save module=sync status=ok items={} duration_ms={}",
            snapshot.items.len(),
            started_at.elapsed().as_millis()
        );
        Ok(VersionToken(body.content.sha))
    }

    /// Poll interval configured for background refreshes.
    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.config.poll_interval_secs)
    }

    fn contents_url(&self) -> String {
        let path = self
            .config
            .path
            .split('/')
            .map(|segment| urlencoding::encode(segment).into_owned())
            .collect::<Vec<_>>()
            .join("/");
        format!(
            "{}/repos/{}/{}/contents/{}",
            self.config.api_base_url.trim_end_matches('/'),
            urlencoding::encode(&self.config.owner),
            urlencoding::encode(&self.config.repo),
            path
        )
    }

    fn api_error(&self, status: StatusCode, detail: String) -> SyncError {
        match status {
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => SyncError::Auth(detail),
            StatusCode::NOT_FOUND => SyncError::NotFound(self.config.path.clone()),
            StatusCode::CONFLICT | StatusCode::PRECONDITION_FAILED => SyncError::Conflict {
                status: status.as_u16(),
            },
            other => SyncError::Api {
                status: other.as_u16(),
                detail,
            },
        }
    }
}

// The API wraps file bytes in line-broken base64.
fn unwrap_transport_encoding(content: &str) -> SyncResult<String> {
    let compact: String = content.chars().filter(|c| !c.is_whitespace()).collect();
    let bytes = BASE64
        .decode(compact)
        .map_err(|err| SyncError::Encoding(format!("invalid base64 content: {err}")))?;
    String::from_utf8(bytes).map_err(|err| SyncError::Encoding(format!("non-UTF-8 content: {err}")))
}
