//! Async client for the analysis service.
//!
//! Endpoints take the bearer token per call; the listing endpoints are
//! public and the per-user ones require it.

use motionlab_protocol::{ApiErrorBody, FileRecord, ProcessResponse, ResultFolder, VideoRecord};
use motionlab_transfer::{BatchMetadata, Payload};
use reqwest::header::CONTENT_TYPE;
use reqwest::multipart::{Form, Part};
use reqwest::{Response, Url};
use serde::de::DeserializeOwned;
use tracing::debug;

use crate::error::ApiError;

/// Longest error body carried into [`ApiError::Status`] when it is not JSON.
const MAX_DETAIL_LEN: usize = 200;

/// A local file ready to be attached to a processing request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadFile {
    pub name: String,
    pub data: Vec<u8>,
}

/// Analysis service API client.
#[derive(Debug, Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    base: Url,
}

impl ApiClient {
    /// Creates a client for the service rooted at `base_url`.
    pub fn new(base_url: &str) -> Result<Self, ApiError> {
        let http = reqwest::Client::builder()
            .user_agent(concat!("motionlab/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Self::with_http_client(base_url, http)
    }

    /// Creates a client reusing an existing `reqwest::Client`.
    pub fn with_http_client(base_url: &str, http: reqwest::Client) -> Result<Self, ApiError> {
        let base = Url::parse(base_url).map_err(|e| ApiError::Url(format!("{base_url}: {e}")))?;
        if !matches!(base.scheme(), "http" | "https") || base.cannot_be_a_base() {
            return Err(ApiError::Url(format!("{base_url}: not an http(s) URL")));
        }
        Ok(Self { http, base })
    }

    pub fn base_url(&self) -> &str {
        self.base.as_str()
    }

    /// Lists the result groups.
    pub async fn list_groups(&self) -> Result<Vec<String>, ApiError> {
        self.get_json(&["groups"], true, None).await
    }

    /// Lists the subfolders of a group.
    pub async fn list_group(&self, group: &str) -> Result<Vec<String>, ApiError> {
        self.get_json(&["groups", group], true, None).await
    }

    /// Lists the result files of one folder of a group.
    pub async fn list_files(
        &self,
        group: &str,
        folder: ResultFolder,
    ) -> Result<Vec<FileRecord>, ApiError> {
        self.get_json(&["groups", group, folder.as_str()], true, None)
            .await
    }

    /// Lists the videos uploaded by the current user.
    pub async fn list_videos(&self, bearer: &str) -> Result<Vec<VideoRecord>, ApiError> {
        self.get_json(&["videoFiles"], true, Some(bearer)).await
    }

    /// Downloads one result file.
    pub async fn fetch_file(&self, id: &str, bearer: Option<&str>) -> Result<Payload, ApiError> {
        let resp = self.get(&["files", id], false, bearer).await?;
        read_payload(resp).await
    }

    /// Downloads the stream of one of the user's videos.
    pub async fn stream_video(&self, id: &str, bearer: &str) -> Result<Payload, ApiError> {
        let resp = self.get(&["stream_video", id], false, Some(bearer)).await?;
        read_payload(resp).await
    }

    /// Posts one batch of files to the processing endpoint.
    ///
    /// Each file becomes a `files` part; `mode` and `group` are sent as text
    /// fields when set.
    pub async fn process_batch(
        &self,
        files: Vec<UploadFile>,
        metadata: &BatchMetadata,
        bearer: Option<&str>,
    ) -> Result<ProcessResponse, ApiError> {
        let count = files.len();
        let mut form = Form::new();
        for file in files {
            let mime = guess_mime(&file.name);
            let part = Part::bytes(file.data).file_name(file.name).mime_str(mime)?;
            form = form.part("files", part);
        }
        if let Some(mode) = metadata.analysis {
            form = form.text("mode", mode.as_str());
        }
        if let Some(group) = &metadata.group {
            form = form.text("group", group.clone());
        }

        debug!(files = count, group = ?metadata.group, "posting batch for processing");
        let url = self.url(&["signProcessDB"], true)?;
        let mut req = self.http.post(url).multipart(form);
        if let Some(token) = bearer {
            req = req.bearer_auth(token);
        }
        let resp = check_status(req.send().await?).await?;
        let body = resp.bytes().await?;
        if body.iter().all(u8::is_ascii_whitespace) {
            return Ok(ProcessResponse::default());
        }
        Ok(serde_json::from_slice(&body)?)
    }

    fn url(&self, segments: &[&str], trailing_slash: bool) -> Result<Url, ApiError> {
        let mut url = self.base.clone();
        {
            let mut path = url
                .path_segments_mut()
                .map_err(|_| ApiError::Url(self.base.to_string()))?;
            path.pop_if_empty().extend(segments);
            if trailing_slash {
                path.push("");
            }
        }
        Ok(url)
    }

    async fn get(
        &self,
        segments: &[&str],
        trailing_slash: bool,
        bearer: Option<&str>,
    ) -> Result<Response, ApiError> {
        let url = self.url(segments, trailing_slash)?;
        debug!(%url, "GET");
        let mut req = self.http.get(url);
        if let Some(token) = bearer {
            req = req.bearer_auth(token);
        }
        check_status(req.send().await?).await
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        segments: &[&str],
        trailing_slash: bool,
        bearer: Option<&str>,
    ) -> Result<T, ApiError> {
        let body = self
            .get(segments, trailing_slash, bearer)
            .await?
            .bytes()
            .await?;
        Ok(serde_json::from_slice(&body)?)
    }
}

/// Maps non-success responses to [`ApiError::Status`].
async fn check_status(resp: Response) -> Result<Response, ApiError> {
    let status = resp.status();
    if status.is_success() {
        return Ok(resp);
    }
    let body = resp.text().await.unwrap_or_default();
    let detail = serde_json::from_str::<ApiErrorBody>(&body)
        .ok()
        .and_then(|b| b.message())
        .or_else(|| {
            let text = body.trim();
            (!text.is_empty()).then(|| text.chars().take(MAX_DETAIL_LEN).collect())
        })
        .unwrap_or_else(|| status.canonical_reason().unwrap_or("request failed").to_string());
    Err(ApiError::Status {
        status: status.as_u16(),
        detail,
    })
}

async fn read_payload(resp: Response) -> Result<Payload, ApiError> {
    let content_type = resp
        .headers()
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);
    let data = resp.bytes().await?.to_vec();
    Ok(Payload { data, content_type })
}

fn guess_mime(name: &str) -> &'static str {
    let ext = name.rsplit_once('.').map(|(_, ext)| ext.to_ascii_lowercase());
    match ext.as_deref() {
        Some("mp4") => "video/mp4",
        Some("mov") => "video/quicktime",
        Some("avi") => "video/x-msvideo",
        Some("webm") => "video/webm",
        Some("json") => "application/json",
        _ => "application/octet-stream",
    }
}
