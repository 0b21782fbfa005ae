//! Google Drive REST client scoped to the hidden `appDataFolder` space.

use std::fmt;

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde::Deserialize;

use super::{FileQuery, RemoteError, RemoteFile, RemoteResult, RemoteStore};
use crate::util::{compact_text, is_http_url, normalize_text_option};

/// Production Drive API host
pub const DRIVE_API_BASE_URL: &str = "https://www.googleapis.com";

pub(super) const FOLDER_MIME_TYPE: &str = "application/vnd.google-apps.folder";
const APP_DATA_SPACE: &str = "appDataFolder";
const FILE_FIELDS: &str = "id,name,mimeType,parents";
const JSON_MIME_TYPE: &str = "application/json";

#[derive(Clone)]
pub struct GoogleDriveClient {
    base_url: String,
    access_token: Option<String>,
    client: Client,
}

impl fmt::Debug for GoogleDriveClient {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter
            .debug_struct("GoogleDriveClient")
            .field("base_url", &self.base_url)
            .field(
                "access_token",
                &self.access_token.as_ref().map(|_| "[REDACTED]"),
            )
            .finish_non_exhaustive()
    }
}

impl GoogleDriveClient {
    /// Create a client for `base_url`. A missing or blank token leaves the client signed out.
    pub fn new(base_url: impl Into<String>, access_token: Option<String>) -> RemoteResult<Self> {
        let base_url = base_url.into().trim().trim_end_matches('/').to_string();
        if !is_http_url(&base_url) {
            return Err(RemoteError::Api(format!(
                "Drive base URL must include http:// or https://: {base_url}"
            )));
        }

        Ok(Self {
            base_url,
            access_token: normalize_text_option(access_token),
            client: Client::builder().build()?,
        })
    }

    fn authorized(&self, request: RequestBuilder) -> RemoteResult<RequestBuilder> {
        let token = self
            .access_token
            .as_deref()
            .ok_or(RemoteError::NotAuthenticated)?;
        Ok(request.bearer_auth(token))
    }

    fn files_url(&self) -> String {
        format!("{}/drive/v3/files", self.base_url)
    }

    fn upload_url(&self) -> String {
        format!("{}/upload/drive/v3/files", self.base_url)
    }
}

#[derive(Debug, Deserialize)]
struct DriveFileList {
    #[serde(default)]
    files: Vec<DriveFile>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct DriveFile {
    id: String,
    #[serde(default)]
    name: String,
    #[serde(default)]
    mime_type: Option<String>,
    #[serde(default)]
    parents: Vec<String>,
}

impl From<DriveFile> for RemoteFile {
    fn from(file: DriveFile) -> Self {
        let parent = file
            .parents
            .into_iter()
            .next()
            .filter(|parent| parent != APP_DATA_SPACE);
        Self {
            is_folder: file.mime_type.as_deref() == Some(FOLDER_MIME_TYPE),
            id: file.id,
            name: file.name,
            parent,
        }
    }
}

#[derive(Debug, Deserialize)]
struct DriveErrorBody {
    error: Option<DriveErrorDetail>,
}

#[derive(Debug, Deserialize)]
struct DriveErrorDetail {
    message: Option<String>,
}

fn parse_api_error(status: StatusCode, body: &str) -> String {
    if let Ok(payload) = serde_json::from_str::<DriveErrorBody>(body) {
        if let Some(message) = payload.error.and_then(|error| error.message) {
            return format!("{} ({})", message.trim(), status.as_u16());
        }
    }

    let trimmed = compact_text(body);
    if trimmed.is_empty() {
        format!("HTTP {}", status.as_u16())
    } else {
        format!("{} ({})", trimmed, status.as_u16())
    }
}

async fn check_status(response: Response) -> RemoteResult<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    let message = parse_api_error(status, &body);
    if matches!(status, StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN) {
        Err(RemoteError::Unauthorized(message))
    } else if status == StatusCode::NOT_FOUND {
        Err(RemoteError::NotFound(message))
    } else {
        Err(RemoteError::Api(message))
    }
}

async fn parse_file(response: Response) -> RemoteResult<RemoteFile> {
    let body = check_status(response).await?.text().await?;
    let file = serde_json::from_str::<DriveFile>(&body)
        .map_err(|error| RemoteError::InvalidPayload(error.to_string()))?;
    Ok(file.into())
}

#[async_trait]
impl RemoteStore for GoogleDriveClient {
    fn is_authenticated(&self) -> bool {
        self.access_token.is_some()
    }

    async fn list(&self, query: &FileQuery) -> RemoteResult<Vec<RemoteFile>> {
        let q = query.to_drive_query(APP_DATA_SPACE);
        let request = self.client.get(self.files_url()).query(&[
            ("spaces", APP_DATA_SPACE),
            ("q", q.as_str()),
            ("fields", "files(id,name,mimeType,parents)"),
            ("pageSize", "1000"),
        ]);

        let response = self.authorized(request)?.send().await?;
        let body = check_status(response).await?.text().await?;
        let listing = serde_json::from_str::<DriveFileList>(&body)
            .map_err(|error| RemoteError::InvalidPayload(error.to_string()))?;
        Ok(listing.files.into_iter().map(RemoteFile::from).collect())
    }

    async fn create_folder(&self, name: &str) -> RemoteResult<RemoteFile> {
        let metadata = serde_json::json!({
            "name": name,
            "mimeType": FOLDER_MIME_TYPE,
            "parents": [APP_DATA_SPACE],
        });
        let request = self
            .client
            .post(self.files_url())
            .query(&[("fields", FILE_FIELDS)])
            .json(&metadata);

        let folder = parse_file(self.authorized(request)?.send().await?).await?;
        tracing::debug!("Created app folder: {}", folder.id);
        Ok(folder)
    }

    async fn create_file(
        &self,
        folder_id: &str,
        name: &str,
        content: &str,
    ) -> RemoteResult<RemoteFile> {
        let metadata = serde_json::json!({
            "name": name,
            "parents": [folder_id],
        });
        let metadata_part = reqwest::multipart::Part::text(metadata.to_string())
            .mime_str(JSON_MIME_TYPE)?;
        let file_part = reqwest::multipart::Part::text(content.to_string())
            .file_name(name.to_string())
            .mime_str(JSON_MIME_TYPE)?;
        let form = reqwest::multipart::Form::new()
            .part("metadata", metadata_part)
            .part("file", file_part);

        let request = self
            .client
            .post(self.upload_url())
            .query(&[("uploadType", "multipart"), ("fields", FILE_FIELDS)])
            .multipart(form);

        parse_file(self.authorized(request)?.send().await?).await
    }

    async fn update_file(&self, file_id: &str, content: &str) -> RemoteResult<()> {
        let request = self
            .client
            .patch(format!("{}/{file_id}", self.upload_url()))
            .query(&[("uploadType", "media")])
            .header(reqwest::header::CONTENT_TYPE, JSON_MIME_TYPE)
            .body(content.to_string());

        check_status(self.authorized(request)?.send().await?).await?;
        Ok(())
    }

    async fn download(&self, file_id: &str) -> RemoteResult<String> {
        let request = self
            .client
            .get(format!("{}/{file_id}", self.files_url()))
            .query(&[("alt", "media")]);

        let response = check_status(self.authorized(request)?.send().await?).await?;
        Ok(response.text().await?)
    }
}
