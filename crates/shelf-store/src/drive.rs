// SPDX-License-Identifier: Apache-2.0

use crate::{validate_upload, ObjectStore, StoreError, StoreErrorCode};
use reqwest::blocking::Client;
use serde::Deserialize;
use shelf_model::{RemoteFileId, WebLink};
use std::thread;
use std::time::Duration;

/// Retry schedule for Drive calls: backoff grows linearly per attempt and is
/// capped so a slow store never stalls an upload for long.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: usize,
    pub base_backoff_ms: u64,
    pub max_backoff_ms: u64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 4,
            base_backoff_ms: 120,
            max_backoff_ms: 2_000,
        }
    }
}

impl RetryPolicy {
    fn delay_for_attempt(&self, attempt: usize) -> Duration {
        let ms = self
            .base_backoff_ms
            .saturating_mul(attempt as u64)
            .min(self.max_backoff_ms);
        Duration::from_millis(ms)
    }
}

/// Drive v3 style HTTP backend. Metadata and bytes go up in a single
/// multipart/related request; the local catalog keeps only the returned id
/// and webViewLink.
pub struct DriveStore {
    pub endpoint: String,
    pub upload_endpoint: String,
    pub parent_folder_id: Option<String>,
    pub bearer_token: Option<String>,
    pub retry: RetryPolicy,
    client: Client,
}

#[derive(Debug, Deserialize)]
struct UploadedFile {
    id: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct FileLink {
    web_view_link: Option<String>,
}

impl DriveStore {
    #[must_use]
    pub fn new(endpoint: String, upload_endpoint: String) -> Self {
        Self {
            endpoint: endpoint.trim_end_matches('/').to_string(),
            upload_endpoint: upload_endpoint.trim_end_matches('/').to_string(),
            parent_folder_id: None,
            bearer_token: None,
            retry: RetryPolicy::default(),
            client: Client::new(),
        }
    }

    #[must_use]
    pub fn with_parent_folder(mut self, folder_id: Option<String>) -> Self {
        self.parent_folder_id = folder_id.filter(|x| !x.is_empty());
        self
    }

    #[must_use]
    pub fn with_bearer_token(mut self, token: Option<String>) -> Self {
        self.bearer_token = token.filter(|x| !x.is_empty());
        self
    }

    #[must_use]
    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    fn metadata_json(&self, file_name: &str) -> Result<String, StoreError> {
        let metadata = match &self.parent_folder_id {
            Some(folder) => serde_json::json!({"name": file_name, "parents": [folder]}),
            None => serde_json::json!({"name": file_name}),
        };
        serde_json::to_string(&metadata)
            .map_err(|e| StoreError::new(StoreErrorCode::Internal, e.to_string()))
    }

    fn multipart_related_body(metadata: &str, bytes: &[u8], boundary: &str) -> Vec<u8> {
        let mut body = Vec::with_capacity(metadata.len() + bytes.len() + 256);
        body.extend_from_slice(
            format!(
                "--{boundary}\r\nContent-Type: application/json; charset=UTF-8\r\n\r\n{metadata}\r\n"
            )
            .as_bytes(),
        );
        body.extend_from_slice(
            format!("--{boundary}\r\nContent-Type: application/octet-stream\r\n\r\n").as_bytes(),
        );
        body.extend_from_slice(bytes);
        body.extend_from_slice(format!("\r\n--{boundary}--\r\n").as_bytes());
        body
    }

    fn send_with_retry(
        &self,
        build: impl Fn() -> reqwest::blocking::RequestBuilder,
    ) -> Result<reqwest::blocking::Response, StoreError> {
        let mut attempt = 0usize;
        loop {
            let mut req = build();
            if let Some(token) = &self.bearer_token {
                req = req.bearer_auth(token);
            }
            match req.send() {
                Ok(resp) => {
                    let status = resp.status();
                    if status.is_success() {
                        return Ok(resp);
                    }
                    if status.as_u16() == 401 || status.as_u16() == 403 {
                        return Err(StoreError::new(
                            StoreErrorCode::Auth,
                            format!("store rejected credentials: {status}"),
                        ));
                    }
                    if status.as_u16() == 404 {
                        return Err(StoreError::new(
                            StoreErrorCode::NotFound,
                            "object not found",
                        ));
                    }
                    if attempt + 1 >= self.retry.max_attempts {
                        return Err(StoreError::new(
                            StoreErrorCode::Network,
                            format!("store request failed: {status}"),
                        ));
                    }
                }
                Err(err) => {
                    if attempt + 1 >= self.retry.max_attempts {
                        return Err(StoreError::new(StoreErrorCode::Network, err.to_string()));
                    }
                }
            }
            attempt += 1;
            thread::sleep(self.retry.delay_for_attempt(attempt));
        }
    }
}

impl ObjectStore for DriveStore {
    fn upload(&self, file_name: &str, bytes: &[u8]) -> Result<RemoteFileId, StoreError> {
        validate_upload(file_name, bytes)?;
        let metadata = self.metadata_json(file_name)?;
        // Boundary derived from the payload so file bytes cannot collide with it.
        let boundary = format!(
            "shelf-{}",
            &shelf_core::sha256_hex(&[file_name.as_bytes(), bytes].concat())[..24]
        );
        let body = Self::multipart_related_body(&metadata, bytes, &boundary);
        let url = format!(
            "{}/files?uploadType=multipart&fields=id",
            self.upload_endpoint
        );

        let resp = self.send_with_retry(|| {
            self.client
                .post(url.as_str())
                .header(
                    reqwest::header::CONTENT_TYPE,
                    format!("multipart/related; boundary={boundary}"),
                )
                .body(body.clone())
        })?;
        let uploaded: UploadedFile = resp
            .json()
            .map_err(|e| StoreError::new(StoreErrorCode::Network, e.to_string()))?;
        RemoteFileId::parse(&uploaded.id)
            .map_err(|e| StoreError::new(StoreErrorCode::Internal, e.to_string()))
    }

    fn web_link(&self, id: &RemoteFileId) -> Result<WebLink, StoreError> {
        let url = format!("{}/files/{}?fields=webViewLink", self.endpoint, id.as_str());
        let resp = self.send_with_retry(|| self.client.get(url.as_str()))?;
        let link: FileLink = resp
            .json()
            .map_err(|e| StoreError::new(StoreErrorCode::Network, e.to_string()))?;
        let raw = link.web_view_link.ok_or_else(|| {
            StoreError::new(
                StoreErrorCode::Internal,
                "store response missing webViewLink",
            )
        })?;
        WebLink::parse(&raw).map_err(|e| StoreError::new(StoreErrorCode::Internal, e.to_string()))
    }

    fn delete(&self, id: &RemoteFileId) -> Result<(), StoreError> {
        let url = format!("{}/files/{}", self.endpoint, id.as_str());
        self.send_with_retry(|| self.client.delete(url.as_str()))?;
        Ok(())
    }
}
