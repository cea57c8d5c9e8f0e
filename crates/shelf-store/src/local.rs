// SPDX-License-Identifier: Apache-2.0

use crate::{validate_upload, ObjectStore, StoreError, StoreErrorCode};
use shelf_model::{RemoteFileId, WebLink};
use std::fs;
use std::path::PathBuf;

/// Filesystem backend for development and tests. The id embeds a content
/// hash so repeated uploads of identical payloads are stable.
pub struct LocalFsStore {
    pub root: PathBuf,
}

impl LocalFsStore {
    #[must_use]
    pub fn new(root: PathBuf) -> Self {
        Self { root }
    }

    fn object_path(&self, id: &RemoteFileId) -> PathBuf {
        self.root.join(id.as_str())
    }

    fn sanitize_name(name: &str) -> String {
        name.chars()
            .map(|c| {
                if c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-') {
                    c
                } else {
                    '_'
                }
            })
            .collect()
    }
}

impl ObjectStore for LocalFsStore {
    fn upload(&self, file_name: &str, bytes: &[u8]) -> Result<RemoteFileId, StoreError> {
        validate_upload(file_name, bytes)?;
        let digest = shelf_core::sha256_hex(&[file_name.as_bytes(), bytes].concat());
        let id = RemoteFileId::parse(&format!(
            "{}-{}",
            &digest[..16],
            Self::sanitize_name(file_name)
        ))
        .map_err(|e| StoreError::new(StoreErrorCode::Internal, e.to_string()))?;

        fs::create_dir_all(&self.root)
            .map_err(|e| StoreError::new(StoreErrorCode::Io, e.to_string()))?;
        fs::write(self.object_path(&id), bytes)
            .map_err(|e| StoreError::new(StoreErrorCode::Io, e.to_string()))?;
        Ok(id)
    }

    fn web_link(&self, id: &RemoteFileId) -> Result<WebLink, StoreError> {
        let path = self.object_path(id);
        if !path.exists() {
            return Err(StoreError::new(
                StoreErrorCode::NotFound,
                "object not found",
            ));
        }
        WebLink::parse(&format!("file://{}", path.display()))
            .map_err(|e| StoreError::new(StoreErrorCode::Internal, e.to_string()))
    }

    fn delete(&self, id: &RemoteFileId) -> Result<(), StoreError> {
        let path = self.object_path(id);
        if !path.exists() {
            return Err(StoreError::new(
                StoreErrorCode::NotFound,
                "object not found",
            ));
        }
        fs::remove_file(path).map_err(|e| StoreError::new(StoreErrorCode::Io, e.to_string()))
    }
}
