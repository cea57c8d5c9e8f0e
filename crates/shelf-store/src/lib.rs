// SPDX-License-Identifier: Apache-2.0

#![forbid(unsafe_code)]

use shelf_model::{RemoteFileId, WebLink};
use std::fmt::{Display, Formatter};

pub const CRATE_NAME: &str = "shelf-store";

mod drive;
mod local;

pub use drive::{DriveStore, RetryPolicy};
pub use local::LocalFsStore;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[non_exhaustive]
pub enum StoreErrorCode {
    Network,
    NotFound,
    Auth,
    Validation,
    Io,
    Internal,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreError {
    pub code: StoreErrorCode,
    pub message: String,
}

impl StoreError {
    #[must_use]
    pub fn new(code: StoreErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }
}

impl Display for StoreError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:?}: {}", self.code, self.message)
    }
}

impl std::error::Error for StoreError {}

/// File bytes live behind this seam; the catalog database only ever sees the
/// returned id and link. Implementations are blocking; async callers bridge
/// with `spawn_blocking`.
pub trait ObjectStore: Send + Sync {
    fn upload(&self, file_name: &str, bytes: &[u8]) -> Result<RemoteFileId, StoreError>;
    fn web_link(&self, id: &RemoteFileId) -> Result<WebLink, StoreError>;
    fn delete(&self, id: &RemoteFileId) -> Result<(), StoreError>;
}

pub(crate) fn validate_upload(file_name: &str, bytes: &[u8]) -> Result<(), StoreError> {
    if file_name.trim().is_empty() {
        return Err(StoreError::new(
            StoreErrorCode::Validation,
            "upload file name must not be empty",
        ));
    }
    if bytes.is_empty() {
        return Err(StoreError::new(
            StoreErrorCode::Validation,
            "upload body must not be empty",
        ));
    }
    Ok(())
}
