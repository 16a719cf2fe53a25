//! Store error types and the object-store capability consumed by the core.
//!
//! The trait abstracts away the actual persistence and transport, allowing
//! the controller and scheduler to work with domain objects instead of a
//! concrete client.

use async_trait::async_trait;
use thiserror::Error;

use crate::api::{ImageStream, ImageStreamImport};

/// Errors that can occur during store operations.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Resource not found. Terminal for scheduling: the backing object is
    /// gone and its entry must be dropped.
    #[error("not found: {0}")]
    NotFound(String),

    /// Store or registry unreachable; the work is retried on the next pass.
    #[error("unavailable: {0}")]
    Unavailable(String),

    /// Internal error.
    #[error("internal: {0}")]
    Internal(String),
}

impl StoreError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, StoreError::NotFound(_))
    }
}

/// Result type for store operations.
pub type Result<T> = std::result::Result<T, StoreError>;

/// Read/create operations on image streams and import requests.
///
/// Created import requests are picked up and completed by an external import
/// pipeline; this core only cares whether the create call itself succeeded.
#[async_trait]
pub trait ImageStreamStore: Send + Sync {
    /// Fetch an image stream by identity.
    async fn get_image_stream(&self, namespace: &str, name: &str) -> Result<ImageStream>;

    /// Create a one-shot import request.
    async fn create_import(&self, import: ImageStreamImport) -> Result<ImageStreamImport>;
}
