//! services/api/src/adapters/storage.rs
//!
//! This module contains the adapter for the object storage collaborator.
//! It implements the `ObjectStorage` port from the `core` crate.

use async_trait::async_trait;
use draftsmith_core::ports::{ObjectStorage, PortError, PortResult};
use serde::Deserialize;

//=========================================================================================
// The Main Adapter Struct
//=========================================================================================

/// An adapter that implements the `ObjectStorage` port against a simple
/// request/response blob store.
#[derive(Clone)]
pub struct HttpStorageAdapter {
    client: reqwest::Client,
    base_url: String,
}

impl HttpStorageAdapter {
    /// Creates a new `HttpStorageAdapter`.
    pub fn new(client: reqwest::Client, base_url: String) -> Self {
        Self { client, base_url }
    }
}

/// The store's response payload for a stored object.
#[derive(Deserialize)]
struct PutResponse {
    url: String,
}

//=========================================================================================
// `ObjectStorage` Trait Implementation
//=========================================================================================

#[async_trait]
impl ObjectStorage for HttpStorageAdapter {
    /// Stores a blob and returns its public URL.
    async fn put(&self, bytes: &[u8], content_type: &str) -> PortResult<String> {
        let response = self
            .client
            .post(format!("{}/objects", self.base_url))
            .header(reqwest::header::CONTENT_TYPE, content_type)
            .body(bytes.to_vec())
            .send()
            .await
            .map_err(|e| PortError::Unexpected(format!("Object upload failed: {}", e)))?
            .error_for_status()
            .map_err(|e| PortError::Unexpected(format!("Object upload rejected: {}", e)))?;

        let payload: PutResponse = response
            .json()
            .await
            .map_err(|e| PortError::Unexpected(format!("Invalid storage response: {}", e)))?;
        Ok(payload.url)
    }
}
