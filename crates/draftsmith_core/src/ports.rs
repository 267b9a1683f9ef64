//! crates/draftsmith_core/src/ports.rs
//!
//! Defines the service contracts (traits) for the application's core logic.
//! These traits form the boundary of the hexagonal architecture, allowing the core
//! to be independent of specific external implementations like databases or APIs.

use crate::domain::{Document, DocumentPatch, DocumentStyling, GenerationRequest, StreamEvent};
use crate::surface::Surface;
use async_trait::async_trait;
use futures::Stream;
use image::RgbaImage;
use std::pin::Pin;
use uuid::Uuid;

//=========================================================================================
// Generic Port Error and Result Types
//=========================================================================================

/// A generic error type for all port operations.
/// This abstracts away the specific errors from external services (e.g., database, network).
#[derive(Debug, thiserror::Error)]
pub enum PortError {
    #[error("Item not found: {0}")]
    NotFound(String),
    #[error("Invalid input: {0}")]
    Validation(String),
    #[error("An unexpected error occurred: {0}")]
    Unexpected(String),
}

/// A convenience type alias for `Result<T, PortError>`.
pub type PortResult<T> = Result<T, PortError>;

/// The decoded generation stream handed back by the backend port. Items are
/// folded strictly in arrival order; an `Err` item is a transport failure
/// and terminates the stream.
pub type EventStream = Pin<Box<dyn Stream<Item = PortResult<StreamEvent>> + Send>>;

//=========================================================================================
// Service Ports (Traits)
//=========================================================================================

#[async_trait]
pub trait DocumentStore: Send + Sync {
    async fn create_document(
        &self,
        title: &str,
        body: &serde_json::Value,
        styling: &DocumentStyling,
    ) -> PortResult<Document>;

    async fn get_document(&self, document_id: Uuid) -> PortResult<Document>;

    async fn update_document(
        &self,
        document_id: Uuid,
        patch: DocumentPatch,
    ) -> PortResult<Document>;

    async fn delete_document(&self, document_id: Uuid) -> PortResult<()>;
}

#[async_trait]
pub trait GenerationBackend: Send + Sync {
    /// Opens a generation stream for the given request. The returned stream
    /// is lazy, finite and non-restartable; dropping it releases the
    /// underlying connection.
    async fn start_generation(&self, request: &GenerationRequest) -> PortResult<EventStream>;
}

#[async_trait]
pub trait ObjectStorage: Send + Sync {
    /// Stores a blob and returns its public URL.
    async fn put(&self, bytes: &[u8], content_type: &str) -> PortResult<String>;
}

#[async_trait]
pub trait SurfaceRasterizer: Send + Sync {
    /// Renders a surface off-screen into a raster at the given
    /// device-independent scale factor.
    async fn rasterize(&self, surface: &Surface, scale: f32) -> PortResult<RgbaImage>;
}
