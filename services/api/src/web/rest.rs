//! services/api/src/web/rest.rs
//!
//! Contains the Axum handlers for the REST API endpoints and the master
//! definition for the OpenAPI specification.

use crate::web::state::AppState;
use axum::{
    extract::{Multipart, Path, State},
    http::{header, StatusCode},
    response::{IntoResponse, Json},
};
use chrono::{DateTime, Utc};
use draftsmith_core::{
    domain::{Document, DocumentPatch, DocumentStyling},
    export::{export_surface, ExportError},
    paginate::SplitError,
    ports::PortError,
    surface::Surface,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::error;
use utoipa::{OpenApi, ToSchema};
use uuid::Uuid;

/// Layout width handed to the rasterizer: A4 content width at screen
/// resolution. The export scale multiplies on top of this.
const EXPORT_SURFACE_WIDTH_PX: u32 = 794;

//=========================================================================================
// OpenAPI Master Definition
//=========================================================================================

#[derive(OpenApi)]
#[openapi(
    paths(
        create_document_handler,
        get_document_handler,
        update_document_handler,
        delete_document_handler,
        export_document_handler,
        upload_image_handler,
    ),
    components(
        schemas(CreateDocumentRequest, UpdateDocumentRequest, DocumentResponse, UploadImageResponse)
    ),
    tags(
        (name = "Draftsmith API", description = "API endpoints for AI-assisted document authoring.")
    )
)]
pub struct ApiDoc;

//=========================================================================================
// API Response and Payload Structs
//=========================================================================================

/// The payload for creating a document by hand (generated documents are
/// created by the generation pipeline instead).
#[derive(Deserialize, ToSchema)]
pub struct CreateDocumentRequest {
    title: String,
    #[schema(value_type = Object)]
    body: serde_json::Value,
    #[schema(value_type = Object)]
    styling: Option<DocumentStyling>,
}

/// A partial document update; absent fields are left unchanged.
#[derive(Deserialize, ToSchema)]
pub struct UpdateDocumentRequest {
    title: Option<String>,
    #[schema(value_type = Object)]
    body: Option<serde_json::Value>,
    #[schema(value_type = Object)]
    styling: Option<DocumentStyling>,
    is_public: Option<bool>,
    access_secret: Option<String>,
}

/// A stored document as returned to clients. The access secret never
/// leaves the server.
#[derive(Serialize, ToSchema)]
pub struct DocumentResponse {
    id: Uuid,
    title: String,
    #[schema(value_type = Object)]
    body: serde_json::Value,
    #[schema(value_type = Object)]
    styling: DocumentStyling,
    is_public: bool,
    view_count: i64,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<Document> for DocumentResponse {
    fn from(document: Document) -> Self {
        Self {
            id: document.id,
            title: document.title,
            body: document.body,
            styling: document.styling,
            is_public: document.is_public,
            view_count: document.view_count,
            created_at: document.created_at,
            updated_at: document.updated_at,
        }
    }
}

/// The response payload sent after a successful image upload.
#[derive(Serialize, ToSchema)]
pub struct UploadImageResponse {
    url: String,
}

//=========================================================================================
// Error Mapping Helpers
//=========================================================================================

fn port_error_response(e: PortError) -> (StatusCode, String) {
    match e {
        PortError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
        PortError::Validation(msg) => (StatusCode::BAD_REQUEST, msg),
        PortError::Unexpected(msg) => {
            error!("Port operation failed: {}", msg);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                "An internal error occurred.".to_string(),
            )
        }
    }
}

/// Export failures carry a stage-specific hint rather than a generic
/// message.
fn export_error_response(e: ExportError) -> (StatusCode, String) {
    match &e {
        ExportError::Rasterize(_) => (StatusCode::PAYLOAD_TOO_LARGE, e.to_string()),
        ExportError::Paginate(SplitError::PageCeiling { .. }) => {
            (StatusCode::UNPROCESSABLE_ENTITY, e.to_string())
        }
        ExportError::Paginate(SplitError::ZeroWidth) => {
            (StatusCode::UNPROCESSABLE_ENTITY, e.to_string())
        }
        ExportError::Assemble(_) => {
            error!("PDF assembly failed: {}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Failed to assemble the PDF.".to_string(),
            )
        }
    }
}

//=========================================================================================
// REST API Handlers
//=========================================================================================

/// Create a new document.
#[utoipa::path(
    post,
    path = "/documents",
    request_body = CreateDocumentRequest,
    responses(
        (status = 201, description = "Document created successfully", body = DocumentResponse),
        (status = 400, description = "Bad request (e.g., empty title)"),
        (status = 500, description = "Internal server error")
    )
)]
pub async fn create_document_handler(
    State(app_state): State<Arc<AppState>>,
    Json(payload): Json<CreateDocumentRequest>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    if payload.title.trim().is_empty() {
        return Err((
            StatusCode::BAD_REQUEST,
            "Document title must not be empty.".to_string(),
        ));
    }

    let styling = payload.styling.unwrap_or_default();
    let document = app_state
        .store
        .create_document(&payload.title, &payload.body, &styling)
        .await
        .map_err(port_error_response)?;

    Ok((StatusCode::CREATED, Json(DocumentResponse::from(document))))
}

/// Fetch a document by id.
#[utoipa::path(
    get,
    path = "/documents/{id}",
    responses(
        (status = 200, description = "The document", body = DocumentResponse),
        (status = 404, description = "Document not found")
    ),
    params(
        ("id" = Uuid, Path, description = "The unique ID of the document.")
    )
)]
pub async fn get_document_handler(
    State(app_state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    let document = app_state
        .store
        .get_document(id)
        .await
        .map_err(port_error_response)?;
    Ok(Json(DocumentResponse::from(document)))
}

/// Apply a partial update to a document.
#[utoipa::path(
    patch,
    path = "/documents/{id}",
    request_body = UpdateDocumentRequest,
    responses(
        (status = 200, description = "The updated document", body = DocumentResponse),
        (status = 404, description = "Document not found")
    ),
    params(
        ("id" = Uuid, Path, description = "The unique ID of the document.")
    )
)]
pub async fn update_document_handler(
    State(app_state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateDocumentRequest>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    let patch = DocumentPatch {
        title: payload.title,
        body: payload.body,
        styling: payload.styling,
        is_public: payload.is_public,
        access_secret: payload.access_secret,
    };

    let document = app_state
        .store
        .update_document(id, patch)
        .await
        .map_err(port_error_response)?;
    Ok(Json(DocumentResponse::from(document)))
}

/// Delete a document.
#[utoipa::path(
    delete,
    path = "/documents/{id}",
    responses(
        (status = 204, description = "Document deleted"),
        (status = 404, description = "Document not found")
    ),
    params(
        ("id" = Uuid, Path, description = "The unique ID of the document.")
    )
)]
pub async fn delete_document_handler(
    State(app_state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    app_state
        .store
        .delete_document(id)
        .await
        .map_err(port_error_response)?;
    Ok(StatusCode::NO_CONTENT)
}

/// Export a document as a paginated A4 PDF.
///
/// The document itself is never mutated: the export works on a disposable,
/// style-normalized clone of the document's surface.
#[utoipa::path(
    post,
    path = "/documents/{id}/export",
    responses(
        (status = 200, description = "The exported PDF", body = Vec<u8>, content_type = "application/pdf"),
        (status = 404, description = "Document not found"),
        (status = 413, description = "Document too large to rasterize"),
        (status = 422, description = "Document exceeds the export page limit")
    ),
    params(
        ("id" = Uuid, Path, description = "The unique ID of the document.")
    )
)]
pub async fn export_document_handler(
    State(app_state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    let document = app_state
        .store
        .get_document(id)
        .await
        .map_err(port_error_response)?;

    let surface = Surface::from_document(&document, EXPORT_SURFACE_WIDTH_PX)
        .map_err(port_error_response)?;

    let artifact = export_surface(
        &surface,
        app_state.rasterizer.as_ref(),
        app_state.config.export_scale,
    )
    .await
    .map_err(export_error_response)?;

    Ok((
        [(header::CONTENT_TYPE, "application/pdf")],
        artifact.bytes,
    ))
}

/// Upload an image for insertion into a document.
///
/// Accepts a multipart/form-data request with a single file part and
/// returns the public URL of the stored object.
#[utoipa::path(
    post,
    path = "/images",
    request_body(content_type = "multipart/form-data", description = "The image to upload."),
    responses(
        (status = 201, description = "Image stored", body = UploadImageResponse),
        (status = 400, description = "Bad request (e.g., missing file)"),
        (status = 500, description = "Internal server error")
    )
)]
pub async fn upload_image_handler(
    State(app_state): State<Arc<AppState>>,
    mut multipart: Multipart,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    let (content_type, data) = if let Some(field) = multipart.next_field().await.map_err(|e| {
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            format!("Failed to read multipart data: {}", e),
        )
    })? {
        let content_type = field
            .content_type()
            .unwrap_or("application/octet-stream")
            .to_string();
        let data = field.bytes().await.map_err(|e| {
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                format!("Failed to read file bytes: {}", e),
            )
        })?;
        (content_type, data)
    } else {
        return Err((
            StatusCode::BAD_REQUEST,
            "Multipart form must include a file".to_string(),
        ));
    };

    if data.is_empty() {
        return Err((
            StatusCode::BAD_REQUEST,
            "Uploaded file must not be empty".to_string(),
        ));
    }

    let url = app_state
        .storage
        .put(&data, &content_type)
        .await
        .map_err(port_error_response)?;

    Ok((StatusCode::CREATED, Json(UploadImageResponse { url })))
}
