//! services/api/src/adapters/db.rs
//!
//! This module contains the database adapter, which is the concrete implementation
//! of the `DocumentStore` port from the `core` crate. It handles all interactions
//! with the PostgreSQL database using `sqlx`.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use draftsmith_core::domain::{Document, DocumentPatch, DocumentStyling};
use draftsmith_core::ports::{DocumentStore, PortError, PortResult};
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

//=========================================================================================
// The Main Adapter Struct
//=========================================================================================

/// A database adapter that implements the `DocumentStore` port.
#[derive(Clone)]
pub struct DbAdapter {
    pool: PgPool,
}

impl DbAdapter {
    /// Creates a new `DbAdapter`.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// A helper function to run database migrations at startup.
    pub async fn run_migrations(&self) -> Result<(), sqlx::Error> {
        sqlx::migrate!("./migrations").run(&self.pool).await?;
        Ok(())
    }
}

//=========================================================================================
// "Impure" Database Record Structs
//=========================================================================================

#[derive(FromRow)]
struct DocumentRecord {
    id: Uuid,
    title: String,
    body: serde_json::Value,
    styling: serde_json::Value,
    is_public: bool,
    access_secret: Option<String>,
    view_count: i64,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl DocumentRecord {
    fn to_domain(self) -> PortResult<Document> {
        let styling: DocumentStyling = serde_json::from_value(self.styling)
            .map_err(|e| PortError::Unexpected(format!("Corrupt styling column: {}", e)))?;
        Ok(Document {
            id: self.id,
            title: self.title,
            body: self.body,
            styling,
            is_public: self.is_public,
            access_secret: self.access_secret,
            view_count: self.view_count,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

const DOCUMENT_COLUMNS: &str =
    "id, title, body, styling, is_public, access_secret, view_count, created_at, updated_at";

//=========================================================================================
// `DocumentStore` Trait Implementation
//=========================================================================================

#[async_trait]
impl DocumentStore for DbAdapter {
    async fn create_document(
        &self,
        title: &str,
        body: &serde_json::Value,
        styling: &DocumentStyling,
    ) -> PortResult<Document> {
        let styling_json = serde_json::to_value(styling)
            .map_err(|e| PortError::Unexpected(e.to_string()))?;

        let record = sqlx::query_as::<_, DocumentRecord>(&format!(
            "INSERT INTO documents (id, title, body, styling) VALUES ($1, $2, $3, $4) \
             RETURNING {}",
            DOCUMENT_COLUMNS
        ))
        .bind(Uuid::new_v4())
        .bind(title)
        .bind(body)
        .bind(styling_json)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| PortError::Unexpected(e.to_string()))?;

        record.to_domain()
    }

    async fn get_document(&self, document_id: Uuid) -> PortResult<Document> {
        let record = sqlx::query_as::<_, DocumentRecord>(&format!(
            "SELECT {} FROM documents WHERE id = $1",
            DOCUMENT_COLUMNS
        ))
        .bind(document_id)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| match e {
            sqlx::Error::RowNotFound => {
                PortError::NotFound(format!("Document {} not found", document_id))
            }
            _ => PortError::Unexpected(e.to_string()),
        })?;

        record.to_domain()
    }

    async fn update_document(
        &self,
        document_id: Uuid,
        patch: DocumentPatch,
    ) -> PortResult<Document> {
        if patch.is_empty() {
            return self.get_document(document_id).await;
        }

        let styling_json = match &patch.styling {
            Some(styling) => Some(
                serde_json::to_value(styling)
                    .map_err(|e| PortError::Unexpected(e.to_string()))?,
            ),
            None => None,
        };

        let record = sqlx::query_as::<_, DocumentRecord>(&format!(
            "UPDATE documents SET \
                 title = COALESCE($2, title), \
                 body = COALESCE($3, body), \
                 styling = COALESCE($4, styling), \
                 is_public = COALESCE($5, is_public), \
                 access_secret = COALESCE($6, access_secret), \
                 updated_at = now() \
             WHERE id = $1 RETURNING {}",
            DOCUMENT_COLUMNS
        ))
        .bind(document_id)
        .bind(patch.title)
        .bind(patch.body)
        .bind(styling_json)
        .bind(patch.is_public)
        .bind(patch.access_secret)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| match e {
            sqlx::Error::RowNotFound => {
                PortError::NotFound(format!("Document {} not found", document_id))
            }
            _ => PortError::Unexpected(e.to_string()),
        })?;

        record.to_domain()
    }

    async fn delete_document(&self, document_id: Uuid) -> PortResult<()> {
        let result = sqlx::query("DELETE FROM documents WHERE id = $1")
            .bind(document_id)
            .execute(&self.pool)
            .await
            .map_err(|e| PortError::Unexpected(e.to_string()))?;

        if result.rows_affected() == 0 {
            return Err(PortError::NotFound(format!(
                "Document {} not found",
                document_id
            )));
        }
        Ok(())
    }
}
