//! services/api/src/bin/api.rs

use api_lib::{
    adapters::{DbAdapter, HttpGenerationAdapter, HttpRasterizerAdapter, HttpStorageAdapter},
    config::Config,
    error::ApiError,
    web::{
        create_document_handler, delete_document_handler, export_document_handler,
        get_document_handler, rest::ApiDoc, state::AppState, update_document_handler,
        upload_image_handler, ws_handler,
    },
};
use axum::{
    extract::DefaultBodyLimit,
    http::{
        header::{ACCEPT, AUTHORIZATION, CONTENT_TYPE},
        HeaderValue, Method,
    },
    routing::{get, post},
    Router,
};
use sqlx::postgres::PgPoolOptions;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

#[tokio::main]
async fn main() -> Result<(), ApiError> {
    // --- 1. Load Configuration & Set Up Logging ---
    let config = Arc::new(Config::from_env()?);
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(config.log_level.to_string()))
        .with(tracing_subscriber::fmt::layer())
        .init();
    info!("Configuration loaded. Starting server...");

    // --- 2. Connect to Database & Run Migrations ---
    info!("Connecting to database...");
    let db_pool = PgPoolOptions::new()
        .max_connections(5)
        .connect(&config.database_url)
        .await?;
    let db_adapter = Arc::new(DbAdapter::new(db_pool.clone()));
    info!("Running database migrations...");
    db_adapter.run_migrations().await?;
    info!("Database migrations complete.");

    // --- 3. Initialize Collaborator Adapters ---
    let http_client = reqwest::Client::new();

    let generation_adapter = Arc::new(HttpGenerationAdapter::new(
        http_client.clone(),
        config.generation_base_url.clone(),
        config.generation_api_key.clone(),
        config.generation_model.clone(),
    ));
    let storage_adapter = Arc::new(HttpStorageAdapter::new(
        http_client.clone(),
        config.storage_base_url.clone(),
    ));
    let rasterizer_adapter = Arc::new(HttpRasterizerAdapter::new(
        http_client,
        config.renderer_base_url.clone(),
    ));

    // --- 4. Build the Shared AppState ---
    let app_state = Arc::new(AppState {
        store: db_adapter,
        config: config.clone(),
        generation: generation_adapter,
        storage: storage_adapter,
        rasterizer: rasterizer_adapter,
    });

    let cors = CorsLayer::new()
        .allow_origin(
            config
                .cors_origin
                .parse::<HeaderValue>()
                .map_err(|e| ApiError::Internal(format!("Invalid CORS_ORIGIN: {}", e)))?,
        )
        .allow_credentials(true)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PATCH,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([AUTHORIZATION, CONTENT_TYPE, ACCEPT]);

    // --- 5. Create the Web Router ---
    let api_router = Router::new()
        .route("/documents", post(create_document_handler))
        .route(
            "/documents/{id}",
            get(get_document_handler)
                .patch(update_document_handler)
                .delete(delete_document_handler),
        )
        .route("/documents/{id}/export", post(export_document_handler))
        .route("/images", post(upload_image_handler))
        .route("/ws", get(ws_handler))
        .layer(DefaultBodyLimit::max(10 * 1024 * 1024))
        .layer(cors)
        .with_state(app_state);

    // Merge the API router with the Swagger UI router for a complete application.
    let app = Router::new()
        .merge(api_router)
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()));

    // --- 6. Start the Server ---
    info!("Starting server on {}", config.bind_address);
    info!(
        "Swagger UI available at http://{}/swagger-ui",
        config.bind_address
    );
    let listener = tokio::net::TcpListener::bind(&config.bind_address).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
