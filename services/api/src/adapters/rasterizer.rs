//! services/api/src/adapters/rasterizer.rs
//!
//! This module contains the adapter for the off-screen render collaborator.
//! It implements the `SurfaceRasterizer` port from the `core` crate: the
//! normalized surface tree is posted as JSON and the renderer answers with
//! a PNG of the laid-out document.

use async_trait::async_trait;
use draftsmith_core::ports::{PortError, PortResult, SurfaceRasterizer};
use draftsmith_core::surface::Surface;
use image::RgbaImage;
use serde::Serialize;

//=========================================================================================
// The Main Adapter Struct
//=========================================================================================

/// An adapter that implements the `SurfaceRasterizer` port against an
/// off-screen HTTP renderer.
#[derive(Clone)]
pub struct HttpRasterizerAdapter {
    client: reqwest::Client,
    base_url: String,
}

impl HttpRasterizerAdapter {
    /// Creates a new `HttpRasterizerAdapter`.
    pub fn new(client: reqwest::Client, base_url: String) -> Self {
        Self { client, base_url }
    }
}

#[derive(Serialize)]
struct RasterizeBody<'a> {
    surface: &'a Surface,
    scale: f32,
}

//=========================================================================================
// `SurfaceRasterizer` Trait Implementation
//=========================================================================================

#[async_trait]
impl SurfaceRasterizer for HttpRasterizerAdapter {
    async fn rasterize(&self, surface: &Surface, scale: f32) -> PortResult<RgbaImage> {
        let response = self
            .client
            .post(format!("{}/rasterize", self.base_url))
            .json(&RasterizeBody { surface, scale })
            .send()
            .await
            .map_err(|e| PortError::Unexpected(format!("Rasterize request failed: {}", e)))?
            .error_for_status()
            .map_err(|e| PortError::Unexpected(format!("Rasterize request rejected: {}", e)))?;

        let png = response
            .bytes()
            .await
            .map_err(|e| PortError::Unexpected(format!("Rasterize response truncated: {}", e)))?;

        let raster = image::load_from_memory(&png)
            .map_err(|e| PortError::Unexpected(format!("Renderer returned invalid PNG: {}", e)))?
            .to_rgba8();
        Ok(raster)
    }
}
