//! crates/draftsmith_core/src/export.rs
//!
//! The export pipeline: clone the surface, normalize its styles, rasterize
//! the clone, split the raster into pages, assemble the PDF.
//!
//! The pipeline owns its clone and every intermediate artifact; all of them
//! are dropped on every exit path, and the source surface is never mutated.
//! Failures carry the stage they happened in so the caller can surface a
//! stage-specific hint instead of a generic message. Nothing is retried.

use crate::paginate::{plan_pages, SplitError};
use crate::pdf::{assemble_pdf, PdfError};
use crate::ports::SurfaceRasterizer;
use crate::surface::{normalize_for_export, Surface};
use tracing::{debug, info};

/// Scale factor used when the deployment does not configure one. Lower it
/// on constrained devices to bound rasterization memory.
pub const DEFAULT_EXPORT_SCALE: f32 = 2.0;

/// The stages an export moves through, in order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportStage {
    Idle,
    Cloning,
    Normalizing,
    Rasterizing,
    Paginating,
    Assembling,
    Saved,
    Failed,
}

#[derive(Debug, thiserror::Error)]
pub enum ExportError {
    /// Rasterization failing on a big surface is almost always resource
    /// exhaustion, so the hint points at document size.
    #[error("rasterization failed, the document may be too large to export: {0}")]
    Rasterize(String),
    #[error(transparent)]
    Paginate(#[from] SplitError),
    #[error("failed to assemble the PDF: {0}")]
    Assemble(#[from] PdfError),
}

impl ExportError {
    /// The stage this failure belongs to.
    pub fn stage(&self) -> ExportStage {
        match self {
            Self::Rasterize(_) => ExportStage::Rasterizing,
            Self::Paginate(_) => ExportStage::Paginating,
            Self::Assemble(_) => ExportStage::Assembling,
        }
    }
}

/// The finished artifact of a successful export.
#[derive(Debug, Clone)]
pub struct ExportArtifact {
    pub bytes: Vec<u8>,
    pub page_count: usize,
}

impl ExportArtifact {
    pub const CONTENT_TYPE: &'static str = "application/pdf";
}

/// Runs the full pipeline over a read-only surface.
pub async fn export_surface(
    surface: &Surface,
    rasterizer: &dyn SurfaceRasterizer,
    scale: f32,
) -> Result<ExportArtifact, ExportError> {
    debug!(stage = ?ExportStage::Cloning, "export started");
    let mut clone = surface.clone();

    debug!(stage = ?ExportStage::Normalizing, "normalizing export clone");
    normalize_for_export(&mut clone);

    debug!(stage = ?ExportStage::Rasterizing, scale, "rasterizing export clone");
    let raster = rasterizer
        .rasterize(&clone, scale)
        .await
        .map_err(|e| ExportError::Rasterize(e.to_string()))?;
    // The clone's job ends at rasterization.
    drop(clone);

    debug!(stage = ?ExportStage::Paginating, width = raster.width(), height = raster.height(), "planning pages");
    let plan = plan_pages(raster.width(), raster.height())?;

    debug!(stage = ?ExportStage::Assembling, pages = plan.page_count(), "assembling PDF");
    let bytes = assemble_pdf(&raster, &plan)?;

    info!(
        pages = plan.page_count(),
        bytes = bytes.len(),
        "export finished"
    );
    Ok(ExportArtifact {
        bytes,
        page_count: plan.page_count(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::DocumentStyling;
    use crate::paginate::{page_capacity_px, SplitError, MAX_PAGES};
    use crate::ports::{PortError, PortResult};
    use crate::surface::{NodeStyle, SurfaceNode, FALLBACK_FOREGROUND};
    use async_trait::async_trait;
    use image::RgbaImage;
    use std::sync::Mutex;

    /// A rasterizer fake that records what it was asked to render and
    /// returns a fixed-size raster (or a failure).
    struct FakeRasterizer {
        height_px: u32,
        fail_with: Option<String>,
        seen: Mutex<Vec<Surface>>,
    }

    impl FakeRasterizer {
        fn returning(height_px: u32) -> Self {
            Self {
                height_px,
                fail_with: None,
                seen: Mutex::new(Vec::new()),
            }
        }

        fn failing(reason: &str) -> Self {
            Self {
                height_px: 0,
                fail_with: Some(reason.to_string()),
                seen: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl SurfaceRasterizer for FakeRasterizer {
        async fn rasterize(&self, surface: &Surface, _scale: f32) -> PortResult<RgbaImage> {
            self.seen.lock().unwrap().push(surface.clone());
            if let Some(reason) = &self.fail_with {
                return Err(PortError::Unexpected(reason.clone()));
            }
            Ok(RgbaImage::new(surface.width_px, self.height_px))
        }
    }

    fn surface() -> Surface {
        Surface {
            width_px: 800,
            base: DocumentStyling::default(),
            root: SurfaceNode {
                text: Some("hello".into()),
                style: NodeStyle {
                    color: Some("oklch(0.2 0.1 30)".into()),
                    ..Default::default()
                },
                editor_chrome: false,
                children: Vec::new(),
            },
        }
    }

    #[tokio::test]
    async fn exports_the_expected_page_count() {
        let source = surface();
        let capacity = page_capacity_px(source.width_px);
        let rasterizer = FakeRasterizer::returning(capacity * 2 + 1);

        let artifact = export_surface(&source, &rasterizer, 2.0).await.unwrap();
        assert_eq!(artifact.page_count, 3);
        assert!(artifact.bytes.starts_with(b"%PDF-1.4"));
    }

    #[tokio::test]
    async fn rasterizer_sees_the_normalized_clone_and_source_stays_intact() {
        let source = surface();
        let rasterizer = FakeRasterizer::returning(100);
        export_surface(&source, &rasterizer, 2.0).await.unwrap();

        let seen = rasterizer.seen.lock().unwrap();
        assert_eq!(
            seen[0].root.style.color.as_deref(),
            Some(FALLBACK_FOREGROUND)
        );
        // The live surface still carries the original value.
        assert_eq!(source.root.style.color.as_deref(), Some("oklch(0.2 0.1 30)"));
    }

    #[tokio::test]
    async fn rasterizer_failure_reports_the_rasterizing_stage() {
        let rasterizer = FakeRasterizer::failing("out of memory");
        let err = export_surface(&surface(), &rasterizer, 2.0)
            .await
            .unwrap_err();
        assert_eq!(err.stage(), ExportStage::Rasterizing);
        assert!(err.to_string().contains("too large"));
    }

    #[tokio::test]
    async fn page_ceiling_reports_the_paginating_stage() {
        let source = surface();
        let capacity = page_capacity_px(source.width_px);
        let rasterizer = FakeRasterizer::returning(capacity * (MAX_PAGES as u32) + 1);

        let err = export_surface(&source, &rasterizer, 2.0).await.unwrap_err();
        assert_eq!(err.stage(), ExportStage::Paginating);
        assert!(matches!(
            err,
            ExportError::Paginate(SplitError::PageCeiling { .. })
        ));
    }

    #[tokio::test]
    async fn empty_raster_still_exports_one_page() {
        let rasterizer = FakeRasterizer::returning(0);
        let artifact = export_surface(&surface(), &rasterizer, 2.0).await.unwrap();
        assert_eq!(artifact.page_count, 1);
    }
}
