//! crates/draftsmith_core/src/surface.rs
//!
//! The renderable surface of a document and the export style normalizer.
//!
//! A `Surface` is the in-memory form of a document's rich-text body: a tree
//! of nodes with computed style values, plus the document-wide styling.
//! Export works on a disposable clone of this tree; the live surface handed
//! in by a caller is never mutated.

use crate::domain::{Document, DocumentStyling};
use crate::ports::{PortError, PortResult};
use regex::Regex;
use serde::{Deserialize, Serialize};

/// Color-space functions the export rasterizer cannot consume.
const UNSUPPORTED_COLOR_FN: &str = r"(?i)^\s*(lab|lch|oklab|oklch|hwb|color)\s*\(";

/// Fallback for text and border colors with no reliable conversion.
pub const FALLBACK_FOREGROUND: &str = "#000000";
/// Fallback for background colors with no reliable conversion.
pub const FALLBACK_BACKGROUND: &str = "#ffffff";

/// Computed style values of one surface node. Only the properties the
/// export pipeline normalizes are modeled; everything else rides along in
/// the rasterizer's own representation.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NodeStyle {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub background_color: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub border_color: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub border: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub outline: Option<String>,
}

/// One node of the rich-text tree.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SurfaceNode {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(default)]
    pub style: NodeStyle,
    /// True for decoration belonging to the editor, not the document.
    #[serde(default)]
    pub editor_chrome: bool,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<SurfaceNode>,
}

/// A renderable surface: the node tree plus the document-wide styling and
/// the layout width the rasterizer should use.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Surface {
    pub width_px: u32,
    pub base: DocumentStyling,
    pub root: SurfaceNode,
}

impl Surface {
    /// Builds the renderable surface of a stored document. The body column
    /// holds the serialized node tree; a body that does not deserialize is
    /// a validation error, not a crash.
    pub fn from_document(document: &Document, width_px: u32) -> PortResult<Self> {
        let root: SurfaceNode =
            serde_json::from_value(document.body.clone()).map_err(|e| {
                PortError::Validation(format!(
                    "document {} body is not a valid surface tree: {}",
                    document.id, e
                ))
            })?;
        Ok(Self {
            width_px,
            base: document.styling.clone(),
            root,
        })
    }
}

/// Rewrites every style value the rasterizer cannot consume on the given
/// (cloned) surface, and strips editor chrome decoration. Best-effort and
/// lossy by design: an unsupported color collapses to the nearest safe
/// fallback rather than failing the export.
pub fn normalize_for_export(surface: &mut Surface) {
    let unsupported = Regex::new(UNSUPPORTED_COLOR_FN).unwrap();

    if is_unsupported_color(&surface.base.text_color, &unsupported) {
        surface.base.text_color = FALLBACK_FOREGROUND.to_string();
    }
    if is_unsupported_color(&surface.base.background_color, &unsupported) {
        surface.base.background_color = FALLBACK_BACKGROUND.to_string();
    }

    normalize_node(&mut surface.root, &unsupported);
}

fn normalize_node(node: &mut SurfaceNode, unsupported: &Regex) {
    if let Some(color) = &node.style.color {
        if is_unsupported_color(color, unsupported) {
            node.style.color = Some(FALLBACK_FOREGROUND.to_string());
        }
    }
    if let Some(background) = &node.style.background_color {
        if is_unsupported_color(background, unsupported) {
            node.style.background_color = Some(FALLBACK_BACKGROUND.to_string());
        }
    }
    if let Some(border_color) = &node.style.border_color {
        if is_unsupported_color(border_color, unsupported) {
            node.style.border_color = Some(FALLBACK_FOREGROUND.to_string());
        }
    }

    // Editing decorations must not appear in the exported artifact.
    if node.editor_chrome {
        node.style.border = None;
        node.style.outline = None;
        node.style.background_color = None;
    }

    for child in &mut node.children {
        normalize_node(child, unsupported);
    }
}

fn is_unsupported_color(value: &str, unsupported: &Regex) -> bool {
    unsupported.is_match(value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::TextAlignment;

    fn surface_with(style: NodeStyle, chrome: bool) -> Surface {
        Surface {
            width_px: 800,
            base: DocumentStyling::default(),
            root: SurfaceNode {
                text: None,
                style: NodeStyle::default(),
                editor_chrome: false,
                children: vec![SurfaceNode {
                    text: Some("hello".into()),
                    style,
                    editor_chrome: chrome,
                    children: Vec::new(),
                }],
            },
        }
    }

    #[test]
    fn unsupported_color_functions_are_rewritten() {
        let mut surface = surface_with(
            NodeStyle {
                color: Some("oklch(0.7 0.1 120)".into()),
                background_color: Some("lab(52% 40 59)".into()),
                border_color: Some("color(display-p3 1 0 0)".into()),
                ..Default::default()
            },
            false,
        );
        normalize_for_export(&mut surface);

        let style = &surface.root.children[0].style;
        assert_eq!(style.color.as_deref(), Some(FALLBACK_FOREGROUND));
        assert_eq!(style.background_color.as_deref(), Some(FALLBACK_BACKGROUND));
        assert_eq!(style.border_color.as_deref(), Some(FALLBACK_FOREGROUND));
    }

    #[test]
    fn supported_color_forms_pass_through() {
        let original = NodeStyle {
            color: Some("rgb(10, 20, 30)".into()),
            background_color: Some("#fafafa".into()),
            border_color: Some("hsl(120, 50%, 50%)".into()),
            ..Default::default()
        };
        let mut surface = surface_with(original.clone(), false);
        normalize_for_export(&mut surface);
        assert_eq!(surface.root.children[0].style, original);
    }

    #[test]
    fn chrome_decoration_is_stripped() {
        let mut surface = surface_with(
            NodeStyle {
                border: Some("1px dashed #8884".into()),
                outline: Some("2px solid blue".into()),
                background_color: Some("#eef".into()),
                ..Default::default()
            },
            true,
        );
        normalize_for_export(&mut surface);

        let style = &surface.root.children[0].style;
        assert_eq!(style.border, None);
        assert_eq!(style.outline, None);
        assert_eq!(style.background_color, None);
    }

    #[test]
    fn content_borders_survive_normalization() {
        let mut surface = surface_with(
            NodeStyle {
                border: Some("1px solid #ccc".into()),
                ..Default::default()
            },
            false,
        );
        normalize_for_export(&mut surface);
        assert_eq!(
            surface.root.children[0].style.border.as_deref(),
            Some("1px solid #ccc")
        );
    }

    #[test]
    fn base_styling_is_normalized_too() {
        let mut surface = surface_with(NodeStyle::default(), false);
        surface.base.text_color = "oklab(0.5 0.1 0.1)".into();
        surface.base.background_color = "hwb(90 10% 10%)".into();
        surface.base.alignment = TextAlignment::Center;
        normalize_for_export(&mut surface);

        assert_eq!(surface.base.text_color, FALLBACK_FOREGROUND);
        assert_eq!(surface.base.background_color, FALLBACK_BACKGROUND);
        assert_eq!(surface.base.alignment, TextAlignment::Center);
    }

    #[test]
    fn surface_round_trips_through_a_document_body() {
        let surface = surface_with(NodeStyle::default(), false);
        let body = serde_json::to_value(&surface.root).unwrap();
        let document = Document {
            id: uuid::Uuid::new_v4(),
            title: "t".into(),
            body,
            styling: DocumentStyling::default(),
            is_public: false,
            access_secret: None,
            view_count: 0,
            created_at: chrono::Utc::now(),
            updated_at: chrono::Utc::now(),
        };
        let rebuilt = Surface::from_document(&document, 800).unwrap();
        assert_eq!(rebuilt.root, surface.root);
    }

    #[test]
    fn invalid_body_is_a_validation_error() {
        let document = Document {
            id: uuid::Uuid::new_v4(),
            title: "t".into(),
            body: serde_json::json!(["not", "a", "node"]),
            styling: DocumentStyling::default(),
            is_public: false,
            access_secret: None,
            view_count: 0,
            created_at: chrono::Utc::now(),
            updated_at: chrono::Utc::now(),
        };
        let err = Surface::from_document(&document, 800).unwrap_err();
        assert!(matches!(err, PortError::Validation(_)));
    }
}
