pub mod domain;
pub mod export;
pub mod follow;
pub mod paginate;
pub mod pdf;
pub mod ports;
pub mod session;
pub mod stream;
pub mod surface;

pub use domain::{
    Document, DocumentPatch, DocumentStyling, GenerationRequest, Phase, ReasoningEffort,
    StreamEvent, TextAlignment, Verbosity,
};
pub use export::{export_surface, ExportArtifact, ExportError, ExportStage};
pub use follow::{ScrollAction, ScrollFollower, ViewportMetrics};
pub use paginate::{plan_pages, PageSlice, PageSplitPlan, SplitError};
pub use ports::{
    DocumentStore, EventStream, GenerationBackend, ObjectStorage, PortError, PortResult,
    SurfaceRasterizer,
};
pub use session::GenerationSession;
pub use stream::FrameDecoder;
pub use surface::{normalize_for_export, Surface, SurfaceNode};
