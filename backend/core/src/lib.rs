pub mod error;
pub mod traits;
pub mod types;

pub use error::StudioError;
pub use traits::{
    Attachment, ConversionGateway, CopyRequest, CopyWriter, DraftRequest, DraftWriter,
    GeneratedCopy, GeneratedHtml, HtmlComposer, HtmlRequest,
};
pub use types::{EditorSnapshot, PipelineStage, RenderResult, SourceDocument, ViewMode};

/// Result alias used by every service trait in the workspace.
pub type StudioResult<T> = std::result::Result<T, StudioError>;
