use crate::import::{ClassificationId, FileDescriptor, JustificationValue, LabelValue, Scope};
use serde_json::Value;

/// Where the import surface was anchored, so newly created items can be placed near it.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct AnchorPosition {
    pub x: f32,
    pub y: f32,
}

/// Input forwarded from the presentation layer.
#[derive(Debug, Clone, PartialEq)]
pub enum SessionEvent {
    FilesSelected(Vec<FileDescriptor>),
    LabelChanged(Scope, LabelValue),
    JustificationChanged(Scope, JustificationValue),
    ClassificationChanged(Scope, Option<ClassificationId>),
    CollapseToggled(bool),
    Submit,
    Cancel,
    OutsideInteraction,
    ShowCloudSources,
    CloudSourceSelected(String),
}

/// Emitted to whoever listens on the import channel.
#[derive(Debug, Clone, PartialEq)]
pub enum ImportSignal {
    FileImportSuccess {
        vertex_ids: Vec<String>,
        position: Option<AnchorPosition>,
    },
    SelectObjects {
        vertex_ids: Vec<String>,
    },
    ShowActivityDisplay,
    CloudImported {
        identifier: String,
        import_config: Value,
    },
}
