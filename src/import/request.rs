use super::metadata::{ClassificationId, JustificationValue};
use super::session::{FileDescriptor, ImportSession};
use crate::error::TransportFailure;
use serde::Deserialize;

/// One value shared by every file, or one value per file aligned by index.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PerScope<T> {
    Shared(T),
    PerFile(Vec<T>),
}

/// Collapsed imports may leave the classification unset; expanded imports
/// send an empty string for any file without one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Classifications {
    Shared(Option<ClassificationId>),
    PerFile(Vec<ClassificationId>),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UploadRequest {
    BulkFiles {
        files: Vec<FileDescriptor>,
        classifications: Classifications,
        labels: PerScope<String>,
    },
    TextImport {
        content: String,
        mime_type: String,
        classification: Option<ClassificationId>,
        label: String,
    },
    MetadataOnlyCreate {
        justification: JustificationValue,
        classification: Option<ClassificationId>,
        label: String,
    },
}

impl UploadRequest {
    /// Picks the request shape for whatever the session holds. Does not check validity.
    pub fn from_session(session: &ImportSession) -> Self {
        let shared = session.shared_metadata();

        if !session.files().is_empty() {
            let (classifications, labels) = if session.is_collapsed() {
                (
                    Classifications::Shared(shared.classification.clone()),
                    PerScope::Shared(shared.label.value.clone()),
                )
            } else {
                let per_file = session.per_file_metadata();
                (
                    Classifications::PerFile(
                        per_file
                            .iter()
                            .map(|set| set.classification.clone().unwrap_or_default())
                            .collect(),
                    ),
                    PerScope::PerFile(per_file.iter().map(|set| set.label.value.clone()).collect()),
                )
            };

            return Self::BulkFiles {
                files: session.files().to_vec(),
                classifications,
                labels,
            };
        }

        if let Some(payload) = session.string_payload() {
            return Self::TextImport {
                content: payload.content.clone(),
                mime_type: payload.mime_type.clone(),
                classification: shared.classification.clone(),
                label: shared.label.value.clone(),
            };
        }

        Self::MetadataOnlyCreate {
            justification: shared.justification.clone(),
            classification: shared.classification.clone(),
            label: shared.label.value.clone(),
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Self::BulkFiles { .. } => "importFiles",
            Self::TextImport { .. } => "importFileString",
            Self::MetadataOnlyCreate { .. } => "create",
        }
    }

    pub fn imports_files(&self) -> bool {
        matches!(self, Self::BulkFiles { .. })
    }
}

/// What the server answers after creating items: either a list or a single id.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum CreatedResponse {
    Many {
        #[serde(rename = "vertexIds")]
        vertex_ids: Vec<String>,
    },
    One {
        id: String,
    },
}

impl CreatedResponse {
    pub fn into_ids(self) -> Vec<String> {
        match self {
            Self::Many { vertex_ids } => vertex_ids,
            Self::One { id } => vec![id],
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UploadOutcome {
    Success { created_ids: Vec<String> },
    Failure { error: TransportFailure },
    Cancelled,
}
