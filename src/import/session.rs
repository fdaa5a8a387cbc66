use super::metadata::{MetadataField, MetadataSet, Scope};
use crate::error::Result;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::debug;

/// Where the bytes of a picked file live. Reading them is the transport's job.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PayloadRef {
    Path(PathBuf),
    Bytes(Arc<[u8]>),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileDescriptor {
    pub name: String,
    pub size: u64,
    pub payload: PayloadRef,
}

impl FileDescriptor {
    pub fn from_path(path: &Path) -> Result<Self> {
        let size = fs::metadata(path)?.len();
        let name = path
            .file_name()
            .unwrap_or_default()
            .to_string_lossy()
            .to_string();

        Ok(Self {
            name,
            size,
            payload: PayloadRef::Path(path.to_path_buf()),
        })
    }

    pub fn from_bytes(name: impl Into<String>, bytes: impl Into<Arc<[u8]>>) -> Self {
        let bytes = bytes.into();
        Self {
            name: name.into(),
            size: bytes.len() as u64,
            payload: PayloadRef::Bytes(bytes),
        }
    }
}

/// Pasted text imported as a single item.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StringPayload {
    pub content: String,
    pub mime_type: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IntakeMode {
    Empty,
    Single,
    Multiple,
}

impl IntakeMode {
    pub fn from_count(count: usize) -> Self {
        match count {
            0 => Self::Empty,
            1 => Self::Single,
            _ => Self::Multiple,
        }
    }
}

/// Files and metadata being prepared for one import.
///
/// `per_file_metadata` always has one entry per file, and `collapsed` is
/// always true unless there are several files.
#[derive(Debug, Clone)]
pub struct ImportSession {
    files: Vec<FileDescriptor>,
    string_payload: Option<StringPayload>,
    string_type: Option<String>,
    mode: IntakeMode,
    collapsed: bool,
    shared_metadata: MetadataSet,
    per_file_metadata: Vec<MetadataSet>,
}

impl Default for ImportSession {
    fn default() -> Self {
        Self::new()
    }
}

impl ImportSession {
    pub fn new() -> Self {
        Self {
            files: Vec::new(),
            string_payload: None,
            string_type: None,
            mode: IntakeMode::Empty,
            collapsed: true,
            shared_metadata: MetadataSet::default(),
            per_file_metadata: Vec::new(),
        }
    }

    pub fn with_files(files: Vec<FileDescriptor>) -> Self {
        let mut session = Self::new();
        session.set_files(files);
        session
    }

    /// `string_type` is the display name of the pasted content, e.g. "Clipboard text".
    pub fn with_string(payload: StringPayload, string_type: Option<String>) -> Self {
        Self {
            string_payload: Some(payload),
            string_type,
            ..Self::new()
        }
    }

    pub fn set_files(&mut self, files: Vec<FileDescriptor>) -> IntakeMode {
        self.per_file_metadata = vec![MetadataSet::default(); files.len()];
        self.mode = IntakeMode::from_count(files.len());
        self.files = files;
        // Multiple files start out sharing one metadata set.
        self.collapsed = true;

        debug!(
            "Session files replaced: {} file(s), mode {:?}",
            self.files.len(),
            self.mode
        );
        self.mode
    }

    /// Panics when `scope` addresses a file index that does not exist.
    pub fn set_metadata(&mut self, scope: Scope, field: MetadataField) {
        match scope {
            Scope::Collapsed => self.shared_metadata.apply(field),
            Scope::File(index) => {
                let count = self.per_file_metadata.len();
                assert!(
                    index < count,
                    "metadata addressed to file {} but the session has {} file(s)",
                    index,
                    count
                );
                self.per_file_metadata[index].apply(field);
            }
        }
    }

    pub fn toggle_collapsed(&mut self, checked: bool) {
        if self.mode != IntakeMode::Multiple {
            debug!("Ignoring collapse toggle in {:?} mode", self.mode);
            return;
        }
        self.collapsed = checked;
    }

    pub fn is_valid(&self) -> bool {
        let metadata_valid = if self.collapsed {
            self.shared_metadata
                .is_valid(self.requires_justification())
        } else {
            // Each file backs its own label, so no per-file justification.
            self.per_file_metadata.iter().all(|set| set.label.valid)
        };

        // Metadata-only creation must also pick a classification. This is only
        // checked here, never in the per-scope flags.
        if self.is_metadata_only() && self.shared_metadata.classification.is_none() {
            return false;
        }

        metadata_valid
    }

    /// Whether each visible label editor should show as invalid.
    pub fn label_validity(&self) -> Vec<(Scope, bool)> {
        if self.collapsed {
            vec![(
                Scope::Collapsed,
                self.shared_metadata
                    .is_valid(self.requires_justification()),
            )]
        } else {
            self.per_file_metadata
                .iter()
                .enumerate()
                .map(|(index, set)| (Scope::File(index), set.label.valid))
                .collect()
        }
    }

    pub fn requires_justification(&self) -> bool {
        self.files.is_empty()
    }

    pub fn is_metadata_only(&self) -> bool {
        self.files.is_empty() && self.string_payload.is_none()
    }

    /// The file picker is offered only before anything has been attached.
    pub fn can_select_files(&self) -> bool {
        self.files.is_empty() && self.string_payload.is_none()
    }

    /// A string type names the payload in the form body, not the title. With
    /// files attached it makes the title count a single item.
    pub fn title(&self) -> String {
        match (self.files.len(), self.string_type.is_some()) {
            (0, _) => "Create Entity".to_string(),
            (1, _) | (_, true) => "Import 1 File".to_string(),
            (count, false) => format!("Import {} Files", count),
        }
    }

    pub fn files(&self) -> &[FileDescriptor] {
        &self.files
    }

    pub fn string_payload(&self) -> Option<&StringPayload> {
        self.string_payload.as_ref()
    }

    pub fn string_type(&self) -> Option<&str> {
        self.string_type.as_deref()
    }

    pub fn mode(&self) -> IntakeMode {
        self.mode
    }

    pub fn is_collapsed(&self) -> bool {
        self.collapsed
    }

    pub fn shared_metadata(&self) -> &MetadataSet {
        &self.shared_metadata
    }

    pub fn per_file_metadata(&self) -> &[MetadataSet] {
        &self.per_file_metadata
    }
}
