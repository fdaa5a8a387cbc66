use crate::events::{AnchorPosition, ImportSignal};
use crate::import::{ClassificationId, ImportSession, Scope};
use std::collections::HashMap;

/// Text the editors hold between frames. The session only sees what the
/// editors report through events.
#[derive(Debug, Default)]
pub struct EditorState {
    pub labels: HashMap<Scope, String>,
    pub justification: String,
    pub classifications: HashMap<Scope, Option<ClassificationId>>,
}

impl EditorState {
    pub fn clear(&mut self) {
        *self = EditorState::default();
    }

    /// Editors are recreated whenever the file list changes.
    pub fn reset_for(&mut self, session: &ImportSession) {
        self.labels.clear();
        self.classifications.clear();
        for scope in editor_scopes(session) {
            self.labels.insert(scope, String::new());
            self.classifications.insert(scope, None);
        }
    }

    pub fn label_mut(&mut self, scope: Scope) -> &mut String {
        self.labels.entry(scope).or_default()
    }

    pub fn classification_mut(&mut self, scope: Scope) -> &mut Option<ClassificationId> {
        self.classifications.entry(scope).or_default()
    }
}

pub fn editor_scopes(session: &ImportSession) -> Vec<Scope> {
    std::iter::once(Scope::Collapsed)
        .chain((0..session.files().len()).map(Scope::File))
        .collect()
}

/// Label expressions are terms of letters, digits and underscores combined
/// with `&`, `|` and parentheses. An empty label is public and valid.
pub fn validate_label(text: &str) -> bool {
    if text.trim().is_empty() {
        return true;
    }

    let mut depth = 0i32;
    let mut expect_term = true;
    let mut chars = text.chars().peekable();

    while let Some(c) = chars.next() {
        match c {
            c if c.is_whitespace() => {}
            '(' if expect_term => depth += 1,
            ')' if !expect_term => {
                depth -= 1;
                if depth < 0 {
                    return false;
                }
            }
            '&' | '|' if !expect_term => expect_term = true,
            c if (c.is_alphanumeric() || c == '_') && expect_term => {
                while chars
                    .peek()
                    .map_or(false, |n| n.is_alphanumeric() || *n == '_')
                {
                    chars.next();
                }
                expect_term = false;
            }
            _ => return false,
        }
    }

    depth == 0 && !expect_term
}

pub fn validate_justification(text: &str) -> bool {
    !text.trim().is_empty()
}

/// What the rest of the application has been told about finished imports.
#[derive(Debug, Default)]
pub struct ActivityState {
    pub created_ids: Vec<String>,
    pub selected_ids: Vec<String>,
    pub last_position: Option<AnchorPosition>,
    pub cloud_imports: Vec<String>,
    pub show_activity: bool,
}

impl ActivityState {
    pub fn apply(&mut self, signal: ImportSignal) {
        match signal {
            ImportSignal::FileImportSuccess {
                vertex_ids,
                position,
            } => {
                self.created_ids.extend(vertex_ids);
                self.last_position = position;
            }
            ImportSignal::SelectObjects { vertex_ids } => self.selected_ids = vertex_ids,
            ImportSignal::ShowActivityDisplay => self.show_activity = true,
            ImportSignal::CloudImported { identifier, .. } => self.cloud_imports.push(identifier),
        }
    }

    pub fn get_status_text(&self) -> String {
        format!(
            "Created: {} | Selected: {} | Cloud imports: {}",
            self.created_ids.len(),
            self.selected_ids.len(),
            self.cloud_imports.len()
        )
    }
}
