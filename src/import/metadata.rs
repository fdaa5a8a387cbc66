use serde::{Deserialize, Serialize};

pub type ClassificationId = String;

/// An access-control label as reported by the label editor.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LabelValue {
    pub value: String,
    pub valid: bool,
}

impl LabelValue {
    pub fn new(value: impl Into<String>, valid: bool) -> Self {
        Self {
            value: value.into(),
            valid,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct JustificationValue {
    pub text: String,
    pub valid: bool,
}

impl JustificationValue {
    pub fn new(text: impl Into<String>, valid: bool) -> Self {
        Self {
            text: text.into(),
            valid,
        }
    }
}

/// Label, justification and classification for one file, or shared by all of them.
///
/// The default set is invalid: nothing has been reported by the editors yet.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MetadataSet {
    pub label: LabelValue,
    pub justification: JustificationValue,
    pub classification: Option<ClassificationId>,
}

impl MetadataSet {
    pub fn is_valid(&self, requires_justification: bool) -> bool {
        self.label.valid && (!requires_justification || self.justification.valid)
    }

    pub fn apply(&mut self, field: MetadataField) {
        match field {
            MetadataField::Label(label) => self.label = label,
            MetadataField::Justification(justification) => self.justification = justification,
            MetadataField::Classification(classification) => self.classification = classification,
        }
    }
}

/// Which metadata set an editor writes into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Scope {
    Collapsed,
    File(usize),
}

/// A single field change coming from an editor, with the validity it computed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MetadataField {
    Label(LabelValue),
    Justification(JustificationValue),
    Classification(Option<ClassificationId>),
}
