mod metadata;
mod request;
mod session;

pub use metadata::{ClassificationId, JustificationValue, LabelValue, MetadataField, Scope};
pub use request::{Classifications, CreatedResponse, PerScope, UploadOutcome, UploadRequest};
pub use session::{FileDescriptor, ImportSession, IntakeMode, PayloadRef, StringPayload};
