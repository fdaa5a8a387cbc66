use super::task::{TaskReporter, UploadTask, UploadTransport};
use crate::import::{FileDescriptor, ImportSession, LabelValue, MetadataField, Scope, UploadRequest};
use serde_json::Value;
use std::cell::RefCell;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

/// Records requests and hands back reporters so tests decide how they settle.
#[derive(Default)]
pub(crate) struct ScriptedTransport {
    pub requests: RefCell<Vec<UploadRequest>>,
    pub cloud_imports: RefCell<Vec<(String, Value)>>,
    pub reporters: RefCell<Vec<TaskReporter>>,
    pub cancels: Arc<AtomicUsize>,
    pub cancellable: bool,
}

impl ScriptedTransport {
    pub fn cancellable() -> Self {
        Self {
            cancellable: true,
            ..Self::default()
        }
    }

    pub fn reporter(&self, index: usize) -> TaskReporter {
        self.reporters.borrow()[index].clone()
    }

    fn task(&self) -> UploadTask {
        let (reporter, task) = UploadTask::channel();
        self.reporters.borrow_mut().push(reporter);
        if self.cancellable {
            let cancels = self.cancels.clone();
            task.with_cancel(move || {
                cancels.fetch_add(1, Ordering::SeqCst);
            })
        } else {
            task
        }
    }
}

impl UploadTransport for ScriptedTransport {
    fn submit(&self, request: UploadRequest) -> UploadTask {
        self.requests.borrow_mut().push(request);
        self.task()
    }

    fn cloud_import(&self, identifier: &str, import_config: Value) -> UploadTask {
        self.cloud_imports
            .borrow_mut()
            .push((identifier.to_string(), import_config));
        self.task()
    }
}

pub(crate) fn valid_single_file_session() -> ImportSession {
    let mut session =
        ImportSession::with_files(vec![FileDescriptor::from_bytes("f1.txt", b"hi".to_vec())]);
    session.set_metadata(
        Scope::Collapsed,
        MetadataField::Label(LabelValue::new("", true)),
    );
    session
}
