use crate::error::TransportFailure;
use crate::import::{CreatedResponse, UploadRequest};
use derivative::Derivative;
use serde_json::Value;
use std::sync::mpsc::{channel, Receiver, Sender, TryRecvError};

#[derive(Debug, Clone, PartialEq)]
pub enum TaskEvent {
    Progress(f32),
    Settled(Result<CreatedResponse, TransportFailure>),
}

/// Something that can carry an upload request to the server.
pub trait UploadTransport {
    fn submit(&self, request: UploadRequest) -> UploadTask;
    fn cloud_import(&self, identifier: &str, import_config: Value) -> UploadTask;
}

/// The sending half handed to whatever performs the request.
#[derive(Debug, Clone)]
pub struct TaskReporter {
    sender: Sender<TaskEvent>,
}

impl TaskReporter {
    pub fn progress(&self, complete: f32) {
        self.sender
            .send(TaskEvent::Progress(complete))
            .unwrap_or_default();
    }

    pub fn settle(&self, result: Result<CreatedResponse, TransportFailure>) {
        self.sender
            .send(TaskEvent::Settled(result))
            .unwrap_or_default();
    }
}

/// Runs at most once, however many times `cancel` is called.
pub struct CancelHandle {
    cancel: Option<Box<dyn FnOnce() + Send>>,
}

impl CancelHandle {
    pub fn new(cancel: impl FnOnce() + Send + 'static) -> Self {
        Self {
            cancel: Some(Box::new(cancel)),
        }
    }

    pub fn cancel(&mut self) -> bool {
        match self.cancel.take() {
            Some(cancel) => {
                cancel();
                true
            }
            None => false,
        }
    }
}

/// An outstanding request: progress and its single settlement arrive on
/// `events`. Cancelling is only possible when the transport provided a handle.
#[derive(Derivative)]
#[derivative(Debug)]
pub struct UploadTask {
    events: Receiver<TaskEvent>,
    #[derivative(Debug = "ignore")]
    cancel: Option<CancelHandle>,
    settled: bool,
}

impl UploadTask {
    pub fn channel() -> (TaskReporter, Self) {
        let (sender, events) = channel();
        (
            TaskReporter { sender },
            Self {
                events,
                cancel: None,
                settled: false,
            },
        )
    }

    pub fn with_cancel(mut self, cancel: impl FnOnce() + Send + 'static) -> Self {
        self.cancel = Some(CancelHandle::new(cancel));
        self
    }

    pub fn supports_cancel(&self) -> bool {
        self.cancel.is_some()
    }

    /// Returns whether a cancellation was actually issued.
    pub fn cancel(&mut self) -> bool {
        if self.settled {
            return false;
        }
        match self.cancel.as_mut() {
            Some(handle) => handle.cancel(),
            None => false,
        }
    }

    /// Next pending event, if any. A reporter that disappears without settling
    /// counts as a failure.
    pub fn try_next(&mut self) -> Option<TaskEvent> {
        if self.settled {
            return None;
        }
        match self.events.try_recv() {
            Ok(event) => {
                if matches!(event, TaskEvent::Settled(_)) {
                    self.settled = true;
                }
                Some(event)
            }
            Err(TryRecvError::Empty) => None,
            Err(TryRecvError::Disconnected) => {
                self.settled = true;
                Some(TaskEvent::Settled(Err(TransportFailure::new(
                    "Upload ended without a response",
                ))))
            }
        }
    }

    pub fn is_settled(&self) -> bool {
        self.settled
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    #[test]
    fn cancel_runs_once() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = calls.clone();
        let (_reporter, task) = UploadTask::channel();
        let mut task = task.with_cancel(move || {
            counter.fetch_add(1, Ordering::SeqCst);
        });

        assert!(task.supports_cancel());
        assert!(task.cancel());
        assert!(!task.cancel());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn cancel_after_settle_is_noop() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = calls.clone();
        let (reporter, task) = UploadTask::channel();
        let mut task = task.with_cancel(move || {
            counter.fetch_add(1, Ordering::SeqCst);
        });

        reporter.settle(Ok(CreatedResponse::One { id: "v1".into() }));
        assert!(matches!(task.try_next(), Some(TaskEvent::Settled(Ok(_)))));
        assert!(!task.cancel());
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn events_stop_after_settlement() {
        let (reporter, mut task) = UploadTask::channel();
        reporter.progress(0.5);
        reporter.settle(Err(TransportFailure::unknown()));
        reporter.progress(0.9);

        assert_eq!(task.try_next(), Some(TaskEvent::Progress(0.5)));
        assert!(matches!(task.try_next(), Some(TaskEvent::Settled(Err(_)))));
        assert_eq!(task.try_next(), None);
    }

    #[test]
    fn dropped_reporter_settles_as_failure() {
        let (reporter, mut task) = UploadTask::channel();
        drop(reporter);
        assert!(matches!(task.try_next(), Some(TaskEvent::Settled(Err(_)))));
        assert!(task.is_settled());
    }
}
