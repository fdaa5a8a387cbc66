use super::task::{TaskEvent, UploadTask, UploadTransport};
use crate::error::TransportFailure;
use crate::import::{ImportSession, UploadOutcome, UploadRequest};
use std::fmt;
use tracing::{debug, info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifecycleState {
    Idle,
    Submitting,
    Succeeded,
    Failed,
    Cancelled,
}

/// What changed during a `poll`, in arrival order.
#[derive(Debug, Clone, PartialEq)]
pub enum LifecycleUpdate {
    Progress(f32),
    Succeeded { created_ids: Vec<String> },
    Failed(TransportFailure),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmitLabel {
    Import,
    Create,
    Importing { percent: Option<u8> },
    Creating { percent: Option<u8> },
}

impl fmt::Display for SubmitLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Import => f.write_str("Import"),
            Self::Create => f.write_str("Create"),
            Self::Importing { percent: None } => f.write_str("Importing…"),
            Self::Importing { percent: Some(p) } => write!(f, "{}% Importing…", p),
            Self::Creating { percent: None } => f.write_str("Creating…"),
            Self::Creating { percent: Some(p) } => write!(f, "{}% Creating…", p),
        }
    }
}

/// Drives one request at a time from submission to its outcome.
#[derive(Debug)]
pub struct UploadLifecycle {
    state: LifecycleState,
    task: Option<UploadTask>,
    progress: Option<f32>,
    imports_files: bool,
    field_error: Option<String>,
    teardown_on_tap: bool,
    outcome: Option<UploadOutcome>,
}

impl Default for UploadLifecycle {
    fn default() -> Self {
        Self::new()
    }
}

impl UploadLifecycle {
    pub fn new() -> Self {
        Self {
            state: LifecycleState::Idle,
            task: None,
            progress: None,
            imports_files: false,
            field_error: None,
            teardown_on_tap: true,
            outcome: None,
        }
    }

    /// Returns false, changing nothing, when the session is invalid or a
    /// request is already outstanding.
    pub fn submit(&mut self, session: &ImportSession, transport: &dyn UploadTransport) -> bool {
        if self.state == LifecycleState::Submitting {
            debug!("Ignoring submit while a request is outstanding");
            return false;
        }
        if !session.is_valid() {
            debug!("Ignoring submit for invalid session");
            return false;
        }

        let request = UploadRequest::from_session(session);
        info!("Submitting {} request", request.kind());

        self.imports_files = request.imports_files();
        self.task = Some(transport.submit(request));
        self.state = LifecycleState::Submitting;
        self.progress = None;
        self.field_error = None;
        self.teardown_on_tap = false;
        self.outcome = None;
        true
    }

    /// Drains whatever the outstanding request has reported since the last call.
    pub fn poll(&mut self) -> Vec<LifecycleUpdate> {
        let mut updates = Vec::new();

        while let Some(event) = self.task.as_mut().and_then(UploadTask::try_next) {
            match event {
                TaskEvent::Progress(complete) => {
                    let complete = complete.clamp(0.0, 1.0);
                    self.progress = Some(complete);
                    updates.push(LifecycleUpdate::Progress(complete));
                }
                TaskEvent::Settled(Ok(response)) => {
                    let created_ids = response.into_ids();
                    info!("Upload succeeded, created {} item(s)", created_ids.len());
                    self.task = None;
                    self.state = LifecycleState::Succeeded;
                    self.outcome = Some(UploadOutcome::Success {
                        created_ids: created_ids.clone(),
                    });
                    updates.push(LifecycleUpdate::Succeeded { created_ids });
                }
                TaskEvent::Settled(Err(error)) => {
                    warn!("Upload failed: {}", error);
                    self.task = None;
                    self.state = LifecycleState::Failed;
                    self.progress = None;
                    self.field_error = Some(error.display_message().to_string());
                    // Keep the session around so the input can be corrected.
                    self.teardown_on_tap = true;
                    self.outcome = Some(UploadOutcome::Failure {
                        error: error.clone(),
                    });
                    updates.push(LifecycleUpdate::Failed(error));
                }
            }
        }

        updates
    }

    /// Called when the owning session goes away. Anything the request reports
    /// afterwards is dropped along with it.
    pub fn teardown(&mut self) {
        let Some(mut task) = self.task.take() else {
            return;
        };
        if self.state != LifecycleState::Submitting {
            return;
        }

        if task.supports_cancel() {
            task.cancel();
            info!("Cancelled outstanding upload on teardown");
        } else {
            debug!("Outstanding upload cannot be cancelled, discarding it");
        }
        self.state = LifecycleState::Cancelled;
        self.progress = None;
        self.outcome = Some(UploadOutcome::Cancelled);
    }

    pub fn submit_label(&self, session: &ImportSession) -> SubmitLabel {
        let percent = self.progress.map(|p| (p * 100.0).round() as u8);
        match self.state {
            LifecycleState::Submitting if self.imports_files => SubmitLabel::Importing { percent },
            LifecycleState::Submitting => SubmitLabel::Creating { percent },
            _ if session.files().is_empty() => SubmitLabel::Create,
            _ => SubmitLabel::Import,
        }
    }

    pub fn can_submit(&self, session: &ImportSession) -> bool {
        self.state != LifecycleState::Submitting && session.is_valid()
    }

    pub fn state(&self) -> LifecycleState {
        self.state
    }

    pub fn is_submitting(&self) -> bool {
        self.state == LifecycleState::Submitting
    }

    pub fn progress(&self) -> Option<f32> {
        self.progress
    }

    pub fn field_error(&self) -> Option<&str> {
        self.field_error.as_deref()
    }

    pub fn clear_field_error(&mut self) {
        self.field_error = None;
    }

    pub fn teardown_on_tap(&self) -> bool {
        self.teardown_on_tap
    }

    pub fn outcome(&self) -> Option<&UploadOutcome> {
        self.outcome.as_ref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::import::{CreatedResponse, JustificationValue, LabelValue, MetadataField, Scope};
    use crate::upload::testing::{valid_single_file_session, ScriptedTransport};
    use std::sync::atomic::Ordering;

    #[test]
    fn invalid_session_is_not_submitted() {
        let transport = ScriptedTransport::default();
        let mut lifecycle = UploadLifecycle::new();
        let session = ImportSession::new();

        assert!(!lifecycle.submit(&session, &transport));
        assert_eq!(lifecycle.state(), LifecycleState::Idle);
        assert!(transport.requests.borrow().is_empty());
    }

    #[test]
    fn second_submit_while_in_flight_is_rejected() {
        let transport = ScriptedTransport::default();
        let mut lifecycle = UploadLifecycle::new();
        let session = valid_single_file_session();

        assert!(lifecycle.submit(&session, &transport));
        assert!(!lifecycle.submit(&session, &transport));
        assert!(!lifecycle.can_submit(&session));
        assert_eq!(transport.requests.borrow().len(), 1);
    }

    #[test]
    fn single_id_normalizes_to_sequence() {
        let transport = ScriptedTransport::default();
        let mut lifecycle = UploadLifecycle::new();
        let session = valid_single_file_session();

        lifecycle.submit(&session, &transport);
        transport
            .reporter(0)
            .settle(Ok(CreatedResponse::One { id: "v1".into() }));

        let updates = lifecycle.poll();
        assert_eq!(
            updates,
            vec![LifecycleUpdate::Succeeded {
                created_ids: vec!["v1".into()]
            }]
        );
        assert_eq!(lifecycle.state(), LifecycleState::Succeeded);
        assert_eq!(
            lifecycle.outcome(),
            Some(&UploadOutcome::Success {
                created_ids: vec!["v1".into()]
            })
        );
        assert!(lifecycle.poll().is_empty());
    }

    #[test]
    fn progress_is_clamped_and_shown_in_label() {
        let transport = ScriptedTransport::default();
        let mut lifecycle = UploadLifecycle::new();
        let session = valid_single_file_session();

        assert_eq!(lifecycle.submit_label(&session), SubmitLabel::Import);
        lifecycle.submit(&session, &transport);
        assert_eq!(
            lifecycle.submit_label(&session),
            SubmitLabel::Importing { percent: None }
        );

        transport.reporter(0).progress(0.456);
        transport.reporter(0).progress(1.7);
        let updates = lifecycle.poll();
        assert_eq!(
            updates,
            vec![LifecycleUpdate::Progress(0.456), LifecycleUpdate::Progress(1.0)]
        );
        assert_eq!(lifecycle.state(), LifecycleState::Submitting);
        assert_eq!(
            lifecycle.submit_label(&session).to_string(),
            "100% Importing…"
        );
    }

    #[test]
    fn failure_keeps_session_alive_for_resubmit() {
        let transport = ScriptedTransport::default();
        let mut lifecycle = UploadLifecycle::new();
        let session = valid_single_file_session();

        lifecycle.submit(&session, &transport);
        assert!(!lifecycle.teardown_on_tap());

        transport.reporter(0).settle(Err(TransportFailure::unknown()));
        let updates = lifecycle.poll();
        assert_eq!(updates, vec![LifecycleUpdate::Failed(TransportFailure::unknown())]);
        assert_eq!(lifecycle.state(), LifecycleState::Failed);
        assert_eq!(lifecycle.field_error(), Some("Unknown Error"));
        assert!(lifecycle.teardown_on_tap());
        assert_eq!(lifecycle.submit_label(&session), SubmitLabel::Import);

        assert!(lifecycle.submit(&session, &transport));
        assert_eq!(lifecycle.field_error(), None);
        assert_eq!(transport.requests.borrow().len(), 2);
    }

    #[test]
    fn teardown_while_submitting_cancels_once_and_ignores_late_results() {
        let transport = ScriptedTransport::cancellable();
        let mut lifecycle = UploadLifecycle::new();
        let session = valid_single_file_session();

        lifecycle.submit(&session, &transport);
        lifecycle.teardown();
        lifecycle.teardown();
        assert_eq!(transport.cancels.load(Ordering::SeqCst), 1);
        assert_eq!(lifecycle.state(), LifecycleState::Cancelled);

        transport
            .reporter(0)
            .settle(Ok(CreatedResponse::One { id: "late".into() }));
        assert!(lifecycle.poll().is_empty());
        assert_eq!(lifecycle.state(), LifecycleState::Cancelled);
        assert_eq!(lifecycle.outcome(), Some(&UploadOutcome::Cancelled));
    }

    #[test]
    fn teardown_without_cancel_capability_still_cancels_state() {
        let transport = ScriptedTransport::default();
        let mut lifecycle = UploadLifecycle::new();
        let session = valid_single_file_session();

        lifecycle.submit(&session, &transport);
        lifecycle.teardown();
        assert_eq!(transport.cancels.load(Ordering::SeqCst), 0);
        assert_eq!(lifecycle.state(), LifecycleState::Cancelled);
    }

    #[test]
    fn teardown_when_idle_or_settled_is_noop() {
        let transport = ScriptedTransport::cancellable();
        let mut lifecycle = UploadLifecycle::new();
        lifecycle.teardown();
        assert_eq!(lifecycle.state(), LifecycleState::Idle);

        let session = valid_single_file_session();
        lifecycle.submit(&session, &transport);
        transport
            .reporter(0)
            .settle(Ok(CreatedResponse::Many {
                vertex_ids: vec!["a".into(), "b".into()],
            }));
        lifecycle.poll();
        lifecycle.teardown();
        assert_eq!(transport.cancels.load(Ordering::SeqCst), 0);
        assert_eq!(lifecycle.state(), LifecycleState::Succeeded);
    }

    #[test]
    fn metadata_only_create_uses_create_labels() {
        let transport = ScriptedTransport::default();
        let mut lifecycle = UploadLifecycle::new();
        let mut session = ImportSession::new();
        session.set_metadata(
            Scope::Collapsed,
            MetadataField::Label(LabelValue::new("", true)),
        );
        session.set_metadata(
            Scope::Collapsed,
            MetadataField::Justification(JustificationValue::new("seen", true)),
        );
        session.set_metadata(
            Scope::Collapsed,
            MetadataField::Classification(Some("person".into())),
        );

        assert_eq!(lifecycle.submit_label(&session), SubmitLabel::Create);
        assert!(lifecycle.submit(&session, &transport));
        assert_eq!(
            lifecycle.submit_label(&session),
            SubmitLabel::Creating { percent: None }
        );
        assert_eq!(transport.requests.borrow()[0].kind(), "create");
    }
}
