use crate::cloud::{ActiveSurface, CloudImportBridge, CloudImportRequest};
use crate::events::{AnchorPosition, ImportSignal, SessionEvent};
use crate::import::{ImportSession, MetadataField};
use crate::upload::{LifecycleUpdate, UploadLifecycle, UploadTransport};
use std::sync::mpsc::{channel, Receiver, Sender};
use tracing::{debug, info, warn};

#[derive(Debug)]
pub enum PopoverView {
    Form,
    CloudSources,
    CloudSurface(ActiveSurface),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Teardown {
    Live,
    /// Runs at the start of the next `pump`, after listeners saw this one's signals.
    Scheduled,
    Done,
}

/// One open import surface: owns its session and upload lifecycle exclusively.
#[derive(Debug)]
pub struct ImportPopover {
    session: ImportSession,
    lifecycle: UploadLifecycle,
    view: PopoverView,
    anchor: Option<AnchorPosition>,
    signals: Sender<ImportSignal>,
    cloud_sender: Sender<CloudImportRequest>,
    cloud_requests: Receiver<CloudImportRequest>,
    surface_error: Option<String>,
    teardown: Teardown,
}

impl ImportPopover {
    pub fn open(
        session: ImportSession,
        anchor: Option<AnchorPosition>,
        signals: Sender<ImportSignal>,
    ) -> Self {
        info!(
            "Opening import with {} file(s), string payload: {}",
            session.files().len(),
            session.string_payload().is_some()
        );
        let (cloud_sender, cloud_requests) = channel();
        Self {
            session,
            lifecycle: UploadLifecycle::new(),
            view: PopoverView::Form,
            anchor,
            signals,
            cloud_sender,
            cloud_requests,
            surface_error: None,
            teardown: Teardown::Live,
        }
    }

    pub fn dispatch(
        &mut self,
        event: SessionEvent,
        transport: &dyn UploadTransport,
        bridge: &CloudImportBridge,
    ) {
        if self.teardown != Teardown::Live {
            debug!("Dropping {:?} for closed import", event);
            return;
        }

        match event {
            SessionEvent::FilesSelected(files) => {
                // An emptied picker leaves the current selection alone.
                if files.is_empty() {
                    return;
                }
                if self.lifecycle.is_submitting() {
                    debug!("Ignoring {} selected file(s) while submitting", files.len());
                    return;
                }
                self.session.set_files(files);
            }
            SessionEvent::LabelChanged(scope, label) => {
                self.session.set_metadata(scope, MetadataField::Label(label))
            }
            SessionEvent::JustificationChanged(scope, justification) => self
                .session
                .set_metadata(scope, MetadataField::Justification(justification)),
            SessionEvent::ClassificationChanged(scope, classification) => self
                .session
                .set_metadata(scope, MetadataField::Classification(classification)),
            SessionEvent::CollapseToggled(checked) => {
                self.session.toggle_collapsed(checked);
                self.lifecycle.clear_field_error();
            }
            SessionEvent::Submit => {
                self.submit(transport);
            }
            SessionEvent::Cancel => self.teardown(),
            SessionEvent::OutsideInteraction => {
                if self.lifecycle.teardown_on_tap() {
                    self.teardown();
                }
            }
            SessionEvent::ShowCloudSources => {
                if !bridge.registry().is_empty() {
                    self.view = PopoverView::CloudSources;
                }
            }
            SessionEvent::CloudSourceSelected(identifier) => {
                match bridge.select(&identifier, self.cloud_sender.clone()) {
                    Ok(active) => {
                        self.surface_error = None;
                        self.view = PopoverView::CloudSurface(active);
                    }
                    Err(e) => {
                        warn!("Could not open cloud source {}: {}", identifier, e);
                        self.surface_error = Some(e.to_string());
                    }
                }
            }
        }
    }

    pub fn submit(&mut self, transport: &dyn UploadTransport) -> bool {
        if self.teardown != Teardown::Live {
            return false;
        }
        self.lifecycle.submit(&self.session, transport)
    }

    /// Called once per UI frame: runs a scheduled teardown, forwards cloud
    /// imports and delivers upload results.
    pub fn pump(&mut self, transport: &dyn UploadTransport, bridge: &mut CloudImportBridge) {
        if self.teardown == Teardown::Scheduled {
            self.teardown();
        }
        if self.teardown == Teardown::Done {
            return;
        }

        if let Ok(request) = self.cloud_requests.try_recv() {
            bridge.forward(request, transport, &self.signals);
            self.teardown();
            return;
        }

        for update in self.lifecycle.poll() {
            if let LifecycleUpdate::Succeeded { created_ids } = update {
                self.signals
                    .send(ImportSignal::FileImportSuccess {
                        vertex_ids: created_ids.clone(),
                        position: self.anchor,
                    })
                    .unwrap_or_default();
                self.signals
                    .send(ImportSignal::SelectObjects {
                        vertex_ids: created_ids,
                    })
                    .unwrap_or_default();
                self.teardown = Teardown::Scheduled;
            }
        }
    }

    /// The picker stays hidden while a request built from the session is out.
    pub fn can_select_files(&self) -> bool {
        self.session.can_select_files() && !self.lifecycle.is_submitting()
    }

    pub fn teardown(&mut self) {
        if self.teardown == Teardown::Done {
            return;
        }
        if let PopoverView::CloudSurface(active) = &mut self.view {
            active.surface.teardown();
        }
        self.lifecycle.teardown();
        self.view = PopoverView::Form;
        self.teardown = Teardown::Done;
        info!("Import closed");
    }

    pub fn is_torn_down(&self) -> bool {
        self.teardown == Teardown::Done
    }

    pub fn is_teardown_scheduled(&self) -> bool {
        self.teardown == Teardown::Scheduled
    }

    pub fn session(&self) -> &ImportSession {
        &self.session
    }

    pub fn lifecycle(&self) -> &UploadLifecycle {
        &self.lifecycle
    }

    pub fn anchor(&self) -> Option<AnchorPosition> {
        self.anchor
    }

    pub fn view(&self) -> &PopoverView {
        &self.view
    }

    pub fn view_mut(&mut self) -> &mut PopoverView {
        &mut self.view
    }

    pub fn surface_error(&self) -> Option<&str> {
        self.surface_error.as_deref()
    }
}

impl Drop for ImportPopover {
    fn drop(&mut self) {
        self.teardown();
    }
}
