mod state;
mod ui;

use crate::cloud::CloudImportBridge;
use crate::config::AppConfig;
use crate::events::{AnchorPosition, ImportSignal, SessionEvent};
use crate::import::{
    FileDescriptor, ImportSession, JustificationValue, LabelValue, Scope, StringPayload,
    UploadOutcome,
};
use crate::popover::ImportPopover;
use crate::upload::{HttpTransport, LifecycleState};
use eframe::{egui, App};
pub use state::{ActivityState, EditorState};
use state::{editor_scopes, validate_justification, validate_label};
use std::sync::mpsc::{channel, Receiver, Sender};
use std::time::Duration;
use tracing::{debug, info, warn};

pub struct FileImportApp {
    config: AppConfig,
    transport: HttpTransport,
    bridge: CloudImportBridge,
    popover: Option<ImportPopover>,
    editors: EditorState,
    activity: ActivityState,
    signals: Sender<ImportSignal>,
    signal_receiver: Receiver<ImportSignal>,
    paste_text: String,
    paste_mime_type: String,
    error_message: Option<String>,
}

impl FileImportApp {
    pub fn new(
        _cc: &eframe::CreationContext<'_>,
        config: AppConfig,
        transport: HttpTransport,
        bridge: CloudImportBridge,
    ) -> Self {
        info!(
            "Initializing file import against {} with {} cloud source(s)",
            config.base_url,
            bridge.registry().sources().len()
        );
        let (signals, signal_receiver) = channel();
        Self {
            config,
            transport,
            bridge,
            popover: None,
            editors: EditorState::default(),
            activity: ActivityState::default(),
            signals,
            signal_receiver,
            paste_text: String::new(),
            paste_mime_type: "text/plain".to_string(),
            error_message: None,
        }
    }

    pub fn open_import(&mut self, session: ImportSession, anchor: Option<AnchorPosition>) {
        if let Some(mut previous) = self.popover.take() {
            previous.teardown();
        }
        self.error_message = None;
        self.editors.clear();
        self.popover = Some(ImportPopover::open(session, anchor, self.signals.clone()));
        self.announce_editors();
    }

    pub fn open_file_import(&mut self, anchor: Option<AnchorPosition>) {
        if let Some(files) = self.pick_files() {
            self.open_import(ImportSession::with_files(files), anchor);
        }
    }

    pub fn open_text_import(&mut self, anchor: Option<AnchorPosition>) {
        if self.paste_text.trim().is_empty() {
            self.error_message = Some("Nothing to import".to_string());
            return;
        }
        let payload = StringPayload {
            content: self.paste_text.clone(),
            mime_type: self.paste_mime_type.clone(),
        };
        self.open_import(
            ImportSession::with_string(payload, Some("Pasted Text".to_string())),
            anchor,
        );
    }

    pub fn pick_files(&mut self) -> Option<Vec<FileDescriptor>> {
        let paths = rfd::FileDialog::new().pick_files()?;
        let mut files = Vec::with_capacity(paths.len());
        for path in paths {
            match FileDescriptor::from_path(&path) {
                Ok(file) => files.push(file),
                Err(e) => {
                    warn!("Skipping {:?}: {}", path, e);
                    self.error_message = Some(format!("Could not read {}: {}", path.display(), e));
                }
            }
        }
        Some(files)
    }

    /// Dropped files seed a new import, or fill an open one that has nothing
    /// attached yet.
    fn handle_dropped_files(&mut self, ctx: &egui::Context) {
        let dropped = ctx.input(|i| i.raw.dropped_files.clone());
        if dropped.is_empty() {
            return;
        }
        let files = dropped_descriptors(&dropped);
        if files.is_empty() {
            self.error_message = Some("Dropped items could not be read".to_string());
            return;
        }

        info!("{} file(s) dropped", files.len());
        match self.popover.as_ref().map(ImportPopover::can_select_files) {
            Some(true) => self.dispatch(SessionEvent::FilesSelected(files)),
            Some(false) => debug!("Open import already has content, ignoring dropped files"),
            None => self.open_import(ImportSession::with_files(files), None),
        }
    }

    fn dispatch(&mut self, event: SessionEvent) {
        let files_changed = matches!(&event, SessionEvent::FilesSelected(files) if !files.is_empty());
        if let Some(popover) = self.popover.as_mut() {
            popover.dispatch(event, &self.transport, &self.bridge);
        }
        if files_changed {
            self.announce_editors();
        }
    }

    /// Freshly created editors report their starting values, as the label
    /// and justification widgets do when attached.
    fn announce_editors(&mut self) {
        let Some(popover) = self.popover.as_ref() else {
            return;
        };
        self.editors.reset_for(popover.session());

        let mut events = Vec::new();
        for scope in editor_scopes(popover.session()) {
            let text = self.editors.label_mut(scope).clone();
            let valid = validate_label(&text);
            events.push(SessionEvent::LabelChanged(scope, LabelValue::new(text, valid)));
        }
        let justification = self.editors.justification.clone();
        let valid = validate_justification(&justification);
        events.push(SessionEvent::JustificationChanged(
            Scope::Collapsed,
            JustificationValue::new(justification, valid),
        ));

        for event in events {
            self.dispatch(event);
        }
    }

    pub fn update_state(&mut self, ctx: &egui::Context) {
        if let Some(popover) = self.popover.as_mut() {
            popover.pump(&self.transport, &mut self.bridge);
        }
        self.bridge.poll(&self.signals);

        while let Ok(signal) = self.signal_receiver.try_recv() {
            info!("Import signal: {:?}", signal);
            self.activity.apply(signal);
        }

        if self.popover.as_ref().map_or(false, ImportPopover::is_torn_down) {
            if let Some(closed) = self.popover.take() {
                let lifecycle = closed.lifecycle();
                debug!("Import closed in {:?} state", lifecycle.state());
                if matches!(lifecycle.outcome(), Some(UploadOutcome::Cancelled)) {
                    self.error_message = Some("Upload cancelled".to_string());
                }
            }
            self.editors.clear();
        }

        let busy = self
            .popover
            .as_ref()
            .map_or(false, |p| {
                p.lifecycle().state() == LifecycleState::Submitting || p.is_teardown_scheduled()
            });
        if busy || self.bridge.pending_count() > 0 {
            ctx.request_repaint_after(Duration::from_millis(100));
        }
    }
}

impl App for FileImportApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.handle_dropped_files(ctx);
        self.update_state(ctx);
        self.render(ctx);
    }
}

/// Native drops carry a path; web drops carry the bytes themselves.
fn dropped_descriptors(dropped: &[egui::DroppedFile]) -> Vec<FileDescriptor> {
    dropped
        .iter()
        .filter_map(|file| {
            if let Some(bytes) = &file.bytes {
                let name = if file.name.is_empty() {
                    "Dropped file".to_string()
                } else {
                    file.name.clone()
                };
                return Some(FileDescriptor::from_bytes(name, bytes.clone()));
            }
            let path = file.path.as_ref()?;
            match FileDescriptor::from_path(path) {
                Ok(descriptor) => Some(descriptor),
                Err(e) => {
                    warn!("Skipping dropped {:?}: {}", path, e);
                    None
                }
            }
        })
        .collect()
}
