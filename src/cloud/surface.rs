use crate::error::{ImportError, Result};
use eframe::egui;
use serde_json::Value;
use std::collections::BTreeMap;
use std::sync::mpsc::Sender;
use tracing::debug;

pub const JSON_COMPONENT_PATH: &str = "json";

#[derive(Debug, Clone, PartialEq)]
pub struct CloudImportRequest {
    pub identifier: String,
    pub import_config: Value,
}

/// The one capability a configuration surface gets: starting the import.
#[derive(Debug, Clone)]
pub struct ImportAction {
    identifier: String,
    requests: Sender<CloudImportRequest>,
}

impl ImportAction {
    pub fn new(identifier: impl Into<String>, requests: Sender<CloudImportRequest>) -> Self {
        Self {
            identifier: identifier.into(),
            requests,
        }
    }

    pub fn identifier(&self) -> &str {
        &self.identifier
    }

    pub fn import(&self, import_config: Value) {
        debug!("Cloud source {} requested import", self.identifier);
        self.requests
            .send(CloudImportRequest {
                identifier: self.identifier.clone(),
                import_config,
            })
            .unwrap_or_default();
    }
}

/// UI that collects source-specific settings before an import.
pub trait ConfigSurface {
    fn show(&mut self, ui: &mut egui::Ui);

    fn teardown(&mut self) {}
}

pub trait SurfaceFactory {
    fn instantiate(&self, component_path: &str, action: ImportAction)
        -> Result<Box<dyn ConfigSurface>>;
}

type SurfaceConstructor = Box<dyn Fn(ImportAction) -> Box<dyn ConfigSurface>>;

/// Maps component paths to the surfaces compiled into the application.
#[derive(Default)]
pub struct SurfaceCatalog {
    constructors: BTreeMap<String, SurfaceConstructor>,
}

impl SurfaceCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_builtin() -> Self {
        let mut catalog = Self::new();
        catalog.register(JSON_COMPONENT_PATH, |action| {
            Box::new(JsonConfigSurface::new(action))
        });
        catalog
    }

    pub fn register(
        &mut self,
        component_path: impl Into<String>,
        constructor: impl Fn(ImportAction) -> Box<dyn ConfigSurface> + 'static,
    ) {
        self.constructors
            .insert(component_path.into(), Box::new(constructor));
    }
}

impl SurfaceFactory for SurfaceCatalog {
    fn instantiate(
        &self,
        component_path: &str,
        action: ImportAction,
    ) -> Result<Box<dyn ConfigSurface>> {
        let constructor = self
            .constructors
            .get(component_path)
            .ok_or_else(|| ImportError::UnknownComponent(component_path.to_string()))?;
        Ok(constructor(action))
    }
}

/// Free-form JSON editor, for sources that need no dedicated form.
pub struct JsonConfigSurface {
    action: ImportAction,
    text: String,
    error: Option<String>,
}

impl JsonConfigSurface {
    pub fn new(action: ImportAction) -> Self {
        Self {
            action,
            text: "{}".to_string(),
            error: None,
        }
    }

    fn submit(&mut self) {
        match serde_json::from_str::<Value>(&self.text) {
            Ok(config) => {
                self.error = None;
                self.action.import(config);
            }
            Err(e) => self.error = Some(format!("Invalid JSON: {}", e)),
        }
    }
}

impl ConfigSurface for JsonConfigSurface {
    fn show(&mut self, ui: &mut egui::Ui) {
        ui.label(format!("Configuration for {}", self.action.identifier()));
        ui.add(
            egui::TextEdit::multiline(&mut self.text)
                .font(egui::TextStyle::Monospace)
                .desired_rows(6)
                .desired_width(f32::INFINITY),
        );
        if let Some(error) = &self.error {
            ui.colored_label(egui::Color32::from_rgb(220, 50, 50), error);
        }
        if ui.button("Import").clicked() {
            self.submit();
        }
    }
}
