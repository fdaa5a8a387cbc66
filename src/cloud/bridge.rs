use super::registry::CloudSourceRegistry;
use super::surface::{CloudImportRequest, ConfigSurface, ImportAction, SurfaceFactory};
use crate::error::{ImportError, Result};
use crate::events::ImportSignal;
use crate::upload::{TaskEvent, UploadTask, UploadTransport};
use derivative::Derivative;
use std::sync::mpsc::Sender;
use tracing::{info, warn};

/// A configuration surface currently shown for one cloud source.
#[derive(Derivative)]
#[derivative(Debug)]
pub struct ActiveSurface {
    pub identifier: String,
    #[derivative(Debug = "ignore")]
    pub surface: Box<dyn ConfigSurface>,
}

#[derive(Debug)]
struct PendingCloudImport {
    identifier: String,
    task: UploadTask,
}

/// Connects registered cloud sources to their configuration surfaces and
/// carries the resulting imports to the transport.
///
/// Cloud imports outlive the session that started them, so their completion
/// is tracked here rather than by the session's upload lifecycle.
#[derive(Derivative)]
#[derivative(Debug)]
pub struct CloudImportBridge {
    registry: CloudSourceRegistry,
    #[derivative(Debug = "ignore")]
    factory: Box<dyn SurfaceFactory>,
    pending: Vec<PendingCloudImport>,
}

impl CloudImportBridge {
    pub fn new(registry: CloudSourceRegistry, factory: Box<dyn SurfaceFactory>) -> Self {
        Self {
            registry,
            factory,
            pending: Vec::new(),
        }
    }

    pub fn registry(&self) -> &CloudSourceRegistry {
        &self.registry
    }

    pub fn select(
        &self,
        identifier: &str,
        requests: Sender<CloudImportRequest>,
    ) -> Result<ActiveSurface> {
        let source = self
            .registry
            .get(identifier)
            .ok_or_else(|| ImportError::UnknownSource(identifier.to_string()))?;

        info!(
            "Opening configuration surface {} for {}",
            source.component_path, source.identifier
        );
        let action = ImportAction::new(source.identifier.clone(), requests);
        let surface = self.factory.instantiate(&source.component_path, action)?;

        Ok(ActiveSurface {
            identifier: source.identifier.clone(),
            surface,
        })
    }

    pub fn forward(
        &mut self,
        request: CloudImportRequest,
        transport: &dyn UploadTransport,
        signals: &Sender<ImportSignal>,
    ) {
        signals
            .send(ImportSignal::CloudImported {
                identifier: request.identifier.clone(),
                import_config: request.import_config.clone(),
            })
            .unwrap_or_default();

        let task = transport.cloud_import(&request.identifier, request.import_config);
        self.pending.push(PendingCloudImport {
            identifier: request.identifier,
            task,
        });
    }

    /// Checks on forwarded imports; each one that completes switches the
    /// user over to the activity view.
    pub fn poll(&mut self, signals: &Sender<ImportSignal>) {
        self.pending.retain_mut(|pending| {
            while let Some(event) = pending.task.try_next() {
                match event {
                    TaskEvent::Progress(_) => {}
                    TaskEvent::Settled(Ok(_)) => {
                        info!("Cloud import from {} accepted", pending.identifier);
                        signals
                            .send(ImportSignal::ShowActivityDisplay)
                            .unwrap_or_default();
                    }
                    TaskEvent::Settled(Err(e)) => {
                        warn!("Cloud import from {} failed: {}", pending.identifier, e);
                    }
                }
            }
            !pending.task.is_settled()
        });
    }

    pub fn pending_count(&self) -> usize {
        self.pending.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cloud::registry::CloudSource;
    use crate::cloud::testing::CapturingFactory;
    use crate::error::TransportFailure;
    use crate::import::CreatedResponse;
    use crate::upload::testing::ScriptedTransport;
    use serde_json::json;
    use std::sync::mpsc::channel;

    fn bridge() -> (CloudImportBridge, CapturingFactory) {
        let mut registry = CloudSourceRegistry::new();
        registry
            .register(CloudSource::new("s3", "s3/Config"))
            .unwrap();
        let factory = CapturingFactory::default();
        (
            CloudImportBridge::new(registry, Box::new(factory.clone())),
            factory,
        )
    }

    #[test]
    fn select_instantiates_the_registered_component() {
        let (bridge, factory) = bridge();
        let (sender, _receiver) = channel();

        let active = bridge.select("s3", sender.clone()).unwrap();
        assert_eq!(active.identifier, "s3");
        assert_eq!(factory.paths(), vec!["s3/Config".to_string()]);

        assert!(matches!(
            bridge.select("ftp", sender),
            Err(ImportError::UnknownSource(_))
        ));
    }

    #[test]
    fn forwarded_import_is_tagged_and_shows_activity_on_success() {
        let (mut bridge, _) = bridge();
        let transport = ScriptedTransport::default();
        let (signals, received) = channel();

        bridge.forward(
            CloudImportRequest {
                identifier: "s3".into(),
                import_config: json!({"bucket": "scans"}),
            },
            &transport,
            &signals,
        );

        assert_eq!(
            transport.cloud_imports.borrow().as_slice(),
            &[("s3".to_string(), json!({"bucket": "scans"}))]
        );
        assert_eq!(
            received.try_recv().unwrap(),
            ImportSignal::CloudImported {
                identifier: "s3".into(),
                import_config: json!({"bucket": "scans"}),
            }
        );

        bridge.poll(&signals);
        assert_eq!(bridge.pending_count(), 1);
        assert!(received.try_recv().is_err());

        transport
            .reporter(0)
            .settle(Ok(CreatedResponse::Many { vertex_ids: vec![] }));
        bridge.poll(&signals);
        assert_eq!(bridge.pending_count(), 0);
        assert_eq!(received.try_recv().unwrap(), ImportSignal::ShowActivityDisplay);
    }

    #[test]
    fn failed_cloud_import_is_dropped_quietly() {
        let (mut bridge, _) = bridge();
        let transport = ScriptedTransport::default();
        let (signals, received) = channel();

        bridge.forward(
            CloudImportRequest {
                identifier: "s3".into(),
                import_config: json!({}),
            },
            &transport,
            &signals,
        );
        received.try_recv().unwrap();

        transport.reporter(0).settle(Err(TransportFailure::unknown()));
        bridge.poll(&signals);
        assert_eq!(bridge.pending_count(), 0);
        assert!(received.try_recv().is_err());
    }
}
