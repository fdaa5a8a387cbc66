use crate::error::{ImportError, Result};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{info, warn};

/// An alternate place content can be ingested from, e.g. an object store bucket.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CloudSource {
    /// Unique name of the source; also used to look up its display title.
    pub identifier: String,
    /// Which configuration surface collects the settings for an import.
    #[serde(rename = "componentPath")]
    pub component_path: String,
}

impl CloudSource {
    pub fn new(identifier: impl Into<String>, component_path: impl Into<String>) -> Self {
        Self {
            identifier: identifier.into(),
            component_path: component_path.into(),
        }
    }

    /// Accepts only objects with string `identifier` and `componentPath` fields.
    pub fn from_value(value: &Value) -> Result<Self> {
        let field = |name: &str| {
            value
                .get(name)
                .and_then(Value::as_str)
                .map(str::to_string)
                .ok_or_else(|| {
                    ImportError::InvalidRegistration(format!(
                        "`{}` must be a string in {}",
                        name, value
                    ))
                })
        };

        Ok(Self::new(field("identifier")?, field("componentPath")?))
    }
}

/// Registered cloud sources in registration order.
#[derive(Debug, Clone, Default)]
pub struct CloudSourceRegistry {
    sources: Vec<CloudSource>,
}

impl CloudSourceRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers every valid entry and logs the rest.
    pub fn from_values(values: &[Value]) -> Self {
        let mut registry = Self::new();
        for value in values {
            if let Err(e) = registry.register_value(value) {
                warn!("Skipping cloud source: {}", e);
            }
        }
        registry
    }

    pub fn register(&mut self, source: CloudSource) -> Result<()> {
        if self.get(&source.identifier).is_some() {
            return Err(ImportError::DuplicateSource(source.identifier));
        }
        info!(
            "Registered cloud source {} ({})",
            source.identifier, source.component_path
        );
        self.sources.push(source);
        Ok(())
    }

    pub fn register_value(&mut self, value: &Value) -> Result<()> {
        self.register(CloudSource::from_value(value)?)
    }

    pub fn get(&self, identifier: &str) -> Option<&CloudSource> {
        self.sources.iter().find(|s| s.identifier == identifier)
    }

    pub fn sources(&self) -> &[CloudSource] {
        &self.sources
    }

    pub fn is_empty(&self) -> bool {
        self.sources.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn rejects_entries_missing_either_field() {
        let mut registry = CloudSourceRegistry::new();
        for bad in [
            json!({"identifier": "s3"}),
            json!({"componentPath": "json"}),
            json!({"identifier": 7, "componentPath": "json"}),
            json!("s3"),
        ] {
            assert!(matches!(
                registry.register_value(&bad),
                Err(ImportError::InvalidRegistration(_))
            ));
        }
        assert!(registry.is_empty());
    }

    #[test]
    fn keeps_registration_order_and_rejects_duplicates() {
        let registry = CloudSourceRegistry::from_values(&[
            json!({"identifier": "s3", "componentPath": "json"}),
            json!({"identifier": "broken"}),
            json!({"identifier": "ftp", "componentPath": "ftp-form"}),
            json!({"identifier": "s3", "componentPath": "other"}),
        ]);

        let ids: Vec<_> = registry
            .sources()
            .iter()
            .map(|s| s.identifier.as_str())
            .collect();
        assert_eq!(ids, vec!["s3", "ftp"]);
        assert_eq!(registry.get("s3").unwrap().component_path, "json");
    }
}
