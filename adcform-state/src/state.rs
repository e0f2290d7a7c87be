//! State file structures for persisting appliance state

use std::collections::HashMap;

use adcform_core::resource::{ResourceId, State, Value};
use serde::{Deserialize, Serialize};

/// The state file persisted to the backend
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StateFile {
    /// State file format version
    pub version: u32,
    /// Monotonically increasing number for each state modification
    pub serial: u64,
    /// Unique identifier for this state lineage
    pub lineage: String,
    /// Version of adcform that last modified this state
    pub adcform_version: String,
    /// All managed objects
    pub resources: Vec<ResourceState>,
}

impl StateFile {
    /// Current state file format version
    pub const CURRENT_VERSION: u32 = 1;

    pub fn new() -> Self {
        Self {
            version: Self::CURRENT_VERSION,
            serial: 0,
            lineage: uuid::Uuid::new_v4().to_string(),
            adcform_version: env!("CARGO_PKG_VERSION").to_string(),
            resources: Vec::new(),
        }
    }

    /// Increment serial and stamp the current version for a new write
    pub fn increment_serial(&mut self) {
        self.serial += 1;
        self.adcform_version = env!("CARGO_PKG_VERSION").to_string();
    }

    pub fn find_resource(&self, resource_type: &str, name: &str) -> Option<&ResourceState> {
        self.resources
            .iter()
            .find(|r| r.resource_type == resource_type && r.name == name)
    }

    pub fn find_resource_mut(
        &mut self,
        resource_type: &str,
        name: &str,
    ) -> Option<&mut ResourceState> {
        self.resources
            .iter_mut()
            .find(|r| r.resource_type == resource_type && r.name == name)
    }

    /// Add or replace a resource
    pub fn upsert_resource(&mut self, resource: ResourceState) {
        if let Some(existing) = self.find_resource_mut(&resource.resource_type, &resource.name) {
            *existing = resource;
        } else {
            self.resources.push(resource);
        }
    }

    pub fn remove_resource(&mut self, resource_type: &str, name: &str) -> Option<ResourceState> {
        let pos = self
            .resources
            .iter()
            .position(|r| r.resource_type == resource_type && r.name == name)?;
        Some(self.resources.remove(pos))
    }

    /// Appliance identifiers keyed by resource
    pub fn identifiers(&self) -> HashMap<ResourceId, String> {
        self.resources
            .iter()
            .filter_map(|r| Some((r.resource_id(), r.identifier.clone()?)))
            .collect()
    }
}

impl Default for StateFile {
    fn default() -> Self {
        Self::new()
    }
}

/// State of a single managed object
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResourceState {
    /// Resource type (e.g., "ltm_pool", "net_selfip")
    pub resource_type: String,
    /// Resource name (key in the configuration document)
    pub name: String,
    /// Provider name (e.g., "adc")
    pub provider: String,
    /// Appliance identifier (full path, tenant list, policy id, ...)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub identifier: Option<String>,
    /// Attributes as JSON values
    pub attributes: HashMap<String, serde_json::Value>,
}

impl ResourceState {
    pub fn new(
        resource_type: impl Into<String>,
        name: impl Into<String>,
        provider: impl Into<String>,
    ) -> Self {
        Self {
            resource_type: resource_type.into(),
            name: name.into(),
            provider: provider.into(),
            identifier: None,
            attributes: HashMap::new(),
        }
    }

    /// Snapshot of an observed state; attributes with no JSON form are dropped
    pub fn from_state(state: &State, provider: impl Into<String>) -> Self {
        Self {
            resource_type: state.id.resource_type.clone(),
            name: state.id.name.clone(),
            provider: provider.into(),
            identifier: state.identifier.clone(),
            attributes: state
                .attributes
                .iter()
                .filter_map(|(k, v)| Some((k.clone(), v.to_json()?)))
                .collect(),
        }
    }

    pub fn with_identifier(mut self, identifier: impl Into<String>) -> Self {
        self.identifier = Some(identifier.into());
        self
    }

    pub fn with_attribute(mut self, key: impl Into<String>, value: serde_json::Value) -> Self {
        self.attributes.insert(key.into(), value);
        self
    }

    pub fn resource_id(&self) -> ResourceId {
        ResourceId::new(&self.resource_type, &self.name)
    }

    /// Attributes as configuration values
    pub fn values(&self) -> HashMap<String, Value> {
        self.attributes
            .iter()
            .filter_map(|(k, v)| Some((k.clone(), Value::from_json(v)?)))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_state_file_new() {
        let state = StateFile::new();
        assert_eq!(state.version, StateFile::CURRENT_VERSION);
        assert_eq!(state.serial, 0);
        assert!(!state.lineage.is_empty());
        assert!(state.resources.is_empty());
    }

    #[test]
    fn test_state_file_increment_serial() {
        let mut state = StateFile::new();
        state.increment_serial();
        state.increment_serial();
        assert_eq!(state.serial, 2);
    }

    #[test]
    fn test_state_file_upsert_resource() {
        let mut state = StateFile::new();

        state.upsert_resource(
            ResourceState::new("ltm_pool", "web", "adc")
                .with_identifier("/Common/web")
                .with_attribute("load_balancing_mode", serde_json::json!("round-robin")),
        );
        state.upsert_resource(
            ResourceState::new("ltm_pool", "web", "adc")
                .with_identifier("/Common/web")
                .with_attribute(
                    "load_balancing_mode",
                    serde_json::json!("least-connections-member"),
                ),
        );

        assert_eq!(state.resources.len(), 1);
        assert_eq!(
            state.resources[0].attributes.get("load_balancing_mode"),
            Some(&serde_json::json!("least-connections-member"))
        );
    }

    #[test]
    fn test_state_file_remove_resource() {
        let mut state = StateFile::new();
        state.upsert_resource(ResourceState::new("net_vlan", "external", "adc"));

        assert!(state.remove_resource("net_vlan", "external").is_some());
        assert!(state.resources.is_empty());
        assert!(state.remove_resource("net_vlan", "internal").is_none());
    }

    #[test]
    fn test_identifiers_skip_unidentified_resources() {
        let mut state = StateFile::new();
        state.upsert_resource(
            ResourceState::new("net_selfip", "self", "adc").with_identifier("/Common/test-selfip"),
        );
        state.upsert_resource(ResourceState::new("sys_dns", "dns", "adc"));

        let identifiers = state.identifiers();
        assert_eq!(identifiers.len(), 1);
        assert_eq!(
            identifiers.get(&ResourceId::new("net_selfip", "self")),
            Some(&"/Common/test-selfip".to_string())
        );
    }

    #[test]
    fn test_resource_state_from_observed_state() {
        let observed = State::existing(
            ResourceId::new("ssl_key", "web"),
            HashMap::from([
                ("content".to_string(), Value::String("PEM".to_string())),
                ("key_size".to_string(), Value::Int(2048)),
            ]),
        )
        .with_identifier("/Common/web.key");

        let resource = ResourceState::from_state(&observed, "adc");

        assert_eq!(resource.identifier.as_deref(), Some("/Common/web.key"));
        assert_eq!(resource.values(), observed.attributes);
    }

    #[test]
    fn test_state_file_serialization() {
        let mut state = StateFile::new();
        state.upsert_resource(
            ResourceState::new("as3", "app", "adc").with_identifier("Sample_01,Sample_02"),
        );

        let json = serde_json::to_string_pretty(&state).unwrap();
        let deserialized: StateFile = serde_json::from_str(&json).unwrap();

        assert_eq!(deserialized.lineage, state.lineage);
        assert_eq!(
            deserialized.resources[0].identifier.as_deref(),
            Some("Sample_01,Sample_02")
        );
    }
}
