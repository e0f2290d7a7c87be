//! Resource - Representing resources and their state

use std::collections::{HashMap, HashSet};
use std::fmt;

/// Unique identifier for a resource
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ResourceId {
    /// Resource type (e.g., "ltm_pool", "net_selfip")
    pub resource_type: String,
    /// Resource name (key used in the configuration document)
    pub name: String,
}

impl ResourceId {
    pub fn new(resource_type: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            resource_type: resource_type.into(),
            name: name.into(),
        }
    }
}

impl fmt::Display for ResourceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.resource_type, self.name)
    }
}

/// Attribute value of a resource
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    String(String),
    Int(i64),
    Bool(bool),
    List(Vec<Value>),
    Map(HashMap<String, Value>),
    /// Reference to another object's attribute (binding, attribute_name).
    ///
    /// Bindings are `<type>.<name>` for managed resources and
    /// `data.<type>.<name>` for data sources.
    ResourceRef(String, String),
}

impl Value {
    /// Convert to JSON. Unresolved references have no JSON form.
    pub fn to_json(&self) -> Option<serde_json::Value> {
        match self {
            Value::String(s) => Some(serde_json::Value::String(s.clone())),
            Value::Int(i) => Some(serde_json::Value::from(*i)),
            Value::Bool(b) => Some(serde_json::Value::Bool(*b)),
            Value::List(items) => Some(serde_json::Value::Array(
                items.iter().filter_map(Value::to_json).collect(),
            )),
            Value::Map(map) => {
                let mut obj = serde_json::Map::new();
                for (k, v) in map {
                    if let Some(json) = v.to_json() {
                        obj.insert(k.clone(), json);
                    }
                }
                Some(serde_json::Value::Object(obj))
            }
            Value::ResourceRef(_, _) => None,
        }
    }

    /// Convert from JSON. `null` has no Value form.
    pub fn from_json(value: &serde_json::Value) -> Option<Value> {
        match value {
            serde_json::Value::Null => None,
            serde_json::Value::String(s) => Some(Value::String(s.clone())),
            serde_json::Value::Bool(b) => Some(Value::Bool(*b)),
            serde_json::Value::Number(n) => {
                if let Some(i) = n.as_i64() {
                    Some(Value::Int(i))
                } else {
                    n.as_f64().map(|f| Value::Int(f as i64))
                }
            }
            serde_json::Value::Array(arr) => {
                Some(Value::List(arr.iter().filter_map(Value::from_json).collect()))
            }
            serde_json::Value::Object(obj) => {
                let map = obj
                    .iter()
                    .filter_map(|(k, v)| Value::from_json(v).map(|v| (k.clone(), v)))
                    .collect();
                Some(Value::Map(map))
            }
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    /// Returns true if this value (or anything nested in it) is still a reference
    pub fn has_refs(&self) -> bool {
        match self {
            Value::ResourceRef(_, _) => true,
            Value::List(items) => items.iter().any(Value::has_refs),
            Value::Map(map) => map.values().any(Value::has_refs),
            _ => false,
        }
    }

    /// Replace references with the bound attribute values that are known.
    /// Unknown references are left in place.
    pub fn resolve(&self, bindings: &HashMap<String, HashMap<String, Value>>) -> Value {
        match self {
            Value::ResourceRef(binding, attr) => bindings
                .get(binding)
                .and_then(|attrs| attrs.get(attr))
                .filter(|v| !v.has_refs())
                .cloned()
                .unwrap_or_else(|| self.clone()),
            Value::List(items) => Value::List(items.iter().map(|v| v.resolve(bindings)).collect()),
            Value::Map(map) => Value::Map(
                map.iter()
                    .map(|(k, v)| (k.clone(), v.resolve(bindings)))
                    .collect(),
            ),
            other => other.clone(),
        }
    }

    fn collect_refs(&self, deps: &mut HashSet<String>) {
        match self {
            Value::ResourceRef(binding, _) => {
                deps.insert(binding.clone());
            }
            Value::List(items) => items.iter().for_each(|v| v.collect_refs(deps)),
            Value::Map(map) => map.values().for_each(|v| v.collect_refs(deps)),
            _ => {}
        }
    }
}

/// Desired state declared in the configuration document
#[derive(Debug, Clone, PartialEq)]
pub struct Resource {
    pub id: ResourceId,
    pub attributes: HashMap<String, Value>,
    /// If true, this is a data source (read-only) that won't be modified
    pub read_only: bool,
}

impl Resource {
    pub fn new(resource_type: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: ResourceId::new(resource_type, name),
            attributes: HashMap::new(),
            read_only: false,
        }
    }

    pub fn with_attribute(mut self, key: impl Into<String>, value: Value) -> Self {
        self.attributes.insert(key.into(), value);
        self
    }

    pub fn with_read_only(mut self, read_only: bool) -> Self {
        self.read_only = read_only;
        self
    }

    /// Returns true if this resource is a data source (read-only)
    pub fn is_data_source(&self) -> bool {
        self.read_only
    }

    /// Name other objects use to reference this one
    pub fn binding(&self) -> String {
        if self.read_only {
            format!("data.{}", self.id)
        } else {
            self.id.to_string()
        }
    }

    /// Bindings this resource references
    pub fn dependencies(&self) -> HashSet<String> {
        let mut deps = HashSet::new();
        for value in self.attributes.values() {
            value.collect_refs(&mut deps);
        }
        deps
    }

    /// Copy of this resource with every known reference substituted
    pub fn resolved(&self, bindings: &HashMap<String, HashMap<String, Value>>) -> Resource {
        let mut resolved = self.clone();
        for value in resolved.attributes.values_mut() {
            *value = value.resolve(bindings);
        }
        resolved
    }

    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.attributes.get(key).and_then(Value::as_str)
    }

    pub fn get_int(&self, key: &str) -> Option<i64> {
        match self.attributes.get(key) {
            Some(Value::Int(i)) => Some(*i),
            _ => None,
        }
    }

    pub fn get_bool(&self, key: &str) -> Option<bool> {
        match self.attributes.get(key) {
            Some(Value::Bool(b)) => Some(*b),
            _ => None,
        }
    }

    pub fn get_list(&self, key: &str) -> &[Value] {
        match self.attributes.get(key) {
            Some(Value::List(items)) => items,
            _ => &[],
        }
    }
}

/// Current state fetched from the appliance
#[derive(Debug, Clone, PartialEq)]
pub struct State {
    pub id: ResourceId,
    /// Appliance identifier (full path, tenant list, policy id, ...)
    pub identifier: Option<String>,
    pub attributes: HashMap<String, Value>,
    /// Whether this state exists
    pub exists: bool,
}

impl State {
    pub fn not_found(id: ResourceId) -> Self {
        Self {
            id,
            identifier: None,
            attributes: HashMap::new(),
            exists: false,
        }
    }

    pub fn existing(id: ResourceId, attributes: HashMap<String, Value>) -> Self {
        Self {
            id,
            identifier: None,
            attributes,
            exists: true,
        }
    }

    pub fn with_identifier(mut self, identifier: impl Into<String>) -> Self {
        self.identifier = Some(identifier.into());
        self
    }

    /// Fill in attributes the appliance does not report (secrets, uploaded
    /// content, produced documents) from the last persisted values.
    /// Observed attributes always win.
    pub fn merged_with(mut self, persisted: &HashMap<String, Value>) -> Self {
        if !self.exists {
            return self;
        }
        for (k, v) in persisted {
            self.attributes.entry(k.clone()).or_insert_with(|| v.clone());
        }
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn json_round_trip_drops_nulls() {
        let json = serde_json::json!({"a": 1, "b": null, "c": ["x", true]});
        let value = Value::from_json(&json).unwrap();
        let Value::Map(map) = &value else {
            panic!("Expected Map");
        };
        assert!(!map.contains_key("b"));
        assert_eq!(
            value.to_json().unwrap(),
            serde_json::json!({"a": 1, "c": ["x", true]})
        );
    }

    #[test]
    fn resolve_known_reference() {
        let mut bindings = HashMap::new();
        bindings.insert(
            "ltm_pool.web".to_string(),
            HashMap::from([(
                "name".to_string(),
                Value::String("/Common/web".to_string()),
            )]),
        );

        let value = Value::List(vec![
            Value::ResourceRef("ltm_pool.web".to_string(), "name".to_string()),
            Value::ResourceRef("ltm_pool.api".to_string(), "name".to_string()),
        ]);
        let resolved = value.resolve(&bindings);

        assert_eq!(
            resolved,
            Value::List(vec![
                Value::String("/Common/web".to_string()),
                Value::ResourceRef("ltm_pool.api".to_string(), "name".to_string()),
            ])
        );
        assert!(resolved.has_refs());
    }

    #[test]
    fn binding_distinguishes_data_sources() {
        let resource = Resource::new("as3_pool", "web");
        assert_eq!(resource.binding(), "as3_pool.web");
        assert_eq!(resource.with_read_only(true).binding(), "data.as3_pool.web");
    }

    #[test]
    fn dependencies_are_collected_from_nested_values() {
        let resource = Resource::new("as3", "main").with_attribute(
            "as3_json",
            Value::Map(HashMap::from([(
                "t".to_string(),
                Value::ResourceRef("data.as3_tenant.t".to_string(), "fragment".to_string()),
            )])),
        );
        assert!(resource.dependencies().contains("data.as3_tenant.t"));
    }

    #[test]
    fn merged_state_keeps_observed_values() {
        let id = ResourceId::new("ssl_certificate", "site");
        let observed = State::existing(
            id,
            HashMap::from([("name".to_string(), Value::String("site".to_string()))]),
        );
        let persisted = HashMap::from([
            ("name".to_string(), Value::String("old".to_string())),
            ("content".to_string(), Value::String("PEM".to_string())),
        ]);

        let merged = observed.merged_with(&persisted);
        assert_eq!(
            merged.attributes.get("name"),
            Some(&Value::String("site".to_string()))
        );
        assert_eq!(
            merged.attributes.get("content"),
            Some(&Value::String("PEM".to_string()))
        );
    }
}
