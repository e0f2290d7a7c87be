//! Config - Load the declarative configuration document
//!
//! The document is JSON with four top-level blocks:
//!
//! ```json
//! {
//!   "provider":  { "address": "10.1.1.4", "username": "admin", "password": "..." },
//!   "backend":   { "type": "local", "path": "adcform.state.json" },
//!   "data":      { "as3_pool":  { "web": { "name": "web_pool" } } },
//!   "resources": { "ltm_pool":  { "web": { "name": "/Common/web" } } }
//! }
//! ```
//!
//! A string of the exact form `${<type>.<name>.<attr>}` or
//! `${data.<type>.<name>.<attr>}` is a reference to another object's attribute.

use std::collections::{BTreeMap, HashMap, HashSet};

use serde::Deserialize;
use thiserror::Error;

use crate::resource::{Resource, Value};

/// Errors raised while loading a configuration document
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid configuration document: {0}")]
    Json(#[from] serde_json::Error),

    #[error("{location}: invalid reference '{reference}'")]
    InvalidReference { location: String, reference: String },

    #[error("{from} references unknown object '{binding}'")]
    UnknownReference { from: String, binding: String },

    #[error("Dependency cycle involving {0}")]
    DependencyCycle(String),
}

/// State backend block
#[derive(Debug, Clone, Default)]
pub struct BackendBlock {
    /// Backend type (e.g., "local")
    pub backend_type: String,
    pub attributes: HashMap<String, Value>,
}

/// A loaded configuration document
#[derive(Debug, Clone)]
pub struct ParsedConfig {
    /// Raw provider block; the provider crate owns its shape
    pub provider: serde_json::Value,
    pub backend: Option<BackendBlock>,
    /// Data sources followed by managed resources, each group ordered by type then name
    pub resources: Vec<Resource>,
}

type ObjectBlock = BTreeMap<String, BTreeMap<String, serde_json::Map<String, serde_json::Value>>>;

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct RawDocument {
    #[serde(default)]
    provider: serde_json::Value,
    #[serde(default)]
    backend: Option<RawBackend>,
    #[serde(default)]
    data: ObjectBlock,
    #[serde(default)]
    resources: ObjectBlock,
}

#[derive(Deserialize)]
struct RawBackend {
    #[serde(rename = "type")]
    backend_type: String,
    #[serde(flatten)]
    attributes: serde_json::Map<String, serde_json::Value>,
}

/// Parse a configuration document
pub fn parse(content: &str) -> Result<ParsedConfig, ConfigError> {
    let raw: RawDocument = serde_json::from_str(content)?;

    let backend = match raw.backend {
        Some(b) => {
            let mut attributes = HashMap::new();
            for (k, v) in &b.attributes {
                if let Some(value) = config_value(v, &format!("backend.{}", k))? {
                    attributes.insert(k.clone(), value);
                }
            }
            Some(BackendBlock {
                backend_type: b.backend_type,
                attributes,
            })
        }
        None => None,
    };

    let mut resources = Vec::new();
    for (block, read_only) in [(&raw.data, true), (&raw.resources, false)] {
        for (resource_type, objects) in block {
            for (name, attrs) in objects {
                let mut resource = Resource::new(resource_type, name).with_read_only(read_only);
                for (key, json) in attrs {
                    let location = format!("{}.{}", resource.binding(), key);
                    if let Some(value) = config_value(json, &location)? {
                        resource.attributes.insert(key.clone(), value);
                    }
                }
                resources.push(resource);
            }
        }
    }

    Ok(ParsedConfig {
        provider: raw.provider,
        backend,
        resources,
    })
}

/// Convert a JSON attribute into a Value, recognizing references
fn config_value(json: &serde_json::Value, location: &str) -> Result<Option<Value>, ConfigError> {
    match json {
        serde_json::Value::String(s) if s.starts_with("${") => parse_reference(s)
            .map(Some)
            .ok_or_else(|| ConfigError::InvalidReference {
                location: location.to_string(),
                reference: s.clone(),
            }),
        serde_json::Value::Array(items) => {
            let mut values = Vec::new();
            for (i, item) in items.iter().enumerate() {
                if let Some(v) = config_value(item, &format!("{}[{}]", location, i))? {
                    values.push(v);
                }
            }
            Ok(Some(Value::List(values)))
        }
        serde_json::Value::Object(obj) => {
            let mut map = HashMap::new();
            for (k, v) in obj {
                if let Some(value) = config_value(v, &format!("{}.{}", location, k))? {
                    map.insert(k.clone(), value);
                }
            }
            Ok(Some(Value::Map(map)))
        }
        other => Ok(Value::from_json(other)),
    }
}

/// Parse `${type.name.attr}` / `${data.type.name.attr}` into a reference
pub fn parse_reference(s: &str) -> Option<Value> {
    let inner = s.strip_prefix("${")?.strip_suffix('}')?;
    let parts: Vec<&str> = inner.split('.').collect();
    if parts.iter().any(|p| p.is_empty()) {
        return None;
    }
    match parts.as_slice() {
        ["data", resource_type, name, attr] => Some(Value::ResourceRef(
            format!("data.{}.{}", resource_type, name),
            attr.to_string(),
        )),
        [resource_type, name, attr] if *resource_type != "data" => Some(Value::ResourceRef(
            format!("{}.{}", resource_type, name),
            attr.to_string(),
        )),
        _ => None,
    }
}

/// Sort resources topologically based on references
///
/// Resources keep their relative order unless a reference forces otherwise.
pub fn sort_by_dependencies(resources: &[Resource]) -> Result<Vec<Resource>, ConfigError> {
    let binding_to_resource: HashMap<String, &Resource> =
        resources.iter().map(|r| (r.binding(), r)).collect();

    for resource in resources {
        for dep in resource.dependencies() {
            if !binding_to_resource.contains_key(&dep) {
                return Err(ConfigError::UnknownReference {
                    from: resource.binding(),
                    binding: dep,
                });
            }
        }
    }

    let mut sorted = Vec::new();
    let mut visited: HashSet<String> = HashSet::new();
    let mut visiting: HashSet<String> = HashSet::new();

    fn visit(
        resource: &Resource,
        binding_to_resource: &HashMap<String, &Resource>,
        visited: &mut HashSet<String>,
        visiting: &mut HashSet<String>,
        sorted: &mut Vec<Resource>,
    ) -> Result<(), ConfigError> {
        let binding = resource.binding();

        if visited.contains(&binding) {
            return Ok(());
        }
        if !visiting.insert(binding.clone()) {
            return Err(ConfigError::DependencyCycle(binding));
        }

        // Visit dependencies first
        let mut deps: Vec<String> = resource.dependencies().into_iter().collect();
        deps.sort();
        for dep in deps {
            if let Some(dep_resource) = binding_to_resource.get(&dep) {
                visit(dep_resource, binding_to_resource, visited, visiting, sorted)?;
            }
        }

        visiting.remove(&binding);
        visited.insert(binding);
        sorted.push(resource.clone());
        Ok(())
    }

    for resource in resources {
        visit(
            resource,
            &binding_to_resource,
            &mut visited,
            &mut visiting,
            &mut sorted,
        )?;
    }

    Ok(sorted)
}

#[cfg(test)]
mod tests {
    use super::*;

    const DOCUMENT: &str = r#"{
        "provider": { "address": "10.1.1.4", "username": "admin", "password": "secret" },
        "backend": { "type": "local", "path": "test.state.json" },
        "data": {
            "as3_pool": { "web": { "name": "web_pool", "monitors": ["http"] } }
        },
        "resources": {
            "ltm_pool": { "web": { "name": "/Common/web", "allow_nat": true } },
            "ltm_pool_attachment": {
                "web_1": { "pool": "${ltm_pool.web.name}", "node": "/Common/10.0.0.1:80" }
            },
            "as3": { "main": { "as3_json": "${data.as3_pool.web.pool_json}" } }
        }
    }"#;

    #[test]
    fn parse_document_blocks() {
        let parsed = parse(DOCUMENT).unwrap();

        assert_eq!(parsed.provider["address"], "10.1.1.4");
        let backend = parsed.backend.unwrap();
        assert_eq!(backend.backend_type, "local");
        assert_eq!(
            backend.attributes.get("path"),
            Some(&Value::String("test.state.json".to_string()))
        );

        assert_eq!(parsed.resources.len(), 4);
        assert!(parsed.resources[0].is_data_source());
        assert_eq!(parsed.resources[0].binding(), "data.as3_pool.web");
    }

    #[test]
    fn references_are_parsed() {
        let parsed = parse(DOCUMENT).unwrap();
        let attachment = parsed
            .resources
            .iter()
            .find(|r| r.id.resource_type == "ltm_pool_attachment")
            .unwrap();
        assert_eq!(
            attachment.attributes.get("pool"),
            Some(&Value::ResourceRef(
                "ltm_pool.web".to_string(),
                "name".to_string()
            ))
        );
    }

    #[test]
    fn parse_reference_forms() {
        assert_eq!(
            parse_reference("${data.as3_tenant.t1.tenant_json}"),
            Some(Value::ResourceRef(
                "data.as3_tenant.t1".to_string(),
                "tenant_json".to_string()
            ))
        );
        assert!(parse_reference("${ltm_pool.web}").is_none());
        assert!(parse_reference("${data.as3_pool.web}").is_none());
        assert!(parse_reference("${ltm_pool..name}").is_none());
    }

    #[test]
    fn invalid_reference_is_an_error() {
        let doc = r#"{ "resources": { "ltm_pool": { "web": { "name": "${oops}" } } } }"#;
        let err = parse(doc).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidReference { .. }));
        assert!(err.to_string().contains("ltm_pool.web.name"));
    }

    #[test]
    fn unknown_top_level_block_is_rejected() {
        let doc = r#"{ "resource": {} }"#;
        assert!(matches!(parse(doc), Err(ConfigError::Json(_))));
    }

    #[test]
    fn sort_places_dependencies_first() {
        let parsed = parse(DOCUMENT).unwrap();
        let sorted = sort_by_dependencies(&parsed.resources).unwrap();
        let position = |binding: &str| sorted.iter().position(|r| r.binding() == binding).unwrap();

        assert!(position("ltm_pool.web") < position("ltm_pool_attachment.web_1"));
        assert!(position("data.as3_pool.web") < position("as3.main"));
    }

    #[test]
    fn sort_rejects_unknown_and_cyclic_references() {
        let unknown = vec![Resource::new("as3", "main").with_attribute(
            "as3_json",
            Value::ResourceRef("data.as3_adc.missing".to_string(), "as3_json".to_string()),
        )];
        assert!(matches!(
            sort_by_dependencies(&unknown),
            Err(ConfigError::UnknownReference { .. })
        ));

        let cyclic = vec![
            Resource::new("ltm_pool", "a")
                .with_attribute("description", Value::ResourceRef("ltm_pool.b".into(), "name".into())),
            Resource::new("ltm_pool", "b")
                .with_attribute("description", Value::ResourceRef("ltm_pool.a".into(), "name".into())),
        ];
        assert!(matches!(
            sort_by_dependencies(&cyclic),
            Err(ConfigError::DependencyCycle(_))
        ));
    }
}
