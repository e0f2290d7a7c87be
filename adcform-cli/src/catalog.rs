//! Schema catalog used to validate a configuration before touching the appliance

use std::collections::HashMap;

use adcform_core::config::sort_by_dependencies;
use adcform_core::resource::Resource;
use adcform_core::schema::ResourceSchema;
use adcform_provider::resources::{data_source_types, resource_types};

/// Every resource and data source schema the provider knows
pub struct Catalog {
    resources: HashMap<String, ResourceSchema>,
    data_sources: HashMap<String, ResourceSchema>,
}

impl Catalog {
    pub fn load() -> Self {
        Self {
            resources: resource_types()
                .iter()
                .map(|t| (t.name().to_string(), t.schema()))
                .collect(),
            data_sources: data_source_types()
                .iter()
                .map(|t| (t.name().to_string(), t.schema()))
                .collect(),
        }
    }

    pub fn lookup(&self, resource_type: &str, data_source: bool) -> Option<&ResourceSchema> {
        if data_source {
            self.data_sources.get(resource_type)
        } else {
            self.resources.get(resource_type)
        }
    }

    pub fn schema_for(&self, resource: &Resource) -> Option<&ResourceSchema> {
        self.lookup(&resource.id.resource_type, resource.is_data_source())
    }

    /// Sorted type names of one kind
    pub fn names(&self, data_source: bool) -> Vec<&str> {
        let map = if data_source {
            &self.data_sources
        } else {
            &self.resources
        };
        let mut names: Vec<&str> = map.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    /// Returns true if the attribute must be masked in output
    pub fn is_sensitive(&self, resource_type: &str, data_source: bool, attribute: &str) -> bool {
        self.lookup(resource_type, data_source)
            .is_some_and(|schema| schema.is_sensitive(attribute))
    }

    /// Fill in defaults, validate every object, and order them by their references
    pub fn prepare(&self, resources: &[Resource]) -> Result<Vec<Resource>, String> {
        let mut prepared = Vec::with_capacity(resources.len());
        let mut errors = Vec::new();

        for resource in resources {
            let Some(schema) = self.schema_for(resource) else {
                let kind = if resource.is_data_source() {
                    "data source"
                } else {
                    "resource"
                };
                errors.push(format!(
                    "{}: unknown {} type '{}'",
                    resource.binding(),
                    kind,
                    resource.id.resource_type
                ));
                continue;
            };

            let mut resource = resource.clone();
            schema.apply_defaults(&mut resource.attributes);
            if let Err(type_errors) = schema.validate(&resource.attributes) {
                for error in type_errors {
                    errors.push(format!("{}: {}", resource.binding(), error));
                }
            }
            prepared.push(resource);
        }

        if !errors.is_empty() {
            return Err(format!("Validation failed:\n  {}", errors.join("\n  ")));
        }

        sort_by_dependencies(&prepared).map_err(|e| e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use adcform_core::resource::Value;

    #[test]
    fn test_prepare_applies_defaults() {
        let catalog = Catalog::load();
        let node = Resource::new("ltm_node", "app1")
            .with_attribute("name", Value::String("/Common/app1".to_string()))
            .with_attribute("address", Value::String("10.0.0.10".to_string()));

        let prepared = catalog.prepare(&[node]).unwrap();

        assert_eq!(prepared[0].get_int("ratio"), Some(1));
        assert_eq!(prepared[0].get_str("rate_limit"), Some("disabled"));
    }

    #[test]
    fn test_prepare_reports_every_error() {
        let catalog = Catalog::load();
        let resources = vec![
            Resource::new("ltm_node", "app1"),
            Resource::new("ltm_bogus", "x"),
        ];

        let err = catalog.prepare(&resources).unwrap_err();

        assert!(err.contains("ltm_node.app1"));
        assert!(err.contains("unknown resource type 'ltm_bogus'"));
    }

    #[test]
    fn test_prepare_orders_by_reference() {
        let catalog = Catalog::load();
        let pool = Resource::new("ltm_pool", "web")
            .with_attribute("name", Value::String("/Common/web".to_string()))
            .with_attribute(
                "description",
                Value::ResourceRef("ltm_node.app1".to_string(), "address".to_string()),
            );
        let node = Resource::new("ltm_node", "app1")
            .with_attribute("name", Value::String("/Common/app1".to_string()))
            .with_attribute("address", Value::String("10.0.0.10".to_string()));

        let prepared = catalog.prepare(&[pool, node]).unwrap();

        let order: Vec<String> = prepared.iter().map(Resource::binding).collect();
        assert_eq!(order, vec!["ltm_node.app1", "ltm_pool.web"]);
    }

    #[test]
    fn test_data_sources_are_separate_namespace() {
        let catalog = Catalog::load();
        assert!(catalog.lookup("as3_pool", true).is_some());
        assert!(catalog.lookup("as3_pool", false).is_none());
        assert!(catalog.is_sensitive("ltm_monitor", false, "password"));
        assert!(!catalog.is_sensitive("ltm_monitor", false, "send"));
    }
}
