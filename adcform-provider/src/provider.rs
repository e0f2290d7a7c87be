//! Appliance provider implementation
//!
//! Table-driven resources are handled here directly; resources whose wire
//! format is not a flat field copy are dispatched to `handlers`.

use std::collections::HashMap;

use adcform_core::provider::{ProviderError, ProviderResult};
use adcform_core::resource::{Resource, ResourceId, State, Value};
use log::info;
use serde_json::json;

use crate::client::{ApplianceClient, ClientError};
use crate::codec;
use crate::config::ProviderConfig;
use crate::handlers;
use crate::schemas::ltm::MONITOR_TYPES;
use crate::schemas::{AdcSchemaConfig, Endpoint, Handler, Identity, Support, get_config};
use crate::utils::{
    format_destination, full_path, leaf_name, parse_destination, split_full_path, uri_name,
};

const MONITOR_COLLECTION: &str = "/mgmt/tm/ltm/monitor";

/// Wrap a client error with the failed operation and resource
pub(crate) fn op_error<'a>(
    operation: &'a str,
    id: &'a ResourceId,
) -> impl FnOnce(ClientError) -> ProviderError + 'a {
    move |e| {
        ProviderError::new(format!("{} failed", operation))
            .for_resource(id.clone())
            .with_cause(e)
    }
}

/// Look up the schema config of a managed resource
pub(crate) fn config_for(id: &ResourceId) -> ProviderResult<AdcSchemaConfig> {
    get_config(&id.resource_type).ok_or_else(|| {
        ProviderError::new(format!("Unknown resource type: {}", id.resource_type))
            .for_resource(id.clone())
    })
}

pub(crate) fn required_str<'a>(resource: &'a Resource, key: &str) -> ProviderResult<&'a str> {
    resource.get_str(key).ok_or_else(|| {
        ProviderError::new(format!("Missing required attribute '{}'", key))
            .for_resource(resource.id.clone())
    })
}

/// Appliance provider
pub struct AdcProvider {
    client: ApplianceClient,
}

impl AdcProvider {
    /// Create a provider from connection settings
    pub fn new(config: &ProviderConfig) -> ProviderResult<Self> {
        let client = ApplianceClient::new(config)
            .map_err(|e| ProviderError::new("Failed to configure provider").with_cause(e))?;
        Ok(Self::with_client(client))
    }

    pub fn with_client(client: ApplianceClient) -> Self {
        Self { client }
    }

    pub fn client(&self) -> &ApplianceClient {
        &self.client
    }

    // =========================================================================
    // Resource Operations
    // =========================================================================

    /// Read a resource by its appliance identifier
    pub async fn read_resource(
        &self,
        id: &ResourceId,
        identifier: Option<&str>,
    ) -> ProviderResult<State> {
        let config = config_for(id)?;

        let identifier = match identifier {
            Some(identifier) => identifier,
            None => return Ok(State::not_found(id.clone())),
        };

        match config.handler {
            Handler::Table => self.read_table(&config, id, identifier).await,
            Handler::PoolAttachment => {
                handlers::pool_attachment::read(&self.client, &config, id, identifier).await
            }
            Handler::Certificate | Handler::Key => {
                handlers::ssl::read(&self.client, &config, id, identifier).await
            }
            Handler::As3 => handlers::as3::read(&self.client, id, identifier).await,
            Handler::WafPolicy => {
                handlers::waf_policy::read(&self.client, &config, id, identifier).await
            }
        }
    }

    /// Create a resource
    pub async fn create_resource(&self, resource: Resource) -> ProviderResult<State> {
        let config = config_for(&resource.id)?;
        info!("Creating {}", resource.id);

        match config.handler {
            Handler::Table => self.create_table(&config, &resource).await,
            Handler::PoolAttachment => {
                handlers::pool_attachment::create(&self.client, &config, &resource).await
            }
            Handler::Certificate | Handler::Key => {
                handlers::ssl::install(&self.client, &config, &resource).await
            }
            Handler::As3 => handlers::as3::create(&self.client, &resource).await,
            Handler::WafPolicy => {
                handlers::waf_policy::create(&self.client, &config, &resource).await
            }
        }
    }

    /// Update a resource in place
    pub async fn update_resource(
        &self,
        id: ResourceId,
        identifier: &str,
        to: Resource,
    ) -> ProviderResult<State> {
        let config = config_for(&id)?;
        if config.update == Support::Unsupported {
            return Err(ProviderError::unsupported("update", config.type_name).for_resource(id));
        }
        info!("Updating {}", id);

        match config.handler {
            Handler::Table => self.update_table(&config, &id, identifier, &to).await,
            Handler::PoolAttachment => {
                handlers::pool_attachment::update(&self.client, &config, &id, identifier, &to)
                    .await
            }
            Handler::Certificate | Handler::Key => {
                handlers::ssl::install(&self.client, &config, &to).await
            }
            Handler::As3 => handlers::as3::update(&self.client, &id, identifier, &to).await,
            Handler::WafPolicy => {
                handlers::waf_policy::update(&self.client, &config, &id, identifier, &to).await
            }
        }
    }

    /// Delete a resource
    pub async fn delete_resource(&self, id: &ResourceId, identifier: &str) -> ProviderResult<()> {
        let config = config_for(id)?;
        if config.delete == Support::Unsupported {
            return Err(
                ProviderError::unsupported("delete", config.type_name).for_resource(id.clone())
            );
        }
        info!("Deleting {}", id);

        match config.handler {
            Handler::Table => self.delete_table(&config, id, identifier).await,
            Handler::PoolAttachment => {
                handlers::pool_attachment::delete(&self.client, id, identifier).await
            }
            Handler::Certificate | Handler::Key => {
                handlers::ssl::delete(&self.client, &config, id, identifier).await
            }
            Handler::As3 => handlers::as3::delete(&self.client, id, identifier).await,
            Handler::WafPolicy => handlers::waf_policy::delete(&self.client, id, identifier).await,
        }
    }

    // =========================================================================
    // Table-driven CRUD
    // =========================================================================

    async fn read_table(
        &self,
        config: &AdcSchemaConfig,
        id: &ResourceId,
        identifier: &str,
    ) -> ProviderResult<State> {
        let body = match config.endpoint {
            Endpoint::Monitor => find_monitor(&self.client, identifier)
                .await
                .map_err(op_error("read", id))?
                .map(|(_, body)| body),
            _ => {
                let path = object_path(config, identifier, None)?;
                self.client
                    .get_with_query(&path, &[("expandSubcollections", "true")])
                    .await
                    .map_err(op_error("read", id))?
            }
        };

        let Some(body) = body else {
            return Ok(State::not_found(id.clone()));
        };

        let attributes = observed_attributes(config, identifier, &body);
        Ok(State::existing(id.clone(), attributes).with_identifier(identifier))
    }

    async fn create_table(
        &self,
        config: &AdcSchemaConfig,
        resource: &Resource,
    ) -> ProviderResult<State> {
        let id = &resource.id;
        let identifier = table_identifier(config, resource)?;

        let mut body = table_body(config, resource);
        match config.identity {
            Identity::FullPath => {
                let (partition, name) = split_full_path(&identifier);
                match name.rsplit_once('/') {
                    Some((sub_path, leaf)) => {
                        body.insert("name".to_string(), json!(leaf));
                        body.insert("subPath".to_string(), json!(sub_path));
                    }
                    None => {
                        body.insert("name".to_string(), json!(name));
                    }
                }
                body.insert("partition".to_string(), json!(partition));
            }
            Identity::Name => {
                body.insert("name".to_string(), json!(identifier));
            }
            _ => {}
        }
        let body = serde_json::Value::Object(body);

        let result = match config.endpoint {
            Endpoint::Collection(path) => self.client.post(path, &body).await,
            Endpoint::Singleton(path) => self.client.put(path, &body).await,
            Endpoint::Monitor => {
                let path = monitor_collection(resource)?;
                self.client.post(&path, &body).await
            }
            Endpoint::Handler => {
                return Err(ProviderError::new("Resource has no table endpoint")
                    .for_resource(id.clone()));
            }
        };
        result.map_err(op_error("create", id))?;

        let state = self.read_table(config, id, &identifier).await?;
        if !state.exists {
            return Err(
                ProviderError::new(format!("{} not found after create", identifier))
                    .for_resource(id.clone()),
            );
        }
        Ok(state)
    }

    async fn update_table(
        &self,
        config: &AdcSchemaConfig,
        id: &ResourceId,
        identifier: &str,
        to: &Resource,
    ) -> ProviderResult<State> {
        let parent = match config.endpoint {
            Endpoint::Monitor => Some(monitor_collection(to)?),
            _ => None,
        };
        let path = object_path(config, identifier, parent.as_deref())?;
        let body = serde_json::Value::Object(table_body(config, to));

        self.client
            .put(&path, &body)
            .await
            .map_err(op_error("update", id))?;

        self.read_table(config, id, identifier).await
    }

    async fn delete_table(
        &self,
        config: &AdcSchemaConfig,
        id: &ResourceId,
        identifier: &str,
    ) -> ProviderResult<()> {
        let path = match config.endpoint {
            Endpoint::Monitor => {
                match find_monitor(&self.client, identifier)
                    .await
                    .map_err(op_error("delete", id))?
                {
                    Some((path, _)) => path,
                    None => return Ok(()),
                }
            }
            _ => object_path(config, identifier, None)?,
        };

        self.client
            .delete(&path)
            .await
            .map_err(op_error("delete", id))
    }
}

/// Find a monitor by full path across the monitor types
pub(crate) async fn find_monitor(
    client: &ApplianceClient,
    identifier: &str,
) -> Result<Option<(String, serde_json::Value)>, ClientError> {
    for monitor_type in MONITOR_TYPES {
        let path = format!(
            "{}/{}/{}",
            MONITOR_COLLECTION,
            monitor_type,
            uri_name(identifier)
        );
        if let Some(body) = client.get(&path).await? {
            return Ok(Some((path, body)));
        }
    }
    Ok(None)
}

/// Identifier of a table resource before it exists
fn table_identifier(config: &AdcSchemaConfig, resource: &Resource) -> ProviderResult<String> {
    match (config.identity, config.endpoint) {
        (Identity::FullPath | Identity::Name, _) => Ok(required_str(resource, "name")?.to_string()),
        (Identity::Singleton, Endpoint::Singleton(path)) => Ok(leaf_name(path).to_string()),
        _ => Err(
            ProviderError::new("Resource identity is not table-driven")
                .for_resource(resource.id.clone()),
        ),
    }
}

/// REST path of one object; `collection` overrides the endpoint collection
fn object_path(
    config: &AdcSchemaConfig,
    identifier: &str,
    collection: Option<&str>,
) -> ProviderResult<String> {
    match (config.endpoint, collection) {
        (Endpoint::Singleton(path), _) => Ok(path.to_string()),
        (_, Some(path)) => Ok(format!("{}/{}", path, uri_name(identifier))),
        (Endpoint::Collection(path), None) => Ok(format!("{}/{}", path, uri_name(identifier))),
        _ => Err(ProviderError::new(format!(
            "{} has no table endpoint",
            config.type_name
        ))),
    }
}

/// Monitor collection for the parent type ("/Common/http" -> .../monitor/http)
fn monitor_collection(resource: &Resource) -> ProviderResult<String> {
    let parent = required_str(resource, "parent")?;
    let monitor_type = leaf_name(parent);
    if !MONITOR_TYPES.contains(&monitor_type) {
        return Err(ProviderError::new(format!(
            "Unsupported monitor parent '{}'; expected one of {}",
            parent,
            MONITOR_TYPES.join(", ")
        ))
        .for_resource(resource.id.clone()));
    }
    Ok(format!("{}/{}", MONITOR_COLLECTION, monitor_type))
}

/// Request body for create and update, without identity properties
fn table_body(
    config: &AdcSchemaConfig,
    resource: &Resource,
) -> serde_json::Map<String, serde_json::Value> {
    let mut body = codec::encode_fields(config.fields, &resource.attributes);
    create_special_attributes(config.type_name, resource, &mut body);
    body
}

/// Attributes observed on the appliance, keyed by configuration name
pub(crate) fn observed_attributes(
    config: &AdcSchemaConfig,
    identifier: &str,
    body: &serde_json::Value,
) -> HashMap<String, Value> {
    let mut attributes = codec::decode_fields(config.fields, body);
    match config.identity {
        Identity::FullPath | Identity::Name => {
            attributes.insert("name".to_string(), Value::String(identifier.to_string()));
        }
        Identity::PartitionedName => {
            let (partition, name) = split_full_path(identifier);
            attributes.insert("name".to_string(), Value::String(name));
            attributes.insert("partition".to_string(), Value::String(partition));
            attributes.insert(
                "full_path".to_string(),
                Value::String(identifier.to_string()),
            );
        }
        Identity::Singleton | Identity::Handler => {}
    }
    read_special_attributes(config.type_name, body, &mut attributes);
    attributes
}

/// Properties whose wire form spans several fields or nests objects
fn create_special_attributes(
    resource_type: &str,
    resource: &Resource,
    body: &mut serde_json::Map<String, serde_json::Value>,
) {
    match resource_type {
        "ltm_virtual_server" => {
            if let (Some(address), Some(port)) =
                (resource.get_str("destination"), resource.get_int("port"))
            {
                let (partition, _) = split_full_path(resource.get_str("name").unwrap_or(""));
                body.insert(
                    "destination".to_string(),
                    json!(format_destination(&partition, address, port)),
                );
            }
            if let Some(translation) = resource.get_str("source_address_translation") {
                let mut snat = json!({ "type": translation });
                if translation == "snat"
                    && let Some(pool) = resource.get_str("snatpool")
                {
                    snat["pool"] = json!(pool);
                }
                body.insert("sourceAddressTranslation".to_string(), snat);
            }
            match resource.get_bool("vlans_enabled") {
                Some(true) => {
                    body.insert("vlansEnabled".to_string(), json!(true));
                }
                Some(false) if !resource.get_list("vlans").is_empty() => {
                    body.insert("vlansDisabled".to_string(), json!(true));
                }
                _ => {}
            }
        }
        "net_vlan" => {
            if resource.attributes.contains_key("interfaces") {
                let interfaces: Vec<serde_json::Value> = resource
                    .get_list("interfaces")
                    .iter()
                    .filter_map(|item| match item {
                        Value::Map(map) => {
                            let name = map.get("vlanport").and_then(Value::as_str)?;
                            let tagged = matches!(map.get("tagged"), Some(Value::Bool(true)));
                            Some(if tagged {
                                json!({ "name": name, "tagged": true })
                            } else {
                                json!({ "name": name, "untagged": true })
                            })
                        }
                        _ => None,
                    })
                    .collect();
                body.insert("interfaces".to_string(), json!(interfaces));
            }
        }
        _ => {}
    }
}

fn read_special_attributes(
    resource_type: &str,
    body: &serde_json::Value,
    attributes: &mut HashMap<String, Value>,
) {
    match resource_type {
        "ltm_virtual_server" => {
            if let Some((address, port)) = body
                .get("destination")
                .and_then(|d| d.as_str())
                .and_then(parse_destination)
            {
                attributes.insert("destination".to_string(), Value::String(address));
                attributes.insert("port".to_string(), Value::Int(port));
            }
            if let Some(snat) = body.get("sourceAddressTranslation") {
                if let Some(t) = snat.get("type").and_then(|t| t.as_str()) {
                    attributes.insert(
                        "source_address_translation".to_string(),
                        Value::String(t.to_string()),
                    );
                }
                if let Some(pool) = snat.get("pool").and_then(|p| p.as_str()) {
                    attributes.insert("snatpool".to_string(), Value::String(pool.to_string()));
                }
            }
            if body.get("vlansEnabled").is_some() {
                attributes.insert("vlans_enabled".to_string(), Value::Bool(true));
            } else if body.get("vlansDisabled").is_some() {
                attributes.insert("vlans_enabled".to_string(), Value::Bool(false));
            }
        }
        "net_vlan" => {
            let items = body
                .get("interfacesReference")
                .and_then(|r| r.get("items"))
                .or_else(|| body.get("interfaces"))
                .and_then(|i| i.as_array());
            if let Some(items) = items {
                let interfaces = items
                    .iter()
                    .filter_map(|item| {
                        let name = item.get("name")?.as_str()?;
                        let tagged = item.get("tagged").and_then(|t| t.as_bool()) == Some(true);
                        Some(Value::Map(HashMap::from([
                            ("vlanport".to_string(), Value::String(name.to_string())),
                            ("tagged".to_string(), Value::Bool(tagged)),
                        ])))
                    })
                    .collect();
                attributes.insert("interfaces".to_string(), Value::List(interfaces));
            }
        }
        _ => {}
    }
}

/// Full path from the `name` + `partition` attributes
pub(crate) fn partitioned_full_path(resource: &Resource) -> ProviderResult<String> {
    let name = required_str(resource, "name")?;
    let partition = resource
        .get_str("partition")
        .unwrap_or(crate::utils::DEFAULT_PARTITION);
    Ok(full_path(partition, name))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schemas::get_config;

    #[test]
    fn virtual_server_body_joins_destination_and_port() {
        let config = get_config("ltm_virtual_server").unwrap();
        let resource = Resource::new("ltm_virtual_server", "web")
            .with_attribute("name", Value::String("/Tenant/web_vs".to_string()))
            .with_attribute("destination", Value::String("10.0.0.10".to_string()))
            .with_attribute("port", Value::Int(443))
            .with_attribute(
                "source_address_translation",
                Value::String("snat".to_string()),
            )
            .with_attribute("snatpool", Value::String("/Common/snat1".to_string()))
            .with_attribute("translate_address", Value::Bool(true));

        let body = table_body(&config, &resource);

        assert_eq!(body["destination"], "/Tenant/10.0.0.10:443");
        assert_eq!(
            body["sourceAddressTranslation"],
            json!({"type": "snat", "pool": "/Common/snat1"})
        );
        assert_eq!(body["translateAddress"], "enabled");
        assert!(!body.contains_key("snatpool"));
    }

    #[test]
    fn virtual_server_read_splits_destination() {
        let config = get_config("ltm_virtual_server").unwrap();
        let body = json!({
            "destination": "/Common/10.0.0.10:443",
            "sourceAddressTranslation": {"type": "automap"},
            "translateAddress": "enabled",
            "vlansEnabled": true,
            "vlans": ["/Common/external"]
        });

        let attributes = observed_attributes(&config, "/Common/web_vs", &body);

        assert_eq!(
            attributes["name"],
            Value::String("/Common/web_vs".to_string())
        );
        assert_eq!(
            attributes["destination"],
            Value::String("10.0.0.10".to_string())
        );
        assert_eq!(attributes["port"], Value::Int(443));
        assert_eq!(
            attributes["source_address_translation"],
            Value::String("automap".to_string())
        );
        assert_eq!(attributes["vlans_enabled"], Value::Bool(true));
        assert_eq!(attributes["translate_address"], Value::Bool(true));
    }

    #[test]
    fn vlan_interfaces_map_to_tagged_flags() {
        let config = get_config("net_vlan").unwrap();
        let interface = |port: &str, tagged: bool| {
            Value::Map(HashMap::from([
                ("vlanport".to_string(), Value::String(port.to_string())),
                ("tagged".to_string(), Value::Bool(tagged)),
            ]))
        };
        let resource = Resource::new("net_vlan", "external")
            .with_attribute("name", Value::String("/Common/external".to_string()))
            .with_attribute(
                "interfaces",
                Value::List(vec![interface("1.1", true), interface("1.2", false)]),
            );

        let body = table_body(&config, &resource);
        assert_eq!(
            body["interfaces"],
            json!([{"name": "1.1", "tagged": true}, {"name": "1.2", "untagged": true}])
        );

        let observed = observed_attributes(
            &config,
            "/Common/external",
            &json!({"interfacesReference": {"items": [
                {"name": "1.1", "tagged": true},
                {"name": "1.2", "untagged": true}
            ]}}),
        );
        assert_eq!(
            observed["interfaces"],
            Value::List(vec![interface("1.1", true), interface("1.2", false)])
        );
    }

    #[test]
    fn singleton_identifier_is_the_endpoint_leaf() {
        let config = get_config("sys_dns").unwrap();
        let resource = Resource::new("sys_dns", "dns");
        assert_eq!(table_identifier(&config, &resource).unwrap(), "dns");
        assert_eq!(
            object_path(&config, "dns", None).unwrap(),
            "/mgmt/tm/sys/dns"
        );
    }

    #[test]
    fn monitor_parent_must_be_a_known_type() {
        let resource = Resource::new("ltm_monitor", "m")
            .with_attribute("parent", Value::String("/Common/http".to_string()));
        assert_eq!(
            monitor_collection(&resource).unwrap(),
            "/mgmt/tm/ltm/monitor/http"
        );

        let resource = Resource::new("ltm_monitor", "m")
            .with_attribute("parent", Value::String("/Common/custom".to_string()));
        assert!(monitor_collection(&resource).is_err());
    }
}
