//! Data source evaluation: appliance lookups and local document builders

use std::collections::HashMap;

use adcform_core::provider::{ProviderError, ProviderResult};
use adcform_core::resource::{Resource, ResourceId, State, Value};
use log::debug;

use crate::as3::{self, AssemblyError, Fragment};
use crate::client::ApplianceClient;
use crate::codec;
use crate::discovery::{self, DiscoveryError};
use crate::handlers::ssl;
use crate::provider::{find_monitor, op_error, partitioned_full_path};
use crate::schemas::{
    AdcSchemaConfig, DataSourceKind, Endpoint, Handler, get_data_source_config,
};
use crate::utils::{json_hash, split_full_path, uri_name};
use crate::waf;

/// Evaluate a data source against its resolved inputs
pub async fn evaluate(client: &ApplianceClient, resource: &Resource) -> ProviderResult<State> {
    let id = &resource.id;
    let config = get_data_source_config(&id.resource_type).ok_or_else(|| {
        ProviderError::new(format!("Unknown data source: {}", id.resource_type))
            .for_resource(id.clone())
    })?;

    match config.kind {
        DataSourceKind::Lookup(resource_config) => {
            lookup(client, &resource_config(), resource).await
        }
        DataSourceKind::Builder => build(client, resource).await,
    }
}

// =============================================================================
// Lookups
// =============================================================================

async fn lookup(
    client: &ApplianceClient,
    config: &AdcSchemaConfig,
    resource: &Resource,
) -> ProviderResult<State> {
    let id = &resource.id;
    let full_path = partitioned_full_path(resource)?;
    debug!("Looking up {} {}", config.type_name, full_path);

    let result = match (config.handler, config.endpoint) {
        (Handler::Certificate | Handler::Key, _) => {
            let path = format!(
                "{}/{}",
                ssl::file_collection(config.handler),
                uri_name(&full_path)
            );
            client.get(&path).await
        }
        (_, Endpoint::Monitor) => find_monitor(client, &full_path)
            .await
            .map(|found| found.map(|(_, body)| body)),
        (_, Endpoint::Collection(path)) => {
            client
                .get(&format!("{}/{}", path, uri_name(&full_path)))
                .await
        }
        _ => {
            return Err(ProviderError::new(format!(
                "{} cannot be looked up",
                config.type_name
            ))
            .for_resource(id.clone()));
        }
    };
    let body = result.map_err(op_error("look up", id))?.ok_or_else(|| {
        ProviderError::new(format!("{} {} not found", config.type_name, full_path))
            .for_resource(id.clone())
    })?;

    let mut attributes = codec::decode_fields(config.fields, &body);
    let (partition, name) = split_full_path(&full_path);
    attributes.insert("name".to_string(), Value::String(name));
    attributes.insert("partition".to_string(), Value::String(partition));
    attributes.insert("full_path".to_string(), Value::String(full_path.clone()));

    Ok(State::existing(id.clone(), attributes).with_identifier(full_path))
}

// =============================================================================
// Builders
// =============================================================================

fn assembly_error(id: &ResourceId) -> impl FnOnce(AssemblyError) -> ProviderError + '_ {
    move |e| {
        ProviderError::new("Cannot build document")
            .for_resource(id.clone())
            .with_cause(e)
    }
}

fn discovery_error(id: &ResourceId) -> impl FnOnce(DiscoveryError) -> ProviderError + '_ {
    move |e| {
        ProviderError::new("Cannot build discovery block")
            .for_resource(id.clone())
            .with_cause(e)
    }
}

/// Document text output plus the structured `fragment` output
fn fragment_outputs(json_key: &str, fragment: Fragment) -> (serde_json::Value, Vec<(String, Value)>) {
    let document = serde_json::Value::Object(fragment);
    let mut outputs = vec![(json_key.to_string(), Value::String(document.to_string()))];
    if let Some(value) = Value::from_json(&document) {
        outputs.push(("fragment".to_string(), value));
    }
    (document, outputs)
}

async fn build(client: &ApplianceClient, resource: &Resource) -> ProviderResult<State> {
    let id = &resource.id;

    let (document, outputs) = match id.resource_type.as_str() {
        "as3_pool" => fragment_outputs(
            "pool_json",
            as3::build_pool(resource).map_err(assembly_error(id))?,
        ),
        "as3_service" => fragment_outputs(
            "service_json",
            as3::build_service(resource).map_err(assembly_error(id))?,
        ),
        "as3_certificate" => fragment_outputs(
            "certificate_json",
            as3::build_certificate(resource).map_err(assembly_error(id))?,
        ),
        "as3_application" => fragment_outputs(
            "application_json",
            as3::build_application(resource).map_err(assembly_error(id))?,
        ),
        "as3_tenant" => fragment_outputs(
            "tenant_json",
            as3::build_tenant(resource).map_err(assembly_error(id))?,
        ),
        "as3_adc" => {
            let (document, tenants) = as3::build_adc(resource).map_err(assembly_error(id))?;
            let outputs = vec![
                (
                    "as3_json".to_string(),
                    Value::String(document.to_string()),
                ),
                (
                    "tenant_list".to_string(),
                    Value::List(tenants.into_iter().map(Value::String).collect()),
                ),
            ];
            (document, outputs)
        }
        "service_discovery" => fragment_outputs(
            "discovery_json",
            discovery::build(resource).map_err(discovery_error(id))?,
        ),
        "waf_entity_url" => {
            let entity = waf::build_url(resource)?;
            let outputs = vec![("json".to_string(), Value::String(entity.to_string()))];
            (entity, outputs)
        }
        "waf_entity_parameter" => {
            let entity = waf::build_parameter(resource)?;
            let outputs = vec![("json".to_string(), Value::String(entity.to_string()))];
            (entity, outputs)
        }
        "waf_signatures" => {
            let (observed, entry) = waf::build_signature(client, resource).await?;
            let mut outputs: Vec<(String, Value)> = observed.into_iter().collect();
            outputs.push(("json".to_string(), Value::String(entry.to_string())));
            (entry, outputs)
        }
        "waf_pb_suggestions" => {
            let (policy_id, suggestions) = waf::export_suggestions(client, resource).await?;
            let outputs = vec![
                ("policy_id".to_string(), Value::String(policy_id)),
                ("json".to_string(), Value::String(suggestions.to_string())),
            ];
            (suggestions, outputs)
        }
        other => {
            return Err(ProviderError::new(format!("No builder for data source {}", other))
                .for_resource(id.clone()));
        }
    };

    let mut attributes: HashMap<String, Value> = resource.attributes.clone();
    attributes.extend(outputs);
    Ok(State::existing(id.clone(), attributes).with_identifier(json_hash(&document)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ProviderConfig;

    fn offline_client() -> ApplianceClient {
        let config = ProviderConfig {
            address: "http://127.0.0.1:9".to_string(),
            username: "admin".to_string(),
            ..ProviderConfig::default()
        };
        ApplianceClient::new(&config).unwrap()
    }

    #[tokio::test]
    async fn pool_builder_outputs_text_and_fragment() {
        let resource = Resource::new("as3_pool", "web").with_read_only(true)
            .with_attribute("name", Value::String("web_pool".to_string()))
            .with_attribute(
                "monitors",
                Value::List(vec![Value::String("http".to_string())]),
            );

        let state = evaluate(&offline_client(), &resource).await.unwrap();

        assert!(state.exists);
        let Some(Value::String(text)) = state.attributes.get("pool_json") else {
            panic!("pool_json missing");
        };
        let document: serde_json::Value = serde_json::from_str(text).unwrap();
        assert_eq!(document["web_pool"]["class"], "Pool");
        assert!(matches!(state.attributes.get("fragment"), Some(Value::Map(_))));
        assert_eq!(state.identifier.as_deref(), Some(json_hash(&document).as_str()));
    }

    #[tokio::test]
    async fn builder_errors_name_the_data_source() {
        let resource = Resource::new("as3_service", "broken").with_read_only(true);

        let err = evaluate(&offline_client(), &resource).await.unwrap_err();
        assert!(err.to_string().contains("Cannot build document"));
    }

    #[tokio::test]
    async fn unknown_data_source_is_rejected() {
        let resource = Resource::new("nope", "x").with_read_only(true);
        assert!(evaluate(&offline_client(), &resource).await.is_err());
    }
}
