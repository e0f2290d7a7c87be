//! Application security policies under `/mgmt/tm/asm/policies`
//!
//! Policies are addressed by the appliance-generated id, which becomes the
//! resource identifier. URL and parameter entities are upserted by name;
//! signature entries are patched in place.

use std::collections::HashMap;

use adcform_core::provider::{ProviderError, ProviderResult};
use adcform_core::resource::{Resource, ResourceId, State, Value};
use log::debug;
use serde_json::json;

use crate::as3::decode_fragment;
use crate::client::ApplianceClient;
use crate::codec;
use crate::provider::{op_error, required_str};
use crate::schemas::AdcSchemaConfig;
use crate::utils::split_full_path;
use crate::waf::POLICIES_PATH;

/// Entity collections of a policy, keyed by configuration attribute
const ENTITY_COLLECTIONS: &[(&str, &str)] = &[("urls", "urls"), ("parameters", "parameters")];

/// Properties that only describe the object on this appliance
const VOLATILE_KEYS: &[&str] = &["id", "kind", "selfLink", "lastUpdateMicros", "generation"];

fn policy_path(policy_id: &str) -> String {
    format!("{}/{}", POLICIES_PATH, policy_id)
}

/// Decode the JSON entities of a list attribute
fn entities(resource: &Resource, key: &str) -> ProviderResult<Vec<serde_json::Value>> {
    resource
        .get_list(key)
        .iter()
        .enumerate()
        .map(|(index, value)| {
            decode_fragment(value, index)
                .map(serde_json::Value::Object)
                .map_err(|e| {
                    ProviderError::new(format!("Invalid entry in '{}'", key))
                        .for_resource(resource.id.clone())
                        .with_cause(e)
                })
        })
        .collect()
}

fn items(body: Option<serde_json::Value>) -> Vec<serde_json::Value> {
    body.and_then(|b| b.get("items").and_then(|i| i.as_array()).cloned())
        .unwrap_or_default()
}

/// Strip appliance bookkeeping so exports compare across appliances
fn portable(entity: &serde_json::Value) -> serde_json::Value {
    match entity {
        serde_json::Value::Object(map) => serde_json::Value::Object(
            map.iter()
                .filter(|(k, _)| !VOLATILE_KEYS.contains(&k.as_str()) && !k.ends_with("Reference"))
                .map(|(k, v)| (k.clone(), v.clone()))
                .collect(),
        ),
        other => other.clone(),
    }
}

/// Create or patch URL and parameter entities, then patch signature entries
async fn apply_entities(
    client: &ApplianceClient,
    resource: &Resource,
    policy_id: &str,
) -> ProviderResult<()> {
    let id = &resource.id;

    for (attr, collection) in ENTITY_COLLECTIONS {
        let desired = entities(resource, attr)?;
        if desired.is_empty() {
            continue;
        }
        let path = format!("{}/{}", policy_path(policy_id), collection);
        let existing: HashMap<String, String> = items(
            client
                .get(&path)
                .await
                .map_err(op_error("list entities", id))?,
        )
        .iter()
        .filter_map(|item| {
            Some((
                item.get("name")?.as_str()?.to_string(),
                item.get("id")?.as_str()?.to_string(),
            ))
        })
        .collect();

        for entity in &desired {
            let name = entity.get("name").and_then(|n| n.as_str()).unwrap_or("");
            match existing.get(name) {
                Some(entity_id) => {
                    debug!("Updating {} entity {} of {}", collection, name, policy_id);
                    client
                        .patch(&format!("{}/{}", path, entity_id), entity)
                        .await
                        .map_err(op_error("update entity", id))?;
                }
                None => {
                    debug!("Adding {} entity {} to {}", collection, name, policy_id);
                    client
                        .post(&path, entity)
                        .await
                        .map_err(op_error("add entity", id))?;
                }
            }
        }
    }

    let signatures_path = format!("{}/signatures", policy_path(policy_id));
    for signature in entities(resource, "signatures")? {
        let Some(signature_id) = signature.get("signatureId").and_then(|s| s.as_i64()) else {
            return Err(
                ProviderError::new("Signature entry has no signatureId").for_resource(id.clone())
            );
        };
        let filter = format!("signature/signatureId eq {}", signature_id);
        let mut body = signature.clone();
        if let Some(map) = body.as_object_mut() {
            map.remove("signatureId");
        }
        client
            .patch_with_query(&signatures_path, &[("$filter", &filter)], &body)
            .await
            .map_err(op_error("update signature", id))?;
    }

    Ok(())
}

/// Policy export: the policy properties plus its URL and parameter entities
async fn export_json(
    client: &ApplianceClient,
    id: &ResourceId,
    policy_id: &str,
    policy: &serde_json::Value,
) -> ProviderResult<String> {
    let mut export = match portable(policy) {
        serde_json::Value::Object(map) => map,
        _ => serde_json::Map::new(),
    };
    for (_, collection) in ENTITY_COLLECTIONS {
        let body = client
            .get(&format!("{}/{}", policy_path(policy_id), collection))
            .await
            .map_err(op_error("export", id))?;
        let entries: Vec<serde_json::Value> = items(body).iter().map(portable).collect();
        export.insert(collection.to_string(), json!(entries));
    }
    Ok(json!({ "policy": export }).to_string())
}

pub async fn read(
    client: &ApplianceClient,
    config: &AdcSchemaConfig,
    id: &ResourceId,
    identifier: &str,
) -> ProviderResult<State> {
    let body = client
        .get(&policy_path(identifier))
        .await
        .map_err(op_error("read", id))?;
    let Some(body) = body else {
        return Ok(State::not_found(id.clone()));
    };

    let mut attributes = codec::decode_fields(config.fields, &body);
    if let Some(full_path) = body.get("fullPath").and_then(|p| p.as_str()) {
        attributes.insert("name".to_string(), Value::String(full_path.to_string()));
    }
    attributes.insert(
        "policy_id".to_string(),
        Value::String(identifier.to_string()),
    );
    attributes.insert(
        "policy_export_json".to_string(),
        Value::String(export_json(client, id, identifier, &body).await?),
    );

    Ok(State::existing(id.clone(), attributes).with_identifier(identifier))
}

pub async fn create(
    client: &ApplianceClient,
    config: &AdcSchemaConfig,
    resource: &Resource,
) -> ProviderResult<State> {
    let id = &resource.id;
    let (partition, name) = split_full_path(required_str(resource, "name")?);

    let mut body = codec::encode_fields(config.fields, &resource.attributes);
    body.insert("name".to_string(), json!(name));
    body.insert("partition".to_string(), json!(partition));

    let created = client
        .post(POLICIES_PATH, &serde_json::Value::Object(body))
        .await
        .map_err(op_error("create", id))?;
    let policy_id = created
        .get("id")
        .and_then(|v| v.as_str())
        .map(String::from)
        .ok_or_else(|| {
            ProviderError::new("Policy create returned no id").for_resource(id.clone())
        })?;

    apply_entities(client, resource, &policy_id).await?;

    let state = read(client, config, id, &policy_id).await?;
    if !state.exists {
        return Err(ProviderError::new("Policy not found after create").for_resource(id.clone()));
    }
    Ok(state)
}

pub async fn update(
    client: &ApplianceClient,
    config: &AdcSchemaConfig,
    id: &ResourceId,
    identifier: &str,
    to: &Resource,
) -> ProviderResult<State> {
    let body = codec::encode_fields(config.fields, &to.attributes);
    client
        .patch(&policy_path(identifier), &serde_json::Value::Object(body))
        .await
        .map_err(op_error("update", id))?;

    apply_entities(client, to, identifier).await?;
    read(client, config, id, identifier).await
}

pub async fn delete(
    client: &ApplianceClient,
    id: &ResourceId,
    identifier: &str,
) -> ProviderResult<()> {
    client
        .delete(&policy_path(identifier))
        .await
        .map_err(op_error("delete", id))
}
