//! AS3 declarations: `/mgmt/shared/appsvcs/declare`
//!
//! A declaration is identified by the comma-joined, sorted list of tenants
//! it declares. The appliance does not return the submitted document, so
//! only the tenant list is observed on read.

use std::collections::HashMap;

use adcform_core::provider::{ProviderError, ProviderResult};
use adcform_core::resource::{Resource, ResourceId, State, Value};
use log::debug;

use crate::as3::{decode_fragment, tenants_of};
use crate::client::ApplianceClient;
use crate::provider::op_error;

const DECLARE_PATH: &str = "/mgmt/shared/appsvcs/declare";

fn tenant_list_value(tenants: &[String]) -> Value {
    Value::List(tenants.iter().cloned().map(Value::String).collect())
}

/// Decode `as3_json` and the tenants it declares
fn declaration(resource: &Resource) -> ProviderResult<(serde_json::Value, Vec<String>)> {
    let id = &resource.id;
    let value = resource.attributes.get("as3_json").ok_or_else(|| {
        ProviderError::new("Missing required attribute 'as3_json'").for_resource(id.clone())
    })?;
    let document = decode_fragment(value, 0)
        .map(serde_json::Value::Object)
        .map_err(|e| {
            ProviderError::new("Invalid as3_json")
                .for_resource(id.clone())
                .with_cause(e)
        })?;

    let tenants = tenants_of(&document);
    if tenants.is_empty() {
        return Err(ProviderError::new("as3_json declares no tenants").for_resource(id.clone()));
    }
    Ok((document, tenants))
}

/// POST a declaration and fail if any tenant result is not 2xx
async fn post_declaration(
    client: &ApplianceClient,
    id: &ResourceId,
    document: &serde_json::Value,
) -> ProviderResult<()> {
    let response = client
        .post(DECLARE_PATH, document)
        .await
        .map_err(op_error("declare", id))?;

    let failures: Vec<String> = response
        .get("results")
        .and_then(|r| r.as_array())
        .map(|results| {
            results
                .iter()
                .filter(|r| {
                    let code = r.get("code").and_then(|c| c.as_u64()).unwrap_or(0);
                    !(200..300).contains(&code)
                })
                .map(|r| {
                    format!(
                        "{}: {}",
                        r.get("tenant").and_then(|t| t.as_str()).unwrap_or("?"),
                        r.get("message").and_then(|m| m.as_str()).unwrap_or("failed")
                    )
                })
                .collect()
        })
        .unwrap_or_default();

    if failures.is_empty() {
        Ok(())
    } else {
        Err(ProviderError::new(format!(
            "declaration rejected: {}",
            failures.join("; ")
        ))
        .for_resource(id.clone()))
    }
}

fn declared_state(resource: &Resource, tenants: &[String]) -> State {
    let mut attributes = HashMap::new();
    if let Some(value) = resource.attributes.get("as3_json") {
        attributes.insert("as3_json".to_string(), value.clone());
    }
    attributes.insert("tenant_list".to_string(), tenant_list_value(tenants));
    State::existing(resource.id.clone(), attributes).with_identifier(tenants.join(","))
}

pub async fn read(
    client: &ApplianceClient,
    id: &ResourceId,
    identifier: &str,
) -> ProviderResult<State> {
    let body = client
        .get(&format!("{}/{}", DECLARE_PATH, identifier))
        .await
        .map_err(op_error("read", id))?;
    let Some(body) = body else {
        return Ok(State::not_found(id.clone()));
    };

    let tenants = tenants_of(&body);
    if tenants.is_empty() {
        return Ok(State::not_found(id.clone()));
    }
    let attributes = HashMap::from([("tenant_list".to_string(), tenant_list_value(&tenants))]);
    Ok(State::existing(id.clone(), attributes).with_identifier(identifier))
}

pub async fn create(client: &ApplianceClient, resource: &Resource) -> ProviderResult<State> {
    let (document, tenants) = declaration(resource)?;
    post_declaration(client, &resource.id, &document).await?;
    Ok(declared_state(resource, &tenants))
}

/// Tenants dropped from the declaration are removed before the new one is posted
pub async fn update(
    client: &ApplianceClient,
    id: &ResourceId,
    identifier: &str,
    to: &Resource,
) -> ProviderResult<State> {
    let (document, tenants) = declaration(to)?;

    let removed: Vec<&str> = identifier
        .split(',')
        .filter(|t| !t.is_empty() && !tenants.iter().any(|n| n == t))
        .collect();
    if !removed.is_empty() {
        debug!("Removing tenants {:?} from {}", removed, id);
        client
            .delete(&format!("{}/{}", DECLARE_PATH, removed.join(",")))
            .await
            .map_err(op_error("remove tenants", id))?;
    }

    post_declaration(client, id, &document).await?;
    Ok(declared_state(to, &tenants))
}

pub async fn delete(client: &ApplianceClient, id: &ResourceId, identifier: &str) -> ProviderResult<()> {
    client
        .delete(&format!("{}/{}", DECLARE_PATH, identifier))
        .await
        .map_err(op_error("delete", id))
}
