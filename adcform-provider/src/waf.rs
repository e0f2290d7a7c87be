//! WAF entity builders, signature lookup and policy-builder suggestion export

use std::collections::HashMap;

use adcform_core::provider::{ProviderError, ProviderResult};
use adcform_core::resource::{Resource, ResourceId, Value};
use log::debug;
use serde_json::json;

use crate::client::ApplianceClient;
use crate::provider::{op_error, required_str};

pub const POLICIES_PATH: &str = "/mgmt/tm/asm/policies";
const SIGNATURES_PATH: &str = "/mgmt/tm/asm/signatures";
const EXPORT_SUGGESTIONS_PATH: &str = "/mgmt/tm/asm/tasks/export-suggestions";

fn insert_str(entity: &mut serde_json::Map<String, serde_json::Value>, key: &str, value: Option<&str>) {
    if let Some(v) = value {
        entity.insert(key.to_string(), json!(v));
    }
}

fn insert_bool(
    entity: &mut serde_json::Map<String, serde_json::Value>,
    key: &str,
    value: Option<bool>,
) {
    if let Some(v) = value {
        entity.insert(key.to_string(), json!(v));
    }
}

/// `[{"signatureId": N, "enabled": false}]` for every disabled signature
fn signature_overrides(resource: &Resource) -> Vec<serde_json::Value> {
    resource
        .get_list("signature_overrides_disable")
        .iter()
        .filter_map(|v| match v {
            Value::Int(id) => Some(json!({ "signatureId": id, "enabled": false })),
            _ => None,
        })
        .collect()
}

/// `waf_entity_url`
pub fn build_url(resource: &Resource) -> ProviderResult<serde_json::Value> {
    let mut entity = serde_json::Map::new();
    entity.insert("name".to_string(), json!(required_str(resource, "name")?));
    insert_str(&mut entity, "description", resource.get_str("description"));
    entity.insert(
        "type".to_string(),
        json!(resource.get_str("type").unwrap_or("explicit")),
    );
    entity.insert(
        "protocol".to_string(),
        json!(resource.get_str("protocol").unwrap_or("http")),
    );
    entity.insert(
        "method".to_string(),
        json!(resource.get_str("method").unwrap_or("*")),
    );
    entity.insert(
        "performStaging".to_string(),
        json!(resource.get_bool("perform_staging").unwrap_or(false)),
    );

    let overrides = signature_overrides(resource);
    if !overrides.is_empty() {
        entity.insert("signatureOverrides".to_string(), json!(overrides));
    }

    let mut method_overrides = Vec::new();
    for (key, allowed) in [
        ("method_overrides_allow", true),
        ("method_overrides_disallow", false),
    ] {
        for method in resource.get_list(key).iter().filter_map(Value::as_str) {
            method_overrides.push(json!({ "method": method, "allowed": allowed }));
        }
    }
    if !method_overrides.is_empty() {
        entity.insert("methodOverrides".to_string(), json!(method_overrides));
    }

    Ok(serde_json::Value::Object(entity))
}

/// `waf_entity_parameter`
pub fn build_parameter(resource: &Resource) -> ProviderResult<serde_json::Value> {
    let mut entity = serde_json::Map::new();
    entity.insert("name".to_string(), json!(required_str(resource, "name")?));
    insert_str(&mut entity, "description", resource.get_str("description"));
    entity.insert(
        "type".to_string(),
        json!(resource.get_str("type").unwrap_or("explicit")),
    );
    entity.insert(
        "valueType".to_string(),
        json!(resource.get_str("value_type").unwrap_or("user-input")),
    );
    entity.insert(
        "level".to_string(),
        json!(resource.get_str("level").unwrap_or("global")),
    );
    if let Some(url) = resource.get_str("url") {
        entity.insert("url".to_string(), json!({ "name": url, "method": "*", "protocol": "http", "type": "explicit" }));
    }

    for (attr, key, default) in [
        ("allow_empty_type", "allowEmptyValue", true),
        ("allow_repeated_parameter_name", "allowRepeatedParameterName", true),
        ("attack_signatures_check", "attackSignaturesCheck", true),
        ("perform_staging", "performStaging", false),
        ("is_base64", "decodeValueAsBase64", false),
        ("is_cookie", "isCookie", false),
        ("is_header", "isHeader", false),
        ("mandatory", "mandatory", false),
        ("sensitive_parameter", "sensitiveParameter", false),
    ] {
        insert_bool(
            &mut entity,
            key,
            Some(resource.get_bool(attr).unwrap_or(default)),
        );
    }
    // The appliance expects "enabled"/"disabled" for base64 decoding
    if let Some(decode) = entity.get("decodeValueAsBase64").and_then(|v| v.as_bool()) {
        entity.insert(
            "decodeValueAsBase64".to_string(),
            json!(if decode { "enabled" } else { "disabled" }),
        );
    }

    let overrides = signature_overrides(resource);
    if !overrides.is_empty() {
        entity.insert("signatureOverrides".to_string(), json!(overrides));
    }

    Ok(serde_json::Value::Object(entity))
}

/// `waf_signatures`: read the signature, return its observed attributes and
/// the policy signature entry
pub async fn build_signature(
    client: &ApplianceClient,
    resource: &Resource,
) -> ProviderResult<(HashMap<String, Value>, serde_json::Value)> {
    let id = &resource.id;
    let signature_id = resource.get_int("signature_id").ok_or_else(|| {
        ProviderError::new("Missing required attribute 'signature_id'").for_resource(id.clone())
    })?;

    let filter = format!("signatureId eq {}", signature_id);
    let body = client
        .get_with_query(SIGNATURES_PATH, &[("$filter", &filter)])
        .await
        .map_err(op_error("read signature", id))?;
    let signature = body
        .as_ref()
        .and_then(|b| b.get("items"))
        .and_then(|items| items.as_array())
        .and_then(|items| items.first())
        .ok_or_else(|| {
            ProviderError::new(format!("Signature {} not found", signature_id))
                .for_resource(id.clone())
        })?;

    let mut observed = HashMap::new();
    for (attr, key) in [
        ("name", "name"),
        ("system_signature_id", "id"),
        ("signature_type", "signatureType"),
        ("accuracy", "accuracy"),
        ("risk", "risk"),
    ] {
        if let Some(v) = signature.get(key).and_then(|v| v.as_str()) {
            observed.insert(attr.to_string(), Value::String(v.to_string()));
        }
    }

    let entry = json!({
        "signatureId": signature_id,
        "enabled": resource.get_bool("enabled").unwrap_or(true),
        "performStaging": resource.get_bool("perform_staging").unwrap_or(true),
    });
    Ok((observed, entry))
}

/// Look up a policy id by full path
pub async fn policy_id(
    client: &ApplianceClient,
    id: &ResourceId,
    full_path: &str,
) -> ProviderResult<String> {
    let filter = format!("fullPath eq '{}'", full_path);
    let body = client
        .get_with_query(POLICIES_PATH, &[("$filter", &filter)])
        .await
        .map_err(op_error("look up policy", id))?;

    body.as_ref()
        .and_then(|b| b.get("items"))
        .and_then(|items| items.as_array())
        .and_then(|items| items.first())
        .and_then(|policy| policy.get("id"))
        .and_then(|v| v.as_str())
        .map(String::from)
        .ok_or_else(|| {
            ProviderError::new(format!("Policy {} not found", full_path)).for_resource(id.clone())
        })
}

/// `waf_pb_suggestions`: start an export task and poll it until it settles.
///
/// Returns the policy id and the task result.
pub async fn export_suggestions(
    client: &ApplianceClient,
    resource: &Resource,
) -> ProviderResult<(String, serde_json::Value)> {
    let id = &resource.id;
    let policy_name = required_str(resource, "policy_name")?;
    let policy_id = policy_id(client, id, policy_name).await?;

    let mut request = json!({
        "inline": true,
        "policyReference": {
            "link": format!("https://localhost{}/{}", POLICIES_PATH, policy_id)
        },
    });
    if let Some(score) = resource.get_int("minimum_learning_score")
        && score > 0
    {
        request["filter"] = json!(format!("score gt {}", score));
    }

    let task = client
        .post(EXPORT_SUGGESTIONS_PATH, &request)
        .await
        .map_err(op_error("export suggestions", id))?;
    let task_id = task.get("id").and_then(|v| v.as_str()).ok_or_else(|| {
        ProviderError::new("Export task returned no id").for_resource(id.clone())
    })?;

    let result = wait_for_task(client, id, &format!("{}/{}", EXPORT_SUGGESTIONS_PATH, task_id)).await?;
    Ok((policy_id, result))
}

/// Poll a task until COMPLETED (its result) or FAILURE (an error)
async fn wait_for_task(
    client: &ApplianceClient,
    id: &ResourceId,
    path: &str,
) -> ProviderResult<serde_json::Value> {
    loop {
        let task = client
            .get(path)
            .await
            .map_err(op_error("poll task", id))?
            .ok_or_else(|| {
                ProviderError::new(format!("Task {} disappeared", path)).for_resource(id.clone())
            })?;

        let status = task.get("status").and_then(|s| s.as_str()).unwrap_or("");
        match status {
            "COMPLETED" => {
                return Ok(task.get("result").cloned().unwrap_or(serde_json::Value::Null));
            }
            "FAILURE" => {
                let message = task
                    .get("result")
                    .and_then(|r| r.get("message"))
                    .and_then(|m| m.as_str())
                    .unwrap_or("no details");
                return Err(
                    ProviderError::new(format!("Task failed: {}", message)).for_resource(id.clone())
                );
            }
            _ => {
                debug!("Task {} is {}", path, status);
                tokio::time::sleep(client.poll_interval()).await;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn s(v: &str) -> Value {
        Value::String(v.to_string())
    }

    #[test]
    fn url_entity_carries_overrides() {
        let resource = Resource::new("waf_entity_url", "login")
            .with_attribute("name", s("/login"))
            .with_attribute("method", s("POST"))
            .with_attribute(
                "signature_overrides_disable",
                Value::List(vec![Value::Int(200001), Value::Int(200002)]),
            )
            .with_attribute("method_overrides_allow", Value::List(vec![s("PUT")]));

        let entity = build_url(&resource).unwrap();

        assert_eq!(
            entity,
            json!({
                "name": "/login",
                "type": "explicit",
                "protocol": "http",
                "method": "POST",
                "performStaging": false,
                "signatureOverrides": [
                    {"signatureId": 200001, "enabled": false},
                    {"signatureId": 200002, "enabled": false}
                ],
                "methodOverrides": [{"method": "PUT", "allowed": true}]
            })
        );
    }

    #[test]
    fn parameter_entity_applies_defaults() {
        let resource = Resource::new("waf_entity_parameter", "user")
            .with_attribute("name", s("username"))
            .with_attribute("sensitive_parameter", Value::Bool(true));

        let entity = build_parameter(&resource).unwrap();

        assert_eq!(entity["name"], "username");
        assert_eq!(entity["valueType"], "user-input");
        assert_eq!(entity["sensitiveParameter"], true);
        assert_eq!(entity["allowEmptyValue"], true);
        assert_eq!(entity["decodeValueAsBase64"], "disabled");
        assert!(entity.get("signatureOverrides").is_none());
    }

    #[test]
    fn url_entity_requires_name() {
        assert!(build_url(&Resource::new("waf_entity_url", "x")).is_err());
    }
}
