//! Pool membership: `/mgmt/tm/ltm/pool/<pool>/members/<node>`
//!
//! Identified by "<pool>:<node>"; the pool full path never contains ':'
//! while the node ("/Common/10.0.0.1:80") always does.

use adcform_core::provider::{ProviderError, ProviderResult};
use adcform_core::resource::{Resource, ResourceId, State, Value};
use serde_json::json;

use crate::client::ApplianceClient;
use crate::codec;
use crate::provider::{op_error, required_str};
use crate::schemas::AdcSchemaConfig;
use crate::utils::uri_name;

fn member_path(pool: &str, node: &str) -> String {
    format!(
        "/mgmt/tm/ltm/pool/{}/members/{}",
        uri_name(pool),
        uri_name(node)
    )
}

/// Split "<pool>:<node>" into its parts
pub fn split_identifier(identifier: &str) -> Option<(&str, &str)> {
    identifier
        .split_once(':')
        .filter(|(pool, node)| !pool.is_empty() && !node.is_empty())
}

fn parse_identifier<'a>(id: &ResourceId, identifier: &'a str) -> ProviderResult<(&'a str, &'a str)> {
    split_identifier(identifier).ok_or_else(|| {
        ProviderError::new(format!(
            "Invalid pool attachment identifier '{}', expected <pool>:<node>",
            identifier
        ))
        .for_resource(id.clone())
    })
}

pub async fn read(
    client: &ApplianceClient,
    config: &AdcSchemaConfig,
    id: &ResourceId,
    identifier: &str,
) -> ProviderResult<State> {
    let (pool, node) = parse_identifier(id, identifier)?;

    let body = client
        .get(&member_path(pool, node))
        .await
        .map_err(op_error("read", id))?;
    let Some(body) = body else {
        return Ok(State::not_found(id.clone()));
    };

    let mut attributes = codec::decode_fields(config.fields, &body);
    attributes.insert("pool".to_string(), Value::String(pool.to_string()));
    attributes.insert("node".to_string(), Value::String(node.to_string()));
    Ok(State::existing(id.clone(), attributes).with_identifier(identifier))
}

pub async fn create(
    client: &ApplianceClient,
    config: &AdcSchemaConfig,
    resource: &Resource,
) -> ProviderResult<State> {
    let id = &resource.id;
    let pool = required_str(resource, "pool")?;
    let node = required_str(resource, "node")?;

    let mut body = codec::encode_fields(config.fields, &resource.attributes);
    body.insert("name".to_string(), json!(node));

    client
        .post(
            &format!("/mgmt/tm/ltm/pool/{}/members", uri_name(pool)),
            &serde_json::Value::Object(body),
        )
        .await
        .map_err(op_error("create", id))?;

    read(client, config, id, &format!("{}:{}", pool, node)).await
}

pub async fn update(
    client: &ApplianceClient,
    config: &AdcSchemaConfig,
    id: &ResourceId,
    identifier: &str,
    to: &Resource,
) -> ProviderResult<State> {
    let (pool, node) = parse_identifier(id, identifier)?;
    let body = codec::encode_fields(config.fields, &to.attributes);

    client
        .put(&member_path(pool, node), &serde_json::Value::Object(body))
        .await
        .map_err(op_error("update", id))?;

    read(client, config, id, identifier).await
}

pub async fn delete(client: &ApplianceClient, id: &ResourceId, identifier: &str) -> ProviderResult<()> {
    let (pool, node) = parse_identifier(id, identifier)?;
    client
        .delete(&member_path(pool, node))
        .await
        .map_err(op_error("delete", id))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identifier_splits_at_first_colon() {
        assert_eq!(
            split_identifier("/Common/web:/Common/10.0.0.1:80"),
            Some(("/Common/web", "/Common/10.0.0.1:80"))
        );
        assert_eq!(split_identifier("/Common/web"), None);
        assert_eq!(split_identifier(":/Common/10.0.0.1:80"), None);
    }

    #[test]
    fn member_path_uses_uri_names() {
        assert_eq!(
            member_path("/Common/web", "/Common/10.0.0.1:80"),
            "/mgmt/tm/ltm/pool/~Common~web/members/~Common~10.0.0.1:80"
        );
    }
}
