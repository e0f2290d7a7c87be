//! Certificates and keys: upload the PEM, then install it from the upload
//! directory. Installed files are read and deleted under `/mgmt/tm/sys/file`.

use adcform_core::provider::{ProviderError, ProviderResult};
use adcform_core::resource::{Resource, ResourceId, State};
use serde_json::json;

use crate::client::{ApplianceClient, uploaded_file_path};
use crate::provider::{observed_attributes, op_error, partitioned_full_path, required_str};
use crate::schemas::{AdcSchemaConfig, Handler};
use crate::utils::{leaf_name, uri_name};

/// Crypto object kind ("cert" or "key") of a handler
fn crypto_kind(config: &AdcSchemaConfig) -> &'static str {
    match config.handler {
        Handler::Key => "key",
        _ => "cert",
    }
}

/// Collection holding installed files of a handler
pub fn file_collection(handler: Handler) -> &'static str {
    match handler {
        Handler::Key => "/mgmt/tm/sys/file/ssl-key",
        _ => "/mgmt/tm/sys/file/ssl-cert",
    }
}

pub async fn read(
    client: &ApplianceClient,
    config: &AdcSchemaConfig,
    id: &ResourceId,
    identifier: &str,
) -> ProviderResult<State> {
    let path = format!(
        "{}/{}",
        file_collection(config.handler),
        uri_name(identifier)
    );
    let body = client.get(&path).await.map_err(op_error("read", id))?;
    let Some(body) = body else {
        return Ok(State::not_found(id.clone()));
    };

    let attributes = observed_attributes(config, identifier, &body);
    Ok(State::existing(id.clone(), attributes).with_identifier(identifier))
}

/// Upload and install; installing over an existing object replaces it
pub async fn install(
    client: &ApplianceClient,
    config: &AdcSchemaConfig,
    resource: &Resource,
) -> ProviderResult<State> {
    let id = &resource.id;
    let full_path = partitioned_full_path(resource)?;
    let file_name = leaf_name(&full_path).to_string();
    let content = required_str(resource, "content")?;

    client
        .upload(&file_name, content.as_bytes())
        .await
        .map_err(op_error("upload", id))?;

    let kind = crypto_kind(config);
    let mut body = json!({
        "command": "install",
        "name": full_path,
        "from-local-file": uploaded_file_path(&file_name),
    });
    if kind == "key"
        && let Some(passphrase) = resource.get_str("passphrase")
    {
        body["passphrase"] = json!(passphrase);
    }

    client
        .post(&format!("/mgmt/tm/sys/crypto/{}", kind), &body)
        .await
        .map_err(op_error("install", id))?;

    let state = read(client, config, id, &full_path).await?;
    if !state.exists {
        return Err(
            ProviderError::new(format!("{} not found after install", full_path))
                .for_resource(id.clone()),
        );
    }
    Ok(state)
}

pub async fn delete(
    client: &ApplianceClient,
    config: &AdcSchemaConfig,
    id: &ResourceId,
    identifier: &str,
) -> ProviderResult<()> {
    let path = format!(
        "{}/{}",
        file_collection(config.handler),
        uri_name(identifier)
    );
    client.delete(&path).await.map_err(op_error("delete", id))
}
