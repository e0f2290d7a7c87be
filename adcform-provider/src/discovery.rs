//! Cloud service-discovery pool member blocks

use adcform_core::resource::{Resource, Value};
use serde_json::json;
use thiserror::Error;

use crate::as3::Fragment;

#[derive(Debug, Error)]
pub enum DiscoveryError {
    #[error("unknown address discovery '{0}' (expected aws, azure, gce or consul)")]
    UnknownProvider(String),

    #[error("{provider} discovery requires '{attribute}'")]
    Missing {
        provider: &'static str,
        attribute: &'static str,
    },
}

/// One provider-specific option: (attribute, AS3 property, required)
type DiscoveryOption = (&'static str, &'static str, bool);

const AWS: &[DiscoveryOption] = &[
    ("region", "region", true),
    ("tag_key", "tagKey", true),
    ("tag_value", "tagValue", true),
    ("address_realm", "addressRealm", false),
    ("role_arn", "roleARN", false),
    ("access_key_id", "accessKeyId", false),
    ("secret_access_key", "secretAccessKey", false),
];

const AZURE: &[DiscoveryOption] = &[
    ("resource_group", "resourceGroup", true),
    ("subscription_id", "subscriptionId", true),
    ("resource_type", "resourceType", false),
    ("resource_id", "resourceId", false),
    ("tag_key", "tagKey", false),
    ("tag_value", "tagValue", false),
    ("directory_id", "directoryId", false),
    ("application_id", "applicationId", false),
    ("api_access_key", "apiAccessKey", false),
    ("address_realm", "addressRealm", false),
];

const GCE: &[DiscoveryOption] = &[
    ("region", "region", true),
    ("tag_key", "tagKey", true),
    ("tag_value", "tagValue", true),
    ("project_id", "projectId", false),
    ("encoded_credentials", "encodedCredentials", false),
    ("address_realm", "addressRealm", false),
];

const CONSUL: &[DiscoveryOption] = &[
    ("uri", "uri", true),
    ("encoded_token", "encodedToken", false),
    ("reject_unauthorized", "rejectUnauthorized", false),
    ("address_realm", "addressRealm", false),
];

fn options_for(provider: &str) -> Option<(&'static str, &'static [DiscoveryOption])> {
    match provider {
        "aws" => Some(("aws", AWS)),
        "azure" => Some(("azure", AZURE)),
        "gce" => Some(("gce", GCE)),
        "consul" => Some(("consul", CONSUL)),
        _ => None,
    }
}

/// Build the member block for `resource.address_discovery`
pub fn build(resource: &Resource) -> Result<Fragment, DiscoveryError> {
    let requested = resource.get_str("address_discovery").unwrap_or("");
    let (provider, options) = options_for(requested)
        .ok_or_else(|| DiscoveryError::UnknownProvider(requested.to_string()))?;

    let service_port = resource
        .get_int("service_port")
        .ok_or(DiscoveryError::Missing {
            provider,
            attribute: "service_port",
        })?;

    let mut block = Fragment::new();
    block.insert("addressDiscovery".to_string(), json!(provider));
    block.insert("servicePort".to_string(), json!(service_port));
    block.insert(
        "updateInterval".to_string(),
        json!(resource.get_int("update_interval").unwrap_or(60)),
    );

    for &(attribute, property, required) in options {
        match resource.attributes.get(attribute) {
            Some(value @ (Value::String(_) | Value::Bool(_) | Value::Int(_))) => {
                if let Some(json) = value.to_json() {
                    block.insert(property.to_string(), json);
                }
            }
            _ if required => {
                return Err(DiscoveryError::Missing {
                    provider,
                    attribute,
                });
            }
            _ => {}
        }
    }
    Ok(block)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn s(v: &str) -> Value {
        Value::String(v.to_string())
    }

    #[test]
    fn aws_block() {
        let resource = Resource::new("service_discovery", "web")
            .with_attribute("address_discovery", s("aws"))
            .with_attribute("service_port", Value::Int(8080))
            .with_attribute("region", s("us-west-2"))
            .with_attribute("tag_key", s("app"))
            .with_attribute("tag_value", s("web"));

        let block = build(&resource).unwrap();

        assert_eq!(
            serde_json::Value::Object(block),
            json!({
                "addressDiscovery": "aws",
                "servicePort": 8080,
                "updateInterval": 60,
                "region": "us-west-2",
                "tagKey": "app",
                "tagValue": "web"
            })
        );
    }

    #[test]
    fn consul_requires_uri() {
        let resource = Resource::new("service_discovery", "svc")
            .with_attribute("address_discovery", s("consul"))
            .with_attribute("service_port", Value::Int(80));

        let err = build(&resource).unwrap_err();
        assert!(matches!(
            err,
            DiscoveryError::Missing {
                provider: "consul",
                attribute: "uri"
            }
        ));
    }

    #[test]
    fn unknown_provider_is_rejected() {
        let resource = Resource::new("service_discovery", "svc")
            .with_attribute("address_discovery", s("openstack"))
            .with_attribute("service_port", Value::Int(80));

        assert!(matches!(
            build(&resource),
            Err(DiscoveryError::UnknownProvider(p)) if p == "openstack"
        ));
    }
}
