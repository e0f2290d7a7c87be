//! AS3 declaration assembler
//!
//! Every fragment is a JSON object mapping one logical name to its
//! sub-object (`{"web_pool": {"class": "Pool", ...}}`). Fragments are merged
//! into their parent under their original keys, last write wins, and the
//! result is wrapped under the parent's own name with its `class`.
//!
//! Fragments arrive as structured maps (the `fragment` output of another
//! data source) or as JSON text (the `*_json` outputs); text is decoded
//! exactly once. A single malformed fragment fails the whole assembly.

use adcform_core::resource::{Resource, Value};
use heck::ToLowerCamelCase;
use serde_json::json;
use thiserror::Error;

/// A named JSON sub-document
pub type Fragment = serde_json::Map<String, serde_json::Value>;

#[derive(Debug, Error)]
pub enum AssemblyError {
    #[error("fragment {index} is not valid JSON: {source}")]
    Parse {
        index: usize,
        source: serde_json::Error,
    },

    #[error("fragment {index} is not a JSON object")]
    NotObject { index: usize },

    #[error("fragment {index} still contains an unresolved reference")]
    Unresolved { index: usize },

    #[error("missing required attribute '{0}'")]
    Missing(&'static str),
}

/// Decode one fragment into its entries
pub fn decode_fragment(value: &Value, index: usize) -> Result<Fragment, AssemblyError> {
    let json = match value {
        Value::String(text) => serde_json::from_str(text)
            .map_err(|source| AssemblyError::Parse { index, source })?,
        Value::ResourceRef(_, _) => return Err(AssemblyError::Unresolved { index }),
        other if other.has_refs() => return Err(AssemblyError::Unresolved { index }),
        other => other
            .to_json()
            .ok_or(AssemblyError::NotObject { index })?,
    };
    match json {
        serde_json::Value::Object(entries) => Ok(entries),
        _ => Err(AssemblyError::NotObject { index }),
    }
}

/// Merge fragments in order; a later entry replaces an earlier one with the same key
pub fn merge_fragments(fragments: &[Value]) -> Result<Fragment, AssemblyError> {
    let mut merged = Fragment::new();
    for (index, fragment) in fragments.iter().enumerate() {
        merged.extend(decode_fragment(fragment, index)?);
    }
    Ok(merged)
}

/// `{name: {"class": class, ...body}}`
pub fn wrap(name: &str, class: &str, mut body: Fragment) -> Fragment {
    body.insert("class".to_string(), json!(class));
    let mut wrapped = Fragment::new();
    wrapped.insert(name.to_string(), serde_json::Value::Object(body));
    wrapped
}

/// Reference to an object: full paths point at existing appliance objects
pub fn object_reference(name: &str) -> serde_json::Value {
    if name.starts_with('/') {
        json!({ "bigip": name })
    } else {
        json!(name)
    }
}

/// Tenant names declared in an AS3 request or ADC declaration, sorted
pub fn tenants_of(document: &serde_json::Value) -> Vec<String> {
    let declaration = match document.get("class").and_then(|c| c.as_str()) {
        Some("AS3") => document.get("declaration").unwrap_or(document),
        _ => document,
    };
    let mut tenants: Vec<String> = declaration
        .as_object()
        .map(|entries| {
            entries
                .iter()
                .filter(|(_, v)| v.get("class").and_then(|c| c.as_str()) == Some("Tenant"))
                .map(|(k, _)| k.clone())
                .collect()
        })
        .unwrap_or_default();
    tenants.sort();
    tenants
}

fn required<'a>(resource: &'a Resource, key: &'static str) -> Result<&'a str, AssemblyError> {
    resource.get_str(key).ok_or(AssemblyError::Missing(key))
}

fn string_list<'a>(resource: &'a Resource, key: &str) -> Vec<&'a str> {
    resource
        .get_list(key)
        .iter()
        .filter_map(Value::as_str)
        .collect()
}

fn insert_str(body: &mut Fragment, key: &str, value: Option<&str>) {
    if let Some(v) = value {
        body.insert(key.to_string(), json!(v));
    }
}

fn insert_remark(body: &mut Fragment, resource: &Resource) {
    insert_str(body, "remark", resource.get_str("remark"));
}

// =============================================================================
// Builders
// =============================================================================

/// `as3_pool`: `{name: {"class": "Pool", "members": [...], "monitors": [...]}}`
pub fn build_pool(resource: &Resource) -> Result<Fragment, AssemblyError> {
    let name = required(resource, "name")?;
    let mut body = Fragment::new();

    let mut members = Vec::new();
    for (index, member) in resource.get_list("members").iter().enumerate() {
        let Value::Map(attrs) = member else {
            return Err(AssemblyError::NotObject { index });
        };
        let mut entry = Fragment::new();
        for (key, value) in attrs {
            if key == "discovery" {
                entry.extend(decode_fragment(value, index)?);
            } else if value.has_refs() {
                return Err(AssemblyError::Unresolved { index });
            } else if let Some(json) = value.to_json() {
                entry.insert(key.to_lower_camel_case(), json);
            }
        }
        members.push(serde_json::Value::Object(entry));
    }
    if !members.is_empty() {
        body.insert("members".to_string(), json!(members));
    }

    let monitors: Vec<serde_json::Value> = string_list(resource, "monitors")
        .into_iter()
        .map(object_reference)
        .collect();
    if !monitors.is_empty() {
        body.insert("monitors".to_string(), json!(monitors));
    }

    insert_str(
        &mut body,
        "loadBalancingMode",
        resource.get_str("load_balancing_mode"),
    );
    if let Some(n) = resource.get_int("minimum_members_active") {
        body.insert("minimumMembersActive".to_string(), json!(n));
    }
    insert_remark(&mut body, resource);

    Ok(wrap(name, "Pool", body))
}

/// `as3_service`: `{name: {"class": "Service_HTTP", "virtualAddresses": [...], ...}}`
pub fn build_service(resource: &Resource) -> Result<Fragment, AssemblyError> {
    let name = required(resource, "name")?;
    let class = resource.get_str("service_type").unwrap_or("Service_HTTP");
    let mut body = Fragment::new();

    body.insert(
        "virtualAddresses".to_string(),
        json!(string_list(resource, "virtual_addresses")),
    );
    if let Some(port) = resource.get_int("virtual_port") {
        body.insert("virtualPort".to_string(), json!(port));
    }
    if let Some(pool) = resource.get_str("pool") {
        body.insert("pool".to_string(), object_reference(pool));
    }
    let irules: Vec<serde_json::Value> = string_list(resource, "irules")
        .into_iter()
        .map(object_reference)
        .collect();
    if !irules.is_empty() {
        body.insert("iRules".to_string(), json!(irules));
    }
    let persistence = string_list(resource, "persistence_methods");
    if !persistence.is_empty() {
        body.insert("persistenceMethods".to_string(), json!(persistence));
    }
    insert_str(&mut body, "snat", resource.get_str("snat"));
    insert_str(&mut body, "serverTLS", resource.get_str("server_tls"));
    insert_str(&mut body, "clientTLS", resource.get_str("client_tls"));
    if let Some(redirect) = resource.get_bool("redirect80") {
        body.insert("redirect80".to_string(), json!(redirect));
    }
    insert_remark(&mut body, resource);

    Ok(wrap(name, class, body))
}

/// `as3_certificate`: `{name: {"class": "Certificate", "certificate": ..., "privateKey": ...}}`
pub fn build_certificate(resource: &Resource) -> Result<Fragment, AssemblyError> {
    let name = required(resource, "name")?;
    let mut body = Fragment::new();

    body.insert(
        "certificate".to_string(),
        object_reference(required(resource, "certificate")?),
    );
    if let Some(key) = resource.get_str("private_key") {
        body.insert("privateKey".to_string(), object_reference(key));
    }
    if let Some(chain) = resource.get_str("chain_ca") {
        body.insert("chainCA".to_string(), object_reference(chain));
    }
    insert_remark(&mut body, resource);

    Ok(wrap(name, "Certificate", body))
}

/// `as3_application`: pool/service/certificate fragments under one Application
pub fn build_application(resource: &Resource) -> Result<Fragment, AssemblyError> {
    let name = required(resource, "name")?;
    let mut body = merge_fragments(resource.get_list("fragments"))?;
    insert_str(
        &mut body,
        "template",
        Some(resource.get_str("template").unwrap_or("generic")),
    );
    insert_remark(&mut body, resource);
    Ok(wrap(name, "Application", body))
}

/// `as3_tenant`: application fragments under one Tenant
pub fn build_tenant(resource: &Resource) -> Result<Fragment, AssemblyError> {
    let name = required(resource, "name")?;
    let mut body = merge_fragments(resource.get_list("applications"))?;
    insert_remark(&mut body, resource);
    Ok(wrap(name, "Tenant", body))
}

/// `as3_adc`: the complete AS3 request and the tenants it declares.
///
/// The tenant list is computed from this call's own inputs.
pub fn build_adc(resource: &Resource) -> Result<(serde_json::Value, Vec<String>), AssemblyError> {
    let mut declaration = merge_fragments(resource.get_list("tenants"))?;
    declaration.insert("class".to_string(), json!("ADC"));
    declaration.insert(
        "schemaVersion".to_string(),
        json!(resource.get_str("schema_version").unwrap_or("3.36.0")),
    );
    declaration.insert(
        "id".to_string(),
        json!(resource.get_str("id").unwrap_or("adcform")),
    );
    insert_str(&mut declaration, "label", resource.get_str("label"));
    insert_remark(&mut declaration, resource);

    let document = json!({
        "class": "AS3",
        "action": "deploy",
        "persist": resource.get_bool("persist").unwrap_or(true),
        "declaration": declaration,
    });
    let tenants = tenants_of(&document);
    Ok((document, tenants))
}
