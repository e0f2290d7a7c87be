//! Field-table encoding between configuration values and appliance JSON

use std::collections::HashMap;

use adcform_core::resource::Value;
use serde_json::json;

use crate::schemas::{Field, FieldKind};
use crate::utils::DEFAULT_PARTITION;

/// Service list values sent as a bare string
const SERVICE_KEYWORDS: &[&str] = &["all", "none", "default"];

/// Build the appliance properties for every mapped, non-computed field present
pub fn encode_fields(
    fields: &[Field],
    attributes: &HashMap<String, Value>,
) -> serde_json::Map<String, serde_json::Value> {
    let mut body = serde_json::Map::new();
    for field in fields {
        if field.is_computed() {
            continue;
        }
        if let Some(api) = field.api
            && let Some(value) = attributes.get(field.name)
            && let Some(json) = encode_value(field.kind, value)
        {
            body.insert(api.to_string(), json);
        }
    }
    body
}

/// Encode one value in the wire form of `kind`
pub fn encode_value(kind: FieldKind, value: &Value) -> Option<serde_json::Value> {
    match (kind, value) {
        (FieldKind::YesNo, Value::Bool(b)) => Some(json!(if *b { "yes" } else { "no" })),
        (FieldKind::EnabledDisabled, Value::Bool(b)) => {
            Some(json!(if *b { "enabled" } else { "disabled" }))
        }
        (FieldKind::AndList, Value::List(items)) => {
            let names: Vec<&str> = items.iter().filter_map(Value::as_str).collect();
            Some(json!(names.join(" and ")))
        }
        (FieldKind::NameList, Value::List(items)) => Some(serde_json::Value::Array(
            items
                .iter()
                .filter_map(Value::as_str)
                .map(|name| json!({ "name": name }))
                .collect(),
        )),
        (FieldKind::ServiceList, Value::List(items)) => match items.as_slice() {
            [Value::String(s)] if SERVICE_KEYWORDS.contains(&s.as_str()) => Some(json!(s)),
            _ => value.to_json(),
        },
        (FieldKind::Json, Value::String(s)) => serde_json::from_str(s).ok(),
        (FieldKind::JsonList, Value::List(items)) => Some(serde_json::Value::Array(
            items
                .iter()
                .filter_map(|item| encode_value(FieldKind::Json, item))
                .collect(),
        )),
        _ => value.to_json(),
    }
}

/// Read every mapped field back from an appliance object. Sensitive fields
/// are never read back; the appliance returns them masked or encrypted.
pub fn decode_fields(fields: &[Field], body: &serde_json::Value) -> HashMap<String, Value> {
    let mut attributes = HashMap::new();
    for field in fields {
        if field.sensitive {
            continue;
        }
        let Some(api) = field.api else {
            continue;
        };
        let json = body.get(api).or_else(|| {
            // Sub-collections come back as `<api>Reference.items` when expanded
            matches!(field.kind, FieldKind::NameList | FieldKind::Objects)
                .then(|| body.get(format!("{}Reference", api))?.get("items"))
                .flatten()
        });
        if let Some(json) = json
            && let Some(value) = decode_value(field.kind, json)
        {
            attributes.insert(field.name.to_string(), value);
        }
    }
    attributes
}

/// Decode one appliance property in the wire form of `kind`
pub fn decode_value(kind: FieldKind, json: &serde_json::Value) -> Option<Value> {
    match kind {
        FieldKind::String => match json {
            serde_json::Value::String(s) => Some(Value::String(s.clone())),
            serde_json::Value::Number(n) => Some(Value::String(n.to_string())),
            _ => None,
        },
        FieldKind::ObjectRef => json.as_str().map(|s| {
            let name = s
                .strip_prefix('/')
                .and_then(|rest| rest.strip_prefix(DEFAULT_PARTITION))
                .and_then(|rest| rest.strip_prefix('/'))
                .unwrap_or(s);
            Value::String(name.to_string())
        }),
        FieldKind::Int | FieldKind::Port => match json {
            serde_json::Value::Number(n) => n.as_i64().map(Value::Int),
            serde_json::Value::String(s) => s.parse().ok().map(Value::Int),
            _ => None,
        },
        FieldKind::Bool => match json {
            serde_json::Value::Bool(b) => Some(Value::Bool(*b)),
            serde_json::Value::String(s) => s.parse().ok().map(Value::Bool),
            _ => None,
        },
        FieldKind::YesNo => json.as_str().map(|s| Value::Bool(s == "yes")),
        FieldKind::EnabledDisabled => match json {
            serde_json::Value::Bool(b) => Some(Value::Bool(*b)),
            serde_json::Value::String(s) => Some(Value::Bool(s == "enabled")),
            _ => None,
        },
        FieldKind::AndList => json.as_str().map(|s| {
            Value::List(
                s.split(" and ")
                    .map(str::trim)
                    .filter(|part| !part.is_empty() && *part != "none")
                    .map(|part| Value::String(part.to_string()))
                    .collect(),
            )
        }),
        FieldKind::NameList => json.as_array().map(|items| {
            Value::List(
                items
                    .iter()
                    .filter_map(|item| match item {
                        serde_json::Value::String(s) => Some(s.clone()),
                        obj => obj
                            .get("fullPath")
                            .or_else(|| obj.get("name"))
                            .and_then(|n| n.as_str())
                            .map(String::from),
                    })
                    .map(Value::String)
                    .collect(),
            )
        }),
        FieldKind::StringList | FieldKind::ServiceList => match json {
            serde_json::Value::String(s) => Some(Value::List(vec![Value::String(s.clone())])),
            serde_json::Value::Array(items) => Some(Value::List(
                items
                    .iter()
                    .filter_map(|v| v.as_str().map(|s| Value::String(s.to_string())))
                    .collect(),
            )),
            _ => None,
        },
        FieldKind::IntList => json.as_array().map(|items| {
            Value::List(
                items
                    .iter()
                    .filter_map(|v| v.as_i64().map(Value::Int))
                    .collect(),
            )
        }),
        FieldKind::Objects | FieldKind::Json | FieldKind::JsonList => Value::from_json(json),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schemas::Presence;

    const FIELDS: &[Field] = &[
        Field::optional("allow_nat", "allowNat", FieldKind::YesNo),
        Field::optional("monitors", "monitor", FieldKind::AndList),
        Field::optional("profiles", "profiles", FieldKind::NameList),
        Field::optional("port_lockdown", "allowService", FieldKind::ServiceList),
        Field::optional("password", "password", FieldKind::String).sensitive(),
        Field::computed("state", "state", FieldKind::String),
        Field::local("destination", FieldKind::String, Presence::Required),
    ];

    fn attrs(pairs: Vec<(&str, Value)>) -> HashMap<String, Value> {
        pairs
            .into_iter()
            .map(|(k, v)| (k.to_string(), v))
            .collect()
    }

    fn strings(items: &[&str]) -> Value {
        Value::List(items.iter().map(|s| Value::String(s.to_string())).collect())
    }

    #[test]
    fn encode_uses_wire_forms() {
        let body = encode_fields(
            FIELDS,
            &attrs(vec![
                ("allow_nat", Value::Bool(false)),
                ("monitors", strings(&["/Common/http", "/Common/tcp"])),
                ("profiles", strings(&["/Common/http"])),
                ("port_lockdown", strings(&["all"])),
                ("password", Value::String("secret".to_string())),
                ("state", Value::String("up".to_string())),
                ("destination", Value::String("10.0.0.1".to_string())),
            ]),
        );

        assert_eq!(body["allowNat"], "no");
        assert_eq!(body["monitor"], "/Common/http and /Common/tcp");
        assert_eq!(body["profiles"], json!([{"name": "/Common/http"}]));
        assert_eq!(body["allowService"], "all");
        assert_eq!(body["password"], "secret");
        assert!(!body.contains_key("state"));
        assert_eq!(body.len(), 5);
    }

    #[test]
    fn service_list_with_ports_stays_a_list() {
        let encoded = encode_value(FieldKind::ServiceList, &strings(&["tcp:22", "udp:53"]));
        assert_eq!(encoded, Some(json!(["tcp:22", "udp:53"])));
    }

    #[test]
    fn decode_reads_wire_forms_and_skips_secrets() {
        let body = json!({
            "allowNat": "yes",
            "monitor": "/Common/http and /Common/tcp ",
            "profilesReference": {
                "items": [{"name": "http", "fullPath": "/Common/http"}]
            },
            "allowService": "default",
            "password": "$M$encrypted",
            "state": "up"
        });
        let attributes = decode_fields(FIELDS, &body);

        assert_eq!(attributes["allow_nat"], Value::Bool(true));
        assert_eq!(attributes["monitors"], strings(&["/Common/http", "/Common/tcp"]));
        assert_eq!(attributes["profiles"], strings(&["/Common/http"]));
        assert_eq!(attributes["port_lockdown"], strings(&["default"]));
        assert_eq!(attributes["state"], Value::String("up".to_string()));
        assert!(!attributes.contains_key("password"));
        assert!(!attributes.contains_key("destination"));
    }

    #[test]
    fn decode_int_from_numeric_string() {
        assert_eq!(
            decode_value(FieldKind::Int, &json!("1024")),
            Some(Value::Int(1024))
        );
        assert_eq!(decode_value(FieldKind::Int, &json!("n/a")), None);
    }

    #[test]
    fn object_refs_drop_only_the_default_partition() {
        assert_eq!(
            decode_value(FieldKind::ObjectRef, &json!("/Common/external")),
            Some(Value::String("external".to_string()))
        );
        assert_eq!(
            decode_value(FieldKind::ObjectRef, &json!("/Tenant/internal")),
            Some(Value::String("/Tenant/internal".to_string()))
        );
        assert_eq!(
            decode_value(FieldKind::ObjectRef, &json!("/Commonwealth/vlan10")),
            Some(Value::String("/Commonwealth/vlan10".to_string()))
        );
        assert_eq!(
            encode_value(FieldKind::ObjectRef, &Value::String("external".to_string())),
            Some(json!("external"))
        );
    }
}
