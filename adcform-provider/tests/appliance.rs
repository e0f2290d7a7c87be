//! Provider lifecycle against a mocked management API

use adcform_core::differ::{Diff, diff};
use adcform_core::provider::Provider;
use adcform_core::resource::{Resource, ResourceId, State, Value};
use adcform_provider::schemas::get_config;
use adcform_provider::{AdcProvider, ProviderConfig};
use serde_json::json;
use wiremock::matchers::{body_partial_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn config_for(server: &MockServer) -> ProviderConfig {
    ProviderConfig {
        address: server.uri(),
        username: "admin".to_string(),
        password: "secret".to_string(),
        token_auth: false,
        poll_interval_ms: 10,
        ..ProviderConfig::default()
    }
}

fn provider_for(server: &MockServer) -> AdcProvider {
    AdcProvider::new(&config_for(server)).unwrap()
}

fn s(v: &str) -> Value {
    Value::String(v.to_string())
}

const SELFIP_PATH: &str = "/mgmt/tm/net/self/~Common~test-selfip";

fn selfip_body() -> serde_json::Value {
    json!({
        "kind": "tm:net:self:selfstate",
        "name": "test-selfip",
        "partition": "Common",
        "fullPath": "/Common/test-selfip",
        "address": "10.0.0.1",
        "vlan": "/Common/external",
        "trafficGroup": "/Common/traffic-group-local-only",
        "floating": "disabled"
    })
}

#[tokio::test]
async fn self_ip_create_then_read() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/mgmt/tm/net/self"))
        .and(body_partial_json(json!({
            "name": "test-selfip",
            "partition": "Common",
            "address": "10.0.0.1",
            "vlan": "external"
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(selfip_body()))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path(SELFIP_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(selfip_body()))
        .mount(&server)
        .await;

    let provider = provider_for(&server);
    let mut resource = Resource::new("net_selfip", "selfip")
        .with_attribute("name", s("/Common/test-selfip"))
        .with_attribute("ip", s("10.0.0.1"))
        .with_attribute("vlan", s("external"));
    let schema = get_config("net_selfip").unwrap().schema();
    schema.validate(&resource.attributes).unwrap();
    schema.apply_defaults(&mut resource.attributes);

    let created = provider.create(&resource).await.unwrap();
    assert!(created.exists);
    assert_eq!(created.identifier.as_deref(), Some("/Common/test-selfip"));

    let read = provider
        .read(&resource.id, created.identifier.as_deref())
        .await
        .unwrap();
    assert!(read.exists);
    assert_eq!(read.attributes.get("ip"), Some(&s("10.0.0.1")));
    assert_eq!(read.attributes.get("vlan"), Some(&s("external")));
    assert_eq!(
        read.attributes.get("traffic_group"),
        Some(&s("traffic-group-local-only"))
    );
    assert_eq!(read.attributes.get("floating"), Some(&Value::Bool(false)));
    assert!(matches!(diff(&resource, &read), Diff::NoChange(_)));
}

#[tokio::test]
async fn read_after_delete_is_not_found() {
    let server = MockServer::start().await;
    Mock::given(method("DELETE"))
        .and(path(SELFIP_PATH))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path(SELFIP_PATH))
        .respond_with(ResponseTemplate::new(404).set_body_json(json!({
            "code": 404,
            "message": "01020036:3: The requested self IP (/Common/test-selfip) was not found."
        })))
        .mount(&server)
        .await;

    let provider = provider_for(&server);
    let id = ResourceId::new("net_selfip", "selfip");

    provider.delete(&id, "/Common/test-selfip").await.unwrap();
    let state = provider.read(&id, Some("/Common/test-selfip")).await.unwrap();
    assert!(!state.exists);
}

#[tokio::test]
async fn appliance_errors_carry_status_and_message() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/mgmt/tm/ltm/pool"))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({
            "code": 400,
            "message": "01020066:3: The requested Pool (/Common/web) already exists"
        })))
        .mount(&server)
        .await;

    let provider = provider_for(&server);
    let resource = Resource::new("ltm_pool", "web").with_attribute("name", s("/Common/web"));

    let err = provider.create(&resource).await.unwrap_err();
    let message = err.to_string();
    assert!(message.contains("create failed"), "{}", message);
    assert!(message.contains("already exists"), "{}", message);
}

#[tokio::test]
async fn singleton_delete_is_unsupported() {
    let server = MockServer::start().await;
    let provider = provider_for(&server);

    let err = provider
        .delete(&ResourceId::new("sys_dns", "dns"), "dns")
        .await
        .unwrap_err();
    assert!(err.is_unsupported());
    assert!(server.received_requests().await.unwrap_or_default().is_empty());
}

#[tokio::test]
async fn token_is_fetched_once_and_sent_on_every_call() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/mgmt/shared/authn/login"))
        .and(body_partial_json(json!({
            "username": "admin",
            "loginProviderName": "tmos"
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "token": { "token": "T0KEN", "timeout": 1200 }
        })))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path(SELFIP_PATH))
        .and(header("X-F5-Auth-Token", "T0KEN"))
        .respond_with(ResponseTemplate::new(200).set_body_json(selfip_body()))
        .expect(2)
        .mount(&server)
        .await;

    let config = ProviderConfig {
        token_auth: true,
        ..config_for(&server)
    };
    let provider = AdcProvider::new(&config).unwrap();
    let id = ResourceId::new("net_selfip", "selfip");

    for _ in 0..2 {
        let state = provider.read(&id, Some("/Common/test-selfip")).await.unwrap();
        assert!(state.exists);
    }
}

#[tokio::test]
async fn certificate_is_uploaded_then_installed() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/mgmt/shared/file-transfer/uploads/web.crt"))
        .and(header("Content-Range", "0-9/10"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/mgmt/tm/sys/crypto/cert"))
        .and(body_partial_json(json!({
            "command": "install",
            "name": "/Common/web.crt",
            "from-local-file": "/var/config/rest/downloads/web.crt"
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/mgmt/tm/sys/file/ssl-cert/~Common~web.crt"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "name": "web.crt",
            "fullPath": "/Common/web.crt",
            "issuer": "CN=Test CA",
            "subject": "CN=web.example.com",
            "expirationDate": 1893456000,
            "keyType": "rsa-public"
        })))
        .mount(&server)
        .await;

    let provider = provider_for(&server);
    let resource = Resource::new("ssl_certificate", "web")
        .with_attribute("name", s("web.crt"))
        .with_attribute("content", s("-----PEM-\n"));

    let state = provider.create(&resource).await.unwrap();

    assert_eq!(state.identifier.as_deref(), Some("/Common/web.crt"));
    assert_eq!(state.attributes.get("subject"), Some(&s("CN=web.example.com")));
    assert_eq!(
        state.attributes.get("expiration_date"),
        Some(&Value::Int(1893456000))
    );
    assert_eq!(state.attributes.get("partition"), Some(&s("Common")));
}

fn as3_resource() -> Resource {
    let declaration = json!({
        "class": "AS3",
        "action": "deploy",
        "declaration": {
            "class": "ADC",
            "schemaVersion": "3.36.0",
            "Sample_01": { "class": "Tenant" },
            "Sample_02": { "class": "Tenant" }
        }
    });
    Resource::new("as3", "app").with_attribute("as3_json", s(&declaration.to_string()))
}

#[tokio::test]
async fn as3_declaration_is_identified_by_its_tenants() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/mgmt/shared/appsvcs/declare"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "results": [
                { "tenant": "Sample_01", "code": 200, "message": "success" },
                { "tenant": "Sample_02", "code": 200, "message": "no change" }
            ]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let provider = provider_for(&server);
    let state = provider.create(&as3_resource()).await.unwrap();

    assert_eq!(state.identifier.as_deref(), Some("Sample_01,Sample_02"));
    assert_eq!(
        state.attributes.get("tenant_list"),
        Some(&Value::List(vec![s("Sample_01"), s("Sample_02")]))
    );
    assert!(state.attributes.contains_key("as3_json"));
}

#[tokio::test]
async fn as3_tenant_failure_fails_the_create() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/mgmt/shared/appsvcs/declare"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "results": [
                { "tenant": "Sample_01", "code": 200, "message": "success" },
                { "tenant": "Sample_02", "code": 422, "message": "declaration is invalid" }
            ]
        })))
        .mount(&server)
        .await;

    let provider = provider_for(&server);
    let err = provider.create(&as3_resource()).await.unwrap_err();

    assert!(err.to_string().contains("Sample_02: declaration is invalid"));
}

fn suggestions_resource() -> Resource {
    Resource::new("waf_pb_suggestions", "suggestions")
        .with_read_only(true)
        .with_attribute("policy_name", s("/Common/app_policy"))
        .with_attribute("minimum_learning_score", Value::Int(50))
}

async fn mount_policy_lookup(server: &MockServer) {
    Mock::given(method("GET"))
        .and(path("/mgmt/tm/asm/policies"))
        .and(query_param("$filter", "fullPath eq '/Common/app_policy'"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "items": [{ "id": "Pol1cyId", "fullPath": "/Common/app_policy" }]
        })))
        .mount(server)
        .await;
    Mock::given(method("POST"))
        .and(path("/mgmt/tm/asm/tasks/export-suggestions"))
        .and(body_partial_json(json!({
            "inline": true,
            "filter": "score gt 50"
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": "task1",
            "status": "NEW"
        })))
        .expect(1)
        .mount(server)
        .await;
}

#[tokio::test]
async fn suggestions_are_polled_until_completed() {
    let server = MockServer::start().await;
    mount_policy_lookup(&server).await;
    Mock::given(method("GET"))
        .and(path("/mgmt/tm/asm/tasks/export-suggestions/task1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "status": "RUNNING" })))
        .up_to_n_times(2)
        .expect(2)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/mgmt/tm/asm/tasks/export-suggestions/task1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "status": "COMPLETED",
            "result": { "suggestions": [{ "action": "add-or-update", "entity": { "name": "/login" } }] }
        })))
        .expect(1)
        .mount(&server)
        .await;

    let provider = provider_for(&server);
    let state = provider
        .read_data_source(&suggestions_resource())
        .await
        .unwrap();

    assert_eq!(state.attributes.get("policy_id"), Some(&s("Pol1cyId")));
    let Some(Value::String(text)) = state.attributes.get("json") else {
        panic!("json output missing");
    };
    let result: serde_json::Value = serde_json::from_str(text).unwrap();
    assert_eq!(result["suggestions"][0]["entity"]["name"], "/login");
}

#[tokio::test]
async fn failed_suggestion_task_is_an_error() {
    let server = MockServer::start().await;
    mount_policy_lookup(&server).await;
    Mock::given(method("GET"))
        .and(path("/mgmt/tm/asm/tasks/export-suggestions/task1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "status": "FAILURE",
            "result": { "message": "policy has no learning data" }
        })))
        .mount(&server)
        .await;

    let provider = provider_for(&server);
    let err = provider
        .read_data_source(&suggestions_resource())
        .await
        .unwrap_err();

    assert!(err.to_string().contains("policy has no learning data"));
}

#[tokio::test]
async fn pool_lookup_reads_observed_attributes() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/mgmt/tm/ltm/pool/~Common~web"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "name": "web",
            "fullPath": "/Common/web",
            "loadBalancingMode": "least-connections-member",
            "monitor": "/Common/http "
        })))
        .mount(&server)
        .await;

    let provider = provider_for(&server);
    let resource = Resource::new("ltm_pool", "existing")
        .with_read_only(true)
        .with_attribute("name", s("web"));

    let state = provider.read_data_source(&resource).await.unwrap();

    assert_eq!(state.identifier.as_deref(), Some("/Common/web"));
    assert_eq!(state.attributes.get("full_path"), Some(&s("/Common/web")));
    assert_eq!(
        state.attributes.get("monitors"),
        Some(&Value::List(vec![s("/Common/http")]))
    );
}

#[tokio::test]
async fn missing_lookup_target_is_an_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/mgmt/tm/ltm/pool/~Common~gone"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let provider = provider_for(&server);
    let resource = Resource::new("ltm_pool", "gone")
        .with_read_only(true)
        .with_attribute("name", s("gone"));

    assert!(provider.read_data_source(&resource).await.is_err());
}

const POLICY_PATH: &str = "/mgmt/tm/asm/policies/Pol1cyId";

fn waf_policy_resource() -> Resource {
    Resource::new("waf_policy", "app")
        .with_attribute("name", s("/Common/app_policy"))
        .with_attribute("enforcement_mode", s("blocking"))
        .with_attribute(
            "urls",
            Value::List(vec![s(r#"{"name": "/login", "protocol": "https"}"#)]),
        )
        .with_attribute(
            "parameters",
            Value::List(vec![s(r#"{"name": "user", "type": "explicit"}"#)]),
        )
        .with_attribute(
            "signatures",
            Value::List(vec![s(r#"{"signatureId": 200001834, "enabled": false}"#)]),
        )
}

async fn mount_policy_create(server: &MockServer) {
    Mock::given(method("POST"))
        .and(path("/mgmt/tm/asm/policies"))
        .and(body_partial_json(json!({
            "name": "app_policy",
            "partition": "Common",
            "enforcementMode": "blocking"
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": "Pol1cyId",
            "fullPath": "/Common/app_policy"
        })))
        .expect(1)
        .mount(server)
        .await;
    Mock::given(method("GET"))
        .and(path(format!("{}/urls", POLICY_PATH)))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "items": [{ "id": "Url1d", "name": "/login", "protocol": "http" }]
        })))
        .mount(server)
        .await;
    Mock::given(method("GET"))
        .and(path(format!("{}/parameters", POLICY_PATH)))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "items": [] })))
        .mount(server)
        .await;
}

#[tokio::test]
async fn waf_policy_create_upserts_entities_then_patches_signatures() {
    let server = MockServer::start().await;
    mount_policy_create(&server).await;
    Mock::given(method("PATCH"))
        .and(path(format!("{}/urls/Url1d", POLICY_PATH)))
        .and(body_partial_json(json!({ "name": "/login", "protocol": "https" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "id": "Url1d" })))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path(format!("{}/urls", POLICY_PATH)))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
        .expect(0)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path(format!("{}/parameters", POLICY_PATH)))
        .and(body_partial_json(json!({ "name": "user", "type": "explicit" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "id": "Param1d" })))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("PATCH"))
        .and(path(format!("{}/signatures", POLICY_PATH)))
        .and(query_param("$filter", "signature/signatureId eq 200001834"))
        .and(body_partial_json(json!({ "enabled": false })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "items": [] })))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path(POLICY_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": "Pol1cyId",
            "kind": "tm:asm:policies:policystate",
            "fullPath": "/Common/app_policy",
            "enforcementMode": "blocking"
        })))
        .mount(&server)
        .await;

    let provider = provider_for(&server);
    let state = provider.create(&waf_policy_resource()).await.unwrap();

    assert_eq!(state.identifier.as_deref(), Some("Pol1cyId"));
    assert_eq!(state.attributes.get("name"), Some(&s("/Common/app_policy")));
    assert_eq!(state.attributes.get("policy_id"), Some(&s("Pol1cyId")));
    let Some(Value::String(export)) = state.attributes.get("policy_export_json") else {
        panic!("policy export missing");
    };
    let export: serde_json::Value = serde_json::from_str(export).unwrap();
    assert_eq!(export["policy"]["enforcementMode"], "blocking");
    assert!(export["policy"].get("id").is_none());
    assert_eq!(export["policy"]["urls"], json!([{ "name": "/login", "protocol": "http" }]));
}

#[tokio::test]
async fn waf_policy_entity_failure_stops_before_signatures() {
    let server = MockServer::start().await;
    mount_policy_create(&server).await;
    Mock::given(method("PATCH"))
        .and(path(format!("{}/urls/Url1d", POLICY_PATH)))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "id": "Url1d" })))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path(format!("{}/parameters", POLICY_PATH)))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({
            "code": 400,
            "message": "Parameter 'user' has an invalid type"
        })))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("PATCH"))
        .and(path(format!("{}/signatures", POLICY_PATH)))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
        .expect(0)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path(POLICY_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "id": "Pol1cyId" })))
        .expect(0)
        .mount(&server)
        .await;

    let provider = provider_for(&server);
    let err = provider.create(&waf_policy_resource()).await.unwrap_err();

    let message = err.to_string();
    assert!(message.contains("add entity failed"), "{}", message);
    assert!(message.contains("invalid type"), "{}", message);
}

#[tokio::test]
async fn waf_policy_update_patches_policy_and_entities() {
    let server = MockServer::start().await;
    Mock::given(method("PATCH"))
        .and(path(POLICY_PATH))
        .and(body_partial_json(json!({ "enforcementMode": "transparent" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "id": "Pol1cyId" })))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path(format!("{}/urls", POLICY_PATH)))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "items": [] })))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path(format!("{}/urls", POLICY_PATH)))
        .and(body_partial_json(json!({ "name": "/admin" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "id": "Url2d" })))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path(format!("{}/parameters", POLICY_PATH)))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "items": [] })))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path(POLICY_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": "Pol1cyId",
            "fullPath": "/Common/app_policy",
            "enforcementMode": "transparent"
        })))
        .mount(&server)
        .await;

    let provider = provider_for(&server);
    let id = ResourceId::new("waf_policy", "app");
    let to = Resource::new("waf_policy", "app")
        .with_attribute("name", s("/Common/app_policy"))
        .with_attribute("enforcement_mode", s("transparent"))
        .with_attribute("urls", Value::List(vec![s(r#"{"name": "/admin"}"#)]));

    let state = provider
        .update(&id, "Pol1cyId", &State::not_found(id.clone()), &to)
        .await
        .unwrap();

    assert_eq!(state.attributes.get("enforcement_mode"), Some(&s("transparent")));
}

const MEMBER_PATH: &str = "/mgmt/tm/ltm/pool/~Common~web/members/~Common~10.0.0.1:80";

fn member_body(ratio: i64) -> serde_json::Value {
    json!({
        "name": "/Common/10.0.0.1:80",
        "fullPath": "/Common/10.0.0.1:80",
        "ratio": ratio,
        "priorityGroup": 0,
        "state": "up"
    })
}

#[tokio::test]
async fn pool_attachment_lifecycle() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/mgmt/tm/ltm/pool/~Common~web/members"))
        .and(body_partial_json(json!({ "name": "/Common/10.0.0.1:80", "ratio": 2 })))
        .respond_with(ResponseTemplate::new(200).set_body_json(member_body(2)))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("PUT"))
        .and(path(MEMBER_PATH))
        .and(body_partial_json(json!({ "ratio": 3 })))
        .respond_with(ResponseTemplate::new(200).set_body_json(member_body(3)))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("DELETE"))
        .and(path(MEMBER_PATH))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path(MEMBER_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(member_body(2)))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path(MEMBER_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(member_body(3)))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path(MEMBER_PATH))
        .respond_with(ResponseTemplate::new(404).set_body_json(json!({
            "code": 404,
            "message": "01020036:3: The requested Pool Member was not found."
        })))
        .mount(&server)
        .await;

    let provider = provider_for(&server);
    let resource = Resource::new("ltm_pool_attachment", "web_app1")
        .with_attribute("pool", s("/Common/web"))
        .with_attribute("node", s("/Common/10.0.0.1:80"))
        .with_attribute("ratio", Value::Int(2));

    let created = provider.create(&resource).await.unwrap();
    let identifier = "/Common/web:/Common/10.0.0.1:80";
    assert_eq!(created.identifier.as_deref(), Some(identifier));
    assert_eq!(created.attributes.get("pool"), Some(&s("/Common/web")));
    assert_eq!(created.attributes.get("node"), Some(&s("/Common/10.0.0.1:80")));
    assert_eq!(created.attributes.get("ratio"), Some(&Value::Int(2)));
    assert!(matches!(diff(&resource, &created), Diff::NoChange(_)));

    let to = resource.clone().with_attribute("ratio", Value::Int(3));
    let updated = provider
        .update(&resource.id, identifier, &created, &to)
        .await
        .unwrap();
    assert_eq!(updated.attributes.get("ratio"), Some(&Value::Int(3)));

    provider.delete(&resource.id, identifier).await.unwrap();
    let gone = provider.read(&resource.id, Some(identifier)).await.unwrap();
    assert!(!gone.exists);
}

#[tokio::test]
async fn pool_attachment_rejects_malformed_identifier() {
    let server = MockServer::start().await;
    let provider = provider_for(&server);
    let id = ResourceId::new("ltm_pool_attachment", "web_app1");

    let err = provider.read(&id, Some("/Common/web")).await.unwrap_err();

    assert!(err.to_string().contains("expected <pool>:<node>"));
}
