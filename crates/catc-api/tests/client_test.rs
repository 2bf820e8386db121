#![allow(clippy::unwrap_used)]
// Integration tests for `CatalystClient` using wiremock.

use std::time::Duration;

use pretty_assertions::assert_eq;
use serde_json::json;
use wiremock::matchers::{body_json, body_string_contains, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use catc_api::types::event::SubscriptionChannel;
use catc_api::types::sda::{Layer2Filter, Layer2VirtualNetwork};
use catc_api::types::site::SiteType;
use catc_api::{CatalystClient, Error, TaskHandle, TlsMode, TransportConfig};

// ── Helpers ─────────────────────────────────────────────────────────

async fn setup() -> (MockServer, CatalystClient) {
    let server = MockServer::start().await;
    let client = CatalystClient::from_reqwest(&server.uri(), reqwest::Client::new()).unwrap();
    (server, client)
}

fn transport() -> TransportConfig {
    TransportConfig {
        tls: TlsMode::System,
        timeout: Duration::from_secs(5),
    }
}

// ── Authentication ──────────────────────────────────────────────────

#[tokio::test]
async fn login_sends_token_on_later_requests() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/dna/system/api/v1/auth/token"))
        .and(header("authorization", "Basic YWRtaW46c2VjcmV0"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "Token": "tok-1" })))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/dna/intent/api/v1/dnac-release"))
        .and(header("x-auth-token", "tok-1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "response": { "displayVersion": "2.3.7.6", "installedVersion": "2.3.7.6.70045" }
        })))
        .expect(1)
        .mount(&server)
        .await;

    let secret: secrecy::SecretString = "secret".to_string().into();
    let client = CatalystClient::login(&server.uri(), "admin", &secret, &transport())
        .await
        .unwrap();
    let release = client.get_release_summary().await.unwrap();

    assert_eq!(release.display_version.as_deref(), Some("2.3.7.6"));
}

#[tokio::test]
async fn login_failure_is_authentication_error() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/dna/system/api/v1/auth/token"))
        .respond_with(ResponseTemplate::new(401).set_body_string("Unauthorized"))
        .mount(&server)
        .await;

    let secret: secrecy::SecretString = "wrong".to_string().into();
    let result = CatalystClient::login(&server.uri(), "admin", &secret, &transport()).await;

    assert!(
        matches!(result, Err(Error::Authentication { .. })),
        "expected Authentication error, got: {:?}",
        result.err()
    );
}

// ── Sites ───────────────────────────────────────────────────────────

#[tokio::test]
async fn get_sites_passes_hierarchy_and_type() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/dna/intent/api/v1/sites"))
        .and(query_param("nameHierarchy", "Global/USA/SJC"))
        .and(query_param("type", "building"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "response": [{
                "id": "b-1",
                "name": "SJC",
                "nameHierarchy": "Global/USA/SJC",
                "type": "building",
                "parentId": "a-1",
                "latitude": 37.33,
                "longitude": -121.89
            }]
        })))
        .mount(&server)
        .await;

    let sites = client
        .get_sites("Global/USA/SJC", Some(SiteType::Building))
        .await
        .unwrap();

    assert_eq!(sites.len(), 1);
    assert_eq!(sites[0].site_type, Some(SiteType::Building));
    assert_eq!(sites[0].parent_id.as_deref(), Some("a-1"));
}

#[tokio::test]
async fn legacy_site_reads_attributes_from_additional_info() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/dna/intent/api/v1/site"))
        .and(query_param("name", "Global/USA/SJC/F1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "response": [{
                "id": "f-1",
                "name": "F1",
                "parentId": "b-1",
                "siteNameHierarchy": "Global/USA/SJC/F1",
                "additionalInfo": [
                    { "nameSpace": "Location", "attributes": { "type": "floor" } },
                    { "nameSpace": "mapGeometry", "attributes": { "width": "100.0", "length": "50.5", "height": "10.0" } },
                    { "nameSpace": "mapsSummary", "attributes": { "rfModel": "Drywall Office Only", "floorIndex": "2" } }
                ]
            }]
        })))
        .mount(&server)
        .await;

    let sites = client.get_site(Some("Global/USA/SJC/F1")).await.unwrap();

    assert_eq!(sites[0].site_type, Some(SiteType::Floor));
    assert_eq!(sites[0].length, Some(50.5));
    assert_eq!(sites[0].floor_number, Some(2));
    assert_eq!(sites[0].rf_model.as_deref(), Some("Drywall Office Only"));
}

#[tokio::test]
async fn legacy_site_create_returns_execution_handle() {
    let (server, client) = setup().await;

    Mock::given(method("POST"))
        .and(path("/dna/intent/api/v1/site"))
        .respond_with(ResponseTemplate::new(202).set_body_json(json!({
            "executionId": "e-1",
            "executionStatusUrl": "/dna/intent/api/v1/dnacaap/management/execution-status/e-1",
            "message": "The request has been accepted for execution"
        })))
        .mount(&server)
        .await;

    let payload = catc_api::types::site::LegacySitePayload {
        site_type: SiteType::Area,
        site: catc_api::types::site::LegacySiteBody {
            area: Some(catc_api::types::site::LegacyArea {
                name: "USA".into(),
                parent_name: "Global".into(),
            }),
            ..Default::default()
        },
    };
    let handle = client.create_site(&payload).await.unwrap();

    assert_eq!(handle, TaskHandle::Execution("e-1".into()));
}

#[tokio::test]
async fn floor_image_upload_is_multipart() {
    let (server, client) = setup().await;
    let dir = tempfile::tempdir().unwrap();
    let image = dir.path().join("f.png");
    std::fs::write(&image, b"PNG fake bytes").unwrap();

    Mock::given(method("POST"))
        .and(path("/dna/intent/api/v2/floors/f-1/uploadImage"))
        .and(body_string_contains("name=\"image\""))
        .and(body_string_contains("Content-Type: image/png"))
        .respond_with(ResponseTemplate::new(202).set_body_json(json!({
            "response": { "taskId": "t-9" }
        })))
        .expect(1)
        .mount(&server)
        .await;

    let handle = client.upload_floor_image("f-1", &image).await.unwrap();
    assert_eq!(handle, TaskHandle::Task("t-9".into()));
}

#[tokio::test]
async fn floor_image_missing_file_is_file_error() {
    let (_server, client) = setup().await;
    let result = client
        .upload_floor_image("f-1", std::path::Path::new("/nonexistent/f.png"))
        .await;

    assert!(matches!(result, Err(Error::File { .. })));
}

// ── SDA ─────────────────────────────────────────────────────────────

#[tokio::test]
async fn layer2_filter_becomes_query() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/dna/intent/api/v1/sda/layer2VirtualNetworks"))
        .and(query_param("fabricId", "fab-1"))
        .and(query_param("vlanName", "vlan_test1"))
        .and(query_param("vlanId", "1333"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "response": [{
                "id": "l2-1",
                "fabricId": "fab-1",
                "vlanName": "vlan_test1",
                "vlanId": 1333,
                "trafficType": "DATA",
                "isFabricEnabledWireless": false
            }]
        })))
        .mount(&server)
        .await;

    let found = client
        .get_layer2_virtual_networks(&Layer2Filter {
            fabric_id: Some("fab-1"),
            vlan_name: Some("vlan_test1"),
            vlan_id: Some(1333),
        })
        .await
        .unwrap();

    assert_eq!(found[0].id.as_deref(), Some("l2-1"));
}

#[tokio::test]
async fn layer2_add_posts_array_and_omits_unset_fields() {
    let (server, client) = setup().await;

    Mock::given(method("POST"))
        .and(path("/dna/intent/api/v1/sda/layer2VirtualNetworks"))
        .and(body_json(json!([{
            "fabricId": "fab-1",
            "vlanName": "vlan_test1",
            "vlanId": 1333,
            "trafficType": "DATA",
            "isFabricEnabledWireless": false
        }])))
        .respond_with(ResponseTemplate::new(202).set_body_json(json!({
            "response": { "taskId": "t-1", "url": "/api/v1/task/t-1" },
            "version": "1.0"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let handle = client
        .add_layer2_virtual_networks(&[Layer2VirtualNetwork {
            fabric_id: "fab-1".into(),
            vlan_name: "vlan_test1".into(),
            vlan_id: 1333,
            traffic_type: "DATA".into(),
            ..Default::default()
        }])
        .await
        .unwrap();

    assert_eq!(handle, TaskHandle::Task("t-1".into()));
}

#[tokio::test]
async fn layer3_delete_uses_name_query() {
    let (server, client) = setup().await;

    Mock::given(method("DELETE"))
        .and(path("/dna/intent/api/v1/sda/layer3VirtualNetworks"))
        .and(query_param("virtualNetworkName", "vn_with_anchor"))
        .respond_with(ResponseTemplate::new(202).set_body_json(json!({
            "response": { "taskId": "t-2" }
        })))
        .expect(1)
        .mount(&server)
        .await;

    let handle = client
        .delete_layer3_virtual_network("vn_with_anchor")
        .await
        .unwrap();
    assert_eq!(handle, TaskHandle::Task("t-2".into()));
}

// ── Event management ────────────────────────────────────────────────

#[tokio::test]
async fn webhook_lookup_pages_until_match() {
    let (server, client) = setup().await;

    let page = |range: std::ops::Range<usize>| {
        let items: Vec<_> = range
            .map(|i| json!({ "webhookId": format!("w-{i}"), "name": format!("hook-{i}"), "url": "https://x" }))
            .collect();
        json!({ "apiStatus": "SUCCESS", "statusMessage": items })
    };

    Mock::given(method("GET"))
        .and(path("/dna/intent/api/v1/event/webhook"))
        .and(query_param("offset", "0"))
        .respond_with(ResponseTemplate::new(200).set_body_json(page(0..10)))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/dna/intent/api/v1/event/webhook"))
        .and(query_param("offset", "10"))
        .respond_with(ResponseTemplate::new(200).set_body_json(page(10..13)))
        .expect(1)
        .mount(&server)
        .await;

    let found = client.find_webhook_destination("hook-12").await.unwrap();
    assert_eq!(found.unwrap().webhook_id.as_deref(), Some("w-12"));

    server.reset().await;
    Mock::given(method("GET"))
        .and(path("/dna/intent/api/v1/event/webhook"))
        .respond_with(ResponseTemplate::new(200).set_body_json(page(0..3)))
        .mount(&server)
        .await;
    assert!(client.find_webhook_destination("absent").await.unwrap().is_none());
}

#[tokio::test]
async fn syslog_create_rejected_synchronously() {
    let (server, client) = setup().await;

    Mock::given(method("POST"))
        .and(path("/dna/intent/api/v1/event/syslog-config"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "apiStatus": "FAILURE",
            "errorMessage": { "errors": ["Syslog name already exists"] }
        })))
        .mount(&server)
        .await;

    let handle = client
        .create_syslog_destination(&catc_api::types::event::SyslogDestination {
            name: "syslog-1".into(),
            host: "10.0.0.1".into(),
            protocol: "UDP".into(),
            port: 514,
            ..Default::default()
        })
        .await
        .unwrap();

    assert_eq!(
        handle,
        TaskHandle::Rejected("Syslog name already exists".into())
    );
}

#[tokio::test]
async fn subscription_create_returns_event_status_handle() {
    let (server, client) = setup().await;

    Mock::given(method("POST"))
        .and(path("/dna/intent/api/v1/event/subscription/rest"))
        .respond_with(ResponseTemplate::new(202).set_body_json(json!({
            "statusUri": "/dna/intent/api/v1/event/api-status/exec-7"
        })))
        .mount(&server)
        .await;

    let handle = client
        .create_event_subscriptions(SubscriptionChannel::Rest, &[])
        .await
        .unwrap();

    assert_eq!(handle, TaskHandle::EventStatus("exec-7".into()));
}

// ── Errors ──────────────────────────────────────────────────────────

#[tokio::test]
async fn controller_error_carries_operation_and_message() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/dna/intent/api/v1/sda/fabricSites"))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({
            "response": { "errorCode": "BAD", "detail": "siteId is invalid" }
        })))
        .mount(&server)
        .await;

    let err = client.get_fabric_sites(Some("nope")).await.unwrap_err();

    match err {
        Error::Api {
            operation,
            status,
            ref message,
            ..
        } => {
            assert_eq!(operation, "sda.get_fabric_sites");
            assert_eq!(status, 400);
            assert_eq!(message, "siteId is invalid");
        }
        other => panic!("expected Api error, got: {other:?}"),
    }
}

#[tokio::test]
async fn not_found_and_unauthorized_are_distinct() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/dna/intent/api/v1/task/gone"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/dna/intent/api/v1/task/locked"))
        .respond_with(ResponseTemplate::new(401))
        .mount(&server)
        .await;

    let gone = client.get_task_by_id("gone").await.unwrap_err();
    assert!(gone.is_not_found());
    assert!(matches!(
        client.get_task_by_id("locked").await,
        Err(Error::TokenExpired)
    ));
}

#[tokio::test]
async fn malformed_body_is_deserialization_error() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/dna/intent/api/v1/sda/fabricZones"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>oops</html>"))
        .mount(&server)
        .await;

    let err = client.get_fabric_zones(Some("s-1")).await.unwrap_err();
    match err {
        Error::Deserialization { operation, body, .. } => {
            assert_eq!(operation, "sda.get_fabric_zones");
            assert!(body.contains("oops"));
        }
        other => panic!("expected Deserialization error, got: {other:?}"),
    }
}
