#![allow(clippy::unwrap_used)]
// End-to-end reconciliation tests against a mocked Catalyst Center.

use std::io::Write as _;
use std::time::Duration;

use pretty_assertions::assert_eq;
use serde_json::{Value, json};
use wiremock::matchers::{body_partial_json, method, path, query_param};
use wiremock::{Mock, MockServer, Request, ResponseTemplate};

use catc_api::CatalystClient;
use catc_core::{CoreError, Engine, EngineSettings, KindReport, Report, ResourceKind, State};

// ── Helpers ─────────────────────────────────────────────────────────

const SDA_RELEASE: &str = "2.3.7.6";

fn settings(state: State) -> EngineSettings {
    EngineSettings {
        state,
        task_poll_interval: Duration::from_millis(10),
        task_timeout: Duration::from_secs(2),
        ..Default::default()
    }
}

fn engine(server: &MockServer, version: &str, settings: EngineSettings) -> Engine {
    let client = CatalystClient::from_reqwest(&server.uri(), reqwest::Client::new()).unwrap();
    Engine::with_client(client, version.parse().unwrap(), settings)
}

fn ok(body: Value) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_json(body)
}

fn task(id: &str) -> ResponseTemplate {
    ok(json!({ "response": { "taskId": id, "url": format!("/api/v1/task/{id}") } }))
}

async fn mount_task_done(server: &MockServer, id: &str) {
    Mock::given(method("GET"))
        .and(path(format!("/dna/intent/api/v1/task/{id}")))
        .respond_with(ok(json!({
            "response": { "id": id, "isError": false, "progress": "done", "endTime": 1 }
        })))
        .mount(server)
        .await;
}

async fn mount_site(server: &MockServer, hierarchy: &str, id: &str, site_type: &str) {
    let name = hierarchy.rsplit('/').next().unwrap_or(hierarchy);
    Mock::given(method("GET"))
        .and(path("/dna/intent/api/v1/sites"))
        .and(query_param("nameHierarchy", hierarchy))
        .respond_with(ok(json!({ "response": [{
            "id": id, "name": name, "nameHierarchy": hierarchy, "type": site_type
        }]})))
        .mount(server)
        .await;
}

async fn mount_fabric_site(server: &MockServer, hierarchy: &str, site_id: &str, fabric_id: &str) {
    mount_site(server, hierarchy, site_id, "area").await;
    Mock::given(method("GET"))
        .and(path("/dna/intent/api/v1/sda/fabricSites"))
        .and(query_param("siteId", site_id))
        .respond_with(ok(json!({ "response": [{ "id": fabric_id, "siteId": site_id }] })))
        .mount(server)
        .await;
}

async fn mutations(server: &MockServer) -> Vec<Request> {
    server
        .received_requests()
        .await
        .unwrap_or_default()
        .into_iter()
        .filter(|r| r.method.as_str() != "GET")
        .collect()
}

fn vlan_config() -> Value {
    json!([{ "fabric_vlan": [{
        "vlan_name": "vlan_test1",
        "vlan_id": 1333,
        "traffic_type": "DATA",
        "fabric_site_locations": [{ "site_name_hierarchy": "Global/India", "fabric_type": "fabric_site" }],
    }]}])
}

// ── Fabric VLANs ────────────────────────────────────────────────────

#[tokio::test]
async fn creates_a_fabric_vlan() {
    let server = MockServer::start().await;
    mount_fabric_site(&server, "Global/India", "site-india", "fab-india").await;
    Mock::given(method("GET"))
        .and(path("/dna/intent/api/v1/sda/layer2VirtualNetworks"))
        .respond_with(ok(json!({ "response": [] })))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/dna/intent/api/v1/sda/layer2VirtualNetworks"))
        .and(body_partial_json(json!([{
            "fabricId": "fab-india", "vlanName": "vlan_test1", "vlanId": 1333, "trafficType": "DATA"
        }])))
        .respond_with(task("t-1"))
        .expect(1)
        .mount(&server)
        .await;
    mount_task_done(&server, "t-1").await;

    let report = engine(&server, SDA_RELEASE, settings(State::Merged))
        .apply(&vlan_config())
        .await
        .unwrap();

    assert!(report.changed);
    assert_eq!(report.response[0].kind, ResourceKind::FabricVlan);
    assert_eq!(report.response[0].created, vec!["vlan_test1:1333@Global/India"]);
    assert!(report.msg.contains("created successfully"));
}

#[tokio::test]
async fn reapplying_an_equal_vlan_makes_no_mutation() {
    let server = MockServer::start().await;
    mount_fabric_site(&server, "Global/India", "site-india", "fab-india").await;
    Mock::given(method("GET"))
        .and(path("/dna/intent/api/v1/sda/layer2VirtualNetworks"))
        .respond_with(ok(json!({ "response": [{
            "id": "l2-1", "fabricId": "fab-india", "vlanName": "vlan_test1", "vlanId": 1333,
            "trafficType": "DATA", "isFabricEnabledWireless": false
        }]})))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .respond_with(task("t-1"))
        .expect(0)
        .mount(&server)
        .await;
    Mock::given(method("PUT"))
        .respond_with(task("t-1"))
        .expect(0)
        .mount(&server)
        .await;

    let report = engine(&server, SDA_RELEASE, settings(State::Merged))
        .apply(&vlan_config())
        .await
        .unwrap();

    assert!(!report.changed);
    assert_eq!(report.response[0].no_update, vec!["vlan_test1:1333@Global/India"]);
}

#[tokio::test]
async fn deleting_an_absent_vlan_is_not_a_change() {
    let server = MockServer::start().await;
    mount_fabric_site(&server, "Global/India", "site-india", "fab-india").await;
    Mock::given(method("GET"))
        .and(path("/dna/intent/api/v1/sda/layer2VirtualNetworks"))
        .respond_with(ok(json!({ "response": [] })))
        .mount(&server)
        .await;

    let report = engine(&server, SDA_RELEASE, settings(State::Deleted))
        .apply(&vlan_config())
        .await
        .unwrap();

    assert!(!report.changed);
    assert_eq!(report.response[0].absent.len(), 1);
    assert!(mutations(&server).await.is_empty());
}

#[tokio::test]
async fn flooding_controls_never_reach_older_controllers() {
    let server = MockServer::start().await;
    mount_fabric_site(&server, "Global/India", "site-india", "fab-india").await;
    Mock::given(method("GET"))
        .and(path("/dna/intent/api/v1/sda/layer2VirtualNetworks"))
        .respond_with(ok(json!({ "response": [] })))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/dna/intent/api/v1/sda/layer2VirtualNetworks"))
        .respond_with(task("t-1"))
        .expect(1)
        .mount(&server)
        .await;
    mount_task_done(&server, "t-1").await;

    let config = json!([{ "fabric_vlan": [{
        "vlan_name": "vlan_test1",
        "vlan_id": 1333,
        "wireless_flooding_enable": true,
        "resource_guard_enable": true,
        "fabric_site_locations": [{ "site_name_hierarchy": "Global/India" }],
    }]}]);
    engine(&server, SDA_RELEASE, settings(State::Merged))
        .apply(&config)
        .await
        .unwrap();

    let sent = mutations(&server).await;
    let body: Value = sent[0].body_json().unwrap();
    assert!(body[0].get("isWirelessFloodingEnabled").is_none());
    assert!(body[0].get("isResourceGuardEnabled").is_none());
}

#[tokio::test]
async fn task_failure_stops_the_kind_but_not_the_run() {
    let server = MockServer::start().await;
    mount_fabric_site(&server, "Global/India", "site-india", "fab-india").await;
    Mock::given(method("GET"))
        .and(path("/dna/intent/api/v1/sda/layer2VirtualNetworks"))
        .respond_with(ok(json!({ "response": [] })))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/dna/intent/api/v1/sda/layer2VirtualNetworks"))
        .and(body_partial_json(json!([{ "vlanName": "v2" }])))
        .respond_with(task("t-bad"))
        .with_priority(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/dna/intent/api/v1/sda/layer2VirtualNetworks"))
        .respond_with(task("t-ok"))
        .mount(&server)
        .await;
    mount_task_done(&server, "t-ok").await;
    Mock::given(method("GET"))
        .and(path("/dna/intent/api/v1/task/t-bad"))
        .respond_with(ok(json!({ "response": {
            "id": "t-bad", "isError": true, "failureReason": "Batch Operation failed", "endTime": 1
        }})))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/dna/intent/api/v1/task/t-bad/tree"))
        .respond_with(ok(json!({ "response": [
            { "id": "t-bad", "isError": true, "failureReason": "Batch Operation failed" },
            { "id": "t-sub", "isError": true, "failureReason": "VLAN v2 conflicts with an existing pool" }
        ]})))
        .mount(&server)
        .await;

    // Webhook destinations run after fabric VLANs and must still be applied.
    Mock::given(method("GET"))
        .and(path("/dna/intent/api/v1/event/webhook"))
        .respond_with(ok(json!({ "statusMessage": [] })))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/dna/intent/api/v1/event/webhook"))
        .respond_with(ok(json!({ "apiStatus": "SUCCESS", "statusMessage": "created" })))
        .expect(1)
        .mount(&server)
        .await;

    let location = json!([{ "site_name_hierarchy": "Global/India" }]);
    let config = json!([
        { "webhook_destination": [{ "name": "hook", "url": "https://hooks.example.com/catc" }] },
        { "fabric_vlan": [
            { "vlan_name": "v1", "vlan_id": 101, "fabric_site_locations": location },
            { "vlan_name": "v2", "vlan_id": 102, "fabric_site_locations": location },
            { "vlan_name": "v3", "vlan_id": 103, "fabric_site_locations": location },
        ]},
    ]);
    let mut settings = settings(State::Merged);
    settings.fabric_vlan_batch_size = 1;
    let report = engine(&server, SDA_RELEASE, settings).apply(&config).await.unwrap();

    let vlans = &report.response[0];
    assert_eq!(vlans.kind, ResourceKind::FabricVlan);
    assert_eq!(vlans.created, vec!["v1:101@Global/India"]);
    assert_eq!(vlans.failed.len(), 2);
    assert_eq!(vlans.failed[0].kind, "TaskFailure");
    assert!(vlans.failed[0].reason.contains("conflicts with an existing pool"));
    assert_eq!(vlans.failed[1].item, "v3:103@Global/India");
    assert_eq!(vlans.failed[1].kind, "NotAttempted");

    let hooks = &report.response[1];
    assert_eq!(hooks.created, vec!["hook"]);
    assert!(report.changed);
    assert!(report.last_error_response.is_some());
}

#[tokio::test]
async fn pending_task_times_out() {
    let server = MockServer::start().await;
    mount_fabric_site(&server, "Global/India", "site-india", "fab-india").await;
    Mock::given(method("GET"))
        .and(path("/dna/intent/api/v1/sda/layer2VirtualNetworks"))
        .respond_with(ok(json!({ "response": [] })))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/dna/intent/api/v1/sda/layer2VirtualNetworks"))
        .respond_with(task("t-slow"))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/dna/intent/api/v1/task/t-slow"))
        .respond_with(ok(json!({ "response": { "id": "t-slow", "progress": "In progress" } })))
        .mount(&server)
        .await;

    let mut settings = settings(State::Merged);
    settings.task_timeout = Duration::from_millis(50);
    let report = engine(&server, SDA_RELEASE, settings)
        .apply(&vlan_config())
        .await
        .unwrap();

    assert!(!report.changed);
    assert_eq!(report.response[0].failed[0].kind, "Timeout");
}

// ── Layer-3 virtual networks ────────────────────────────────────────

async fn vn_puts(server: &MockServer) -> Vec<Value> {
    mutations(server)
        .await
        .into_iter()
        .filter(|r| r.method.as_str() == "PUT")
        .map(|r| r.body_json::<Value>().unwrap())
        .collect()
}

#[tokio::test]
async fn anchored_vn_is_created_then_anchored_then_extended() {
    let server = MockServer::start().await;
    mount_fabric_site(&server, "Global/India", "site-india", "fab-india").await;
    mount_fabric_site(&server, "Global/USA", "site-usa", "fab-usa").await;
    Mock::given(method("GET"))
        .and(path("/dna/intent/api/v1/sda/layer3VirtualNetworks"))
        .respond_with(ok(json!({ "response": [] })))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/dna/intent/api/v1/sda/layer3VirtualNetworks"))
        .respond_with(ok(json!({ "response": [{
            "id": "vn-1", "virtualNetworkName": "vn_with_anchor", "fabricIds": ["fab-india"]
        }]})))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/dna/intent/api/v1/sda/layer3VirtualNetworks"))
        .and(body_partial_json(json!([{
            "virtualNetworkName": "vn_with_anchor", "fabricIds": ["fab-india"]
        }])))
        .respond_with(task("t-1"))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("PUT"))
        .and(path("/dna/intent/api/v1/sda/layer3VirtualNetworks"))
        .respond_with(task("t-1"))
        .expect(2)
        .mount(&server)
        .await;
    mount_task_done(&server, "t-1").await;

    let config = json!([{ "virtual_networks": [{
        "vn_name": "vn_with_anchor",
        "anchored_site_name": "Global/India",
        "fabric_site_locations": [
            { "site_name_hierarchy": "Global/India", "fabric_type": "fabric_site" },
            { "site_name_hierarchy": "Global/USA", "fabric_type": "fabric_site" },
        ],
    }]}]);
    let report = engine(&server, SDA_RELEASE, settings(State::Merged))
        .apply(&config)
        .await
        .unwrap();

    assert_eq!(report.response[0].created, vec!["vn_with_anchor"]);
    let puts = vn_puts(&server).await;
    assert_eq!(puts[0][0]["anchoredSiteId"], "fab-india");
    assert_eq!(puts[0][0]["fabricIds"], json!(["fab-india"]));
    assert_eq!(puts[1][0]["fabricIds"], json!(["fab-india", "fab-usa"]));
}

async fn mount_anchored_vn(server: &MockServer) {
    Mock::given(method("GET"))
        .and(path("/dna/intent/api/v1/sda/layer3VirtualNetworks"))
        .respond_with(ok(json!({ "response": [{
            "id": "vn-1", "virtualNetworkName": "VN1",
            "fabricIds": ["fab-a", "fab-b", "fab-c"], "anchoredSiteId": "fab-a"
        }]})))
        .mount(server)
        .await;
    Mock::given(method("GET"))
        .and(path("/dna/intent/api/v1/sda/anycastGateways"))
        .respond_with(ok(json!({ "response": [] })))
        .mount(server)
        .await;
    Mock::given(method("PUT"))
        .and(path("/dna/intent/api/v1/sda/layer3VirtualNetworks"))
        .respond_with(task("t-1"))
        .mount(server)
        .await;
    mount_task_done(server, "t-1").await;
}

#[tokio::test]
async fn deleting_an_anchored_vn_detaches_subscribers_first() {
    let server = MockServer::start().await;
    mount_anchored_vn(&server).await;
    Mock::given(method("DELETE"))
        .and(path("/dna/intent/api/v1/sda/layer3VirtualNetworks"))
        .and(query_param("virtualNetworkName", "VN1"))
        .respond_with(task("t-1"))
        .expect(1)
        .mount(&server)
        .await;

    let report = engine(&server, SDA_RELEASE, settings(State::Deleted))
        .apply(&json!([{ "virtual_networks": [{ "vn_name": "VN1" }] }]))
        .await
        .unwrap();

    assert_eq!(report.response[0].deleted, vec!["VN1"]);
    let sent = mutations(&server).await;
    assert_eq!(sent[0].method.as_str(), "PUT");
    assert_eq!(sent[1].method.as_str(), "DELETE");
    assert_eq!(vn_puts(&server).await[0][0]["fabricIds"], json!(["fab-a"]));
}

#[tokio::test]
async fn deleting_with_locations_only_shrinks_the_vn() {
    let server = MockServer::start().await;
    mount_anchored_vn(&server).await;
    mount_fabric_site(&server, "Global/B", "site-b", "fab-b").await;
    Mock::given(method("DELETE"))
        .respond_with(task("t-1"))
        .expect(0)
        .mount(&server)
        .await;

    let config = json!([{ "virtual_networks": [{
        "vn_name": "VN1",
        "fabric_site_locations": [{ "site_name_hierarchy": "Global/B" }],
    }]}]);
    let report = engine(&server, SDA_RELEASE, settings(State::Deleted))
        .apply(&config)
        .await
        .unwrap();

    assert_eq!(report.response[0].deleted, vec!["VN1"]);
    assert_eq!(vn_puts(&server).await[0][0]["fabricIds"], json!(["fab-a", "fab-c"]));
}

// ── Anycast gateways ────────────────────────────────────────────────

#[tokio::test]
async fn gateway_for_a_missing_vn_is_refused_before_any_mutation() {
    let server = MockServer::start().await;
    mount_fabric_site(&server, "Global/India", "site-india", "fab-india").await;
    Mock::given(method("GET"))
        .and(path("/dna/intent/api/v1/sda/layer3VirtualNetworks"))
        .respond_with(ok(json!({ "response": [] })))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .respond_with(task("t-1"))
        .expect(0)
        .mount(&server)
        .await;

    let config = json!([{ "anycast_gateways": [{
        "vn_name": "VN_MISSING",
        "ip_pool_name": "pool-100",
        "vlan_name": "VLAN100",
        "vlan_id": 100,
        "traffic_type": "DATA",
        "fabric_site_location": { "site_name_hierarchy": "Global/India" },
    }]}]);
    let report = engine(&server, SDA_RELEASE, settings(State::Merged))
        .apply(&config)
        .await
        .unwrap();

    assert!(!report.changed);
    let failure = &report.response[0].failed[0];
    assert_eq!(failure.kind, "Conflict");
    assert!(failure.reason.contains("VN_MISSING"));
}

// ── Sites ───────────────────────────────────────────────────────────

#[tokio::test]
async fn bulk_site_create_uploads_the_floor_image() {
    let server = MockServer::start().await;
    for hierarchy in ["Global/USA", "Global/USA/HQ"] {
        Mock::given(method("GET"))
            .and(path("/dna/intent/api/v1/sites"))
            .and(query_param("nameHierarchy", hierarchy))
            .respond_with(ok(json!({ "response": [] })))
            .mount(&server)
            .await;
    }
    Mock::given(method("GET"))
        .and(path("/dna/intent/api/v1/sites"))
        .and(query_param("nameHierarchy", "Global/USA/HQ/F1"))
        .respond_with(ok(json!({ "response": [] })))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    mount_site(&server, "Global/USA/HQ/F1", "floor-1", "floor").await;
    Mock::given(method("POST"))
        .and(path("/dna/intent/api/v1/sites/bulk"))
        .respond_with(task("t-sites"))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/dna/intent/api/v2/floors/floor-1/uploadImage"))
        .respond_with(task("t-image"))
        .expect(1)
        .mount(&server)
        .await;
    mount_task_done(&server, "t-sites").await;
    mount_task_done(&server, "t-image").await;

    let mut image = tempfile::Builder::new().suffix(".png").tempfile().unwrap();
    image.write_all(b"\x89PNG\r\n\x1a\n").unwrap();

    // Children first in the input; the bulk body must still list parents first.
    let config = json!([
        { "type": "floor", "site": { "floor": {
            "name": "F1", "parent_name": "Global/USA/HQ",
            "rf_model": "Cubes And Walled Offices", "width": 100, "length": 100, "height": 10,
            "floor_number": 1, "units_of_measure": "feet",
            "upload_floor_image_path": image.path(), "force_upload_floor_image": true,
        }}},
        { "type": "building", "site": { "building": {
            "name": "HQ", "parent_name": "Global/USA", "latitude": 37.33, "longitude": -121.89,
            "address": "1 Main St", "country": "United States",
        }}},
        { "type": "area", "site": { "area": { "name": "USA", "parent_name": "Global" } } },
    ]);
    let report = engine(&server, SDA_RELEASE, settings(State::Merged))
        .apply(&config)
        .await
        .unwrap();

    let sites = &report.response[0];
    assert_eq!(sites.kind, ResourceKind::Site);
    assert_eq!(
        sites.created,
        vec!["Global/USA", "Global/USA/HQ", "Global/USA/HQ/F1"]
    );

    let bulk: Value = mutations(&server).await[0].body_json().unwrap();
    let names: Vec<&str> = bulk
        .as_array()
        .unwrap()
        .iter()
        .map(|s| s["name"].as_str().unwrap())
        .collect();
    assert_eq!(names, vec!["USA", "HQ", "F1"]);
}

#[tokio::test]
async fn site_delete_removes_children_before_parents() {
    let server = MockServer::start().await;
    mount_site(&server, "Global/USA", "area-1", "area").await;
    Mock::given(method("GET"))
        .and(path("/dna/intent/api/v1/sites"))
        .and(query_param("nameHierarchy", "Global/USA/.*"))
        .respond_with(ok(json!({ "response": [
            { "id": "bld-1", "name": "HQ", "nameHierarchy": "Global/USA/HQ", "type": "building" },
            { "id": "flr-1", "name": "F1", "nameHierarchy": "Global/USA/HQ/F1", "type": "floor" },
        ]})))
        .mount(&server)
        .await;
    Mock::given(method("DELETE"))
        .respond_with(task("t-del"))
        .expect(3)
        .mount(&server)
        .await;
    mount_task_done(&server, "t-del").await;

    let config = json!([{ "type": "area", "site": { "area": { "name": "USA", "parent_name": "Global" } } }]);
    let report = engine(&server, SDA_RELEASE, settings(State::Deleted))
        .apply(&config)
        .await
        .unwrap();

    assert_eq!(report.response[0].deleted, vec!["Global/USA"]);
    let order: Vec<String> = mutations(&server)
        .await
        .iter()
        .map(|r| r.url.path().to_owned())
        .collect();
    assert_eq!(
        order,
        vec![
            "/dna/intent/api/v2/floors/flr-1",
            "/dna/intent/api/v2/buildings/bld-1",
            "/dna/intent/api/v1/areas/area-1",
        ]
    );
}

fn building(id: &str, hierarchy: &str, address: &str) -> Value {
    let name = hierarchy.rsplit('/').next().unwrap_or(hierarchy);
    json!({
        "id": id, "name": name, "nameHierarchy": hierarchy, "type": "building",
        "parentId": "area-a", "address": address
    })
}

async fn mount_site_record(server: &MockServer, hierarchy: &str, record: Value) {
    Mock::given(method("GET"))
        .and(path("/dna/intent/api/v1/sites"))
        .and(query_param("nameHierarchy", hierarchy))
        .respond_with(ok(json!({ "response": [record] })))
        .mount(server)
        .await;
}

fn building_config(names: &[&str], address: &str) -> Value {
    let sites: Vec<Value> = names
        .iter()
        .map(|name| json!({ "type": "building", "site": { "building": {
            "name": name, "parent_name": "Global/A", "address": address,
        }}}))
        .collect();
    Value::Array(sites)
}

fn site_report(report: &Report) -> &KindReport {
    report
        .response
        .iter()
        .find(|r| r.kind == ResourceKind::Site)
        .unwrap()
}

#[tokio::test]
async fn equal_sites_are_left_alone() {
    let server = MockServer::start().await;
    mount_site_record(&server, "Global/A/B1", building("b1", "Global/A/B1", "1 Main St")).await;

    let report = engine(&server, SDA_RELEASE, settings(State::Merged))
        .apply(&building_config(&["B1"], "1 Main St"))
        .await
        .unwrap();

    assert!(!report.changed);
    assert_eq!(site_report(&report).no_update, vec!["Global/A/B1"]);
    assert!(mutations(&server).await.is_empty());
}

#[tokio::test]
async fn site_updates_fail_one_node_at_a_time() {
    let server = MockServer::start().await;
    mount_site_record(&server, "Global/A/B1", building("b1", "Global/A/B1", "old")).await;
    mount_site_record(&server, "Global/A/B2", building("b2", "Global/A/B2", "old")).await;
    Mock::given(method("PUT"))
        .and(path("/dna/intent/api/v2/buildings/b1"))
        .and(body_partial_json(json!({ "name": "B1", "parentId": "area-a", "address": "new" })))
        .respond_with(task("t-1"))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("PUT"))
        .and(path("/dna/intent/api/v2/buildings/b2"))
        .respond_with(
            ResponseTemplate::new(400)
                .set_body_json(json!({ "response": { "message": "address is not valid" } })),
        )
        .expect(1)
        .mount(&server)
        .await;
    mount_task_done(&server, "t-1").await;

    let report = engine(&server, SDA_RELEASE, settings(State::Merged))
        .apply(&building_config(&["B1", "B2"], "new"))
        .await
        .unwrap();

    let sites = site_report(&report);
    assert!(report.changed);
    assert_eq!(sites.updated, vec!["Global/A/B1"]);
    assert_eq!(sites.failed.len(), 1);
    assert_eq!(sites.failed[0].item, "Global/A/B2");
    assert_eq!(sites.failed[0].kind, "Conflict");
}

#[tokio::test]
async fn legacy_controllers_create_sites_one_node_at_a_time() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/dna/intent/api/v1/site"))
        .and(query_param("name", "Global/USA"))
        .respond_with(ok(json!({ "response": [] })))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/dna/intent/api/v1/site"))
        .and(body_partial_json(json!({
            "type": "area", "site": { "area": { "name": "USA", "parentName": "Global" } }
        })))
        .respond_with(ok(json!({
            "executionId": "e-1",
            "executionStatusUrl": "/dna/intent/api/v1/dnacaap/management/execution-status/e-1"
        })))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/dna/intent/api/v1/dnacaap/management/execution-status/e-1"))
        .respond_with(ok(json!({ "status": "SUCCESS" })))
        .expect(1..)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/dna/intent/api/v1/sites/bulk"))
        .respond_with(task("t-1"))
        .expect(0)
        .mount(&server)
        .await;

    let config = json!([{ "type": "area", "site": { "area": { "name": "USA", "parent_name": "Global" } } }]);
    let report = engine(&server, "2.3.5.3", settings(State::Merged))
        .apply(&config)
        .await
        .unwrap();

    assert!(report.changed);
    assert_eq!(site_report(&report).created, vec!["Global/USA"]);
}

fn floor_config(image: &std::path::Path) -> Value {
    json!({ "type": "floor", "site": { "floor": {
        "name": "F1", "parent_name": "Global/A/B1",
        "upload_floor_image_path": image, "force_upload_floor_image": true,
    }}})
}

async fn mount_existing_floor(server: &MockServer) {
    mount_site_record(
        server,
        "Global/A/B1/F1",
        json!({
            "id": "floor-1", "name": "F1", "nameHierarchy": "Global/A/B1/F1",
            "type": "floor", "parentId": "b1"
        }),
    )
    .await;
}

#[tokio::test]
async fn forced_image_on_an_existing_floor_skips_the_field_update() {
    let server = MockServer::start().await;
    mount_existing_floor(&server).await;
    Mock::given(method("POST"))
        .and(path("/dna/intent/api/v2/floors/floor-1/uploadImage"))
        .respond_with(task("t-image"))
        .expect(1)
        .mount(&server)
        .await;
    mount_task_done(&server, "t-image").await;

    let mut image = tempfile::Builder::new().suffix(".png").tempfile().unwrap();
    image.write_all(b"\x89PNG\r\n\x1a\n").unwrap();

    let report = engine(&server, SDA_RELEASE, settings(State::Merged))
        .apply(&json!([floor_config(image.path())]))
        .await
        .unwrap();

    assert_eq!(site_report(&report).updated, vec!["Global/A/B1/F1"]);
    let sent = mutations(&server).await;
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].url.path(), "/dna/intent/api/v2/floors/floor-1/uploadImage");
}

#[tokio::test]
async fn unreadable_floor_image_fails_only_that_floor() {
    let server = MockServer::start().await;
    mount_existing_floor(&server).await;
    Mock::given(method("GET"))
        .and(path("/dna/intent/api/v1/event/webhook"))
        .respond_with(ok(json!({ "statusMessage": [] })))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/dna/intent/api/v1/event/webhook"))
        .respond_with(ok(json!({ "apiStatus": "SUCCESS", "statusMessage": "created" })))
        .expect(1)
        .mount(&server)
        .await;

    let config = json!([
        floor_config(std::path::Path::new("/nonexistent/f1.png")),
        { "webhook_destination": [{ "name": "hook", "url": "https://hooks.example.com/catc" }] },
    ]);
    let report = engine(&server, SDA_RELEASE, settings(State::Merged))
        .apply(&config)
        .await
        .unwrap();

    let sites = site_report(&report);
    assert!(sites.updated.is_empty());
    assert_eq!(sites.failed[0].item, "Global/A/B1/F1");
    assert_eq!(sites.failed[0].kind, "Conflict");
    assert!(sites.failed[0].reason.contains("/nonexistent/f1.png"));

    let hooks = report
        .response
        .iter()
        .find(|r| r.kind == ResourceKind::WebhookDestination)
        .unwrap();
    assert_eq!(hooks.created, vec!["hook"]);
}

// ── Event notifications ─────────────────────────────────────────────

#[tokio::test]
async fn notification_with_missing_destination_is_a_conflict() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/dna/intent/api/v1/event/subscription-details/rest"))
        .respond_with(ok(json!([])))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .respond_with(task("t-1"))
        .expect(0)
        .mount(&server)
        .await;

    let config = json!([{ "webhook_event_notification": [{
        "name": "ap-flaps",
        "events": ["AP Flap"],
        "destination": "missing-hook",
    }]}]);
    let report = engine(&server, SDA_RELEASE, settings(State::Merged))
        .apply(&config)
        .await
        .unwrap();

    assert!(!report.changed);
    let failure = &report.response[0].failed[0];
    assert_eq!(failure.item, "ap-flaps");
    assert_eq!(failure.kind, "Conflict");
    assert!(failure.reason.contains("missing-hook"));
}

// ── Destinations and ITSM ───────────────────────────────────────────

fn hook_config() -> Value {
    json!([{ "webhook_destination": [{ "name": "hook", "url": "https://hooks.example.com/catc" }] }])
}

fn hook_record(url: &str) -> Value {
    json!({ "webhookId": "wh-1", "name": "hook", "url": url, "method": "POST" })
}

#[tokio::test]
async fn event_destinations_cannot_be_deleted() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/dna/intent/api/v1/event/webhook"))
        .respond_with(ok(json!({ "statusMessage": [hook_record("https://hooks.example.com/catc")] })))
        .mount(&server)
        .await;

    let report = engine(&server, SDA_RELEASE, settings(State::Deleted))
        .apply(&hook_config())
        .await
        .unwrap();

    assert!(!report.changed);
    let failure = &report.response[0].failed[0];
    assert_eq!(failure.item, "hook");
    assert_eq!(failure.kind, "Conflict");
    assert!(failure.reason.contains("cannot be deleted"));
    assert!(mutations(&server).await.is_empty());
}

fn itsm_listing(instances: Value) -> Mock {
    Mock::given(method("GET"))
        .and(path("/dna/intent/api/v1/integration-settings/itsm/instances"))
        .respond_with(ok(json!({ "page": 1, "totalPages": 1, "data": instances })))
}

#[tokio::test]
async fn itsm_instance_is_deleted_and_verified_absent() {
    let server = MockServer::start().await;
    itsm_listing(json!([{ "id": "i-1", "name": "snow" }]))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    itsm_listing(json!([])).mount(&server).await;
    Mock::given(method("GET"))
        .and(path("/dna/intent/api/v1/integration-settings/instances/itsm/i-1"))
        .respond_with(ok(json!({
            "id": "i-1", "name": "snow", "dypName": "ServiceNowConnection",
            "data": { "ConnectionSettings": {
                "Url": "https://snow.example.com", "Auth_UserName": "admin"
            }}
        })))
        .mount(&server)
        .await;
    Mock::given(method("DELETE"))
        .and(path("/dna/intent/api/v1/integration-settings/instances/itsm/i-1"))
        .respond_with(ok(json!({})))
        .expect(1)
        .mount(&server)
        .await;

    let mut settings = settings(State::Deleted);
    settings.config_verify = true;
    let report = engine(&server, SDA_RELEASE, settings)
        .apply(&json!([{ "itsm_setting": [{ "instance_name": "snow" }] }]))
        .await
        .unwrap();

    assert!(report.changed);
    assert_eq!(report.response[0].kind, ResourceKind::ItsmSetting);
    assert_eq!(report.response[0].deleted, vec!["snow"]);
    assert_eq!(report.verified, Some(true));
}

// ── Verification ────────────────────────────────────────────────────

#[tokio::test]
async fn created_destination_verifies() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/dna/intent/api/v1/event/webhook"))
        .respond_with(ok(json!({ "statusMessage": [] })))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/dna/intent/api/v1/event/webhook"))
        .respond_with(ok(json!({ "statusMessage": [hook_record("https://hooks.example.com/catc")] })))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/dna/intent/api/v1/event/webhook"))
        .respond_with(ok(json!({ "apiStatus": "SUCCESS" })))
        .expect(1)
        .mount(&server)
        .await;

    let mut settings = settings(State::Merged);
    settings.config_verify = true;
    let report = engine(&server, SDA_RELEASE, settings)
        .apply(&hook_config())
        .await
        .unwrap();

    assert_eq!(report.response[0].created, vec!["hook"]);
    assert_eq!(report.verified, Some(true));
}

#[tokio::test]
async fn drift_left_after_update_fails_verification() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/dna/intent/api/v1/event/webhook"))
        .respond_with(ok(json!({ "statusMessage": [hook_record("https://old.example.com/catc")] })))
        .mount(&server)
        .await;
    Mock::given(method("PUT"))
        .and(path("/dna/intent/api/v1/event/webhook"))
        .and(body_partial_json(json!({ "webhookId": "wh-1", "url": "https://hooks.example.com/catc" })))
        .respond_with(ok(json!({ "apiStatus": "SUCCESS" })))
        .expect(1)
        .mount(&server)
        .await;

    let mut settings = settings(State::Merged);
    settings.config_verify = true;
    let report = engine(&server, SDA_RELEASE, settings)
        .apply(&hook_config())
        .await
        .unwrap();

    assert_eq!(report.response[0].updated, vec!["hook"]);
    assert_eq!(report.verified, Some(false));
}

#[tokio::test]
async fn verification_is_skipped_unless_asked() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/dna/intent/api/v1/event/webhook"))
        .respond_with(ok(json!({ "statusMessage": [hook_record("https://hooks.example.com/catc")] })))
        .expect(1)
        .mount(&server)
        .await;

    let report = engine(&server, SDA_RELEASE, settings(State::Merged))
        .apply(&hook_config())
        .await
        .unwrap();

    assert_eq!(report.response[0].no_update, vec!["hook"]);
    assert_eq!(report.verified, None);
}

#[tokio::test]
async fn shrunk_vn_verifies_without_the_removed_fabric() {
    let server = MockServer::start().await;
    mount_fabric_site(&server, "Global/B", "site-b", "fab-b").await;
    Mock::given(method("GET"))
        .and(path("/dna/intent/api/v1/sda/layer3VirtualNetworks"))
        .respond_with(ok(json!({ "response": [{
            "id": "vn-1", "virtualNetworkName": "VN1",
            "fabricIds": ["fab-a", "fab-b", "fab-c"], "anchoredSiteId": "fab-a"
        }]})))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/dna/intent/api/v1/sda/layer3VirtualNetworks"))
        .respond_with(ok(json!({ "response": [{
            "id": "vn-1", "virtualNetworkName": "VN1",
            "fabricIds": ["fab-a", "fab-c"], "anchoredSiteId": "fab-a"
        }]})))
        .mount(&server)
        .await;
    Mock::given(method("PUT"))
        .and(path("/dna/intent/api/v1/sda/layer3VirtualNetworks"))
        .respond_with(task("t-1"))
        .expect(1)
        .mount(&server)
        .await;
    mount_task_done(&server, "t-1").await;

    let config = json!([{ "virtual_networks": [{
        "vn_name": "VN1",
        "fabric_site_locations": [{ "site_name_hierarchy": "Global/B" }],
    }]}]);
    let mut settings = settings(State::Deleted);
    settings.config_verify = true;
    let report = engine(&server, SDA_RELEASE, settings)
        .apply(&config)
        .await
        .unwrap();

    assert_eq!(report.response[0].deleted, vec!["VN1"]);
    assert_eq!(report.verified, Some(true));
}

// ── Input and version errors ────────────────────────────────────────

#[tokio::test]
async fn invalid_input_makes_no_remote_call() {
    let server = MockServer::start().await;

    let config = json!([{ "fabric_vlan": [{
        "vlan_name": "bad",
        "vlan_id": 1002,
        "fabric_site_locations": [{ "site_name_hierarchy": "Global/India" }],
    }]}]);
    let err = engine(&server, SDA_RELEASE, settings(State::Merged))
        .apply(&config)
        .await
        .unwrap_err();

    assert!(matches!(err, CoreError::Input { .. }));
    assert!(server.received_requests().await.unwrap_or_default().is_empty());
}

#[tokio::test]
async fn sda_on_an_old_controller_fails_fast() {
    let server = MockServer::start().await;

    let err = engine(&server, "2.3.5.3", settings(State::Merged))
        .apply(&vlan_config())
        .await
        .unwrap_err();

    assert!(matches!(err, CoreError::VersionUnsupported { .. }));
    assert!(err.to_string().contains("2.3.7.6"));
    assert!(server.received_requests().await.unwrap_or_default().is_empty());
}
