use pretty_assertions::assert_eq;
use serde_json::json;

use super::*;
use crate::model::{FabricType, SiteSpec};

fn paths(err: CoreError) -> Vec<String> {
    match err {
        CoreError::Input { violations } => violations.into_iter().map(|v| v.path).collect(),
        other => panic!("expected an input error, got {other:?}"),
    }
}

fn rejects(config: Value, state: State, path: &str) {
    let found = paths(validate(&config, state).unwrap_err());
    assert!(
        found.iter().any(|p| p == path),
        "expected a violation at {path}, got {found:?}"
    );
}

fn vlan(extra: Value) -> Value {
    let mut item = json!({
        "vlan_name": "vlan_test1",
        "vlan_id": 1333,
        "fabric_site_locations": [{ "site_name_hierarchy": "Global/India" }],
    });
    for (k, v) in extra.as_object().unwrap() {
        item[k] = v.clone();
    }
    json!([{ "fabric_vlan": [item] }])
}

#[test]
fn fabric_vlan_is_coerced_to_typed_record() {
    let config = json!([{ "fabric_vlan": [{
        "vlan_name": "vlan_test1",
        "vlan_id": "1333",
        "traffic_type": "data",
        "fabric_enabled_wireless": "yes",
        "fabric_site_locations": [{ "site_name_hierarchy": "Global/India", "fabric_type": "FABRIC_ZONE" }],
    }]}]);
    let elements = validate(&config, State::Merged).unwrap();
    let ConfigElement::FabricVlans(vlans) = &elements[0] else {
        panic!("unexpected element {elements:?}");
    };
    assert_eq!(vlans[0].vlan_id, 1333);
    assert_eq!(vlans[0].traffic_type.as_deref(), Some("DATA"));
    assert_eq!(vlans[0].fabric_enabled_wireless, Some(true));
    assert_eq!(vlans[0].fabric_site_locations[0].fabric_type, FabricType::FabricZone);
}

#[test]
fn vlan_id_bounds_and_reserved_ids() {
    for id in [1, 4094] {
        rejects(vlan(json!({ "vlan_id": id })), State::Merged, "config[0].fabric_vlan[0].vlan_id");
    }
    for id in [1002, 1005, 2046] {
        rejects(vlan(json!({ "vlan_id": id })), State::Merged, "config[0].fabric_vlan[0].vlan_id");
    }
    assert!(validate(&vlan(json!({ "vlan_id": 2 })), State::Merged).is_ok());
    assert!(validate(&vlan(json!({ "vlan_id": 4093 })), State::Merged).is_ok());
}

#[test]
fn vlan_name_length_and_charset() {
    let long = "v".repeat(33);
    rejects(vlan(json!({ "vlan_name": long })), State::Merged, "config[0].fabric_vlan[0].vlan_name");
    rejects(vlan(json!({ "vlan_name": "bad name" })), State::Merged, "config[0].fabric_vlan[0].vlan_name");
    assert!(validate(&vlan(json!({ "vlan_name": "ok-name_1" })), State::Merged).is_ok());
}

#[test]
fn custom_flooding_needs_admin_scoped_multicast() {
    let path = "config[0].fabric_vlan[0].flooding_address";
    rejects(
        vlan(json!({ "flooding_address_assignment": "custom" })),
        State::Merged,
        path,
    );
    rejects(
        vlan(json!({ "flooding_address_assignment": "CUSTOM", "flooding_address": "224.0.0.1" })),
        State::Merged,
        path,
    );
    rejects(
        vlan(json!({ "flooding_address_assignment": "SHARED", "flooding_address": "239.1.1.1" })),
        State::Merged,
        path,
    );
    rejects(
        vlan(json!({ "flooding_address_assignment": "MIXED" })),
        State::Merged,
        "config[0].fabric_vlan[0].flooding_address_assignment",
    );
    assert!(validate(
        &vlan(json!({ "flooding_address_assignment": "CUSTOM", "flooding_address": "239.1.1.1" })),
        State::Merged
    )
    .is_ok());
}

#[test]
fn locations_are_required_only_for_merged() {
    let config = json!([{ "fabric_vlan": [{ "vlan_name": "v", "vlan_id": 10 }] }]);
    rejects(config.clone(), State::Merged, "config[0].fabric_vlan[0].fabric_site_locations");
    assert!(validate(&config, State::Deleted).is_ok());
}

#[test]
fn vn_name_length_and_charset() {
    let config = |name: &str| json!([{ "virtual_networks": [{ "vn_name": name }] }]);
    rejects(config("a_very_long_vn_name"), State::Merged, "config[0].virtual_networks[0].vn_name");
    rejects(config("vn-dash"), State::Merged, "config[0].virtual_networks[0].vn_name");
    assert!(validate(&config("VN_1"), State::Merged).is_ok());
}

fn gateway(extra: Value) -> Value {
    let mut item = json!({
        "vn_name": "VN1",
        "ip_pool_name": "pool1",
        "vlan_name": "vlan1",
        "fabric_site_location": { "site_name_hierarchy": "Global/India" },
    });
    for (k, v) in extra.as_object().unwrap() {
        item[k] = v.clone();
    }
    json!([{ "anycast_gateways": [item] }])
}

#[test]
fn tcp_mss_adjustment_bounds() {
    let path = "config[0].anycast_gateways[0].tcp_mss_adjustment";
    rejects(gateway(json!({ "tcp_mss_adjustment": 499 })), State::Merged, path);
    rejects(gateway(json!({ "tcp_mss_adjustment": 1441 })), State::Merged, path);
    assert!(validate(&gateway(json!({ "tcp_mss_adjustment": 1440 })), State::Merged).is_ok());
}

#[test]
fn infra_vn_accepts_reduced_fields_and_defaults_pool_type() {
    let config = json!([{ "anycast_gateways": [{
        "vn_name": "INFRA_VN",
        "ip_pool_name": "infra",
        "fabric_site_location": { "site_name_hierarchy": "Global/India" },
    }]}]);
    let elements = validate(&config, State::Merged).unwrap();
    let ConfigElement::AnycastGateways(gateways) = &elements[0] else {
        panic!("unexpected element {elements:?}");
    };
    assert_eq!(gateways[0].pool_type.as_deref(), Some("EXTENDED_NODE"));

    let config = json!([{ "anycast_gateways": [{
        "vn_name": "INFRA_VN",
        "ip_pool_name": "infra",
        "security_group_name": "sgt",
        "fabric_site_location": { "site_name_hierarchy": "Global/India" },
    }]}]);
    rejects(config, State::Merged, "config[0].anycast_gateways[0].security_group_name");
}

#[test]
fn pool_type_is_infra_only() {
    rejects(
        gateway(json!({ "pool_type": "FABRIC_AP" })),
        State::Merged,
        "config[0].anycast_gateways[0].pool_type",
    );
}

#[test]
fn managed_vlan_suppresses_explicit_vlan() {
    let config = gateway(json!({ "auto_generate_vlan_name": true, "vlan_id": 300 }));
    let elements = validate(&config, State::Merged).unwrap();
    let ConfigElement::AnycastGateways(gateways) = &elements[0] else {
        panic!("unexpected element {elements:?}");
    };
    assert_eq!(gateways[0].vlan_name, None);
    assert_eq!(gateways[0].vlan_id, None);
}

#[test]
fn unmanaged_gateway_needs_vlan_name() {
    let config = json!([{ "anycast_gateways": [{
        "vn_name": "VN1",
        "ip_pool_name": "pool1",
        "fabric_site_location": { "site_name_hierarchy": "Global/India" },
    }]}]);
    rejects(config.clone(), State::Merged, "config[0].anycast_gateways[0].vlan_name");
    assert!(validate(&config, State::Deleted).is_ok());
}

fn building(extra: Value) -> Value {
    let mut building = json!({ "name": "B1", "parent_name": "Global/USA" });
    for (k, v) in extra.as_object().unwrap() {
        building[k] = v.clone();
    }
    json!([{ "site": { "building": building }, "type": "building" }])
}

#[test]
fn coordinates_are_bounded() {
    rejects(building(json!({ "latitude": 90.5 })), State::Merged, "config[0].site.building.latitude");
    rejects(building(json!({ "longitude": -180.1 })), State::Merged, "config[0].site.building.longitude");
    assert!(validate(&building(json!({ "latitude": -90, "longitude": 180 })), State::Merged).is_ok());
}

#[test]
fn floor_dimensions_are_bounded() {
    let floor = |dims: Value| {
        let mut floor = json!({ "name": "F1", "parent_name": "Global/USA/B1" });
        for (k, v) in dims.as_object().unwrap() {
            floor[k] = v.clone();
        }
        json!([{ "site": { "floor": floor }, "type": "floor" }])
    };
    rejects(floor(json!({ "width": 4.99 })), State::Merged, "config[0].site.floor.width");
    rejects(floor(json!({ "length": 100_000 })), State::Merged, "config[0].site.floor.length");
    rejects(floor(json!({ "height": 2.5 })), State::Merged, "config[0].site.floor.height");
    rejects(floor(json!({ "rf_model": "Basement" })), State::Merged, "config[0].site.floor.rf_model");

    let elements = validate(&floor(json!({ "width": "100.5", "height": 3 })), State::Merged).unwrap();
    let ConfigElement::Sites(sites) = &elements[0] else {
        panic!("unexpected element {elements:?}");
    };
    let SiteSpec::Floor(floor) = &sites[0] else {
        panic!("expected a floor");
    };
    assert_eq!(floor.width, Some(100.5));
    assert_eq!(floor.height, Some(3.0));
}

#[test]
fn site_block_must_match_type() {
    let config = json!([{ "site": { "area": { "name": "A", "parent_name": "Global" } }, "type": "building" }]);
    let found = paths(validate(&config, State::Merged).unwrap_err());
    assert_eq!(
        found,
        vec!["config[0].site.area".to_owned(), "config[0].site.building".to_owned()]
    );
}

#[test]
fn site_parent_must_be_under_global() {
    let config = json!([{ "site": { "area": { "name": "A", "parent_name": "USA" } }, "type": "area" }]);
    rejects(config, State::Merged, "config[0].site.area.parent_name");
}

#[test]
fn snmp_enumerations_and_version_requirements() {
    let snmp = |extra: Value| {
        let mut item = json!({
            "name": "snmp1",
            "server_address": "10.0.0.1",
            "port": 162,
            "snmp_version": "V3",
            "username": "admin",
            "mode": "AUTH_PRIVACY",
            "auth_type": "SHA",
            "auth_password": "secret123",
            "privacy_type": "AES128",
            "privacy_password": "secret456",
        });
        for (k, v) in extra.as_object().unwrap() {
            item[k] = v.clone();
        }
        json!([{ "snmp_destination": [item] }])
    };
    let base = "config[0].snmp_destination[0]";
    rejects(snmp(json!({ "mode": "AUTH_ONLY" })), State::Merged, &format!("{base}.mode"));
    rejects(snmp(json!({ "auth_type": "SHA256" })), State::Merged, &format!("{base}.auth_type"));
    rejects(snmp(json!({ "privacy_type": "AES256" })), State::Merged, &format!("{base}.privacy_type"));
    rejects(snmp(json!({ "privacy_password": null })), State::Merged, &format!("{base}.privacy_password"));
    rejects(snmp(json!({ "snmp_version": "V2C" })), State::Merged, &format!("{base}.community"));
    assert!(validate(&snmp(json!({})), State::Merged).is_ok());
}

#[test]
fn smtp_type_drives_port() {
    let email = |smtp_type: &str, port: Value| {
        json!([{ "email_destination": [{
            "sender_email": "noc@example.com",
            "recipient_email": "ops@example.com",
            "subject": "alerts",
            "primary_smtp_config": { "server_address": "smtp.example.com", "smtp_type": smtp_type, "port": port },
        }]}])
    };
    let port_of = |config: Value| {
        let elements = validate(&config, State::Merged).unwrap();
        let ConfigElement::EmailDestinations(emails) = &elements[0] else {
            panic!("unexpected element {elements:?}");
        };
        emails[0].primary_smtp_config.port
    };
    assert_eq!(port_of(email("default", json!(2525))), Some(25));
    assert_eq!(port_of(email("TLS", Value::Null)), Some(587));
    assert_eq!(port_of(email("SSL", Value::Null)), Some(465));
    assert_eq!(port_of(email("TLS", json!(2587))), Some(2587));
    rejects(
        email("STARTTLS", Value::Null),
        State::Merged,
        "config[0].email_destination[0].primary_smtp_config.smtp_type",
    );
}

#[test]
fn webhook_needs_https_and_known_method() {
    let webhook = |url: &str, method: &str| {
        json!([{ "webhook_destination": [{ "name": "hook", "url": url, "method": method }] }])
    };
    rejects(webhook("http://hooks.example.com/x", "POST"), State::Merged, "config[0].webhook_destination[0].url");
    rejects(webhook("not a url", "POST"), State::Merged, "config[0].webhook_destination[0].url");
    rejects(webhook("https://hooks.example.com/x", "GET"), State::Merged, "config[0].webhook_destination[0].method");
    assert!(validate(&webhook("https://hooks.example.com/x", "put"), State::Merged).is_ok());
}

#[test]
fn notification_filters_are_enumerated() {
    let notification = |extra: Value| {
        let mut item = json!({ "name": "n1", "events": ["AP Flap"], "destination": "hook" });
        for (k, v) in extra.as_object().unwrap() {
            item[k] = v.clone();
        }
        json!([{ "webhook_event_notification": [item] }])
    };
    let base = "config[0].webhook_event_notification[0]";
    rejects(notification(json!({ "event_severities": ["6"] })), State::Merged, &format!("{base}.event_severities[0]"));
    rejects(notification(json!({ "event_types": ["NETWORK", "BOGUS"] })), State::Merged, &format!("{base}.event_types[1]"));
    rejects(notification(json!({ "event_categories": ["NOTICE"] })), State::Merged, &format!("{base}.event_categories[0]"));
    let ok = notification(json!({ "event_severities": [1, "2"], "event_types": "network" }));
    let elements = validate(&ok, State::Merged).unwrap();
    let ConfigElement::WebhookNotifications(items) = &elements[0] else {
        panic!("unexpected element {elements:?}");
    };
    assert_eq!(items[0].event_severities, vec!["1", "2"]);
    assert_eq!(items[0].event_types, vec!["NETWORK"]);
}

#[test]
fn email_notification_checks_addresses() {
    let config = json!([{ "email_event_notification": [{
        "name": "n1",
        "events": ["AP Flap"],
        "sender_email": "noc@example.com",
        "recipient_emails": ["ops@example.com", "nobody"],
        "subject": "alert",
        "instance": "mail1",
    }]}]);
    rejects(config, State::Merged, "config[0].email_event_notification[0].recipient_emails[1]");
}

#[test]
fn element_must_name_exactly_one_kind() {
    rejects(
        json!([{ "fabric_vlan": [], "virtual_networks": [] }]),
        State::Merged,
        "config[0]",
    );
    rejects(json!([{ "bogus": [] }]), State::Merged, "config[0]");
    rejects(json!([]), State::Merged, "config");
}

#[test]
fn every_violation_is_reported_at_once() {
    let config = json!([
        { "fabric_vlan": [{ "vlan_name": "ok", "vlan_id": 1 }] },
        { "virtual_networks": [{ "vn_name": "way_too_long_for_a_vn" }] },
    ]);
    let found = paths(validate(&config, State::Merged).unwrap_err());
    assert_eq!(
        found,
        vec![
            "config[0].fabric_vlan[0].vlan_id".to_owned(),
            "config[0].fabric_vlan[0].fabric_site_locations".to_owned(),
            "config[1].virtual_networks[0].vn_name".to_owned(),
        ]
    );
}
