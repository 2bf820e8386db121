// ── Validator ──
//
// Checks the `config` list of an input document against a static schema
// per resource kind, coerces loosely-typed values, then applies the
// cross-field rules that a per-field schema cannot express. Every problem
// in the document is reported at once; nothing here talks to a controller.

mod rules;
mod schema;

use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::debug;

use crate::config::State;
use crate::error::{CoreError, Violation};
use crate::model::{
    AreaSpec, BuildingSpec, ConfigElement, FloorSpec, ResourceKind, SiteSpec,
};
use schema::{Charset, Checker, Field, TEXT, TEXT_LIST, Ty};

// ── Shared field types ───────────────────────────────────────────────

const VLAN_NAME: Ty = Ty::Str {
    min: 1,
    max: 32,
    charset: Some(Charset::WordDash),
};
const VN_NAME: Ty = Ty::Str {
    min: 1,
    max: 16,
    charset: Some(Charset::Word),
};
const VLAN_ID: Ty = Ty::Int { min: 2, max: 4093 };
const PORT: Ty = Ty::Int { min: 1, max: 65535 };
const TRAFFIC_TYPE: Ty = Ty::Enum(&["DATA", "VOICE"]);
const FLOODING_ASSIGNMENT: Ty = Ty::Enum(&["SHARED", "CUSTOM"]);
const MULTICAST_ADDRESS: Ty = Ty::Str {
    min: 7,
    max: 15,
    charset: None,
};

static FABRIC_LOCATION: &[Field] = &[
    Field::required("site_name_hierarchy", TEXT),
    Field::optional("fabric_type", Ty::Enum(&["fabric_site", "fabric_zone"])),
];
const FABRIC_LOCATIONS: Ty = Ty::List(&Ty::Map(FABRIC_LOCATION));

// ── SDA ──────────────────────────────────────────────────────────────

static FABRIC_VLAN: &[Field] = &[
    Field::required("vlan_name", VLAN_NAME),
    Field::required("vlan_id", VLAN_ID),
    Field::optional("traffic_type", TRAFFIC_TYPE),
    Field::merged("fabric_site_locations", FABRIC_LOCATIONS),
    Field::optional("fabric_enabled_wireless", Ty::Bool),
    Field::optional("associated_layer3_virtual_network", VN_NAME),
    Field::optional("wireless_flooding_enable", Ty::Bool),
    Field::optional("resource_guard_enable", Ty::Bool),
    Field::optional("flooding_address_assignment", FLOODING_ASSIGNMENT),
    Field::optional("flooding_address", MULTICAST_ADDRESS),
];

static VIRTUAL_NETWORK: &[Field] = &[
    Field::required("vn_name", VN_NAME),
    Field::optional("fabric_site_locations", FABRIC_LOCATIONS),
    Field::optional("anchored_site_name", TEXT),
];

static ANYCAST_GATEWAY: &[Field] = &[
    Field::required("vn_name", VN_NAME),
    Field::required("ip_pool_name", TEXT),
    Field::required("fabric_site_location", Ty::Map(FABRIC_LOCATION)),
    Field::optional("tcp_mss_adjustment", Ty::Int { min: 500, max: 1440 }),
    Field::optional("vlan_name", VLAN_NAME),
    Field::optional("vlan_id", VLAN_ID),
    Field::optional("traffic_type", TRAFFIC_TYPE),
    Field::optional("pool_type", Ty::Enum(&["EXTENDED_NODE", "FABRIC_AP"])),
    Field::optional("security_group_name", TEXT),
    Field::optional("is_critical_pool", Ty::Bool),
    Field::optional("layer2_flooding_enabled", Ty::Bool),
    Field::optional("fabric_enabled_wireless", Ty::Bool),
    Field::optional("ip_directed_broadcast", Ty::Bool),
    Field::optional("intra_subnet_routing_enabled", Ty::Bool),
    Field::optional("multiple_ip_to_mac_addresses", Ty::Bool),
    Field::optional("supplicant_based_extended_node_onboarding", Ty::Bool),
    Field::optional("group_policy_enforcement_enabled", Ty::Bool),
    Field::optional("auto_generate_vlan_name", Ty::Bool),
    Field::optional("wireless_flooding_enable", Ty::Bool),
    Field::optional("resource_guard_enable", Ty::Bool),
    Field::optional("flooding_address_assignment", FLOODING_ASSIGNMENT),
    Field::optional("flooding_address", MULTICAST_ADDRESS),
];

// ── Sites ────────────────────────────────────────────────────────────

static AREA: &[Field] = &[
    Field::required("name", TEXT),
    Field::required("parent_name", TEXT),
];

static BUILDING: &[Field] = &[
    Field::required("name", TEXT),
    Field::required("parent_name", TEXT),
    Field::optional("address", TEXT),
    Field::optional("latitude", Ty::Float { min: -90.0, max: 90.0 }),
    Field::optional("longitude", Ty::Float { min: -180.0, max: 180.0 }),
    Field::optional("country", TEXT),
];

static FLOOR: &[Field] = &[
    Field::required("name", TEXT),
    Field::required("parent_name", TEXT),
    Field::optional(
        "rf_model",
        Ty::Enum(&[
            "Cubes And Walled Offices",
            "Drywall Office Only",
            "Indoor High Ceiling",
            "Outdoor Open Space",
        ]),
    ),
    Field::optional("width", Ty::Float { min: 5.0, max: 99999.0 }),
    Field::optional("length", Ty::Float { min: 5.0, max: 99999.0 }),
    Field::optional("height", Ty::Float { min: 3.0, max: 99999.0 }),
    Field::optional("floor_number", Ty::Int { min: -200, max: 200 }),
    Field::optional("units_of_measure", Ty::Enum(&["feet", "meters"])),
    Field::optional("upload_floor_image_path", TEXT),
    Field::optional("force_upload_floor_image", Ty::Bool),
];

static SITE_BODY: &[Field] = &[
    Field::optional("area", Ty::Map(AREA)),
    Field::optional("building", Ty::Map(BUILDING)),
    Field::optional("floor", Ty::Map(FLOOR)),
];

static SITE_ELEMENT: &[Field] = &[
    Field::required("site", Ty::Map(SITE_BODY)),
    Field::required("type", Ty::Enum(&["area", "building", "floor"])),
];

// ── Event destinations ───────────────────────────────────────────────

static WEBHOOK_HEADER: &[Field] = &[
    Field::required("name", TEXT),
    Field::optional("value", TEXT),
    Field::optional("default_value", TEXT),
    Field::optional("encrypt", Ty::Bool),
];

static WEBHOOK_DESTINATION: &[Field] = &[
    Field::required("name", TEXT),
    Field::optional("description", TEXT),
    Field::required("url", TEXT),
    Field::optional("method", Ty::Enum(&["POST", "PUT"])),
    Field::optional("trust_cert", Ty::Bool),
    Field::optional("headers", Ty::List(&Ty::Map(WEBHOOK_HEADER))),
    Field::optional("is_proxy_route", Ty::Bool),
];

static SMTP: &[Field] = &[
    Field::required("server_address", TEXT),
    Field::optional("smtp_type", Ty::Enum(&["DEFAULT", "TLS", "SSL"])),
    Field::optional("port", PORT),
    Field::optional("username", TEXT),
    Field::optional("password", TEXT),
];

static EMAIL_DESTINATION: &[Field] = &[
    Field::required("sender_email", TEXT),
    Field::required("recipient_email", TEXT),
    Field::required("subject", TEXT),
    Field::required("primary_smtp_config", Ty::Map(SMTP)),
    Field::optional("secondary_smtp_config", Ty::Map(SMTP)),
];

static SYSLOG_DESTINATION: &[Field] = &[
    Field::required("name", TEXT),
    Field::optional("description", TEXT),
    Field::merged("server_address", TEXT),
    Field::merged("protocol", Ty::Enum(&["TCP", "UDP"])),
    Field::merged("port", PORT),
];

static SNMP_DESTINATION: &[Field] = &[
    Field::required("name", TEXT),
    Field::optional("description", TEXT),
    Field::merged("server_address", TEXT),
    Field::merged("port", PORT),
    Field::merged("snmp_version", Ty::Enum(&["V2C", "V3"])),
    Field::optional("community", TEXT),
    Field::optional("username", TEXT),
    Field::optional(
        "mode",
        Ty::Enum(&["AUTH_PRIVACY", "AUTH_NO_PRIVACY", "NO_AUTH_NO_PRIVACY"]),
    ),
    Field::optional("auth_type", Ty::Enum(&["SHA", "MD5"])),
    Field::optional("auth_password", TEXT),
    Field::optional("privacy_type", Ty::Enum(&["AES128", "DES"])),
    Field::optional("privacy_password", TEXT),
];

static ITSM_CONNECTION: &[Field] = &[
    Field::required("url", TEXT),
    Field::required("username", TEXT),
    Field::required("password", TEXT),
];

static ITSM_SETTING: &[Field] = &[
    Field::required("instance_name", TEXT),
    Field::optional("description", TEXT),
    Field::merged("connection_settings", Ty::Map(ITSM_CONNECTION)),
];

// ── Event notifications ──────────────────────────────────────────────

pub(crate) const EVENT_TYPES: &[&str] = &[
    "SECURITY",
    "APP",
    "NETWORK",
    "SYSTEM",
    "AUDIT_LOG",
    "INTEGRATIONS",
];

pub(crate) const EVENT_CATEGORIES: &[&str] = &[
    "WARN",
    "INFO",
    "ERROR",
    "ALERT",
    "TASK_PROGRESS",
    "TASK_FAILURE",
    "TASK_COMPLETE",
    "COMMAND",
    "QUERY",
    "CONVERSATION",
];

const SEVERITIES: &[&str] = &["1", "2", "3", "4", "5"];

static WEBHOOK_NOTIFICATION: &[Field] = &[
    Field::required("name", TEXT),
    Field::optional("description", TEXT),
    Field::optional("sites", TEXT_LIST),
    Field::merged("events", TEXT_LIST),
    Field::merged("destination", TEXT),
    Field::optional("domain", TEXT),
    Field::optional("subdomains", TEXT_LIST),
    Field::optional("event_types", Ty::List(&Ty::Enum(EVENT_TYPES))),
    Field::optional("event_categories", Ty::List(&Ty::Enum(EVENT_CATEGORIES))),
    Field::optional("event_severities", Ty::List(&Ty::Enum(SEVERITIES))),
    Field::optional("event_sources", TEXT_LIST),
];

static EMAIL_NOTIFICATION: &[Field] = &[
    Field::required("name", TEXT),
    Field::optional("description", TEXT),
    Field::optional("sites", TEXT_LIST),
    Field::merged("events", TEXT_LIST),
    Field::optional("domain", TEXT),
    Field::optional("subdomains", TEXT_LIST),
    Field::optional("event_types", Ty::List(&Ty::Enum(EVENT_TYPES))),
    Field::optional("event_categories", Ty::List(&Ty::Enum(EVENT_CATEGORIES))),
    Field::optional("event_severities", Ty::List(&Ty::Enum(SEVERITIES))),
    Field::optional("event_sources", TEXT_LIST),
    Field::merged("sender_email", TEXT),
    Field::merged("recipient_emails", TEXT_LIST),
    Field::merged("subject", TEXT),
    Field::merged("instance", TEXT),
    Field::optional("instance_description", TEXT),
];

/// Item schema for every list-valued kind.
fn item_fields(kind: ResourceKind) -> &'static [Field] {
    match kind {
        ResourceKind::FabricVlan => FABRIC_VLAN,
        ResourceKind::VirtualNetwork => VIRTUAL_NETWORK,
        ResourceKind::AnycastGateway => ANYCAST_GATEWAY,
        ResourceKind::Site => SITE_BODY,
        ResourceKind::WebhookDestination => WEBHOOK_DESTINATION,
        ResourceKind::EmailDestination => EMAIL_DESTINATION,
        ResourceKind::SyslogDestination => SYSLOG_DESTINATION,
        ResourceKind::SnmpDestination => SNMP_DESTINATION,
        ResourceKind::ItsmSetting => ITSM_SETTING,
        ResourceKind::WebhookEventNotification | ResourceKind::SyslogEventNotification => {
            WEBHOOK_NOTIFICATION
        }
        ResourceKind::EmailEventNotification => EMAIL_NOTIFICATION,
    }
}

// ── Entry point ──────────────────────────────────────────────────────

/// Validate and coerce the `config` list of an input document.
///
/// Returns one [`ConfigElement`] per list entry, in input order, or a
/// [`CoreError::Input`] listing every offending field.
pub fn validate(config: &Value, state: State) -> Result<Vec<ConfigElement>, CoreError> {
    let mut violations = Vec::new();

    let Some(entries) = config.as_array() else {
        return Err(CoreError::Input {
            violations: vec![Violation::new("config", "expected a list of resource specifications")],
        });
    };
    if entries.is_empty() {
        return Err(CoreError::Input {
            violations: vec![Violation::new("config", "must contain at least one element")],
        });
    }

    let mut elements = Vec::with_capacity(entries.len());
    for (index, entry) in entries.iter().enumerate() {
        let path = format!("config[{index}]");
        if let Some(element) = validate_element(entry, state, &path, &mut violations) {
            elements.push(element);
        }
    }

    if violations.is_empty() {
        debug!(elements = elements.len(), %state, "input validated");
        Ok(elements)
    } else {
        Err(CoreError::Input { violations })
    }
}

fn validate_element(
    entry: &Value,
    state: State,
    path: &str,
    violations: &mut Vec<Violation>,
) -> Option<ConfigElement> {
    let Some(map) = entry.as_object() else {
        violations.push(Violation::new(path, "expected a mapping"));
        return None;
    };

    let kinds: Vec<ResourceKind> = map
        .keys()
        .filter_map(|k| ResourceKind::from_config_key(k))
        .collect();
    let kind = match kinds.as_slice() {
        [kind] => *kind,
        [] => {
            violations.push(Violation::new(path, "names no known resource kind"));
            return None;
        }
        many => {
            let keys: Vec<_> = many.iter().map(|k| k.config_key()).collect();
            violations.push(Violation::new(
                path,
                format!("must name exactly one resource kind, found: {}", keys.join(", ")),
            ));
            return None;
        }
    };

    if kind == ResourceKind::Site {
        return validate_site(entry, state, path, violations);
    }

    for key in map.keys() {
        if key != kind.config_key() {
            violations.push(Violation::new(format!("{path}.{key}"), "unknown field"));
        }
    }

    let key = kind.config_key();
    let item_path = format!("{path}.{key}");
    let raw = map.get(key).unwrap_or(&Value::Null);
    let items: Vec<&Value> = match raw {
        Value::Array(items) => items.iter().collect(),
        Value::Object(_) => vec![raw],
        _ => {
            violations.push(Violation::new(&item_path, "expected a list of mappings"));
            return None;
        }
    };

    let before = violations.len();
    let fields = item_fields(kind);
    let mut coerced = Vec::with_capacity(items.len());
    for (i, item) in items.into_iter().enumerate() {
        let mut checker = Checker {
            state,
            violations: &mut *violations,
        };
        if let Some(v) = checker.check_map(item, fields, &format!("{item_path}[{i}]")) {
            coerced.push(v);
        }
    }
    if violations.len() != before {
        return None;
    }

    let mut element = build_element(kind, coerced, &item_path, violations)?;
    rules::check(&mut element, state, &item_path, violations);
    (violations.len() == before).then_some(element)
}

fn validate_site(
    entry: &Value,
    state: State,
    path: &str,
    violations: &mut Vec<Violation>,
) -> Option<ConfigElement> {
    let before = violations.len();
    let coerced = Checker {
        state,
        violations: &mut *violations,
    }
    .check_map(entry, SITE_ELEMENT, path)?;

    let site_type = coerced.get("type").and_then(Value::as_str).unwrap_or_default();
    let body = coerced.get("site").and_then(Value::as_object)?;

    for key in body.keys() {
        if key != site_type {
            violations.push(Violation::new(
                format!("{path}.site.{key}"),
                format!("not allowed for type '{site_type}'"),
            ));
        }
    }
    let Some(node) = body.get(site_type) else {
        violations.push(Violation::new(
            format!("{path}.site.{site_type}"),
            "is required for this type",
        ));
        return None;
    };

    let node_path = format!("{path}.site.{site_type}");
    let spec = match site_type {
        "area" => SiteSpec::Area(typed::<AreaSpec>(node, &node_path, violations)?),
        "building" => SiteSpec::Building(typed::<BuildingSpec>(node, &node_path, violations)?),
        _ => SiteSpec::Floor(typed::<FloorSpec>(node, &node_path, violations)?),
    };

    let mut element = ConfigElement::Sites(vec![spec]);
    rules::check(&mut element, state, &node_path, violations);
    (violations.len() == before).then_some(element)
}

fn typed<T: DeserializeOwned>(value: &Value, path: &str, violations: &mut Vec<Violation>) -> Option<T> {
    match serde_json::from_value(value.clone()) {
        Ok(v) => Some(v),
        Err(e) => {
            violations.push(Violation::new(path, e.to_string()));
            None
        }
    }
}

fn build_element(
    kind: ResourceKind,
    items: Vec<Value>,
    path: &str,
    violations: &mut Vec<Violation>,
) -> Option<ConfigElement> {
    let list = Value::Array(items);
    Some(match kind {
        ResourceKind::FabricVlan => ConfigElement::FabricVlans(typed(&list, path, violations)?),
        ResourceKind::VirtualNetwork => {
            ConfigElement::VirtualNetworks(typed(&list, path, violations)?)
        }
        ResourceKind::AnycastGateway => {
            ConfigElement::AnycastGateways(typed(&list, path, violations)?)
        }
        ResourceKind::WebhookDestination => {
            ConfigElement::WebhookDestinations(typed(&list, path, violations)?)
        }
        ResourceKind::EmailDestination => {
            ConfigElement::EmailDestinations(typed(&list, path, violations)?)
        }
        ResourceKind::SyslogDestination => {
            ConfigElement::SyslogDestinations(typed(&list, path, violations)?)
        }
        ResourceKind::SnmpDestination => {
            ConfigElement::SnmpDestinations(typed(&list, path, violations)?)
        }
        ResourceKind::ItsmSetting => ConfigElement::ItsmSettings(typed(&list, path, violations)?),
        ResourceKind::WebhookEventNotification => {
            ConfigElement::WebhookNotifications(typed(&list, path, violations)?)
        }
        ResourceKind::SyslogEventNotification => {
            ConfigElement::SyslogNotifications(typed(&list, path, violations)?)
        }
        ResourceKind::EmailEventNotification => {
            ConfigElement::EmailNotifications(typed(&list, path, violations)?)
        }
        ResourceKind::Site => return None,
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests;
