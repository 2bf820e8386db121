// Cross-field rules applied to typed elements after schema checks pass.
//
// Some rules normalise as well as check: SMTP ports are filled from the
// connection type and INFRA_VN gateways get their default pool type.

use std::net::Ipv4Addr;

use tracing::warn;
use url::Url;

use crate::config::State;
use crate::error::Violation;
use crate::model::{
    AnycastGatewaySpec, ConfigElement, EmailDestinationSpec, EmailNotificationSpec,
    FabricVlanSpec, SiteSpec, SmtpSpec, SnmpDestinationSpec, WebhookDestinationSpec,
};

/// VLAN ids the controller keeps for itself.
const RESERVED_VLANS: &[u16] = &[1002, 1003, 1004, 1005, 2046];

const SMTP_DEFAULT_PORT: u16 = 25;
const SMTP_TLS_PORT: u16 = 587;
const SMTP_SSL_PORT: u16 = 465;

struct Rules<'a> {
    state: State,
    violations: &'a mut Vec<Violation>,
}

impl Rules<'_> {
    fn fail(&mut self, path: String, message: impl Into<String>) {
        self.violations.push(Violation::new(path, message));
    }

    fn require<T>(&mut self, value: Option<&T>, path: String, when: &str) {
        if value.is_none() {
            self.fail(path, format!("is required when {when}"));
        }
    }
}

pub(super) fn check(
    element: &mut ConfigElement,
    state: State,
    path: &str,
    violations: &mut Vec<Violation>,
) {
    let mut rules = Rules { state, violations };
    match element {
        ConfigElement::FabricVlans(items) => {
            for (i, vlan) in items.iter().enumerate() {
                rules.fabric_vlan(vlan, &format!("{path}[{i}]"));
            }
        }
        ConfigElement::AnycastGateways(items) => {
            for (i, gateway) in items.iter_mut().enumerate() {
                rules.anycast_gateway(gateway, &format!("{path}[{i}]"));
            }
        }
        ConfigElement::Sites(items) => {
            for site in items.iter() {
                rules.site(site, path);
            }
        }
        ConfigElement::WebhookDestinations(items) => {
            for (i, webhook) in items.iter().enumerate() {
                rules.webhook(webhook, &format!("{path}[{i}]"));
            }
        }
        ConfigElement::EmailDestinations(items) => {
            for (i, email) in items.iter_mut().enumerate() {
                rules.email_destination(email, &format!("{path}[{i}]"));
            }
        }
        ConfigElement::SnmpDestinations(items) => {
            for (i, snmp) in items.iter().enumerate() {
                rules.snmp(snmp, &format!("{path}[{i}]"));
            }
        }
        ConfigElement::EmailNotifications(items) => {
            for (i, notification) in items.iter().enumerate() {
                rules.email_notification(notification, &format!("{path}[{i}]"));
            }
        }
        ConfigElement::VirtualNetworks(_)
        | ConfigElement::SyslogDestinations(_)
        | ConfigElement::ItsmSettings(_)
        | ConfigElement::WebhookNotifications(_)
        | ConfigElement::SyslogNotifications(_) => {}
    }
}

impl Rules<'_> {
    // ── SDA ──────────────────────────────────────────────────────────

    fn vlan_id(&mut self, id: u16, path: String) {
        if RESERVED_VLANS.contains(&id) {
            self.fail(path, format!("VLAN {id} is reserved (1002-1005 and 2046 are not allowed)"));
        }
    }

    fn flooding(&mut self, assignment: Option<&String>, address: Option<&String>, path: &str) {
        match (assignment.map(String::as_str), address) {
            (Some("CUSTOM"), None) => self.fail(
                format!("{path}.flooding_address"),
                "is required when flooding_address_assignment is CUSTOM",
            ),
            (Some("CUSTOM"), Some(address)) => {
                let multicast = address
                    .parse::<Ipv4Addr>()
                    .is_ok_and(|ip| ip.octets()[0] == 239);
                if !multicast {
                    self.fail(
                        format!("{path}.flooding_address"),
                        format!("'{address}' is not a multicast address in 239.0.0.0/8"),
                    );
                }
            }
            (_, Some(_)) => self.fail(
                format!("{path}.flooding_address"),
                "is only allowed when flooding_address_assignment is CUSTOM",
            ),
            (_, None) => {}
        }
    }

    fn fabric_vlan(&mut self, vlan: &FabricVlanSpec, path: &str) {
        self.vlan_id(vlan.vlan_id, format!("{path}.vlan_id"));
        self.flooding(
            vlan.flooding_address_assignment.as_ref(),
            vlan.flooding_address.as_ref(),
            path,
        );
        if self.state == State::Merged && vlan.fabric_site_locations.is_empty() {
            self.fail(
                format!("{path}.fabric_site_locations"),
                "must list at least one fabric location",
            );
        }
    }

    fn anycast_gateway(&mut self, gateway: &mut AnycastGatewaySpec, path: &str) {
        if let Some(id) = gateway.vlan_id {
            self.vlan_id(id, format!("{path}.vlan_id"));
        }
        self.flooding(
            gateway.flooding_address_assignment.as_ref(),
            gateway.flooding_address.as_ref(),
            path,
        );

        if gateway.is_infra() {
            for field in infra_disallowed(gateway) {
                self.fail(format!("{path}.{field}"), "is not allowed for INFRA_VN");
            }
            if gateway.pool_type.is_none() {
                gateway.pool_type = Some("EXTENDED_NODE".to_owned());
            }
        } else if gateway.pool_type.is_some() {
            self.fail(format!("{path}.pool_type"), "is only allowed for INFRA_VN");
        }

        if gateway.vlan_is_managed() {
            if gateway.vlan_name.is_some() || gateway.vlan_id.is_some() {
                warn!(
                    vn = %gateway.vn_name,
                    pool = %gateway.ip_pool_name,
                    "VLAN is assigned by the controller; ignoring vlan_name and vlan_id"
                );
            }
            gateway.vlan_name = None;
            gateway.vlan_id = None;
        } else if self.state == State::Merged && !gateway.is_infra() {
            self.require(
                gateway.vlan_name.as_ref(),
                format!("{path}.vlan_name"),
                "the VLAN is not auto-generated or a critical pool",
            );
        }
    }

    // ── Sites ────────────────────────────────────────────────────────

    fn site(&mut self, site: &SiteSpec, path: &str) {
        let parent = site.parent_name();
        if parent != "Global" && !parent.starts_with("Global/") {
            self.fail(format!("{path}.parent_name"), "must start with 'Global'");
        }
        if site.name().contains('/') {
            self.fail(format!("{path}.name"), "must not contain '/'");
        }
        if let SiteSpec::Floor(floor) = site {
            if let Some(image) = &floor.upload_floor_image_path {
                let supported = image
                    .extension()
                    .and_then(|e| e.to_str())
                    .is_some_and(|e| {
                        ["png", "jpg", "jpeg", "pdf"]
                            .iter()
                            .any(|known| e.eq_ignore_ascii_case(known))
                    });
                if !supported {
                    self.fail(
                        format!("{path}.upload_floor_image_path"),
                        "must be a png, jpg, jpeg or pdf file",
                    );
                }
            }
        }
    }

    // ── Destinations ─────────────────────────────────────────────────

    fn webhook(&mut self, webhook: &WebhookDestinationSpec, path: &str) {
        let secure = Url::parse(&webhook.url)
            .is_ok_and(|url| url.scheme() == "https" && url.host_str().is_some());
        if !secure {
            self.fail(format!("{path}.url"), format!("'{}' is not an https URL", webhook.url));
        }
        for (i, header) in webhook.headers.iter().flatten().enumerate() {
            if header.value.is_none() && header.default_value.is_none() {
                self.fail(
                    format!("{path}.headers[{i}]"),
                    "needs a value or a default_value",
                );
            }
        }
    }

    fn email_address(&mut self, address: &str, path: String) {
        if !looks_like_email(address) {
            self.fail(path, format!("'{address}' is not a valid email address"));
        }
    }

    fn smtp(&mut self, smtp: &mut SmtpSpec, path: &str) {
        let kind = smtp.smtp_type.get_or_insert_with(|| "DEFAULT".to_owned());
        match kind.as_str() {
            "DEFAULT" => {
                if smtp.port.is_some_and(|p| p != SMTP_DEFAULT_PORT) {
                    warn!(path, "SMTP type DEFAULT always uses port 25");
                }
                smtp.port = Some(SMTP_DEFAULT_PORT);
            }
            "TLS" => {
                smtp.port.get_or_insert(SMTP_TLS_PORT);
            }
            "SSL" => {
                smtp.port.get_or_insert(SMTP_SSL_PORT);
            }
            _ => {}
        }
        if smtp.username.is_some() != smtp.password.is_some() {
            self.fail(
                format!("{path}.password"),
                "username and password must be given together",
            );
        }
    }

    fn email_destination(&mut self, email: &mut EmailDestinationSpec, path: &str) {
        self.email_address(&email.sender_email, format!("{path}.sender_email"));
        self.email_address(&email.recipient_email, format!("{path}.recipient_email"));
        self.smtp(&mut email.primary_smtp_config, &format!("{path}.primary_smtp_config"));
        if let Some(secondary) = email.secondary_smtp_config.as_mut() {
            self.smtp(secondary, &format!("{path}.secondary_smtp_config"));
        }
    }

    fn snmp(&mut self, snmp: &SnmpDestinationSpec, path: &str) {
        if self.state != State::Merged {
            return;
        }
        match snmp.snmp_version.as_deref() {
            Some("V2C") => {
                self.require(snmp.community.as_ref(), format!("{path}.community"), "snmp_version is V2C");
            }
            Some("V3") => {
                self.require(snmp.username.as_ref(), format!("{path}.username"), "snmp_version is V3");
                self.require(snmp.mode.as_ref(), format!("{path}.mode"), "snmp_version is V3");
                let mode = snmp.mode.as_deref().unwrap_or_default();
                if mode == "AUTH_PRIVACY" || mode == "AUTH_NO_PRIVACY" {
                    let when = format!("mode is {mode}");
                    self.require(snmp.auth_type.as_ref(), format!("{path}.auth_type"), &when);
                    self.require(snmp.auth_password.as_ref(), format!("{path}.auth_password"), &when);
                }
                if mode == "AUTH_PRIVACY" {
                    let when = "mode is AUTH_PRIVACY";
                    self.require(snmp.privacy_type.as_ref(), format!("{path}.privacy_type"), when);
                    self.require(
                        snmp.privacy_password.as_ref(),
                        format!("{path}.privacy_password"),
                        when,
                    );
                }
            }
            _ => {}
        }
    }

    // ── Notifications ────────────────────────────────────────────────

    fn email_notification(&mut self, notification: &EmailNotificationSpec, path: &str) {
        if let Some(sender) = &notification.sender_email {
            self.email_address(sender, format!("{path}.sender_email"));
        }
        for (i, recipient) in notification.recipient_emails.iter().enumerate() {
            self.email_address(recipient, format!("{path}.recipient_emails[{i}]"));
        }
    }
}

/// Fields set on an INFRA_VN gateway outside its reduced field set.
fn infra_disallowed(gateway: &AnycastGatewaySpec) -> Vec<&'static str> {
    let set = [
        ("traffic_type", gateway.traffic_type.is_some()),
        ("security_group_name", gateway.security_group_name.is_some()),
        ("is_critical_pool", gateway.is_critical_pool.is_some()),
        ("layer2_flooding_enabled", gateway.layer2_flooding_enabled.is_some()),
        ("fabric_enabled_wireless", gateway.fabric_enabled_wireless.is_some()),
        ("ip_directed_broadcast", gateway.ip_directed_broadcast.is_some()),
        (
            "intra_subnet_routing_enabled",
            gateway.intra_subnet_routing_enabled.is_some(),
        ),
        (
            "multiple_ip_to_mac_addresses",
            gateway.multiple_ip_to_mac_addresses.is_some(),
        ),
        (
            "supplicant_based_extended_node_onboarding",
            gateway.supplicant_based_extended_node_onboarding.is_some(),
        ),
        ("wireless_flooding_enable", gateway.wireless_flooding_enable.is_some()),
        ("resource_guard_enable", gateway.resource_guard_enable.is_some()),
        (
            "flooding_address_assignment",
            gateway.flooding_address_assignment.is_some(),
        ),
        ("flooding_address", gateway.flooding_address.is_some()),
    ];
    set.into_iter()
        .filter_map(|(name, present)| present.then_some(name))
        .collect()
}

fn looks_like_email(address: &str) -> bool {
    let Some((local, domain)) = address.split_once('@') else {
        return false;
    };
    !local.is_empty()
        && !domain.contains('@')
        && domain.contains('.')
        && !domain.starts_with('.')
        && !domain.ends_with('.')
        && !address.chars().any(char::is_whitespace)
}
