// Event destinations: webhook, syslog, SNMP and email.
//
// Destinations are create/update only. Catalyst Center offers no delete
// for them, so deleted intent reports a conflict for any that exist.
// Secrets the controller masks on read (encrypted header values, SNMP and
// SMTP passwords) are sent on every write but never compared.

use catc_api::types::event::{
    EmailDestination, SmtpConfig, SnmpDestination, SyslogDestination, WebhookDestination,
    WebhookHeader,
};

use super::{drifts, drifts_ignore_case};
use crate::engine::profile::{Profile, Removal, Resolved, Verdict};
use crate::engine::session::Session;
use crate::error::CoreError;
use crate::lookup::absent_if_benign;
use crate::model::{
    EmailDestinationSpec, ResourceKind, SmtpSpec, SnmpDestinationSpec, SyslogDestinationSpec,
    WebhookDestinationSpec, WebhookHeaderSpec,
};

const DEFAULT_WEBHOOK_METHOD: &str = "POST";

fn not_deletable(kind: ResourceKind, name: &str) -> CoreError {
    CoreError::conflict(format!(
        "{} '{name}' cannot be deleted: Catalyst Center does not support deleting event destinations",
        kind.noun()
    ))
}

fn pick<T: Clone>(desired: Option<&T>, observed: &T) -> T {
    desired.cloned().unwrap_or_else(|| observed.clone())
}

// ── Webhook ──────────────────────────────────────────────────────────

pub(crate) struct WebhookDestinationProfile;

fn wire_header(spec: &WebhookHeaderSpec) -> WebhookHeader {
    WebhookHeader {
        name: spec.name.clone(),
        value: spec.value.clone(),
        default_value: spec.default_value.clone(),
        encrypt: spec.encrypt.unwrap_or(false),
    }
}

/// Encrypted header values come back masked; only their names compare.
fn headers_drift(desired: &[WebhookHeaderSpec], observed: &[WebhookHeader]) -> bool {
    if desired.len() != observed.len() {
        return true;
    }
    desired.iter().any(|d| {
        let Some(o) = observed.iter().find(|o| o.name == d.name) else {
            return true;
        };
        if d.encrypt.unwrap_or(false) || o.encrypt {
            return drifts(d.encrypt.as_ref(), Some(&o.encrypt));
        }
        drifts(d.value.as_deref(), o.value.as_deref())
            || drifts(d.default_value.as_deref(), o.default_value.as_deref())
    })
}

fn webhook_drifted(spec: &WebhookDestinationSpec, current: &WebhookDestination) -> bool {
    drifts(spec.description.as_deref(), current.description.as_deref())
        || spec.url != current.url
        || drifts_ignore_case(spec.method.as_deref(), Some(&current.method))
        || drifts(spec.trust_cert.as_ref(), Some(&current.trust_cert))
        || drifts(spec.is_proxy_route.as_ref(), Some(&current.is_proxy_route))
        || spec
            .headers
            .as_deref()
            .is_some_and(|h| headers_drift(h, &current.headers))
}

fn webhook_payload(spec: &WebhookDestinationSpec, current: Option<&WebhookDestination>) -> WebhookDestination {
    let base = current.cloned().unwrap_or_else(|| WebhookDestination {
        method: DEFAULT_WEBHOOK_METHOD.to_owned(),
        ..Default::default()
    });
    WebhookDestination {
        webhook_id: base.webhook_id,
        name: spec.name.clone(),
        description: spec.description.clone().or(base.description),
        url: spec.url.clone(),
        method: spec
            .method
            .as_deref()
            .map_or(base.method, str::to_ascii_uppercase),
        trust_cert: spec.trust_cert.unwrap_or(base.trust_cert),
        headers: spec
            .headers
            .as_deref()
            .map_or(base.headers, |h| h.iter().map(wire_header).collect()),
        is_proxy_route: spec.is_proxy_route.unwrap_or(base.is_proxy_route),
    }
}

impl Profile for WebhookDestinationProfile {
    type Item = WebhookDestinationSpec;
    type Target = WebhookDestinationSpec;
    type Observed = WebhookDestination;
    type Payload = WebhookDestination;

    fn kind(&self) -> ResourceKind {
        ResourceKind::WebhookDestination
    }

    fn item_label(&self, item: &WebhookDestinationSpec) -> String {
        item.name.clone()
    }

    fn label(&self, target: &WebhookDestinationSpec) -> String {
        target.name.clone()
    }

    async fn resolve(
        &self,
        _s: &Session<'_>,
        item: &WebhookDestinationSpec,
    ) -> Result<Vec<Resolved<WebhookDestinationSpec>>, CoreError> {
        Ok(vec![Resolved::Target(item.clone())])
    }

    async fn observe(
        &self,
        s: &Session<'_>,
        target: &WebhookDestinationSpec,
    ) -> Result<Option<WebhookDestination>, CoreError> {
        Ok(absent_if_benign(s.client.find_webhook_destination(&target.name).await)?.flatten())
    }

    fn diff(
        &self,
        _s: &Session<'_>,
        target: &WebhookDestinationSpec,
        observed: Option<&WebhookDestination>,
    ) -> Verdict<WebhookDestination> {
        match observed {
            None => Verdict::Create(webhook_payload(target, None)),
            Some(current) if webhook_drifted(target, current) => {
                Verdict::Drifted(webhook_payload(target, Some(current)))
            }
            Some(_) => Verdict::Equal,
        }
    }

    async fn create(&self, s: &Session<'_>, batch: &[WebhookDestination]) -> Result<(), CoreError> {
        for body in batch {
            let handle = s.client.create_webhook_destination(body).await?;
            s.wait("event_management.create_webhook_destination", &handle).await?;
        }
        Ok(())
    }

    async fn update(&self, s: &Session<'_>, batch: &[WebhookDestination]) -> Result<(), CoreError> {
        for body in batch {
            let handle = s.client.update_webhook_destination(body).await?;
            s.wait("event_management.update_webhook_destination", &handle).await?;
        }
        Ok(())
    }

    async fn delete(
        &self,
        _s: &Session<'_>,
        target: &WebhookDestinationSpec,
        _observed: &WebhookDestination,
    ) -> Result<Removal, CoreError> {
        Err(not_deletable(self.kind(), &target.name))
    }
}

// ── Syslog ───────────────────────────────────────────────────────────

pub(crate) struct SyslogDestinationProfile;

fn syslog_payload(spec: &SyslogDestinationSpec, current: Option<&SyslogDestination>) -> SyslogDestination {
    let base = current.cloned().unwrap_or_default();
    SyslogDestination {
        config_id: base.config_id,
        name: spec.name.clone(),
        description: spec.description.clone().or(base.description),
        host: pick(spec.server_address.as_ref(), &base.host),
        protocol: spec
            .protocol
            .as_deref()
            .map_or(base.protocol, str::to_ascii_uppercase),
        port: spec.port.unwrap_or(base.port),
    }
}

impl Profile for SyslogDestinationProfile {
    type Item = SyslogDestinationSpec;
    type Target = SyslogDestinationSpec;
    type Observed = SyslogDestination;
    type Payload = SyslogDestination;

    fn kind(&self) -> ResourceKind {
        ResourceKind::SyslogDestination
    }

    fn item_label(&self, item: &SyslogDestinationSpec) -> String {
        item.name.clone()
    }

    fn label(&self, target: &SyslogDestinationSpec) -> String {
        target.name.clone()
    }

    async fn resolve(
        &self,
        _s: &Session<'_>,
        item: &SyslogDestinationSpec,
    ) -> Result<Vec<Resolved<SyslogDestinationSpec>>, CoreError> {
        Ok(vec![Resolved::Target(item.clone())])
    }

    async fn observe(
        &self,
        s: &Session<'_>,
        target: &SyslogDestinationSpec,
    ) -> Result<Option<SyslogDestination>, CoreError> {
        Ok(absent_if_benign(s.client.get_syslog_destination(&target.name).await)?
            .unwrap_or_default()
            .into_iter()
            .find(|d| d.name == target.name))
    }

    fn diff(
        &self,
        _s: &Session<'_>,
        target: &SyslogDestinationSpec,
        observed: Option<&SyslogDestination>,
    ) -> Verdict<SyslogDestination> {
        let Some(current) = observed else {
            return Verdict::Create(syslog_payload(target, None));
        };
        let drifted = drifts(target.description.as_deref(), current.description.as_deref())
            || drifts(target.server_address.as_deref(), Some(current.host.as_str()))
            || drifts_ignore_case(target.protocol.as_deref(), Some(&current.protocol))
            || drifts(target.port.as_ref(), Some(&current.port));
        if drifted {
            Verdict::Drifted(syslog_payload(target, Some(current)))
        } else {
            Verdict::Equal
        }
    }

    async fn create(&self, s: &Session<'_>, batch: &[SyslogDestination]) -> Result<(), CoreError> {
        for body in batch {
            let handle = s.client.create_syslog_destination(body).await?;
            s.wait("event_management.create_syslog_destination", &handle).await?;
        }
        Ok(())
    }

    async fn update(&self, s: &Session<'_>, batch: &[SyslogDestination]) -> Result<(), CoreError> {
        for body in batch {
            let handle = s.client.update_syslog_destination(body).await?;
            s.wait("event_management.update_syslog_destination", &handle).await?;
        }
        Ok(())
    }

    async fn delete(
        &self,
        _s: &Session<'_>,
        target: &SyslogDestinationSpec,
        _observed: &SyslogDestination,
    ) -> Result<Removal, CoreError> {
        Err(not_deletable(self.kind(), &target.name))
    }
}

// ── SNMP ─────────────────────────────────────────────────────────────

pub(crate) struct SnmpDestinationProfile;

fn upper(value: Option<&String>) -> Option<String> {
    value.map(|v| v.to_ascii_uppercase())
}

fn snmp_payload(spec: &SnmpDestinationSpec, current: Option<&SnmpDestination>) -> SnmpDestination {
    let base = current.cloned().unwrap_or_default();
    SnmpDestination {
        config_id: base.config_id,
        name: spec.name.clone(),
        description: spec.description.clone().or(base.description),
        ip_address: pick(spec.server_address.as_ref(), &base.ip_address),
        port: spec.port.unwrap_or(base.port),
        snmp_version: upper(spec.snmp_version.as_ref()).unwrap_or(base.snmp_version),
        community: spec.community.clone().or(base.community),
        user_name: spec.username.clone().or(base.user_name),
        snmp_mode: upper(spec.mode.as_ref()).or(base.snmp_mode),
        snmp_auth_type: upper(spec.auth_type.as_ref()).or(base.snmp_auth_type),
        auth_password: spec.auth_password.clone(),
        snmp_privacy_type: upper(spec.privacy_type.as_ref()).or(base.snmp_privacy_type),
        privacy_password: spec.privacy_password.clone(),
    }
}

fn snmp_drifted(spec: &SnmpDestinationSpec, current: &SnmpDestination) -> bool {
    drifts(spec.description.as_deref(), current.description.as_deref())
        || drifts(spec.server_address.as_deref(), Some(current.ip_address.as_str()))
        || drifts(spec.port.as_ref(), Some(&current.port))
        || drifts_ignore_case(spec.snmp_version.as_deref(), Some(&current.snmp_version))
        || drifts(spec.username.as_deref(), current.user_name.as_deref())
        || drifts_ignore_case(spec.mode.as_deref(), current.snmp_mode.as_deref())
        || drifts_ignore_case(spec.auth_type.as_deref(), current.snmp_auth_type.as_deref())
        || drifts_ignore_case(
            spec.privacy_type.as_deref(),
            current.snmp_privacy_type.as_deref(),
        )
}

impl Profile for SnmpDestinationProfile {
    type Item = SnmpDestinationSpec;
    type Target = SnmpDestinationSpec;
    type Observed = SnmpDestination;
    type Payload = SnmpDestination;

    fn kind(&self) -> ResourceKind {
        ResourceKind::SnmpDestination
    }

    fn item_label(&self, item: &SnmpDestinationSpec) -> String {
        item.name.clone()
    }

    fn label(&self, target: &SnmpDestinationSpec) -> String {
        target.name.clone()
    }

    async fn resolve(
        &self,
        _s: &Session<'_>,
        item: &SnmpDestinationSpec,
    ) -> Result<Vec<Resolved<SnmpDestinationSpec>>, CoreError> {
        Ok(vec![Resolved::Target(item.clone())])
    }

    async fn observe(
        &self,
        s: &Session<'_>,
        target: &SnmpDestinationSpec,
    ) -> Result<Option<SnmpDestination>, CoreError> {
        Ok(absent_if_benign(s.client.find_snmp_destination(&target.name).await)?.flatten())
    }

    fn diff(
        &self,
        _s: &Session<'_>,
        target: &SnmpDestinationSpec,
        observed: Option<&SnmpDestination>,
    ) -> Verdict<SnmpDestination> {
        match observed {
            None => Verdict::Create(snmp_payload(target, None)),
            Some(current) if snmp_drifted(target, current) => {
                Verdict::Drifted(snmp_payload(target, Some(current)))
            }
            Some(_) => Verdict::Equal,
        }
    }

    async fn create(&self, s: &Session<'_>, batch: &[SnmpDestination]) -> Result<(), CoreError> {
        for body in batch {
            let handle = s.client.create_snmp_destination(body).await?;
            s.wait("event_management.create_snmp_destination", &handle).await?;
        }
        Ok(())
    }

    async fn update(&self, s: &Session<'_>, batch: &[SnmpDestination]) -> Result<(), CoreError> {
        for body in batch {
            let handle = s.client.update_snmp_destination(body).await?;
            s.wait("event_management.update_snmp_destination", &handle).await?;
        }
        Ok(())
    }

    async fn delete(
        &self,
        _s: &Session<'_>,
        target: &SnmpDestinationSpec,
        _observed: &SnmpDestination,
    ) -> Result<Removal, CoreError> {
        Err(not_deletable(self.kind(), &target.name))
    }
}

// ── Email ────────────────────────────────────────────────────────────

/// The controller holds a single email configuration; every item targets it.
pub(crate) struct EmailDestinationProfile;

fn smtp_config(spec: &SmtpSpec) -> SmtpConfig {
    SmtpConfig {
        host_name: spec.server_address.clone(),
        port: spec.port,
        user_name: spec.username.clone(),
        password: spec.password.clone(),
        smtp_type: upper(spec.smtp_type.as_ref()),
    }
}

fn smtp_drifts(desired: &SmtpSpec, observed: Option<&SmtpConfig>) -> bool {
    let Some(current) = observed else {
        return true;
    };
    desired.server_address != current.host_name
        || drifts(desired.port.as_ref(), current.port.as_ref())
        || drifts(desired.username.as_deref(), current.user_name.as_deref())
        || drifts_ignore_case(desired.smtp_type.as_deref(), current.smtp_type.as_deref())
}

fn email_drifted(spec: &EmailDestinationSpec, current: &EmailDestination) -> bool {
    spec.sender_email != current.from_email
        || spec.recipient_email != current.to_email
        || spec.subject != current.subject
        || smtp_drifts(&spec.primary_smtp_config, Some(&current.primary_smtp_config))
        || spec
            .secondary_smtp_config
            .as_ref()
            .is_some_and(|secondary| smtp_drifts(secondary, current.secondary_smtp_config.as_ref()))
}

fn email_payload(spec: &EmailDestinationSpec, current: Option<&EmailDestination>) -> EmailDestination {
    EmailDestination {
        email_config_id: current.and_then(|c| c.email_config_id.clone()),
        primary_smtp_config: smtp_config(&spec.primary_smtp_config),
        secondary_smtp_config: spec
            .secondary_smtp_config
            .as_ref()
            .map(smtp_config)
            .or_else(|| current.and_then(|c| c.secondary_smtp_config.clone())),
        from_email: spec.sender_email.clone(),
        to_email: spec.recipient_email.clone(),
        subject: spec.subject.clone(),
    }
}

impl Profile for EmailDestinationProfile {
    type Item = EmailDestinationSpec;
    type Target = EmailDestinationSpec;
    type Observed = EmailDestination;
    type Payload = EmailDestination;

    fn kind(&self) -> ResourceKind {
        ResourceKind::EmailDestination
    }

    fn item_label(&self, item: &EmailDestinationSpec) -> String {
        item.sender_email.clone()
    }

    fn label(&self, target: &EmailDestinationSpec) -> String {
        target.sender_email.clone()
    }

    async fn resolve(
        &self,
        _s: &Session<'_>,
        item: &EmailDestinationSpec,
    ) -> Result<Vec<Resolved<EmailDestinationSpec>>, CoreError> {
        Ok(vec![Resolved::Target(item.clone())])
    }

    async fn observe(
        &self,
        s: &Session<'_>,
        _target: &EmailDestinationSpec,
    ) -> Result<Option<EmailDestination>, CoreError> {
        Ok(absent_if_benign(s.client.get_email_destination().await)?.flatten())
    }

    fn diff(
        &self,
        _s: &Session<'_>,
        target: &EmailDestinationSpec,
        observed: Option<&EmailDestination>,
    ) -> Verdict<EmailDestination> {
        match observed {
            None => Verdict::Create(email_payload(target, None)),
            Some(current) if email_drifted(target, current) => {
                Verdict::Drifted(email_payload(target, Some(current)))
            }
            Some(_) => Verdict::Equal,
        }
    }

    async fn create(&self, s: &Session<'_>, batch: &[EmailDestination]) -> Result<(), CoreError> {
        for body in batch {
            let handle = s.client.create_email_destination(body).await?;
            s.wait("event_management.create_email_destination", &handle).await?;
        }
        Ok(())
    }

    async fn update(&self, s: &Session<'_>, batch: &[EmailDestination]) -> Result<(), CoreError> {
        for body in batch {
            let handle = s.client.update_email_destination(body).await?;
            s.wait("event_management.update_email_destination", &handle).await?;
        }
        Ok(())
    }

    async fn delete(
        &self,
        _s: &Session<'_>,
        target: &EmailDestinationSpec,
        _observed: &EmailDestination,
    ) -> Result<Removal, CoreError> {
        Err(not_deletable(self.kind(), &target.sender_email))
    }
}
