// Event notifications: subscriptions binding a destination to an event filter.
//
// Webhook and syslog notifications reference an existing destination
// instance by name. Email notifications carry their endpoint inline and
// reuse the instance when one of that name already exists.

use catc_api::types::event::{
    DomainSubdomains, EventSubscription, SubscriptionChannel, SubscriptionDetails,
    SubscriptionEndpoint, SubscriptionFilter,
};
use tracing::debug;

use super::{drifts, is_subset, union};
use crate::config::State;
use crate::engine::profile::{Profile, Removal, Resolved, Verdict};
use crate::engine::session::Session;
use crate::error::CoreError;
use crate::lookup::{absent_if_benign, site_by_hierarchy};
use crate::model::{EmailNotificationSpec, NotificationSpec, ResourceKind};

#[derive(Debug, Clone)]
pub(crate) struct SubscriptionTarget {
    pub name: String,
    /// Fully resolved desired subscription; only the name under deleted intent.
    pub desired: EventSubscription,
}

// ── Shared resolution ────────────────────────────────────────────────

async fn event_ids(s: &Session<'_>, names: &[String]) -> Result<Vec<String>, CoreError> {
    let mut ids = Vec::with_capacity(names.len());
    for name in names {
        let event = absent_if_benign(s.client.find_event_by_name(name).await)?.flatten();
        match event {
            Some(event) => ids.push(event.event_id),
            None => return Err(CoreError::conflict(format!("event '{name}' does not exist"))),
        }
    }
    Ok(ids)
}

async fn site_ids(s: &Session<'_>, sites: &[String]) -> Result<Vec<String>, CoreError> {
    let mut ids = Vec::with_capacity(sites.len());
    for hierarchy in sites {
        match site_by_hierarchy(s, hierarchy).await? {
            Some(site) => ids.push(site.id),
            None => return Err(CoreError::conflict(format!("site '{hierarchy}' does not exist"))),
        }
    }
    Ok(ids)
}

async fn instance_id(
    s: &Session<'_>,
    channel: SubscriptionChannel,
    name: &str,
) -> Result<Option<String>, CoreError> {
    Ok(absent_if_benign(s.client.get_destination_instances(channel, name).await)?
        .unwrap_or_default()
        .into_iter()
        .find(|i| i.name == name)
        .map(|i| i.instance_id))
}

fn upper_all(values: &[String]) -> Vec<String> {
    values.iter().map(|v| v.to_ascii_uppercase()).collect()
}

async fn resolve_filter(
    s: &Session<'_>,
    spec: &NotificationSpec,
) -> Result<SubscriptionFilter, CoreError> {
    Ok(SubscriptionFilter {
        event_ids: event_ids(s, &spec.events).await?,
        domains_subdomains: spec
            .domain
            .iter()
            .map(|domain| DomainSubdomains {
                domain: domain.clone(),
                sub_domains: spec.subdomains.clone(),
            })
            .collect(),
        types: upper_all(&spec.event_types),
        categories: upper_all(&spec.event_categories),
        severities: spec.event_severities.clone(),
        sources: spec.event_sources.clone(),
        site_ids: site_ids(s, &spec.sites).await?,
    })
}

fn placeholder(name: &str) -> SubscriptionTarget {
    SubscriptionTarget {
        name: name.to_owned(),
        desired: EventSubscription {
            name: name.to_owned(),
            ..Default::default()
        },
    }
}

// ── Shared comparison ────────────────────────────────────────────────

fn domains_drift(desired: &[DomainSubdomains], observed: &[DomainSubdomains]) -> bool {
    desired.iter().any(|d| {
        !observed
            .iter()
            .any(|o| o.domain == d.domain && is_subset(&d.sub_domains, &o.sub_domains))
    })
}

/// Filter lists compare as sets; an element missing from the controller drifts.
fn filter_drifts(desired: &SubscriptionFilter, observed: &SubscriptionFilter) -> bool {
    !is_subset(&desired.event_ids, &observed.event_ids)
        || !is_subset(&desired.site_ids, &observed.site_ids)
        || !is_subset(&desired.types, &observed.types)
        || !is_subset(&desired.categories, &observed.categories)
        || !is_subset(&desired.severities, &observed.severities)
        || !is_subset(&desired.sources, &observed.sources)
        || domains_drift(&desired.domains_subdomains, &observed.domains_subdomains)
}

fn merge_domains(observed: &[DomainSubdomains], desired: &[DomainSubdomains]) -> Vec<DomainSubdomains> {
    let mut out = observed.to_vec();
    for d in desired {
        match out.iter_mut().find(|o| o.domain == d.domain) {
            Some(o) => o.sub_domains = union(&o.sub_domains, &d.sub_domains),
            None => out.push(d.clone()),
        }
    }
    out
}

fn merge_filter(observed: &SubscriptionFilter, desired: &SubscriptionFilter) -> SubscriptionFilter {
    SubscriptionFilter {
        event_ids: union(&observed.event_ids, &desired.event_ids),
        domains_subdomains: merge_domains(&observed.domains_subdomains, &desired.domains_subdomains),
        types: union(&observed.types, &desired.types),
        categories: union(&observed.categories, &desired.categories),
        severities: union(&observed.severities, &desired.severities),
        sources: union(&observed.sources, &desired.sources),
        site_ids: union(&observed.site_ids, &desired.site_ids),
    }
}

fn endpoint_drifts(desired: &SubscriptionEndpoint, observed: &[SubscriptionEndpoint]) -> bool {
    match &desired.instance_id {
        Some(id) => !observed.iter().any(|o| o.instance_id.as_ref() == Some(id)),
        None => {
            let wanted = &desired.subscription_details;
            !observed.iter().any(|o| {
                let have = &o.subscription_details;
                have.name == wanted.name
                    && !drifts(wanted.from_email_address.as_deref(), have.from_email_address.as_deref())
                    && !drifts(wanted.subject.as_deref(), have.subject.as_deref())
                    && wanted.to_email_addresses.as_deref().is_none_or(|to| {
                        is_subset(to, have.to_email_addresses.as_deref().unwrap_or_default())
                    })
            })
        }
    }
}

fn subscription_diff(
    desired: &EventSubscription,
    observed: Option<&EventSubscription>,
) -> Verdict<EventSubscription> {
    let Some(current) = observed else {
        return Verdict::Create(desired.clone());
    };
    let drifted = drifts(desired.description.as_deref(), current.description.as_deref())
        || filter_drifts(&desired.filter, &current.filter)
        || desired
            .subscription_endpoints
            .iter()
            .any(|e| endpoint_drifts(e, &current.subscription_endpoints));
    if !drifted {
        return Verdict::Equal;
    }
    Verdict::Drifted(EventSubscription {
        subscription_id: current.subscription_id.clone(),
        name: desired.name.clone(),
        description: desired
            .description
            .clone()
            .or_else(|| current.description.clone()),
        subscription_endpoints: desired.subscription_endpoints.clone(),
        filter: merge_filter(&current.filter, &desired.filter),
    })
}

async fn observe_subscription(
    s: &Session<'_>,
    channel: SubscriptionChannel,
    name: &str,
) -> Result<Option<EventSubscription>, CoreError> {
    Ok(absent_if_benign(s.client.get_event_subscriptions(channel, name).await)?
        .unwrap_or_default()
        .into_iter()
        .find(|sub| sub.name == name))
}

async fn delete_subscription(
    s: &Session<'_>,
    name: &str,
    observed: &EventSubscription,
) -> Result<Removal, CoreError> {
    let Some(id) = observed.subscription_id.as_deref() else {
        return Err(CoreError::Lookup {
            message: format!("event subscription '{name}' has no id"),
        });
    };
    let handle = s.client.delete_event_subscription(id).await?;
    s.wait("event_management.delete_event_subscriptions", &handle)
        .await?;
    Ok(Removal::Deleted)
}

// ── Webhook and syslog ───────────────────────────────────────────────

pub(crate) struct NotificationProfile {
    pub channel: SubscriptionChannel,
}

impl Profile for NotificationProfile {
    type Item = NotificationSpec;
    type Target = SubscriptionTarget;
    type Observed = EventSubscription;
    type Payload = EventSubscription;

    fn kind(&self) -> ResourceKind {
        match self.channel {
            SubscriptionChannel::Syslog => ResourceKind::SyslogEventNotification,
            SubscriptionChannel::Email => ResourceKind::EmailEventNotification,
            SubscriptionChannel::Rest => ResourceKind::WebhookEventNotification,
        }
    }

    fn item_label(&self, item: &NotificationSpec) -> String {
        item.name.clone()
    }

    fn label(&self, target: &SubscriptionTarget) -> String {
        target.name.clone()
    }

    async fn resolve(
        &self,
        s: &Session<'_>,
        item: &NotificationSpec,
    ) -> Result<Vec<Resolved<SubscriptionTarget>>, CoreError> {
        if s.state() == State::Deleted {
            return Ok(vec![Resolved::Target(placeholder(&item.name))]);
        }

        let destination = item.destination.as_deref().unwrap_or_default();
        let Some(instance) = instance_id(s, self.channel, destination).await? else {
            return Err(CoreError::conflict(format!(
                "{} destination '{destination}' does not exist",
                self.channel.connector_type()
            )));
        };
        let filter = resolve_filter(s, item).await?;
        debug!(notification = %item.name, %instance, "resolved destination instance");

        Ok(vec![Resolved::Target(SubscriptionTarget {
            name: item.name.clone(),
            desired: EventSubscription {
                subscription_id: None,
                name: item.name.clone(),
                description: item.description.clone(),
                subscription_endpoints: vec![SubscriptionEndpoint {
                    instance_id: Some(instance),
                    subscription_details: SubscriptionDetails {
                        connector_type: self.channel.connector_type().to_owned(),
                        ..Default::default()
                    },
                }],
                filter,
            },
        })])
    }

    async fn observe(
        &self,
        s: &Session<'_>,
        target: &SubscriptionTarget,
    ) -> Result<Option<EventSubscription>, CoreError> {
        observe_subscription(s, self.channel, &target.name).await
    }

    fn diff(
        &self,
        _s: &Session<'_>,
        target: &SubscriptionTarget,
        observed: Option<&EventSubscription>,
    ) -> Verdict<EventSubscription> {
        subscription_diff(&target.desired, observed)
    }

    async fn create(&self, s: &Session<'_>, batch: &[EventSubscription]) -> Result<(), CoreError> {
        let handle = s.client.create_event_subscriptions(self.channel, batch).await?;
        s.wait("event_management.create_event_subscriptions", &handle)
            .await?;
        Ok(())
    }

    async fn update(&self, s: &Session<'_>, batch: &[EventSubscription]) -> Result<(), CoreError> {
        let handle = s.client.update_event_subscriptions(self.channel, batch).await?;
        s.wait("event_management.update_event_subscriptions", &handle)
            .await?;
        Ok(())
    }

    async fn delete(
        &self,
        s: &Session<'_>,
        target: &SubscriptionTarget,
        observed: &EventSubscription,
    ) -> Result<Removal, CoreError> {
        delete_subscription(s, &target.name, observed).await
    }
}

// ── Email ────────────────────────────────────────────────────────────

pub(crate) struct EmailNotificationProfile;

impl Profile for EmailNotificationProfile {
    type Item = EmailNotificationSpec;
    type Target = SubscriptionTarget;
    type Observed = EventSubscription;
    type Payload = EventSubscription;

    fn kind(&self) -> ResourceKind {
        ResourceKind::EmailEventNotification
    }

    fn item_label(&self, item: &EmailNotificationSpec) -> String {
        item.filter.name.clone()
    }

    fn label(&self, target: &SubscriptionTarget) -> String {
        target.name.clone()
    }

    async fn resolve(
        &self,
        s: &Session<'_>,
        item: &EmailNotificationSpec,
    ) -> Result<Vec<Resolved<SubscriptionTarget>>, CoreError> {
        let name = &item.filter.name;
        if s.state() == State::Deleted {
            return Ok(vec![Resolved::Target(placeholder(name))]);
        }

        let instance_name = item.instance.clone().unwrap_or_default();
        let existing = instance_id(s, SubscriptionChannel::Email, &instance_name).await?;
        let filter = resolve_filter(s, &item.filter).await?;

        let endpoint = SubscriptionEndpoint {
            instance_id: existing,
            subscription_details: SubscriptionDetails {
                connector_type: SubscriptionChannel::Email.connector_type().to_owned(),
                name: Some(instance_name),
                description: item.instance_description.clone(),
                from_email_address: item.sender_email.clone(),
                to_email_addresses: Some(item.recipient_emails.clone()),
                subject: item.subject.clone(),
            },
        };

        Ok(vec![Resolved::Target(SubscriptionTarget {
            name: name.clone(),
            desired: EventSubscription {
                subscription_id: None,
                name: name.clone(),
                description: item.filter.description.clone(),
                subscription_endpoints: vec![endpoint],
                filter,
            },
        })])
    }

    async fn observe(
        &self,
        s: &Session<'_>,
        target: &SubscriptionTarget,
    ) -> Result<Option<EventSubscription>, CoreError> {
        observe_subscription(s, SubscriptionChannel::Email, &target.name).await
    }

    fn diff(
        &self,
        _s: &Session<'_>,
        target: &SubscriptionTarget,
        observed: Option<&EventSubscription>,
    ) -> Verdict<EventSubscription> {
        subscription_diff(&target.desired, observed)
    }

    async fn create(&self, s: &Session<'_>, batch: &[EventSubscription]) -> Result<(), CoreError> {
        let handle = s
            .client
            .create_event_subscriptions(SubscriptionChannel::Email, batch)
            .await?;
        s.wait("event_management.create_email_event_subscription", &handle)
            .await?;
        Ok(())
    }

    async fn update(&self, s: &Session<'_>, batch: &[EventSubscription]) -> Result<(), CoreError> {
        let handle = s
            .client
            .update_event_subscriptions(SubscriptionChannel::Email, batch)
            .await?;
        s.wait("event_management.update_email_event_subscription", &handle)
            .await?;
        Ok(())
    }

    async fn delete(
        &self,
        s: &Session<'_>,
        target: &SubscriptionTarget,
        observed: &EventSubscription,
    ) -> Result<Removal, CoreError> {
        delete_subscription(s, &target.name, observed).await
    }
}
