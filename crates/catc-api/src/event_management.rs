// Event management endpoints: destinations, the event catalogue and
// subscriptions.
//
// The destination endpoints wrap their listings in the
// `{apiStatus, errorMessage, statusMessage}` envelope; the catalogue and
// subscription endpoints return bare arrays. Mutations answer with an
// `executionId`/`statusUri` that is resolved through the events status API.

use reqwest::Method;

use crate::client::CatalystClient;
use crate::error::Error;
use crate::types::StatusEnvelope;
use crate::types::event::{
    DestinationInstance, EmailDestination, EventInfo, EventSubscription, SnmpDestination,
    SubscriptionChannel, SyslogDestination, WebhookDestination,
};
use crate::types::task::TaskHandle;

const WEBHOOK: &str = "dna/intent/api/v1/event/webhook";
const SYSLOG: &str = "dna/intent/api/v1/event/syslog-config";
const SNMP: &str = "dna/intent/api/v1/event/snmp-config";
const EMAIL: &str = "dna/intent/api/v1/event/email-config";
const EVENTS: &str = "dna/intent/api/v1/events";

/// Page size for listings that cannot be filtered by name server-side.
pub const DESTINATION_PAGE_SIZE: usize = 10;

/// Page size for the event catalogue.
pub const EVENT_PAGE_SIZE: usize = 50;

fn paging(offset: usize, limit: usize) -> [(&'static str, String); 2] {
    [("offset", offset.to_string()), ("limit", limit.to_string())]
}

impl CatalystClient {
    // ── Webhook ──────────────────────────────────────────────────────

    pub async fn get_webhook_destinations(
        &self,
        offset: usize,
        limit: usize,
    ) -> Result<Vec<WebhookDestination>, Error> {
        let env: StatusEnvelope<Vec<WebhookDestination>> = self
            .get(
                "event_management.get_webhook_destination",
                WEBHOOK,
                &paging(offset, limit),
            )
            .await?;
        Ok(env.status_message)
    }

    /// Page through webhook destinations until one named `name` is found.
    pub async fn find_webhook_destination(
        &self,
        name: &str,
    ) -> Result<Option<WebhookDestination>, Error> {
        self.find_paged(
            DESTINATION_PAGE_SIZE,
            |offset, limit| self.get_webhook_destinations(offset, limit),
            |w| w.name == name,
        )
        .await
    }

    pub async fn create_webhook_destination(
        &self,
        body: &WebhookDestination,
    ) -> Result<TaskHandle, Error> {
        self.mutate(
            "event_management.create_webhook_destination",
            Method::POST,
            WEBHOOK,
            &[],
            Some(body),
        )
        .await
    }

    /// `body.webhook_id` selects the record to update.
    pub async fn update_webhook_destination(
        &self,
        body: &WebhookDestination,
    ) -> Result<TaskHandle, Error> {
        self.mutate(
            "event_management.update_webhook_destination",
            Method::PUT,
            WEBHOOK,
            &[],
            Some(body),
        )
        .await
    }

    // ── Syslog ───────────────────────────────────────────────────────

    /// `GET /dna/intent/api/v1/event/syslog-config?name=`
    pub async fn get_syslog_destination(
        &self,
        name: &str,
    ) -> Result<Vec<SyslogDestination>, Error> {
        let env: StatusEnvelope<Vec<SyslogDestination>> = self
            .get(
                "event_management.get_syslog_destination",
                SYSLOG,
                &[("name", name.to_owned())],
            )
            .await?;
        Ok(env.status_message)
    }

    pub async fn create_syslog_destination(
        &self,
        body: &SyslogDestination,
    ) -> Result<TaskHandle, Error> {
        self.mutate(
            "event_management.create_syslog_destination",
            Method::POST,
            SYSLOG,
            &[],
            Some(body),
        )
        .await
    }

    pub async fn update_syslog_destination(
        &self,
        body: &SyslogDestination,
    ) -> Result<TaskHandle, Error> {
        self.mutate(
            "event_management.update_syslog_destination",
            Method::PUT,
            SYSLOG,
            &[],
            Some(body),
        )
        .await
    }

    // ── SNMP ─────────────────────────────────────────────────────────

    pub async fn get_snmp_destinations(
        &self,
        offset: usize,
        limit: usize,
    ) -> Result<Vec<SnmpDestination>, Error> {
        let env: StatusEnvelope<Vec<SnmpDestination>> = self
            .get(
                "event_management.get_snmp_destination",
                SNMP,
                &paging(offset, limit),
            )
            .await?;
        Ok(env.status_message)
    }

    pub async fn find_snmp_destination(
        &self,
        name: &str,
    ) -> Result<Option<SnmpDestination>, Error> {
        self.find_paged(
            DESTINATION_PAGE_SIZE,
            |offset, limit| self.get_snmp_destinations(offset, limit),
            |s| s.name == name,
        )
        .await
    }

    pub async fn create_snmp_destination(
        &self,
        body: &SnmpDestination,
    ) -> Result<TaskHandle, Error> {
        self.mutate(
            "event_management.create_snmp_destination",
            Method::POST,
            SNMP,
            &[],
            Some(body),
        )
        .await
    }

    pub async fn update_snmp_destination(
        &self,
        body: &SnmpDestination,
    ) -> Result<TaskHandle, Error> {
        self.mutate(
            "event_management.update_snmp_destination",
            Method::PUT,
            SNMP,
            &[],
            Some(body),
        )
        .await
    }

    // ── Email ────────────────────────────────────────────────────────

    /// The controller holds at most one email configuration.
    pub async fn get_email_destination(&self) -> Result<Option<EmailDestination>, Error> {
        let configs: Vec<EmailDestination> = self
            .get("event_management.get_email_destination", EMAIL, &[])
            .await?;
        Ok(configs.into_iter().next())
    }

    pub async fn create_email_destination(
        &self,
        body: &EmailDestination,
    ) -> Result<TaskHandle, Error> {
        self.mutate(
            "event_management.create_email_destination",
            Method::POST,
            EMAIL,
            &[],
            Some(body),
        )
        .await
    }

    pub async fn update_email_destination(
        &self,
        body: &EmailDestination,
    ) -> Result<TaskHandle, Error> {
        self.mutate(
            "event_management.update_email_destination",
            Method::PUT,
            EMAIL,
            &[],
            Some(body),
        )
        .await
    }

    // ── Event catalogue ──────────────────────────────────────────────

    /// `GET /dna/intent/api/v1/events?tags=ASSURANCE&offset=&limit=`
    pub async fn get_events(&self, offset: usize, limit: usize) -> Result<Vec<EventInfo>, Error> {
        let [offset, limit] = paging(offset, limit);
        self.get(
            "event_management.get_events",
            EVENTS,
            &[("tags", "ASSURANCE".to_owned()), offset, limit],
        )
        .await
    }

    /// Resolve an event name to its id by scanning the catalogue.
    pub async fn find_event_by_name(&self, name: &str) -> Result<Option<EventInfo>, Error> {
        self.find_paged(
            EVENT_PAGE_SIZE,
            |offset, limit| self.get_events(offset, limit),
            |e| e.name == name,
        )
        .await
    }

    // ── Subscriptions ────────────────────────────────────────────────

    /// `GET /dna/intent/api/v1/event/subscription-details/{channel}?name=`
    pub async fn get_destination_instances(
        &self,
        channel: SubscriptionChannel,
        name: &str,
    ) -> Result<Vec<DestinationInstance>, Error> {
        self.get(
            "event_management.get_subscription_details",
            &format!("dna/intent/api/v1/event/subscription-details/{channel}"),
            &[("name", name.to_owned())],
        )
        .await
    }

    /// `GET /dna/intent/api/v1/event/subscription/{channel}?name=`
    pub async fn get_event_subscriptions(
        &self,
        channel: SubscriptionChannel,
        name: &str,
    ) -> Result<Vec<EventSubscription>, Error> {
        self.get(
            "event_management.get_event_subscriptions",
            &format!("dna/intent/api/v1/event/subscription/{channel}"),
            &[("name", name.to_owned())],
        )
        .await
    }

    pub async fn create_event_subscriptions(
        &self,
        channel: SubscriptionChannel,
        batch: &[EventSubscription],
    ) -> Result<TaskHandle, Error> {
        self.mutate(
            "event_management.create_event_subscriptions",
            Method::POST,
            &format!("dna/intent/api/v1/event/subscription/{channel}"),
            &[],
            Some(batch),
        )
        .await
    }

    pub async fn update_event_subscriptions(
        &self,
        channel: SubscriptionChannel,
        batch: &[EventSubscription],
    ) -> Result<TaskHandle, Error> {
        self.mutate(
            "event_management.update_event_subscriptions",
            Method::PUT,
            &format!("dna/intent/api/v1/event/subscription/{channel}"),
            &[],
            Some(batch),
        )
        .await
    }

    /// `DELETE /dna/intent/api/v1/event/subscription?subscriptions={id}`
    pub async fn delete_event_subscription(
        &self,
        subscription_id: &str,
    ) -> Result<TaskHandle, Error> {
        self.mutate::<()>(
            "event_management.delete_event_subscriptions",
            Method::DELETE,
            "dna/intent/api/v1/event/subscription",
            &[("subscriptions", subscription_id.to_owned())],
            None,
        )
        .await
    }
}
