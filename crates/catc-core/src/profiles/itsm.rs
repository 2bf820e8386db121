// ITSM integration instances (ServiceNow connections).

use catc_api::types::itsm::{ItsmConnection, ItsmData, ItsmInstance};
use tracing::info;

use super::drifts;
use crate::engine::profile::{Profile, Removal, Resolved, Verdict};
use crate::engine::session::Session;
use crate::error::CoreError;
use crate::lookup::absent_if_benign;
use crate::model::{ItsmSettingSpec, ResourceKind};

const DEFAULT_DYP_NAME: &str = "ServiceNowConnection";

pub(crate) struct ItsmProfile;

fn instance_payload(spec: &ItsmSettingSpec, current: Option<&ItsmInstance>) -> ItsmInstance {
    let base = current.cloned().unwrap_or_else(|| ItsmInstance {
        dyp_name: DEFAULT_DYP_NAME.to_owned(),
        ..Default::default()
    });
    let connection = match &spec.connection_settings {
        Some(c) => ItsmConnection {
            url: c.url.clone(),
            auth_user_name: c.username.clone(),
            auth_password: Some(c.password.clone()),
        },
        None => base.data.connection_settings,
    };
    ItsmInstance {
        id: base.id,
        name: spec.instance_name.clone(),
        description: spec.description.clone().or(base.description),
        dyp_name: base.dyp_name,
        data: ItsmData {
            connection_settings: connection,
        },
    }
}

/// The password is write-only on the controller and never compared.
fn instance_drifted(spec: &ItsmSettingSpec, current: &ItsmInstance) -> bool {
    let observed = &current.data.connection_settings;
    drifts(spec.description.as_deref(), current.description.as_deref())
        || spec.connection_settings.as_ref().is_some_and(|c| {
            c.url.trim_end_matches('/') != observed.url.trim_end_matches('/')
                || c.username != observed.auth_user_name
        })
}

impl Profile for ItsmProfile {
    type Item = ItsmSettingSpec;
    type Target = ItsmSettingSpec;
    type Observed = ItsmInstance;
    type Payload = ItsmInstance;

    fn kind(&self) -> ResourceKind {
        ResourceKind::ItsmSetting
    }

    fn item_label(&self, item: &ItsmSettingSpec) -> String {
        item.instance_name.clone()
    }

    fn label(&self, target: &ItsmSettingSpec) -> String {
        target.instance_name.clone()
    }

    async fn resolve(
        &self,
        _s: &Session<'_>,
        item: &ItsmSettingSpec,
    ) -> Result<Vec<Resolved<ItsmSettingSpec>>, CoreError> {
        Ok(vec![Resolved::Target(item.clone())])
    }

    async fn observe(
        &self,
        s: &Session<'_>,
        target: &ItsmSettingSpec,
    ) -> Result<Option<ItsmInstance>, CoreError> {
        let summary = absent_if_benign(s.client.get_all_itsm_instances().await)?
            .unwrap_or_default()
            .into_iter()
            .find(|i| i.name == target.instance_name);
        let Some(summary) = summary else {
            return Ok(None);
        };
        let mut instance = match absent_if_benign(s.client.get_itsm_instance(&summary.id).await)? {
            Some(instance) => instance,
            None => return Ok(None),
        };
        if instance.id.is_none() {
            instance.id = Some(summary.id);
        }
        Ok(Some(instance))
    }

    fn diff(
        &self,
        _s: &Session<'_>,
        target: &ItsmSettingSpec,
        observed: Option<&ItsmInstance>,
    ) -> Verdict<ItsmInstance> {
        match observed {
            None => Verdict::Create(instance_payload(target, None)),
            Some(current) if instance_drifted(target, current) => {
                Verdict::Drifted(instance_payload(target, Some(current)))
            }
            Some(_) => Verdict::Equal,
        }
    }

    async fn create(&self, s: &Session<'_>, batch: &[ItsmInstance]) -> Result<(), CoreError> {
        for body in batch {
            let handle = s.client.create_itsm_instance(body).await?;
            s.wait("itsm_integration.create_itsm_integration_setting", &handle)
                .await?;
        }
        Ok(())
    }

    async fn update(&self, s: &Session<'_>, batch: &[ItsmInstance]) -> Result<(), CoreError> {
        for body in batch {
            let Some(id) = body.id.as_deref() else {
                return Err(CoreError::Lookup {
                    message: format!("ITSM instance '{}' has no id", body.name),
                });
            };
            let handle = s.client.update_itsm_instance(id, body).await?;
            s.wait("itsm_integration.update_itsm_integration_setting", &handle)
                .await?;
        }
        Ok(())
    }

    async fn delete(
        &self,
        s: &Session<'_>,
        target: &ItsmSettingSpec,
        observed: &ItsmInstance,
    ) -> Result<Removal, CoreError> {
        let Some(id) = observed.id.as_deref() else {
            return Err(CoreError::Lookup {
                message: format!("ITSM instance '{}' has no id", target.instance_name),
            });
        };
        let handle = s.client.delete_itsm_instance(id).await?;
        s.wait("itsm_integration.delete_itsm_integration_setting", &handle)
            .await?;
        info!(instance = %target.instance_name, "ITSM instance deleted");
        Ok(Removal::Deleted)
    }
}
