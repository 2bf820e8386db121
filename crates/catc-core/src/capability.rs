// Capability flags derived once from the controller release.
//
// Payload builders and differs consult these flags instead of comparing
// version strings inline.

use catc_api::ControllerVersion;
use serde::Serialize;

use crate::error::CoreError;

/// What the connected controller supports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Capabilities {
    pub version: ControllerVersion,
    /// Destinations, notifications and ITSM settings.
    pub events: bool,
    /// Fabric VLANs, layer-3 VNs and anycast gateways.
    pub sda: bool,
    /// `/sites/bulk`, per-node site endpoints and floor image upload.
    pub site_design: bool,
    /// Wireless flooding, resource guard and custom flooding addresses.
    pub flooding_controls: bool,
}

/// A controller surface gated by release.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Surface {
    Events,
    Sda,
    FloorImageUpload,
}

impl Surface {
    pub fn minimum(self) -> ControllerVersion {
        match self {
            Self::Events => ControllerVersion::EVENTS,
            Self::Sda | Self::FloorImageUpload => ControllerVersion::SDA,
        }
    }

    pub fn describe(self) -> &'static str {
        match self {
            Self::Events => "event destinations and notifications",
            Self::Sda => "SDA fabric VLANs, virtual networks and anycast gateways",
            Self::FloorImageUpload => "floor image upload",
        }
    }
}

impl Capabilities {
    pub fn from_version(version: ControllerVersion) -> Self {
        Self {
            version,
            events: version.at_least(ControllerVersion::EVENTS),
            sda: version.at_least(ControllerVersion::SDA),
            site_design: version.at_least(ControllerVersion::SDA),
            flooding_controls: version.at_least(ControllerVersion::FLOODING_CONTROLS),
        }
    }

    /// Fail with `VersionUnsupported` unless `surface` is available.
    pub fn require(&self, surface: Surface) -> Result<(), CoreError> {
        let required = surface.minimum();
        if self.version.at_least(required) {
            Ok(())
        } else {
            Err(CoreError::VersionUnsupported {
                feature: surface.describe().to_owned(),
                required,
                actual: self.version,
            })
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn flags_follow_release_thresholds() {
        let old = Capabilities::from_version(ControllerVersion::new(2, 3, 5, 3));
        assert!(old.events);
        assert!(!old.sda);
        assert!(!old.flooding_controls);

        let new = Capabilities::from_version(ControllerVersion::new(3, 1, 3, 0));
        assert!(new.sda && new.site_design && new.flooding_controls);
    }

    #[test]
    fn require_names_the_minimum_release() {
        let caps = Capabilities::from_version(ControllerVersion::new(2, 3, 3, 0));
        let err = caps.require(Surface::Events).unwrap_err();
        assert!(err.to_string().contains("2.3.5.3"));
        assert!(caps.require(Surface::Sda).is_err());
    }
}
