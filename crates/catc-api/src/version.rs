// Controller release versions ("2.3.7.6", "3.1.3.0", ...).

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// A dotted controller release number, compared component-wise.
///
/// Missing trailing components read as zero, so `2.3.7` equals `2.3.7.0`.
/// Build suffixes past the fourth component (`2.3.7.6.70045`) are ignored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ControllerVersion([u32; 4]);

impl ControllerVersion {
    /// Minimum release for the events and notifications surface.
    pub const EVENTS: Self = Self([2, 3, 5, 3]);

    /// Minimum release for the SDA fabric surface, the bulk site
    /// endpoints and floor image upload.
    pub const SDA: Self = Self([2, 3, 7, 6]);

    /// Minimum release for wireless flooding, resource guard and custom
    /// flooding addresses on fabric VLANs and anycast gateways.
    pub const FLOODING_CONTROLS: Self = Self([3, 1, 3, 0]);

    pub const fn new(major: u32, minor: u32, patch: u32, build: u32) -> Self {
        Self([major, minor, patch, build])
    }

    /// Whether this release is at least `min`.
    pub fn at_least(self, min: Self) -> bool {
        self >= min
    }
}

impl fmt::Display for ControllerVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let [a, b, c, d] = self.0;
        write!(f, "{a}.{b}.{c}.{d}")
    }
}

/// Error returned when a version string is not a dotted number.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid controller version '{0}': expected dotted numbers like 2.3.7.6")]
pub struct ParseVersionError(pub String);

impl FromStr for ControllerVersion {
    type Err = ParseVersionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        if trimmed.is_empty() {
            return Err(ParseVersionError(s.to_owned()));
        }

        let mut parts = [0u32; 4];
        for (idx, piece) in trimmed.split('.').enumerate() {
            let value: u32 = piece
                .parse()
                .map_err(|_| ParseVersionError(s.to_owned()))?;
            if let Some(slot) = parts.get_mut(idx) {
                *slot = value;
            }
        }
        Ok(Self(parts))
    }
}

impl Serialize for ControllerVersion {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for ControllerVersion {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn parses_short_and_long_forms() {
        assert_eq!(
            "2.3.7".parse::<ControllerVersion>().unwrap(),
            ControllerVersion::new(2, 3, 7, 0)
        );
        assert_eq!(
            "2.3.7.6.70045".parse::<ControllerVersion>().unwrap(),
            ControllerVersion::SDA
        );
    }

    #[test]
    fn rejects_garbage() {
        assert!("".parse::<ControllerVersion>().is_err());
        assert!("2.x.7".parse::<ControllerVersion>().is_err());
    }

    #[test]
    fn compares_numerically_not_lexically() {
        let v = "2.3.10.0".parse::<ControllerVersion>().unwrap();
        assert!(v.at_least(ControllerVersion::SDA));
        assert!(!ControllerVersion::SDA.at_least(ControllerVersion::FLOODING_CONTROLS));
        assert!(ControllerVersion::SDA.at_least(ControllerVersion::EVENTS));
    }

    #[test]
    fn displays_four_components() {
        assert_eq!(ControllerVersion::new(3, 1, 3, 0).to_string(), "3.1.3.0");
    }
}
