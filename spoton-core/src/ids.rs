//! Resource identifiers validated before dispatch.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{Result, SpotOnError};

/// Identifier of a business location, shaped `BL-dddd-dddd-dddd`.
///
/// # Examples
///
/// ```
/// use spoton_core::LocationId;
///
/// let id = LocationId::parse("BL-1234-5678-9012").unwrap();
/// assert_eq!(id.as_str(), "BL-1234-5678-9012");
///
/// assert!(LocationId::parse("invalid-location-id").is_err());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct LocationId(String);

impl LocationId {
    pub const PREFIX: &'static str = "BL";
    const GROUPS: usize = 3;
    const GROUP_LEN: usize = 4;

    /// Parse and validate a location identifier.
    pub fn parse(raw: &str) -> Result<Self> {
        if Self::is_well_formed(raw) {
            Ok(Self(raw.to_string()))
        } else {
            Err(SpotOnError::validation(format!(
                "invalid location ID {:?}: expected {}-XXXX-XXXX-XXXX with digits",
                raw,
                Self::PREFIX
            )))
        }
    }

    fn is_well_formed(raw: &str) -> bool {
        let mut parts = raw.split('-');
        if parts.next() != Some(Self::PREFIX) {
            return false;
        }
        let groups: Vec<&str> = parts.collect();
        groups.len() == Self::GROUPS
            && groups
                .iter()
                .all(|g| g.len() == Self::GROUP_LEN && g.bytes().all(|b| b.is_ascii_digit()))
    }

    /// The identifier as sent on the wire.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for LocationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for LocationId {
    type Err = SpotOnError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl TryFrom<String> for LocationId {
    type Error = SpotOnError;

    fn try_from(value: String) -> Result<Self> {
        Self::parse(&value)
    }
}

impl From<LocationId> for String {
    fn from(id: LocationId) -> Self {
        id.0
    }
}

impl AsRef<str> for LocationId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_accepts_well_formed() {
        for raw in ["BL-1234-5678-9012", "BL-0000-0000-0000"] {
            assert_eq!(LocationId::parse(raw).unwrap().as_str(), raw);
        }
    }

    #[test]
    fn test_rejects_malformed() {
        let malformed = [
            "",
            "invalid-location-id",
            "BL-1234-5678",
            "BL-1234-5678-9012-3456",
            "bl-1234-5678-9012",
            "XX-1234-5678-9012",
            "BL-12345-678-9012",
            "BL-12a4-5678-9012",
            "BL-1234-5678-901",
            " BL-1234-5678-9012",
            "BL-1234-5678-9012 ",
            "BL--1234-5678-9012",
            "BL-１２３４-5678-9012",
        ];
        for raw in malformed {
            let err = LocationId::parse(raw).unwrap_err();
            assert_eq!(err.kind(), crate::ErrorKind::Validation, "{:?}", raw);
        }
    }

    #[test]
    fn test_serde_validates() {
        let id: LocationId = serde_json::from_str(r#""BL-1234-5678-9012""#).unwrap();
        assert_eq!(serde_json::to_string(&id).unwrap(), r#""BL-1234-5678-9012""#);
        assert!(serde_json::from_str::<LocationId>(r#""BL-nope""#).is_err());
    }
}
