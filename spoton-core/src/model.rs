//! Response types returned by the resource clients.
//!
//! Optional fields are `Option`s: an absent field decodes to `None`, while a
//! present field with the wrong shape is a decode error.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A business location.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Location {
    pub id: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<Address>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub geolocation: Option<Geolocation>,
    /// IANA zone name, e.g. `America/Chicago`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timezone: Option<String>,
}

/// Postal address of a location.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Address {
    #[serde(rename = "address_line_1")]
    pub address_line1: String,
    #[serde(
        rename = "address_line_2",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub address_line2: Option<String>,
    pub city: String,
    pub state: String,
    pub zip: String,
    pub country: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Geolocation {
    pub latitude: f64,
    pub longitude: f64,
}

/// A menu published for a location.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Menu {
    pub id: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub active: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn full_location() -> Location {
        Location {
            id: "BL-1234-5678-9012".to_string(),
            name: "Downtown Bistro".to_string(),
            email: Some("owner@bistro.example".to_string()),
            phone: Some("+1-555-0100".to_string()),
            address: Some(Address {
                address_line1: "100 Main St".to_string(),
                address_line2: Some("Suite 2".to_string()),
                city: "Springfield".to_string(),
                state: "IL".to_string(),
                zip: "62701".to_string(),
                country: "US".to_string(),
            }),
            geolocation: Some(Geolocation {
                latitude: 39.7817,
                longitude: -89.6501,
            }),
            timezone: Some("America/Chicago".to_string()),
        }
    }

    #[test]
    fn test_location_with_all_optionals_round_trips() {
        let location = full_location();
        let encoded = serde_json::to_value(&location).unwrap();

        assert_eq!(encoded["address"]["address_line_1"], "100 Main St");
        assert_eq!(encoded["address"]["address_line_2"], "Suite 2");

        let decoded: Location = serde_json::from_value(encoded).unwrap();
        assert_eq!(decoded, location);
    }

    #[test]
    fn test_location_with_no_optionals_round_trips() {
        let location = Location {
            id: "BL-1234-5678-9012".to_string(),
            name: "Pop-up".to_string(),
            email: None,
            phone: None,
            address: None,
            geolocation: None,
            timezone: None,
        };
        let encoded = serde_json::to_value(&location).unwrap();
        assert_eq!(encoded, json!({"id": "BL-1234-5678-9012", "name": "Pop-up"}));

        let decoded: Location = serde_json::from_value(encoded).unwrap();
        assert_eq!(decoded, location);
    }

    #[test]
    fn test_location_accepts_null_optionals() {
        let decoded: Location = serde_json::from_value(json!({
            "id": "BL-1234-5678-9012",
            "name": "Pop-up",
            "email": null,
            "address": null
        }))
        .unwrap();
        assert!(decoded.email.is_none());
        assert!(decoded.address.is_none());
    }

    #[test]
    fn test_location_missing_required_field_fails() {
        let result = serde_json::from_value::<Location>(json!({"id": "BL-1234-5678-9012"}));
        assert!(result.is_err());
    }

    #[test]
    fn test_location_wrong_optional_shape_fails() {
        let result = serde_json::from_value::<Location>(json!({
            "id": "BL-1234-5678-9012",
            "name": "x",
            "geolocation": "somewhere"
        }));
        assert!(result.is_err());
    }

    #[test]
    fn test_menu_decodes() {
        let menu: Menu = serde_json::from_value(json!({
            "id": "menu-1",
            "name": "Lunch",
            "active": true,
            "updated_at": "2024-05-01T12:00:00Z"
        }))
        .unwrap();
        assert_eq!(menu.active, Some(true));
        assert!(menu.description.is_none());
        assert!(menu.updated_at.is_some());
    }
}
