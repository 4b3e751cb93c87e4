//! Structured JSON payloads stored in `JSONB` columns.

use serde::{Deserialize, Serialize};

/// Shipping address captured at checkout.
///
/// Stored verbatim on the order so later profile changes never rewrite history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShippingAddress {
    pub street: String,
    pub city: String,
    pub state: String,
    pub zip: String,
    pub country: String,
}

impl ShippingAddress {
    /// Names of required fields that are blank.
    #[must_use]
    pub fn missing_fields(&self) -> Vec<&'static str> {
        [
            ("street", &self.street),
            ("city", &self.city),
            ("state", &self.state),
            ("zip", &self.zip),
            ("country", &self.country),
        ]
        .into_iter()
        .filter(|(_, value)| value.trim().is_empty())
        .map(|(name, _)| name)
        .collect()
    }
}

/// Per-serving nutrition facts. Every field is optional free text
/// (e.g. `"12g"`), as entered in the admin product form.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NutritionalInfo {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub calories: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub protein: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub carbs: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fat: Option<String>,
}

impl NutritionalInfo {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.calories.is_none() && self.protein.is_none() && self.carbs.is_none() && self.fat.is_none()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn address() -> ShippingAddress {
        ShippingAddress {
            street: "1 Carrot Way".to_owned(),
            city: "Portland".to_owned(),
            state: "OR".to_owned(),
            zip: "97201".to_owned(),
            country: "US".to_owned(),
        }
    }

    #[test]
    fn test_missing_fields() {
        assert!(address().missing_fields().is_empty());
        let mut blank = address();
        blank.city = "  ".to_owned();
        blank.zip = String::new();
        assert_eq!(blank.missing_fields(), vec!["city", "zip"]);
    }

    #[test]
    fn test_nutritional_info_skips_missing() {
        let info = NutritionalInfo {
            calories: Some("40".to_owned()),
            ..Default::default()
        };
        assert_eq!(
            serde_json::to_string(&info).unwrap(),
            r#"{"calories":"40"}"#
        );
        let empty: NutritionalInfo = serde_json::from_str("{}").unwrap();
        assert!(empty.is_empty());
    }
}
