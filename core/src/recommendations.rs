use serde::{Deserialize, Serialize};
use serde_json::Value;
use utoipa::ToSchema;
use uuid::Uuid;

/// Questionnaire fields in the order they are reported when missing.
pub const QUESTIONNAIRE_FIELDS: [&str; 7] = [
    "relationship",
    "ageGroup",
    "gender",
    "occasion",
    "interests",
    "priceRange",
    "giftType",
];

/// Recipient preferences as submitted by a client.
///
/// Every field is optional at the wire level: `/api/generate` requires all of
/// them (see [`GiftPreferences::into_questionnaire`]), while chat messages may
/// carry any subset.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct GiftPreferences {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub relationship: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub age_group: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gender: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub occasion: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub interests: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub price_range: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gift_type: Option<String>,
}

/// A fully specified questionnaire. Every field is non-empty.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Questionnaire {
    pub relationship: String,
    pub age_group: String,
    pub gender: String,
    pub occasion: String,
    pub interests: String,
    pub price_range: String,
    pub gift_type: String,
}

impl GiftPreferences {
    /// Field values paired with their wire names, in [`QUESTIONNAIRE_FIELDS`] order.
    pub fn fields(&self) -> [(&'static str, Option<&str>); 7] {
        [
            (QUESTIONNAIRE_FIELDS[0], self.relationship.as_deref()),
            (QUESTIONNAIRE_FIELDS[1], self.age_group.as_deref()),
            (QUESTIONNAIRE_FIELDS[2], self.gender.as_deref()),
            (QUESTIONNAIRE_FIELDS[3], self.occasion.as_deref()),
            (QUESTIONNAIRE_FIELDS[4], self.interests.as_deref()),
            (QUESTIONNAIRE_FIELDS[5], self.price_range.as_deref()),
            (QUESTIONNAIRE_FIELDS[6], self.gift_type.as_deref()),
        ]
    }

    /// Names of fields that are absent or empty.
    pub fn missing_fields(&self) -> Vec<&'static str> {
        self.fields()
            .into_iter()
            .filter(|(_, value)| value.is_none_or(str::is_empty))
            .map(|(name, _)| name)
            .collect()
    }

    pub fn is_empty(&self) -> bool {
        self.fields().iter().all(|(_, value)| value.is_none())
    }

    /// Promote to a [`Questionnaire`], or return the missing field names.
    pub fn into_questionnaire(self) -> Result<Questionnaire, Vec<&'static str>> {
        let missing = self.missing_fields();
        if !missing.is_empty() {
            return Err(missing);
        }

        Ok(Questionnaire {
            relationship: self.relationship.unwrap_or_default(),
            age_group: self.age_group.unwrap_or_default(),
            gender: self.gender.unwrap_or_default(),
            occasion: self.occasion.unwrap_or_default(),
            interests: self.interests.unwrap_or_default(),
            price_range: self.price_range.unwrap_or_default(),
            gift_type: self.gift_type.unwrap_or_default(),
        })
    }
}

/// A validated gift suggestion that has not been stored yet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewRecommendation {
    pub gift_name: String,
    pub description: String,
    pub price_range: String,
    pub platform: String,
    pub product_image: String,
    pub search_url: String,
}

impl NewRecommendation {
    /// Build from one entry of the model's `recommendations` array.
    ///
    /// Returns `None` unless `gift_name`, `search_url` and `platform` hold a
    /// non-empty value. Numbers and booleans are kept as their JSON text; the
    /// display fields fall back to empty strings.
    pub fn from_model_entry(entry: &Value) -> Option<Self> {
        Some(Self {
            gift_name: required_text(entry, "gift_name")?,
            search_url: required_text(entry, "search_url")?,
            platform: required_text(entry, "platform")?,
            description: optional_text(entry, "description"),
            price_range: optional_text(entry, "price_range"),
            product_image: optional_text(entry, "product_image"),
        })
    }

    pub fn with_id(self, id: Uuid) -> Recommendation {
        Recommendation {
            id,
            gift_name: self.gift_name,
            description: self.description,
            price_range: self.price_range,
            platform: self.platform,
            product_image: self.product_image,
            search_url: self.search_url,
        }
    }
}

/// Scalar field as text. Null, empty strings and nested values count as absent.
fn scalar_text(value: &Value) -> Option<String> {
    match value {
        Value::String(text) if !text.is_empty() => Some(text.clone()),
        Value::Number(_) | Value::Bool(_) => Some(value.to_string()),
        _ => None,
    }
}

fn required_text(entry: &Value, key: &str) -> Option<String> {
    entry.get(key).and_then(scalar_text)
}

fn optional_text(entry: &Value, key: &str) -> String {
    required_text(entry, key).unwrap_or_default()
}

/// A stored gift suggestion. Immutable once written.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct Recommendation {
    /// Recommendation ID (UUIDv7)
    pub id: Uuid,
    pub gift_name: String,
    pub description: String,
    /// Free-form price band as written by the model, e.g. "₹500 - ₹1000"
    pub price_range: String,
    /// Shopping platform, e.g. "Amazon" or "Flipkart"
    pub platform: String,
    /// Image URL or a short visual description
    pub product_image: String,
    pub search_url: String,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct GenerateResponse {
    pub success: bool,
    pub recommendations: Vec<Recommendation>,
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn complete() -> GiftPreferences {
        GiftPreferences {
            relationship: Some("Friend".into()),
            age_group: Some("20-29".into()),
            gender: Some("Female".into()),
            occasion: Some("Birthday".into()),
            interests: Some("Music".into()),
            price_range: Some("₹500 - ₹1000".into()),
            gift_type: Some("Personalized".into()),
        }
    }

    #[test]
    fn complete_preferences_become_questionnaire() {
        let questionnaire = complete().into_questionnaire().unwrap();
        assert_eq!(questionnaire.occasion, "Birthday");
        assert_eq!(questionnaire.age_group, "20-29");
    }

    #[test]
    fn missing_fields_are_reported_in_canonical_order() {
        let prefs = GiftPreferences {
            gift_type: None,
            occasion: Some(String::new()),
            relationship: None,
            ..complete()
        };
        assert_eq!(
            prefs.into_questionnaire().unwrap_err(),
            vec!["relationship", "occasion", "giftType"]
        );
    }

    #[test]
    fn preferences_deserialize_from_camel_case() {
        let prefs: GiftPreferences = serde_json::from_value(json!({
            "ageGroup": "13-19",
            "priceRange": "₹0 - ₹500",
        }))
        .unwrap();
        assert_eq!(prefs.age_group.as_deref(), Some("13-19"));
        assert_eq!(prefs.price_range.as_deref(), Some("₹0 - ₹500"));
        assert!(prefs.relationship.is_none());
        assert!(!prefs.is_empty());
        assert!(GiftPreferences::default().is_empty());
    }

    #[test]
    fn model_entry_requires_link_fields() {
        let entry = json!({
            "gift_name": "Mug",
            "search_url": "http://x",
            "platform": "Amazon",
            "price_range": 499,
        });
        let rec = NewRecommendation::from_model_entry(&entry).unwrap();
        assert_eq!(rec.gift_name, "Mug");
        assert_eq!(rec.price_range, "499");
        assert_eq!(rec.description, "");

        let no_platform = json!({"gift_name": "Mug", "search_url": "http://x", "platform": ""});
        assert!(NewRecommendation::from_model_entry(&no_platform).is_none());
        let null_platform = json!({"gift_name": "Mug", "search_url": "http://x", "platform": null});
        assert!(NewRecommendation::from_model_entry(&null_platform).is_none());
        assert!(NewRecommendation::from_model_entry(&json!("Mug")).is_none());
    }

    #[test]
    fn numeric_gift_name_is_kept_as_text() {
        let entry = json!({
            "gift_name": 1984,
            "search_url": "https://www.amazon.in/s?k=1984",
            "platform": "Amazon",
            "description": true,
            "product_image": {"url": "cover.png"},
        });
        let rec = NewRecommendation::from_model_entry(&entry).unwrap();
        assert_eq!(rec.gift_name, "1984");
        assert_eq!(rec.description, "true");
        assert_eq!(rec.product_image, "");
    }
}
