//! Records shared by the renderer and the API service

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::theme::Theme;

/// Attendee registration record, in storage schema.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AttendeeRecord {
    /// Unique pass identifier, immutable once created
    pub pass_id: String,

    pub first_name: String,

    pub last_name: String,

    pub email: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,

    /// "How did you hear about us"
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub referral_source: Option<String>,

    pub verse_reference: String,

    pub verse_text: String,

    pub message: String,

    #[serde(default)]
    pub theme: Theme,

    /// When the attendee registered
    pub created_at: DateTime<Utc>,
}

impl AttendeeRecord {
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name.trim(), self.last_name.trim())
            .trim()
            .to_string()
    }
}

/// Display-schema projection of an [`AttendeeRecord`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AttendeeView {
    pub pass_id: String,
    pub full_name: String,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub heard_about_us: Option<String>,
    pub verse_reference: String,
    pub verse: String,
    pub message: String,
    pub color: Theme,
    pub registered_at: DateTime<Utc>,
}

impl From<&AttendeeRecord> for AttendeeView {
    fn from(record: &AttendeeRecord) -> Self {
        Self {
            pass_id: record.pass_id.clone(),
            full_name: record.full_name(),
            first_name: record.first_name.clone(),
            last_name: record.last_name.clone(),
            email: record.email.clone(),
            phone: record.phone.clone(),
            heard_about_us: record.referral_source.clone(),
            verse_reference: record.verse_reference.clone(),
            verse: record.verse_text.clone(),
            message: record.message.clone(),
            color: record.theme,
            registered_at: record.created_at,
        }
    }
}

/// Stored selfie for a pass.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PhotoAsset {
    pub pass_id: String,

    /// Object name inside the photo folder
    pub name: String,

    /// Path relative to the storage root
    pub path: String,

    /// Public URL the photo is served from
    pub url: String,

    pub created_at: DateTime<Utc>,

    pub size_bytes: u64,
}

/// Lowercased, trimmed email used for lookups.
pub fn normalize_email(email: &str) -> String {
    email.trim().to_ascii_lowercase()
}

/// Digits-only phone number used for lookups.
pub fn normalize_phone(phone: &str) -> String {
    phone.chars().filter(char::is_ascii_digit).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_record() -> AttendeeRecord {
        AttendeeRecord {
            pass_id: "KAIROS-1234".to_string(),
            first_name: "Ada".to_string(),
            last_name: "Lovelace".to_string(),
            email: "ada@example.com".to_string(),
            phone: Some("+44 20 7946 0018".to_string()),
            referral_source: Some("friend".to_string()),
            verse_reference: "Psalm 23:1".to_string(),
            verse_text: "The Lord is my shepherd".to_string(),
            message: "Welcome".to_string(),
            theme: Theme::Ocean,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_view_combines_names_and_renames_fields() {
        let record = sample_record();
        let view = AttendeeView::from(&record);
        assert_eq!(view.full_name, "Ada Lovelace");

        let json = serde_json::to_value(&view).unwrap();
        assert_eq!(json["passId"], "KAIROS-1234");
        assert_eq!(json["fullName"], "Ada Lovelace");
        assert_eq!(json["heardAboutUs"], "friend");
        assert_eq!(json["color"], "ocean");
        assert!(json.get("pass_id").is_none());
    }

    #[test]
    fn test_storage_schema_is_snake_case() {
        let json = serde_json::to_value(sample_record()).unwrap();
        assert_eq!(json["first_name"], "Ada");
        assert!(json["created_at"].is_string());
    }

    #[test]
    fn test_normalizers() {
        assert_eq!(normalize_email("  Ada@Example.COM "), "ada@example.com");
        assert_eq!(normalize_phone("+44 (20) 7946-0018"), "442079460018");
    }
}
