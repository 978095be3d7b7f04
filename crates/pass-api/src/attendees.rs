//! Attendee registration and staff export

use chrono::Utc;
use pass_common::copy::{self, DEFAULT_MESSAGE, DEFAULT_VERSE_REFERENCE, DEFAULT_VERSE_TEXT};
use pass_common::pass_id::{SHORT_DIGITS, WIDE_DIGITS};
use pass_common::{AttendeeRecord, AttendeeView, Error, PassId, Result, Theme};
use serde::Deserialize;
use tracing::{info, warn};

use crate::storage::AttendeeStore;

/// Short identifiers tried before falling back to a wide one.
pub const MAX_ID_ATTEMPTS: usize = 8;

/// Registration form as posted by the client.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewAttendee {
    #[serde(default)]
    pub first_name: Option<String>,
    #[serde(default)]
    pub last_name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default, alias = "referralSource")]
    pub heard_about_us: Option<String>,
    #[serde(default)]
    pub verse_reference: Option<String>,
    #[serde(default, alias = "verseText")]
    pub verse: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default, alias = "theme")]
    pub color: Option<String>,
}

fn required(value: Option<&str>, field: &str) -> Result<String> {
    match value.map(str::trim) {
        Some(v) if !v.is_empty() => Ok(v.to_string()),
        _ => Err(Error::validation(format!("Missing required field: {}", field))),
    }
}

fn optional(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

impl NewAttendee {
    /// Validate the form and build a record for `pass_id`.
    fn into_record(self, pass_id: &PassId) -> Result<AttendeeRecord> {
        let first_name = required(self.first_name.as_deref(), "firstName")?;
        let last_name = required(self.last_name.as_deref(), "lastName")?;
        let email = required(self.email.as_deref(), "email")?;
        if !email.contains('@') {
            return Err(Error::validation(format!("Invalid email address: {}", email)));
        }

        Ok(AttendeeRecord {
            pass_id: pass_id.to_string(),
            first_name,
            last_name,
            email,
            phone: optional(self.phone.as_deref()),
            referral_source: optional(self.heard_about_us.as_deref()),
            verse_reference: copy::or_default(self.verse_reference.as_deref(), DEFAULT_VERSE_REFERENCE),
            verse_text: copy::or_default(self.verse.as_deref(), DEFAULT_VERSE_TEXT),
            message: copy::or_default(self.message.as_deref(), DEFAULT_MESSAGE),
            theme: Theme::from_key(self.color.as_deref()),
            created_at: Utc::now(),
        })
    }
}

/// Validate and store a registration under a freshly allocated pass id.
pub async fn register(
    store: &dyn AttendeeStore,
    prefix: &str,
    form: NewAttendee,
) -> Result<AttendeeRecord> {
    // Validate before touching the store
    let mut record = form.into_record(&PassId::generate(prefix, SHORT_DIGITS))?;

    for attempt in 0..=MAX_ID_ATTEMPTS {
        if attempt > 0 {
            let digits = if attempt == MAX_ID_ATTEMPTS {
                WIDE_DIGITS
            } else {
                SHORT_DIGITS
            };
            record.pass_id = PassId::generate(prefix, digits).into_string();
        }

        if store.create(&record).await? {
            info!("Created pass {} for {}", record.pass_id, record.full_name());
            return Ok(record);
        }
        warn!("Pass id collision on {}, retrying", record.pass_id);
    }

    Err(Error::Storage(
        "Could not allocate a unique pass identifier".to_string(),
    ))
}

const CSV_HEADER: [&str; 12] = [
    "pass_id",
    "first_name",
    "last_name",
    "full_name",
    "email",
    "phone",
    "heard_about_us",
    "color",
    "verse_reference",
    "verse",
    "message",
    "registered_at",
];

fn csv_field(value: &str) -> String {
    if value.contains([',', '"', '\n', '\r']) {
        format!("\"{}\"", value.replace('"', "\"\""))
    } else {
        value.to_string()
    }
}

/// Render records as CSV with CRLF line endings.
pub fn to_csv(records: &[AttendeeRecord]) -> String {
    let mut out = CSV_HEADER.join(",");
    out.push_str("\r\n");

    for record in records {
        let view = AttendeeView::from(record);
        let registered_at = view.registered_at.to_rfc3339();
        let row = [
            view.pass_id.as_str(),
            view.first_name.as_str(),
            view.last_name.as_str(),
            view.full_name.as_str(),
            view.email.as_str(),
            view.phone.as_deref().unwrap_or(""),
            view.heard_about_us.as_deref().unwrap_or(""),
            view.color.key(),
            view.verse_reference.as_str(),
            view.verse.as_str(),
            view.message.as_str(),
            registered_at.as_str(),
        ];
        let fields: Vec<String> = row.iter().map(|v| csv_field(v)).collect();
        out.push_str(&fields.join(","));
        out.push_str("\r\n");
    }

    out
}
