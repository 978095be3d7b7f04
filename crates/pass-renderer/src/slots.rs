//! Typed binding of attendee data to template slots

use chrono::NaiveDate;
use pass_common::copy;

use crate::error::{RenderError, RenderResult};
use crate::qr::QrMatrix;
use crate::render::{PassData, PhotoRef, SiteInfo};
use crate::template::Layout;
use crate::text;

/// Named regions of a pass template.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Slot {
    Watermark,
    Photo,
    Logo,
    Quote,
    Verse,
    Name,
    PassId,
    Footer,
}

impl Slot {
    /// Paint order.
    pub const ALL: [Slot; 8] = [
        Slot::Watermark,
        Slot::Photo,
        Slot::Logo,
        Slot::Quote,
        Slot::Verse,
        Slot::Name,
        Slot::PassId,
        Slot::Footer,
    ];

    /// Element id used in the output document.
    pub fn element_id(self) -> &'static str {
        match self {
            Slot::Watermark => "slot-watermark",
            Slot::Photo => "slot-photo",
            Slot::Logo => "slot-logo",
            Slot::Quote => "slot-quote",
            Slot::Verse => "slot-verse",
            Slot::Name => "slot-name",
            Slot::PassId => "slot-pass-id",
            Slot::Footer => "slot-footer",
        }
    }
}

/// Content of the square slot near the top of the pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PhotoSlot {
    /// Attendee selfie, as an embeddable `data:` URI
    Photo { href: String },
    /// Scannable code pointing at the hosted pass view
    Code { url: String, matrix: QrMatrix },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerseBlock {
    pub lines: Vec<String>,
    pub reference: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Footer {
    pub updated: String,
    pub site: String,
}

/// Every data-bearing slot, filled. Static artwork slots (logo, watermark)
/// need no binding.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SlotMap {
    pub photo: PhotoSlot,
    pub quote: Vec<String>,
    pub verse: VerseBlock,
    pub name: String,
    pub pass_id: String,
    pub footer: Footer,
}

impl SlotMap {
    pub fn bind(
        data: &PassData,
        photo: Option<&PhotoRef>,
        layout: &Layout,
        site: &SiteInfo,
        updated_on: NaiveDate,
    ) -> RenderResult<Self> {
        let pass_id = required(data.pass_id.as_deref()).ok_or(RenderError::MissingData("pass id"))?;

        let first = required(data.first_name.as_deref()).ok_or(RenderError::MissingData("first name"))?;
        let last = required(data.last_name.as_deref()).ok_or(RenderError::MissingData("last name"))?;
        let name = text::fit_line(&format!("{} {}", first, last), layout.name.max_chars);

        let photo = match photo {
            Some(photo) => PhotoSlot::Photo {
                href: photo.href().to_string(),
            },
            None => {
                let url = site.pass_url(pass_id);
                let matrix = QrMatrix::encode(&url)?;
                PhotoSlot::Code { url, matrix }
            }
        };

        let message = copy::or_default(data.message.as_deref(), copy::DEFAULT_MESSAGE);
        let quote = text::wrap(
            &format!("\u{201C}{message}\u{201D}"),
            layout.quote.max_chars,
            layout.quote.max_lines,
        );

        let verse_text = copy::or_default(data.verse.as_deref(), copy::DEFAULT_VERSE_TEXT);
        let reference =
            copy::or_default(data.verse_reference.as_deref(), copy::DEFAULT_VERSE_REFERENCE);
        let verse = VerseBlock {
            lines: text::wrap(&verse_text, layout.verse.max_chars, layout.verse.max_lines),
            reference,
        };

        let footer = Footer {
            updated: format!("Updated {}", updated_on.format("%B %-d, %Y")),
            site: text::fit_line(&site.display_site(), layout.footer.max_chars),
        };

        Ok(Self {
            photo,
            quote,
            verse,
            name,
            pass_id: pass_id.to_string(),
            footer,
        })
    }
}

fn required(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::template::TemplateKey;

    fn site() -> SiteInfo {
        SiteInfo::new("https://pass.example.org/", "https://www.example.org")
    }

    fn data() -> PassData {
        PassData {
            pass_id: Some("KAIROS-1234".to_string()),
            first_name: Some("Ada".to_string()),
            last_name: Some("Lovelace".to_string()),
            ..PassData::default()
        }
    }

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 3, 7).unwrap()
    }

    #[test]
    fn test_missing_pass_id() {
        let mut d = data();
        d.pass_id = Some("  ".to_string());
        let err = SlotMap::bind(&d, None, &TemplateKey::Story.layout(), &site(), date()).unwrap_err();
        assert!(matches!(err, RenderError::MissingData("pass id")));
    }

    #[test]
    fn test_missing_name_parts() {
        let mut d = data();
        d.first_name = None;
        let err = SlotMap::bind(&d, None, &TemplateKey::Story.layout(), &site(), date()).unwrap_err();
        assert!(matches!(err, RenderError::MissingData("first name")));

        let mut d = data();
        d.last_name = Some(" ".to_string());
        let err = SlotMap::bind(&d, None, &TemplateKey::Story.layout(), &site(), date()).unwrap_err();
        assert!(matches!(err, RenderError::MissingData("last name")));
    }

    #[test]
    fn test_name_is_trimmed_and_joined() {
        let mut d = data();
        d.first_name = Some("  Ada ".to_string());
        let slots = SlotMap::bind(&d, None, &TemplateKey::Story.layout(), &site(), date()).unwrap();
        assert_eq!(slots.name, "Ada Lovelace");
    }

    #[test]
    fn test_long_name_is_shortened_to_fit() {
        let mut d = data();
        d.first_name = Some("Maximiliana Alexandrina".to_string());
        d.last_name = Some("Featherstonehaugh-Cholmondeley".to_string());

        for template in TemplateKey::ALL {
            let layout = template.layout();
            let slots = SlotMap::bind(&d, None, &layout, &site(), date()).unwrap();
            assert!(slots.name.chars().count() <= layout.name.max_chars, "{}", slots.name);
            assert!(slots.name.starts_with("Maximiliana"));
            assert!(slots.name.ends_with('…'));
        }
    }

    #[test]
    fn test_defaults_fill_copy() {
        let slots = SlotMap::bind(&data(), None, &TemplateKey::Story.layout(), &site(), date()).unwrap();
        assert_eq!(slots.verse.reference, copy::DEFAULT_VERSE_REFERENCE);
        assert!(slots.quote[0].starts_with('\u{201C}'));
        assert_eq!(slots.footer.updated, "Updated March 7, 2026");
        assert_eq!(slots.footer.site, "www.example.org");
    }

    #[test]
    fn test_code_points_at_pass_view() {
        let slots = SlotMap::bind(&data(), None, &TemplateKey::Card.layout(), &site(), date()).unwrap();
        match slots.photo {
            PhotoSlot::Code { url, matrix } => {
                assert_eq!(url, "https://pass.example.org/pass/KAIROS-1234");
                assert_eq!(matrix, QrMatrix::encode(&url).unwrap());
            }
            other => panic!("expected code, got {:?}", other),
        }
    }
}
