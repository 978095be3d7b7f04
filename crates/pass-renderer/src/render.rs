//! Document composition

use base64::{engine::general_purpose::STANDARD, Engine as _};
use chrono::NaiveDate;
use pass_common::{AttendeeRecord, Palette, Theme};
use serde::{Deserialize, Serialize};
use std::fmt::Write;
use tracing::debug;

use crate::assets::{self, FONT_FAMILY};
use crate::error::{RenderError, RenderResult};
use crate::qr::QrMatrix;
use crate::slots::{Footer, PhotoSlot, Slot, SlotMap, VerseBlock};
use crate::template::{Layout, SlotBox, TemplateKey, TextBox};
use crate::text::escape;

/// Attendee snapshot as accepted by the renderer. Everything is optional at
/// the type level; [`render_pass`] reports what is missing.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PassData {
    #[serde(default, alias = "id")]
    pub pass_id: Option<String>,
    #[serde(default)]
    pub first_name: Option<String>,
    #[serde(default)]
    pub last_name: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub verse: Option<String>,
    #[serde(default)]
    pub verse_reference: Option<String>,
}

impl From<&AttendeeRecord> for PassData {
    fn from(record: &AttendeeRecord) -> Self {
        Self {
            pass_id: Some(record.pass_id.clone()),
            first_name: Some(record.first_name.clone()),
            last_name: Some(record.last_name.clone()),
            message: Some(record.message.clone()),
            verse: Some(record.verse_text.clone()),
            verse_reference: Some(record.verse_reference.clone()),
        }
    }
}

/// Embeddable photo, always a `data:image/...` URI so the document stays
/// self-contained.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PhotoRef(String);

impl PhotoRef {
    pub fn from_bytes(mime: &str, bytes: &[u8]) -> Self {
        Self(format!("data:{};base64,{}", mime, STANDARD.encode(bytes)))
    }

    pub fn from_data_uri(uri: &str) -> RenderResult<Self> {
        let uri = uri.trim();
        let valid = uri
            .strip_prefix("data:image/")
            .and_then(|rest| rest.split_once(";base64,"))
            .is_some_and(|(_, payload)| !payload.is_empty());

        if valid {
            Ok(Self(uri.to_string()))
        } else {
            Err(RenderError::InvalidPhoto(
                "expected a base64 data:image/* URI".to_string(),
            ))
        }
    }

    pub fn href(&self) -> &str {
        &self.0
    }
}

/// Site-wide values printed on or encoded into every pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SiteInfo {
    /// Base URL of the hosted pass view, without trailing slash
    pub public_base_url: String,
    /// Site shown in the footer
    pub site_url: String,
}

impl SiteInfo {
    pub fn new(public_base_url: impl Into<String>, site_url: impl Into<String>) -> Self {
        Self {
            public_base_url: public_base_url.into().trim_end_matches('/').to_string(),
            site_url: site_url.into(),
        }
    }

    pub fn pass_url(&self, pass_id: &str) -> String {
        format!("{}/pass/{}", self.public_base_url, pass_id)
    }

    /// Footer form of the site URL: no scheme, no trailing slash.
    pub fn display_site(&self) -> String {
        let site = self.site_url.trim();
        let site = site
            .strip_prefix("https://")
            .or_else(|| site.strip_prefix("http://"))
            .unwrap_or(site);
        site.trim_end_matches('/').to_string()
    }
}

#[derive(Debug, Clone)]
pub struct RenderRequest {
    pub template: String,
    pub data: PassData,
    pub theme: Theme,
    pub photo: Option<PhotoRef>,
    /// Output size in pixels; defaults to the template canvas
    pub size: Option<(u32, u32)>,
    /// Date printed in the footer
    pub updated_on: NaiveDate,
}

impl RenderRequest {
    pub fn new(template: impl Into<String>, data: PassData, updated_on: NaiveDate) -> Self {
        Self {
            template: template.into(),
            data,
            theme: Theme::default(),
            photo: None,
            size: None,
            updated_on,
        }
    }

    /// Resolve a loosely-typed color key, falling back to the default theme.
    pub fn with_color(mut self, color: Option<&str>) -> Self {
        self.theme = Theme::from_key(color);
        self
    }

    pub fn with_theme(mut self, theme: Theme) -> Self {
        self.theme = theme;
        self
    }

    pub fn with_photo(mut self, photo: Option<PhotoRef>) -> Self {
        self.photo = photo;
        self
    }

    pub fn with_size(mut self, width: u32, height: u32) -> Self {
        self.size = Some((width, height));
        self
    }
}

/// A fully bound pass document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedPass {
    pub template: TemplateKey,
    pub pass_id: String,
    pub width: u32,
    pub height: u32,
    pub svg: String,
}

impl RenderedPass {
    /// Wrap the SVG in a minimal HTML page sized to the pass.
    pub fn to_html(&self) -> String {
        format!(
            concat!(
                "<!DOCTYPE html><html lang=\"en\"><head><meta charset=\"utf-8\">",
                "<meta name=\"viewport\" content=\"width=device-width, initial-scale=1\">",
                "<title>Pass {id}</title>",
                "<style>html,body{{margin:0;padding:0;background:#000}}",
                "svg{{display:block;margin:0 auto;max-width:100%;height:auto}}</style>",
                "</head><body>{svg}</body></html>"
            ),
            id = escape(&self.pass_id),
            svg = self.svg,
        )
    }
}

/// Render a pass to SVG.
pub fn render_pass(request: &RenderRequest, site: &SiteInfo) -> RenderResult<RenderedPass> {
    let template = TemplateKey::parse(&request.template)?;
    let layout = template.layout();

    let (width, height) = request.size.unwrap_or((layout.width, layout.height));
    if width == 0 || height == 0 {
        return Err(RenderError::InvalidSize { width, height });
    }

    let slots = SlotMap::bind(
        &request.data,
        request.photo.as_ref(),
        &layout,
        site,
        request.updated_on,
    )?;

    let svg = compose(template, &layout, request.theme.palette(), &slots, width, height)?;

    debug!(
        "Rendered {} pass for {} ({} bytes)",
        template.key(),
        slots.pass_id,
        svg.len()
    );

    Ok(RenderedPass {
        template,
        pass_id: slots.pass_id,
        width,
        height,
        svg,
    })
}

fn compose(
    template: TemplateKey,
    layout: &Layout,
    palette: Palette,
    slots: &SlotMap,
    width: u32,
    height: u32,
) -> Result<String, std::fmt::Error> {
    let mut out = String::with_capacity(16 * 1024);

    write!(
        out,
        r#"<svg xmlns="http://www.w3.org/2000/svg" xmlns:xlink="http://www.w3.org/1999/xlink" width="{width}" height="{height}" viewBox="0 0 {} {}" data-template="{}" data-pass-id="{}">"#,
        layout.width,
        layout.height,
        template.key(),
        escape(&slots.pass_id)
    )?;

    let photo = layout.area(Slot::Photo);
    write!(
        out,
        concat!(
            r#"<defs><linearGradient id="bg" x1="0" y1="0" x2="0" y2="1">"#,
            r#"<stop offset="0" stop-color="{top}"/><stop offset="1" stop-color="{bottom}"/>"#,
            r#"</linearGradient><clipPath id="photo-clip">"#,
            r#"<rect x="{x}" y="{y}" width="{w}" height="{h}" rx="{r}" ry="{r}"/>"#,
            r#"</clipPath></defs>"#
        ),
        top = palette.background_top,
        bottom = palette.background_bottom,
        x = photo.x,
        y = photo.y,
        w = photo.width,
        h = photo.height,
        r = layout.corner_radius,
    )?;
    write!(
        out,
        r#"<rect x="0" y="0" width="{}" height="{}" fill="url(#bg)"/>"#,
        layout.width, layout.height
    )?;

    for slot in Slot::ALL {
        let area = layout.area(slot);
        match slot {
            Slot::Watermark => assets::watermark(&mut out, area, palette.accent)?,
            Slot::Photo => photo_slot(&mut out, area, layout.corner_radius, palette, &slots.photo)?,
            Slot::Logo => assets::logo(&mut out, area, palette.accent)?,
            Slot::Quote => centered_lines(
                &mut out,
                slot,
                area,
                &layout.quote,
                &slots.quote,
                palette.text,
                Tone::Bold,
            )?,
            Slot::Verse => verse_block(&mut out, area, &layout.verse, palette, &slots.verse)?,
            Slot::Name => labeled_value(&mut out, slot, area, &layout.name, &slots.name, palette)?,
            Slot::PassId => {
                labeled_value(&mut out, slot, area, &layout.pass_id, &slots.pass_id, palette)?
            }
            Slot::Footer => footer(&mut out, area, &layout.footer, palette, &slots.footer)?,
        }
    }

    out.push_str("</svg>");
    Ok(out)
}

fn photo_slot(
    out: &mut String,
    area: SlotBox,
    corner_radius: f32,
    palette: Palette,
    content: &PhotoSlot,
) -> std::fmt::Result {
    match content {
        PhotoSlot::Photo { href } => {
            write!(
                out,
                r#"<g id="{}" data-content="photo" clip-path="url(#photo-clip)">"#,
                Slot::Photo.element_id()
            )?;
            write!(
                out,
                r#"<image x="{}" y="{}" width="{}" height="{}" preserveAspectRatio="xMidYMid slice" xlink:href="{}"/>"#,
                area.x,
                area.y,
                area.width,
                area.height,
                escape(href)
            )?;
            out.push_str("</g>");
        }
        PhotoSlot::Code { url, matrix } => {
            write!(
                out,
                r#"<g id="{}" data-content="code" data-value="{}">"#,
                Slot::Photo.element_id(),
                escape(url)
            )?;
            write!(
                out,
                r##"<rect x="{}" y="{}" width="{}" height="{}" rx="{r}" ry="{r}" fill="#FFFFFF"/>"##,
                area.x,
                area.y,
                area.width,
                area.height,
                r = corner_radius
            )?;
            qr_code(out, area.x, area.y, area.width, matrix)?;
            out.push_str("</g>");
        }
    }

    // Frame on top so photos and codes share the same edge
    write!(
        out,
        r#"<rect x="{}" y="{}" width="{}" height="{}" rx="{r}" ry="{r}" fill="none" stroke="{}" stroke-width="6"/>"#,
        area.x,
        area.y,
        area.width,
        area.height,
        palette.accent,
        r = corner_radius
    )
}

fn qr_code(out: &mut String, x: f32, y: f32, size: f32, matrix: &QrMatrix) -> std::fmt::Result {
    // Inset so the rounded corners never clip modules
    let inset = size * 0.06;
    let scale = (size - 2.0 * inset) / matrix.padded_width() as f32;
    write!(
        out,
        r##"<path transform="translate({} {}) scale({})" d="{}" fill="#000000" shape-rendering="crispEdges"/>"##,
        x + inset,
        y + inset,
        scale,
        matrix.path_data()
    )
}

#[derive(Clone, Copy)]
enum Tone {
    Bold,
    Italic,
}

fn centered_lines(
    out: &mut String,
    slot: Slot,
    area: SlotBox,
    text_box: &TextBox,
    lines: &[String],
    color: &str,
    tone: Tone,
) -> std::fmt::Result {
    let (weight, style) = match tone {
        Tone::Bold => ("700", None),
        Tone::Italic => ("400", Some("italic")),
    };
    write!(
        out,
        r#"<g id="{}" font-family="{FONT_FAMILY}" font-size="{}" font-weight="{weight}" fill="{color}" text-anchor="middle""#,
        slot.element_id(),
        text_box.font_size
    )?;
    if let Some(style) = style {
        write!(out, r#" font-style="{style}""#)?;
    }
    out.push('>');
    for (i, line) in lines.iter().enumerate() {
        write!(
            out,
            r#"<text x="{}" y="{}">{}</text>"#,
            area.center_x(),
            area.y + text_box.font_size + i as f32 * text_box.line_height,
            escape(line)
        )?;
    }
    out.push_str("</g>");
    Ok(())
}

fn verse_block(
    out: &mut String,
    area: SlotBox,
    verse: &TextBox,
    palette: Palette,
    block: &VerseBlock,
) -> std::fmt::Result {
    centered_lines(out, Slot::Verse, area, verse, &block.lines, palette.muted, Tone::Italic)?;

    let reference_y =
        area.y + verse.font_size + block.lines.len() as f32 * verse.line_height + verse.font_size * 0.4;
    write!(
        out,
        r#"<text id="slot-verse-reference" x="{}" y="{}" font-family="{FONT_FAMILY}" font-size="{}" font-weight="700" fill="{}" text-anchor="middle" letter-spacing="2">{}</text>"#,
        area.center_x(),
        reference_y,
        verse.font_size * 0.9,
        palette.accent,
        escape(&block.reference.to_uppercase())
    )
}

/// Caption plus value; the attendee name hangs left, the pass id right.
fn labeled_value(
    out: &mut String,
    slot: Slot,
    area: SlotBox,
    text_box: &TextBox,
    value: &str,
    palette: Palette,
) -> std::fmt::Result {
    let (label, x, anchor) = match slot {
        Slot::PassId => ("PASS ID", area.right(), "end"),
        _ => ("ATTENDEE", area.x, "start"),
    };
    let label_size = (text_box.font_size * 0.42).round();

    // Values are bound to fit; a pass id is never shortened, so it shrinks
    let chars = value.chars().count();
    let font_size = if chars > text_box.max_chars {
        (text_box.font_size * text_box.max_chars as f32 / chars as f32).floor()
    } else {
        text_box.font_size
    };

    write!(
        out,
        r#"<g id="{}" font-family="{FONT_FAMILY}" text-anchor="{anchor}">"#,
        slot.element_id()
    )?;
    write!(
        out,
        r#"<text x="{x}" y="{}" font-size="{label_size}" fill="{}" letter-spacing="4">{}</text>"#,
        area.y + label_size,
        palette.muted,
        escape(label)
    )?;
    write!(
        out,
        r#"<text x="{x}" y="{}" font-size="{}" font-weight="700" fill="{}">{}</text>"#,
        area.y + label_size + text_box.line_height,
        font_size,
        palette.text,
        escape(value)
    )?;
    out.push_str("</g>");
    Ok(())
}

fn footer(
    out: &mut String,
    area: SlotBox,
    text_box: &TextBox,
    palette: Palette,
    content: &Footer,
) -> std::fmt::Result {
    let baseline = area.y + text_box.font_size;
    write!(
        out,
        r#"<g id="{}" font-family="{FONT_FAMILY}" font-size="{}" fill="{}">"#,
        Slot::Footer.element_id(),
        text_box.font_size,
        palette.muted
    )?;
    write!(
        out,
        r#"<text x="{}" y="{baseline}" text-anchor="start">{}</text>"#,
        area.x,
        escape(&content.updated)
    )?;
    write!(
        out,
        r#"<text x="{}" y="{baseline}" text-anchor="end">{}</text>"#,
        area.right(),
        escape(&content.site)
    )?;
    out.push_str("</g>");
    Ok(())
}
