//! Vector artwork embedded in every pass

use std::fmt::Write;

use crate::template::SlotBox;

/// Native size of the wordmark artwork.
pub const LOGO_VIEWBOX: (f32, f32) = (400.0, 130.0);

/// Native size of the emblem used for the watermark.
pub const EMBLEM_VIEWBOX: (f32, f32) = (96.0, 96.0);

pub const FONT_FAMILY: &str = "Helvetica, Arial, sans-serif";

/// Event wordmark: emblem on the left, name and tagline on the right.
pub fn logo(out: &mut String, area: SlotBox, color: &str) -> std::fmt::Result {
    let sx = area.width / LOGO_VIEWBOX.0;
    let sy = area.height / LOGO_VIEWBOX.1;
    write!(
        out,
        r#"<g id="slot-logo" transform="translate({} {}) scale({} {})" fill="{color}">"#,
        area.x, area.y, sx, sy
    )?;
    write!(out, r#"<g transform="translate(8 17)">"#)?;
    emblem_shapes(out, color)?;
    out.push_str("</g>");
    write!(
        out,
        r#"<text x="124" y="78" font-family="{FONT_FAMILY}" font-size="64" font-weight="700" letter-spacing="6">KAIROS</text>"#
    )?;
    write!(
        out,
        r#"<text x="128" y="112" font-family="{FONT_FAMILY}" font-size="22" letter-spacing="8">THE APPOINTED TIME</text>"#
    )?;
    out.push_str("</g>");
    Ok(())
}

/// Small emblem in the top-left corner.
pub fn watermark(out: &mut String, area: SlotBox, color: &str) -> std::fmt::Result {
    let sx = area.width / EMBLEM_VIEWBOX.0;
    let sy = area.height / EMBLEM_VIEWBOX.1;
    write!(
        out,
        r#"<g id="slot-watermark" transform="translate({} {}) scale({} {})" opacity="0.55">"#,
        area.x, area.y, sx, sy
    )?;
    emblem_shapes(out, color)?;
    out.push_str("</g>");
    Ok(())
}

fn emblem_shapes(out: &mut String, color: &str) -> std::fmt::Result {
    write!(
        out,
        r#"<circle cx="48" cy="48" r="44" fill="none" stroke="{color}" stroke-width="6"/>"#
    )?;
    write!(
        out,
        r#"<path d="M34 22v52M34 48l24-26M38 46l22 28" fill="none" stroke="{color}" stroke-width="8" stroke-linecap="round" stroke-linejoin="round"/>"#
    )
}
