//! Pass templates and their fixed slot geometry

use crate::error::{RenderError, RenderResult};
use crate::slots::Slot;

/// Absolute rectangle in template coordinates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SlotBox {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl SlotBox {
    pub const fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    pub fn center_x(&self) -> f32 {
        self.x + self.width / 2.0
    }

    pub fn right(&self) -> f32 {
        self.x + self.width
    }

    pub fn bottom(&self) -> f32 {
        self.y + self.height
    }
}

/// Text region plus the typography used to fill it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TextBox {
    pub area: SlotBox,
    pub font_size: f32,
    pub line_height: f32,
    /// Wrap width in characters
    pub max_chars: usize,
    pub max_lines: usize,
}

/// Geometry for every slot of a template.
///
/// One field per [`Slot`]. Composition places every slot through
/// [`Layout::area`], which matches exhaustively, so adding a slot without
/// geometry does not compile. The [`TextBox`] fields carry typography and
/// the character limits applied when slots are bound.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Layout {
    pub width: u32,
    pub height: u32,
    pub corner_radius: f32,
    pub watermark: SlotBox,
    pub photo: SlotBox,
    pub logo: SlotBox,
    pub quote: TextBox,
    pub verse: TextBox,
    pub name: TextBox,
    pub pass_id: TextBox,
    pub footer: TextBox,
}

impl Layout {
    pub fn area(&self, slot: Slot) -> SlotBox {
        match slot {
            Slot::Watermark => self.watermark,
            Slot::Photo => self.photo,
            Slot::Logo => self.logo,
            Slot::Quote => self.quote.area,
            Slot::Verse => self.verse.area,
            Slot::Name => self.name.area,
            Slot::PassId => self.pass_id.area,
            Slot::Footer => self.footer.area,
        }
    }
}

/// Known pass templates.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum TemplateKey {
    /// Portrait 1080x1920, phone wallpaper / story format
    #[default]
    Story,
    /// 1080x1350 feed card
    Card,
}

impl TemplateKey {
    pub const ALL: [TemplateKey; 2] = [TemplateKey::Story, TemplateKey::Card];

    pub fn parse(key: &str) -> RenderResult<Self> {
        let key = key.trim();
        TemplateKey::ALL
            .into_iter()
            .find(|template| template.key().eq_ignore_ascii_case(key))
            .ok_or_else(|| RenderError::TemplateNotFound(key.to_string()))
    }

    pub fn key(self) -> &'static str {
        match self {
            TemplateKey::Story => "story",
            TemplateKey::Card => "card",
        }
    }

    pub fn layout(self) -> Layout {
        match self {
            TemplateKey::Story => STORY,
            TemplateKey::Card => CARD,
        }
    }
}

const STORY: Layout = Layout {
    width: 1080,
    height: 1920,
    corner_radius: 36.0,
    watermark: SlotBox::new(48.0, 48.0, 96.0, 96.0),
    photo: SlotBox::new(240.0, 200.0, 600.0, 600.0),
    logo: SlotBox::new(340.0, 850.0, 400.0, 130.0),
    quote: TextBox {
        area: SlotBox::new(110.0, 1040.0, 860.0, 220.0),
        font_size: 44.0,
        line_height: 58.0,
        max_chars: 34,
        max_lines: 4,
    },
    verse: TextBox {
        area: SlotBox::new(130.0, 1300.0, 820.0, 260.0),
        font_size: 34.0,
        line_height: 46.0,
        max_chars: 44,
        max_lines: 4,
    },
    name: TextBox {
        area: SlotBox::new(72.0, 1660.0, 560.0, 120.0),
        font_size: 56.0,
        line_height: 64.0,
        max_chars: 18,
        max_lines: 1,
    },
    pass_id: TextBox {
        area: SlotBox::new(648.0, 1660.0, 360.0, 120.0),
        font_size: 44.0,
        line_height: 64.0,
        max_chars: 14,
        max_lines: 1,
    },
    footer: TextBox {
        area: SlotBox::new(72.0, 1830.0, 936.0, 40.0),
        font_size: 26.0,
        line_height: 32.0,
        max_chars: 40,
        max_lines: 1,
    },
};

const CARD: Layout = Layout {
    width: 1080,
    height: 1350,
    corner_radius: 28.0,
    watermark: SlotBox::new(40.0, 40.0, 80.0, 80.0),
    photo: SlotBox::new(320.0, 110.0, 440.0, 440.0),
    logo: SlotBox::new(380.0, 585.0, 320.0, 104.0),
    quote: TextBox {
        area: SlotBox::new(110.0, 730.0, 860.0, 150.0),
        font_size: 38.0,
        line_height: 50.0,
        max_chars: 40,
        max_lines: 3,
    },
    verse: TextBox {
        area: SlotBox::new(130.0, 900.0, 820.0, 180.0),
        font_size: 30.0,
        line_height: 40.0,
        max_chars: 48,
        max_lines: 3,
    },
    name: TextBox {
        area: SlotBox::new(64.0, 1130.0, 560.0, 100.0),
        font_size: 48.0,
        line_height: 56.0,
        max_chars: 20,
        max_lines: 1,
    },
    pass_id: TextBox {
        area: SlotBox::new(656.0, 1130.0, 360.0, 100.0),
        font_size: 38.0,
        line_height: 56.0,
        max_chars: 16,
        max_lines: 1,
    },
    footer: TextBox {
        area: SlotBox::new(64.0, 1280.0, 952.0, 36.0),
        font_size: 24.0,
        line_height: 30.0,
        max_chars: 44,
        max_lines: 1,
    },
};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_known_and_unknown() {
        assert_eq!(TemplateKey::parse("story").unwrap(), TemplateKey::Story);
        assert_eq!(TemplateKey::parse(" CARD ").unwrap(), TemplateKey::Card);

        let err = TemplateKey::parse("poster").unwrap_err();
        assert!(matches!(err, RenderError::TemplateNotFound(ref k) if k == "poster"));
    }

    #[test]
    fn test_every_slot_fits_the_canvas() {
        for template in TemplateKey::ALL {
            let layout = template.layout();
            for slot in Slot::ALL {
                let area = layout.area(slot);
                assert!(area.x >= 0.0 && area.y >= 0.0, "{:?} {:?}", template, slot);
                assert!(area.right() <= layout.width as f32, "{:?} {:?}", template, slot);
                assert!(area.bottom() <= layout.height as f32, "{:?} {:?}", template, slot);
            }
        }
    }

    #[test]
    fn test_photo_slot_is_square_and_centered() {
        for template in TemplateKey::ALL {
            let layout = template.layout();
            assert_eq!(layout.photo.width, layout.photo.height);
            assert_eq!(layout.photo.center_x(), layout.width as f32 / 2.0);
            assert!(layout.photo.y < layout.logo.y);
        }
    }
}
