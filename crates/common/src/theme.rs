//! Closed set of pass color themes.

use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::warn;

/// Named palette applied to the pass background.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    #[default]
    Midnight,
    Gold,
    Ocean,
    Forest,
    Crimson,
    Violet,
}

/// Colors used by the renderer, as SVG hex strings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Palette {
    pub background_top: &'static str,
    pub background_bottom: &'static str,
    pub accent: &'static str,
    pub text: &'static str,
    pub muted: &'static str,
}

impl Theme {
    pub const ALL: [Theme; 6] = [
        Theme::Midnight,
        Theme::Gold,
        Theme::Ocean,
        Theme::Forest,
        Theme::Crimson,
        Theme::Violet,
    ];

    pub fn key(self) -> &'static str {
        match self {
            Theme::Midnight => "midnight",
            Theme::Gold => "gold",
            Theme::Ocean => "ocean",
            Theme::Forest => "forest",
            Theme::Crimson => "crimson",
            Theme::Violet => "violet",
        }
    }

    /// Strict lookup, case-insensitive.
    pub fn parse(key: &str) -> Option<Theme> {
        let key = key.trim();
        Theme::ALL
            .into_iter()
            .find(|theme| theme.key().eq_ignore_ascii_case(key))
    }

    /// Lenient lookup used on the rendering path: unknown keys render with
    /// the default palette instead of failing.
    pub fn from_key(key: Option<&str>) -> Theme {
        match key {
            None => Theme::default(),
            Some(k) if k.trim().is_empty() => Theme::default(),
            Some(k) => Theme::parse(k).unwrap_or_else(|| {
                warn!("Unknown theme '{}', using '{}'", k, Theme::default());
                Theme::default()
            }),
        }
    }

    pub fn palette(self) -> Palette {
        match self {
            Theme::Midnight => Palette {
                background_top: "#1B2140",
                background_bottom: "#0A0D1C",
                accent: "#E8C872",
                text: "#FFFFFF",
                muted: "#A9B0CC",
            },
            Theme::Gold => Palette {
                background_top: "#F6D77A",
                background_bottom: "#C8912E",
                accent: "#3A2405",
                text: "#2A1A03",
                muted: "#5E4213",
            },
            Theme::Ocean => Palette {
                background_top: "#2C8FC7",
                background_bottom: "#0B3C63",
                accent: "#9BE3FF",
                text: "#FFFFFF",
                muted: "#C3E4F5",
            },
            Theme::Forest => Palette {
                background_top: "#3F7D4E",
                background_bottom: "#173624",
                accent: "#D8F0B5",
                text: "#FFFFFF",
                muted: "#BFD9C4",
            },
            Theme::Crimson => Palette {
                background_top: "#C23B4B",
                background_bottom: "#5E0F1D",
                accent: "#FFD7A8",
                text: "#FFFFFF",
                muted: "#F2C1C7",
            },
            Theme::Violet => Palette {
                background_top: "#8A5CD1",
                background_bottom: "#34195E",
                accent: "#F3D9FF",
                text: "#FFFFFF",
                muted: "#D9C8F0",
            },
        }
    }
}

impl fmt::Display for Theme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_is_case_insensitive() {
        assert_eq!(Theme::parse("Ocean"), Some(Theme::Ocean));
        assert_eq!(Theme::parse(" GOLD "), Some(Theme::Gold));
        assert_eq!(Theme::parse("teal"), None);
    }

    #[test]
    fn test_unknown_key_falls_back_to_default() {
        assert_eq!(Theme::from_key(Some("oceann")), Theme::Midnight);
        assert_eq!(Theme::from_key(None), Theme::Midnight);
        assert_eq!(Theme::from_key(Some("")), Theme::Midnight);
        assert_eq!(Theme::from_key(Some("forest")), Theme::Forest);
    }

    #[test]
    fn test_serde_uses_lowercase_keys() {
        let json = serde_json::to_string(&Theme::Crimson).unwrap();
        assert_eq!(json, "\"crimson\"");
        let theme: Theme = serde_json::from_str("\"violet\"").unwrap();
        assert_eq!(theme, Theme::Violet);
    }
}
