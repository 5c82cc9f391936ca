use log::warn;
use ratatui::style::Color;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Theme {
    pub name: &'static str,
    pub accent: Color,
    pub user: Color,
    pub assistant: Color,
    pub muted: Color,
    pub bar: Color,
    pub text: Color,
    pub border: Color,
}

impl Theme {
    pub const MIDNIGHT: Theme = Theme {
        name: "midnight",
        accent: Color::Yellow,
        user: Color::Cyan,
        assistant: Color::Magenta,
        muted: Color::Gray,
        bar: Color::Green,
        text: Color::White,
        border: Color::DarkGray,
    };

    pub const DAYLIGHT: Theme = Theme {
        name: "daylight",
        accent: Color::Blue,
        user: Color::Blue,
        assistant: Color::Red,
        muted: Color::DarkGray,
        bar: Color::Blue,
        text: Color::Black,
        border: Color::Gray,
    };

    pub fn by_name(name: &str) -> Option<Theme> {
        match name.trim().to_ascii_lowercase().as_str() {
            "midnight" | "dark" => Some(Self::MIDNIGHT),
            "daylight" | "light" => Some(Self::DAYLIGHT),
            _ => None,
        }
    }

    /// Unknown names fall back to midnight with a warning
    pub fn resolve(name: &str) -> Theme {
        Self::by_name(name).unwrap_or_else(|| {
            warn!("unknown theme '{name}', using midnight");
            Self::MIDNIGHT
        })
    }
}

impl Default for Theme {
    fn default() -> Self {
        Self::MIDNIGHT
    }
}
