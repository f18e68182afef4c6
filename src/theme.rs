use ratatui::style::{Color, Modifier, Style};
use serde::{Deserialize, Serialize};

/// Light/dark mode, persisted under the `theme_mode` storage key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ThemeMode {
    Light,
    #[default]
    Dark,
}

impl ThemeMode {
    pub fn toggle(&self) -> ThemeMode {
        match self {
            ThemeMode::Light => ThemeMode::Dark,
            ThemeMode::Dark => ThemeMode::Light,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ThemeMode::Light => "light",
            ThemeMode::Dark => "dark",
        }
    }

    pub fn parse(s: &str) -> Option<ThemeMode> {
        match s {
            "light" => Some(ThemeMode::Light),
            "dark" => Some(ThemeMode::Dark),
            _ => None,
        }
    }
}

/// Badge coloring classes, mapped from the status-like values the tables
/// show. The mapping is by display text so the table core stays ignorant
/// of the domain enums.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tone {
    Success,
    Info,
    Warning,
    Danger,
    Muted,
}

impl Tone {
    pub fn for_badge(text: &str) -> Tone {
        match text {
            "Active" | "Completed" | "In Stock" => Tone::Success,
            "Pending" | "Low Stock" => Tone::Warning,
            "Cancelled" | "Out of Stock" => Tone::Danger,
            "Inactive" => Tone::Muted,
            _ => Tone::Info,
        }
    }
}

fn rgb(hex: u32) -> Color {
    Color::Rgb(
        ((hex >> 16) & 0xff) as u8,
        ((hex >> 8) & 0xff) as u8,
        (hex & 0xff) as u8,
    )
}

/// Resolved colors for one theme mode.
#[derive(Debug, Clone, Copy)]
pub struct Palette {
    pub bg: Color,
    pub panel: Color,
    pub text: Color,
    pub text_dim: Color,
    pub text_muted: Color,
    pub border: Color,
    pub accent: Color,
    pub success: Color,
    pub warning: Color,
    pub danger: Color,
    pub info: Color,
    pub selection_bg: Color,
}

impl Palette {
    pub fn for_mode(mode: ThemeMode) -> Palette {
        match mode {
            ThemeMode::Dark => Palette {
                bg: rgb(0x0b111a),
                panel: rgb(0x111a26),
                text: rgb(0xe6edf7),
                text_dim: rgb(0xb7c6d9),
                text_muted: rgb(0x7f8ba0),
                border: rgb(0x2a3646),
                accent: rgb(0x5cb0ff),
                success: rgb(0x3fb68b),
                warning: rgb(0xf7c843),
                danger: rgb(0xf0635c),
                info: rgb(0x64b5f6),
                selection_bg: rgb(0x1d2c3f),
            },
            ThemeMode::Light => Palette {
                bg: rgb(0xf8fbff),
                panel: rgb(0xffffff),
                text: rgb(0x0c1625),
                text_dim: rgb(0x2c3a4f),
                text_muted: rgb(0x5b6678),
                border: rgb(0xc9d2de),
                accent: rgb(0x2563eb),
                success: rgb(0x0ea66c),
                warning: rgb(0xd97706),
                danger: rgb(0xe11d48),
                info: rgb(0x2196f3),
                selection_bg: rgb(0xdbe7f5),
            },
        }
    }

    pub fn tone(&self, tone: Tone) -> Color {
        match tone {
            Tone::Success => self.success,
            Tone::Info => self.info,
            Tone::Warning => self.warning,
            Tone::Danger => self.danger,
            Tone::Muted => self.text_muted,
        }
    }

    pub fn base(&self) -> Style {
        Style::new().fg(self.text).bg(self.bg)
    }

    pub fn panel_style(&self) -> Style {
        Style::new().fg(self.text).bg(self.panel)
    }

    pub fn dim(&self) -> Style {
        Style::new().fg(self.text_muted)
    }

    pub fn heading(&self) -> Style {
        Style::new().fg(self.text).add_modifier(Modifier::BOLD)
    }

    pub fn accent_style(&self) -> Style {
        Style::new().fg(self.accent)
    }

    pub fn selected(&self) -> Style {
        Style::new().bg(self.selection_bg).add_modifier(Modifier::BOLD)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn toggle_flips_and_roundtrips() {
        let m = ThemeMode::Light;
        assert_eq!(m.toggle(), ThemeMode::Dark);
        assert_eq!(m.toggle().toggle(), m);
        assert_eq!(ThemeMode::parse(ThemeMode::Dark.as_str()), Some(ThemeMode::Dark));
        assert_eq!(ThemeMode::parse("sepia"), None);
    }

    #[test]
    fn badge_tones_follow_status_text() {
        assert_eq!(Tone::for_badge("Completed"), Tone::Success);
        assert_eq!(Tone::for_badge("Pending"), Tone::Warning);
        assert_eq!(Tone::for_badge("Cancelled"), Tone::Danger);
        assert_eq!(Tone::for_badge("Inactive"), Tone::Muted);
        assert_eq!(Tone::for_badge("Admin"), Tone::Info);
    }
}
