use crate::config::ThemeConfig;
use anyhow::{anyhow, Result};
use crossterm::style::{Attribute, Color, ContentStyle, SetAttribute, Stylize};
use std::str::FromStr;

pub fn reset() -> String {
    SetAttribute(Attribute::Reset).to_string()
}

pub fn faint() -> String {
    SetAttribute(Attribute::Dim).to_string()
}

pub fn parse_color(text: &str) -> Result<Color> {
    ratatui::style::Color::from_str(text.trim())
        .map(Color::from)
        .map_err(|_| anyhow!("invalid color {:?} (use #rrggbb)", text))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Paint(ContentStyle);

impl Paint {
    pub fn new() -> Self {
        Paint::default()
    }

    pub fn fg(self, color: Color) -> Self {
        Paint(self.0.with(color))
    }

    pub fn bg(self, color: Color) -> Self {
        Paint(self.0.on(color))
    }

    pub fn bold(self) -> Self {
        Paint(self.0.bold())
    }

    pub fn faint(self) -> Self {
        Paint(self.0.dim())
    }

    pub fn italic(self) -> Self {
        Paint(self.0.italic())
    }

    pub fn underline(self) -> Self {
        Paint(self.0.underlined())
    }

    pub fn paint(&self, text: &str) -> String {
        if text.is_empty() {
            return String::new();
        }
        self.0.apply(text).to_string()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Theme {
    pub primary: Color,
    pub primary_fg: Color,
    pub secondary: Color,
    pub secondary_fg: Color,
    pub accent: Color,
    pub destructive: Color,
    pub today: Color,
    pub muted: Color,
    pub text: Color,
    pub surface: Color,
}

impl Theme {
    pub fn from_config(config: &ThemeConfig) -> Result<Theme> {
        Ok(Theme {
            primary: parse_color(&config.primary)?,
            primary_fg: parse_color(&config.primary_fg)?,
            secondary: parse_color(&config.secondary)?,
            secondary_fg: parse_color(&config.secondary_fg)?,
            accent: parse_color(&config.accent)?,
            destructive: parse_color(&config.destructive)?,
            today: parse_color(&config.today)?,
            muted: parse_color(&config.muted)?,
            text: parse_color(&config.text)?,
            surface: parse_color(&config.surface)?,
        })
    }

    pub fn badge(&self) -> Paint {
        Paint::new().bg(self.primary).fg(self.primary_fg).bold()
    }

    pub fn highlight(&self) -> Paint {
        Paint::new().bg(self.secondary).fg(self.primary_fg)
    }

    pub fn header(&self) -> Paint {
        Paint::new().bg(self.secondary).fg(self.primary_fg).bold()
    }

    pub fn footer(&self) -> Paint {
        Paint::new().fg(self.accent)
    }

    pub fn choice(&self) -> Paint {
        Paint::new().fg(self.secondary).bold()
    }

    pub fn label(&self) -> Paint {
        Paint::new().fg(self.muted).bold()
    }

    pub fn value(&self) -> Paint {
        Paint::new().fg(self.text)
    }

    pub fn hint(&self) -> Paint {
        Paint::new().faint()
    }

    pub fn danger(&self) -> Paint {
        Paint::new().fg(self.destructive).bold()
    }

    pub fn active_button(&self) -> Paint {
        Paint::new().bg(self.secondary).fg(self.secondary_fg).bold()
    }

    pub fn inactive_button(&self) -> Paint {
        Paint::new().bg(self.surface).fg(Color::White)
    }
}

fn rgb(r: u8, g: u8, b: u8) -> Color {
    Color::Rgb { r, g, b }
}

impl Default for Theme {
    fn default() -> Self {
        Theme {
            primary: rgb(129, 140, 248),
            primary_fg: rgb(16, 16, 16),
            secondary: rgb(45, 212, 191),
            secondary_fg: rgb(0, 0, 0),
            accent: rgb(252, 211, 77),
            destructive: rgb(248, 113, 113),
            today: rgb(244, 114, 182),
            muted: rgb(98, 114, 164),
            text: rgb(248, 248, 242),
            surface: rgb(39, 39, 42),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn parses_hex_colors() {
        assert_eq!(parse_color("#818cf8").unwrap(), rgb(0x81, 0x8c, 0xf8));
        assert_eq!(parse_color(" #2dd4bf ").unwrap(), rgb(0x2d, 0xd4, 0xbf));
        assert!(parse_color("#12345").is_err());
        assert!(parse_color("#zzzzzz").is_err());
    }

    #[test]
    fn paint_emits_sgr_and_resets() {
        let styled = Paint::new().fg(rgb(1, 2, 3)).bold().paint("hi");
        assert_eq!(styled, "\x1b[38;2;1;2;3m\x1b[1mhi\x1b[0m");
        let colored = Paint::new().fg(rgb(1, 2, 3)).paint("hi");
        assert_eq!(colored, "\x1b[38;2;1;2;3mhi\x1b[39m");
        assert_eq!(Paint::new().paint("plain"), "plain");
        assert_eq!(Paint::new().bold().paint(""), "");
    }

    #[test]
    fn reset_and_faint_sequences() {
        assert_eq!(reset(), "\x1b[0m");
        assert_eq!(faint(), "\x1b[2m");
    }

    #[test]
    fn default_theme_matches_default_config() {
        let theme = Theme::from_config(&ThemeConfig::default()).unwrap();
        assert_eq!(theme, Theme::default());
    }
}
