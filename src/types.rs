// src/types.rs

use std::time::Duration;

use owo_colors::{AnsiColors, OwoColorize};
use serde::Deserialize;

/// Canonical application name type, the unique key of a configured app.
pub type AppName = String;

/// Display colour of an application's output prefix.
///
/// The names match the ones accepted in the configuration file, e.g.
/// `color = "cyan_light"`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum Color {
    Red,
    Green,
    Yellow,
    Blue,
    Purple,
    Cyan,
    Gray,
    RedLight,
    GreenLight,
    YellowLight,
    BlueLight,
    PurpleLight,
    CyanLight,
    White,
    #[default]
    Reset,
    Bold,
}

impl Color {
    fn ansi(self) -> Option<AnsiColors> {
        let color = match self {
            Color::Red => AnsiColors::Red,
            Color::Green => AnsiColors::Green,
            Color::Yellow => AnsiColors::Yellow,
            Color::Blue => AnsiColors::Blue,
            Color::Purple => AnsiColors::Magenta,
            Color::Cyan => AnsiColors::Cyan,
            Color::Gray => AnsiColors::White,
            Color::RedLight => AnsiColors::BrightRed,
            Color::GreenLight => AnsiColors::BrightGreen,
            Color::YellowLight => AnsiColors::BrightYellow,
            Color::BlueLight => AnsiColors::BrightBlue,
            Color::PurpleLight => AnsiColors::BrightMagenta,
            Color::CyanLight => AnsiColors::BrightCyan,
            Color::White => AnsiColors::BrightWhite,
            Color::Reset | Color::Bold => return None,
        };
        Some(color)
    }

    /// Wrap `text` in the ANSI sequences for this colour.
    pub fn paint(self, text: &str) -> String {
        match (self, self.ansi()) {
            (_, Some(ansi)) => text.color(ansi).to_string(),
            (Color::Bold, None) => text.bold().to_string(),
            _ => text.to_string(),
        }
    }
}

/// Parse a simple duration string like `"3s"`, `"250ms"`, `"1m"`, `"2h"`.
pub fn parse_duration(s: &str) -> Result<Duration, String> {
    let s = s.trim();
    if s.is_empty() {
        return Err("empty duration string".to_string());
    }

    // Find the boundary between digits and suffix.
    let idx = s
        .chars()
        .position(|c| !c.is_ascii_digit())
        .ok_or_else(|| "duration missing unit suffix".to_string())?;

    let (num_part, unit_part) = s.split_at(idx);
    let value: u64 = num_part
        .parse()
        .map_err(|e| format!("invalid duration number '{}': {}", num_part, e))?;
    let unit = unit_part.trim().to_lowercase();

    let secs_per_unit = match unit.as_str() {
        "ms" => return Ok(Duration::from_millis(value)),
        "s" => 1,
        "m" => 60,
        "h" => 60 * 60,
        _ => {
            return Err(format!(
                "unsupported duration unit '{}'; expected ms, s, m, or h",
                unit
            ));
        }
    };
    value
        .checked_mul(secs_per_unit)
        .map(Duration::from_secs)
        .ok_or_else(|| format!("duration '{}' is too large", s))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_supported_units() {
        assert_eq!(parse_duration("250ms"), Ok(Duration::from_millis(250)));
        assert_eq!(parse_duration("1s"), Ok(Duration::from_secs(1)));
        assert_eq!(parse_duration(" 2m "), Ok(Duration::from_secs(120)));
        assert_eq!(parse_duration("1h"), Ok(Duration::from_secs(3600)));
    }

    #[test]
    fn rejects_missing_or_unknown_units() {
        assert!(parse_duration("10").is_err());
        assert!(parse_duration("10d").is_err());
        assert!(parse_duration("").is_err());
    }

    #[test]
    fn rejects_values_too_large_for_their_unit() {
        assert!(parse_duration(&format!("{}h", u64::MAX)).is_err());
        assert!(parse_duration(&format!("{}m", u64::MAX / 60 + 1)).is_err());
        assert_eq!(
            parse_duration(&format!("{}s", u64::MAX)),
            Ok(Duration::from_secs(u64::MAX))
        );
    }

    #[test]
    fn reset_colour_leaves_text_untouched() {
        assert_eq!(Color::Reset.paint("api |"), "api |");
        assert_ne!(Color::Red.paint("api |"), "api |");
        assert!(Color::Red.paint("api |").contains("api |"));
    }

    #[test]
    fn colour_names_deserialize_in_snake_case() {
        #[derive(Deserialize)]
        struct ColourField {
            color: Color,
        }
        let parsed: ColourField = toml::from_str("color = \"purple_light\"").unwrap();
        assert_eq!(parsed.color, Color::PurpleLight);
    }
}
