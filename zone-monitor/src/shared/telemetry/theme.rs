//! Light and dark palettes

use ratatui::style::Color;

use crate::shared::aggregation::{Highlight, Pressure};

/// Dashboard colour scheme, toggled at runtime
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ThemeMode {
    #[default]
    Light,
    Dark,
}

impl ThemeMode {
    pub fn toggle(self) -> Self {
        match self {
            ThemeMode::Light => ThemeMode::Dark,
            ThemeMode::Dark => ThemeMode::Light,
        }
    }

    pub fn palette(&self) -> Palette {
        match self {
            ThemeMode::Light => Palette {
                bg: Color::Rgb(249, 250, 251),
                fg: Color::Rgb(31, 41, 55),
                dim: Color::Rgb(107, 114, 128),
                border: Color::Rgb(209, 213, 219),
                accent: Color::Rgb(37, 99, 235),
                row_alt: Color::Rgb(243, 244, 246),
                max: Color::Rgb(59, 130, 246),
                min: Color::Rgb(249, 115, 22),
                positive: Color::Rgb(34, 197, 94),
                negative: Color::Rgb(239, 68, 68),
                strong_buy: Color::Rgb(202, 138, 4),
                strong_sell: Color::Rgb(156, 163, 175),
                buyer: Color::Rgb(43, 108, 176),
                seller: Color::Rgb(229, 62, 62),
                chart: Color::Rgb(76, 81, 191),
            },
            ThemeMode::Dark => Palette {
                bg: Color::Rgb(17, 24, 39),
                fg: Color::Rgb(229, 231, 235),
                dim: Color::Rgb(120, 120, 120),
                border: Color::Rgb(55, 65, 81),
                accent: Color::Rgb(100, 180, 220),
                row_alt: Color::Rgb(31, 41, 55),
                max: Color::Rgb(96, 165, 250),
                min: Color::Rgb(251, 146, 60),
                positive: Color::Rgb(100, 220, 100),
                negative: Color::Rgb(220, 100, 100),
                strong_buy: Color::Rgb(250, 204, 21),
                strong_sell: Color::Rgb(156, 163, 175),
                buyer: Color::Rgb(99, 179, 237),
                seller: Color::Rgb(252, 129, 129),
                chart: Color::Rgb(163, 191, 250),
            },
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            ThemeMode::Light => "light",
            ThemeMode::Dark => "dark",
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Palette {
    pub bg: Color,
    pub fg: Color,
    pub dim: Color,
    pub border: Color,
    pub accent: Color,
    pub row_alt: Color,

    // Table highlights
    pub max: Color,
    pub min: Color,
    pub positive: Color,
    pub negative: Color,

    // Pressure arrows
    pub strong_buy: Color,
    pub strong_sell: Color,
    pub buyer: Color,
    pub seller: Color,

    pub chart: Color,
}

impl Palette {
    pub fn highlight(&self, highlight: Highlight) -> Color {
        match highlight {
            Highlight::Max => self.max,
            Highlight::Min => self.min,
            Highlight::Positive => self.positive,
            Highlight::Negative => self.negative,
            Highlight::Neutral => self.fg,
        }
    }

    pub fn pressure(&self, pressure: Pressure) -> Color {
        match pressure {
            Pressure::StrongBuy => self.strong_buy,
            Pressure::Buy => self.buyer,
            Pressure::Neutral => self.dim,
            Pressure::Sell => self.seller,
            Pressure::StrongSell => self.strong_sell,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_toggle_round_trip() {
        assert_eq!(ThemeMode::default(), ThemeMode::Light);
        assert_eq!(ThemeMode::Light.toggle(), ThemeMode::Dark);
        assert_eq!(ThemeMode::Light.toggle().toggle(), ThemeMode::Light);
    }

    #[test]
    fn test_extremes_stand_out() {
        for mode in [ThemeMode::Light, ThemeMode::Dark] {
            let palette = mode.palette();
            assert_ne!(palette.highlight(Highlight::Max), palette.highlight(Highlight::Positive));
            assert_ne!(palette.highlight(Highlight::Min), palette.highlight(Highlight::Negative));
            assert_ne!(palette.pressure(Pressure::StrongBuy), palette.pressure(Pressure::Buy));
        }
    }
}
