//! Colors.

use std::fmt;
use std::convert::TryFrom;
use std::num::ParseIntError;
use serde::Deserialize;


/// A color.
#[derive(Clone, Copy, Debug, Default, Deserialize, PartialEq)]
#[serde(try_from = "String")]
pub struct Color {
    red: f64,
    green: f64,
    blue: f64,
    alpha: f64
}

impl Color {
    pub const fn rgb(red: f64, green: f64, blue: f64) -> Self {
        Color { red, green, blue, alpha: 1. }
    }

    pub const fn rgba(red: f64, green: f64, blue: f64, alpha: f64) -> Self {
        Color { red, green, blue, alpha }
    }

    /// Parses a color from `#rrggbb` or `#rrggbbaa` notation.
    ///
    /// The leading hash is optional.
    pub fn hex(hex: &str) -> Result<Self, InvalidHexColor> {
        let hex = hex.strip_prefix('#').unwrap_or(hex);
        if !hex.is_ascii() {
            return Err(InvalidHexColor)
        }
        let (r, g, b, a) = if hex.len() == 6 {
            (
                u8::from_str_radix(&hex[0..2], 16)?,
                u8::from_str_radix(&hex[2..4], 16)?,
                u8::from_str_radix(&hex[4..6], 16)?,
                0xFF,
            )
        }
        else if hex.len() == 8 {
            (
                u8::from_str_radix(&hex[0..2], 16)?,
                u8::from_str_radix(&hex[2..4], 16)?,
                u8::from_str_radix(&hex[4..6], 16)?,
                u8::from_str_radix(&hex[6..8], 16)?,
            )
        }
        else {
            return Err(InvalidHexColor)
        };
        Ok(Color::rgba(
            r as f64 / 255.,
            g as f64 / 255.,
            b as f64 / 255.,
            a as f64 / 255.,
        ))
    }

    pub fn apply(self, context: &cairo::Context) {
        context.set_source_rgba(self.red, self.green, self.blue, self.alpha)
    }

    pub fn alpha(self) -> f64 {
        self.alpha
    }

    pub fn with_alpha(self, alpha: f64) -> Self {
        Color { red: self.red, green: self.green, blue: self.blue, alpha }
    }
}

impl Color {
    pub const WHITE: Color = Color::rgb(1., 1., 1.);
    pub const BLACK: Color = Color::rgb(0., 0., 0.);
    pub const RED: Color = Color::rgb(1., 0., 0.);
}

impl TryFrom<String> for Color {
    type Error = InvalidHexColor;

    fn try_from(src: String) -> Result<Self, Self::Error> {
        Self::hex(&src)
    }
}


//------------ InvalidHexColor -----------------------------------------------

#[derive(Clone, Copy, Debug)]
pub struct InvalidHexColor;

impl From<ParseIntError> for InvalidHexColor {
    fn from(_: ParseIntError) -> Self {
        InvalidHexColor
    }
}

impl fmt::Display for InvalidHexColor {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str("invalid color")
    }
}


//============ Tests =========================================================

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn parse_hex() {
        assert_eq!(Color::hex("#FF0000").unwrap(), Color::RED);
        assert_eq!(Color::hex("ffffff").unwrap(), Color::WHITE);
        assert_eq!(
            Color::hex("#00000000").unwrap(), Color::rgba(0., 0., 0., 0.)
        );
        assert!(Color::hex("#FF00").is_err());
        assert!(Color::hex("#GG0000").is_err());
        assert!(Color::hex("#ääää").is_err());
    }
}
