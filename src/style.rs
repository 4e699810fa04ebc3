//! The rendering style.

use serde::Deserialize;
use crate::color::Color;


//------------ Style ---------------------------------------------------------

/// How sequences and labels are drawn.
///
/// All sizes are in canvas units which are pixels for PNG tiles.
#[derive(Clone, Copy, Debug, Deserialize)]
#[serde(default)]
pub struct Style {
    /// The color of lines and polygon outlines.
    pub stroke: Color,

    /// The width of lines and polygon outlines.
    pub stroke_width: f64,

    /// The opacity of lines and polygon outlines.
    pub stroke_opacity: f64,

    /// The opacity of the polygon fill using the stroke color.
    pub fill_opacity: f64,

    /// The font size of labels.
    pub label_size: f64,

    /// The longest straight segment drawn in meters.
    ///
    /// Longer segments are broken up into pieces along the great circle.
    pub geodesic_step: f64,
}

impl Style {
    pub fn stroke_color(&self) -> Color {
        self.stroke.with_alpha(self.stroke.alpha() * self.stroke_opacity)
    }

    pub fn fill_color(&self) -> Color {
        self.stroke.with_alpha(self.stroke.alpha() * self.fill_opacity)
    }
}

impl Default for Style {
    fn default() -> Self {
        Style {
            stroke: Color::RED,
            stroke_width: 2.,
            stroke_opacity: 1.,
            fill_opacity: 0.35,
            label_size: 11.,
            geodesic_step: 100_000.,
        }
    }
}


//============ Tests =========================================================

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn partial_style() {
        #[derive(Deserialize)]
        struct Wrapper {
            style: Style,
        }

        let style = toml::from_str::<Wrapper>(
            "[style]\nstroke = \"#0000ff\"\nfill_opacity = 0.5\n"
        ).unwrap().style;
        assert_eq!(style.stroke, Color::rgb(0., 0., 1.));
        assert_eq!(style.fill_opacity, 0.5);
        assert_eq!(style.stroke_width, 2.);
        assert_eq!(style.fill_color().alpha(), 0.5);

        assert!(toml::from_str::<Wrapper>(
            "[style]\nstroke = \"blue\"\n"
        ).is_err());
    }
}
