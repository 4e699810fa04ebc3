use std::{fmt, ops};
use std::str::FromStr;
use kurbo::Point;
use crate::canvas::Canvas;
use crate::feature::FeatureSet;

/// The maximum zoom level we support.
///
/// This **must** be less than 32 or stuff will break.
pub const MAX_ZOOM: u8 = 20;

/// The width and height of a tile in pixels.
pub const TILE_SIZE: u32 = 512;


//------------ Tile ----------------------------------------------------------

pub struct Tile {
    id: TileId,
}

impl Tile {
    pub fn new(id: TileId) -> Self {
        Tile { id }
    }

    /// Renders the features onto the tile and returns the encoded image.
    pub fn render(&self, features: &FeatureSet) -> Result<Vec<u8>, RenderError> {
        let surface = Surface::new(self.id.format)?;
        self.render_surface(&surface, features)?;
        surface.into_data()
    }

    fn render_surface(
        &self, surface: &cairo::Surface, features: &FeatureSet
    ) -> Result<(), cairo::Error> {
        let canvas = Canvas::new(
            surface, f64::from(TILE_SIZE), self.id.nw(), self.id.scale()
        )?;
        features.render(&canvas)
    }
}


//------------ TileId --------------------------------------------------------

#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub struct TileId {
    pub zoom: u8,
    pub x: u32,
    pub y: u32,
    pub format: TileFormat,
}

impl TileId {
    /// Construct the tile ID from a URI path.
    ///
    /// The format of the path is expected to be:
    ///
    /// ```text
    /// /{zoom}/{x}/{y}.{fmt}
    /// ```
    pub fn from_path(path: &str) -> Result<Self, TileIdError> {
        let mut path = path.split('/');

        // Consume the initial "/"
        if path.next() != Some("") {
            return Err(TileIdError)
        }

        let zoom = u8::from_str(
            path.next().ok_or(TileIdError)?
        ).map_err(|_| TileIdError)?;
        if zoom > MAX_ZOOM {
            return Err(TileIdError);
        }

        let x = u32::from_str(
            path.next().ok_or(TileIdError)?
        ).map_err(|_| TileIdError)?;
        if x >= Self::coord_end(zoom) {
            return Err(TileIdError);
        }

        let mut next = path.next().ok_or(TileIdError)?.split('.');
        let y = u32::from_str(
            next.next().ok_or(TileIdError)?
        ).map_err(|_| TileIdError)?;
        if y >= Self::coord_end(zoom) {
            return Err(TileIdError);
        }

        let format = TileFormat::from_str(
            next.next().ok_or(TileIdError)?
        )?;

        if next.next().is_some() || path.next().is_some() {
            return Err(TileIdError)
        }

        Ok(TileId { zoom, x, y, format })
    }

    /// The upper bound for a coordinate in a zoom level.
    ///
    /// Any coordinate must be less (!) than this value.
    fn coord_end(zoom: u8) -> u32 {
        1 << usize::from(zoom)
    }

    fn n(&self) -> f64 {
        f64::from(Self::coord_end(self.zoom))
    }

    /// The north-west corner of the tile in storage coordinates.
    pub fn nw(&self) -> Point {
        Point::new(f64::from(self.x) / self.n(), f64::from(self.y) / self.n())
    }

    /// The factor from storage to canvas coordinates.
    pub fn scale(&self) -> f64 {
        self.n() * f64::from(TILE_SIZE)
    }
}

impl fmt::Display for TileId {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}/{}/{}.{}", self.zoom, self.x, self.y, self.format)
    }
}


//------------ TileFormat ----------------------------------------------------

#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum TileFormat {
    Png,
    Svg,
}

impl TileFormat {
    pub fn content_type(self) -> &'static str {
        match self {
            TileFormat::Png => "image/png",
            TileFormat::Svg => "image/svg+xml",
        }
    }
}

impl FromStr for TileFormat {
    type Err = TileIdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "png" => Ok(TileFormat::Png),
            "svg" => Ok(TileFormat::Svg),
            _ => Err(TileIdError),
        }
    }
}

impl fmt::Display for TileFormat {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(match *self {
            TileFormat::Png => "png",
            TileFormat::Svg => "svg",
        })
    }
}


//------------ Surface -------------------------------------------------------

enum Surface {
    Png(cairo::ImageSurface),
    Svg(cairo::SvgSurface)
}

impl Surface {
    fn new(format: TileFormat) -> Result<Self, RenderError> {
        let size = i32::try_from(TILE_SIZE).unwrap_or(i32::MAX);
        match format {
            TileFormat::Png => {
                Ok(Surface::Png(cairo::ImageSurface::create(
                    cairo::Format::ARgb32, size, size
                )?))
            }
            TileFormat::Svg => {
                // SVG surfaces are sized in points. One pixel is one point
                // here, so the image has the same size as the PNG.
                Ok(Surface::Svg(cairo::SvgSurface::for_stream(
                    f64::from(TILE_SIZE), f64::from(TILE_SIZE), Vec::new()
                )?))
            }
        }
    }

    fn into_data(self) -> Result<Vec<u8>, RenderError> {
        match self {
            Surface::Png(surface) => {
                let mut data = Vec::new();
                surface.write_to_png(&mut data).map_err(|err| {
                    RenderError::Png(err.to_string())
                })?;
                Ok(data)
            }
            Surface::Svg(surface) => {
                let stream = surface.finish_output_stream().map_err(|err| {
                    RenderError::Svg(err.error.to_string())
                })?;
                match stream.downcast::<Vec<u8>>() {
                    Ok(stream) => Ok(*stream),
                    Err(_) => Err(RenderError::Svg("unexpected stream".into()))
                }
            }
        }
    }
}

impl ops::Deref for Surface {
    type Target = cairo::Surface;

    fn deref(&self) -> &Self::Target {
        match *self {
            Surface::Png(ref surface) => surface,
            Surface::Svg(ref surface) => surface
        }
    }
}


//------------ TileIdError ---------------------------------------------------

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct TileIdError;

impl fmt::Display for TileIdError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str("invalid tile path")
    }
}


//------------ RenderError ---------------------------------------------------

#[derive(Debug, thiserror::Error)]
pub enum RenderError {
    #[error("cairo: {0}")]
    Cairo(#[from] cairo::Error),

    #[error("failed to write PNG: {0}")]
    Png(String),

    #[error("failed to write SVG: {0}")]
    Svg(String),
}


//============ Tests =========================================================

#[cfg(test)]
mod test {
    use super::*;
    use crate::geo::GeoPoint;
    use crate::session::Session;
    use crate::style::Style;

    #[test]
    fn parse_path() {
        assert_eq!(
            TileId::from_path("/3/4/5.png"),
            Ok(TileId { zoom: 3, x: 4, y: 5, format: TileFormat::Png })
        );
        assert_eq!(
            TileId::from_path("/0/0/0.svg").map(|id| id.format),
            Ok(TileFormat::Svg)
        );
        assert!(TileId::from_path("3/4/5.png").is_err());
        assert!(TileId::from_path("/3/8/5.png").is_err());
        assert!(TileId::from_path("/21/0/0.png").is_err());
        assert!(TileId::from_path("/3/4/5.jpg").is_err());
        assert!(TileId::from_path("/3/4/5.png/6").is_err());
        assert!(TileId::from_path("/3/4/5.png.png").is_err());
        assert!(TileId::from_path("/").is_err());
    }

    #[test]
    fn display() {
        let id = TileId { zoom: 17, x: 21, y: 12, format: TileFormat::Svg };
        assert_eq!(id.to_string(), "17/21/12.svg");
    }

    #[test]
    fn geometry() {
        let id = TileId::from_path("/1/1/0.png").unwrap();
        assert_eq!(id.nw(), Point::new(0.5, 0.));
        assert_eq!(id.scale(), 1024.);
    }

    #[test]
    fn render_tiles() {
        let features = FeatureSet::new(
            &Session::new(GeoPoint::new(0., 0.)), Style::default()
        );
        let png = Tile::new(
            TileId::from_path("/1/1/1.png").unwrap()
        ).render(&features).unwrap();
        assert!(png.starts_with(b"\x89PNG"));

        let svg = Tile::new(
            TileId::from_path("/1/0/0.svg").unwrap()
        ).render(&features).unwrap();
        assert!(String::from_utf8_lossy(&svg).contains("<svg"));
    }
}
