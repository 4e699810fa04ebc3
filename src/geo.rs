//! Points on the globe and on the local plane.

use std::fmt;
use std::f64::consts::PI;
use kurbo::Point;


//------------ GeoPoint ------------------------------------------------------

/// An absolute position on the Earth’s surface.
///
/// Latitude and longitude are in degrees. Valid values are within
/// `-90. ..= 90.` for the latitude and `-180. ..= 180.` for the longitude.
/// The plain constructor doesn’t check this, use [`GeoPoint::checked`] for
/// values coming from the outside.
///
/// Points calculated by this crate always have their longitude in the
/// half-open range `-180. .. 180.`, so a longitude of `180.` comes back
/// as `-180.`. Both denote the same meridian.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct GeoPoint {
    lat: f64,
    lon: f64,
}

impl GeoPoint {
    pub const fn new(lat: f64, lon: f64) -> Self {
        GeoPoint { lat, lon }
    }

    /// Creates a new point if latitude and longitude are within range.
    pub fn checked(lat: f64, lon: f64) -> Result<Self, RangeError> {
        if !(-90.0..=90.0).contains(&lat) {
            return Err(RangeError::Latitude(lat))
        }
        if !(-180.0..=180.0).contains(&lon) {
            return Err(RangeError::Longitude(lon))
        }
        Ok(GeoPoint { lat, lon })
    }

    pub fn lat(self) -> f64 {
        self.lat
    }

    pub fn lon(self) -> f64 {
        self.lon
    }

    /// Returns whether both latitude and longitude are finite numbers.
    pub fn is_finite(self) -> bool {
        self.lat.is_finite() && self.lon.is_finite()
    }

    /// Returns the point in storage coordinates.
    ///
    /// Storage coordinates are Spherical Mercator with a range of `0. .. 1.`
    /// for both x and y and the north-west corner at the origin.
    pub fn normalized(self) -> Point {
        Point::new(
            (self.lon + 180.) / 360.,
            (1.0 - self.lat.to_radians().tan().asinh() / PI) / 2.0
        )
    }
}

impl fmt::Display for GeoPoint {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{:.6},{:.6}", self.lat, self.lon)
    }
}


//------------ LocalPoint ----------------------------------------------------

/// An offset in meters from some origin on the local tangent plane.
///
/// The value is only meaningful together with the origin it was created
/// for. The axes are always north first, east second.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct LocalPoint {
    pub north: f64,
    pub east: f64,
}

impl LocalPoint {
    pub const fn new(north: f64, east: f64) -> Self {
        LocalPoint { north, east }
    }

    /// The distance from the origin in meters.
    pub fn distance(self) -> f64 {
        self.north.hypot(self.east)
    }

    /// The direction from the origin in degrees clockwise from north.
    pub fn direction(self) -> f64 {
        self.east.atan2(self.north).to_degrees()
    }
}

impl fmt::Display for LocalPoint {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{:.2},{:.2}", self.north, self.east)
    }
}


//------------ SequenceKind --------------------------------------------------

/// How a sequence of points is to be drawn.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum SequenceKind {
    /// An open path.
    Polyline,

    /// A path implicitly closed from the last point back to the first.
    Polygon,
}


//------------ Formatting ----------------------------------------------------

/// Formats an absolute position for display.
pub fn format_absolute(point: GeoPoint) -> String {
    format!("Lat,Lon: {{{:.6}, {:.6}}}", point.lat, point.lon)
}

/// Formats a local position for display.
pub fn format_local_point(point: LocalPoint) -> String {
    format!("North, east: {{{:.2}, {:.2}}}", point.north, point.east)
}


//------------ RangeError ----------------------------------------------------

#[derive(Clone, Copy, Debug, PartialEq, thiserror::Error)]
pub enum RangeError {
    #[error("latitude {0} not within -90 and 90 degrees")]
    Latitude(f64),

    #[error("longitude {0} not within -180 and 180 degrees")]
    Longitude(f64),
}


//============ Tests =========================================================
