//! A drawing session.
//!
//! A session collects everything that is drawn at the same time: the origin
//! for local coordinates and the four groups of point sequences given
//! either in local or absolute coordinates and drawn either as polylines or
//! polygons. Each redraw creates a new session from a [`SessionSource`].

use std::{fs, io};
use std::borrow::Cow;
use std::path::Path;
use serde::Deserialize;
use crate::geo::{GeoPoint, LocalPoint, SequenceKind};
use crate::import;
use crate::projection::LocalProjection;
use crate::style::Style;


//------------ SessionSource -------------------------------------------------

/// The raw text a session is created from.
#[derive(Clone, Debug, Default, Deserialize)]
pub struct SessionSource {
    /// The origin as `lat,lon`.
    pub origin: String,

    /// Local polylines, one `north,east` per line.
    #[serde(default)]
    pub local_polylines: String,

    /// Local polygons, one `north,east` per line.
    #[serde(default)]
    pub local_polygons: String,

    /// Absolute polylines, one `lat,lon` per line.
    #[serde(default)]
    pub global_polylines: String,

    /// Absolute polygons, one `lat,lon` per line.
    #[serde(default)]
    pub global_polygons: String,
}

impl SessionSource {
    /// Creates a source from a form-urlencoded body.
    ///
    /// Unknown fields are ignored, missing fields are empty.
    pub fn from_form(body: &[u8]) -> Self {
        let mut res = SessionSource::default();
        for (key, value) in url::form_urlencoded::parse(body) {
            let target = match key.as_ref() {
                "origin" => &mut res.origin,
                "local_polylines" => &mut res.local_polylines,
                "local_polygons" => &mut res.local_polygons,
                "global_polylines" => &mut res.global_polylines,
                "global_polygons" => &mut res.global_polygons,
                _ => continue,
            };
            *target = value.into_owned();
        }
        res
    }
}


//------------ SessionFile ---------------------------------------------------

/// The content of a session file.
#[derive(Clone, Debug, Deserialize)]
pub struct SessionFile {
    #[serde(flatten)]
    pub source: SessionSource,

    /// The style to draw the session with.
    #[serde(default)]
    pub style: Style,
}

impl SessionFile {
    pub fn load(path: impl AsRef<Path>) -> Result<Self, Error> {
        let data = fs::read_to_string(path.as_ref())?;
        toml::from_str(&data).map_err(Into::into)
    }
}


//------------ Session -------------------------------------------------------

/// The origin and point sequences to be drawn.
#[derive(Clone, Debug)]
pub struct Session {
    projection: LocalProjection,
    local_polylines: Vec<Vec<LocalPoint>>,
    local_polygons: Vec<Vec<LocalPoint>>,
    global_polylines: Vec<Vec<GeoPoint>>,
    global_polygons: Vec<Vec<GeoPoint>>,
}

impl Session {
    /// Creates an empty session around the given origin.
    pub fn new(origin: GeoPoint) -> Self {
        Session {
            projection: LocalProjection::spherical(origin),
            local_polylines: Vec::new(),
            local_polygons: Vec::new(),
            global_polylines: Vec::new(),
            global_polygons: Vec::new(),
        }
    }

    /// Creates a session by parsing its source text.
    pub fn from_source(source: &SessionSource) -> Result<Self, Error> {
        fn field<T>(
            name: &'static str,
            res: Result<T, import::Error>
        ) -> Result<T, Error> {
            res.map_err(|err| Error::Parse { field: name, err })
        }

        let origin = field("origin", import::parse_geo_point(&source.origin))?;
        Ok(Session {
            local_polylines: field(
                "local_polylines",
                import::parse_local_sets(&source.local_polylines)
            )?,
            local_polygons: field(
                "local_polygons",
                import::parse_local_sets(&source.local_polygons)
            )?,
            global_polylines: field(
                "global_polylines",
                import::parse_global_sets(&source.global_polylines)
            )?,
            global_polygons: field(
                "global_polygons",
                import::parse_global_sets(&source.global_polygons)
            )?,
            ..Session::new(origin)
        })
    }

    pub fn origin(&self) -> GeoPoint {
        self.projection.origin()
    }

    pub fn projection(&self) -> &LocalProjection {
        &self.projection
    }

    pub fn to_local(&self, point: GeoPoint) -> LocalPoint {
        self.projection.to_local(point)
    }

    pub fn to_global(&self, local: LocalPoint) -> GeoPoint {
        self.projection.to_global(local)
    }

    /// Formats a pointer position in absolute and local coordinates.
    pub fn format_pointer(&self, point: GeoPoint) -> String {
        self.projection.format_pointer(point)
    }

    /// Returns the number of point sequences in the session.
    pub fn len(&self) -> usize {
        self.local_polylines.len() + self.local_polygons.len()
        + self.global_polylines.len() + self.global_polygons.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns all sequences in absolute coordinates.
    ///
    /// Local sequences come first, polylines before polygons.
    pub fn sequences(&self) -> impl Iterator<Item = Sequence<'_>> + '_ {
        self.local_sequences(SequenceKind::Polyline, &self.local_polylines)
        .chain(
            self.local_sequences(SequenceKind::Polygon, &self.local_polygons)
        )
        .chain(
            Self::global_sequences(
                SequenceKind::Polyline, &self.global_polylines
            )
        )
        .chain(
            Self::global_sequences(
                SequenceKind::Polygon, &self.global_polygons
            )
        )
    }

    fn local_sequences<'s>(
        &'s self, kind: SequenceKind, items: &'s [Vec<LocalPoint>]
    ) -> impl Iterator<Item = Sequence<'s>> + 's {
        items.iter().map(move |seq| Sequence {
            kind,
            points: Cow::Owned(
                seq.iter().map(|point| self.to_global(*point)).collect()
            ),
        })
    }

    fn global_sequences(
        kind: SequenceKind, items: &[Vec<GeoPoint>]
    ) -> impl Iterator<Item = Sequence<'_>> + '_ {
        items.iter().map(move |seq| Sequence {
            kind, points: Cow::Borrowed(seq.as_slice())
        })
    }
}


//------------ Sequence ------------------------------------------------------

/// A sequence of points in absolute coordinates.
#[derive(Clone, Debug)]
pub struct Sequence<'a> {
    pub kind: SequenceKind,
    pub points: Cow<'a, [GeoPoint]>,
}


//============ Error =========================================================

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("{field}: {err}")]
    Parse { field: &'static str, err: import::Error },

    #[error("{0}")]
    Io(#[from] io::Error),

    #[error("{0}")]
    Toml(#[from] toml::de::Error),
}


//============ Tests =========================================================
