//! Features are things that should be shown on the map.
//!
//! A [`FeatureSet`] is created from a session. It contains a path feature
//! for each point sequence, a label for each vertex numbering the vertices
//! of the sequence from zero, and a label for the origin. All features are
//! kept in storage coordinates and stored in an R-tree so that a tile only
//! needs to look at the features it actually shows.

use kurbo::{Point, Rect, Vec2};
use log::warn;
use rstar::{AABB, RTree, RTreeObject};
use crate::canvas::Canvas;
use crate::color::Color;
use crate::geo::{GeoPoint, SequenceKind};
use crate::geodesy::{Geodesy, densify};
use crate::session::{Sequence, Session};
use crate::style::Style;


//------------ Configurable Constants ----------------------------------------

/// The label text for the origin.
const ORIGIN_LABEL: &str = "Origin";

/// The length of the tail connecting a label box with its point.
const LABEL_TAIL: f64 = 6.;


//------------ FeatureSet ----------------------------------------------------

pub struct FeatureSet {
    features: RTree<Feature>,
    style: Style,
}

impl FeatureSet {
    /// Creates the features for a session.
    pub fn new(session: &Session, style: Style) -> Self {
        let mut features = Vec::new();
        let geodesy = session.projection().geodesy();
        for sequence in session.sequences() {
            Self::add_sequence(&mut features, geodesy, &sequence, &style);
        }
        Self::add_feature(
            &mut features,
            Feature::label(session.origin().normalized(), ORIGIN_LABEL.into())
        );
        let features = features.into_iter().enumerate().map(
            |(order, mut feature)| {
                feature.order = order;
                feature
            }
        ).collect();

        FeatureSet {
            features: RTree::bulk_load(features),
            style,
        }
    }

    fn add_sequence(
        features: &mut Vec<Feature>,
        geodesy: &impl Geodesy,
        sequence: &Sequence,
        style: &Style,
    ) {
        // Vertices keep their index for labelling even if some are
        // skipped because they cannot be placed on the map.
        let points: Vec<_> = sequence.points.iter().copied().enumerate()
            .filter(|(_, point)| point.is_finite())
            .collect();
        if points.len() < sequence.points.len() {
            warn!(
                "Skipping {} invalid points of a sequence.",
                sequence.points.len() - points.len()
            );
        }
        if points.is_empty() {
            return
        }

        let mut path = Vec::new();
        for pair in points.windows(2) {
            Self::push_segment(&mut path, geodesy, pair[0].1, pair[1].1, style);
        }
        if sequence.kind == SequenceKind::Polygon && points.len() > 2 {
            if let (Some(last), Some(first)) = (points.last(), points.first()) {
                Self::push_segment(&mut path, geodesy, last.1, first.1, style);
            }
        }
        else if let Some(last) = points.last() {
            path.push(last.1.normalized());
        }
        unwrap_antimeridian(&mut path);
        Self::add_feature(features, Feature::path(sequence.kind, path));

        for (idx, point) in points {
            Self::add_feature(
                features, Feature::label(point.normalized(), idx.to_string())
            );
        }
    }

    /// Adds the start point and intermediary points of a segment.
    fn push_segment(
        path: &mut Vec<Point>,
        geodesy: &impl Geodesy,
        from: GeoPoint,
        to: GeoPoint,
        style: &Style,
    ) {
        path.push(from.normalized());
        path.extend(
            densify(geodesy, from, to, style.geodesic_step).into_iter().map(
                GeoPoint::normalized
            )
        );
    }

    /// Adds a feature plus a copy shifted around the globe if necessary.
    fn add_feature(features: &mut Vec<Feature>, feature: Feature) {
        if feature.bounds.x0 < 0. {
            features.push(feature.shifted(1.));
        }
        if feature.bounds.x1 > 1. {
            features.push(feature.shifted(-1.));
        }
        features.push(feature);
    }

    pub fn len(&self) -> usize {
        self.features.size()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns the features intersecting the bounds in drawing order.
    pub fn locate(&self, bounds: Rect) -> Vec<&Feature> {
        let mut res: Vec<_> = self.features.locate_in_envelope_intersecting(
            &AABB::from_corners([bounds.x0, bounds.y0], [bounds.x1, bounds.y1])
        ).collect();
        res.sort_by_key(|feature| (feature.is_label(), feature.order));
        res
    }

    pub fn render(&self, canvas: &Canvas) -> Result<(), cairo::Error> {
        for feature in self.locate(canvas.feature_bounds()) {
            feature.render(canvas, &self.style)?;
        }
        Ok(())
    }
}


//------------ Feature -------------------------------------------------------

pub struct Feature {
    kind: FeatureKind,
    bounds: Rect,
    order: usize,
}

enum FeatureKind {
    Path { kind: SequenceKind, points: Vec<Point> },
    Label { anchor: Point, text: String },
}

impl Feature {
    fn path(kind: SequenceKind, points: Vec<Point>) -> Self {
        let bounds = points.iter().fold(
            Rect::from_points(points[0], points[0]),
            |bounds, point| bounds.union_pt(*point)
        );
        Feature {
            kind: FeatureKind::Path { kind, points },
            bounds,
            order: 0,
        }
    }

    fn label(anchor: Point, text: String) -> Self {
        Feature {
            kind: FeatureKind::Label { anchor, text },
            bounds: Rect::from_points(anchor, anchor),
            order: 0,
        }
    }

    fn shifted(&self, x: f64) -> Self {
        let offset = Vec2::new(x, 0.);
        Feature {
            kind: match self.kind {
                FeatureKind::Path { kind, ref points } => FeatureKind::Path {
                    kind,
                    points: points.iter().map(|p| *p + offset).collect()
                },
                FeatureKind::Label { anchor, ref text } => FeatureKind::Label {
                    anchor: anchor + offset, text: text.clone()
                },
            },
            bounds: self.bounds + offset,
            order: self.order,
        }
    }

    pub fn is_label(&self) -> bool {
        matches!(self.kind, FeatureKind::Label { .. })
    }

    pub fn render(
        &self, canvas: &Canvas, style: &Style
    ) -> Result<(), cairo::Error> {
        match self.kind {
            FeatureKind::Path { kind, ref points } => {
                Self::render_path(canvas, style, kind, points)
            }
            FeatureKind::Label { anchor, ref text } => {
                Self::render_label(canvas, style, anchor, text)
            }
        }
    }

    fn render_path(
        canvas: &Canvas, style: &Style, kind: SequenceKind, points: &[Point]
    ) -> Result<(), cairo::Error> {
        canvas.new_path();
        let mut points = points.iter().map(|p| canvas.point(*p));
        if let Some(first) = points.next() {
            canvas.move_to(first.x, first.y);
        }
        for point in points {
            canvas.line_to(point.x, point.y);
        }
        canvas.set_line_width(style.stroke_width);
        canvas.set_line_join(cairo::LineJoin::Round);
        canvas.set_line_cap(cairo::LineCap::Round);
        if kind == SequenceKind::Polygon {
            canvas.close_path();
            style.fill_color().apply(canvas);
            canvas.fill_preserve()?;
        }
        style.stroke_color().apply(canvas);
        canvas.stroke()
    }

    /// Draws a label box above the anchor point.
    fn render_label(
        canvas: &Canvas, style: &Style, anchor: Point, text: &str
    ) -> Result<(), cairo::Error> {
        let anchor = canvas.point(anchor);
        canvas.select_font_face(
            "sans-serif", cairo::FontSlant::Normal, cairo::FontWeight::Normal
        );
        canvas.set_font_size(style.label_size);
        let extents = canvas.text_extents(text)?;
        let font = canvas.font_extents()?;

        let pad = style.label_size * 0.4;
        let width = extents.x_advance() + 2. * pad;
        let height = font.ascent() + font.descent() + 2. * pad;
        let bottom = anchor.y - LABEL_TAIL;
        let left = anchor.x - width / 2.;

        canvas.new_path();
        canvas.move_to(anchor.x, anchor.y);
        canvas.line_to(anchor.x - LABEL_TAIL / 2., bottom);
        canvas.line_to(left, bottom);
        canvas.line_to(left, bottom - height);
        canvas.line_to(left + width, bottom - height);
        canvas.line_to(left + width, bottom);
        canvas.line_to(anchor.x + LABEL_TAIL / 2., bottom);
        canvas.close_path();
        Color::WHITE.apply(canvas);
        canvas.fill_preserve()?;
        canvas.set_line_width(1.);
        canvas.set_line_join(cairo::LineJoin::Miter);
        Color::BLACK.with_alpha(0.4).apply(canvas);
        canvas.stroke()?;

        Color::BLACK.apply(canvas);
        canvas.move_to(left + pad, bottom - pad - font.descent());
        canvas.show_text(text)
    }
}

impl RTreeObject for Feature {
    type Envelope = AABB<[f64; 2]>;

    fn envelope(&self) -> Self::Envelope {
        AABB::from_corners(
            [self.bounds.x0, self.bounds.y0],
            [self.bounds.x1, self.bounds.y1]
        )
    }
}


//------------ Helper Functions ----------------------------------------------

/// Makes a path in storage coordinates continuous across the antimeridian.
///
/// Whenever two consecutive points are more than half the world apart
/// horizontally, the remainder of the path is moved by a whole world width.
/// The resulting path may extend beyond the `0. .. 1.` range.
fn unwrap_antimeridian(path: &mut [Point]) {
    let mut shift = 0.;
    let mut last = match path.first() {
        Some(point) => point.x,
        None => return
    };
    for point in path.iter_mut().skip(1) {
        let x = point.x;
        if x - last > 0.5 {
            shift -= 1.;
        }
        else if last - x > 0.5 {
            shift += 1.;
        }
        last = x;
        point.x += shift;
    }
}


//============ Tests =========================================================
