//! What we are drawing on.

use std::ops;
use kurbo::{Point, Rect, TranslateScale, Vec2};


//------------ Configurable Constants ----------------------------------------

/// Size correction for feature bounds in canvas units.
///
/// Labels are only located by their anchor point but extend well beyond
/// it. The feature bounds are grown by this much on each side so that
/// labels near the edge of a tile are still selected.
const BOUNDS_CORRECTION: f64 = 96.;


//------------ Canvas --------------------------------------------------------

/// The virtual surface to draw the map on.
///
/// Drawing is done directly via deref-ing to a cairo context.
///
/// The canvas keeps its bounding box in storage coordinates for selecting
/// features. This box is a little bigger than the canvas’s own extend to
/// correct for features that reach beyond their bounds.
#[derive(Debug)]
pub struct Canvas {
    /// The Cairo context for actual rendering.
    context: cairo::Context,

    /// The feature bounding box in storage coordinates.
    feature_bounds: Rect,

    /// The transformation from storage to canvas coordinates.
    ///
    /// Storage coordinates are Spherical Mercator with a range of `0. .. 1.`
    /// for both x and y. Because we are only supporting Spherical Mercator
    /// for output, too, we can use scaling and translation for this.
    ///
    /// Note that in a `TranslateScale` the scaling happens first and the
    /// translation needs to be in scaled up coordinates.
    transform: TranslateScale,
}

impl Canvas {
    /// Creates a new canvas.
    ///
    /// The canvas will be a square of `size` units in canvas coordinates.
    /// The north-west corner will be at `nw` in storage coordinates and the
    /// storage coordinates will be mulitplied by `scale` when translating
    /// into canvas coordinates.
    pub fn new(
        surface: &cairo::Surface,
        size: f64,
        nw: Point,
        scale: f64,
    ) -> Result<Self, cairo::Error> {
        let context = cairo::Context::new(surface)?;
        context.rectangle(0., 0., size, size);
        context.clip();

        Ok(Canvas {
            context,
            feature_bounds: Self::calc_feature_bounds(size, nw, scale),
            transform: TranslateScale::new(
                Vec2::new(-nw.x * scale, -nw.y * scale),
                scale
            ),
        })
    }

    /// Returns the feature bounds for the given parameters.
    pub fn calc_feature_bounds(size: f64, nw: Point, scale: f64) -> Rect {
        let feature_size = size / scale;
        let correct = BOUNDS_CORRECTION / scale;
        Rect::new(
            nw.x - correct,
            nw.y - correct,
            nw.x + feature_size + correct,
            nw.y + feature_size + correct,
        )
    }

    /// Returns a reference to the Cairo rendering context.
    pub fn context(&self) -> &cairo::Context {
        &self.context
    }

    /// Returns the feature bounding box.
    ///
    /// This is the bounding box of the canvas in storage coordinates and
    /// can be used to select the features to render onto the canvas. To make
    /// sure all features are selected, it has been inflated and is larger
    /// than the actual extent of the canvas.
    pub fn feature_bounds(&self) -> Rect {
        self.feature_bounds
    }

    /// Converts a point in storage coordinates into canvas coordinates.
    pub fn point(&self, storage: Point) -> Point {
        self.transform * storage
    }
}


//--- Deref

impl ops::Deref for Canvas {
    type Target = cairo::Context;

    fn deref(&self) -> &Self::Target {
        self.context()
    }
}


//============ Tests =========================================================
