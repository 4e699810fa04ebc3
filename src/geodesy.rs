//! Measuring on the globe.
//!
//! The local projection only needs three things from the geometry of the
//! Earth: the distance between two points, the initial heading from one
//! point to another, and the point reached by travelling a distance along
//! a heading. These are collected in the [`Geodesy`] trait so that the
//! projection can be used with whatever model of the Earth is at hand.
//! The crate provides [`Spherical`] which models the Earth as a sphere.

use crate::geo::GeoPoint;


//------------ Configurable Constants ----------------------------------------

/// The default radius of the Earth in meters.
///
/// This is the equatorial radius of WGS 84 which is also what web map
/// widgets use for their spherical calculations.
pub const EARTH_RADIUS: f64 = 6_378_137.;

/// The mean radius of the Earth in meters.
pub const MEAN_EARTH_RADIUS: f64 = 6_371_008.8;


//------------ Geodesy -------------------------------------------------------

/// The geodesic operations needed for local projection.
///
/// Distances are in meters, headings in degrees clockwise from true north.
pub trait Geodesy {
    /// Returns the shortest distance between two points.
    fn distance_between(&self, from: GeoPoint, to: GeoPoint) -> f64;

    /// Returns the initial heading of the shortest path between two points.
    ///
    /// The result is in the range `-180. .. 180.`.
    fn heading_between(&self, from: GeoPoint, to: GeoPoint) -> f64;

    /// Returns the point at `distance` from `from` along `heading`.
    fn offset(&self, from: GeoPoint, distance: f64, heading: f64) -> GeoPoint;
}

impl<'a, T: Geodesy + ?Sized> Geodesy for &'a T {
    fn distance_between(&self, from: GeoPoint, to: GeoPoint) -> f64 {
        (**self).distance_between(from, to)
    }

    fn heading_between(&self, from: GeoPoint, to: GeoPoint) -> f64 {
        (**self).heading_between(from, to)
    }

    fn offset(&self, from: GeoPoint, distance: f64, heading: f64) -> GeoPoint {
        (**self).offset(from, distance, heading)
    }
}


//------------ Spherical -----------------------------------------------------

/// Geodesy on a sphere.
#[derive(Clone, Copy, Debug)]
pub struct Spherical {
    radius: f64,
}

impl Spherical {
    pub const fn new(radius: f64) -> Self {
        Spherical { radius }
    }

    pub fn radius(&self) -> f64 {
        self.radius
    }

    /// The angular distance between two points in radians.
    ///
    /// This uses the haversine formula which stays accurate for small
    /// distances.
    fn angle_between(from: GeoPoint, to: GeoPoint) -> f64 {
        let phi1 = from.lat().to_radians();
        let phi2 = to.lat().to_radians();
        let delta_phi = phi2 - phi1;
        let delta_lambda = (to.lon() - from.lon()).to_radians();
        let a = (delta_phi / 2.).sin().powi(2)
            + phi1.cos() * phi2.cos() * (delta_lambda / 2.).sin().powi(2);
        2. * a.sqrt().min(1.).asin()
    }
}

impl Default for Spherical {
    fn default() -> Self {
        Spherical::new(EARTH_RADIUS)
    }
}

impl Geodesy for Spherical {
    fn distance_between(&self, from: GeoPoint, to: GeoPoint) -> f64 {
        Self::angle_between(from, to) * self.radius
    }

    fn heading_between(&self, from: GeoPoint, to: GeoPoint) -> f64 {
        let phi1 = from.lat().to_radians();
        let phi2 = to.lat().to_radians();
        let delta_lambda = (to.lon() - from.lon()).to_radians();
        let heading = f64::atan2(
            delta_lambda.sin() * phi2.cos(),
            phi1.cos() * phi2.sin()
                - phi1.sin() * phi2.cos() * delta_lambda.cos()
        );
        wrap(heading.to_degrees(), -180., 180.)
    }

    fn offset(&self, from: GeoPoint, distance: f64, heading: f64) -> GeoPoint {
        let delta = distance / self.radius;
        let theta = heading.to_radians();
        let phi1 = from.lat().to_radians();
        let lambda1 = from.lon().to_radians();

        let sin_phi2 = (
            phi1.sin() * delta.cos() + phi1.cos() * delta.sin() * theta.cos()
        ).clamp(-1., 1.);
        let phi2 = sin_phi2.asin();
        let lambda2 = lambda1 + f64::atan2(
            theta.sin() * delta.sin() * phi1.cos(),
            delta.cos() - phi1.sin() * sin_phi2
        );
        GeoPoint::new(phi2.to_degrees(), wrap_lon(lambda2.to_degrees()))
    }
}


//------------ Densification -------------------------------------------------

/// Returns the points strictly between `from` and `to` on the shortest path.
///
/// The points are spaced evenly and no further than `max_step` meters
/// apart. If the two points are closer than that, nothing is returned.
pub fn densify(
    geodesy: &impl Geodesy,
    from: GeoPoint,
    to: GeoPoint,
    max_step: f64,
) -> Vec<GeoPoint> {
    if !(max_step > 0.) {
        return Vec::new()
    }
    let distance = geodesy.distance_between(from, to);
    let steps = (distance / max_step).ceil();
    if !steps.is_finite() || steps < 2. {
        return Vec::new()
    }

    // Travelling from `from` along the initial heading stays on the great
    // circle through `to`, so every step can start at `from`.
    let heading = geodesy.heading_between(from, to);
    let step = distance / steps;
    (1..steps as usize).map(|i| {
        geodesy.offset(from, step * i as f64, heading)
    }).collect()
}


//------------ Helpers -------------------------------------------------------

/// Wraps a longitude into the range `-180. .. 180.`.
pub fn wrap_lon(lon: f64) -> f64 {
    wrap(lon, -180., 180.)
}

/// Wraps `value` into the half-open range `min .. max`.
fn wrap(value: f64, min: f64, max: f64) -> f64 {
    let size = max - min;
    (((value - min) % size) + size) % size + min
}


//============ Tests =========================================================

#[cfg(test)]
mod test {
    use super::*;

    fn close(left: f64, right: f64, eps: f64) -> bool {
        (left - right).abs() < eps
    }

    #[test]
    fn test_wrap() {
        assert_eq!(wrap(190., -180., 180.), -170.);
        assert_eq!(wrap(-190., -180., 180.), 170.);
        assert_eq!(wrap(180., -180., 180.), -180.);
        assert_eq!(wrap(45., -180., 180.), 45.);
        assert_eq!(wrap_lon(540.), -180.);
    }

    #[test]
    fn offset_on_antimeridian() {
        let geo = Spherical::default();
        let point = geo.offset(GeoPoint::new(0., 180.), 0., 90.);
        assert!(close(point.lat(), 0., 1e-9));
        assert!(close(point.lon(), -180., 1e-9));
    }

    #[test]
    fn quarter_meridian() {
        let geo = Spherical::new(MEAN_EARTH_RADIUS);
        let d = geo.distance_between(
            GeoPoint::new(0., 0.), GeoPoint::new(90., 0.)
        );
        assert!(close(d, MEAN_EARTH_RADIUS * std::f64::consts::FRAC_PI_2, 1e-6));
    }

    #[test]
    fn cardinal_headings() {
        let geo = Spherical::default();
        let origin = GeoPoint::new(10., 20.);
        assert!(close(
            geo.heading_between(origin, GeoPoint::new(11., 20.)), 0., 1e-9
        ));
        assert!(close(
            geo.heading_between(origin, GeoPoint::new(9., 20.)).abs(),
            180., 1e-9
        ));
        let east = geo.heading_between(origin, GeoPoint::new(10., 20.01));
        assert!(close(east, 90., 0.01));
        let west = geo.heading_between(origin, GeoPoint::new(10., 19.99));
        assert!(close(west, -90., 0.01));
    }

    #[test]
    fn offset_inverts_distance_and_heading() {
        let geo = Spherical::default();
        let from = GeoPoint::new(52.52, 13.405);
        let to = GeoPoint::new(48.8566, 2.3522);
        let there = geo.offset(
            from,
            geo.distance_between(from, to),
            geo.heading_between(from, to)
        );
        assert!(close(there.lat(), to.lat(), 1e-9));
        assert!(close(there.lon(), to.lon(), 1e-9));
    }

    #[test]
    fn offset_across_antimeridian() {
        let geo = Spherical::default();
        let p = geo.offset(GeoPoint::new(0., 179.99), 5_000., 90.);
        assert!(p.lon() < -179.9);
        assert!(p.lon() >= -180.);
    }

    #[test]
    fn densify_spacing() {
        let geo = Spherical::default();
        let from = GeoPoint::new(37.8044, -122.2712);
        let to = GeoPoint::new(-27.4698, 153.0251);
        let total = geo.distance_between(from, to);
        let points = densify(&geo, from, to, 1_000_000.);
        let steps = (total / 1_000_000.).ceil();
        assert_eq!(points.len(), steps as usize - 1);

        let mut last = from;
        for point in points.iter().copied().chain(Some(to)) {
            let d = geo.distance_between(last, point);
            assert!(d <= 1_000_000. + 1e-3);
            assert!(close(d, total / steps, 1.));
            last = point;
        }
    }

    #[test]
    fn densify_short_segment() {
        let geo = Spherical::default();
        let from = GeoPoint::new(0., 0.);
        let to = GeoPoint::new(0., 0.001);
        assert!(densify(&geo, from, to, 1_000.).is_empty());
        assert!(densify(&geo, from, to, 0.).is_empty());
        assert!(densify(&geo, from, from, 1.).is_empty());
    }
}
