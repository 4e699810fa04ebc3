//! Conversion between the globe and a local plane.
//!
//! A [`LocalProjection`] places a tangent plane on the globe at an origin
//! and expresses positions as offsets north and east of that origin. The
//! offset is derived from the great-circle distance and initial heading to
//! the point, so it is only an approximation of a proper map projection.
//! The further away from the origin, the worse it gets.

use std::f64::consts::PI;
use crate::geo::{GeoPoint, LocalPoint, format_absolute, format_local_point};
use crate::geodesy::{Geodesy, Spherical};


//------------ LocalProjection -----------------------------------------------

/// The local plane around an origin.
#[derive(Clone, Copy, Debug)]
pub struct LocalProjection<G = Spherical> {
    origin: GeoPoint,
    geodesy: G,
}

impl LocalProjection<Spherical> {
    /// Creates a projection on a spherical Earth.
    pub fn spherical(origin: GeoPoint) -> Self {
        LocalProjection::new(origin, Spherical::default())
    }
}

impl<G: Geodesy> LocalProjection<G> {
    pub fn new(origin: GeoPoint, geodesy: G) -> Self {
        LocalProjection { origin, geodesy }
    }

    pub fn origin(&self) -> GeoPoint {
        self.origin
    }

    pub fn geodesy(&self) -> &G {
        &self.geodesy
    }

    /// Converts an absolute position into a local one.
    pub fn to_local(&self, point: GeoPoint) -> LocalPoint {
        let distance = self.geodesy.distance_between(self.origin, point);
        let heading = self.geodesy.heading_between(
            self.origin, point
        ) * 2. * PI / 360.;
        LocalPoint::new(heading.cos() * distance, heading.sin() * distance)
    }

    /// Converts a local position back into an absolute one.
    ///
    /// A zero offset results in the origin itself.
    pub fn to_global(&self, local: LocalPoint) -> GeoPoint {
        let distance = local.distance();
        if distance == 0. {
            return self.origin
        }
        self.geodesy.offset(self.origin, distance, local.direction())
    }

    /// Formats an absolute position as a local one for display.
    pub fn format_local(&self, point: GeoPoint) -> String {
        format_local_point(self.to_local(point))
    }

    /// Formats both the absolute and local position of a point.
    ///
    /// The two are separated by a line feed.
    pub fn format_pointer(&self, point: GeoPoint) -> String {
        format!("{}\n{}", format_absolute(point), self.format_local(point))
    }
}


//------------ Free Functions ------------------------------------------------

/// Converts `point` into local coordinates around `origin`.
pub fn to_local(origin: GeoPoint, point: GeoPoint) -> LocalPoint {
    LocalProjection::spherical(origin).to_local(point)
}

/// Converts `local` around `origin` into an absolute position.
pub fn to_global(origin: GeoPoint, local: LocalPoint) -> GeoPoint {
    LocalProjection::spherical(origin).to_global(local)
}

/// Formats `point` in local coordinates around `origin`.
pub fn format_local(origin: GeoPoint, point: GeoPoint) -> String {
    LocalProjection::spherical(origin).format_local(point)
}


//============ Tests =========================================================

#[cfg(test)]
mod test {
    use super::*;
    use std::cell::Cell;

    const OAKLAND: GeoPoint = GeoPoint::new(37.8044, -122.2712);
    const BRISBANE: GeoPoint = GeoPoint::new(-27.4698, 153.0251);

    #[test]
    fn origin_maps_to_zero() {
        assert_eq!(to_local(OAKLAND, OAKLAND), LocalPoint::new(0., 0.));
        assert_eq!(to_global(OAKLAND, LocalPoint::new(0., 0.)), OAKLAND);
    }

    #[test]
    fn axis_convention() {
        let north = to_local(OAKLAND, GeoPoint::new(37.8144, -122.2712));
        assert!(north.north > 1000.);
        assert!(north.east.abs() < 1e-6);

        let east = to_local(OAKLAND, GeoPoint::new(37.8044, -122.2612));
        assert!(east.east > 800.);
        assert!(east.north.abs() < 1.);

        let p = to_global(OAKLAND, LocalPoint::new(0., 500.));
        assert!((p.lat() - OAKLAND.lat()).abs() < 1e-5);
        assert!(p.lon() > OAKLAND.lon());

        let p = to_global(OAKLAND, LocalPoint::new(-500., 0.));
        assert!(p.lat() < OAKLAND.lat());
        assert!((p.lon() - OAKLAND.lon()).abs() < 1e-9);
    }

    #[test]
    fn round_trip() {
        for &(dlat, dlon) in &[
            (0.001, 0.), (0., 0.001), (-0.5, 0.7), (1.3, -2.1), (-2.5, -2.5)
        ] {
            let point = GeoPoint::new(
                OAKLAND.lat() + dlat, OAKLAND.lon() + dlon
            );
            let back = to_global(OAKLAND, to_local(OAKLAND, point));
            assert!((back.lat() - point.lat()).abs() < 1e-6);
            assert!((back.lon() - point.lon()).abs() < 1e-6);
        }
    }

    #[test]
    fn long_distance() {
        let local = to_local(OAKLAND, BRISBANE);
        let expected = Spherical::default().distance_between(
            OAKLAND, BRISBANE
        );
        assert!((local.distance() - expected).abs() / expected < 0.01);
    }

    #[test]
    fn format_local_output() {
        assert_eq!(format_local(OAKLAND, OAKLAND), "North, east: {0.00, 0.00}");
        let text = LocalProjection::spherical(OAKLAND).format_pointer(OAKLAND);
        assert_eq!(
            text,
            "Lat,Lon: {37.804400, -122.271200}\nNorth, east: {0.00, 0.00}"
        );
    }

    /// A flat Earth with one meter per degree, counting the calls.
    struct Flat {
        calls: Cell<usize>,
    }

    impl Geodesy for Flat {
        fn distance_between(&self, from: GeoPoint, to: GeoPoint) -> f64 {
            self.calls.set(self.calls.get() + 1);
            (to.lat() - from.lat()).hypot(to.lon() - from.lon())
        }

        fn heading_between(&self, from: GeoPoint, to: GeoPoint) -> f64 {
            self.calls.set(self.calls.get() + 1);
            (to.lon() - from.lon()).atan2(to.lat() - from.lat()).to_degrees()
        }

        fn offset(
            &self, from: GeoPoint, distance: f64, heading: f64
        ) -> GeoPoint {
            self.calls.set(self.calls.get() + 1);
            let heading = heading.to_radians();
            GeoPoint::new(
                from.lat() + distance * heading.cos(),
                from.lon() + distance * heading.sin(),
            )
        }
    }

    #[test]
    fn injected_geodesy() {
        let flat = Flat { calls: Cell::new(0) };
        let proj = LocalProjection::new(GeoPoint::new(1., 2.), &flat);
        let local = proj.to_local(GeoPoint::new(4., 6.));
        assert!((local.north - 3.).abs() < 1e-12);
        assert!((local.east - 4.).abs() < 1e-12);
        let back = proj.to_global(local);
        assert!((back.lat() - 4.).abs() < 1e-12);
        assert!((back.lon() - 6.).abs() < 1e-12);
        assert_eq!(flat.calls.get(), 3);
    }
}
