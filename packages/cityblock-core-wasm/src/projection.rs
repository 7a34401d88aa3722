//! Equirectangular projection of geographic rings into a local planar frame.
//!
//! Local units are meters divided by the scale factor, so a 1:1000 model of a
//! 100 m wide block is 0.1 units wide.

use geo::{Area, Simplify};
use geo_types::{Coord, LineString, Polygon};
use std::f64::consts::PI;

use crate::footprint::Footprint;

/// Equatorial radius in meters
pub const EARTH_RADIUS: f64 = 6_378_137.0;

/// Footprints smaller than this on the ground are too small to print
pub const MIN_FOOTPRINT_AREA_M2: f64 = 10.0;

/// Outer rings with more coordinates than this, closing point included, get simplified
pub const SIMPLIFY_ABOVE_COORDS: usize = 100;

/// Simplification tolerance on the ground, in meters
pub const SIMPLIFY_TOLERANCE_M: f64 = 1.0;

/// Projection reference point, the centre of the footprint bounding box.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Origin {
    pub lon: f64,
    pub lat: f64,
}

impl Origin {
    pub fn new(lon: f64, lat: f64) -> Self {
        Self { lon, lat }
    }
}

/// Footprint in local coordinates. Rings are open (implicitly closed).
#[derive(Debug, Clone, PartialEq)]
pub struct LocalPolygon {
    pub outer: Vec<Coord<f64>>,
    pub holes: Vec<Vec<Coord<f64>>>,
}

impl LocalPolygon {
    /// Enclosed area in squared local units, holes subtracted.
    pub fn area(&self) -> f64 {
        let holes = self
            .holes
            .iter()
            .map(|hole| LineString::from(hole.clone()))
            .collect();
        Polygon::new(LineString::from(self.outer.clone()), holes).unsigned_area()
    }

    pub fn needs_simplification(&self) -> bool {
        self.outer.len() + 1 > SIMPLIFY_ABOVE_COORDS
    }

    /// Douglas-Peucker on every ring with tolerance `epsilon` in local units.
    /// A ring that would fall below 3 points is kept unchanged.
    pub fn simplified(&self, epsilon: f64) -> LocalPolygon {
        LocalPolygon {
            outer: simplify_ring(&self.outer, epsilon),
            holes: self
                .holes
                .iter()
                .map(|hole| simplify_ring(hole, epsilon))
                .collect(),
        }
    }
}

fn simplify_ring(ring: &[Coord<f64>], epsilon: f64) -> Vec<Coord<f64>> {
    let mut closed = LineString::from(ring.to_vec());
    closed.close();
    let mut points = closed.simplify(&epsilon).0;
    // Drop the closing point again
    points.pop();
    if points.len() < 3 {
        ring.to_vec()
    } else {
        points
    }
}

fn to_radians(degrees: f64) -> f64 {
    degrees * PI / 180.0
}

fn to_degrees(radians: f64) -> f64 {
    radians * 180.0 / PI
}

pub fn project_point(point: Coord<f64>, origin: Origin, scale: f64) -> Coord<f64> {
    let cos_lat = to_radians(origin.lat).cos();
    Coord {
        x: to_radians(point.x - origin.lon) * EARTH_RADIUS * cos_lat / scale,
        y: to_radians(point.y - origin.lat) * EARTH_RADIUS / scale,
    }
}

pub fn project_ring(ring: &[Coord<f64>], origin: Origin, scale: f64) -> Vec<Coord<f64>> {
    ring.iter()
        .map(|&point| project_point(point, origin, scale))
        .collect()
}

/// Inverse of [`project_ring`].
pub fn unproject_ring(ring: &[Coord<f64>], origin: Origin, scale: f64) -> Vec<Coord<f64>> {
    let cos_lat = to_radians(origin.lat).cos();
    ring.iter()
        .map(|point| Coord {
            x: origin.lon + to_degrees(point.x * scale / (EARTH_RADIUS * cos_lat)),
            y: origin.lat + to_degrees(point.y * scale / EARTH_RADIUS),
        })
        .collect()
}

pub fn project_footprint(footprint: &Footprint, origin: Origin, scale: f64) -> LocalPolygon {
    LocalPolygon {
        outer: project_ring(&footprint.outer, origin, scale),
        holes: footprint
            .holes
            .iter()
            .map(|hole| project_ring(hole, origin, scale))
            .collect(),
    }
}
