// Footprint clean-up ahead of projection and extrusion.
use geo::Area;
use geo_types::{Coord, LineString, Polygon};
use thiserror::Error;

use crate::geojson_features::Ring;

/// Two consecutive points closer than this (in degrees, per axis) are duplicates
pub const DUPLICATE_TOLERANCE: f64 = 1e-10;

/// A sanitized footprint in geographic coordinates, rings open.
#[derive(Debug, Clone, PartialEq)]
pub struct Footprint {
    pub outer: Vec<Coord<f64>>,
    pub holes: Vec<Vec<Coord<f64>>>,
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum FootprintError {
    #[error("polygon has no rings")]
    MissingOuterRing,

    #[error("outer ring has {0} distinct points, need at least 3")]
    DegenerateRing(usize),

    #[error("outer ring encloses no area")]
    ZeroArea,

    #[error("outer ring intersects itself")]
    SelfIntersecting,
}

/// Drop every point that sits within tolerance of its cyclic successor.
///
/// Only neighbours are compared, and always against the original ring, so
/// duplicates that are not adjacent survive. A closing point that repeats
/// the first one is removed by the same rule.
pub fn remove_adjacent_duplicates(ring: &[Coord<f64>]) -> Vec<Coord<f64>> {
    let n = ring.len();
    (0..n)
        .filter(|&i| !is_near(ring[i], ring[(i + 1) % n]))
        .map(|i| ring[i])
        .collect()
}

fn is_near(a: Coord<f64>, b: Coord<f64>) -> bool {
    (a.x - b.x).abs() < DUPLICATE_TOLERANCE && (a.y - b.y).abs() < DUPLICATE_TOLERANCE
}

/// Deduplicate a ring and keep it only if at least 3 points remain.
pub fn sanitize_ring(ring: &[Coord<f64>]) -> Option<Vec<Coord<f64>>> {
    let cleaned = remove_adjacent_duplicates(ring);
    if cleaned.len() < 3 {
        None
    } else {
        Some(cleaned)
    }
}

/// Clean one polygon (outer ring + holes).
///
/// The outer ring must survive deduplication, enclose area and not cross
/// itself. Holes that fail the same checks are dropped silently.
pub fn sanitize_polygon(rings: &[Ring]) -> Result<Footprint, FootprintError> {
    let (outer_raw, hole_rings) = rings.split_first().ok_or(FootprintError::MissingOuterRing)?;

    let outer = remove_adjacent_duplicates(outer_raw);
    if outer.len() < 3 {
        return Err(FootprintError::DegenerateRing(outer.len()));
    }
    if is_self_intersecting(&outer) {
        return Err(FootprintError::SelfIntersecting);
    }
    if ring_area(&outer) <= 0.0 {
        return Err(FootprintError::ZeroArea);
    }

    let holes = hole_rings
        .iter()
        .filter_map(|hole| sanitize_ring(hole))
        .filter(|hole| ring_area(hole) > 0.0)
        .collect();

    Ok(Footprint { outer, holes })
}

fn ring_area(ring: &[Coord<f64>]) -> f64 {
    Polygon::new(LineString::from(ring.to_vec()), vec![]).unsigned_area()
}

/// True when two edges that do not share a vertex touch or cross.
pub fn is_self_intersecting(ring: &[Coord<f64>]) -> bool {
    let n = ring.len();
    if n < 4 {
        return false;
    }

    for i in 0..n {
        let a1 = ring[i];
        let a2 = ring[(i + 1) % n];
        for j in (i + 1)..n {
            // Adjacent edges share an endpoint
            if j == i + 1 || (i == 0 && j == n - 1) {
                continue;
            }
            let b1 = ring[j];
            let b2 = ring[(j + 1) % n];
            if line_segments_intersect(a1, a2, b1, b2) {
                return true;
            }
        }
    }
    false
}

// Helper function to check if two line segments intersect
fn line_segments_intersect(p1: Coord<f64>, p2: Coord<f64>, p3: Coord<f64>, p4: Coord<f64>) -> bool {
    let d1 = direction(p3, p4, p1);
    let d2 = direction(p3, p4, p2);
    let d3 = direction(p1, p2, p3);
    let d4 = direction(p1, p2, p4);

    if ((d1 > 0.0 && d2 < 0.0) || (d1 < 0.0 && d2 > 0.0))
        && ((d3 > 0.0 && d4 < 0.0) || (d3 < 0.0 && d4 > 0.0))
    {
        return true;
    }

    // Colinear touching
    (d1 == 0.0 && is_point_on_segment(p3, p4, p1))
        || (d2 == 0.0 && is_point_on_segment(p3, p4, p2))
        || (d3 == 0.0 && is_point_on_segment(p1, p2, p3))
        || (d4 == 0.0 && is_point_on_segment(p1, p2, p4))
}

fn direction(p1: Coord<f64>, p2: Coord<f64>, p3: Coord<f64>) -> f64 {
    (p3.x - p1.x) * (p2.y - p1.y) - (p2.x - p1.x) * (p3.y - p1.y)
}

fn is_point_on_segment(p1: Coord<f64>, p2: Coord<f64>, p: Coord<f64>) -> bool {
    p.x >= p1.x.min(p2.x) && p.x <= p1.x.max(p2.x) && p.y >= p1.y.min(p2.y) && p.y <= p1.y.max(p2.y)
}
