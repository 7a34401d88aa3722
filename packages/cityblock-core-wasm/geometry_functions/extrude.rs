use earcutr::earcut;
use geo_types::Coord;
use nalgebra::Point3;
use thiserror::Error;

use crate::projection::LocalPolygon;
use crate::solid::{Face, Solid};

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ExtrudeError {
    #[error("extrusion height must be positive, got {0}")]
    NonPositiveHeight(f64),

    #[error("shape has no paths")]
    NoPaths,

    #[error("path {path} has {points} points, need at least 3")]
    DegeneratePath { path: usize, points: usize },

    #[error("path {path} references point {index} outside the point pool")]
    PathIndexOutOfRange { path: usize, index: usize },

    #[error("shape contains non-finite coordinates")]
    NonFiniteCoordinate,

    #[error("triangulation failed: {0}")]
    Triangulation(String),

    #[error("triangulation produced no triangles")]
    EmptyTriangulation,
}

/// A 2-D shape: a shared point pool and closed paths indexing into it.
/// The first path is the outer boundary, the rest are holes.
#[derive(Debug, Clone, PartialEq)]
pub struct Shape2D {
    pub points: Vec<Coord<f64>>,
    pub paths: Vec<Vec<usize>>,
}

impl Shape2D {
    pub fn from_local_polygon(polygon: &LocalPolygon) -> Self {
        let mut points = polygon.outer.clone();
        let mut paths = vec![(0..points.len()).collect::<Vec<_>>()];

        for hole in &polygon.holes {
            let start = points.len();
            points.extend_from_slice(hole);
            paths.push((start..points.len()).collect());
        }

        Self { points, paths }
    }
}

fn signed_area(points: &[Coord<f64>]) -> f64 {
    let mut area = 0.0;
    for i in 0..points.len() {
        let j = (i + 1) % points.len();
        area += points[i].x * points[j].y;
        area -= points[j].x * points[i].y;
    }
    area * 0.5
}

/// Helper function to check if points are in clockwise order
fn is_clockwise(points: &[Coord<f64>]) -> bool {
    signed_area(points) <= 0.0
}

fn resolve_paths(shape: &Shape2D) -> Result<Vec<Vec<Coord<f64>>>, ExtrudeError> {
    if shape.paths.is_empty() {
        return Err(ExtrudeError::NoPaths);
    }

    let mut rings = Vec::with_capacity(shape.paths.len());
    for (path_index, path) in shape.paths.iter().enumerate() {
        if path.len() < 3 {
            return Err(ExtrudeError::DegeneratePath {
                path: path_index,
                points: path.len(),
            });
        }

        let mut ring = Vec::with_capacity(path.len());
        for &index in path {
            let point = shape
                .points
                .get(index)
                .copied()
                .ok_or(ExtrudeError::PathIndexOutOfRange {
                    path: path_index,
                    index,
                })?;
            if !point.x.is_finite() || !point.y.is_finite() {
                return Err(ExtrudeError::NonFiniteCoordinate);
            }
            ring.push(point);
        }
        rings.push(ring);
    }

    // Outer counter-clockwise, holes clockwise
    for (i, ring) in rings.iter_mut().enumerate() {
        let clockwise = is_clockwise(ring);
        if (i == 0 && clockwise) || (i > 0 && !clockwise) {
            ring.reverse();
        }
    }

    Ok(rings)
}

/// Cap triangles as counter-clockwise index triples into the flattened rings.
fn triangulate_cap(flat: &[Coord<f64>], hole_indices: &[usize]) -> Result<Vec<[usize; 3]>, ExtrudeError> {
    let data: Vec<f64> = flat.iter().flat_map(|p| [p.x, p.y]).collect();
    let indices = earcut(&data, hole_indices, 2)
        .map_err(|e| ExtrudeError::Triangulation(format!("{:?}", e)))?;

    let mut triangles = Vec::with_capacity(indices.len() / 3);
    for tri in indices.chunks_exact(3) {
        let (a, b, c) = (flat[tri[0]], flat[tri[1]], flat[tri[2]]);
        let cross = (b.x - a.x) * (c.y - a.y) - (b.y - a.y) * (c.x - a.x);
        if cross > 0.0 {
            triangles.push([tri[0], tri[1], tri[2]]);
        } else if cross < 0.0 {
            triangles.push([tri[0], tri[2], tri[1]]);
        }
        // Zero-area slivers from collinear runs are left out
    }

    if triangles.is_empty() {
        return Err(ExtrudeError::EmptyTriangulation);
    }
    Ok(triangles)
}

fn side_walls(ring: &[Coord<f64>], height: f64, faces: &mut Vec<Face>) {
    let n = ring.len();
    for i in 0..n {
        let a = ring[i];
        let b = ring[(i + 1) % n];
        faces.push(Face::new(vec![
            Point3::new(a.x, a.y, 0.0),
            Point3::new(b.x, b.y, 0.0),
            Point3::new(b.x, b.y, height),
            Point3::new(a.x, a.y, height),
        ]));
    }
}

/// Linear extrusion of a shape along +z from 0 to `height`.
///
/// Produces bottom cap triangles facing down, top cap triangles facing up and
/// one quad per ring edge, all wound counter-clockwise seen from outside.
pub fn extrude_linear(
    shape: &Shape2D,
    height: f64,
    name: impl Into<String>,
) -> Result<Solid, ExtrudeError> {
    if !height.is_finite() || height <= 0.0 {
        return Err(ExtrudeError::NonPositiveHeight(height));
    }

    let rings = resolve_paths(shape)?;

    let mut flat: Vec<Coord<f64>> = Vec::new();
    let mut hole_indices: Vec<usize> = Vec::new();
    for (i, ring) in rings.iter().enumerate() {
        if i > 0 {
            hole_indices.push(flat.len());
        }
        flat.extend_from_slice(ring);
    }

    let triangles = triangulate_cap(&flat, &hole_indices)?;

    let mut faces = Vec::with_capacity(triangles.len() * 2 + flat.len());

    for [a, b, c] in &triangles {
        let (a, b, c) = (flat[*a], flat[*b], flat[*c]);
        faces.push(Face::new(vec![
            Point3::new(a.x, a.y, 0.0),
            Point3::new(c.x, c.y, 0.0),
            Point3::new(b.x, b.y, 0.0),
        ]));
    }

    for [a, b, c] in &triangles {
        let (a, b, c) = (flat[*a], flat[*b], flat[*c]);
        faces.push(Face::new(vec![
            Point3::new(a.x, a.y, height),
            Point3::new(b.x, b.y, height),
            Point3::new(c.x, c.y, height),
        ]));
    }

    for ring in &rings {
        side_walls(ring, height, &mut faces);
    }

    Ok(Solid::new(name, faces))
}

/// Extrude a projected footprint, outer ring plus holes.
pub fn extrude_polygon(
    polygon: &LocalPolygon,
    height: f64,
    name: impl Into<String>,
) -> Result<Solid, ExtrudeError> {
    extrude_linear(&Shape2D::from_local_polygon(polygon), height, name)
}
