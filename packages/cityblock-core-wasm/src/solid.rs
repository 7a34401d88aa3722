use nalgebra::{Point3, Vector3};

/// One planar polygon face of a solid, counter-clockwise seen from outside.
#[derive(Debug, Clone, PartialEq)]
pub struct Face {
    pub vertices: Vec<Point3<f64>>,
}

impl Face {
    pub fn new(vertices: Vec<Point3<f64>>) -> Self {
        Self { vertices }
    }

    pub fn is_finite(&self) -> bool {
        self.vertices
            .iter()
            .all(|v| v.x.is_finite() && v.y.is_finite() && v.z.is_finite())
    }

    /// Area-weighted normal (Newell's method); zero for degenerate faces.
    pub fn newell_normal(&self) -> Vector3<f64> {
        let n = self.vertices.len();
        let mut normal = Vector3::zeros();
        for i in 0..n {
            let current = self.vertices[i];
            let next = self.vertices[(i + 1) % n];
            normal.x += (current.y - next.y) * (current.z + next.z);
            normal.y += (current.z - next.z) * (current.x + next.x);
            normal.z += (current.x - next.x) * (current.y + next.y);
        }
        normal
    }
}

/// A closed polyhedral solid made of planar faces.
#[derive(Debug, Clone, PartialEq)]
pub struct Solid {
    pub name: String,
    pub faces: Vec<Face>,
}

impl Solid {
    pub fn new(name: impl Into<String>, faces: Vec<Face>) -> Self {
        Self {
            name: name.into(),
            faces,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.faces.is_empty()
    }

    pub fn translate_z(&mut self, dz: f64) {
        for face in &mut self.faces {
            for vertex in &mut face.vertices {
                vertex.z += dz;
            }
        }
    }

    /// Axis-aligned bounds as (min, max), `None` when the solid has no vertices.
    pub fn bounds(&self) -> Option<(Point3<f64>, Point3<f64>)> {
        let mut vertices = self.faces.iter().flat_map(|f| f.vertices.iter());
        let first = *vertices.next()?;
        let (min, max) = vertices.fold((first, first), |(min, max), v| {
            (
                Point3::new(min.x.min(v.x), min.y.min(v.y), min.z.min(v.z)),
                Point3::new(max.x.max(v.x), max.y.max(v.y), max.z.max(v.z)),
            )
        });
        Some((min, max))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn unit_square_face() -> Face {
        Face::new(vec![
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(1.0, 0.0, 0.0),
            Point3::new(1.0, 1.0, 0.0),
            Point3::new(0.0, 1.0, 0.0),
        ])
    }

    #[test]
    fn newell_normal_points_up_for_ccw_face() {
        let normal = unit_square_face().newell_normal();
        assert_eq!(normal, Vector3::new(0.0, 0.0, 2.0));
    }

    #[test]
    fn bounds_and_translation() {
        let mut solid = Solid::new("s", vec![unit_square_face()]);
        solid.translate_z(-0.5);
        let (min, max) = solid.bounds().unwrap();
        assert_eq!(min, Point3::new(0.0, 0.0, -0.5));
        assert_eq!(max, Point3::new(1.0, 1.0, -0.5));
        assert!(Solid::new("empty", vec![]).bounds().is_none());
    }
}
