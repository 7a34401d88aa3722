use geo::BoundingRect;
use geo_types::{Coord, MultiPoint};

use crate::extrude::extrude_polygon;
use crate::projection::LocalPolygon;
use crate::solid::Solid;

pub const BASE_SOLID_NAME: &str = "base";

/// Dense, compact footprint sets print badly without a slab under them.
pub fn should_generate_base(building_count: usize, area_km2: f64) -> bool {
    (building_count > 50 && area_km2 < 5.0) || (building_count > 100 && area_km2 < 10.0)
}

/// Slab under the bounding rectangle of all outer rings, padded by `buffer`.
///
/// The slab spans z in [-thickness, 0] so building bottoms sit on its top face.
pub fn generate_baseplate(polygons: &[LocalPolygon], buffer: f64, thickness: f64) -> Option<Solid> {
    let points: MultiPoint<f64> = polygons
        .iter()
        .flat_map(|polygon| polygon.outer.iter().copied())
        .collect::<Vec<Coord<f64>>>()
        .into();
    let rect = points.bounding_rect()?;

    let min = Coord {
        x: rect.min().x - buffer,
        y: rect.min().y - buffer,
    };
    let max = Coord {
        x: rect.max().x + buffer,
        y: rect.max().y + buffer,
    };
    if max.x - min.x <= 0.0 || max.y - min.y <= 0.0 {
        return None;
    }

    let outline = LocalPolygon {
        outer: vec![min, Coord { x: max.x, y: min.y }, max, Coord { x: min.x, y: max.y }],
        holes: vec![],
    };

    let mut slab = extrude_polygon(&outline, thickness, BASE_SOLID_NAME).ok()?;
    slab.translate_z(-thickness);
    Some(slab)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn square_at(x: f64, y: f64, size: f64) -> LocalPolygon {
        LocalPolygon {
            outer: vec![
                Coord { x, y },
                Coord { x: x + size, y },
                Coord { x: x + size, y: y + size },
                Coord { x, y: y + size },
            ],
            holes: vec![],
        }
    }

    #[test]
    fn base_rule_thresholds() {
        assert!(!should_generate_base(50, 1.0));
        assert!(should_generate_base(51, 1.0));
        assert!(!should_generate_base(51, 5.0));
        assert!(should_generate_base(101, 9.9));
        assert!(!should_generate_base(101, 10.0));
        assert!(!should_generate_base(1000, 12.0));
        assert!(!should_generate_base(0, 0.0));
    }

    #[test]
    fn slab_covers_footprints_with_padding() {
        let polygons = vec![square_at(0.0, 0.0, 0.01), square_at(0.05, 0.02, 0.01)];
        let base = generate_baseplate(&polygons, 0.005, 0.002).unwrap();
        assert_eq!(base.name, "base");

        let (min, max) = base.bounds().unwrap();
        assert_relative_eq!(min.x, -0.005, epsilon = 1e-12);
        assert_relative_eq!(min.y, -0.005, epsilon = 1e-12);
        assert_relative_eq!(max.x, 0.065, epsilon = 1e-12);
        assert_relative_eq!(max.y, 0.035, epsilon = 1e-12);
        assert_relative_eq!(min.z, -0.002, epsilon = 1e-12);
        assert_relative_eq!(max.z, 0.0, epsilon = 1e-12);
    }

    #[test]
    fn no_points_no_slab() {
        assert!(generate_baseplate(&[], 0.005, 0.002).is_none());
    }

    #[test]
    fn unpadded_single_point_is_rejected() {
        let point = LocalPolygon {
            outer: vec![Coord { x: 1.0, y: 1.0 }],
            holes: vec![],
        };
        assert!(generate_baseplate(&[point.clone()], 0.0, 0.002).is_none());
        assert!(generate_baseplate(&[point], 0.005, 0.002).is_some());
    }
}
