use geo::{Distance, Haversine, Point};

use crate::error::PipelineError;
use crate::geojson_features::FeatureCollection;
use crate::models::{ComplexityMetrics, GeographicBounds, ScaleRecommendation, SizeClass};

/// Density and vertex averages are ignored below this many buildings
pub const MIN_BUILDINGS_FOR_COMPLEXITY: usize = 10;

/// Upper (exclusive) area limit in km² and base factor for each band
const AREA_BANDS: [(f64, u32, SizeClass); 4] = [
    (0.1, 1000, SizeClass::Square),
    (0.5, 2000, SizeClass::Neighborhood),
    (2.0, 5000, SizeClass::District),
    (10.0, 10000, SizeClass::City),
];
const LARGEST_BAND: (u32, SizeClass) = (20000, SizeClass::MetropolitanArea);

#[derive(Debug, Clone, PartialEq)]
pub struct ScaleAnalysis {
    pub bounds: GeographicBounds,
    pub metrics: ComplexityMetrics,
    pub recommendation: ScaleRecommendation,
}

/// Great-circle distance in km between two (lon, lat) points given in degrees.
pub fn haversine_km(lon1: f64, lat1: f64, lon2: f64, lat2: f64) -> f64 {
    Haversine::distance(Point::new(lon1, lat1), Point::new(lon2, lat2)) / 1000.0
}

/// Base factor and size class for an area, before complexity adjustment.
pub fn base_scale_for_area(area_km2: f64) -> (u32, SizeClass) {
    AREA_BANDS
        .iter()
        .find(|(limit, _, _)| area_km2 < *limit)
        .map(|&(_, factor, class)| (factor, class))
        .unwrap_or(LARGEST_BAND)
}

/// Multiplier from building density (per km²) and average ring vertices.
pub fn complexity_multiplier(density: f64, average_vertices: f64) -> f64 {
    let density_factor = if density > 1000.0 {
        1.5
    } else if density > 500.0 {
        1.3
    } else if density < 50.0 {
        0.8
    } else {
        1.0
    };

    let vertex_factor = if average_vertices > 50.0 {
        1.2
    } else if average_vertices < 10.0 {
        0.9
    } else {
        1.0
    };

    density_factor * vertex_factor
}

fn physical_size(width_km: f64, height_km: f64, scale_factor: u32) -> String {
    let to_cm = |km: f64| km * 100_000.0 / scale_factor as f64;
    format!("{:.1} x {:.1} cm", to_cm(width_km), to_cm(height_km))
}

/// Measure the collection and pick a scale.
///
/// Fails only when no feature has any Polygon/MultiPolygon coordinate.
pub fn analyze_scale(collection: &FeatureCollection) -> Result<ScaleAnalysis, PipelineError> {
    let mut min_lon = f64::INFINITY;
    let mut min_lat = f64::INFINITY;
    let mut max_lon = f64::NEG_INFINITY;
    let mut max_lat = f64::NEG_INFINITY;

    let mut building_count = 0usize;
    let mut skipped_features = 0usize;
    let mut total_vertices = 0usize;
    let mut max_vertices_per_building = 0usize;

    for feature in &collection.features {
        let Some(geometry) = feature.footprint() else {
            skipped_features += 1;
            continue;
        };

        let mut building_vertices = 0usize;
        for rings in geometry.polygons() {
            for ring in rings {
                for point in ring {
                    min_lon = min_lon.min(point.x);
                    min_lat = min_lat.min(point.y);
                    max_lon = max_lon.max(point.x);
                    max_lat = max_lat.max(point.y);
                }
                building_vertices += ring.len();
            }
        }

        if building_vertices == 0 {
            skipped_features += 1;
            continue;
        }

        building_count += 1;
        total_vertices += building_vertices;
        max_vertices_per_building = max_vertices_per_building.max(building_vertices);
    }

    if building_count == 0 {
        return Err(PipelineError::NoUsableGeometry {
            features: collection.features.len(),
        });
    }

    let mid_lat = (min_lat + max_lat) / 2.0;
    let mid_lon = (min_lon + max_lon) / 2.0;
    let width_km = haversine_km(min_lon, mid_lat, max_lon, mid_lat);
    let height_km = haversine_km(mid_lon, min_lat, mid_lon, max_lat);
    let area_km2 = width_km * height_km;

    let bounds = GeographicBounds {
        min_lon,
        min_lat,
        max_lon,
        max_lat,
        width_km,
        height_km,
        area_km2,
    };

    let average_vertices = total_vertices as f64 / building_count as f64;
    let density = building_count as f64 / area_km2.max(1e-9);

    let metrics = ComplexityMetrics {
        building_count,
        skipped_features,
        total_vertices,
        max_vertices_per_building,
        average_vertices_per_building: average_vertices,
        density,
    };

    let (base_scale_factor, size_class) = base_scale_for_area(area_km2);
    let multiplier = if building_count >= MIN_BUILDINGS_FOR_COMPLEXITY {
        complexity_multiplier(density, average_vertices)
    } else {
        1.0
    };
    let scale_factor = (base_scale_factor as f64 * multiplier).round() as u32;

    let recommendation = ScaleRecommendation {
        scale_factor,
        size_class,
        physical_size: physical_size(width_km, height_km, scale_factor),
        base_scale_factor,
        complexity_multiplier: multiplier,
    };

    Ok(ScaleAnalysis {
        bounds,
        metrics,
        recommendation,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geojson_features::parse_feature_collection;
    use approx::assert_relative_eq;

    #[test]
    fn band_boundaries_are_exact() {
        let cases = [
            (0.0999, 1000),
            (0.1, 2000),
            (0.4999, 2000),
            (0.5, 5000),
            (1.9999, 5000),
            (2.0, 10000),
            (9.9999, 10000),
            (10.0, 20000),
            (500.0, 20000),
        ];
        for (area, expected) in cases {
            assert_eq!(base_scale_for_area(area).0, expected, "area {area}");
        }
        assert_eq!(base_scale_for_area(0.01).1, SizeClass::Square);
        assert_eq!(base_scale_for_area(25.0).1, SizeClass::MetropolitanArea);
    }

    #[test]
    fn bands_are_monotonic() {
        let mut previous = 0;
        for step in 0..2000 {
            let (factor, _) = base_scale_for_area(step as f64 * 0.01);
            assert!(factor >= previous);
            previous = factor;
        }
    }

    #[test]
    fn complexity_adjustments() {
        assert_relative_eq!(complexity_multiplier(1500.0, 20.0), 1.5);
        assert_relative_eq!(complexity_multiplier(700.0, 20.0), 1.3);
        assert_relative_eq!(complexity_multiplier(200.0, 20.0), 1.0);
        assert_relative_eq!(complexity_multiplier(10.0, 20.0), 0.8);
        assert_relative_eq!(complexity_multiplier(200.0, 80.0), 1.2);
        assert_relative_eq!(complexity_multiplier(200.0, 5.0), 0.9);
        assert_relative_eq!(complexity_multiplier(1500.0, 80.0), 1.8, epsilon = 1e-12);
    }

    #[test]
    fn haversine_one_degree_of_latitude() {
        assert_relative_eq!(haversine_km(0.0, 0.0, 0.0, 1.0), 111.195, epsilon = 1e-3);
        assert_relative_eq!(haversine_km(10.0, 45.0, 10.0, 45.0), 0.0);
    }

    #[test]
    fn single_small_square_is_one_to_one_thousand() {
        let fc = parse_feature_collection(
            r#"{"features": [{"properties": {"height": "10m"}, "geometry": {"type": "Polygon",
                "coordinates": [[[0.0, 0.0], [0.0002, 0.0], [0.0002, 0.0002], [0.0, 0.0002], [0.0, 0.0]]]}}]}"#,
        )
        .unwrap();
        let analysis = analyze_scale(&fc).unwrap();
        assert!(analysis.bounds.area_km2 < 0.1);
        assert_eq!(analysis.recommendation.scale_factor, 1000);
        assert_eq!(analysis.recommendation.size_class, SizeClass::Square);
        assert_eq!(analysis.metrics.building_count, 1);
        assert_eq!(analysis.metrics.total_vertices, 5);
        assert_eq!(analysis.recommendation.ratio(), "1:1000");
    }

    #[test]
    fn physical_size_is_reported_in_centimeters() {
        // 1 km wide at 1:10000 prints 10 cm wide
        assert_eq!(physical_size(1.0, 0.5, 10000), "10.0 x 5.0 cm");
    }

    #[test]
    fn skips_features_without_footprints() {
        let fc = parse_feature_collection(
            r#"{"features": [
                {"geometry": {"type": "Point", "coordinates": [0, 0]}},
                {"geometry": {"type": "Polygon", "coordinates": [[[0,0],[0.001,0],[0.001,0.001]]]}}
            ]}"#,
        )
        .unwrap();
        let analysis = analyze_scale(&fc).unwrap();
        assert_eq!(analysis.metrics.skipped_features, 1);
        assert_eq!(analysis.metrics.building_count, 1);
    }

    #[test]
    fn no_usable_geometry_is_an_error() {
        let fc = parse_feature_collection(
            r#"{"features": [{"geometry": {"type": "LineString", "coordinates": [[0,0],[1,1]]}},
                             {"geometry": {"type": "Polygon", "coordinates": []}}]}"#,
        )
        .unwrap();
        assert_eq!(
            analyze_scale(&fc),
            Err(PipelineError::NoUsableGeometry { features: 2 })
        );
    }

    #[test]
    fn dense_city_block_gets_complexity_adjustment() {
        // 12 x 12 small squares packed into roughly 0.35 x 0.35 km
        let mut features = Vec::new();
        for i in 0..12 {
            for j in 0..12 {
                let x = i as f64 * 0.00028;
                let y = j as f64 * 0.00028;
                let d = 0.0001;
                features.push(format!(
                    r#"{{"geometry": {{"type": "Polygon", "coordinates": [[[{x},{y}],[{},{y}],[{},{}],[{x},{}],[{x},{y}]]]}}}}"#,
                    x + d,
                    x + d,
                    y + d,
                    y + d
                ));
            }
        }
        let body = format!(r#"{{"features": [{}]}}"#, features.join(","));
        let fc = parse_feature_collection(&body).unwrap();
        let analysis = analyze_scale(&fc).unwrap();

        assert_eq!(analysis.metrics.building_count, 144);
        assert!(analysis.metrics.density > 1000.0);
        assert_eq!(analysis.recommendation.base_scale_factor, 2000);
        // density x1.5, five vertices per ring x0.9
        assert_eq!(analysis.recommendation.scale_factor, 2700);
    }
}
