//! End-to-end footprint-to-STL generation.
//!
//! Everything a run learns about its input is returned in a [`PipelineReport`];
//! nothing is kept between calls.

use serde::Serialize;

use crate::baseplate::{generate_baseplate, should_generate_base};
use crate::cancellation::{Clock, SystemClock, TimeBudget};
use crate::config::{BaseMode, PipelineConfig};
use crate::console_log;
use crate::csg_union::{combine_solids, CombineOutcome, DroppedSolid};
use crate::error::{PipelineError, Result};
use crate::extrude::extrude_polygon;
use crate::footprint::{sanitize_polygon, FootprintError};
use crate::geojson_features::{parse_feature_collection, FeatureCollection};
use crate::height::infer_height;
use crate::models::{ComplexityMetrics, GeographicBounds, ScaleRecommendation};
use crate::projection::{
    project_footprint, LocalPolygon, Origin, MIN_FOOTPRINT_AREA_M2, SIMPLIFY_TOLERANCE_M,
};
use crate::scale::{analyze_scale, ScaleAnalysis};
use crate::solid::Solid;
use crate::stl_export::{serialize_mesh, MeshOutput, SerializationTier, SerializeInput, STL_CONTENT_TYPE};

/// Log progress every this many features
const PROGRESS_INTERVAL: usize = 100;

/// Counters and outcomes for one run.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PipelineReport {
    pub features_received: usize,
    pub features_truncated: usize,
    pub features_processed: usize,
    /// Features without Polygon/MultiPolygon geometry
    pub features_skipped: usize,
    pub polygons_processed: usize,
    pub degenerate_rings: usize,
    pub invalid_outer_rings: usize,
    /// Polygons under the minimum printable ground area
    pub small_footprints: usize,
    pub simplified_rings: usize,
    pub non_positive_heights: usize,
    pub extrusion_failures: usize,
    pub solids_built: usize,
    pub base_generated: bool,
    pub dropped_solids: Vec<DroppedSolid>,
    pub combine_outcome: Option<CombineOutcome>,
    pub serialization_tier: Option<SerializationTier>,
    pub tier_failures: Vec<String>,
    pub facet_count: usize,
    pub valid_faces: usize,
    pub invalid_faces: usize,
    pub degenerate_triangles: usize,
    pub elapsed_ms: f64,
    pub budget_exceeded: bool,
}

#[derive(Debug, Clone)]
pub struct GenerationResult {
    pub mesh: MeshOutput,
    pub scale: ScaleRecommendation,
    pub bounds: GeographicBounds,
    pub metrics: ComplexityMetrics,
    pub report: PipelineReport,
    pub filename: String,
}

impl GenerationResult {
    pub fn content_type(&self) -> &'static str {
        STL_CONTENT_TYPE
    }

    pub fn content_disposition(&self) -> String {
        format!("attachment; filename=\"{}\"", self.filename)
    }
}

pub fn stl_filename(scale_factor: u32) -> String {
    format!("buildings_1-{}.stl", scale_factor)
}

/// Parse, truncate and measure a payload without building geometry.
pub fn analyze(body: &str, config: &PipelineConfig) -> Result<ScaleAnalysis> {
    config.validate()?;
    let mut collection = parse_feature_collection(body)?;
    truncate(&mut collection, config.max_features);
    analyze_scale(&collection)
}

pub fn generate(body: &str, config: &PipelineConfig) -> Result<GenerationResult> {
    generate_with_clock(body, config, &SystemClock)
}

pub fn generate_with_clock(
    body: &str,
    config: &PipelineConfig,
    clock: &dyn Clock,
) -> Result<GenerationResult> {
    config.validate()?;
    let budget = TimeBudget::start(clock, config.time_budget_ms);

    let mut collection = parse_feature_collection(body)?;
    let mut report = PipelineReport {
        features_received: collection.features.len(),
        ..Default::default()
    };
    report.features_truncated = truncate(&mut collection, config.max_features);

    let analysis = analyze_scale(&collection)?;
    let scale = analysis.recommendation.scale_factor as f64;
    let (center_lon, center_lat) = analysis.bounds.center();
    let origin = Origin::new(center_lon, center_lat);

    console_log!(
        "Generating STL for {} features at {}",
        collection.features.len(),
        analysis.recommendation.ratio()
    );

    let mut footprints: Vec<LocalPolygon> = Vec::new();
    let mut buildings: Vec<Solid> = Vec::new();

    let total = collection.features.len();
    for (index, feature) in collection.features.iter().enumerate() {
        if budget.is_exceeded() {
            report.budget_exceeded = true;
            console_log!(
                "Time budget of {} ms exceeded after {} features, keeping partial result",
                config.time_budget_ms,
                report.features_processed + report.features_skipped
            );
            break;
        }
        if (index + 1) % PROGRESS_INTERVAL == 0 {
            console_log!("Processing feature {}/{}", index + 1, total);
        }

        let Some(geometry) = feature.footprint() else {
            report.features_skipped += 1;
            continue;
        };
        report.features_processed += 1;

        let model_height = infer_height(&feature.properties).meters / scale;

        for rings in geometry.polygons() {
            report.polygons_processed += 1;

            let footprint = match sanitize_polygon(rings) {
                Ok(footprint) => footprint,
                Err(FootprintError::MissingOuterRing | FootprintError::DegenerateRing(_)) => {
                    report.degenerate_rings += 1;
                    continue;
                }
                Err(_) => {
                    report.invalid_outer_rings += 1;
                    continue;
                }
            };

            if project_footprint(&footprint, origin, 1.0).area() < MIN_FOOTPRINT_AREA_M2 {
                report.small_footprints += 1;
                continue;
            }

            if !model_height.is_finite() || model_height <= 0.0 {
                report.non_positive_heights += 1;
                continue;
            }

            let mut local = project_footprint(&footprint, origin, scale);
            if local.needs_simplification() {
                local = local.simplified(SIMPLIFY_TOLERANCE_M / scale);
                report.simplified_rings += 1;
            }
            let name = format!("building_{}", buildings.len());
            match extrude_polygon(&local, model_height, name) {
                Ok(solid) => {
                    footprints.push(local);
                    buildings.push(solid);
                }
                Err(e) => {
                    console_log!("Extrusion failed: {}", e);
                    report.extrusion_failures += 1;
                }
            }
        }
    }

    report.solids_built = buildings.len();
    if buildings.is_empty() {
        return Err(PipelineError::NoUsableGeometry {
            features: collection.features.len(),
        });
    }

    let want_base = match config.generate_base {
        BaseMode::Auto => {
            should_generate_base(analysis.metrics.building_count, analysis.bounds.area_km2)
        }
        BaseMode::Always => true,
        BaseMode::Never => false,
    };

    let mut solids = Vec::with_capacity(buildings.len() + 1);
    if want_base {
        if let Some(base) =
            generate_baseplate(&footprints, config.base_buffer, config.base_thickness)
        {
            solids.push(base);
            report.base_generated = true;
        }
    }
    solids.extend(buildings);

    let combination =
        combine_solids(&solids, config.max_union_solids, &config.solid_name, &budget);
    report.combine_outcome = Some(combination.outcome);
    report.budget_exceeded |= combination.budget_exceeded;
    report.dropped_solids = combination.dropped;

    let mesh = serialize_mesh(&SerializeInput {
        combined: combination.combined.as_ref(),
        solids: &solids,
        name: &config.solid_name,
    })?;

    report.serialization_tier = Some(mesh.tier);
    report.tier_failures = mesh.tier_failures.clone();
    report.facet_count = mesh.facet_count;
    report.valid_faces = mesh.valid_faces;
    report.invalid_faces = mesh.invalid_faces;
    report.degenerate_triangles = mesh.degenerate_triangles;
    report.elapsed_ms = budget.elapsed_ms();

    console_log!(
        "STL ready: {} facets via {:?} in {:.0} ms",
        mesh.facet_count,
        mesh.tier,
        report.elapsed_ms
    );

    Ok(GenerationResult {
        filename: stl_filename(analysis.recommendation.scale_factor),
        mesh,
        scale: analysis.recommendation,
        bounds: analysis.bounds,
        metrics: analysis.metrics,
        report,
    })
}

/// Keep the first `max_features`; returns how many were cut.
fn truncate(collection: &mut FeatureCollection, max_features: usize) -> usize {
    let total = collection.features.len();
    if total <= max_features {
        return 0;
    }
    collection.features.truncate(max_features);
    console_log!(
        "Truncating input from {} to {} features",
        total,
        max_features
    );
    total - max_features
}
