// This is the models module containing shared data structures
use serde::{Deserialize, Serialize};

/// Geographic extent of all footprint vertices.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GeographicBounds {
    pub min_lon: f64,
    pub min_lat: f64,
    pub max_lon: f64,
    pub max_lat: f64,
    /// Haversine length of the horizontal midline
    pub width_km: f64,
    /// Haversine length of the vertical midline
    pub height_km: f64,
    pub area_km2: f64,
}

impl GeographicBounds {
    pub fn center(&self) -> (f64, f64) {
        (
            (self.min_lon + self.max_lon) / 2.0,
            (self.min_lat + self.max_lat) / 2.0,
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SizeClass {
    Square,
    Neighborhood,
    District,
    City,
    #[serde(rename = "Metropolitan Area")]
    MetropolitanArea,
}

impl SizeClass {
    pub fn label(&self) -> &'static str {
        match self {
            SizeClass::Square => "Square",
            SizeClass::Neighborhood => "Neighborhood",
            SizeClass::District => "District",
            SizeClass::City => "City",
            SizeClass::MetropolitanArea => "Metropolitan Area",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScaleRecommendation {
    /// Model-to-real ratio denominator, e.g. 1000 for 1:1000
    pub scale_factor: u32,
    pub size_class: SizeClass,
    /// Printed footprint, e.g. "12.3 x 8.0 cm"
    pub physical_size: String,
    pub base_scale_factor: u32,
    pub complexity_multiplier: f64,
}

impl ScaleRecommendation {
    pub fn ratio(&self) -> String {
        format!("1:{}", self.scale_factor)
    }
}

/// Per-collection complexity figures feeding the scale choice.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ComplexityMetrics {
    pub building_count: usize,
    pub skipped_features: usize,
    pub total_vertices: usize,
    pub max_vertices_per_building: usize,
    pub average_vertices_per_building: f64,
    /// Buildings per km²
    pub density: f64,
}

/// Everything the JS host needs to offer the download and show metadata.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StlResponse<'a> {
    pub stl: &'a str,
    pub filename: &'a str,
    pub content_type: &'a str,
    pub content_disposition: String,
    pub scale: String,
    pub physical_size: &'a str,
    pub size_class: &'a str,
    pub report: &'a crate::pipeline::PipelineReport,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScaleResponse<'a> {
    pub scale: String,
    pub recommendation: &'a ScaleRecommendation,
    pub bounds: &'a GeographicBounds,
    pub metrics: &'a ComplexityMetrics,
}
