use serde_wasm_bindgen::to_value;
use wasm_bindgen::prelude::*;

// Create a console module for logging
pub mod console;
pub mod error;
pub mod config;
pub mod models;
pub mod geojson_features;
pub mod projection;
pub mod footprint;
pub mod height;
pub mod scale;
pub mod solid;
// Import our geometry functions
#[path = "../geometry_functions/extrude.rs"]
pub mod extrude;
pub mod baseplate;
// Boolean union of the extruded solids
pub mod csg_union;
pub mod stl_export;
// Time budget handling
pub mod cancellation;
pub mod pipeline;

pub use config::{BaseMode, PipelineConfig};
pub use error::PipelineError;
pub use pipeline::{generate, generate_with_clock, GenerationResult, PipelineReport};

use models::{ScaleResponse, StlResponse};

// Enable better panic messages in console during development
#[cfg(feature = "console_error_panic_hook")]
pub use console_error_panic_hook::set_once as set_panic_hook;

#[macro_export]
macro_rules! console_log {
    ($($t:tt)*) => ($crate::console::log(&format!($($t)*)))
}

use std::sync::Once;
static INIT: Once = Once::new();

// This sets up the wasm_bindgen start functionality
#[wasm_bindgen(start)]
pub fn start() {
    INIT.call_once(|| {
        // Set the panic hook for better error messages
        #[cfg(feature = "console_error_panic_hook")]
        console_error_panic_hook::set_once();

        console_log!("cityblock core initialized");
    });
}

/// "<status>: <message>", so the host can pick the HTTP status.
fn js_error(error: &PipelineError) -> JsValue {
    JsValue::from_str(&format!("{}: {}", error.status_code(), error))
}

fn stl_response(result: &GenerationResult) -> Result<JsValue, JsValue> {
    let response = StlResponse {
        stl: &result.mesh.stl,
        filename: &result.filename,
        content_type: result.content_type(),
        content_disposition: result.content_disposition(),
        scale: result.scale.ratio(),
        physical_size: &result.scale.physical_size,
        size_class: result.scale.size_class.label(),
        report: &result.report,
    };
    to_value(&response).map_err(|e| JsValue::from_str(&format!("Failed to serialize response: {}", e)))
}

/// Generate an STL from a GeoJSON FeatureCollection with default options.
#[wasm_bindgen]
pub fn generate_stl(geojson: &str) -> Result<JsValue, JsValue> {
    let result = generate(geojson, &PipelineConfig::default()).map_err(|e| js_error(&e))?;
    stl_response(&result)
}

/// Like [`generate_stl`], with a JSON object of camelCase options.
#[wasm_bindgen]
pub fn generate_stl_with_options(geojson: &str, options_json: &str) -> Result<JsValue, JsValue> {
    let config = PipelineConfig::from_json(options_json).map_err(|e| js_error(&e))?;
    let result = generate(geojson, &config).map_err(|e| js_error(&e))?;
    stl_response(&result)
}

/// Scale recommendation, bounds and complexity without building geometry.
#[wasm_bindgen]
pub fn analyze_scale(geojson: &str) -> Result<JsValue, JsValue> {
    let analysis =
        pipeline::analyze(geojson, &PipelineConfig::default()).map_err(|e| js_error(&e))?;
    let response = ScaleResponse {
        scale: analysis.recommendation.ratio(),
        recommendation: &analysis.recommendation,
        bounds: &analysis.bounds,
        metrics: &analysis.metrics,
    };
    to_value(&response).map_err(|e| JsValue::from_str(&format!("Failed to serialize response: {}", e)))
}

#[wasm_bindgen]
pub fn get_default_options() -> Result<JsValue, JsValue> {
    to_value(&PipelineConfig::default())
        .map_err(|e| JsValue::from_str(&format!("Failed to serialize options: {}", e)))
}

/// Reject non-JSON request bodies before they are read.
#[wasm_bindgen]
pub fn validate_content_type(content_type: Option<String>) -> Result<(), JsValue> {
    geojson_features::check_content_type(content_type.as_deref()).map_err(|e| js_error(&e))
}
