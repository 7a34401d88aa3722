//! Building height inference from feature properties.
//!
//! Rules are applied in a fixed order: explicit `height`, then
//! `building:levels`, then the `building` type tag, then a default.
//! A value that cannot be parsed, or parses to zero, falls through to the
//! next rule.

use serde::Serialize;
use serde_json::{Map, Value};

pub const DEFAULT_HEIGHT: f64 = 15.0;
pub const MIN_EXPLICIT_HEIGHT: f64 = 3.0;
pub const MAX_EXPLICIT_HEIGHT: f64 = 300.0;
pub const METERS_PER_LEVEL: f64 = 3.5;

const HEIGHT_KEY: &str = "height";
const LEVELS_KEY: &str = "building:levels";
const BUILDING_KEY: &str = "building";

/// Which rule produced a height.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum HeightSource {
    Explicit,
    Levels,
    BuildingType,
    Default,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct HeightEstimate {
    pub meters: f64,
    pub source: HeightSource,
}

pub fn infer_height(properties: &Map<String, Value>) -> HeightEstimate {
    if let Some(meters) = properties.get(HEIGHT_KEY).and_then(parse_explicit_height) {
        return HeightEstimate {
            meters: meters.clamp(MIN_EXPLICIT_HEIGHT, MAX_EXPLICIT_HEIGHT),
            source: HeightSource::Explicit,
        };
    }

    if let Some(levels) = properties.get(LEVELS_KEY).and_then(parse_levels) {
        return HeightEstimate {
            meters: levels as f64 * METERS_PER_LEVEL,
            source: HeightSource::Levels,
        };
    }

    if let Some(meters) = properties
        .get(BUILDING_KEY)
        .and_then(|v| v.as_str())
        .and_then(building_type_height)
    {
        return HeightEstimate {
            meters,
            source: HeightSource::BuildingType,
        };
    }

    HeightEstimate {
        meters: DEFAULT_HEIGHT,
        source: HeightSource::Default,
    }
}

/// Numbers are used as-is; strings may carry a unit suffix ("10m", "12.5 m").
fn parse_explicit_height(value: &Value) -> Option<f64> {
    let height = match value {
        Value::Number(n) => n.as_f64().filter(|h| h.is_finite()),
        Value::String(s) => {
            let trimmed = s.trim();
            let numeric = trimmed
                .trim_end_matches(|c: char| c.is_alphabetic())
                .trim_end();
            numeric.parse::<f64>().ok().filter(|h| h.is_finite())
        }
        _ => None,
    };
    height.filter(|&h| h != 0.0)
}

/// Whole levels only; a fractional count is truncated.
fn parse_levels(value: &Value) -> Option<i64> {
    let levels = match value {
        Value::Number(n) => n
            .as_i64()
            .or_else(|| n.as_f64().filter(|l| l.is_finite()).map(|l| l.trunc() as i64)),
        Value::String(s) => {
            let trimmed = s.trim();
            trimmed.parse::<i64>().ok().or_else(|| {
                trimmed
                    .parse::<f64>()
                    .ok()
                    .filter(|l| l.is_finite())
                    .map(|l| l.trunc() as i64)
            })
        }
        _ => None,
    };
    levels.filter(|&l| l != 0)
}

fn building_type_height(building: &str) -> Option<f64> {
    match building.trim().to_lowercase().as_str() {
        "house" | "detached" | "residential" => Some(8.0),
        "apartments" | "commercial" | "retail" => Some(25.0),
        "office" | "tower" => Some(45.0),
        "skyscraper" => Some(120.0),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn props(value: Value) -> Map<String, Value> {
        value.as_object().cloned().unwrap()
    }

    #[test]
    fn explicit_height_strips_unit_suffix() {
        let h = infer_height(&props(json!({"height": "10m"})));
        assert_eq!(h, HeightEstimate { meters: 10.0, source: HeightSource::Explicit });
        assert_eq!(infer_height(&props(json!({"height": "12.5 m"}))).meters, 12.5);
        assert_eq!(infer_height(&props(json!({"height": 42}))).meters, 42.0);
    }

    #[test]
    fn explicit_height_is_clamped() {
        assert_eq!(infer_height(&props(json!({"height": "1"}))).meters, 3.0);
        assert_eq!(infer_height(&props(json!({"height": 2.99}))).meters, 3.0);
        assert_eq!(infer_height(&props(json!({"height": 3.0}))).meters, 3.0);
        assert_eq!(infer_height(&props(json!({"height": 300}))).meters, 300.0);
        assert_eq!(infer_height(&props(json!({"height": "828m"}))).meters, 300.0);
        assert_eq!(infer_height(&props(json!({"height": -20}))).meters, 3.0);
    }

    #[test]
    fn explicit_height_wins_over_levels_and_type() {
        let h = infer_height(&props(json!({
            "height": "20",
            "building:levels": "10",
            "building": "skyscraper"
        })));
        assert_eq!(h.meters, 20.0);
        assert_eq!(h.source, HeightSource::Explicit);
    }

    #[test]
    fn levels_multiply_exactly() {
        for levels in 1..=60 {
            let h = infer_height(&props(json!({"building:levels": levels})));
            assert_eq!(h.meters, levels as f64 * 3.5);
            assert_eq!(h.source, HeightSource::Levels);
        }
        assert_eq!(infer_height(&props(json!({"building:levels": "4"}))).meters, 14.0);
        assert_eq!(infer_height(&props(json!({"building:levels": 2.7}))).meters, 7.0);
        // Levels are not clamped
        assert_eq!(infer_height(&props(json!({"building:levels": 100}))).meters, 350.0);
    }

    #[test]
    fn unparsable_height_falls_through() {
        let h = infer_height(&props(json!({"height": "tall", "building:levels": "3"})));
        assert_eq!(h.meters, 10.5);
        assert_eq!(h.source, HeightSource::Levels);
    }

    #[test]
    fn zero_values_fall_through() {
        let h = infer_height(&props(json!({"height": 0, "building:levels": 4})));
        assert_eq!(h, HeightEstimate { meters: 14.0, source: HeightSource::Levels });

        let h = infer_height(&props(json!({"height": "0m", "building": "house"})));
        assert_eq!(h, HeightEstimate { meters: 8.0, source: HeightSource::BuildingType });

        let h = infer_height(&props(json!({"building:levels": 0})));
        assert_eq!(h, HeightEstimate { meters: 15.0, source: HeightSource::Default });

        // 0.4 levels truncate to zero
        let h = infer_height(&props(json!({"building:levels": "0.4", "building": "office"})));
        assert_eq!(h.meters, 45.0);
    }

    #[test]
    fn building_type_table() {
        let cases = [
            ("house", 8.0),
            ("Detached", 8.0),
            ("residential", 8.0),
            ("apartments", 25.0),
            ("commercial", 25.0),
            ("RETAIL", 25.0),
            ("office", 45.0),
            ("tower", 45.0),
            ("skyscraper", 120.0),
        ];
        for (tag, expected) in cases {
            let h = infer_height(&props(json!({"building": tag})));
            assert_eq!(h.meters, expected, "{tag}");
            assert_eq!(h.source, HeightSource::BuildingType);
        }
    }

    #[test]
    fn falls_back_to_default() {
        assert_eq!(infer_height(&Map::new()).meters, 15.0);
        let h = infer_height(&props(json!({"building": "yes", "height": null})));
        assert_eq!(h, HeightEstimate { meters: 15.0, source: HeightSource::Default });
    }

    #[test]
    fn inference_is_pure() {
        let p = props(json!({"height": "33.3m", "building": "office"}));
        let first = infer_height(&p);
        for _ in 0..10 {
            assert_eq!(infer_height(&p), first);
        }
    }
}
