use geo_types::Coord;
use serde_json::{Map, Value};

use crate::error::PipelineError;

/// An implicitly closed ring of (longitude, latitude) points.
pub type Ring = Vec<Coord<f64>>;

/// Footprint geometry extracted from a GeoJSON feature.
#[derive(Debug, Clone, PartialEq)]
pub enum FootprintGeometry {
    /// Outer ring first, holes after.
    Polygon(Vec<Ring>),
    MultiPolygon(Vec<Vec<Ring>>),
    /// Any other geometry type; kept so it can be counted and skipped.
    Unsupported(String),
}

impl FootprintGeometry {
    /// Polygons (each a list of rings) carried by this geometry.
    pub fn polygons(&self) -> Vec<&[Ring]> {
        match self {
            FootprintGeometry::Polygon(rings) => vec![rings.as_slice()],
            FootprintGeometry::MultiPolygon(polygons) => {
                polygons.iter().map(|rings| rings.as_slice()).collect()
            }
            FootprintGeometry::Unsupported(_) => Vec::new(),
        }
    }

    pub fn is_footprint(&self) -> bool {
        !matches!(self, FootprintGeometry::Unsupported(_))
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Feature {
    pub geometry: Option<FootprintGeometry>,
    pub properties: Map<String, Value>,
}

impl Feature {
    /// Footprint geometry, if the feature has a Polygon or MultiPolygon.
    pub fn footprint(&self) -> Option<&FootprintGeometry> {
        self.geometry.as_ref().filter(|g| g.is_footprint())
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct FeatureCollection {
    pub features: Vec<Feature>,
}

/// Accepts `application/json` and any `+json` media type, with parameters.
pub fn check_content_type(content_type: Option<&str>) -> Result<(), PipelineError> {
    let raw = content_type.unwrap_or("").trim();
    let media_type = raw
        .split(';')
        .next()
        .unwrap_or("")
        .trim()
        .to_ascii_lowercase();

    if media_type == "application/json" || media_type.ends_with("+json") {
        Ok(())
    } else {
        Err(PipelineError::UnsupportedContentType(if raw.is_empty() {
            "<none>".to_string()
        } else {
            raw.to_string()
        }))
    }
}

/// Validate and parse a FeatureCollection payload.
///
/// Rejects the whole request before any processing when the body is empty,
/// not JSON, not an object, lacks a `features` array, or has zero features.
/// Individual malformed features are kept (with no geometry) so that they
/// are counted and skipped downstream instead of failing the batch.
pub fn parse_feature_collection(body: &str) -> Result<FeatureCollection, PipelineError> {
    if body.trim().is_empty() {
        return Err(PipelineError::EmptyBody);
    }

    let value: Value =
        serde_json::from_str(body).map_err(|e| PipelineError::InvalidJson(e.to_string()))?;

    let object = value.as_object().ok_or(PipelineError::NotAnObject)?;

    let features = object
        .get("features")
        .and_then(|f| f.as_array())
        .ok_or(PipelineError::MissingFeatures)?;

    if features.is_empty() {
        return Err(PipelineError::NoFeatures);
    }

    Ok(FeatureCollection {
        features: features.iter().map(parse_feature).collect(),
    })
}

fn parse_feature(value: &Value) -> Feature {
    let properties = value
        .get("properties")
        .and_then(|p| p.as_object())
        .cloned()
        .unwrap_or_default();

    let geometry = value
        .get("geometry")
        .filter(|g| !g.is_null())
        .and_then(parse_geometry);

    Feature {
        geometry,
        properties,
    }
}

fn parse_geometry(value: &Value) -> Option<FootprintGeometry> {
    let geometry_type = value.get("type")?.as_str()?;
    let coordinates = value.get("coordinates");

    match geometry_type {
        "Polygon" => {
            let rings = coordinates?.as_array()?;
            Some(FootprintGeometry::Polygon(parse_rings(rings)))
        }
        "MultiPolygon" => {
            let polygons = coordinates?
                .as_array()?
                .iter()
                .filter_map(|p| p.as_array())
                .map(|rings| parse_rings(rings))
                .collect();
            Some(FootprintGeometry::MultiPolygon(polygons))
        }
        other => Some(FootprintGeometry::Unsupported(other.to_string())),
    }
}

fn parse_rings(rings: &[Value]) -> Vec<Ring> {
    rings
        .iter()
        .filter_map(|ring| ring.as_array())
        .map(|positions| positions.iter().filter_map(parse_position).collect())
        .collect()
}

// Altitude (third ordinate) is ignored.
fn parse_position(position: &Value) -> Option<Coord<f64>> {
    let pair = position.as_array()?;
    if pair.len() < 2 {
        return None;
    }
    let x = pair[0].as_f64()?;
    let y = pair[1].as_f64()?;
    if !x.is_finite() || !y.is_finite() {
        return None;
    }
    Some(Coord { x, y })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_bad_payloads_before_processing() {
        assert_eq!(parse_feature_collection("   "), Err(PipelineError::EmptyBody));
        assert!(matches!(
            parse_feature_collection("{not json"),
            Err(PipelineError::InvalidJson(_))
        ));
        assert_eq!(parse_feature_collection("[1, 2]"), Err(PipelineError::NotAnObject));
        assert_eq!(
            parse_feature_collection(r#"{"type": "FeatureCollection"}"#),
            Err(PipelineError::MissingFeatures)
        );
        assert_eq!(
            parse_feature_collection(r#"{"features": {"a": 1}}"#),
            Err(PipelineError::MissingFeatures)
        );
        assert_eq!(
            parse_feature_collection(r#"{"features": []}"#),
            Err(PipelineError::NoFeatures)
        );
    }

    #[test]
    fn parses_polygon_and_multipolygon() {
        let body = r#"{
            "type": "FeatureCollection",
            "features": [
                {"type": "Feature", "properties": {"height": "10m"},
                 "geometry": {"type": "Polygon", "coordinates": [[[0,0],[1,0],[1,1],[0,0]]]}},
                {"type": "Feature", "properties": null,
                 "geometry": {"type": "MultiPolygon", "coordinates": [[[[0,0],[1,0,12.5],[1,1]]], [[[2,2],[3,2],[3,3]]]]}}
            ]
        }"#;
        let fc = parse_feature_collection(body).unwrap();
        assert_eq!(fc.features.len(), 2);

        let first = fc.features[0].footprint().unwrap();
        assert_eq!(first.polygons().len(), 1);
        assert_eq!(first.polygons()[0][0].len(), 4);
        assert_eq!(fc.features[0].properties["height"], "10m");

        let second = fc.features[1].footprint().unwrap();
        assert_eq!(second.polygons().len(), 2);
        assert_eq!(second.polygons()[0][0][1], Coord { x: 1.0, y: 0.0 });
        assert!(fc.features[1].properties.is_empty());
    }

    #[test]
    fn keeps_unsupported_and_missing_geometries_for_counting() {
        let body = r#"{"features": [
            {"geometry": {"type": "Point", "coordinates": [0, 0]}},
            {"geometry": null},
            {"properties": {}}
        ]}"#;
        let fc = parse_feature_collection(body).unwrap();
        assert_eq!(fc.features.len(), 3);
        assert_eq!(
            fc.features[0].geometry,
            Some(FootprintGeometry::Unsupported("Point".to_string()))
        );
        assert!(fc.features.iter().all(|f| f.footprint().is_none()));
    }

    #[test]
    fn drops_short_positions() {
        let body = r#"{"features": [
            {"geometry": {"type": "Polygon", "coordinates": [[[0,0],[1],[1,1],["a", 2],[0,1]]]}}
        ]}"#;
        let fc = parse_feature_collection(body).unwrap();
        let polygons = fc.features[0].footprint().unwrap().polygons();
        assert_eq!(polygons[0][0].len(), 3);
    }

    #[test]
    fn content_type_check() {
        assert!(check_content_type(Some("application/json")).is_ok());
        assert!(check_content_type(Some("application/geo+json; charset=utf-8")).is_ok());
        assert!(check_content_type(Some("Application/JSON")).is_ok());
        assert!(matches!(
            check_content_type(Some("text/plain")),
            Err(PipelineError::UnsupportedContentType(_))
        ));
        assert!(check_content_type(None).is_err());
    }
}
