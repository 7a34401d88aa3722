//! ASCII STL serialization with layered fallbacks.
//!
//! Tiers are tried in order until one yields at least one facet:
//! the combined solid, each solid as its own block, then a permissive fan
//! triangulation that skips whatever it cannot write.

use earcutr::earcut;
use nalgebra::{Point3, Vector3};
use serde::Serialize;
use thiserror::Error;

use crate::console_log;
use crate::error::PipelineError;
use crate::solid::{Face, Solid};

pub const STL_CONTENT_TYPE: &str = "model/stl";

/// Triangles below this area are not written by the permissive tier.
pub const MIN_TRIANGLE_AREA: f64 = 1e-10;

const NORMAL_EPS: f64 = 1e-12;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum SerializationTier {
    CombinedSolid,
    PerSolid,
    ManualTriangulation,
}

pub const TIERS: [SerializationTier; 3] = [
    SerializationTier::CombinedSolid,
    SerializationTier::PerSolid,
    SerializationTier::ManualTriangulation,
];

#[derive(Error, Debug, Clone, PartialEq)]
pub enum SerializeError {
    #[error("no combined solid available")]
    NoCombinedSolid,

    #[error("no solids to write")]
    NoSolids,

    #[error("solid {solid}, face {face}: {reason}")]
    MalformedFace {
        solid: String,
        face: usize,
        reason: String,
    },

    #[error("output contains no facets")]
    NoFacets,
}

pub struct SerializeInput<'a> {
    pub combined: Option<&'a Solid>,
    /// Base slab first when present, then buildings in input order
    pub solids: &'a [Solid],
    /// Block name for single-block tiers
    pub name: &'a str,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MeshOutput {
    #[serde(skip)]
    pub stl: String,
    pub tier: SerializationTier,
    pub solid_blocks: usize,
    pub facet_count: usize,
    pub valid_faces: usize,
    pub invalid_faces: usize,
    pub degenerate_triangles: usize,
    /// Messages from tiers that failed before this one
    pub tier_failures: Vec<String>,
}

/// Try every tier in order; fails only when all of them do.
pub fn serialize_mesh(input: &SerializeInput) -> Result<MeshOutput, PipelineError> {
    let mut failures = Vec::new();

    for tier in TIERS {
        match serialize_tier(tier, input) {
            Ok(mut output) => {
                output.tier_failures = failures;
                return Ok(output);
            }
            Err(e) => {
                console_log!("STL tier {:?} failed: {}", tier, e);
                failures.push(format!("{:?}: {}", tier, e));
            }
        }
    }

    Err(PipelineError::SerializationExhausted(failures.join("; ")))
}

pub fn serialize_tier(
    tier: SerializationTier,
    input: &SerializeInput,
) -> Result<MeshOutput, SerializeError> {
    let mut writer = StlWriter::new(tier);

    match tier {
        SerializationTier::CombinedSolid => {
            let solid = input.combined.ok_or(SerializeError::NoCombinedSolid)?;
            writer.strict_block(&solid.name, solid)?;
        }
        SerializationTier::PerSolid => {
            if input.solids.is_empty() {
                return Err(SerializeError::NoSolids);
            }
            for solid in input.solids {
                writer.strict_block(&solid.name, solid)?;
            }
        }
        SerializationTier::ManualTriangulation => {
            let solids: Vec<&Solid> = if input.solids.is_empty() {
                input.combined.into_iter().collect()
            } else {
                input.solids.iter().collect()
            };
            if solids.is_empty() {
                return Err(SerializeError::NoSolids);
            }
            writer.begin_solid(input.name);
            for solid in solids {
                for face in &solid.faces {
                    writer.fan_face(face);
                }
            }
            writer.end_solid(input.name);
        }
    }

    writer.finish()
}

struct StlWriter {
    out: String,
    output: MeshOutput,
}

impl StlWriter {
    fn new(tier: SerializationTier) -> Self {
        Self {
            out: String::new(),
            output: MeshOutput {
                stl: String::new(),
                tier,
                solid_blocks: 0,
                facet_count: 0,
                valid_faces: 0,
                invalid_faces: 0,
                degenerate_triangles: 0,
                tier_failures: Vec::new(),
            },
        }
    }

    fn begin_solid(&mut self, name: &str) {
        self.out.push_str(&format!("solid {}\n", name));
        self.output.solid_blocks += 1;
    }

    fn end_solid(&mut self, name: &str) {
        self.out.push_str(&format!("endsolid {}\n", name));
    }

    fn facet(&mut self, normal: &Vector3<f64>, triangle: [&Point3<f64>; 3]) {
        self.out.push_str(&format!(
            "  facet normal {} {} {}\n    outer loop\n",
            fmt_coord(normal.x),
            fmt_coord(normal.y),
            fmt_coord(normal.z)
        ));
        for p in triangle {
            self.out.push_str(&format!(
                "      vertex {} {} {}\n",
                fmt_coord(p.x),
                fmt_coord(p.y),
                fmt_coord(p.z)
            ));
        }
        self.out.push_str("    endloop\n  endfacet\n");
        self.output.facet_count += 1;
    }

    /// One block; any malformed face fails the whole tier.
    fn strict_block(&mut self, name: &str, solid: &Solid) -> Result<(), SerializeError> {
        self.begin_solid(name);
        for (index, face) in solid.faces.iter().enumerate() {
            let (normal, triangles) =
                triangulate_face(face).map_err(|reason| SerializeError::MalformedFace {
                    solid: solid.name.clone(),
                    face: index,
                    reason,
                })?;
            for [a, b, c] in triangles {
                self.facet(&normal, [&face.vertices[a], &face.vertices[b], &face.vertices[c]]);
            }
            self.output.valid_faces += 1;
        }
        self.end_solid(name);
        Ok(())
    }

    /// Fan from vertex 0, normal from the first triangle. Never fails.
    fn fan_face(&mut self, face: &Face) {
        if face.vertices.len() < 3 || !face.is_finite() {
            self.output.invalid_faces += 1;
            return;
        }

        let v = &face.vertices;
        let normal = (v[1] - v[0])
            .cross(&(v[2] - v[0]))
            .try_normalize(NORMAL_EPS)
            .unwrap_or_else(Vector3::zeros);

        for i in 1..v.len() - 1 {
            let area = (v[i] - v[0]).cross(&(v[i + 1] - v[0])).norm() * 0.5;
            if area < MIN_TRIANGLE_AREA {
                self.output.degenerate_triangles += 1;
                continue;
            }
            self.facet(&normal, [&v[0], &v[i], &v[i + 1]]);
        }
        self.output.valid_faces += 1;
    }

    fn finish(mut self) -> Result<MeshOutput, SerializeError> {
        if self.output.facet_count == 0 {
            return Err(SerializeError::NoFacets);
        }
        self.output.stl = self.out;
        Ok(self.output)
    }
}

/// Unit normal plus triangles (indices into the face) wound to match it.
fn triangulate_face(face: &Face) -> Result<(Vector3<f64>, Vec<[usize; 3]>), String> {
    if face.vertices.len() < 3 {
        return Err(format!("{} vertices", face.vertices.len()));
    }
    if !face.is_finite() {
        return Err("non-finite vertex".to_string());
    }
    let normal = face
        .newell_normal()
        .try_normalize(NORMAL_EPS)
        .ok_or_else(|| "zero-area face".to_string())?;

    if face.vertices.len() == 3 {
        return Ok((normal, vec![[0, 1, 2]]));
    }

    // Drop the axis the face is most perpendicular to
    let (ax, ay) = if normal.x.abs() >= normal.y.abs() && normal.x.abs() >= normal.z.abs() {
        (1, 2)
    } else if normal.y.abs() >= normal.z.abs() {
        (2, 0)
    } else {
        (0, 1)
    };
    let data: Vec<f64> = face
        .vertices
        .iter()
        .flat_map(|p| [p[ax], p[ay]])
        .collect();
    let indices = earcut(&data, &[], 2).map_err(|e| format!("triangulation failed: {:?}", e))?;

    let v = &face.vertices;
    let triangles: Vec<[usize; 3]> = indices
        .chunks_exact(3)
        .filter_map(|tri| {
            let cross = (v[tri[1]] - v[tri[0]]).cross(&(v[tri[2]] - v[tri[0]]));
            if cross.norm() * 0.5 < MIN_TRIANGLE_AREA {
                None
            } else if cross.dot(&normal) < 0.0 {
                Some([tri[0], tri[2], tri[1]])
            } else {
                Some([tri[0], tri[1], tri[2]])
            }
        })
        .collect();

    if triangles.is_empty() {
        return Err("triangulation produced no triangles".to_string());
    }
    Ok((normal, triangles))
}

/// Six decimals, with negative zero written as positive.
fn fmt_coord(value: f64) -> String {
    let formatted = format!("{:.6}", value);
    if formatted == "-0.000000" {
        "0.000000".to_string()
    } else {
        formatted
    }
}
