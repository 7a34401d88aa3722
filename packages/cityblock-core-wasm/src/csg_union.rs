use csgrs::float_types::Real;
use csgrs::mesh::polygon::Polygon as CsgPolygon;
use csgrs::mesh::vertex::Vertex as CsgVertex;
use csgrs::mesh::Mesh as CSG;
use csgrs::traits::CSG as _;
use serde::Serialize;

use crate::cancellation::TimeBudget;
use crate::console_log;
use crate::solid::{Face, Solid};

const NORMAL_EPS: Real = 1e-10;

/// A solid left out of the union, with the reason.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DroppedSolid {
    pub name: String,
    pub reason: String,
}

impl DroppedSolid {
    fn new(name: &str, reason: impl Into<String>) -> Self {
        Self {
            name: name.to_string(),
            reason: reason.into(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum CombineOutcome {
    /// Nothing to combine.
    Empty,
    /// Exactly one solid; union skipped.
    Single,
    /// Boolean union of two or more solids.
    Combined,
    /// Too many solids, or the time budget ran out mid-fold; callers
    /// serialize them separately.
    Skipped,
    /// No solid could be converted for the union.
    Failed,
}

#[derive(Debug, Clone)]
pub struct Combination {
    pub combined: Option<Solid>,
    pub outcome: CombineOutcome,
    pub dropped: Vec<DroppedSolid>,
    pub budget_exceeded: bool,
}

impl Combination {
    fn skipped(budget_exceeded: bool) -> Self {
        Self {
            combined: None,
            outcome: CombineOutcome::Skipped,
            dropped: Vec::new(),
            budget_exceeded,
        }
    }
}

/// Union all solids into one named solid.
///
/// The union is a left fold in list order. A solid that cannot be converted,
/// or whose union with the accumulator comes back empty or non-finite, is
/// dropped and the accumulator carries on unchanged. The budget is polled
/// before every step; once it is spent the partial union is discarded.
pub fn combine_solids(
    solids: &[Solid],
    max_union_solids: usize,
    name: &str,
    budget: &TimeBudget,
) -> Combination {
    match solids.len() {
        0 => {
            return Combination {
                combined: None,
                outcome: CombineOutcome::Empty,
                dropped: Vec::new(),
                budget_exceeded: false,
            }
        }
        1 => {
            return Combination {
                combined: Some(Solid::new(name, solids[0].faces.clone())),
                outcome: CombineOutcome::Single,
                dropped: Vec::new(),
                budget_exceeded: false,
            }
        }
        n if n > max_union_solids => {
            console_log!(
                "Skipping union of {} solids (limit {})",
                n,
                max_union_solids
            );
            return Combination::skipped(false);
        }
        _ => {}
    }

    let mut dropped = Vec::new();
    let mut accumulated: Option<CSG<()>> = None;
    for (index, solid) in solids.iter().enumerate() {
        if budget.is_exceeded() {
            console_log!(
                "Time budget exceeded after {} of {} union steps, writing solids separately",
                index,
                solids.len()
            );
            return Combination::skipped(true);
        }
        match union_step(accumulated.as_ref(), solid) {
            Ok(next) => accumulated = Some(next),
            Err(reason) => {
                console_log!("Dropping solid {} from union: {}", reason.name, reason.reason);
                dropped.push(reason);
            }
        }
    }

    let combined = accumulated.and_then(|mesh| csg_to_solid(&mesh, name));
    let outcome = if combined.is_some() {
        CombineOutcome::Combined
    } else {
        CombineOutcome::Failed
    };

    Combination {
        combined,
        outcome,
        dropped,
        budget_exceeded: false,
    }
}

fn union_step(acc: Option<&CSG<()>>, solid: &Solid) -> Result<CSG<()>, DroppedSolid> {
    let mesh = solid_to_csg(solid)
        .ok_or_else(|| DroppedSolid::new(&solid.name, "no valid faces for union"))?;

    let Some(acc) = acc else {
        return Ok(mesh);
    };

    let merged = acc.union(&mesh);
    if merged.polygons.is_empty() {
        return Err(DroppedSolid::new(&solid.name, "union result is empty"));
    }
    let finite = merged.polygons.iter().all(|polygon| {
        polygon
            .vertices
            .iter()
            .all(|v| v.pos.coords.iter().all(|c| c.is_finite()))
    });
    if !finite {
        return Err(DroppedSolid::new(
            &solid.name,
            "union result has non-finite vertices",
        ));
    }
    Ok(merged)
}

/// Faces become CSG polygons carrying their unit normal; degenerate faces are skipped.
fn solid_to_csg(solid: &Solid) -> Option<CSG<()>> {
    let polygons: Vec<CsgPolygon<()>> = solid
        .faces
        .iter()
        .filter(|face| face.vertices.len() >= 3 && face.is_finite())
        .filter_map(|face| {
            let normal = face.newell_normal().try_normalize(NORMAL_EPS)?;
            let vertices = face
                .vertices
                .iter()
                .map(|&pos| CsgVertex::new(pos, normal))
                .collect();
            Some(CsgPolygon::new(vertices, None))
        })
        .collect();

    if polygons.is_empty() {
        return None;
    }
    Some(CSG::from_polygons(&polygons, None))
}

fn csg_to_solid(mesh: &CSG<()>, name: &str) -> Option<Solid> {
    let faces: Vec<Face> = mesh
        .polygons
        .iter()
        .filter(|polygon| polygon.vertices.len() >= 3)
        .map(|polygon| Face::new(polygon.vertices.iter().map(|v| v.pos).collect()))
        .collect();

    if faces.is_empty() {
        None
    } else {
        Some(Solid::new(name, faces))
    }
}
