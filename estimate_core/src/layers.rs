//! # Layer Model
//!
//! Builds the ordered cross-section for a job: aggregate base, fines,
//! primary material, cap or ledge. Orders are 1-based and run base to top.
//!
//! ## Depth resolution
//!
//! Every depth goes through [`resolve_depth`], which walks one fallback
//! chain:
//!
//! 1. an explicit override from the request (`ca11_depth`, `fines_depth`)
//! 2. the material's own height
//! 3. the job-type nominal from [`nominal_depth`]
//!
//! If all three are absent the layer fails with `MissingLayerDepth`. The
//! resolved depth is always checked positive and finite. Depths are
//! multiplied into volumes; they are never divisors.
//!
//! ```text
//! retaining wall          patio                step run
//! ┌──────────┐ cap        ┌──────────┐ pavers  ┌──────────┐ ledge
//! ├──────────┤ primary    ├──────────┤ fines   ├──────────┤ base unit
//! └──────────┘ base       ├──────────┤ CA11    ├──────────┤ fines
//!                         └──────────┘         └──────────┘ CA11
//! ```

use serde::{Deserialize, Serialize};

use crate::errors::{CalcError, CalcResult};
use crate::job::{JobGeometry, JobType, ResolvedJob};
use crate::materials::{supplies, Material, MaterialCatalog};
use crate::units::Inches;

/// What a layer does in the stack
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LayerRole {
    WallBase,
    Ca11Base,
    Fines,
    Primary,
    Cap,
    Ledge,
}

impl LayerRole {
    pub fn label(&self) -> &'static str {
        match self {
            LayerRole::WallBase => "Wall Base Gravel",
            LayerRole::Ca11Base => "CA11 Base",
            LayerRole::Fines => "Fines",
            LayerRole::Primary => "Primary",
            LayerRole::Cap => "Cap",
            LayerRole::Ledge => "Step Ledge",
        }
    }
}

/// One entry in the cross-section
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Layer {
    pub name: String,
    /// Catalog id of the material this layer is built from
    pub material_ref: String,
    pub depth_in: f64,
    pub order: u32,
    pub role: LayerRole,
}

impl Layer {
    pub fn depth(&self) -> Inches {
        Inches(self.depth_in)
    }
}

/// Nominal layer depth in inches for a job type.
///
/// Cap depth is not listed; it is derived from the primary layer.
pub fn nominal_depth(job_type: JobType, role: LayerRole) -> Option<f64> {
    use JobType::*;
    use LayerRole::*;

    match (job_type, role) {
        (RetainingWall | GardenWall, WallBase) => Some(6.0),
        (RetainingWall | GardenWall, Primary) => Some(4.0),
        (Patio, Ca11Base) => Some(3.625),
        (PaverArea, Ca11Base) => Some(6.0),
        (Patio | PaverArea, Fines) => Some(2.375),
        (Patio | PaverArea, Primary) => Some(2.375),
        (StepRun, Ca11Base) => Some(6.0),
        (StepRun, Fines) => Some(1.0),
        (StepRun, Primary) => Some(6.0),
        (StepRun, Ledge) => Some(2.0),
        _ => None,
    }
}

/// Pick the first available depth: override, then material, then nominal.
pub fn resolve_depth(
    layer: &str,
    override_depth: Option<Inches>,
    material_depth: Option<f64>,
    nominal: Option<f64>,
) -> CalcResult<Inches> {
    let depth = override_depth
        .map(|d| d.0)
        .or(material_depth)
        .or(nominal)
        .ok_or_else(|| CalcError::missing_layer_depth(layer))?;

    if !depth.is_finite() || depth <= 0.0 {
        return Err(CalcError::validation(
            format!("{} depth", layer),
            depth.to_string(),
            "Layer depth must be greater than zero",
        ));
    }
    Ok(Inches(depth))
}

/// Sum of all layer depths
pub fn total_depth(layers: &[Layer]) -> Inches {
    Inches(layers.iter().map(|l| l.depth_in).sum())
}

/// Produces the layer stack for a resolved job
pub trait LayerBuilder {
    fn build(
        &self,
        job: &ResolvedJob,
        primary: &Material,
        catalog: &MaterialCatalog,
    ) -> CalcResult<Vec<Layer>>;
}

/// The standard stacks for each job family
#[derive(Debug, Clone, Copy, Default)]
pub struct StandardLayers;

impl LayerBuilder for StandardLayers {
    fn build(
        &self,
        job: &ResolvedJob,
        primary: &Material,
        catalog: &MaterialCatalog,
    ) -> CalcResult<Vec<Layer>> {
        let job_type = job.job_type;
        let mut stack = Stack::default();

        match &job.geometry {
            JobGeometry::Wall { .. } => {
                if job.include_base {
                    let depth = resolve_depth(
                        LayerRole::WallBase.label(),
                        None,
                        None,
                        nominal_depth(job_type, LayerRole::WallBase),
                    )?;
                    stack.push_supply(LayerRole::WallBase, supplies::WALL_BASE_GRAVEL, depth);
                }

                let primary_depth = resolve_depth(
                    &primary.display_name,
                    None,
                    primary.height_in,
                    nominal_depth(job_type, LayerRole::Primary),
                )?;
                stack.push_primary(primary, primary_depth);

                if job.include_cap {
                    let depth = resolve_depth(
                        LayerRole::Cap.label(),
                        None,
                        None,
                        Some(primary_depth.0 / 2.0),
                    )?;
                    stack.push_supply(LayerRole::Cap, supplies::WALL_CAP, depth);
                }
            }

            JobGeometry::Paving { ca11_depth, fines_depth, .. } => {
                // A paver surface can't be laid without its base, so CA11 and
                // fines are present regardless of include_base.
                let ca11 = resolve_depth(
                    LayerRole::Ca11Base.label(),
                    *ca11_depth,
                    None,
                    nominal_depth(job_type, LayerRole::Ca11Base),
                )?;
                stack.push_supply(LayerRole::Ca11Base, supplies::CA11, ca11);

                let fines = resolve_depth(
                    LayerRole::Fines.label(),
                    *fines_depth,
                    None,
                    nominal_depth(job_type, LayerRole::Fines),
                )?;
                stack.push_supply(LayerRole::Fines, supplies::FINES, fines);

                let pavers = resolve_depth(
                    &primary.display_name,
                    None,
                    primary.height_in,
                    nominal_depth(job_type, LayerRole::Primary),
                )?;
                stack.push_primary(primary, pavers);
            }

            JobGeometry::Steps { .. } => {
                if job.include_base {
                    let ca11 = resolve_depth(
                        LayerRole::Ca11Base.label(),
                        None,
                        None,
                        nominal_depth(job_type, LayerRole::Ca11Base),
                    )?;
                    stack.push_supply(LayerRole::Ca11Base, supplies::CA11, ca11);
                }

                let fines = resolve_depth(
                    LayerRole::Fines.label(),
                    None,
                    None,
                    nominal_depth(job_type, LayerRole::Fines),
                )?;
                stack.push_supply(LayerRole::Fines, supplies::FINES, fines);

                let base_unit = resolve_depth(
                    &primary.display_name,
                    None,
                    primary.height_in,
                    nominal_depth(job_type, LayerRole::Primary),
                )?;
                stack.push_primary(primary, base_unit);

                if job.include_cap {
                    let ledge_height = catalog.get(supplies::STEP_LEDGE).and_then(|m| m.height_in);
                    let ledge = resolve_depth(
                        LayerRole::Ledge.label(),
                        None,
                        ledge_height,
                        nominal_depth(job_type, LayerRole::Ledge),
                    )?;
                    stack.push_supply(LayerRole::Ledge, supplies::STEP_LEDGE, ledge);
                }
            }
        }

        tracing::debug!(
            job_type = job_type.code(),
            layers = stack.layers.len(),
            total_depth_in = total_depth(&stack.layers).0,
            "layer stack built"
        );
        Ok(stack.layers)
    }
}

#[derive(Default)]
struct Stack {
    layers: Vec<Layer>,
}

impl Stack {
    fn push(&mut self, name: String, material_ref: &str, depth: Inches, role: LayerRole) {
        let order = self.layers.len() as u32 + 1;
        self.layers.push(Layer {
            name,
            material_ref: material_ref.to_string(),
            depth_in: depth.0,
            order,
            role,
        });
    }

    fn push_supply(&mut self, role: LayerRole, material_ref: &str, depth: Inches) {
        self.push(role.label().to_string(), material_ref, depth, role);
    }

    fn push_primary(&mut self, material: &Material, depth: Inches) {
        self.push(material.display_name.clone(), &material.id, depth, LayerRole::Primary);
    }
}
