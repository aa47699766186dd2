//! # Job Type Calculators
//!
//! One calculator per job family. Each follows the same pattern:
//!
//! - `*Input` - validated geometry for the family
//! - `calculate(input, ctx) -> CalcResult<Quantities>` - pure takeoff
//!
//! A calculator walks the layer stack, measures a [`Takeoff`] off each layer
//! (volume, area, run), and hands it to [`purchase_quantity`], which is the
//! only place that turns physical amounts into purchasable units.
//!
//! ## Available Calculators
//!
//! - [`wall`] - retaining walls and garden walls
//! - [`paving`] - patios and paver areas
//! - [`steps`] - step runs

pub mod paving;
pub mod steps;
pub mod wall;

pub use paving::PavingInput;
pub use steps::StepsInput;
pub use wall::WallInput;

use crate::aggregate::LineItem;
use crate::errors::{guarded_div, CalcError, CalcResult};
use crate::job::{JobGeometry, ResolvedJob};
use crate::layers::{total_depth, Layer, LayerRole};
use crate::materials::{Material, MaterialCatalog, UnitOfMeasure};
use crate::settings::EstimatorSettings;
use crate::units::{CuFt, CuYd, Feet, Inches, SqFt};

/// Physical amount measured off one layer, before conversion to
/// purchasable units.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Takeoff {
    pub volume: CuFt,
    /// Face or plan area the layer covers
    pub area: SqFt,
    /// Linear run; per course when `courses` is set
    pub run: Feet,
    /// Number of end-to-end courses for course-laid layers (cap, ledge)
    pub courses: Option<u32>,
}

impl Takeoff {
    /// A layer of uniform depth spread over `area`
    pub fn spread(area: SqFt, depth: Inches, run: Feet) -> Self {
        Takeoff {
            volume: area * Feet::from(depth),
            area,
            run,
            courses: None,
        }
    }

    /// Courses of units laid end to end along `run`
    pub fn coursed(courses: u32, run: Feet, area: SqFt, depth: Inches) -> Self {
        Takeoff {
            courses: Some(courses),
            ..Takeoff::spread(area, depth, run)
        }
    }
}

/// Shared inputs every calculator reads
#[derive(Debug, Clone, Copy)]
pub struct TakeoffContext<'a> {
    pub layers: &'a [Layer],
    pub primary: &'a Material,
    pub catalog: &'a MaterialCatalog,
    pub settings: &'a EstimatorSettings,
}

impl<'a> TakeoffContext<'a> {
    /// Material a layer is built from. The primary layer uses the request's
    /// material; every other layer is a catalog supply.
    pub fn layer_material(&self, layer: &Layer) -> CalcResult<&'a Material> {
        match layer.role {
            LayerRole::Primary => Ok(self.primary),
            _ => self.catalog.resolve(&layer.material_ref),
        }
    }

    /// Convert a takeoff into a line item for `layer`
    pub fn line_item(&self, layer: &Layer, takeoff: &Takeoff, waste_factor: f64) -> CalcResult<LineItem> {
        let material = self.layer_material(layer)?;
        let quantity = purchase_quantity(material, takeoff, self.settings, waste_factor)?;
        let description = match layer.role {
            LayerRole::Primary => material.display_name.clone(),
            _ => format!("{} ({}\" {})", material.display_name, layer.depth_in, layer.role.label()),
        };
        Ok(LineItem::new(
            &material.id,
            description,
            quantity,
            material.unit_of_measure,
            material.price_per_unit,
        ))
    }
}

/// Calculator output, before ancillaries
#[derive(Debug, Clone, PartialEq)]
pub struct Quantities {
    /// Plan area for area-based jobs
    pub area: Option<SqFt>,
    pub total_depth: Inches,
    pub items: Vec<LineItem>,
    /// Purchased quantity of the primary material
    pub primary_quantity: f64,
    /// Area the crew works: wall face, paved area, or riser face
    pub work_area: SqFt,
    /// Sum of every layer's takeoff volume
    pub volume: CuFt,
}

/// Run the calculator for the job's geometry
pub fn calculate(job: &ResolvedJob, ctx: &TakeoffContext<'_>) -> CalcResult<Quantities> {
    let quantities = match &job.geometry {
        JobGeometry::Wall { length, height, depth } => wall::calculate(
            &WallInput {
                length: *length,
                height: *height,
                depth: *depth,
            },
            ctx,
        ),
        JobGeometry::Paving { length, width, .. } => paving::calculate(
            &PavingInput {
                length: *length,
                width: *width,
            },
            ctx,
        ),
        JobGeometry::Steps { step_count, width, rise, run } => steps::calculate(
            &StepsInput {
                step_count: *step_count,
                width: *width,
                rise: *rise,
                run: *run,
            },
            ctx,
        ),
    }?;

    tracing::debug!(
        job_type = job.job_type.code(),
        items = quantities.items.len(),
        primary_quantity = quantities.primary_quantity,
        "takeoff complete"
    );
    Ok(quantities)
}

pub(crate) fn stack_depth(ctx: &TakeoffContext<'_>) -> Inches {
    total_depth(ctx.layers)
}

/// Convert a takeoff into purchasable units of `material`.
///
/// | unit        | quantity                                                      |
/// |-------------|---------------------------------------------------------------|
/// | each        | courses x run / unit length, else volume / unit volume, else area / coverage |
/// | sq_ft       | area                                                          |
/// | cubic_yard  | volume / 27                                                   |
/// | ton         | volume / 27 x tons per cubic yard                             |
/// | linear_ft   | run (x courses)                                               |
///
/// The waste factor multiplies the raw amount. Discrete units are rounded up
/// to whole units and bulk units up to hundredths. The result is never less
/// than one unit.
pub fn purchase_quantity(
    material: &Material,
    takeoff: &Takeoff,
    settings: &EstimatorSettings,
    waste_factor: f64,
) -> CalcResult<f64> {
    let raw = match material.unit_of_measure {
        UnitOfMeasure::Each => match (takeoff.courses, material.length_in) {
            (Some(courses), Some(length_in)) => {
                let per_course = guarded_div(
                    Inches::from(takeoff.run).0,
                    length_in,
                    &format!("{}.length_in", material.id),
                )?;
                courses as f64 * ceil_whole(per_course)
            }
            _ => match material.unit_volume() {
                Some(unit_volume) => guarded_div(
                    takeoff.volume.0,
                    unit_volume.0,
                    &format!("{}.unit_volume", material.id),
                )?,
                None => {
                    let coverage = material.coverage_sq_ft.ok_or_else(|| CalcError::InvalidCoverageFactor {
                        factor: format!("{}.coverage_sq_ft", material.id),
                        value: "none".to_string(),
                    })?;
                    guarded_div(
                        takeoff.area.0,
                        coverage,
                        &format!("{}.coverage_sq_ft", material.id),
                    )?
                }
            },
        },
        UnitOfMeasure::SqFt => takeoff.area.0,
        UnitOfMeasure::CubicYard => CuYd::from(takeoff.volume).0,
        UnitOfMeasure::Ton => CuYd::from(takeoff.volume).0 * settings.aggregate_tons_per_cubic_yard,
        UnitOfMeasure::LinearFt => takeoff.run.0 * takeoff.courses.unwrap_or(1) as f64,
    };

    Ok(round_purchase(raw * waste_factor, material.unit_of_measure))
}

/// Round up to a purchasable amount, minimum one unit
pub fn round_purchase(quantity: f64, unit: UnitOfMeasure) -> f64 {
    let rounded = if unit.is_discrete() {
        ceil_whole(quantity)
    } else {
        ceil_hundredths(quantity)
    };
    rounded.max(1.0)
}

// Float noise (e.g. 90.00000000001 blocks) must not buy an extra unit.
const ROUNDING_EPSILON: f64 = 1e-9;

pub(crate) fn ceil_whole(value: f64) -> f64 {
    (value - ROUNDING_EPSILON).ceil()
}

pub(crate) fn ceil_hundredths(value: f64) -> f64 {
    ((value * 100.0) - ROUNDING_EPSILON * 100.0).ceil() / 100.0
}
