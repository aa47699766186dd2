//! # Wall Calculation
//!
//! Retaining walls and garden walls.
//!
//! ## Geometry
//!
//! - face area = length x height
//! - primary volume = face area x unit width, so a unit count works out to
//!   face area / (unit length x unit height)
//! - base gravel volume = length x wall depth x base depth (footprint)
//! - cap = one course along the length
//!
//! Wall depth is the requested depth, else the primary material's width,
//! else the configured default (12 in). Materials without a width fill the
//! full wall depth.

use serde::{Deserialize, Serialize};

use super::{stack_depth, Quantities, Takeoff, TakeoffContext};
use crate::errors::CalcResult;
use crate::layers::LayerRole;
use crate::materials::Material;
use crate::settings::EstimatorSettings;
use crate::units::{CuFt, Feet, Inches, SqFt};

/// Validated wall geometry
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WallInput {
    pub length: Feet,
    pub height: Feet,
    pub depth: Option<Feet>,
}

impl WallInput {
    pub fn face_area(&self) -> SqFt {
        self.length * self.height
    }

    /// Front-to-back thickness used for the base footprint
    pub fn wall_depth(&self, primary: &Material, settings: &EstimatorSettings) -> Feet {
        self.depth
            .or_else(|| primary.width_in.map(|w| Feet::from(Inches(w))))
            .unwrap_or_else(|| Feet::from(Inches(settings.default_wall_depth_in)))
    }

    /// Front-to-back thickness of the primary material in the wall
    pub fn primary_thickness(&self, primary: &Material, settings: &EstimatorSettings) -> Feet {
        primary
            .width_in
            .map(|w| Feet::from(Inches(w)))
            .unwrap_or_else(|| self.wall_depth(primary, settings))
    }
}

pub fn calculate(input: &WallInput, ctx: &TakeoffContext<'_>) -> CalcResult<Quantities> {
    let face = input.face_area();
    let footprint = input.length * input.wall_depth(ctx.primary, ctx.settings);
    let thickness = Inches::from(input.primary_thickness(ctx.primary, ctx.settings));

    let mut items = Vec::with_capacity(ctx.layers.len());
    let mut primary_quantity = 0.0;
    let mut volume = CuFt(0.0);

    for layer in ctx.layers {
        let takeoff = match layer.role {
            LayerRole::Primary => Takeoff::spread(face, thickness, input.length),
            LayerRole::Cap => Takeoff::coursed(1, input.length, footprint, layer.depth()),
            _ => Takeoff::spread(footprint, layer.depth(), input.length),
        };
        volume = volume + takeoff.volume;
        let item = ctx.line_item(layer, &takeoff, 1.0)?;
        if layer.role == LayerRole::Primary {
            primary_quantity = item.quantity();
        }
        items.push(item);
    }

    Ok(Quantities {
        area: Some(face),
        total_depth: stack_depth(ctx),
        items,
        primary_quantity,
        work_area: face,
        volume,
    })
}
