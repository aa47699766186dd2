//! # Step Run Calculation
//!
//! A run of `step_count` steps, `width` wide.
//!
//! - total rise = step_count x rise, total run = step_count x run
//! - CA11 and fines are spread over the footprint (width x total run)
//! - base units are figured over the riser face (width x total rise) with
//!   the same volume math as a wall: riser face x unit width, falling back
//!   to the tread depth for units without a width
//! - ledges are one course per step across the width

use serde::{Deserialize, Serialize};

use super::{stack_depth, Quantities, Takeoff, TakeoffContext};
use crate::errors::CalcResult;
use crate::layers::LayerRole;
use crate::units::{CuFt, Feet, Inches, SqFt};

/// Validated step-run geometry
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StepsInput {
    pub step_count: u32,
    pub width: Feet,
    /// Rise per step
    pub rise: Inches,
    /// Run (tread depth) per step
    pub run: Inches,
}

impl StepsInput {
    pub fn total_rise(&self) -> Feet {
        Feet::from(self.rise * self.step_count as f64)
    }

    pub fn total_run(&self) -> Feet {
        Feet::from(self.run * self.step_count as f64)
    }

    pub fn footprint(&self) -> SqFt {
        self.width * self.total_run()
    }

    pub fn riser_face(&self) -> SqFt {
        self.width * self.total_rise()
    }
}

pub fn calculate(input: &StepsInput, ctx: &TakeoffContext<'_>) -> CalcResult<Quantities> {
    let footprint = input.footprint();
    let face = input.riser_face();
    let treads = input.width * input.step_count as f64;
    let thickness = ctx.primary.width_in.map(Inches).unwrap_or(input.run);

    let mut items = Vec::with_capacity(ctx.layers.len());
    let mut primary_quantity = 0.0;
    let mut volume = CuFt(0.0);

    for layer in ctx.layers {
        let takeoff = match layer.role {
            LayerRole::Primary => Takeoff::spread(face, thickness, treads),
            LayerRole::Ledge => Takeoff::coursed(input.step_count, input.width, footprint, layer.depth()),
            _ => Takeoff::spread(footprint, layer.depth(), treads),
        };
        volume = volume + takeoff.volume;
        let item = ctx.line_item(layer, &takeoff, 1.0)?;
        if layer.role == LayerRole::Primary {
            primary_quantity = item.quantity();
        }
        items.push(item);
    }

    Ok(Quantities {
        area: None,
        total_depth: stack_depth(ctx),
        items,
        primary_quantity,
        work_area: face,
        volume,
    })
}
