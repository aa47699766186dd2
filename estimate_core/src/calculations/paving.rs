//! # Paving Calculation
//!
//! Patios and paver areas. Every layer is spread over the plan area:
//! aggregates are bought by the cubic yard, pavers by unit count with the
//! configured waste factor.

use serde::{Deserialize, Serialize};

use super::{stack_depth, Quantities, Takeoff, TakeoffContext};
use crate::errors::CalcResult;
use crate::layers::LayerRole;
use crate::units::{CuFt, Feet, SqFt};

/// Validated paving geometry
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PavingInput {
    pub length: Feet,
    pub width: Feet,
}

impl PavingInput {
    pub fn area(&self) -> SqFt {
        self.length * self.width
    }

    pub fn perimeter(&self) -> Feet {
        (self.length + self.width) * 2.0
    }
}

pub fn calculate(input: &PavingInput, ctx: &TakeoffContext<'_>) -> CalcResult<Quantities> {
    let area = input.area();
    let perimeter = input.perimeter();

    let mut items = Vec::with_capacity(ctx.layers.len());
    let mut primary_quantity = 0.0;
    let mut volume = CuFt(0.0);

    for layer in ctx.layers {
        let takeoff = Takeoff::spread(area, layer.depth(), perimeter);
        volume = volume + takeoff.volume;
        let waste = match layer.role {
            LayerRole::Primary => ctx.settings.paver_waste_factor,
            _ => 1.0,
        };
        let item = ctx.line_item(layer, &takeoff, waste)?;
        if layer.role == LayerRole::Primary {
            primary_quantity = item.quantity();
        }
        items.push(item);
    }

    Ok(Quantities {
        area: Some(area),
        total_depth: stack_depth(ctx),
        items,
        primary_quantity,
        work_area: area,
        volume,
    })
}
