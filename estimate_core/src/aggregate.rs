//! # Cost & Weight Aggregation
//!
//! Line items for the bill of materials, the ancillary rules that add
//! mortar, rebar, drainage, fabric, and edge restraint, and the cost and
//! weight totals.
//!
//! A line item's total is always `quantity x cost_per_unit`. It is computed
//! on read and written out on serialization, but never stored, so it can't
//! drift from the quantity.

use serde::{Deserialize, Serialize};

use crate::calculations::{ceil_hundredths, ceil_whole, Quantities};
use crate::errors::{guarded_div, CalcError, CalcResult};
use crate::job::{JobGeometry, JobType, ResolvedJob};
use crate::materials::{supplies, Material, MaterialCatalog, MaterialType, UnitOfMeasure};
use crate::settings::EstimatorSettings;
use crate::units::{Feet, Inches, Pounds};

/// One row of the bill of materials
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "LineItemRecord", into = "LineItemRecord")]
pub struct LineItem {
    material_id: String,
    description: String,
    quantity: f64,
    unit: UnitOfMeasure,
    cost_per_unit: f64,
}

/// Wire form of a line item, with the derived total written out
#[derive(Serialize, Deserialize)]
struct LineItemRecord {
    material_id: String,
    description: String,
    quantity: f64,
    unit: UnitOfMeasure,
    cost_per_unit: f64,
    #[serde(default)]
    total_cost: f64,
}

impl From<LineItem> for LineItemRecord {
    fn from(item: LineItem) -> Self {
        let total_cost = item.total_cost();
        LineItemRecord {
            material_id: item.material_id,
            description: item.description,
            quantity: item.quantity,
            unit: item.unit,
            cost_per_unit: item.cost_per_unit,
            total_cost,
        }
    }
}

impl From<LineItemRecord> for LineItem {
    fn from(record: LineItemRecord) -> Self {
        LineItem {
            material_id: record.material_id,
            description: record.description,
            quantity: record.quantity,
            unit: record.unit,
            cost_per_unit: record.cost_per_unit,
        }
    }
}

impl LineItem {
    pub fn new(
        material_id: impl Into<String>,
        description: impl Into<String>,
        quantity: f64,
        unit: UnitOfMeasure,
        cost_per_unit: f64,
    ) -> Self {
        LineItem {
            material_id: material_id.into(),
            description: description.into(),
            quantity,
            unit,
            cost_per_unit,
        }
    }

    fn for_supply(material: &Material, description: String, quantity: f64) -> Self {
        LineItem::new(
            &material.id,
            description,
            quantity,
            material.unit_of_measure,
            material.price_per_unit,
        )
    }

    pub fn material_id(&self) -> &str {
        &self.material_id
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn quantity(&self) -> f64 {
        self.quantity
    }

    pub fn unit(&self) -> UnitOfMeasure {
        self.unit
    }

    pub fn cost_per_unit(&self) -> f64 {
        self.cost_per_unit
    }

    pub fn total_cost(&self) -> f64 {
        self.quantity * self.cost_per_unit
    }
}

/// Ancillary line items for a job.
///
/// | item              | applies to                                   | quantity                         |
/// |-------------------|----------------------------------------------|----------------------------------|
/// | mortar            | walls of concrete, brick, or stone           | units / 6, else face sq ft / 10  |
/// | rebar             | concrete walls; timber walls                 | length / 2 ft; 2 per timber      |
/// | drain pipe        | retaining walls with base, over 3 ft tall    | 1 ft per wall ft                 |
/// | geotextile fabric | walls with base, when a strip width is set   | length x strip width             |
/// | geotextile fabric | paving with base                             | area x 1.1                       |
/// | edge restraint    | paving with cap                              | perimeter / piece length         |
///
/// Ratios come from [`EstimatorSettings`]; the edge restraint piece length
/// comes from its catalog entry. Every division is guarded.
pub fn ancillaries(
    job: &ResolvedJob,
    primary: &Material,
    quantities: &Quantities,
    catalog: &MaterialCatalog,
    settings: &EstimatorSettings,
) -> CalcResult<Vec<LineItem>> {
    let mut items = Vec::new();

    match &job.geometry {
        JobGeometry::Wall { length, height, .. } => {
            if primary.material_type.is_mortared() {
                let bags = if primary.unit_of_measure == UnitOfMeasure::Each {
                    guarded_div(
                        quantities.primary_quantity,
                        settings.units_per_mortar_bag,
                        "units_per_mortar_bag",
                    )?
                } else {
                    guarded_div(
                        quantities.work_area.0,
                        settings.sq_ft_per_mortar_bag,
                        "sq_ft_per_mortar_bag",
                    )?
                };
                let mortar = catalog.resolve(supplies::MORTAR_BAG)?;
                items.push(LineItem::for_supply(
                    mortar,
                    mortar.display_name.clone(),
                    ceil_whole(bags).max(1.0),
                ));
            }

            let rebar_sticks = match primary.material_type {
                MaterialType::Concrete => Some(guarded_div(
                    length.0,
                    settings.linear_ft_per_rebar_stick,
                    "linear_ft_per_rebar_stick",
                )?),
                MaterialType::Wood => Some(quantities.primary_quantity * settings.rebar_per_timber),
                _ => None,
            };
            if let Some(sticks) = rebar_sticks {
                let rebar = catalog.resolve(supplies::REBAR_STICK)?;
                items.push(LineItem::for_supply(
                    rebar,
                    rebar.display_name.clone(),
                    ceil_whole(sticks).max(1.0),
                ));
            }

            let needs_drainage = job.job_type == JobType::RetainingWall
                && job.include_base
                && height.0 > settings.drainage_min_height_ft;
            if needs_drainage {
                let pipe = catalog.resolve(supplies::DRAIN_PIPE)?;
                items.push(LineItem::for_supply(
                    pipe,
                    format!("{} (behind wall)", pipe.display_name),
                    ceil_hundredths(length.0).max(1.0),
                ));
            }

            if let Some(strip) = settings.wall_fabric_strip_ft.filter(|_| job.include_base) {
                let fabric = catalog.resolve(supplies::GEOTEXTILE_FABRIC)?;
                items.push(LineItem::for_supply(
                    fabric,
                    format!("{} (under wall base)", fabric.display_name),
                    ceil_hundredths(length.0 * strip).max(1.0),
                ));
            }
        }

        JobGeometry::Paving { length, width, .. } => {
            let area = (*length * *width).0;

            if job.include_base {
                let fabric = catalog.resolve(supplies::GEOTEXTILE_FABRIC)?;
                items.push(LineItem::for_supply(
                    fabric,
                    fabric.display_name.clone(),
                    ceil_hundredths(area * settings.fabric_waste_factor).max(1.0),
                ));
            }

            if job.include_cap {
                let perimeter = 2.0 * (length.0 + width.0);
                let restraint = catalog.resolve(supplies::EDGE_RESTRAINT)?;
                let factor = format!("{}.length_in", restraint.id);
                let piece_length = restraint
                    .length_in
                    .map(|l| Feet::from(Inches(l)))
                    .ok_or_else(|| CalcError::InvalidCoverageFactor {
                        factor: factor.clone(),
                        value: "none".to_string(),
                    })?;
                let pieces = guarded_div(perimeter, piece_length.0, &factor)?;
                items.push(LineItem::for_supply(
                    restraint,
                    restraint.display_name.clone(),
                    ceil_whole(pieces).max(1.0),
                ));
            }
        }

        JobGeometry::Steps { .. } => {}
    }

    Ok(items)
}

/// Sum of line item totals
pub fn total_cost(items: &[LineItem]) -> f64 {
    items.iter().map(LineItem::total_cost).sum()
}

/// Total weight over items whose material has a known weight.
///
/// Items without a weight still count toward cost; they are only left out
/// here. `None` when no item has a known weight.
pub fn total_weight(items: &[LineItem], catalog: &MaterialCatalog) -> Option<Pounds> {
    let weights: Vec<f64> = items
        .iter()
        .filter_map(|item| {
            catalog
                .get(item.material_id())
                .and_then(|m| m.weight_lb)
                .map(|w| item.quantity() * w)
        })
        .collect();

    if weights.is_empty() {
        None
    } else {
        Some(Pounds(weights.iter().sum()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::calculations::{self, TakeoffContext};
    use crate::job::JobSpecification;
    use crate::layers::{LayerBuilder, StandardLayers};

    fn catalog() -> &'static MaterialCatalog {
        MaterialCatalog::standard().unwrap()
    }

    fn extras(spec: JobSpecification, settings: &EstimatorSettings) -> CalcResult<Vec<LineItem>> {
        let catalog = catalog();
        let job = spec.resolve(settings)?;
        let primary = catalog.resolve(&job.material_id)?;
        let layers = StandardLayers.build(&job, primary, catalog)?;
        let ctx = TakeoffContext {
            layers: &layers,
            primary,
            catalog,
            settings,
        };
        let quantities = calculations::calculate(&job, &ctx)?;
        ancillaries(&job, primary, &quantities, catalog, settings)
    }

    fn wall(material_id: &str, height: f64) -> JobSpecification {
        JobSpecification::new(JobType::RetainingWall, material_id)
            .with_feet("length", 20.0)
            .with_feet("height", height)
            .with_feet("depth", 1.0)
    }

    fn find<'a>(items: &'a [LineItem], id: &str) -> Option<&'a LineItem> {
        items.iter().find(|i| i.material_id() == id)
    }

    #[test]
    fn test_line_item_total_is_derived() {
        let item = LineItem::new("cmu", "Block", 90.0, UnitOfMeasure::Each, 2.5);
        assert_eq!(item.total_cost(), 225.0);

        let json = serde_json::to_value(&item).unwrap();
        assert_eq!(json["total_cost"], 225.0);
        assert_eq!(json["unit"], "each");
    }

    #[test]
    fn test_line_item_ignores_supplied_total() {
        let json = r#"{"material_id": "cmu", "description": "Block", "quantity": 10,
            "unit": "each", "cost_per_unit": 2.5, "total_cost": 9999}"#;
        let item: LineItem = serde_json::from_str(json).unwrap();
        assert_eq!(item.total_cost(), 25.0);
    }

    #[test]
    fn test_concrete_wall_ancillaries() {
        let items = extras(wall("concrete_block_8x8x16", 4.0), &EstimatorSettings::default()).unwrap();
        assert_eq!(find(&items, supplies::MORTAR_BAG).unwrap().quantity(), 15.0);
        assert_eq!(find(&items, supplies::REBAR_STICK).unwrap().quantity(), 10.0);
        assert_eq!(find(&items, supplies::DRAIN_PIPE).unwrap().quantity(), 20.0);
    }

    #[test]
    fn test_no_drainage_for_short_walls() {
        let items = extras(wall("concrete_block_8x8x16", 3.0), &EstimatorSettings::default()).unwrap();
        assert!(find(&items, supplies::DRAIN_PIPE).is_none());

        let no_base = wall("concrete_block_8x8x16", 4.0).with_base(false);
        let items = extras(no_base, &EstimatorSettings::default()).unwrap();
        assert!(find(&items, supplies::DRAIN_PIPE).is_none());
    }

    #[test]
    fn test_segmental_block_has_no_mortar_or_rebar() {
        let items = extras(wall("allan_block_charcoal", 2.0), &EstimatorSettings::default()).unwrap();
        assert!(items.is_empty());
    }

    #[test]
    fn test_timber_wall_rebar_per_timber() {
        let spec = JobSpecification::new(JobType::GardenWall, "landscape_timber_6x6")
            .with_feet("length", 16.0)
            .with_feet("height", 1.0);
        let items = extras(spec, &EstimatorSettings::default()).unwrap();
        let rebar = find(&items, supplies::REBAR_STICK).unwrap();
        assert!(rebar.quantity() >= 2.0);
        assert_eq!(rebar.quantity() % 2.0, 0.0);
        assert!(find(&items, supplies::MORTAR_BAG).is_none());
    }

    #[test]
    fn test_mortar_by_face_area_for_sq_ft_stone() {
        let spec = JobSpecification::new(JobType::GardenWall, "pa_bluestone_thermal")
            .with_feet("length", 12.0)
            .with_feet("height", 2.5);
        let items = extras(spec, &EstimatorSettings::default()).unwrap();
        // 30 sq ft of face at 10 sq ft per bag
        assert_eq!(find(&items, supplies::MORTAR_BAG).unwrap().quantity(), 3.0);
    }

    #[test]
    fn test_paving_ancillaries() {
        let spec = JobSpecification::new(JobType::Patio, "concrete_paver_4x8")
            .with_feet("length", 10.0)
            .with_feet("width", 10.0);
        let items = extras(spec, &EstimatorSettings::default()).unwrap();
        assert_eq!(find(&items, supplies::GEOTEXTILE_FABRIC).unwrap().quantity(), 110.0);
        assert_eq!(find(&items, supplies::EDGE_RESTRAINT).unwrap().quantity(), 10.0);
        assert!(find(&items, supplies::MORTAR_BAG).is_none());
    }

    #[test]
    fn test_wall_fabric_strip_under_base() {
        assert!(find(
            &extras(wall("concrete_block_8x8x16", 4.0), &EstimatorSettings::default()).unwrap(),
            supplies::GEOTEXTILE_FABRIC
        )
        .is_none());

        let settings = EstimatorSettings {
            wall_fabric_strip_ft: Some(2.0),
            ..EstimatorSettings::default()
        };
        let items = extras(wall("allan_block_charcoal", 2.0), &settings).unwrap();
        // 20 ft of wall x 2 ft strip
        assert_eq!(find(&items, supplies::GEOTEXTILE_FABRIC).unwrap().quantity(), 40.0);

        let items = extras(wall("allan_block_charcoal", 2.0).with_base(false), &settings).unwrap();
        assert!(find(&items, supplies::GEOTEXTILE_FABRIC).is_none());
    }

    #[test]
    fn test_edge_restraint_uses_catalog_piece_length() {
        let mut materials: Vec<Material> = catalog().iter().cloned().collect();
        for m in materials.iter_mut().filter(|m| m.id == supplies::EDGE_RESTRAINT) {
            m.length_in = Some(96.0);
        }
        let long_pieces = MaterialCatalog::new(materials).unwrap();

        let settings = EstimatorSettings::default();
        let job = JobSpecification::new(JobType::Patio, "concrete_paver_4x8")
            .with_feet("length", 10.0)
            .with_feet("width", 10.0)
            .resolve(&settings)
            .unwrap();
        let primary = long_pieces.resolve(&job.material_id).unwrap();
        let layers = StandardLayers.build(&job, primary, &long_pieces).unwrap();
        let ctx = TakeoffContext {
            layers: &layers,
            primary,
            catalog: &long_pieces,
            settings: &settings,
        };
        let quantities = calculations::calculate(&job, &ctx).unwrap();
        let items = ancillaries(&job, primary, &quantities, &long_pieces, &settings).unwrap();
        // 40 ft of perimeter in 8 ft pieces
        assert_eq!(find(&items, supplies::EDGE_RESTRAINT).unwrap().quantity(), 5.0);
    }

    #[test]
    fn test_zero_ratio_is_invalid_coverage() {
        let settings = EstimatorSettings {
            units_per_mortar_bag: 0.0,
            ..EstimatorSettings::default()
        };
        let err = extras(wall("concrete_block_8x8x16", 4.0), &settings).unwrap_err();
        assert!(matches!(err, CalcError::InvalidCoverageFactor { ref factor, .. } if factor == "units_per_mortar_bag"));
    }

    #[test]
    fn test_weight_skips_unknown_weights() {
        let items = vec![
            LineItem::new("concrete_block_8x8x16", "Block", 10.0, UnitOfMeasure::Each, 2.5),
            LineItem::new(supplies::GEOTEXTILE_FABRIC, "Fabric", 50.0, UnitOfMeasure::SqFt, 0.5),
        ];
        assert_eq!(total_weight(&items, catalog()), Some(Pounds(350.0)));
        assert_eq!(total_cost(&items), 50.0);

        let fabric_only = &items[1..];
        assert_eq!(total_weight(fabric_only, catalog()), None);
    }
}
