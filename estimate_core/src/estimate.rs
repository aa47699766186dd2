//! # Estimate Pipeline
//!
//! The single entry point of the engine:
//!
//! ```text
//! JobSpecification ─► resolve ─► catalog lookup ─► layers ─► takeoff
//!                                                              │
//!            EstimateResponse ◄─ assemble ◄─ labor ◄─ ancillaries
//! ```
//!
//! Every failure is raised before the stage that would use the bad value, and
//! the pipeline returns either a complete [`CalculationResult`] or one
//! [`CalcError`], never a partial result. Inputs large enough to overflow a
//! derived amount are a validation failure.
//!
//! ## Example
//!
//! ```rust
//! use estimate_core::estimate::estimate;
//! use estimate_core::job::{JobSpecification, JobType};
//! use estimate_core::materials::MaterialCatalog;
//! use estimate_core::settings::EstimatorSettings;
//!
//! let spec = JobSpecification::new(JobType::RetainingWall, "concrete_block_8x8x16")
//!     .with_feet("length", 20.0)
//!     .with_feet("height", 4.0)
//!     .with_feet("depth", 1.0);
//!
//! let catalog = MaterialCatalog::standard().unwrap();
//! let result = estimate(&spec, catalog, &EstimatorSettings::default()).unwrap();
//! assert_eq!(result.total_cost(), 546.0);
//! assert_eq!(result.labor_hours(), 12);
//! ```

use serde::{Deserialize, Serialize};

use crate::aggregate::{self, LineItem};
use crate::calculations::{self, Quantities, TakeoffContext};
use crate::errors::{ensure_finite, CalcError, CalcResult};
use crate::job::{JobGeometry, JobSpecification, JobType, ResolvedJob};
use crate::layers::{Layer, LayerBuilder, StandardLayers};
use crate::materials::{Material, MaterialCatalog};
use crate::settings::EstimatorSettings;
use crate::units::CuYd;

/// The finished estimate. Read-only once assembled.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CalculationResult {
    job_type: JobType,
    material_id: String,
    area_sqft: Option<f64>,
    total_depth_inches: f64,
    total_volume_cu_yd: f64,
    layers: Vec<Layer>,
    materials: Vec<LineItem>,
    total_cost: f64,
    total_weight_lb: Option<f64>,
    labor_hours: u32,
}

impl CalculationResult {
    pub fn job_type(&self) -> JobType {
        self.job_type
    }

    pub fn material_id(&self) -> &str {
        &self.material_id
    }

    /// Plan or face area; `None` for step runs
    pub fn area_sqft(&self) -> Option<f64> {
        self.area_sqft
    }

    pub fn total_depth_inches(&self) -> f64 {
        self.total_depth_inches
    }

    /// Sum of every layer's volume
    pub fn total_volume_cu_yd(&self) -> f64 {
        self.total_volume_cu_yd
    }

    pub fn layers(&self) -> &[Layer] {
        &self.layers
    }

    /// Bill of materials
    pub fn line_items(&self) -> &[LineItem] {
        &self.materials
    }

    /// Sum of every line item total
    pub fn total_cost(&self) -> f64 {
        self.total_cost
    }

    pub fn total_weight_lb(&self) -> Option<f64> {
        self.total_weight_lb
    }

    pub fn labor_hours(&self) -> u32 {
        self.labor_hours
    }
}

/// Estimate a job with the standard layer stacks.
pub fn estimate(
    spec: &JobSpecification,
    catalog: &MaterialCatalog,
    settings: &EstimatorSettings,
) -> CalcResult<CalculationResult> {
    estimate_with(spec, catalog, settings, &StandardLayers)
}

/// Estimate a job with a caller-supplied layer builder.
pub fn estimate_with<B: LayerBuilder + ?Sized>(
    spec: &JobSpecification,
    catalog: &MaterialCatalog,
    settings: &EstimatorSettings,
    builder: &B,
) -> CalcResult<CalculationResult> {
    settings.validate()?;
    let job = spec.resolve(settings)?;
    let primary = catalog.resolve(&job.material_id)?;
    let layers = builder.build(&job, primary, catalog)?;

    let ctx = TakeoffContext {
        layers: &layers,
        primary,
        catalog,
        settings,
    };
    let quantities = calculations::calculate(&job, &ctx)?;

    let mut items = quantities.items.clone();
    items.extend(aggregate::ancillaries(&job, primary, &quantities, catalog, settings)?);

    for item in &items {
        ensure_finite(&format!("{}.quantity", item.material_id()), item.quantity())?;
        ensure_finite(&format!("{}.total_cost", item.material_id()), item.total_cost())?;
    }
    let area = quantities.area.map(|a| ensure_finite("area_sqft", a.0)).transpose()?;
    let total_volume = ensure_finite("total_volume_cu_yd", CuYd::from(quantities.volume).0)?;
    let total_cost = ensure_finite("total_cost", aggregate::total_cost(&items))?;
    let total_weight = aggregate::total_weight(&items, catalog)
        .map(|w| ensure_finite("total_weight_lb", w.0))
        .transpose()?;
    let labor_hours = labor_hours(&job, primary, &quantities, settings)?;

    tracing::debug!(
        job_type = job.job_type.code(),
        material_id = %job.material_id,
        line_items = items.len(),
        total_cost,
        labor_hours,
        "estimate assembled"
    );

    Ok(CalculationResult {
        job_type: job.job_type,
        material_id: job.material_id,
        area_sqft: area,
        total_depth_inches: quantities.total_depth.0,
        total_volume_cu_yd: total_volume,
        layers,
        materials: items,
        total_cost,
        total_weight_lb: total_weight,
        labor_hours,
    })
}

/// Crew hours: per 100 sq ft for walls and paving, per step for step runs.
/// Rounded to whole hours, never less than one.
pub fn labor_hours(
    job: &ResolvedJob,
    primary: &Material,
    quantities: &Quantities,
    settings: &EstimatorSettings,
) -> CalcResult<u32> {
    let rates = &settings.labor;
    let hours = match &job.geometry {
        JobGeometry::Wall { .. } => {
            quantities.work_area.0 / 100.0 * rates.wall.for_type(primary.material_type)
        }
        JobGeometry::Paving { .. } => {
            quantities.work_area.0 / 100.0 * rates.paving.for_type(primary.material_type)
        }
        JobGeometry::Steps { step_count, .. } => *step_count as f64 * rates.hours_per_step,
    };
    let hours = ensure_finite("labor_hours", hours)?.round().max(1.0);
    if hours > u32::MAX as f64 {
        return Err(CalcError::validation(
            "labor_hours",
            hours.to_string(),
            "Measurements are too large to estimate",
        ));
    }
    Ok(hours as u32)
}

/// The JSON envelope returned at the API boundary.
///
/// ```json
/// { "success": true, "result": { ... } }
/// { "success": false, "error": "Material not found: granite-xl", "code": "MATERIAL_NOT_FOUND" }
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum EstimateResponse {
    Success {
        success: bool,
        result: CalculationResult,
    },
    Failure {
        success: bool,
        error: String,
        code: String,
    },
}

impl EstimateResponse {
    pub fn from_result(result: CalcResult<CalculationResult>) -> Self {
        match result {
            Ok(result) => EstimateResponse::Success {
                success: true,
                result,
            },
            Err(e) => EstimateResponse::from_error(&e),
        }
    }

    pub fn from_error(error: &CalcError) -> Self {
        EstimateResponse::Failure {
            success: false,
            error: error.to_string(),
            code: error.error_code().to_string(),
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, EstimateResponse::Success { .. })
    }

    pub fn http_status(&self) -> u16 {
        match self {
            EstimateResponse::Success { .. } => 200,
            EstimateResponse::Failure { .. } => 400,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layers::LayerRole;
    use crate::materials::supplies;
    use std::cell::Cell;

    fn catalog() -> &'static MaterialCatalog {
        MaterialCatalog::standard().unwrap()
    }

    fn run(spec: &JobSpecification) -> CalcResult<CalculationResult> {
        estimate(spec, catalog(), &EstimatorSettings::default())
    }

    fn retaining_wall() -> JobSpecification {
        JobSpecification::new(JobType::RetainingWall, "concrete_block_8x8x16")
            .with_feet("length", 20.0)
            .with_feet("height", 4.0)
            .with_feet("depth", 1.0)
    }

    fn patio() -> JobSpecification {
        JobSpecification::new(JobType::Patio, "concrete_paver_4x8")
            .with_feet("length", 10.0)
            .with_feet("width", 10.0)
    }

    /// Counts calls, then defers to the standard builder
    struct SpyBuilder {
        calls: Cell<usize>,
    }

    impl LayerBuilder for SpyBuilder {
        fn build(&self, job: &ResolvedJob, primary: &Material, catalog: &MaterialCatalog) -> CalcResult<Vec<Layer>> {
            self.calls.set(self.calls.get() + 1);
            StandardLayers.build(job, primary, catalog)
        }
    }

    #[test]
    fn test_scenario_retaining_wall_baseline() {
        let result = run(&retaining_wall()).unwrap();

        assert_eq!(result.area_sqft(), Some(80.0));
        let blocks = result
            .line_items()
            .iter()
            .find(|i| i.material_id() == "concrete_block_8x8x16")
            .unwrap();
        assert_eq!(blocks.quantity(), 90.0);
        assert!(result.line_items().iter().any(|i| i.material_id() == supplies::WALL_BASE_GRAVEL));
        assert!(result.line_items().iter().any(|i| i.material_id() == supplies::WALL_CAP));

        assert!((result.total_cost() - 546.0).abs() < 1e-9);
        assert_eq!(result.labor_hours(), 12);
        assert_eq!(result.total_depth_inches(), 18.0);
    }

    #[test]
    fn test_scenario_patio() {
        let result = run(&patio()).unwrap();
        assert_eq!(result.area_sqft(), Some(100.0));

        let paver = result
            .line_items()
            .iter()
            .find(|i| i.material_id() == "concrete_paver_4x8")
            .unwrap();
        assert!(paver.quantity() > 0.0);

        for role in [LayerRole::Ca11Base, LayerRole::Fines] {
            let layer = result.layers().iter().find(|l| l.role == role).unwrap();
            assert!(layer.depth_in > 0.0);
        }

        let without_base = run(&patio().with_base(false)).unwrap();
        assert!(without_base.total_cost() > 0.0);
        assert!(without_base.layers().iter().any(|l| l.role == LayerRole::Ca11Base));
    }

    #[test]
    fn test_scenario_unknown_material() {
        let spec = JobSpecification::new(JobType::Patio, "granite-xl")
            .with_feet("length", 10.0)
            .with_feet("width", 10.0);
        let response = EstimateResponse::from_result(run(&spec));
        assert_eq!(response.http_status(), 400);

        let json = serde_json::to_value(&response).unwrap();
        assert_eq!(json["success"], false);
        assert_eq!(json["code"], "MATERIAL_NOT_FOUND");
        assert!(json["error"].as_str().unwrap().contains("granite-xl"));
        assert!(json.get("result").is_none());
    }

    #[test]
    fn test_scenario_zero_height_never_builds_layers() {
        let spy = SpyBuilder { calls: Cell::new(0) };
        let spec = retaining_wall().with_feet("height", 0.0);
        let err = estimate_with(&spec, catalog(), &EstimatorSettings::default(), &spy).unwrap_err();
        assert!(matches!(err, CalcError::Validation { .. }));
        assert_eq!(spy.calls.get(), 0);
    }

    #[test]
    fn test_every_non_positive_required_measurement_fails_before_layers() {
        let settings = EstimatorSettings::default();
        for job_type in JobType::ALL {
            let template = job_type.template(&settings);
            for field in template.fields.iter().filter(|f| f.required) {
                for bad in [0.0, -1.0] {
                    let mut spec = JobSpecification::new(job_type, "concrete_block_8x8x16");
                    for other in template.fields.iter().filter(|f| f.required) {
                        spec = spec.with_feet(&other.key, if other.key == field.key { bad } else { 3.0 });
                    }
                    let spy = SpyBuilder { calls: Cell::new(0) };
                    let result = estimate_with(&spec, catalog(), &settings, &spy);
                    assert!(
                        matches!(result, Err(CalcError::Validation { .. })),
                        "{:?} {} = {} was accepted",
                        job_type,
                        field.key,
                        bad
                    );
                    assert_eq!(spy.calls.get(), 0);
                }
            }
        }
    }

    #[test]
    fn test_spy_is_called_once_on_success() {
        let spy = SpyBuilder { calls: Cell::new(0) };
        estimate_with(&retaining_wall(), catalog(), &EstimatorSettings::default(), &spy).unwrap();
        assert_eq!(spy.calls.get(), 1);
    }

    #[test]
    fn test_idempotent_json() {
        for spec in [retaining_wall(), patio()] {
            let first = serde_json::to_string(&run(&spec).unwrap()).unwrap();
            let second = serde_json::to_string(&run(&spec).unwrap()).unwrap();
            assert_eq!(first, second);
        }
    }

    #[test]
    fn test_total_cost_is_sum_of_line_totals() {
        let specs = [
            retaining_wall(),
            patio(),
            JobSpecification::new(JobType::GardenWall, "clay_brick_red")
                .with_feet("length", 14.0)
                .with_feet("height", 2.0),
            JobSpecification::new(JobType::PaverArea, "belgard_mega_arbel_sierra")
                .with_feet("length", 18.0)
                .with_feet("width", 12.0),
            JobSpecification::new(JobType::StepRun, "universal_step_unit")
                .with_feet("step_count", 4.0)
                .with_feet("width", 5.0),
        ];
        for spec in &specs {
            let result = run(spec).unwrap();
            let sum: f64 = result.line_items().iter().map(|i| i.total_cost()).sum();
            assert_eq!(result.total_cost(), sum);
            for item in result.line_items() {
                assert!(item.quantity() > 0.0);
                assert_eq!(item.total_cost(), item.quantity() * item.cost_per_unit());
            }
        }
    }

    #[test]
    fn test_step_run_labor_and_area() {
        let spec = JobSpecification::new(JobType::StepRun, "universal_step_unit")
            .with_feet("step_count", 3.0)
            .with_feet("width", 4.0);
        let result = run(&spec).unwrap();
        assert!(result.area_sqft().is_none());
        // 3 steps at 1.5 h
        assert_eq!(result.labor_hours(), 5);
    }

    #[test]
    fn test_weight_total_present_for_standard_materials() {
        let result = run(&retaining_wall()).unwrap();
        let weight = result.total_weight_lb().unwrap();
        // blocks alone are 90 x 35 lb
        assert!(weight > 3150.0);
    }

    #[test]
    fn test_bulk_primary_without_weight() {
        let spec = JobSpecification::new(JobType::PaverArea, "hardwood_mulch")
            .with_feet("length", 10.0)
            .with_feet("width", 10.0)
            .with_base(false)
            .with_cap(false);
        let result = run(&spec).unwrap();
        let mulch = result
            .line_items()
            .iter()
            .find(|i| i.material_id() == "hardwood_mulch")
            .unwrap();
        assert!(mulch.total_cost() > 0.0);
        // the aggregates underneath still carry weight
        assert!(result.total_weight_lb().is_some());
    }

    #[test]
    fn test_success_envelope_shape() {
        let response = EstimateResponse::from_result(run(&retaining_wall()));
        assert!(response.is_success());
        assert_eq!(response.http_status(), 200);

        let json = serde_json::to_value(&response).unwrap();
        assert_eq!(json["success"], true);
        let result = &json["result"];
        assert_eq!(result["area_sqft"], 80.0);
        assert_eq!(result["total_cost"], 546.0);
        assert_eq!(result["labor_hours"], 12);
        assert!(result["materials"].is_array());
        assert!(result["layers"].is_array());
        assert!(json.get("error").is_none());
    }

    #[test]
    fn test_patio_total_volume() {
        let result = run(&patio()).unwrap();
        let expected = (3.625 + 2.375 + 2.375) / 12.0 * 100.0 / 27.0;
        assert!((result.total_volume_cu_yd() - expected).abs() < 1e-9);

        let json = serde_json::to_value(&result).unwrap();
        assert!(json["total_volume_cu_yd"].as_f64().unwrap() > 2.5);
    }

    #[test]
    fn test_overflowing_measurements_are_rejected() {
        let huge = JobSpecification::new(JobType::Patio, "concrete_paver_4x8")
            .with_feet("length", 1e200)
            .with_feet("width", 1e200);
        let response = EstimateResponse::from_result(run(&huge));
        assert_eq!(response.http_status(), 400);
        let json = serde_json::to_value(&response).unwrap();
        assert_eq!(json["code"], "VALIDATION_ERROR");
        assert!(json.get("result").is_none());

        // finite geometry whose labor does not fit in a u32
        let long_wall = JobSpecification::new(JobType::GardenWall, "allan_block_charcoal")
            .with_feet("length", 1e9)
            .with_feet("height", 1e3)
            .with_base(false)
            .with_cap(false);
        assert!(matches!(run(&long_wall), Err(CalcError::Validation { ref field, .. }) if field == "labor_hours"));
    }

    #[test]
    fn test_invalid_settings_rejected() {
        let settings = EstimatorSettings {
            paver_waste_factor: 0.0,
            ..EstimatorSettings::default()
        };
        let err = estimate(&patio(), catalog(), &settings).unwrap_err();
        assert!(matches!(err, CalcError::InvalidCoverageFactor { .. }));
    }
}
