//! # Estimator Settings
//!
//! Ratios and nominal values the engine reads but never hardcodes: ancillary
//! rules, waste factors, standard step geometry, aggregate density, and labor
//! rates. `Default` carries the values from the landscaping materials guide.
//!
//! Settings can be loaded from TOML. Any key left out keeps its default:
//!
//! ```toml
//! units_per_mortar_bag = 5.0
//! paver_waste_factor = 1.05
//!
//! [labor.wall]
//! block = 9.0
//! ```

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::errors::{CalcError, CalcResult};
use crate::materials::MaterialType;

/// Engine configuration snapshot
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EstimatorSettings {
    /// Counted mortared units laid per bag of mortar
    pub units_per_mortar_bag: f64,
    /// Wall face (sq ft) per bag when the primary is not counted in units
    pub sq_ft_per_mortar_bag: f64,
    /// Wall length (ft) per rebar stick for concrete walls
    pub linear_ft_per_rebar_stick: f64,
    /// Rebar spikes per timber for wood walls
    pub rebar_per_timber: f64,
    /// Retaining walls taller than this get drain pipe
    pub drainage_min_height_ft: f64,
    /// Geotextile fabric waste multiplier on paving area
    pub fabric_waste_factor: f64,
    /// Width (ft) of the fabric strip laid along a wall's base; `None` lays no
    /// fabric under walls
    pub wall_fabric_strip_ft: Option<f64>,
    /// Waste multiplier on the paver count
    pub paver_waste_factor: f64,
    /// Per-step rise when the request does not give one (in)
    pub standard_step_rise_in: f64,
    /// Per-step run when the request does not give one (in)
    pub standard_step_run_in: f64,
    /// Density used for ton-priced materials
    pub aggregate_tons_per_cubic_yard: f64,
    /// Garden wall depth when neither the request nor the material gives one (in)
    pub default_wall_depth_in: f64,
    pub labor: LaborRates,
}

impl Default for EstimatorSettings {
    fn default() -> Self {
        EstimatorSettings {
            units_per_mortar_bag: 6.0,
            sq_ft_per_mortar_bag: 10.0,
            linear_ft_per_rebar_stick: 2.0,
            rebar_per_timber: 2.0,
            drainage_min_height_ft: 3.0,
            fabric_waste_factor: 1.1,
            wall_fabric_strip_ft: None,
            paver_waste_factor: 1.1,
            standard_step_rise_in: 7.0,
            standard_step_run_in: 12.0,
            aggregate_tons_per_cubic_yard: 1.4,
            default_wall_depth_in: 12.0,
            labor: LaborRates::default(),
        }
    }
}

impl EstimatorSettings {
    /// Parse settings from TOML and validate them
    pub fn from_toml_str(text: &str) -> CalcResult<Self> {
        let settings: EstimatorSettings = toml::from_str(text)
            .map_err(|e| CalcError::serialization(format!("Invalid settings TOML: {}", e)))?;
        settings.validate()?;
        Ok(settings)
    }

    /// Load settings from a TOML file
    pub fn load(path: &Path) -> CalcResult<Self> {
        let contents = fs::read_to_string(path)
            .map_err(|e| CalcError::file_error("read", path.display().to_string(), e.to_string()))?;
        Self::from_toml_str(&contents)
    }

    /// Every ratio must be finite and strictly positive.
    pub fn validate(&self) -> CalcResult<()> {
        let ratios = [
            ("units_per_mortar_bag", self.units_per_mortar_bag),
            ("sq_ft_per_mortar_bag", self.sq_ft_per_mortar_bag),
            ("linear_ft_per_rebar_stick", self.linear_ft_per_rebar_stick),
            ("rebar_per_timber", self.rebar_per_timber),
            ("fabric_waste_factor", self.fabric_waste_factor),
            ("paver_waste_factor", self.paver_waste_factor),
            ("standard_step_rise_in", self.standard_step_rise_in),
            ("standard_step_run_in", self.standard_step_run_in),
            ("aggregate_tons_per_cubic_yard", self.aggregate_tons_per_cubic_yard),
            ("default_wall_depth_in", self.default_wall_depth_in),
            ("labor.hours_per_step", self.labor.hours_per_step),
        ];
        for (name, value) in ratios {
            check_ratio(name, value)?;
        }
        if let Some(strip) = self.wall_fabric_strip_ft {
            check_ratio("wall_fabric_strip_ft", strip)?;
        }
        if !self.drainage_min_height_ft.is_finite() || self.drainage_min_height_ft < 0.0 {
            return Err(CalcError::validation(
                "drainage_min_height_ft",
                self.drainage_min_height_ft.to_string(),
                "Drainage threshold must be a non-negative number",
            ));
        }
        self.labor.wall.validate("labor.wall")?;
        self.labor.paving.validate("labor.paving")?;
        Ok(())
    }
}

fn check_ratio(name: &str, value: f64) -> CalcResult<()> {
    if !value.is_finite() || value <= 0.0 {
        return Err(CalcError::invalid_coverage(name, value));
    }
    Ok(())
}

/// Labor rate tables
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LaborRates {
    /// Hours per 100 sq ft of wall face
    pub wall: RateByMaterial,
    /// Hours per 100 sq ft of paved area
    pub paving: RateByMaterial,
    /// Hours per step for step runs
    pub hours_per_step: f64,
}

impl Default for LaborRates {
    fn default() -> Self {
        LaborRates {
            wall: RateByMaterial {
                block: 8.0,
                stone: 20.0,
                brick: 18.0,
                concrete: 15.0,
                wood: 6.0,
                metal: 4.0,
                aggregate: 10.0,
                other: 10.0,
            },
            paving: RateByMaterial {
                block: 12.0,
                stone: 20.0,
                brick: 18.0,
                concrete: 12.0,
                wood: 10.0,
                metal: 10.0,
                aggregate: 6.0,
                other: 10.0,
            },
            hours_per_step: 1.5,
        }
    }
}

/// Hours per 100 sq ft, keyed by material type
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RateByMaterial {
    pub block: f64,
    pub stone: f64,
    pub brick: f64,
    pub concrete: f64,
    pub wood: f64,
    pub metal: f64,
    pub aggregate: f64,
    pub other: f64,
}

impl Default for RateByMaterial {
    fn default() -> Self {
        LaborRates::default().wall
    }
}

impl RateByMaterial {
    pub fn for_type(&self, material_type: MaterialType) -> f64 {
        match material_type {
            MaterialType::Block => self.block,
            MaterialType::Stone => self.stone,
            MaterialType::Brick => self.brick,
            MaterialType::Concrete => self.concrete,
            MaterialType::Wood => self.wood,
            MaterialType::Metal => self.metal,
            MaterialType::Aggregate => self.aggregate,
            MaterialType::Other => self.other,
        }
    }

    fn validate(&self, table: &str) -> CalcResult<()> {
        for material_type in MaterialType::ALL {
            check_ratio(
                &format!("{}.{}", table, material_type.code()),
                self.for_type(material_type),
            )?;
        }
        Ok(())
    }
}
