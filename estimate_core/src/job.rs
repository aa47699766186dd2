//! # Job Specification
//!
//! The calculation request and its resolved, validated form.
//!
//! A [`JobSpecification`] is what arrives over the wire: a job type, a
//! material id, a loose map of measurements, and the base/cap flags.
//! [`JobSpecification::resolve`] turns it into a [`ResolvedJob`] whose
//! [`JobGeometry`] is a closed enum over the three job shapes. Every required
//! measurement is converted to decimal feet and checked strictly positive
//! here, before any catalog lookup or layer math happens.
//!
//! ## JSON Example
//!
//! ```json
//! {
//!   "job_type": "retaining_wall",
//!   "material_id": "concrete_block_8x8x16",
//!   "measurements": { "length": 20, "height": { "feet": 4, "inches": 0 }, "depth": 1 },
//!   "include_base": true,
//!   "include_cap": true
//! }
//! ```

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::errors::{CalcError, CalcResult};
use crate::settings::EstimatorSettings;
use crate::units::{Feet, FeetInches, Inches};

/// Supported job types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobType {
    RetainingWall,
    Patio,
    GardenWall,
    PaverArea,
    StepRun,
}

/// Geometric family of a job type
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobKind {
    Wall,
    Paving,
    Steps,
}

/// How a template field is entered
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldKind {
    /// Feet and inches
    Length,
    /// Feet and inches, reported in inches (layer depths, step rise/run)
    Depth,
    /// Whole number
    Count,
}

/// One measurement field of a job-type template
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TemplateField {
    pub key: String,
    pub label: String,
    pub kind: FieldKind,
    pub required: bool,
    /// Value used when an optional field is left out, in inches
    pub default: Option<f64>,
}

impl TemplateField {
    fn required(key: &str, label: &str, kind: FieldKind) -> Self {
        TemplateField {
            key: key.to_string(),
            label: label.to_string(),
            kind,
            required: true,
            default: None,
        }
    }

    fn optional(key: &str, label: &str, kind: FieldKind, default: Option<f64>) -> Self {
        TemplateField {
            key: key.to_string(),
            label: label.to_string(),
            kind,
            required: false,
            default,
        }
    }
}

/// Form template for a job type
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobTemplate {
    pub job_type: JobType,
    pub name: String,
    pub fields: Vec<TemplateField>,
}

impl JobType {
    pub const ALL: [JobType; 5] = [
        JobType::RetainingWall,
        JobType::Patio,
        JobType::GardenWall,
        JobType::PaverArea,
        JobType::StepRun,
    ];

    pub fn code(&self) -> &'static str {
        match self {
            JobType::RetainingWall => "retaining_wall",
            JobType::Patio => "patio",
            JobType::GardenWall => "garden_wall",
            JobType::PaverArea => "paver_area",
            JobType::StepRun => "step_run",
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            JobType::RetainingWall => "Retaining Wall",
            JobType::Patio => "Patio",
            JobType::GardenWall => "Garden Wall",
            JobType::PaverArea => "Paver Area",
            JobType::StepRun => "Step Run",
        }
    }

    /// Parse from common string representations
    pub fn from_str_flexible(s: &str) -> CalcResult<Self> {
        let normalized = s.trim().to_lowercase().replace([' ', '-'], "_");
        JobType::ALL
            .into_iter()
            .find(|t| t.code() == normalized)
            .ok_or_else(|| CalcError::validation("job_type", s, "Unknown job type"))
    }

    pub fn kind(&self) -> JobKind {
        match self {
            JobType::RetainingWall | JobType::GardenWall => JobKind::Wall,
            JobType::Patio | JobType::PaverArea => JobKind::Paving,
            JobType::StepRun => JobKind::Steps,
        }
    }

    /// Measurement fields for this job type.
    ///
    /// This is the single source of truth for which keys are required;
    /// [`JobSpecification::resolve`] reads it rather than keeping its own list.
    pub fn template(&self, settings: &EstimatorSettings) -> JobTemplate {
        use FieldKind::*;

        let fields = match self {
            JobType::RetainingWall => vec![
                TemplateField::required("length", "Wall Length", Length),
                TemplateField::required("height", "Wall Height", Length),
                TemplateField::required("depth", "Wall Depth", Length),
            ],
            JobType::GardenWall => vec![
                TemplateField::required("length", "Wall Length", Length),
                TemplateField::required("height", "Wall Height", Length),
                TemplateField::optional(
                    "depth",
                    "Wall Depth",
                    Length,
                    Some(settings.default_wall_depth_in),
                ),
            ],
            JobType::Patio | JobType::PaverArea => {
                let ca11 = crate::layers::nominal_depth(*self, crate::layers::LayerRole::Ca11Base);
                let fines = crate::layers::nominal_depth(*self, crate::layers::LayerRole::Fines);
                vec![
                    TemplateField::required("length", "Length", Length),
                    TemplateField::required("width", "Width", Length),
                    TemplateField::optional("ca11_depth", "CA11 Base Depth", Depth, ca11),
                    TemplateField::optional("fines_depth", "Fines Depth", Depth, fines),
                ]
            }
            JobType::StepRun => vec![
                TemplateField::required("step_count", "Number of Steps", Count),
                TemplateField::required("width", "Step Width", Length),
                TemplateField::optional("rise", "Rise per Step", Depth, Some(settings.standard_step_rise_in)),
                TemplateField::optional("run", "Run per Step", Depth, Some(settings.standard_step_run_in)),
            ],
        };

        JobTemplate {
            job_type: *self,
            name: self.display_name().to_string(),
            fields,
        }
    }
}

impl std::fmt::Display for JobType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.display_name())
    }
}

fn default_true() -> bool {
    true
}

/// A calculation request
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobSpecification {
    #[serde(alias = "jobType")]
    pub job_type: JobType,

    #[serde(alias = "materialId")]
    pub material_id: String,

    #[serde(default)]
    pub measurements: BTreeMap<String, FeetInches>,

    #[serde(default = "default_true", alias = "includeBase")]
    pub include_base: bool,

    #[serde(default = "default_true", alias = "includeCap")]
    pub include_cap: bool,
}

impl JobSpecification {
    pub fn new(job_type: JobType, material_id: impl Into<String>) -> Self {
        JobSpecification {
            job_type,
            material_id: material_id.into(),
            measurements: BTreeMap::new(),
            include_base: true,
            include_cap: true,
        }
    }

    /// Add a measurement given in decimal feet
    pub fn with_feet(mut self, key: &str, feet: f64) -> Self {
        self.measurements.insert(key.to_string(), FeetInches::feet(feet));
        self
    }

    /// Add a measurement given as feet + inches
    pub fn with_measurement(mut self, key: &str, value: FeetInches) -> Self {
        self.measurements.insert(key.to_string(), value);
        self
    }

    pub fn with_base(mut self, include_base: bool) -> Self {
        self.include_base = include_base;
        self
    }

    pub fn with_cap(mut self, include_cap: bool) -> Self {
        self.include_cap = include_cap;
        self
    }

    /// Validate the request and convert every measurement.
    ///
    /// Required fields must be present and strictly positive. Optional
    /// fields, when present, must be strictly positive too. Keys the
    /// template doesn't know are logged and ignored.
    pub fn resolve(&self, settings: &EstimatorSettings) -> CalcResult<ResolvedJob> {
        if self.material_id.trim().is_empty() {
            return Err(CalcError::validation("material_id", "", "Material id is required"));
        }

        let template = self.job_type.template(settings);
        for key in self.measurements.keys() {
            if !template.fields.iter().any(|f| &f.key == key) {
                tracing::warn!(job_type = self.job_type.code(), key = %key, "ignoring unknown measurement");
            }
        }

        let mut values = BTreeMap::new();
        for field in &template.fields {
            match self.measurements.get(&field.key) {
                Some(raw) => {
                    let value = raw.resolve(&field.key)?;
                    if value.0 <= 0.0 {
                        return Err(CalcError::validation(
                            field.key.as_str(),
                            raw.to_string(),
                            format!("{} must be greater than zero", field.label),
                        ));
                    }
                    values.insert(field.key.as_str(), (*raw, value));
                }
                None if field.required => {
                    return Err(CalcError::validation(
                        field.key.as_str(),
                        "missing",
                        format!("{} is required for {}", field.label, self.job_type.display_name()),
                    ));
                }
                None => {}
            }
        }

        let feet = |key: &str| values.get(key).map(|(_, v)| *v);
        let inches = |key: &str| feet(key).map(Inches::from);
        let required = |key: &str| {
            feet(key).ok_or_else(|| CalcError::validation(key, "missing", "Required measurement"))
        };

        let geometry = match self.job_type.kind() {
            JobKind::Wall => JobGeometry::Wall {
                length: required("length")?,
                height: required("height")?,
                depth: feet("depth"),
            },
            JobKind::Paving => JobGeometry::Paving {
                length: required("length")?,
                width: required("width")?,
                ca11_depth: inches("ca11_depth"),
                fines_depth: inches("fines_depth"),
            },
            JobKind::Steps => {
                let raw = values
                    .get("step_count")
                    .map(|(raw, _)| raw)
                    .ok_or_else(|| CalcError::validation("step_count", "missing", "Required measurement"))?;
                JobGeometry::Steps {
                    step_count: step_count(raw)?,
                    width: required("width")?,
                    rise: inches("rise").unwrap_or(Inches(settings.standard_step_rise_in)),
                    run: inches("run").unwrap_or(Inches(settings.standard_step_run_in)),
                }
            }
        };

        tracing::debug!(job_type = self.job_type.code(), ?geometry, "job resolved");

        Ok(ResolvedJob {
            job_type: self.job_type,
            material_id: self.material_id.clone(),
            include_base: self.include_base,
            include_cap: self.include_cap,
            geometry,
        })
    }
}

fn step_count(raw: &FeetInches) -> CalcResult<u32> {
    let count = raw.feet;
    if raw.inches != 0.0 || count.fract() != 0.0 || count < 1.0 || count > u32::MAX as f64 {
        return Err(CalcError::validation(
            "step_count",
            raw.to_string(),
            "Step count must be a whole number of at least 1",
        ));
    }
    Ok(count as u32)
}

/// Validated job dimensions, one shape per job family
#[derive(Debug, Clone, PartialEq)]
pub enum JobGeometry {
    Wall {
        length: Feet,
        height: Feet,
        /// Front-to-back depth; required for retaining walls
        depth: Option<Feet>,
    },
    Paving {
        length: Feet,
        width: Feet,
        ca11_depth: Option<Inches>,
        fines_depth: Option<Inches>,
    },
    Steps {
        step_count: u32,
        width: Feet,
        rise: Inches,
        run: Inches,
    },
}

/// A request that passed validation
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedJob {
    pub job_type: JobType,
    pub material_id: String,
    pub include_base: bool,
    pub include_cap: bool,
    pub geometry: JobGeometry,
}
