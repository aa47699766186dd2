//! # Materials
//!
//! Catalog entries for landscaping materials and the catalog snapshot the
//! engine reads them from.
//!
//! ## Material Types
//!
//! - **Block**: segmental retaining wall units (Versa-Lok, Allan Block)
//! - **Concrete**: CMU block and concrete pavers
//! - **Stone / Brick / Wood / Metal**: natural stone, clay brick, timbers, edging
//! - **Aggregate**: bulk CA11, fines, gravel (no fixed unit dimensions)
//!
//! Dimensional fields are optional because bulk materials have no unit size.
//! The engine never treats a missing dimension as zero; the layer builder
//! supplies job-type defaults and every division is guarded.
//!
//! ## Example
//!
//! ```rust
//! use estimate_core::materials::{Material, MaterialType, UnitOfMeasure};
//!
//! let block = Material::new("cmu-8x8x16", "Concrete Block 8x8x16", MaterialType::Concrete, 2.50, UnitOfMeasure::Each)
//!     .with_dimensions(16.0, 8.0, 8.0)
//!     .with_weight(35.0);
//!
//! assert!(block.validate().is_ok());
//! let volume = block.unit_volume().unwrap();
//! assert!((volume.0 - 1024.0 / 1728.0).abs() < 1e-12);
//! ```

pub mod catalog;

pub use catalog::{supplies, MaterialCatalog};

use serde::{Deserialize, Serialize};

use crate::errors::{CalcError, CalcResult};
use crate::units::{CuFt, CU_IN_PER_CU_FT};

/// Broad material family, used for ancillary rules and labor rates
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MaterialType {
    Block,
    Stone,
    Brick,
    Concrete,
    Wood,
    Metal,
    Aggregate,
    Other,
}

impl MaterialType {
    /// All material types for UI selection
    pub const ALL: [MaterialType; 8] = [
        MaterialType::Block,
        MaterialType::Stone,
        MaterialType::Brick,
        MaterialType::Concrete,
        MaterialType::Wood,
        MaterialType::Metal,
        MaterialType::Aggregate,
        MaterialType::Other,
    ];

    /// Wire code (matches the serde representation)
    pub fn code(&self) -> &'static str {
        match self {
            MaterialType::Block => "block",
            MaterialType::Stone => "stone",
            MaterialType::Brick => "brick",
            MaterialType::Concrete => "concrete",
            MaterialType::Wood => "wood",
            MaterialType::Metal => "metal",
            MaterialType::Aggregate => "aggregate",
            MaterialType::Other => "other",
        }
    }

    /// Parse from common string representations
    pub fn from_str_flexible(s: &str) -> CalcResult<Self> {
        match s.trim().to_lowercase().replace([' ', '-'], "_").as_str() {
            "block" | "retaining_wall_blocks" | "wall_block" => Ok(MaterialType::Block),
            "stone" | "natural_stone" => Ok(MaterialType::Stone),
            "brick" => Ok(MaterialType::Brick),
            "concrete" | "cmu" | "pavers" => Ok(MaterialType::Concrete),
            "wood" | "timber" => Ok(MaterialType::Wood),
            "metal" | "steel" => Ok(MaterialType::Metal),
            "aggregate" | "gravel" => Ok(MaterialType::Aggregate),
            "other" => Ok(MaterialType::Other),
            _ => Err(CalcError::validation(
                "material_type",
                s,
                "Unknown material type",
            )),
        }
    }

    /// Whether walls built from this type are laid in mortar
    pub fn is_mortared(&self) -> bool {
        matches!(self, MaterialType::Concrete | MaterialType::Brick | MaterialType::Stone)
    }

    /// Get display name
    pub fn display_name(&self) -> &'static str {
        match self {
            MaterialType::Block => "Block",
            MaterialType::Stone => "Stone",
            MaterialType::Brick => "Brick",
            MaterialType::Concrete => "Concrete",
            MaterialType::Wood => "Wood",
            MaterialType::Metal => "Metal",
            MaterialType::Aggregate => "Aggregate",
            MaterialType::Other => "Other",
        }
    }
}

impl std::fmt::Display for MaterialType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.display_name())
    }
}

/// Unit a material is priced and purchased in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UnitOfMeasure {
    Each,
    SqFt,
    CubicYard,
    Ton,
    #[serde(alias = "linear_foot")]
    LinearFt,
}

impl UnitOfMeasure {
    /// Short label for bills of materials
    pub fn label(&self) -> &'static str {
        match self {
            UnitOfMeasure::Each => "each",
            UnitOfMeasure::SqFt => "sq ft",
            UnitOfMeasure::CubicYard => "cu yd",
            UnitOfMeasure::Ton => "ton",
            UnitOfMeasure::LinearFt => "lin ft",
        }
    }

    /// Discrete units are bought whole; bulk units can be fractional
    pub fn is_discrete(&self) -> bool {
        matches!(self, UnitOfMeasure::Each)
    }
}

impl std::fmt::Display for UnitOfMeasure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.label())
    }
}

/// A catalog entry.
///
/// ## JSON Example
///
/// ```json
/// {
///   "id": "concrete_block_8x8x16",
///   "display_name": "Concrete Block 8x8x16",
///   "material_type": "concrete",
///   "length_in": 16.0,
///   "width_in": 8.0,
///   "height_in": 8.0,
///   "weight_lb": 35.0,
///   "price_per_unit": 2.5,
///   "unit_of_measure": "each"
/// }
/// ```
///
/// The field names used by the legacy materials table (`name`,
/// `length_inches`, `weight_lbs`, ...) are accepted as aliases.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Material {
    pub id: String,

    #[serde(alias = "name")]
    pub display_name: String,

    pub material_type: MaterialType,

    /// Unit length in inches (along the wall / course)
    #[serde(default, alias = "length_inches")]
    pub length_in: Option<f64>,

    /// Unit width in inches (front to back)
    #[serde(default, alias = "width_inches")]
    pub width_in: Option<f64>,

    /// Unit height in inches (course height, paver thickness)
    #[serde(default, alias = "height_inches")]
    pub height_in: Option<f64>,

    /// Weight in pounds per unit of measure
    #[serde(default, alias = "weight_lbs")]
    pub weight_lb: Option<f64>,

    pub price_per_unit: f64,

    pub unit_of_measure: UnitOfMeasure,

    #[serde(default)]
    pub supplier: Option<String>,

    /// Square feet of face covered by one unit, for `each` items without
    /// full unit dimensions
    #[serde(default)]
    pub coverage_sq_ft: Option<f64>,
}

impl Material {
    pub fn new(
        id: impl Into<String>,
        display_name: impl Into<String>,
        material_type: MaterialType,
        price_per_unit: f64,
        unit_of_measure: UnitOfMeasure,
    ) -> Self {
        Material {
            id: id.into(),
            display_name: display_name.into(),
            material_type,
            length_in: None,
            width_in: None,
            height_in: None,
            weight_lb: None,
            price_per_unit,
            unit_of_measure,
            supplier: None,
            coverage_sq_ft: None,
        }
    }

    /// Set length x width x height in inches
    pub fn with_dimensions(mut self, length_in: f64, width_in: f64, height_in: f64) -> Self {
        self.length_in = Some(length_in);
        self.width_in = Some(width_in);
        self.height_in = Some(height_in);
        self
    }

    pub fn with_weight(mut self, weight_lb: f64) -> Self {
        self.weight_lb = Some(weight_lb);
        self
    }

    pub fn with_coverage(mut self, coverage_sq_ft: f64) -> Self {
        self.coverage_sq_ft = Some(coverage_sq_ft);
        self
    }

    pub fn with_supplier(mut self, supplier: impl Into<String>) -> Self {
        self.supplier = Some(supplier.into());
        self
    }

    /// Check the catalog invariants for this entry.
    ///
    /// Price must be present and non-negative. Every optional dimension,
    /// weight, and coverage value that *is* present must be finite and
    /// strictly positive, so nothing downstream can divide by it and get
    /// infinity. Materials sold `each` must carry all three dimensions or a
    /// coverage.
    pub fn validate(&self) -> CalcResult<()> {
        if self.id.trim().is_empty() {
            return Err(CalcError::validation("id", "", "Material id cannot be empty"));
        }
        if !self.price_per_unit.is_finite() || self.price_per_unit < 0.0 {
            return Err(CalcError::validation(
                format!("{}.price_per_unit", self.id),
                self.price_per_unit.to_string(),
                "Price must be a non-negative number",
            ));
        }
        let dimensions = [
            ("length_in", self.length_in),
            ("width_in", self.width_in),
            ("height_in", self.height_in),
        ];
        for (name, value) in dimensions {
            if let Some(v) = value {
                if !v.is_finite() || v <= 0.0 {
                    return Err(CalcError::validation(
                        format!("{}.{}", self.id, name),
                        v.to_string(),
                        "Dimensions must be positive when present",
                    ));
                }
            }
        }
        if let Some(w) = self.weight_lb {
            if !w.is_finite() || w <= 0.0 {
                return Err(CalcError::invalid_coverage(format!("{}.weight_lb", self.id), w));
            }
        }
        if let Some(c) = self.coverage_sq_ft {
            if !c.is_finite() || c <= 0.0 {
                return Err(CalcError::invalid_coverage(format!("{}.coverage_sq_ft", self.id), c));
            }
        }
        // Counted units need either a unit volume or a coverage to be counted by
        if self.unit_of_measure == UnitOfMeasure::Each
            && self.unit_volume().is_none()
            && self.coverage_sq_ft.is_none()
        {
            return Err(CalcError::InvalidCoverageFactor {
                factor: format!("{}.coverage_sq_ft", self.id),
                value: "none".to_string(),
            });
        }
        Ok(())
    }

    /// Volume of one unit, when all three dimensions are known
    pub fn unit_volume(&self) -> Option<CuFt> {
        match (self.length_in, self.width_in, self.height_in) {
            (Some(l), Some(w), Some(h)) => Some(CuFt(l * w * h / CU_IN_PER_CU_FT)),
            _ => None,
        }
    }

    /// Human-readable size, e.g. `16" x 8" x 8"`
    pub fn dimensions_label(&self) -> Option<String> {
        match (self.length_in, self.width_in, self.height_in) {
            (Some(l), Some(w), Some(h)) => Some(format!("{}\" x {}\" x {}\"", l, w, h)),
            _ => None,
        }
    }
}

impl std::fmt::Display for Material {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.display_name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn block() -> Material {
        Material::new("cmu", "Concrete Block 8x8x16", MaterialType::Concrete, 2.50, UnitOfMeasure::Each)
            .with_dimensions(16.0, 8.0, 8.0)
            .with_weight(35.0)
    }

    #[test]
    fn test_unit_volume() {
        let vol = block().unit_volume().unwrap();
        assert!((vol.0 - 0.592_592_592).abs() < 1e-6);

        let gravel = Material::new("gravel", "Gravel", MaterialType::Aggregate, 26.0, UnitOfMeasure::CubicYard);
        assert!(gravel.unit_volume().is_none());
    }

    #[test]
    fn test_validate_rejects_negative_price() {
        let mut m = block();
        m.price_per_unit = -1.0;
        assert!(matches!(m.validate(), Err(CalcError::Validation { .. })));
    }

    #[test]
    fn test_validate_rejects_zero_dimension() {
        let mut m = block();
        m.height_in = Some(0.0);
        assert!(m.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_zero_coverage() {
        let m = block().with_coverage(0.0);
        assert!(matches!(
            m.validate(),
            Err(CalcError::InvalidCoverageFactor { .. })
        ));
    }

    #[test]
    fn test_counted_material_needs_volume_or_coverage() {
        let tree = Material::new("tree", "Red Maple", MaterialType::Other, 125.0, UnitOfMeasure::Each);
        assert!(matches!(
            tree.validate(),
            Err(CalcError::InvalidCoverageFactor { ref factor, .. }) if factor == "tree.coverage_sq_ft"
        ));

        let mut partial = block();
        partial.height_in = None;
        assert!(partial.validate().is_err());
        assert!(partial.with_coverage(0.9).validate().is_ok());
    }

    #[test]
    fn test_bulk_material_is_valid_without_dimensions() {
        let mulch = Material::new("mulch", "Hardwood Mulch", MaterialType::Other, 35.0, UnitOfMeasure::CubicYard);
        assert!(mulch.validate().is_ok());
        assert!(mulch.dimensions_label().is_none());
    }

    #[test]
    fn test_legacy_field_aliases() {
        let json = r#"{
            "id": "pea-gravel",
            "name": "Pea Gravel - Natural",
            "material_type": "stone",
            "length_inches": 0.5,
            "width_inches": 0.5,
            "height_inches": 0.5,
            "weight_lbs": 2800.0,
            "price_per_unit": 45.0,
            "unit_of_measure": "ton"
        }"#;
        let m: Material = serde_json::from_str(json).unwrap();
        assert_eq!(m.display_name, "Pea Gravel - Natural");
        assert_eq!(m.weight_lb, Some(2800.0));
        assert_eq!(m.unit_of_measure, UnitOfMeasure::Ton);
        assert!(m.supplier.is_none());
    }

    #[test]
    fn test_linear_foot_alias() {
        let unit: UnitOfMeasure = serde_json::from_str("\"linear_foot\"").unwrap();
        assert_eq!(unit, UnitOfMeasure::LinearFt);
        assert_eq!(serde_json::to_string(&unit).unwrap(), "\"linear_ft\"");
    }

    #[test]
    fn test_material_type_parsing() {
        assert_eq!(MaterialType::from_str_flexible("Timber").unwrap(), MaterialType::Wood);
        assert_eq!(
            MaterialType::from_str_flexible("retaining wall blocks").unwrap(),
            MaterialType::Block
        );
        assert!(MaterialType::from_str_flexible("plasma").is_err());
    }

    #[test]
    fn test_mortared_types() {
        assert!(MaterialType::Concrete.is_mortared());
        assert!(MaterialType::Stone.is_mortared());
        assert!(!MaterialType::Block.is_mortared());
        assert!(!MaterialType::Aggregate.is_mortared());
    }
}
