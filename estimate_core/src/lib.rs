//! # estimate_core - Landscaping Materials & Job Estimation Engine
//!
//! `estimate_core` turns field measurements (wall length and height, patio
//! length and width, step counts) plus a catalog material into a layered
//! cross-section, a bill of materials, cost and weight totals, and a labor
//! estimate. All inputs and outputs are JSON-serializable.
//!
//! ## Design Philosophy
//!
//! - **Stateless**: one pure function from request + catalog + settings to result
//! - **JSON-First**: requests, results, and errors all serialize cleanly
//! - **Fail Fast**: every bad value is rejected before the math that would use it
//! - **Explicit Snapshots**: catalog and settings are passed in, never global state
//!
//! ## Quick Start
//!
//! ```rust
//! use estimate_core::{estimate, EstimateResponse, JobSpecification, MaterialCatalog, EstimatorSettings};
//!
//! let spec: JobSpecification = serde_json::from_str(r#"{
//!     "job_type": "patio",
//!     "material_id": "concrete_paver_4x8",
//!     "measurements": { "length": 10, "width": { "feet": 10, "inches": 0 } }
//! }"#).unwrap();
//!
//! let catalog = MaterialCatalog::standard().unwrap();
//! let response = EstimateResponse::from_result(estimate(&spec, catalog, &EstimatorSettings::default()));
//! assert_eq!(response.http_status(), 200);
//! ```
//!
//! ## Modules
//!
//! - [`units`] - Feet/inch conversion and type-safe unit wrappers
//! - [`materials`] - Material entries and the catalog snapshot
//! - [`job`] - Request, job-type templates, validated geometry
//! - [`layers`] - Cross-section builder and depth fallback table
//! - [`calculations`] - Per-job-family takeoff and quantity conversion
//! - [`aggregate`] - Line items, ancillary rules, cost and weight totals
//! - [`estimate`] - The pipeline, result, and response envelope
//! - [`settings`] - Ratios, waste factors, labor rates
//! - [`errors`] - Structured error types

pub mod aggregate;
pub mod calculations;
pub mod errors;
pub mod estimate;
pub mod job;
pub mod layers;
pub mod materials;
pub mod settings;
pub mod units;

// Re-export commonly used types at crate root for convenience
pub use aggregate::LineItem;
pub use errors::{CalcError, CalcResult};
pub use estimate::{estimate, estimate_with, CalculationResult, EstimateResponse};
pub use job::{JobSpecification, JobTemplate, JobType};
pub use layers::{Layer, LayerBuilder, LayerRole, StandardLayers};
pub use materials::{Material, MaterialCatalog, MaterialType, UnitOfMeasure};
pub use settings::EstimatorSettings;
pub use units::{to_decimal_feet, Feet, FeetInches};
