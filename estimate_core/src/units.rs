//! # Unit Types
//!
//! Type-safe wrappers for the units a landscaping estimate moves through.
//! These are plain `f64` newtypes so JSON stays clean (just numbers) while
//! the compiler keeps feet, inches, and cubic yards apart.
//!
//! ## US Customary Units
//!
//! - Length: feet (ft), inches (in)
//! - Area: square feet (sq ft)
//! - Volume: cubic feet (cu ft), cubic yards (cu yd)
//! - Weight: pounds (lb)
//!
//! ## Mixed feet/inches input
//!
//! Field crews measure in feet *and* inches. [`to_decimal_feet`] normalizes
//! the pair into decimal feet and refuses `inches >= 12` instead of carrying
//! the overflow, since an overflowing inch value means the caller built the
//! measurement wrong.
//!
//! ```rust
//! use estimate_core::units::{to_decimal_feet, Feet, Inches};
//!
//! let length = to_decimal_feet(20.0, 6.0).unwrap();
//! assert_eq!(length, Feet(20.5));
//!
//! let inches: Inches = length.into();
//! assert_eq!(inches.0, 246.0);
//!
//! assert!(to_decimal_feet(4.0, 12.0).is_err());
//! ```

use std::fmt;
use std::ops::{Add, Div, Mul, Sub};

use serde::{Deserialize, Serialize};

use crate::errors::{CalcError, CalcResult};

pub const INCHES_PER_FOOT: f64 = 12.0;
pub const SQ_IN_PER_SQ_FT: f64 = 144.0;
pub const CU_IN_PER_CU_FT: f64 = 1728.0;
pub const CU_FT_PER_CU_YD: f64 = 27.0;

// ============================================================================
// Length Units
// ============================================================================

/// Length in feet
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Feet(pub f64);

/// Length in inches
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Inches(pub f64);

impl From<Feet> for Inches {
    fn from(ft: Feet) -> Self {
        Inches(ft.0 * INCHES_PER_FOOT)
    }
}

impl From<Inches> for Feet {
    fn from(inches: Inches) -> Self {
        Feet(inches.0 / INCHES_PER_FOOT)
    }
}

// ============================================================================
// Area Units
// ============================================================================

/// Area in square feet
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SqFt(pub f64);

impl Mul<Feet> for Feet {
    type Output = SqFt;
    fn mul(self, rhs: Feet) -> SqFt {
        SqFt(self.0 * rhs.0)
    }
}

// ============================================================================
// Volume Units
// ============================================================================

/// Volume in cubic feet
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CuFt(pub f64);

/// Volume in cubic yards
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CuYd(pub f64);

impl Mul<Feet> for SqFt {
    type Output = CuFt;
    fn mul(self, rhs: Feet) -> CuFt {
        CuFt(self.0 * rhs.0)
    }
}

impl From<CuFt> for CuYd {
    fn from(cuft: CuFt) -> Self {
        CuYd(cuft.0 / CU_FT_PER_CU_YD)
    }
}

impl From<CuYd> for CuFt {
    fn from(cuyd: CuYd) -> Self {
        CuFt(cuyd.0 * CU_FT_PER_CU_YD)
    }
}

// ============================================================================
// Weight Units
// ============================================================================

/// Weight in pounds
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Pounds(pub f64);

// ============================================================================
// Arithmetic Implementations (macro to reduce boilerplate)
// ============================================================================

macro_rules! impl_arithmetic {
    ($type:ty) => {
        impl Add for $type {
            type Output = Self;
            fn add(self, rhs: Self) -> Self::Output {
                Self(self.0 + rhs.0)
            }
        }

        impl Sub for $type {
            type Output = Self;
            fn sub(self, rhs: Self) -> Self::Output {
                Self(self.0 - rhs.0)
            }
        }

        impl Mul<f64> for $type {
            type Output = Self;
            fn mul(self, rhs: f64) -> Self::Output {
                Self(self.0 * rhs)
            }
        }

        impl Div<f64> for $type {
            type Output = Self;
            fn div(self, rhs: f64) -> Self::Output {
                Self(self.0 / rhs)
            }
        }

        impl $type {
            /// Get the raw f64 value
            pub fn value(self) -> f64 {
                self.0
            }

            /// Create from raw f64 value
            pub fn new(value: f64) -> Self {
                Self(value)
            }
        }
    };
}

impl_arithmetic!(Feet);
impl_arithmetic!(Inches);
impl_arithmetic!(SqFt);
impl_arithmetic!(CuFt);
impl_arithmetic!(CuYd);
impl_arithmetic!(Pounds);

// ============================================================================
// Mixed feet/inches measurements
// ============================================================================

/// Convert a feet + inches pair into decimal feet.
///
/// Zero is allowed here; whether a dimension must be strictly positive is
/// the job specification's call, not the converter's.
pub fn to_decimal_feet(feet: f64, inches: f64) -> CalcResult<Feet> {
    FeetInches { feet, inches }.resolve("measurement")
}

/// Split decimal feet back into whole feet and remaining inches for display.
pub fn feet_to_feet_inches(length: Feet) -> FeetInches {
    let mut feet = length.0.floor();
    let mut inches = round_to((length.0 - feet) * INCHES_PER_FOOT, 6);
    if inches >= INCHES_PER_FOOT {
        feet += 1.0;
        inches = 0.0;
    }
    FeetInches { feet, inches }
}

/// A field measurement expressed as feet plus inches.
///
/// On the wire either form is accepted:
///
/// ```json
/// { "length": 20 }
/// { "length": { "feet": 20, "inches": 6 } }
/// ```
///
/// A bare number is read as decimal feet.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(from = "MeasurementRepr")]
pub struct FeetInches {
    pub feet: f64,
    pub inches: f64,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum MeasurementRepr {
    Decimal(f64),
    Parts {
        #[serde(default)]
        feet: f64,
        #[serde(default)]
        inches: f64,
    },
}

impl From<MeasurementRepr> for FeetInches {
    fn from(repr: MeasurementRepr) -> Self {
        match repr {
            MeasurementRepr::Decimal(feet) => FeetInches { feet, inches: 0.0 },
            MeasurementRepr::Parts { feet, inches } => FeetInches { feet, inches },
        }
    }
}

impl FeetInches {
    pub fn new(feet: f64, inches: f64) -> Self {
        FeetInches { feet, inches }
    }

    /// Whole feet with no inch component
    pub fn feet(feet: f64) -> Self {
        FeetInches { feet, inches: 0.0 }
    }

    /// Inches only (depth overrides are usually given this way)
    pub fn inches(inches: f64) -> Self {
        FeetInches { feet: 0.0, inches }
    }

    /// Normalize to decimal feet, reporting problems against `field`.
    pub fn resolve(&self, field: &str) -> CalcResult<Feet> {
        if !self.feet.is_finite() {
            return Err(CalcError::validation(
                field,
                self.feet.to_string(),
                "Feet must be a finite number",
            ));
        }
        if !self.inches.is_finite() || self.inches < 0.0 {
            return Err(CalcError::validation(
                field,
                self.inches.to_string(),
                "Inches must be a finite, non-negative number",
            ));
        }
        if self.inches >= INCHES_PER_FOOT {
            return Err(CalcError::validation(
                field,
                self.inches.to_string(),
                "Inches must be less than 12; express whole feet in the feet component",
            ));
        }
        Ok(Feet(self.feet + self.inches / INCHES_PER_FOOT))
    }
}

impl fmt::Display for FeetInches {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let inches = round_to(self.inches, 3);
        if self.feet > 0.0 {
            write!(f, "{}' {}\"", self.feet, inches)
        } else {
            write!(f, "{}\"", inches)
        }
    }
}

fn round_to(value: f64, places: i32) -> f64 {
    let factor = 10f64.powi(places);
    (value * factor).round() / factor
}
