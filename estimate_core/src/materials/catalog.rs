//! # Material Catalog
//!
//! An immutable, validated snapshot of materials keyed by id. The engine
//! takes the catalog by reference on every call; nothing here is global
//! except the built-in standard catalog, which is parsed once on first use.
//!
//! Lookups fail fast: an unknown id is a [`CalcError::MaterialNotFound`],
//! never a substituted default.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use once_cell::sync::Lazy;
use serde::Deserialize;

use super::{Material, MaterialType};
use crate::errors::{CalcError, CalcResult};

/// Ids of the supply items the layer builder and ancillary rules reference.
pub mod supplies {
    pub const WALL_BASE_GRAVEL: &str = "wall_base_gravel";
    pub const CA11: &str = "ca11";
    pub const FINES: &str = "fines";
    pub const WALL_CAP: &str = "wall_cap";
    pub const STEP_LEDGE: &str = "step_ledge";
    pub const MORTAR_BAG: &str = "mortar_bag";
    pub const REBAR_STICK: &str = "rebar_stick";
    pub const DRAIN_PIPE: &str = "drain_pipe";
    pub const GEOTEXTILE_FABRIC: &str = "geotextile_fabric";
    pub const EDGE_RESTRAINT: &str = "edge_restraint";

    pub const ALL: [&str; 10] = [
        WALL_BASE_GRAVEL,
        CA11,
        FINES,
        WALL_CAP,
        STEP_LEDGE,
        MORTAR_BAG,
        REBAR_STICK,
        DRAIN_PIPE,
        GEOTEXTILE_FABRIC,
        EDGE_RESTRAINT,
    ];
}

const STANDARD_CATALOG_TOML: &str = include_str!("../../data/materials.toml");

static STANDARD: Lazy<CalcResult<MaterialCatalog>> =
    Lazy::new(|| MaterialCatalog::from_toml_str(STANDARD_CATALOG_TOML));

/// Accepted document shapes: a bare array, or `{ "materials": [...] }`.
#[derive(Deserialize)]
#[serde(untagged)]
enum CatalogDocument {
    List(Vec<Material>),
    Wrapped { materials: Vec<Material> },
}

impl CatalogDocument {
    fn into_materials(self) -> Vec<Material> {
        match self {
            CatalogDocument::List(materials) => materials,
            CatalogDocument::Wrapped { materials } => materials,
        }
    }
}

/// Validated, read-only material snapshot
#[derive(Debug, Clone, PartialEq)]
pub struct MaterialCatalog {
    materials: BTreeMap<String, Material>,
}

impl MaterialCatalog {
    /// Build a catalog, validating every entry and rejecting duplicate ids.
    pub fn new(materials: impl IntoIterator<Item = Material>) -> CalcResult<Self> {
        let mut map = BTreeMap::new();
        for material in materials {
            material.validate()?;
            if map.contains_key(&material.id) {
                return Err(CalcError::DuplicateMaterial {
                    material_id: material.id,
                });
            }
            map.insert(material.id.clone(), material);
        }
        tracing::debug!(count = map.len(), "material catalog loaded");
        Ok(MaterialCatalog { materials: map })
    }

    /// Parse a JSON catalog document
    pub fn from_json(json: &str) -> CalcResult<Self> {
        let doc: CatalogDocument = serde_json::from_str(json)
            .map_err(|e| CalcError::serialization(format!("Invalid catalog JSON: {}", e)))?;
        Self::new(doc.into_materials())
    }

    /// Parse a TOML catalog document (`[[materials]]` tables)
    pub fn from_toml_str(text: &str) -> CalcResult<Self> {
        #[derive(Deserialize)]
        struct TomlCatalog {
            materials: Vec<Material>,
        }

        let doc: TomlCatalog = toml::from_str(text)
            .map_err(|e| CalcError::serialization(format!("Invalid catalog TOML: {}", e)))?;
        Self::new(doc.materials)
    }

    /// Load a catalog file. `.toml` files are read as TOML, anything else
    /// as JSON.
    pub fn load(path: &Path) -> CalcResult<Self> {
        let contents = fs::read_to_string(path)
            .map_err(|e| CalcError::file_error("read", path.display().to_string(), e.to_string()))?;

        let is_toml = path
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| ext.eq_ignore_ascii_case("toml"));

        if is_toml {
            Self::from_toml_str(&contents)
        } else {
            Self::from_json(&contents)
        }
    }

    /// The built-in catalog shipped with the crate
    pub fn standard() -> CalcResult<&'static MaterialCatalog> {
        match &*STANDARD {
            Ok(catalog) => Ok(catalog),
            Err(e) => Err(e.clone()),
        }
    }

    /// Look up a material by id
    pub fn resolve(&self, material_id: &str) -> CalcResult<&Material> {
        self.materials
            .get(material_id)
            .ok_or_else(|| CalcError::material_not_found(material_id))
    }

    pub fn get(&self, material_id: &str) -> Option<&Material> {
        self.materials.get(material_id)
    }

    pub fn contains(&self, material_id: &str) -> bool {
        self.materials.contains_key(material_id)
    }

    /// All materials, sorted by id
    pub fn iter(&self) -> impl Iterator<Item = &Material> {
        self.materials.values()
    }

    /// Materials of one type, sorted by id
    pub fn by_type(&self, material_type: MaterialType) -> Vec<&Material> {
        self.iter()
            .filter(|m| m.material_type == material_type)
            .collect()
    }

    pub fn len(&self) -> usize {
        self.materials.len()
    }

    pub fn is_empty(&self) -> bool {
        self.materials.is_empty()
    }
}
