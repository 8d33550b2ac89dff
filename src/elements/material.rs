//! Materials

use serde::{Deserialize, Serialize};

use crate::catalog::{CatalogEntry, Named, SortKey};
use crate::error::{ModelError, ModelResult};
use crate::ids::{EntityKind, MaterialId};

/// Material family and its defining strengths (Pa)
///
/// Derived mechanical properties are computed elsewhere from these inputs.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum MaterialKind {
    /// Concrete defined by its characteristic compressive strength
    Concrete { fck: f64 },
    /// Steel defined by its yield and ultimate strengths
    Steel { fy: f64, fu: f64 },
}

/// A named material, referenced by bars
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Material {
    pub(crate) id: MaterialId,
    pub(crate) name: String,
    pub kind: MaterialKind,
}

impl Material {
    /// Create a material from its kind
    pub fn new(kind: MaterialKind) -> Self {
        Self {
            id: MaterialId(0),
            name: String::new(),
            kind,
        }
    }

    /// Create a concrete material from fck
    pub fn concrete(fck: f64) -> Self {
        Self::new(MaterialKind::Concrete { fck })
    }

    /// Create a steel material from fy and fu
    pub fn steel(fy: f64, fu: f64) -> Self {
        Self::new(MaterialKind::Steel { fy, fu })
    }

    /// Handle of this material
    pub fn id(&self) -> MaterialId {
        self.id
    }

    /// Name of this material
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Check the input strengths
    pub fn validate(&self) -> ModelResult<()> {
        match self.kind {
            MaterialKind::Concrete { fck } => {
                if !(fck.is_finite() && fck > 0.0) {
                    return Err(ModelError::InvalidMaterial(format!(
                        "fck must be positive, got {fck}"
                    )));
                }
            }
            MaterialKind::Steel { fy, fu } => {
                if !(fy.is_finite() && fy > 0.0) {
                    return Err(ModelError::InvalidMaterial(format!(
                        "fy must be positive, got {fy}"
                    )));
                }
                if !(fu.is_finite() && fu >= fy) {
                    return Err(ModelError::InvalidMaterial(format!(
                        "fu ({fu}) must not be below fy ({fy})"
                    )));
                }
            }
        }
        Ok(())
    }
}

impl CatalogEntry for Material {
    type Id = MaterialId;
    const KIND: EntityKind = EntityKind::Material;

    fn id(&self) -> MaterialId {
        self.id
    }

    fn sort_key(&self) -> SortKey<'_> {
        SortKey::Name(&self.name)
    }
}

impl Named for Material {
    fn name(&self) -> &str {
        &self.name
    }

    fn set_name(&mut self, name: String) {
        self.name = name;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_material_validation() {
        assert!(Material::concrete(30e6).validate().is_ok());
        assert!(Material::concrete(-1.0).validate().is_err());
        assert!(Material::steel(235e6, 360e6).validate().is_ok());
        assert!(Material::steel(355e6, 300e6).validate().is_err());
    }
}
