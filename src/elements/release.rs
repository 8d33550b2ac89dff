//! Elastic end releases for bars

use serde::{Deserialize, Serialize};

use crate::catalog::{CatalogEntry, Named, SortKey};
use crate::error::{ModelError, ModelResult};
use crate::ids::{EntityKind, ReleaseId};

/// Rotational fixity of one bar end about one axis
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum Fixity {
    /// Rotation is released (hinge)
    Free,
    /// Rotation is fully transmitted
    Fixed,
    /// Linear rotational spring with the given stiffness (N·m/rad)
    ElasticLinear(f64),
}

impl Fixity {
    /// Check if the rotation is fully released
    pub fn is_free(&self) -> bool {
        matches!(self, Fixity::Free)
    }
}

/// Fixities about the local x, y and z axes at one bar end
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EndRelease {
    pub rx: Fixity,
    pub ry: Fixity,
    pub rz: Fixity,
}

impl EndRelease {
    /// All three rotations transmitted
    pub fn fixed() -> Self {
        Self {
            rx: Fixity::Fixed,
            ry: Fixity::Fixed,
            rz: Fixity::Fixed,
        }
    }

    /// Bending rotations released, torsion transmitted
    pub fn pinned() -> Self {
        Self {
            rx: Fixity::Fixed,
            ry: Fixity::Free,
            rz: Fixity::Free,
        }
    }

    /// Fixities as an array [RX, RY, RZ]
    pub fn as_array(&self) -> [Fixity; 3] {
        [self.rx, self.ry, self.rz]
    }
}

impl Default for EndRelease {
    fn default() -> Self {
        Self::fixed()
    }
}

/// A named end-release definition, referenced by bars
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Release {
    pub(crate) id: ReleaseId,
    pub(crate) name: String,
    /// Fixities at the bar start
    pub start: EndRelease,
    /// Fixities at the bar end
    pub end: EndRelease,
}

impl Release {
    /// Create a release from the fixities at both ends
    pub fn new(start: EndRelease, end: EndRelease) -> Self {
        Self {
            id: ReleaseId(0),
            name: String::new(),
            start,
            end,
        }
    }

    /// Bending hinge at the start
    pub fn pin_start() -> Self {
        Self::new(EndRelease::pinned(), EndRelease::fixed())
    }

    /// Bending hinge at the end
    pub fn pin_end() -> Self {
        Self::new(EndRelease::fixed(), EndRelease::pinned())
    }

    /// Bending hinges at both ends
    pub fn pin_both() -> Self {
        Self::new(EndRelease::pinned(), EndRelease::pinned())
    }

    /// Rotational springs about y and z at both ends
    pub fn elastic(ky: f64, kz: f64) -> Self {
        let end = EndRelease {
            rx: Fixity::Fixed,
            ry: Fixity::ElasticLinear(ky),
            rz: Fixity::ElasticLinear(kz),
        };
        Self::new(end, end)
    }

    /// Handle of this release
    pub fn id(&self) -> ReleaseId {
        self.id
    }

    /// Name of this release
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Fixities [RX_start, RY_start, RZ_start, RX_end, RY_end, RZ_end]
    pub fn as_array(&self) -> [Fixity; 6] {
        let mut arr = [Fixity::Fixed; 6];
        arr[0..3].copy_from_slice(&self.start.as_array());
        arr[3..6].copy_from_slice(&self.end.as_array());
        arr
    }

    /// Check the DOF combination
    ///
    /// Torsion may not be released at both ends, and every spring needs a
    /// finite, strictly positive stiffness.
    pub fn validate(&self) -> ModelResult<()> {
        if self.start.rx.is_free() && self.end.rx.is_free() {
            return Err(ModelError::InvalidRelease(
                "rx cannot be free at both ends".to_string(),
            ));
        }
        for fixity in self.as_array() {
            if let Fixity::ElasticLinear(k) = fixity {
                if !k.is_finite() || k <= 0.0 {
                    return Err(ModelError::InvalidRelease(format!(
                        "elastic stiffness must be positive, got {k}"
                    )));
                }
            }
        }
        Ok(())
    }
}

impl CatalogEntry for Release {
    type Id = ReleaseId;
    const KIND: EntityKind = EntityKind::Release;

    fn id(&self) -> ReleaseId {
        self.id
    }

    fn sort_key(&self) -> SortKey<'_> {
        SortKey::Name(&self.name)
    }
}

impl Named for Release {
    fn name(&self) -> &str {
        &self.name
    }

    fn set_name(&mut self, name: String) {
        self.name = name;
    }
}
