//! Frame Model - the consistency engine behind a 3D frame analysis tool
//!
//! This library owns the structural model a solver consumes and keeps it
//! consistent under editing:
//! - Ordered catalogs of supports, releases, sections, materials, nodes and bars
//! - Node positions resolved through anchors and bar interpolation
//! - Validation of custom cross-section polygons
//! - Dependency closure and cascading deletion
//! - Pre-analysis checks for connectivity and support sufficiency
//!
//! ## Example
//! ```rust
//! use frame_model::prelude::*;
//!
//! let mut model = Model::new();
//! let section = model.add_section("R30x50", Section::rectangular(0.3, 0.5)).unwrap();
//! let material = model.add_material("C25", Material::concrete(25e6)).unwrap();
//! let fixed = model.add_support("Fixed", Support::fixed()).unwrap();
//!
//! let n1 = model.add_node(Node::new(0.0, 0.0, 0.0).with_support(fixed)).unwrap();
//! let n2 = model.add_node(Node::new(10.0, 0.0, 0.0)).unwrap();
//! let bar = model.add_bar(Bar::new(n1, n2, section, material)).unwrap();
//!
//! // The section cannot go while the bar uses it
//! assert!(model.delete_section(section, false).is_err());
//!
//! let mid = model.add_interior_node(bar, 0.5).unwrap();
//! assert_eq!(model.position(mid).unwrap().x, 5.0);
//! assert!(model.validate_structure().is_ok());
//! ```

pub mod analysis;
pub mod catalog;
pub mod dependency;
pub mod elements;
pub mod error;
pub mod geometry;
pub mod ids;
pub mod loads;
pub mod model;
pub mod options;
pub mod shape;

// Re-export common types
pub mod prelude {
    pub use crate::analysis::{AnalysisType, Issue, StructureReport};
    pub use crate::catalog::Catalog;
    pub use crate::dependency::{Dependents, Seeds};
    pub use crate::elements::{
        Bar, CustomSection, EndRelease, Fixity, Material, MaterialKind, Node, NodeKind, Release,
        Section, SectionShape, Support,
    };
    pub use crate::error::{ModelError, ModelResult};
    pub use crate::ids::{
        BarId, EntityKind, EntityRef, MaterialId, NodeId, ReleaseId, SectionId, SupportId,
    };
    pub use crate::loads::{LoadId, LoadLookup, LoadOwner, LoadTable, NoLoads};
    pub use crate::model::Model;
    pub use crate::options::{ModelOptions, Tolerance};
}

pub use error::{ModelError, ModelResult};
pub use model::Model;
