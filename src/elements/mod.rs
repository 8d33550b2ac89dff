//! Structural entities module

mod bar;
mod material;
mod node;
mod release;
mod section;
mod support;

pub use bar::Bar;
pub use material::{Material, MaterialKind};
pub use node::{Node, NodeKind};
pub use release::{EndRelease, Fixity, Release};
pub use section::{CustomSection, Section, SectionProperties, SectionShape};
pub use support::Support;
