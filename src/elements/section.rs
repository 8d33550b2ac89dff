//! Cross-sections for bars

use nalgebra::Point2;
use serde::{Deserialize, Serialize};
use std::f64::consts::PI;

use crate::catalog::{CatalogEntry, Named, SortKey};
use crate::error::{ModelError, ModelResult};
use crate::ids::{EntityKind, SectionId};
use crate::options::Tolerance;
use crate::shape;

/// A user-drawn section: closed polygon loops plus precomputed properties
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CustomSection {
    /// Closed loops; the last point connects back to the first
    pub loops: Vec<Vec<Point2<f64>>>,
    /// Cross-sectional area
    pub a: f64,
    /// Moment of inertia about local y-axis
    pub iy: f64,
    /// Moment of inertia about local z-axis
    pub iz: f64,
    /// Torsional constant
    pub j: f64,
    /// Distance from the centroid to the extreme fiber, +y side
    pub vy: f64,
    /// Distance from the centroid to the extreme fiber, -y side
    pub vy_neg: f64,
    /// Distance from the centroid to the extreme fiber, +z side
    pub vz: f64,
    /// Distance from the centroid to the extreme fiber, -z side
    pub vz_neg: f64,
}

/// Geometry of a cross-section
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum SectionShape {
    Rectangular {
        width: f64,
        height: f64,
    },
    /// T-section: flange on top of a web, `height` measured overall
    T {
        flange_width: f64,
        flange_thickness: f64,
        web_width: f64,
        height: f64,
    },
    Square {
        side: f64,
    },
    Circular {
        diameter: f64,
    },
    Custom(CustomSection),
}

/// Mechanical properties derived from a section shape
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SectionProperties {
    /// Cross-sectional area
    pub a: f64,
    /// Moment of inertia about local y-axis (strong axis)
    pub iy: f64,
    /// Moment of inertia about local z-axis (weak axis)
    pub iz: f64,
    /// Torsional constant
    pub j: f64,
}

/// A named cross-section, referenced by bars
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Section {
    pub(crate) id: SectionId,
    pub(crate) name: String,
    pub shape: SectionShape,
}

/// Approximate torsional constant of a solid rectangle
fn rectangle_torsion(a: f64, b: f64) -> f64 {
    let (long, short) = if a > b { (a, b) } else { (b, a) };
    long * short.powi(3) / 3.0 * (1.0 - 0.63 * short / long)
}

fn positive(name: &str, value: f64) -> ModelResult<()> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(ModelError::InvalidSection(format!(
            "{name} must be positive, got {value}"
        )))
    }
}

impl Section {
    /// Create a section from its shape
    pub fn new(shape: SectionShape) -> Self {
        Self {
            id: SectionId(0),
            name: String::new(),
            shape,
        }
    }

    /// Create a rectangular section
    pub fn rectangular(width: f64, height: f64) -> Self {
        Self::new(SectionShape::Rectangular { width, height })
    }

    /// Create a square section
    pub fn square(side: f64) -> Self {
        Self::new(SectionShape::Square { side })
    }

    /// Create a circular section
    pub fn circular(diameter: f64) -> Self {
        Self::new(SectionShape::Circular { diameter })
    }

    /// Create a T-section
    pub fn t(flange_width: f64, flange_thickness: f64, web_width: f64, height: f64) -> Self {
        Self::new(SectionShape::T {
            flange_width,
            flange_thickness,
            web_width,
            height,
        })
    }

    /// Create a custom polygonal section
    pub fn custom(custom: CustomSection) -> Self {
        Self::new(SectionShape::Custom(custom))
    }

    /// Handle of this section
    pub fn id(&self) -> SectionId {
        self.id
    }

    /// Name of this section
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Check the dimensions, and the polygons of a custom section under `tol`
    pub fn validate(&self, tol: &Tolerance) -> ModelResult<()> {
        match &self.shape {
            SectionShape::Rectangular { width, height } => {
                positive("width", *width)?;
                positive("height", *height)
            }
            SectionShape::T {
                flange_width,
                flange_thickness,
                web_width,
                height,
            } => {
                positive("flange width", *flange_width)?;
                positive("flange thickness", *flange_thickness)?;
                positive("web width", *web_width)?;
                positive("height", *height)?;
                if flange_thickness >= height {
                    return Err(ModelError::InvalidSection(
                        "flange thickness must be smaller than the height".to_string(),
                    ));
                }
                if web_width > flange_width {
                    return Err(ModelError::InvalidSection(
                        "web cannot be wider than the flange".to_string(),
                    ));
                }
                Ok(())
            }
            SectionShape::Square { side } => positive("side", *side),
            SectionShape::Circular { diameter } => positive("diameter", *diameter),
            SectionShape::Custom(custom) => {
                shape::validate(&custom.loops, tol)?;
                positive("area", custom.a)?;
                positive("iy", custom.iy)?;
                positive("iz", custom.iz)?;
                positive("j", custom.j)
            }
        }
    }

    /// Area, inertias and torsional constant of the section
    pub fn properties(&self) -> SectionProperties {
        match &self.shape {
            SectionShape::Rectangular { width, height } => {
                let (b, h) = (*width, *height);
                SectionProperties {
                    a: b * h,
                    iy: b * h.powi(3) / 12.0,
                    iz: h * b.powi(3) / 12.0,
                    j: rectangle_torsion(b, h),
                }
            }
            SectionShape::Square { side } => {
                let s = *side;
                SectionProperties {
                    a: s * s,
                    iy: s.powi(4) / 12.0,
                    iz: s.powi(4) / 12.0,
                    j: rectangle_torsion(s, s),
                }
            }
            SectionShape::Circular { diameter } => {
                let r = diameter / 2.0;
                let i = PI * r.powi(4) / 4.0;
                SectionProperties {
                    a: PI * r.powi(2),
                    iy: i,
                    iz: i,
                    j: 2.0 * i,
                }
            }
            SectionShape::T {
                flange_width,
                flange_thickness,
                web_width,
                height,
            } => {
                let (bf, tf, bw, h) = (*flange_width, *flange_thickness, *web_width, *height);
                let hw = h - tf;
                let a_flange = bf * tf;
                let a_web = bw * hw;
                let a = a_flange + a_web;

                // Centroid measured from the bottom of the web
                let y_flange = h - tf / 2.0;
                let y_web = hw / 2.0;
                let yc = (a_flange * y_flange + a_web * y_web) / a;

                let iy = bf * tf.powi(3) / 12.0
                    + a_flange * (y_flange - yc).powi(2)
                    + bw * hw.powi(3) / 12.0
                    + a_web * (y_web - yc).powi(2);
                let iz = tf * bf.powi(3) / 12.0 + hw * bw.powi(3) / 12.0;

                SectionProperties {
                    a,
                    iy,
                    iz,
                    j: rectangle_torsion(bf, tf) + rectangle_torsion(bw, hw),
                }
            }
            SectionShape::Custom(custom) => SectionProperties {
                a: custom.a,
                iy: custom.iy,
                iz: custom.iz,
                j: custom.j,
            },
        }
    }
}

impl CatalogEntry for Section {
    type Id = SectionId;
    const KIND: EntityKind = EntityKind::Section;

    fn id(&self) -> SectionId {
        self.id
    }

    fn sort_key(&self) -> SortKey<'_> {
        SortKey::Name(&self.name)
    }
}

impl Named for Section {
    fn name(&self) -> &str {
        &self.name
    }

    fn set_name(&mut self, name: String) {
        self.name = name;
    }
}
