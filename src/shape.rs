//! Polygon validation for custom cross-sections
//!
//! A custom section is a set of closed loops. Every loop needs at least three
//! distinct consecutive points, and no two edges of any loops may cross or
//! overlap. Two edges conflict when they cross at a point strictly inside
//! both, or run along each other over a positive length. Edges meeting at a
//! shared vertex are fine, and so is a vertex resting on another edge.

use nalgebra::Point2;

use crate::error::{ModelError, ModelResult};
use crate::options::Tolerance;

pub type Pt2 = Point2<f64>;

/// Supporting line of a segment
#[derive(Debug, Clone, Copy, PartialEq)]
enum Line {
    Vertical { x: f64 },
    Sloped { slope: f64, intercept: f64 },
}

#[derive(Debug, Clone, Copy)]
struct Segment {
    a: Pt2,
    b: Pt2,
}

/// `v` lies in `[lo, hi]`, ends included within tolerance
fn within(v: f64, lo: f64, hi: f64, tol: &Tolerance) -> bool {
    (v > lo || tol.eq(v, lo)) && (v < hi || tol.eq(v, hi))
}

/// Length of the common part of `[a0, a1]` and `[b0, b1]` is non-zero
fn ranges_overlap(a0: f64, a1: f64, b0: f64, b1: f64, tol: &Tolerance) -> bool {
    let lo = a0.min(a1).max(b0.min(b1));
    let hi = a0.max(a1).min(b0.max(b1));
    tol.lt(lo, hi)
}

impl Segment {
    fn line(&self, tol: &Tolerance) -> Line {
        if tol.eq(self.a.x, self.b.x) {
            Line::Vertical { x: self.a.x }
        } else {
            let slope = (self.b.y - self.a.y) / (self.b.x - self.a.x);
            Line::Sloped {
                slope,
                intercept: self.a.y - slope * self.a.x,
            }
        }
    }

    fn min_x(&self) -> f64 {
        self.a.x.min(self.b.x)
    }

    fn max_x(&self) -> f64 {
        self.a.x.max(self.b.x)
    }

    fn min_y(&self) -> f64 {
        self.a.y.min(self.b.y)
    }

    fn max_y(&self) -> f64 {
        self.a.y.max(self.b.y)
    }

    fn boxes_overlap(&self, other: &Segment, tol: &Tolerance) -> bool {
        let apart = |lo_max: f64, hi_min: f64| tol.lt(hi_min, lo_max);
        !(apart(self.min_x(), other.max_x())
            || apart(other.min_x(), self.max_x())
            || apart(self.min_y(), other.max_y())
            || apart(other.min_y(), self.max_y()))
    }

    fn contains(&self, p: &Pt2, tol: &Tolerance) -> bool {
        within(p.x, self.min_x(), self.max_x(), tol) && within(p.y, self.min_y(), self.max_y(), tol)
    }

    fn has_endpoint(&self, p: &Pt2, tol: &Tolerance) -> bool {
        let same = |q: &Pt2| tol.eq(q.x, p.x) && tol.eq(q.y, p.y);
        same(&self.a) || same(&self.b)
    }

    /// Check whether two segments cross strictly inside both, or overlap
    fn conflicts_with(&self, other: &Segment, tol: &Tolerance) -> bool {
        if !self.boxes_overlap(other, tol) {
            return false;
        }

        let point = match (self.line(tol), other.line(tol)) {
            (Line::Vertical { x: x1 }, Line::Vertical { x: x2 }) => {
                return tol.eq(x1, x2)
                    && ranges_overlap(self.a.y, self.b.y, other.a.y, other.b.y, tol);
            }
            (
                Line::Sloped {
                    slope: m1,
                    intercept: c1,
                },
                Line::Sloped {
                    slope: m2,
                    intercept: c2,
                },
            ) if tol.eq(m1, m2) => {
                return tol.eq(c1, c2)
                    && ranges_overlap(self.a.x, self.b.x, other.a.x, other.b.x, tol);
            }
            (Line::Vertical { x }, Line::Sloped { slope, intercept })
            | (Line::Sloped { slope, intercept }, Line::Vertical { x }) => {
                Pt2::new(x, slope * x + intercept)
            }
            (
                Line::Sloped {
                    slope: m1,
                    intercept: c1,
                },
                Line::Sloped {
                    slope: m2,
                    intercept: c2,
                },
            ) => {
                let x = (c2 - c1) / (m1 - m2);
                Pt2::new(x, m1 * x + c1)
            }
        };

        self.contains(&point, tol)
            && other.contains(&point, tol)
            && !self.has_endpoint(&point, tol)
            && !other.has_endpoint(&point, tol)
    }
}

fn edges(points: &[Pt2]) -> impl Iterator<Item = Segment> + '_ {
    (0..points.len()).map(move |i| Segment {
        a: points[i],
        b: points[(i + 1) % points.len()],
    })
}

/// Validate a set of closed loops
///
/// Fails on an empty set, a loop with fewer than three points, two
/// consecutive coincident points, or any pair of intersecting edges.
pub fn validate(loops: &[Vec<Pt2>], tol: &Tolerance) -> ModelResult<()> {
    if loops.is_empty() {
        return Err(ModelError::InvalidShape("no loop defined".to_string()));
    }

    for (l, points) in loops.iter().enumerate() {
        if points.len() < 3 {
            return Err(ModelError::InvalidShape(format!(
                "loop {l} has {} points, at least 3 are needed",
                points.len()
            )));
        }
        for (e, edge) in edges(points).enumerate() {
            if tol.eq(edge.a.x, edge.b.x) && tol.eq(edge.a.y, edge.b.y) {
                return Err(ModelError::InvalidShape(format!(
                    "loop {l} has coincident consecutive points at edge {e}"
                )));
            }
        }
    }

    let all: Vec<(usize, usize, Segment)> = loops
        .iter()
        .enumerate()
        .flat_map(|(l, points)| edges(points).enumerate().map(move |(e, s)| (l, e, s)))
        .collect();

    for (i, (l1, e1, s1)) in all.iter().enumerate() {
        for (l2, e2, s2) in &all[i + 1..] {
            if s1.conflicts_with(s2, tol) {
                return Err(ModelError::SelfIntersection {
                    first_loop: *l1,
                    first_edge: *e1,
                    second_loop: *l2,
                    second_edge: *e2,
                });
            }
        }
    }

    Ok(())
}

/// Check a set of closed loops with the default tolerance
pub fn is_valid(loops: &[Vec<Pt2>]) -> bool {
    validate(loops, &Tolerance::default()).is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pts(coords: &[(f64, f64)]) -> Vec<Pt2> {
        coords.iter().map(|&(x, y)| Pt2::new(x, y)).collect()
    }

    #[test]
    fn test_triangle_passes() {
        assert!(is_valid(&[pts(&[(0.0, 0.0), (1.0, 0.0), (0.0, 1.0)])]));
    }

    #[test]
    fn test_bowtie_fails() {
        let loops = [pts(&[(0.0, 0.0), (1.0, 1.0), (1.0, 0.0), (0.0, 1.0)])];
        let err = validate(&loops, &Tolerance::default()).unwrap_err();
        assert!(matches!(
            err,
            ModelError::SelfIntersection {
                first_loop: 0,
                first_edge: 0,
                second_loop: 0,
                second_edge: 2,
            }
        ));
    }

    #[test]
    fn test_degenerate_loops_fail() {
        assert!(!is_valid(&[]));
        assert!(!is_valid(&[pts(&[(0.0, 0.0), (1.0, 0.0)])]));
        assert!(!is_valid(&[pts(&[(0.0, 0.0), (0.0, 0.0), (1.0, 1.0)])]));
    }

    #[test]
    fn test_collinear_neighbours_allowed() {
        // Square with an extra vertex in the middle of the bottom edge
        let loops = [pts(&[
            (0.0, 0.0),
            (0.5, 0.0),
            (1.0, 0.0),
            (1.0, 1.0),
            (0.0, 1.0),
        ])];
        assert!(is_valid(&loops));
    }

    #[test]
    fn test_folding_back_fails() {
        let loops = [pts(&[(0.0, 0.0), (2.0, 0.0), (1.0, 0.0), (1.0, 1.0)])];
        assert!(!is_valid(&loops));
    }

    #[test]
    fn test_hole_inside_outline() {
        let outer = pts(&[(0.0, 0.0), (4.0, 0.0), (4.0, 4.0), (0.0, 4.0)]);
        let hole = pts(&[(1.0, 1.0), (3.0, 1.0), (3.0, 3.0), (1.0, 3.0)]);
        assert!(is_valid(&[outer.clone(), hole]));

        let crossing = pts(&[(3.0, 1.0), (5.0, 1.0), (5.0, 3.0), (3.0, 3.0)]);
        assert!(!is_valid(&[outer, crossing]));
    }

    #[test]
    fn test_vertex_touching_edge_allowed() {
        let outer = pts(&[(0.0, 0.0), (4.0, 0.0), (4.0, 4.0), (0.0, 4.0)]);
        let touching = pts(&[(2.0, 0.0), (3.0, 2.0), (1.0, 2.0)]);
        assert!(is_valid(&[outer.clone(), touching]));

        // Pushed through the edge it crosses
        let through = pts(&[(2.0, -1.0), (3.0, 2.0), (1.0, 2.0)]);
        assert!(!is_valid(&[outer, through]));
    }
}
