//! Node position resolution
//!
//! A free node sits at its own coordinates, shifted by its anchor's position
//! when anchored. An interior node is interpolated between the resolved ends
//! of its bar: `P = P_start + t * (P_end - P_start)`. Positions are always
//! derived on demand, so moving an anchor moves everything hanging off it.

use nalgebra::{Point3, Vector3};

use crate::catalog::Catalog;
use crate::elements::{Bar, Node, NodeKind};
use crate::error::{ModelError, ModelResult};
use crate::ids::{BarId, NodeId};

pub type Vec3 = Vector3<f64>;
pub type Pt3 = Point3<f64>;

/// Read-only view resolving node positions
#[derive(Debug, Clone, Copy)]
pub struct Geometry<'a> {
    nodes: &'a Catalog<Node>,
    bars: &'a Catalog<Bar>,
}

impl<'a> Geometry<'a> {
    pub fn new(nodes: &'a Catalog<Node>, bars: &'a Catalog<Bar>) -> Self {
        Self { nodes, bars }
    }

    /// Absolute position of a node
    pub fn position(&self, node: NodeId) -> ModelResult<Pt3> {
        self.resolve(node, &mut Vec::new())
    }

    fn resolve(&self, id: NodeId, chain: &mut Vec<NodeId>) -> ModelResult<Pt3> {
        if chain.contains(&id) {
            return Err(ModelError::GeometryCycle(id.0));
        }
        let node = self.nodes.require(id)?;
        chain.push(id);

        let position = match node.kind {
            NodeKind::Free {
                x,
                y,
                z,
                anchor: None,
            } => Pt3::new(x, y, z),
            NodeKind::Free {
                x,
                y,
                z,
                anchor: Some(anchor),
            } => self.resolve(anchor, chain)? + Vec3::new(x, y, z),
            NodeKind::Interior { bar, t } => {
                let bar = self.bars.require(bar)?;
                let start = self.resolve(bar.start, chain)?;
                let end = self.resolve(bar.end, chain)?;
                start + (end - start) * t
            }
        };

        chain.pop();
        Ok(position)
    }

    /// Per-axis deltas from `from` to `to`
    pub fn delta(&self, from: NodeId, to: NodeId) -> ModelResult<Vec3> {
        Ok(self.position(to)? - self.position(from)?)
    }

    /// Euclidean distance between two nodes
    pub fn distance(&self, a: NodeId, b: NodeId) -> ModelResult<f64> {
        Ok(self.delta(a, b)?.norm())
    }

    /// Distance between the resolved ends of a bar
    pub fn bar_length(&self, bar: BarId) -> ModelResult<f64> {
        let bar = self.bars.require(bar)?;
        self.distance(bar.start, bar.end)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ids::{MaterialId, SectionId};
    use approx::assert_relative_eq;

    fn add_node(nodes: &mut Catalog<Node>, mut node: Node) -> NodeId {
        node.id = nodes.next_id().unwrap();
        nodes.insert(node).unwrap()
    }

    #[test]
    fn test_anchor_chain() {
        let mut nodes = Catalog::new();
        let bars = Catalog::new();
        let a = add_node(&mut nodes, Node::new(1.0, 2.0, 3.0));
        let b = add_node(&mut nodes, Node::anchored(a, 4.0, -1.0, 0.0));
        let c = add_node(&mut nodes, Node::anchored(b, 0.0, 0.0, 1.0));

        let geometry = Geometry::new(&nodes, &bars);
        assert_eq!(geometry.position(b).unwrap(), Pt3::new(5.0, 1.0, 3.0));
        assert_eq!(geometry.position(c).unwrap(), Pt3::new(5.0, 1.0, 4.0));
        assert_relative_eq!(geometry.distance(a, b).unwrap(), 17.0_f64.sqrt());
        assert_eq!(geometry.delta(a, c).unwrap(), Vec3::new(4.0, -1.0, 1.0));
    }

    #[test]
    fn test_interior_interpolation() {
        let mut nodes = Catalog::new();
        let mut bars = Catalog::new();
        let a = add_node(&mut nodes, Node::new(0.0, 0.0, 0.0));
        let b = add_node(&mut nodes, Node::new(10.0, 0.0, 0.0));
        let mut bar = Bar::new(a, b, SectionId(0), MaterialId(0));
        bar.id = BarId(0);
        bars.insert(bar).unwrap();
        let m = add_node(&mut nodes, Node::interior(BarId(0), 0.25));

        let geometry = Geometry::new(&nodes, &bars);
        assert_eq!(geometry.position(m).unwrap(), Pt3::new(2.5, 0.0, 0.0));
        assert_relative_eq!(geometry.bar_length(BarId(0)).unwrap(), 10.0);
    }

    #[test]
    fn test_cycle_detected() {
        let mut nodes = Catalog::new();
        let bars = Catalog::new();
        let mut a = Node::anchored(NodeId(1), 0.0, 0.0, 0.0);
        a.id = NodeId(0);
        let mut b = Node::anchored(NodeId(0), 0.0, 0.0, 0.0);
        b.id = NodeId(1);
        nodes.insert(a).unwrap();
        nodes.insert(b).unwrap();

        let geometry = Geometry::new(&nodes, &bars);
        assert!(matches!(
            geometry.position(NodeId(0)),
            Err(ModelError::GeometryCycle(_))
        ));
    }
}
