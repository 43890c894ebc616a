use derive_more::Display;

use crate::handle::NodeHandle;


/// The kinds of input panels.
#[derive(Debug, Display, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PanelKind {
    #[display(fmt = "triangle")]
    Tri,
    #[display(fmt = "quad")]
    Quad,
}

/// An input surface element of the finest level.
///
/// The set of element kinds is closed: a panel is either a triangle or a
/// quadrilateral. Nodes are stored in counter clockwise order when looking
/// onto the panel from the side its normal points to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Panel {
    Tri([NodeHandle; 3]),
    Quad([NodeHandle; 4]),
}

impl Panel {
    /// Whether this is a triangle or a quad.
    pub fn kind(&self) -> PanelKind {
        match self {
            Panel::Tri(_) => PanelKind::Tri,
            Panel::Quad(_) => PanelKind::Quad,
        }
    }

    /// The corner nodes in counter clockwise order.
    pub fn nodes(&self) -> &[NodeHandle] {
        match self {
            Panel::Tri(nodes) => nodes,
            Panel::Quad(nodes) => nodes,
        }
    }

    /// 3 or 4.
    pub fn num_nodes(&self) -> usize {
        self.nodes().len()
    }

    /// The sides of this panel as `(from, to)` node pairs, following the
    /// counter clockwise node order.
    pub fn sides(&self) -> impl Iterator<Item = (NodeHandle, NodeHandle)> + '_ {
        let nodes = self.nodes();
        (0..nodes.len()).map(move |i| (nodes[i], nodes[(i + 1) % nodes.len()]))
    }

    /// Returns the first node that appears more than once, if any.
    pub(crate) fn repeated_node(&self) -> Option<NodeHandle> {
        let nodes = self.nodes();
        nodes.iter()
            .enumerate()
            .find(|(i, n)| nodes[i + 1..].contains(n))
            .map(|(_, &n)| n)
    }
}


#[cfg(test)]
mod tests {
    use super::*;
    use crate::handle::Handle;

    fn n(i: u32) -> NodeHandle {
        NodeHandle::new(i as _)
    }

    #[test]
    fn tri_sides() {
        let p = Panel::Tri([n(0), n(1), n(2)]);

        assert_eq!(p.kind(), PanelKind::Tri);
        assert_eq!(p.num_nodes(), 3);
        assert_eq!(
            p.sides().collect::<Vec<_>>(),
            vec![(n(0), n(1)), (n(1), n(2)), (n(2), n(0))],
        );
    }

    #[test]
    fn quad_sides() {
        let p = Panel::Quad([n(4), n(5), n(6), n(7)]);

        assert_eq!(p.kind().to_string(), "quad");
        assert_eq!(p.sides().count(), 4);
        assert_eq!(p.sides().last(), Some((n(7), n(4))));
    }

    #[test]
    fn repeated_nodes() {
        assert_eq!(Panel::Tri([n(0), n(1), n(2)]).repeated_node(), None);
        assert_eq!(Panel::Tri([n(0), n(1), n(0)]).repeated_node(), Some(n(0)));
        assert_eq!(Panel::Quad([n(0), n(1), n(2), n(2)]).repeated_node(), Some(n(2)));
    }
}
