use cgmath::Point3;

use crate::handle::{NodeHandle, Opt};


/// Aerodynamic classification of a node, supplied by whoever generated the
/// surface triangulation (e.g. the wing or body surface generator).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct NodeFlags {
    /// The node lies on a trailing edge (a kutta node).
    pub trailing_edge: bool,

    /// The node lies on a leading edge.
    pub leading_edge: bool,

    /// The node lies on a free boundary of the surface (e.g. a wing tip).
    pub boundary_edge: bool,

    /// The node is a corner of the boundary.
    pub boundary_corner: bool,
}

impl NodeFlags {
    /// No flag set: an ordinary surface node.
    pub fn interior() -> Self {
        Self::default()
    }
}


/// A node of a mesh level: a point in 3D space plus classification flags and
/// the links into the neighboring multigrid levels.
///
/// Nodes are plain values. Copying a node copies every field, including the
/// multigrid links.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Node {
    position: Point3<f64>,
    flags: NodeFlags,
    coarse_grid_node: Opt<NodeHandle>,
    fine_grid_node: Opt<NodeHandle>,
}

impl Node {
    /// Creates a node without any multigrid links.
    pub fn new(position: Point3<f64>, flags: NodeFlags) -> Self {
        Self {
            position,
            flags,
            coarse_grid_node: Opt::none(),
            fine_grid_node: Opt::none(),
        }
    }

    /// The location of this node in 3D space.
    pub fn position(&self) -> Point3<f64> {
        self.position
    }

    /// The aerodynamic classification given when the node was created.
    pub fn flags(&self) -> NodeFlags {
        self.flags
    }

    /// Whether the node lies on a trailing edge (a kutta node).
    pub fn is_trailing_edge_node(&self) -> bool {
        self.flags.trailing_edge
    }

    /// Whether the node lies on a leading edge.
    pub fn is_leading_edge_node(&self) -> bool {
        self.flags.leading_edge
    }

    /// Whether the node lies on a free boundary of the surface.
    pub fn is_boundary_edge_node(&self) -> bool {
        self.flags.boundary_edge
    }

    /// Whether the node is a corner of the boundary.
    pub fn is_boundary_corner_node(&self) -> bool {
        self.flags.boundary_corner
    }

    /// The node on the next coarser level this node was restricted to, or
    /// `None` on the coarsest level.
    pub fn coarse_grid_node(&self) -> Option<NodeHandle> {
        self.coarse_grid_node.into_option()
    }

    /// The node on the next finer level this node was copied from, or `None`
    /// on the finest level.
    pub fn fine_grid_node(&self) -> Option<NodeHandle> {
        self.fine_grid_node.into_option()
    }

    /// Sets the coarse grid link of this node.
    ///
    /// This only sets *one* direction of the correspondence. Inside a
    /// [`Hierarchy`][crate::multigrid::Hierarchy], links are always set
    /// pairwise by `link_levels`.
    pub fn set_coarse_link(&mut self, coarse: NodeHandle) {
        self.coarse_grid_node = Opt::some(coarse);
    }

    /// Sets the fine grid link of this node. See
    /// [`set_coarse_link`][Node::set_coarse_link].
    pub fn set_fine_link(&mut self, fine: NodeHandle) {
        self.fine_grid_node = Opt::some(fine);
    }

    pub(crate) fn clear_coarse_link(&mut self) {
        self.coarse_grid_node = Opt::none();
    }
}


#[cfg(test)]
mod tests {
    use super::*;
    use crate::handle::Handle;

    #[test]
    fn new_node_has_no_links() {
        let n = Node::new(Point3::new(1.0, 2.0, 3.0), NodeFlags::interior());

        assert_eq!(n.position(), Point3::new(1.0, 2.0, 3.0));
        assert_eq!(n.coarse_grid_node(), None);
        assert_eq!(n.fine_grid_node(), None);
        assert!(!n.is_trailing_edge_node());
        assert!(!n.is_boundary_corner_node());
    }

    #[test]
    fn links_are_one_directional() {
        let mut fine = Node::new(Point3::new(0.0, 0.0, 0.0), NodeFlags::interior());
        let coarse = fine;

        fine.set_coarse_link(NodeHandle::new(0));
        assert_eq!(fine.coarse_grid_node(), Some(NodeHandle::new(0)));
        assert_eq!(fine.fine_grid_node(), None);

        // The copy taken before is unaffected.
        assert_eq!(coarse.coarse_grid_node(), None);

        fine.set_fine_link(NodeHandle::new(4));
        assert_eq!(fine.fine_grid_node(), Some(NodeHandle::new(4)));

        fine.clear_coarse_link();
        assert_eq!(fine.coarse_grid_node(), None);
    }

    #[test]
    fn flags() {
        let flags = NodeFlags {
            trailing_edge: true,
            boundary_corner: true,
            ..NodeFlags::default()
        };
        let n = Node::new(Point3::new(0.0, 0.0, 0.0), flags);

        assert!(n.is_trailing_edge_node());
        assert!(!n.is_leading_edge_node());
        assert!(!n.is_boundary_edge_node());
        assert!(n.is_boundary_corner_node());
        assert_eq!(n.flags(), flags);
    }
}
