//! The plain value types a mesh level is made of.
//!
//! All of these are small `Copy` (or at least `Clone`) aggregates that refer
//! to each other only through [handles][crate::handle]. They do not own any
//! other element and do not know about the level they live in; the
//! [`MeshLevel`][crate::level::MeshLevel] owns them and maintains the
//! consistency between them.
//!
//! - [`Node`]: a point plus classification flags and multigrid links.
//! - [`Edge`]: a connection between two nodes with its adjacent panels and
//!   vortex loops.
//! - [`QuadEdge`]: the two cells sharing an edge (the dual graph).
//! - [`Panel`]: an input triangle or quad of the finest level.
//! - [`VortexLoop`]: one cell of a level.

use failure::Fail;

use crate::handle::{EdgeHandle, LoopHandle, NodeHandle, PanelHandle};

mod edge;
mod node;
mod panel;
mod quad_edge;
mod vortex_loop;

pub use self::{
    edge::{Edge, EdgeKind, EdgeMarks},
    node::{Node, NodeFlags},
    panel::{Panel, PanelKind},
    quad_edge::{QuadEdge, Slot},
    vortex_loop::{Direction, VortexLoop},
};


/// Errors caused by topology that cannot be represented by a mesh level.
///
/// All of these are fatal to the construction of the level they occur in.
#[derive(Debug, Clone, PartialEq, Fail)]
pub enum TopologyError {
    /// An edge would connect a node to itself.
    #[fail(display = "degenerate edge: both ends are node {}", node)]
    DegenerateEdge {
        node: NodeHandle,
    },

    /// A third panel was attached to an edge that already has two.
    #[fail(
        display = "non-manifold edge {:?}: panel {} cannot be attached, edge already \
            borders {:?}",
        nodes,
        panel,
        existing
    )]
    NonManifoldEdge {
        nodes: [NodeHandle; 2],
        panel: PanelHandle,
        existing: [PanelHandle; 2],
    },

    /// A cell was linked into a quad edge slot that is already filled.
    ///
    /// `edge` is `None` when the error comes from a standalone [`QuadEdge`]
    /// or [`Edge`]; a mesh level fills in the edge it was linking.
    #[fail(
        display = "non-manifold quad edge {:?}: cell {} cannot be linked, slots hold {:?}",
        edge,
        cell,
        existing
    )]
    NonManifoldQuadEdge {
        edge: Option<EdgeHandle>,
        cell: LoopHandle,
        existing: [Option<LoopHandle>; 2],
    },
}

impl TopologyError {
    /// Records the edge at which a quad edge error happened. Other errors are
    /// returned unchanged.
    pub(crate) fn at_edge(self, at: EdgeHandle) -> Self {
        match self {
            TopologyError::NonManifoldQuadEdge { edge: None, cell, existing } => {
                TopologyError::NonManifoldQuadEdge { edge: Some(at), cell, existing }
            }
            other => other,
        }
    }
}


#[cfg(test)]
mod tests {
    use super::*;
    use crate::handle::Handle;

    #[test]
    fn error_messages_name_the_elements() {
        let e = TopologyError::NonManifoldEdge {
            nodes: [NodeHandle::new(1), NodeHandle::new(2)],
            panel: PanelHandle::new(7),
            existing: [PanelHandle::new(3), PanelHandle::new(4)],
        };
        let msg = e.to_string();
        assert!(msg.contains("[N1, N2]"));
        assert!(msg.contains("P7"));
        assert!(msg.contains("[P3, P4]"));

        let e = TopologyError::NonManifoldQuadEdge {
            edge: None,
            cell: LoopHandle::new(0),
            existing: [Some(LoopHandle::new(5)), None],
        };
        assert!(e.to_string().contains("[Some(L5), None]"));

        let e = e.at_edge(EdgeHandle::new(9));
        assert!(e.to_string().contains("Some(E9)"));
    }

    #[test]
    fn at_edge_keeps_known_edges() {
        let e = TopologyError::NonManifoldQuadEdge {
            edge: Some(EdgeHandle::new(1)),
            cell: LoopHandle::new(0),
            existing: [None, None],
        };
        assert_eq!(e.clone().at_edge(EdgeHandle::new(2)), e);

        let e = TopologyError::DegenerateEdge { node: NodeHandle::new(3) };
        assert_eq!(e.clone().at_edge(EdgeHandle::new(2)), e);
    }
}
