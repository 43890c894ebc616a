//! A single resolution of the surface mesh.

use std::ops;

use smallvec::SmallVec;
use static_assertions::assert_impl_all;

use crate::{
    core::{Direction, Edge, EdgeKind, Node, Panel, QuadEdge, TopologyError, VortexLoop},
    handle::{
        EdgeHandle, Handle, LoopHandle, NodeHandle, PanelHandle, VortexEdgeHandle,
    },
};


/// One level of the multigrid hierarchy.
///
/// A level exclusively owns its nodes, edges, quad edges and vortex loops.
/// The finest level (level 0) additionally owns the input panels; coarser
/// levels refer to those through [`VortexLoop::panels`] and
/// [`Edge::tri1`]/[`Edge::tri2`].
///
/// Levels are created by [`LevelBuilder`][crate::build::LevelBuilder] (level
/// 0) and by the [`Hierarchy`][crate::multigrid::Hierarchy] (all coarser
/// levels). Once created, the topology of a level never changes.
///
/// All elements can be accessed by indexing with their handle:
///
/// ```ignore
/// let node = &level[node_handle];
/// let edge = &level[edge_handle];
/// ```
#[derive(Debug, Clone)]
pub struct MeshLevel {
    level: usize,
    nodes: Vec<Node>,
    edges: Vec<Edge>,
    quad_edges: Vec<QuadEdge>,
    loops: Vec<VortexLoop>,
    panels: Vec<Panel>,
}

assert_impl_all!(MeshLevel: Send, Sync);

impl MeshLevel {
    /// Assembles a level from its elements and derives the quad edges and
    /// vortex edges from the edge/loop adjacency.
    ///
    /// Every edge already has to know its adjacent loops.
    pub(crate) fn from_parts(
        level: usize,
        nodes: Vec<Node>,
        edges: Vec<Edge>,
        loops: Vec<VortexLoop>,
        panels: Vec<Panel>,
    ) -> Result<Self, TopologyError> {
        let mut out = Self {
            level,
            quad_edges: vec![QuadEdge::new(); edges.len()],
            nodes,
            edges,
            loops,
            panels,
        };

        out.link_quad_edges()?;
        out.assign_vortex_edges();
        Ok(out)
    }

    fn link_quad_edges(&mut self) -> Result<(), TopologyError> {
        for (i, (edge, qe)) in self.edges.iter().zip(&mut self.quad_edges).enumerate() {
            qe.reset();
            for l in edge.loop1().into_iter().chain(edge.loop2()) {
                qe.link(l).map_err(|e| e.at_edge(EdgeHandle::from_usize(i)))?;
            }
        }

        Ok(())
    }

    /// Every edge of a level carries one circulation unknown, numbered like
    /// the edges themselves.
    fn assign_vortex_edges(&mut self) {
        for (i, edge) in self.edges.iter_mut().enumerate() {
            edge.set_vortex_edge(VortexEdgeHandle::from_usize(i));
        }
    }

    /// The index of this level: 0 for the finest level.
    pub fn level(&self) -> usize {
        self.level
    }

    pub fn num_nodes(&self) -> usize {
        self.nodes.len()
    }

    pub fn num_edges(&self) -> usize {
        self.edges.len()
    }

    /// Number of vortex loops (cells) of this level.
    pub fn num_loops(&self) -> usize {
        self.loops.len()
    }

    pub fn num_vortex_edges(&self) -> usize {
        self.edges.iter().filter(|e| e.vortex_edge().is_some()).count()
    }

    /// Number of input panels. Always 0 on coarse levels.
    pub fn num_panels(&self) -> usize {
        self.panels.len()
    }

    pub fn num_edges_of_kind(&self, kind: EdgeKind) -> usize {
        self.edges.iter().filter(|e| e.kind() == Some(kind)).count()
    }

    pub fn num_boundary_edges(&self) -> usize {
        self.edges.iter().filter(|e| e.is_boundary_edge()).count()
    }

    pub fn nodes(&self) -> impl Iterator<Item = (NodeHandle, &Node)> + '_ {
        self.nodes.iter().enumerate().map(|(i, n)| (NodeHandle::from_usize(i), n))
    }

    pub fn edges(&self) -> impl Iterator<Item = (EdgeHandle, &Edge)> + '_ {
        self.edges.iter().enumerate().map(|(i, e)| (EdgeHandle::from_usize(i), e))
    }

    pub fn loops(&self) -> impl Iterator<Item = (LoopHandle, &VortexLoop)> + '_ {
        self.loops.iter().enumerate().map(|(i, l)| (LoopHandle::from_usize(i), l))
    }

    pub fn panels(&self) -> impl Iterator<Item = (PanelHandle, &Panel)> + '_ {
        self.panels.iter().enumerate().map(|(i, p)| (PanelHandle::from_usize(i), p))
    }

    pub fn node(&self, h: NodeHandle) -> Option<&Node> {
        self.nodes.get(h.to_usize())
    }

    pub fn edge(&self, h: EdgeHandle) -> Option<&Edge> {
        self.edges.get(h.to_usize())
    }

    /// The quad edge belonging to the given edge.
    pub fn quad_edge(&self, h: EdgeHandle) -> Option<&QuadEdge> {
        self.quad_edges.get(h.to_usize())
    }

    pub fn vortex_loop(&self, h: LoopHandle) -> Option<&VortexLoop> {
        self.loops.get(h.to_usize())
    }

    /// The input panel with the given handle. Only the finest level has
    /// panels.
    pub fn panel(&self, h: PanelHandle) -> Option<&Panel> {
        self.panels.get(h.to_usize())
    }

    /// The edge carrying the given circulation unknown.
    pub fn vortex_edge(&self, h: VortexEdgeHandle) -> Option<EdgeHandle> {
        let e = EdgeHandle::new(h.idx());
        match self.edge(e) {
            Some(edge) if edge.vortex_edge() == Some(h) => Some(e),
            _ => None,
        }
    }

    /// Returns the first edge without classification, if there is one.
    pub fn first_unclassified_edge(&self) -> Option<EdgeHandle> {
        self.edges().find(|(_, e)| !e.is_classified()).map(|(h, _)| h)
    }

    /// The neighbors of a cell: for every bounding edge, the edge together
    /// with the cell on the other side of its quad edge (`None` for boundary
    /// edges).
    pub fn neighbors(
        &self,
        cell: LoopHandle,
    ) -> impl Iterator<Item = (EdgeHandle, Direction, Option<LoopHandle>)> + '_ {
        self[cell].edges()
            .iter()
            .map(move |&(e, dir)| (e, dir, self.quad_edges[e.to_usize()].other(cell)))
    }

    /// The distinct nodes on the boundary of a cell, in order of first
    /// appearance.
    pub fn loop_nodes(&self, cell: LoopHandle) -> SmallVec<[NodeHandle; 4]> {
        let mut out = SmallVec::new();
        for &(e, _) in self[cell].edges() {
            for &n in &self[e].nodes() {
                if !out.contains(&n) {
                    out.push(n);
                }
            }
        }
        out
    }

    /// Iterates over all edges adjacent to the given node. This is a linear
    /// scan over all edges.
    pub fn edges_around_node(&self, node: NodeHandle) -> impl Iterator<Item = EdgeHandle> + '_ {
        self.edges()
            .filter(move |(_, e)| e.node1() == node || e.node2() == node)
            .map(|(h, _)| h)
    }

    // ===== Mutable access for the hierarchy =================================
    // Only links between levels may change after construction.

    pub(crate) fn node_mut(&mut self, h: NodeHandle) -> &mut Node {
        &mut self.nodes[h.to_usize()]
    }

    pub(crate) fn edge_mut(&mut self, h: EdgeHandle) -> &mut Edge {
        &mut self.edges[h.to_usize()]
    }

    pub(crate) fn loop_mut(&mut self, h: LoopHandle) -> &mut VortexLoop {
        &mut self.loops[h.to_usize()]
    }

    /// Removes all links into the next coarser level.
    pub(crate) fn clear_coarse_links(&mut self) {
        for node in &mut self.nodes {
            node.clear_coarse_link();
        }
        for edge in &mut self.edges {
            edge.set_coarse_grid_edge(None);
        }
        for l in &mut self.loops {
            l.set_coarse_loop(None);
        }
    }
}

impl ops::Index<NodeHandle> for MeshLevel {
    type Output = Node;
    fn index(&self, h: NodeHandle) -> &Self::Output {
        &self.nodes[h.to_usize()]
    }
}

impl ops::Index<EdgeHandle> for MeshLevel {
    type Output = Edge;
    fn index(&self, h: EdgeHandle) -> &Self::Output {
        &self.edges[h.to_usize()]
    }
}

impl ops::Index<LoopHandle> for MeshLevel {
    type Output = VortexLoop;
    fn index(&self, h: LoopHandle) -> &Self::Output {
        &self.loops[h.to_usize()]
    }
}

impl ops::Index<PanelHandle> for MeshLevel {
    type Output = Panel;
    fn index(&self, h: PanelHandle) -> &Self::Output {
        &self.panels[h.to_usize()]
    }
}
