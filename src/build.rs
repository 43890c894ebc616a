//! Constructing the finest mesh level from an indexed triangulation.

use std::collections::hash_map::Entry;

use cgmath::{MetricSpace, Point3};
use failure::Fail;
use fxhash::FxHashMap;
use log::{debug, trace};

use crate::{
    core::{Direction, Edge, EdgeMarks, Node, NodeFlags, Panel, TopologyError, VortexLoop},
    handle::{EdgeHandle, Handle, LoopHandle, NodeHandle, PanelHandle},
    level::MeshLevel,
    math::{ElementGeometry, Pos3Like},
};


/// Errors that can happen while building a mesh level from input data.
#[derive(Debug, Clone, PartialEq, Fail)]
pub enum BuildError {
    /// A panel refers to a node that was never added.
    #[fail(
        display = "panel {} refers to node {}, but only {} nodes exist",
        panel,
        node,
        num_nodes
    )]
    InvalidNodeIndex {
        panel: PanelHandle,
        node: NodeHandle,
        num_nodes: usize,
    },

    /// The input does not contain any node or any panel.
    #[fail(display = "cannot build a mesh level without nodes or panels")]
    EmptyMesh,

    #[fail(display = "{}", _0)]
    Topology(#[fail(cause)] TopologyError),
}

impl From<TopologyError> for BuildError {
    fn from(src: TopologyError) -> Self {
        BuildError::Topology(src)
    }
}


/// Collects nodes and panels and turns them into the finest [`MeshLevel`].
///
/// ```
/// use vortex_mesh::{build::LevelBuilder, core::NodeFlags};
///
/// let mut b = LevelBuilder::new();
/// let n = [
///     b.add_node([0.0, 0.0, 0.0], NodeFlags::interior()),
///     b.add_node([1.0, 0.0, 0.0], NodeFlags::interior()),
///     b.add_node([1.0, 1.0, 0.0], NodeFlags::interior()),
///     b.add_node([0.0, 1.0, 0.0], NodeFlags::interior()),
/// ];
/// b.add_triangle(n[0], n[1], n[2]);
/// b.add_triangle(n[0], n[2], n[3]);
///
/// let level = b.build().unwrap();
/// assert_eq!(level.num_edges(), 5);
/// ```
#[derive(Debug, Clone, Default)]
pub struct LevelBuilder {
    nodes: Vec<Node>,
    panels: Vec<Panel>,
}

impl LevelBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(nodes: usize, panels: usize) -> Self {
        Self {
            nodes: Vec::with_capacity(nodes),
            panels: Vec::with_capacity(panels),
        }
    }

    pub fn add_node(&mut self, pos: impl Pos3Like, flags: NodeFlags) -> NodeHandle {
        let h = NodeHandle::from_usize(self.nodes.len());
        self.nodes.push(Node::new(pos.to_point3(), flags));
        h
    }

    /// Adds a panel. Node handles are only checked in [`build`][Self::build].
    pub fn add_panel(&mut self, panel: Panel) -> PanelHandle {
        let h = PanelHandle::from_usize(self.panels.len());
        self.panels.push(panel);
        h
    }

    pub fn add_triangle(&mut self, a: NodeHandle, b: NodeHandle, c: NodeHandle) -> PanelHandle {
        self.add_panel(Panel::Tri([a, b, c]))
    }

    pub fn add_quad(
        &mut self,
        a: NodeHandle,
        b: NodeHandle,
        c: NodeHandle,
        d: NodeHandle,
    ) -> PanelHandle {
        self.add_panel(Panel::Quad([a, b, c, d]))
    }

    pub fn num_nodes(&self) -> usize {
        self.nodes.len()
    }

    pub fn num_panels(&self) -> usize {
        self.panels.len()
    }

    /// Builds level 0.
    ///
    /// Edges are deduplicated by their unordered node pair and always point
    /// from the node with the smaller index to the one with the larger
    /// index. Every panel becomes one vortex loop with the same index.
    pub fn build(self) -> Result<MeshLevel, BuildError> {
        let Self { nodes, panels } = self;

        if nodes.is_empty() || panels.is_empty() {
            return Err(BuildError::EmptyMesh);
        }
        for (i, panel) in panels.iter().enumerate() {
            let panel_handle = PanelHandle::from_usize(i);
            if let Some(&node) = panel.nodes().iter().find(|n| n.to_usize() >= nodes.len()) {
                return Err(BuildError::InvalidNodeIndex {
                    panel: panel_handle,
                    node,
                    num_nodes: nodes.len(),
                });
            }
            if let Some(node) = panel.repeated_node() {
                return Err(TopologyError::DegenerateEdge { node }.into());
            }
        }

        // ===== Edges and loops ==============================================
        let mut edges: Vec<Edge> = Vec::with_capacity(nodes.len() + panels.len());
        let mut edge_map: FxHashMap<(NodeHandle, NodeHandle), EdgeHandle> = FxHashMap::default();
        let mut loops = Vec::with_capacity(panels.len());

        for (i, panel) in panels.iter().enumerate() {
            let panel_handle = PanelHandle::from_usize(i);
            let loop_handle = LoopHandle::from_usize(i);

            let corners: Vec<Point3<f64>> = panel.nodes()
                .iter()
                .map(|&n| nodes[n.to_usize()].position())
                .collect();
            let mut vortex_loop = VortexLoop::new(
                ElementGeometry::of_polygon(&corners),
                vec![panel_handle],
            );

            for (from, to) in panel.sides() {
                let (key, dir) = if from < to {
                    ((from, to), Direction::Forward)
                } else {
                    ((to, from), Direction::Backward)
                };

                let edge_handle = match edge_map.entry(key) {
                    Entry::Occupied(e) => *e.get(),
                    Entry::Vacant(e) => {
                        let h = EdgeHandle::from_usize(edges.len());
                        edges.push(Edge::new(key.0, key.1)?);
                        *e.insert(h)
                    }
                };

                let edge = &mut edges[edge_handle.to_usize()];
                edge.attach_panel(panel_handle)?;
                edge.attach_loop(loop_handle).map_err(|e| e.at_edge(edge_handle))?;
                vortex_loop.push_edge(edge_handle, dir);
            }

            loops.push(vortex_loop);
        }

        // ===== Classification ===============================================
        for edge in &mut edges {
            let [a, b] = edge.nodes();
            let (a, b) = (&nodes[a.to_usize()], &nodes[b.to_usize()]);

            // Only free edges can be part of the trailing or leading edge.
            let free = edge.num_panels() == 1;
            let marks = EdgeMarks {
                trailing: free && a.is_trailing_edge_node() && b.is_trailing_edge_node(),
                leading: free && a.is_leading_edge_node() && b.is_leading_edge_node(),
            };
            edge.classify(marks);
            edge.set_length(a.position().distance(b.position()));
        }

        trace!(
            "level 0 edges: {} trailing, {} leading, {} boundary",
            edges.iter().filter(|e| e.is_trailing_edge()).count(),
            edges.iter().filter(|e| e.is_leading_edge()).count(),
            edges.iter().filter(|e| e.is_boundary_edge()).count(),
        );

        let level = MeshLevel::from_parts(0, nodes, edges, loops, panels)?;
        debug!(
            "built level 0: {} nodes, {} edges, {} loops",
            level.num_nodes(),
            level.num_edges(),
            level.num_loops(),
        );

        Ok(level)
    }
}
