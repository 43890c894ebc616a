use derive_more::Display;

use crate::handle::{EdgeHandle, LoopHandle, NodeHandle, Opt, PanelHandle, VortexEdgeHandle};
use super::TopologyError;


/// Classification of an edge. The variants are listed in decreasing priority:
/// an edge that is both on the trailing edge and a free boundary is a
/// `Trailing` edge.
///
/// The order matters for agglomeration, which advances its front from the
/// trailing edge inwards.
#[derive(Debug, Display, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum EdgeKind {
    #[display(fmt = "trailing edge")]
    Trailing,
    #[display(fmt = "leading edge")]
    Leading,
    #[display(fmt = "boundary edge")]
    Boundary,
    #[display(fmt = "interior edge")]
    Interior,
}

impl EdgeKind {
    /// All kinds, ordered by priority.
    pub const ALL: [EdgeKind; 4] =
        [EdgeKind::Trailing, EdgeKind::Leading, EdgeKind::Boundary, EdgeKind::Interior];

    pub(crate) fn priority(self) -> usize {
        self as usize
    }
}

/// Aerodynamic information about an edge that cannot be derived from the
/// topology alone. Computed by the mesh builder from the node flags.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EdgeMarks {
    /// The edge lies on a trailing edge.
    pub trailing: bool,

    /// The edge lies on a leading edge.
    pub leading: bool,
}


/// An edge between two nodes of a mesh level.
///
/// The edge is directed from `node1` to `node2`; on meshes built by
/// [`LevelBuilder`][crate::build::LevelBuilder], `node1` always has the
/// smaller index. Besides the two nodes, an edge knows:
///
/// - the (at most two) input panels adjacent to it (`tri1`, `tri2`). These
///   always refer to panels of the finest level, even on coarse levels.
/// - the (at most two) vortex loops of its own level adjacent to it
///   (`loop1`, `loop2`).
/// - the vortex edge, i.e. the index of the circulation unknown the lattice
///   solver associates with this edge.
/// - its classification, which is only available after [`Edge::classify`]
///   was called.
///
/// Edges are plain values: assigning one edge to another copies all fields.
/// This is used to derive the edges of a coarse level from the fine one.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Edge {
    node1: NodeHandle,
    node2: NodeHandle,

    tri1: Opt<PanelHandle>,
    tri2: Opt<PanelHandle>,

    loop1: Opt<LoopHandle>,
    loop2: Opt<LoopHandle>,

    vortex_edge: Opt<VortexEdgeHandle>,

    kind: Option<EdgeKind>,
    is_trailing_edge: bool,
    is_leading_edge: bool,
    is_boundary_edge: bool,

    length: f64,

    fine_grid_edge: Opt<EdgeHandle>,
    coarse_grid_edge: Opt<EdgeHandle>,
}

impl Edge {
    /// Creates a new edge from `node1` to `node2` without any adjacency or
    /// classification information.
    ///
    /// Returns an error if both nodes are the same.
    pub fn new(node1: NodeHandle, node2: NodeHandle) -> Result<Self, TopologyError> {
        if node1 == node2 {
            return Err(TopologyError::DegenerateEdge { node: node1 });
        }

        Ok(Self {
            node1,
            node2,
            tri1: Opt::none(),
            tri2: Opt::none(),
            loop1: Opt::none(),
            loop2: Opt::none(),
            vortex_edge: Opt::none(),
            kind: None,
            is_trailing_edge: false,
            is_leading_edge: false,
            is_boundary_edge: false,
            length: 0.0,
            fine_grid_edge: Opt::none(),
            coarse_grid_edge: Opt::none(),
        })
    }

    /// Attaches a panel to this edge: fills `tri1` if that is still empty and
    /// `tri2` otherwise.
    ///
    /// If both slots are already filled, the edge would have three adjacent
    /// panels. This is reported as [`TopologyError::NonManifoldEdge`] and the
    /// edge is not modified.
    pub fn attach_panel(&mut self, panel: PanelHandle) -> Result<(), TopologyError> {
        match (self.tri1.into_option(), self.tri2.into_option()) {
            (None, _) => self.tri1 = Opt::some(panel),
            (Some(_), None) => self.tri2 = Opt::some(panel),
            (Some(first), Some(second)) => {
                return Err(TopologyError::NonManifoldEdge {
                    nodes: [self.node1, self.node2],
                    panel,
                    existing: [first, second],
                });
            }
        }

        Ok(())
    }

    /// Same as `attach_panel`, but for the vortex loops of this level.
    pub(crate) fn attach_loop(&mut self, l: LoopHandle) -> Result<(), TopologyError> {
        match (self.loop1.into_option(), self.loop2.into_option()) {
            (None, _) => self.loop1 = Opt::some(l),
            (Some(_), None) => self.loop2 = Opt::some(l),
            (Some(first), Some(second)) => {
                return Err(TopologyError::NonManifoldQuadEdge {
                    edge: None,
                    cell: l,
                    existing: [Some(first), Some(second)],
                });
            }
        }

        Ok(())
    }

    /// Derives the classification of this edge.
    ///
    /// `is_boundary_edge` is set iff exactly one panel is attached, so an
    /// edge without panels is not a boundary edge. The leading/trailing edge
    /// flags are taken from `marks`, which the mesh builder computes from the
    /// aerodynamic node flags.
    pub fn classify(&mut self, marks: EdgeMarks) {
        self.is_boundary_edge = self.num_panels() == 1;
        self.is_trailing_edge = marks.trailing;
        self.is_leading_edge = marks.leading;

        self.kind = Some(if self.is_trailing_edge {
            EdgeKind::Trailing
        } else if self.is_leading_edge {
            EdgeKind::Leading
        } else if self.is_boundary_edge {
            EdgeKind::Boundary
        } else {
            EdgeKind::Interior
        });
    }

    /// The start node of this edge.
    pub fn node1(&self) -> NodeHandle {
        self.node1
    }

    /// The end node of this edge.
    pub fn node2(&self) -> NodeHandle {
        self.node2
    }

    /// `[node1, node2]`.
    pub fn nodes(&self) -> [NodeHandle; 2] {
        [self.node1, self.node2]
    }

    /// The first attached panel (of the finest level).
    pub fn tri1(&self) -> Option<PanelHandle> {
        self.tri1.into_option()
    }

    /// The second attached panel. `None` on boundary edges.
    pub fn tri2(&self) -> Option<PanelHandle> {
        self.tri2.into_option()
    }

    /// Number of attached panels (0, 1 or 2).
    pub fn num_panels(&self) -> usize {
        self.tri1.is_some() as usize + self.tri2.is_some() as usize
    }

    /// The first adjacent vortex loop of this edge's level.
    pub fn loop1(&self) -> Option<LoopHandle> {
        self.loop1.into_option()
    }

    /// The second adjacent vortex loop. `None` on boundary edges.
    pub fn loop2(&self) -> Option<LoopHandle> {
        self.loop2.into_option()
    }

    /// Returns the loop on the other side of this edge, seen from `l`.
    /// Returns `None` if `l` is not adjacent or if this is a boundary edge.
    pub fn other_loop(&self, l: LoopHandle) -> Option<LoopHandle> {
        match (self.loop1(), self.loop2()) {
            (Some(a), Some(b)) if a == l => Some(b),
            (Some(a), Some(b)) if b == l => Some(a),
            _ => None,
        }
    }

    /// The circulation unknown of this edge. Assigned when the edge becomes
    /// part of a mesh level.
    pub fn vortex_edge(&self) -> Option<VortexEdgeHandle> {
        self.vortex_edge.into_option()
    }

    /// The classification of this edge or `None` if `classify` has not been
    /// called yet.
    pub fn kind(&self) -> Option<EdgeKind> {
        self.kind
    }

    /// Whether `classify` was called.
    pub fn is_classified(&self) -> bool {
        self.kind.is_some()
    }

    /// Whether this edge is part of a trailing edge (a wake is shed here).
    pub fn is_trailing_edge(&self) -> bool {
        self.is_trailing_edge
    }

    /// Whether this edge is part of a leading edge.
    pub fn is_leading_edge(&self) -> bool {
        self.is_leading_edge
    }

    /// Whether exactly one panel is attached to this edge.
    pub fn is_boundary_edge(&self) -> bool {
        self.is_boundary_edge
    }

    /// Distance between the two nodes.
    pub fn length(&self) -> f64 {
        self.length
    }

    /// The edge of the next finer level this edge was copied from.
    pub fn fine_grid_edge(&self) -> Option<EdgeHandle> {
        self.fine_grid_edge.into_option()
    }

    /// The edge of the next coarser level this edge survives as, if any.
    pub fn coarse_grid_edge(&self) -> Option<EdgeHandle> {
        self.coarse_grid_edge.into_option()
    }

    pub(crate) fn set_length(&mut self, length: f64) {
        self.length = length;
    }

    pub(crate) fn set_vortex_edge(&mut self, ve: VortexEdgeHandle) {
        self.vortex_edge = Opt::some(ve);
    }

    /// Rewrites the handles of this level after the edge was copied into a
    /// coarser level.
    pub(crate) fn remap_to_coarse(
        &mut self,
        nodes: [NodeHandle; 2],
        loops: [Option<LoopHandle>; 2],
        fine: EdgeHandle,
    ) {
        self.node1 = nodes[0];
        self.node2 = nodes[1];
        self.loop1 = loops[0].map(Opt::some).unwrap_or_else(Opt::none);
        self.loop2 = loops[1].map(Opt::some).unwrap_or_else(Opt::none);
        self.vortex_edge = Opt::none();
        self.fine_grid_edge = Opt::some(fine);
        self.coarse_grid_edge = Opt::none();
    }

    pub(crate) fn set_coarse_grid_edge(&mut self, coarse: Option<EdgeHandle>) {
        self.coarse_grid_edge = coarse.map(Opt::some).unwrap_or_else(Opt::none);
    }
}


#[cfg(test)]
mod tests {
    use super::*;
    use crate::handle::Handle;

    fn n(i: u32) -> NodeHandle {
        NodeHandle::new(i as _)
    }

    fn p(i: u32) -> PanelHandle {
        PanelHandle::new(i as _)
    }

    #[test]
    fn degenerate_edge() {
        assert_eq!(
            Edge::new(n(3), n(3)),
            Err(TopologyError::DegenerateEdge { node: n(3) }),
        );
    }

    #[test]
    fn new_edge_is_unset() {
        let e = Edge::new(n(0), n(1)).unwrap();

        assert_eq!(e.nodes(), [n(0), n(1)]);
        assert_eq!(e.tri1(), None);
        assert_eq!(e.tri2(), None);
        assert_eq!(e.loop1(), None);
        assert_eq!(e.loop2(), None);
        assert_eq!(e.vortex_edge(), None);
        assert_eq!(e.kind(), None);
        assert!(!e.is_classified());
    }

    #[test]
    fn attach_panels_in_order() {
        let mut e = Edge::new(n(0), n(1)).unwrap();

        // Panel 0 is an ordinary panel and must not be confused with "no
        // panel".
        e.attach_panel(p(0)).unwrap();
        assert_eq!(e.tri1(), Some(p(0)));
        assert_eq!(e.tri2(), None);
        assert_eq!(e.num_panels(), 1);

        e.attach_panel(p(5)).unwrap();
        assert_eq!(e.tri1(), Some(p(0)));
        assert_eq!(e.tri2(), Some(p(5)));
        assert_eq!(e.num_panels(), 2);
    }

    #[test]
    fn third_panel_is_rejected_without_modification() {
        let mut e = Edge::new(n(2), n(7)).unwrap();
        e.attach_panel(p(1)).unwrap();
        e.attach_panel(p(2)).unwrap();
        let before = e;

        assert_eq!(
            e.attach_panel(p(3)),
            Err(TopologyError::NonManifoldEdge {
                nodes: [n(2), n(7)],
                panel: p(3),
                existing: [p(1), p(2)],
            }),
        );
        assert_eq!(e, before);
    }

    #[test]
    fn classify_boundary_and_interior() {
        let mut boundary = Edge::new(n(0), n(1)).unwrap();
        boundary.attach_panel(p(0)).unwrap();
        boundary.classify(EdgeMarks::default());
        assert!(boundary.is_boundary_edge());
        assert_eq!(boundary.kind(), Some(EdgeKind::Boundary));

        let mut interior = Edge::new(n(0), n(2)).unwrap();
        interior.attach_panel(p(0)).unwrap();
        interior.attach_panel(p(1)).unwrap();
        interior.classify(EdgeMarks::default());
        assert!(!interior.is_boundary_edge());
        assert_eq!(interior.kind(), Some(EdgeKind::Interior));
    }

    #[test]
    fn classify_without_panels() {
        let mut e = Edge::new(n(0), n(1)).unwrap();
        e.classify(EdgeMarks::default());

        assert!(e.is_classified());
        assert!(!e.is_boundary_edge());
        assert_eq!(e.num_panels(), 0);
        assert_eq!(e.kind(), Some(EdgeKind::Interior));
    }

    #[test]
    fn classify_uses_marks() {
        let mut e = Edge::new(n(0), n(1)).unwrap();
        e.attach_panel(p(0)).unwrap();
        e.classify(EdgeMarks { trailing: true, leading: true });

        assert!(e.is_trailing_edge());
        assert!(e.is_leading_edge());
        assert!(e.is_boundary_edge());
        assert_eq!(e.kind(), Some(EdgeKind::Trailing));

        e.classify(EdgeMarks { trailing: false, leading: true });
        assert!(!e.is_trailing_edge());
        assert_eq!(e.kind(), Some(EdgeKind::Leading));
    }

    #[test]
    fn copy_is_field_wise() {
        let mut e = Edge::new(n(0), n(1)).unwrap();
        e.attach_panel(p(4)).unwrap();
        e.attach_loop(LoopHandle::new(4)).unwrap();
        e.set_vortex_edge(VortexEdgeHandle::new(9));
        e.set_length(2.5);
        e.classify(EdgeMarks::default());

        let mut copy = e;
        assert_eq!(copy, e);

        copy.remap_to_coarse([n(10), n(11)], [Some(LoopHandle::new(0)), None], EdgeHandle::new(3));
        assert_eq!(copy.nodes(), [n(10), n(11)]);
        assert_eq!(copy.tri1(), Some(p(4)));
        assert_eq!(copy.loop1(), Some(LoopHandle::new(0)));
        assert_eq!(copy.vortex_edge(), None);
        assert_eq!(copy.fine_grid_edge(), Some(EdgeHandle::new(3)));
        assert_eq!(copy.kind(), Some(EdgeKind::Boundary));
        assert_eq!(copy.length(), 2.5);

        // The original is untouched.
        assert_eq!(e.nodes(), [n(0), n(1)]);
        assert_eq!(e.vortex_edge(), Some(VortexEdgeHandle::new(9)));
    }

    #[test]
    fn other_loop() {
        let mut e = Edge::new(n(0), n(1)).unwrap();
        let (a, b) = (LoopHandle::new(0), LoopHandle::new(1));
        e.attach_loop(a).unwrap();
        assert_eq!(e.other_loop(a), None);

        e.attach_loop(b).unwrap();
        assert_eq!(e.other_loop(a), Some(b));
        assert_eq!(e.other_loop(b), Some(a));
        assert_eq!(e.other_loop(LoopHandle::new(2)), None);
        assert_eq!(
            e.attach_loop(LoopHandle::new(2)),
            Err(TopologyError::NonManifoldQuadEdge {
                edge: None,
                cell: LoopHandle::new(2),
                existing: [Some(a), Some(b)],
            }),
        );
    }

    #[test]
    fn kind_priority() {
        assert!(EdgeKind::Trailing < EdgeKind::Leading);
        assert!(EdgeKind::Boundary < EdgeKind::Interior);
        assert_eq!(EdgeKind::Interior.priority(), 3);
        assert_eq!(EdgeKind::Leading.to_string(), "leading edge");
    }
}
