//! Front-advancing agglomeration of vortex loops into coarse cells, and the
//! construction of the coarse level from it.
//!
//! The front starts at the trailing edge and sweeps over the surface: the
//! front edge with the highest priority (and among those, the lowest index)
//! is taken, the free loops next to it become seeds and each seed swallows
//! its free neighbors. The edges of the new coarse cell then join the front.
//!
//! The first coarse level can instead be built by [`pair_triangles`], which
//! only merges pairs of triangles into well shaped quads.

use std::collections::BTreeSet;

use cgmath::{InnerSpace, MetricSpace, Point3, Vector3};
use fxhash::FxHashMap;
use log::trace;
use num_traits::Zero;
use smallvec::SmallVec;

use crate::{
    core::{Direction, Edge, EdgeKind, Node, TopologyError, VortexLoop},
    handle::{EdgeHandle, Handle, LoopHandle, NodeHandle, Opt},
    level::MeshLevel,
    math::ElementGeometry,
};


/// The result of agglomerating the loops of one level: the coarse cell of
/// every fine loop.
#[derive(Debug, Clone)]
pub(crate) struct Agglomeration {
    coarse_of: Vec<LoopHandle>,
    num_cells: usize,
}

impl Agglomeration {
    /// Every entry of `coarse_of` has to be set.
    fn from_assignment(coarse_of: &[Opt<LoopHandle>], num_cells: usize) -> Self {
        let coarse_of = coarse_of.iter()
            .map(|c| c.into_option().unwrap_or_else(|| LoopHandle::new(0)))
            .collect();

        Self { coarse_of, num_cells }
    }

    pub(crate) fn num_cells(&self) -> usize {
        self.num_cells
    }

    pub(crate) fn coarse_of(&self, fine: LoopHandle) -> LoopHandle {
        self.coarse_of[fine.to_usize()]
    }
}

/// Correspondences between a fine level and the coarse level built from it.
/// Applied by [`link_levels`][super::link_levels].
#[derive(Debug, Clone, Default)]
pub(crate) struct LevelLinks {
    /// `(fine, coarse)` for every node that survived. These are linked in
    /// both directions.
    pub(crate) survivors: Vec<(NodeHandle, NodeHandle)>,

    /// `(fine, coarse)` for every node that did not survive. These only link
    /// from the fine to the coarse level.
    pub(crate) collapsed: Vec<(NodeHandle, NodeHandle)>,

    /// `(fine, coarse)` for every edge that survived.
    pub(crate) edges: Vec<(EdgeHandle, EdgeHandle)>,

    /// `(fine, coarse)` for every loop.
    pub(crate) loops: Vec<(LoopHandle, LoopHandle)>,
}


// ===========================================================================
// ===== Agglomeration
// ===========================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum EdgeState {
    Fresh,
    InFront,
    Used,
}

/// The advancing front: one ordered set of edges per edge kind.
struct Front {
    sets: [BTreeSet<EdgeHandle>; 4],
    state: Vec<EdgeState>,
}

impl Front {
    fn new(num_edges: usize) -> Self {
        Self {
            sets: Default::default(),
            state: vec![EdgeState::Fresh; num_edges],
        }
    }

    /// Adds the edge with the given priority, unless it is already in the
    /// front or was used before.
    fn push(&mut self, e: EdgeHandle, kind: EdgeKind) {
        if self.state[e.to_usize()] == EdgeState::Fresh {
            self.state[e.to_usize()] = EdgeState::InFront;
            self.sets[kind.priority()].insert(e);
        }
    }

    /// Removes and returns the lowest index edge of the highest priority.
    fn pop(&mut self) -> Option<EdgeHandle> {
        for set in &mut self.sets {
            if let Some(&e) = set.iter().next() {
                set.remove(&e);
                self.state[e.to_usize()] = EdgeState::Used;
                return Some(e);
            }
        }

        None
    }

    fn is_empty(&self) -> bool {
        self.sets.iter().all(|s| s.is_empty())
    }
}

struct Agglomerator<'a> {
    fine: &'a MeshLevel,
    front: Front,
    coarse_of: Vec<Opt<LoopHandle>>,
    num_cells: usize,
}

impl Agglomerator<'_> {
    fn is_free(&self, l: LoopHandle) -> bool {
        self.coarse_of[l.to_usize()].is_none()
    }

    fn assign(&mut self, l: LoopHandle, cell: LoopHandle) {
        self.coarse_of[l.to_usize()] = Opt::some(cell);
    }

    /// Free loops sharing an edge with `l`, without duplicates.
    fn free_neighbors(&self, l: LoopHandle) -> SmallVec<[LoopHandle; 4]> {
        let mut out = SmallVec::<[LoopHandle; 4]>::new();
        for &(e, _) in self.fine[l].edges() {
            if let Some(other) = self.fine[e].other_loop(l) {
                if self.is_free(other) && !out.contains(&other) {
                    out.push(other);
                }
            }
        }
        out
    }

    /// Creates a new coarse cell around `seed`.
    fn merge_around(&mut self, seed: LoopHandle) {
        let cell = LoopHandle::from_usize(self.num_cells);
        self.num_cells += 1;

        self.assign(seed, cell);
        let mut merged: SmallVec<[LoopHandle; 8]> = SmallVec::new();
        merged.push(seed);

        for n in self.free_neighbors(seed) {
            self.assign(n, cell);
            merged.push(n);
        }

        // Free loops that touch at least two of the merged loops would end
        // up (almost) enclosed by the new cell, so they are merged as well.
        let mut hits: FxHashMap<LoopHandle, u32> = FxHashMap::default();
        for &m in &merged[1..] {
            for n in self.free_neighbors(m) {
                *hits.entry(n).or_insert(0) += 1;
            }
        }
        let mut enclosed: Vec<_> = hits.into_iter()
            .filter(|&(_, count)| count >= 2)
            .map(|(l, _)| l)
            .collect();
        enclosed.sort();
        for l in enclosed {
            self.assign(l, cell);
            merged.push(l);
        }

        trace!("coarse cell {} <- {:?}", cell, merged);

        let fine = self.fine;
        for &m in &merged {
            for &(e, _) in fine[m].edges() {
                self.front.push(e, EdgeKind::Interior);
            }
        }
    }

    fn run(&mut self) {
        let fine = self.fine;

        for kind in &[EdgeKind::Trailing, EdgeKind::Leading, EdgeKind::Boundary] {
            for (h, e) in fine.edges() {
                if e.kind() == Some(*kind) {
                    self.front.push(h, *kind);
                }
            }
        }

        // Closed surfaces have no marked edges to start from.
        if self.front.is_empty() && fine.num_edges() > 0 {
            self.front.push(EdgeHandle::new(0), EdgeKind::Interior);
        }

        let mut next_free = 0;
        loop {
            while let Some(e) = self.front.pop() {
                let edge = fine[e];
                for l in edge.loop1().into_iter().chain(edge.loop2()) {
                    if self.is_free(l) {
                        self.merge_around(l);
                    }
                }
            }

            // Loops in components the front never reached.
            while next_free < self.coarse_of.len() && self.coarse_of[next_free].is_some() {
                next_free += 1;
            }
            if next_free == self.coarse_of.len() {
                break;
            }
            self.merge_around(LoopHandle::from_usize(next_free));
        }
    }
}

/// Groups the loops of `fine` into coarse cells.
pub(crate) fn agglomerate(fine: &MeshLevel) -> Agglomeration {
    let mut a = Agglomerator {
        fine,
        front: Front::new(fine.num_edges()),
        coarse_of: vec![Opt::none(); fine.num_loops()],
        num_cells: 0,
    };
    a.run();

    // `run` only stops once every loop is assigned.
    Agglomeration::from_assignment(&a.coarse_of, a.num_cells)
}


// ===========================================================================
// ===== Mixed first level
// ===========================================================================

/// Quads that turn by more than this at any corner (i.e. have an interior
/// angle below 50°) are rejected by [`is_good_quad`].
const MAX_TURNING_ANGLE: f64 = 130.0 * std::f64::consts::PI / 180.0;

/// Whether the quad with the given corners (in order around the quad) turns
/// by at most 130° at every corner. Quads with coincident corners are
/// rejected.
pub(crate) fn is_good_quad(corners: &[Point3<f64>; 4]) -> bool {
    let mut sides = [Vector3::zero(); 4];
    for i in 0..4 {
        let side = corners[(i + 1) % 4] - corners[i];
        let len = side.magnitude();
        if !(len > 0.0) {
            return false;
        }
        sides[i] = side / len;
    }

    (0..4).all(|i| {
        let cos = sides[i].dot(sides[(i + 1) % 4]).max(-1.0).min(1.0);
        cos.acos() <= MAX_TURNING_ANGLE
    })
}

/// Pairs neighboring triangles into quads, turning a triangulation into a
/// mixed mesh.
///
/// Loops are visited in index order. Every unpaired triangle is paired with
/// the first unpaired triangle across one of its edges (in traversal order)
/// for which the resulting quad passes [`is_good_quad`]. Loops without a
/// partner (including all loops that are not triangles) stay cells of their
/// own. Cells are numbered by their lowest fine loop.
pub(crate) fn pair_triangles(fine: &MeshLevel) -> Agglomeration {
    let num_loops = fine.num_loops();
    let mut partner = vec![Opt::<LoopHandle>::none(); num_loops];
    let is_triangle = |l: LoopHandle| fine.loop_nodes(l).len() == 3;

    for (l, vortex_loop) in fine.loops() {
        if partner[l.to_usize()].is_some() || !is_triangle(l) {
            continue;
        }

        for &(e, dir) in vortex_loop.edges() {
            let edge = &fine[e];
            let other = match edge.other_loop(l) {
                Some(o) if o != l && partner[o.to_usize()].is_none() && is_triangle(o) => o,
                _ => continue,
            };

            let (from, to) = match dir {
                Direction::Forward => (edge.node1(), edge.node2()),
                Direction::Backward => (edge.node2(), edge.node1()),
            };
            let apex = |cell: LoopHandle| {
                fine.loop_nodes(cell).into_iter().find(|&n| n != from && n != to)
            };
            let (own, opposite) = match (apex(l), apex(other)) {
                (Some(own), Some(opposite)) => (own, opposite),
                _ => continue,
            };

            let corners = [
                fine[from].position(),
                fine[opposite].position(),
                fine[to].position(),
                fine[own].position(),
            ];
            if is_good_quad(&corners) {
                partner[l.to_usize()] = Opt::some(other);
                partner[other.to_usize()] = Opt::some(l);
                break;
            }
        }
    }

    let mut coarse_of = vec![Opt::<LoopHandle>::none(); num_loops];
    let mut num_cells = 0;
    for i in 0..num_loops {
        if coarse_of[i].is_some() {
            continue;
        }

        let cell = LoopHandle::from_usize(num_cells);
        num_cells += 1;
        coarse_of[i] = Opt::some(cell);
        if let Some(p) = partner[i].into_option() {
            coarse_of[p.to_usize()] = Opt::some(cell);
        }
    }

    trace!("paired {} loops into {} cells", num_loops, num_cells);
    Agglomeration::from_assignment(&coarse_of, num_cells)
}


// ===========================================================================
// ===== Coarse level construction
// ===========================================================================

/// Builds the level above `fine` from the given agglomeration.
///
/// Returns `Ok(None)` if no node would survive, i.e. the coarse cells do not
/// have any edge left to bound them. This happens when closed surfaces are
/// agglomerated into single cells.
pub(crate) fn coarsen(
    fine: &MeshLevel,
    agg: &Agglomeration,
) -> Result<Option<(MeshLevel, LevelLinks)>, TopologyError> {
    let mut links = LevelLinks::default();

    // ===== Surviving edges and nodes ========================================
    let survives = |e: &Edge| {
        match (e.loop1(), e.loop2()) {
            (Some(a), Some(b)) => {
                e.kind() != Some(EdgeKind::Interior) || agg.coarse_of(a) != agg.coarse_of(b)
            }
            _ => true,
        }
    };

    let mut touched = vec![false; fine.num_nodes()];
    for (_, e) in fine.edges().filter(|(_, e)| survives(*e)) {
        touched[e.node1().to_usize()] = true;
        touched[e.node2().to_usize()] = true;
    }

    let mut node_map = vec![Opt::<NodeHandle>::none(); fine.num_nodes()];
    let mut nodes = Vec::new();
    for (h, node) in fine.nodes() {
        if touched[h.to_usize()] {
            let coarse = NodeHandle::from_usize(nodes.len());
            node_map[h.to_usize()] = Opt::some(coarse);
            nodes.push(Node::new(node.position(), node.flags()));
            links.survivors.push((h, coarse));
        }
    }

    if nodes.is_empty() {
        return Ok(None);
    }

    let mut edge_map = vec![Opt::<EdgeHandle>::none(); fine.num_edges()];
    let mut edges = Vec::new();
    for (h, e) in fine.edges() {
        if !survives(e) {
            continue;
        }

        let coarse = EdgeHandle::from_usize(edges.len());
        let map_node = |n: NodeHandle| {
            node_map[n.to_usize()].into_option().unwrap_or(n)
        };

        let mut copy = *e;
        copy.remap_to_coarse(
            [map_node(e.node1()), map_node(e.node2())],
            [e.loop1().map(|l| agg.coarse_of(l)), e.loop2().map(|l| agg.coarse_of(l))],
            h,
        );
        edges.push(copy);
        edge_map[h.to_usize()] = Opt::some(coarse);
        links.edges.push((h, coarse));
    }

    // ===== Coarse loops =====================================================
    let mut members: Vec<SmallVec<[LoopHandle; 8]>> = vec![SmallVec::new(); agg.num_cells()];
    for (h, _) in fine.loops() {
        let cell = agg.coarse_of(h);
        members[cell.to_usize()].push(h);
        links.loops.push((h, cell));
    }

    let mut loops = Vec::with_capacity(agg.num_cells());
    for fine_loops in &members {
        let geometry = ElementGeometry::combine(fine_loops.iter().map(|&l| fine[l].geometry()));
        let panels = fine_loops.iter()
            .flat_map(|&l| fine[l].panels().iter().cloned())
            .collect();

        let mut coarse_loop = VortexLoop::new(geometry, panels);
        for &l in fine_loops {
            coarse_loop.push_fine_loop(l);
            for &(e, dir) in fine[l].edges() {
                if let Some(coarse_edge) = edge_map[e.to_usize()].into_option() {
                    coarse_loop.push_edge(coarse_edge, dir);
                }
            }
        }
        loops.push(coarse_loop);
    }

    let coarse = MeshLevel::from_parts(fine.level() + 1, nodes, edges, loops, vec![])?;

    // ===== Collapsed nodes ==================================================
    // Every collapsed node is attached to the nearest surviving node of the
    // coarse cell it ended up in.
    let mut cell_of_node = vec![Opt::<LoopHandle>::none(); fine.num_nodes()];
    for (_, e) in fine.edges() {
        if let Some(l) = e.loop1() {
            for &n in &e.nodes() {
                if cell_of_node[n.to_usize()].is_none() {
                    cell_of_node[n.to_usize()] = Opt::some(agg.coarse_of(l));
                }
            }
        }
    }

    for (h, node) in fine.nodes() {
        if touched[h.to_usize()] {
            continue;
        }

        let pos = node.position();
        let dist = |&c: &NodeHandle| coarse[c].position().distance2(pos);
        let nearest_of = |candidates: &[NodeHandle]| {
            candidates.iter()
                .cloned()
                .min_by(|a, b| dist(a).partial_cmp(&dist(b)).unwrap_or(std::cmp::Ordering::Equal))
        };

        let in_cell = cell_of_node[h.to_usize()]
            .into_option()
            .and_then(|cell| nearest_of(coarse.loop_nodes(cell).as_slice()));
        let target = match in_cell {
            Some(target) => target,
            None => {
                let all: Vec<_> = coarse.nodes().map(|(c, _)| c).collect();
                match nearest_of(&all[..]) {
                    Some(target) => target,
                    None => continue,
                }
            }
        };

        links.collapsed.push((h, target));
    }

    Ok(Some((coarse, links)))
}
