//! The multigrid hierarchy: a stack of successively coarser mesh levels.
//!
//! Level 0 is the finest level as built by
//! [`LevelBuilder`][crate::build::LevelBuilder]. Every further level is
//! created from the one below it by [agglomerating](self::agglomerate) its
//! vortex loops into coarse cells. Nodes, edges and loops of neighboring
//! levels are connected through `coarse_grid_*` / `fine_grid_*` links:
//!
//! - every node of level `k` has a coarse grid node on level `k + 1`. Nodes
//!   that survive the coarsening are linked in both directions, so for them
//!   `coarse(fine(c)) == c` and `fine(coarse(f)) == f` hold. Nodes that do not
//!   survive are linked to the nearest surviving node of their coarse cell;
//!   that node does not link back.
//! - every surviving edge knows its copy and vice versa.
//! - every loop knows the coarse cell it was merged into and every coarse
//!   cell knows the loops it consists of.
//!
//! Links are only ever set by the hierarchy itself, so they are always
//! consistent.
//!
//! By default, level 1 is a mixed mesh in which pairs of triangles are
//! merged into quads, and only the levels above it are agglomerated. Not
//! every coarser level is kept: see [`LevelAcceptance`].

use failure::Fail;
use log::debug;

use crate::{
    core::TopologyError,
    handle::{EdgeHandle, Handle, NodeHandle},
    level::MeshLevel,
};

mod agglomerate;

use self::agglomerate::{agglomerate, coarsen, pair_triangles, LevelLinks};


/// Errors of building or using a [`Hierarchy`].
#[derive(Debug, Clone, PartialEq, Fail)]
pub enum HierarchyError {
    /// A level cannot be coarsened before all its edges are classified.
    #[fail(display = "edge {} of level {} is not classified", edge, level)]
    Unclassified {
        level: usize,
        edge: EdgeHandle,
    },

    #[fail(display = "level {} does not exist (hierarchy has {} levels)", level, num_levels)]
    NoSuchLevel {
        level: usize,
        num_levels: usize,
    },

    /// A field was to be prolonged from level 0, which has no finer level.
    #[fail(display = "level 0 is the finest level, there is nothing to prolong to")]
    NoFinerLevel,

    /// A per-element field does not have one value per element.
    #[fail(
        display = "field for level {} has {} values, but {} are required",
        level,
        actual,
        expected
    )]
    FieldLength {
        level: usize,
        expected: usize,
        actual: usize,
    },

    #[fail(display = "{}", _0)]
    Topology(#[fail(cause)] TopologyError),
}

impl From<TopologyError> for HierarchyError {
    fn from(src: TopologyError) -> Self {
        HierarchyError::Topology(src)
    }
}

/// The outcome of trying to add a level to the hierarchy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LevelOutcome {
    /// A new level with the given index was added.
    Built(usize),

    /// No level could be added: the coarsest level cannot be coarsened any
    /// further or the configured maximum depth is reached. `coarsest` is the
    /// index of the coarsest level. This is not an error.
    DepthLimited {
        coarsest: usize,
    },
}

/// Decides whether a freshly coarsened level is kept.
///
/// A level that is not kept ends the construction of the hierarchy with
/// [`LevelOutcome::DepthLimited`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LevelAcceptance {
    /// Keep every level that has fewer loops than the one below it.
    AnyReduction,

    /// Levels up to index `free_levels` are always kept. Above that, a level
    /// is kept only if it has more than `min_loops` loops and more than
    /// `min_edges` edges, and at most half as many loops as the level below.
    Halving {
        free_levels: usize,
        min_loops: usize,
        min_edges: usize,
    },
}

impl Default for LevelAcceptance {
    /// `Halving` with 2 free levels and at least 51 loops and edges.
    fn default() -> Self {
        LevelAcceptance::Halving {
            free_levels: 2,
            min_loops: 50,
            min_edges: 50,
        }
    }
}

impl LevelAcceptance {
    /// Whether `coarse`, built from `fine` as level `index`, is kept.
    pub fn accepts(&self, index: usize, fine: &MeshLevel, coarse: &MeshLevel) -> bool {
        if coarse.num_loops() >= fine.num_loops() {
            return false;
        }

        match *self {
            LevelAcceptance::AnyReduction => true,
            LevelAcceptance::Halving { free_levels, min_loops, min_edges } => {
                index <= free_levels
                    || (coarse.num_loops() > min_loops
                        && coarse.num_edges() > min_edges
                        && 2 * coarse.num_loops() <= fine.num_loops())
            }
        }
    }
}

/// Limits for the construction of a [`Hierarchy`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CoarseningConfig {
    /// The maximum number of levels, including the finest one. `None` means
    /// `4 * floor(log4(n))` where `n` is the number of loops of the finest
    /// level, but at least 2. *Default*: `None`.
    pub max_levels: Option<usize>,

    /// Levels with this many or fewer loops are not coarsened any further.
    /// Set this to the number of separate surface patches to stop once every
    /// patch is a single cell. *Default*: 1.
    pub min_cells: usize,

    /// Build level 1 by pairing triangles into quads instead of
    /// agglomerating. If no pair of triangles forms a good quad, level 1 is
    /// agglomerated as usual. *Default*: `true`.
    pub mixed_first_level: bool,

    /// Which coarse levels are kept. *Default*: [`LevelAcceptance::default`].
    pub acceptance: LevelAcceptance,
}

impl Default for CoarseningConfig {
    fn default() -> Self {
        Self {
            max_levels: None,
            min_cells: 1,
            mixed_first_level: true,
            acceptance: LevelAcceptance::default(),
        }
    }
}

impl CoarseningConfig {
    pub fn with_max_levels(mut self, max_levels: usize) -> Self {
        self.max_levels = Some(max_levels);
        self
    }

    pub fn with_min_cells(mut self, min_cells: usize) -> Self {
        self.min_cells = min_cells;
        self
    }

    pub fn with_mixed_first_level(mut self, enabled: bool) -> Self {
        self.mixed_first_level = enabled;
        self
    }

    pub fn with_acceptance(mut self, acceptance: LevelAcceptance) -> Self {
        self.acceptance = acceptance;
        self
    }

    fn max_levels_for(&self, finest_cells: usize) -> usize {
        self.max_levels.unwrap_or_else(|| {
            // floor(log4(n))
            let mut depth = 0;
            let mut n = finest_cells;
            while n >= 4 {
                n /= 4;
                depth += 1;
            }
            (4 * depth).max(2)
        })
    }
}


/// All levels of a multigrid hierarchy, from fine to coarse.
#[derive(Debug, Clone)]
pub struct Hierarchy {
    levels: Vec<MeshLevel>,
    config: CoarseningConfig,
}

impl Hierarchy {
    /// Creates a hierarchy with only the given finest level.
    pub fn new(finest: MeshLevel) -> Self {
        Self::with_config(finest, CoarseningConfig::default())
    }

    pub fn with_config(mut finest: MeshLevel, config: CoarseningConfig) -> Self {
        finest.clear_coarse_links();
        Self {
            levels: vec![finest],
            config,
        }
    }

    pub fn config(&self) -> &CoarseningConfig {
        &self.config
    }

    pub fn num_levels(&self) -> usize {
        self.levels.len()
    }

    pub fn level(&self, level: usize) -> Option<&MeshLevel> {
        self.levels.get(level)
    }

    pub fn levels(&self) -> impl Iterator<Item = &MeshLevel> + '_ {
        self.levels.iter()
    }

    pub fn finest(&self) -> &MeshLevel {
        &self.levels[0]
    }

    pub fn coarsest(&self) -> &MeshLevel {
        &self.levels[self.levels.len() - 1]
    }

    fn get(&self, level: usize) -> Result<&MeshLevel, HierarchyError> {
        self.levels.get(level).ok_or(HierarchyError::NoSuchLevel {
            level,
            num_levels: self.levels.len(),
        })
    }

    /// The level below `level`, which has to exist.
    fn finer(&self, level: usize) -> Result<&MeshLevel, HierarchyError> {
        match level {
            0 => Err(HierarchyError::NoFinerLevel),
            _ => self.get(level - 1),
        }
    }

    /// Builds the next coarser level on top of the current coarsest one.
    ///
    /// Returns [`LevelOutcome::DepthLimited`] if the coarsest level cannot be
    /// coarsened any further, the depth limits of the [`CoarseningConfig`]
    /// are reached or the new level is not kept by its
    /// [`LevelAcceptance`].
    pub fn build_level(&mut self) -> Result<LevelOutcome, HierarchyError> {
        let k = self.levels.len() - 1;
        let limited = Ok(LevelOutcome::DepthLimited { coarsest: k });

        let fine = &self.levels[k];
        if let Some(edge) = fine.first_unclassified_edge() {
            return Err(HierarchyError::Unclassified { level: k, edge });
        }
        if self.levels.len() >= self.config.max_levels_for(self.levels[0].num_loops())
            || fine.num_loops() <= self.config.min_cells
        {
            return limited;
        }

        let mut agg = None;
        if k == 0 && self.config.mixed_first_level {
            let pairs = pair_triangles(fine);
            if pairs.num_cells() < fine.num_loops() {
                agg = Some(pairs);
            } else {
                debug!("no triangles of level 0 can be paired, agglomerating instead");
            }
        }
        let agg = match agg {
            Some(agg) => agg,
            None => agglomerate(fine),
        };
        if agg.num_cells() >= fine.num_loops() {
            debug!("level {} cannot be coarsened: no loops were merged", k);
            return limited;
        }

        let (mut coarse, links) = match coarsen(fine, &agg)? {
            Some(v) => v,
            None => {
                debug!("level {} cannot be coarsened: no node survives", k);
                return limited;
            }
        };

        if !self.config.acceptance.accepts(k + 1, fine, &coarse) {
            debug!(
                "level {} with {} loops and {} edges is not kept ({} loops below)",
                k + 1,
                coarse.num_loops(),
                coarse.num_edges(),
                fine.num_loops(),
            );
            return limited;
        }

        link_levels(&mut self.levels[k], &mut coarse, &links);
        debug!(
            "built level {}: {} nodes, {} edges, {} loops ({} -> {} loops)",
            k + 1,
            coarse.num_nodes(),
            coarse.num_edges(),
            coarse.num_loops(),
            self.levels[k].num_loops(),
            coarse.num_loops(),
        );
        self.levels.push(coarse);

        Ok(LevelOutcome::Built(k + 1))
    }

    /// Builds levels until no further level can be added. Returns the final
    /// [`LevelOutcome::DepthLimited`].
    pub fn build(&mut self) -> Result<LevelOutcome, HierarchyError> {
        loop {
            match self.build_level()? {
                LevelOutcome::Built(_) => {}
                outcome @ LevelOutcome::DepthLimited { .. } => return Ok(outcome),
            }
        }
    }

    /// Discards all levels above `level`, removes the coarse grid links of
    /// `level` and builds the coarser levels again.
    pub fn rebuild_from(&mut self, level: usize) -> Result<LevelOutcome, HierarchyError> {
        self.get(level)?;
        self.levels.truncate(level + 1);
        self.levels[level].clear_coarse_links();
        self.build()
    }

    /// The coarse grid node of `node` on level `level + 1`.
    pub fn coarse_node(&self, level: usize, node: NodeHandle) -> Option<NodeHandle> {
        self.levels.get(level)?.node(node)?.coarse_grid_node()
    }

    /// The fine grid node of `node` on level `level - 1`.
    pub fn fine_node(&self, level: usize, node: NodeHandle) -> Option<NodeHandle> {
        self.levels.get(level)?.node(node)?.fine_grid_node()
    }

    /// Follows the coarse grid links of a node of level 0 up to the given
    /// level.
    pub fn node_on_level(&self, node: NodeHandle, level: usize) -> Option<NodeHandle> {
        (0..level).try_fold(node, |n, k| self.coarse_node(k, n))
    }

    // ===== Transfer between levels ==========================================

    /// Area weighted restriction of a per-loop field from `level` to
    /// `level + 1`.
    pub fn restrict_cells(&self, level: usize, values: &[f64]) -> Result<Vec<f64>, HierarchyError> {
        let fine = self.get(level)?;
        let coarse = self.get(level + 1)?;
        check_len(level, fine.num_loops(), values)?;

        let out = coarse.loops()
            .map(|(_, cell)| {
                let (mut sum, mut area) = (0.0, 0.0);
                for &l in cell.fine_loops() {
                    let a = fine[l].area();
                    sum += a * values[l.to_usize()];
                    area += a;
                }

                if area > 0.0 {
                    sum / area
                } else {
                    let n = cell.fine_loops().len().max(1) as f64;
                    cell.fine_loops().iter().map(|l| values[l.to_usize()]).sum::<f64>() / n
                }
            })
            .collect();

        Ok(out)
    }

    /// Injects a per-loop field of `level` into every fine loop of
    /// `level - 1`.
    pub fn prolong_cells(&self, level: usize, values: &[f64]) -> Result<Vec<f64>, HierarchyError> {
        let coarse = self.get(level)?;
        let fine = self.finer(level)?;
        check_len(level, coarse.num_loops(), values)?;

        let out = fine.loops()
            .map(|(_, l)| l.coarse_loop().map(|c| values[c.to_usize()]).unwrap_or(0.0))
            .collect();

        Ok(out)
    }

    /// Restricts a per-node field from `level` to `level + 1`: every coarse
    /// node gets the average of all fine nodes linked to it.
    pub fn restrict_nodes(&self, level: usize, values: &[f64]) -> Result<Vec<f64>, HierarchyError> {
        let fine = self.get(level)?;
        let coarse = self.get(level + 1)?;
        check_len(level, fine.num_nodes(), values)?;

        let mut sum = vec![0.0; coarse.num_nodes()];
        let mut count = vec![0usize; coarse.num_nodes()];
        for (h, node) in fine.nodes() {
            if let Some(c) = node.coarse_grid_node() {
                sum[c.to_usize()] += values[h.to_usize()];
                count[c.to_usize()] += 1;
            }
        }

        let out = sum.into_iter()
            .zip(count)
            .map(|(s, n)| if n > 0 { s / n as f64 } else { 0.0 })
            .collect();

        Ok(out)
    }

    /// Injects a per-node field of `level` into `level - 1` by following the
    /// coarse grid links of the fine nodes.
    pub fn prolong_nodes(&self, level: usize, values: &[f64]) -> Result<Vec<f64>, HierarchyError> {
        let coarse = self.get(level)?;
        let fine = self.finer(level)?;
        check_len(level, coarse.num_nodes(), values)?;

        let out = fine.nodes()
            .map(|(_, n)| n.coarse_grid_node().map(|c| values[c.to_usize()]).unwrap_or(0.0))
            .collect();

        Ok(out)
    }
}

fn check_len(level: usize, expected: usize, values: &[f64]) -> Result<(), HierarchyError> {
    if values.len() != expected {
        return Err(HierarchyError::FieldLength {
            level,
            expected,
            actual: values.len(),
        });
    }

    Ok(())
}

/// Connects a fine level with the coarse level built from it.
///
/// All previous coarse links of `fine` are removed first. Surviving nodes
/// are linked in both directions in one go, collapsed nodes only from fine to
/// coarse. Edges and loops are linked as well.
pub(crate) fn link_levels(fine: &mut MeshLevel, coarse: &mut MeshLevel, links: &LevelLinks) {
    fine.clear_coarse_links();

    for &(f, c) in &links.survivors {
        fine.node_mut(f).set_coarse_link(c);
        coarse.node_mut(c).set_fine_link(f);
    }
    for &(f, c) in &links.collapsed {
        fine.node_mut(f).set_coarse_link(c);
    }
    for &(f, c) in &links.edges {
        fine.edge_mut(f).set_coarse_grid_edge(Some(c));
    }
    for &(f, c) in &links.loops {
        fine.loop_mut(f).set_coarse_loop(Some(c));
    }
}
