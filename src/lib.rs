//! Surface meshes for panel and vortex-lattice solvers.
//!
//! A surface is given as an indexed triangulation (triangles and quads) with
//! aerodynamic node flags (trailing edge, leading edge, boundary). From that,
//! this crate builds:
//!
//! - the finest [`MeshLevel`]: nodes, deduplicated and classified edges,
//!   one vortex loop per input panel and one [`QuadEdge`][core::QuadEdge] per
//!   edge linking the two cells on either side of it,
//! - a [multigrid hierarchy](multigrid) of coarser levels built by
//!   agglomerating vortex loops, starting at the trailing edge, with links
//!   between the nodes, edges and loops of neighboring levels,
//! - per-cell [gradients](gradient) reconstructed over the quad edge stencil
//!   of each cell.
//!
//! ```
//! use vortex_mesh::{
//!     gradient::{self, GradientConfig},
//!     multigrid::Hierarchy,
//!     shape::Plate,
//! };
//!
//! let finest = Plate::new(9, 5).builder().build()?;
//! let mut hierarchy = Hierarchy::new(finest);
//! hierarchy.build()?;
//!
//! let level = hierarchy.finest();
//! let values = vec![1.0; level.num_loops()];
//! let gradients = gradient::reconstruct(level, &values, &GradientConfig::default())?;
//! assert!(gradients.errors().is_empty());
//! # Ok::<(), failure::Error>(())
//! ```
//!
//! All elements are referred to by [typed handles](handle). Missing
//! references ("no second panel", "no coarser level") are explicit and never
//! encoded as a special index.


#[cfg(test)]
#[macro_use]
mod test_utils;

pub mod build;
pub mod core;
pub mod gradient;
pub mod handle;
pub mod level;
pub mod math;
pub mod multigrid;
pub mod prelude;
pub mod shape;

pub use self::{
    build::{BuildError, LevelBuilder},
    handle::{EdgeHandle, LoopHandle, NodeHandle, PanelHandle, VortexEdgeHandle},
    level::MeshLevel,
    multigrid::{Hierarchy, LevelOutcome},
};
