//! Per-cell gradients and their reconstruction from cell values.
//!
//! Gradients are reconstructed from the stencil of a cell, i.e. the cells
//! on the other side of its quad edges. Two methods are available:
//!
//! - Green-Gauss: `∇φ ≈ (1/A) Σ φ_e · (t_e × n)` over the bounding edges,
//!   where `t_e` is the edge vector in the direction the cell traverses it
//!   and `n` the cell normal. The edge value `φ_e` is interpolated from the
//!   two adjacent cells; on boundary edges the cell's own value is used.
//! - Least squares: inverse distance squared weighted fit of the neighbor
//!   differences in the tangent plane of the cell. Falls back to Green-Gauss
//!   if the normal equations are singular.
//!
//! The gradient of every cell only depends on its own stencil, so cells are
//! processed in parallel (with `rayon`) above a configurable size.

use std::ops;

use cgmath::{prelude::*, Vector3};
use derive_more::{Add, AddAssign, Neg, Sub, SubAssign};
use failure::Fail;
use log::trace;
use num_traits::Zero;
use rayon::prelude::*;
use smallvec::SmallVec;

use crate::{
    handle::{Handle, LoopHandle},
    level::MeshLevel,
    math::tangent_basis,
};


/// Cells with an area below this are treated as degenerate.
const AREA_EPS: f64 = 1e-14;


// ===========================================================================
// ===== MeshGradient
// ===========================================================================

/// A 3-component gradient of a scalar field, stored per mesh element.
#[derive(Debug, Clone, Copy, Default, PartialEq, Add, AddAssign, Sub, SubAssign, Neg)]
pub struct MeshGradient {
    pub px: f64,
    pub py: f64,
    pub pz: f64,
}

impl MeshGradient {
    pub fn new(px: f64, py: f64, pz: f64) -> Self {
        Self { px, py, pz }
    }

    pub fn zero() -> Self {
        Self::default()
    }

    pub fn set_zero(&mut self) {
        *self = Self::zero();
    }

    pub fn is_zero(&self) -> bool {
        self.px == 0.0 && self.py == 0.0 && self.pz == 0.0
    }

    /// Adds the given vector component-wise.
    pub fn accumulate(&mut self, v: Vector3<f64>) {
        self.px += v.x;
        self.py += v.y;
        self.pz += v.z;
    }

    pub fn scale(&mut self, s: f64) {
        self.px *= s;
        self.py *= s;
        self.pz *= s;
    }

    pub fn to_vec3(self) -> Vector3<f64> {
        Vector3::new(self.px, self.py, self.pz)
    }

    pub fn magnitude(&self) -> f64 {
        self.to_vec3().magnitude()
    }
}

impl From<Vector3<f64>> for MeshGradient {
    fn from(v: Vector3<f64>) -> Self {
        Self::new(v.x, v.y, v.z)
    }
}

impl From<MeshGradient> for Vector3<f64> {
    fn from(g: MeshGradient) -> Self {
        g.to_vec3()
    }
}


// ===========================================================================
// ===== Configuration
// ===========================================================================

/// How gradients are reconstructed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GradientMethod {
    GreenGauss,
    LeastSquares,
}

/// How the value on an edge is interpolated from the two adjacent cells for
/// Green-Gauss.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FaceInterpolation {
    /// Plain average of both cells.
    Arithmetic,

    /// Weighted by the distance of the cell centroids to the edge midpoint:
    /// the closer cell has more influence.
    DistanceWeighted,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GradientConfig {
    /// *Default*: `GreenGauss`.
    pub method: GradientMethod,

    /// *Default*: `Arithmetic`.
    pub face_interpolation: FaceInterpolation,

    /// Least squares systems with a determinant below this are considered
    /// singular. *Default*: `1e-12`.
    pub det_min: f64,

    /// *Default*: `true`.
    pub parallel: bool,

    /// Minimum number of cells to process in parallel. *Default*: 1000.
    pub parallel_threshold: usize,
}

impl Default for GradientConfig {
    fn default() -> Self {
        Self {
            method: GradientMethod::GreenGauss,
            face_interpolation: FaceInterpolation::Arithmetic,
            det_min: 1e-12,
            parallel: true,
            parallel_threshold: 1000,
        }
    }
}

impl GradientConfig {
    pub fn with_method(mut self, method: GradientMethod) -> Self {
        self.method = method;
        self
    }

    pub fn with_face_interpolation(mut self, interpolation: FaceInterpolation) -> Self {
        self.face_interpolation = interpolation;
        self
    }

    pub fn with_det_min(mut self, det_min: f64) -> Self {
        self.det_min = det_min;
        self
    }

    pub fn with_parallel(mut self, enabled: bool) -> Self {
        self.parallel = enabled;
        self
    }

    pub fn with_threshold(mut self, threshold: usize) -> Self {
        self.parallel_threshold = threshold;
        self
    }
}


// ===========================================================================
// ===== Errors
// ===========================================================================

/// A cell for which no gradient can be reconstructed. This only affects the
/// cell itself; its gradient is left at zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Fail)]
pub enum StencilError {
    /// The cell has no neighbor across any of its edges or has no area.
    #[fail(display = "cell {} has a degenerate gradient stencil", cell)]
    Degenerate {
        cell: LoopHandle,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Fail)]
pub enum GradientError {
    #[fail(display = "field has {} values, but {} are required", actual, expected)]
    FieldLength {
        expected: usize,
        actual: usize,
    },
}

fn check_len(expected: usize, values: &[f64]) -> Result<(), GradientError> {
    if values.len() != expected {
        return Err(GradientError::FieldLength { expected, actual: values.len() });
    }

    Ok(())
}


// ===========================================================================
// ===== Reconstruction
// ===========================================================================

/// One gradient per cell of a level, plus the cells for which the last
/// reconstruction failed.
#[derive(Debug, Clone, PartialEq)]
pub struct GradientField {
    gradients: Vec<MeshGradient>,
    errors: Vec<StencilError>,
}

impl GradientField {
    /// A field of zero gradients.
    pub fn new(num_cells: usize) -> Self {
        Self {
            gradients: vec![MeshGradient::zero(); num_cells],
            errors: Vec::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.gradients.len()
    }

    pub fn is_empty(&self) -> bool {
        self.gradients.is_empty()
    }

    pub fn gradients(&self) -> &[MeshGradient] {
        &self.gradients
    }

    pub fn get(&self, cell: LoopHandle) -> Option<&MeshGradient> {
        self.gradients.get(cell.to_usize())
    }

    /// Cells with a degenerate stencil, in cell order.
    pub fn errors(&self) -> &[StencilError] {
        &self.errors
    }

    pub fn set_zero(&mut self) {
        for g in &mut self.gradients {
            g.set_zero();
        }
        self.errors.clear();
    }

    /// Reconstructs the gradients of the per-cell field `values` on `level`.
    ///
    /// All gradients are reset to zero first. Cells with a degenerate stencil
    /// keep a zero gradient and are reported in [`errors`][Self::errors]; all
    /// other cells are still processed.
    pub fn reconstruct(
        &mut self,
        level: &MeshLevel,
        values: &[f64],
        config: &GradientConfig,
    ) -> Result<(), GradientError> {
        check_len(level.num_loops(), values)?;
        self.gradients.resize(level.num_loops(), MeshGradient::zero());
        self.set_zero();

        let compute = |i: usize| cell_gradient(level, values, LoopHandle::from_usize(i), config);
        let results: Vec<_> = if config.parallel && level.num_loops() >= config.parallel_threshold {
            (0..level.num_loops()).into_par_iter().map(compute).collect()
        } else {
            (0..level.num_loops()).map(compute).collect()
        };

        for (out, result) in self.gradients.iter_mut().zip(results) {
            match result {
                Ok(g) => *out = g,
                Err(e) => self.errors.push(e),
            }
        }

        if !self.errors.is_empty() {
            trace!(
                "{} of {} cells on level {} have a degenerate stencil",
                self.errors.len(),
                level.num_loops(),
                level.level(),
            );
        }

        Ok(())
    }
}

impl ops::Index<LoopHandle> for GradientField {
    type Output = MeshGradient;
    fn index(&self, cell: LoopHandle) -> &Self::Output {
        &self.gradients[cell.to_usize()]
    }
}

/// Reconstructs the gradients of the per-cell field `values` on `level`. See
/// [`GradientField::reconstruct`].
pub fn reconstruct(
    level: &MeshLevel,
    values: &[f64],
    config: &GradientConfig,
) -> Result<GradientField, GradientError> {
    let mut field = GradientField::new(level.num_loops());
    field.reconstruct(level, values, config)?;
    Ok(field)
}

/// Averages a per-node field onto the cells of `level`.
pub fn cell_values_from_nodes(level: &MeshLevel, node_values: &[f64]) -> Result<Vec<f64>, GradientError> {
    check_len(level.num_nodes(), node_values)?;

    let out = level.loops()
        .map(|(h, _)| {
            let nodes = level.loop_nodes(h);
            let sum: f64 = nodes.iter().map(|n| node_values[n.to_usize()]).sum();
            sum / nodes.len().max(1) as f64
        })
        .collect();

    Ok(out)
}

fn cell_gradient(
    level: &MeshLevel,
    values: &[f64],
    cell: LoopHandle,
    config: &GradientConfig,
) -> Result<MeshGradient, StencilError> {
    let has_neighbor = level.neighbors(cell).any(|(_, _, other)| other.is_some());
    if !has_neighbor || level[cell].area() < AREA_EPS {
        return Err(StencilError::Degenerate { cell });
    }

    let g = match config.method {
        GradientMethod::GreenGauss => green_gauss(level, values, cell, config.face_interpolation),
        GradientMethod::LeastSquares => {
            least_squares(level, values, cell, config.det_min)
                .unwrap_or_else(|| green_gauss(level, values, cell, config.face_interpolation))
        }
    };

    Ok(g.into())
}

fn green_gauss(
    level: &MeshLevel,
    values: &[f64],
    cell: LoopHandle,
    interpolation: FaceInterpolation,
) -> Vector3<f64> {
    let c = &level[cell];
    let phi_c = values[cell.to_usize()];
    let mut grad = Vector3::zero();

    for (e, dir, other) in level.neighbors(cell) {
        let edge = &level[e];
        let p1 = level[edge.node1()].position();
        let p2 = level[edge.node2()].position();

        let phi_face = match other {
            None => phi_c,
            Some(other) => {
                let phi_o = values[other.to_usize()];
                match interpolation {
                    FaceInterpolation::Arithmetic => 0.5 * (phi_c + phi_o),
                    FaceInterpolation::DistanceWeighted => {
                        let mid = p1.midpoint(p2);
                        let d_self = mid.distance(c.centroid());
                        let d_other = mid.distance(level[other].centroid());
                        distance_weighted(phi_c, phi_o, d_self, d_other)
                    }
                }
            }
        };

        let t = (p2 - p1) * dir.sign();
        grad += t.cross(c.normal()) * phi_face;
    }

    grad / c.area()
}

fn distance_weighted(phi_self: f64, phi_other: f64, d_self: f64, d_other: f64) -> f64 {
    let total = d_self + d_other;
    if total < 1e-14 {
        0.5 * (phi_self + phi_other)
    } else {
        (d_other * phi_self + d_self * phi_other) / total
    }
}

/// Returns `None` if the normal equations are singular.
fn least_squares(
    level: &MeshLevel,
    values: &[f64],
    cell: LoopHandle,
    det_min: f64,
) -> Option<Vector3<f64>> {
    let c = &level[cell];
    let phi_c = values[cell.to_usize()];
    let (t1, t2) = tangent_basis(c.normal());

    let (mut a11, mut a12, mut a22) = (0.0, 0.0, 0.0);
    let (mut b1, mut b2) = (0.0, 0.0);

    // Coarse cells can share several edges.
    let mut seen = SmallVec::<[LoopHandle; 8]>::new();
    for (_, _, other) in level.neighbors(cell) {
        let other = match other {
            Some(o) if !seen.contains(&o) => o,
            _ => continue,
        };
        seen.push(other);

        let d = level[other].centroid() - c.centroid();
        let (dx, dy) = (d.dot(t1), d.dot(t2));
        let dist2 = dx * dx + dy * dy;
        if dist2 < AREA_EPS {
            continue;
        }

        let w = 1.0 / dist2;
        let dphi = values[other.to_usize()] - phi_c;
        a11 += w * dx * dx;
        a12 += w * dx * dy;
        a22 += w * dy * dy;
        b1 += w * dx * dphi;
        b2 += w * dy * dphi;
    }

    let (g1, g2) = solve_2x2(a11, a12, a22, b1, b2, det_min)?;
    Some(t1 * g1 + t2 * g2)
}

/// Solves the symmetric system `[a11 a12; a12 a22] x = [b1 b2]`.
fn solve_2x2(a11: f64, a12: f64, a22: f64, b1: f64, b2: f64, det_min: f64) -> Option<(f64, f64)> {
    let det = a11 * a22 - a12 * a12;
    if det.abs() < det_min {
        return None;
    }

    let inv = 1.0 / det;
    Some(((a22 * b1 - a12 * b2) * inv, (a11 * b2 - a12 * b1) * inv))
}
