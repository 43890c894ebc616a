//! Simple parametric surfaces, mainly used for tests and benchmarks.
//!
//! Every shape produces a [`LevelBuilder`] that already contains all nodes
//! (with their aerodynamic flags) and panels, so the caller only needs to
//! call [`LevelBuilder::build`].

use cgmath::{
    Point3, Vector3,
    prelude::*,
};

use crate::{
    build::LevelBuilder,
    core::NodeFlags,
};


/// A flat round disc that lies in the XY-plane and which normals point upwards
/// (+z).
///
/// The rim nodes are marked as boundary edge nodes.
#[derive(Debug)]
pub struct Disc {
    /// The number of faces generated for the disc. Has to be at least 3 or
    /// else creating the builder will panic. *Default*: 16.
    pub faces: u32,

    /// The center point of the disc. *Default*: `[0, 0, 0]`.
    pub center: Point3<f64>,

    /// The outer radius (with ∞ faces, this would be the real radius).
    /// *Default*: 1.0.
    pub radius: f64,
}

impl Default for Disc {
    fn default() -> Self {
        Self {
            faces: 16,
            center: Point3::origin(),
            radius: 1.0,
        }
    }
}

impl Disc {
    pub fn with_faces(faces: u32) -> Self {
        Self {
            faces,
            ..Self::default()
        }
    }

    pub fn builder(&self) -> LevelBuilder {
        assert!(
            self.faces >= 3,
            "trying to build a disc with {} faces (minimum is 3)",
            self.faces,
        );

        // We create nodes in counter clock wise order around the center,
        // the first one starting at [r, 0, 0]. This is looking top down onto
        // the disc:
        //
        //      3 _
        //      |   ‾ – _
        //      |         2
        //      |  B    ⋰  \
        //      |     ⋰     \
        //      |   ⋰   A    \
        //      | ⋰           \
        //      0 ------------ 1
        //
        // The node 0 is the `center` node, node 1 is the first outer one
        // (at [r, 0, 0]) and stored in `first`, node 2 is the second one and
        // so on. Panel A is the first panel, panel B the second one etc.
        let rim = NodeFlags {
            boundary_edge: true,
            ..NodeFlags::default()
        };

        let mut b = LevelBuilder::with_capacity(self.faces as usize + 1, self.faces as usize);
        let center = b.add_node(self.center, NodeFlags::interior());
        let first = b.add_node(self.center + Vector3::new(self.radius, 0.0, 0.0), rim);

        // The last node we created.
        let mut last = first;

        for i in 1..self.faces {
            let angle = (i as f64 / self.faces as f64) * 2.0 * std::f64::consts::PI;
            let position = self.center + Vector3::new(
                self.radius * angle.cos(),
                self.radius * angle.sin(),
                0.0,
            );

            let v = b.add_node(position, rim);
            b.add_triangle(center, last, v);

            last = v;
        }

        // Add last panel (with the first outer node)
        b.add_triangle(center, last, first);

        b
    }
}


/// A flat, rectangular lifting surface in the XY-plane, normals pointing
/// upwards (+z).
///
/// The plate spans from `y = 0` to `y = span` and the chord runs from the
/// leading edge at `x = 0` to the trailing edge at `x = chord`. Node `(i, j)`
/// is the `i`-th span station and the `j`-th chordwise station, counted from
/// the trailing edge; its handle index is `i * chord_nodes + j`. Every grid
/// cell is split into two triangles.
///
/// Node flags:
/// - `j == 0`: trailing edge (only if `lifting`) and boundary edge
/// - `j == chord_nodes - 1`: leading edge
/// - `i == 0` and `i == span_nodes - 1`: boundary edge
/// - the four corners: boundary corner
#[derive(Debug)]
pub struct Plate {
    /// Number of nodes in span direction, at least 2. *Default*: 9.
    pub span_nodes: u32,

    /// Number of nodes in chord direction, at least 2. *Default*: 5.
    pub chord_nodes: u32,

    /// *Default*: 4.0.
    pub span: f64,

    /// *Default*: 1.0.
    pub chord: f64,

    /// Whether the plate sheds a wake, i.e. has a trailing edge.
    /// *Default*: `true`.
    pub lifting: bool,
}

impl Default for Plate {
    fn default() -> Self {
        Self {
            span_nodes: 9,
            chord_nodes: 5,
            span: 4.0,
            chord: 1.0,
            lifting: true,
        }
    }
}

impl Plate {
    pub fn new(span_nodes: u32, chord_nodes: u32) -> Self {
        Self {
            span_nodes,
            chord_nodes,
            ..Self::default()
        }
    }

    pub fn flags(&self, i: u32, j: u32) -> NodeFlags {
        let last_i = self.span_nodes - 1;
        let last_j = self.chord_nodes - 1;
        let side = i == 0 || i == last_i;
        let trailing = self.lifting && j == 0;

        NodeFlags {
            trailing_edge: trailing,
            leading_edge: j == last_j,
            boundary_edge: side || trailing,
            boundary_corner: side && (j == 0 || j == last_j),
        }
    }

    pub fn builder(&self) -> LevelBuilder {
        assert!(
            self.span_nodes >= 2 && self.chord_nodes >= 2,
            "trying to build a plate with {}x{} nodes (minimum is 2x2)",
            self.span_nodes,
            self.chord_nodes,
        );

        let (ni, nj) = (self.span_nodes, self.chord_nodes);
        let mut b = LevelBuilder::with_capacity(
            (ni * nj) as usize,
            (2 * (ni - 1) * (nj - 1)) as usize,
        );

        let mut nodes = Vec::with_capacity((ni * nj) as usize);
        for i in 0..ni {
            let y = self.span * i as f64 / (ni - 1) as f64;
            for j in 0..nj {
                let x = self.chord * (1.0 - j as f64 / (nj - 1) as f64);
                nodes.push(b.add_node([x, y, 0.0], self.flags(i, j)));
            }
        }

        let at = |i: u32, j: u32| nodes[(i * nj + j) as usize];
        for i in 0..ni - 1 {
            for j in 0..nj - 1 {
                let (a, bb, c, d) = (at(i, j), at(i + 1, j), at(i + 1, j + 1), at(i, j + 1));
                b.add_triangle(a, bb, c);
                b.add_triangle(a, c, d);
            }
        }

        b
    }
}


#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::EdgeKind;

    #[test]
    fn disc_counts() {
        let level = Disc::default().builder().build().unwrap();

        assert_eq!(level.num_nodes(), 17);
        assert_eq!(level.num_loops(), 16);
        assert_eq!(level.num_edges(), 32);
        assert_eq!(level.num_boundary_edges(), 16);
    }

    #[test]
    #[should_panic]
    fn disc_too_few_faces() {
        Disc::with_faces(2).builder();
    }

    #[test]
    fn plate_counts() {
        let plate = Plate::new(4, 3);
        let level = plate.builder().build().unwrap();

        assert_eq!(level.num_nodes(), 12);
        assert_eq!(level.num_loops(), 12);

        // 3 * 3 span-wise, 4 * 2 chord-wise and 6 diagonals
        assert_eq!(level.num_edges(), 23);
        assert_eq!(level.num_edges_of_kind(EdgeKind::Trailing), 3);
        assert_eq!(level.num_edges_of_kind(EdgeKind::Leading), 3);
        assert_eq!(level.num_edges_of_kind(EdgeKind::Boundary), 4);
    }

    #[test]
    fn plate_normals_point_up() {
        let level = Plate::default().builder().build().unwrap();

        for (_, l) in level.loops() {
            assert!(l.normal().z > 0.99);
        }
    }

    #[test]
    fn non_lifting_plate_has_no_trailing_edge() {
        let plate = Plate { lifting: false, ..Plate::new(3, 3) };
        let level = plate.builder().build().unwrap();

        assert_eq!(level.num_edges_of_kind(EdgeKind::Trailing), 0);
        assert_eq!(level.num_edges_of_kind(EdgeKind::Boundary), 6);
        assert!(plate.flags(0, 0).boundary_corner);
        assert!(!plate.flags(1, 0).boundary_edge);
    }
}
