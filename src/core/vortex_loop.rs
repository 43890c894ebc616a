use cgmath::{Point3, Vector3};
use smallvec::SmallVec;

use crate::{
    handle::{EdgeHandle, LoopHandle, Opt, PanelHandle},
    math::ElementGeometry,
};


/// The direction in which a vortex loop traverses one of its edges.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    /// From `node1` to `node2`.
    Forward,
    /// From `node2` to `node1`.
    Backward,
}

impl Direction {
    /// `1.0` for `Forward` and `-1.0` for `Backward`.
    pub fn sign(self) -> f64 {
        match self {
            Direction::Forward => 1.0,
            Direction::Backward => -1.0,
        }
    }

    /// The opposite direction.
    pub fn reversed(self) -> Self {
        match self {
            Direction::Forward => Direction::Backward,
            Direction::Backward => Direction::Forward,
        }
    }
}


/// A cell of a mesh level.
///
/// On the finest level, every vortex loop corresponds to exactly one input
/// panel. On coarser levels, a loop is the agglomeration of several loops of
/// the next finer level. Its geometry is then the area weighted combination
/// of the fine loops and its boundary consists of the fine edges that
/// survived the coarsening.
#[derive(Debug, Clone, PartialEq)]
pub struct VortexLoop {
    geometry: ElementGeometry,

    /// Bounding edges together with the direction this loop traverses them.
    edges: SmallVec<[(EdgeHandle, Direction); 4]>,

    /// Loops of the next finer level merged into this one. Empty on level 0.
    fine_loops: SmallVec<[LoopHandle; 4]>,

    /// The level-0 panels covered by this loop.
    panels: Vec<PanelHandle>,

    coarse_loop: Opt<LoopHandle>,
}

impl VortexLoop {
    pub(crate) fn new(geometry: ElementGeometry, panels: Vec<PanelHandle>) -> Self {
        Self {
            geometry,
            edges: SmallVec::new(),
            fine_loops: SmallVec::new(),
            panels,
            coarse_loop: Opt::none(),
        }
    }

    /// The (summed) area of the covered panels.
    pub fn area(&self) -> f64 {
        self.geometry.area
    }

    /// The area weighted unit normal.
    pub fn normal(&self) -> Vector3<f64> {
        self.geometry.normal
    }

    /// The area weighted centroid.
    pub fn centroid(&self) -> Point3<f64> {
        self.geometry.centroid
    }

    /// Area, normal and centroid at once.
    pub fn geometry(&self) -> ElementGeometry {
        self.geometry
    }

    /// The bounding edges with their traversal direction.
    pub fn edges(&self) -> &[(EdgeHandle, Direction)] {
        &self.edges
    }

    /// Number of bounding edges.
    pub fn num_edges(&self) -> usize {
        self.edges.len()
    }

    /// The loops of the next finer level merged into this one. Empty on
    /// the finest level.
    pub fn fine_loops(&self) -> &[LoopHandle] {
        &self.fine_loops
    }

    /// The panels of the finest level covered by this loop.
    pub fn panels(&self) -> &[PanelHandle] {
        &self.panels
    }

    /// The loop of the next coarser level this loop was merged into.
    pub fn coarse_loop(&self) -> Option<LoopHandle> {
        self.coarse_loop.into_option()
    }

    pub(crate) fn push_edge(&mut self, edge: EdgeHandle, dir: Direction) {
        self.edges.push((edge, dir));
    }

    pub(crate) fn push_fine_loop(&mut self, fine: LoopHandle) {
        self.fine_loops.push(fine);
    }

    pub(crate) fn set_coarse_loop(&mut self, coarse: Option<LoopHandle>) {
        self.coarse_loop = coarse.map(Opt::some).unwrap_or_else(Opt::none);
    }
}


#[cfg(test)]
mod tests {
    use super::*;
    use crate::handle::Handle;

    fn geometry() -> ElementGeometry {
        ElementGeometry::of_polygon(&[
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(2.0, 0.0, 0.0),
            Point3::new(0.0, 2.0, 0.0),
        ])
    }

    #[test]
    fn direction_sign() {
        assert_eq!(Direction::Forward.sign(), 1.0);
        assert_eq!(Direction::Backward.sign(), -1.0);
        assert_eq!(Direction::Forward.reversed(), Direction::Backward);
    }

    #[test]
    fn new_loop() {
        let mut l = VortexLoop::new(geometry(), vec![PanelHandle::new(0)]);

        assert_eq!(l.area(), 2.0);
        assert_eq!(l.panels(), &[PanelHandle::new(0)]);
        assert!(l.edges().is_empty());
        assert!(l.fine_loops().is_empty());
        assert_eq!(l.coarse_loop(), None);

        l.push_edge(EdgeHandle::new(3), Direction::Backward);
        l.set_coarse_loop(Some(LoopHandle::new(0)));
        assert_eq!(l.edges(), &[(EdgeHandle::new(3), Direction::Backward)]);
        assert_eq!(l.coarse_loop(), Some(LoopHandle::new(0)));

        l.set_coarse_loop(None);
        assert_eq!(l.coarse_loop(), None);
    }
}
