use crate::handle::{LoopHandle, Opt};
use super::TopologyError;


/// One of the two cell slots of a [`QuadEdge`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Slot {
    First,
    Second,
}

/// The two cells (vortex loops) sharing one physical edge.
///
/// This is a link in the dual graph of a mesh level: cells are the vertices
/// of the dual graph and quad edges its edges. Stencil operations (gradient
/// reconstruction, flux balances) iterate over the quad edges around a cell
/// to find its neighbors.
///
/// An empty slot is explicitly empty and thus distinguishable from cell `0`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct QuadEdge {
    cells: [Opt<LoopHandle>; 2],
}

impl QuadEdge {
    /// Creates a quad edge with both slots empty.
    pub fn new() -> Self {
        Self {
            cells: [Opt::none(), Opt::none()],
        }
    }

    /// Fills the given slot with `cell`.
    ///
    /// Overwriting an already filled slot (without `reset` in between) would
    /// silently drop topology, so it is rejected as
    /// [`TopologyError::NonManifoldQuadEdge`] and nothing is modified.
    pub fn set_cell(&mut self, slot: Slot, cell: LoopHandle) -> Result<(), TopologyError> {
        let idx = slot as usize;
        if self.cells[idx].is_some() {
            return Err(self.full_error(cell));
        }

        self.cells[idx] = Opt::some(cell);
        Ok(())
    }

    /// Fills the first empty slot with `cell`. Fails if both slots are
    /// already filled.
    pub fn link(&mut self, cell: LoopHandle) -> Result<Slot, TopologyError> {
        let slot = match (self.cells[0].is_none(), self.cells[1].is_none()) {
            (true, _) => Slot::First,
            (false, true) => Slot::Second,
            (false, false) => return Err(self.full_error(cell)),
        };

        self.set_cell(slot, cell)?;
        Ok(slot)
    }

    /// Empties both slots.
    pub fn reset(&mut self) {
        *self = Self::new();
    }

    /// The cell stored in the given slot.
    pub fn cell(&self, slot: Slot) -> Option<LoopHandle> {
        self.cells[slot as usize].into_option()
    }

    /// The cell in the first slot.
    pub fn cell0(&self) -> Option<LoopHandle> {
        self.cell(Slot::First)
    }

    /// The cell in the second slot. `None` for boundary edges.
    pub fn cell1(&self) -> Option<LoopHandle> {
        self.cell(Slot::Second)
    }

    /// Returns both cells if both slots are filled.
    pub fn cells(&self) -> Option<[LoopHandle; 2]> {
        match (self.cell0(), self.cell1()) {
            (Some(a), Some(b)) => Some([a, b]),
            _ => None,
        }
    }

    /// Returns the cell on the opposite side of `cell`. `None` if `cell` is
    /// not linked here or if the other slot is empty.
    pub fn other(&self, cell: LoopHandle) -> Option<LoopHandle> {
        match self.cells()? {
            [a, b] if a == cell => Some(b),
            [a, b] if b == cell => Some(a),
            _ => None,
        }
    }

    /// Whether both slots are empty.
    pub fn is_empty(&self) -> bool {
        self.cells[0].is_none() && self.cells[1].is_none()
    }

    fn full_error(&self, cell: LoopHandle) -> TopologyError {
        TopologyError::NonManifoldQuadEdge {
            edge: None,
            cell,
            existing: [self.cell0(), self.cell1()],
        }
    }
}

impl Default for QuadEdge {
    fn default() -> Self {
        Self::new()
    }
}
