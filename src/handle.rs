//! Handles to refer to mesh elements.
//!
//! All elements of a mesh level (nodes, edges, panels, vortex loops and
//! vortex edges) are stored in vectors and referred to by their index. To
//! avoid mixing up the index spaces, every element kind has its own strongly
//! typed handle.
//!
//! References that might be missing (e.g. the second panel of a boundary
//! edge or the coarse grid node of a node on the coarsest level) are stored
//! as [`Opt<H>`][Opt]. The "none" value of those is `hsize::max_value()`,
//! which is never a valid index, so the index `0` is just an ordinary index
//! and an optional handle is not larger than the handle itself.

use std::fmt;

use static_assertions::assert_eq_size;


/// The integer type used to store handle indices.
///
/// Defaults to `u32` which should be plenty for all surface meshes used by
/// panel methods. With the feature `large-handle`, `u64` is used instead.
#[cfg(not(feature = "large-handle"))]
#[allow(non_camel_case_types)]
pub type hsize = u32;

#[cfg(feature = "large-handle")]
#[allow(non_camel_case_types)]
pub type hsize = u64;

/// A compact optional handle. See the module documentation.
pub type Opt<H> = optional::Optioned<H>;


/// Types that can be used to refer to some data.
///
/// A handle is just a fancy index: a mesh level stores its elements in
/// vectors and the handle is the position in that vector.
pub trait Handle: 'static + Copy + fmt::Debug + Eq + Ord {
    /// Create a handle from the given index. The index must not be
    /// `hsize::max_value()` as this value is reserved!
    fn new(idx: hsize) -> Self;

    /// Return the index of the current handle.
    fn idx(&self) -> hsize;

    /// Helper method to create a handle directly from an `usize`.
    ///
    /// If `raw` cannot be represented by `hsize`, this function panics.
    #[inline(always)]
    fn from_usize(raw: usize) -> Self {
        assert!(
            raw < hsize::max_value() as usize,
            "handle index {} is too large to be stored (maybe enable `large-handle`?)",
            raw,
        );
        Self::new(raw as hsize)
    }

    /// Helper method to get the index as `usize` directly from an handle.
    #[inline(always)]
    fn to_usize(&self) -> usize {
        self.idx() as usize
    }
}

macro_rules! make_handle_type {
    ($(#[$attr:meta])* $name:ident = $short:expr;) => {
        $(#[$attr])*
        #[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
        pub struct $name(hsize);

        impl Handle for $name {
            #[inline(always)]
            fn new(idx: hsize) -> Self {
                $name(idx)
            }

            #[inline(always)]
            fn idx(&self) -> hsize {
                self.0
            }
        }

        impl optional::Noned for $name {
            #[inline(always)]
            fn is_none(&self) -> bool {
                self.0 == hsize::max_value()
            }

            #[inline(always)]
            fn get_none() -> Self {
                $name(hsize::max_value())
            }
        }

        impl optional::OptEq for $name {
            #[inline(always)]
            fn opt_eq(&self, other: &Self) -> bool {
                self == other
            }
        }

        impl fmt::Debug for $name {
            fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
                write!(f, "{}{}", $short, self.idx())
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
                fmt::Debug::fmt(self, f)
            }
        }
    }
}

make_handle_type! {
    /// A handle that is associated with a node of a mesh level.
    NodeHandle = "N";
}
make_handle_type! {
    /// A handle that is associated with an edge of a mesh level.
    ///
    /// Quad edges are stored per edge and are addressed by the same handle.
    EdgeHandle = "E";
}
make_handle_type! {
    /// A handle that is associated with an input panel. Panels only exist on
    /// the finest level; coarser levels refer to them through their vortex
    /// loops.
    PanelHandle = "P";
}
make_handle_type! {
    /// A handle that is associated with a vortex loop (a cell) of a mesh
    /// level.
    LoopHandle = "L";
}
make_handle_type! {
    /// A handle that is associated with the circulation unknown of an edge.
    VortexEdgeHandle = "VE";
}

assert_eq_size!(Opt<NodeHandle>, NodeHandle);
assert_eq_size!(Opt<LoopHandle>, hsize);


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_is_an_ordinary_index() {
        let zero = Opt::some(LoopHandle::new(0));
        assert!(zero.is_some());
        assert_eq!(zero.into_option(), Some(LoopHandle::new(0)));

        let none: Opt<LoopHandle> = Opt::none();
        assert!(none.is_none());
        assert!(zero != none);
    }

    #[test]
    fn debug_repr() {
        assert_eq!(format!("{:?}", NodeHandle::new(3)), "N3");
        assert_eq!(format!("{:?}", VortexEdgeHandle::new(12)), "VE12");
        assert_eq!(EdgeHandle::from_usize(7).to_usize(), 7);
    }

    #[test]
    #[should_panic]
    fn reserved_index() {
        PanelHandle::from_usize(hsize::max_value() as usize);
    }
}
