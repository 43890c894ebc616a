use std::{collections::BTreeSet, fmt::Debug};

use crate::{
    build::LevelBuilder,
    core::NodeFlags,
    level::MeshLevel,
    shape::{Disc, Plate},
};


/// Asserts that the given iterator yields exactly the given elements,
/// ignoring order and duplicates.
macro_rules! assert_eq_set {
    ($iter:expr, [$($item:expr),* $(,)*] $(,)?) => {
        crate::test_utils::assert_eq_set_fn(
            $iter,
            &[$($item),*],
            stringify!($iter),
            stringify!([$($item),*]),
        );
    }
}

/// Internal helper function for `assert_eq_set`.
pub(crate) fn assert_eq_set_fn<I, T>(actual: I, expected: &[T], left_str: &str, right_str: &str)
where
    I: IntoIterator<Item = T>,
    T: Debug + Clone + Eq + Ord,
{
    let actual = actual.into_iter().collect::<BTreeSet<_>>();
    let expected = expected.iter().cloned().collect::<BTreeSet<_>>();
    if actual != expected {
        panic!(
            "assert_eq_set({}, {}) failed:\n  left: {:?}\n right: {:?} ",
            left_str,
            right_str,
            actual,
            expected,
        );
    }
}

/// Two triangles forming the unit square in the xy-plane, split along the
/// diagonal from `(0, 0)` to `(1, 1)`.
pub(crate) fn unit_square() -> MeshLevel {
    let mut b = LevelBuilder::new();
    let n = [
        b.add_node([0.0, 0.0, 0.0], NodeFlags::interior()),
        b.add_node([1.0, 0.0, 0.0], NodeFlags::interior()),
        b.add_node([1.0, 1.0, 0.0], NodeFlags::interior()),
        b.add_node([0.0, 1.0, 0.0], NodeFlags::interior()),
    ];
    b.add_triangle(n[0], n[1], n[2]);
    b.add_triangle(n[0], n[2], n[3]);
    b.build().unwrap()
}

/// Four triangles around a center node.
pub(crate) fn fan() -> MeshLevel {
    Disc::with_faces(4).builder().build().unwrap()
}

pub(crate) fn plate(span_nodes: u32, chord_nodes: u32) -> MeshLevel {
    Plate::new(span_nodes, chord_nodes).builder().build().unwrap()
}
