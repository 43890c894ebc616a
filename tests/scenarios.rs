use vortex_mesh::{
    prelude::*,
    core::{Edge, EdgeKind, NodeFlags, QuadEdge, TopologyError},
    gradient::{self, GradientConfig, GradientMethod, MeshGradient},
    multigrid::Hierarchy,
    shape::{Disc, Plate},
    BuildError, LevelBuilder, LevelOutcome, LoopHandle, NodeHandle, PanelHandle,
};


#[test]
fn unit_square_topology() {
    let mut b = LevelBuilder::new();
    let n0 = b.add_node([0.0, 0.0, 0.0], NodeFlags::interior());
    let n1 = b.add_node([1.0, 0.0, 0.0], NodeFlags::interior());
    let n2 = b.add_node([1.0, 1.0, 0.0], NodeFlags::interior());
    let n3 = b.add_node([0.0, 1.0, 0.0], NodeFlags::interior());
    b.add_triangle(n0, n1, n2);
    b.add_triangle(n0, n2, n3);
    let level = b.build().unwrap();

    assert_eq!(level.num_edges(), 5);
    assert_eq!(level.num_edges_of_kind(EdgeKind::Interior), 1);
    assert_eq!(level.num_boundary_edges(), 4);

    let diagonal = level.edges()
        .find(|(_, e)| e.num_panels() == 2)
        .map(|(h, _)| h)
        .unwrap();
    let qe = level.quad_edge(diagonal).unwrap();
    assert_eq!(qe.cells(), Some([LoopHandle::new(0), LoopHandle::new(1)]));
}

#[test]
fn third_panel_leaves_edge_untouched() {
    let mut edge = Edge::new(NodeHandle::new(0), NodeHandle::new(1)).unwrap();
    edge.attach_panel(PanelHandle::new(0)).unwrap();
    edge.attach_panel(PanelHandle::new(1)).unwrap();

    let before = edge;
    let res = edge.attach_panel(PanelHandle::new(2));
    assert!(matches!(res, Err(TopologyError::NonManifoldEdge { .. })));
    assert_eq!(edge, before);
    assert_eq!(edge.tri1(), Some(PanelHandle::new(0)));
    assert_eq!(edge.tri2(), Some(PanelHandle::new(1)));
}

#[test]
fn quad_edge_reset_equals_fresh() {
    let mut qe = QuadEdge::new();
    qe.link(LoopHandle::new(0)).unwrap();
    qe.link(LoopHandle::new(7)).unwrap();
    assert!(qe.link(LoopHandle::new(3)).is_err());
    assert_eq!(qe.other(LoopHandle::new(7)), Some(LoopHandle::new(0)));

    qe.reset();
    assert_eq!(qe, QuadEdge::new());
    assert!(qe.is_empty());
}

#[test]
fn gradient_set_zero() {
    let mut g = MeshGradient::new(1.0, -2.0, 0.5);
    g += MeshGradient::new(1.0, 1.0, 1.0);
    assert_eq!(g, MeshGradient::new(2.0, -1.0, 1.5));

    g.set_zero();
    assert!(g.is_zero());
    assert_eq!(g, MeshGradient::zero());
}

#[test]
fn fan_coarsens_to_a_single_cell() {
    let finest = Disc::with_faces(4).builder().build().unwrap();
    assert_eq!(finest.num_nodes(), 5);
    assert_eq!(finest.num_loops(), 4);

    let mut hierarchy = Hierarchy::new(finest);
    assert_eq!(hierarchy.build_level().unwrap(), LevelOutcome::Built(1));

    let coarse = hierarchy.level(1).unwrap();
    assert_eq!(coarse.num_loops(), 1);
    assert_eq!(coarse.num_nodes(), 4);

    // Every fine node has a coarse grid node.
    for (n, _) in hierarchy.finest().nodes() {
        assert!(hierarchy.coarse_node(0, n).is_some());
    }

    // Nothing is left to merge.
    assert_eq!(
        hierarchy.build_level().unwrap(),
        LevelOutcome::DepthLimited { coarsest: 1 },
    );
}

#[test]
fn surviving_nodes_are_linked_both_ways() {
    let finest = Plate::new(9, 5).builder().build().unwrap();
    let mut hierarchy = Hierarchy::new(finest);
    hierarchy.build().unwrap();
    assert!(hierarchy.num_levels() >= 2);

    for k in 1..hierarchy.num_levels() {
        let coarse = hierarchy.level(k).unwrap();
        assert!(coarse.num_loops() < hierarchy.level(k - 1).unwrap().num_loops());

        for (c, _) in coarse.nodes() {
            let f = hierarchy.fine_node(k, c).unwrap();
            assert_eq!(hierarchy.coarse_node(k - 1, f), Some(c));
        }
        for (l, cell) in coarse.loops() {
            for &fine in cell.fine_loops() {
                let fine_level = hierarchy.level(k - 1).unwrap();
                assert_eq!(fine_level.vortex_loop(fine).unwrap().coarse_loop(), Some(l));
            }
        }
    }
}

#[test]
fn uniform_field_has_zero_gradient() {
    let level = Plate::new(9, 5).builder().build().unwrap();
    let values = vec![3.25; level.num_loops()];

    for &method in &[GradientMethod::GreenGauss, GradientMethod::LeastSquares] {
        let config = GradientConfig::default().with_method(method);
        let field = gradient::reconstruct(&level, &values, &config).unwrap();

        assert_eq!(field.len(), level.num_loops());
        assert!(field.errors().is_empty());
        for g in field.gradients() {
            assert!(g.magnitude() < 1e-10, "{:?} for {:?}", g, method);
        }
    }
}

#[test]
fn non_manifold_input_is_rejected() {
    let mut b = LevelBuilder::new();
    let n0 = b.add_node([0.0, 0.0, 0.0], NodeFlags::interior());
    let n1 = b.add_node([1.0, 0.0, 0.0], NodeFlags::interior());
    let a = b.add_node([0.5, 1.0, 0.0], NodeFlags::interior());
    let c = b.add_node([0.5, -1.0, 0.0], NodeFlags::interior());
    let d = b.add_node([0.5, 0.0, 1.0], NodeFlags::interior());
    b.add_triangle(n0, n1, a);
    b.add_triangle(n1, n0, c);
    b.add_triangle(n0, n1, d);

    let res = b.build();
    assert!(matches!(
        res,
        Err(BuildError::Topology(TopologyError::NonManifoldEdge { .. }))
    ));
}

#[test]
fn every_level_keeps_edge_and_gradient_invariants() {
    let finest = Plate::new(17, 9).builder().build().unwrap();
    let mut hierarchy = Hierarchy::new(finest);
    hierarchy.build().unwrap();
    assert!(hierarchy.num_levels() >= 3);

    for k in 0..hierarchy.num_levels() {
        let level = hierarchy.level(k).unwrap();

        for (h, e) in level.edges() {
            assert!(e.is_classified());
            assert_eq!(
                e.is_boundary_edge(),
                e.tri1().is_none() != e.tri2().is_none(),
                "edge {:?} on level {}",
                h,
                k,
            );
        }

        let values = vec![-1.5; level.num_loops()];
        for &method in &[GradientMethod::GreenGauss, GradientMethod::LeastSquares] {
            let config = GradientConfig::default().with_method(method);
            let field = gradient::reconstruct(level, &values, &config).unwrap();

            assert_eq!(field.len(), level.num_loops());
            for g in field.gradients() {
                assert!(g.magnitude() < 1e-10, "{:?} for {:?} on level {}", g, method, k);
            }
        }
    }
}
