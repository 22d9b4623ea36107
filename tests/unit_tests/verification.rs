use defelement::points::lattice;
use defelement::tabulation::{EntityDofMap, Tabulation};
use defelement::verification::{rank, verify, Mismatch, DEFAULT_TOLERANCE};
use defelement::{ReferenceCell, VerificationError};
use defelement_reference::create_element;
use matrixcompare::assert_scalar_eq;
use nalgebra::{DMatrix, Matrix2};
use proptest::prelude::*;
use std::collections::BTreeMap;

fn tabulate(cell: ReferenceCell, family: &str, degree: usize) -> (EntityDofMap, Tabulation) {
    let element = create_element(cell.name(), family, degree, &BTreeMap::new()).unwrap();
    let points = lattice(cell, 6);
    let table = element.tabulate(&points);
    let tabulation = Tabulation::from_matrix(points.nrows(), element.value_size(), table).unwrap();
    (EntityDofMap::new(element.entity_dof_map().to_vec()), tabulation)
}

fn compare(
    cell: ReferenceCell,
    a: &(EntityDofMap, Tabulation),
    b: &(EntityDofMap, Tabulation),
) -> Result<defelement::verification::Verdict, VerificationError> {
    verify(cell, (&a.0, &a.1), (&b.0, &b.1), DEFAULT_TOLERANCE)
}

/// Replaces the columns of `dofs` by their combination with `mix`.
fn mix_columns(tabulation: &Tabulation, dofs: &[usize], mix: &DMatrix<f64>) -> Tabulation {
    let mut table = tabulation.table().clone();
    let mixed = tabulation.columns(dofs) * mix;
    for (j, &dof) in dofs.iter().enumerate() {
        table.set_column(dof, &mixed.column(j));
    }
    Tabulation::from_matrix(tabulation.npoints(), tabulation.value_size(), table).unwrap()
}

#[test]
fn rank_uses_relative_tolerance() {
    let matrix = DMatrix::from_row_slice(3, 2, &[1.0, 2.0, 2.0, 4.0, 3.0, 6.0 + 1e-12]);
    assert_eq!(rank(&matrix, DEFAULT_TOLERANCE), 1);
    assert_eq!(rank(&(matrix * 1e6), DEFAULT_TOLERANCE), 1);
    assert_eq!(rank(&DMatrix::identity(4, 4), DEFAULT_TOLERANCE), 4);
    assert_eq!(rank(&DMatrix::zeros(3, 3), DEFAULT_TOLERANCE), 0);
    assert_eq!(rank(&DMatrix::zeros(0, 0), DEFAULT_TOLERANCE), 0);
}

#[test]
fn elements_agree_with_themselves() {
    let cases = [
        (ReferenceCell::Interval, "P", 3),
        (ReferenceCell::Triangle, "P", 3),
        (ReferenceCell::Triangle, "Hermite", 3),
        (ReferenceCell::Triangle, "N1curl", 2),
        (ReferenceCell::Quadrilateral, "Q", 2),
        (ReferenceCell::Tetrahedron, "N2div", 1),
        (ReferenceCell::Hexahedron, "Q", 1),
    ];
    for (cell, family, degree) in cases {
        let element = tabulate(cell, family, degree);
        let verdict = compare(cell, &element, &element).unwrap();
        assert!(verdict.passed(), "{family} {degree} on {cell}: {verdict:?}");
    }
}

#[test]
fn degree_one_lagrange_on_triangle_has_one_dof_per_vertex() {
    let cell = ReferenceCell::Triangle;
    let a = tabulate(cell, "P", 1);
    let b = tabulate(cell, "P", 1);
    assert!(compare(cell, &a, &b).unwrap().passed());
    for v in 0..3 {
        assert_eq!(a.0.dofs(0, v).unwrap().len(), 1);
    }
    for e in 0..3 {
        assert!(a.0.dofs(1, e).unwrap().is_empty());
    }
    assert!(a.0.dofs(2, 0).unwrap().is_empty());
}

#[test]
fn hermite_and_lagrange_differ_at_vertices() {
    let cell = ReferenceCell::Triangle;
    let lagrange = tabulate(cell, "P", 3);
    let hermite = tabulate(cell, "Hermite", 3);
    let verdict = compare(cell, &lagrange, &hermite).unwrap();
    assert!(!verdict.passed());
    assert_eq!(verdict.diagnostic().and_then(Mismatch::entity), Some((0, 0)));
    for v in 0..3 {
        assert!(verdict
            .mismatches()
            .contains(&Mismatch::EntityCount { dim: 0, entity: v, a: 1, b: 3 }));
    }
}

#[test]
fn brezzi_douglas_marini_and_second_kind_nedelec_differ() {
    for cell in [ReferenceCell::Triangle, ReferenceCell::Tetrahedron] {
        let bdm = tabulate(cell, "N2div", 1);
        let nedelec = tabulate(cell, "N2curl", 1);
        assert_eq!(bdm.1.ndofs(), nedelec.1.ndofs());
        let verdict = compare(cell, &bdm, &nedelec).unwrap();
        assert!(!verdict.passed(), "{cell}");
        if cell == ReferenceCell::Triangle {
            // Both elements carry two DOFs per edge, so only the spans can tell them apart
            assert!(matches!(verdict.diagnostic(), Some(Mismatch::Rank { dim: 1, .. })));
        }
    }
}

#[test]
fn different_value_shapes_fail() {
    let cell = ReferenceCell::Triangle;
    let lagrange = tabulate(cell, "P", 1);
    let raviart_thomas = tabulate(cell, "N1div", 1);
    let verdict = compare(cell, &lagrange, &raviart_thomas).unwrap();
    assert_eq!(verdict.mismatches(), [Mismatch::ValueShape { a: 1, b: 2 }]);
}

#[test]
fn moving_a_dof_fails_at_both_entities() {
    let cell = ReferenceCell::Triangle;
    let element = tabulate(cell, "P", 2);
    let mut dofs = element.0.clone().into_inner();
    let moved = dofs[0][0].pop().unwrap();
    dofs[0][1].push(moved);
    let moved_element = (EntityDofMap::new(dofs), element.1.clone());

    let verdict = compare(cell, &element, &moved_element).unwrap();
    let entities: Vec<_> = verdict.mismatches().iter().filter_map(Mismatch::entity).collect();
    assert_eq!(entities, [(0, 0), (0, 1)]);
    assert!(verdict
        .mismatches()
        .iter()
        .all(|m| matches!(m, Mismatch::EntityCount { .. })));
}

#[test]
fn smaller_subspace_fails_with_rank_mismatch() {
    let cell = ReferenceCell::Triangle;
    let element = tabulate(cell, "P", 3);
    let edge = element.0.dofs(1, 0).unwrap().to_vec();
    assert_eq!(edge.len(), 2);

    // Zero-fill the second function of edge 0
    let mix = DMatrix::from_row_slice(2, 2, &[1.0, 0.0, 0.0, 0.0]);
    let reduced = (element.0.clone(), mix_columns(&element.1, &edge, &mix));
    let verdict = compare(cell, &element, &reduced).unwrap();
    assert_eq!(
        verdict.mismatches(),
        [Mismatch::Rank {
            dim: 1,
            entity: 0,
            rank_a: 2,
            rank_b: 1,
            rank_combined: 2
        }]
    );
    assert_eq!(
        verdict.diagnostic().map(|m| m.to_string()).as_deref(),
        Some("sub-entity (1, 0) spans differ (ranks 2, 1, combined 2)")
    );
}

#[test]
fn comparison_is_symmetric() {
    let cell = ReferenceCell::Triangle;
    let elements = [
        tabulate(cell, "P", 3),
        tabulate(cell, "Hermite", 3),
        tabulate(cell, "N1div", 1),
        tabulate(cell, "N1curl", 1),
        tabulate(cell, "N2div", 1),
        tabulate(cell, "N2curl", 1),
    ];
    for a in &elements {
        for b in &elements {
            let ab = compare(cell, a, b).unwrap();
            let ba = compare(cell, b, a).unwrap();
            assert_eq!(ab.passed(), ba.passed());
            let entities = |v: &defelement::verification::Verdict| -> Vec<_> {
                v.mismatches().iter().map(Mismatch::entity).collect()
            };
            assert_eq!(entities(&ab), entities(&ba));
        }
    }
}

#[test]
fn malformed_entity_maps_are_rejected() {
    let cell = ReferenceCell::Triangle;
    let element = tabulate(cell, "P", 1);

    let duplicated = EntityDofMap::new(vec![
        vec![vec![0], vec![1], vec![1]],
        vec![vec![], vec![], vec![]],
        vec![vec![]],
    ]);
    let result = verify(cell, (&duplicated, &element.1), (&element.0, &element.1), 1e-8);
    assert!(matches!(result, Err(VerificationError::MalformedInput(_))));

    let wrong_cell = EntityDofMap::new(vec![vec![vec![0], vec![1]], vec![vec![2]]]);
    let result = verify(cell, (&element.0, &element.1), (&wrong_cell, &element.1), 1e-8);
    assert!(matches!(result, Err(VerificationError::MalformedInput(_))));
}

#[test]
fn tabulations_keep_their_values() {
    let cell = ReferenceCell::Interval;
    let (map, tabulation) = tabulate(cell, "P", 1);
    assert_eq!(map.dof_count(), 2);
    // The lattice on the interval starts at x = 0, where the first vertex function is one
    assert_scalar_eq!(tabulation.value(0, 0, 0), 1.0, comp = abs, tol = 1e-12);
    assert_scalar_eq!(tabulation.value(0, 0, 1), 0.0, comp = abs, tol = 1e-12);
}

fn nonzero_scale() -> impl Strategy<Value = f64> {
    (0.1..10.0f64, any::<bool>()).prop_map(|(s, negative)| if negative { -s } else { s })
}

proptest! {
    #[test]
    fn scaling_basis_functions_preserves_agreement(scales in prop::collection::vec(nonzero_scale(), 10)) {
        let cell = ReferenceCell::Triangle;
        let element = tabulate(cell, "P", 3);
        let all: Vec<usize> = (0..10).collect();
        let scaling = DMatrix::from_diagonal(&nalgebra::DVector::from_vec(scales));
        let scaled = (element.0.clone(), mix_columns(&element.1, &all, &scaling));
        prop_assert!(compare(cell, &element, &scaled).unwrap().passed());
    }

    #[test]
    fn mixing_within_an_entity_preserves_agreement(
        entries in prop::array::uniform4(-2.0..2.0f64),
        edge in 0..3usize,
    ) {
        let mix = Matrix2::from_row_slice(&entries);
        prop_assume!(mix.determinant().abs() > 0.1);
        let cell = ReferenceCell::Triangle;
        let element = tabulate(cell, "N1curl", 2);
        let dofs = element.0.dofs(1, edge).unwrap().to_vec();
        prop_assert_eq!(dofs.len(), 2);
        let mix = DMatrix::from_row_slice(2, 2, &entries);
        let mixed = (element.0.clone(), mix_columns(&element.1, &dofs, &mix));
        prop_assert!(compare(cell, &element, &mixed).unwrap().passed());
    }
}
