use defelement_reference::families::lagrange;
use defelement_reference::{create_element, ReferenceCell};
use matrixcompare::assert_matrix_eq;
use nalgebra::{dmatrix, DMatrix};
use std::collections::BTreeMap;

use proptest::prelude::*;

fn no_params() -> BTreeMap<String, String> {
    BTreeMap::new()
}

#[test]
fn linear_triangle_basis() {
    let element = create_element("triangle", "P", 1, &no_params()).unwrap();
    let points = dmatrix![0.25, 0.5;
                          0.1, 0.2];
    let table = element.tabulate(&points);
    let expected = dmatrix![0.25, 0.25, 0.5;
                            0.7, 0.1, 0.2];
    assert_matrix_eq!(table, expected, comp = abs, tol = 1e-13);
    assert_eq!(
        element.entity_dof_map(),
        &[
            vec![vec![0], vec![1], vec![2]],
            vec![vec![], vec![], vec![]],
            vec![vec![]]
        ]
    );
}

#[test]
fn basis_is_dual_to_lattice_nodes() {
    for cell in ReferenceCell::ALL {
        for degree in 1..=3 {
            let element = create_element(cell.name(), "P", degree, &no_params()).unwrap();
            // Collect the nodes in the order the element numbers its degrees of freedom
            let mut nodes = cell.vertices();
            for dim in 1..=cell.tdim() {
                let entity_type = cell.sub_entity_type(dim).unwrap();
                for entity in 0..cell.sub_entities(dim).len() {
                    let map = cell.sub_entity_map(dim, entity);
                    for t in lagrange::interior_lattice(entity_type, degree) {
                        nodes.push(map.map_point(&t));
                    }
                }
            }
            let points = DMatrix::from_fn(nodes.len(), cell.tdim(), |i, j| nodes[i][j]);
            let table = element.tabulate(&points);
            let identity = DMatrix::<f64>::identity(nodes.len(), nodes.len());
            assert_matrix_eq!(table, identity, comp = abs, tol = 1e-10);
        }
    }
}

#[test]
fn discontinuous_lagrange_has_interior_dofs_only() {
    let mut params = BTreeMap::new();
    params.insert("discontinuous".to_string(), "True".to_string());
    let element = create_element("triangle", "P", 2, &params).unwrap();
    assert_eq!(element.entity_dofs(0, 0), Some(&[][..]));
    assert_eq!(element.entity_dofs(2, 0), Some(&[0, 1, 2, 3, 4, 5][..]));

    let element = create_element("quadrilateral", "dP", 0, &no_params()).unwrap();
    assert_eq!(element.dim(), 1);
    assert_eq!(element.entity_dofs(2, 0), Some(&[0][..]));
}

proptest! {
    #[test]
    fn lagrange_basis_is_partition_of_unity(x in 0.0..1.0f64, y in 0.0..1.0f64, degree in 1usize..4) {
        let element = create_element("quadrilateral", "P", degree, &no_params()).unwrap();
        let table = element.tabulate(&dmatrix![x, y]);
        prop_assert!((table.sum() - 1.0).abs() < 1e-10);
    }
}
