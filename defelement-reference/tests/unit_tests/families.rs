use defelement_reference::{create_element, Error, ReferenceCell};
use nalgebra::dmatrix;
use std::collections::BTreeMap;

fn create(
    cell: &str,
    family: &str,
    degree: usize,
) -> Result<defelement_reference::CiarletElement, Error> {
    create_element(cell, family, degree, &BTreeMap::new())
}

#[test]
fn element_dimensions() {
    let cases = [
        ("interval", "Hermite", 3, 4),
        ("triangle", "Hermite", 3, 10),
        ("tetrahedron", "Hermite", 3, 20),
        ("triangle", "CR", 1, 3),
        ("tetrahedron", "CR", 1, 4),
        ("triangle", "N1div", 1, 3),
        ("triangle", "N1div", 2, 8),
        ("tetrahedron", "N1div", 2, 15),
        ("triangle", "N1curl", 3, 15),
        ("tetrahedron", "N1curl", 2, 20),
        ("triangle", "N2div", 1, 6),
        ("triangle", "N2div", 2, 12),
        ("tetrahedron", "N2div", 1, 12),
        ("triangle", "N2curl", 2, 12),
        ("tetrahedron", "N2curl", 1, 12),
        ("hexahedron", "Q", 2, 27),
    ];
    for (cell, family, degree, dim) in cases {
        let element = create(cell, family, degree).unwrap();
        assert_eq!(element.dim(), dim, "{family} degree {degree} on {cell}");
    }
}

#[test]
fn hermite_dofs_live_on_vertices_and_faces() {
    let element = create("triangle", "Hermite", 3).unwrap();
    for v in 0..3 {
        assert_eq!(element.entity_dofs(0, v).unwrap().len(), 3);
    }
    for e in 0..3 {
        assert!(element.entity_dofs(1, e).unwrap().is_empty());
    }
    assert_eq!(element.entity_dofs(2, 0).unwrap().len(), 1);
}

#[test]
fn raviart_thomas_normal_components_vanish_on_other_edges() {
    // The lowest order basis function for edge 2 (y = 0) has zero normal component on the
    // edges x = 0 and x + y = 1
    let element = create("triangle", "N1div", 1).unwrap();
    let dof = element.entity_dofs(1, 2).unwrap()[0];
    let points = dmatrix![0.0, 0.3;
                          0.6, 0.4];
    let table = element.tabulate(&points);
    // Normal of x = 0 is (1, 0)
    assert!(table[(0, dof)].abs() < 1e-12);
    // Normal of x + y = 1 is (1, 1)
    assert!((table[(2, dof)] + table[(3, dof)]).abs() < 1e-12);
}

#[test]
fn unsupported_constructions_are_not_implemented() {
    let errors = [
        create("quadrilateral", "Hermite", 3).unwrap_err(),
        create("triangle", "Hermite", 4).unwrap_err(),
        create("tetrahedron", "N2curl", 2).unwrap_err(),
        create("triangle", "Morley", 2).unwrap_err(),
        create("prism", "P", 1).unwrap_err(),
    ];
    for error in errors {
        assert!(error.is_not_implemented(), "{error}");
    }

    let mut params = BTreeMap::new();
    params.insert("variant".to_string(), "gl".to_string());
    let error = create_element("triangle", "P", 2, &params).unwrap_err();
    assert!(matches!(error, Error::UnsupportedVariant { .. }));
}

#[test]
fn cell_names_round_trip() {
    for cell in ReferenceCell::ALL {
        assert_eq!(cell.name().parse::<ReferenceCell>().unwrap(), cell);
    }
}
