use defelement::element::ElementDescriptor;
use defelement::example::Example;
use defelement::implementations::{self, construct};
use defelement::points::lattice;
use defelement::verification::{verify, DEFAULT_TOLERANCE};
use defelement::{NotImplementedReason, ReferenceCell, Settings, VerificationError};
use insta::assert_snapshot;
use std::collections::BTreeMap;

fn params(pairs: &[(&str, &str)]) -> BTreeMap<String, String> {
    pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
}

fn format(library: &str, name: &str, pairs: &[(&str, &str)]) -> String {
    implementations::get(library)
        .unwrap()
        .format(name, &params(pairs))
}

fn lagrange() -> ElementDescriptor {
    let json = r#"{
        "name": "Lagrange",
        "reference-cells": ["interval", "triangle", "tetrahedron"],
        "examples": ["triangle,1", "triangle,3", "tetrahedron,2"],
        "implementations": {
            "symfem": "P variant=equispaced",
            "simplefem": {"triangle": "lagrange"},
            "basix": "P lagrange_variant=equispaced"
        }
    }"#;
    ElementDescriptor::from_json("lagrange", json).unwrap()
}

#[test]
fn construction_strings_use_library_syntax() {
    assert_snapshot!(
        format("symfem", "P", &[("variant", "legendre")]),
        @r###""P", variant="legendre""###
    );
    assert_snapshot!(
        format("basix", "P", &[("lagrange_variant", "gll_warped")]),
        @"basix.ElementFamily.P, lagrange_variant=basix.LagrangeVariant.gll_warped"
    );
    assert_snapshot!(
        format("fiat", "Lagrange", &[("variant", "equispaced"), ("reduced", "True")]),
        @r###"FIAT.Lagrange(..., reduced=True, variant="equispaced")"###
    );
    assert_snapshot!(
        format("ndelement", "Lagrange", &[("continuity", "Discontinuous")]),
        @"Family.Lagrange, continuity=Continuity.Discontinuous"
    );
    assert_snapshot!(format("bempp-cl", "P", &[("variant", "x")]), @r###""P""###);
    assert_snapshot!(format("simplefem", "lagrange", &[]), @"lagrange");
    assert_snapshot!(
        format("basix.ufl", "P", &[("shape", "(dim,)")]),
        @"basix.ElementFamily.P, shape=(dim,)"
    );
    assert_snapshot!(
        format("*(symfem -> basix.ufl)", "P", &[("variant", "equispaced")]),
        @r###"symfem.basix_interface.create_basix_element(symfem.create_element(..., "P", ..., variant="equispaced"), ufl=True)"###
    );
}

#[test]
fn custom_basix_ufl_elements_follow_the_reference() {
    let custom = implementations::get("*(symfem -> basix.ufl)").unwrap();
    let hermite = r#"{
        "name": "Hermite",
        "reference-cells": ["triangle"],
        "examples": ["triangle,3"],
        "implementations": {"symfem": "Hermite"}
    }"#;
    let hermite = ElementDescriptor::from_json("hermite", hermite).unwrap();
    let renamed = ElementDescriptor {
        id: "cubic".to_string(),
        ..hermite.clone()
    };

    // Derivative DOFs cannot be written as custom elements; the id decides
    assert!(!custom.implemented(&hermite));
    assert!(custom.implemented(&renamed));
    assert!(custom.implemented(&lagrange()));
    assert_eq!(custom.recipe_library(), "symfem");

    // The reference recipe is resolved, then the missing bridge stops construction
    let example = Example::parse("triangle,1").unwrap();
    let resolved = implementations::resolve(custom, &lagrange(), &example).unwrap();
    assert_eq!(resolved.to_string(), "P 1 variant=equispaced");
    let result = construct(custom, &lagrange(), &example, &Settings::default());
    assert_eq!(
        result.unwrap_err(),
        VerificationError::NotImplemented(NotImplementedReason::Unavailable(
            "*(symfem -> basix.ufl)".to_string()
        ))
    );

    // basix.ufl has its own recipes, and lagrange() has none
    let basix_ufl = implementations::get("basix.ufl").unwrap();
    assert!(!basix_ufl.implemented(&lagrange()));
}

#[test]
fn simplefem_agrees_with_reference_lagrange() {
    let settings = Settings::default();
    let element = lagrange();
    let simplefem = implementations::get("simplefem").unwrap();
    let points = lattice(ReferenceCell::Triangle, 7);
    for example in ["triangle,1", "triangle,2", "triangle,3"] {
        let example = Example::parse(example).unwrap();
        let tested = construct(simplefem, &element, &example, &settings).unwrap();
        let reference =
            construct(implementations::reference(), &element, &example, &settings).unwrap();
        let a = tested.tabulate(&points).unwrap();
        let b = reference.tabulate(&points).unwrap();
        let verdict = verify(
            ReferenceCell::Triangle,
            (&tested.entity_dofs, &a),
            (&reference.entity_dofs, &b),
            DEFAULT_TOLERANCE,
        )
        .unwrap();
        assert!(verdict.passed(), "{example}: {verdict:?}");
    }
}

#[test]
fn unsupported_constructions_are_not_implemented() {
    let settings = Settings::default();
    let element = lagrange();
    let simplefem = implementations::get("simplefem").unwrap();
    let fiat = implementations::get("fiat").unwrap();

    let tetrahedron = Example::parse("tetrahedron,2").unwrap();
    let result = construct(simplefem, &element, &tetrahedron, &settings);
    assert_eq!(
        result.unwrap_err(),
        VerificationError::NotImplemented(NotImplementedReason::Cell("tetrahedron".to_string()))
    );

    let triangle = Example::parse("triangle,1").unwrap();
    let result = construct(fiat, &element, &triangle, &settings);
    assert_eq!(
        result.unwrap_err(),
        VerificationError::NotImplemented(NotImplementedReason::Element)
    );

    // basix is implemented, but no bridge is configured
    let basix = implementations::get("basix").unwrap();
    let result = construct(basix, &element, &triangle, &settings);
    assert!(matches!(
        result.unwrap_err(),
        VerificationError::NotImplemented(NotImplementedReason::Unavailable(_))
    ));

    let unknown_cell = Example::parse("prism,1").unwrap();
    let result = construct(implementations::reference(), &element, &unknown_cell, &settings);
    assert!(result.unwrap_err().is_not_implemented());
}

#[test]
fn reference_reports_unknown_variants_as_not_implemented() {
    let json = r#"{
        "name": "Lagrange",
        "reference-cells": ["triangle"],
        "examples": ["triangle,2"],
        "implementations": {"symfem": "P variant=chebyshev_plus_endpoints"}
    }"#;
    let element = ElementDescriptor::from_json("lagrange", json).unwrap();
    let example = Example::parse("triangle,2").unwrap();
    let result = construct(implementations::reference(), &element, &example, &Settings::default());
    assert!(result.unwrap_err().is_not_implemented());
}
