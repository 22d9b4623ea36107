use defelement::element::{ElementDescriptor, ElementStore, ImplementationString};
use defelement::{NotImplementedReason, ReferenceCell, VerificationError};
use std::collections::BTreeMap;

const RAVIART_THOMAS: &str = r#"{
    "name": "Raviart-Thomas",
    "reference-cells": ["triangle", "tetrahedron", "quadrilateral"],
    "min-degree": 1,
    "max-degree": "k+2",
    "examples": ["triangle,1", "tetrahedron,2,legendre", "quadrilateral,1"],
    "implementations": {
        "symfem": {"legendre": "N1div variant=legendre", "equispaced": "N1div variant=equispaced"},
        "basix": "RT lagrange_variant=legendre DEGREEMAP=k",
        "fiat": {"triangle": "RaviartThomas variant=integral", "tetrahedron": "RaviartThomas variant=integral", "quadrilateral": null},
        "ndelement": "RaviartThomas DEGREEMAX=1",
        "bempp-cl": null
    }
}"#;

fn descriptor() -> ElementDescriptor {
    ElementDescriptor::from_json("raviart-thomas", RAVIART_THOMAS).unwrap()
}

fn params(pairs: &[(&str, &str)]) -> BTreeMap<String, String> {
    pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
}

fn not_implemented(
    reason: NotImplementedReason,
) -> Result<ImplementationString, VerificationError> {
    Err(VerificationError::NotImplemented(reason))
}

#[test]
fn descriptor_fields_are_read() {
    let element = descriptor();
    assert_eq!(element.id, "raviart-thomas");
    assert_eq!(element.name, "Raviart-Thomas");
    assert_eq!(element.examples.len(), 3);
    assert!(element.implemented("fiat"));
    assert!(!element.implemented("bempp-cl"));
    assert!(!element.implemented("simplefem"));
    let libraries: Vec<_> = element.implemented_libraries().collect();
    assert_eq!(libraries, ["basix", "fiat", "ndelement", "symfem"]);
    let examples = element.parsed_examples().unwrap();
    assert_eq!(examples[1].variant(), Some("legendre"));
}

#[test]
fn degree_maps_and_bounds_are_applied() {
    let element = descriptor();
    assert_eq!(
        element.implementation_string("basix", "triangle", 2, None),
        Ok(ImplementationString {
            name: "RT".to_string(),
            degree: 2,
            params: params(&[("lagrange_variant", "legendre")]),
        })
    );
    let resolved = element
        .implementation_string("basix", "tetrahedron", 3, None)
        .unwrap();
    assert_eq!(resolved.to_string(), "RT 3 lagrange_variant=legendre");
    assert_eq!(
        element
            .implementation_string("ndelement", "triangle", 1, None)
            .map(|s| s.name),
        Ok("RaviartThomas".to_string())
    );
    assert_eq!(
        element.implementation_string("ndelement", "triangle", 2, None),
        not_implemented(NotImplementedReason::Degree(2))
    );
}

#[test]
fn keyed_recipes_resolve_by_variant_and_cell() {
    let element = descriptor();
    let resolved = element
        .implementation_string("symfem", "tetrahedron", 2, Some("legendre"))
        .unwrap();
    assert_eq!(resolved.name, "N1div");
    assert_eq!(resolved.params, params(&[("variant", "legendre")]));

    assert_eq!(
        element.implementation_string("symfem", "triangle", 1, Some("lobatto")),
        not_implemented(NotImplementedReason::Variant("lobatto".to_string()))
    );
    assert_eq!(
        element
            .implementation_string("fiat", "triangle", 1, None)
            .map(|s| s.params),
        Ok(params(&[("variant", "integral")]))
    );
    assert_eq!(
        element.implementation_string("fiat", "quadrilateral", 1, None),
        not_implemented(NotImplementedReason::Cell("quadrilateral".to_string()))
    );
    assert_eq!(
        element.implementation_string("bempp-cl", "triangle", 1, None),
        not_implemented(NotImplementedReason::Element)
    );
}

#[test]
fn degree_range_accepts_formulas() {
    let element = descriptor();
    assert!(element.degree_in_range(ReferenceCell::Triangle, 1).unwrap());
    assert!(!element.degree_in_range(ReferenceCell::Triangle, 0).unwrap());
}

#[test]
fn validation_reports_problems() {
    // The symfem entry is keyed by variant only, so examples without a variant cannot be
    // constructed by the reference
    let problems = descriptor().validate();
    assert_eq!(problems.len(), 2, "{problems:?}");
    assert!(problems[0].contains("example \"triangle,1\": not implemented"));

    let json = r#"{
        "name": "Lagrange",
        "reference-cells": ["triangle"],
        "examples": ["triangle,1", "interval,2"],
        "implementations": {"symfem": "P"}
    }"#;
    let problems = ElementDescriptor::from_json("lagrange", json).unwrap().validate();
    assert_eq!(problems.len(), 1, "{problems:?}");
    assert!(problems[0].contains("not listed"));
}

#[test]
fn store_loads_descriptors_from_directory() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("raviart-thomas.json"), RAVIART_THOMAS).unwrap();
    std::fs::write(
        dir.path().join("lagrange.json"),
        r#"{"name": "Lagrange", "reference-cells": ["interval"], "implementations": {"symfem": "P"}}"#,
    )
    .unwrap();
    std::fs::write(dir.path().join("notes.txt"), "not a descriptor").unwrap();

    let store = ElementStore::load_dir(dir.path()).unwrap();
    assert_eq!(store.len(), 2);
    let ids: Vec<_> = store.iter().map(|e| e.id.as_str()).collect();
    assert_eq!(ids, ["lagrange", "raviart-thomas"]);
    assert!(store.get("lagrange").is_some());

    std::fs::write(dir.path().join("broken.json"), "{").unwrap();
    assert!(ElementStore::load_dir(dir.path()).is_err());
}
