use defelement::element::ElementDescriptor;
use defelement::example::Example;
use defelement::implementations::{self, construct};
use defelement::points::lattice;
use defelement::settings::BridgeCommand;
use defelement::verification::{verify, DEFAULT_TOLERANCE};
use defelement::{NotImplementedReason, ReferenceCell, Settings, VerificationError};
use std::time::Duration;

fn interval_lagrange() -> ElementDescriptor {
    let json = r#"{
        "name": "Lagrange",
        "reference-cells": ["interval"],
        "examples": ["interval,1"],
        "implementations": {"symfem": "P", "basix": "P lagrange_variant=equispaced"}
    }"#;
    ElementDescriptor::from_json("lagrange", json).unwrap()
}

fn settings_with_bridge(library: &str, script: &str) -> Settings {
    Settings::default()
        .with_timeout(Duration::from_secs(10))
        .with_bridge(
            library,
            BridgeCommand::new("sh")
                .with_args(["-c", script])
                .with_version("0.0.1"),
        )
}

fn settings_with_script(script: &str) -> Settings {
    settings_with_bridge("basix", script)
}

fn construct_basix(
    settings: &Settings,
) -> Result<defelement::tabulation::VerificationData, VerificationError> {
    let example = Example::parse("interval,1").unwrap();
    construct(implementations::get("basix").unwrap(), &interval_lagrange(), &example, settings)
}

#[test]
fn bridge_output_is_compared_with_reference() {
    // Tabulates degree one Lagrange on the interval at x = 0 and x = 1
    let script = r#"
        input=$(cat)
        case "$input" in
            *points*) printf '{"entity_dofs": [[[0], [1]], [[]]], "value_size": 1, "table": [[[1.0, 0.0]], [[0.0, 1.0]]]}' ;;
            *) printf '{"entity_dofs": [[[0], [1]], [[]]]}' ;;
        esac
    "#;
    let settings = settings_with_script(script);
    let data = construct_basix(&settings).unwrap();
    assert_eq!(data.entity_dofs.dof_count(), 2);

    let points = lattice(ReferenceCell::Interval, 1);
    let tabulation = data.tabulate(&points).unwrap();
    let example = Example::parse("interval,1").unwrap();
    let reference =
        construct(implementations::reference(), &interval_lagrange(), &example, &settings).unwrap();
    let verdict = verify(
        ReferenceCell::Interval,
        (&data.entity_dofs, &tabulation),
        (&reference.entity_dofs, &reference.tabulate(&points).unwrap()),
        DEFAULT_TOLERANCE,
    )
    .unwrap();
    assert!(verdict.passed());

    // The canned table has two points, so any other point set is a bridge defect
    let result = data.tabulate(&lattice(ReferenceCell::Interval, 4));
    assert!(matches!(result, Err(VerificationError::MalformedInput(_))));
}

#[test]
fn bridge_reports_unsupported_constructions() {
    let settings = settings_with_script(r#"cat > /dev/null; printf '{"entity_dofs": [], "not_implemented": "no such variant"}'"#);
    assert_eq!(
        construct_basix(&settings).unwrap_err(),
        VerificationError::NotImplemented(NotImplementedReason::Unsupported(
            "no such variant".to_string()
        ))
    );
}

#[test]
fn failing_bridge_is_a_library_error() {
    let settings = settings_with_script("echo 'element exploded' >&2; exit 3");
    match construct_basix(&settings) {
        Err(VerificationError::Library(message)) => assert!(message.contains("element exploded")),
        other => panic!("unexpected result {other:?}"),
    }

    let settings = settings_with_script("printf 'not json'");
    assert!(matches!(construct_basix(&settings), Err(VerificationError::Library(_))));
}

#[test]
fn slow_bridge_is_killed() {
    let settings = settings_with_script("sleep 5").with_timeout(Duration::from_millis(200));
    assert_eq!(
        construct_basix(&settings).unwrap_err(),
        VerificationError::Timeout(Duration::from_millis(200))
    );
}

#[test]
fn fiat_quadrilateral_numbering_is_converted() {
    // Degree one on the quadrilateral in FIAT's numbering, where vertex 1 is (0, 1) and
    // vertex 2 is (1, 0), tabulated at (0, 0), (1, 0), (0, 1) and (1, 1)
    let script = r#"
        input=$(cat)
        case "$input" in
            *points*) printf '{"entity_dofs": [[[0], [1], [2], [3]], [[], [], [], []], [[]]], "table": [[[1, 0, 0, 0]], [[0, 0, 1, 0]], [[0, 1, 0, 0]], [[0, 0, 0, 1]]]}' ;;
            *) printf '{"entity_dofs": [[[0], [1], [2], [3]], [[], [], [], []], [[]]]}' ;;
        esac
    "#;
    let json = r#"{
        "name": "Lagrange",
        "reference-cells": ["quadrilateral"],
        "examples": ["quadrilateral,1"],
        "implementations": {"symfem": "P", "fiat": "Lagrange"}
    }"#;
    let element = ElementDescriptor::from_json("lagrange", json).unwrap();
    let example = Example::parse("quadrilateral,1").unwrap();
    let settings = settings_with_bridge("fiat", script);

    let data = construct(implementations::get("fiat").unwrap(), &element, &example, &settings)
        .unwrap();
    let vertex_dofs: Vec<&[usize]> = (0..4)
        .map(|v| data.entity_dofs.dofs(0, v).unwrap())
        .collect();
    assert_eq!(vertex_dofs, vec![&[0][..], &[2][..], &[1][..], &[3][..]]);

    let points = lattice(ReferenceCell::Quadrilateral, 1);
    let reference = construct(implementations::reference(), &element, &example, &settings)
        .unwrap();
    let verdict = verify(
        ReferenceCell::Quadrilateral,
        (&data.entity_dofs, &data.tabulate(&points).unwrap()),
        (&reference.entity_dofs, &reference.tabulate(&points).unwrap()),
        DEFAULT_TOLERANCE,
    )
    .unwrap();
    assert!(verdict.passed());
}

#[test]
fn basix_ufl_edges_and_faces_are_reversed() {
    let json = r#"{
        "name": "Lagrange",
        "reference-cells": ["triangle", "tetrahedron"],
        "examples": ["triangle,3", "tetrahedron,3"],
        "implementations": {"symfem": "P", "basix.ufl": "P lagrange_variant=equispaced"}
    }"#;
    let element = ElementDescriptor::from_json("lagrange", json).unwrap();
    let basix_ufl = implementations::get("basix.ufl").unwrap();

    // One DOF per vertex, two per edge and one per face, numbered entity by entity
    let script = r#"cat > /dev/null; printf '{"entity_dofs": [[[0], [1], [2]], [[3, 4], [5, 6], [7, 8]], [[9]]]}'"#;
    let settings = settings_with_bridge("basix.ufl", script);
    let example = Example::parse("triangle,3").unwrap();
    let data = construct(basix_ufl, &element, &example, &settings).unwrap();
    assert_eq!(data.entity_dofs.dofs(0, 1), Some(&[1][..]));
    assert_eq!(data.entity_dofs.dofs(1, 0), Some(&[7, 8][..]));
    assert_eq!(data.entity_dofs.dofs(1, 2), Some(&[3, 4][..]));
    assert_eq!(data.entity_dofs.dofs(2, 0), Some(&[9][..]));

    let script = r#"cat > /dev/null; printf '{"entity_dofs": [[[0], [1], [2], [3]], [[4, 5], [6, 7], [8, 9], [10, 11], [12, 13], [14, 15]], [[16], [17], [18], [19]], [[]]]}'"#;
    let settings = settings_with_bridge("basix.ufl", script);
    let example = Example::parse("tetrahedron,3").unwrap();
    let data = construct(basix_ufl, &element, &example, &settings).unwrap();
    assert_eq!(data.entity_dofs.dofs(1, 0), Some(&[14, 15][..]));
    assert_eq!(data.entity_dofs.dofs(1, 5), Some(&[4, 5][..]));
    assert_eq!(data.entity_dofs.dofs(2, 0), Some(&[19][..]));
    assert_eq!(data.entity_dofs.dofs(2, 3), Some(&[16][..]));
}
