use defelement::example::{Example, ParamValue};

#[test]
fn examples_parse_from_str() {
    let example: Example = "tetrahedron, 2, lobatto".parse().unwrap();
    assert_eq!(example.cell(), "tetrahedron");
    assert_eq!(example.degree(), 2);
    assert_eq!(example.variant(), Some("lobatto"));
    assert_eq!(example.raw(), "tetrahedron, 2, lobatto");
}

#[test]
fn keyword_values_render_and_serialize() {
    let example = Example::parse("triangle,1 {order=2,name=abc,nested=[1,[2,x]]}").unwrap();
    let kwargs = example.kwargs();
    assert_eq!(kwargs["order"].to_string(), "2");
    assert_eq!(kwargs["name"].to_string(), "abc");
    assert_eq!(kwargs["nested"].to_string(), "[1, [2, x]]");
    assert_eq!(
        serde_json::to_string(&kwargs["nested"]).unwrap(),
        r#"[1,[2,"x"]]"#
    );
    assert_eq!(kwargs["order"], ParamValue::Int(2));
}

#[test]
fn parse_errors_name_the_example() {
    let error = Example::parse("triangle,x").unwrap_err();
    assert!(error.to_string().starts_with("invalid example \"triangle,x\""));
}
