use std::collections::BTreeMap;

use ogcfilter::model::{
    BetweenComparisonOperator, BinaryComparisonName, BinaryComparisonOperator, Boundary,
    ComparisonOperator, MatchAction,
};
use ogcfilter::{
    FesError, FesXmlParser, FesXmlSerializer, Filter, Function, Literal, Node, Operator, Value,
    ValueReference,
};

fn fixture(name: &str) -> Filter {
    let xml = std::fs::read_to_string(format!("fixture/{name}")).unwrap();
    FesXmlParser::new().parse(&xml).unwrap()
}

fn reparse(filter: &Filter) -> Filter {
    let xml = FesXmlSerializer::new().serialize(filter.clone()).unwrap();
    FesXmlParser::new().parse(&xml).unwrap()
}

#[test]
fn binary_comparisons_round_trip() {
    let pairs = [
        ("name", Literal::new("dummy")),
        ("DEPTH", Literal::new(30)),
        ("ratio", Literal::new(0.25)),
        ("ns:flag", Literal::new(true)),
        ("when", Literal::new("2005-05-19")),
        ("geom", Literal::new("POINT (1 2)")),
        ("count", Literal::with_type(7, "xs:long")),
    ];
    let serializer = FesXmlSerializer::new();
    for name in BinaryComparisonName::ALL {
        for (property, literal) in &pairs {
            for (match_case, match_action) in [(true, MatchAction::Any), (false, MatchAction::All)]
            {
                let operator = BinaryComparisonOperator::new(
                    *name,
                    ValueReference::new(*property).unwrap(),
                    literal.clone(),
                )
                .unwrap()
                .with_match_case(match_case)
                .with_match_action(match_action);
                assert_eq!(operator.operator_type, *name);

                let xml = serializer.serialize(operator.clone()).unwrap();
                assert_eq!(
                    serializer.deserialize(&xml).unwrap(),
                    Node::from(operator),
                    "{xml}"
                );
            }
        }
    }
}

#[test]
fn between_keeps_both_boundaries() {
    let between = BetweenComparisonOperator::new(
        ValueReference::new("DEPTH").unwrap(),
        Boundary::lower(Literal::new(1)).unwrap(),
        Boundary::upper(Literal::new(10)).unwrap(),
    )
    .unwrap();
    let filter = reparse(&Filter::new(between.clone()).unwrap());
    match filter.predicate() {
        Operator::Comparison(ComparisonOperator::Between(parsed)) => {
            assert_eq!(parsed.lower_boundary().expression, Literal::new(1).into());
            assert_eq!(parsed.upper_boundary().expression, Literal::new(10).into());
            assert_eq!(parsed, &between);
        }
        other => panic!("unexpected {other:?}"),
    }
}

#[test]
fn fixtures_round_trip() {
    for name in [
        "equal_to.xml",
        "between.xml",
        "logical.xml",
        "during.xml",
        "resource_id.xml",
    ] {
        let filter = fixture(name);
        assert_eq!(reparse(&filter), filter, "{name}");
    }
}

#[test]
fn gml_geometry_operands_are_unsupported() {
    let filter = fixture("intersects.xml");
    assert!(matches!(
        FesXmlSerializer::new().serialize(filter),
        Err(FesError::Unsupported(_))
    ));
}

#[test]
fn typed_literals_that_would_change_are_refused() {
    let serializer = FesXmlSerializer::new();
    for literal in [
        Literal::with_type("30", "xs:int"),
        Literal::with_type(2.5, "xs:string"),
    ] {
        let operator = BinaryComparisonOperator::new(
            BinaryComparisonName::PropertyIsEqualTo,
            ValueReference::new("DEPTH").unwrap(),
            literal,
        )
        .unwrap();
        assert!(matches!(
            serializer.serialize(Filter::new(operator).unwrap()),
            Err(FesError::Serialization(_))
        ));
    }

    // Same text, matching value kind.
    let filter = Filter::new(
        BinaryComparisonOperator::new(
            BinaryComparisonName::PropertyIsEqualTo,
            ValueReference::new("DEPTH").unwrap(),
            Literal::with_type(30, "xs:int"),
        )
        .unwrap(),
    )
    .unwrap();
    assert_eq!(reparse(&filter), filter);
}

#[test]
fn functions_round_trip() {
    let mut function = Function::new("strSubstring").unwrap();
    function.add_argument(ValueReference::new("name").unwrap()).unwrap();
    function.add_argument(Literal::new(0)).unwrap();
    function.add_argument(Literal::new(3)).unwrap();
    let serializer = FesXmlSerializer::new();
    let xml = serializer.serialize(function.clone()).unwrap();
    assert_eq!(serializer.deserialize(&xml).unwrap(), Node::from(function));
}

#[test]
fn function_arguments_must_be_expressions() {
    let mut function = Function::new("f").unwrap();
    let bad: Vec<Node> = vec![
        Node::from("a"),
        Node::from(1),
        Node::Value(Value::Null),
        Node::from(vec![Value::from(1), Value::from(2)]),
        Node::from(BTreeMap::from([("k".to_string(), Value::from("v"))])),
    ];
    for node in bad {
        assert!(matches!(
            function.add_argument(node),
            Err(FesError::InvalidExpression(_))
        ));
    }
    assert!(function.arguments().is_empty());
}

#[test]
fn boundaries_reject_the_wrong_slot() {
    let lower = Boundary::lower(Literal::new(1)).unwrap();
    let upper = Boundary::upper(Literal::new(10)).unwrap();
    let mut between = BetweenComparisonOperator::new(
        ValueReference::new("d").unwrap(),
        lower.clone(),
        upper.clone(),
    )
    .unwrap();

    assert!(matches!(
        between.set_upper_boundary(lower.clone()),
        Err(FesError::InvalidBoundaryType { .. })
    ));
    assert!(matches!(
        between.set_lower_boundary(upper.clone()),
        Err(FesError::InvalidBoundaryType { .. })
    ));
    // Failed assignments leave the operator as it was.
    assert_eq!(between.lower_boundary(), &lower);
    assert_eq!(between.upper_boundary(), &upper);
}
