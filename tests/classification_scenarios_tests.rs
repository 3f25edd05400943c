// Copyright 2025 Cowboy AI, LLC.

mod support;

use cim_shapes::{
    classify, register_shapes, Bag, Catalogue, ClassifyError, Constructor, ExpectedType, RawField,
    RawShape, Symbol, TreeDescription, Value,
};
use support::*;
use test_case::test_case;

fn date_catalogue() -> Catalogue {
    let date = date_shape();
    register_shapes(&Catalogue::empty(), [&date]).unwrap()
}

#[test]
fn date_bag_constructs_date() {
    let catalogue = date_catalogue();
    let input = Bag::new().with("type", "Date").with("millis", 1234);

    let value = classify(&catalogue, &Value::from(input)).unwrap();
    let date = value.as_instance().unwrap().downcast_ref::<Date>().unwrap();
    assert_eq!(date, &Date { millis: 1234.0 });
}

#[test]
fn extra_key_is_disallowed() {
    let catalogue = date_catalogue();
    let input = Bag::new()
        .with("type", "Date")
        .with("millis", 1234)
        .with("extra", "x");

    let err = catalogue.classify(&Value::from(input)).unwrap_err();
    assert!(err.is_missing_shape());
    assert!(err.to_string().contains("disallowed key extra"));
}

#[test]
fn literal_mismatch_is_missing_shape() {
    let catalogue = date_catalogue();
    let input = Bag::new().with("type", "late").with("millis", 1234);

    let err = catalogue.classify(&Value::from(input)).unwrap_err();
    assert!(err.is_missing_shape());
    assert!(err.to_string().contains("expected literal \"Date\""));
}

#[test]
fn two_full_matches_are_ambiguous() {
    let first = keyed_shape("First", &["x"]);
    let second = keyed_shape("Second", &["x"]);
    let catalogue = Catalogue::empty().register([&first, &second]).unwrap();

    let err = catalogue
        .classify(&Value::from(Bag::new().with("x", 1)))
        .unwrap_err();
    match err {
        ClassifyError::AmbiguousShapes { first, second } => {
            assert!(first.starts_with("First#"));
            assert!(second.starts_with("Second#"));
        }
        other => panic!("expected ambiguity, got {other:?}"),
    }
}

#[test]
fn duplicate_registration_is_not_ambiguous() {
    let only = keyed_shape("Only", &["x"]);
    let catalogue = Catalogue::empty()
        .register([&only, &only])
        .unwrap()
        .register([&only])
        .unwrap();
    assert_eq!(catalogue.len(), 1);

    let value = catalogue
        .classify(&Value::from(Bag::new().with("x", 1)))
        .unwrap();
    assert_eq!(tag_of(&value), Some("Only"));
}

#[test]
fn ancestor_catalogue_is_unaffected_by_derivation() {
    let base = date_catalogue();
    let point = point_shape(counter());
    let derived = base.register([&point]).unwrap();
    let input = Value::from(Bag::new().with("x", 1).with("y", 2));

    assert!(base.classify(&input).unwrap_err().is_missing_shape());
    assert!(derived.classify(&input).is_ok());
    assert_eq!(base.len(), 1);
    assert_eq!(derived.len(), 2);
}

#[test]
fn nested_bags_are_classified_bottom_up() {
    let point = point_shape(counter());
    let circle = circle_shape();
    let catalogue = Catalogue::empty().register([&point, &circle]).unwrap();
    let input = Bag::new()
        .with("center", Bag::new().with("x", 3).with("y", 4))
        .with("radius", 5);

    let value = catalogue.classify(&Value::from(input)).unwrap();
    let circle = value.as_instance().unwrap().downcast_ref::<Circle>().unwrap();
    assert_eq!(circle.radius, 5.0);
    let center = circle.center.as_instance().unwrap().downcast_ref::<Point>().unwrap();
    assert_eq!(center, &Point { x: 3.0, y: 4.0 });
}

#[test]
fn nested_miss_is_reported_at_its_path() {
    let point = point_shape(counter());
    let circle = circle_shape();
    let catalogue = Catalogue::empty().register([&point, &circle]).unwrap();
    let input = Bag::new()
        .with("center", Bag::new().with("x", 3).with("z", 4))
        .with("radius", 5);

    let err = catalogue.classify(&Value::from(input)).unwrap_err();
    assert!(err.is_missing_shape());
    assert!(err.to_string().contains("$.center"));
}

#[test]
fn defaults_fill_absent_fields() {
    let sized = RawShape::of(Constructor::new("Sized", |_args: Vec<Value>| Ok(Tagged("Sized"))))
        .field("kind", RawField::literal("sized"))
        .field("size", RawField::typed(ExpectedType::Number).default_value(10))
        .build_arguments(|fields, _, _| {
            assert_eq!(fields.number("size"), Some(10.0));
            Ok(Some(vec![]))
        });
    let catalogue = Catalogue::empty().register([&sized]).unwrap();

    let value = catalogue
        .classify(&Value::from(Bag::new().with("kind", "sized")))
        .unwrap();
    assert_eq!(tag_of(&value), Some("Sized"));
}

#[test]
fn builder_returning_none_rejects_the_shape() {
    let picky = RawShape::of(Constructor::new("Picky", |_args: Vec<Value>| Ok(Tagged("Picky"))))
        .field("n", RawField::typed(ExpectedType::Number))
        .build_arguments(|fields, _, _| {
            Ok((fields.number("n").unwrap_or_default() > 0.0).then(Vec::new))
        });
    let catalogue = Catalogue::empty().register([&picky]).unwrap();

    assert!(catalogue.classify(&Value::from(Bag::new().with("n", 1))).is_ok());
    let err = catalogue
        .classify(&Value::from(Bag::new().with("n", -1)))
        .unwrap_err();
    assert!(err.to_string().contains("could not compute constructor arguments"));
}

#[test]
fn literal_values_route_to_their_shape() {
    let circle = RawShape::of(Constructor::new("CircleTag", |_args: Vec<Value>| Ok(Tagged("CircleTag"))))
        .field("kind", RawField::literal("circle"))
        .field("size", RawField::new())
        .build_arguments(|_, _, _| Ok(Some(vec![])));
    let square = RawShape::of(Constructor::new("SquareTag", |_args: Vec<Value>| Ok(Tagged("SquareTag"))))
        .field("kind", RawField::literal("square"))
        .field("size", RawField::new())
        .build_arguments(|_, _, _| Ok(Some(vec![])));
    let catalogue = Catalogue::empty().register([&circle, &square]).unwrap();

    for (kind, expected) in [("circle", "CircleTag"), ("square", "SquareTag")] {
        let input = Bag::new().with("kind", kind).with("size", 2);
        let value = catalogue.classify(&Value::from(input)).unwrap();
        assert_eq!(tag_of(&value), Some(expected));
    }
    let err = catalogue
        .classify(&Value::from(Bag::new().with("kind", "hexagon").with("size", 2)))
        .unwrap_err();
    assert!(err.is_missing_shape());
}

#[test]
fn optional_fields_may_be_omitted() {
    let labelled = RawShape::of(Constructor::new("Labelled", |_args: Vec<Value>| Ok(Tagged("Labelled"))))
        .field("id", RawField::typed(ExpectedType::Number))
        .field("label", RawField::typed(ExpectedType::String).optional())
        .build_arguments(|fields, _, _| Ok(Some(vec![fields.get("id").cloned().unwrap_or_default()])));
    let catalogue = Catalogue::empty().register([&labelled]).unwrap();

    assert!(catalogue.classify(&Value::from(Bag::new().with("id", 1))).is_ok());
    assert!(catalogue
        .classify(&Value::from(Bag::new().with("id", 1).with("label", "one")))
        .is_ok());
    assert!(catalogue
        .classify(&Value::from(Bag::new().with("label", "one")))
        .unwrap_err()
        .is_missing_shape());
}

#[test]
fn symbol_keys_are_matched_by_identity() {
    let marker = Symbol::new("marker");
    let marked = RawShape::of(Constructor::new("Marked", |_args: Vec<Value>| Ok(Tagged("Marked"))))
        .field(marker.clone(), RawField::new())
        .build_arguments(|_, _, _| Ok(Some(vec![])));
    let catalogue = Catalogue::empty().register([&marked]).unwrap();

    let hit = Bag::new().with(marker, true);
    assert_eq!(tag_of(&catalogue.classify(&Value::from(hit)).unwrap()), Some("Marked"));

    let lookalike = Bag::new().with(Symbol::new("marker"), true);
    assert!(catalogue.classify(&Value::from(lookalike)).is_err());
}

#[test]
fn json_input_is_classified() {
    let date = date_shape();
    let point = point_shape(counter());
    let segment = segment_shape();
    let catalogue = Catalogue::empty().register([&date, &point, &segment]).unwrap();
    let json = serde_json::json!({
        "from": {"x": 0, "y": 0},
        "to": {"x": 3, "y": 4},
    });

    let value = catalogue.classify(&Value::from(json)).unwrap();
    let segment = value.as_instance().unwrap().downcast_ref::<Segment>().unwrap();
    let to = segment.to.as_instance().unwrap().downcast_ref::<Point>().unwrap();
    assert_eq!(to, &Point { x: 3.0, y: 4.0 });
}

#[test]
fn reserved_key_in_input_is_ignored() {
    let catalogue = date_catalogue();
    let input = Bag::new()
        .with("type", "Date")
        .with("millis", 1)
        .with("__proto__", Bag::new().with("admin", true));

    assert!(catalogue.classify(&Value::from(input)).is_ok());
}

#[test]
fn primitives_and_instances_pass_through() {
    let catalogue = date_catalogue();
    assert_eq!(catalogue.classify(&Value::from(7)).unwrap(), Value::from(7));
    assert_eq!(catalogue.classify(&Value::Null).unwrap(), Value::Null);

    let date = date_constructor().construct(vec![Value::from(1)]).unwrap();
    let again = catalogue.classify(&date).unwrap();
    assert_eq!(again, date);
}

#[test_case(&["a"], "A" ; "single key")]
#[test_case(&["a", "b"], "AB" ; "two keys")]
#[test_case(&["b", "c"], "BC" ; "disjoint pair")]
#[test_case(&[], "Empty" ; "empty bag")]
fn key_sets_select_one_shape(keys: &[&str], expected: &str) {
    let shapes = [
        keyed_shape("A", &["a"]),
        keyed_shape("AB", &["a", "b"]),
        keyed_shape("BC", &["b", "c"]),
        keyed_shape("Empty", &[]),
    ];
    let catalogue = Catalogue::empty().register(&shapes).unwrap();

    let input = keys.iter().fold(Bag::new(), |bag, key| bag.with(*key, 1));
    let value = catalogue.classify(&Value::from(input)).unwrap();
    assert_eq!(tag_of(&value), Some(expected));
}

#[test_case(&["c"] ; "partial key set")]
#[test_case(&["a", "c"] ; "mixed key set")]
#[test_case(&["z"] ; "unknown key")]
fn unmatched_key_sets_are_missing(keys: &[&str]) {
    let shapes = [
        keyed_shape("A", &["a"]),
        keyed_shape("AB", &["a", "b"]),
        keyed_shape("BC", &["b", "c"]),
    ];
    let catalogue = Catalogue::empty().register(&shapes).unwrap();

    let input = keys.iter().fold(Bag::new(), |bag, key| bag.with(*key, 1));
    let err = catalogue.classify(&Value::from(input)).unwrap_err();
    assert!(err.is_missing_shape());
}

#[test]
fn optional_keys_dispatch_through_may_have() {
    let shapes = [
        RawShape::of(Constructor::new("WithColor", |_args: Vec<Value>| Ok(Tagged("WithColor"))))
            .field("id", RawField::new())
            .field("color", RawField::new().optional())
            .build_arguments(|_, _, _| Ok(Some(vec![]))),
        RawShape::of(Constructor::new("WithSize", |_args: Vec<Value>| Ok(Tagged("WithSize"))))
            .field("id", RawField::new())
            .field("size", RawField::new().optional())
            .build_arguments(|_, _, _| Ok(Some(vec![]))),
    ];
    let catalogue = Catalogue::empty().register(&shapes).unwrap();
    assert!(matches!(catalogue.describe_tree(), TreeDescription::MayHave { .. }));

    for (key, expected) in [("color", "WithColor"), ("size", "WithSize")] {
        let input = Bag::new().with("id", 1).with(key, 2);
        let value = catalogue.classify(&Value::from(input)).unwrap();
        assert_eq!(tag_of(&value), Some(expected));
    }

    // both shapes accept a bag with neither optional key
    let err = catalogue
        .classify(&Value::from(Bag::new().with("id", 1)))
        .unwrap_err();
    assert!(err.is_ambiguous());
}
