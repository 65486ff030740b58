mod common;

use std::str::FromStr;

use autoparse::{Decoded, ErrorKind, Value};
use bigdecimal::BigDecimal;
use common::*;
use indexmap::IndexMap;
use num_bigint::BigInt;
use rstest::rstest;
use serde_json::json;

#[rstest]
fn test_scalars_of_every_kind() {
    let decoded: TestObject = parse(
        r#"{
            "object": "TestObject",
            "myInt": -12,
            "myLong": "9000000000",
            "myDouble": 2.5e3,
            "myBool": true,
            "myChar": "q",
            "myDecimal": "1234.5600",
            "myBigInteger": 170141183460469231731687303715884105727,
            "boxedInt": 8
        }"#,
    );
    assert_eq!(decoded.my_int, -12);
    assert_eq!(decoded.my_long, 9_000_000_000);
    assert_eq!(decoded.my_double, 2500.0);
    assert!(decoded.my_bool);
    assert_eq!(decoded.my_char, 'q');
    assert_eq!(decoded.my_decimal, BigDecimal::from_str("1234.5600").unwrap());
    assert_eq!(
        decoded.my_big_integer,
        BigInt::from_str("170141183460469231731687303715884105727").unwrap()
    );
    assert_eq!(decoded.boxed_int, Some(8));
}

#[rstest]
#[case::tag_first(r#"{"object": "TestObject", "myInt": null, "myBool": null, "myChar": null, "boxedInt": null, "defaulted": null}"#)]
#[case::tag_last(r#"{"myInt": null, "myBool": null, "myChar": null, "boxedInt": null, "defaulted": null, "object": "TestObject"}"#)]
fn test_explicit_nulls(#[case] json: &str) {
    let decoded: TestObject = parse(json);
    assert_eq!(decoded.my_int, 0);
    assert!(!decoded.my_bool);
    assert_eq!(decoded.my_char, '\0');
    assert_eq!(decoded.boxed_int, None);
    assert_eq!(decoded.defaulted, None);
}

#[rstest]
fn test_absent_fields_keep_defaults() {
    let decoded: TestObject = parse(r#"{"object": "TestObject"}"#);
    assert_eq!(
        decoded,
        TestObject {
            object: Some("TestObject".to_string()),
            ..TestObject::default()
        }
    );
    assert_eq!(decoded.defaulted.as_deref(), Some("default"));
}

#[rstest]
#[case::first_alias(r#"{"object": "TestObject", "myString": "one"}"#, "one")]
#[case::second_alias(r#"{"myString2": "two", "object": "TestObject"}"#, "two")]
fn test_aliases_fill_the_same_field(#[case] json: &str, #[case] expected: &str) {
    let decoded: TestObject = parse(json);
    assert_eq!(decoded.my_string.as_deref(), Some(expected));
}

#[rstest]
#[case::beyond_i128("1234567890123456789012345678901234567890123")]
#[case::negative_beyond_i128("-340282366920938463463374607431768211457")]
#[case::quoted(r#""98765432109876543210987654321098765432109876543210""#)]
fn test_big_integer_beyond_fixed_width(#[case] literal: &str) {
    let decoded: TestObject = parse(&format!(
        r#"{{"myBigInteger": {literal}, "object": "TestObject"}}"#
    ));
    let expected = BigInt::from_str(literal.trim_matches('"')).unwrap();
    assert_eq!(decoded.my_big_integer, expected);
}

#[rstest]
#[case::wide_integer_part("123456789012345678901234567890.123456789")]
#[case::long_fraction("0.12345678901234567890123456789012345")]
#[case::trailing_zeros("1.000000000000000000000000000000000000")]
fn test_decimal_keeps_every_digit(#[case] literal: &str) {
    let decoded: TestObject = parse(&format!(
        r#"{{"object": "TestObject", "myDecimal": {literal}}}"#
    ));
    assert_eq!(decoded.my_decimal.to_plain_string(), literal);
}

#[rstest]
fn test_number_into_string_keeps_literal() {
    let decoded: TestObject = parse(r#"{"object": "TestObject", "myString": 1.50}"#);
    assert_eq!(decoded.my_string.as_deref(), Some("1.50"));
}

#[rstest]
#[case::tag_first(r#"{"object": "TestObject", "z": 1, "y": [1, {"object": "SimpleTestObject", "myInt": 2}], "x": {"k": "v"}}"#)]
#[case::tag_last(r#"{"z": 1, "y": [1, {"object": "SimpleTestObject", "myInt": 2}], "x": {"k": "v"}, "object": "TestObject"}"#)]
fn test_leftover_pairs_are_captured(#[case] json: &str) {
    let decoded: TestObject = parse(json);
    let extras = decoded.self_values.unwrap();
    assert_eq!(extras.keys().collect::<Vec<_>>(), vec!["z", "y", "x"]);
    assert_eq!(extras["z"], Decoded::from("1"));
    assert_eq!(
        extras["y"],
        Decoded::List(vec![
            Decoded::from("1"),
            Decoded::instance(SimpleTestObject {
                my_int: 2,
                my_string: None,
            }),
        ])
    );
    assert_eq!(extras["x"], Decoded::Json(Value::from(json!({"k": "v"}))));
}

#[rstest]
fn test_raw_catch_all_leaves_json_untouched() {
    let decoded: RawSelfValuesObject = parse(
        r#"{"name": "n", "list": [{"object": "SimpleTestObject"}], "object": "RawSelfValuesObject", "n": 3}"#,
    );
    assert_eq!(decoded.name.as_deref(), Some("n"));
    let extras = decoded.extras.unwrap();
    assert_eq!(
        extras["list"],
        Decoded::Json(Value::from(json!([{"object": "SimpleTestObject"}])))
    );
    assert_eq!(extras["n"], Decoded::from("3"));
}

#[rstest]
#[case::tag_first(true)]
#[case::tag_last(false)]
fn test_nested_collections_match_element_for_element(#[case] tag_first: bool) {
    let body = r#""nested": [[1, 2], [], [3]],
        "list": [{"object": "SimpleTestObject", "myInt": 1}, {"myInt": 2, "object": "SimpleTestObject"}],
        "childrenByName": {"b": {"object": "SimpleTestObject", "myInt": 5}, "a": null}"#;
    let json = if tag_first {
        format!(r#"{{"object": "TestObject", {body}}}"#)
    } else {
        format!(r#"{{{body}, "object": "TestObject"}}"#)
    };
    let decoded: TestObject = parse(&json);
    assert_eq!(decoded.nested, Some(vec![vec![1, 2], vec![], vec![3]]));

    let list = decoded.list.unwrap();
    assert_eq!(list.iter().map(|item| item.my_int).collect::<Vec<_>>(), vec![1, 2]);

    let children = decoded.children_by_name.unwrap();
    assert_eq!(children.keys().collect::<Vec<_>>(), vec!["b", "a"]);
    assert_eq!(children["b"].as_ref().map(|child| child.my_int), Some(5));
    assert_eq!(children["a"], None);
    assert_eq!(
        decoded.created_children,
        vec!["SimpleTestObject", "SimpleTestObject", "SimpleTestObject"]
    );
}

#[rstest]
fn test_null_inside_collections_is_kept() {
    let values: Vec<Option<SimpleTestObject>> =
        parse(r#"[null, {"object": "SimpleTestObject", "myInt": 1}, null]"#);
    assert_eq!(values.len(), 3);
    assert!(values[0].is_none());
    assert_eq!(values[1].as_ref().map(|v| v.my_int), Some(1));
    assert!(values[2].is_none());
}

#[rstest]
fn test_item_decoder_applies_to_untagged_elements() {
    let decoded: TestObject = parse(
        r#"{"explicitList": [{"value": "a"}, {"value": "b", "object": "Whatever"}], "object": "TestObject"}"#,
    );
    let items = decoded.explicit_list.unwrap();
    assert_eq!(items[0].value.as_deref(), Some("a"));
    assert_eq!(items[0].object, None);
    assert_eq!(items[1].value.as_deref(), Some("b"));
    assert_eq!(items[1].object.as_deref(), Some("Whatever"));
}

#[rstest]
fn test_raw_fields_keep_their_tags() {
    let decoded: TestObject = parse(
        r#"{"object": "TestObject", "raw": {"object": "SimpleTestObject", "a": [1]}, "rawList": [{"object": "SimpleTestObject"}, 2]}"#,
    );
    let raw = decoded.raw.unwrap();
    assert_eq!(raw["object"], Value::from("SimpleTestObject"));
    assert_eq!(
        decoded.raw_list,
        Some(vec![Value::from(json!({"object": "SimpleTestObject"})), Value::number("2")])
    );
}

#[rstest]
#[case::array(r#"[1, {"object": "SimpleTestObject", "myInt": 3}]"#, 2)]
#[case::scalar(r#""text""#, 0)]
fn test_wildcard_field_resolves_anything(#[case] value: &str, #[case] len: usize) {
    let decoded: TestObject = parse(&format!(r#"{{"wildcard": {value}, "object": "TestObject"}}"#));
    match decoded.wildcard {
        Decoded::List(items) => {
            assert_eq!(items.len(), len);
            assert_eq!(items[1].as_instance::<SimpleTestObject>().map(|s| s.my_int), Some(3));
        }
        Decoded::Text(text) => {
            assert_eq!(len, 0);
            assert_eq!(text, "text");
        }
        other => panic!("unexpected wildcard {other:?}"),
    }
}

#[rstest]
#[case::tag_first(r#"{"object": "TestObject", "myInt": true}"#)]
#[case::tag_last(r#"{"myInt": true, "object": "TestObject"}"#)]
fn test_wrong_token_kind_names_the_field(#[case] json: &str) {
    let err = parser().parse_str(json).unwrap_err();
    assert_eq!(err.kind, ErrorKind::UnexpectedTokenKind);
    assert_eq!(
        err.message,
        "Expected value of \"myInt\" to be one of \"[NUMBER, STRING, NULL]\" but found \"BOOLEAN\"."
    );
}

#[rstest]
fn test_stream_errors_carry_a_location() {
    let err = parser()
        .parse_str("{\"object\": \"TestObject\",\n \"myBool\": 1}")
        .unwrap_err();
    assert_eq!(err.kind, ErrorKind::UnexpectedTokenKind);
    let location = err.location.unwrap();
    assert_eq!(location.line, 2);
}

#[rstest]
#[case::number(r#"{"object": "TestObject", "myInt": "12x"}"#, ErrorKind::MalformedNumber)]
#[case::overflow(r#"{"object": "TestObject", "myInt": 3000000000}"#, ErrorKind::MalformedNumber)]
#[case::child(r#"{"object": "TestObject", "child": [1]}"#, ErrorKind::UnexpectedTokenKind)]
#[case::element(r#"{"object": "TestObject", "nested": [[1, "x"]]}"#, ErrorKind::MalformedNumber)]
fn test_conversion_failures(#[case] json: &str, #[case] kind: ErrorKind) {
    assert_eq!(parser().parse_str(json).unwrap_err().kind, kind);
}

#[rstest]
fn test_untyped_child_in_list_is_element_error() {
    let err = parser()
        .parse_str(r#"{"object": "TestObject", "list": [{"myInt": 1}]}"#)
        .unwrap_err();
    assert_eq!(err.kind, ErrorKind::UnconvertibleElement);
    assert_eq!(
        err.message,
        "Could not convert value in array at \"list\" to SimpleTestObject from JsonObject."
    );
}

#[rstest]
fn test_top_level_maps_and_lists() {
    let map: IndexMap<String, Vec<SimpleTestObject>> =
        parse(r#"{"x": [{"object": "SimpleTestObject", "myInt": 1}], "y": []}"#);
    assert_eq!(map["x"][0].my_int, 1);
    assert!(map["y"].is_empty());
}
