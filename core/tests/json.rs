use assert_matches::assert_matches;
use cowjson_core::{parse, stringify, FormatFlags, Kind, ParseStatus, Value};
use pretty_assertions::assert_eq;

fn status_of(input: &str) -> ParseStatus {
    parse(input.as_bytes()).1.status
}

#[test]
fn parse_document() {
    let (value, result) = parse(
        br#"{
            "name": "server",
            "ports": [8080, 8081],
            "ratio": 0.25,
            "offset": -12,
            "enabled": true,
            "parent": null
        }"#,
    );

    assert_eq!(result.status, ParseStatus::NoError);
    assert!(value.is_object());
    assert_eq!(value["name"].to_str(), Some("server"));
    assert_eq!(value["ports"].count(), 2);
    assert_eq!(value["ports"][1].to_u16(), 8081);
    assert!(value["ratio"].is_double());
    assert_eq!(value["offset"].to_i64(), -12);
    assert!(value["enabled"].to_bool());
    assert!(value["parent"].is_null());
    assert!(value.contains_key("parent"));
}

#[test]
fn parsed_strings_derive_views() {
    let value = Value::from_json(br#"["42", "on", "0x1f"]"#).unwrap();

    assert!(value[0].is_string());
    #[cfg(feature = "autocast-strings")]
    {
        assert_eq!(value[0].to_u64(), 42);
        assert!(value[1].to_bool());
        assert_eq!(value[2].to_u64(), 31);
    }
}

#[test]
fn trailing_data() {
    let input = b"[1, 2]  \n  {}";
    let (value, result) = parse(input);

    assert_eq!(result.status, ParseStatus::MoreData);
    assert!(result.is_ok());
    assert_eq!(result.offset, 11);
    assert_eq!((result.row, result.col), (2, 3));
    assert_eq!(value.count(), 2);

    let err = Value::from_json(input).unwrap_err();
    assert_eq!(err.status, ParseStatus::MoreData);
}

#[test]
fn trailing_whitespace_is_fine() {
    let (value, result) = parse(b" true \r\n\t");

    assert_eq!(result.status, ParseStatus::NoError);
    assert!(value.to_bool());
}

#[test]
fn failures_are_classified() {
    assert_eq!(status_of(""), ParseStatus::EndOfData);
    assert_eq!(status_of("   "), ParseStatus::EndOfData);
    assert_eq!(status_of("[1, 2"), ParseStatus::EndOfData);
    assert_eq!(status_of(r#"{"a": "b"#), ParseStatus::EndOfData);
    assert_eq!(status_of(r#"{"a" 1}"#), ParseStatus::ColonExpected);
    assert_eq!(status_of("[1 2]"), ParseStatus::SquareBracketExpected);
    assert_eq!(status_of(r#"{"a": 1 "b": 2}"#), ParseStatus::CurlyBracketExpected);
    assert_eq!(status_of("{1: 2}"), ParseStatus::InvalidName);
    assert_eq!(status_of(r#"{"": 2}"#), ParseStatus::InvalidName);
    assert_eq!(status_of(r#"{"a": 1, "a": 2}"#), ParseStatus::DuplicateName);
    assert_eq!(status_of("[01]"), ParseStatus::InvalidNumber);
    assert_eq!(status_of("[1e999]"), ParseStatus::InvalidNumber);
    assert_eq!(status_of("[@]"), ParseStatus::InvalidCharacter);
}

#[test]
fn failures_are_located() {
    let (value, result) = parse(b"{\n  \"a\": 1,\n  \"a\": 2\n}");

    assert_eq!(result.status, ParseStatus::DuplicateName);
    assert!(!result.is_ok());
    assert_eq!(result.row, 3);
    assert!(value.is_undefined());

    let err = result.into_result().unwrap_err();
    assert!(err.to_string().starts_with("duplicate name of object field at line 3"));
}

#[test]
fn nested_duplicates_are_rejected() {
    assert_matches!(
        Value::from_json(br#"{"a": {"b": 1, "b": 1}}"#),
        Err(err) if err.status == ParseStatus::DuplicateName
    );
    assert!(Value::from_json(br#"[{"b": 1}, {"b": 1}]"#).is_ok());
}

#[test]
fn stringify_round_trip() {
    let input = br#"{"a":[1,-2,2.5,"x\"y",null,true],"b":{"c":{}},"d":[]}"#;
    let value = Value::from_json(input).unwrap();

    assert_eq!(stringify(&value, FormatFlags::COMPACT), input.to_vec());
    assert_eq!(
        Value::from_json(&stringify(&value, FormatFlags::MAX_READABLE)).unwrap(),
        value
    );
}

#[test]
fn stringify_max_readable() {
    let value = Value::from_json(br#"{"list":[1],"name":"n","empty":{}}"#).unwrap();

    assert_eq!(
        String::from_utf8(stringify(&value, FormatFlags::MAX_READABLE)).unwrap(),
        "{\n\t\"name\":  \"n\",\n\t\"empty\": {},\n\t\"list\":  [1]\n}"
    );
}

#[test]
fn undefined_serializes_as_null() {
    let mut value = Value::null();
    value["missing"] = Value::undefined();

    assert_eq!(stringify(&value, FormatFlags::COMPACT), br#"{"missing":null}"#.to_vec());
}

#[test]
fn serde_json_bridge() {
    let original = serde_json::json!({
        "big": u64::MAX,
        "small": i64::MIN,
        "list": [1.5, "s", false],
    });

    let value = Value::from(original.clone());
    assert_eq!(value["big"].to_u64(), u64::MAX);
    assert_eq!(value["small"].to_i64(), i64::MIN);
    assert_eq!(value["list"][0].kind(), Kind::Double);

    assert_eq!(serde_json::Value::from(&value), original);
    assert_eq!(serde_json::to_value(&value).unwrap(), original);
    assert_eq!(serde_json::from_value::<Value>(original).unwrap(), value);
}
