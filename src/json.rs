//! Pure JSON transforms: parse, format, minify, clean, and JSONPath queries.
//!
//! Every function here is deterministic and side-effect free. Parsing is
//! delegated to `serde_json` (compiled with `preserve_order`, so object key
//! order survives a round trip); failures are converted into [`JsonError`]
//! and never escape as panics.

use serde::Serialize;
use serde_json::ser::PrettyFormatter;
use serde_json::{Map, Value};

use crate::error::JsonError;
use crate::jsonpath::Query;
use crate::options::{CleanOptions, CleanOutput, FormatOptions, MinifyOptions};

/// Parses `input` into a JSON value.
///
/// Blank input (after trimming) is an input error with a fixed message, not
/// a syntax error. Syntax failures keep the parser's diagnostic and its
/// best-effort line number.
pub fn parse(input: &str) -> Result<Value, JsonError> {
    if input.trim().is_empty() {
        return Err(JsonError::empty_input());
    }
    serde_json::from_str(input).map_err(JsonError::from)
}

/// Pretty-prints `input` with the configured indent unit, optionally sorting
/// object keys recursively.
pub fn format(input: &str, options: &FormatOptions) -> Result<String, JsonError> {
    let mut value = parse(input)?;
    if options.sort_keys {
        value = sort_keys(value);
    }
    to_pretty(&value, &options.indent.as_bytes())
}

/// Compacts `input`, optionally sorting object keys recursively.
///
/// With `remove_spaces` disabled the value is still re-serialized, just with
/// a minimal one-space indent; the point of that mode is structural
/// normalization rather than size.
pub fn minify(input: &str, options: &MinifyOptions) -> Result<String, JsonError> {
    let mut value = parse(input)?;
    if options.sort_keys {
        value = sort_keys(value);
    }
    if options.remove_spaces {
        serde_json::to_string(&value).map_err(JsonError::from)
    } else {
        to_pretty(&value, b" ")
    }
}

/// Rebuilds `value` with object keys in lexicographic order at every level.
///
/// Arrays keep their element order; primitives pass through unchanged.
pub fn sort_keys(value: Value) -> Value {
    match value {
        Value::Object(map) => {
            let mut entries: Vec<(String, Value)> = map.into_iter().collect();
            entries.sort_by(|(a, _), (b, _)| a.cmp(b));
            let mut sorted = Map::new();
            for (key, child) in entries {
                sorted.insert(key, sort_keys(child));
            }
            Value::Object(sorted)
        }
        Value::Array(items) => Value::Array(items.into_iter().map(sort_keys).collect()),
        other => other,
    }
}

/// Strips values matching the enabled emptiness predicates and re-serializes.
///
/// Children are cleaned before their container is tested, so a container that
/// becomes empty because of cleaning is itself removable when the matching
/// `remove_empty_*` flag is set. A root that is removed entirely yields
/// `Ok("")`; becoming empty is a successful outcome, not an error.
pub fn clean(input: &str, options: &CleanOptions) -> Result<String, JsonError> {
    let value = parse(input)?;
    let cleaned = match clean_value(value, options) {
        Some(value) => value,
        None => return Ok(String::new()),
    };
    match options.output {
        CleanOutput::Format => to_pretty(&cleaned, &FormatOptions::default().indent.as_bytes()),
        CleanOutput::Minify => serde_json::to_string(&cleaned).map_err(JsonError::from),
    }
}

fn clean_value(value: Value, options: &CleanOptions) -> Option<Value> {
    match value {
        Value::Null if options.remove_null => None,
        Value::String(text) => {
            if options.remove_undefined && text == "undefined" {
                None
            } else if options.remove_empty_string && text.is_empty() {
                None
            } else {
                Some(Value::String(text))
            }
        }
        Value::Array(items) => {
            let kept: Vec<Value> = items
                .into_iter()
                .filter_map(|item| clean_value(item, options))
                .collect();
            if kept.is_empty() && options.remove_empty_array {
                None
            } else {
                Some(Value::Array(kept))
            }
        }
        Value::Object(map) => {
            let mut kept = Map::new();
            for (key, child) in map {
                if let Some(child) = clean_value(child, options) {
                    kept.insert(key, child);
                }
            }
            if kept.is_empty() && options.remove_empty_object {
                None
            } else {
                Some(Value::Object(kept))
            }
        }
        other => Some(other),
    }
}

/// Evaluates a JSONPath `expression` against `input` and serializes the
/// matches with a two-space indent.
///
/// Definite paths (name and index selectors only) yield the single matched
/// value, or `Ok("")` when nothing matches; an empty result is a successful
/// outcome, distinct from a hard failure. Paths containing wildcard,
/// descendant, slice, or union selectors yield the array of all matches.
pub fn json_path(input: &str, expression: &str) -> Result<String, JsonError> {
    if input.trim().is_empty() {
        return Err(JsonError::empty_input());
    }
    if expression.trim().is_empty() {
        return Err(JsonError::empty_expression());
    }

    let value = parse(input)?;
    let query = Query::parse(expression.trim())?;
    let matches = query.evaluate(&value);

    if query.is_definite() {
        match matches.first() {
            Some(found) => to_pretty(found, b"  "),
            None => Ok(String::new()),
        }
    } else {
        let collected: Vec<Value> = matches.into_iter().cloned().collect();
        to_pretty(&Value::Array(collected), b"  ")
    }
}

fn to_pretty(value: &Value, indent: &[u8]) -> Result<String, JsonError> {
    let mut out = Vec::new();
    let formatter = PrettyFormatter::with_indent(indent);
    let mut serializer = serde_json::Serializer::with_formatter(&mut out, formatter);
    value.serialize(&mut serializer)?;
    String::from_utf8(out).map_err(|err| JsonError::new(err.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::options::Indent;

    #[test]
    fn parse_rejects_blank_input() {
        assert_eq!(parse("   \n\t").unwrap_err(), JsonError::empty_input());
    }

    #[test]
    fn parse_reports_syntax_line() {
        let err = parse("{\n\"a\": 1,\n}").unwrap_err();
        assert_eq!(err.line, Some(3));
    }

    #[test]
    fn format_sorts_keys_when_asked() {
        let options = FormatOptions { sort_keys: true, ..Default::default() };
        let out = format(r#"{"b":1,"a":2}"#, &options).unwrap();
        assert_eq!(out, "{\n  \"a\": 2,\n  \"b\": 1\n}");
    }

    #[test]
    fn format_preserves_key_order_by_default() {
        let out = format(r#"{"b":1,"a":2}"#, &FormatOptions::default()).unwrap();
        assert_eq!(out, "{\n  \"b\": 1,\n  \"a\": 2\n}");
    }

    #[test]
    fn format_with_tab_indent() {
        let options = FormatOptions { indent: Indent::Tab, ..Default::default() };
        let out = format(r#"{"a":1}"#, &options).unwrap();
        assert_eq!(out, "{\n\t\"a\": 1\n}");
    }

    #[test]
    fn minify_compacts() {
        let out = minify("{\n  \"a\": 1\n}", &MinifyOptions::default()).unwrap();
        assert_eq!(out, r#"{"a":1}"#);
    }

    #[test]
    fn minify_is_idempotent() {
        let once = minify("{ \"a\": [1, 2],  \"b\": {} }", &MinifyOptions::default()).unwrap();
        let twice = minify(&once, &MinifyOptions::default()).unwrap();
        assert_eq!(once, twice);
    }

    #[test]
    fn minify_without_removing_spaces_uses_one_space_indent() {
        let options = MinifyOptions { remove_spaces: false, ..Default::default() };
        let out = minify(r#"{"a":1}"#, &options).unwrap();
        assert_eq!(out, "{\n \"a\": 1\n}");
    }

    #[test]
    fn sort_keys_recurses_into_arrays() {
        let value = parse(r#"[{"b":1,"a":{"d":4,"c":3}}]"#).unwrap();
        let sorted = sort_keys(value);
        assert_eq!(
            serde_json::to_string(&sorted).unwrap(),
            r#"[{"a":{"c":3,"d":4},"b":1}]"#
        );
    }

    #[test]
    fn clean_removes_nulls_by_default() {
        let out = clean(r#"{"a":1,"b":null}"#, &CleanOptions::default()).unwrap();
        let value = parse(&out).unwrap();
        assert_eq!(value, serde_json::json!({"a": 1}));
    }

    #[test]
    fn clean_keeps_emptied_containers_unless_enabled() {
        let input = r#"{"a":{"b":null},"c":[null]}"#;
        let out = clean(input, &CleanOptions::default()).unwrap();
        assert_eq!(parse(&out).unwrap(), serde_json::json!({"a": {}, "c": []}));

        let options = CleanOptions {
            remove_empty_array: true,
            remove_empty_object: true,
            ..Default::default()
        };
        let out = clean(input, &options).unwrap();
        // The root object itself empties out, so the result is empty too.
        assert_eq!(out, "");
    }

    #[test]
    fn clean_strips_undefined_sentinel() {
        let out = clean(r#"{"a":"undefined","b":"","c":"x"}"#, &CleanOptions::default()).unwrap();
        assert_eq!(parse(&out).unwrap(), serde_json::json!({"c": "x"}));
    }

    #[test]
    fn clean_minify_output() {
        let options = CleanOptions { output: CleanOutput::Minify, ..Default::default() };
        let out = clean(r#"{"a": 1, "b": null}"#, &options).unwrap();
        assert_eq!(out, r#"{"a":1}"#);
    }

    #[test]
    fn json_path_wildcard_yields_array() {
        let out = json_path(
            r#"{"users":[{"name":"A"},{"name":"B"}]}"#,
            "$.users[*].name",
        )
        .unwrap();
        assert_eq!(out, "[\n  \"A\",\n  \"B\"\n]");
    }

    #[test]
    fn json_path_definite_yields_single_value() {
        let out = json_path(r#"{"a":{"b":42}}"#, "$.a.b").unwrap();
        assert_eq!(out, "42");
    }

    #[test]
    fn json_path_no_match_is_empty_success() {
        let out = json_path(r#"{"a":1}"#, "$.missing").unwrap();
        assert_eq!(out, "");
    }

    #[test]
    fn json_path_rejects_blank_pieces() {
        assert_eq!(json_path("", "$.a").unwrap_err(), JsonError::empty_input());
        assert_eq!(
            json_path(r#"{"a":1}"#, "  ").unwrap_err(),
            JsonError::empty_expression()
        );
    }

    #[test]
    fn round_trip_preserves_structure() {
        let input = r#"{"b":[1,2.5,null,"x"],"a":{"nested":true},"c":"é"}"#;
        let formatted = format(input, &FormatOptions::default()).unwrap();
        let minified = minify(&formatted, &MinifyOptions::default()).unwrap();
        assert_eq!(parse(&minified).unwrap(), parse(input).unwrap());
    }
}
