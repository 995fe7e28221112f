use super::api::KeyPathParser;
use super::api::Rule;
use super::KeyPath;

use pest::consumes_to;
use pest::parses_to;

#[test]
fn test_identifier_segment() {
    parses_to! {
        parser: KeyPathParser,
        input: "_private$1",
        rule: Rule::identifier,
        tokens: [
            identifier(0, 10)
        ]
    };
}

#[test]
fn test_single_quoted_segment() {
    parses_to! {
        parser: KeyPathParser,
        input: "'b c'",
        rule: Rule::quoted_segment,
        tokens: [
            quoted_segment(0, 5, [
                single_quoted(1, 4)
            ])
        ]
    };
}

#[test]
fn test_double_quoted_segment() {
    parses_to! {
        parser: KeyPathParser,
        input: "\"x.y\"",
        rule: Rule::quoted_segment,
        tokens: [
            quoted_segment(0, 5, [
                double_quoted(1, 4)
            ])
        ]
    };
}

#[test]
fn test_index_segment() {
    parses_to! {
        parser: KeyPathParser,
        input: "42",
        rule: Rule::index_segment,
        tokens: [
            index_segment(0, 2)
        ]
    };
}

#[test]
fn test_dotted_path() {
    let path = KeyPath::parse("document.foo").unwrap();
    assert_eq!(path.segments(), &["document".to_string(), "foo".to_string()]);
    assert_eq!(path.parent(), &["document".to_string()]);
    assert_eq!(path.last(), Some("foo"));
}

#[test]
fn test_bracketed_path() {
    let path: KeyPath = "a['b c'][0].d".parse().unwrap();
    assert_eq!(
        path.segments(),
        &[
            "a".to_string(),
            "b c".to_string(),
            "0".to_string(),
            "d".to_string()
        ]
    );
}

#[test]
fn test_single_segment_has_empty_parent() {
    let path = KeyPath::parse("open").unwrap();
    assert!(path.parent().is_empty());
    assert_eq!(path.len(), 1);
}

#[test]
fn test_invalid_paths_are_rejected() {
    assert!(KeyPath::parse("").is_err());
    assert!(KeyPath::parse("1abc").is_err());
    assert!(KeyPath::parse("a..b").is_err());
    assert!(KeyPath::parse("a[b]").is_err());
    assert!(KeyPath::parse("a['b]").is_err());
}

#[test]
fn test_display_round_trips() {
    let path = KeyPath::from_segments(vec!["a", "b c", "0", "d"]);
    assert_eq!(path.to_string(), "a[\"b c\"][0].d");
    assert_eq!(KeyPath::parse(&path.to_string()).unwrap(), path);
}
