//! Unit tests for template numbering and snippet conversion.

use crate::errors::errors::ErrorImpl;

use super::{
    numbering::{number, NumberingRegistry, PlaceholderKey},
    escape,
    snippet::convert,
    tokenizer::{tokenize, Segment},
    TemplateOptions,
};

fn numbered(text: &str) -> String {
    number(text, &TemplateOptions::default()).unwrap()
}

fn snippet(text: &str) -> String {
    convert(text, &TemplateOptions::default()).unwrap()
}

#[test]
fn test_tokenize_arena() {
    let arena = tokenize("a {b {c!f}} d", &TemplateOptions::default()).unwrap();

    assert_eq!(arena.len(), 3);
    assert_eq!(arena.get(1).parent, Some(0));
    assert_eq!(arena.get(2).parent, Some(1));
    assert_eq!(arena.get(1).raw, "b {c!f}");
    assert!(arena.get(2).is_field);
    assert!(!arena.get(1).is_field);
    assert_eq!(
        arena.get(1).segments,
        vec![Segment::Text(String::from("b ")), Segment::Group(2)]
    );
    assert_eq!(arena.bottom_up().collect::<Vec<usize>>(), vec![2, 1, 0]);
}

#[test]
fn test_anonymous_fields_number_left_to_right() {
    assert_eq!(numbered("{!f} {!f} {!f}"), "{1} {2} {3}");
    assert_eq!(numbered("{:int!f}, {:str!f}"), "{1:int}, {2:str}");
}

#[test]
fn test_inner_fields_first() {
    assert_eq!(numbered("{outer {!f}!f} {!f}"), "{2:outer {1}} {3}");
}

#[test]
fn test_shared_names() {
    assert_eq!(numbered("{x:a!f} {!f} {x:b!f} {y!f}"), "{1:a} {2} {1:b} {3:y}");
    assert_eq!(numbered("{name:!f} {name:!f}"), "{1} {1}");
}

#[test]
fn test_round_trip() {
    let text = "{!f}.\n\nArgs:\n    bar ({!f}): {!f}.\n";
    let options = TemplateOptions::default();

    let numbered = number(text, &options).unwrap();
    assert_eq!(numbered, "{1}.\n\nArgs:\n    bar ({2}): {3}.\n");
    assert_eq!(convert(&numbered, &options).unwrap(), "$1.\n\nArgs:\n    bar ($2): $3.\n");
}

#[test]
fn test_pass_isolation() {
    let first = numbered("{x:a!f} {y:b!f}");
    let second = numbered("{y:c!f} {!f}");

    assert_eq!(first, "{1:a} {2:b}");
    assert_eq!(second, "{1:c} {2}");
}

#[test]
fn test_registry() {
    let mut registry = NumberingRegistry::new();
    assert!(registry.is_empty());

    let first = registry.anonymous();
    let second = registry.anonymous();
    assert_ne!(first, second);

    assert_eq!(registry.number_for(first), 1);
    assert_eq!(registry.number_for(PlaceholderKey::Named(String::from("x"))), 2);
    assert_eq!(registry.number_for(second), 3);
    assert_eq!(registry.number_for(PlaceholderKey::Named(String::from("x"))), 2);
    assert_eq!(registry.len(), 3);
}

#[test]
fn test_plain_groups() {
    assert_eq!(numbered("{42}"), "42");
    assert_eq!(numbered("{plain} text"), "\\{plain\\} text");
    assert_eq!(numbered("{}"), "\\{\\}");
    assert_eq!(numbered("{a {!f}}"), "\\{a {1}\\}");
}

#[test]
fn test_opaque_text() {
    assert_eq!(numbered("{:<a{b>!f}"), "{1:<a{b>}");
    assert_eq!(numbered("{:<x<y>>!f}"), "{1:<x<y>>}");
    // An unclosed prefix is ordinary text
    assert_eq!(numbered("a < b {!f}"), "a < b {1}");
}

#[test]
fn test_malformed_text() {
    for text in ["{!f", "}", "{a {b}", "a}b{"] {
        let error = number(text, &TemplateOptions::default()).unwrap_err();
        assert!(matches!(
            error.get_internal_error(),
            ErrorImpl::MalformedTemplateText { .. }
        ));
    }
    assert!(convert("{1", &TemplateOptions::default()).is_err());
}

#[test]
fn test_custom_marker() {
    let options = TemplateOptions {
        field_marker: String::from("?"),
        ..TemplateOptions::default()
    };
    assert_eq!(number("{a:x?} {b!f}", &options).unwrap(), "{1:x} \\{b!f\\}");
}

#[test]
fn test_snippet_conversion() {
    assert_eq!(snippet("{1} and {2:int}"), "$1 and ${2:int}");
    assert_eq!(snippet("{2:outer {1}}"), "${2:outer $1}");
    assert_eq!(snippet("{plain}"), "{plain}");
    assert_eq!(snippet("{1:<numpy.array>}"), "${1:<numpy.array>}");
}

#[test]
fn test_snippet_escaping() {
    assert_eq!(snippet("cost $5 \\\\ {1:a$b}"), "cost \\$5 \\\\ ${1:a\\$b}");
    assert_eq!(snippet("{1:a \\} b}"), "${1:a \\} b}");
}

#[test]
fn test_escaped_braces_are_text() {
    let arena = tokenize("{:a \\{b\\}!f}", &TemplateOptions::default()).unwrap();
    assert_eq!(arena.len(), 2);

    let numbered = numbered("{:lambda: \\{1: 2\\}!f} {!f}");
    assert_eq!(numbered, "{1:lambda: \\{1: 2\\}} {2}");
    assert_eq!(snippet(&numbered), "${1:lambda: {1: 2\\}} $2");
}

#[test]
fn test_literal_groups_never_become_tab_stops() {
    let numbered = numbered("{1: 2} {!f}");
    assert_eq!(numbered, "\\{1: 2\\} {1}");
    assert_eq!(snippet(&numbered), "{1: 2\\} $1");
}

#[test]
fn test_escape() {
    let options = TemplateOptions::default();
    assert_eq!(escape("a{b}<c>\\", &options), "a\\{b\\}\\<c\\>\\\\");
    assert_eq!(escape("str or None", &options), "str or None");

    for source_text in ["\"}\" + x", "lambda: \"{\"", "x[a < b] }", "{2: 3}", "$1"] {
        let template = format!("{{:{}!f}} {{!f}}", escape(source_text, &options));
        let numbered = number(&template, &options).unwrap();
        assert!(numbered.ends_with(" {2}"), "{}", numbered);
        assert!(convert(&numbered, &options).unwrap().starts_with("${1:"));
    }
}

#[test]
fn test_escapes_inside_opaque_text() {
    assert_eq!(numbered("{:<a\\>b>!f}"), "{1:<a\\>b>}");
    assert_eq!(snippet("{1:<a\\>b>}"), "${1:<a>b>}");
}
