use crate::{
    errors::errors::ErrorImpl,
    resolver::context::ResolutionContext,
    scope::scope::SourceUnit,
};

use super::docstring::{google_template, render_function, render_unit, Rendered};

const SOURCE: &str = "\
import os

def fetch(url: str, retries=3, *args, **kwargs):
    if not url:
        raise ValueError('empty url')
    data = os.getenv('DATA')
    return data

class Reader:
    def lines(self, path, key=lambda line: line):
        yield 'first'
        yield path.read()

    def close(self):
        return

def parse(text):
    try:
        return int(text)
    except (KeyError, TypeError):
        raise
";

fn template_of(function: &str) -> String {
    let unit = SourceUnit::parse(SOURCE, "reader.py").unwrap();
    let scope = unit.find_function(function).unwrap();
    google_template(&unit, scope, &ResolutionContext::default()).unwrap()
}

#[test]
fn test_google_template_sections() {
    assert_eq!(
        template_of("fetch"),
        "{!f}.\n\n\
         Args:\n    url ({:str!f}): {!f}.\n    retries ({:int!f}): {!f}.\n    *args ({!f}): {!f}.\n    **kwargs ({!f}): {!f}.\n\n\
         Returns:\n    {:str or None!f}: {!f}.\n\n\
         Raises:\n    {:ValueError!f}: {!f}.\n"
    );
}

#[test]
fn test_generator_and_fallback() {
    assert_eq!(
        template_of("Reader.lines"),
        "{!f}.\n\n\
         Args:\n    path ({!f}): {!f}.\n    key ({:lambda line: line!f}): {!f}.\n\n\
         Yields:\n    {:str or <path.read>!f}: {!f}.\n"
    );
}

#[test]
fn test_bare_return_and_self_are_omitted() {
    assert_eq!(template_of("Reader.close"), "{!f}.\n");
}

#[test]
fn test_reraised_exceptions() {
    assert_eq!(
        template_of("parse"),
        "{!f}.\n\n\
         Args:\n    text ({!f}): {!f}.\n\n\
         Returns:\n    {:int!f}: {!f}.\n\n\
         Raises:\n    {:KeyError!f}: {!f}.\n    {:TypeError!f}: {!f}.\n"
    );
}

#[test]
fn test_render_function() {
    let unit = SourceUnit::parse(SOURCE, "reader.py").unwrap();
    let scope = unit.find_function("parse").unwrap();
    let rendered = render_function(&unit, scope, &ResolutionContext::default()).unwrap();

    assert_eq!(rendered.function, "parse");
    assert_eq!(
        rendered.numbered,
        "{1}.\n\nArgs:\n    text ({2}): {3}.\n\nReturns:\n    {4:int}: {5}.\n\nRaises:\n    {6:KeyError}: {7}.\n    {8:TypeError}: {9}.\n"
    );
    assert_eq!(
        rendered.snippet,
        "$1.\n\nArgs:\n    text ($2): $3.\n\nReturns:\n    ${4:int}: $5.\n\nRaises:\n    ${6:KeyError}: $7.\n    ${8:TypeError}: $9.\n"
    );
}

#[test]
fn test_module_scope_is_not_a_function() {
    let unit = SourceUnit::parse(SOURCE, "reader.py").unwrap();
    let error = google_template(&unit, unit.scopes().root(), &ResolutionContext::default()).unwrap_err();

    assert!(matches!(
        error.get_internal_error(),
        ErrorImpl::FunctionNotFound { .. }
    ));
}

#[test]
fn test_render_unit() {
    let unit = SourceUnit::parse(SOURCE, "reader.py").unwrap();
    let context = ResolutionContext::default();

    let all = render_unit(&unit, None, &context).unwrap();
    let names: Vec<&str> = all.iter().map(|rendered| rendered.function.as_str()).collect();
    assert_eq!(names, vec!["fetch", "Reader.lines", "Reader.close", "parse"]);

    let error = render_unit(&unit, Some("missing"), &context).unwrap_err();
    assert_eq!(
        error.get_internal_error(),
        &ErrorImpl::FunctionNotFound { function: String::from("missing") }
    );
}

const FALLBACKS: &str = r#"def close_brace(x):
    return "}" + x

def open_brace():
    return lambda: "{"

def mapping():
    return lambda: {1: 2}

def compare(items, a, b):
    return items[a < b]

def price():
    return "$" + 1
"#;

fn rendered_fallback(function: &str) -> Rendered {
    let unit = SourceUnit::parse(FALLBACKS, "fallbacks.py").unwrap();
    let scope = unit.find_function(function).unwrap();
    render_function(&unit, scope, &ResolutionContext::default()).unwrap()
}

#[test]
fn test_braces_in_fallback_text() {
    let closing = rendered_fallback("close_brace");
    assert_eq!(
        closing.template,
        "{!f}.\n\nArgs:\n    x ({!f}): {!f}.\n\nReturns:\n    {:\"\\}\" + x!f}: {!f}.\n"
    );
    assert_eq!(
        closing.snippet,
        "$1.\n\nArgs:\n    x ($2): $3.\n\nReturns:\n    ${4:\"\\}\" + x}: $5.\n"
    );

    let opening = rendered_fallback("open_brace");
    assert_eq!(opening.numbered, "{1}.\n\nReturns:\n    {2:lambda: \"\\{\"}: {3}.\n");
    assert_eq!(opening.snippet, "$1.\n\nReturns:\n    ${2:lambda: \"{\"}: $3.\n");
}

#[test]
fn test_numbered_looking_text_stays_literal() {
    let rendered = rendered_fallback("mapping");

    assert_eq!(rendered.numbered, "{1}.\n\nReturns:\n    {2:lambda: \\{1: 2\\}}: {3}.\n");
    assert_eq!(rendered.snippet, "$1.\n\nReturns:\n    ${2:lambda: {1: 2\\}}: $3.\n");
}

#[test]
fn test_opaque_markers_in_fallback_text() {
    let rendered = rendered_fallback("compare");

    assert!(rendered.numbered.ends_with("Returns:\n    {8:items[a \\< b]}: {9}.\n"));
    assert_eq!(
        rendered.snippet,
        "$1.\n\nArgs:\n    items ($2): $3.\n    a ($4): $5.\n    b ($6): $7.\n\nReturns:\n    ${8:items[a < b]}: $9.\n"
    );
}

#[test]
fn test_dollar_in_fallback_text() {
    let rendered = rendered_fallback("price");
    assert_eq!(rendered.snippet, "$1.\n\nReturns:\n    ${2:\"\\$\" + 1}: $3.\n");
}

#[test]
fn test_fallback_text_never_aborts_the_unit() {
    let unit = SourceUnit::parse(FALLBACKS, "fallbacks.py").unwrap();
    let all = render_unit(&unit, None, &ResolutionContext::default()).unwrap();

    assert_eq!(all.len(), 5);
}
