//! Unit tests for scope collection.

use crate::ast::{
    ast::{Expr, ExprType},
    expressions::{Constant, ConstantExpr},
};

use super::scope::{ImportBinding, ScopeKind, SourceUnit};

const SOURCE: &str = "\
import os.path
import json as j
from collections import OrderedDict as OD
from . import sibling

def helper(value):
    if value:
        return 1
    return

class Service:
    def run(self):
        try:
            self.go()
        except (KeyError, ValueError):
            raise
        x = yield 2
        yield

    def stop(self):
        def inner():
            pass
        raise RuntimeError('stop')
";

fn unit() -> SourceUnit {
    SourceUnit::parse(SOURCE, "service.py").unwrap()
}

#[test]
fn test_scope_tree_shape() {
    let unit = unit();
    let scopes = unit.scopes();

    let module = scopes.get(scopes.root());
    assert_eq!(module.kind, ScopeKind::Module);
    assert_eq!(module.children.len(), 2);

    let class = scopes.child_named(scopes.root(), "Service", ScopeKind::Class).unwrap();
    let run = scopes.child_named(class, "run", ScopeKind::Function).unwrap();
    assert_eq!(scopes.enclosing_class(run), Some(class));
    assert_eq!(scopes.qualified_name(run), "Service.run");
    assert_eq!(scopes.ancestors(run), vec![run, class, scopes.root()]);
}

#[test]
fn test_returns_include_synthetic_none() {
    let unit = unit();
    let helper = unit.find_function("helper").unwrap();
    let scope = unit.scopes().get(helper);

    assert_eq!(scope.returns.len(), 2);
    assert_eq!(scope.returns[0].get_expr_type(), ExprType::Number);
    let none = scope.returns[1].downcast::<ConstantExpr>().unwrap();
    assert_eq!(none.constant, Constant::None);
}

#[test]
fn test_yields_and_bare_raise() {
    let unit = unit();
    let run = unit.find_function("Service.run").unwrap();
    let scope = unit.scopes().get(run);

    assert_eq!(scope.yields.len(), 2);
    assert_eq!(unit.text_of(scope.yields[0].get_span()), "2");
    assert_eq!(scope.yields[1].get_expr_type(), ExprType::Constant);

    let raised: Vec<&str> = scope.raises.iter().map(|raise| unit.text_of(raise.get_span())).collect();
    assert_eq!(raised, vec!["KeyError", "ValueError"]);

    assert_eq!(scope.assignments.len(), 1);
    assert!(scope.exits().len() == 2);
}

#[test]
fn test_nested_function_is_its_own_scope() {
    let unit = unit();
    let stop = unit.find_function("stop").unwrap();
    let scope = unit.scopes().get(stop);

    assert_eq!(scope.raises.len(), 1);
    assert_eq!(scope.children.len(), 1);
    assert_eq!(unit.scopes().get(scope.children[0]).name, "inner");
    assert_eq!(unit.scopes().qualified_name(scope.children[0]), "Service.stop.inner");
}

#[test]
fn test_import_bindings() {
    let unit = unit();

    let bindings: Vec<(&str, &str)> = unit
        .imports()
        .iter()
        .map(|binding| (binding.name.as_str(), binding.path.as_str()))
        .collect();
    assert_eq!(
        bindings,
        vec![
            ("os", "os"),
            ("j", "json"),
            ("OD", "collections.OrderedDict"),
            ("sibling", ".sibling"),
        ]
    );
    assert_eq!(
        unit.imports()[0],
        ImportBinding {
            name: String::from("os"),
            path: String::from("os"),
            position: 0,
        }
    );
}

#[test]
fn test_functions_in_source_order() {
    let unit = unit();

    let names: Vec<String> = unit
        .functions()
        .into_iter()
        .map(|id| unit.scopes().qualified_name(id))
        .collect();
    assert_eq!(names, vec!["helper", "Service.run", "Service.stop", "Service.stop.inner"]);
    assert_eq!(unit.scopes().functions_named("inner").len(), 1);
    assert!(unit.find_function("missing").is_none());
}

#[test]
fn test_parse_error_propagates() {
    assert!(SourceUnit::parse("def f(:\n    pass\n", "bad.py").is_err());
}
