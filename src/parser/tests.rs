//! Unit tests for the parser module.
//!
//! This module contains tests for parsing various language constructs including:
//! - Assignments (plain, chained, annotated, augmented, tuple targets)
//! - Function and class declarations
//! - Imports
//! - Expressions and operator precedence
//! - Control flow statements
//! - Error cases

use std::rc::Rc;

use crate::{
    ast::{
        ast::{Expr, ExprType, Stmt, StmtType},
        expressions::{
            BinaryExpr, CallExpr, ComprehensionExpr, ComprehensionKind, MemberExpr, NumberExpr,
            NumberKind, PrefixExpr, SequenceExpr, SequenceKind, StringExpr, StringKind, TernaryExpr,
        },
        statements::{
            AssignStmt, AugAssignStmt, BlockStmt, ClassDeclStmt, ExpressionStmt, FnDeclStmt,
            FromImportStmt, IfStmt, ImportStmt, ParameterKind, ReturnStmt, TryStmt,
        },
    },
    errors::errors::{Error, ErrorImpl},
    lexer::{lexer::tokenize, tokens::TokenKind},
};

use super::parser::parse;

fn parse_source(source: &str) -> Result<BlockStmt, Error> {
    let tokens = tokenize(source.to_string(), Some("test.py".to_string()))?;
    parse(tokens, Rc::new("test.py".to_string()))
}

fn first_expression(source: &str) -> ExpressionStmt {
    let block = parse_source(source).unwrap();
    block.body[0].downcast::<ExpressionStmt>().unwrap().clone()
}

#[test]
fn test_parse_assignment() {
    let block = parse_source("x = 42\n").unwrap();

    assert_eq!(block.body.len(), 1);
    let assign = block.body[0].downcast::<AssignStmt>().unwrap();
    assert_eq!(assign.targets.len(), 1);
    assert_eq!(assign.targets[0].get_expr_type(), ExprType::Symbol);
    let value = assign.value.as_ref().unwrap().downcast::<NumberExpr>().unwrap();
    assert_eq!(value.value, "42");
    assert_eq!(value.kind, NumberKind::Int);
}

#[test]
fn test_parse_chained_assignment() {
    let block = parse_source("a = b = 1.5").unwrap();

    let assign = block.body[0].downcast::<AssignStmt>().unwrap();
    assert_eq!(assign.targets.len(), 2);
    let value = assign.value.as_ref().unwrap().downcast::<NumberExpr>().unwrap();
    assert_eq!(value.kind, NumberKind::Float);
}

#[test]
fn test_parse_tuple_assignment() {
    let block = parse_source("a, b = '8', 9").unwrap();

    let assign = block.body[0].downcast::<AssignStmt>().unwrap();
    let target = assign.targets[0].downcast::<SequenceExpr>().unwrap();
    assert_eq!(target.kind, SequenceKind::Tuple);
    assert_eq!(target.elements.len(), 2);
    let value = assign.value.as_ref().unwrap().downcast::<SequenceExpr>().unwrap();
    assert_eq!(value.elements.len(), 2);
}

#[test]
fn test_parse_annotated_assignment() {
    let block = parse_source("count: int = 0\nname: str\n").unwrap();

    let with_value = block.body[0].downcast::<AssignStmt>().unwrap();
    assert!(with_value.annotation.is_some());
    assert!(with_value.value.is_some());

    let declaration = block.body[1].downcast::<AssignStmt>().unwrap();
    assert!(declaration.annotation.is_some());
    assert!(declaration.value.is_none());
}

#[test]
fn test_parse_augmented_assignment() {
    let block = parse_source("total += 1").unwrap();

    let assign = block.body[0].downcast::<AugAssignStmt>().unwrap();
    assert_eq!(assign.operator.kind, TokenKind::PlusEquals);
}

#[test]
fn test_parse_invalid_assignment_target() {
    let result = parse_source("f() = 1");

    assert!(matches!(
        result.unwrap_err().get_internal_error(),
        ErrorImpl::UnexpectedTokenDetailed { .. }
    ));
}

#[test]
fn test_parse_function_declaration() {
    let source = "def add(a: int, b=2, *args, key, **kwargs) -> int:\n    return a + b\n";
    let block = parse_source(source).unwrap();

    let function = block.body[0].downcast::<FnDeclStmt>().unwrap();
    assert_eq!(function.name, "add");
    assert!(function.return_annotation.is_some());
    assert!(!function.is_async);

    let kinds: Vec<ParameterKind> = function.parameters.iter().map(|p| p.kind).collect();
    assert_eq!(
        kinds,
        vec![
            ParameterKind::Positional,
            ParameterKind::Positional,
            ParameterKind::VarPositional,
            ParameterKind::KeywordOnly,
            ParameterKind::VarKeyword,
        ]
    );
    assert!(function.parameters[0].annotation.is_some());
    assert!(function.parameters[1].default.is_some());

    assert_eq!(function.body.len(), 1);
    assert_eq!(function.body[0].get_stmt_type(), StmtType::ReturnStmt);
}

#[test]
fn test_parse_bare_star_parameter() {
    let block = parse_source("def f(a, *, b):\n    pass\n").unwrap();

    let function = block.body[0].downcast::<FnDeclStmt>().unwrap();
    assert_eq!(function.parameters.len(), 2);
    assert_eq!(function.parameters[1].kind, ParameterKind::KeywordOnly);
}

#[test]
fn test_parse_decorated_async_function() {
    let source = "@cache\n@app.route('/x')\nasync def handler():\n    await thing()\n";
    let block = parse_source(source).unwrap();

    let function = block.body[0].downcast::<FnDeclStmt>().unwrap();
    assert!(function.is_async);
    assert_eq!(function.decorators.len(), 2);
}

#[test]
fn test_parse_one_line_function() {
    let block = parse_source("def f(): return 1; pass\nx = 2\n").unwrap();

    assert_eq!(block.body.len(), 2);
    let function = block.body[0].downcast::<FnDeclStmt>().unwrap();
    assert_eq!(function.body.len(), 2);
}

#[test]
fn test_parse_nested_blocks() {
    let source = "\
class Service(Base, metaclass=Meta):
    def run(self):
        if self.ready:
            return 1
        elif self.waiting:
            return 2
        else:
            return 3

    def stop(self):
        pass
";
    let block = parse_source(source).unwrap();

    let class = block.body[0].downcast::<ClassDeclStmt>().unwrap();
    assert_eq!(class.name, "Service");
    assert_eq!(class.bases.len(), 1);
    assert_eq!(class.keywords.len(), 1);
    assert_eq!(class.body.len(), 2);

    let run = class.body[0].downcast::<FnDeclStmt>().unwrap();
    let if_stmt = run.body[0].downcast::<IfStmt>().unwrap();
    let elif = if_stmt.orelse[0].downcast::<IfStmt>().unwrap();
    assert_eq!(elif.orelse.len(), 1);
}

#[test]
fn test_parse_imports() {
    let source = "import os.path as p, json\nfrom ..pkg.mod import (a, b as c,)\nfrom . import *\n";
    let block = parse_source(source).unwrap();

    let import = block.body[0].downcast::<ImportStmt>().unwrap();
    assert_eq!(import.names[0].path, "os.path");
    assert_eq!(import.names[0].alias.as_deref(), Some("p"));
    assert_eq!(import.names[1].path, "json");

    let from = block.body[1].downcast::<FromImportStmt>().unwrap();
    assert_eq!(from.module, "..pkg.mod");
    assert_eq!(from.names.len(), 2);
    assert_eq!(from.names[1].alias.as_deref(), Some("c"));

    let wildcard = block.body[2].downcast::<FromImportStmt>().unwrap();
    assert_eq!(wildcard.module, ".");
    assert!(wildcard.is_wildcard);
}

#[test]
fn test_parse_operator_precedence() {
    let stmt = first_expression("1 + 2 * 3");

    let binary = stmt.expression.downcast::<BinaryExpr>().unwrap();
    assert_eq!(binary.operator.kind, TokenKind::Plus);
    assert_eq!(binary.right.get_expr_type(), ExprType::Binary);
}

#[test]
fn test_parse_power_binds_tighter_than_unary() {
    let stmt = first_expression("-2 ** 2");

    let prefix = stmt.expression.downcast::<PrefixExpr>().unwrap();
    assert_eq!(prefix.operator.kind, TokenKind::Dash);
    assert_eq!(prefix.right_expr.get_expr_type(), ExprType::Binary);
}

#[test]
fn test_parse_comparison_operators() {
    let stmt = first_expression("a not in b and c is not None");

    let and = stmt.expression.downcast::<BinaryExpr>().unwrap();
    assert_eq!(and.operator.kind, TokenKind::And);

    let not_in = and.left.downcast::<BinaryExpr>().unwrap();
    assert_eq!(not_in.operator.value, "not in");
    let is_not = and.right.downcast::<BinaryExpr>().unwrap();
    assert_eq!(is_not.operator.value, "is not");
}

#[test]
fn test_parse_ternary() {
    let stmt = first_expression("a if cond else b");

    let ternary = stmt.expression.downcast::<TernaryExpr>().unwrap();
    assert_eq!(ternary.test.get_expr_type(), ExprType::Symbol);
}

#[test]
fn test_parse_call_arguments() {
    let stmt = first_expression("f(1, *rest, key='v', **extra)");

    let call = stmt.expression.downcast::<CallExpr>().unwrap();
    assert_eq!(call.arguments.len(), 2);
    assert_eq!(call.arguments[1].get_expr_type(), ExprType::Starred);
    assert_eq!(call.keywords.len(), 2);
    assert_eq!(call.keywords[0].name.as_deref(), Some("key"));
    assert!(call.keywords[1].name.is_none());
}

#[test]
fn test_parse_method_chain() {
    let stmt = first_expression("os.environ.get('HOME')");

    let call = stmt.expression.downcast::<CallExpr>().unwrap();
    let member = call.callee.downcast::<MemberExpr>().unwrap();
    assert_eq!(member.property, "get");
    assert_eq!(member.object.get_expr_type(), ExprType::Member);
}

#[test]
fn test_parse_string_literals() {
    let stmt = first_expression("f'a{b}' 'c'");
    let string = stmt.expression.downcast::<StringExpr>().unwrap();
    assert_eq!(string.kind, StringKind::Formatted);
    assert_eq!(string.value, "a{b}c");

    let stmt = first_expression("b\"raw\"");
    let string = stmt.expression.downcast::<StringExpr>().unwrap();
    assert_eq!(string.kind, StringKind::Bytes);
    assert_eq!(string.value, "raw");
}

#[test]
fn test_parse_displays() {
    for (source, kind) in [
        ("[1, 2]", SequenceKind::List),
        ("(1, 2)", SequenceKind::Tuple),
        ("{1, 2}", SequenceKind::Set),
        ("(1,)", SequenceKind::Tuple),
        ("()", SequenceKind::Tuple),
    ] {
        let stmt = first_expression(source);
        let sequence = stmt.expression.downcast::<SequenceExpr>().unwrap();
        assert_eq!(sequence.kind, kind, "{}", source);
    }

    let stmt = first_expression("{'a': 1, **rest}");
    assert_eq!(stmt.expression.get_expr_type(), ExprType::Dict);

    let stmt = first_expression("(1)");
    assert_eq!(stmt.expression.get_expr_type(), ExprType::Number);
}

#[test]
fn test_parse_comprehensions() {
    for (source, kind) in [
        ("[x for x in y if x]", ComprehensionKind::List),
        ("{x for x in y}", ComprehensionKind::Set),
        ("{k: v for k, v in items}", ComprehensionKind::Dict),
        ("(x for x in y for z in x)", ComprehensionKind::Generator),
    ] {
        let stmt = first_expression(source);
        let comprehension = stmt.expression.downcast::<ComprehensionExpr>().unwrap();
        assert_eq!(comprehension.kind, kind, "{}", source);
    }

    let stmt = first_expression("sum(x for x in y)");
    let call = stmt.expression.downcast::<CallExpr>().unwrap();
    assert_eq!(call.arguments[0].get_expr_type(), ExprType::Comprehension);
}

#[test]
fn test_parse_subscripts_and_slices() {
    let stmt = first_expression("data[1:2, ::3]");

    assert_eq!(stmt.expression.get_expr_type(), ExprType::Subscript);
}

#[test]
fn test_parse_lambda_and_yield() {
    let block = parse_source("f = lambda x, y=1: x + y\ndef g():\n    yield 1, 2\n    yield from h()\n").unwrap();

    let assign = block.body[0].downcast::<AssignStmt>().unwrap();
    assert_eq!(assign.value.as_ref().unwrap().get_expr_type(), ExprType::Lambda);

    let function = block.body[1].downcast::<FnDeclStmt>().unwrap();
    assert_eq!(function.body.len(), 2);
}

#[test]
fn test_parse_return_tuple() {
    let block = parse_source("def f():\n    return 1, 'a'\n").unwrap();

    let function = block.body[0].downcast::<FnDeclStmt>().unwrap();
    let ret = function.body[0].downcast::<ReturnStmt>().unwrap();
    let value = ret.value.as_ref().unwrap().downcast::<SequenceExpr>().unwrap();
    assert_eq!(value.kind, SequenceKind::Tuple);
}

#[test]
fn test_parse_try_statement() {
    let source = "\
try:
    run()
except (KeyError, ValueError) as error:
    raise RuntimeError('x') from error
except:
    raise
else:
    pass
finally:
    close()
";
    let block = parse_source(source).unwrap();

    let try_stmt = block.body[0].downcast::<TryStmt>().unwrap();
    assert_eq!(try_stmt.handlers.len(), 2);
    assert_eq!(try_stmt.handlers[0].name.as_deref(), Some("error"));
    assert!(try_stmt.handlers[1].exception.is_none());
    assert_eq!(try_stmt.orelse.len(), 1);
    assert_eq!(try_stmt.finalbody.len(), 1);
}

#[test]
fn test_parse_loops_and_with() {
    let source = "\
for i, item in enumerate(items):
    continue
else:
    pass
while True:
    break
with open(path) as fh, lock:
    del fh
async def f():
    async for x in y:
        pass
    async with z as w:
        pass
";
    let block = parse_source(source).unwrap();

    let kinds: Vec<StmtType> = block.body.iter().map(|stmt| stmt.get_stmt_type()).collect();
    assert_eq!(
        kinds,
        vec![StmtType::ForStmt, StmtType::WhileStmt, StmtType::WithStmt, StmtType::FnDeclStmt]
    );
}

#[test]
fn test_parse_missing_indented_block() {
    let result = parse_source("def f():\nreturn 1\n");

    let error = result.unwrap_err();
    assert_eq!(
        error.get_internal_error(),
        &ErrorImpl::UnexpectedTokenDetailed {
            token: String::from("return"),
            message: String::from("expected an indented block"),
        }
    );
}

#[test]
fn test_parse_unexpected_token() {
    let result = parse_source("x = )");

    assert!(result.is_err());
    assert_eq!(result.unwrap_err().get_position().0, 4);
}

#[test]
fn test_parse_statement_spans() {
    let source = "def f():\n    return 1\n";
    let block = parse_source(source).unwrap();

    let span = block.body[0].get_span();
    assert_eq!(span.start.0, 0);
    assert_eq!(span.end.0 as usize, source.trim_end().len());
}
