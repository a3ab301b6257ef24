use std::slice::Iter;

use crate::{lexer::tokens::{Token, TokenKind}, Span, IMPL_STMT};

use super::{
    ast::{ExprWrapper, Stmt, StmtType, StmtWrapper},
    expressions::KeywordArgument,
};

/// A sequence of statements; the root of every parsed unit.
#[derive(Debug, Clone)]
pub struct BlockStmt {
    pub body: Vec<StmtWrapper>,
    pub span: Span,
}

impl BlockStmt {
    pub fn iter(&self) -> Iter<'_, StmtWrapper> {
        self.body.iter()
    }
}

IMPL_STMT!(BlockStmt, StmtType::BlockStmt);

#[derive(Debug, Clone)]
pub struct ExpressionStmt {
    pub expression: ExprWrapper,
    pub span: Span,
}

IMPL_STMT!(ExpressionStmt, StmtType::ExpressionStmt);

/// Plain, chained (`a = b = v`) and annotated (`a: T = v`) assignments.
///
/// An annotated declaration without a value has `value: None`.
#[derive(Debug, Clone)]
pub struct AssignStmt {
    pub targets: Vec<ExprWrapper>,
    pub value: Option<ExprWrapper>,
    pub annotation: Option<ExprWrapper>,
    pub span: Span,
}

IMPL_STMT!(AssignStmt, StmtType::AssignStmt);

#[derive(Debug, Clone)]
pub struct AugAssignStmt {
    pub target: ExprWrapper,
    pub operator: Token,
    pub value: ExprWrapper,
    pub span: Span,
}

IMPL_STMT!(AugAssignStmt, StmtType::AugAssignStmt);

/// One imported name with its optional alias.
#[derive(Debug, Clone, PartialEq)]
pub struct ImportName {
    pub path: String,
    pub alias: Option<String>,
}

/// `import a.b as c, d`
#[derive(Debug, Clone)]
pub struct ImportStmt {
    pub names: Vec<ImportName>,
    pub span: Span,
}

IMPL_STMT!(ImportStmt, StmtType::ImportStmt);

/// `from ..module import name as alias`; relative dots stay in `module`.
#[derive(Debug, Clone)]
pub struct FromImportStmt {
    pub module: String,
    pub names: Vec<ImportName>,
    pub is_wildcard: bool,
    pub span: Span,
}

IMPL_STMT!(FromImportStmt, StmtType::FromImportStmt);

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ParameterKind {
    Positional,
    VarPositional,
    KeywordOnly,
    VarKeyword,
}

#[derive(Debug, Clone)]
pub struct Parameter {
    pub name: String,
    pub annotation: Option<ExprWrapper>,
    pub default: Option<ExprWrapper>,
    pub kind: ParameterKind,
    pub span: Span,
}

#[derive(Debug, Clone)]
pub struct FnDeclStmt {
    pub name: String,
    pub parameters: Vec<Parameter>,
    pub return_annotation: Option<ExprWrapper>,
    pub body: Vec<StmtWrapper>,
    pub decorators: Vec<ExprWrapper>,
    pub is_async: bool,
    pub span: Span,
}

IMPL_STMT!(FnDeclStmt, StmtType::FnDeclStmt);

#[derive(Debug, Clone)]
pub struct ClassDeclStmt {
    pub name: String,
    pub bases: Vec<ExprWrapper>,
    pub keywords: Vec<KeywordArgument>,
    pub body: Vec<StmtWrapper>,
    pub decorators: Vec<ExprWrapper>,
    pub span: Span,
}

IMPL_STMT!(ClassDeclStmt, StmtType::ClassDeclStmt);

#[derive(Debug, Clone)]
pub struct ReturnStmt {
    pub value: Option<ExprWrapper>,
    pub span: Span,
}

IMPL_STMT!(ReturnStmt, StmtType::ReturnStmt);

/// `raise exception from cause`; a bare `raise` has neither.
#[derive(Debug, Clone)]
pub struct RaiseStmt {
    pub exception: Option<ExprWrapper>,
    pub cause: Option<ExprWrapper>,
    pub span: Span,
}

IMPL_STMT!(RaiseStmt, StmtType::RaiseStmt);

/// `elif` chains are nested `IfStmt`s in `orelse`.
#[derive(Debug, Clone)]
pub struct IfStmt {
    pub test: ExprWrapper,
    pub body: Vec<StmtWrapper>,
    pub orelse: Vec<StmtWrapper>,
    pub span: Span,
}

IMPL_STMT!(IfStmt, StmtType::IfStmt);

#[derive(Debug, Clone)]
pub struct WhileStmt {
    pub test: ExprWrapper,
    pub body: Vec<StmtWrapper>,
    pub orelse: Vec<StmtWrapper>,
    pub span: Span,
}

IMPL_STMT!(WhileStmt, StmtType::WhileStmt);

#[derive(Debug, Clone)]
pub struct ForStmt {
    pub target: ExprWrapper,
    pub iter: ExprWrapper,
    pub body: Vec<StmtWrapper>,
    pub orelse: Vec<StmtWrapper>,
    pub is_async: bool,
    pub span: Span,
}

IMPL_STMT!(ForStmt, StmtType::ForStmt);

#[derive(Debug, Clone)]
pub struct WithItem {
    pub context: ExprWrapper,
    pub target: Option<ExprWrapper>,
}

#[derive(Debug, Clone)]
pub struct WithStmt {
    pub items: Vec<WithItem>,
    pub body: Vec<StmtWrapper>,
    pub is_async: bool,
    pub span: Span,
}

IMPL_STMT!(WithStmt, StmtType::WithStmt);

#[derive(Debug, Clone)]
pub struct ExceptHandler {
    pub exception: Option<ExprWrapper>,
    pub name: Option<String>,
    pub body: Vec<StmtWrapper>,
    pub span: Span,
}

#[derive(Debug, Clone)]
pub struct TryStmt {
    pub body: Vec<StmtWrapper>,
    pub handlers: Vec<ExceptHandler>,
    pub orelse: Vec<StmtWrapper>,
    pub finalbody: Vec<StmtWrapper>,
    pub span: Span,
}

IMPL_STMT!(TryStmt, StmtType::TryStmt);

/// `pass`, `break`, `continue`, `global`, `nonlocal`, `del` and `assert`.
#[derive(Debug, Clone)]
pub struct KeywordStmt {
    pub keyword: TokenKind,
    pub arguments: Vec<ExprWrapper>,
    pub span: Span,
}

IMPL_STMT!(KeywordStmt, StmtType::KeywordStmt);

/// Statement bodies nested inside a compound statement, in source order.
///
/// Function and class bodies are not included: they open a new scope.
pub fn nested_bodies(stmt: &StmtWrapper) -> Vec<&[StmtWrapper]> {
    match stmt.get_stmt_type() {
        StmtType::IfStmt => stmt
            .downcast::<IfStmt>()
            .map(|s| vec![s.body.as_slice(), s.orelse.as_slice()])
            .unwrap_or_default(),
        StmtType::WhileStmt => stmt
            .downcast::<WhileStmt>()
            .map(|s| vec![s.body.as_slice(), s.orelse.as_slice()])
            .unwrap_or_default(),
        StmtType::ForStmt => stmt
            .downcast::<ForStmt>()
            .map(|s| vec![s.body.as_slice(), s.orelse.as_slice()])
            .unwrap_or_default(),
        StmtType::WithStmt => stmt
            .downcast::<WithStmt>()
            .map(|s| vec![s.body.as_slice()])
            .unwrap_or_default(),
        StmtType::TryStmt => stmt
            .downcast::<TryStmt>()
            .map(|s| {
                let mut bodies = vec![s.body.as_slice()];
                bodies.extend(s.handlers.iter().map(|handler| handler.body.as_slice()));
                bodies.push(s.orelse.as_slice());
                bodies.push(s.finalbody.as_slice());
                bodies
            })
            .unwrap_or_default(),
        _ => vec![],
    }
}
