use crate::{lexer::tokens::Token, Span, IMPL_EXPR};

use super::{
    ast::{Expr, ExprType, ExprWrapper},
    statements::Parameter,
};

// LITERALS

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum NumberKind {
    Int,
    Float,
    Complex,
}

/// Number Expression
/// Represents a numeric literal; the text is kept as written.
#[derive(Debug, Clone)]
pub struct NumberExpr {
    pub value: String,
    pub kind: NumberKind,
    pub span: Span,
}

IMPL_EXPR!(NumberExpr, ExprType::Number);

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum StringKind {
    Str,
    Bytes,
    Formatted,
}

/// String Expression
/// Represents one or more adjacent string literals, concatenated.
#[derive(Debug, Clone)]
pub struct StringExpr {
    pub value: String,
    pub kind: StringKind,
    pub span: Span,
}

IMPL_EXPR!(StringExpr, ExprType::String);

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Constant {
    True,
    False,
    None,
    Ellipsis,
}

/// Constant Expression
/// `True`, `False`, `None` and `...`.
#[derive(Debug, Clone)]
pub struct ConstantExpr {
    pub constant: Constant,
    pub span: Span,
}

IMPL_EXPR!(ConstantExpr, ExprType::Constant);

/// Symbol Expression
/// Represents a bare identifier.
#[derive(Debug, Clone)]
pub struct SymbolExpr {
    pub value: String,
    pub span: Span,
}

IMPL_EXPR!(SymbolExpr, ExprType::Symbol);

// COMPLEX

/// Member Expression
/// Attribute access (`object.property`).
#[derive(Debug, Clone)]
pub struct MemberExpr {
    pub object: ExprWrapper,
    pub property: String,
    pub span: Span,
}

IMPL_EXPR!(MemberExpr, ExprType::Member);

/// A `name=value` argument, or `**value` when `name` is `None`.
#[derive(Debug, Clone)]
pub struct KeywordArgument {
    pub name: Option<String>,
    pub value: ExprWrapper,
}

/// Call Expression
/// Positional arguments (including `*args`) are kept apart from keywords.
#[derive(Debug, Clone)]
pub struct CallExpr {
    pub callee: ExprWrapper,
    pub arguments: Vec<ExprWrapper>,
    pub keywords: Vec<KeywordArgument>,
    pub span: Span,
}

IMPL_EXPR!(CallExpr, ExprType::Call);

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SequenceKind {
    List,
    Tuple,
    Set,
}

impl SequenceKind {
    pub fn type_name(&self) -> &'static str {
        match self {
            SequenceKind::List => "list",
            SequenceKind::Tuple => "tuple",
            SequenceKind::Set => "set",
        }
    }
}

/// Sequence Expression
/// List, tuple and set displays.
#[derive(Debug, Clone)]
pub struct SequenceExpr {
    pub kind: SequenceKind,
    pub elements: Vec<ExprWrapper>,
    pub span: Span,
}

IMPL_EXPR!(SequenceExpr, ExprType::Sequence);

/// A `key: value` entry, or `**value` when `key` is `None`.
#[derive(Debug, Clone)]
pub struct DictEntry {
    pub key: Option<ExprWrapper>,
    pub value: ExprWrapper,
}

/// Dict Expression
#[derive(Debug, Clone)]
pub struct DictExpr {
    pub entries: Vec<DictEntry>,
    pub span: Span,
}

IMPL_EXPR!(DictExpr, ExprType::Dict);

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ComprehensionKind {
    List,
    Set,
    Generator,
    Dict,
}

/// One `for target in iter if cond` clause.
#[derive(Debug, Clone)]
pub struct ComprehensionClause {
    pub target: ExprWrapper,
    pub iter: ExprWrapper,
    pub conditions: Vec<ExprWrapper>,
    pub is_async: bool,
}

/// Comprehension Expression
/// `element` is the key for dict comprehensions, with `value` holding the value.
#[derive(Debug, Clone)]
pub struct ComprehensionExpr {
    pub kind: ComprehensionKind,
    pub element: ExprWrapper,
    pub value: Option<ExprWrapper>,
    pub clauses: Vec<ComprehensionClause>,
    pub span: Span,
}

IMPL_EXPR!(ComprehensionExpr, ExprType::Comprehension);

/// Binary Expression
/// Arithmetic, bitwise, comparison and boolean operators.
///
/// Two-word operators (`not in`, `is not`) keep the kind of their second
/// keyword and the full text as the token value.
#[derive(Debug, Clone)]
pub struct BinaryExpr {
    pub left: ExprWrapper,
    pub operator: Token,
    pub right: ExprWrapper,
    pub span: Span,
}

IMPL_EXPR!(BinaryExpr, ExprType::Binary);

/// Prefix Expression
/// `-x`, `+x`, `~x`, `not x` and `await x`.
#[derive(Debug, Clone)]
pub struct PrefixExpr {
    pub operator: Token,
    pub right_expr: ExprWrapper,
    pub span: Span,
}

IMPL_EXPR!(PrefixExpr, ExprType::Prefix);

/// Ternary Expression
/// `body if test else orelse`
#[derive(Debug, Clone)]
pub struct TernaryExpr {
    pub body: ExprWrapper,
    pub test: ExprWrapper,
    pub orelse: ExprWrapper,
    pub span: Span,
}

IMPL_EXPR!(TernaryExpr, ExprType::Ternary);

#[derive(Debug, Clone)]
pub struct SubscriptExpr {
    pub object: ExprWrapper,
    pub index: ExprWrapper,
    pub span: Span,
}

IMPL_EXPR!(SubscriptExpr, ExprType::Subscript);

#[derive(Debug, Clone)]
pub struct SliceExpr {
    pub lower: Option<ExprWrapper>,
    pub upper: Option<ExprWrapper>,
    pub step: Option<ExprWrapper>,
    pub span: Span,
}

IMPL_EXPR!(SliceExpr, ExprType::Slice);

#[derive(Debug, Clone)]
pub struct LambdaExpr {
    pub parameters: Vec<Parameter>,
    pub body: ExprWrapper,
    pub span: Span,
}

IMPL_EXPR!(LambdaExpr, ExprType::Lambda);

/// `*value`, or `**value` when `is_double` is set.
#[derive(Debug, Clone)]
pub struct StarredExpr {
    pub value: ExprWrapper,
    pub is_double: bool,
    pub span: Span,
}

IMPL_EXPR!(StarredExpr, ExprType::Starred);

#[derive(Debug, Clone)]
pub struct YieldExpr {
    pub value: Option<ExprWrapper>,
    pub is_from: bool,
    pub span: Span,
}

IMPL_EXPR!(YieldExpr, ExprType::Yield);

/// Direct sub-expressions of `expr`, in source order.
///
/// Lambda bodies are left out: they belong to their own scope.
pub fn sub_expressions(expr: &ExprWrapper) -> Vec<&ExprWrapper> {
    let mut children = vec![];

    match expr.get_expr_type() {
        ExprType::Member => {
            if let Some(member) = expr.downcast::<MemberExpr>() {
                children.push(&member.object);
            }
        }
        ExprType::Call => {
            if let Some(call) = expr.downcast::<CallExpr>() {
                children.push(&call.callee);
                children.extend(call.arguments.iter());
                children.extend(call.keywords.iter().map(|keyword| &keyword.value));
            }
        }
        ExprType::Sequence => {
            if let Some(sequence) = expr.downcast::<SequenceExpr>() {
                children.extend(sequence.elements.iter());
            }
        }
        ExprType::Dict => {
            if let Some(dict) = expr.downcast::<DictExpr>() {
                for entry in &dict.entries {
                    children.extend(entry.key.iter());
                    children.push(&entry.value);
                }
            }
        }
        ExprType::Comprehension => {
            if let Some(comprehension) = expr.downcast::<ComprehensionExpr>() {
                children.push(&comprehension.element);
                children.extend(comprehension.value.iter());
                for clause in &comprehension.clauses {
                    children.push(&clause.target);
                    children.push(&clause.iter);
                    children.extend(clause.conditions.iter());
                }
            }
        }
        ExprType::Binary => {
            if let Some(binary) = expr.downcast::<BinaryExpr>() {
                children.push(&binary.left);
                children.push(&binary.right);
            }
        }
        ExprType::Prefix => {
            if let Some(prefix) = expr.downcast::<PrefixExpr>() {
                children.push(&prefix.right_expr);
            }
        }
        ExprType::Ternary => {
            if let Some(ternary) = expr.downcast::<TernaryExpr>() {
                children.push(&ternary.body);
                children.push(&ternary.test);
                children.push(&ternary.orelse);
            }
        }
        ExprType::Subscript => {
            if let Some(subscript) = expr.downcast::<SubscriptExpr>() {
                children.push(&subscript.object);
                children.push(&subscript.index);
            }
        }
        ExprType::Slice => {
            if let Some(slice) = expr.downcast::<SliceExpr>() {
                children.extend(slice.lower.iter());
                children.extend(slice.upper.iter());
                children.extend(slice.step.iter());
            }
        }
        ExprType::Starred => {
            if let Some(starred) = expr.downcast::<StarredExpr>() {
                children.push(&starred.value);
            }
        }
        ExprType::Yield => {
            if let Some(yield_expr) = expr.downcast::<YieldExpr>() {
                children.extend(yield_expr.value.iter());
            }
        }
        ExprType::Number | ExprType::String | ExprType::Constant | ExprType::Symbol | ExprType::Lambda => {}
    }

    children
}
