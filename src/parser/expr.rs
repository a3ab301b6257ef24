use crate::{
    ast::{
        ast::{Expr, ExprType, ExprWrapper},
        expressions::{
            BinaryExpr, CallExpr, ComprehensionClause, ComprehensionExpr, ComprehensionKind,
            Constant, ConstantExpr, DictEntry, DictExpr, KeywordArgument, LambdaExpr, MemberExpr,
            NumberExpr, NumberKind, PrefixExpr, SequenceExpr, SequenceKind, SliceExpr, StarredExpr,
            StringExpr, StringKind, SubscriptExpr, SymbolExpr, TernaryExpr, YieldExpr,
        },
    },
    errors::errors::{Error, ErrorImpl},
    lexer::tokens::TokenKind,
    Span,
};

use super::{
    lookups::BindingPower,
    parser::{describe, Parser},
    stmt::parse_parameters,
};

pub fn parse_expr(parser: &mut Parser, bp: BindingPower) -> Result<ExprWrapper, Error> {
    // First parse NUD
    let token_kind = parser.current_token_kind();
    let nud = match parser.get_nud_lookup().get(&token_kind).copied() {
        Some(nud) => nud,
        None => {
            return Err(Error::new(
                ErrorImpl::UnexpectedTokenDetailed {
                    token: describe(parser.current_token()),
                    message: String::from("expected an expression"),
                },
                parser.get_position(),
            ))
        }
    };

    let mut left = nud(parser)?;

    // While LED and current BP is less than BP of current token, continue parsing lhs
    while let Some(next_bp) = parser.get_bp_lookup().get(&parser.current_token_kind()).copied() {
        if next_bp <= bp {
            break;
        }

        let led = match parser.get_led_lookup().get(&parser.current_token_kind()).copied() {
            Some(led) => led,
            None => {
                return Err(Error::new(
                    ErrorImpl::UnexpectedToken { token: describe(parser.current_token()) },
                    left.get_span().start.clone(),
                ))
            }
        };

        left = led(parser, left, next_bp)?;
    }

    Ok(left)
}

/// Parses `a, b, *c` into a tuple, or returns the single expression unchanged.
pub fn parse_expr_list(parser: &mut Parser) -> Result<ExprWrapper, Error> {
    let first = parse_expr(parser, BindingPower::Default)?;
    if parser.current_token_kind() != TokenKind::Comma {
        return Ok(first);
    }

    let start = first.get_span().start.clone();
    let mut elements = vec![first];
    while parser.eat(TokenKind::Comma) {
        if !parser.at_expression_start() {
            break;
        }
        elements.push(parse_expr(parser, BindingPower::Default)?);
    }

    Ok(ExprWrapper::new(SequenceExpr {
        kind: SequenceKind::Tuple,
        elements,
        span: parser.span_from(&start),
    }))
}

/// Parses assignment and loop targets; stops before `in` and `=`.
pub fn parse_target_list(parser: &mut Parser) -> Result<ExprWrapper, Error> {
    let first = parse_expr(parser, BindingPower::Relational)?;
    if parser.current_token_kind() != TokenKind::Comma {
        return Ok(first);
    }

    let start = first.get_span().start.clone();
    let mut elements = vec![first];
    while parser.eat(TokenKind::Comma) {
        if !parser.at_expression_start() {
            break;
        }
        elements.push(parse_expr(parser, BindingPower::Relational)?);
    }

    Ok(ExprWrapper::new(SequenceExpr {
        kind: SequenceKind::Tuple,
        elements,
        span: parser.span_from(&start),
    }))
}

fn number_kind(text: &str) -> NumberKind {
    let lower = text.to_ascii_lowercase();
    if lower.starts_with("0x") || lower.starts_with("0o") || lower.starts_with("0b") {
        NumberKind::Int
    } else if lower.ends_with('j') {
        NumberKind::Complex
    } else if lower.contains('.') || lower.contains('e') {
        NumberKind::Float
    } else {
        NumberKind::Int
    }
}

/// Splits a raw string token into its kind and the text between the quotes.
fn string_parts(raw: &str) -> (StringKind, String) {
    let quote_at = raw.find(['\'', '"']).unwrap_or(0);
    let prefix = raw[..quote_at].to_ascii_lowercase();
    let quoted = &raw[quote_at..];

    let quote_len = if quoted.starts_with("\"\"\"") || quoted.starts_with("'''") { 3 } else { 1 };
    let content = if quoted.len() >= quote_len * 2 {
        quoted[quote_len..quoted.len() - quote_len].to_string()
    } else {
        String::new()
    };

    let kind = if prefix.contains('b') {
        StringKind::Bytes
    } else if prefix.contains('f') {
        StringKind::Formatted
    } else {
        StringKind::Str
    };

    (kind, content)
}

pub fn parse_primary_expr(parser: &mut Parser) -> Result<ExprWrapper, Error> {
    match parser.current_token_kind() {
        TokenKind::Number => {
            let token = parser.advance().clone();
            if token.value.is_empty() {
                return Err(Error::new(ErrorImpl::NumberParseError { token: token.value }, token.span.start));
            }
            Ok(ExprWrapper::new(NumberExpr {
                kind: number_kind(&token.value),
                value: token.value,
                span: token.span,
            }))
        }
        TokenKind::String => {
            let start = parser.get_position();
            let (mut kind, mut value) = string_parts(&parser.advance().value);

            // Adjacent literals concatenate
            while parser.current_token_kind() == TokenKind::String {
                let (next_kind, next_value) = string_parts(&parser.advance().value);
                if next_kind == StringKind::Formatted && kind == StringKind::Str {
                    kind = StringKind::Formatted;
                }
                value.push_str(&next_value);
            }

            Ok(ExprWrapper::new(StringExpr { value, kind, span: parser.span_from(&start) }))
        }
        TokenKind::Identifier => {
            let token = parser.advance().clone();
            Ok(ExprWrapper::new(SymbolExpr { value: token.value, span: token.span }))
        }
        TokenKind::True | TokenKind::False | TokenKind::None | TokenKind::Ellipsis => {
            let token = parser.advance().clone();
            let constant = match token.kind {
                TokenKind::True => Constant::True,
                TokenKind::False => Constant::False,
                TokenKind::None => Constant::None,
                _ => Constant::Ellipsis,
            };
            Ok(ExprWrapper::new(ConstantExpr { constant, span: token.span }))
        }
        _ => Err(Error::new(
            ErrorImpl::UnexpectedToken { token: describe(parser.current_token()) },
            parser.get_position(),
        )),
    }
}

pub fn parse_binary_expr(parser: &mut Parser, left: ExprWrapper, bp: BindingPower) -> Result<ExprWrapper, Error> {
    let operator_token = parser.advance().clone();

    let right = parse_expr(parser, bp)?;

    Ok(ExprWrapper::new(BinaryExpr {
        span: Span {
            start: left.get_span().start.clone(),
            end: right.get_span().end.clone(),
        },
        left,
        operator: operator_token,
        right,
    }))
}

/// `**` is right associative and binds tighter than a unary minus on its left.
pub fn parse_power_expr(parser: &mut Parser, left: ExprWrapper, _bp: BindingPower) -> Result<ExprWrapper, Error> {
    parse_binary_expr(parser, left, BindingPower::Unary)
}

/// `a is b` and `a is not b`
pub fn parse_is_expr(parser: &mut Parser, left: ExprWrapper, bp: BindingPower) -> Result<ExprWrapper, Error> {
    let mut operator_token = parser.advance().clone();
    if parser.eat(TokenKind::Not) {
        operator_token.value = String::from("is not");
    }

    let right = parse_expr(parser, bp)?;

    Ok(ExprWrapper::new(BinaryExpr {
        span: Span {
            start: left.get_span().start.clone(),
            end: right.get_span().end.clone(),
        },
        left,
        operator: operator_token,
        right,
    }))
}

/// `a not in b`
pub fn parse_not_in_expr(parser: &mut Parser, left: ExprWrapper, bp: BindingPower) -> Result<ExprWrapper, Error> {
    parser.advance();
    let mut operator_token = parser.expect_error(
        TokenKind::In,
        Some(Error::new(
            ErrorImpl::UnexpectedTokenDetailed {
                token: describe(parser.current_token()),
                message: String::from("expected `in` after `not`"),
            },
            parser.get_position(),
        )),
    )?;
    operator_token.value = String::from("not in");

    let right = parse_expr(parser, bp)?;

    Ok(ExprWrapper::new(BinaryExpr {
        span: Span {
            start: left.get_span().start.clone(),
            end: right.get_span().end.clone(),
        },
        left,
        operator: operator_token,
        right,
    }))
}

pub fn parse_prefix_expr(parser: &mut Parser) -> Result<ExprWrapper, Error> {
    let operator_token = parser.advance().clone();
    let rhs = parse_expr(parser, BindingPower::Unary)?;

    Ok(ExprWrapper::new(PrefixExpr {
        span: Span {
            start: operator_token.span.start.clone(),
            end: rhs.get_span().end.clone(),
        },
        operator: operator_token,
        right_expr: rhs,
    }))
}

pub fn parse_not_expr(parser: &mut Parser) -> Result<ExprWrapper, Error> {
    let operator_token = parser.advance().clone();
    let rhs = parse_expr(parser, BindingPower::LogicalNot)?;

    Ok(ExprWrapper::new(PrefixExpr {
        span: Span {
            start: operator_token.span.start.clone(),
            end: rhs.get_span().end.clone(),
        },
        operator: operator_token,
        right_expr: rhs,
    }))
}

pub fn parse_await_expr(parser: &mut Parser) -> Result<ExprWrapper, Error> {
    let operator_token = parser.advance().clone();
    let rhs = parse_expr(parser, BindingPower::Await)?;

    Ok(ExprWrapper::new(PrefixExpr {
        span: Span {
            start: operator_token.span.start.clone(),
            end: rhs.get_span().end.clone(),
        },
        operator: operator_token,
        right_expr: rhs,
    }))
}

/// `*value` and `**value`
pub fn parse_starred_expr(parser: &mut Parser) -> Result<ExprWrapper, Error> {
    let operator_token = parser.advance().clone();
    let value = parse_expr(parser, BindingPower::BitwiseOr)?;

    Ok(ExprWrapper::new(StarredExpr {
        span: Span {
            start: operator_token.span.start.clone(),
            end: value.get_span().end.clone(),
        },
        is_double: operator_token.kind == TokenKind::Power,
        value,
    }))
}

pub fn parse_ternary_expr(parser: &mut Parser, left: ExprWrapper, _bp: BindingPower) -> Result<ExprWrapper, Error> {
    parser.advance();
    let test = parse_expr(parser, BindingPower::Ternary)?;
    parser.expect(TokenKind::Else)?;
    let orelse = parse_expr(parser, BindingPower::Lambda)?;

    Ok(ExprWrapper::new(TernaryExpr {
        span: Span {
            start: left.get_span().start.clone(),
            end: orelse.get_span().end.clone(),
        },
        body: left,
        test,
        orelse,
    }))
}

pub fn parse_lambda_expr(parser: &mut Parser) -> Result<ExprWrapper, Error> {
    let start = parser.advance().span.start.clone();
    let parameters = parse_parameters(parser, TokenKind::Colon)?;
    parser.expect(TokenKind::Colon)?;
    let body = parse_expr(parser, BindingPower::Default)?;

    Ok(ExprWrapper::new(LambdaExpr {
        span: Span {
            start,
            end: body.get_span().end.clone(),
        },
        parameters,
        body,
    }))
}

pub fn parse_yield_expr(parser: &mut Parser) -> Result<ExprWrapper, Error> {
    let start = parser.advance().span.start.clone();

    let is_from = parser.eat(TokenKind::From);
    let value = if is_from {
        Some(parse_expr(parser, BindingPower::Default)?)
    } else if parser.at_expression_start() {
        Some(parse_expr_list(parser)?)
    } else {
        None
    };

    Ok(ExprWrapper::new(YieldExpr {
        value,
        is_from,
        span: parser.span_from(&start),
    }))
}

fn at_comprehension(parser: &Parser) -> bool {
    parser.current_token_kind() == TokenKind::For
        || (parser.current_token_kind() == TokenKind::Async && parser.peek_kind(1) == TokenKind::For)
}

/// Parses one or more `for … in … if …` clauses.
fn parse_comprehension_clauses(parser: &mut Parser) -> Result<Vec<ComprehensionClause>, Error> {
    let mut clauses = vec![];

    while at_comprehension(parser) {
        let is_async = parser.eat(TokenKind::Async);
        parser.expect(TokenKind::For)?;
        let target = parse_target_list(parser)?;
        parser.expect(TokenKind::In)?;
        let iter = parse_expr(parser, BindingPower::Ternary)?;

        let mut conditions = vec![];
        while parser.eat(TokenKind::If) {
            conditions.push(parse_expr(parser, BindingPower::Ternary)?);
        }

        clauses.push(ComprehensionClause { target, iter, conditions, is_async });
    }

    Ok(clauses)
}

/// Parses the remaining `, element` items of a display up to `closing`.
fn parse_display_elements(
    parser: &mut Parser,
    mut elements: Vec<ExprWrapper>,
    closing: TokenKind,
) -> Result<Vec<ExprWrapper>, Error> {
    while parser.eat(TokenKind::Comma) {
        if parser.current_token_kind() == closing {
            break;
        }
        elements.push(parse_expr(parser, BindingPower::Default)?);
    }
    Ok(elements)
}

/// `( )`: grouping, tuples and generator expressions.
pub fn parse_grouping_expr(parser: &mut Parser) -> Result<ExprWrapper, Error> {
    let start = parser.advance().span.start.clone();

    if parser.eat(TokenKind::CloseParen) {
        return Ok(ExprWrapper::new(SequenceExpr {
            kind: SequenceKind::Tuple,
            elements: vec![],
            span: parser.span_from(&start),
        }));
    }

    let first = parse_expr(parser, BindingPower::Default)?;

    if at_comprehension(parser) {
        let clauses = parse_comprehension_clauses(parser)?;
        parser.expect(TokenKind::CloseParen)?;
        return Ok(ExprWrapper::new(ComprehensionExpr {
            kind: ComprehensionKind::Generator,
            element: first,
            value: None,
            clauses,
            span: parser.span_from(&start),
        }));
    }

    if parser.current_token_kind() == TokenKind::Comma {
        let elements = parse_display_elements(parser, vec![first], TokenKind::CloseParen)?;
        parser.expect(TokenKind::CloseParen)?;
        return Ok(ExprWrapper::new(SequenceExpr {
            kind: SequenceKind::Tuple,
            elements,
            span: parser.span_from(&start),
        }));
    }

    parser.expect(TokenKind::CloseParen)?;
    Ok(first)
}

/// `[ ]`: list displays and list comprehensions.
pub fn parse_list_expr(parser: &mut Parser) -> Result<ExprWrapper, Error> {
    let start = parser.advance().span.start.clone();

    if parser.eat(TokenKind::CloseBracket) {
        return Ok(ExprWrapper::new(SequenceExpr {
            kind: SequenceKind::List,
            elements: vec![],
            span: parser.span_from(&start),
        }));
    }

    let first = parse_expr(parser, BindingPower::Default)?;

    if at_comprehension(parser) {
        let clauses = parse_comprehension_clauses(parser)?;
        parser.expect(TokenKind::CloseBracket)?;
        return Ok(ExprWrapper::new(ComprehensionExpr {
            kind: ComprehensionKind::List,
            element: first,
            value: None,
            clauses,
            span: parser.span_from(&start),
        }));
    }

    let elements = parse_display_elements(parser, vec![first], TokenKind::CloseBracket)?;
    parser.expect(TokenKind::CloseBracket)?;

    Ok(ExprWrapper::new(SequenceExpr {
        kind: SequenceKind::List,
        elements,
        span: parser.span_from(&start),
    }))
}

fn parse_dict_entry(parser: &mut Parser) -> Result<DictEntry, Error> {
    if parser.eat(TokenKind::Power) {
        let value = parse_expr(parser, BindingPower::BitwiseOr)?;
        return Ok(DictEntry { key: None, value });
    }

    let key = parse_expr(parser, BindingPower::Default)?;
    parser.expect(TokenKind::Colon)?;
    let value = parse_expr(parser, BindingPower::Default)?;
    Ok(DictEntry { key: Some(key), value })
}

/// `{ }`: dict and set displays and their comprehensions.
pub fn parse_curly_expr(parser: &mut Parser) -> Result<ExprWrapper, Error> {
    let start = parser.advance().span.start.clone();

    if parser.eat(TokenKind::CloseCurly) {
        return Ok(ExprWrapper::new(DictExpr {
            entries: vec![],
            span: parser.span_from(&start),
        }));
    }

    let first_entry = if parser.current_token_kind() == TokenKind::Power {
        Some(parse_dict_entry(parser)?)
    } else {
        let first = parse_expr(parser, BindingPower::Default)?;

        if parser.eat(TokenKind::Colon) {
            let value = parse_expr(parser, BindingPower::Default)?;

            if at_comprehension(parser) {
                let clauses = parse_comprehension_clauses(parser)?;
                parser.expect(TokenKind::CloseCurly)?;
                return Ok(ExprWrapper::new(ComprehensionExpr {
                    kind: ComprehensionKind::Dict,
                    element: first,
                    value: Some(value),
                    clauses,
                    span: parser.span_from(&start),
                }));
            }

            Some(DictEntry { key: Some(first), value })
        } else {
            if at_comprehension(parser) {
                let clauses = parse_comprehension_clauses(parser)?;
                parser.expect(TokenKind::CloseCurly)?;
                return Ok(ExprWrapper::new(ComprehensionExpr {
                    kind: ComprehensionKind::Set,
                    element: first,
                    value: None,
                    clauses,
                    span: parser.span_from(&start),
                }));
            }

            let elements = parse_display_elements(parser, vec![first], TokenKind::CloseCurly)?;
            parser.expect(TokenKind::CloseCurly)?;
            return Ok(ExprWrapper::new(SequenceExpr {
                kind: SequenceKind::Set,
                elements,
                span: parser.span_from(&start),
            }));
        }
    };

    let mut entries: Vec<DictEntry> = first_entry.into_iter().collect();
    while parser.eat(TokenKind::Comma) {
        if parser.current_token_kind() == TokenKind::CloseCurly {
            break;
        }
        entries.push(parse_dict_entry(parser)?);
    }
    parser.expect(TokenKind::CloseCurly)?;

    Ok(ExprWrapper::new(DictExpr {
        entries,
        span: parser.span_from(&start),
    }))
}

/// Parses call arguments after the opening parenthesis, consuming the closing one.
pub fn parse_call_arguments(parser: &mut Parser) -> Result<(Vec<ExprWrapper>, Vec<KeywordArgument>), Error> {
    let mut arguments = vec![];
    let mut keywords = vec![];

    while parser.current_token_kind() != TokenKind::CloseParen {
        if parser.eat(TokenKind::Power) {
            let value = parse_expr(parser, BindingPower::Default)?;
            keywords.push(KeywordArgument { name: None, value });
        } else if parser.current_token_kind() == TokenKind::Identifier
            && parser.peek_kind(1) == TokenKind::Assignment
        {
            let name = parser.advance().value.clone();
            parser.advance();
            let value = parse_expr(parser, BindingPower::Default)?;
            keywords.push(KeywordArgument { name: Some(name), value });
        } else {
            let argument = parse_expr(parser, BindingPower::Default)?;

            if at_comprehension(parser) {
                let start = argument.get_span().start.clone();
                let clauses = parse_comprehension_clauses(parser)?;
                arguments.push(ExprWrapper::new(ComprehensionExpr {
                    kind: ComprehensionKind::Generator,
                    element: argument,
                    value: None,
                    clauses,
                    span: parser.span_from(&start),
                }));
            } else {
                arguments.push(argument);
            }
        }

        if !parser.eat(TokenKind::Comma) {
            break;
        }
    }

    parser.expect(TokenKind::CloseParen)?;
    Ok((arguments, keywords))
}

pub fn parse_call_expr(parser: &mut Parser, left: ExprWrapper, _bp: BindingPower) -> Result<ExprWrapper, Error> {
    parser.advance();

    let (arguments, keywords) = parse_call_arguments(parser)?;
    let start = left.get_span().start.clone();

    Ok(ExprWrapper::new(CallExpr {
        span: parser.span_from(&start),
        callee: left,
        arguments,
        keywords,
    }))
}

fn parse_slice_item(parser: &mut Parser) -> Result<ExprWrapper, Error> {
    let start = parser.get_position();
    let lower = if parser.current_token_kind() != TokenKind::Colon {
        Some(parse_expr(parser, BindingPower::Default)?)
    } else {
        None
    };

    if !parser.eat(TokenKind::Colon) {
        // Always `Some` here: the branch above parsed an expression
        return lower.ok_or_else(|| {
            Error::new(ErrorImpl::UnexpectedToken { token: describe(parser.current_token()) }, start)
        });
    }

    let ends_part = |kind: TokenKind| matches!(kind, TokenKind::Colon | TokenKind::Comma | TokenKind::CloseBracket);

    let upper = if !ends_part(parser.current_token_kind()) {
        Some(parse_expr(parser, BindingPower::Default)?)
    } else {
        None
    };

    let step = if parser.eat(TokenKind::Colon) && !ends_part(parser.current_token_kind()) {
        Some(parse_expr(parser, BindingPower::Default)?)
    } else {
        None
    };

    Ok(ExprWrapper::new(SliceExpr { lower, upper, step, span: parser.span_from(&start) }))
}

pub fn parse_subscript_expr(parser: &mut Parser, left: ExprWrapper, _bp: BindingPower) -> Result<ExprWrapper, Error> {
    parser.advance();

    let index_start = parser.get_position();
    let first = parse_slice_item(parser)?;
    let index = if parser.current_token_kind() == TokenKind::Comma {
        let mut elements = vec![first];
        while parser.eat(TokenKind::Comma) {
            if parser.current_token_kind() == TokenKind::CloseBracket {
                break;
            }
            elements.push(parse_slice_item(parser)?);
        }
        ExprWrapper::new(SequenceExpr {
            kind: SequenceKind::Tuple,
            elements,
            span: parser.span_from(&index_start),
        })
    } else {
        first
    };

    parser.expect(TokenKind::CloseBracket)?;
    let start = left.get_span().start.clone();

    Ok(ExprWrapper::new(SubscriptExpr {
        span: parser.span_from(&start),
        object: left,
        index,
    }))
}

pub fn parse_member_expr(parser: &mut Parser, left: ExprWrapper, _bp: BindingPower) -> Result<ExprWrapper, Error> {
    parser.advance();

    let error = Error::new(
        ErrorImpl::UnexpectedTokenDetailed {
            token: describe(parser.current_token()),
            message: String::from("expected attribute name after `.`"),
        },
        parser.get_position(),
    );
    let property = parser.expect_error(TokenKind::Identifier, Some(error))?;

    Ok(ExprWrapper::new(MemberExpr {
        span: Span {
            start: left.get_span().start.clone(),
            end: property.span.end.clone(),
        },
        object: left,
        property: property.value,
    }))
}

/// Whether an expression may appear on the left of `=`.
pub fn is_assignable(expr: &ExprWrapper) -> bool {
    match expr.get_expr_type() {
        ExprType::Symbol | ExprType::Member | ExprType::Subscript | ExprType::Starred => true,
        ExprType::Sequence => expr
            .downcast::<SequenceExpr>()
            .is_some_and(|sequence| sequence.kind != SequenceKind::Set && sequence.elements.iter().all(is_assignable)),
        _ => false,
    }
}
