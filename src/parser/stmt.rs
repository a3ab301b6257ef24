use crate::{
    ast::{
        ast::{Expr, Stmt, StmtWrapper},
        statements::{
            AssignStmt, AugAssignStmt, ClassDeclStmt, ExceptHandler, ExpressionStmt, FnDeclStmt,
            ForStmt, FromImportStmt, IfStmt, ImportName, ImportStmt, KeywordStmt, Parameter,
            ParameterKind, RaiseStmt, ReturnStmt, TryStmt, WhileStmt, WithItem, WithStmt,
        },
    },
    errors::errors::{Error, ErrorImpl},
    lexer::tokens::TokenKind,
    parser::{
        expr::{is_assignable, parse_call_arguments, parse_expr, parse_expr_list, parse_target_list},
        lookups::BindingPower,
    },
    Position, Span,
};

use super::parser::{describe, Parser};

pub fn parse_stmt(parser: &mut Parser) -> Result<StmtWrapper, Error> {
    if let Some(handler) = parser.get_stmt_lookup().get(&parser.current_token_kind()).copied() {
        return handler(parser);
    }

    let start = parser.get_position();
    let expr = parse_expr_list(parser)?;

    let stmt = match parser.current_token_kind() {
        TokenKind::Assignment => {
            let mut chain = vec![expr];
            while parser.eat(TokenKind::Assignment) {
                chain.push(parse_expr_list(parser)?);
            }

            // `a = b = value`: everything but the last link is a target
            let value = chain.pop();
            for target in &chain {
                ensure_assignable(target)?;
            }

            StmtWrapper::new(AssignStmt {
                targets: chain,
                value,
                annotation: None,
                span: parser.span_from(&start),
            })
        }
        TokenKind::Colon => {
            parser.advance();
            ensure_assignable(&expr)?;
            let annotation = parse_expr(parser, BindingPower::Default)?;
            let value = if parser.eat(TokenKind::Assignment) {
                Some(parse_expr_list(parser)?)
            } else {
                None
            };

            StmtWrapper::new(AssignStmt {
                targets: vec![expr],
                value,
                annotation: Some(annotation),
                span: parser.span_from(&start),
            })
        }
        kind if kind.is_augmented_assignment() => {
            ensure_assignable(&expr)?;
            let operator = parser.advance().clone();
            let value = parse_expr_list(parser)?;

            StmtWrapper::new(AugAssignStmt {
                target: expr,
                operator,
                value,
                span: parser.span_from(&start),
            })
        }
        _ => StmtWrapper::new(ExpressionStmt {
            span: expr.get_span().clone(),
            expression: expr,
        }),
    };

    end_simple_stmt(parser)?;
    Ok(stmt)
}

fn ensure_assignable(target: &crate::ast::ast::ExprWrapper) -> Result<(), Error> {
    if is_assignable(target) {
        return Ok(());
    }

    Err(Error::new(
        ErrorImpl::UnexpectedTokenDetailed {
            token: String::from("="),
            message: String::from("cannot assign to this expression"),
        },
        target.get_span().start.clone(),
    ))
}

/// Consumes the terminator of a simple statement.
fn end_simple_stmt(parser: &mut Parser) -> Result<(), Error> {
    match parser.current_token_kind() {
        TokenKind::Semicolon | TokenKind::Newline => {
            parser.advance();
            Ok(())
        }
        TokenKind::EOF | TokenKind::Dedent => Ok(()),
        _ => Err(Error::new(
            ErrorImpl::UnexpectedTokenDetailed {
                token: describe(parser.current_token()),
                message: String::from("expected end of statement"),
            },
            parser.get_position(),
        )),
    }
}

/// Parses `: <suite>`, either an indented block or simple statements on the same line.
fn parse_block(parser: &mut Parser) -> Result<Vec<StmtWrapper>, Error> {
    parser.expect(TokenKind::Colon)?;

    let mut body = vec![];

    if parser.eat(TokenKind::Newline) {
        let error = Error::new(
            ErrorImpl::UnexpectedTokenDetailed {
                token: describe(parser.current_token()),
                message: String::from("expected an indented block"),
            },
            parser.get_position(),
        );
        parser.expect_error(TokenKind::Indent, Some(error))?;

        while !matches!(parser.current_token_kind(), TokenKind::Dedent | TokenKind::EOF) {
            if parser.eat(TokenKind::Newline) {
                continue;
            }
            body.push(parse_stmt(parser)?);
        }
        parser.eat(TokenKind::Dedent);
    } else {
        body.push(parse_stmt(parser)?);
        while parser.previous_token().kind == TokenKind::Semicolon
            && !matches!(parser.current_token_kind(), TokenKind::Newline | TokenKind::Dedent | TokenKind::EOF)
        {
            body.push(parse_stmt(parser)?);
        }
    }

    Ok(body)
}

/// A compound statement ends where its last nested statement ends.
fn compound_span(parser: &Parser, start: Position, bodies: &[&[StmtWrapper]]) -> Span {
    let end = bodies
        .iter()
        .rev()
        .find_map(|body| body.last())
        .map(|stmt| stmt.get_span().end.clone());

    match end {
        Some(end) => Span { start, end },
        None => parser.span_from(&start),
    }
}

/// Parses a parameter list up to (not including) `closing`.
///
/// Lambdas close on `:` and therefore never carry annotations.
pub fn parse_parameters(parser: &mut Parser, closing: TokenKind) -> Result<Vec<Parameter>, Error> {
    let mut parameters = vec![];
    let mut default_kind = ParameterKind::Positional;

    while parser.current_token_kind() != closing {
        let start = parser.get_position();

        // Positional-only marker
        if parser.eat(TokenKind::Slash) {
            if !parser.eat(TokenKind::Comma) {
                break;
            }
            continue;
        }

        let kind = if parser.eat(TokenKind::Star) {
            default_kind = ParameterKind::KeywordOnly;
            // Bare `*` only switches to keyword-only parameters
            if parser.current_token_kind() != TokenKind::Identifier {
                if !parser.eat(TokenKind::Comma) {
                    break;
                }
                continue;
            }
            ParameterKind::VarPositional
        } else if parser.eat(TokenKind::Power) {
            ParameterKind::VarKeyword
        } else {
            default_kind
        };

        let error = Error::new(
            ErrorImpl::UnexpectedTokenDetailed {
                token: describe(parser.current_token()),
                message: String::from("expected parameter name"),
            },
            parser.get_position(),
        );
        let name = parser.expect_error(TokenKind::Identifier, Some(error))?.value;

        let annotation = if closing != TokenKind::Colon && parser.eat(TokenKind::Colon) {
            Some(parse_expr(parser, BindingPower::Default)?)
        } else {
            None
        };

        let default = if parser.eat(TokenKind::Assignment) {
            Some(parse_expr(parser, BindingPower::Default)?)
        } else {
            None
        };

        parameters.push(Parameter {
            name,
            annotation,
            default,
            kind,
            span: parser.span_from(&start),
        });

        if !parser.eat(TokenKind::Comma) {
            break;
        }
    }

    Ok(parameters)
}

fn parse_fn_decl(
    parser: &mut Parser,
    start: Position,
    decorators: Vec<crate::ast::ast::ExprWrapper>,
    is_async: bool,
) -> Result<StmtWrapper, Error> {
    parser.expect(TokenKind::Def)?;

    let error = Error::new(
        ErrorImpl::UnexpectedTokenDetailed {
            token: describe(parser.current_token()),
            message: String::from("expected function name after `def`"),
        },
        parser.get_position(),
    );
    let name = parser.expect_error(TokenKind::Identifier, Some(error))?.value;

    parser.expect(TokenKind::OpenParen)?;
    let parameters = parse_parameters(parser, TokenKind::CloseParen)?;
    parser.expect(TokenKind::CloseParen)?;

    let return_annotation = if parser.eat(TokenKind::Arrow) {
        Some(parse_expr(parser, BindingPower::Default)?)
    } else {
        None
    };

    let body = parse_block(parser)?;

    Ok(StmtWrapper::new(FnDeclStmt {
        span: compound_span(parser, start, &[body.as_slice()]),
        name,
        parameters,
        return_annotation,
        body,
        decorators,
        is_async,
    }))
}

pub fn parse_fn_decl_stmt(parser: &mut Parser) -> Result<StmtWrapper, Error> {
    let start = parser.get_position();
    parse_fn_decl(parser, start, vec![], false)
}

fn parse_class_decl(
    parser: &mut Parser,
    start: Position,
    decorators: Vec<crate::ast::ast::ExprWrapper>,
) -> Result<StmtWrapper, Error> {
    parser.expect(TokenKind::Class)?;
    let name = parser.expect(TokenKind::Identifier)?.value;

    let (bases, keywords) = if parser.eat(TokenKind::OpenParen) {
        parse_call_arguments(parser)?
    } else {
        (vec![], vec![])
    };

    let body = parse_block(parser)?;

    Ok(StmtWrapper::new(ClassDeclStmt {
        span: compound_span(parser, start, &[body.as_slice()]),
        name,
        bases,
        keywords,
        body,
        decorators,
    }))
}

pub fn parse_class_decl_stmt(parser: &mut Parser) -> Result<StmtWrapper, Error> {
    let start = parser.get_position();
    parse_class_decl(parser, start, vec![])
}

pub fn parse_decorated_stmt(parser: &mut Parser) -> Result<StmtWrapper, Error> {
    let start = parser.get_position();

    let mut decorators = vec![];
    while parser.eat(TokenKind::At) {
        decorators.push(parse_expr(parser, BindingPower::Default)?);
        parser.expect(TokenKind::Newline)?;
        while parser.eat(TokenKind::Newline) {}
    }

    match parser.current_token_kind() {
        TokenKind::Def => parse_fn_decl(parser, start, decorators, false),
        TokenKind::Async => {
            parser.advance();
            parse_fn_decl(parser, start, decorators, true)
        }
        TokenKind::Class => parse_class_decl(parser, start, decorators),
        _ => Err(Error::new(
            ErrorImpl::UnexpectedTokenDetailed {
                token: describe(parser.current_token()),
                message: String::from("expected `def` or `class` after decorator"),
            },
            parser.get_position(),
        )),
    }
}

pub fn parse_async_stmt(parser: &mut Parser) -> Result<StmtWrapper, Error> {
    let start = parser.advance().span.start.clone();

    match parser.current_token_kind() {
        TokenKind::Def => parse_fn_decl(parser, start, vec![], true),
        TokenKind::For => parse_for(parser, start, true),
        TokenKind::With => parse_with(parser, start, true),
        _ => Err(Error::new(
            ErrorImpl::UnexpectedTokenDetailed {
                token: describe(parser.current_token()),
                message: String::from("expected `def`, `for` or `with` after `async`"),
            },
            parser.get_position(),
        )),
    }
}

pub fn parse_return_stmt(parser: &mut Parser) -> Result<StmtWrapper, Error> {
    let start = parser.advance().span.start.clone();

    let value = if parser.at_expression_start() {
        Some(parse_expr_list(parser)?)
    } else {
        None
    };

    let span = parser.span_from(&start);
    end_simple_stmt(parser)?;

    Ok(StmtWrapper::new(ReturnStmt { value, span }))
}

pub fn parse_raise_stmt(parser: &mut Parser) -> Result<StmtWrapper, Error> {
    let start = parser.advance().span.start.clone();

    let exception = if parser.at_expression_start() {
        Some(parse_expr(parser, BindingPower::Default)?)
    } else {
        None
    };

    let cause = if exception.is_some() && parser.eat(TokenKind::From) {
        Some(parse_expr(parser, BindingPower::Default)?)
    } else {
        None
    };

    let span = parser.span_from(&start);
    end_simple_stmt(parser)?;

    Ok(StmtWrapper::new(RaiseStmt { exception, cause, span }))
}

fn parse_dotted_name(parser: &mut Parser) -> Result<String, Error> {
    let mut path = parser.expect(TokenKind::Identifier)?.value;
    while parser.eat(TokenKind::Dot) {
        path.push('.');
        path.push_str(&parser.expect(TokenKind::Identifier)?.value);
    }
    Ok(path)
}

fn parse_alias(parser: &mut Parser) -> Result<Option<String>, Error> {
    if parser.eat(TokenKind::As) {
        Ok(Some(parser.expect(TokenKind::Identifier)?.value))
    } else {
        Ok(None)
    }
}

pub fn parse_import_stmt(parser: &mut Parser) -> Result<StmtWrapper, Error> {
    let start = parser.advance().span.start.clone();

    let mut names = vec![];
    loop {
        let path = parse_dotted_name(parser)?;
        let alias = parse_alias(parser)?;
        names.push(ImportName { path, alias });

        if !parser.eat(TokenKind::Comma) {
            break;
        }
    }

    let span = parser.span_from(&start);
    end_simple_stmt(parser)?;

    Ok(StmtWrapper::new(ImportStmt { names, span }))
}

pub fn parse_from_import_stmt(parser: &mut Parser) -> Result<StmtWrapper, Error> {
    let start = parser.advance().span.start.clone();

    // Relative imports keep their leading dots
    let mut module = String::new();
    loop {
        match parser.current_token_kind() {
            TokenKind::Dot => module.push('.'),
            TokenKind::Ellipsis => module.push_str("..."),
            _ => break,
        }
        parser.advance();
    }
    if parser.current_token_kind() == TokenKind::Identifier {
        module.push_str(&parse_dotted_name(parser)?);
    }

    parser.expect(TokenKind::Import)?;

    let mut names = vec![];
    let is_wildcard = parser.eat(TokenKind::Star);

    if !is_wildcard {
        let parenthesised = parser.eat(TokenKind::OpenParen);
        loop {
            let path = parser.expect(TokenKind::Identifier)?.value;
            let alias = parse_alias(parser)?;
            names.push(ImportName { path, alias });

            if !parser.eat(TokenKind::Comma) {
                break;
            }
            if parenthesised && parser.current_token_kind() == TokenKind::CloseParen {
                break;
            }
        }
        if parenthesised {
            parser.expect(TokenKind::CloseParen)?;
        }
    }

    let span = parser.span_from(&start);
    end_simple_stmt(parser)?;

    Ok(StmtWrapper::new(FromImportStmt {
        module,
        names,
        is_wildcard,
        span,
    }))
}

/// Handles both `if` and `elif`; an `elif` becomes a nested `IfStmt` in `orelse`.
pub fn parse_if_stmt(parser: &mut Parser) -> Result<StmtWrapper, Error> {
    let start = parser.advance().span.start.clone();

    let test = parse_expr(parser, BindingPower::Default)?;
    let body = parse_block(parser)?;

    let orelse = match parser.current_token_kind() {
        TokenKind::Elif => vec![parse_if_stmt(parser)?],
        TokenKind::Else => {
            parser.advance();
            parse_block(parser)?
        }
        _ => vec![],
    };

    Ok(StmtWrapper::new(IfStmt {
        span: compound_span(parser, start, &[body.as_slice(), orelse.as_slice()]),
        test,
        body,
        orelse,
    }))
}

fn parse_else_block(parser: &mut Parser) -> Result<Vec<StmtWrapper>, Error> {
    if parser.eat(TokenKind::Else) {
        parse_block(parser)
    } else {
        Ok(vec![])
    }
}

pub fn parse_while_stmt(parser: &mut Parser) -> Result<StmtWrapper, Error> {
    let start = parser.advance().span.start.clone();

    let test = parse_expr(parser, BindingPower::Default)?;
    let body = parse_block(parser)?;
    let orelse = parse_else_block(parser)?;

    Ok(StmtWrapper::new(WhileStmt {
        span: compound_span(parser, start, &[body.as_slice(), orelse.as_slice()]),
        test,
        body,
        orelse,
    }))
}

fn parse_for(parser: &mut Parser, start: Position, is_async: bool) -> Result<StmtWrapper, Error> {
    parser.expect(TokenKind::For)?;

    let target = parse_target_list(parser)?;
    parser.expect(TokenKind::In)?;
    let iter = parse_expr_list(parser)?;

    let body = parse_block(parser)?;
    let orelse = parse_else_block(parser)?;

    Ok(StmtWrapper::new(ForStmt {
        span: compound_span(parser, start, &[body.as_slice(), orelse.as_slice()]),
        target,
        iter,
        body,
        orelse,
        is_async,
    }))
}

pub fn parse_for_stmt(parser: &mut Parser) -> Result<StmtWrapper, Error> {
    let start = parser.get_position();
    parse_for(parser, start, false)
}

fn parse_with(parser: &mut Parser, start: Position, is_async: bool) -> Result<StmtWrapper, Error> {
    parser.expect(TokenKind::With)?;

    let mut items = vec![];
    loop {
        let context = parse_expr(parser, BindingPower::Default)?;
        let target = if parser.eat(TokenKind::As) {
            Some(parse_expr(parser, BindingPower::Relational)?)
        } else {
            None
        };
        items.push(WithItem { context, target });

        if !parser.eat(TokenKind::Comma) {
            break;
        }
    }

    let body = parse_block(parser)?;

    Ok(StmtWrapper::new(WithStmt {
        span: compound_span(parser, start, &[body.as_slice()]),
        items,
        body,
        is_async,
    }))
}

pub fn parse_with_stmt(parser: &mut Parser) -> Result<StmtWrapper, Error> {
    let start = parser.get_position();
    parse_with(parser, start, false)
}

pub fn parse_try_stmt(parser: &mut Parser) -> Result<StmtWrapper, Error> {
    let start = parser.advance().span.start.clone();
    let body = parse_block(parser)?;

    let mut handlers = vec![];
    while parser.current_token_kind() == TokenKind::Except {
        let handler_start = parser.advance().span.start.clone();
        // except* groups are treated like plain handlers
        parser.eat(TokenKind::Star);

        let exception = if parser.current_token_kind() != TokenKind::Colon {
            Some(parse_expr(parser, BindingPower::Default)?)
        } else {
            None
        };
        let name = parse_alias(parser)?;
        let handler_body = parse_block(parser)?;

        handlers.push(ExceptHandler {
            span: compound_span(parser, handler_start, &[handler_body.as_slice()]),
            exception,
            name,
            body: handler_body,
        });
    }

    let orelse = parse_else_block(parser)?;
    let finalbody = if parser.eat(TokenKind::Finally) {
        parse_block(parser)?
    } else {
        vec![]
    };

    if handlers.is_empty() && finalbody.is_empty() {
        return Err(Error::new(
            ErrorImpl::UnexpectedTokenDetailed {
                token: describe(parser.current_token()),
                message: String::from("expected `except` or `finally` after `try` block"),
            },
            parser.get_position(),
        ));
    }

    let handler_bodies: Vec<&[StmtWrapper]> = handlers.iter().map(|handler| handler.body.as_slice()).collect();
    let mut bodies: Vec<&[StmtWrapper]> = vec![body.as_slice()];
    bodies.extend(handler_bodies);
    bodies.push(orelse.as_slice());
    bodies.push(finalbody.as_slice());
    let span = compound_span(parser, start, &bodies);

    Ok(StmtWrapper::new(TryStmt {
        body,
        handlers,
        orelse,
        finalbody,
        span,
    }))
}

/// `pass`, `break`, `continue`, `global`, `nonlocal`, `del` and `assert`.
pub fn parse_keyword_stmt(parser: &mut Parser) -> Result<StmtWrapper, Error> {
    let keyword_token = parser.advance().clone();

    let mut arguments = vec![];
    if !matches!(keyword_token.kind, TokenKind::Pass | TokenKind::Break | TokenKind::Continue) {
        while parser.at_expression_start() {
            arguments.push(parse_expr(parser, BindingPower::Default)?);
            if !parser.eat(TokenKind::Comma) {
                break;
            }
        }
    }

    let span = parser.span_from(&keyword_token.span.start);
    end_simple_stmt(parser)?;

    Ok(StmtWrapper::new(KeywordStmt {
        keyword: keyword_token.kind,
        arguments,
        span,
    }))
}
