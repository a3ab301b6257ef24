use std::rc::Rc;

use lazy_static::lazy_static;
use regex::Regex;

use crate::{errors::errors::{Error, ErrorImpl}, Position, Span, MK_DEFAULT_HANDLER, MK_TOKEN};

use super::tokens::{Token, TokenKind, RESERVED_LOOKUP};

pub type RegexHandler = fn(&mut Lexer, &Regex);

pub struct RegexPattern {
    regex: Regex,
    handler: RegexHandler,
}

impl RegexPattern {
    fn new(pattern: &str, handler: RegexHandler) -> Self {
        RegexPattern {
            // Every pattern only ever matches at the lexer's current position
            regex: Regex::new(&format!("^(?:{})", pattern)).unwrap(),
            handler,
        }
    }
}

lazy_static! {
    static ref PATTERNS: Vec<RegexPattern> = vec![
        RegexPattern::new("[ \\t\\f]+", skip_handler),
        RegexPattern::new("\\\\\\r?\\n", skip_handler),
        RegexPattern::new("#[^\\r\\n]*", skip_handler),
        RegexPattern::new("\\r?\\n", newline_handler),
        RegexPattern::new(
            "[rRbBuUfF]{0,2}(?:\"\"\"(?s:.*?)\"\"\"|'''(?s:.*?)'''|\"(?:[^\"\\\\\\r\\n]|\\\\.)*\"|'(?:[^'\\\\\\r\\n]|\\\\.)*')",
            string_handler,
        ),
        RegexPattern::new(
            "0[xX][0-9a-fA-F_]+|0[oO][0-7_]+|0[bB][01_]+|(?:[0-9][0-9_]*(?:\\.[0-9_]*)?|\\.[0-9][0-9_]*)(?:[eE][+-]?[0-9_]+)?[jJ]?",
            number_handler,
        ),
        RegexPattern::new("[\\p{L}_][\\p{L}\\p{N}_]*", symbol_handler),
        RegexPattern::new("\\.\\.\\.", MK_DEFAULT_HANDLER!(TokenKind::Ellipsis, "...")),
        RegexPattern::new("\\*\\*=", MK_DEFAULT_HANDLER!(TokenKind::PowerEquals, "**=")),
        RegexPattern::new("//=", MK_DEFAULT_HANDLER!(TokenKind::DoubleSlashEquals, "//=")),
        RegexPattern::new("<<=", MK_DEFAULT_HANDLER!(TokenKind::ShiftLeftEquals, "<<=")),
        RegexPattern::new(">>=", MK_DEFAULT_HANDLER!(TokenKind::ShiftRightEquals, ">>=")),
        RegexPattern::new("->", MK_DEFAULT_HANDLER!(TokenKind::Arrow, "->")),
        RegexPattern::new("\\*\\*", MK_DEFAULT_HANDLER!(TokenKind::Power, "**")),
        RegexPattern::new("//", MK_DEFAULT_HANDLER!(TokenKind::DoubleSlash, "//")),
        RegexPattern::new("==", MK_DEFAULT_HANDLER!(TokenKind::Equals, "==")),
        RegexPattern::new("!=", MK_DEFAULT_HANDLER!(TokenKind::NotEquals, "!=")),
        RegexPattern::new("<=", MK_DEFAULT_HANDLER!(TokenKind::LessEquals, "<=")),
        RegexPattern::new(">=", MK_DEFAULT_HANDLER!(TokenKind::GreaterEquals, ">=")),
        RegexPattern::new("<<", MK_DEFAULT_HANDLER!(TokenKind::ShiftLeft, "<<")),
        RegexPattern::new(">>", MK_DEFAULT_HANDLER!(TokenKind::ShiftRight, ">>")),
        RegexPattern::new("\\+=", MK_DEFAULT_HANDLER!(TokenKind::PlusEquals, "+=")),
        RegexPattern::new("-=", MK_DEFAULT_HANDLER!(TokenKind::MinusEquals, "-=")),
        RegexPattern::new("\\*=", MK_DEFAULT_HANDLER!(TokenKind::StarEquals, "*=")),
        RegexPattern::new("/=", MK_DEFAULT_HANDLER!(TokenKind::SlashEquals, "/=")),
        RegexPattern::new("%=", MK_DEFAULT_HANDLER!(TokenKind::PercentEquals, "%=")),
        RegexPattern::new("&=", MK_DEFAULT_HANDLER!(TokenKind::AmpersandEquals, "&=")),
        RegexPattern::new("\\|=", MK_DEFAULT_HANDLER!(TokenKind::PipeEquals, "|=")),
        RegexPattern::new("\\^=", MK_DEFAULT_HANDLER!(TokenKind::CaretEquals, "^=")),
        RegexPattern::new("@=", MK_DEFAULT_HANDLER!(TokenKind::AtEquals, "@=")),
        RegexPattern::new("\\(", MK_DEFAULT_HANDLER!(TokenKind::OpenParen, "(")),
        RegexPattern::new("\\)", MK_DEFAULT_HANDLER!(TokenKind::CloseParen, ")")),
        RegexPattern::new("\\[", MK_DEFAULT_HANDLER!(TokenKind::OpenBracket, "[")),
        RegexPattern::new("\\]", MK_DEFAULT_HANDLER!(TokenKind::CloseBracket, "]")),
        RegexPattern::new("\\{", MK_DEFAULT_HANDLER!(TokenKind::OpenCurly, "{")),
        RegexPattern::new("\\}", MK_DEFAULT_HANDLER!(TokenKind::CloseCurly, "}")),
        RegexPattern::new(",", MK_DEFAULT_HANDLER!(TokenKind::Comma, ",")),
        RegexPattern::new(":", MK_DEFAULT_HANDLER!(TokenKind::Colon, ":")),
        RegexPattern::new(";", MK_DEFAULT_HANDLER!(TokenKind::Semicolon, ";")),
        RegexPattern::new("\\.", MK_DEFAULT_HANDLER!(TokenKind::Dot, ".")),
        RegexPattern::new("=", MK_DEFAULT_HANDLER!(TokenKind::Assignment, "=")),
        RegexPattern::new("<", MK_DEFAULT_HANDLER!(TokenKind::Less, "<")),
        RegexPattern::new(">", MK_DEFAULT_HANDLER!(TokenKind::Greater, ">")),
        RegexPattern::new("\\+", MK_DEFAULT_HANDLER!(TokenKind::Plus, "+")),
        RegexPattern::new("-", MK_DEFAULT_HANDLER!(TokenKind::Dash, "-")),
        RegexPattern::new("\\*", MK_DEFAULT_HANDLER!(TokenKind::Star, "*")),
        RegexPattern::new("/", MK_DEFAULT_HANDLER!(TokenKind::Slash, "/")),
        RegexPattern::new("%", MK_DEFAULT_HANDLER!(TokenKind::Percent, "%")),
        RegexPattern::new("&", MK_DEFAULT_HANDLER!(TokenKind::Ampersand, "&")),
        RegexPattern::new("\\|", MK_DEFAULT_HANDLER!(TokenKind::Pipe, "|")),
        RegexPattern::new("\\^", MK_DEFAULT_HANDLER!(TokenKind::Caret, "^")),
        RegexPattern::new("~", MK_DEFAULT_HANDLER!(TokenKind::Tilde, "~")),
        RegexPattern::new("@", MK_DEFAULT_HANDLER!(TokenKind::At, "@")),
    ];
}

pub struct Lexer {
    tokens: Vec<Token>,
    source: String,
    pos: usize,
    file: Rc<String>,
    /// Open bracket depth; newlines inside brackets are not significant
    nesting: usize,
    /// Indentation widths of the enclosing blocks, innermost last
    indents: Vec<usize>,
    at_line_start: bool,
}

impl Lexer {
    pub fn new(source: String, file: Option<String>) -> Lexer {
        let file_name = if let Some(file) = file {
            Rc::new(file)
        } else {
            Rc::new(String::from("<string>"))
        };

        Lexer {
            tokens: vec![],
            source,
            pos: 0,
            file: file_name,
            nesting: 0,
            indents: vec![0],
            at_line_start: true,
        }
    }

    pub fn advance_n(&mut self, n: usize) {
        self.pos += n;
    }

    pub fn push(&mut self, token: Token) {
        match token.kind {
            TokenKind::OpenParen | TokenKind::OpenBracket | TokenKind::OpenCurly => {
                self.nesting += 1
            }
            TokenKind::CloseParen | TokenKind::CloseBracket | TokenKind::CloseCurly => {
                self.nesting = self.nesting.saturating_sub(1)
            }
            _ => {}
        }
        self.tokens.push(token);
    }

    pub fn remainder(&self) -> &str {
        &self.source[self.pos..]
    }

    pub fn at_eof(&self) -> bool {
        self.pos >= self.source.len()
    }

    pub fn position(&self) -> Position {
        Position(self.pos as u32, Rc::clone(&self.file))
    }

    /// Span covering the next `len` bytes.
    pub fn span_of(&self, len: usize) -> Span {
        Span {
            start: self.position(),
            end: Position((self.pos + len) as u32, Rc::clone(&self.file)),
        }
    }

    fn last_kind(&self) -> Option<TokenKind> {
        self.tokens.last().map(|token| token.kind)
    }

    fn push_layout(&mut self, kind: TokenKind) {
        let span = self.span_of(0);
        self.push(MK_TOKEN!(kind, String::new(), span));
    }

    /// Measures the indentation of a logical line and emits `Indent`/`Dedent` tokens.
    ///
    /// Blank and comment-only lines never change the indentation level.
    fn handle_indentation(&mut self) -> Result<(), Error> {
        self.at_line_start = false;

        let mut width = 0;
        let mut consumed = 0;
        for ch in self.remainder().chars() {
            match ch {
                ' ' => width += 1,
                '\t' => width = (width / 8 + 1) * 8,
                '\x0c' => width = 0,
                _ => break,
            }
            consumed += ch.len_utf8();
        }
        self.advance_n(consumed);

        match self.remainder().chars().next() {
            None | Some('\n') | Some('\r') | Some('#') => return Ok(()),
            _ => {}
        }

        let current = *self.indents.last().unwrap_or(&0);
        if width > current {
            self.indents.push(width);
            self.push_layout(TokenKind::Indent);
        } else if width < current {
            while *self.indents.last().unwrap_or(&0) > width {
                self.indents.pop();
                self.push_layout(TokenKind::Dedent);
            }
            if *self.indents.last().unwrap_or(&0) != width {
                return Err(Error::new(ErrorImpl::InconsistentIndentation { width }, self.position()));
            }
        }

        Ok(())
    }

    fn finish(&mut self) {
        if !matches!(self.last_kind(), None | Some(TokenKind::Newline) | Some(TokenKind::Dedent)) {
            self.push_layout(TokenKind::Newline);
        }
        while self.indents.len() > 1 {
            self.indents.pop();
            self.push_layout(TokenKind::Dedent);
        }
        self.push_layout(TokenKind::EOF);
    }
}

fn matched_len(lexer: &Lexer, regex: &Regex) -> usize {
    regex.find(lexer.remainder()).map(|m| m.end()).unwrap_or(0)
}

fn skip_handler(lexer: &mut Lexer, regex: &Regex) {
    let len = matched_len(lexer, regex);
    lexer.advance_n(len);
}

fn newline_handler(lexer: &mut Lexer, regex: &Regex) {
    let len = matched_len(lexer, regex);

    if lexer.nesting == 0 {
        if !matches!(lexer.last_kind(), None | Some(TokenKind::Newline) | Some(TokenKind::Indent) | Some(TokenKind::Dedent)) {
            let span = lexer.span_of(len);
            lexer.push(MK_TOKEN!(TokenKind::Newline, String::from("\n"), span));
        }
        lexer.at_line_start = true;
    }

    lexer.advance_n(len);
}

fn number_handler(lexer: &mut Lexer, regex: &Regex) {
    let len = matched_len(lexer, regex);
    let matched = lexer.remainder()[..len].to_string();
    let span = lexer.span_of(len);

    lexer.push(MK_TOKEN!(TokenKind::Number, matched, span));
    lexer.advance_n(len);
}

/// String tokens keep their prefix and quotes; the parser decides what they are.
fn string_handler(lexer: &mut Lexer, regex: &Regex) {
    let len = matched_len(lexer, regex);
    let matched = lexer.remainder()[..len].to_string();
    let span = lexer.span_of(len);

    lexer.push(MK_TOKEN!(TokenKind::String, matched, span));
    lexer.advance_n(len);
}

fn symbol_handler(lexer: &mut Lexer, regex: &Regex) {
    let len = matched_len(lexer, regex);
    let value = lexer.remainder()[..len].to_string();
    let span = lexer.span_of(len);

    if let Some(kind) = RESERVED_LOOKUP.get(value.as_str()) {
        lexer.push(MK_TOKEN!(*kind, value, span));
    } else {
        lexer.push(MK_TOKEN!(TokenKind::Identifier, value, span));
    }

    lexer.advance_n(len);
}

pub fn tokenize(source: String, file: Option<String>) -> Result<Vec<Token>, Error> {
    let mut lex = Lexer::new(source, file);

    while !lex.at_eof() {
        if lex.at_line_start && lex.nesting == 0 {
            lex.handle_indentation()?;
            continue;
        }

        let pattern = PATTERNS
            .iter()
            .find(|pattern| pattern.regex.find(lex.remainder()).is_some_and(|m| m.end() > 0));

        match pattern {
            Some(pattern) => (pattern.handler)(&mut lex, &pattern.regex),
            None => {
                let token = lex.remainder().chars().next().map(String::from).unwrap_or_default();
                return Err(Error::new(ErrorImpl::UnrecognisedToken { token }, lex.position()));
            }
        }
    }

    lex.finish();
    Ok(lex.tokens)
}
