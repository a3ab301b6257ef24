use lazy_static::lazy_static;
use std::{collections::HashMap, fmt::Display};

use crate::Span;

lazy_static! {
    pub static ref RESERVED_LOOKUP: HashMap<&'static str, TokenKind> = {
        let mut map = HashMap::new();
        map.insert("def", TokenKind::Def);
        map.insert("class", TokenKind::Class);
        map.insert("return", TokenKind::Return);
        map.insert("yield", TokenKind::Yield);
        map.insert("raise", TokenKind::Raise);
        map.insert("import", TokenKind::Import);
        map.insert("from", TokenKind::From);
        map.insert("as", TokenKind::As);
        map.insert("if", TokenKind::If);
        map.insert("elif", TokenKind::Elif);
        map.insert("else", TokenKind::Else);
        map.insert("for", TokenKind::For);
        map.insert("while", TokenKind::While);
        map.insert("in", TokenKind::In);
        map.insert("is", TokenKind::Is);
        map.insert("not", TokenKind::Not);
        map.insert("and", TokenKind::And);
        map.insert("or", TokenKind::Or);
        map.insert("with", TokenKind::With);
        map.insert("try", TokenKind::Try);
        map.insert("except", TokenKind::Except);
        map.insert("finally", TokenKind::Finally);
        map.insert("lambda", TokenKind::Lambda);
        map.insert("pass", TokenKind::Pass);
        map.insert("break", TokenKind::Break);
        map.insert("continue", TokenKind::Continue);
        map.insert("global", TokenKind::Global);
        map.insert("nonlocal", TokenKind::Nonlocal);
        map.insert("del", TokenKind::Del);
        map.insert("assert", TokenKind::Assert);
        map.insert("async", TokenKind::Async);
        map.insert("await", TokenKind::Await);
        map.insert("True", TokenKind::True);
        map.insert("False", TokenKind::False);
        map.insert("None", TokenKind::None);
        map
    };
}

#[derive(Debug, PartialEq, Eq, Clone, Copy, Hash)]
pub enum TokenKind {
    EOF,
    Number,
    String,
    Identifier,

    // Layout
    Newline,
    Indent,
    Dedent,

    OpenBracket,
    CloseBracket,
    OpenCurly,
    CloseCurly,
    OpenParen,
    CloseParen,

    Assignment, // =
    Equals,     // ==
    NotEquals,  // !=

    Less,
    LessEquals,
    Greater,
    GreaterEquals,

    Dot,
    Ellipsis,
    Semicolon,
    Colon,
    Comma,
    Arrow,
    At,

    PlusEquals,
    MinusEquals,
    StarEquals,
    SlashEquals,
    DoubleSlashEquals,
    PercentEquals,
    PowerEquals,
    AmpersandEquals,
    PipeEquals,
    CaretEquals,
    ShiftLeftEquals,
    ShiftRightEquals,
    AtEquals,

    Plus,
    Dash,
    Slash,
    DoubleSlash,
    Star,
    Power,
    Percent,
    Ampersand,
    Pipe,
    Caret,
    Tilde,
    ShiftLeft,
    ShiftRight,

    // Reserved
    Def,
    Class,
    Return,
    Yield,
    Raise,
    Import,
    From,
    As,
    If,
    Elif,
    Else,
    For,
    While,
    In,
    Is,
    Not,
    And,
    Or,
    With,
    Try,
    Except,
    Finally,
    Lambda,
    Pass,
    Break,
    Continue,
    Global,
    Nonlocal,
    Del,
    Assert,
    Async,
    Await,
    True,
    False,
    None,
}

impl TokenKind {
    /// Augmented assignment operators such as `+=`.
    pub fn is_augmented_assignment(&self) -> bool {
        matches!(
            self,
            TokenKind::PlusEquals
                | TokenKind::MinusEquals
                | TokenKind::StarEquals
                | TokenKind::SlashEquals
                | TokenKind::DoubleSlashEquals
                | TokenKind::PercentEquals
                | TokenKind::PowerEquals
                | TokenKind::AmpersandEquals
                | TokenKind::PipeEquals
                | TokenKind::CaretEquals
                | TokenKind::ShiftLeftEquals
                | TokenKind::ShiftRightEquals
                | TokenKind::AtEquals
        )
    }

    /// Operators whose result is always a boolean.
    pub fn is_relational_or_logical(&self) -> bool {
        matches!(
            self,
            TokenKind::Equals
                | TokenKind::NotEquals
                | TokenKind::Less
                | TokenKind::LessEquals
                | TokenKind::Greater
                | TokenKind::GreaterEquals
                | TokenKind::In
                | TokenKind::Is
                | TokenKind::Not
                | TokenKind::And
                | TokenKind::Or
        )
    }
}

impl Display for TokenKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:?}", self)
    }
}

#[derive(Debug, Clone)]
pub struct Token {
    pub kind: TokenKind,
    pub value: String,
    pub span: Span,
}

impl Display for Token {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Token {{\nkind: {},\nvalue: {}}}", self.kind, self.value)
    }
}

impl Token {
    pub fn is_one_of_many(&self, kinds: &[TokenKind]) -> bool {
        kinds.contains(&self.kind)
    }
}
