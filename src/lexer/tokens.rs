use lazy_static::lazy_static;
use std::{collections::HashMap, fmt::Display};

use crate::Span;

lazy_static! {
    pub static ref RESERVED_LOOKUP: HashMap<&'static str, TokenKind> = {
        let mut map = HashMap::new();
        map.insert("int", TokenKind::Int);
        map.insert("void", TokenKind::Void);
        map.insert("char", TokenKind::Char);
        map.insert("short", TokenKind::Short);
        map.insert("long", TokenKind::Long);
        map.insert("signed", TokenKind::Signed);
        map.insert("unsigned", TokenKind::Unsigned);
        map.insert("if", TokenKind::If);
        map.insert("else", TokenKind::Else);
        map.insert("while", TokenKind::While);
        map.insert("do", TokenKind::Do);
        map.insert("for", TokenKind::For);
        map.insert("return", TokenKind::Return);
        map
    };
}

#[derive(Debug, PartialEq, Eq, Clone, Copy, Hash)]
pub enum TokenKind {
    EOF,
    Number,
    Identifier,

    OpenCurly,
    CloseCurly,
    OpenParen,
    CloseParen,

    Assignment, // =
    Equals,     // ==
    Not,        // !
    NotEquals,  // !=

    Less,
    LessEquals,
    Greater,
    GreaterEquals,
    ShiftLeft,
    ShiftRight,

    Or,
    And,
    Ampersand,
    Pipe,

    Semicolon,
    Comma,

    PlusPlus,
    MinusMinus,

    Plus,
    Dash,
    Slash,
    Star,

    // Reserved
    Int,
    Void,
    Char,
    Short,
    Long,
    Signed,
    Unsigned,
    If,
    Else,
    While,
    Do,
    For,
    Return,
}

impl TokenKind {
    /// Whether the token can start a declaration.
    pub fn is_type_specifier(&self) -> bool {
        matches!(
            self,
            TokenKind::Int
                | TokenKind::Void
                | TokenKind::Char
                | TokenKind::Short
                | TokenKind::Long
                | TokenKind::Signed
                | TokenKind::Unsigned
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
