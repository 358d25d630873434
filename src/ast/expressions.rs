use std::fmt::Display;

use crate::{lexer::tokens::TokenKind, Span};

/// Expression nodes. Each compiles into a caller-chosen register.
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Binary(BinaryExpr),
    Unary(UnaryExpr),
    Identifier(IdentifierExpr),
    Call(CallExpr),
    Constant(ConstantExpr),
}

impl Expr {
    pub fn get_span(&self) -> &Span {
        match self {
            Expr::Binary(expr) => &expr.span,
            Expr::Unary(expr) => &expr.span,
            Expr::Identifier(expr) => &expr.span,
            Expr::Call(expr) => &expr.span,
            Expr::Constant(expr) => &expr.span,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOperator {
    Add,
    Subtract,
    Multiply,
    Divide,
    BitAnd,
    BitOr,
    ShiftRight,
    ShiftLeft,
    Equal,
    NotEqual,
    Greater,
    Less,
    GreaterEqual,
    LessEqual,
    LogicalAnd,
    LogicalOr,
}

impl BinaryOperator {
    pub fn from_token_kind(kind: TokenKind) -> Option<Self> {
        let operator = match kind {
            TokenKind::Plus => BinaryOperator::Add,
            TokenKind::Dash => BinaryOperator::Subtract,
            TokenKind::Star => BinaryOperator::Multiply,
            TokenKind::Slash => BinaryOperator::Divide,
            TokenKind::Ampersand => BinaryOperator::BitAnd,
            TokenKind::Pipe => BinaryOperator::BitOr,
            TokenKind::ShiftRight => BinaryOperator::ShiftRight,
            TokenKind::ShiftLeft => BinaryOperator::ShiftLeft,
            TokenKind::Equals => BinaryOperator::Equal,
            TokenKind::NotEquals => BinaryOperator::NotEqual,
            TokenKind::Greater => BinaryOperator::Greater,
            TokenKind::Less => BinaryOperator::Less,
            TokenKind::GreaterEquals => BinaryOperator::GreaterEqual,
            TokenKind::LessEquals => BinaryOperator::LessEqual,
            TokenKind::And => BinaryOperator::LogicalAnd,
            TokenKind::Or => BinaryOperator::LogicalOr,
            _ => return None,
        };

        Some(operator)
    }

    pub fn symbol(&self) -> &'static str {
        match self {
            BinaryOperator::Add => "+",
            BinaryOperator::Subtract => "-",
            BinaryOperator::Multiply => "*",
            BinaryOperator::Divide => "/",
            BinaryOperator::BitAnd => "&",
            BinaryOperator::BitOr => "|",
            BinaryOperator::ShiftRight => ">>",
            BinaryOperator::ShiftLeft => "<<",
            BinaryOperator::Equal => "==",
            BinaryOperator::NotEqual => "!=",
            BinaryOperator::Greater => ">",
            BinaryOperator::Less => "<",
            BinaryOperator::GreaterEqual => ">=",
            BinaryOperator::LessEqual => "<=",
            BinaryOperator::LogicalAnd => "&&",
            BinaryOperator::LogicalOr => "||",
        }
    }
}

impl Display for BinaryOperator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.symbol())
    }
}

/// Binary Expression
/// The left operand lands in the destination, the right one in a borrowed
/// scratch register.
#[derive(Debug, Clone, PartialEq)]
pub struct BinaryExpr {
    pub left: Box<Expr>,
    pub operator: BinaryOperator,
    pub right: Box<Expr>,
    pub span: Span,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOperator {
    Increment,
    Decrement,
    Not,
}

impl Display for UnaryOperator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            UnaryOperator::Increment => write!(f, "++"),
            UnaryOperator::Decrement => write!(f, "--"),
            UnaryOperator::Not => write!(f, "!"),
        }
    }
}

/// Unary Expression
/// Always applies to a named variable and writes the result back to it.
#[derive(Debug, Clone, PartialEq)]
pub struct UnaryExpr {
    pub identifier: String,
    pub operator: UnaryOperator,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub struct IdentifierExpr {
    pub name: String,
    pub span: Span,
}

/// Call Expression
/// Direct calls only; at most four arguments.
#[derive(Debug, Clone, PartialEq)]
pub struct CallExpr {
    pub function: String,
    pub arguments: Vec<Expr>,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ConstantExpr {
    pub value: i32,
    pub span: Span,
}
