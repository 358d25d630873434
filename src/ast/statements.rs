use crate::{Position, Span};

use super::{ast::Scope, expressions::Expr};

#[derive(Debug, Clone, PartialEq)]
pub enum Stmt {
    Sequence(Vec<Stmt>),
    Expression(ExpressionStmt),
    Scope(Scope),
    Assignment(AssignmentStmt),
    If(IfStmt),
    IfElse(IfElseStmt),
    While(WhileStmt),
    DoWhile(DoWhileStmt),
    For(ForStmt),
    Return(ReturnStmt),
}

impl Stmt {
    /// Where the statement starts. An empty sequence has no position.
    pub fn get_start(&self) -> Position {
        match self {
            Stmt::Sequence(statements) => statements
                .first()
                .map(Stmt::get_start)
                .unwrap_or_else(Position::null),
            Stmt::Expression(stmt) => stmt.span.start.clone(),
            Stmt::Scope(scope) => scope.span.start.clone(),
            Stmt::Assignment(stmt) => stmt.span.start.clone(),
            Stmt::If(stmt) => stmt.span.start.clone(),
            Stmt::IfElse(stmt) => stmt.span.start.clone(),
            Stmt::While(stmt) => stmt.span.start.clone(),
            Stmt::DoWhile(stmt) => stmt.span.start.clone(),
            Stmt::For(stmt) => stmt.span.start.clone(),
            Stmt::Return(stmt) => stmt.span.start.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ExpressionStmt {
    pub expression: Expr,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub struct AssignmentStmt {
    pub identifier: String,
    pub value: Expr,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub struct IfStmt {
    pub condition: Expr,
    pub then_branch: Box<Stmt>,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub struct IfElseStmt {
    pub condition: Expr,
    pub then_branch: Box<Stmt>,
    pub else_branch: Box<Stmt>,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub struct WhileStmt {
    pub condition: Expr,
    pub body: Scope,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DoWhileStmt {
    pub body: Scope,
    pub condition: Expr,
    pub span: Span,
}

/// For Statement
/// `init` and `step` are plain statements; a missing one compiles to nothing.
#[derive(Debug, Clone, PartialEq)]
pub struct ForStmt {
    pub init: Option<Box<Stmt>>,
    pub condition: Expr,
    pub step: Option<Box<Stmt>>,
    pub body: Scope,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ReturnStmt {
    pub value: Option<Expr>,
    pub span: Span,
}
