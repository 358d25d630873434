use super::{declarations::Declaration, expressions::Expr, statements::Stmt};

use crate::Span;

/// Any node the code generator can be pointed at.
///
/// The set is closed: every compile entry point matches on it exhaustively.
#[derive(Debug, Clone, PartialEq)]
pub enum Node {
    Program(Program),
    Declaration(Declaration),
    Scope(Scope),
    Statement(Stmt),
    Expression(Expr),
}

/// Root of a translation unit.
///
/// A binary tree of top-level declarations, compiled left then right. The
/// parser grows it to the left: `Program(Program(d1, d2), d3)`.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Program {
    pub left: Option<Box<Node>>,
    pub right: Option<Box<Node>>,
}

impl Program {
    pub fn new(left: Node) -> Self {
        Program {
            left: Some(Box::new(left)),
            right: None,
        }
    }

    /// Appends a node, keeping the existing tree as the left child.
    pub fn join(self, right: Node) -> Self {
        Program {
            left: Some(Box::new(Node::Program(self))),
            right: Some(Box::new(right)),
        }
    }

    /// Top-level declarations in source order.
    pub fn declarations(&self) -> Vec<&Declaration> {
        let mut declarations = vec![];
        collect_declarations(self.left.as_deref(), &mut declarations);
        collect_declarations(self.right.as_deref(), &mut declarations);
        declarations
    }
}

fn collect_declarations<'a>(node: Option<&'a Node>, declarations: &mut Vec<&'a Declaration>) {
    match node {
        Some(Node::Program(program)) => {
            collect_declarations(program.left.as_deref(), declarations);
            collect_declarations(program.right.as_deref(), declarations);
        }
        Some(Node::Declaration(declaration)) => declarations.push(declaration),
        _ => {}
    }
}

/// Block: leading declarations followed by statements.
///
/// Declarations whose names are not yet visible become block-scoped
/// dynamics and are released when the block ends.
#[derive(Debug, Clone, PartialEq)]
pub struct Scope {
    pub declarations: Vec<super::declarations::VarDecl>,
    pub statements: Vec<Stmt>,
    pub span: Span,
}

impl Scope {
    pub fn empty(span: Span) -> Self {
        Scope {
            declarations: vec![],
            statements: vec![],
            span,
        }
    }

    /// Wraps a lone statement, as used for loop bodies written without braces.
    pub fn from_statement(statement: Stmt, span: Span) -> Self {
        Scope {
            declarations: vec![],
            statements: vec![statement],
            span,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.declarations.is_empty() && self.statements.is_empty()
    }
}
