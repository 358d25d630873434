use crate::Span;

use super::{ast::Scope, expressions::Expr};

#[derive(Debug, Clone, PartialEq)]
pub enum Declaration {
    Variable(VarDecl),
    Function(FunctionDecl),
}

/// Variable Declaration
///
/// At top level this reserves global storage; inside a function it either
/// binds a frame slot (function-level locals) or pushes a dynamic.
#[derive(Debug, Clone, PartialEq)]
pub struct VarDecl {
    pub type_name: String,
    pub identifier: String,
    pub value: Option<Expr>,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ParamDecl {
    pub type_name: String,
    pub identifier: String,
    pub span: Span,
}

/// Function Declaration
///
/// `body` is `None` for a prototype, which produces no output.
#[derive(Debug, Clone, PartialEq)]
pub struct FunctionDecl {
    pub return_type: String,
    pub identifier: String,
    pub parameters: Vec<ParamDecl>,
    pub body: Option<Scope>,
    pub span: Span,
}
