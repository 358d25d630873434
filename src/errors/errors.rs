use std::fmt::Display;

use thiserror::Error;

use crate::Position;

#[derive(Debug, Clone)]
pub struct Error {
    internal_error: ErrorImpl,
    position: Position,
}

impl Error {
    pub fn new(error_impl: ErrorImpl, position: Position) -> Self {
        Error {
            internal_error: error_impl,
            position,
        }
    }

    pub fn get_position(&self) -> &Position {
        &self.position
    }

    pub fn get_internal(&self) -> &ErrorImpl {
        &self.internal_error
    }

    pub fn get_error_name(&self) -> &str {
        match &self.internal_error {
            ErrorImpl::UnrecognisedToken { .. } => "UnrecognisedToken",
            ErrorImpl::UnexpectedToken { .. } => "UnexpectedToken",
            ErrorImpl::UnexpectedTokenDetailed { .. } => "UnexpectedTokenDetailed",
            ErrorImpl::NumberParseError { .. } => "NumberParseError",
            ErrorImpl::RegistersExhausted => "RegistersExhausted",
            ErrorImpl::UnboundName { .. } => "UnboundName",
            ErrorImpl::UnresolvedIdentifier { .. } => "UnresolvedIdentifier",
            ErrorImpl::TooManyParameters { .. } => "TooManyParameters",
            ErrorImpl::TooManyArguments { .. } => "TooManyArguments",
            ErrorImpl::UnsupportedOperator { .. } => "UnsupportedOperator",
            ErrorImpl::NonConstantInitializer { .. } => "NonConstantInitializer",
            ErrorImpl::InvalidDestination { .. } => "InvalidDestination",
        }
    }

    pub fn get_tip(&self) -> ErrorTip {
        match &self.internal_error {
            ErrorImpl::UnrecognisedToken { .. } => ErrorTip::None,
            ErrorImpl::UnexpectedToken { token } => ErrorTip::Suggestion(format!(
                "Unexpected token: `{}`, did you miss a semicolon?",
                token
            )),
            ErrorImpl::UnexpectedTokenDetailed { token, message } => {
                ErrorTip::Suggestion(format!("Unexpected token: `{}`, {}", token, message))
            }
            ErrorImpl::NumberParseError { token } => ErrorTip::Suggestion(format!(
                "Invalid number: `{}`, is it above the integer limit?",
                token
            )),
            ErrorImpl::RegistersExhausted => ErrorTip::Suggestion(String::from(
                "Expression nests too deeply for the 8 saved registers, split it into statements",
            )),
            ErrorImpl::UnboundName { tier, name } => {
                ErrorTip::Suggestion(format!("`{}` is not bound as a {} name", name, tier))
            }
            ErrorImpl::UnresolvedIdentifier { name } => {
                ErrorTip::Suggestion(format!("Variable `{}` not declared", name))
            }
            ErrorImpl::TooManyParameters { function, count } => ErrorTip::Suggestion(format!(
                "Function `{}` takes {} parameters, at most 4 are supported",
                function, count
            )),
            ErrorImpl::TooManyArguments { function, count } => ErrorTip::Suggestion(format!(
                "Call to `{}` passes {} arguments, at most 4 are supported",
                function, count
            )),
            ErrorImpl::UnsupportedOperator { operator } => ErrorTip::Suggestion(format!(
                "Operator `{}` is not supported, pass --permissive-relational to emit a no-op",
                operator
            )),
            ErrorImpl::NonConstantInitializer { name } => ErrorTip::Suggestion(format!(
                "Global `{}` must be initialised with an integer constant",
                name
            )),
            ErrorImpl::InvalidDestination { node } => ErrorTip::Suggestion(format!(
                "{} cannot be compiled at this level",
                node
            )),
        }
    }
}

impl Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.internal_error)
    }
}

impl std::error::Error for Error {}

impl From<ErrorImpl> for Error {
    fn from(error_impl: ErrorImpl) -> Self {
        Error::new(error_impl, Position::null())
    }
}

/// Attaches a source position to a failure raised below the AST level.
pub trait ErrorAt<T> {
    fn at(self, position: &Position) -> Result<T, Error>;
}

impl<T> ErrorAt<T> for Result<T, ErrorImpl> {
    fn at(self, position: &Position) -> Result<T, Error> {
        self.map_err(|error_impl| Error::new(error_impl, position.clone()))
    }
}

pub enum ErrorTip {
    None,
    Suggestion(String),
}

impl Display for ErrorTip {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ErrorTip::None => write!(f, ""),
            ErrorTip::Suggestion(suggestion) => write!(f, "{}", suggestion),
        }
    }
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ErrorImpl {
    #[error("unrecognised token: {token:?}")]
    UnrecognisedToken { token: String },
    #[error("unexpected token: {token:?}")]
    UnexpectedToken { token: String },
    #[error("unexpected token ({message:?}): {token:?}")]
    UnexpectedTokenDetailed { token: String, message: String },
    #[error("error parsing number: {token:?}")]
    NumberParseError { token: String },
    #[error("no free registers")]
    RegistersExhausted,
    #[error("{tier} {name:?} not found")]
    UnboundName { tier: String, name: String },
    #[error("variable {name:?} not found on stack")]
    UnresolvedIdentifier { name: String },
    #[error("function {function:?} has {count} parameters, more than 4 are not implemented")]
    TooManyParameters { function: String, count: usize },
    #[error("call to {function:?} has {count} arguments, more than 4 are not implemented")]
    TooManyArguments { function: String, count: usize },
    #[error("operator {operator:?} not implemented")]
    UnsupportedOperator { operator: String },
    #[error("global {name:?} has a non-constant initialiser")]
    NonConstantInitializer { name: String },
    #[error("{node} cannot be compiled here")]
    InvalidDestination { node: String },
}
