/// AST (Abstract Syntax Tree) module
/// Contains all definitions related to the AST structure
///
/// Submodules:
/// - ast: Root node enum, program tree and scopes
/// - expressions: Definitions for the expression forms
/// - statements: Definitions for the statement forms
/// - declarations: Variable, parameter and function declarations
/// - printer: XML rendering of a parsed program
pub mod ast;
pub mod declarations;
pub mod expressions;
pub mod printer;
pub mod statements;
