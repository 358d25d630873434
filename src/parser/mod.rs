//! Parser module for building an Abstract Syntax Tree (AST).
//!
//! This module contains the parser that transforms a stream of tokens
//! into a program tree. It uses a Pratt parser for expressions
//! with C operator precedence and handles:
//!
//! - Top-level declarations (globals, prototypes, function definitions)
//! - Blocks with leading declarations
//! - Control flow statements (if, while, do-while, for, return)
//! - Expression parsing (binary ops, unary ops, calls, literals)
//!
//! The parser uses NUD (null denotation) and LED (left denotation) functions
//! for expression parsing with binding power for precedence handling.

pub mod expr;
pub mod lookups;
pub mod parser;
pub mod stmt;
