//! Code generation module for the compiler.
//!
//! This module lowers the program tree straight to MIPS assembly text in
//! a single depth-first pass. It handles:
//!
//! - Register bookkeeping and scoped scratch borrowing
//! - Name resolution across the variable, dynamic and global tiers
//! - Stack frame layout, prologues and epilogues
//! - Expression, statement and declaration lowering

pub mod compiler;
pub mod context;
pub mod decl;
pub mod emitter;
pub mod expr;
pub mod frame;
pub mod registers;
pub mod stmt;

#[cfg(test)]
mod tests;
