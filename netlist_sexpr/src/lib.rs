//! S-expression building blocks for KiCad netlist files.
//!
//! The netlist interchange format is a nested, parenthesized, keyed-list
//! text format. This crate provides the [`Sexpr`] tree, a writer that
//! renders it with balanced nesting, and a parser used to read such
//! trees back (primarily for verification).

pub use sexpr::*;

mod number;
mod sexpr;
mod string;
