//! Concrete Syntax Tree (CST) for C#
//!
//! This module implements a lossless syntax tree using the Rowan library.
//! The CST preserves all source information including whitespace, comments,
//! and preprocessor lines, enabling:
//! - Precise autofixes that preserve formatting
//! - Structural rewrites that share unaffected subtrees
//! - Error recovery that never loses input
//!
//! ## Architecture
//!
//! - **Green Tree**: immutable, position-independent storage. Cheap to clone
//!   and `Send`, so it is what crosses thread boundaries.
//! - **Red Tree**: a view with parent pointers built on demand for
//!   traversal. Red nodes are `!Send`.
//!
//! ## Trivia Handling
//!
//! Trivia tokens belong to the node that is open when they are read, never
//! to a following expression. An expression node therefore spans exactly its
//! own tokens, and `parse(source).text() == source`.
//!
//! ## Example
//!
//! ```rust,ignore
//! use sharplint_core::cst::{parse_csharp, CsSyntaxKind};
//!
//! let source = "class C { void M(string p) { if (p == null) throw new ArgumentNullException(\"p\"); } }";
//! let parse = parse_csharp(source);
//! assert_eq!(parse.syntax().text().to_string(), source);
//!
//! let throws = parse
//!     .syntax()
//!     .descendants()
//!     .filter(|n| n.kind() == CsSyntaxKind::ThrowStatement)
//!     .count();
//! assert_eq!(throws, 1);
//! ```

mod builder;
mod language;
mod lexer;
mod nodes;
mod parser;
mod syntax_kind;

pub mod ast;
pub mod factory;

pub use builder::CstBuilder;
pub use language::CsLanguage;
pub use lexer::{CstLexResult, CstSpan, CstToken, LexerError, lex_with_trivia};
pub use nodes::*;
pub use parser::{Parse, ParseError, ParseErrorKind, parse_csharp};
pub use syntax_kind::CsSyntaxKind;

#[cfg(test)]
mod tests;
