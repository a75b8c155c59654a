//! Tree-sitter integration for structural TypeScript queries.
//!
//! This module provides CST-based span location using tree-sitter, enabling
//! precise byte-span extraction for TypeScript constructs without losing
//! comments or formatting.

pub mod errors;
pub mod locator;
pub mod parser;
pub mod validator;

pub use errors::TreeSitterError;
pub use locator::{find_all, find_first, find_kind, find_named, SyntaxKind, SyntaxNode};
pub use parser::{ErrorNode, SourceDocument, TypeScriptParser};
pub use validator::{introduced_errors, validate_syntax};
