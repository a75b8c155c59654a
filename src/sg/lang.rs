//! TypeScript language support via ast-grep-language.
//!
//! The built-in `SupportLang::TypeScript` handles metavariable preprocessing
//! and ships the same grammar the locator parses with.

pub use ast_grep_language::SupportLang;

/// The TypeScript language for ast-grep operations.
pub fn typescript() -> SupportLang {
    SupportLang::TypeScript
}
