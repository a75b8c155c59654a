//! ast-grep integration for pattern-based TypeScript matching.
//!
//! Locator queries cover the constructs the planners know by kind; this
//! module covers everything else through ast-grep's metavariable syntax
//! ($NAME, $$$ARGS, etc.) for structural search and replacement.

pub mod errors;
pub mod lang;
pub mod matcher;
pub mod replacer;

pub use errors::AstGrepError;
pub use lang::{typescript, SupportLang};
pub use matcher::{PatternMatch, PatternMatcher};
pub use replacer::{CaptureReplacer, Replacement};
