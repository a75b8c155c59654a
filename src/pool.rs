//! Thread-local parser pooling.
//!
//! Every mutation step parses the current overlay content of its file, so a
//! single pipeline run parses the same grammar many times. Keeping one
//! parser per thread avoids re-initialising the language each time.

use crate::ts::{TreeSitterError, TypeScriptParser};
use std::cell::RefCell;

thread_local! {
    static TS_PARSER: RefCell<Option<TypeScriptParser>> = const { RefCell::new(None) };
}

/// Execute function with pooled parser instance.
///
/// On first call per thread, creates new parser. Subsequent calls reuse
/// the same parser instance.
///
/// # Example
///
/// ```
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// use nx_schematics::pool::with_parser;
///
/// let tree = with_parser(|parser| parser.parse("export class AppModule {}"))?;
/// assert!(tree.is_some());
/// # Ok(())
/// # }
/// ```
pub fn with_parser<F, R>(f: F) -> Result<R, TreeSitterError>
where
    F: FnOnce(&mut TypeScriptParser) -> R,
{
    TS_PARSER.with(|cell| {
        let mut slot = cell.borrow_mut();
        let mut parser = match slot.take() {
            Some(parser) => parser,
            None => TypeScriptParser::new()?,
        };
        let result = f(&mut parser);
        *slot = Some(parser);
        Ok(result)
    })
}
