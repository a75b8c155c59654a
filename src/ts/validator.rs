use crate::ts::errors::TreeSitterError;
use crate::ts::parser::SourceDocument;

/// Validate that TypeScript source code has no syntax errors.
///
/// Returns Ok(()) if the code parses without ERROR nodes.
pub fn validate_syntax(source: &str) -> Result<(), TreeSitterError> {
    let doc = SourceDocument::parse("<validate>", source)?;

    let errors = doc.error_nodes();
    match errors.len() {
        0 => Ok(()),
        1 => Err(TreeSitterError::SyntaxError {
            byte_start: errors[0].byte_start,
            byte_end: errors[0].byte_end,
        }),
        n => Err(TreeSitterError::MultipleSyntaxErrors { count: n }),
    }
}

/// Number of ERROR/MISSING nodes a rewrite added relative to the original.
///
/// Offsets shift once text is spliced, so errors are compared by count
/// rather than position. A file that was already broken stays acceptable as
/// long as the rewrite does not make it worse.
pub fn introduced_errors(before: &SourceDocument, after: &str) -> Result<usize, TreeSitterError> {
    let rewritten = SourceDocument::parse(before.path(), after)?;
    let old = before.error_nodes().len();
    let new = rewritten.error_nodes().len();
    Ok(new.saturating_sub(old))
}
