use crate::cache;
use crate::sg::errors::AstGrepError;
use crate::sg::lang::typescript;
use ast_grep_core::tree_sitter::StrDoc;
use ast_grep_core::{AstGrep, NodeMatch};
use ast_grep_language::SupportLang;
use std::collections::HashMap;

/// A match from an ast-grep pattern with captured metavariables.
#[derive(Debug, Clone)]
pub struct PatternMatch {
    /// Byte range of the entire match
    pub byte_start: usize,
    pub byte_end: usize,
    /// The matched text
    pub text: String,
    /// Captured metavariables: name -> text
    pub captures: HashMap<String, String>,
}

/// Pattern matcher over TypeScript source using ast-grep's metavariable
/// syntax.
///
/// # Metavariable Syntax
///
/// - `$NAME` - Matches a single node and captures it
/// - `$$$NAME` - Matches zero or more nodes (variadic)
/// - `$_` - Matches any single node (anonymous)
///
/// # Example Patterns
///
/// ```text
/// StoreModule.forRoot($$$ARGS)         // Root store registration
/// this.actions$.ofType($TYPE)          // Effect source
/// @Effect() $NAME = $INIT              // Decorated effect field
/// ```
pub struct PatternMatcher {
    source: String,
    sg: AstGrep<StrDoc<SupportLang>>,
}

impl PatternMatcher {
    pub fn new(source: &str) -> Self {
        let sg = AstGrep::new(source, typescript());
        Self {
            source: source.to_string(),
            sg,
        }
    }

    /// Find all matches for a pattern, in document order.
    pub fn find_all(&self, pattern: &str) -> Result<Vec<PatternMatch>, AstGrepError> {
        let pat = cache::get_or_compile_pattern(pattern, typescript())?;
        let root = self.sg.root();
        let results = root
            .find_all(&pat)
            .map(|m| self.node_match_to_pattern_match(m))
            .collect();
        Ok(results)
    }

    pub fn has_match(&self, pattern: &str) -> Result<bool, AstGrepError> {
        let pat = cache::get_or_compile_pattern(pattern, typescript())?;
        Ok(self.sg.root().find(&pat).is_some())
    }

    /// Find matches that lie entirely within `[start, end)`.
    pub fn find_in_range(
        &self,
        pattern: &str,
        start: usize,
        end: usize,
    ) -> Result<Vec<PatternMatch>, AstGrepError> {
        let matches = self.find_all(pattern)?;

        Ok(matches
            .into_iter()
            .filter(|m| m.byte_start >= start && m.byte_end <= end)
            .collect())
    }

    /// Find matches inside the function declaration named `function_name`.
    pub fn find_in_function(
        &self,
        pattern: &str,
        function_name: &str,
    ) -> Result<Vec<PatternMatch>, AstGrepError> {
        let mut results = Vec::new();
        for (start, end) in self.function_ranges(function_name) {
            results.extend(self.find_in_range(pattern, start, end)?);
        }
        Ok(results)
    }

    /// Byte ranges of every `function_declaration` named `name`.
    fn function_ranges(&self, name: &str) -> Vec<(usize, usize)> {
        self.sg
            .root()
            .dfs()
            .filter(|node| node.kind() == "function_declaration")
            .filter(|node| node.field("name").is_some_and(|n| n.text() == name))
            .map(|node| {
                let range = node.range();
                (range.start, range.end)
            })
            .collect()
    }

    fn node_match_to_pattern_match(&self, m: NodeMatch<StrDoc<SupportLang>>) -> PatternMatch {
        let range = m.get_node().range();
        let env = m.get_env().clone();
        let captures: HashMap<String, String> = env.into();

        PatternMatch {
            byte_start: range.start,
            byte_end: range.end,
            text: self.source[range.start..range.end].to_string(),
            captures,
        }
    }
}
