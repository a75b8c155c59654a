//! Thread-local pattern compilation cache for ast-grep patterns.
//!
//! A recipe run compiles the same replace patterns for every file it
//! touches. Cache is capped at 256 entries; when full it is cleared and
//! rebuilt on demand.

use crate::sg::AstGrepError;
use ast_grep_core::Pattern;
use ast_grep_language::SupportLang;
use std::cell::RefCell;
use std::collections::HashMap;

const MAX_CACHE_ENTRIES: usize = 256;

thread_local! {
    // Key is "<lang_debug>:<pattern_str>" so the same pattern string for
    // different languages never collides.
    static PATTERN_CACHE: RefCell<HashMap<String, Pattern>> =
        RefCell::new(HashMap::new());
}

/// Get a compiled pattern from cache, or compile and cache it.
///
/// Patterns that fail to compile are reported and never cached.
pub fn get_or_compile_pattern(pattern_str: &str, lang: SupportLang) -> Result<Pattern, AstGrepError> {
    let cache_key = format!("{lang:?}:{pattern_str}");

    PATTERN_CACHE.with(|cache| {
        let mut cache = cache.borrow_mut();

        if let Some(p) = cache.get(&cache_key) {
            return Ok(p.clone());
        }

        if cache.len() >= MAX_CACHE_ENTRIES {
            cache.clear();
        }

        let compiled =
            Pattern::try_new(pattern_str, lang).map_err(|e| AstGrepError::InvalidPattern {
                pattern: pattern_str.to_string(),
                message: e.to_string(),
            })?;
        cache.insert(cache_key, compiled.clone());
        Ok(compiled)
    })
}

/// Clear the pattern cache (mainly for testing).
pub fn clear_cache() {
    PATTERN_CACHE.with(|cache| {
        cache.borrow_mut().clear();
    });
}

/// Number of compiled patterns currently cached on this thread.
pub fn cache_size() -> usize {
    PATTERN_CACHE.with(|cache| cache.borrow().len())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sg::typescript;

    #[test]
    fn repeated_pattern_is_compiled_once() {
        clear_cache();
        get_or_compile_pattern("StoreModule.forRoot($ARG)", typescript()).unwrap();
        get_or_compile_pattern("StoreModule.forRoot($ARG)", typescript()).unwrap();

        assert_eq!(cache_size(), 1);
    }
}
