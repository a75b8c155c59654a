use crate::change::{Change, Span};
use crate::sg::matcher::PatternMatch;

/// A replacement operation with source and target.
#[derive(Debug, Clone)]
pub struct Replacement {
    /// Byte range to replace
    pub byte_start: usize,
    pub byte_end: usize,
    /// Original text (for verification)
    pub original: String,
    /// New text
    pub replacement: String,
}

impl Replacement {
    /// Convert to a verified Replace change for `file`.
    pub fn to_change(&self, file: impl Into<String>) -> Change {
        Change::replace(
            file,
            Span::new(self.byte_start, self.byte_end),
            &self.original,
            self.replacement.clone(),
        )
    }
}

/// Builder for capture-based replacements of one match.
pub struct CaptureReplacer {
    pattern_match: PatternMatch,
}

impl CaptureReplacer {
    pub fn new(pattern_match: PatternMatch) -> Self {
        Self { pattern_match }
    }

    /// Replace the match using a template that references captures as
    /// `$NAME` or `$$$NAME`.
    pub fn replace_with_template(&self, template: &str) -> Replacement {
        let mut names: Vec<&String> = self.pattern_match.captures.keys().collect();
        // Longer names first so `$ID` never eats the prefix of `$IDS`.
        names.sort_by_key(|name| std::cmp::Reverse(name.len()));

        let mut result = template.to_string();
        for name in names {
            let capture_text = &self.pattern_match.captures[name];
            result = result.replace(&format!("$$${name}"), capture_text);
            result = result.replace(&format!("${name}"), capture_text);
        }

        Replacement {
            byte_start: self.pattern_match.byte_start,
            byte_end: self.pattern_match.byte_end,
            original: self.pattern_match.text.clone(),
            replacement: result,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::change::ChangeSet;
    use crate::sg::PatternMatcher;

    fn only_match(source: &str, pattern: &str) -> PatternMatch {
        let mut matches = PatternMatcher::new(source).find_all(pattern).unwrap();
        assert_eq!(matches.len(), 1);
        matches.remove(0)
    }

    #[test]
    fn template_expands_single_and_variadic_captures() {
        let m = only_match("EffectsModule.forRoot([A, B]);", "$MODULE.forRoot($$$ARGS)");
        let repl = CaptureReplacer::new(m).replace_with_template("$MODULE.forFeature($$$ARGS)");

        assert_eq!(repl.replacement, "EffectsModule.forFeature([A, B])");
        assert_eq!(repl.original, "EffectsModule.forRoot([A, B])");
    }

    #[test]
    fn longer_capture_names_win() {
        let m = only_match("combine(ids, id);", "combine($IDS, $ID)");
        let repl = CaptureReplacer::new(m).replace_with_template("combine($ID, $IDS)");

        assert_eq!(repl.replacement, "combine(id, ids)");
    }

    #[test]
    fn replacement_produces_applicable_change() {
        let source = "const m = StoreModule.forRoot(reducers);\n";
        let m = only_match(source, "StoreModule.forRoot($ARG)");
        let change = CaptureReplacer::new(m)
            .replace_with_template("StoreModule.forRoot($ARG, { metaReducers })")
            .to_change("app.module.ts");

        let mut set = ChangeSet::new("app.module.ts");
        set.push(change);
        assert_eq!(
            set.apply(source).unwrap(),
            "const m = StoreModule.forRoot(reducers, { metaReducers });\n"
        );
    }
}
