use super::PlanError;
use crate::change::Change;
use crate::sg::{AstGrepError, CaptureReplacer, PatternMatcher};
use crate::ts::{find_named, SourceDocument, SyntaxKind};

/// Rewrite the single match of an ast-grep `pattern` with `replacement`,
/// where `$NAME` / `$$$NAME` in the replacement expand to the captures.
/// With `function_name`, only matches inside that function count.
///
/// When nothing matches but the replacement itself (read as a pattern) does,
/// the rewrite already happened and the result is a Noop.
pub fn replace_pattern(
    doc: &SourceDocument,
    pattern: &str,
    replacement: &str,
    function_name: Option<&str>,
) -> Result<Vec<Change>, PlanError> {
    if let Some(name) = function_name {
        find_named(doc.root(), SyntaxKind::FunctionDeclaration, name)
            .ok_or_else(|| PlanError::not_found(doc, SyntaxKind::FunctionDeclaration, name))?;
    }

    let matcher = PatternMatcher::new(doc.text());
    let pattern_error = |source: AstGrepError| PlanError::Pattern {
        file: doc.path().to_string(),
        source,
    };
    let find = |pattern: &str| match function_name {
        Some(name) => matcher.find_in_function(pattern, name),
        None => matcher.find_all(pattern),
    };

    let mut matches = find(pattern).map_err(pattern_error)?;
    match matches.len() {
        0 => {
            let applied = match function_name {
                Some(_) => find(replacement).is_ok_and(|found| !found.is_empty()),
                None => matcher.has_match(replacement).unwrap_or(false),
            };
            if applied {
                tracing::debug!(file = doc.path(), pattern, "replacement already applied");
                Ok(vec![Change::noop(
                    doc.path(),
                    format!("'{replacement}' already present"),
                )])
            } else {
                Err(PlanError::NoMatch {
                    file: doc.path().to_string(),
                    pattern: pattern.to_string(),
                })
            }
        }
        1 => {
            let found = matches.remove(0);
            let repl = CaptureReplacer::new(found).replace_with_template(replacement);
            Ok(vec![repl.to_change(doc.path())])
        }
        count => Err(PlanError::AmbiguousMatch {
            file: doc.path().to_string(),
            pattern: pattern.to_string(),
            count,
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::change::ChangeSet;

    const MODULE: &str = "@NgModule({\n  imports: [StoreModule.forRoot(reducers)]\n})\nexport class AppModule {}\n";

    fn apply(source: &str, changes: Vec<Change>) -> String {
        let mut set = ChangeSet::new("app.module.ts");
        set.extend(changes);
        set.apply(source).unwrap()
    }

    #[test]
    fn rewrites_unique_match() {
        let doc = SourceDocument::parse("app.module.ts", MODULE).unwrap();
        let changes = replace_pattern(
            &doc,
            "StoreModule.forRoot($ARG)",
            "StoreModule.forRoot($ARG, { metaReducers })",
            None,
        )
        .unwrap();

        assert!(apply(MODULE, changes).contains("StoreModule.forRoot(reducers, { metaReducers })"));
    }

    #[test]
    fn already_rewritten_is_noop() {
        let source = "const m = StoreModule.forFeature('user', userReducer);\n";
        let doc = SourceDocument::parse("app.module.ts", source).unwrap();
        let changes = replace_pattern(
            &doc,
            "StoreModule.forRoot($$$ARGS)",
            "StoreModule.forFeature($$$ARGS)",
            None,
        )
        .unwrap();

        assert!(changes[0].is_noop());
    }

    #[test]
    fn no_match_is_an_error() {
        let doc = SourceDocument::parse("app.module.ts", MODULE).unwrap();
        let err = replace_pattern(&doc, "EffectsModule.forRoot($ARG)", "x", None).unwrap_err();

        assert!(matches!(err, PlanError::NoMatch { .. }));
    }

    #[test]
    fn several_matches_are_ambiguous() {
        let source = "a.forRoot(x);\nb.forRoot(y);\n";
        let doc = SourceDocument::parse("app.module.ts", source).unwrap();
        let err = replace_pattern(&doc, "$M.forRoot($A)", "$M.forChild($A)", None).unwrap_err();

        assert!(matches!(err, PlanError::AmbiguousMatch { count: 2, .. }));
    }

    #[test]
    fn function_scope_narrows_matches() {
        let source = "function a() {\n  return state.items;\n}\n\nexport function b() {\n  return state.items;\n}\n";
        let doc = SourceDocument::parse("x.ts", source).unwrap();
        let changes =
            replace_pattern(&doc, "state.items", "state.entities", Some("b")).unwrap();

        let output = apply(source, changes);
        assert!(output.contains("function a() {\n  return state.items;"));
        assert!(output.contains("function b() {\n  return state.entities;"));
    }

    #[test]
    fn unknown_function_scope_is_not_found() {
        let doc = SourceDocument::parse("x.ts", MODULE).unwrap();
        let err = replace_pattern(&doc, "$A", "$A", Some("missing")).unwrap_err();

        assert!(matches!(
            err,
            PlanError::NotFound { kind: SyntaxKind::FunctionDeclaration, .. }
        ));
    }
}
