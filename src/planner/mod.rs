//! Change planners: each one locates constructs in a [`SourceDocument`] and
//! returns the [`Change`] values that implement one semantic mutation.
//!
//! Planners never touch text. Idempotent mutations (add a class, insert an
//! import, remove a declaration) answer an already-satisfied request with a
//! Noop change; additive ones that would duplicate content (enum members,
//! union alternatives) fail with [`PlanError::DuplicateMember`].

pub mod classes;
pub mod enums;
pub mod functions;
pub mod imports;
pub mod ng_module;
pub mod pattern;
pub mod remove;
pub mod unions;

pub use classes::{add_class, add_constructor_parameter, insert_before_constructor};
pub use enums::{add_enum_members, EnumMember};
pub use functions::{add_switch_case, rename_function};
pub use imports::{insert_default_import, insert_import, insert_named_imports};
pub use ng_module::{add_import_to_module, add_provider_to_module, add_to_ng_module};
pub use pattern::replace_pattern;
pub use remove::remove_node;
pub use unions::extend_union_type;

use crate::change::Change;
use crate::sg::AstGrepError;
use crate::ts::{find_kind, SourceDocument, SyntaxKind, SyntaxNode};
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PlanError {
    #[error("cannot find {kind} '{name}' in {file}{}", did_you_mean(.suggestion))]
    NotFound {
        file: String,
        kind: SyntaxKind,
        name: String,
        suggestion: Option<String>,
    },

    #[error("'{container}.{member}' already exists in {file}")]
    DuplicateMember {
        file: String,
        container: String,
        member: String,
    },

    #[error("pattern '{pattern}' matched {count} locations in {file}, expected exactly 1")]
    AmbiguousMatch {
        file: String,
        pattern: String,
        count: usize,
    },

    #[error("pattern '{pattern}' matched nothing in {file}")]
    NoMatch { file: String, pattern: String },

    #[error("{file}: {source}")]
    Pattern {
        file: String,
        #[source]
        source: AstGrepError,
    },
}

impl PlanError {
    /// A required named construct is absent. Suggests the closest name among
    /// constructs of the same kind present in the document.
    pub fn not_found(doc: &SourceDocument, kind: SyntaxKind, name: &str) -> Self {
        let candidates = find_kind(doc.root(), kind);
        let suggestion = closest_name(candidates.iter().filter_map(|n| n.name()), name);
        PlanError::NotFound {
            file: doc.path().to_string(),
            kind,
            name: name.to_string(),
            suggestion,
        }
    }

    pub(crate) fn duplicate(doc: &SourceDocument, container: &str, member: &str) -> Self {
        PlanError::DuplicateMember {
            file: doc.path().to_string(),
            container: container.to_string(),
            member: member.to_string(),
        }
    }
}

fn did_you_mean(suggestion: &Option<String>) -> String {
    match suggestion {
        Some(name) => format!(" (did you mean '{name}'?)"),
        None => String::new(),
    }
}

fn closest_name<'a>(candidates: impl Iterator<Item = &'a str>, wanted: &str) -> Option<String> {
    candidates
        .filter(|candidate| *candidate != wanted)
        .map(|candidate| (strsim::jaro_winkler(candidate, wanted), candidate))
        .filter(|(score, _)| *score >= 0.8)
        .max_by(|a, b| a.0.total_cmp(&b.0))
        .map(|(_, candidate)| candidate.to_string())
}

/// Insert `text` right after the last node of `nodes`, or at `fallback` when
/// the list is empty. With `narrow_to`, the target becomes the last node of
/// that kind inside the last node (e.g. the last case clause of the last
/// switch), falling back when there is none.
pub fn insert_after_last(
    doc: &SourceDocument,
    nodes: &[SyntaxNode<'_>],
    text: &str,
    fallback: usize,
    narrow_to: Option<SyntaxKind>,
) -> Change {
    let last = nodes.iter().max_by_key(|n| n.start()).copied();
    let target = match (last, narrow_to) {
        (Some(node), Some(kind)) => find_kind(node, kind).into_iter().max_by_key(|n| n.start()),
        (last, None) => last,
        (None, Some(_)) => None,
    };
    let position = target.map_or(fallback, |node| node.end());
    tracing::debug!(file = doc.path(), position, "insert after last occurrence");
    Change::insert(doc.path(), position, text)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::change::ChangeSet;

    #[test]
    fn not_found_suggests_close_names() {
        let doc =
            SourceDocument::parse("a.ts", "export enum UserActionTypes { A }\n").unwrap();
        let err = PlanError::not_found(&doc, SyntaxKind::EnumDeclaration, "UserActionType");

        assert!(err.to_string().contains("did you mean 'UserActionTypes'?"));
    }

    #[test]
    fn not_found_without_candidates_has_no_hint() {
        let doc = SourceDocument::parse("a.ts", "const a = 1;\n").unwrap();
        let err = PlanError::not_found(&doc, SyntaxKind::ClassDeclaration, "State");

        assert_eq!(err.to_string(), "cannot find class 'State' in a.ts");
    }

    #[test]
    fn insert_after_last_uses_fallback_for_empty_list() {
        let doc = SourceDocument::parse("a.ts", "const a = 1;\n").unwrap();
        let change = insert_after_last(&doc, &[], "x", 3, None);

        assert_eq!(change.span().map(|s| s.start), Some(3));
    }

    #[test]
    fn insert_after_last_targets_latest_node() {
        let source = "class A {}\nclass B { m() {} }\n";
        let doc = SourceDocument::parse("a.ts", source).unwrap();
        let classes = find_kind(doc.root(), SyntaxKind::ClassDeclaration);
        let change = insert_after_last(&doc, &classes, "// end\n", 0, None);

        let mut set = ChangeSet::new("a.ts");
        set.push(change);
        assert_eq!(
            set.apply(source).unwrap(),
            "class A {}\nclass B { m() {} }// end\n\n"
        );
    }
}
