use super::PlanError;
use crate::change::Change;
use crate::ts::{find_named, SourceDocument, SyntaxKind, SyntaxNode};

/// Append `alternatives` to the type alias `type_name` with `|` separators,
/// right after its current type expression.
pub fn extend_union_type<S: AsRef<str>>(
    doc: &SourceDocument,
    type_name: &str,
    alternatives: &[S],
) -> Result<Vec<Change>, PlanError> {
    let alias = find_named(doc.root(), SyntaxKind::TypeAliasDeclaration, type_name)
        .ok_or_else(|| PlanError::not_found(doc, SyntaxKind::TypeAliasDeclaration, type_name))?;
    let value = alias
        .field("value")
        .ok_or_else(|| PlanError::not_found(doc, SyntaxKind::TypeAliasDeclaration, type_name))?;

    let mut present = Vec::new();
    collect_alternatives(value, &mut present);

    let mut text = String::new();
    for alternative in alternatives {
        let alternative = alternative.as_ref().trim();
        if present.iter().any(|existing| *existing == alternative) {
            return Err(PlanError::duplicate(doc, type_name, alternative));
        }
        present.push(alternative);
        text.push_str(" | ");
        text.push_str(alternative);
    }

    if text.is_empty() {
        return Ok(vec![Change::noop(doc.path(), "no alternatives to add")]);
    }
    Ok(vec![Change::insert(doc.path(), value.end(), text)])
}

fn collect_alternatives<'a>(node: SyntaxNode<'a>, out: &mut Vec<&'a str>) {
    if node.is(SyntaxKind::UnionType) {
        for child in node.named_children() {
            collect_alternatives(child, out);
        }
    } else {
        out.push(node.text().trim());
    }
}
