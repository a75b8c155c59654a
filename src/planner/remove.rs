use super::PlanError;
use crate::change::Change;
use crate::ts::{find_named, SourceDocument, SyntaxKind};

/// Remove the declaration `name` of `kind`, including an `export` keyword in
/// front of it. Removing something already gone is a Noop.
pub fn remove_node(
    doc: &SourceDocument,
    kind: SyntaxKind,
    name: &str,
) -> Result<Vec<Change>, PlanError> {
    let Some(node) = find_named(doc.root(), kind, name) else {
        tracing::debug!(file = doc.path(), %kind, name, "nothing to remove");
        return Ok(vec![Change::noop(doc.path(), format!("{kind} {name} not present"))]);
    };

    let span = node.declaration_span();
    let original = &doc.text()[span.start..span.end];
    Ok(vec![Change::remove(doc.path(), span, original)])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::change::ChangeSet;

    #[test]
    fn removes_exported_interface() {
        let source = "export interface State {\n\n}\n\nexport const a = 1;\n";
        let doc = SourceDocument::parse("x.ts", source).unwrap();
        let mut set = ChangeSet::new("x.ts");
        set.extend(remove_node(&doc, SyntaxKind::InterfaceDeclaration, "State").unwrap());

        assert_eq!(set.apply(source).unwrap(), "\n\nexport const a = 1;\n");
    }

    #[test]
    fn absent_node_is_noop() {
        let doc = SourceDocument::parse("x.ts", "export const a = 1;\n").unwrap();
        let changes = remove_node(&doc, SyntaxKind::InterfaceDeclaration, "State").unwrap();

        assert!(changes[0].is_noop());
    }
}
