use super::PlanError;
use crate::change::Change;
use crate::ts::{find_all, find_first, find_kind, SourceDocument, SyntaxKind, SyntaxNode};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ImportForm {
    Named,
    Default,
}

/// Make `symbol` available as a named import from `module`.
pub fn insert_import(
    doc: &SourceDocument,
    symbol: &str,
    module: &str,
) -> Result<Vec<Change>, PlanError> {
    plan_import(doc, &[symbol], module, ImportForm::Named)
}

/// Make several symbols available from `module` in one change: an existing
/// import is extended with whatever is missing, otherwise one statement
/// lists them all.
pub fn insert_named_imports<S: AsRef<str>>(
    doc: &SourceDocument,
    symbols: &[S],
    module: &str,
) -> Result<Vec<Change>, PlanError> {
    let symbols: Vec<&str> = symbols.iter().map(AsRef::as_ref).collect();
    plan_import(doc, &symbols, module, ImportForm::Named)
}

/// Make `symbol` available as the default import of `module`.
pub fn insert_default_import(
    doc: &SourceDocument,
    symbol: &str,
    module: &str,
) -> Result<Vec<Change>, PlanError> {
    plan_import(doc, &[symbol], module, ImportForm::Default)
}

fn plan_import(
    doc: &SourceDocument,
    symbols: &[&str],
    module: &str,
    form: ImportForm,
) -> Result<Vec<Change>, PlanError> {
    let root = doc.root();
    let relevant = find_all(root, SyntaxKind::ImportDeclaration, |import| {
        import.field("source").and_then(|s| s.string_value()) == Some(module)
    });

    if relevant
        .iter()
        .any(|import| find_first(*import, SyntaxKind::NamespaceImport, |_| true).is_some())
    {
        tracing::debug!(file = doc.path(), module, "module is namespace-imported");
        return Ok(vec![Change::noop(
            doc.path(),
            format!("'{module}' is already imported as a namespace"),
        )]);
    }

    let present: Vec<&str> = relevant
        .iter()
        .flat_map(|import| find_kind(*import, SyntaxKind::Identifier))
        .map(|ident| ident.text())
        .collect();
    let mut missing: Vec<&str> = Vec::new();
    for symbol in symbols.iter().map(|s| s.trim()) {
        if !present.contains(&symbol) && !missing.contains(&symbol) {
            missing.push(symbol);
        }
    }
    if missing.is_empty() {
        tracing::debug!(file = doc.path(), module, "symbols already imported");
        return Ok(vec![Change::noop(
            doc.path(),
            format!("{} already imported from '{module}'", symbols.join(", ")),
        )]);
    }

    let change = match relevant.iter().find_map(|import| import_clause(*import)) {
        Some(clause) => extend_clause(doc, clause, &missing, form),
        None => new_statement(doc, &missing, module, form),
    };
    Ok(vec![change])
}

fn import_clause<'a>(import: SyntaxNode<'a>) -> Option<SyntaxNode<'a>> {
    import
        .named_children()
        .into_iter()
        .find(|child| child.raw_kind() == "import_clause")
}

fn extend_clause(
    doc: &SourceDocument,
    clause: SyntaxNode<'_>,
    missing: &[&str],
    form: ImportForm,
) -> Change {
    let list = missing.join(", ");
    let named = clause
        .named_children()
        .into_iter()
        .find(|child| child.is(SyntaxKind::NamedImports));
    let default = clause
        .named_children()
        .into_iter()
        .find(|child| child.raw_kind() == "identifier");

    match (form, named, default) {
        (ImportForm::Default, _, Some(existing)) => Change::noop(
            doc.path(),
            format!("default import {} already present", existing.text()),
        ),
        (ImportForm::Default, _, None) => {
            Change::insert(doc.path(), clause.start(), format!("{list}, "))
        }
        (_, Some(named), _) => {
            let last = named
                .named_children()
                .into_iter()
                .filter(|child| child.raw_kind() == "import_specifier")
                .last();
            match (last, named.token("{")) {
                (Some(last), _) => Change::insert(doc.path(), last.end(), format!(", {list}")),
                (None, Some(open)) if named.text() == "{}" => {
                    Change::insert(doc.path(), open.end(), format!(" {list} "))
                }
                (None, Some(open)) => Change::insert(doc.path(), open.end(), format!(" {list}")),
                (None, None) => Change::insert(doc.path(), named.end(), format!(", {list}")),
            }
        }
        (_, None, Some(default)) => {
            Change::insert(doc.path(), default.end(), format!(", {{ {list} }}"))
        }
        (_, None, None) => Change::insert(doc.path(), clause.end(), format!(", {list}")),
    }
}

fn new_statement(doc: &SourceDocument, missing: &[&str], module: &str, form: ImportForm) -> Change {
    let statement = match form {
        ImportForm::Named => format!("import {{ {} }} from '{module}';", missing.join(", ")),
        ImportForm::Default => format!("import {} from '{module}';", missing.join(", ")),
    };

    let root = doc.root();
    let imports = find_kind(root, SyntaxKind::ImportDeclaration);
    if let Some(last) = imports.iter().max_by_key(|import| import.end()) {
        return Change::insert(doc.path(), last.end(), format!("\n{statement}"));
    }

    let prologue = root.named_children().into_iter().find(|node| {
        node.is(SyntaxKind::ExpressionStatement)
            && node
                .named_children()
                .first()
                .and_then(|expr| expr.string_value())
                == Some("use strict")
    });
    match prologue {
        Some(prologue) => Change::insert(doc.path(), prologue.end(), format!("\n{statement}")),
        None => Change::insert(doc.path(), 0, format!("{statement}\n")),
    }
}
