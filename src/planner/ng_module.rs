//! `@NgModule({...})` metadata edits.

use super::PlanError;
use crate::change::Change;
use crate::ts::{find_first, SourceDocument, SyntaxKind, SyntaxNode};

/// Append `expressions` to the `imports` array of the NgModule.
pub fn add_import_to_module<S: AsRef<str>>(
    doc: &SourceDocument,
    expressions: &[S],
) -> Result<Vec<Change>, PlanError> {
    add_to_ng_module(doc, "imports", expressions)
}

/// Append `expressions` to the `providers` array of the NgModule.
pub fn add_provider_to_module<S: AsRef<str>>(
    doc: &SourceDocument,
    expressions: &[S],
) -> Result<Vec<Change>, PlanError> {
    add_to_ng_module(doc, "providers", expressions)
}

/// Append `expressions` to the array under `property` of the `@NgModule`
/// metadata object, creating the property when it is missing. Expressions
/// already listed (ignoring whitespace) are skipped.
pub fn add_to_ng_module<S: AsRef<str>>(
    doc: &SourceDocument,
    property: &str,
    expressions: &[S],
) -> Result<Vec<Change>, PlanError> {
    let metadata = ng_module_metadata(doc)?;

    let existing_pair = metadata.named_children().into_iter().find(|pair| {
        pair.is(SyntaxKind::PropertyAssignment)
            && pair
                .field("key")
                .map(|key| key.text().trim_matches(|c| c == '\'' || c == '"'))
                == Some(property)
    });

    let present: Vec<String> = existing_pair
        .and_then(|pair| pair.field("value"))
        .filter(|value| value.is(SyntaxKind::ArrayLiteral))
        .map(|array| array.named_children().iter().map(|e| squash(e.text())).collect())
        .unwrap_or_default();

    let mut added: Vec<&str> = Vec::new();
    for expression in expressions.iter().map(|e| e.as_ref().trim()) {
        let key = squash(expression);
        if present.contains(&key) || added.iter().any(|a| squash(a) == key) {
            continue;
        }
        added.push(expression);
    }
    if added.is_empty() {
        tracing::debug!(file = doc.path(), property, "NgModule metadata already lists expressions");
        return Ok(vec![Change::noop(
            doc.path(),
            format!("NgModule {property} already up to date"),
        )]);
    }

    let change = match existing_pair.and_then(|pair| pair.field("value")) {
        Some(array) if array.is(SyntaxKind::ArrayLiteral) => {
            append_to_list(doc, array, "]", &added)
        }
        Some(value) => Change::replace(
            doc.path(),
            value.span(),
            value.text(),
            format!("[...{}, {}]", value.text(), added.join(", ")),
        ),
        None => {
            let entry = format!("{property}: [{}]", added.join(", "));
            append_to_list(doc, metadata, "}", &[entry.as_str()])
        }
    };
    Ok(vec![change])
}

/// The object literal passed to the `@NgModule` decorator.
fn ng_module_metadata<'a>(doc: &'a SourceDocument) -> Result<SyntaxNode<'a>, PlanError> {
    let not_found = || PlanError::not_found(doc, SyntaxKind::Decorator, "NgModule");
    let call = find_first(doc.root(), SyntaxKind::Decorator, |decorator| {
        decorator
            .named_children()
            .first()
            .and_then(|call| call.field("function"))
            .map(|function| function.text())
            == Some("NgModule")
    })
    .and_then(|decorator| decorator.named_children().into_iter().next())
    .ok_or_else(not_found)?;

    call.field("arguments")
        .and_then(|args| {
            args.named_children()
                .into_iter()
                .find(|arg| arg.is(SyntaxKind::ObjectLiteral))
        })
        .ok_or_else(not_found)
}

/// Insert `items` at the end of a bracketed list (array or object literal),
/// following the separator style of the existing last element.
fn append_to_list(
    doc: &SourceDocument,
    list: SyntaxNode<'_>,
    close: &str,
    items: &[&str],
) -> Change {
    let joined = items.join(", ");
    let tail = list
        .children()
        .into_iter()
        .rev()
        .find(|child| child.raw_kind() != close && child.raw_kind() != "comment");

    match tail {
        Some(token) if token.raw_kind() == "," => {
            Change::insert(doc.path(), token.end(), format!(" {joined}"))
        }
        Some(open) if open.raw_kind() == "[" || open.raw_kind() == "{" => {
            Change::insert(doc.path(), open.end(), joined)
        }
        Some(last) => {
            let leading = last
                .prev_sibling()
                .map(|prev| &doc.text()[prev.end()..last.start()])
                .unwrap_or("");
            let separator = if leading.contains('\n') {
                format!(",{leading}")
            } else {
                ", ".to_string()
            };
            Change::insert(doc.path(), last.end(), format!("{separator}{joined}"))
        }
        None => Change::insert(doc.path(), list.end(), joined),
    }
}

fn squash(text: &str) -> String {
    text.chars().filter(|c| !c.is_whitespace()).collect()
}
