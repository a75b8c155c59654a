use super::{insert_after_last, PlanError};
use crate::change::Change;
use crate::ts::{find_first, find_kind, find_named, SourceDocument, SyntaxKind, SyntaxNode};

/// Add the class `class_name` unless the file already declares it.
///
/// The new source goes right after the last class declaration, separated by
/// a blank line, or at the top of the file when there is none.
pub fn add_class(
    doc: &SourceDocument,
    class_name: &str,
    class_source: &str,
) -> Result<Vec<Change>, PlanError> {
    if find_named(doc.root(), SyntaxKind::ClassDeclaration, class_name).is_some() {
        tracing::debug!(file = doc.path(), class_name, "class already present");
        return Ok(vec![Change::noop(
            doc.path(),
            format!("class {class_name} already exists"),
        )]);
    }

    let body = class_source.trim();
    let classes = find_kind(doc.root(), SyntaxKind::ClassDeclaration);
    let change = if classes.is_empty() {
        Change::insert(doc.path(), 0, format!("{body}\n\n"))
    } else {
        insert_after_last(doc, &classes, &format!("\n\n{body}"), 0, None)
    };
    Ok(vec![change])
}

/// Append `parameter` to the parameter list of the first constructor, or of
/// the constructor of `class_name` when given.
pub fn add_constructor_parameter(
    doc: &SourceDocument,
    class_name: Option<&str>,
    parameter: &str,
) -> Result<Vec<Change>, PlanError> {
    let ctor = constructor(doc, class_name)?;
    let params = ctor
        .field("parameters")
        .ok_or_else(|| missing_constructor(doc, class_name))?;

    let tail = params
        .children()
        .into_iter()
        .rev()
        .find(|child| child.raw_kind() != ")" && child.raw_kind() != "comment");
    let change = match tail {
        Some(token) if token.raw_kind() == "(" => {
            Change::insert(doc.path(), token.end(), parameter)
        }
        Some(token) if token.raw_kind() == "," => {
            Change::insert(doc.path(), token.end(), format!(" {parameter}"))
        }
        Some(last) => Change::insert(doc.path(), last.end(), format!(", {parameter}")),
        None => return Err(missing_constructor(doc, class_name)),
    };
    Ok(vec![change])
}

/// Insert a class member right before the first constructor, after whatever
/// token precedes it (the class body's `{`, a field's `;`, another member).
pub fn insert_before_constructor(
    doc: &SourceDocument,
    class_name: Option<&str>,
    member: &str,
) -> Result<Vec<Change>, PlanError> {
    let ctor = constructor(doc, class_name)?;
    let position = ctor.prev_sibling().map_or(ctor.start(), |token| token.end());
    Ok(vec![Change::insert(doc.path(), position, member)])
}

fn constructor<'a>(
    doc: &'a SourceDocument,
    class_name: Option<&str>,
) -> Result<SyntaxNode<'a>, PlanError> {
    let scope = match class_name {
        Some(name) => find_named(doc.root(), SyntaxKind::ClassDeclaration, name)
            .ok_or_else(|| PlanError::not_found(doc, SyntaxKind::ClassDeclaration, name))?,
        None => doc.root(),
    };
    find_first(scope, SyntaxKind::Constructor, |_| true)
        .ok_or_else(|| missing_constructor(doc, class_name))
}

fn missing_constructor(doc: &SourceDocument, class_name: Option<&str>) -> PlanError {
    PlanError::not_found(doc, SyntaxKind::Constructor, class_name.unwrap_or("constructor"))
}
