use super::{insert_after_last, PlanError};
use crate::change::Change;
use crate::ts::{find_first, find_kind, find_named, SourceDocument, SyntaxKind, SyntaxNode};

/// Rename the function `function_name` to `new_name`. With `retarget`
/// `(from, to)`, the first identifier `from` inside the function (parameters,
/// return type, body) is rewritten to `to` as well.
pub fn rename_function(
    doc: &SourceDocument,
    function_name: &str,
    new_name: &str,
    retarget: Option<(&str, &str)>,
) -> Result<Vec<Change>, PlanError> {
    let function = find_named(doc.root(), SyntaxKind::FunctionDeclaration, function_name)
        .ok_or_else(|| PlanError::not_found(doc, SyntaxKind::FunctionDeclaration, function_name))?;
    let name = function
        .field("name")
        .ok_or_else(|| PlanError::not_found(doc, SyntaxKind::FunctionDeclaration, function_name))?;

    let mut changes = vec![Change::replace(doc.path(), name.span(), name.text(), new_name)];

    if let Some((from, to)) = retarget {
        let target = find_first(function, SyntaxKind::Identifier, |ident| {
            ident.text() == from && ident.start() != name.start()
        })
        .ok_or_else(|| PlanError::not_found(doc, SyntaxKind::Identifier, from))?;
        changes.push(Change::replace(doc.path(), target.span(), target.text(), to));
    }

    tracing::debug!(file = doc.path(), function_name, new_name, "planned function rename");
    Ok(changes)
}

/// Add a case clause to the last switch statement of the file, or of
/// `function_name` when given. `label` is the case expression used to detect
/// an existing clause; `case_source` is the full clause text.
pub fn add_switch_case(
    doc: &SourceDocument,
    function_name: Option<&str>,
    label: &str,
    case_source: &str,
) -> Result<Vec<Change>, PlanError> {
    let scope = match function_name {
        Some(name) => find_named(doc.root(), SyntaxKind::FunctionDeclaration, name)
            .ok_or_else(|| PlanError::not_found(doc, SyntaxKind::FunctionDeclaration, name))?,
        None => doc.root(),
    };
    let switch = find_kind(scope, SyntaxKind::SwitchStatement)
        .into_iter()
        .max_by_key(|node| node.start())
        .ok_or_else(|| {
            PlanError::not_found(doc, SyntaxKind::SwitchStatement, function_name.unwrap_or("switch"))
        })?;
    let body = switch
        .field("body")
        .ok_or_else(|| PlanError::not_found(doc, SyntaxKind::SwitchStatement, label))?;

    let cases: Vec<SyntaxNode<'_>> = body
        .named_children()
        .into_iter()
        .filter(|clause| clause.is(SyntaxKind::CaseClause))
        .collect();
    let label = label.trim();
    if cases
        .iter()
        .any(|clause| clause.field("value").map(|v| v.text().trim()) == Some(label))
    {
        tracing::debug!(file = doc.path(), label, "case already handled");
        return Ok(vec![Change::noop(doc.path(), format!("case {label} already exists"))]);
    }

    let open = body.token("{").map_or(body.start(), |token| token.end());
    let text = format!("\n{}", case_source.trim());
    Ok(vec![insert_after_last(doc, &cases, &text, open, None)])
}
