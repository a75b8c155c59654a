use super::PlanError;
use crate::change::Change;
use crate::ts::{find_named, SourceDocument, SyntaxKind, SyntaxNode};
use serde::{Deserialize, Serialize};

/// One enumerator to append: `Name` or `Name = 'value'`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnumMember {
    pub name: String,
    #[serde(default)]
    pub value: Option<String>,
}

impl EnumMember {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: None,
        }
    }

    pub fn with_value(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: Some(value.into()),
        }
    }

    fn to_source(&self) -> String {
        match &self.value {
            Some(value) => {
                let escaped = value.replace('\\', "\\\\").replace('\'', "\\'");
                format!("{} = '{}'", self.name, escaped)
            }
            None => self.name.clone(),
        }
    }
}

/// Append `members` to the enum named `enum_name`.
///
/// Every insert lands at the same offset (after the last member, or after a
/// trailing comma), so the applier keeps them in call order.
pub fn add_enum_members(
    doc: &SourceDocument,
    enum_name: &str,
    members: &[EnumMember],
) -> Result<Vec<Change>, PlanError> {
    let target = find_named(doc.root(), SyntaxKind::EnumDeclaration, enum_name)
        .ok_or_else(|| PlanError::not_found(doc, SyntaxKind::EnumDeclaration, enum_name))?;
    let body = target
        .field("body")
        .ok_or_else(|| PlanError::not_found(doc, SyntaxKind::EnumDeclaration, enum_name))?;

    let mut names: Vec<String> = body
        .named_children()
        .iter()
        .map(|member| member_name(member).to_string())
        .collect();

    let tail = body
        .children()
        .into_iter()
        .rev()
        .find(|child| child.raw_kind() != "}" && child.raw_kind() != "comment");
    let (position, mut needs_comma) = match tail {
        Some(token) if token.raw_kind() == "," || token.raw_kind() == "{" => (token.end(), false),
        Some(member) => (member.end(), true),
        None => (body.start(), false),
    };

    let mut changes = Vec::with_capacity(members.len());
    for member in members {
        if names.iter().any(|existing| existing == &member.name) {
            return Err(PlanError::duplicate(doc, enum_name, &member.name));
        }
        let separator = if needs_comma { ", " } else { "" };
        changes.push(Change::insert(
            doc.path(),
            position,
            format!("{separator}{}", member.to_source()),
        ));
        needs_comma = true;
        names.push(member.name.clone());
    }

    tracing::debug!(
        file = doc.path(),
        enum_name,
        count = changes.len(),
        "planned enum members"
    );
    Ok(changes)
}

fn member_name<'a>(member: &SyntaxNode<'a>) -> &'a str {
    let name = if member.raw_kind() == "enum_assignment" {
        member.field("name").map_or(member.text(), |n| n.text())
    } else {
        member.text()
    };
    name.trim_matches(|c| c == '\'' || c == '"')
}
