//! Kind-tagged node lookup over a parsed TypeScript tree.
//!
//! Tree-sitter exposes node kinds as grammar strings. The locator maps the
//! handful of constructs the planners care about onto a closed [`SyntaxKind`]
//! set so callers match on a tag instead of comparing strings, and every
//! other node is still walked but never reported.

use crate::change::Span;
use std::fmt;

/// Closed set of syntactic constructs the planners query for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SyntaxKind {
    ImportDeclaration,
    NamedImports,
    NamespaceImport,
    ExportStatement,
    ExpressionStatement,
    EnumDeclaration,
    ClassDeclaration,
    InterfaceDeclaration,
    FunctionDeclaration,
    Constructor,
    Parameter,
    SwitchStatement,
    CaseClause,
    TypeAliasDeclaration,
    UnionType,
    Decorator,
    CallExpression,
    ObjectLiteral,
    PropertyAssignment,
    ArrayLiteral,
    Identifier,
    StringLiteral,
}

impl SyntaxKind {
    /// Map a tree-sitter node onto its tag, if it is one we track.
    ///
    /// `method_definition` is only a [`SyntaxKind::Constructor`] when its name
    /// is `constructor`; other methods are untagged.
    fn classify(node: tree_sitter::Node<'_>, source: &str) -> Option<Self> {
        let kind = match node.kind() {
            "import_statement" => SyntaxKind::ImportDeclaration,
            "named_imports" => SyntaxKind::NamedImports,
            "namespace_import" => SyntaxKind::NamespaceImport,
            "export_statement" => SyntaxKind::ExportStatement,
            "expression_statement" => SyntaxKind::ExpressionStatement,
            "enum_declaration" => SyntaxKind::EnumDeclaration,
            "class_declaration" | "abstract_class_declaration" => SyntaxKind::ClassDeclaration,
            "interface_declaration" => SyntaxKind::InterfaceDeclaration,
            "function_declaration" | "generator_function_declaration" => {
                SyntaxKind::FunctionDeclaration
            }
            "method_definition" => {
                let name = node.child_by_field_name("name")?;
                if &source[name.byte_range()] != "constructor" {
                    return None;
                }
                SyntaxKind::Constructor
            }
            "required_parameter" | "optional_parameter" => SyntaxKind::Parameter,
            "switch_statement" => SyntaxKind::SwitchStatement,
            "switch_case" => SyntaxKind::CaseClause,
            "type_alias_declaration" => SyntaxKind::TypeAliasDeclaration,
            "union_type" => SyntaxKind::UnionType,
            "decorator" => SyntaxKind::Decorator,
            "call_expression" => SyntaxKind::CallExpression,
            "object" => SyntaxKind::ObjectLiteral,
            "pair" => SyntaxKind::PropertyAssignment,
            "array" => SyntaxKind::ArrayLiteral,
            "identifier"
            | "type_identifier"
            | "property_identifier"
            | "shorthand_property_identifier" => SyntaxKind::Identifier,
            "string" => SyntaxKind::StringLiteral,
            _ => return None,
        };
        Some(kind)
    }

    /// Human-readable name used in error messages.
    pub fn describe(self) -> &'static str {
        match self {
            SyntaxKind::ImportDeclaration => "import declaration",
            SyntaxKind::NamedImports => "named imports",
            SyntaxKind::NamespaceImport => "namespace import",
            SyntaxKind::ExportStatement => "export statement",
            SyntaxKind::ExpressionStatement => "expression statement",
            SyntaxKind::EnumDeclaration => "enum",
            SyntaxKind::ClassDeclaration => "class",
            SyntaxKind::InterfaceDeclaration => "interface",
            SyntaxKind::FunctionDeclaration => "function",
            SyntaxKind::Constructor => "constructor",
            SyntaxKind::Parameter => "parameter",
            SyntaxKind::SwitchStatement => "switch statement",
            SyntaxKind::CaseClause => "case clause",
            SyntaxKind::TypeAliasDeclaration => "type alias",
            SyntaxKind::UnionType => "union type",
            SyntaxKind::Decorator => "decorator",
            SyntaxKind::CallExpression => "call expression",
            SyntaxKind::ObjectLiteral => "object literal",
            SyntaxKind::PropertyAssignment => "property assignment",
            SyntaxKind::ArrayLiteral => "array literal",
            SyntaxKind::Identifier => "identifier",
            SyntaxKind::StringLiteral => "string literal",
        }
    }
}

impl fmt::Display for SyntaxKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.describe())
    }
}

/// Borrowed view of one node of a [`SourceDocument`](crate::ts::SourceDocument).
#[derive(Clone, Copy)]
pub struct SyntaxNode<'a> {
    node: tree_sitter::Node<'a>,
    source: &'a str,
}

impl<'a> SyntaxNode<'a> {
    pub(crate) fn new(node: tree_sitter::Node<'a>, source: &'a str) -> Self {
        Self { node, source }
    }

    /// Tag of this node, `None` for constructs outside the tracked set.
    pub fn kind(&self) -> Option<SyntaxKind> {
        SyntaxKind::classify(self.node, self.source)
    }

    /// Raw tree-sitter grammar kind, e.g. `"enum_body"`.
    pub fn raw_kind(&self) -> &'static str {
        self.node.kind()
    }

    pub fn is(&self, kind: SyntaxKind) -> bool {
        self.kind() == Some(kind)
    }

    pub fn start(&self) -> usize {
        self.node.start_byte()
    }

    pub fn end(&self) -> usize {
        self.node.end_byte()
    }

    pub fn span(&self) -> Span {
        Span::new(self.start(), self.end())
    }

    /// Original source text covered by this node.
    pub fn text(&self) -> &'a str {
        &self.source[self.node.byte_range()]
    }

    /// Child stored under a grammar field such as `name`, `body` or `value`.
    pub fn field(&self, name: &str) -> Option<SyntaxNode<'a>> {
        self.node
            .child_by_field_name(name)
            .map(|node| SyntaxNode::new(node, self.source))
    }

    /// Text of the `name` field (enum, class, interface, function, type alias).
    pub fn name(&self) -> Option<&'a str> {
        self.field("name").map(|n| n.text())
    }

    /// String literal contents without the surrounding quotes.
    pub fn string_value(&self) -> Option<&'a str> {
        if self.node.kind() != "string" {
            return None;
        }
        let text = self.text();
        if text.len() >= 2 {
            Some(&text[1..text.len() - 1])
        } else {
            Some("")
        }
    }

    /// All children, anonymous tokens (`{`, `,`, `;`) included.
    pub fn children(&self) -> Vec<SyntaxNode<'a>> {
        let mut cursor = self.node.walk();
        self.node
            .children(&mut cursor)
            .map(|node| SyntaxNode::new(node, self.source))
            .collect()
    }

    /// Named children excluding comments.
    pub fn named_children(&self) -> Vec<SyntaxNode<'a>> {
        let mut cursor = self.node.walk();
        self.node
            .named_children(&mut cursor)
            .filter(|node| node.kind() != "comment")
            .map(|node| SyntaxNode::new(node, self.source))
            .collect()
    }

    pub fn parent(&self) -> Option<SyntaxNode<'a>> {
        self.node
            .parent()
            .map(|node| SyntaxNode::new(node, self.source))
    }

    /// Previous sibling, anonymous tokens included.
    pub fn prev_sibling(&self) -> Option<SyntaxNode<'a>> {
        self.node
            .prev_sibling()
            .map(|node| SyntaxNode::new(node, self.source))
    }

    /// First anonymous child token with the given text, e.g. `{` or `from`.
    pub fn token(&self, text: &str) -> Option<SyntaxNode<'a>> {
        self.children()
            .into_iter()
            .find(|child| !child.node.is_named() && child.node.kind() == text)
    }

    /// Last anonymous child token with the given text.
    pub fn last_token(&self, text: &str) -> Option<SyntaxNode<'a>> {
        self.children()
            .into_iter()
            .rev()
            .find(|child| !child.node.is_named() && child.node.kind() == text)
    }

    /// Span to delete when removing this declaration: widened to the
    /// enclosing `export` statement so no dangling `export` keyword remains.
    pub fn declaration_span(&self) -> Span {
        match self.parent() {
            Some(parent) if parent.is(SyntaxKind::ExportStatement) => parent.span(),
            _ => self.span(),
        }
    }
}

impl fmt::Debug for SyntaxNode<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SyntaxNode")
            .field("kind", &self.node.kind())
            .field("span", &self.span())
            .finish()
    }
}

/// All nodes of `kind` at or below `root` that satisfy `predicate`, in
/// depth-first document order (a parent precedes its descendants).
pub fn find_all<'a, P>(root: SyntaxNode<'a>, kind: SyntaxKind, predicate: P) -> Vec<SyntaxNode<'a>>
where
    P: Fn(&SyntaxNode<'a>) -> bool,
{
    let mut found = Vec::new();
    walk(root, kind, &predicate, &mut found);
    found
}

/// All nodes of `kind` at or below `root`.
pub fn find_kind(root: SyntaxNode<'_>, kind: SyntaxKind) -> Vec<SyntaxNode<'_>> {
    find_all(root, kind, |_| true)
}

/// First node of `kind` satisfying `predicate`, in document order.
pub fn find_first<'a, P>(root: SyntaxNode<'a>, kind: SyntaxKind, predicate: P) -> Option<SyntaxNode<'a>>
where
    P: Fn(&SyntaxNode<'a>) -> bool,
{
    first(root, kind, &predicate)
}

/// First node of `kind` whose `name` field equals `name`.
pub fn find_named<'a>(root: SyntaxNode<'a>, kind: SyntaxKind, name: &str) -> Option<SyntaxNode<'a>> {
    find_first(root, kind, |node| node.name() == Some(name))
}

fn walk<'a, P>(node: SyntaxNode<'a>, kind: SyntaxKind, predicate: &P, found: &mut Vec<SyntaxNode<'a>>)
where
    P: Fn(&SyntaxNode<'a>) -> bool,
{
    if node.is(kind) && predicate(&node) {
        found.push(node);
    }
    for child in node.children() {
        walk(child, kind, predicate, found);
    }
}

fn first<'a, P>(node: SyntaxNode<'a>, kind: SyntaxKind, predicate: &P) -> Option<SyntaxNode<'a>>
where
    P: Fn(&SyntaxNode<'a>) -> bool,
{
    if node.is(kind) && predicate(&node) {
        return Some(node);
    }
    node.children()
        .into_iter()
        .find_map(|child| first(child, kind, predicate))
}
