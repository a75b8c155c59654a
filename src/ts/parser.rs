use crate::pool::with_parser;
use crate::ts::errors::TreeSitterError;
use crate::ts::locator::SyntaxNode;
use ast_grep_language::{LanguageExt, SupportLang};
use tree_sitter::{Parser, Tree};

/// Tree-sitter parser wrapper for TypeScript source code.
pub struct TypeScriptParser {
    parser: Parser,
}

impl TypeScriptParser {
    /// Create a parser for the TypeScript grammar bundled with ast-grep-language.
    pub fn new() -> Result<Self, TreeSitterError> {
        let mut parser = Parser::new();
        let ts_lang = SupportLang::TypeScript.get_ts_language();
        parser
            .set_language(&ts_lang)
            .map_err(|_| TreeSitterError::LanguageSet)?;

        Ok(Self { parser })
    }

    /// Parse source code into a tree-sitter Tree.
    pub fn parse(&mut self, source: &str) -> Option<Tree> {
        self.parser.parse(source, None)
    }
}

/// An immutable parsed file: its path, its original text and the syntax tree.
///
/// Changes computed against a document always refer to offsets in
/// [`SourceDocument::text`]; the tree is never mutated.
pub struct SourceDocument {
    path: String,
    text: String,
    tree: Tree,
}

impl SourceDocument {
    /// Parse `text` using the thread-local pooled parser.
    pub fn parse(path: impl Into<String>, text: impl Into<String>) -> Result<Self, TreeSitterError> {
        let path = path.into();
        let text = text.into();
        let tree = with_parser(|parser| parser.parse(&text))?
            .ok_or_else(|| TreeSitterError::ParseFailed { path: path.clone() })?;

        Ok(Self { path, text, tree })
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    /// Root node (`program`) of the syntax tree.
    pub fn root(&self) -> SyntaxNode<'_> {
        SyntaxNode::new(self.tree.root_node(), &self.text)
    }

    /// Check if the tree contains any ERROR or MISSING nodes.
    pub fn has_errors(&self) -> bool {
        self.tree.root_node().has_error()
    }

    /// Get all ERROR and MISSING nodes in the tree.
    pub fn error_nodes(&self) -> Vec<ErrorNode> {
        let mut errors = Vec::new();
        collect_error_nodes(self.tree.root_node(), &mut errors);
        errors
    }
}

/// Information about an ERROR node in the parse tree.
#[derive(Debug, Clone)]
pub struct ErrorNode {
    pub byte_start: usize,
    pub byte_end: usize,
    pub start_point: tree_sitter::Point,
}

fn collect_error_nodes(node: tree_sitter::Node<'_>, errors: &mut Vec<ErrorNode>) {
    if node.is_error() || node.is_missing() {
        errors.push(ErrorNode {
            byte_start: node.start_byte(),
            byte_end: node.end_byte(),
            start_point: node.start_position(),
        });
    }

    let mut cursor = node.walk();
    for child in node.children(&mut cursor) {
        collect_error_nodes(child, errors);
    }
}
