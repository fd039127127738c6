//! Type aliases and utilities for C# CST nodes
//!
//! These types are built on top of Rowan's generic tree types, parameterized
//! with our CsLanguage.

use super::{CsLanguage, CsSyntaxKind};

/// A node in the C# concrete syntax tree
///
/// Red nodes are cheap views over a shared green tree. They are not `Send`,
/// so every worker thread parses its own tree.
///
/// # Example
///
/// ```rust,ignore
/// use sharplint_core::cst::{parse_csharp, CsSyntaxKind};
///
/// let parse = parse_csharp("class C { }");
/// let root = parse.syntax();
/// assert_eq!(root.kind(), CsSyntaxKind::CompilationUnit);
/// assert_eq!(root.text().to_string(), "class C { }");
/// ```
pub type CsSyntaxNode = rowan::SyntaxNode<CsLanguage>;

/// A token in the C# concrete syntax tree
pub type CsSyntaxToken = rowan::SyntaxToken<CsLanguage>;

/// Either a node or a token in the CST
pub type CsSyntaxElement = rowan::SyntaxElement<CsLanguage>;

/// Iterator over child nodes
pub type CsSyntaxNodeChildren = rowan::SyntaxNodeChildren<CsLanguage>;

/// Iterator over child nodes and tokens
pub type CsSyntaxElementChildren = rowan::SyntaxElementChildren<CsLanguage>;

// Re-export common rowan types for convenience
pub use rowan::{
    Direction, GreenNode, GreenToken, NodeOrToken, TextRange, TextSize, WalkEvent,
};

/// Extension trait for CsSyntaxNode with C#-specific helpers
pub trait CsSyntaxNodeExt {
    /// Check if this node matches the given kind
    fn is_kind(&self, kind: CsSyntaxKind) -> bool;

    /// Find the first child node of a specific kind
    fn child_of_kind(&self, kind: CsSyntaxKind) -> Option<CsSyntaxNode>;

    /// Find all child nodes of a specific kind
    fn children_of_kind(&self, kind: CsSyntaxKind) -> Vec<CsSyntaxNode>;

    /// Find the first child token of a specific kind
    fn token_of_kind(&self, kind: CsSyntaxKind) -> Option<CsSyntaxToken>;

    /// Iterate over the direct non-trivia tokens of this node
    fn significant_tokens(&self) -> Vec<CsSyntaxToken>;

    /// Get the text content without surrounding whitespace
    fn trimmed_text(&self) -> String;
}

impl CsSyntaxNodeExt for CsSyntaxNode {
    fn is_kind(&self, kind: CsSyntaxKind) -> bool {
        self.kind() == kind
    }

    fn child_of_kind(&self, kind: CsSyntaxKind) -> Option<CsSyntaxNode> {
        self.children().find(|child| child.kind() == kind)
    }

    fn children_of_kind(&self, kind: CsSyntaxKind) -> Vec<CsSyntaxNode> {
        self.children()
            .filter(|child| child.kind() == kind)
            .collect()
    }

    fn token_of_kind(&self, kind: CsSyntaxKind) -> Option<CsSyntaxToken> {
        self.children_with_tokens()
            .filter_map(|element| element.into_token())
            .find(|token| token.kind() == kind)
    }

    fn significant_tokens(&self) -> Vec<CsSyntaxToken> {
        self.children_with_tokens()
            .filter_map(|element| element.into_token())
            .filter(|token| !token.kind().is_trivia())
            .collect()
    }

    fn trimmed_text(&self) -> String {
        self.text().to_string().trim().to_string()
    }
}

/// Extension trait for CsSyntaxToken with C#-specific helpers
pub trait CsSyntaxTokenExt {
    /// Check if this token matches the given kind
    fn is_kind(&self, kind: CsSyntaxKind) -> bool;

    /// Check if this is a trivia token
    fn is_trivia(&self) -> bool;

    /// Identifier text with a leading verbatim `@` removed
    fn value_text(&self) -> &str;
}

impl CsSyntaxTokenExt for CsSyntaxToken {
    fn is_kind(&self, kind: CsSyntaxKind) -> bool {
        self.kind() == kind
    }

    fn is_trivia(&self) -> bool {
        self.kind().is_trivia()
    }

    fn value_text(&self) -> &str {
        identifier_value_text(self.text())
    }
}

/// Strip the verbatim `@` prefix from an identifier
pub fn identifier_value_text(text: &str) -> &str {
    text.strip_prefix('@').unwrap_or(text)
}
