//! Typed AST layer over CST
//!
//! This module provides ergonomic, type-safe wrappers over the raw CST nodes.
//! Each wrapper implements a `cast()` method to safely convert from CST nodes.
//!
//! # Example
//!
//! ```ignore
//! use sharplint_core::cst::{parse_csharp, ast::{AstNode, ThrowStatement}};
//!
//! let parse = parse_csharp("throw new E(\"p\");");
//! let throw = parse.syntax().descendants().find_map(ThrowStatement::cast).unwrap();
//! assert!(throw.expression().is_some());
//! ```

use super::{CsSyntaxKind, CsSyntaxNode, CsSyntaxToken, identifier_value_text};

/// Helper trait for casting CST nodes to typed wrappers
pub trait AstNode: Sized {
    fn can_cast(kind: CsSyntaxKind) -> bool;
    fn cast(node: CsSyntaxNode) -> Option<Self>;
    fn syntax(&self) -> &CsSyntaxNode;
}

macro_rules! ast_node {
    ($(#[$meta:meta])* $name:ident, $($kind:ident)|+) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash)]
        pub struct $name {
            syntax: CsSyntaxNode,
        }

        impl AstNode for $name {
            fn can_cast(kind: CsSyntaxKind) -> bool {
                matches!(kind, $(CsSyntaxKind::$kind)|+)
            }

            fn cast(node: CsSyntaxNode) -> Option<Self> {
                if Self::can_cast(node.kind()) {
                    Some(Self { syntax: node })
                } else {
                    None
                }
            }

            fn syntax(&self) -> &CsSyntaxNode {
                &self.syntax
            }
        }
    };
}

/// Helper function to find first child of a specific kind
fn child_of_kind(parent: &CsSyntaxNode, kind: CsSyntaxKind) -> Option<CsSyntaxNode> {
    parent.children().find(|n| n.kind() == kind)
}

/// Helper function to find first token of a specific kind
fn token_of_kind(parent: &CsSyntaxNode, kind: CsSyntaxKind) -> Option<CsSyntaxToken> {
    parent
        .children_with_tokens()
        .filter_map(|e| e.into_token())
        .find(|t| t.kind() == kind)
}

/// First child node that is an expression
pub fn first_expression(parent: &CsSyntaxNode) -> Option<CsSyntaxNode> {
    parent.children().find(|n| n.kind().is_expression())
}

/// Dotted text of the identifiers directly under `node`, skipping type arguments
fn dotted_identifiers(node: &CsSyntaxNode) -> Vec<String> {
    node.children_with_tokens()
        .filter_map(|e| e.into_token())
        .filter(|t| t.kind() == CsSyntaxKind::Ident)
        .map(|t| identifier_value_text(t.text()).to_string())
        .collect()
}

// ============================================================================
// Declarations
// ============================================================================

ast_node!(
    /// Root of a parsed file
    CompilationUnit,
    CompilationUnit
);

impl CompilationUnit {
    pub fn usings(&self) -> impl Iterator<Item = UsingDirective> {
        self.syntax.children().filter_map(UsingDirective::cast)
    }
}

ast_node!(
    /// `using System;`, `using static X;`, `using A = B.C;`
    UsingDirective,
    UsingDirective
);

impl UsingDirective {
    pub fn is_static(&self) -> bool {
        self.syntax
            .children_with_tokens()
            .filter_map(|e| e.into_token())
            .any(|t| t.kind() == CsSyntaxKind::ModifierKw && t.text() == "static")
    }

    /// Alias name for `using A = B;`
    pub fn alias(&self) -> Option<String> {
        token_of_kind(&self.syntax, CsSyntaxKind::Eq)?;
        token_of_kind(&self.syntax, CsSyntaxKind::Ident)
            .map(|t| identifier_value_text(t.text()).to_string())
    }

    /// Imported namespace or aliased type, as dotted segments
    pub fn target(&self) -> Vec<String> {
        if let Some(name) = child_of_kind(&self.syntax, CsSyntaxKind::Name) {
            return dotted_identifiers(&name);
        }
        child_of_kind(&self.syntax, CsSyntaxKind::TypeRef)
            .and_then(TypeRef::cast)
            .map(|ty| ty.segments())
            .unwrap_or_default()
    }
}

ast_node!(
    /// Block-scoped or file-scoped namespace
    Namespace,
    NamespaceDeclaration | FileScopedNamespaceDeclaration
);

impl Namespace {
    /// Dotted name segments, e.g. `["Company", "Product"]`
    pub fn name_segments(&self) -> Vec<String> {
        child_of_kind(&self.syntax, CsSyntaxKind::Name)
            .map(|name| dotted_identifiers(&name))
            .unwrap_or_default()
    }

    pub fn usings(&self) -> impl Iterator<Item = UsingDirective> {
        self.syntax.children().filter_map(UsingDirective::cast)
    }
}

ast_node!(
    /// class, struct, interface, record or enum
    TypeDeclaration,
    TypeDeclaration | EnumDeclaration
);

impl TypeDeclaration {
    pub fn name(&self) -> Option<String> {
        token_of_kind(&self.syntax, CsSyntaxKind::Ident)
            .map(|t| identifier_value_text(t.text()).to_string())
    }
}

ast_node!(
    /// Method or constructor: anything that declares a parameter list and a body
    MethodLike,
    MethodDeclaration | ConstructorDeclaration
);

impl MethodLike {
    pub fn is_constructor(&self) -> bool {
        self.syntax.kind() == CsSyntaxKind::ConstructorDeclaration
    }

    pub fn parameter_list(&self) -> Option<ParameterList> {
        child_of_kind(&self.syntax, CsSyntaxKind::ParameterList).and_then(ParameterList::cast)
    }

    pub fn parameters(&self) -> impl Iterator<Item = Parameter> {
        self.parameter_list()
            .into_iter()
            .flat_map(|list| list.parameters().collect::<Vec<_>>())
    }

    pub fn body(&self) -> Option<CsSyntaxNode> {
        child_of_kind(&self.syntax, CsSyntaxKind::Block)
            .or_else(|| child_of_kind(&self.syntax, CsSyntaxKind::ArrowExpressionClause))
    }
}

ast_node!(ParameterList, ParameterList);

impl ParameterList {
    pub fn parameters(&self) -> impl Iterator<Item = Parameter> {
        self.syntax.children().filter_map(Parameter::cast)
    }
}

ast_node!(Parameter, Parameter);

impl Parameter {
    /// The declared name token (the last identifier directly under the node)
    pub fn name_token(&self) -> Option<CsSyntaxToken> {
        self.syntax
            .children_with_tokens()
            .filter_map(|e| e.into_token())
            .filter(|t| t.kind() == CsSyntaxKind::Ident)
            .last()
    }

    /// Name with any verbatim `@` removed
    pub fn name(&self) -> Option<String> {
        self.name_token()
            .map(|t| identifier_value_text(t.text()).to_string())
    }
}

ast_node!(
    /// Type reference: `System.ArgumentNullException`, `List<int>`, `string`
    TypeRef,
    TypeRef
);

impl TypeRef {
    /// Name segments without type arguments; `global::` is not included
    pub fn segments(&self) -> Vec<String> {
        if let Some(keyword) = token_of_kind(&self.syntax, CsSyntaxKind::PredefinedTypeKw) {
            return vec![keyword.text().to_string()];
        }
        let mut segments = dotted_identifiers(&self.syntax);
        if self.is_global_qualified() && !segments.is_empty() {
            segments.remove(0);
        }
        segments
    }

    /// Written as `global::X.Y` (or `alias::X`)
    pub fn is_global_qualified(&self) -> bool {
        token_of_kind(&self.syntax, CsSyntaxKind::ColonColon).is_some()
    }

    /// The alias before `::`, usually `global`
    pub fn qualifier_alias(&self) -> Option<String> {
        if !self.is_global_qualified() {
            return None;
        }
        token_of_kind(&self.syntax, CsSyntaxKind::Ident).map(|t| t.text().to_string())
    }

    pub fn has_type_arguments(&self) -> bool {
        child_of_kind(&self.syntax, CsSyntaxKind::TypeArgumentList).is_some()
    }
}

// ============================================================================
// Statements
// ============================================================================

ast_node!(Block, Block);

impl Block {
    pub fn statements(&self) -> impl Iterator<Item = CsSyntaxNode> {
        self.syntax.children().filter(|n| n.kind().is_statement())
    }
}

ast_node!(
    /// `if (cond) stmt [else stmt]`
    IfStatement,
    IfStatement
);

impl IfStatement {
    pub fn condition(&self) -> Option<CsSyntaxNode> {
        first_expression(&self.syntax)
    }

    /// The statement executed when the condition holds
    pub fn then_statement(&self) -> Option<CsSyntaxNode> {
        self.syntax.children().find(|n| n.kind().is_statement())
    }

    pub fn else_clause(&self) -> Option<ElseClause> {
        child_of_kind(&self.syntax, CsSyntaxKind::ElseClause).and_then(ElseClause::cast)
    }
}

ast_node!(ElseClause, ElseClause);

impl ElseClause {
    pub fn statement(&self) -> Option<CsSyntaxNode> {
        self.syntax.children().find(|n| n.kind().is_statement())
    }
}

ast_node!(
    /// `throw;` or `throw expr;`
    ThrowStatement,
    ThrowStatement
);

impl ThrowStatement {
    pub fn expression(&self) -> Option<CsSyntaxNode> {
        first_expression(&self.syntax)
    }
}

// ============================================================================
// Expressions
// ============================================================================

ast_node!(BinaryExpression, BinaryExpression);

impl BinaryExpression {
    pub fn lhs(&self) -> Option<CsSyntaxNode> {
        first_expression(&self.syntax)
    }

    pub fn rhs(&self) -> Option<CsSyntaxNode> {
        self.syntax
            .children()
            .filter(|n| n.kind().is_expression())
            .nth(1)
    }

    pub fn operator(&self) -> Option<CsSyntaxToken> {
        self.syntax
            .children_with_tokens()
            .filter_map(|e| e.into_token())
            .find(|t| !t.kind().is_trivia())
    }

    pub fn operator_kind(&self) -> Option<CsSyntaxKind> {
        self.operator().map(|t| t.kind())
    }
}

ast_node!(
    /// `new T(args) { init }`
    ObjectCreationExpression,
    ObjectCreationExpression
);

impl ObjectCreationExpression {
    pub fn type_ref(&self) -> Option<TypeRef> {
        child_of_kind(&self.syntax, CsSyntaxKind::TypeRef).and_then(TypeRef::cast)
    }

    pub fn argument_list(&self) -> Option<ArgumentList> {
        child_of_kind(&self.syntax, CsSyntaxKind::ArgumentList).and_then(ArgumentList::cast)
    }

    /// Positional arguments; empty when there is no argument list
    pub fn arguments(&self) -> Vec<Argument> {
        self.argument_list()
            .map(|list| list.arguments().collect())
            .unwrap_or_default()
    }
}

ast_node!(ArgumentList, ArgumentList | BracketedArgumentList);

impl ArgumentList {
    pub fn arguments(&self) -> impl Iterator<Item = Argument> {
        self.syntax.children().filter_map(Argument::cast)
    }
}

ast_node!(Argument, Argument);

impl Argument {
    pub fn expression(&self) -> Option<CsSyntaxNode> {
        first_expression(&self.syntax)
    }

    /// `name:` prefix, if any
    pub fn name_colon(&self) -> Option<String> {
        child_of_kind(&self.syntax, CsSyntaxKind::NameColon)
            .and_then(|nc| token_of_kind(&nc, CsSyntaxKind::Ident))
            .map(|t| identifier_value_text(t.text()).to_string())
    }
}

ast_node!(LiteralExpression, LiteralExpression);

impl LiteralExpression {
    pub fn token(&self) -> Option<CsSyntaxToken> {
        self.syntax
            .children_with_tokens()
            .filter_map(|e| e.into_token())
            .find(|t| !t.kind().is_trivia())
    }

    pub fn is_null(&self) -> bool {
        self.token()
            .is_some_and(|t| t.kind() == CsSyntaxKind::NullKw)
    }

    pub fn is_string(&self) -> bool {
        self.token()
            .is_some_and(|t| t.kind().is_string_literal())
    }
}

ast_node!(IdentifierName, IdentifierName);

impl IdentifierName {
    pub fn ident_token(&self) -> Option<CsSyntaxToken> {
        token_of_kind(&self.syntax, CsSyntaxKind::Ident)
    }

    /// Identifier text with any verbatim `@` removed
    pub fn value_text(&self) -> Option<String> {
        self.ident_token()
            .map(|t| identifier_value_text(t.text()).to_string())
    }
}

ast_node!(
    /// `nameof(x)`
    NameofExpression,
    NameofExpression
);

impl NameofExpression {
    pub fn argument(&self) -> Option<CsSyntaxNode> {
        child_of_kind(&self.syntax, CsSyntaxKind::ArgumentList)
            .and_then(ArgumentList::cast)
            .and_then(|list| list.arguments().next())
            .and_then(|arg| arg.expression())
    }
}
