//! Recognizes `if (p == null) throw new ArgumentNullException("p")` guards

use rowan::TextRange;

use sharplint_core::Result;
use sharplint_core::cst::ast::{
    AstNode, BinaryExpression, IdentifierName, IfStatement, LiteralExpression, MethodLike,
    ObjectCreationExpression, ThrowStatement,
};
use sharplint_core::cst::{CsSyntaxKind, CsSyntaxNode};
use sharplint_core::semantic::{SemanticQueries, TypeIdentity};

const EXCEPTION_NAME: &str = "ArgumentNullException";
const EXCEPTION_NAMESPACE: &str = "System";

/// A string literal that duplicates the name of the parameter it guards
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Finding {
    /// Range of the literal expression (the first constructor argument)
    pub location: TextRange,
    pub parameter_name: String,
}

/// How strictly the created exception type is compared
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum TypeMatchPolicy {
    /// Simple type name plus the last segment of its namespace
    #[default]
    SimpleName,
    /// Simple type name plus the fully qualified namespace
    Qualified,
}

impl TypeMatchPolicy {
    /// Parse the `typeIdentity` rule option
    pub fn from_option(value: Option<&str>) -> Self {
        match value {
            Some("qualified") => TypeMatchPolicy::Qualified,
            Some("simple") | None => TypeMatchPolicy::SimpleName,
            Some(other) => {
                tracing::warn!(
                    "Unknown typeIdentity option '{}', using simple name matching",
                    other
                );
                TypeMatchPolicy::SimpleName
            }
        }
    }

    fn is_argument_null_exception(self, identity: &TypeIdentity) -> bool {
        if identity.name != EXCEPTION_NAME {
            return false;
        }
        match self {
            TypeMatchPolicy::SimpleName => identity.namespace == EXCEPTION_NAMESPACE,
            TypeMatchPolicy::Qualified => identity.qualified_namespace == EXCEPTION_NAMESPACE,
        }
    }
}

/// Match a `throw` statement with the default type policy
pub fn match_throw<Q>(queries: &Q, throw_node: &CsSyntaxNode) -> Result<Option<Finding>>
where
    Q: SemanticQueries + ?Sized,
{
    match_throw_with_policy(queries, throw_node, TypeMatchPolicy::default())
}

/// Decide whether `throw_node` is a parameter null-guard throwing with a literal name
///
/// Every condition below is necessary; the first one that fails yields `Ok(None)`.
/// Only cancellation surfaces as `Err`.
pub fn match_throw_with_policy<Q>(
    queries: &Q,
    throw_node: &CsSyntaxNode,
    policy: TypeMatchPolicy,
) -> Result<Option<Finding>>
where
    Q: SemanticQueries + ?Sized,
{
    let Some(creation) = ThrowStatement::cast(throw_node.clone())
        .and_then(|throw| throw.expression())
        .and_then(ObjectCreationExpression::cast)
    else {
        return Ok(None);
    };

    let Some(first_expr) = creation
        .arguments()
        .into_iter()
        .next()
        .and_then(|arg| arg.expression())
    else {
        return Ok(None);
    };
    if LiteralExpression::cast(first_expr.clone()).is_none_or(|lit| !lit.is_string()) {
        return Ok(None);
    }
    let parameter_name = match queries.constant_string_value(&first_expr)? {
        Some(value) if !value.trim().is_empty() => value,
        _ => return Ok(None),
    };

    let Some(guard) = enclosing_guard(throw_node) else {
        return Ok(None);
    };
    if !is_null_check_of(&guard, &parameter_name) {
        return Ok(None);
    }

    if !declares_parameter(throw_node, &parameter_name) {
        return Ok(None);
    }

    match queries.type_identity(creation.syntax())? {
        Some(identity) if policy.is_argument_null_exception(&identity) => {}
        _ => return Ok(None),
    }

    Ok(Some(Finding {
        location: first_expr.text_range(),
        parameter_name,
    }))
}

/// The `if` whose then-branch holds the throw, looking through blocks only
fn enclosing_guard(throw_node: &CsSyntaxNode) -> Option<IfStatement> {
    let mut current = throw_node.clone();
    loop {
        let parent = current.parent()?;
        match parent.kind() {
            CsSyntaxKind::Block => current = parent,
            CsSyntaxKind::IfStatement => {
                let statement = IfStatement::cast(parent)?;
                return (statement.then_statement().as_ref() == Some(&current))
                    .then_some(statement);
            }
            _ => return None,
        }
    }
}

/// `name == null` or `null == name`, with no parentheses around the condition
fn is_null_check_of(guard: &IfStatement, name: &str) -> bool {
    let Some(condition) = guard.condition().and_then(BinaryExpression::cast) else {
        return false;
    };
    if condition.operator_kind() != Some(CsSyntaxKind::EqEq) {
        return false;
    }
    let (Some(lhs), Some(rhs)) = (condition.lhs(), condition.rhs()) else {
        return false;
    };
    (is_identifier(&lhs, name) && is_null(&rhs)) || (is_null(&lhs) && is_identifier(&rhs, name))
}

fn is_identifier(node: &CsSyntaxNode, name: &str) -> bool {
    IdentifierName::cast(node.clone())
        .and_then(|ident| ident.value_text())
        .is_some_and(|text| text == name)
}

fn is_null(node: &CsSyntaxNode) -> bool {
    LiteralExpression::cast(node.clone()).is_some_and(|lit| lit.is_null())
}

/// The nearest enclosing method or constructor declares a parameter called `name`
fn declares_parameter(node: &CsSyntaxNode, name: &str) -> bool {
    node.ancestors()
        .find_map(MethodLike::cast)
        .is_some_and(|method| {
            method
                .parameters()
                .any(|param| param.name().as_deref() == Some(name))
        })
}
