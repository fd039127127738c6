//! Semantic model for C# sources
//!
//! Answers the two questions the rules need beyond syntax: the constant
//! value of a string literal and the type a `new T(..)` expression creates.
//! Type names resolve against types declared in the file plus a table of
//! well-known `System` types, following the C# lookup order: qualified
//! names, enclosing types, then each enclosing namespace from the innermost
//! outwards together with the `using` directives declared there.

use rowan::GreenNode;
use std::collections::HashSet;
use std::fmt;
use std::path::PathBuf;

use crate::cancellation::CancellationToken;
use crate::cst::ast::{
    AstNode, LiteralExpression, Namespace, ObjectCreationExpression, TypeDeclaration, TypeRef,
    UsingDirective,
};
use crate::cst::{CsSyntaxKind, CsSyntaxNode, ParseError, parse_csharp};
use crate::diagnostics::SourceMap;
use crate::result::Result;

/// Semantic queries consumed by rules
pub trait SemanticQueries {
    /// Folded value of a regular or verbatim string literal expression
    ///
    /// Anything else (interpolated or raw strings, concatenations,
    /// non-literal expressions) yields `Ok(None)`.
    fn constant_string_value(&self, expr: &CsSyntaxNode) -> Result<Option<String>>;

    /// Type created by an object creation expression
    fn type_identity(&self, expr: &CsSyntaxNode) -> Result<Option<TypeIdentity>>;
}

/// Resolved identity of a named type
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TypeIdentity {
    /// Simple type name, without type arguments
    pub name: String,
    /// Last segment of the containing namespace (empty for the global namespace)
    pub namespace: String,
    /// Full dotted containing namespace, including enclosing types
    pub qualified_namespace: String,
}

impl TypeIdentity {
    /// Build from a full path such as `["System", "ArgumentNullException"]`
    pub fn from_path(path: &[String]) -> Option<Self> {
        let (name, namespace) = path.split_last()?;
        Some(Self {
            name: name.clone(),
            namespace: namespace.last().cloned().unwrap_or_default(),
            qualified_namespace: namespace.join("."),
        })
    }

    pub fn qualified_name(&self) -> String {
        if self.qualified_namespace.is_empty() {
            self.name.clone()
        } else {
            format!("{}.{}", self.qualified_namespace, self.name)
        }
    }
}

impl fmt::Display for TypeIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.qualified_name())
    }
}

/// Well-known framework types available without a declaration in the file
const KNOWN_SYSTEM_TYPES: &[&str] = &[
    "ArgumentException",
    "ArgumentNullException",
    "ArgumentOutOfRangeException",
    "Exception",
    "FormatException",
    "IndexOutOfRangeException",
    "InvalidOperationException",
    "NotImplementedException",
    "NotSupportedException",
    "NullReferenceException",
    "Object",
    "ObjectDisposedException",
    "String",
];

/// Semantic model for a single source file
#[derive(Debug, Clone)]
pub struct SemanticModel {
    /// Green tree of the parsed file
    pub green: GreenNode,
    pub source: String,
    pub source_file: PathBuf,
    pub source_map: SourceMap,
    pub parse_errors: Vec<ParseError>,
    declared_types: HashSet<Vec<String>>,
    cancellation: CancellationToken,
}

impl SemanticModel {
    /// Parse `source` and index the types it declares
    pub fn new(source: impl Into<String>, source_file: impl Into<PathBuf>) -> Self {
        let source = source.into();
        let parse = parse_csharp(&source);
        let root = parse.syntax();
        let declared_types = collect_declared_types(&root);
        tracing::debug!(
            "Indexed {} declared types, {} parse errors",
            declared_types.len(),
            parse.errors().len()
        );

        Self {
            green: parse.green().clone(),
            source_map: SourceMap::new(&source),
            source,
            source_file: source_file.into(),
            parse_errors: parse.errors().to_vec(),
            declared_types,
            cancellation: CancellationToken::new(),
        }
    }

    /// Share a cancellation token with the host
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancellation = token;
        self
    }

    pub fn cancellation(&self) -> &CancellationToken {
        &self.cancellation
    }

    /// Fresh red root over the green tree
    pub fn syntax(&self) -> CsSyntaxNode {
        CsSyntaxNode::new_root(self.green.clone())
    }

    /// Whether `path` names a declared or well-known type
    pub fn type_exists(&self, path: &[String]) -> bool {
        if self.declared_types.contains(path) {
            return true;
        }
        matches!(path, [ns, name] if ns == "System" && KNOWN_SYSTEM_TYPES.contains(&name.as_str()))
    }

    /// Resolve a type reference written at its position in the tree
    pub fn resolve_type_ref(&self, type_ref: &TypeRef) -> Option<TypeIdentity> {
        let segments = type_ref.segments();
        if segments.is_empty() {
            return None;
        }

        if type_ref
            .syntax()
            .children_with_tokens()
            .any(|e| e.kind() == CsSyntaxKind::PredefinedTypeKw)
        {
            return predefined_type(&segments[0]);
        }

        if type_ref.is_global_qualified() {
            // Extern aliases are unknown to a single-file model
            if type_ref.qualifier_alias().as_deref() != Some("global") {
                return None;
            }
            return self.found(&segments);
        }

        for enclosing in enclosing_type_paths(type_ref.syntax()) {
            let candidate = concat(&enclosing, &segments);
            if self.type_exists(&candidate) {
                return TypeIdentity::from_path(&candidate);
            }
        }

        for scope in namespace_scopes(type_ref.syntax()) {
            let candidate = concat(&scope.prefix, &segments);
            if self.type_exists(&candidate) {
                return TypeIdentity::from_path(&candidate);
            }
            if scope.usings.is_empty() {
                continue;
            }
            match self.resolve_through_usings(&scope.usings, &segments) {
                UsingLookup::Found(path) => return TypeIdentity::from_path(&path),
                UsingLookup::Ambiguous => {
                    tracing::debug!("Ambiguous type reference '{}'", segments.join("."));
                    return None;
                }
                UsingLookup::NotFound => {}
            }
        }

        None
    }

    fn found(&self, path: &[String]) -> Option<TypeIdentity> {
        if self.type_exists(path) {
            TypeIdentity::from_path(path)
        } else {
            None
        }
    }

    fn resolve_through_usings(
        &self,
        usings: &[UsingDirective],
        segments: &[String],
    ) -> UsingLookup {
        let (first, rest) = match segments.split_first() {
            Some(split) => split,
            None => return UsingLookup::NotFound,
        };

        for using in usings {
            if using.alias().as_deref() == Some(first.as_str()) {
                let candidate = concat(&using.target(), rest);
                return if self.type_exists(&candidate) {
                    UsingLookup::Found(candidate)
                } else {
                    UsingLookup::NotFound
                };
            }
        }

        // Namespace imports only bring simple names into scope
        if !rest.is_empty() {
            return UsingLookup::NotFound;
        }

        let mut matches: Vec<Vec<String>> = Vec::new();
        for using in usings.iter().filter(|u| u.alias().is_none()) {
            let candidate = concat(&using.target(), segments);
            if self.type_exists(&candidate) && !matches.contains(&candidate) {
                matches.push(candidate);
            }
        }

        match matches.len() {
            0 => UsingLookup::NotFound,
            1 => UsingLookup::Found(matches.remove(0)),
            _ => UsingLookup::Ambiguous,
        }
    }
}

enum UsingLookup {
    Found(Vec<String>),
    Ambiguous,
    NotFound,
}

impl SemanticQueries for SemanticModel {
    fn constant_string_value(&self, expr: &CsSyntaxNode) -> Result<Option<String>> {
        self.cancellation.check()?;
        Ok(LiteralExpression::cast(expr.clone())
            .and_then(|literal| literal.token())
            .and_then(|token| match token.kind() {
                CsSyntaxKind::StringLit | CsSyntaxKind::VerbatimStringLit => {
                    unescape_string_literal(token.text())
                }
                _ => None,
            }))
    }

    fn type_identity(&self, expr: &CsSyntaxNode) -> Result<Option<TypeIdentity>> {
        self.cancellation.check()?;
        Ok(ObjectCreationExpression::cast(expr.clone())
            .and_then(|creation| creation.type_ref())
            .and_then(|type_ref| self.resolve_type_ref(&type_ref)))
    }
}

fn predefined_type(keyword: &str) -> Option<TypeIdentity> {
    let name = match keyword {
        "string" => "String",
        "object" => "Object",
        _ => return None,
    };
    TypeIdentity::from_path(&["System".to_string(), name.to_string()])
}

fn concat(prefix: &[String], rest: &[String]) -> Vec<String> {
    prefix.iter().chain(rest).cloned().collect()
}

/// One step of namespace lookup: a namespace prefix and the usings in effect there
struct NamespaceScope {
    prefix: Vec<String>,
    usings: Vec<UsingDirective>,
}

/// Lookup scopes for `node`, innermost first, ending with the global namespace
///
/// `namespace A.B { }` contributes `A.B` (carrying its usings) and then `A`.
fn namespace_scopes(node: &CsSyntaxNode) -> Vec<NamespaceScope> {
    let declarations: Vec<Namespace> = node.ancestors().filter_map(Namespace::cast).collect();
    let full_path = namespace_path(&declarations);

    let mut scopes = Vec::new();
    let mut end = full_path.len();
    for declaration in &declarations {
        let own = declaration.name_segments().len();
        let usings: Vec<UsingDirective> = declaration.usings().collect();
        for (i, len) in (end.saturating_sub(own) + 1..=end).rev().enumerate() {
            scopes.push(NamespaceScope {
                prefix: full_path[..len].to_vec(),
                usings: if i == 0 { usings.clone() } else { Vec::new() },
            });
        }
        end = end.saturating_sub(own);
    }

    let root_usings = node
        .ancestors()
        .last()
        .and_then(crate::cst::ast::CompilationUnit::cast)
        .map(|unit| unit.usings().collect())
        .unwrap_or_default();
    scopes.push(NamespaceScope {
        prefix: Vec::new(),
        usings: root_usings,
    });
    scopes
}

/// Full namespace path from declarations ordered innermost first
fn namespace_path(declarations: &[Namespace]) -> Vec<String> {
    declarations
        .iter()
        .rev()
        .flat_map(|ns| ns.name_segments())
        .collect()
}

/// Full paths of the types enclosing `node`, innermost first
fn enclosing_type_paths(node: &CsSyntaxNode) -> Vec<Vec<String>> {
    let declarations: Vec<Namespace> = node.ancestors().filter_map(Namespace::cast).collect();
    let namespace = namespace_path(&declarations);

    let type_names: Vec<String> = node
        .ancestors()
        .filter_map(TypeDeclaration::cast)
        .filter_map(|ty| ty.name())
        .collect();

    (0..type_names.len())
        .map(|skip| {
            let mut path = namespace.clone();
            path.extend(type_names[skip..].iter().rev().cloned());
            path
        })
        .collect()
}

fn collect_declared_types(root: &CsSyntaxNode) -> HashSet<Vec<String>> {
    // `ancestors()` starts at the declaration itself, so the innermost
    // enclosing path is the declared type's own full path
    root.descendants()
        .filter_map(TypeDeclaration::cast)
        .filter(|ty| ty.name().is_some())
        .filter_map(|ty| enclosing_type_paths(ty.syntax()).into_iter().next())
        .collect()
}

/// Value of a regular (`"..."`) or verbatim (`@"..."`) string literal token
///
/// Returns `None` for malformed or unterminated literals.
pub fn unescape_string_literal(text: &str) -> Option<String> {
    if let Some(body) = text.strip_prefix("@\"") {
        let body = body.strip_suffix('"')?;
        let mut value = String::with_capacity(body.len());
        let mut chars = body.chars();
        while let Some(c) = chars.next() {
            if c == '"' {
                // Inner quotes must be doubled
                if chars.next() != Some('"') {
                    return None;
                }
            }
            value.push(c);
        }
        return Some(value);
    }

    let body = text.strip_prefix('"')?.strip_suffix('"')?;
    let mut value = String::with_capacity(body.len());
    let mut chars = body.chars().peekable();
    let mut pending_high: Option<u32> = None;

    while let Some(c) = chars.next() {
        if c != '\\' {
            if c == '"' || pending_high.is_some() {
                return None;
            }
            value.push(c);
            continue;
        }

        let unit = match chars.next()? {
            '\'' => '\'' as u32,
            '"' => '"' as u32,
            '\\' => '\\' as u32,
            '0' => 0,
            'a' => 0x07,
            'b' => 0x08,
            'f' => 0x0C,
            'n' => '\n' as u32,
            'r' => '\r' as u32,
            't' => '\t' as u32,
            'v' => 0x0B,
            'u' => read_hex(&mut chars, 4, 4)?,
            'U' => read_hex(&mut chars, 8, 8)?,
            'x' => read_hex(&mut chars, 1, 4)?,
            _ => return None,
        };

        match (pending_high.take(), unit) {
            (Some(high), 0xDC00..=0xDFFF) => {
                let combined = 0x10000 + ((high - 0xD800) << 10) + (unit - 0xDC00);
                value.push(char::from_u32(combined)?);
            }
            (Some(_), _) => return None,
            (None, 0xD800..=0xDBFF) => pending_high = Some(unit),
            (None, _) => value.push(char::from_u32(unit)?),
        }
    }

    if pending_high.is_some() {
        return None;
    }
    Some(value)
}

fn read_hex(
    chars: &mut std::iter::Peekable<std::str::Chars<'_>>,
    min: usize,
    max: usize,
) -> Option<u32> {
    let mut value = 0u32;
    let mut count = 0;
    while count < max {
        let Some(digit) = chars.peek().and_then(|c| c.to_digit(16)) else {
            break;
        };
        chars.next();
        value = value * 16 + digit;
        count += 1;
    }
    if count < min { None } else { Some(value) }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn first_creation(model: &SemanticModel) -> CsSyntaxNode {
        model
            .syntax()
            .descendants()
            .find(|n| n.kind() == CsSyntaxKind::ObjectCreationExpression)
            .unwrap()
    }

    fn resolve(source: &str) -> Option<TypeIdentity> {
        let model = SemanticModel::new(source, "Test.cs");
        model.type_identity(&first_creation(&model)).unwrap()
    }

    #[test]
    fn test_unescape_regular() {
        assert_eq!(unescape_string_literal(r#""p""#), Some("p".into()));
        assert_eq!(
            unescape_string_literal(r#""a\tb\n\"q\" \\ \u0041\x42""#),
            Some("a\tb\n\"q\" \\ AB".into())
        );
        assert_eq!(unescape_string_literal(r#""\U0001F600""#), Some("😀".into()));
        assert_eq!(unescape_string_literal(r#""\uD83D\uDE00""#), Some("😀".into()));
        assert_eq!(unescape_string_literal(r#""\q""#), None);
        assert_eq!(unescape_string_literal(r#""open"#), None);
        assert_eq!(unescape_string_literal(r#""\uD83D""#), None);
    }

    #[test]
    fn test_unescape_verbatim() {
        assert_eq!(
            unescape_string_literal(r#"@"C:\dir ""x""""#),
            Some(r#"C:\dir "x""#.into())
        );
        assert_eq!(unescape_string_literal(r#"@"bad"quote""#), None);
    }

    #[test]
    fn test_constant_string_value_only_folds_literals() {
        let source = r#"class C { void M() { var a = "x\ty"; var b = $"p"; var c = "a" + "b"; var d = """raw"""; } }"#;
        let model = SemanticModel::new(source, "Test.cs");
        let root = model.syntax();
        let values: Vec<Option<String>> = root
            .descendants()
            .filter(|n| n.kind() == CsSyntaxKind::EqualsValueClause)
            .map(|clause| {
                let expr = crate::cst::ast::first_expression(&clause).unwrap();
                model.constant_string_value(&expr).unwrap()
            })
            .collect();
        assert_eq!(values, vec![Some("x\ty".to_string()), None, None, None]);
    }

    #[test]
    fn test_resolves_through_using() {
        let identity = resolve("using System;\nclass C { void M() { var e = new ArgumentNullException(\"p\"); } }")
            .unwrap();
        assert_eq!(identity.name, "ArgumentNullException");
        assert_eq!(identity.namespace, "System");
        assert_eq!(identity.qualified_name(), "System.ArgumentNullException");
    }

    #[test]
    fn test_resolves_qualified_and_global_names() {
        let qualified = resolve("class C { object M() => new System.ArgumentNullException(\"p\"); }");
        assert_eq!(qualified.unwrap().namespace, "System");

        let global = resolve("class C { object M() => new global::System.ArgumentNullException(\"p\"); }");
        assert_eq!(global.unwrap().qualified_namespace, "System");
    }

    #[test]
    fn test_unresolved_without_using() {
        assert_eq!(
            resolve("class C { object M() => new ArgumentNullException(\"p\"); }"),
            None
        );
    }

    #[test]
    fn test_declared_type_in_namespace_wins_over_using() {
        let source = "using System;\nnamespace NS1 {\n  class ArgumentNullException : Exception { public ArgumentNullException(string p) { } }\n  class C { object M() => new ArgumentNullException(\"p\"); }\n}";
        let identity = resolve(source).unwrap();
        assert_eq!(identity.namespace, "NS1");
        assert_eq!(identity.qualified_namespace, "NS1");
    }

    #[test]
    fn test_ambiguous_usings_resolve_to_none() {
        let source = "using System;\nusing NS1;\nnamespace NS1 { class ArgumentNullException { } }\nnamespace Other { class C { object M() => new ArgumentNullException(\"p\"); } }";
        assert_eq!(resolve(source), None);
    }

    #[test]
    fn test_alias_and_nested_namespace() {
        let alias = resolve("using Sys = System;\nclass C { object M() => new Sys.ArgumentNullException(\"p\"); }");
        assert_eq!(alias.unwrap().qualified_name(), "System.ArgumentNullException");

        let nested = resolve("namespace System.Text { class C { object M() => new ArgumentNullException(\"p\"); } }");
        assert_eq!(nested.unwrap().qualified_name(), "System.ArgumentNullException");

        let file_scoped = resolve("namespace App;\nusing System;\nclass C { object M() => new ArgumentNullException(\"p\"); }");
        assert_eq!(file_scoped.unwrap().namespace, "System");
    }

    #[test]
    fn test_nested_type_identity() {
        let source = "namespace App { class Outer { class Inner { } object M() => new Inner(); } }";
        let identity = resolve(source).unwrap();
        assert_eq!(identity.name, "Inner");
        assert_eq!(identity.namespace, "Outer");
        assert_eq!(identity.qualified_namespace, "App.Outer");
    }

    #[test]
    fn test_cancellation_is_reported() {
        let token = CancellationToken::new();
        let model = SemanticModel::new("class C { object M() => new C(); }", "Test.cs")
            .with_cancellation(token.clone());
        let creation = first_creation(&model);
        token.cancel();
        assert!(matches!(
            model.type_identity(&creation),
            Err(crate::SharplintError::Cancelled)
        ));
        assert!(model.constant_string_value(&creation).is_err());
    }
}
