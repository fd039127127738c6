//! Syntax kind enumeration for the C# CST
//!
//! This module defines all node and token types of the C# subset that
//! sharplint understands. Discriminants are contiguous so that raw rowan
//! kinds can be mapped back with a table lookup.

use std::fmt;

/// Syntax kind for C# language elements
///
/// This enum covers:
/// - Trivia (whitespace, comments, preprocessor lines)
/// - Keywords, modifiers and predefined type names
/// - Punctuation and operators
/// - Literals and identifiers
/// - Structural nodes (declarations, statements, expressions)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(u16)]
pub enum CsSyntaxKind {
    // ==================
    // Trivia
    // ==================
    /// Whitespace (spaces, tabs)
    Whitespace = 0,
    /// Line break (`\n` or `\r\n`)
    Newline,
    /// Line comment starting with //
    CommentLine,
    /// Block comment /* ... */
    CommentBlock,
    /// Preprocessor directive line (`#if`, `#region`, ...)
    Preprocessor,

    // ==================
    // Keywords
    // ==================
    UsingKw,
    NamespaceKw,
    ClassKw,
    StructKw,
    InterfaceKw,
    RecordKw,
    EnumKw,
    IfKw,
    ElseKw,
    ThrowKw,
    NewKw,
    NullKw,
    TrueKw,
    FalseKw,
    ReturnKw,
    WhileKw,
    DoKw,
    ForKw,
    ForeachKw,
    InKw,
    TryKw,
    CatchKw,
    FinallyKw,
    LockKw,
    SwitchKw,
    CaseKw,
    DefaultKw,
    BreakKw,
    ContinueKw,
    ThisKw,
    BaseKw,
    IsKw,
    AsKw,
    /// Access and declaration modifiers (`public`, `static`, `ref`, ...)
    ModifierKw,
    /// Built-in type keywords (`string`, `object`, `int`, `void`, ...)
    PredefinedTypeKw,

    // ==================
    // Punctuation & operators
    // ==================
    LBrace,
    RBrace,
    LParen,
    RParen,
    LBracket,
    RBracket,
    Semicolon,
    Comma,
    Dot,
    Colon,
    ColonColon,
    Question,
    QuestionDot,
    QuestionQuestion,
    Eq,
    EqEq,
    BangEq,
    Lt,
    Gt,
    LtEq,
    GtEq,
    Plus,
    Minus,
    Star,
    Slash,
    Percent,
    Bang,
    Tilde,
    Amp,
    Pipe,
    CaretOp,
    AmpAmp,
    PipePipe,
    PlusPlus,
    MinusMinus,
    /// Compound assignment (`+=`, `??=`, `<<=`, ...)
    AssignOp,
    /// Lambda / expression-body arrow `=>`
    FatArrow,

    // ==================
    // Literals & identifiers
    // ==================
    Ident,
    /// Regular string literal `"..."`
    StringLit,
    /// Verbatim string literal `@"..."`
    VerbatimStringLit,
    /// Interpolated string literal `$"..."`, `$@"..."`
    InterpolatedStringLit,
    /// Raw string literal `"""..."""`
    RawStringLit,
    CharLit,
    NumberLit,

    // ==================
    // Declarations
    // ==================
    CompilationUnit,
    UsingDirective,
    NamespaceDeclaration,
    FileScopedNamespaceDeclaration,
    /// Dotted name used by using directives and namespaces
    Name,
    /// class / struct / interface / record declaration
    TypeDeclaration,
    EnumDeclaration,
    AttributeList,
    TypeParameterList,
    BaseList,
    MethodDeclaration,
    ConstructorDeclaration,
    PropertyDeclaration,
    FieldDeclaration,
    ParameterList,
    Parameter,
    /// Type reference (`System.String`, `List<int>`, `int[]`, `T?`)
    TypeRef,
    TypeArgumentList,
    ArrowExpressionClause,
    ConstructorInitializer,
    AccessorList,
    AccessorDeclaration,

    // ==================
    // Statements
    // ==================
    Block,
    IfStatement,
    ElseClause,
    ThrowStatement,
    ReturnStatement,
    ExpressionStatement,
    LocalDeclarationStatement,
    VariableDeclarator,
    EqualsValueClause,
    WhileStatement,
    DoStatement,
    ForStatement,
    ForeachStatement,
    TryStatement,
    CatchClause,
    FinallyClause,
    UsingStatement,
    LockStatement,
    SwitchStatement,
    SwitchSection,
    BreakStatement,
    ContinueStatement,
    EmptyStatement,

    // ==================
    // Expressions
    // ==================
    BinaryExpression,
    AssignmentExpression,
    ConditionalExpression,
    PrefixUnaryExpression,
    PostfixUnaryExpression,
    AwaitExpression,
    LambdaExpression,
    MemberAccessExpression,
    ConditionalAccessExpression,
    InvocationExpression,
    ElementAccessExpression,
    ArgumentList,
    BracketedArgumentList,
    Argument,
    NameColon,
    DeclarationExpression,
    ObjectCreationExpression,
    ImplicitObjectCreationExpression,
    ArrayCreationExpression,
    InitializerExpression,
    /// `nameof(x)` self-reference expression
    NameofExpression,
    LiteralExpression,
    IdentifierName,
    PredefinedTypeExpression,
    ThisExpression,
    BaseExpression,
    DefaultExpression,
    ParenthesizedExpression,
    TupleExpression,
    CastExpression,
    SwitchExpression,
    /// `throw` used as an expression (`x ?? throw ...`)
    ThrowExpression,

    // ==================
    // Special
    // ==================
    /// Error node or token produced during recovery
    Error,
    /// Unknown raw kind
    Unknown,
}

impl CsSyntaxKind {
    /// All kinds, indexed by their discriminant
    pub const ALL: &'static [CsSyntaxKind] = &[
        Self::Whitespace,
        Self::Newline,
        Self::CommentLine,
        Self::CommentBlock,
        Self::Preprocessor,
        Self::UsingKw,
        Self::NamespaceKw,
        Self::ClassKw,
        Self::StructKw,
        Self::InterfaceKw,
        Self::RecordKw,
        Self::EnumKw,
        Self::IfKw,
        Self::ElseKw,
        Self::ThrowKw,
        Self::NewKw,
        Self::NullKw,
        Self::TrueKw,
        Self::FalseKw,
        Self::ReturnKw,
        Self::WhileKw,
        Self::DoKw,
        Self::ForKw,
        Self::ForeachKw,
        Self::InKw,
        Self::TryKw,
        Self::CatchKw,
        Self::FinallyKw,
        Self::LockKw,
        Self::SwitchKw,
        Self::CaseKw,
        Self::DefaultKw,
        Self::BreakKw,
        Self::ContinueKw,
        Self::ThisKw,
        Self::BaseKw,
        Self::IsKw,
        Self::AsKw,
        Self::ModifierKw,
        Self::PredefinedTypeKw,
        Self::LBrace,
        Self::RBrace,
        Self::LParen,
        Self::RParen,
        Self::LBracket,
        Self::RBracket,
        Self::Semicolon,
        Self::Comma,
        Self::Dot,
        Self::Colon,
        Self::ColonColon,
        Self::Question,
        Self::QuestionDot,
        Self::QuestionQuestion,
        Self::Eq,
        Self::EqEq,
        Self::BangEq,
        Self::Lt,
        Self::Gt,
        Self::LtEq,
        Self::GtEq,
        Self::Plus,
        Self::Minus,
        Self::Star,
        Self::Slash,
        Self::Percent,
        Self::Bang,
        Self::Tilde,
        Self::Amp,
        Self::Pipe,
        Self::CaretOp,
        Self::AmpAmp,
        Self::PipePipe,
        Self::PlusPlus,
        Self::MinusMinus,
        Self::AssignOp,
        Self::FatArrow,
        Self::Ident,
        Self::StringLit,
        Self::VerbatimStringLit,
        Self::InterpolatedStringLit,
        Self::RawStringLit,
        Self::CharLit,
        Self::NumberLit,
        Self::CompilationUnit,
        Self::UsingDirective,
        Self::NamespaceDeclaration,
        Self::FileScopedNamespaceDeclaration,
        Self::Name,
        Self::TypeDeclaration,
        Self::EnumDeclaration,
        Self::AttributeList,
        Self::TypeParameterList,
        Self::BaseList,
        Self::MethodDeclaration,
        Self::ConstructorDeclaration,
        Self::PropertyDeclaration,
        Self::FieldDeclaration,
        Self::ParameterList,
        Self::Parameter,
        Self::TypeRef,
        Self::TypeArgumentList,
        Self::ArrowExpressionClause,
        Self::ConstructorInitializer,
        Self::AccessorList,
        Self::AccessorDeclaration,
        Self::Block,
        Self::IfStatement,
        Self::ElseClause,
        Self::ThrowStatement,
        Self::ReturnStatement,
        Self::ExpressionStatement,
        Self::LocalDeclarationStatement,
        Self::VariableDeclarator,
        Self::EqualsValueClause,
        Self::WhileStatement,
        Self::DoStatement,
        Self::ForStatement,
        Self::ForeachStatement,
        Self::TryStatement,
        Self::CatchClause,
        Self::FinallyClause,
        Self::UsingStatement,
        Self::LockStatement,
        Self::SwitchStatement,
        Self::SwitchSection,
        Self::BreakStatement,
        Self::ContinueStatement,
        Self::EmptyStatement,
        Self::BinaryExpression,
        Self::AssignmentExpression,
        Self::ConditionalExpression,
        Self::PrefixUnaryExpression,
        Self::PostfixUnaryExpression,
        Self::AwaitExpression,
        Self::LambdaExpression,
        Self::MemberAccessExpression,
        Self::ConditionalAccessExpression,
        Self::InvocationExpression,
        Self::ElementAccessExpression,
        Self::ArgumentList,
        Self::BracketedArgumentList,
        Self::Argument,
        Self::NameColon,
        Self::DeclarationExpression,
        Self::ObjectCreationExpression,
        Self::ImplicitObjectCreationExpression,
        Self::ArrayCreationExpression,
        Self::InitializerExpression,
        Self::NameofExpression,
        Self::LiteralExpression,
        Self::IdentifierName,
        Self::PredefinedTypeExpression,
        Self::ThisExpression,
        Self::BaseExpression,
        Self::DefaultExpression,
        Self::ParenthesizedExpression,
        Self::TupleExpression,
        Self::CastExpression,
        Self::SwitchExpression,
        Self::ThrowExpression,
        Self::Error,
        Self::Unknown,
    ];

    /// Map a raw discriminant back to a kind
    pub fn from_raw(raw: u16) -> Option<Self> {
        Self::ALL.get(raw as usize).copied()
    }

    /// Check if this is a trivia token (whitespace, newline, comment, directive)
    pub const fn is_trivia(self) -> bool {
        matches!(
            self,
            Self::Whitespace
                | Self::Newline
                | Self::CommentLine
                | Self::CommentBlock
                | Self::Preprocessor
        )
    }

    /// Check if this is a keyword token
    pub const fn is_keyword(self) -> bool {
        (self as u16) >= (Self::UsingKw as u16) && (self as u16) <= (Self::PredefinedTypeKw as u16)
    }

    /// Check if this is a punctuation or operator token
    pub const fn is_punct(self) -> bool {
        (self as u16) >= (Self::LBrace as u16) && (self as u16) <= (Self::FatArrow as u16)
    }

    /// Check if this is a literal token
    pub const fn is_literal(self) -> bool {
        matches!(
            self,
            Self::StringLit
                | Self::VerbatimStringLit
                | Self::InterpolatedStringLit
                | Self::RawStringLit
                | Self::CharLit
                | Self::NumberLit
                | Self::NullKw
                | Self::TrueKw
                | Self::FalseKw
        )
    }

    /// Check if this is a string literal token of any flavour
    pub const fn is_string_literal(self) -> bool {
        matches!(
            self,
            Self::StringLit
                | Self::VerbatimStringLit
                | Self::InterpolatedStringLit
                | Self::RawStringLit
        )
    }

    /// Check if this is a structural node kind
    pub const fn is_node(self) -> bool {
        (self as u16) >= (Self::CompilationUnit as u16) && (self as u16) <= (Self::Error as u16)
    }

    /// Check if this is an expression node kind
    pub const fn is_expression(self) -> bool {
        (self as u16) >= (Self::BinaryExpression as u16)
            && (self as u16) <= (Self::ThrowExpression as u16)
            && !matches!(
                self,
                Self::ArgumentList
                    | Self::BracketedArgumentList
                    | Self::Argument
                    | Self::NameColon
            )
    }

    /// Check if this is a statement node kind
    pub const fn is_statement(self) -> bool {
        (self as u16) >= (Self::Block as u16)
            && (self as u16) <= (Self::EmptyStatement as u16)
            && !matches!(
                self,
                Self::ElseClause
                    | Self::VariableDeclarator
                    | Self::EqualsValueClause
                    | Self::CatchClause
                    | Self::FinallyClause
                    | Self::SwitchSection
            )
    }

    /// Get the fixed text of a punctuation token, if any
    pub const fn punct_text(self) -> Option<&'static str> {
        Some(match self {
            Self::LBrace => "{",
            Self::RBrace => "}",
            Self::LParen => "(",
            Self::RParen => ")",
            Self::LBracket => "[",
            Self::RBracket => "]",
            Self::Semicolon => ";",
            Self::Comma => ",",
            Self::Dot => ".",
            Self::Colon => ":",
            Self::ColonColon => "::",
            Self::Question => "?",
            Self::QuestionDot => "?.",
            Self::QuestionQuestion => "??",
            Self::Eq => "=",
            Self::EqEq => "==",
            Self::BangEq => "!=",
            Self::Lt => "<",
            Self::Gt => ">",
            Self::LtEq => "<=",
            Self::GtEq => ">=",
            Self::Plus => "+",
            Self::Minus => "-",
            Self::Star => "*",
            Self::Slash => "/",
            Self::Percent => "%",
            Self::Bang => "!",
            Self::Tilde => "~",
            Self::Amp => "&",
            Self::Pipe => "|",
            Self::CaretOp => "^",
            Self::AmpAmp => "&&",
            Self::PipePipe => "||",
            Self::PlusPlus => "++",
            Self::MinusMinus => "--",
            Self::FatArrow => "=>",
            _ => return None,
        })
    }

    /// Look up the keyword kind for an identifier-like word
    pub fn from_keyword(word: &str) -> Option<Self> {
        Some(match word {
            "using" => Self::UsingKw,
            "namespace" => Self::NamespaceKw,
            "class" => Self::ClassKw,
            "struct" => Self::StructKw,
            "interface" => Self::InterfaceKw,
            "record" => Self::RecordKw,
            "enum" => Self::EnumKw,
            "if" => Self::IfKw,
            "else" => Self::ElseKw,
            "throw" => Self::ThrowKw,
            "new" => Self::NewKw,
            "null" => Self::NullKw,
            "true" => Self::TrueKw,
            "false" => Self::FalseKw,
            "return" => Self::ReturnKw,
            "while" => Self::WhileKw,
            "do" => Self::DoKw,
            "for" => Self::ForKw,
            "foreach" => Self::ForeachKw,
            "in" => Self::InKw,
            "try" => Self::TryKw,
            "catch" => Self::CatchKw,
            "finally" => Self::FinallyKw,
            "lock" => Self::LockKw,
            "switch" => Self::SwitchKw,
            "case" => Self::CaseKw,
            "default" => Self::DefaultKw,
            "break" => Self::BreakKw,
            "continue" => Self::ContinueKw,
            "this" => Self::ThisKw,
            "base" => Self::BaseKw,
            "is" => Self::IsKw,
            "as" => Self::AsKw,
            "public" | "private" | "protected" | "internal" | "static" | "readonly" | "sealed"
            | "abstract" | "virtual" | "override" | "extern" | "unsafe" | "volatile" | "const"
            | "ref" | "out" | "params" | "fixed" => Self::ModifierKw,
            "bool" | "byte" | "sbyte" | "char" | "decimal" | "double" | "float" | "int"
            | "uint" | "long" | "ulong" | "short" | "ushort" | "object" | "string" | "void"
            | "nint" | "nuint" => Self::PredefinedTypeKw,
            _ => return None,
        })
    }
}

impl fmt::Display for CsSyntaxKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{self:?}")
    }
}

impl From<CsSyntaxKind> for rowan::SyntaxKind {
    fn from(kind: CsSyntaxKind) -> Self {
        Self(kind as u16)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_discriminants_are_contiguous() {
        for (index, kind) in CsSyntaxKind::ALL.iter().enumerate() {
            assert_eq!(*kind as usize, index, "{kind:?} is out of place");
        }
        assert_eq!(CsSyntaxKind::ALL.last(), Some(&CsSyntaxKind::Unknown));
    }

    #[test]
    fn test_trivia_classification() {
        assert!(CsSyntaxKind::Whitespace.is_trivia());
        assert!(CsSyntaxKind::Preprocessor.is_trivia());
        assert!(!CsSyntaxKind::Ident.is_trivia());
    }

    #[test]
    fn test_keyword_lookup() {
        assert_eq!(CsSyntaxKind::from_keyword("throw"), Some(CsSyntaxKind::ThrowKw));
        assert_eq!(
            CsSyntaxKind::from_keyword("string"),
            Some(CsSyntaxKind::PredefinedTypeKw)
        );
        assert_eq!(CsSyntaxKind::from_keyword("public"), Some(CsSyntaxKind::ModifierKw));
        // Contextual keywords stay identifiers
        assert_eq!(CsSyntaxKind::from_keyword("nameof"), None);
        assert_eq!(CsSyntaxKind::from_keyword("var"), None);
        assert!(CsSyntaxKind::ThrowKw.is_keyword());
    }

    #[test]
    fn test_node_classification() {
        assert!(CsSyntaxKind::LiteralExpression.is_expression());
        assert!(CsSyntaxKind::ObjectCreationExpression.is_expression());
        assert!(!CsSyntaxKind::ArgumentList.is_expression());
        assert!(CsSyntaxKind::ThrowStatement.is_statement());
        assert!(!CsSyntaxKind::ElseClause.is_statement());
        assert!(CsSyntaxKind::Block.is_node());
        assert!(!CsSyntaxKind::Ident.is_node());
        assert_eq!(CsSyntaxKind::EqEq.punct_text(), Some("=="));
    }
}
