//! Hierarchical parser for a lossless C# subset
//!
//! Declarations and statements are parsed by recursive descent, expressions
//! by precedence climbing. Trivia is always flushed into the node that is
//! open *before* a new node starts, so every node's range is exactly its own
//! tokens and `parse(source).text() == source` holds for any input.

use rowan::{GreenNode, TextRange, TextSize};

use super::{CstBuilder, CstToken, CsSyntaxKind, CsSyntaxNode, lex_with_trivia};

/// Sentinel returned by lookahead past the end of input
const EOF: CsSyntaxKind = CsSyntaxKind::Unknown;

/// Category of a parse error
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParseErrorKind {
    /// Reported by the lexer
    Lexer,
    /// A token appeared where it is not allowed
    UnexpectedToken,
    /// A required token was missing
    MissingToken,
}

/// A recoverable error produced while parsing
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseError {
    pub message: String,
    pub range: TextRange,
    pub kind: ParseErrorKind,
}

impl ParseError {
    pub fn new(message: impl Into<String>, range: TextRange, kind: ParseErrorKind) -> Self {
        Self {
            message: message.into(),
            range,
            kind,
        }
    }
}

/// Result of parsing: the green tree plus every error encountered
#[derive(Debug, Clone)]
pub struct Parse {
    green: GreenNode,
    errors: Vec<ParseError>,
}

impl Parse {
    /// Red root of the tree
    pub fn syntax(&self) -> CsSyntaxNode {
        CsSyntaxNode::new_root(self.green.clone())
    }

    pub fn green(&self) -> &GreenNode {
        &self.green
    }

    pub fn errors(&self) -> &[ParseError] {
        &self.errors
    }

    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }
}

/// Parse C# source into a hierarchical CST
///
/// # Example
///
/// ```rust,ignore
/// use sharplint_core::cst::parse_csharp;
///
/// let source = "class C { void M(string p) { if (p == null) throw new System.ArgumentNullException(\"p\"); } }";
/// let parse = parse_csharp(source);
/// assert!(!parse.has_errors());
/// assert_eq!(parse.syntax().text().to_string(), source);
/// ```
pub fn parse_csharp(source: &str) -> Parse {
    let (tokens, lexer_errors) = lex_with_trivia(source);
    let mut errors: Vec<ParseError> = lexer_errors
        .into_iter()
        .map(|err| {
            ParseError::new(
                err.message,
                span_to_range(err.span.start, err.span.end.min(source.len())),
                ParseErrorKind::Lexer,
            )
        })
        .collect();

    let mut parser = Parser::new(&tokens, source.len());
    parser.parse_compilation_unit();
    let (green, parse_errors) = parser.into_parts();
    errors.extend(parse_errors);

    Parse { green, errors }
}

fn span_to_range(start: usize, end: usize) -> TextRange {
    let start = TextSize::try_from(start).unwrap_or_default();
    let end = TextSize::try_from(end).unwrap_or(start).max(start);
    TextRange::new(start, end)
}

/// Where a member list lives, which decides how ambiguous starts are read
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum MemberContext {
    CompilationUnit,
    Namespace,
    TypeBody,
}

/// Right-hand side shape of a binary operator
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum BinaryRhs {
    Expression,
    Pattern,
    Type,
}

/// Token stream parser
struct Parser<'a> {
    tokens: &'a [CstToken],
    /// Indices of the non-trivia tokens
    significant: Vec<usize>,
    /// Cursor into `significant`
    cur: usize,
    /// Next raw token index not yet added to the tree
    emitted: usize,
    source_len: usize,
    builder: CstBuilder,
    errors: Vec<ParseError>,
}

impl<'a> Parser<'a> {
    fn new(tokens: &'a [CstToken], source_len: usize) -> Self {
        let significant = tokens
            .iter()
            .enumerate()
            .filter(|(_, token)| !token.kind.is_trivia())
            .map(|(index, _)| index)
            .collect();
        Self {
            tokens,
            significant,
            cur: 0,
            emitted: 0,
            source_len,
            builder: CstBuilder::new(),
            errors: Vec::new(),
        }
    }

    fn into_parts(self) -> (GreenNode, Vec<ParseError>) {
        (self.builder.finish_green(), self.errors)
    }

    // ------------------------------------------------------------------
    // Declarations
    // ------------------------------------------------------------------

    fn parse_compilation_unit(&mut self) {
        self.builder.start_node(CsSyntaxKind::CompilationUnit);
        self.parse_member_list(MemberContext::CompilationUnit);
        // Remaining trivia (and stray tokens) belong to the root
        while !self.at_end() {
            self.error_and_bump("unexpected token");
        }
        self.eat_trivia();
        self.builder.finish_node();
    }

    fn parse_member_list(&mut self, context: MemberContext) {
        while !self.at_end() {
            if context != MemberContext::CompilationUnit && self.at(CsSyntaxKind::RBrace) {
                break;
            }
            let before = self.cur;
            self.parse_member(context);
            if self.cur == before {
                self.error_and_bump("unexpected token in declaration");
            }
        }
    }

    fn parse_member(&mut self, context: MemberContext) {
        if self.at_using_directive() {
            self.parse_using_directive();
            return;
        }

        if context == MemberContext::CompilationUnit && !self.at_declaration_start() {
            self.parse_statement();
            return;
        }

        let checkpoint = self.checkpoint();
        let has_attributes = self.parse_attribute_lists();
        let has_modifiers = self.parse_modifiers();

        match self.current() {
            CsSyntaxKind::NamespaceKw => self.parse_namespace(checkpoint),
            CsSyntaxKind::ClassKw
            | CsSyntaxKind::StructKw
            | CsSyntaxKind::InterfaceKw
            | CsSyntaxKind::RecordKw => self.parse_type_declaration(checkpoint),
            CsSyntaxKind::EnumKw => self.parse_enum_declaration(checkpoint),
            _ if self.at_contextual("delegate") => self.parse_delegate_declaration(checkpoint),
            _ if context == MemberContext::TypeBody || has_modifiers => {
                self.parse_typed_member(checkpoint, true)
            }
            _ if has_attributes => {
                // Assembly-level attributes stand on their own
            }
            _ => {
                self.builder
                    .start_node_at(checkpoint, CsSyntaxKind::Error);
                self.error("expected type or namespace declaration");
                self.recover_to_member_end();
                self.builder.finish_node();
            }
        }
    }

    fn at_using_directive(&self) -> bool {
        let offset = usize::from(self.at_contextual("global"));
        if self.nth(offset) != CsSyntaxKind::UsingKw {
            return false;
        }
        match self.nth(offset + 1) {
            CsSyntaxKind::LParen => false,
            // `using var x = ...;` is a declaration statement
            _ => !self.looks_like_declaration_at(offset + 1),
        }
    }

    /// Whether the current tokens start a declaration rather than a statement
    fn at_declaration_start(&self) -> bool {
        match self.current() {
            CsSyntaxKind::NamespaceKw
            | CsSyntaxKind::ClassKw
            | CsSyntaxKind::StructKw
            | CsSyntaxKind::InterfaceKw
            | CsSyntaxKind::RecordKw
            | CsSyntaxKind::EnumKw
            | CsSyntaxKind::LBracket => true,
            CsSyntaxKind::ModifierKw => {
                // `const int x = 1;` at the top level is a statement
                self.current_text() != "const"
            }
            CsSyntaxKind::Ident => {
                self.at_contextual("delegate")
                    || (self.contextual_modifier_at(0)
                        && matches!(
                            self.nth(1),
                            CsSyntaxKind::ClassKw
                                | CsSyntaxKind::StructKw
                                | CsSyntaxKind::InterfaceKw
                                | CsSyntaxKind::RecordKw
                                | CsSyntaxKind::ModifierKw
                        ))
            }
            _ => false,
        }
    }

    fn parse_using_directive(&mut self) {
        self.start(CsSyntaxKind::UsingDirective);
        if self.at_contextual("global") {
            self.bump();
        }
        self.expect(CsSyntaxKind::UsingKw);
        if self.at(CsSyntaxKind::ModifierKw) && self.current_text() == "static" {
            self.bump();
        }
        if self.at(CsSyntaxKind::Ident) && self.nth(1) == CsSyntaxKind::Eq {
            // Alias: using A = B.C;
            self.bump();
            self.bump();
            self.parse_type();
        } else {
            self.parse_name();
        }
        self.expect(CsSyntaxKind::Semicolon);
        self.finish();
    }

    /// Dotted name used by using directives and namespaces
    fn parse_name(&mut self) {
        self.start(CsSyntaxKind::Name);
        if self.at_contextual("global") && self.nth(1) == CsSyntaxKind::ColonColon {
            self.bump();
            self.bump();
        }
        self.expect(CsSyntaxKind::Ident);
        while self.at(CsSyntaxKind::Dot) && self.nth(1) == CsSyntaxKind::Ident {
            self.bump();
            self.bump();
        }
        self.finish();
    }

    fn parse_namespace(&mut self, checkpoint: rowan::Checkpoint) {
        self.expect(CsSyntaxKind::NamespaceKw);
        self.parse_name();
        if self.at(CsSyntaxKind::Semicolon) {
            self.builder
                .start_node_at(checkpoint, CsSyntaxKind::FileScopedNamespaceDeclaration);
            self.bump();
            self.parse_member_list(MemberContext::Namespace);
            self.builder.finish_node();
            return;
        }

        self.builder
            .start_node_at(checkpoint, CsSyntaxKind::NamespaceDeclaration);
        self.expect(CsSyntaxKind::LBrace);
        self.parse_member_list(MemberContext::Namespace);
        self.expect(CsSyntaxKind::RBrace);
        self.builder.finish_node();
    }

    fn parse_type_declaration(&mut self, checkpoint: rowan::Checkpoint) {
        self.builder
            .start_node_at(checkpoint, CsSyntaxKind::TypeDeclaration);
        let is_record = self.at(CsSyntaxKind::RecordKw);
        self.bump();
        if is_record && (self.at(CsSyntaxKind::ClassKw) || self.at(CsSyntaxKind::StructKw)) {
            self.bump();
        }
        self.expect(CsSyntaxKind::Ident);
        if self.at(CsSyntaxKind::Lt) {
            self.parse_type_parameter_list();
        }
        if self.at(CsSyntaxKind::LParen) {
            // Primary constructor parameters
            self.parse_parameter_list();
        }
        if self.at(CsSyntaxKind::Colon) {
            self.parse_base_list();
        }
        self.parse_constraint_clauses();

        if self.at(CsSyntaxKind::LBrace) {
            self.bump();
            self.parse_member_list(MemberContext::TypeBody);
            self.expect(CsSyntaxKind::RBrace);
            if self.at(CsSyntaxKind::Semicolon) {
                self.bump();
            }
        } else {
            self.expect(CsSyntaxKind::Semicolon);
        }
        self.builder.finish_node();
    }

    fn parse_enum_declaration(&mut self, checkpoint: rowan::Checkpoint) {
        self.builder
            .start_node_at(checkpoint, CsSyntaxKind::EnumDeclaration);
        self.bump();
        self.expect(CsSyntaxKind::Ident);
        if self.at(CsSyntaxKind::Colon) {
            self.parse_base_list();
        }
        if self.at(CsSyntaxKind::LBrace) {
            self.bump_balanced();
        } else {
            self.error_missing("'{'");
        }
        if self.at(CsSyntaxKind::Semicolon) {
            self.bump();
        }
        self.builder.finish_node();
    }

    fn parse_delegate_declaration(&mut self, checkpoint: rowan::Checkpoint) {
        self.builder
            .start_node_at(checkpoint, CsSyntaxKind::MethodDeclaration);
        self.bump();
        self.parse_type();
        self.expect(CsSyntaxKind::Ident);
        if self.at(CsSyntaxKind::Lt) {
            self.parse_type_parameter_list();
        }
        self.parse_parameter_list();
        self.parse_constraint_clauses();
        self.expect(CsSyntaxKind::Semicolon);
        self.builder.finish_node();
    }

    fn parse_base_list(&mut self) {
        self.start(CsSyntaxKind::BaseList);
        self.bump();
        loop {
            self.parse_type();
            if self.at(CsSyntaxKind::LParen) {
                self.parse_argument_list();
            }
            if !self.eat(CsSyntaxKind::Comma) {
                break;
            }
        }
        self.finish();
    }

    fn parse_type_parameter_list(&mut self) {
        self.start(CsSyntaxKind::TypeParameterList);
        self.bump_balanced();
        self.finish();
    }

    /// `where T : class, new()` clauses, kept as plain tokens
    fn parse_constraint_clauses(&mut self) {
        while self.at_contextual("where") {
            self.bump();
            while !self.at_end()
                && !matches!(
                    self.current(),
                    CsSyntaxKind::LBrace | CsSyntaxKind::FatArrow | CsSyntaxKind::Semicolon
                )
                && !self.at_contextual("where")
            {
                self.bump();
            }
        }
    }

    fn parse_attribute_lists(&mut self) -> bool {
        let mut found = false;
        while self.at(CsSyntaxKind::LBracket) {
            self.start(CsSyntaxKind::AttributeList);
            self.bump_balanced();
            self.finish();
            found = true;
        }
        found
    }

    fn parse_modifiers(&mut self) -> bool {
        let mut found = false;
        loop {
            let is_modifier = match self.current() {
                CsSyntaxKind::ModifierKw => true,
                // Member hiding `new` (not `new Foo()`)
                CsSyntaxKind::NewKw => self.at_hiding_new(),
                CsSyntaxKind::Ident => self.contextual_modifier_at(0),
                _ => false,
            };
            if !is_modifier {
                return found;
            }
            self.bump();
            found = true;
        }
    }

    /// Member hiding `new`, as opposed to `new Foo()`
    fn at_hiding_new(&self) -> bool {
        if matches!(
            self.nth(1),
            CsSyntaxKind::ModifierKw
                | CsSyntaxKind::ClassKw
                | CsSyntaxKind::StructKw
                | CsSyntaxKind::InterfaceKw
                | CsSyntaxKind::RecordKw
                | CsSyntaxKind::EnumKw
        ) {
            return true;
        }
        self.scan_type(1)
            .is_some_and(|end| self.nth(end) == CsSyntaxKind::Ident)
    }

    /// `async`, `partial`, `required`, ... followed by something declaration-like
    fn contextual_modifier_at(&self, offset: usize) -> bool {
        matches!(
            self.nth_text(offset),
            "async" | "partial" | "required" | "file" | "implicit" | "explicit" | "scoped"
                | "event"
        ) && matches!(
            self.nth(offset + 1),
            CsSyntaxKind::Ident
                | CsSyntaxKind::PredefinedTypeKw
                | CsSyntaxKind::ModifierKw
                | CsSyntaxKind::ClassKw
                | CsSyntaxKind::StructKw
                | CsSyntaxKind::InterfaceKw
                | CsSyntaxKind::RecordKw
                | CsSyntaxKind::EnumKw
                | CsSyntaxKind::LParen
        ) && !(self.nth(offset + 1) == CsSyntaxKind::LParen
            && self.nth_text(offset) != "async")
    }

    /// Members that start with a type or a constructor name
    fn parse_typed_member(&mut self, checkpoint: rowan::Checkpoint, allow_constructor: bool) {
        let at_constructor = self.at(CsSyntaxKind::Tilde)
            || (self.at(CsSyntaxKind::Ident) && self.nth(1) == CsSyntaxKind::LParen);
        if allow_constructor && at_constructor {
            self.builder
                .start_node_at(checkpoint, CsSyntaxKind::ConstructorDeclaration);
            if self.at(CsSyntaxKind::Tilde) {
                self.bump();
            }
            self.expect(CsSyntaxKind::Ident);
            self.parse_parameter_list();
            if self.at(CsSyntaxKind::Colon) {
                self.start(CsSyntaxKind::ConstructorInitializer);
                self.bump();
                if self.at(CsSyntaxKind::ThisKw) || self.at(CsSyntaxKind::BaseKw) {
                    self.bump();
                } else {
                    self.error_missing("'this' or 'base'");
                }
                self.parse_argument_list();
                self.finish();
            }
            self.parse_member_body();
            self.builder.finish_node();
            return;
        }

        if self.scan_type(0).is_none() {
            self.builder.start_node_at(checkpoint, CsSyntaxKind::Error);
            self.error("expected member declaration");
            self.recover_to_member_end();
            self.builder.finish_node();
            return;
        }
        self.parse_type();

        if self.at_contextual("operator") {
            self.builder
                .start_node_at(checkpoint, CsSyntaxKind::MethodDeclaration);
            self.bump();
            while !self.at_end()
                && !matches!(
                    self.current(),
                    CsSyntaxKind::LParen | CsSyntaxKind::LBrace | CsSyntaxKind::Semicolon
                )
            {
                self.bump();
            }
            self.parse_parameter_list();
            self.parse_member_body();
            self.builder.finish_node();
            return;
        }

        if self.at(CsSyntaxKind::ThisKw) {
            // Indexer
            self.builder
                .start_node_at(checkpoint, CsSyntaxKind::PropertyDeclaration);
            self.bump();
            self.parse_delimited_parameter_list(CsSyntaxKind::LBracket, CsSyntaxKind::RBracket);
            self.parse_property_body();
            self.builder.finish_node();
            return;
        }

        let name_checkpoint = self.checkpoint();
        self.expect(CsSyntaxKind::Ident);
        // Explicit interface implementations: IFoo<T>.Bar
        loop {
            if self.at(CsSyntaxKind::Lt)
                && self.nth(self.scan_type_args(0).unwrap_or(0)) == CsSyntaxKind::Dot
            {
                self.parse_type_argument_list();
            } else if self.at(CsSyntaxKind::Dot) && self.nth(1) == CsSyntaxKind::Ident {
                self.bump();
                self.bump();
            } else {
                break;
            }
        }
        if self.at(CsSyntaxKind::Lt) {
            self.parse_type_parameter_list();
        }

        match self.current() {
            CsSyntaxKind::LParen => {
                self.builder
                    .start_node_at(checkpoint, CsSyntaxKind::MethodDeclaration);
                self.parse_parameter_list();
                self.parse_constraint_clauses();
                self.parse_member_body();
                self.builder.finish_node();
            }
            CsSyntaxKind::LBrace | CsSyntaxKind::FatArrow => {
                self.builder
                    .start_node_at(checkpoint, CsSyntaxKind::PropertyDeclaration);
                self.parse_property_body();
                self.builder.finish_node();
            }
            _ => {
                self.builder
                    .start_node_at(checkpoint, CsSyntaxKind::FieldDeclaration);
                self.builder
                    .start_node_at(name_checkpoint, CsSyntaxKind::VariableDeclarator);
                self.parse_declarator_tail();
                self.builder.finish_node();
                while self.eat(CsSyntaxKind::Comma) {
                    self.parse_variable_declarator();
                }
                self.expect(CsSyntaxKind::Semicolon);
                self.builder.finish_node();
            }
        }
    }

    /// `{ ... }`, `=> expr;` or `;`
    fn parse_member_body(&mut self) {
        match self.current() {
            CsSyntaxKind::LBrace => self.parse_block(),
            CsSyntaxKind::FatArrow => {
                self.parse_arrow_clause();
                self.expect(CsSyntaxKind::Semicolon);
            }
            _ => self.expect(CsSyntaxKind::Semicolon),
        }
    }

    fn parse_arrow_clause(&mut self) {
        self.start(CsSyntaxKind::ArrowExpressionClause);
        self.bump();
        self.parse_expression();
        self.finish();
    }

    fn parse_property_body(&mut self) {
        if self.at(CsSyntaxKind::FatArrow) {
            self.parse_arrow_clause();
            self.expect(CsSyntaxKind::Semicolon);
            return;
        }

        self.start(CsSyntaxKind::AccessorList);
        self.expect(CsSyntaxKind::LBrace);
        while !self.at_end() && !self.at(CsSyntaxKind::RBrace) {
            let before = self.cur;
            self.start(CsSyntaxKind::AccessorDeclaration);
            self.parse_attribute_lists();
            while self.at(CsSyntaxKind::ModifierKw) {
                self.bump();
            }
            self.expect(CsSyntaxKind::Ident);
            self.parse_member_body();
            self.finish();
            if self.cur == before {
                self.error_and_bump("unexpected token in accessor list");
            }
        }
        self.expect(CsSyntaxKind::RBrace);
        self.finish();

        if self.at(CsSyntaxKind::Eq) {
            self.start(CsSyntaxKind::EqualsValueClause);
            self.bump();
            self.parse_variable_initializer();
            self.finish();
            self.expect(CsSyntaxKind::Semicolon);
        }
    }

    fn parse_parameter_list(&mut self) {
        self.parse_delimited_parameter_list(CsSyntaxKind::LParen, CsSyntaxKind::RParen);
    }

    fn parse_delimited_parameter_list(&mut self, open: CsSyntaxKind, close: CsSyntaxKind) {
        self.start(CsSyntaxKind::ParameterList);
        self.expect(open);
        if !self.at(close) {
            loop {
                self.parse_parameter();
                if !self.eat(CsSyntaxKind::Comma) {
                    break;
                }
            }
        }
        self.expect(close);
        self.finish();
    }

    fn parse_parameter(&mut self) {
        self.start(CsSyntaxKind::Parameter);
        self.parse_attribute_lists();
        while matches!(
            self.current(),
            CsSyntaxKind::ModifierKw | CsSyntaxKind::ThisKw | CsSyntaxKind::InKw
        ) || self.at_contextual("scoped")
        {
            self.bump();
        }
        if self.at(CsSyntaxKind::Ident)
            && matches!(self.nth(1), CsSyntaxKind::Comma | CsSyntaxKind::RParen)
        {
            // Untyped lambda parameter
            self.bump();
        } else {
            self.parse_type();
            self.expect(CsSyntaxKind::Ident);
        }
        if self.at(CsSyntaxKind::Eq) {
            self.start(CsSyntaxKind::EqualsValueClause);
            self.bump();
            self.parse_expression();
            self.finish();
        }
        self.finish();
    }

    fn parse_variable_declaration(&mut self) {
        self.parse_type();
        loop {
            self.parse_variable_declarator();
            if !self.eat(CsSyntaxKind::Comma) {
                break;
            }
        }
    }

    fn parse_variable_declarator(&mut self) {
        self.start(CsSyntaxKind::VariableDeclarator);
        self.expect(CsSyntaxKind::Ident);
        self.parse_declarator_tail();
        self.finish();
    }

    fn parse_declarator_tail(&mut self) {
        if self.at(CsSyntaxKind::LBracket) {
            // Fixed-size buffer
            self.bump_balanced();
        }
        if self.at(CsSyntaxKind::Eq) {
            self.start(CsSyntaxKind::EqualsValueClause);
            self.bump();
            self.parse_variable_initializer();
            self.finish();
        }
    }

    fn parse_variable_initializer(&mut self) {
        if self.at(CsSyntaxKind::LBrace) {
            self.parse_initializer();
        } else {
            self.parse_expression();
        }
    }

    fn recover_to_member_end(&mut self) {
        while !self.at_end() {
            match self.current() {
                CsSyntaxKind::Semicolon => {
                    self.bump();
                    return;
                }
                CsSyntaxKind::RBrace => return,
                CsSyntaxKind::LBrace => {
                    self.bump_balanced();
                    return;
                }
                _ => self.bump(),
            }
        }
    }

    // ------------------------------------------------------------------
    // Statements
    // ------------------------------------------------------------------

    fn parse_block(&mut self) {
        self.start(CsSyntaxKind::Block);
        self.expect(CsSyntaxKind::LBrace);
        self.parse_statement_list(|parser| parser.at(CsSyntaxKind::RBrace));
        self.expect(CsSyntaxKind::RBrace);
        self.finish();
    }

    fn parse_statement_list(&mut self, stop: impl Fn(&Self) -> bool) {
        while !self.at_end() && !stop(self) {
            let before = self.cur;
            self.parse_statement();
            if self.cur == before {
                self.error_and_bump("unexpected token in statement");
            }
        }
    }

    fn parse_statement(&mut self) {
        match self.current() {
            CsSyntaxKind::LBrace => self.parse_block(),
            CsSyntaxKind::Semicolon => {
                self.start(CsSyntaxKind::EmptyStatement);
                self.bump();
                self.finish();
            }
            CsSyntaxKind::IfKw => self.parse_if_statement(),
            CsSyntaxKind::ThrowKw => self.parse_keyword_statement(CsSyntaxKind::ThrowStatement),
            CsSyntaxKind::ReturnKw => self.parse_keyword_statement(CsSyntaxKind::ReturnStatement),
            CsSyntaxKind::BreakKw => self.parse_keyword_statement(CsSyntaxKind::BreakStatement),
            CsSyntaxKind::ContinueKw => {
                self.parse_keyword_statement(CsSyntaxKind::ContinueStatement)
            }
            CsSyntaxKind::WhileKw => self.parse_while_statement(),
            CsSyntaxKind::DoKw => self.parse_do_statement(),
            CsSyntaxKind::ForKw => self.parse_for_statement(),
            CsSyntaxKind::ForeachKw => self.parse_foreach_statement(),
            CsSyntaxKind::TryKw => self.parse_try_statement(),
            CsSyntaxKind::LockKw => self.parse_parenthesized_statement(CsSyntaxKind::LockStatement),
            CsSyntaxKind::SwitchKw => self.parse_switch_statement(),
            CsSyntaxKind::UsingKw if self.nth(1) == CsSyntaxKind::LParen => {
                self.parse_parenthesized_statement(CsSyntaxKind::UsingStatement)
            }
            CsSyntaxKind::Ident if self.at_contextual("await") => match self.nth(1) {
                CsSyntaxKind::ForeachKw => self.parse_foreach_statement(),
                CsSyntaxKind::UsingKw if self.nth(2) == CsSyntaxKind::LParen => {
                    self.parse_parenthesized_statement(CsSyntaxKind::UsingStatement)
                }
                CsSyntaxKind::UsingKw => self.parse_local_declaration(),
                _ => self.parse_expression_statement(),
            },
            CsSyntaxKind::Ident if self.at_contextual("yield") => match self.nth(1) {
                CsSyntaxKind::ReturnKw => self.parse_keyword_statement(CsSyntaxKind::ReturnStatement),
                CsSyntaxKind::BreakKw => self.parse_keyword_statement(CsSyntaxKind::BreakStatement),
                _ => self.parse_expression_statement(),
            },
            CsSyntaxKind::Ident
                if matches!(self.current_text(), "checked" | "unchecked")
                    && self.nth(1) == CsSyntaxKind::LBrace =>
            {
                self.parse_prefixed_block()
            }
            CsSyntaxKind::ModifierKw if self.current_text() == "unsafe" => {
                self.parse_prefixed_block()
            }
            CsSyntaxKind::ModifierKw if self.current_text() == "fixed" => {
                self.parse_parenthesized_statement(CsSyntaxKind::UsingStatement)
            }
            _ if self.looks_like_local_function() => {
                let checkpoint = self.checkpoint();
                self.parse_attribute_lists();
                self.parse_modifiers();
                self.parse_typed_member(checkpoint, false);
            }
            _ if self.looks_like_local_declaration() => self.parse_local_declaration(),
            kind if can_start_expression(kind) => self.parse_expression_statement(),
            _ => self.error_and_bump("expected statement"),
        }
    }

    /// `throw`, `return`, `break`, `continue` (optionally after `yield`)
    fn parse_keyword_statement(&mut self, kind: CsSyntaxKind) {
        self.start(kind);
        if self.at_contextual("yield") {
            self.bump();
        }
        self.bump();
        if matches!(
            kind,
            CsSyntaxKind::ThrowStatement | CsSyntaxKind::ReturnStatement
        ) && !self.at(CsSyntaxKind::Semicolon)
        {
            self.parse_expression();
        }
        self.expect(CsSyntaxKind::Semicolon);
        self.finish();
    }

    fn parse_if_statement(&mut self) {
        self.start(CsSyntaxKind::IfStatement);
        self.bump();
        self.parse_parenthesized_condition();
        self.parse_statement();
        if self.at(CsSyntaxKind::ElseKw) {
            self.start(CsSyntaxKind::ElseClause);
            self.bump();
            self.parse_statement();
            self.finish();
        }
        self.finish();
    }

    fn parse_parenthesized_condition(&mut self) {
        self.expect(CsSyntaxKind::LParen);
        self.parse_expression();
        self.expect(CsSyntaxKind::RParen);
    }

    fn parse_while_statement(&mut self) {
        self.start(CsSyntaxKind::WhileStatement);
        self.bump();
        self.parse_parenthesized_condition();
        self.parse_statement();
        self.finish();
    }

    fn parse_do_statement(&mut self) {
        self.start(CsSyntaxKind::DoStatement);
        self.bump();
        self.parse_statement();
        self.expect(CsSyntaxKind::WhileKw);
        self.parse_parenthesized_condition();
        self.expect(CsSyntaxKind::Semicolon);
        self.finish();
    }

    fn parse_for_statement(&mut self) {
        self.start(CsSyntaxKind::ForStatement);
        self.bump();
        self.expect(CsSyntaxKind::LParen);
        if !self.at(CsSyntaxKind::Semicolon) {
            if self.looks_like_declaration_at(0) {
                self.parse_variable_declaration();
            } else {
                self.parse_expression_list();
            }
        }
        self.expect(CsSyntaxKind::Semicolon);
        if !self.at(CsSyntaxKind::Semicolon) {
            self.parse_expression();
        }
        self.expect(CsSyntaxKind::Semicolon);
        if !self.at(CsSyntaxKind::RParen) {
            self.parse_expression_list();
        }
        self.expect(CsSyntaxKind::RParen);
        self.parse_statement();
        self.finish();
    }

    fn parse_expression_list(&mut self) {
        loop {
            self.parse_expression();
            if !self.eat(CsSyntaxKind::Comma) {
                break;
            }
        }
    }

    fn parse_foreach_statement(&mut self) {
        self.start(CsSyntaxKind::ForeachStatement);
        if self.at_contextual("await") {
            self.bump();
        }
        self.expect(CsSyntaxKind::ForeachKw);
        self.expect(CsSyntaxKind::LParen);
        self.parse_type();
        if self.at(CsSyntaxKind::LParen) {
            // Deconstruction: var (a, b)
            self.bump_balanced();
        } else {
            self.expect(CsSyntaxKind::Ident);
        }
        self.expect(CsSyntaxKind::InKw);
        self.parse_expression();
        self.expect(CsSyntaxKind::RParen);
        self.parse_statement();
        self.finish();
    }

    fn parse_try_statement(&mut self) {
        self.start(CsSyntaxKind::TryStatement);
        self.bump();
        self.parse_block();
        while self.at(CsSyntaxKind::CatchKw) {
            self.start(CsSyntaxKind::CatchClause);
            self.bump();
            if self.at(CsSyntaxKind::LParen) {
                self.bump();
                self.parse_type();
                if self.at(CsSyntaxKind::Ident) {
                    self.bump();
                }
                self.expect(CsSyntaxKind::RParen);
            }
            if self.at_contextual("when") {
                self.bump();
                self.parse_parenthesized_condition();
            }
            self.parse_block();
            self.finish();
        }
        if self.at(CsSyntaxKind::FinallyKw) {
            self.start(CsSyntaxKind::FinallyClause);
            self.bump();
            self.parse_block();
            self.finish();
        }
        self.finish();
    }

    /// `lock (x) stmt`, `using (x) stmt`, `fixed (x) stmt`
    fn parse_parenthesized_statement(&mut self, kind: CsSyntaxKind) {
        self.start(kind);
        if self.at_contextual("await") {
            self.bump();
        }
        self.bump();
        self.expect(CsSyntaxKind::LParen);
        if self.looks_like_declaration_at(0) {
            self.parse_variable_declaration();
        } else {
            self.parse_expression();
        }
        self.expect(CsSyntaxKind::RParen);
        self.parse_statement();
        self.finish();
    }

    fn parse_switch_statement(&mut self) {
        self.start(CsSyntaxKind::SwitchStatement);
        self.bump();
        if self.at(CsSyntaxKind::LParen) {
            self.parse_parenthesized_condition();
        } else {
            self.parse_expression();
        }
        self.expect(CsSyntaxKind::LBrace);
        while !self.at_end() && !self.at(CsSyntaxKind::RBrace) {
            let before = self.cur;
            self.start(CsSyntaxKind::SwitchSection);
            while self.at_switch_label() {
                // Labels and patterns are kept as tokens up to the colon
                let mut depth = 0usize;
                while !self.at_end() {
                    match self.current() {
                        CsSyntaxKind::LParen | CsSyntaxKind::LBracket | CsSyntaxKind::LBrace => {
                            depth += 1
                        }
                        CsSyntaxKind::RParen | CsSyntaxKind::RBracket | CsSyntaxKind::RBrace
                            if depth > 0 =>
                        {
                            depth -= 1
                        }
                        CsSyntaxKind::RBrace => break,
                        CsSyntaxKind::Colon if depth == 0 => {
                            self.bump();
                            break;
                        }
                        _ => {}
                    }
                    self.bump();
                }
            }
            self.parse_statement_list(|parser| {
                parser.at(CsSyntaxKind::RBrace) || parser.at_switch_label()
            });
            self.finish();
            if self.cur == before {
                self.error_and_bump("unexpected token in switch");
            }
        }
        self.expect(CsSyntaxKind::RBrace);
        self.finish();
    }

    fn at_switch_label(&self) -> bool {
        self.at(CsSyntaxKind::CaseKw)
            || (self.at(CsSyntaxKind::DefaultKw) && self.nth(1) == CsSyntaxKind::Colon)
    }

    /// `checked { }`, `unchecked { }`, `unsafe { }`
    fn parse_prefixed_block(&mut self) {
        self.start(CsSyntaxKind::Block);
        self.bump();
        self.parse_block();
        self.finish();
    }

    fn parse_local_declaration(&mut self) {
        self.start(CsSyntaxKind::LocalDeclarationStatement);
        if self.at_contextual("await") {
            self.bump();
        }
        while self.at(CsSyntaxKind::UsingKw)
            || (self.at(CsSyntaxKind::ModifierKw)
                && matches!(self.current_text(), "const" | "ref" | "readonly"))
            || self.at_contextual("scoped")
        {
            self.bump();
        }
        self.parse_variable_declaration();
        self.expect(CsSyntaxKind::Semicolon);
        self.finish();
    }

    fn parse_expression_statement(&mut self) {
        self.start(CsSyntaxKind::ExpressionStatement);
        self.parse_expression();
        self.expect(CsSyntaxKind::Semicolon);
        self.finish();
    }

    fn looks_like_local_declaration(&self) -> bool {
        let mut offset = 0;
        while self.nth(offset) == CsSyntaxKind::UsingKw
            || (self.nth(offset) == CsSyntaxKind::ModifierKw
                && matches!(self.nth_text(offset), "const" | "ref" | "readonly"))
            || self.nth_text(offset) == "scoped"
        {
            offset += 1;
        }
        self.looks_like_declaration_at(offset)
    }

    /// `Type name` followed by `=`, `;`, `,` or `in`
    fn looks_like_declaration_at(&self, offset: usize) -> bool {
        if self.nth_text(offset) == "await" && self.nth(offset) == CsSyntaxKind::Ident {
            return false;
        }
        match self.scan_type(offset) {
            Some(end) => {
                self.nth(end) == CsSyntaxKind::Ident
                    && matches!(
                        self.nth(end + 1),
                        CsSyntaxKind::Eq
                            | CsSyntaxKind::Semicolon
                            | CsSyntaxKind::Comma
                            | CsSyntaxKind::InKw
                            | CsSyntaxKind::RParen
                    )
            }
            None => false,
        }
    }

    fn looks_like_local_function(&self) -> bool {
        let mut offset = 0;
        while self.nth(offset) == CsSyntaxKind::ModifierKw
            || (self.nth(offset) == CsSyntaxKind::Ident
                && matches!(self.nth_text(offset), "async")
                && self.nth(offset + 1) != CsSyntaxKind::LParen)
        {
            offset += 1;
        }
        if self.nth(offset) == CsSyntaxKind::Ident && self.nth_text(offset) == "await" {
            return false;
        }
        match self.scan_type(offset) {
            Some(end) => {
                self.nth(end) == CsSyntaxKind::Ident
                    && matches!(self.nth(end + 1), CsSyntaxKind::LParen | CsSyntaxKind::Lt)
            }
            None => false,
        }
    }

    // ------------------------------------------------------------------
    // Types
    // ------------------------------------------------------------------

    fn parse_type(&mut self) {
        self.parse_type_with(true, false);
    }

    /// Parse a type reference.
    ///
    /// `array_suffix` allows `[]` rank specifiers; `in_expression` only takes a
    /// nullable `?` when no expression follows it.
    fn parse_type_with(&mut self, array_suffix: bool, in_expression: bool) {
        self.start(CsSyntaxKind::TypeRef);
        match self.current() {
            CsSyntaxKind::PredefinedTypeKw => self.bump(),
            CsSyntaxKind::Ident => self.parse_type_name(),
            CsSyntaxKind::LParen => {
                // Tuple type
                self.bump();
                loop {
                    self.parse_type();
                    if self.at(CsSyntaxKind::Ident) {
                        self.bump();
                    }
                    if !self.eat(CsSyntaxKind::Comma) {
                        break;
                    }
                }
                self.expect(CsSyntaxKind::RParen);
            }
            _ => self.error_missing("type"),
        }

        loop {
            match self.current() {
                CsSyntaxKind::Question
                    if !in_expression || !can_start_expression(self.nth(1)) =>
                {
                    self.bump()
                }
                CsSyntaxKind::Star if !in_expression => self.bump(),
                CsSyntaxKind::LBracket
                    if array_suffix
                        && matches!(self.nth(1), CsSyntaxKind::RBracket | CsSyntaxKind::Comma) =>
                {
                    self.bump();
                    while self.eat(CsSyntaxKind::Comma) {}
                    self.expect(CsSyntaxKind::RBracket);
                }
                _ => break,
            }
        }
        self.finish();
    }

    fn parse_type_name(&mut self) {
        self.bump();
        if self.at(CsSyntaxKind::ColonColon) {
            self.bump();
            self.expect(CsSyntaxKind::Ident);
        }
        loop {
            if self.at(CsSyntaxKind::Lt) && self.scan_type_args(0).is_some() {
                self.parse_type_argument_list();
            } else if self.at(CsSyntaxKind::Dot) && self.nth(1) == CsSyntaxKind::Ident {
                self.bump();
                self.bump();
            } else {
                break;
            }
        }
    }

    fn parse_type_argument_list(&mut self) {
        self.start(CsSyntaxKind::TypeArgumentList);
        self.bump();
        while self.eat(CsSyntaxKind::Comma) {}
        if !self.at(CsSyntaxKind::Gt) {
            loop {
                self.parse_type();
                if !self.eat(CsSyntaxKind::Comma) {
                    break;
                }
            }
        }
        self.expect(CsSyntaxKind::Gt);
        self.finish();
    }

    /// Scan a type at lookahead `offset`, returning the offset just past it
    fn scan_type(&self, offset: usize) -> Option<usize> {
        let mut k = match self.nth(offset) {
            CsSyntaxKind::PredefinedTypeKw => offset + 1,
            CsSyntaxKind::Ident => self.scan_type_name(offset)?,
            CsSyntaxKind::LParen => {
                let mut k = offset + 1;
                loop {
                    k = self.scan_type(k)?;
                    if self.nth(k) == CsSyntaxKind::Ident {
                        k += 1;
                    }
                    match self.nth(k) {
                        CsSyntaxKind::Comma => k += 1,
                        CsSyntaxKind::RParen => break k + 1,
                        _ => return None,
                    }
                }
            }
            _ => return None,
        };
        loop {
            match self.nth(k) {
                CsSyntaxKind::Question | CsSyntaxKind::Star => k += 1,
                CsSyntaxKind::LBracket => {
                    k += 1;
                    while self.nth(k) == CsSyntaxKind::Comma {
                        k += 1;
                    }
                    if self.nth(k) != CsSyntaxKind::RBracket {
                        return None;
                    }
                    k += 1;
                }
                _ => return Some(k),
            }
        }
    }

    fn scan_type_name(&self, offset: usize) -> Option<usize> {
        let mut k = offset + 1;
        if self.nth(k) == CsSyntaxKind::ColonColon {
            if self.nth(k + 1) != CsSyntaxKind::Ident {
                return None;
            }
            k += 2;
        }
        loop {
            if self.nth(k) == CsSyntaxKind::Lt {
                k = self.scan_type_args(k)?;
            }
            if self.nth(k) == CsSyntaxKind::Dot && self.nth(k + 1) == CsSyntaxKind::Ident {
                k += 2;
                continue;
            }
            return Some(k);
        }
    }

    /// Scan `<...>` at `offset`, returning the offset after `>`
    fn scan_type_args(&self, offset: usize) -> Option<usize> {
        let mut k = offset + 1;
        while self.nth(k) == CsSyntaxKind::Comma {
            k += 1;
        }
        if self.nth(k) == CsSyntaxKind::Gt {
            return Some(k + 1);
        }
        loop {
            k = self.scan_type(k)?;
            match self.nth(k) {
                CsSyntaxKind::Comma => k += 1,
                CsSyntaxKind::Gt => return Some(k + 1),
                _ => return None,
            }
        }
    }

    /// `<` at the cursor starts type arguments of the preceding name,
    /// as in `Foo<int>(x)` or `List<T>.Empty`
    fn at_type_arguments_in_expression(&self) -> bool {
        match self.scan_type_args(0) {
            Some(end) => matches!(
                self.nth(end),
                CsSyntaxKind::LParen
                    | CsSyntaxKind::RParen
                    | CsSyntaxKind::RBracket
                    | CsSyntaxKind::RBrace
                    | CsSyntaxKind::Comma
                    | CsSyntaxKind::Semicolon
                    | CsSyntaxKind::Dot
                    | CsSyntaxKind::QuestionDot
                    | CsSyntaxKind::Colon
                    | CsSyntaxKind::EqEq
                    | CsSyntaxKind::BangEq
                    | EOF
            ),
            None => false,
        }
    }

    // ------------------------------------------------------------------
    // Expressions
    // ------------------------------------------------------------------

    fn parse_expression(&mut self) {
        if self.at_lambda() {
            self.parse_lambda();
            return;
        }
        if self.at(CsSyntaxKind::ThrowKw) {
            self.start(CsSyntaxKind::ThrowExpression);
            self.bump();
            self.parse_expression();
            self.finish();
            return;
        }

        let checkpoint = self.checkpoint();
        self.parse_binary(0);

        if self.at(CsSyntaxKind::Question) {
            self.builder
                .start_node_at(checkpoint, CsSyntaxKind::ConditionalExpression);
            self.bump();
            self.parse_expression();
            self.expect(CsSyntaxKind::Colon);
            self.parse_expression();
            self.builder.finish_node();
        }

        if self.at(CsSyntaxKind::Eq) || self.at(CsSyntaxKind::AssignOp) {
            self.builder
                .start_node_at(checkpoint, CsSyntaxKind::AssignmentExpression);
            self.bump();
            if self.at(CsSyntaxKind::LBrace) {
                self.parse_initializer();
            } else {
                self.parse_expression();
            }
            self.builder.finish_node();
        }
    }

    fn at_lambda(&self) -> bool {
        let offset = usize::from(
            self.at_contextual("async")
                && matches!(self.nth(1), CsSyntaxKind::Ident | CsSyntaxKind::LParen),
        );
        match self.nth(offset) {
            CsSyntaxKind::Ident => self.nth(offset + 1) == CsSyntaxKind::FatArrow,
            CsSyntaxKind::LParen => self
                .matching_paren(offset)
                .is_some_and(|close| self.nth(close + 1) == CsSyntaxKind::FatArrow),
            _ => false,
        }
    }

    fn parse_lambda(&mut self) {
        self.start(CsSyntaxKind::LambdaExpression);
        if self.at_contextual("async") && self.nth(1) != CsSyntaxKind::FatArrow {
            self.bump();
        }
        if self.at(CsSyntaxKind::LParen) {
            self.parse_parameter_list();
        } else {
            self.start(CsSyntaxKind::Parameter);
            self.bump();
            self.finish();
        }
        self.expect(CsSyntaxKind::FatArrow);
        if self.at(CsSyntaxKind::LBrace) {
            self.parse_block();
        } else {
            self.parse_expression();
        }
        self.finish();
    }

    fn parse_binary(&mut self, min_bp: u8) {
        let checkpoint = self.checkpoint();
        self.parse_unary();

        while let Some((width, left_bp, right_bp, rhs)) = self.binary_operator() {
            if left_bp < min_bp {
                break;
            }
            self.builder
                .start_node_at(checkpoint, CsSyntaxKind::BinaryExpression);
            for _ in 0..width {
                self.bump();
            }
            match rhs {
                BinaryRhs::Expression => self.parse_binary(right_bp),
                BinaryRhs::Pattern => self.parse_pattern(),
                BinaryRhs::Type => self.parse_type_with(true, true),
            }
            self.builder.finish_node();
        }
    }

    /// Operator at the cursor: (token width, left bp, right bp, rhs shape)
    fn binary_operator(&self) -> Option<(usize, u8, u8, BinaryRhs)> {
        use CsSyntaxKind::*;
        let shift = |kind| self.nth(1) == kind && self.adjacent(1);
        let op = match self.current() {
            QuestionQuestion => (1, 3, 3, BinaryRhs::Expression),
            PipePipe => (1, 5, 6, BinaryRhs::Expression),
            AmpAmp => (1, 7, 8, BinaryRhs::Expression),
            Pipe => (1, 9, 10, BinaryRhs::Expression),
            CaretOp => (1, 11, 12, BinaryRhs::Expression),
            Amp => (1, 13, 14, BinaryRhs::Expression),
            EqEq | BangEq => (1, 15, 16, BinaryRhs::Expression),
            Lt if shift(Lt) => (2, 19, 20, BinaryRhs::Expression),
            Gt if shift(Gt) => (2, 19, 20, BinaryRhs::Expression),
            Lt | Gt | LtEq | GtEq => (1, 17, 18, BinaryRhs::Expression),
            IsKw => (1, 17, 18, BinaryRhs::Pattern),
            AsKw => (1, 17, 18, BinaryRhs::Type),
            Plus | Minus => (1, 21, 22, BinaryRhs::Expression),
            Star | Slash | Percent => (1, 23, 24, BinaryRhs::Expression),
            // Range operator `a..b`
            Dot if shift(Dot) => (2, 25, 26, BinaryRhs::Expression),
            _ => return None,
        };
        Some(op)
    }

    /// Patterns after `is`: `null`, `not null`, `Type name`, `{ ... }`, `> 5`
    fn parse_pattern(&mut self) {
        loop {
            if self.at_contextual("not") {
                self.bump();
            }
            match self.current() {
                CsSyntaxKind::LBrace | CsSyntaxKind::LParen | CsSyntaxKind::LBracket => {
                    self.bump_balanced();
                    if self.at(CsSyntaxKind::Ident) && !self.at_pattern_combinator() {
                        self.bump();
                    }
                }
                CsSyntaxKind::Lt | CsSyntaxKind::Gt | CsSyntaxKind::LtEq | CsSyntaxKind::GtEq => {
                    self.bump();
                    self.parse_binary(21);
                }
                CsSyntaxKind::PredefinedTypeKw | CsSyntaxKind::Ident
                    if self.scan_type(0).is_some() =>
                {
                    self.parse_type_with(true, true);
                    if self.at(CsSyntaxKind::LBrace) {
                        self.bump_balanced();
                    }
                    if self.at(CsSyntaxKind::Ident) && !self.at_pattern_combinator() {
                        self.bump();
                    }
                }
                kind if can_start_expression(kind) => self.parse_binary(21),
                _ => {
                    self.error_missing("pattern");
                    return;
                }
            }
            if self.at_pattern_combinator() {
                self.bump();
                continue;
            }
            return;
        }
    }

    fn at_pattern_combinator(&self) -> bool {
        self.at_contextual("and") || self.at_contextual("or")
    }

    fn parse_unary(&mut self) {
        match self.current() {
            CsSyntaxKind::Bang
            | CsSyntaxKind::Tilde
            | CsSyntaxKind::Minus
            | CsSyntaxKind::Plus
            | CsSyntaxKind::PlusPlus
            | CsSyntaxKind::MinusMinus
            | CsSyntaxKind::Amp
            | CsSyntaxKind::Star
            | CsSyntaxKind::CaretOp => {
                self.start(CsSyntaxKind::PrefixUnaryExpression);
                self.bump();
                self.parse_unary();
                self.finish();
            }
            CsSyntaxKind::Ident if self.at_contextual("await") && self.at_await_operand() => {
                self.start(CsSyntaxKind::AwaitExpression);
                self.bump();
                self.parse_unary();
                self.finish();
            }
            CsSyntaxKind::LParen if self.at_cast() => {
                self.start(CsSyntaxKind::CastExpression);
                self.bump();
                self.parse_type();
                self.expect(CsSyntaxKind::RParen);
                self.parse_unary();
                self.finish();
            }
            _ => self.parse_postfix(),
        }
    }

    fn at_await_operand(&self) -> bool {
        matches!(
            self.nth(1),
            CsSyntaxKind::Ident
                | CsSyntaxKind::LParen
                | CsSyntaxKind::NewKw
                | CsSyntaxKind::ThisKw
                | CsSyntaxKind::BaseKw
                | CsSyntaxKind::PredefinedTypeKw
        ) || self.nth(1).is_literal()
    }

    fn at_cast(&self) -> bool {
        let Some(close) = self.matching_paren(0) else {
            return false;
        };
        if self.scan_type(1) != Some(close) {
            return false;
        }
        let next = self.nth(close + 1);
        let predefined = self.nth(1) == CsSyntaxKind::PredefinedTypeKw;
        if predefined {
            return can_start_expression(next);
        }
        matches!(
            next,
            CsSyntaxKind::Ident
                | CsSyntaxKind::LParen
                | CsSyntaxKind::ThisKw
                | CsSyntaxKind::BaseKw
                | CsSyntaxKind::NewKw
                | CsSyntaxKind::DefaultKw
                | CsSyntaxKind::PredefinedTypeKw
                | CsSyntaxKind::Bang
                | CsSyntaxKind::Tilde
        ) || next.is_literal()
    }

    fn parse_postfix(&mut self) {
        let checkpoint = self.checkpoint();
        if !self.parse_primary() {
            return;
        }
        loop {
            match self.current() {
                CsSyntaxKind::Dot if !(self.nth(1) == CsSyntaxKind::Dot && self.adjacent(1)) => {
                    self.builder
                        .start_node_at(checkpoint, CsSyntaxKind::MemberAccessExpression);
                    self.bump();
                    self.parse_simple_name();
                    self.builder.finish_node();
                }
                CsSyntaxKind::QuestionDot => {
                    self.builder
                        .start_node_at(checkpoint, CsSyntaxKind::ConditionalAccessExpression);
                    self.bump();
                    if self.at(CsSyntaxKind::LBracket) {
                        self.parse_bracketed_argument_list();
                    } else {
                        self.parse_simple_name();
                    }
                    self.builder.finish_node();
                }
                CsSyntaxKind::LParen => {
                    self.builder
                        .start_node_at(checkpoint, CsSyntaxKind::InvocationExpression);
                    self.parse_argument_list();
                    self.builder.finish_node();
                }
                CsSyntaxKind::LBracket => {
                    self.builder
                        .start_node_at(checkpoint, CsSyntaxKind::ElementAccessExpression);
                    self.parse_bracketed_argument_list();
                    self.builder.finish_node();
                }
                CsSyntaxKind::PlusPlus | CsSyntaxKind::MinusMinus | CsSyntaxKind::Bang => {
                    // `!` here is the null-forgiving operator
                    self.builder
                        .start_node_at(checkpoint, CsSyntaxKind::PostfixUnaryExpression);
                    self.bump();
                    self.builder.finish_node();
                }
                CsSyntaxKind::SwitchKw => {
                    self.builder
                        .start_node_at(checkpoint, CsSyntaxKind::SwitchExpression);
                    self.bump();
                    if self.at(CsSyntaxKind::LBrace) {
                        self.bump_balanced();
                    } else {
                        self.error_missing("'{'");
                    }
                    self.builder.finish_node();
                }
                CsSyntaxKind::Ident
                    if self.at_contextual("with") && self.nth(1) == CsSyntaxKind::LBrace =>
                {
                    self.builder
                        .start_node_at(checkpoint, CsSyntaxKind::BinaryExpression);
                    self.bump();
                    self.parse_initializer();
                    self.builder.finish_node();
                }
                _ => break,
            }
        }
    }

    /// Returns false (without consuming) when no expression starts here
    fn parse_primary(&mut self) -> bool {
        match self.current() {
            kind if kind.is_literal() => {
                self.start(CsSyntaxKind::LiteralExpression);
                self.bump();
                self.finish();
            }
            CsSyntaxKind::DefaultKw => {
                if self.nth(1) == CsSyntaxKind::LParen {
                    self.start(CsSyntaxKind::DefaultExpression);
                    self.bump();
                    self.bump();
                    self.parse_type();
                    self.expect(CsSyntaxKind::RParen);
                    self.finish();
                } else {
                    self.start(CsSyntaxKind::LiteralExpression);
                    self.bump();
                    self.finish();
                }
            }
            CsSyntaxKind::ThisKw => {
                self.start(CsSyntaxKind::ThisExpression);
                self.bump();
                self.finish();
            }
            CsSyntaxKind::BaseKw => {
                self.start(CsSyntaxKind::BaseExpression);
                self.bump();
                self.finish();
            }
            CsSyntaxKind::PredefinedTypeKw => {
                self.start(CsSyntaxKind::PredefinedTypeExpression);
                self.bump();
                self.finish();
            }
            CsSyntaxKind::NewKw => self.parse_new(),
            CsSyntaxKind::LParen => self.parse_parenthesized(),
            CsSyntaxKind::LBrace => self.parse_initializer(),
            CsSyntaxKind::LBracket => {
                // Collection expression
                self.start(CsSyntaxKind::InitializerExpression);
                self.bump();
                while !self.at_end() && !self.at(CsSyntaxKind::RBracket) {
                    let before = self.cur;
                    self.parse_expression();
                    if !self.eat(CsSyntaxKind::Comma) || self.cur == before {
                        break;
                    }
                }
                self.expect(CsSyntaxKind::RBracket);
                self.finish();
            }
            CsSyntaxKind::Ident
                if self.at_contextual("nameof") && self.nth(1) == CsSyntaxKind::LParen =>
            {
                self.start(CsSyntaxKind::NameofExpression);
                self.bump();
                self.parse_argument_list();
                self.finish();
            }
            CsSyntaxKind::Ident
                if matches!(self.current_text(), "typeof" | "sizeof")
                    && self.nth(1) == CsSyntaxKind::LParen =>
            {
                self.start(CsSyntaxKind::InvocationExpression);
                self.start(CsSyntaxKind::IdentifierName);
                self.bump();
                self.finish();
                self.start(CsSyntaxKind::ArgumentList);
                self.bump();
                self.start(CsSyntaxKind::Argument);
                self.parse_type();
                self.finish();
                self.expect(CsSyntaxKind::RParen);
                self.finish();
                self.finish();
            }
            CsSyntaxKind::Ident => self.parse_simple_name(),
            _ => {
                self.error_missing("expression");
                return false;
            }
        }
        true
    }

    fn parse_simple_name(&mut self) {
        self.start(CsSyntaxKind::IdentifierName);
        if self.at_contextual("global") && self.nth(1) == CsSyntaxKind::ColonColon {
            self.bump();
            self.bump();
        }
        self.expect(CsSyntaxKind::Ident);
        if self.at(CsSyntaxKind::Lt) && self.at_type_arguments_in_expression() {
            self.parse_type_argument_list();
        }
        self.finish();
    }

    fn parse_parenthesized(&mut self) {
        let checkpoint = self.checkpoint();
        self.bump();
        self.parse_tuple_element();
        let kind = if self.at(CsSyntaxKind::Comma) {
            while self.eat(CsSyntaxKind::Comma) {
                self.parse_tuple_element();
            }
            CsSyntaxKind::TupleExpression
        } else {
            CsSyntaxKind::ParenthesizedExpression
        };
        self.expect(CsSyntaxKind::RParen);
        self.builder.start_node_at(checkpoint, kind);
        self.builder.finish_node();
    }

    fn parse_tuple_element(&mut self) {
        if self.at(CsSyntaxKind::Ident) && self.nth(1) == CsSyntaxKind::Colon {
            self.start(CsSyntaxKind::Argument);
            self.start(CsSyntaxKind::NameColon);
            self.bump();
            self.bump();
            self.finish();
            self.parse_expression();
            self.finish();
        } else if self.at_declaration_expression() {
            self.parse_declaration_expression();
        } else {
            self.parse_expression();
        }
    }

    fn at_declaration_expression(&self) -> bool {
        self.scan_type(0).is_some_and(|end| {
            self.nth(end) == CsSyntaxKind::Ident
                && matches!(
                    self.nth(end + 1),
                    CsSyntaxKind::Comma | CsSyntaxKind::RParen | CsSyntaxKind::RBracket
                )
        })
    }

    fn parse_declaration_expression(&mut self) {
        self.start(CsSyntaxKind::DeclarationExpression);
        self.parse_type();
        self.expect(CsSyntaxKind::Ident);
        self.finish();
    }

    fn parse_new(&mut self) {
        let checkpoint = self.checkpoint();
        self.bump();
        let kind = match self.current() {
            CsSyntaxKind::LParen => {
                self.parse_argument_list();
                if self.at(CsSyntaxKind::LBrace) {
                    self.parse_initializer();
                }
                CsSyntaxKind::ImplicitObjectCreationExpression
            }
            CsSyntaxKind::LBracket => {
                // new[] { ... }
                self.bump();
                while self.eat(CsSyntaxKind::Comma) {}
                self.expect(CsSyntaxKind::RBracket);
                self.parse_initializer();
                CsSyntaxKind::ArrayCreationExpression
            }
            CsSyntaxKind::LBrace => {
                // Anonymous object
                self.parse_initializer();
                CsSyntaxKind::ObjectCreationExpression
            }
            _ => {
                self.parse_type_with(false, false);
                if self.at(CsSyntaxKind::LBracket) {
                    while self.at(CsSyntaxKind::LBracket) {
                        self.parse_rank_specifier();
                    }
                    if self.at(CsSyntaxKind::LBrace) {
                        self.parse_initializer();
                    }
                    CsSyntaxKind::ArrayCreationExpression
                } else {
                    if self.at(CsSyntaxKind::LParen) {
                        self.parse_argument_list();
                    }
                    if self.at(CsSyntaxKind::LBrace) {
                        self.parse_initializer();
                    }
                    CsSyntaxKind::ObjectCreationExpression
                }
            }
        };
        self.builder.start_node_at(checkpoint, kind);
        self.builder.finish_node();
    }

    /// `[expr, expr]` or `[,]` after an array element type
    fn parse_rank_specifier(&mut self) {
        self.start(CsSyntaxKind::BracketedArgumentList);
        self.bump();
        while !self.at_end() && !self.at(CsSyntaxKind::RBracket) {
            if self.eat(CsSyntaxKind::Comma) {
                continue;
            }
            let before = self.cur;
            self.parse_argument();
            if self.cur == before {
                break;
            }
        }
        self.expect(CsSyntaxKind::RBracket);
        self.finish();
    }

    fn parse_initializer(&mut self) {
        self.start(CsSyntaxKind::InitializerExpression);
        self.expect(CsSyntaxKind::LBrace);
        while !self.at_end() && !self.at(CsSyntaxKind::RBrace) {
            let before = self.cur;
            if self.at(CsSyntaxKind::LBrace) {
                self.parse_initializer();
            } else {
                self.parse_expression();
            }
            if !self.eat(CsSyntaxKind::Comma) || self.cur == before {
                break;
            }
        }
        self.expect(CsSyntaxKind::RBrace);
        self.finish();
    }

    fn parse_argument_list(&mut self) {
        self.parse_delimited_arguments(
            CsSyntaxKind::ArgumentList,
            CsSyntaxKind::LParen,
            CsSyntaxKind::RParen,
        );
    }

    fn parse_bracketed_argument_list(&mut self) {
        self.parse_delimited_arguments(
            CsSyntaxKind::BracketedArgumentList,
            CsSyntaxKind::LBracket,
            CsSyntaxKind::RBracket,
        );
    }

    fn parse_delimited_arguments(
        &mut self,
        kind: CsSyntaxKind,
        open: CsSyntaxKind,
        close: CsSyntaxKind,
    ) {
        self.start(kind);
        self.expect(open);
        if !self.at(close) {
            loop {
                self.parse_argument();
                if !self.eat(CsSyntaxKind::Comma) {
                    break;
                }
            }
        }
        self.expect(close);
        self.finish();
    }

    fn parse_argument(&mut self) {
        self.start(CsSyntaxKind::Argument);
        if self.at(CsSyntaxKind::Ident) && self.nth(1) == CsSyntaxKind::Colon {
            self.start(CsSyntaxKind::NameColon);
            self.bump();
            self.bump();
            self.finish();
        }
        let by_ref = (self.at(CsSyntaxKind::ModifierKw)
            && matches!(self.current_text(), "ref" | "out"))
            || self.at(CsSyntaxKind::InKw);
        if by_ref {
            self.bump();
        }
        if by_ref && self.at_declaration_expression() {
            self.parse_declaration_expression();
        } else {
            self.parse_expression();
        }
        self.finish();
    }

    // ------------------------------------------------------------------
    // Cursor helpers
    // ------------------------------------------------------------------

    fn at_end(&self) -> bool {
        self.cur >= self.significant.len()
    }

    fn nth(&self, n: usize) -> CsSyntaxKind {
        self.significant
            .get(self.cur + n)
            .map(|&index| self.tokens[index].kind)
            .unwrap_or(EOF)
    }

    fn nth_text(&self, n: usize) -> &str {
        self.significant
            .get(self.cur + n)
            .map(|&index| self.tokens[index].text.as_str())
            .unwrap_or("")
    }

    fn current(&self) -> CsSyntaxKind {
        self.nth(0)
    }

    fn current_text(&self) -> &str {
        self.nth_text(0)
    }

    fn at(&self, kind: CsSyntaxKind) -> bool {
        self.current() == kind
    }

    /// Identifier with the given text (contextual keyword)
    fn at_contextual(&self, word: &str) -> bool {
        self.at(CsSyntaxKind::Ident) && self.current_text() == word
    }

    /// Whether the nth significant token directly follows the previous one
    fn adjacent(&self, n: usize) -> bool {
        match (
            self.significant.get(self.cur + n - 1),
            self.significant.get(self.cur + n),
        ) {
            (Some(&previous), Some(&next)) => next == previous + 1,
            _ => false,
        }
    }

    /// Offset of the `)` matching the `(` at `offset`
    fn matching_paren(&self, offset: usize) -> Option<usize> {
        let mut depth = 0usize;
        let mut k = offset;
        loop {
            match self.nth(k) {
                CsSyntaxKind::LParen => depth += 1,
                CsSyntaxKind::RParen => {
                    depth -= 1;
                    if depth == 0 {
                        return Some(k);
                    }
                }
                EOF => return None,
                _ => {}
            }
            k += 1;
        }
    }

    /// Flush pending trivia into the currently open node
    fn eat_trivia(&mut self) {
        let target = self
            .significant
            .get(self.cur)
            .copied()
            .unwrap_or(self.tokens.len());
        while self.emitted < target {
            self.builder.add_token(&self.tokens[self.emitted]);
            self.emitted += 1;
        }
    }

    fn start(&mut self, kind: CsSyntaxKind) {
        self.eat_trivia();
        self.builder.start_node(kind);
    }

    fn finish(&mut self) {
        self.builder.finish_node();
    }

    fn checkpoint(&mut self) -> rowan::Checkpoint {
        self.eat_trivia();
        self.builder.checkpoint()
    }

    fn bump(&mut self) {
        self.eat_trivia();
        if let Some(&index) = self.significant.get(self.cur) {
            self.builder.add_token(&self.tokens[index]);
            self.emitted = index + 1;
            self.cur += 1;
        }
    }

    fn eat(&mut self, kind: CsSyntaxKind) -> bool {
        if self.at(kind) {
            self.bump();
            true
        } else {
            false
        }
    }

    /// Consume a bracketed region (`(..)`, `[..]`, `{..}`, `<..>`) as tokens
    fn bump_balanced(&mut self) {
        let (open, close) = match self.current() {
            CsSyntaxKind::LParen => (CsSyntaxKind::LParen, CsSyntaxKind::RParen),
            CsSyntaxKind::LBracket => (CsSyntaxKind::LBracket, CsSyntaxKind::RBracket),
            CsSyntaxKind::LBrace => (CsSyntaxKind::LBrace, CsSyntaxKind::RBrace),
            CsSyntaxKind::Lt => (CsSyntaxKind::Lt, CsSyntaxKind::Gt),
            _ => {
                self.bump();
                return;
            }
        };
        let mut depth = 0usize;
        while !self.at_end() {
            let kind = self.current();
            self.bump();
            if kind == open {
                depth += 1;
            } else if kind == close {
                depth -= 1;
                if depth == 0 {
                    return;
                }
            }
        }
        self.error_missing(&format!("'{}'", close.punct_text().unwrap_or("?")));
    }

    fn expect(&mut self, kind: CsSyntaxKind) {
        if !self.eat(kind) {
            let expected = match kind.punct_text() {
                Some(text) => format!("'{text}'"),
                None => format!("{kind:?}"),
            };
            self.error_missing(&expected);
        }
    }

    fn current_range(&self) -> TextRange {
        match self.significant.get(self.cur) {
            Some(&index) => {
                let span = &self.tokens[index].span;
                span_to_range(span.start, span.end)
            }
            None => span_to_range(self.source_len, self.source_len),
        }
    }

    fn error(&mut self, message: &str) {
        let range = self.current_range();
        self.errors.push(ParseError::new(
            message,
            range,
            ParseErrorKind::UnexpectedToken,
        ));
    }

    fn error_missing(&mut self, expected: &str) {
        let range = self.current_range();
        let found = if self.at_end() {
            "end of file".to_string()
        } else {
            format!("'{}'", self.current_text())
        };
        self.errors.push(ParseError::new(
            format!("expected {expected}, found {found}"),
            range,
            ParseErrorKind::MissingToken,
        ));
    }

    /// Wrap the current token in an `Error` node and move past it
    fn error_and_bump(&mut self, message: &str) {
        self.error(message);
        self.start(CsSyntaxKind::Error);
        self.bump();
        self.finish();
    }
}

/// Tokens that may begin an expression
fn can_start_expression(kind: CsSyntaxKind) -> bool {
    kind.is_literal()
        || matches!(
            kind,
            CsSyntaxKind::Ident
                | CsSyntaxKind::DefaultKw
                | CsSyntaxKind::ThisKw
                | CsSyntaxKind::BaseKw
                | CsSyntaxKind::NewKw
                | CsSyntaxKind::PredefinedTypeKw
                | CsSyntaxKind::LParen
                | CsSyntaxKind::LBracket
                | CsSyntaxKind::Bang
                | CsSyntaxKind::Tilde
                | CsSyntaxKind::Minus
                | CsSyntaxKind::Plus
                | CsSyntaxKind::PlusPlus
                | CsSyntaxKind::MinusMinus
                | CsSyntaxKind::ThrowKw
                | CsSyntaxKind::Star
                | CsSyntaxKind::Amp
                | CsSyntaxKind::CaretOp
        )
}
