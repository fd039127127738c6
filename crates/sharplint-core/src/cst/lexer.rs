//! CST-aware lexer that preserves all trivia (whitespace, comments)
//!
//! Every byte of the input ends up in exactly one token, which is what makes
//! `parse(source).text() == source` hold.

use crate::cst::CsSyntaxKind;
use std::ops::Range;

/// Simple span representing a range in the source
pub type CstSpan = Range<usize>;

/// A lexer error
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LexerError {
    pub message: String,
    pub span: CstSpan,
}

impl LexerError {
    pub fn new(message: impl Into<String>, span: CstSpan) -> Self {
        Self {
            message: message.into(),
            span,
        }
    }
}

/// A token with its syntax kind and span
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CstToken {
    pub kind: CsSyntaxKind,
    pub text: String,
    pub span: CstSpan,
}

impl CstToken {
    pub fn new(kind: CsSyntaxKind, text: impl Into<String>, span: CstSpan) -> Self {
        Self {
            kind,
            text: text.into(),
            span,
        }
    }
}

/// Result returned by the CST lexer
pub type CstLexResult = (Vec<CstToken>, Vec<LexerError>);

/// Lex input preserving ALL trivia for CST construction
///
/// - whitespace, newlines and comments become trivia tokens
/// - `#` directives at the start of a line become a single `Preprocessor` token
/// - unknown characters become `Error` tokens and a `LexerError`
pub fn lex_with_trivia(input: &str) -> CstLexResult {
    let mut lexer = Lexer::new(input);
    lexer.run();
    (lexer.tokens, lexer.errors)
}

struct Lexer<'a> {
    input: &'a str,
    pos: usize,
    tokens: Vec<CstToken>,
    errors: Vec<LexerError>,
    /// True while only trivia has been seen on the current line
    at_line_start: bool,
}

impl<'a> Lexer<'a> {
    fn new(input: &'a str) -> Self {
        Self {
            input,
            pos: 0,
            tokens: Vec::new(),
            errors: Vec::new(),
            at_line_start: true,
        }
    }

    fn run(&mut self) {
        while let Some(current) = self.peek() {
            let start = self.pos;
            let kind = self.lex_token(current);
            if self.pos == start {
                // Never stall: consume at least one character
                self.bump_char();
            }
            self.push(kind, start);
        }
    }

    fn lex_token(&mut self, current: char) -> CsSyntaxKind {
        let start = self.pos;
        match current {
            '\n' => {
                self.bump_char();
                self.at_line_start = true;
                CsSyntaxKind::Newline
            }
            '\r' => {
                self.bump_char();
                if self.peek() == Some('\n') {
                    self.bump_char();
                }
                self.at_line_start = true;
                CsSyntaxKind::Newline
            }
            c if c.is_whitespace() => {
                self.eat_while(|c| c.is_whitespace() && c != '\n' && c != '\r');
                CsSyntaxKind::Whitespace
            }
            '/' if self.peek_nth(1) == Some('/') => {
                self.eat_while(|c| c != '\n' && c != '\r');
                CsSyntaxKind::CommentLine
            }
            '/' if self.peek_nth(1) == Some('*') => {
                self.pos += 2;
                match self.rest().find("*/") {
                    Some(end) => self.pos += end + 2,
                    None => {
                        self.pos = self.input.len();
                        self.error("Unterminated block comment", start);
                    }
                }
                CsSyntaxKind::CommentBlock
            }
            '#' if self.at_line_start => {
                self.eat_while(|c| c != '\n' && c != '\r');
                CsSyntaxKind::Preprocessor
            }
            '"' => self.lex_quoted(start),
            '\'' => self.lex_char_literal(start),
            '@' => self.lex_at(start),
            '$' => self.lex_dollar(start),
            c if is_ident_start(c) => {
                self.eat_while(is_ident_continue);
                CsSyntaxKind::from_keyword(&self.input[start..self.pos])
                    .unwrap_or(CsSyntaxKind::Ident)
            }
            c if c.is_ascii_digit() => self.lex_number(),
            '.' if self.peek_nth(1).is_some_and(|c| c.is_ascii_digit()) => self.lex_number(),
            _ => self.lex_punct(start),
        }
    }

    fn push(&mut self, kind: CsSyntaxKind, start: usize) {
        if !kind.is_trivia() {
            self.at_line_start = false;
        }
        let text = &self.input[start..self.pos];
        self.tokens
            .push(CstToken::new(kind, text, start..self.pos));
    }

    fn error(&mut self, message: &str, start: usize) {
        self.errors
            .push(LexerError::new(message, start..self.pos.max(start + 1)));
    }

    fn rest(&self) -> &'a str {
        &self.input[self.pos..]
    }

    fn peek(&self) -> Option<char> {
        self.rest().chars().next()
    }

    fn peek_nth(&self, n: usize) -> Option<char> {
        self.rest().chars().nth(n)
    }

    fn bump_char(&mut self) {
        if let Some(c) = self.peek() {
            self.pos += c.len_utf8();
        }
    }

    fn eat_while(&mut self, predicate: impl Fn(char) -> bool) {
        while let Some(c) = self.peek() {
            if !predicate(c) {
                break;
            }
            self.pos += c.len_utf8();
        }
    }

    /// Count consecutive `"` characters at the cursor
    fn quote_run(&self) -> usize {
        self.rest().bytes().take_while(|b| *b == b'"').count()
    }

    /// Lex a string starting at `"`: regular or raw
    fn lex_quoted(&mut self, start: usize) -> CsSyntaxKind {
        if self.quote_run() >= 3 {
            self.lex_raw_body(start);
            return CsSyntaxKind::RawStringLit;
        }
        self.lex_regular_body(start);
        CsSyntaxKind::StringLit
    }

    /// Regular string body: `\` escapes, terminated by `"` or end of line
    fn lex_regular_body(&mut self, start: usize) {
        self.bump_char(); // opening quote
        loop {
            match self.peek() {
                Some('"') => {
                    self.bump_char();
                    return;
                }
                Some('\\') => {
                    self.bump_char();
                    if matches!(self.peek(), Some(c) if c != '\n' && c != '\r') {
                        self.bump_char();
                    }
                }
                Some('\n') | Some('\r') | None => {
                    self.error("Unterminated string literal", start);
                    return;
                }
                Some(_) => self.bump_char(),
            }
        }
    }

    /// Verbatim string body: `""` escapes, may span lines
    fn lex_verbatim_body(&mut self, start: usize) {
        self.bump_char(); // opening quote
        loop {
            match self.peek() {
                Some('"') if self.peek_nth(1) == Some('"') => self.pos += 2,
                Some('"') => {
                    self.bump_char();
                    return;
                }
                None => {
                    self.error("Unterminated verbatim string literal", start);
                    return;
                }
                Some(_) => self.bump_char(),
            }
        }
    }

    /// Raw string body: N quotes open, the next run of at least N quotes closes
    fn lex_raw_body(&mut self, start: usize) {
        let open = self.quote_run();
        self.pos += open;
        loop {
            match self.peek() {
                Some('"') => {
                    let run = self.quote_run();
                    self.pos += run;
                    if run >= open {
                        return;
                    }
                }
                None => {
                    self.error("Unterminated raw string literal", start);
                    return;
                }
                Some(_) => self.bump_char(),
            }
        }
    }

    /// Interpolated body: tracks `{ }` holes so quotes inside holes do not close
    fn lex_interpolated_body(&mut self, start: usize, verbatim: bool) {
        self.bump_char(); // opening quote
        let mut depth = 0usize;
        loop {
            match self.peek() {
                None => {
                    self.error("Unterminated interpolated string literal", start);
                    return;
                }
                Some('{') if depth == 0 && self.peek_nth(1) == Some('{') => self.pos += 2,
                Some('}') if depth == 0 && self.peek_nth(1) == Some('}') => self.pos += 2,
                Some('{') => {
                    depth += 1;
                    self.bump_char();
                }
                Some('}') => {
                    depth = depth.saturating_sub(1);
                    self.bump_char();
                }
                Some('"') if depth > 0 => {
                    // Nested string inside a hole
                    let nested = self.pos;
                    self.lex_regular_body(nested);
                }
                Some('"') if verbatim && self.peek_nth(1) == Some('"') => self.pos += 2,
                Some('"') => {
                    self.bump_char();
                    return;
                }
                Some('\\') if !verbatim && depth == 0 => {
                    self.bump_char();
                    self.bump_char();
                }
                Some('\n') | Some('\r') if !verbatim && depth == 0 => {
                    self.error("Unterminated interpolated string literal", start);
                    return;
                }
                Some(_) => self.bump_char(),
            }
        }
    }

    fn lex_char_literal(&mut self, start: usize) -> CsSyntaxKind {
        self.bump_char(); // opening quote
        loop {
            match self.peek() {
                Some('\'') => {
                    self.bump_char();
                    break;
                }
                Some('\\') => {
                    self.bump_char();
                    self.bump_char();
                }
                Some('\n') | Some('\r') | None => {
                    self.error("Unterminated character literal", start);
                    break;
                }
                Some(_) => self.bump_char(),
            }
        }
        CsSyntaxKind::CharLit
    }

    /// `@ident`, `@"..."`, `@$"..."`
    fn lex_at(&mut self, start: usize) -> CsSyntaxKind {
        match (self.peek_nth(1), self.peek_nth(2)) {
            (Some('"'), _) => {
                self.bump_char();
                self.lex_verbatim_body(start);
                CsSyntaxKind::VerbatimStringLit
            }
            (Some('$'), Some('"')) => {
                self.pos += 2;
                self.lex_interpolated_body(start, true);
                CsSyntaxKind::InterpolatedStringLit
            }
            (Some(c), _) if is_ident_start(c) => {
                self.bump_char();
                self.eat_while(is_ident_continue);
                // Verbatim identifiers are never keywords
                CsSyntaxKind::Ident
            }
            _ => {
                self.bump_char();
                self.error("Unexpected character '@'", start);
                CsSyntaxKind::Error
            }
        }
    }

    /// `$"..."`, `$@"..."`, `$"""..."""`, `$$"""..."""`
    fn lex_dollar(&mut self, start: usize) -> CsSyntaxKind {
        let dollars = self.rest().bytes().take_while(|b| *b == b'$').count();
        self.pos += dollars;
        match self.peek() {
            Some('"') if self.quote_run() >= 3 => {
                self.lex_raw_body(start);
                CsSyntaxKind::InterpolatedStringLit
            }
            Some('"') => {
                self.lex_interpolated_body(start, false);
                CsSyntaxKind::InterpolatedStringLit
            }
            Some('@') if self.peek_nth(1) == Some('"') => {
                self.bump_char();
                self.lex_interpolated_body(start, true);
                CsSyntaxKind::InterpolatedStringLit
            }
            _ => {
                self.error("Unexpected character '$'", start);
                CsSyntaxKind::Error
            }
        }
    }

    fn lex_number(&mut self) -> CsSyntaxKind {
        loop {
            match self.peek() {
                Some(c) if c.is_ascii_alphanumeric() || c == '_' => {
                    let exponent = matches!(c, 'e' | 'E');
                    self.bump_char();
                    if exponent && matches!(self.peek(), Some('+') | Some('-')) {
                        self.bump_char();
                    }
                }
                Some('.') if self.peek_nth(1).is_some_and(|c| c.is_ascii_digit()) => {
                    self.bump_char();
                }
                _ => break,
            }
        }
        CsSyntaxKind::NumberLit
    }

    fn lex_punct(&mut self, start: usize) -> CsSyntaxKind {
        let rest = self.rest();
        const THREE: [&str; 3] = ["<<=", ">>=", "??="];
        if THREE.iter().any(|op| rest.starts_with(op)) {
            self.pos += 3;
            return CsSyntaxKind::AssignOp;
        }

        let two = rest.get(..2).unwrap_or("");
        let kind = match two {
            "==" => Some(CsSyntaxKind::EqEq),
            "!=" => Some(CsSyntaxKind::BangEq),
            "<=" => Some(CsSyntaxKind::LtEq),
            ">=" => Some(CsSyntaxKind::GtEq),
            "&&" => Some(CsSyntaxKind::AmpAmp),
            "||" => Some(CsSyntaxKind::PipePipe),
            "++" => Some(CsSyntaxKind::PlusPlus),
            "--" => Some(CsSyntaxKind::MinusMinus),
            "=>" => Some(CsSyntaxKind::FatArrow),
            "::" => Some(CsSyntaxKind::ColonColon),
            "??" => Some(CsSyntaxKind::QuestionQuestion),
            "+=" | "-=" | "*=" | "/=" | "%=" | "&=" | "|=" | "^=" => Some(CsSyntaxKind::AssignOp),
            "?." if !rest[2..].starts_with(|c: char| c.is_ascii_digit()) => {
                Some(CsSyntaxKind::QuestionDot)
            }
            _ => None,
        };
        if let Some(kind) = kind {
            self.pos += 2;
            return kind;
        }

        let Some(current) = self.peek() else {
            return CsSyntaxKind::Error;
        };
        self.bump_char();
        match current {
            '{' => CsSyntaxKind::LBrace,
            '}' => CsSyntaxKind::RBrace,
            '(' => CsSyntaxKind::LParen,
            ')' => CsSyntaxKind::RParen,
            '[' => CsSyntaxKind::LBracket,
            ']' => CsSyntaxKind::RBracket,
            ';' => CsSyntaxKind::Semicolon,
            ',' => CsSyntaxKind::Comma,
            '.' => CsSyntaxKind::Dot,
            ':' => CsSyntaxKind::Colon,
            '?' => CsSyntaxKind::Question,
            '=' => CsSyntaxKind::Eq,
            '<' => CsSyntaxKind::Lt,
            '>' => CsSyntaxKind::Gt,
            '+' => CsSyntaxKind::Plus,
            '-' => CsSyntaxKind::Minus,
            '*' => CsSyntaxKind::Star,
            '/' => CsSyntaxKind::Slash,
            '%' => CsSyntaxKind::Percent,
            '!' => CsSyntaxKind::Bang,
            '~' => CsSyntaxKind::Tilde,
            '&' => CsSyntaxKind::Amp,
            '|' => CsSyntaxKind::Pipe,
            '^' => CsSyntaxKind::CaretOp,
            other => {
                self.error(&format!("Unexpected character '{other}'"), start);
                CsSyntaxKind::Error
            }
        }
    }
}

fn is_ident_start(c: char) -> bool {
    c == '_' || c.is_alphabetic()
}

fn is_ident_continue(c: char) -> bool {
    c == '_' || c.is_alphanumeric()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(input: &str) -> Vec<CsSyntaxKind> {
        let (tokens, errors) = lex_with_trivia(input);
        assert!(errors.is_empty(), "unexpected errors: {errors:?}");
        tokens
            .into_iter()
            .filter(|t| !t.kind.is_trivia())
            .map(|t| t.kind)
            .collect()
    }

    fn assert_lossless(input: &str) {
        let (tokens, _) = lex_with_trivia(input);
        let rebuilt: String = tokens.iter().map(|t| t.text.as_str()).collect();
        assert_eq!(rebuilt, input);
    }

    #[test]
    fn test_guard_clause_tokens() {
        use CsSyntaxKind::*;
        assert_eq!(
            kinds(r#"if (p == null) throw new ArgumentNullException("p");"#),
            vec![
                IfKw, LParen, Ident, EqEq, NullKw, RParen, ThrowKw, NewKw, Ident, LParen,
                StringLit, RParen, Semicolon
            ]
        );
    }

    #[test]
    fn test_trivia_preserved() {
        let input = "int x; // trailing\r\n/* block */\n  #region Foo\nx++;";
        assert_lossless(input);
        let (tokens, _) = lex_with_trivia(input);
        let trivia: Vec<_> = tokens
            .iter()
            .filter(|t| t.kind.is_trivia())
            .map(|t| t.kind)
            .collect();
        assert!(trivia.contains(&CsSyntaxKind::CommentLine));
        assert!(trivia.contains(&CsSyntaxKind::CommentBlock));
        assert!(trivia.contains(&CsSyntaxKind::Preprocessor));
        assert_eq!(
            tokens
                .iter()
                .find(|t| t.kind == CsSyntaxKind::Newline)
                .map(|t| t.text.as_str()),
            Some("\r\n")
        );
    }

    #[test]
    fn test_string_flavours() {
        use CsSyntaxKind::*;
        assert_eq!(kinds(r#""a\"b""#), vec![StringLit]);
        assert_eq!(kinds(r#"@"C:\dir""x""#), vec![VerbatimStringLit]);
        assert_eq!(kinds(r#"$"{a} and {"b"}""#), vec![InterpolatedStringLit]);
        assert_eq!(kinds(r#"$@"{a}""#), vec![InterpolatedStringLit]);
        assert_eq!(kinds(r#"@$"{a}""#), vec![InterpolatedStringLit]);
        assert_eq!(kinds("\"\"\"raw \"quoted\" text\"\"\""), vec![RawStringLit]);
        assert_eq!(kinds(r"'\n'"), vec![CharLit]);
    }

    #[test]
    fn test_verbatim_identifier_is_not_keyword() {
        let (tokens, _) = lex_with_trivia("@class class");
        assert_eq!(tokens[0].kind, CsSyntaxKind::Ident);
        assert_eq!(tokens[0].text, "@class");
        assert_eq!(tokens[2].kind, CsSyntaxKind::ClassKw);
    }

    #[test]
    fn test_operators() {
        use CsSyntaxKind::*;
        assert_eq!(
            kinds("a ??= b?.c ?? d => e != f"),
            vec![
                Ident, AssignOp, Ident, QuestionDot, Ident, QuestionQuestion, Ident, FatArrow,
                Ident, BangEq, Ident
            ]
        );
        // Generic closers stay separate
        assert_eq!(kinds(">>"), vec![Gt, Gt]);
    }

    #[test]
    fn test_numbers() {
        use CsSyntaxKind::*;
        assert_eq!(kinds("1.5e+3f 0xFF_FF 42UL .5"), vec![NumberLit; 4]);
        assert_eq!(kinds("a.b"), vec![Ident, Dot, Ident]);
    }

    #[test]
    fn test_unterminated_string_reports_error() {
        let (tokens, errors) = lex_with_trivia("\"abc\nnext");
        assert_eq!(errors.len(), 1);
        assert_eq!(tokens[0].kind, CsSyntaxKind::StringLit);
        assert_lossless("\"abc\nnext");
    }

    #[test]
    fn test_unknown_character() {
        let (tokens, errors) = lex_with_trivia("a ` b");
        assert_eq!(errors.len(), 1);
        assert!(tokens.iter().any(|t| t.kind == CsSyntaxKind::Error));
    }

    #[test]
    fn test_hash_mid_line_is_not_directive() {
        let (tokens, errors) = lex_with_trivia("x #y");
        assert!(!errors.is_empty());
        assert!(!tokens.iter().any(|t| t.kind == CsSyntaxKind::Preprocessor));
    }
}
