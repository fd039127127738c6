//! Tests for the C# CST: losslessness, tree shape and error recovery

use super::ast::{AstNode, IfStatement, ObjectCreationExpression, ThrowStatement};
use super::*;
use std::fmt::Write;

/// Indented `Kind@range` dump with token texts
fn dump(node: &CsSyntaxNode) -> String {
    let mut out = String::new();
    let mut depth = 0usize;
    for event in node.preorder_with_tokens() {
        match event {
            WalkEvent::Enter(NodeOrToken::Node(n)) => {
                let _ = writeln!(out, "{}{:?}@{:?}", "  ".repeat(depth), n.kind(), n.text_range());
                depth += 1;
            }
            WalkEvent::Enter(NodeOrToken::Token(t)) => {
                let _ = writeln!(
                    out,
                    "{}{:?}@{:?} {:?}",
                    "  ".repeat(depth),
                    t.kind(),
                    t.text_range(),
                    t.text()
                );
            }
            WalkEvent::Leave(NodeOrToken::Node(_)) => depth -= 1,
            WalkEvent::Leave(NodeOrToken::Token(_)) => {}
        }
    }
    out
}

const GUARDS: &str = r#"using System;
using System.Collections.Generic;

namespace Sample.Guards
{
    /// <summary>Guarded service</summary>
    public sealed class Service : IDisposable
    {
        private readonly List<string> _items = new List<string>();
        private static int s_count;

        public Service(string name, int size = 4)
        {
            if (name == null) throw new ArgumentNullException("name");
            if (null == size.ToString()) throw new ArgumentException(@"size", "size is bad");
            Name = name;
        }

        public string Name { get; private set; }

        public int Count => _items.Count;

        public void Add(string item, string @class)
        {
            if (item == null)
            {
                throw new ArgumentNullException("item", "item cannot be null!");
            }
            else
            {
                _items.Add(item);
            }

            foreach (var existing in _items)
            {
                if (existing.Length > 10 && !existing.StartsWith("x")) continue;
            }

            for (int i = 0; i < _items.Count; i++)
            {
                s_count += i * 2;
            }

            try
            {
                var value = item is string s ? s : (string)null;
            }
            catch (InvalidOperationException ex) when (ex.Message != null)
            {
                throw;
            }
            finally
            {
                s_count--;
            }
        }

        public void Dispose() { }
    }
}
"#;

#[test]
fn guard_statement_tree() {
    let parse = parse_csharp("if (p == null) throw e;");
    assert!(!parse.has_errors(), "{:?}", parse.errors());
    insta::assert_snapshot!(dump(&parse.syntax()), @r#"
    CompilationUnit@0..23
      IfStatement@0..23
        IfKw@0..2 "if"
        Whitespace@2..3 " "
        LParen@3..4 "("
        BinaryExpression@4..13
          IdentifierName@4..5
            Ident@4..5 "p"
          Whitespace@5..6 " "
          EqEq@6..8 "=="
          Whitespace@8..9 " "
          LiteralExpression@9..13
            NullKw@9..13 "null"
        RParen@13..14 ")"
        Whitespace@14..15 " "
        ThrowStatement@15..23
          ThrowKw@15..20 "throw"
          Whitespace@20..21 " "
          IdentifierName@21..22
            Ident@21..22 "e"
          Semicolon@22..23 ";"
    "#);
}

#[test]
fn sample_file_is_lossless_and_error_free() {
    let parse = parse_csharp(GUARDS);
    assert!(!parse.has_errors(), "{:?}", parse.errors());
    assert_eq!(parse.syntax().text().to_string(), GUARDS);
}

#[test]
fn sample_file_exposes_guards() {
    let root = parse_csharp(GUARDS).syntax();
    let throws: Vec<ThrowStatement> = root.descendants().filter_map(ThrowStatement::cast).collect();
    assert_eq!(throws.len(), 4);

    let creations: Vec<ObjectCreationExpression> = throws
        .iter()
        .filter_map(|t| t.expression())
        .filter_map(ObjectCreationExpression::cast)
        .collect();
    assert_eq!(creations.len(), 3);
    assert_eq!(creations[2].arguments().len(), 2);
    assert_eq!(
        creations[0].type_ref().unwrap().segments(),
        vec!["ArgumentNullException".to_string()]
    );

    let guard = root.descendants().find_map(IfStatement::cast).unwrap();
    assert_eq!(guard.condition().unwrap().text().to_string(), "name == null");
    assert_eq!(
        guard.then_statement().unwrap().kind(),
        CsSyntaxKind::ThrowStatement
    );
}

#[test]
fn expression_ranges_exclude_trivia() {
    let root = parse_csharp(GUARDS).syntax();
    for node in root.descendants().filter(|n| n.kind().is_expression()) {
        let first = node.first_token().unwrap();
        let last = node.last_token().unwrap();
        assert!(!first.kind().is_trivia(), "{:?} starts with trivia", node);
        assert!(!last.kind().is_trivia(), "{:?} ends with trivia", node);
    }
}

#[test]
fn broken_input_recovers_losslessly() {
    let inputs = [
        "class { void ( }",
        "namespace N { class C { void M() { if (x == ) throw new; } } }",
        "}}}{{{",
        "using ;\n#if DEBUG\nclass C { int x = ; }\n#endif",
        "class C { void M() { var s = \"unterminated; } }",
        "€ class C { }",
        "",
    ];
    for input in inputs {
        let parse = parse_csharp(input);
        assert_eq!(parse.syntax().text().to_string(), input);
        if !input.is_empty() && input != "}}}{{{" {
            assert!(parse.has_errors(), "expected errors for {input:?}");
        }
    }
}

#[test]
fn various_constructs_are_lossless() {
    let source = r#"
global using static System.Math;
namespace App;
file record struct Point(int X, int Y);
enum Color { Red = 1, Green }
interface IShape<T> where T : class { T Area(); }
static class Ext
{
    public static async Task<int> RunAsync(this string s, CancellationToken ct = default)
    {
        await Task.Delay(10, ct);
        var list = new[] { 1, 2, 3 };
        var dict = new Dictionary<string, int> { ["a"] = 1 };
        int[] arr = [1, .. list];
        Func<int, int> f = x => x + 1;
        var t = (a: 1, b: "two");
        var r = s switch { null => 0, { Length: > 3 } => 1, _ => 2 };
        lock (list) { }
        using (var d = new Disposable()) { }
        switch (s) { case "a": case "b": break; default: return -1; }
        do { } while (false);
        string? maybe = s?.Trim() ?? throw new ArgumentNullException(nameof(s));
        return checked(list.Length << 2) >> 1;
    }
}
"#;
    let parse = parse_csharp(source);
    assert_eq!(parse.syntax().text().to_string(), source);
}

#[test]
fn nested_nodes_close_inside_their_parents() {
    let source = "class C { void M(string p) { if (p == null) throw new E(\"p\"); } }\n";
    let parse = parse_csharp(source);
    let root = parse.syntax();
    assert!(!parse.has_errors());
    assert_eq!(root.kind(), CsSyntaxKind::CompilationUnit);
    assert_eq!(
        root.descendants()
            .filter(|n| n.kind() == CsSyntaxKind::CompilationUnit)
            .count(),
        1
    );

    let throw = root.descendants().find_map(ThrowStatement::cast).unwrap();
    let kinds: Vec<CsSyntaxKind> = throw.syntax().ancestors().map(|n| n.kind()).collect();
    assert_eq!(kinds.first(), Some(&CsSyntaxKind::ThrowStatement));
    assert_eq!(kinds.last(), Some(&CsSyntaxKind::CompilationUnit));
    assert!(kinds.contains(&CsSyntaxKind::MethodDeclaration));

    let method = throw
        .syntax()
        .ancestors()
        .find(|n| n.kind() == CsSyntaxKind::MethodDeclaration)
        .unwrap();
    assert!(method.text_range().contains_range(throw.syntax().text_range()));
    assert!(method.text().to_string().ends_with('}'));
}
