//! Property tests: robustness on arbitrary input and the scope rules on
//! generated programs

use proptest::prelude::*;
use tl_analysis::{Analyzer, Document, NoopResolver, Position};

/// Fragments that exercise the lexer, the scope tree and the rules
fn fragment() -> impl Strategy<Value = &'static str> {
    prop::sample::select(vec![
        "func f(a, b: Int):", "init(x):", "class c extends D:", "enum E:", "if x:", "elif y:",
        "else:", "while true:", "for i in xs:", "try:", "catch e:", "finally:", "end", "return",
        "return 1", "break", "continue", "throw E()", "this.x = 1", "var x = [1, \"a\"]",
        "const k = 1", "k = 2", "var const z = 0", "import a.b as c", "from m import n, o as p",
        "x = 1..2", "print(\"#{x} ${y} #\")", "var m = {", "}", "\"open", "a and b or not c",
        "q = 1 / 0", "a == b", "// comment", "", "x.y(z)[0].w", "((((", "))))", "var é = \"ü\"",
        "\t\tend", ":", ".", "...", "->", "var a: Map<String, = 1",
    ])
}

fn program() -> impl Strategy<Value = String> {
    prop::collection::vec(fragment(), 0..30).prop_map(|lines| lines.join("\n"))
}

/// Wrap `body` in `depth` alternating block openers
fn nest(body: &str, depth: usize) -> String {
    let openers = ["if a:", "while b:", "for c in d:", "try:"];
    let mut lines = Vec::new();
    for level in 0..depth {
        lines.push(format!("{}{}", "    ".repeat(level + 1), openers[level % openers.len()]));
    }
    lines.push(format!("{}{}", "    ".repeat(depth + 1), body));
    for level in (0..depth).rev() {
        lines.push(format!("{}end", "    ".repeat(level + 1)));
    }
    lines.join("\n")
}

proptest! {
    #[test]
    fn analysis_never_panics(source in "\\PC*") {
        let _ = Analyzer::new().analyze(&source);
    }

    #[test]
    fn queries_never_panic(source in program(), line in 0usize..32, column in 0usize..40) {
        let analyzer = Analyzer::new();
        let document = Document::new(&source);
        let position = Position::new(line, column);
        let _ = analyzer.hover(&document, position, &NoopResolver);
        let _ = analyzer.completions(&document, position, &NoopResolver);
        let _ = analyzer.document_symbols(&document);
    }

    #[test]
    fn analysis_is_idempotent(source in program()) {
        let analyzer = Analyzer::new();
        prop_assert_eq!(analyzer.analyze(&source), analyzer.analyze(&source));
    }

    #[test]
    fn two_dot_range_always_flagged(a in 0u32..1000, b in 0u32..1000) {
        let codes: Vec<String> = Analyzer::new()
            .analyze(&format!("var r = {}..{}", a, b))
            .into_iter()
            .map(|d| d.code)
            .collect();
        prop_assert!(codes.contains(&"TL8002".to_string()));
    }

    #[test]
    fn three_dot_range_never_flagged(a in 0u32..1000, b in 0u32..1000) {
        let diagnostics = Analyzer::new()
            .analyze(&format!("for i in {}...{}:\n    print(i)\nend", a, b));
        prop_assert!(diagnostics.iter().all(|d| d.code != "TL8002"), "{:?}", diagnostics);
    }

    #[test]
    fn break_in_nested_loop_is_legal(depth in 0usize..6) {
        let source = format!("func f():\n    while go:\n{}\n    end\nend", nest(&format!("    {}", "break"), depth));
        let diagnostics = Analyzer::new().analyze(&source);
        prop_assert!(diagnostics.iter().all(|d| d.code != "TL4003"), "{}\n{:?}", source, diagnostics);
    }

    #[test]
    fn this_in_method_is_legal(depth in 0usize..4) {
        let source = format!(
            "class Box:\n    func get():\n{}\n    end\nend",
            nest("    print(this)", depth)
        );
        let diagnostics = Analyzer::new().analyze(&source);
        prop_assert!(diagnostics.iter().all(|d| d.code != "TL4001"), "{}\n{:?}", source, diagnostics);
    }
}

#[test]
fn break_directly_in_function_body_is_flagged() {
    let diagnostics = Analyzer::new().analyze("func f():\n    break\nend");
    assert_eq!(
        diagnostics.iter().filter(|d| d.code == "TL4003").count(),
        1
    );
}

#[test]
fn top_level_this_is_flagged() {
    let diagnostics = Analyzer::new().analyze("var me = this");
    assert!(diagnostics.iter().any(|d| d.code == "TL4001"));
}
