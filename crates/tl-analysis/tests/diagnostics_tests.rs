//! End-to-end diagnostics through `Analyzer::analyze`

use pretty_assertions::assert_eq;
use rstest::rstest;
use tl_analysis::{AnalysisOptions, Analyzer, Diagnostic, ScopeStrategy, Severity};

fn analyze(source: &str) -> Vec<Diagnostic> {
    Analyzer::new().analyze(source)
}

fn codes(source: &str) -> Vec<String> {
    analyze(source).into_iter().map(|d| d.code).collect()
}

const CLEAN_PROGRAM: &str = "\
// Shapes.
class Circle:
    var radius: Float = 1.0
    func area() -> Float:
        return this.radius * this.radius * 3.14
    end
end

func total(items: Array<Circle>) -> Float:
    var sum = 0.0
    for c in items:
        sum += c.area()
    end
    return sum
end

const shapes = [Circle(), Circle()]
print(\"total: #{total(shapes)}\")
";

#[test]
fn test_clean_program_has_no_diagnostics() {
    assert_eq!(analyze(CLEAN_PROGRAM), Vec::<Diagnostic>::new());
}

#[rstest]
#[case::unterminated_string("print(\"oops)", "TL1001")]
#[case::unmatched_brace("var m = 1 }", "TL1002")]
#[case::missing_end("func f():\n    print(1)\n", "TL1003")]
#[case::class_case("class point:\nend", "TL2001")]
#[case::stacked("var const x = 1", "TL3001")]
#[case::duplicate("var a = 1\nvar a = 2", "TL3002")]
#[case::const_reassign("const a = 1\na = 2", "TL3003")]
#[case::top_level_this("print(this)", "TL4001")]
#[case::top_level_return("return 1", "TL4002")]
#[case::break_outside_loop("func f():\n    break\nend", "TL4003")]
#[case::untyped_param("func f(x):\nend", "TL5001")]
#[case::unused_import("import util.text", "TL5002")]
#[case::unreachable("func f():\n    return 1\n    print(2)\nend", "TL6001")]
#[case::unreachable_at_file_scope("throw Error()\nprint(1)", "TL6001")]
#[case::assignment_mismatch("var n: Int = \"one\"", "TL7001")]
#[case::comparison_mismatch("var a = 1\nvar b = \"b\"\nprint(a == b)", "TL7002")]
#[case::division_by_zero("var q = 1 / 0", "TL7003")]
#[case::word_operator("var ok = a and b", "TL8001")]
#[case::two_dot_range("var r = 1..5", "TL8002")]
#[case::dollar_interpolation("print(\"${name}\")", "TL8003")]
#[case::bare_hash("print(\"#1\")", "TL8004")]
fn test_rule_fires(#[case] source: &str, #[case] code: &str) {
    let found = codes(source);
    assert!(found.iter().any(|c| c == code), "{code} not in {found:?}");
}

#[rstest]
#[case::braces_across_lines("var m = {\n    \"a\": 1\n}")]
#[case::comment_mentions("// return break this 1..2 and\nvar x = 1")]
#[case::string_mentions("print(\"return break this 1..2 and\")")]
#[case::nested_function_return("func outer():\n    func inner() -> Int:\n        return 1\n    end\n    return inner()\nend")]
#[case::loop_inside_function("func f(xs: Array<Int>):\n    for x in xs:\n        if x > 1:\n            break\n        end\n    end\nend")]
#[case::generic_parameter("func f(m: Map<String, Int>, n: Int):\n    print(n)\nend")]
#[case::three_dot_range("for i in 1...5:\n    print(i)\nend")]
fn test_clean_snippets(#[case] source: &str) {
    assert_eq!(codes(source), Vec::<String>::new());
}

#[test]
fn test_const_reassignment_reports_once_with_declaration_line() {
    let diagnostics = analyze("const limit = 10\nprint(limit)\nlimit = 20");
    assert_eq!(diagnostics.len(), 1);
    let diag = &diagnostics[0];
    assert_eq!(diag.code, "TL3003");
    assert_eq!(diag.severity, Severity::Error);
    assert_eq!(diag.range.line, 2);
    assert!(diag.message.contains("line 1"), "{}", diag.message);
}

#[test]
fn test_scope_strategies_agree_on_simple_code() {
    let source = "\
func f():
    while true:
        break
    end
    continue
end
print(this)";
    let tree = Analyzer::new().analyze(source);
    let scan = Analyzer::new()
        .with_options(AnalysisOptions {
            scope_strategy: ScopeStrategy::BackwardScan,
            ..Default::default()
        })
        .analyze(source);
    assert_eq!(tree, scan);
    assert_eq!(
        tree.iter().map(|d| d.code.as_str()).collect::<Vec<_>>(),
        vec!["TL4003", "TL4001"]
    );
}

#[test]
fn test_human_rendering() {
    let rendered: Vec<String> = analyze("var r = 1..5\nprint(\"${r}\")")
        .iter()
        .map(|d| d.to_human_string("main.tl"))
        .collect();
    insta::assert_snapshot!(rendered.join("\n"), @r"
    main.tl:1:10: error[TL8002]: '..' is not a range operator in TL
       = help: use '...'
    main.tl:2:8: error[TL8003]: '${' does not interpolate in TL strings
       = help: use '#{'
    ");
}
