//! Integration tests for the `tl` binary

use assert_cmd::prelude::*;
use predicates::prelude::*;
use std::fs;
use std::path::Path;
use std::process::Command;
use tempfile::TempDir;

const AREA: &str = "\
// Area of a circle.
func area(r: Float) -> Float:
    return r * r * math.PI
end
var total = area(2.0)
";

/// `tl` running inside `dir`, isolated from the caller's config and env
fn tl_cmd(dir: &Path) -> Command {
    let mut cmd = Command::cargo_bin("tl").unwrap();
    cmd.current_dir(dir)
        .env("HOME", dir)
        .env("NO_COLOR", "1")
        .env_remove("TL_JSON")
        .env_remove("TL_LOG")
        .env_remove("TL_DISABLED_RULES")
        .env_remove("TL_SCOPE_STRATEGY")
        .env_remove("TL_MAX_DIAGNOSTICS");
    cmd
}

fn workspace(files: &[(&str, &str)]) -> TempDir {
    let dir = TempDir::new().unwrap();
    for (name, text) in files {
        let path = dir.path().join(name);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, text).unwrap();
    }
    dir
}

fn stdout_of(cmd: &mut Command) -> String {
    String::from_utf8(cmd.output().unwrap().stdout).unwrap()
}

mod check {
    use super::*;

    #[test]
    fn test_clean_file_passes() {
        let dir = workspace(&[("main.tl", AREA)]);
        tl_cmd(dir.path())
            .args(["check", "main.tl"])
            .assert()
            .success()
            .stdout(predicate::str::contains("1 file checked: no problems found"));
    }

    #[test]
    fn test_errors_fail_with_human_output() {
        let dir = workspace(&[("main.tl", "var r = 1..5\nprint(\"${r}\")\n")]);
        tl_cmd(dir.path())
            .args(["check", "main.tl", "--no-color"])
            .assert()
            .failure()
            .code(1);

        let output = stdout_of(tl_cmd(dir.path()).args(["check", "main.tl", "--no-color"]));
        insta::assert_snapshot!(output, @r"
        main.tl:1:10: error[TL8002]: '..' is not a range operator in TL
           = help: use '...'
        main.tl:2:8: error[TL8003]: '${' does not interpolate in TL strings
           = help: use '#{'
        ✗ 1 file checked: 2 errors, 0 warnings
        ");
    }

    #[test]
    fn test_directories_are_walked() {
        let dir = workspace(&[
            ("src/a.tl", "var a = 1\n"),
            ("src/lib/b.tl", "var r = 1..5\n"),
            ("src/readme.md", "var r = 1..5\n"),
        ]);
        tl_cmd(dir.path())
            .args(["check", "src"])
            .assert()
            .failure()
            .stdout(predicate::str::contains("b.tl:1:10: error[TL8002]"))
            .stdout(predicate::str::contains("2 files checked"))
            .stdout(predicate::str::contains("readme").not());
    }

    #[test]
    fn test_deny_warnings() {
        let dir = workspace(&[("main.tl", "class point:\nend\n")]);
        tl_cmd(dir.path())
            .args(["check", "main.tl"])
            .assert()
            .success()
            .stdout(predicate::str::contains("warning[TL2001]"));
        tl_cmd(dir.path())
            .args(["check", "main.tl", "--deny-warnings"])
            .assert()
            .failure();
    }

    #[test]
    fn test_disable_flag_and_project_config() {
        let dir = workspace(&[
            ("main.tl", "var r = 1..5\nclass point:\nend\n"),
            ("tl.toml", "[analysis]\ndisabled_rules = [\"TL2001\"]\n"),
        ]);
        tl_cmd(dir.path())
            .args(["check", "main.tl", "--deny-warnings", "--disable", "TL8002"])
            .assert()
            .success();
    }

    #[test]
    fn test_json_output() {
        let dir = workspace(&[("main.tl", "var r = 1..5\n")]);
        let output = stdout_of(tl_cmd(dir.path()).args(["check", "main.tl", "--json"]));
        let value: serde_json::Value = serde_json::from_str(&output).unwrap();

        assert_eq!(value["summary"]["files"], 1);
        assert_eq!(value["summary"]["errors"], 1);
        let diag = &value["files"][0]["diagnostics"][0];
        assert_eq!(value["files"][0]["file"], "main.tl");
        assert_eq!(diag["code"], "TL8002");
        assert_eq!(diag["severity"], "error");
        assert_eq!(diag["range"]["start"], 9);
    }

    #[test]
    fn test_missing_path() {
        let dir = workspace(&[]);
        tl_cmd(dir.path())
            .args(["check", "absent"])
            .assert()
            .failure()
            .stderr(predicate::str::contains("Path not found"));
    }

    #[test]
    fn test_invalid_config_is_reported() {
        let dir = workspace(&[
            ("main.tl", AREA),
            ("tl.toml", "[analysis]\nscope_strategy = \"sideways\"\n"),
        ]);
        tl_cmd(dir.path())
            .args(["check", "main.tl"])
            .assert()
            .failure()
            .stderr(predicate::str::contains("Invalid configuration"));
    }
}

mod hover {
    use super::*;

    #[test]
    fn test_hover_function_call() {
        let dir = workspace(&[("main.tl", AREA)]);
        let output = stdout_of(tl_cmd(dir.path()).args(["hover", "main.tl", "5", "14"]));
        insta::assert_snapshot!(output, @r"
        func area(r: Float) -> Float

        Area of a circle.

        defined at main.tl:2:6
        ");
    }

    #[test]
    fn test_hover_json() {
        let dir = workspace(&[("main.tl", AREA)]);
        let output = stdout_of(tl_cmd(dir.path()).args(["hover", "main.tl", "5", "14", "--json"]));
        let value: serde_json::Value = serde_json::from_str(&output).unwrap();
        assert_eq!(value["signature"], "func area(r: Float) -> Float");
        assert_eq!(value["location"]["range"]["line"], 1);
    }

    #[test]
    fn test_hover_nothing_there() {
        let dir = workspace(&[("main.tl", AREA)]);
        tl_cmd(dir.path())
            .args(["hover", "main.tl", "3", "1"])
            .assert()
            .failure()
            .stderr(predicate::str::contains("No information at 3:1"));
    }

    #[test]
    fn test_hover_rejects_zero_line() {
        let dir = workspace(&[("main.tl", AREA)]);
        tl_cmd(dir.path())
            .args(["hover", "main.tl", "0", "1"])
            .assert()
            .failure()
            .stderr(predicate::str::contains("1-based"));
    }

    #[test]
    fn test_hover_imported_class() {
        let dir = workspace(&[
            ("geo/shapes.tl", "class Square:\n    var side: Float = 1.0\nend\n"),
            ("main.tl", "from geo.shapes import Square\nvar s = Square()\n"),
            ("tl.toml", "[package]\nname = \"geo\"\n"),
        ]);
        tl_cmd(dir.path())
            .args(["hover", "main.tl", "2", "10"])
            .assert()
            .success()
            .stdout(predicate::str::contains("shapes.tl:1:7"));
    }
}

mod lsp {
    use super::*;

    #[test]
    fn test_lsp_help() {
        let dir = workspace(&[]);
        tl_cmd(dir.path())
            .args(["lsp", "--help"])
            .assert()
            .success()
            .stdout(predicate::str::contains("TL Language Server"))
            .stdout(predicate::str::contains("--tcp"));
    }

    #[test]
    fn test_version() {
        let dir = workspace(&[]);
        tl_cmd(dir.path())
            .arg("--version")
            .assert()
            .success()
            .stdout(predicate::str::contains("tl"));
    }
}
