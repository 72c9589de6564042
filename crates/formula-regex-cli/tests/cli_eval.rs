use std::io::Write;

use assert_cmd::Command;
use pretty_assertions::assert_eq;

fn cli() -> Command {
    Command::new(assert_cmd::cargo::cargo_bin!("formula-regex"))
}

fn stdout_of(args: &[&str]) -> (String, Option<i32>) {
    let output = cli().args(args).output().expect("run formula-regex");
    (
        String::from_utf8(output.stdout).expect("utf-8 stdout"),
        output.status.code(),
    )
}

#[test]
fn eval_prints_the_result() {
    let (out, code) = stdout_of(&["eval", r#"REGEXMATCHGROUPS("ab12cd34", "(?<l>[a-z]+)(?<d>\d+)")"#]);
    assert_eq!(out, "l,d,l,d\n");
    assert_eq!(code, Some(0));
}

#[test]
fn eval_reports_worksheet_errors_with_status_2() {
    let (out, code) = stdout_of(&["eval", r#"REGEXMATCH("abc", "\d")"#]);
    assert_eq!(out, "#N/A\n");
    assert_eq!(code, Some(2));

    let (out, code) = stdout_of(&["eval", r#"REGEXMATCH("", "a")"#]);
    assert_eq!(out, "#VALUE!\n");
    assert_eq!(code, Some(2));
}

#[test]
fn eval_json_output() {
    let (out, _) = stdout_of(&["eval", "--json", r#"REGEXMATCHES("aaa", "a", , , , , FALSE)"#]);
    assert_eq!(out, "{\"value\":\"a\",\"error\":null}\n");

    let (out, code) = stdout_of(&["eval", "--json", r#"ISREGEXMATCH("a", "(")"#]);
    assert_eq!(out, "{\"value\":null,\"error\":\"#VALUE!\"}\n");
    assert_eq!(code, Some(2));
}

#[test]
fn malformed_expression_fails() {
    cli().args(["eval", "REGEXMATCH"]).assert().failure().code(1);
}

#[test]
fn list_includes_every_function() {
    let (out, code) = stdout_of(&["list"]);
    assert_eq!(code, Some(0));
    let names: Vec<&str> = out
        .lines()
        .map(|line| line.split('(').next().unwrap_or_default())
        .collect();
    assert_eq!(
        names,
        vec![
            "ISREGEXMATCH",
            "REGEXESCAPE",
            "REGEXGROUPMATCHES",
            "REGEXMATCH",
            "REGEXMATCHES",
            "REGEXMATCHGROUPS",
            "REGEXREPLACE",
            "REGEXVERSIONNUMBER",
        ]
    );
    assert!(out.contains("REGEXREPLACE(input, pattern, [options], [replacement])"));
}

#[test]
fn backtrack_limit_from_config_and_flag() {
    let expr = r#"ISREGEXMATCH("aaaaaaaaaaaac", "(a+)+\1b")"#;

    let mut config = tempfile::NamedTempFile::new().expect("temp config");
    write!(config, r#"{{"backtrackLimit": 10}}"#).expect("write config");
    let path = config.path().to_str().expect("utf-8 path");

    let (out, code) = stdout_of(&["--config", path, "eval", expr]);
    assert_eq!(out, "#VALUE!\n");
    assert_eq!(code, Some(2));

    let (out, code) = stdout_of(&["--config", path, "--backtrack-limit", "1000000", "eval", expr]);
    assert_eq!(out, "FALSE\n");
    assert_eq!(code, Some(0));
}

#[test]
fn verbose_logging_goes_to_stderr() {
    let output = cli()
        .args(["-v", "eval", r#"REGEXMATCH("a1", "\d")"#])
        .output()
        .expect("run formula-regex");
    assert_eq!(String::from_utf8_lossy(&output.stdout), "1\n");
    assert!(String::from_utf8_lossy(&output.stderr).contains("compiled pattern"));
}
