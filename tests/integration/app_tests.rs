use clap::Parser;
use cleanscan::app::App;
use cleanscan::cli::Cli;
use cleanscan::config::Config;
use cleanscan::error::ExitCode;
use cleanscan::signal::CancelFlag;
use std::fs;
use std::path::Path;
use tempfile::tempdir;

fn run(args: &[&str]) -> (ExitCode, String) {
    let cli = Cli::try_parse_from(args).unwrap();
    let mut app = App::new(Config::default(), CancelFlag::new(), true);
    let mut out = Vec::new();
    let code = app.run(cli.command, &mut out).unwrap();
    (code, String::from_utf8(out).unwrap())
}

fn tree(root: &Path) {
    fs::create_dir_all(root.join("docs")).unwrap();
    fs::write(root.join("docs/report.pdf"), "same bytes").unwrap();
    fs::write(root.join("docs/report copy.pdf"), "same bytes").unwrap();
    fs::write(root.join("notes.txt"), "unique").unwrap();
}

#[test]
fn test_index_json() {
    let dir = tempdir().unwrap();
    tree(dir.path());
    let root = dir.path().to_str().unwrap();

    let (code, out) = run(&["cleanscan", "index", root, "--output", "json"]);
    assert_eq!(code, ExitCode::Success);

    let json: serde_json::Value = serde_json::from_str(&out).unwrap();
    assert_eq!(json["report"]["files"], 3);
    assert_eq!(json["report"]["directories"], 1);
    assert_eq!(json["report"]["by_extension"][".pdf"]["count"], 2);
    assert_eq!(json["scan"]["unreadable_entries"], 0);
    assert_eq!(json["exit_code_name"], "CS000");
}

#[test]
fn test_search_json_rows() {
    let dir = tempdir().unwrap();
    tree(dir.path());
    let root = dir.path().to_str().unwrap();

    let (code, out) = run(&["cleanscan", "search", root, "--ext", "pdf", "--term", "copy", "-o", "json"]);
    assert_eq!(code, ExitCode::Success);

    let json: serde_json::Value = serde_json::from_str(&out).unwrap();
    let rows = json["rows"].as_array().unwrap();
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0]["name"], "docs");
    assert_eq!(rows[1]["name"], "report copy.pdf");
    assert_eq!(rows[1]["parent"], 0);
    assert_eq!(json["filter"]["extensions"][0], ".pdf");
}

#[test]
fn test_search_without_matches_is_nothing_found() {
    let dir = tempdir().unwrap();
    tree(dir.path());
    let root = dir.path().to_str().unwrap();

    let (code, out) = run(&["cleanscan", "search", root, "--term", "zzz"]);
    assert_eq!(code, ExitCode::NothingFound);
    assert!(out.contains("0 files shown"));
}

#[test]
fn test_lookup_text() {
    let dir = tempdir().unwrap();
    tree(dir.path());
    let root = dir.path().to_str().unwrap();

    let (code, out) = run(&["cleanscan", "--no-color", "lookup", root, "REPORT"]);
    assert_eq!(code, ExitCode::Success);
    assert_eq!(out.lines().filter(|l| l.ends_with(".pdf")).count(), 2);
}

#[test]
fn test_dupes_with_keep_plan() {
    let dir = tempdir().unwrap();
    tree(dir.path());
    let root = dir.path().to_str().unwrap();

    let (code, out) = run(&["cleanscan", "dupes", root, "--keep", "first", "--output", "json"]);
    assert_eq!(code, ExitCode::Success);

    let json: serde_json::Value = serde_json::from_str(&out).unwrap();
    assert_eq!(json["duplicates"].as_array().unwrap().len(), 1);
    assert_eq!(json["summary"]["reclaimable_space"], 10);
    let plan = &json["plans"][0];
    assert_eq!(plan["keep"].as_array().unwrap().len(), 1);
    assert_eq!(plan["remove"].as_array().unwrap().len(), 1);
    assert!(plan["keep"][0].as_str().unwrap().ends_with("report copy.pdf"));
    assert_eq!(json["removals"].as_array().unwrap().len(), 1);
}

#[test]
fn test_dupes_on_explicit_files_without_duplicates() {
    let dir = tempdir().unwrap();
    tree(dir.path());
    let notes = dir.path().join("notes.txt");
    let report = dir.path().join("docs/report.pdf");

    let (code, _) = run(&[
        "cleanscan",
        "dupes",
        notes.to_str().unwrap(),
        report.to_str().unwrap(),
    ]);
    assert_eq!(code, ExitCode::NothingFound);
}

#[test]
fn test_dupes_missing_path_is_an_error() {
    let dir = tempdir().unwrap();
    let missing = dir.path().join("missing");
    let cli = Cli::try_parse_from(["cleanscan", "dupes", missing.to_str().unwrap()]).unwrap();
    let mut app = App::new(Config::default(), CancelFlag::new(), true);
    let err = app.run(cli.command, &mut Vec::new()).unwrap_err();
    assert_eq!(ExitCode::for_error(&err), ExitCode::GeneralError);
}
