//! End-to-end tests: source file to numbered template and snippet text.

use std::{fs, process::Command};

use stubdoc::{
    docstring::docstring::render_unit,
    errors::errors::ErrorImpl,
    resolver::context::ResolutionContext,
    scope::scope::SourceUnit,
};
use tempfile::TempDir;

const SOURCE: &str = "\
import os
from pathlib import Path

def home() -> str:
    return os.getenv('HOME', '/')

def config_dir(name):
    base = home()
    if not base:
        raise FileNotFoundError(name)
    return Path(base)
";

fn write_source(dir: &TempDir, name: &str, source: &str) -> std::path::PathBuf {
    let path = dir.path().join(name);
    fs::write(&path, source).unwrap();
    path
}

#[test]
fn test_load_and_render() {
    let dir = TempDir::new().unwrap();
    let path = write_source(&dir, "settings.py", SOURCE);

    let unit = SourceUnit::load(&path).unwrap();
    assert_eq!(unit.file_name(), "settings.py");

    let rendered = render_unit(&unit, Some("config_dir"), &ResolutionContext::default()).unwrap();
    assert_eq!(rendered.len(), 1);
    assert_eq!(
        rendered[0].numbered,
        "{1}.\n\nArgs:\n    name ({2}): {3}.\n\nReturns:\n    {4:<pathlib.Path>}: {5}.\n\nRaises:\n    {6:FileNotFoundError}: {7}.\n"
    );
    assert_eq!(
        rendered[0].snippet,
        "$1.\n\nArgs:\n    name ($2): $3.\n\nReturns:\n    ${4:<pathlib.Path>}: $5.\n\nRaises:\n    ${6:FileNotFoundError}: $7.\n"
    );
}

#[test]
fn test_local_definitions_followed() {
    let source = "\
def home():
    return '/home'

def base():
    return home()
";
    let unit = SourceUnit::parse(source, "paths.py").unwrap();

    let followed = render_unit(&unit, Some("base"), &ResolutionContext::default()).unwrap();
    assert!(followed[0].numbered.contains("{2:str}"));

    let context = ResolutionContext {
        follow_local_definitions: false,
        ..ResolutionContext::default()
    };
    let unfollowed = render_unit(&unit, Some("base"), &context).unwrap();
    assert!(unfollowed[0].numbered.contains("{2:<home>}"));
}

#[test]
fn test_missing_file() {
    let dir = TempDir::new().unwrap();
    let error = SourceUnit::load(&dir.path().join("absent.py")).unwrap_err();

    assert_eq!(error.get_error_name(), "UnreadableFile");
    assert!(matches!(error.get_internal_error(), ErrorImpl::UnreadableFile { .. }));
}

#[test]
fn test_syntax_error_reported() {
    let dir = TempDir::new().unwrap();
    let path = write_source(&dir, "broken.py", "def broken(:\n    pass\n");

    let error = SourceUnit::load(&path).unwrap_err();
    assert_eq!(error.get_position().1.as_str(), "broken.py");
}

#[test]
fn test_cli_prints_snippets() {
    let dir = TempDir::new().unwrap();
    let path = write_source(&dir, "settings.py", SOURCE);

    let output = Command::new(env!("CARGO_BIN_EXE_stubdoc"))
        .arg(&path)
        .arg("--function")
        .arg("home")
        .output()
        .unwrap();

    assert!(output.status.success());
    assert_eq!(
        String::from_utf8_lossy(&output.stdout),
        "# home\n$1.\n\nReturns:\n    ${2:str}: $3.\n"
    );
}

#[test]
fn test_cli_numbered_only() {
    let dir = TempDir::new().unwrap();
    let path = write_source(&dir, "settings.py", SOURCE);

    let output = Command::new(env!("CARGO_BIN_EXE_stubdoc"))
        .arg(&path)
        .arg("--numbered-only")
        .output()
        .unwrap();

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.starts_with("# home\n{1}.\n"));
    assert!(stdout.contains("# config_dir\n"));
}

#[test]
fn test_cli_unknown_function() {
    let dir = TempDir::new().unwrap();
    let path = write_source(&dir, "settings.py", SOURCE);

    let output = Command::new(env!("CARGO_BIN_EXE_stubdoc"))
        .arg(&path)
        .arg("--function")
        .arg("missing")
        .output()
        .unwrap();

    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("Error: FunctionNotFound"));
}
