//! Tests for config loading and validation.

use crate::config::{Config, DEFAULT_CONFIG};
use crate::context::DEFAULT_TIMEOUT;
use crate::render::render_prompt;
use crate::test_support::test_context;
use std::fs;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;

const MINIMAL: &str = r#"
prompt:
  type: text
  text: "$ "
"#;

#[test]
fn test_minimal_config_uses_defaults() {
    let config = Config::from_yaml(MINIMAL).unwrap();

    assert!(config.prompt.is_some());
    assert!(config.colors.is_empty());
    assert_eq!(config.timeout(), DEFAULT_TIMEOUT);
    assert_eq!(config.flexible_space_replacement(), " ");
    config.validate().unwrap();
}

#[test]
fn test_timeouts_and_replacement() {
    let config = Config::from_yaml(
        r#"
timeout: 500
scanTimeout: 20
flexibleSpaceReplacement: " | "
prompt:
  type: text
"#,
    )
    .unwrap();

    assert_eq!(config.timeout(), Duration::from_millis(500));
    assert_eq!(config.scan_timeout(), Duration::from_millis(20));
    assert_eq!(config.flexible_space_replacement(), " | ");
}

#[test]
fn test_module_errors_fail_parsing() {
    let err = Config::from_yaml("prompt:\n  type: bogus").unwrap_err();
    assert!(err.to_string().contains("unknown module type"), "{}", err);

    let err = Config::from_yaml("prompt:\n  type: directory\n  truncationLength: lots").unwrap_err();
    assert!(err.to_string().contains("invalid directory module"), "{}", err);
}

#[test]
fn test_validate_collects_every_problem() {
    let config = Config::from_yaml(
        r#"
timeout: 0
colors:
  accent: red
prompt:
  type: block
  modules:
    - type: text
      style: notacolor
    - type: text
"#,
    )
    .unwrap();

    let err = config.validate().unwrap_err().to_string();
    assert!(err.contains("\"accent\" must start with '$'"), "{}", err);
    assert!(err.contains("timeout must be greater than 0"), "{}", err);
    assert!(err.contains("unknown style \"notacolor\""), "{}", err);
    assert!(err.contains("more than one child with id \"text\""), "{}", err);
}

#[test]
fn test_validate_requires_prompt() {
    let config = Config::from_yaml("colors:\n  $a: red").unwrap();
    let err = config.validate().unwrap_err();
    assert!(err.to_string().contains("missing prompt"));
}

#[test]
fn test_custom_colors_reach_styles() {
    let config = Config::from_yaml(
        r#"
colors:
  $accent: green
prompt:
  type: text
  text: hi
  style: $accent
"#,
    )
    .unwrap();
    config.validate().unwrap();

    let styles = config.styles(crate::style::ColorLevel::TrueColor);
    assert_eq!(styles.get("$accent").unwrap().apply("hi"), "\x1b[32mhi\x1b[39m");
}

#[test]
fn test_extends_fills_in_from_parent() {
    let temp = TempDir::new().unwrap();
    fs::write(
        temp.path().join("base.yaml"),
        r#"
timeout: 300
colors:
  $accent: blue
  $muted: gray
projectTypes:
  - name: elm
    toolSymbol: elm
    conditions:
      ifFiles: [elm.json]
prompt:
  type: text
  text: base
"#,
    )
    .unwrap();
    let child = temp.path().join("child.yaml");
    fs::write(
        &child,
        r#"
extends: base.yaml
colors:
  $accent: red
"#,
    )
    .unwrap();

    let config = Config::load(&child).unwrap();
    assert_eq!(config.colors["$accent"], "red");
    assert_eq!(config.colors["$muted"], "gray");
    assert_eq!(config.timeout(), Duration::from_millis(300));
    assert_eq!(config.project_types.len(), 1);
    assert_eq!(config.prompt.as_ref().unwrap().module_type(), "text");
}

#[test]
fn test_missing_parent_is_only_a_warning() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("kitsch.yaml");
    fs::write(&path, format!("extends: nowhere.yaml\n{}", MINIMAL)).unwrap();

    let config = Config::load(&path).unwrap();
    assert!(config.prompt.is_some());
}

#[test]
fn test_extends_cycle_is_an_error() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("loop.yaml");
    fs::write(&path, format!("extends: loop.yaml\n{}", MINIMAL)).unwrap();

    let err = Config::load(&path).unwrap_err();
    assert_eq!(err.exit_code(), crate::exit_codes::CONFIG_FAILURE);
    assert!(err.to_string().contains("too many nested extends"), "{}", err);
}

#[test]
fn test_extends_chain_within_limit() {
    let temp = TempDir::new().unwrap();
    fs::write(temp.path().join("c0.yaml"), MINIMAL).unwrap();
    for i in 1..9 {
        fs::write(
            temp.path().join(format!("c{}.yaml", i)),
            format!("extends: c{}.yaml\n", i - 1),
        )
        .unwrap();
    }

    let config = Config::load(temp.path().join("c8.yaml")).unwrap();
    assert!(config.prompt.is_some());
}

#[test]
fn test_load_errors() {
    let err = Config::load("/nonexistent/path/kitsch.yaml").unwrap_err();
    assert!(err.to_string().contains("failed to read config file"));

    let temp = TempDir::new().unwrap();
    let path = temp.path().join("kitsch.yaml");
    fs::write(&path, "colors: {}\n").unwrap();
    let err = Config::load(&path).unwrap_err();
    assert!(err.to_string().contains("missing prompt"));
}

#[test]
fn test_configured_project_types_come_first() {
    let config = Config::from_yaml(
        r#"
projectTypes:
  - name: elm
    toolSymbol: elm
prompt:
  type: project
"#,
    )
    .unwrap();

    let types = config.all_project_types().unwrap();
    assert_eq!(types[0].name, "elm");
    assert!(types.iter().any(|t| t.name == "rust"));
}

#[test]
fn test_default_config_is_valid_and_renders() {
    let config = Config::from_yaml(DEFAULT_CONFIG).unwrap();
    config.validate().unwrap();

    let mut context = test_context(Path::new("/tmp"));
    context.styles = config.styles(crate::style::ColorLevel::TrueColor);
    let (_, text) = render_prompt(&Arc::new(context), config.prompt.as_ref().unwrap());

    let last_line = text.rsplit('\n').next().unwrap();
    assert!(last_line.contains("$ "), "{:?}", text);
    let first_line = text.split('\n').next().unwrap();
    assert_eq!(crate::style::print_width(first_line), 80, "{:?}", first_line);
}
