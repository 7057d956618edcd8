//! Built-in project types, in priority order.

use super::{ProjectType, VersionGetter};
use crate::condition::Conditions;
use crate::getters::{AsType, CacheSettings, CustomGetter, GetterList, GetterType};

fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

fn conditions(files: &[&str], extensions: &[&str]) -> Conditions {
    Conditions {
        if_files: strings(files),
        if_extensions: strings(extensions),
        ..Conditions::default()
    }
}

/// Run `command` and pick the version out with `regex`. Tool versions rarely
/// change, so the output is cached.
fn command(command: &str, regex: &str) -> GetterList {
    CustomGetter {
        getter_type: GetterType::Custom,
        from: command.to_string(),
        regex: regex.to_string(),
        cache: CacheSettings { enabled: true },
        ..CustomGetter::default()
    }
    .into()
}

fn file_field(file: &str, as_type: AsType, template: &str) -> GetterList {
    CustomGetter {
        getter_type: GetterType::File,
        from: file.to_string(),
        as_type: Some(as_type),
        value_template: template.to_string(),
        ..CustomGetter::default()
    }
    .into()
}

pub fn default_project_types() -> Vec<ProjectType> {
    vec![
        ProjectType {
            name: "java".to_string(),
            conditions: conditions(&[], &["java"]),
            tool_symbol: "java".to_string(),
            tool_version: command(
                "java -Xinternalversion",
                r"\(([\d\.]+)[^\d\.]?[^\s]*\)(:?, built|from)",
            ),
            ..ProjectType::default()
        },
        ProjectType {
            name: "go".to_string(),
            conditions: conditions(&["go.mod"], &["go"]),
            tool_symbol: "go".to_string(),
            tool_version: command("go version", r"go version go(\d+\.\d+\.\d+)"),
            ..ProjectType::default()
        },
        ProjectType {
            name: "rust".to_string(),
            conditions: conditions(&["Cargo.toml"], &["rs"]),
            tool_symbol: "rustc".to_string(),
            tool_version: command("rustc --version", r"rustc (\d+\.\d+\.\d+)"),
            package_version: file_field("Cargo.toml", AsType::Toml, "{{ .package.version }}"),
            ..ProjectType::default()
        },
        ProjectType {
            name: "node-yarn".to_string(),
            conditions: conditions(&["yarn.lock"], &[]),
            tool_symbol: "node".to_string(),
            tool_version: command("node --version", r"v(.*)"),
            package_manager_symbol: "yarn".to_string(),
            package_manager_version: VersionGetter::Getters(command("yarn --version", r"(.*)")),
            package_version: file_field("package.json", AsType::Json, "{{ .version }}"),
        },
        ProjectType {
            name: "node".to_string(),
            conditions: conditions(&["package.json"], &[]),
            tool_symbol: "node".to_string(),
            tool_version: command("node --version", r"v(.*)"),
            package_manager_symbol: "npm".to_string(),
            package_manager_version: VersionGetter::NpmVersion,
            package_version: file_field("package.json", AsType::Json, "{{ .version }}"),
        },
        ProjectType {
            name: "deno".to_string(),
            conditions: conditions(&["mod.ts"], &[]),
            tool_symbol: "deno".to_string(),
            tool_version: command("deno --version", r"deno (\d+\.\d+\.\d+)"),
            ..ProjectType::default()
        },
        ProjectType {
            name: "helm".to_string(),
            conditions: conditions(&["Chart.yaml"], &[]),
            tool_symbol: "helm".to_string(),
            tool_version: command(
                "helm version",
                r#"^version.BuildInfo\{Version:"v(\d+\.\d+\.\d+)""#,
            ),
            ..ProjectType::default()
        },
    ]
}
