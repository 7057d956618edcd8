//! Project type detection.
//!
//! A project type pairs [`Conditions`] with getters for the tool's version,
//! the package manager's version, and the package's own version. The first
//! type whose conditions match and whose tool version can be read wins.

mod defaults;
mod npm;

pub use defaults::default_project_types;

use crate::condition::Conditions;
use crate::context::Context;
use crate::error::{KitschError, Result};
use crate::getters::GetterList;
use serde::{Deserialize, Deserializer};
use std::collections::HashSet;

/// Where a version comes from: configured getters, or the built-in npm
/// lookup, which avoids running the slow `npm --version`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VersionGetter {
    Getters(GetterList),
    NpmVersion,
}

impl Default for VersionGetter {
    fn default() -> Self {
        VersionGetter::Getters(GetterList::default())
    }
}

impl<'de> Deserialize<'de> for VersionGetter {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        GetterList::deserialize(deserializer).map(VersionGetter::Getters)
    }
}

impl VersionGetter {
    pub fn is_empty(&self) -> bool {
        matches!(self, VersionGetter::Getters(list) if list.is_empty())
    }

    pub fn get_string(&self, context: &Context) -> String {
        match self {
            VersionGetter::Getters(list) => list.get_string(context),
            VersionGetter::NpmVersion => npm::npm_version(context).unwrap_or_else(|err| {
                tracing::debug!("could not get npm version: {}", err);
                String::new()
            }),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ProjectType {
    pub name: String,
    pub conditions: Conditions,
    pub tool_symbol: String,
    pub tool_version: GetterList,
    pub package_manager_symbol: String,
    pub package_manager_version: VersionGetter,
    pub package_version: GetterList,
}

impl ProjectType {
    /// Fill in anything this type leaves unset from `base`.
    fn fill_from(&mut self, base: &ProjectType) {
        if self.conditions.is_empty() {
            self.conditions = base.conditions.clone();
        }
        if self.tool_symbol.is_empty() {
            self.tool_symbol = base.tool_symbol.clone();
        }
        if self.tool_version.is_empty() {
            self.tool_version = base.tool_version.clone();
        }
        if self.package_manager_symbol.is_empty() {
            self.package_manager_symbol = base.package_manager_symbol.clone();
        }
        if self.package_manager_version.is_empty() {
            self.package_manager_version = base.package_manager_version.clone();
        }
        if self.package_version.is_empty() {
            self.package_version = base.package_version.clone();
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.name.is_empty() {
            return Err(KitschError::Config("project type is missing a name".to_string()));
        }
        let getters = self.tool_version.0.iter().chain(&self.package_version.0);
        let getters = getters.chain(match &self.package_manager_version {
            VersionGetter::Getters(list) => list.0.as_slice(),
            VersionGetter::NpmVersion => &[],
        });
        for getter in getters {
            getter.validate().map_err(|err| {
                KitschError::Config(format!("project type \"{}\": {}", self.name, err))
            })?;
        }
        Ok(())
    }
}

/// Combine configured project types with `base`. A configured type with the
/// same name as a base type is filled in from it; types from `base` that
/// were not mentioned follow the configured ones.
pub fn merge_project_types(configured: Vec<ProjectType>, base: &[ProjectType]) -> Result<Vec<ProjectType>> {
    let mut seen = HashSet::new();
    let mut result = Vec::with_capacity(configured.len() + base.len());

    for mut project_type in configured {
        if !seen.insert(project_type.name.clone()) {
            return Err(KitschError::Config(format!(
                "duplicate project type: {}",
                project_type.name
            )));
        }
        if let Some(base_type) = base.iter().find(|b| b.name == project_type.name) {
            project_type.fill_from(base_type);
        }
        result.push(project_type);
    }

    result.extend(base.iter().filter(|b| !seen.contains(&b.name)).cloned());
    Ok(result)
}

/// The project in the working directory.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProjectInfo {
    pub name: String,
    pub tool_symbol: String,
    pub tool_version: String,
    pub package_manager_symbol: String,
    pub package_manager_version: String,
    pub package_version: String,
}

/// Find the first project type that matches the working directory.
pub fn resolve_project_type(context: &Context) -> Option<ProjectInfo> {
    context.project_types.iter().find_map(|project_type| {
        if !project_type.conditions.matches(&context.directory) {
            return None;
        }

        let tool_version = project_type.tool_version.get_string(context);
        if tool_version.is_empty() {
            tracing::debug!("no tool version for project type {}", project_type.name);
            return None;
        }

        Some(ProjectInfo {
            name: project_type.name.clone(),
            tool_symbol: project_type.tool_symbol.clone(),
            tool_version,
            package_manager_symbol: project_type.package_manager_symbol.clone(),
            package_manager_version: project_type.package_manager_version.get_string(context),
            package_version: project_type.package_version.get_string(context),
        })
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::getters::{CustomGetter, GetterType};
    use crate::test_support::test_context;
    use std::fs;
    use tempfile::TempDir;

    fn env_getter(var: &str) -> GetterList {
        CustomGetter {
            getter_type: GetterType::Env,
            from: var.to_string(),
            ..CustomGetter::default()
        }
        .into()
    }

    #[test]
    fn test_deserialize() {
        let project_type: ProjectType = serde_yaml::from_str(
            "name: elm\nconditions:\n  ifFiles: [elm.json]\ntoolSymbol: elm\ntoolVersion:\n  type: custom\n  from: elm --version\n",
        )
        .unwrap();
        assert_eq!(project_type.name, "elm");
        assert_eq!(project_type.tool_version.0[0].from, "elm --version");
        assert!(project_type.package_manager_version.is_empty());
    }

    #[test]
    fn test_merge() {
        let defaults = default_project_types();
        let configured = vec![
            ProjectType {
                name: "elm".to_string(),
                ..ProjectType::default()
            },
            ProjectType {
                name: "rust".to_string(),
                tool_symbol: "🦀".to_string(),
                ..ProjectType::default()
            },
        ];

        let merged = merge_project_types(configured, &defaults).unwrap();
        assert_eq!(merged.len(), defaults.len() + 1);
        assert_eq!(merged[0].name, "elm");
        assert_eq!(merged[1].name, "rust");
        assert_eq!(merged[1].tool_symbol, "🦀");
        // Unset fields come from the built-in type.
        assert!(!merged[1].tool_version.is_empty());
        assert!(!merged[1].conditions.is_empty());
        assert_eq!(merged[2].name, "java");
    }

    #[test]
    fn test_merge_rejects_duplicates() {
        let configured = vec![
            ProjectType {
                name: "x".to_string(),
                ..ProjectType::default()
            },
            ProjectType {
                name: "x".to_string(),
                ..ProjectType::default()
            },
        ];
        assert!(merge_project_types(configured, &[]).is_err());
    }

    #[test]
    fn test_resolve_skips_types_without_a_tool_version() {
        let temp = TempDir::new().unwrap();
        fs::write(temp.path().join("package.json"), r#"{"version": "2.0.0"}"#).unwrap();
        let mut ctx = test_context(temp.path());
        ctx.project_types = vec![
            ProjectType {
                name: "broken".to_string(),
                conditions: Conditions {
                    if_files: vec!["package.json".to_string()],
                    ..Conditions::default()
                },
                tool_version: env_getter("NOT_SET"),
                ..ProjectType::default()
            },
            ProjectType {
                name: "other".to_string(),
                conditions: Conditions {
                    if_files: vec!["Cargo.toml".to_string()],
                    ..Conditions::default()
                },
                tool_version: env_getter("USER"),
                ..ProjectType::default()
            },
            ProjectType {
                name: "fake-node".to_string(),
                conditions: Conditions {
                    if_files: vec!["package.json".to_string()],
                    ..Conditions::default()
                },
                tool_symbol: "node".to_string(),
                tool_version: env_getter("USER"),
                package_version: CustomGetter {
                    getter_type: GetterType::File,
                    from: "package.json".to_string(),
                    as_type: Some(crate::getters::AsType::Json),
                    value_template: "{{ .version }}".to_string(),
                    ..CustomGetter::default()
                }
                .into(),
                ..ProjectType::default()
            },
        ];

        let info = resolve_project_type(&ctx).unwrap();
        assert_eq!(info.name, "fake-node");
        assert_eq!(info.tool_version, "jwalton");
        assert_eq!(info.package_version, "2.0.0");
        assert_eq!(info.package_manager_version, "");
    }

    #[test]
    fn test_resolve_nothing() {
        let temp = TempDir::new().unwrap();
        let mut ctx = test_context(temp.path());
        ctx.project_types = default_project_types();
        assert_eq!(resolve_project_type(&ctx), None);
    }

    #[test]
    fn test_defaults_are_valid() {
        for project_type in default_project_types() {
            project_type.validate().unwrap();
        }
    }
}
