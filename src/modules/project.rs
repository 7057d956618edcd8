//! The kind of project in the working directory and its tool versions.

use super::{Module, ModuleResult, validate_style};
use crate::context::Context;
use crate::projects::resolve_project_type;
use crate::style::Registry;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;

/// Per-project overrides, keyed by project type name.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ProjectOverrides {
    style: String,
    tool_symbol: String,
    package_manager_symbol: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct ProjectModule {
    projects: HashMap<String, ProjectOverrides>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "PascalCase")]
struct ProjectData {
    name: String,
    tool_symbol: String,
    tool_version: String,
    package_manager_symbol: String,
    package_manager_version: String,
    package_version: String,
    project_style: String,
}

fn or_default(value: &str, default: &str) -> String {
    if value.is_empty() { default } else { value }.to_string()
}

impl Module for ProjectModule {
    fn execute(&self, context: &Arc<Context>) -> ModuleResult {
        let Some(info) = resolve_project_type(context) else {
            return ModuleResult::empty();
        };
        let overrides = self.projects.get(&info.name).cloned().unwrap_or_default();

        let data = ProjectData {
            tool_symbol: or_default(&overrides.tool_symbol, &info.tool_symbol),
            package_manager_symbol: or_default(
                &overrides.package_manager_symbol,
                &info.package_manager_symbol,
            ),
            project_style: overrides.style,
            name: info.name,
            tool_version: info.tool_version,
            package_manager_version: info.package_manager_version,
            package_version: info.package_version,
        };

        let tool = format!("{}@{}", data.tool_symbol, data.tool_version);
        let text = format!(
            "via {}",
            super::apply_style(context, &data.project_style, &tool)
        );
        ModuleResult::with_data(text, &data)
    }

    fn validate(&self, styles: &Registry, errors: &mut Vec<String>) {
        for (name, overrides) in &self.projects {
            validate_style(styles, &format!("project {} style", name), &overrides.style, errors);
        }
    }
}
