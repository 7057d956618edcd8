//! Modules that show the output of a command, or the contents of a file.

use super::{Module, ModuleResult};
use crate::context::Context;
use crate::getters::{AsType, CacheSettings, CustomGetter, GetterType};
use crate::logging;
use crate::style::Registry;
use crate::template::Value;
use serde::Deserialize;
use std::sync::Arc;

/// Plain values become `{Text}`; structured values are shown only through
/// a template.
fn getter_result(getter: &CustomGetter, context: &Context, kind: &str) -> ModuleResult {
    let value = getter.get_value(context).unwrap_or_else(|err| {
        logging::warn(format!("error executing {} module: {}", kind, err));
        Value::String(String::new())
    });

    match value {
        Value::String(text) => {
            let text = text.trim().to_string();
            ModuleResult::new(text.clone(), Value::map([("Text", Value::from(text))]))
        }
        data => ModuleResult::new("", data),
    }
}

fn validate_getter(getter: &CustomGetter, kind: &str, errors: &mut Vec<String>) {
    if let Err(err) = getter.validate() {
        errors.push(format!("{}: {}", kind, err));
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct CustomModule {
    /// Command line to run.
    command: String,
    #[serde(rename = "as")]
    as_type: Option<AsType>,
    regex: String,
    value_template: String,
    cache: CacheSettings,
}

impl CustomModule {
    fn getter(&self) -> CustomGetter {
        CustomGetter {
            getter_type: GetterType::Custom,
            from: self.command.clone(),
            as_type: self.as_type,
            value_template: self.value_template.clone(),
            regex: self.regex.clone(),
            cache: self.cache.clone(),
        }
    }
}

impl Module for CustomModule {
    fn execute(&self, context: &Arc<Context>) -> ModuleResult {
        getter_result(&self.getter(), context, "custom")
    }

    fn validate(&self, _styles: &Registry, errors: &mut Vec<String>) {
        if self.command.trim().is_empty() {
            errors.push("custom: command is required".to_string());
        }
        validate_getter(&self.getter(), "custom", errors);
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct FileModule {
    /// Path, relative to the working directory. `~` and `$VAR` are expanded.
    file: String,
    #[serde(rename = "as")]
    as_type: Option<AsType>,
    regex: String,
    value_template: String,
}

impl FileModule {
    fn getter(&self) -> CustomGetter {
        CustomGetter {
            getter_type: GetterType::File,
            from: self.file.clone(),
            as_type: self.as_type,
            value_template: self.value_template.clone(),
            regex: self.regex.clone(),
            cache: CacheSettings::default(),
        }
    }
}

impl Module for FileModule {
    fn execute(&self, context: &Arc<Context>) -> ModuleResult {
        getter_result(&self.getter(), context, "file")
    }

    fn validate(&self, _styles: &Registry, errors: &mut Vec<String>) {
        if self.file.is_empty() {
            errors.push("file: file is required".to_string());
        }
        validate_getter(&self.getter(), "file", errors);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::test_context;
    use std::fs;
    use tempfile::TempDir;

    fn file_module(yaml: &str) -> FileModule {
        serde_yaml::from_str(yaml).unwrap()
    }

    #[test]
    fn test_file_text() {
        let temp = TempDir::new().unwrap();
        fs::write(temp.path().join("VERSION"), "1.2.3\n").unwrap();
        let result =
            file_module("file: VERSION").execute(&Arc::new(test_context(temp.path())));
        assert_eq!(result.default_text, "1.2.3");
        assert_eq!(result.data.field("Text"), Some(&Value::from("1.2.3")));
    }

    #[test]
    fn test_file_json_is_data_only() {
        let temp = TempDir::new().unwrap();
        fs::write(temp.path().join("package.json"), r#"{"name": "kitsch", "version": "2.0.0"}"#)
            .unwrap();
        let result = file_module("file: package.json\nas: json")
            .execute(&Arc::new(test_context(temp.path())));
        assert_eq!(result.default_text, "");
        assert_eq!(result.data.field("version"), Some(&Value::from("2.0.0")));
    }

    #[test]
    fn test_file_value_template() {
        let temp = TempDir::new().unwrap();
        fs::write(temp.path().join("package.json"), r#"{"name": "kitsch", "version": "2.0.0"}"#)
            .unwrap();
        let result = file_module("file: package.json\nas: json\nvalueTemplate: '{{ .version }}'")
            .execute(&Arc::new(test_context(temp.path())));
        assert_eq!(result.default_text, "2.0.0");
    }

    #[test]
    fn test_missing_file() {
        let temp = TempDir::new().unwrap();
        let result = file_module("file: nope").execute(&Arc::new(test_context(temp.path())));
        assert_eq!(result.default_text, "");
    }

    #[cfg(unix)]
    #[test]
    fn test_custom_command() {
        let temp = TempDir::new().unwrap();
        let module: CustomModule =
            serde_yaml::from_str("command: echo hello world\nregex: 'hello (\\w+)'").unwrap();
        let result = module.execute(&Arc::new(test_context(temp.path())));
        assert_eq!(result.default_text, "world");
    }

    #[test]
    fn test_validate() {
        let module: CustomModule = serde_yaml::from_str("regex: '('").unwrap();
        let mut errors = Vec::new();
        module.validate(&Registry::default(), &mut errors);
        assert_eq!(errors.len(), 2);
    }
}
