use super::{Module, ModuleResult, validate_style};
use crate::context::Context;
use crate::style::Registry;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// The prompt character itself: `$`, `#` as root, `:` in vi command mode,
/// and an error style after a failed command.
#[derive(Debug, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct PromptModule {
    prompt: String,
    root_prompt: String,
    root_style: String,
    vicmd_prompt: String,
    vicmd_style: String,
    /// Used when the previous command failed.
    error_style: String,
}

impl Default for PromptModule {
    fn default() -> Self {
        PromptModule {
            prompt: "$ ".to_string(),
            root_prompt: "# ".to_string(),
            root_style: String::new(),
            vicmd_prompt: ": ".to_string(),
            vicmd_style: String::new(),
            error_style: String::new(),
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "PascalCase")]
struct PromptData {
    prompt_string: String,
    prompt_style: String,
    vi_cmd_mode: bool,
}

impl Module for PromptModule {
    fn execute(&self, context: &Arc<Context>) -> ModuleResult {
        let globals = &context.globals;
        let vi_cmd_mode = globals.keymap == "vicmd";
        let (text, mut style) = if vi_cmd_mode {
            (self.vicmd_prompt.as_str(), self.vicmd_style.as_str())
        } else if globals.is_root {
            (self.root_prompt.as_str(), self.root_style.as_str())
        } else {
            (self.prompt.as_str(), "")
        };
        if globals.status != 0 && !self.error_style.is_empty() {
            style = self.error_style.as_str();
        }

        let mut result = ModuleResult::with_data(
            text,
            &PromptData {
                prompt_string: text.to_string(),
                prompt_style: style.to_string(),
                vi_cmd_mode,
            },
        );
        result.style_override = style.to_string();
        result
    }

    fn validate(&self, styles: &Registry, errors: &mut Vec<String>) {
        validate_style(styles, "prompt rootStyle", &self.root_style, errors);
        validate_style(styles, "prompt vicmdStyle", &self.vicmd_style, errors);
        validate_style(styles, "prompt errorStyle", &self.error_style, errors);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::test_context;
    use std::path::Path;

    fn run(configure: impl FnOnce(&mut Context)) -> ModuleResult {
        let module: PromptModule =
            serde_yaml::from_str("errorStyle: red\nrootStyle: yellow\nvicmdStyle: blue").unwrap();
        let mut context = test_context(Path::new("/tmp"));
        configure(&mut context);
        module.execute(&Arc::new(context))
    }

    #[test]
    fn test_prompt_characters() {
        let normal = run(|_| {});
        assert_eq!(normal.default_text, "$ ");
        assert_eq!(normal.style_override, "");

        let root = run(|c| c.globals.is_root = true);
        assert_eq!(root.default_text, "# ");
        assert_eq!(root.style_override, "yellow");

        let vicmd = run(|c| c.globals.keymap = "vicmd".to_string());
        assert_eq!(vicmd.default_text, ": ");
        assert_eq!(vicmd.style_override, "blue");
    }

    #[test]
    fn test_error_style() {
        let failed = run(|c| c.globals.status = 1);
        assert_eq!(failed.default_text, "$ ");
        assert_eq!(failed.style_override, "red");
    }
}
