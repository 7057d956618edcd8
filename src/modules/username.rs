use super::{Module, ModuleResult, is_ssh, validate_style};
use crate::context::Context;
use crate::style::Registry;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// The current user. Hidden unless root, over SSH, or `showAlways` is set.
#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct UsernameModule {
    show_always: bool,
    /// Style to use instead of the module's style when root.
    root_style: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "PascalCase")]
struct UsernameData {
    username: String,
    is_root: bool,
    #[serde(rename = "IsSSH")]
    is_ssh: bool,
    show: bool,
}

impl Module for UsernameModule {
    fn execute(&self, context: &Arc<Context>) -> ModuleResult {
        let is_root = context.globals.is_root;
        let is_ssh = is_ssh(context);
        let show = is_root || is_ssh || self.show_always;
        let username = context
            .env
            .var("USER")
            .filter(|u| !u.is_empty())
            .or_else(|| context.env.var("USERNAME"))
            .unwrap_or_default();

        let mut result = ModuleResult::with_data(
            if show { username.as_str() } else { "" },
            &UsernameData {
                username: username.clone(),
                is_root,
                is_ssh,
                show,
            },
        );
        if show && is_root {
            result.style_override = self.root_style.clone();
        }
        result
    }

    fn validate(&self, styles: &Registry, errors: &mut Vec<String>) {
        validate_style(styles, "username rootStyle", &self.root_style, errors);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::env::MapEnvironment;
    use crate::test_support::test_context;
    use std::path::Path;

    fn run(yaml: &str, is_root: bool, env: &[(&str, &str)]) -> ModuleResult {
        let module: UsernameModule = serde_yaml::from_str(yaml).unwrap();
        let mut context = test_context(Path::new("/tmp"));
        context.globals.is_root = is_root;
        context.env = Box::new(MapEnvironment::from_pairs(env));
        module.execute(&Arc::new(context))
    }

    #[test]
    fn test_hidden_by_default() {
        assert_eq!(run("{}", false, &[("USER", "jwalton")]).default_text, "");
        assert_eq!(
            run("showAlways: true", false, &[("USER", "jwalton")]).default_text,
            "jwalton"
        );
    }

    #[test]
    fn test_shown_over_ssh() {
        let env = [("USER", "jwalton"), ("SSH_CONNECTION", "10.0.0.1 22")];
        assert_eq!(run("{}", false, &env).default_text, "jwalton");
    }

    #[test]
    fn test_root_style() {
        let result = run("rootStyle: red", true, &[("USER", "root")]);
        assert_eq!(result.default_text, "root");
        assert_eq!(result.style_override, "red");
    }
}
