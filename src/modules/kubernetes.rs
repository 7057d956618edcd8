//! The current kubectl context.

use super::{Module, ModuleResult};
use crate::context::Context;
use crate::getters::resolve_file;
use crate::logging;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;

fn default_symbol() -> String {
    "☸ ".to_string()
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KubernetesModule {
    #[serde(default = "default_symbol")]
    symbol: String,
    /// Shorter names for long context names.
    #[serde(default)]
    context_aliases: HashMap<String, String>,
    /// Defaults to `~/.kube/config`.
    #[serde(default)]
    config_file: String,
}

#[derive(Debug, Default, Serialize)]
#[serde(rename_all = "PascalCase")]
struct KubernetesData {
    original_context: String,
    context: String,
    namespace: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct KubeConfig {
    #[serde(rename = "current-context")]
    current_context: String,
    contexts: Vec<NamedContext>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct NamedContext {
    name: String,
    context: KubeContext,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct KubeContext {
    namespace: String,
}

impl KubernetesModule {
    fn config_path(&self, context: &Context) -> PathBuf {
        if self.config_file.is_empty() {
            PathBuf::from(&context.globals.home).join(".kube").join("config")
        } else {
            resolve_file(context, &self.config_file)
        }
    }

    fn data(&self, config: &KubeConfig) -> KubernetesData {
        let current = &config.current_context;
        let namespace = config
            .contexts
            .iter()
            .find(|c| &c.name == current)
            .map(|c| c.context.namespace.clone())
            .filter(|ns| ns != "default")
            .unwrap_or_default();

        KubernetesData {
            original_context: current.clone(),
            context: self
                .context_aliases
                .get(current)
                .cloned()
                .unwrap_or_else(|| current.clone()),
            namespace,
        }
    }
}

impl Module for KubernetesModule {
    fn execute(&self, context: &Arc<Context>) -> ModuleResult {
        let path = self.config_path(context);
        let Ok(contents) = std::fs::read_to_string(&path) else {
            return ModuleResult::with_data("", &KubernetesData::default());
        };
        let config: KubeConfig = match serde_yaml::from_str(&contents) {
            Ok(config) => config,
            Err(err) => {
                logging::warn(format!("could not parse {}: {}", path.display(), err));
                return ModuleResult::with_data("", &KubernetesData::default());
            }
        };

        let data = self.data(&config);
        let text = if data.context.is_empty() {
            String::new()
        } else {
            format!("{}{}", self.symbol, data.context)
        };
        ModuleResult::with_data(text, &data)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::template::Value;
    use crate::test_support::test_context;
    use std::fs;
    use tempfile::TempDir;

    const KUBECONFIG: &str = "\
apiVersion: v1
current-context: arn:aws:eks:us-east-1:123456789012:cluster/prod
contexts:
  - name: arn:aws:eks:us-east-1:123456789012:cluster/prod
    context:
      cluster: prod
      namespace: payments
  - name: minikube
    context:
      cluster: minikube
      namespace: default
";

    fn run(yaml: &str, kubeconfig: &str) -> ModuleResult {
        let temp = TempDir::new().unwrap();
        fs::write(temp.path().join("kubeconfig"), kubeconfig).unwrap();
        let module: KubernetesModule = serde_yaml::from_str(yaml).unwrap();
        module.execute(&Arc::new(test_context(temp.path())))
    }

    #[test]
    fn test_context_and_namespace() {
        let result = run("configFile: kubeconfig", KUBECONFIG);
        assert_eq!(
            result.default_text,
            "☸ arn:aws:eks:us-east-1:123456789012:cluster/prod"
        );
        assert_eq!(result.data.field("Namespace"), Some(&Value::from("payments")));
    }

    #[test]
    fn test_alias_and_default_namespace() {
        let result = run(
            "configFile: kubeconfig\ncontextAliases:\n  minikube: mk",
            &KUBECONFIG.replace(
                "current-context: arn:aws:eks:us-east-1:123456789012:cluster/prod",
                "current-context: minikube",
            ),
        );
        assert_eq!(result.default_text, "☸ mk");
        assert_eq!(result.data.field("OriginalContext"), Some(&Value::from("minikube")));
        assert_eq!(result.data.field("Namespace"), Some(&Value::from("")));
    }

    #[test]
    fn test_missing_config() {
        let result = run("configFile: nope", "");
        assert_eq!(result.default_text, "");
    }
}
