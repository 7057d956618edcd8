use super::{Module, ModuleResult};
use crate::context::Context;
use crate::logging;
use crate::style::Registry;
use chrono::format::{Item, StrftimeItems};
use serde::{Deserialize, Serialize};
use std::fmt::Write;
use std::sync::Arc;

fn default_format() -> String {
    "%H:%M:%S".to_string()
}

/// The current local time.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimeModule {
    /// strftime format.
    #[serde(default = "default_format")]
    format: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "PascalCase")]
struct TimeData {
    time: String,
    unix: i64,
}

impl Module for TimeModule {
    fn execute(&self, _context: &Arc<Context>) -> ModuleResult {
        let now = chrono::Local::now();
        let mut time = String::new();
        if write!(time, "{}", now.format(&self.format)).is_err() {
            logging::warn(format!("invalid time format \"{}\"", self.format));
            return ModuleResult::empty();
        }

        ModuleResult::with_data(
            time.clone(),
            &TimeData {
                time,
                unix: now.timestamp(),
            },
        )
    }

    fn validate(&self, _styles: &Registry, errors: &mut Vec<String>) {
        if StrftimeItems::new(&self.format).any(|item| matches!(item, Item::Error)) {
            errors.push(format!("time: invalid format \"{}\"", self.format));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::test_context;
    use std::path::Path;

    #[test]
    fn test_format() {
        let module: TimeModule = serde_yaml::from_str("format: '%Y'").unwrap();
        let result = module.execute(&Arc::new(test_context(Path::new("/tmp"))));
        assert_eq!(result.default_text.len(), 4);
        assert!(result.default_text.chars().all(|c| c.is_ascii_digit()));
    }

    #[test]
    fn test_invalid_format() {
        let module: TimeModule = serde_yaml::from_str("format: '%Q'").unwrap();
        let mut errors = Vec::new();
        module.validate(&Registry::default(), &mut errors);
        assert_eq!(errors.len(), 1);
        assert_eq!(
            module
                .execute(&Arc::new(test_context(Path::new("/tmp"))))
                .default_text,
            ""
        );
    }
}
