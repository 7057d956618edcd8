use super::{Module, ModuleResult};
use crate::context::Context;
use crate::template::Value;
use serde::Deserialize;
use std::sync::Arc;

/// Fixed text. Mostly useful with a style, or as a separator in a block.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct TextModule {
    text: String,
}

impl Module for TextModule {
    fn execute(&self, _context: &Arc<Context>) -> ModuleResult {
        ModuleResult::new(
            self.text.clone(),
            Value::map([("Text", Value::from(self.text.as_str()))]),
        )
    }
}
