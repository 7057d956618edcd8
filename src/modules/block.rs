//! A module made of other modules.

use super::{Module, ModuleResult, ModuleWrapper, RenderedModule};
use crate::context::Context;
use crate::logging;
use crate::style::Registry;
use crate::template::{Template, TemplateError, Value};
use serde::Deserialize;
use std::collections::{BTreeMap, HashSet};
use std::sync::Arc;

fn default_join() -> String {
    " ".to_string()
}

#[derive(Debug, Deserialize)]
pub struct BlockConfig {
    #[serde(default)]
    modules: Vec<ModuleWrapper>,
    /// Placed between non-empty children. A template if it contains `{{`.
    #[serde(default = "default_join")]
    join: String,
}

enum Join {
    Literal(String),
    Template(std::result::Result<Template, TemplateError>),
}

pub struct BlockModule {
    modules: Vec<ModuleWrapper>,
    join: Join,
}

impl BlockModule {
    pub fn new(config: BlockConfig) -> Self {
        let join = if config.join.contains("{{") {
            Join::Template(Template::parse("join", &config.join))
        } else {
            Join::Literal(config.join)
        };
        BlockModule {
            modules: config.modules,
            join,
        }
    }

    #[cfg(test)]
    pub(super) fn with_children(modules: Vec<ModuleWrapper>) -> Self {
        BlockModule::new(BlockConfig {
            modules,
            join: default_join(),
        })
    }

    fn joiner(
        &self,
        context: &Context,
        index: usize,
        prev: &RenderedModule,
        next: &RenderedModule,
    ) -> String {
        let template = match &self.join {
            Join::Literal(join) => return join.clone(),
            Join::Template(Ok(template)) => template,
            Join::Template(Err(err)) => {
                logging::warn(format!("error in block join template: {}", err));
                return default_join();
            }
        };

        let data = Value::map([
            ("Globals", context.globals.to_value()),
            ("PrevColors", Value::from_serialize(&prev.end_style)),
            ("NextColors", Value::from_serialize(&next.start_style)),
            ("Index", Value::Int(index as i64)),
        ]);
        template
            .execute(&data, &context.funcs())
            .unwrap_or_else(|err| {
                logging::warn(format!("error executing block join template: {}", err));
                default_join()
            })
    }
}

impl Module for BlockModule {
    fn execute(&self, context: &Arc<Context>) -> ModuleResult {
        // Start everything first so children run side by side.
        let pending: Vec<_> = self
            .modules
            .iter()
            .map(|module| (module.id().to_string(), module.start(context)))
            .collect();

        let mut children = Vec::with_capacity(pending.len());
        let mut rendered = Vec::with_capacity(pending.len());
        for (id, pending) in pending {
            let mut result = pending.wait();
            children.push(std::mem::take(&mut result.performance));
            if !result.text.is_empty() {
                rendered.push((id, result));
            }
        }

        let mut text = String::new();
        for (index, (_, result)) in rendered.iter().enumerate() {
            if index > 0 {
                text.push_str(&self.joiner(context, index, &rendered[index - 1].1, result));
            }
            text.push_str(&result.text);
        }

        let by_id: BTreeMap<String, Value> = rendered
            .iter()
            .map(|(id, result)| (id.clone(), result.to_value()))
            .collect();
        let array: Vec<Value> = rendered.iter().map(|(_, result)| result.to_value()).collect();

        let mut result = ModuleResult::new(
            text,
            Value::map([
                ("Modules", Value::Map(by_id)),
                ("ModuleArray", Value::List(array)),
            ]),
        );
        if let (Some((_, first)), Some((_, last))) = (rendered.first(), rendered.last()) {
            result.start_style = first.start_style.clone();
            result.end_style = last.end_style.clone();
        }
        result.children = children;
        result
    }

    fn validate(&self, styles: &Registry, errors: &mut Vec<String>) {
        if let Join::Template(Err(err)) = &self.join {
            errors.push(format!("block join: {}", err));
        }

        let mut seen = HashSet::new();
        for module in &self.modules {
            if !seen.insert(module.id()) {
                errors.push(format!(
                    "block has more than one child with id \"{}\"",
                    module.id()
                ));
            }
            module.validate(styles, errors);
        }
    }
}
