//! Prompt modules.
//!
//! A module looks at the [`Context`] and produces a little text plus data
//! for templates. Modules are configured in YAML: every module shares the
//! fields in [`CommonConfig`], and [`ModuleWrapper`] runs one configured
//! module on its own thread, under a timeout, then applies its template and
//! style.

mod block;
mod command_duration;
mod cpu;
mod custom;
mod directory;
mod flexible_space;
mod git_diverged;
mod git_head;
mod git_state;
mod git_status;
mod hostname;
mod jobs;
mod kubernetes;
mod project;
mod prompt;
mod text;
mod time;
mod username;
mod wrapper;


pub use flexible_space::FLEXIBLE_SPACE_MARKER;
pub use wrapper::{ModuleWrapper, RenderedModule};

use crate::condition::Conditions;
use crate::context::Context;
use crate::error::{KitschError, Result};
use crate::perf::Performance;
use crate::style::{CharacterColors, Registry};
use crate::template::Value;
use serde::Deserialize;
use serde::de::DeserializeOwned;
use std::sync::Arc;

/// Stack size for module threads. Templates recurse through `include`, so
/// module threads get more than the platform default.
pub const MODULE_STACK_SIZE: usize = 16 * 1024 * 1024;

/// Every module type that can appear in a configuration.
pub const MODULE_TYPES: &[&str] = &[
    "block",
    "command_duration",
    "cpu",
    "custom",
    "directory",
    "file",
    "flexible_space",
    "git_diverged",
    "git_head",
    "git_state",
    "git_status",
    "hostname",
    "jobs",
    "kubernetes",
    "project",
    "prompt",
    "text",
    "time",
    "username",
];

pub trait Module: Send + Sync {
    fn execute(&self, context: &Arc<Context>) -> ModuleResult;

    /// Report configuration problems that can be found without running.
    fn validate(&self, _styles: &Registry, _errors: &mut Vec<String>) {}
}

/// What a module produces, before its template and style are applied.
#[derive(Debug, Clone, Default)]
pub struct ModuleResult {
    /// Shown when the module has no template.
    pub default_text: String,
    /// Exposed to templates as `.Data`.
    pub data: Value,
    pub start_style: CharacterColors,
    pub end_style: CharacterColors,
    /// Replaces the configured style, e.g. for an error prompt.
    pub style_override: String,
    /// Timings of child modules.
    pub children: Vec<Performance>,
}

impl ModuleResult {
    pub fn new(default_text: impl Into<String>, data: Value) -> Self {
        ModuleResult {
            default_text: default_text.into(),
            data,
            ..ModuleResult::default()
        }
    }

    /// A result whose data is a serializable struct.
    pub fn with_data<T: serde::Serialize>(default_text: impl Into<String>, data: &T) -> Self {
        ModuleResult::new(default_text, Value::from_serialize(data))
    }

    pub fn empty() -> Self {
        ModuleResult::new("", Value::map(Vec::<(String, Value)>::new()))
    }
}

/// Settings shared by every module.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct CommonConfig {
    #[serde(rename = "type")]
    pub module_type: String,
    /// Name used by a parent block's `.Data.Modules`. Defaults to the type.
    pub id: String,
    pub style: String,
    pub template: String,
    pub conditions: Conditions,
    /// Milliseconds. Zero uses the context default.
    pub timeout: u64,
}

fn parse<T: DeserializeOwned>(module_type: &str, value: serde_yaml::Value) -> Result<T> {
    serde_yaml::from_value(value)
        .map_err(|e| KitschError::Config(format!("invalid {} module: {}", module_type, e)))
}

/// Build the module for `module_type` from its YAML mapping.
fn create_module(module_type: &str, value: serde_yaml::Value) -> Result<Box<dyn Module>> {
    let module: Box<dyn Module> = match module_type {
        "block" => Box::new(block::BlockModule::new(parse(module_type, value)?)),
        "command_duration" => {
            Box::new(parse::<command_duration::CommandDurationModule>(module_type, value)?)
        }
        "cpu" => Box::new(parse::<cpu::CpuModule>(module_type, value)?),
        "custom" => Box::new(parse::<custom::CustomModule>(module_type, value)?),
        "directory" => Box::new(parse::<directory::DirectoryModule>(module_type, value)?),
        "file" => Box::new(parse::<custom::FileModule>(module_type, value)?),
        "flexible_space" => Box::new(flexible_space::FlexibleSpaceModule),
        "git_diverged" => Box::new(parse::<git_diverged::GitDivergedModule>(module_type, value)?),
        "git_head" => Box::new(parse::<git_head::GitHeadModule>(module_type, value)?),
        "git_state" => Box::new(parse::<git_state::GitStateModule>(module_type, value)?),
        "git_status" => Box::new(parse::<git_status::GitStatusModule>(module_type, value)?),
        "hostname" => Box::new(parse::<hostname::HostnameModule>(module_type, value)?),
        "jobs" => Box::new(parse::<jobs::JobsModule>(module_type, value)?),
        "kubernetes" => Box::new(parse::<kubernetes::KubernetesModule>(module_type, value)?),
        "project" => Box::new(parse::<project::ProjectModule>(module_type, value)?),
        "prompt" => Box::new(parse::<prompt::PromptModule>(module_type, value)?),
        "text" => Box::new(parse::<text::TextModule>(module_type, value)?),
        "time" => Box::new(parse::<time::TimeModule>(module_type, value)?),
        "username" => Box::new(parse::<username::UsernameModule>(module_type, value)?),
        other => {
            return Err(KitschError::Config(format!(
                "unknown module type \"{}\" (expected one of: {})",
                other,
                MODULE_TYPES.join(", ")
            )));
        }
    };
    Ok(module)
}

/// True if the shell session looks like it is over SSH.
fn is_ssh(context: &Context) -> bool {
    context
        .env
        .has_some(&["SSH_CLIENT", "SSH_CONNECTION", "SSH_TTY"])
}

/// Apply `descriptor` to `text`, or return `text` unchanged if the style is
/// empty or invalid.
fn apply_style(context: &Context, descriptor: &str, text: &str) -> String {
    if descriptor.is_empty() {
        return text.to_string();
    }
    match context.get_style(descriptor) {
        Some(style) => style.apply(text),
        None => text.to_string(),
    }
}

/// Report an invalid style in a module-specific field.
fn validate_style(styles: &Registry, field: &str, descriptor: &str, errors: &mut Vec<String>) {
    if !descriptor.is_empty()
        && let Err(err) = styles.get(descriptor)
    {
        errors.push(format!("{}: {}", field, err));
    }
}
