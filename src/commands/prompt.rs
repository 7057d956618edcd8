//! Implementation of the `kitsch prompt` command.
//!
//! Loads the configuration, builds a [`Context`] from what the shell told us
//! (or from a demo file), renders the root module, and writes the result to
//! stdout wrapped for the target shell.
//!
//! A broken configuration never leaves the user without a prompt: the error
//! goes to stderr and a plain `$ ` goes to stdout.

use crate::cli::PromptArgs;
use crate::config::{Config, default_cache_dir};
use crate::context::{Context, DemoConfig, Globals, GlobalsOptions};
use crate::error::{KitschError, Result};
use crate::logging;
use crate::perf::Performance;
use crate::projects::default_project_types;
use crate::render::{render_prompt, wrap_escapes};
use crate::style::ColorLevel;
use std::io::Write;
use std::path::Path;
use std::sync::Arc;
use std::time::Instant;

/// Printed when the configuration can't be used.
pub const FALLBACK_PROMPT: &str = "$ ";

/// What `prompt` writes: the prompt itself, and optionally timings.
pub(crate) struct PromptOutput {
    pub prompt: String,
    pub performance: Option<Performance>,
}

/// Execute the `kitsch prompt` command.
pub fn cmd_prompt(args: PromptArgs, config_path: Option<&Path>) -> Result<()> {
    let config = match load_config(config_path) {
        Ok(config) => config,
        Err(err) => {
            eprintln!("Fatal error parsing configuration: {}", err);
            return write_stdout(FALLBACK_PROMPT);
        }
    };

    let level = ColorLevel::detect(|name| std::env::var(name).ok());
    let output = render(&args, &config, level)?;
    if let Some(performance) = &output.performance {
        eprint!("{}", performance);
    }
    write_stdout(&output.prompt)
}

fn load_config(config_path: Option<&Path>) -> Result<Config> {
    let config = Config::find(config_path)?;
    if config.prompt.is_none() {
        return Err(KitschError::Config("configuration is missing prompt".to_string()));
    }
    Ok(config)
}

fn write_stdout(text: &str) -> Result<()> {
    let mut stdout = std::io::stdout().lock();
    stdout
        .write_all(text.as_bytes())
        .and_then(|_| stdout.flush())
        .map_err(|e| KitschError::io("failed to write prompt", e))
}

/// Build the context for this invocation.
pub(crate) fn build_context(
    args: &PromptArgs,
    config: &Config,
    level: ColorLevel,
) -> Result<Arc<Context>> {
    let styles = config.styles(level);
    let mut context = match &args.demo {
        Some(path) => Context::demo(DemoConfig::load(path)?, styles),
        None => {
            let globals = Globals::detect(GlobalsOptions {
                shell: args.shell.clone(),
                cwd: args.path.clone(),
                logical_cwd: args.logical_path.clone(),
                terminal_width: args.terminal_width,
                status: args.status,
                jobs: args.jobs,
                previous_command_duration: args.cmd_duration,
                keymap: args.keymap.clone(),
            });
            let project_types = config.all_project_types().unwrap_or_else(|err| {
                logging::warn(format!("error in projectTypes: {}", err));
                default_project_types()
            });
            Context::new(
                globals,
                project_types,
                default_cache_dir(),
                styles,
                config.scan_timeout(),
            )
        }
    };
    context.default_timeout = config.timeout();
    context.flexible_space_replacement = config.flexible_space_replacement().to_string();
    Ok(Arc::new(context))
}

/// Render the configured prompt, ready to print.
pub(crate) fn render(args: &PromptArgs, config: &Config, level: ColorLevel) -> Result<PromptOutput> {
    let started = Instant::now();
    let root = config
        .prompt
        .as_ref()
        .ok_or_else(|| KitschError::Config("configuration is missing prompt".to_string()))?;

    let context = build_context(args, config, level)?;
    tracing::debug!(
        shell = %context.globals.shell,
        cwd = %context.globals.cwd,
        width = context.globals.terminal_width,
        "rendering prompt"
    );
    let (result, text) = render_prompt(&context, root);

    let performance = args.perf.then(|| {
        Performance::new("prompt", started.elapsed()).with_children(vec![result.performance])
    });
    Ok(PromptOutput {
        prompt: wrap_escapes(&context.globals.shell, &text),
        performance,
    })
}
