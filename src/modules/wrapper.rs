//! A configured module: common settings, compiled template, and the module
//! itself, plus the machinery to run it concurrently.

use super::{CommonConfig, MODULE_STACK_SIZE, Module, create_module};
use crate::context::Context;
use crate::error::{KitschError, Result};
use crate::logging;
use crate::perf::Performance;
use crate::style::{CharacterColors, Registry};
use crate::template::{Template, TemplateError, Value};
use serde::Deserialize;
use std::fmt;
use std::sync::Arc;
use std::sync::mpsc::{self, Receiver, RecvTimeoutError};
use std::thread;
use std::time::{Duration, Instant};

struct Inner {
    config: CommonConfig,
    /// Compiled at load time. A broken template is kept so it can be
    /// reported, and the module falls back to its default text.
    template: Option<std::result::Result<Template, TemplateError>>,
    module: Box<dyn Module>,
}

/// A module plus its common configuration. Cheap to clone.
#[derive(Clone)]
pub struct ModuleWrapper {
    inner: Arc<Inner>,
}

/// The final output of a module: templated, styled text and its data.
#[derive(Debug, Clone, Default)]
pub struct RenderedModule {
    pub text: String,
    pub data: Value,
    pub start_style: CharacterColors,
    pub end_style: CharacterColors,
    pub performance: Performance,
}

impl RenderedModule {
    fn empty(name: String, elapsed: Duration) -> Self {
        RenderedModule {
            performance: Performance::new(name, elapsed),
            ..RenderedModule::default()
        }
    }

    /// `{Text, Data, StartStyle, EndStyle}`, as seen by a parent block's
    /// template.
    pub fn to_value(&self) -> Value {
        Value::map([
            ("Text", Value::from(self.text.as_str())),
            ("Data", self.data.clone()),
            ("StartStyle", Value::from_serialize(&self.start_style)),
            ("EndStyle", Value::from_serialize(&self.end_style)),
        ])
    }
}

impl ModuleWrapper {
    pub fn from_yaml_value(value: serde_yaml::Value) -> Result<ModuleWrapper> {
        if !value.is_mapping() {
            return Err(KitschError::Config(
                "expected a module, with at least a type".to_string(),
            ));
        }

        let mut config: CommonConfig = serde_yaml::from_value(value.clone())
            .map_err(|e| KitschError::Config(format!("invalid module: {}", e)))?;
        if config.module_type.is_empty() {
            return Err(KitschError::Config("module is missing a type".to_string()));
        }
        if config.id.is_empty() {
            config.id = config.module_type.clone();
        }

        let module = create_module(&config.module_type, value)?;
        let template = (!config.template.is_empty())
            .then(|| Template::parse(&config.id, &config.template));

        Ok(ModuleWrapper {
            inner: Arc::new(Inner {
                config,
                template,
                module,
            }),
        })
    }

    pub fn from_yaml(yaml: &str) -> Result<ModuleWrapper> {
        let value: serde_yaml::Value = serde_yaml::from_str(yaml)
            .map_err(|e| KitschError::Config(format!("invalid module: {}", e)))?;
        ModuleWrapper::from_yaml_value(value)
    }

    #[cfg(test)]
    pub(super) fn from_module(config: CommonConfig, module: Box<dyn Module>) -> ModuleWrapper {
        let template = (!config.template.is_empty())
            .then(|| Template::parse(&config.id, &config.template));
        ModuleWrapper {
            inner: Arc::new(Inner {
                config,
                template,
                module,
            }),
        }
    }

    pub fn id(&self) -> &str {
        &self.inner.config.id
    }

    pub fn module_type(&self) -> &str {
        &self.inner.config.module_type
    }

    /// Collect every problem in this module and its children.
    pub fn validate(&self, styles: &Registry, errors: &mut Vec<String>) {
        let mut own = Vec::new();
        if let Some(Err(err)) = &self.inner.template {
            own.push(err.to_string());
        }
        super::validate_style(styles, "style", &self.inner.config.style, &mut own);
        errors.extend(own.into_iter().map(|e| format!("{}: {}", self, e)));
        self.inner.module.validate(styles, errors);
    }

    fn timeout(&self, context: &Context) -> Option<Duration> {
        match self.inner.config.timeout {
            0 if self.module_type() == "block" => None,
            0 => Some(context.default_timeout),
            ms => Some(Duration::from_millis(ms)),
        }
    }

    /// Start running the module in the background. Modules whose conditions
    /// don't match finish immediately with no output.
    pub fn start(&self, context: &Arc<Context>) -> Pending {
        let started = Instant::now();
        let name = self.to_string();
        let conditions = &self.inner.config.conditions;
        if !conditions.is_empty() && !conditions.matches(&context.directory) {
            tracing::trace!("skipping {}: conditions not met", name);
            return Pending::ready(name, RenderedModule::empty(self.to_string(), Duration::ZERO));
        }

        let timeout = self.timeout(context);
        let (sender, receiver) = mpsc::channel();
        let wrapper = self.clone();
        let thread_context = Arc::clone(context);
        let spawned = thread::Builder::new()
            .name(name.clone())
            .stack_size(MODULE_STACK_SIZE)
            .spawn(move || {
                // The receiver is gone if we timed out; nothing to do then.
                let _ = sender.send(wrapper.render(&thread_context, started));
            });

        match spawned {
            Ok(_) => Pending {
                name,
                started,
                timeout,
                state: PendingState::Running(receiver),
            },
            Err(err) => {
                tracing::debug!("could not start a thread for {}: {}", name, err);
                let rendered = self.render(context, started);
                Pending::ready(name, rendered)
            }
        }
    }

    /// Run the module and wait for it.
    pub fn execute(&self, context: &Arc<Context>) -> RenderedModule {
        self.start(context).wait()
    }

    fn render(&self, context: &Arc<Context>, started: Instant) -> RenderedModule {
        let inner = &self.inner;
        let result = inner.module.execute(context);

        let mut text = result.default_text.clone();
        match &inner.template {
            Some(Ok(template)) => {
                let data = Value::map([
                    ("Text", Value::from(result.default_text.as_str())),
                    ("Data", result.data.clone()),
                    ("Globals", context.globals.to_value()),
                ]);
                match template.execute(&data, &context.funcs()) {
                    Ok(rendered) => text = rendered,
                    Err(err) => {
                        logging::warn(format!("error executing template in {}: {}", self, err))
                    }
                }
            }
            Some(Err(err)) => logging::warn(format!("error in template for {}: {}", self, err)),
            None => {}
        }

        let mut start_style = result.start_style;
        let mut end_style = result.end_style;
        let descriptor = if result.style_override.is_empty() {
            &inner.config.style
        } else {
            &result.style_override
        };
        if !descriptor.is_empty()
            && !text.is_empty()
            && let Some(style) = context.get_style(descriptor)
        {
            let (styled, start, end) = style.apply_get_colors(&text);
            text = styled;
            start_style = merge_colors(start, start_style);
            end_style = merge_colors(end, end_style);
        }

        RenderedModule {
            text,
            data: result.data,
            start_style,
            end_style,
            performance: Performance::new(self.to_string(), started.elapsed())
                .with_children(result.children),
        }
    }
}

/// Colours from the module's own style win; anything it leaves unset comes
/// from what the module reported (e.g. a block's first or last child).
fn merge_colors(styled: CharacterColors, reported: CharacterColors) -> CharacterColors {
    CharacterColors {
        fg: if styled.fg.is_empty() { reported.fg } else { styled.fg },
        bg: if styled.bg.is_empty() { reported.bg } else { styled.bg },
    }
}

/// `type`, or `type#id` when the id was set explicitly.
impl fmt::Display for ModuleWrapper {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let config = &self.inner.config;
        if config.id == config.module_type {
            f.write_str(&config.module_type)
        } else {
            write!(f, "{}#{}", config.module_type, config.id)
        }
    }
}

impl fmt::Debug for ModuleWrapper {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ModuleWrapper")
            .field("config", &self.inner.config)
            .finish_non_exhaustive()
    }
}

impl<'de> Deserialize<'de> for ModuleWrapper {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let value = serde_yaml::Value::deserialize(deserializer)?;
        ModuleWrapper::from_yaml_value(value).map_err(serde::de::Error::custom)
    }
}

enum PendingState {
    Ready(RenderedModule),
    Running(Receiver<RenderedModule>),
}

/// A module that has been started and not yet collected.
pub struct Pending {
    name: String,
    started: Instant,
    timeout: Option<Duration>,
    state: PendingState,
}

impl Pending {
    fn ready(name: String, rendered: RenderedModule) -> Self {
        Pending {
            name,
            started: Instant::now(),
            timeout: None,
            state: PendingState::Ready(rendered),
        }
    }

    /// Wait for the module to finish. The timeout counts from when the
    /// module was started, so waiting on several modules in turn costs at
    /// most the longest timeout. A module that times out or panics yields
    /// an empty result.
    pub fn wait(self) -> RenderedModule {
        let receiver = match self.state {
            PendingState::Ready(rendered) => return rendered,
            PendingState::Running(receiver) => receiver,
        };

        let received = match self.timeout {
            Some(timeout) => receiver
                .recv_timeout(timeout.saturating_sub(self.started.elapsed()))
                .map_err(|err| match err {
                    RecvTimeoutError::Timeout => format!(
                        "module {} timed out after {}ms",
                        self.name,
                        timeout.as_millis()
                    ),
                    RecvTimeoutError::Disconnected => format!("module {} failed", self.name),
                }),
            None => receiver
                .recv()
                .map_err(|_| format!("module {} failed", self.name)),
        };

        received.unwrap_or_else(|message| {
            logging::warn(&message);
            RenderedModule::empty(format!("{} (no result)", self.name), self.started.elapsed())
        })
    }
}
