//! Getters: configurable reads from a file, an environment variable, or the
//! output of a command.
//!
//! Command output can be memoized in the value cache. The cache key covers
//! the resolved executable's path, size and modification time, so upgrading
//! a tool invalidates its cached version string.

use crate::context::Context;
use crate::error::{KitschError, Result};
use crate::fs::look_path_safe;
use crate::template::{Template, Value};
use regex::Regex;
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use std::sync::LazyLock;
use std::time::UNIX_EPOCH;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum GetterType {
    /// Run a command and use its output.
    #[default]
    Custom,
    /// Read a file, relative to the working directory.
    File,
    /// Read the nearest file with the given name in the working directory
    /// or any ancestor.
    AncestorFile,
    /// Read an environment variable.
    Env,
}

/// How to interpret what a getter read.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AsType {
    Text,
    Json,
    Yaml,
    Toml,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct CacheSettings {
    pub enabled: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct CustomGetter {
    #[serde(rename = "type")]
    pub getter_type: GetterType,
    /// Command line, file name, or variable name, depending on the type.
    pub from: String,
    #[serde(rename = "as")]
    pub as_type: Option<AsType>,
    /// Template applied to the parsed value.
    pub value_template: String,
    /// If set, the first capture group (or the whole match) is the value.
    pub regex: String,
    pub cache: CacheSettings,
}

static ENV_VAR: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\$\{([A-Za-z_][A-Za-z0-9_]*)\}|\$([A-Za-z_][A-Za-z0-9_]*)").unwrap()
});

/// Expand a leading `~` and `$VAR`/`${VAR}` references in `path`, and make
/// it absolute relative to the working directory.
pub fn resolve_file(context: &Context, path: &str) -> PathBuf {
    let expanded = ENV_VAR.replace_all(path, |caps: &regex::Captures<'_>| {
        let name = caps.get(1).or_else(|| caps.get(2)).map_or("", |m| m.as_str());
        context.env.getenv(name)
    });

    let expanded = if expanded == "~" {
        context.globals.home.clone()
    } else if let Some(rest) = expanded
        .strip_prefix("~/")
        .or_else(|| expanded.strip_prefix("~\\"))
    {
        Path::new(&context.globals.home)
            .join(rest)
            .to_string_lossy()
            .into_owned()
    } else {
        expanded.into_owned()
    };

    let path = PathBuf::from(expanded);
    if path.is_absolute() {
        path
    } else {
        context.directory.path().join(path)
    }
}

fn getter_error(message: impl Into<String>) -> KitschError {
    KitschError::Getter(message.into())
}

fn modified_secs(meta: &fs::Metadata) -> u64 {
    meta.modified()
        .ok()
        .and_then(|t| t.duration_since(UNIX_EPOCH).ok())
        .map_or(0, |d| d.as_secs())
}

/// Run `command` in `cwd`, returning stdout followed by stderr.
pub(crate) fn run_command(executable: &Path, args: &[String], cwd: &Path) -> Result<Vec<u8>> {
    let output = Command::new(executable)
        .args(args)
        .current_dir(cwd)
        .stdin(Stdio::null())
        .output()
        .map_err(|e| getter_error(format!("error running \"{}\": {}", executable.display(), e)))?;

    if !output.status.success() {
        return Err(getter_error(format!(
            "\"{}\" exited with {}",
            executable.display(),
            output.status
        )));
    }

    let mut combined = output.stdout;
    combined.extend_from_slice(&output.stderr);
    Ok(combined)
}

impl CustomGetter {
    /// Check the regex and value template without running anything.
    pub fn validate(&self) -> Result<()> {
        if !self.regex.is_empty() {
            Regex::new(&self.regex)
                .map_err(|e| getter_error(format!("invalid regex \"{}\": {}", self.regex, e)))?;
        }
        if !self.value_template.is_empty() {
            Template::parse("valueTemplate", &self.value_template)?;
        }
        Ok(())
    }

    /// Read and interpret the value. Plain values come back as strings;
    /// structured values parsed with `as` and no `valueTemplate` come back as
    /// maps. A missing environment variable is the empty string.
    pub fn get_value(&self, context: &Context) -> Result<Value> {
        let raw = match self.getter_type {
            GetterType::Custom => self.custom_value(context)?,
            GetterType::File => {
                let path = resolve_file(context, &self.from);
                fs::read(&path)
                    .map_err(|e| getter_error(format!("could not read {}: {}", path.display(), e)))?
            }
            GetterType::AncestorFile => {
                let path = context
                    .directory
                    .find_file_in_ancestors(&self.from)
                    .ok_or_else(|| getter_error(format!("could not find file \"{}\"", self.from)))?;
                fs::read(&path)
                    .map_err(|e| getter_error(format!("could not read {}: {}", path.display(), e)))?
            }
            GetterType::Env => match context.env.var(&self.from) {
                Some(value) if !value.is_empty() => value.into_bytes(),
                _ => return Ok(Value::String(String::new())),
            },
        };
        let text = String::from_utf8_lossy(&raw);

        if !self.regex.is_empty() {
            let regex = Regex::new(&self.regex)
                .map_err(|e| getter_error(format!("invalid regex \"{}\": {}", self.regex, e)))?;
            let matched = regex
                .captures(&text)
                .map(|caps| {
                    caps.get(1)
                        .or_else(|| caps.get(0))
                        .map_or("", |m| m.as_str())
                        .to_string()
                })
                .unwrap_or_default();

            if self.value_template.is_empty() {
                return Ok(Value::String(matched));
            }
            return self.apply_template(context, AsType::Text, &matched);
        }

        match self.as_type {
            Some(AsType::Text) | None if self.value_template.is_empty() => {
                Ok(Value::String(text.trim().to_string()))
            }
            as_type => self.apply_template(context, as_type.unwrap_or(AsType::Text), &text),
        }
    }

    /// Like [`get_value`](Self::get_value), but only string results count.
    pub fn get_string(&self, context: &Context) -> Result<String> {
        match self.get_value(context)? {
            Value::String(s) => Ok(s),
            other => Err(getter_error(format!(
                "expected a string from \"{}\", got a {}",
                self.from,
                other.type_name()
            ))),
        }
    }

    fn apply_template(&self, context: &Context, as_type: AsType, text: &str) -> Result<Value> {
        let parsed = parse_as(as_type, text)?;
        if self.value_template.is_empty() {
            return Ok(parsed);
        }
        let template = Template::parse("valueTemplate", &self.value_template)?;
        let funcs = context.funcs();
        Ok(Value::String(template.execute(&parsed, &funcs)?))
    }

    fn custom_value(&self, context: &Context) -> Result<Vec<u8>> {
        let parts = shell_words::split(&self.from)
            .map_err(|e| getter_error(format!("invalid command \"{}\": {}", self.from, e)))?;
        let Some((program, args)) = parts.split_first() else {
            return Err(getter_error(format!("invalid command \"{}\"", self.from)));
        };

        let executable = look_path_safe(program)
            .ok_or_else(|| getter_error(format!("could not find executable \"{}\"", program)))?;
        // Symlinks (version managers, Homebrew) are keyed by their target.
        let resolved = fs::canonicalize(&executable).map_err(|e| {
            getter_error(format!("could not resolve executable \"{}\": {}", program, e))
        })?;
        let meta = fs::metadata(&resolved).map_err(|e| {
            getter_error(format!("could not stat executable \"{}\": {}", program, e))
        })?;

        let cwd = context.directory.path();
        let cache_key = self.cache.enabled.then(|| {
            format!(
                "{} {} -- {}/{} in {}",
                resolved.display(),
                args.join(" "),
                modified_secs(&meta),
                meta.len(),
                cwd.display()
            )
        });

        if let Some(key) = &cache_key
            && let Some(value) = context.cache.get(key)
        {
            tracing::trace!("cache hit for {}", key);
            return Ok(value);
        }

        let output = run_command(&executable, args, cwd)?;

        if let Some(key) = &cache_key
            && let Err(err) = context.cache.set(key, &output)
        {
            tracing::debug!("failed to cache output of {}: {}", program, err);
        }
        Ok(output)
    }
}

fn parse_as(as_type: AsType, text: &str) -> Result<Value> {
    let parsed: serde_json::Value = match as_type {
        AsType::Text => return Ok(Value::map([("Text", Value::from(text.trim()))])),
        AsType::Json => serde_json::from_str(text)
            .map_err(|e| getter_error(format!("invalid json: {}", e)))?,
        AsType::Yaml => serde_yaml::from_str(text)
            .map_err(|e| getter_error(format!("invalid yaml: {}", e)))?,
        AsType::Toml => toml::from_str(text)
            .map_err(|e| getter_error(format!("invalid toml: {}", e)))?,
    };
    if !parsed.is_object() {
        return Err(getter_error("expected an object"));
    }
    Ok(Value::from(parsed))
}

/// One getter, or a list of getters tried in order until one produces a
/// non-empty string.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GetterList(pub Vec<CustomGetter>);

impl<'de> Deserialize<'de> for GetterList {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum OneOrMany {
            One(CustomGetter),
            Many(Vec<CustomGetter>),
        }

        Ok(match OneOrMany::deserialize(deserializer)? {
            OneOrMany::One(getter) => GetterList(vec![getter]),
            OneOrMany::Many(getters) => GetterList(getters),
        })
    }
}

impl GetterList {
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// The first non-empty string any getter produces. Failures are logged
    /// and skipped.
    pub fn get_string(&self, context: &Context) -> String {
        for getter in &self.0 {
            match getter.get_string(context) {
                Ok(value) if !value.is_empty() => return value,
                Ok(_) => {}
                Err(err) => tracing::debug!("getter \"{}\" failed: {}", getter.from, err),
            }
        }
        String::new()
    }
}

impl From<CustomGetter> for GetterList {
    fn from(getter: CustomGetter) -> Self {
        GetterList(vec![getter])
    }
}
