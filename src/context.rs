//! Per-invocation context shared by every module.
//!
//! A [`Context`] is built once per prompt, either from the live system
//! ([`Context::new`]) or from a demo file ([`Context::demo`]), and shared
//! read-only between module threads. The git handle is the one lazily
//! initialized piece.

use crate::cache::{Cache, FileCache, MemoryCache};
use crate::env::{Environment, MapEnvironment, OsEnvironment};
use crate::error::{KitschError, Result};
use crate::fs::Directory;
use crate::git::{CachingGit, DemoGit, Git, GitRepo};
use crate::projects::ProjectType;
use crate::style::{Registry, Style};
use crate::template::{Funcs, Value};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{MAIN_SEPARATOR, Path, PathBuf};
use std::sync::{Arc, OnceLock};
use std::time::Duration;

/// Default per-module timeout.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_millis(200);

/// Default bound on how long listing the working directory may take.
pub const DEFAULT_SCAN_TIMEOUT: Duration = Duration::from_millis(100);

/// Used when the terminal width cannot be determined.
pub const DEFAULT_TERMINAL_WIDTH: usize = 80;

/// Values every module and template can see, as `.Globals` in templates.
///
/// Demo files spell these in camelCase; templates see them in PascalCase.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Globals {
    #[serde(rename(serialize = "CWD", deserialize = "cwd"))]
    pub cwd: String,
    /// Directory to display, when it differs from `cwd` (e.g. a path
    /// through a symlink).
    #[serde(skip_serializing, rename = "logicalCwd")]
    pub logical_cwd: String,
    #[serde(rename(serialize = "Home", deserialize = "home"))]
    pub home: String,
    #[serde(rename(serialize = "IsRoot", deserialize = "isRoot"))]
    pub is_root: bool,
    #[serde(rename(serialize = "Hostname", deserialize = "hostname"))]
    pub hostname: String,
    #[serde(rename(serialize = "Jobs", deserialize = "jobs"))]
    pub jobs: i64,
    /// Exit status of the previous command.
    #[serde(rename(serialize = "Status", deserialize = "previousCommandStatus"))]
    pub status: i64,
    /// Duration of the previous command, in milliseconds.
    #[serde(rename(
        serialize = "PreviousCommandDuration",
        deserialize = "previousCommandDuration"
    ))]
    pub previous_command_duration: i64,
    /// zsh/fish keymap: empty or `main` when inserting, `vicmd` in normal mode.
    #[serde(rename(serialize = "Keymap", deserialize = "keymap"))]
    pub keymap: String,
    #[serde(rename(serialize = "Shell", deserialize = "shell"))]
    pub shell: String,
    #[serde(rename(serialize = "TerminalWidth", deserialize = "width"))]
    pub terminal_width: usize,
    #[serde(rename(serialize = "PathSeparator", deserialize = "pathSeparator"))]
    pub path_separator: String,
}

/// What the shell tells us about the prompt being drawn.
#[derive(Debug, Clone, Default)]
pub struct GlobalsOptions {
    pub shell: String,
    pub cwd: Option<PathBuf>,
    pub logical_cwd: Option<String>,
    pub terminal_width: Option<usize>,
    pub status: i64,
    pub jobs: i64,
    pub previous_command_duration: i64,
    pub keymap: String,
}

#[cfg(unix)]
fn is_root() -> bool {
    nix::unistd::geteuid().is_root()
}

#[cfg(not(unix))]
fn is_root() -> bool {
    false
}

impl Globals {
    /// Fill in everything the shell didn't tell us from the running system.
    pub fn detect(options: GlobalsOptions) -> Globals {
        let cwd = options
            .cwd
            .or_else(|| std::env::current_dir().ok())
            .unwrap_or_else(|| PathBuf::from("."));
        let home = dirs::home_dir()
            .map(|h| h.to_string_lossy().into_owned())
            .unwrap_or_else(|| "~".to_string());
        let hostname = hostname::get()
            .map(|h| h.to_string_lossy().into_owned())
            .unwrap_or_default();
        let terminal_width = options
            .terminal_width
            .filter(|w| *w > 0)
            .or_else(|| crossterm::terminal::size().ok().map(|(w, _)| w as usize))
            .filter(|w| *w > 0)
            .unwrap_or(DEFAULT_TERMINAL_WIDTH);

        Globals {
            cwd: cwd.to_string_lossy().into_owned(),
            logical_cwd: options.logical_cwd.unwrap_or_default(),
            home,
            is_root: is_root(),
            hostname,
            jobs: options.jobs,
            status: options.status,
            previous_command_duration: options.previous_command_duration,
            keymap: options.keymap,
            shell: options.shell,
            terminal_width,
            path_separator: MAIN_SEPARATOR.to_string(),
        }
    }

    /// The directory to show the user.
    pub fn logical_cwd(&self) -> &str {
        if self.logical_cwd.is_empty() {
            &self.cwd
        } else {
            &self.logical_cwd
        }
    }

    pub fn to_value(&self) -> Value {
        Value::from_serialize(self)
    }
}

/// Facts to render a prompt from without looking at the real system: for
/// screenshots, documentation, and tests.
#[derive(Debug, Clone)]
pub struct DemoConfig {
    pub globals: Globals,
    pub env: HashMap<String, String>,
    pub git: Option<DemoGit>,
    pub cwd_is_read_only: bool,
}

impl Default for DemoConfig {
    fn default() -> Self {
        DemoConfig {
            globals: Globals {
                cwd: "/users/jwalton".to_string(),
                home: "/users/jwalton".to_string(),
                hostname: "orac".to_string(),
                shell: "demo".to_string(),
                terminal_width: DEFAULT_TERMINAL_WIDTH,
                path_separator: "/".to_string(),
                ..Globals::default()
            },
            env: HashMap::from([("USER".to_string(), "jwalton".to_string())]),
            git: None,
            cwd_is_read_only: false,
        }
    }
}

impl DemoConfig {
    /// Parse a demo file. Globals the file leaves out keep their demo
    /// defaults.
    pub fn from_yaml(contents: &str) -> Result<DemoConfig> {
        #[derive(Deserialize)]
        #[serde(rename_all = "camelCase")]
        struct Raw {
            #[serde(default)]
            globals: serde_yaml::Mapping,
            env: Option<HashMap<String, String>>,
            git: Option<DemoGit>,
            #[serde(default)]
            cwd_is_read_only: bool,
        }

        let raw: Raw = serde_yaml::from_str(contents)
            .map_err(|e| KitschError::Config(format!("invalid demo file: {}", e)))?;

        let mut config = DemoConfig::default();
        let mut globals: serde_yaml::Mapping = demo_globals(&config.globals)
            .into_iter()
            .map(|(key, value)| (key.into(), value))
            .collect();
        for (key, value) in raw.globals {
            globals.insert(key, value);
        }
        config.globals = serde_yaml::from_value(serde_yaml::Value::Mapping(globals))
            .map_err(|e| KitschError::Config(format!("invalid demo globals: {}", e)))?;

        if let Some(env) = raw.env {
            config.env = env;
        }
        config.git = raw.git;
        config.cwd_is_read_only = raw.cwd_is_read_only;
        Ok(config)
    }

    pub fn load(path: &Path) -> Result<DemoConfig> {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| KitschError::io(format!("failed to read demo file {}", path.display()), e))?;
        DemoConfig::from_yaml(&contents)
    }
}

fn demo_globals(globals: &Globals) -> Vec<(&'static str, serde_yaml::Value)> {
    vec![
        ("cwd", globals.cwd.clone().into()),
        ("home", globals.home.clone().into()),
        ("hostname", globals.hostname.clone().into()),
        ("shell", globals.shell.clone().into()),
        (
            "width",
            serde_yaml::Value::Number((globals.terminal_width as u64).into()),
        ),
        ("pathSeparator", globals.path_separator.clone().into()),
    ]
}

/// Everything a module may look at while it executes.
pub struct Context {
    pub globals: Globals,
    pub directory: Directory,
    pub env: Box<dyn Environment>,
    pub project_types: Vec<ProjectType>,
    pub cache: Box<dyn Cache>,
    pub styles: Registry,
    /// Timeout for modules that don't set their own.
    pub default_timeout: Duration,
    /// What a flexible space becomes when there is no room to expand it.
    pub flexible_space_replacement: String,
    git: OnceLock<Option<Arc<dyn Git>>>,
}

impl Context {
    pub fn new(
        globals: Globals,
        project_types: Vec<ProjectType>,
        cache_dir: PathBuf,
        styles: Registry,
        scan_timeout: Duration,
    ) -> Context {
        let directory = Directory::new(&globals.cwd, scan_timeout);
        Context {
            globals,
            directory,
            env: Box::new(OsEnvironment),
            project_types,
            cache: Box::new(FileCache::new(cache_dir)),
            styles,
            default_timeout: DEFAULT_TIMEOUT,
            flexible_space_replacement: " ".to_string(),
            git: OnceLock::new(),
        }
    }

    /// A context that never touches the real environment, git, or cache.
    pub fn demo(config: DemoConfig, styles: Registry) -> Context {
        let directory = Directory::new(&config.globals.cwd, DEFAULT_SCAN_TIMEOUT)
            .with_read_only(config.cwd_is_read_only);
        let git = OnceLock::new();
        let _ = git.set(config.git.map(|g| Arc::new(g) as Arc<dyn Git>));
        Context {
            globals: config.globals,
            directory,
            env: Box::new(MapEnvironment::new(config.env)),
            project_types: Vec::new(),
            cache: Box::new(MemoryCache::new()),
            styles,
            default_timeout: DEFAULT_TIMEOUT,
            flexible_space_replacement: " ".to_string(),
            git,
        }
    }

    /// Use `git` instead of discovering the repository.
    #[cfg(test)]
    pub fn with_git(self, git: Option<Arc<dyn Git>>) -> Context {
        let cell = OnceLock::new();
        let _ = cell.set(git);
        Context { git: cell, ..self }
    }

    /// The repository containing the working directory, or `None` if there
    /// isn't one or git is not installed. Looked up on first use.
    pub fn git(&self) -> Option<Arc<dyn Git>> {
        self.git
            .get_or_init(|| {
                GitRepo::open("git", Path::new(&self.globals.cwd))
                    .map(|repo| Arc::new(CachingGit::new(Box::new(repo))) as Arc<dyn Git>)
            })
            .clone()
    }

    /// Template functions bound to this context.
    pub fn funcs(&self) -> Funcs<'_> {
        Funcs {
            styles: &self.styles,
            env: self.env.as_ref(),
            terminal_width: self.globals.terminal_width,
        }
    }

    /// Compile a style, warning and returning `None` if it is invalid.
    pub fn get_style(&self, descriptor: &str) -> Option<Arc<Style>> {
        match self.styles.get(descriptor) {
            Ok(style) => Some(style),
            Err(err) => {
                crate::logging::warn(err);
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::style::ColorLevel;
    use serial_test::serial;

    #[cfg(unix)]
    #[test]
    fn test_is_root_matches_owner_of_new_files() {
        use std::os::unix::fs::MetadataExt;

        let temp = tempfile::NamedTempFile::new().unwrap();
        let owner = temp.as_file().metadata().unwrap().uid();
        assert_eq!(is_root(), owner == 0);
    }

    #[test]
    fn test_globals_template_names() {
        let globals = Globals {
            cwd: "/a".to_string(),
            terminal_width: 80,
            status: 1,
            ..Globals::default()
        };
        let value = globals.to_value();
        assert_eq!(value.field("CWD"), Some(&Value::from("/a")));
        assert_eq!(value.field("TerminalWidth"), Some(&Value::Int(80)));
        assert_eq!(value.field("Status"), Some(&Value::Int(1)));
        assert_eq!(value.field("logicalCwd"), None);
    }

    #[test]
    fn test_logical_cwd() {
        let mut globals = Globals {
            cwd: "/private/tmp".to_string(),
            ..Globals::default()
        };
        assert_eq!(globals.logical_cwd(), "/private/tmp");
        globals.logical_cwd = "/tmp".to_string();
        assert_eq!(globals.logical_cwd(), "/tmp");
    }

    #[test]
    fn test_demo_config_keeps_defaults() {
        let demo = DemoConfig::from_yaml(
            "globals:\n  cwd: /users/jwalton/kitsch\n  previousCommandStatus: 2\ngit:\n  head: main\n",
        )
        .unwrap();
        assert_eq!(demo.globals.cwd, "/users/jwalton/kitsch");
        assert_eq!(demo.globals.home, "/users/jwalton");
        assert_eq!(demo.globals.hostname, "orac");
        assert_eq!(demo.globals.status, 2);
        assert_eq!(demo.globals.terminal_width, 80);
        assert_eq!(demo.env.get("USER").map(String::as_str), Some("jwalton"));
        assert_eq!(demo.git.unwrap().head, "main");
    }

    #[test]
    fn test_demo_context() {
        let demo = DemoConfig {
            cwd_is_read_only: true,
            ..DemoConfig::default()
        };
        let ctx = Context::demo(demo, Registry::new(ColorLevel::TrueColor));
        assert!(ctx.directory.is_read_only());
        assert!(ctx.git().is_none());
        assert_eq!(ctx.env.getenv("USER"), "jwalton");
    }

    #[test]
    fn test_detect_uses_given_values() {
        let globals = Globals::detect(GlobalsOptions {
            shell: "zsh".to_string(),
            cwd: Some(PathBuf::from("/tmp")),
            terminal_width: Some(120),
            jobs: 2,
            ..GlobalsOptions::default()
        });
        assert_eq!(globals.cwd, "/tmp");
        assert_eq!(globals.shell, "zsh");
        assert_eq!(globals.terminal_width, 120);
        assert_eq!(globals.jobs, 2);
        assert_eq!(globals.path_separator, MAIN_SEPARATOR.to_string());
    }

    #[test]
    #[serial]
    fn test_detect_defaults_to_current_dir() {
        let temp = tempfile::TempDir::new().unwrap();
        let expected = std::fs::canonicalize(temp.path()).unwrap();
        let _guard = crate::test_support::DirGuard::new(&expected);

        let globals = Globals::detect(GlobalsOptions::default());
        assert_eq!(globals.cwd, expected.to_string_lossy());
        assert!(globals.terminal_width > 0);
    }
}
