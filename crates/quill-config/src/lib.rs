//! Configuration management for Quill.
//!
//! Parses `quill.toml` configuration files with serde and provides
//! auto-discovery of config files in parent directories. Every section is
//! optional; missing settings fall back to the built-in defaults
//! (definition delimiters `{{` / `}}`, script delimiters `x( ` / ` )`,
//! evaluation cache capacity 512).
//!
//! CLI settings can be applied during load via [`CliSettings`].
//!
//! ```toml
//! [sigils]
//! definition_began = "{{"
//! definition_ended = "}}"
//! script_began = "x( "
//! script_ended = " )"
//!
//! [script]
//! bootstrap = "bootstrap.R"
//! working_dir = "data"
//! cache_capacity = 512
//! ```

mod dialect;

pub use dialect::Dialect;

use std::path::{Path, PathBuf};

use serde::Deserialize;

use quill_sigils::{SigilError, SigilPair};

/// Configuration filename to search for.
const CONFIG_FILENAME: &str = "quill.toml";

/// Default capacity of the script evaluation cache.
const DEFAULT_CACHE_CAPACITY: usize = 512;

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("{0}")]
    Sigil(#[from] SigilError),
}

/// CLI settings that override configuration file values.
///
/// All fields are optional. Only non-None values override the loaded
/// config.
#[derive(Debug, Default)]
pub struct CliSettings {
    /// Override the script bootstrap file.
    pub bootstrap: Option<PathBuf>,
    /// Override the script working directory.
    pub working_dir: Option<PathBuf>,
    /// Override the evaluation cache capacity.
    pub cache_capacity: Option<usize>,
}

/// Raw sigil configuration as parsed from TOML.
#[derive(Debug, Deserialize, Default)]
#[serde(default)]
struct SigilsConfigRaw {
    definition_began: Option<String>,
    definition_ended: Option<String>,
    script_began: Option<String>,
    script_ended: Option<String>,
}

/// Raw script configuration as parsed from TOML (paths as strings).
#[derive(Debug, Deserialize, Default)]
#[serde(default)]
struct ScriptConfigRaw {
    bootstrap: Option<String>,
    working_dir: Option<String>,
    cache_capacity: Option<usize>,
}

/// Resolved sigil settings.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SigilSettings {
    /// Delimiters wrapping definition references.
    pub definitions: SigilPair,
    /// Delimiters wrapping embedded script expressions.
    pub scripts: SigilPair,
}

/// Resolved script-evaluation settings with absolute paths.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ScriptSettings {
    /// Bootstrap script sourced into the interpreter on (re)initialization.
    pub bootstrap: Option<PathBuf>,
    /// Working directory exposed to the interpreter.
    pub working_dir: Option<PathBuf>,
    /// Evaluation cache capacity.
    pub cache_capacity: usize,
}

/// Application configuration.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Sigil configuration (raw, from TOML).
    sigils: SigilsConfigRaw,
    /// Script configuration (raw, from TOML).
    script: ScriptConfigRaw,

    /// Resolved sigil settings (set after loading).
    #[serde(skip)]
    pub sigils_resolved: Option<SigilSettings>,
    /// Resolved script settings (set after loading).
    #[serde(skip)]
    pub script_resolved: ScriptSettings,
    /// Path to the config file (set after loading).
    #[serde(skip)]
    pub config_path: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            sigils: SigilsConfigRaw::default(),
            script: ScriptConfigRaw::default(),
            sigils_resolved: None,
            script_resolved: ScriptSettings {
                cache_capacity: DEFAULT_CACHE_CAPACITY,
                ..ScriptSettings::default()
            },
            config_path: None,
        }
    }
}

impl Config {
    /// Load configuration, resolving all settings.
    ///
    /// When `path` is `None`, `quill.toml` is discovered by walking up
    /// from the current directory; absence of a config file is not an
    /// error and yields the defaults. `cli` overrides apply last.
    pub fn load(path: Option<&Path>, cli: Option<&CliSettings>) -> Result<Self, ConfigError> {
        let discovered;
        let path = match path {
            Some(path) => Some(path),
            None => {
                discovered = discover(&std::env::current_dir()?);
                discovered.as_deref()
            }
        };

        let mut config = match path {
            Some(path) => {
                let raw = std::fs::read_to_string(path)?;
                let mut config: Self = toml::from_str(&raw)?;
                config.config_path = Some(path.to_path_buf());
                config
            }
            None => Self::default(),
        };

        config.resolve(cli)?;
        Ok(config)
    }

    /// Parse configuration from a TOML string and resolve it.
    pub fn from_toml(raw: &str, cli: Option<&CliSettings>) -> Result<Self, ConfigError> {
        let mut config: Self = toml::from_str(raw)?;
        config.resolve(cli)?;
        Ok(config)
    }

    /// Resolved sigil settings.
    ///
    /// # Panics
    ///
    /// Panics if the config was deserialized directly rather than built
    /// through [`Config::load`] or [`Config::from_toml`].
    #[must_use]
    pub fn sigils(&self) -> &SigilSettings {
        self.sigils_resolved
            .as_ref()
            .expect("config loaded through Config::load")
    }

    /// Resolved script settings.
    #[must_use]
    pub fn script(&self) -> &ScriptSettings {
        &self.script_resolved
    }

    /// Resolve raw settings and apply CLI overrides.
    fn resolve(&mut self, cli: Option<&CliSettings>) -> Result<(), ConfigError> {
        let base = self
            .config_path
            .as_deref()
            .and_then(Path::parent)
            .unwrap_or(Path::new("."))
            .to_path_buf();

        let definitions = SigilPair::new(
            self.sigils
                .definition_began
                .as_deref()
                .unwrap_or(quill_sigils::DEF_BEGAN),
            self.sigils
                .definition_ended
                .as_deref()
                .unwrap_or(quill_sigils::DEF_ENDED),
        )?;
        let scripts = SigilPair::new(
            self.sigils
                .script_began
                .as_deref()
                .unwrap_or(quill_sigils::SCRIPT_BEGAN),
            self.sigils
                .script_ended
                .as_deref()
                .unwrap_or(quill_sigils::SCRIPT_ENDED),
        )?;
        self.sigils_resolved = Some(SigilSettings {
            definitions,
            scripts,
        });

        let resolve_path = |raw: &str| {
            let path = PathBuf::from(raw);
            if path.is_absolute() {
                path
            } else {
                base.join(path)
            }
        };

        self.script_resolved = ScriptSettings {
            bootstrap: self.script.bootstrap.as_deref().map(resolve_path),
            working_dir: self.script.working_dir.as_deref().map(resolve_path),
            cache_capacity: self.script.cache_capacity.unwrap_or(DEFAULT_CACHE_CAPACITY),
        };

        if let Some(cli) = cli {
            if let Some(bootstrap) = &cli.bootstrap {
                self.script_resolved.bootstrap = Some(bootstrap.clone());
            }
            if let Some(working_dir) = &cli.working_dir {
                self.script_resolved.working_dir = Some(working_dir.clone());
            }
            if let Some(capacity) = cli.cache_capacity {
                self.script_resolved.cache_capacity = capacity;
            }
        }

        Ok(())
    }
}

/// Search for `quill.toml` in `start` and its ancestors.
fn discover(start: &Path) -> Option<PathBuf> {
    start
        .ancestors()
        .map(|dir| dir.join(CONFIG_FILENAME))
        .find(|candidate| candidate.is_file())
}
