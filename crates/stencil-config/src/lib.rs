//! Configuration management for stencil.
//!
//! Parses `stencil.toml` configuration files with serde and provides
//! auto-discovery of config files in parent directories.
//!
//! CLI settings can be applied during load via [`CliSettings`].
//!
//! ## Environment Variable Expansion
//!
//! Directory values support `~` and environment variable expansion:
//!
//! - `${VAR}` - expands to the value of VAR, errors if unset
//! - `${VAR:-default}` - expands to VAR if set, otherwise uses default
//!
//! Expanded fields:
//! - `site.template_dir`
//! - `site.output_dir`
//! - `site.content_dir`
//! - `site.shared_content`

mod expand;

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use glob::Pattern;
use serde::Deserialize;
use stencil_render::{BUILTIN_PARSERS, BUILTIN_RENDERERS};

/// CLI settings that override configuration file values.
///
/// All fields are optional. Only non-None values override the loaded config.
#[derive(Debug, Default)]
pub struct CliSettings {
    /// Override template directory.
    pub template_dir: Option<PathBuf>,
    /// Override output directory.
    pub output_dir: Option<PathBuf>,
    /// Override content directory. An empty path disables content.
    pub content_dir: Option<PathBuf>,
    /// Override default output extension. An empty string disables it.
    pub output_extension: Option<String>,
}

/// Configuration filename to search for.
const CONFIG_FILENAME: &str = "stencil.toml";

/// Application configuration.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Site configuration (paths are relative strings from TOML).
    site: SiteConfigRaw,
    /// Extra renderer tags, mapped to built-in renderer names.
    pub renderers: BTreeMap<String, String>,
    /// Extra content extensions, mapped to built-in parser names.
    pub parsers: BTreeMap<String, String>,

    /// Resolved site configuration (set after loading).
    #[serde(skip)]
    pub site_resolved: SiteConfig,
    /// Path to the config file (set after loading).
    #[serde(skip)]
    pub config_path: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self::default_with_base(Path::new("."))
    }
}

/// Raw site configuration as parsed from TOML (paths as strings).
#[derive(Debug, Deserialize, Default)]
#[serde(default)]
struct SiteConfigRaw {
    template_dir: Option<String>,
    output_dir: Option<String>,
    content_dir: Option<String>,
    shared_content: Option<String>,
    output_extension: Option<String>,
    exclude: Vec<String>,
}

/// Resolved site configuration with absolute paths.
#[derive(Debug, Default)]
pub struct SiteConfig {
    /// Root of the template tree.
    pub template_dir: PathBuf,
    /// Root of the output tree.
    pub output_dir: PathBuf,
    /// Root of per-template content; `None` when disabled.
    pub content_dir: Option<PathBuf>,
    /// Shared content path, relative to `content_dir`.
    pub shared_content: Option<PathBuf>,
    /// Default extension for rendered templates; `None` when disabled.
    pub output_extension: Option<String>,
    /// Compiled exclude patterns.
    pub exclude: Vec<Pattern>,
}

/// Configuration error.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// File not found.
    #[error("Configuration file not found: {}", .0.display())]
    NotFound(PathBuf),
    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    /// TOML parsing error.
    #[error("TOML parse error: {0}")]
    Parse(#[from] toml::de::Error),
    /// Validation error.
    #[error("Configuration error: {0}")]
    Validation(String),
    /// Environment variable error during expansion.
    #[error("Environment variable error in {field}: {message}")]
    EnvVar {
        /// Config field path (e.g., "`site.output_dir`").
        field: String,
        /// Error message (e.g., "${`DEPLOY_DIR`} not set").
        message: String,
    },
}

/// Require a path field to be non-empty.
fn require_non_empty(value: &Path, field: &str) -> Result<(), ConfigError> {
    if value.as_os_str().is_empty() {
        return Err(ConfigError::Validation(format!("{field} cannot be empty")));
    }
    Ok(())
}

/// Require an alias to name a built-in engine.
fn require_builtin(
    section: &str,
    aliases: &BTreeMap<String, String>,
    builtins: &[&str],
) -> Result<(), ConfigError> {
    for (key, name) in aliases {
        if key.is_empty() {
            return Err(ConfigError::Validation(format!(
                "[{section}] keys cannot be empty"
            )));
        }
        if !builtins.contains(&name.as_str()) {
            return Err(ConfigError::Validation(format!(
                "{section}.{key}: unknown engine '{name}' (expected one of: {})",
                builtins.join(", ")
            )));
        }
    }
    Ok(())
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.is_empty())
}

impl Config {
    /// Load configuration from file with optional CLI settings.
    ///
    /// If `config_path` is provided, loads from that file.
    /// Otherwise, searches for `stencil.toml` in current directory and parents.
    ///
    /// CLI settings are applied after loading and path resolution, allowing CLI
    /// arguments to take precedence over config file values.
    ///
    /// # Errors
    ///
    /// Returns error if explicit `config_path` doesn't exist, parsing fails,
    /// or the resulting configuration is invalid.
    pub fn load(
        config_path: Option<&Path>,
        cli_settings: Option<&CliSettings>,
    ) -> Result<Self, ConfigError> {
        let mut config = if let Some(path) = config_path {
            if !path.exists() {
                return Err(ConfigError::NotFound(path.to_path_buf()));
            }
            Self::load_from_file(path)?
        } else if let Some(discovered) = Self::discover_config() {
            Self::load_from_file(&discovered)?
        } else {
            Self::default_with_cwd()
        };

        if let Some(settings) = cli_settings {
            config.apply_cli_settings(settings);
        }

        config.validate()?;
        Ok(config)
    }

    /// Apply CLI settings to the configuration.
    fn apply_cli_settings(&mut self, settings: &CliSettings) {
        let site = &mut self.site_resolved;
        if let Some(template_dir) = &settings.template_dir {
            site.template_dir.clone_from(template_dir);
        }
        if let Some(output_dir) = &settings.output_dir {
            site.output_dir.clone_from(output_dir);
        }
        if let Some(content_dir) = &settings.content_dir {
            site.content_dir = Some(content_dir.clone()).filter(|d| !d.as_os_str().is_empty());
        }
        if let Some(output_extension) = &settings.output_extension {
            site.output_extension = non_empty(Some(output_extension.clone()));
        }
    }

    /// Search for config file in current directory and parents.
    fn discover_config() -> Option<PathBuf> {
        let mut current = std::env::current_dir().ok()?;
        loop {
            let candidate = current.join(CONFIG_FILENAME);
            if candidate.exists() {
                return Some(candidate);
            }
            if !current.pop() {
                return None;
            }
        }
    }

    /// Create default config with paths relative to current working directory.
    fn default_with_cwd() -> Self {
        let cwd = std::env::current_dir().unwrap_or_default();
        Self::default_with_base(&cwd)
    }

    /// Create default config with paths relative to given base directory.
    fn default_with_base(base: &Path) -> Self {
        Self {
            site: SiteConfigRaw::default(),
            renderers: BTreeMap::new(),
            parsers: BTreeMap::new(),
            site_resolved: SiteConfig {
                template_dir: base.join("templates"),
                output_dir: base.join("public"),
                content_dir: Some(base.join("content")),
                shared_content: None,
                output_extension: Some("html".to_owned()),
                exclude: Vec::new(),
            },
            config_path: None,
        }
    }

    /// Load configuration from a specific file.
    fn load_from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        let mut config: Self = toml::from_str(&content)?;

        // Expand environment variables before path resolution
        config.expand_env_vars()?;

        let config_dir = path.parent().unwrap_or(Path::new("."));
        config.resolve_paths(config_dir)?;
        config.config_path = Some(path.to_path_buf());

        Ok(config)
    }

    /// Validate configuration values.
    ///
    /// Called automatically by [`Config::load`] after CLI settings are applied.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Validation` if any validation fails.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.validate_site()?;
        require_builtin("renderers", &self.renderers, BUILTIN_RENDERERS)?;
        require_builtin("parsers", &self.parsers, BUILTIN_PARSERS)?;
        Ok(())
    }

    /// Validate site directories.
    fn validate_site(&self) -> Result<(), ConfigError> {
        let site = &self.site_resolved;
        require_non_empty(&site.template_dir, "site.template_dir")?;
        require_non_empty(&site.output_dir, "site.output_dir")?;

        if site.template_dir == site.output_dir {
            return Err(ConfigError::Validation(
                "site.output_dir must differ from site.template_dir".to_owned(),
            ));
        }
        // The walker would otherwise pick up its own output
        if site.output_dir.starts_with(&site.template_dir) {
            return Err(ConfigError::Validation(
                "site.output_dir cannot be inside site.template_dir".to_owned(),
            ));
        }

        Ok(())
    }

    /// Expand environment variable references in directory values.
    fn expand_env_vars(&mut self) -> Result<(), ConfigError> {
        let site = &mut self.site;
        for (value, field) in [
            (&mut site.template_dir, "site.template_dir"),
            (&mut site.output_dir, "site.output_dir"),
            (&mut site.content_dir, "site.content_dir"),
            (&mut site.shared_content, "site.shared_content"),
        ] {
            if let Some(raw) = value {
                *raw = expand::expand_env(raw, field)?;
            }
        }
        Ok(())
    }

    /// Resolve relative paths to absolute paths based on config directory.
    ///
    /// Compiles exclude patterns.
    fn resolve_paths(&mut self, config_dir: &Path) -> Result<(), ConfigError> {
        let resolve = |path: Option<&str>, default: &str| config_dir.join(path.unwrap_or(default));
        let site = &self.site;

        let content_dir = match site.content_dir.as_deref() {
            Some("") => None,
            other => Some(resolve(other, "content")),
        };

        let exclude = site
            .exclude
            .iter()
            .map(|pattern| {
                Pattern::new(pattern).map_err(|e| {
                    ConfigError::Validation(format!("site.exclude: invalid pattern '{pattern}': {e}"))
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        self.site_resolved = SiteConfig {
            template_dir: resolve(site.template_dir.as_deref(), "templates"),
            output_dir: resolve(site.output_dir.as_deref(), "public"),
            content_dir,
            shared_content: non_empty(site.shared_content.clone()).map(PathBuf::from),
            output_extension: match &site.output_extension {
                Some(ext) => non_empty(Some(ext.trim_start_matches('.').to_owned())),
                None => Some("html".to_owned()),
            },
            exclude,
        };

        Ok(())
    }
}
