//! Configuration management for mdnb.
//!
//! Parses `mdnb.toml` configuration files with serde and provides
//! auto-discovery of config files in parent directories.
//!
//! CLI settings can be applied during load via [`CliSettings`].
//!
//! Path values (`notebook.source_dir`, `templates.dir`) support `~`
//! expansion and are resolved relative to the config file's directory.

use std::path::{Path, PathBuf};

use serde::Deserialize;

/// Configuration filename to search for.
const CONFIG_FILENAME: &str = "mdnb.toml";

/// CLI settings that override configuration file values.
///
/// All fields are optional. Only non-None values override the loaded config.
#[derive(Debug, Default)]
pub struct CliSettings {
    /// Override notebook source directory.
    pub source_dir: Option<PathBuf>,
    /// Override template directory.
    pub template_dir: Option<PathBuf>,
    /// Override default template name.
    pub default_template: Option<String>,
    /// Override cache enabled flag.
    pub cache_enabled: Option<bool>,
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
}

/// Application configuration.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Notebook configuration (paths are relative strings from TOML).
    notebook: NotebookConfigRaw,
    /// Template configuration (paths are relative strings from TOML).
    templates: TemplatesConfigRaw,
    /// Rendering configuration.
    pub render: RenderConfig,

    /// Resolved notebook configuration (set after loading).
    #[serde(skip)]
    pub notebook_resolved: NotebookConfig,
    /// Resolved template configuration (set after loading).
    #[serde(skip)]
    pub templates_resolved: TemplatesConfig,
    /// Path to the config file (set after loading).
    #[serde(skip)]
    pub config_path: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self::default_with_base(Path::new("."))
    }
}

/// Raw notebook configuration as parsed from TOML (paths as strings).
#[derive(Debug, Deserialize, Default)]
#[serde(default)]
struct NotebookConfigRaw {
    source_dir: Option<String>,
    doc_extension: Option<String>,
    cache_enabled: Option<bool>,
}

/// Resolved notebook configuration with absolute paths.
#[derive(Debug, Default)]
pub struct NotebookConfig {
    /// Root directory of the markdown notebook.
    pub source_dir: PathBuf,
    /// Extension identifying document files (without the dot).
    pub doc_extension: String,
    /// Whether compiled-output caching is enabled.
    pub cache_enabled: bool,
}

/// Raw template configuration as parsed from TOML (paths as strings).
#[derive(Debug, Deserialize, Default)]
#[serde(default)]
struct TemplatesConfigRaw {
    dir: Option<String>,
    patterns: Option<Vec<String>>,
    default: Option<String>,
}

/// Resolved template configuration with absolute paths.
#[derive(Debug)]
pub struct TemplatesConfig {
    /// Directory holding template files.
    pub dir: PathBuf,
    /// Glob patterns used to discover templates, in priority order.
    pub patterns: Vec<String>,
    /// Template used when a document names none.
    pub default: String,
}

impl Default for TemplatesConfig {
    fn default() -> Self {
        Self {
            dir: PathBuf::new(),
            patterns: default_patterns(),
            default: "index".to_owned(),
        }
    }
}

fn default_patterns() -> Vec<String> {
    ["*.html", "*.j2.html", "*.j2", "*.tmpl"]
        .iter()
        .map(|&p| p.to_owned())
        .collect()
}

/// Rendering configuration.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct RenderConfig {
    /// Whether GitHub Flavored Markdown extensions are enabled.
    pub gfm: bool,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self { gfm: true }
    }
}

/// Require a string field to be non-empty.
fn require_non_empty(value: &str, field: &str) -> Result<(), ConfigError> {
    if value.is_empty() {
        return Err(ConfigError::Validation(format!("{field} cannot be empty")));
    }
    Ok(())
}

impl Config {
    /// Load configuration from file with optional CLI settings.
    ///
    /// If `config_path` is provided, loads from that file.
    /// Otherwise, searches for `mdnb.toml` in current directory and parents.
    ///
    /// CLI settings are applied after loading and path resolution, allowing CLI
    /// arguments to take precedence over config file values.
    ///
    /// # Errors
    ///
    /// Returns error if explicit `config_path` doesn't exist or parsing fails.
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
            tracing::debug!(path = %discovered.display(), "discovered configuration file");
            Self::load_from_file(&discovered)?
        } else {
            Self::default_with_cwd()
        };

        if let Some(settings) = cli_settings {
            config.apply_cli_settings(settings);
        }

        Ok(config)
    }

    /// Apply CLI settings to the configuration.
    fn apply_cli_settings(&mut self, settings: &CliSettings) {
        if let Some(source_dir) = &settings.source_dir {
            self.notebook_resolved.source_dir.clone_from(source_dir);
        }
        if let Some(template_dir) = &settings.template_dir {
            self.templates_resolved.dir.clone_from(template_dir);
        }
        if let Some(default_template) = &settings.default_template {
            self.templates_resolved.default.clone_from(default_template);
        }
        if let Some(cache_enabled) = settings.cache_enabled {
            self.notebook_resolved.cache_enabled = cache_enabled;
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
            notebook: NotebookConfigRaw::default(),
            templates: TemplatesConfigRaw::default(),
            render: RenderConfig::default(),
            notebook_resolved: NotebookConfig {
                source_dir: base.to_path_buf(),
                doc_extension: "md".to_owned(),
                cache_enabled: true,
            },
            templates_resolved: TemplatesConfig {
                dir: base.join("templates"),
                ..TemplatesConfig::default()
            },
            config_path: None,
        }
    }

    /// Load configuration from a specific file.
    fn load_from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        let mut config: Self = toml::from_str(&content)?;

        let config_dir = path.parent().unwrap_or(Path::new("."));
        config.resolve_paths(config_dir);
        config.config_path = Some(path.to_path_buf());

        config.validate()?;

        Ok(config)
    }

    /// Validate configuration values.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Validation` if any validation fails.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let ext = &self.notebook_resolved.doc_extension;
        require_non_empty(ext, "notebook.doc_extension")?;
        if ext.starts_with('.') {
            return Err(ConfigError::Validation(format!(
                "notebook.doc_extension must not include the dot: {ext:?}"
            )));
        }
        require_non_empty(&self.templates_resolved.default, "templates.default")?;
        if self.templates_resolved.patterns.is_empty() {
            return Err(ConfigError::Validation(
                "templates.patterns cannot be empty".to_owned(),
            ));
        }
        Ok(())
    }

    /// Resolve relative paths to absolute paths based on config directory.
    ///
    /// A leading `~` expands to the user's home directory before joining.
    fn resolve_paths(&mut self, config_dir: &Path) {
        let resolve = |path: Option<&str>, default: &str| {
            let raw = path.unwrap_or(default);
            let expanded = shellexpand::tilde(raw);
            config_dir.join(&*expanded)
        };

        self.notebook_resolved = NotebookConfig {
            source_dir: resolve(self.notebook.source_dir.as_deref(), "."),
            doc_extension: self
                .notebook
                .doc_extension
                .clone()
                .unwrap_or_else(|| "md".to_owned()),
            cache_enabled: self.notebook.cache_enabled.unwrap_or(true),
        };

        self.templates_resolved = TemplatesConfig {
            dir: resolve(self.templates.dir.as_deref(), "templates"),
            patterns: self
                .templates
                .patterns
                .clone()
                .unwrap_or_else(default_patterns),
            default: self
                .templates
                .default
                .clone()
                .unwrap_or_else(|| "index".to_owned()),
        };
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default_with_base(Path::new("/test"));
        assert_eq!(config.notebook_resolved.source_dir, PathBuf::from("/test"));
        assert_eq!(config.notebook_resolved.doc_extension, "md");
        assert!(config.notebook_resolved.cache_enabled);
        assert_eq!(
            config.templates_resolved.dir,
            PathBuf::from("/test/templates")
        );
        assert_eq!(config.templates_resolved.default, "index");
        assert!(config.render.gfm);
    }

    #[test]
    fn test_parse_minimal_config() {
        let config: Config = toml::from_str("").unwrap();
        assert!(config.render.gfm);
    }

    #[test]
    fn test_resolve_paths() {
        let toml = r#"
[notebook]
source_dir = "notes"
doc_extension = "markdown"
cache_enabled = false

[templates]
dir = "shared/templates"
default = "page"
"#;
        let mut config: Config = toml::from_str(toml).unwrap();
        config.resolve_paths(Path::new("/project"));

        assert_eq!(
            config.notebook_resolved.source_dir,
            PathBuf::from("/project/notes")
        );
        assert_eq!(config.notebook_resolved.doc_extension, "markdown");
        assert!(!config.notebook_resolved.cache_enabled);
        assert_eq!(
            config.templates_resolved.dir,
            PathBuf::from("/project/shared/templates")
        );
        assert_eq!(config.templates_resolved.default, "page");
    }

    #[test]
    fn test_resolve_paths_defaults() {
        let mut config: Config = toml::from_str("").unwrap();
        config.resolve_paths(Path::new("/project"));

        assert_eq!(
            config.notebook_resolved.source_dir,
            PathBuf::from("/project")
        );
        assert_eq!(
            config.templates_resolved.dir,
            PathBuf::from("/project/templates")
        );
        assert_eq!(config.templates_resolved.patterns, default_patterns());
    }

    #[test]
    fn test_parse_render_config() {
        let toml = r"
[render]
gfm = false
";
        let config: Config = toml::from_str(toml).unwrap();
        assert!(!config.render.gfm);
    }

    #[test]
    fn test_load_explicit_missing_file() {
        let result = Config::load(Some(Path::new("/no/such/mdnb.toml")), None);
        assert!(matches!(result, Err(ConfigError::NotFound(_))));
    }

    #[test]
    fn test_load_from_file() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("mdnb.toml");
        std::fs::write(&path, "[notebook]\nsource_dir = \"docs\"\n").unwrap();

        let config = Config::load(Some(&path), None).unwrap();
        assert_eq!(
            config.notebook_resolved.source_dir,
            tmp.path().join("docs")
        );
        assert_eq!(config.config_path, Some(path));
    }

    #[test]
    fn test_apply_cli_settings() {
        let mut config = Config::default_with_base(Path::new("/test"));
        let overrides = CliSettings {
            source_dir: Some(PathBuf::from("/custom/notes")),
            cache_enabled: Some(false),
            default_template: Some("article".to_owned()),
            ..Default::default()
        };

        config.apply_cli_settings(&overrides);

        assert_eq!(
            config.notebook_resolved.source_dir,
            PathBuf::from("/custom/notes")
        );
        assert!(!config.notebook_resolved.cache_enabled);
        assert_eq!(config.templates_resolved.default, "article");
        // Unchanged
        assert_eq!(
            config.templates_resolved.dir,
            PathBuf::from("/test/templates")
        );
    }

    #[test]
    fn test_apply_cli_settings_empty() {
        let before = Config::default_with_base(Path::new("/test"));
        let mut config = Config::default_with_base(Path::new("/test"));

        config.apply_cli_settings(&CliSettings::default());

        assert_eq!(
            config.notebook_resolved.source_dir,
            before.notebook_resolved.source_dir
        );
        assert_eq!(
            config.notebook_resolved.cache_enabled,
            before.notebook_resolved.cache_enabled
        );
    }

    #[test]
    fn test_validate_default_passes() {
        let config = Config::default_with_base(Path::new("/test"));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_extension_with_dot() {
        let mut config = Config::default_with_base(Path::new("/test"));
        config.notebook_resolved.doc_extension = ".md".to_owned();

        let err = config.validate().unwrap_err();
        assert!(matches!(err, ConfigError::Validation(_)));
        assert!(err.to_string().contains("doc_extension"));
    }

    #[test]
    fn test_validate_empty_patterns() {
        let mut config = Config::default_with_base(Path::new("/test"));
        config.templates_resolved.patterns.clear();

        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("patterns"));
    }

    #[test]
    fn test_parse_error_surfaces() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("mdnb.toml");
        std::fs::write(&path, "not = valid = toml").unwrap();

        let result = Config::load(Some(&path), None);
        assert!(matches!(result, Err(ConfigError::Parse(_))));
    }
}
