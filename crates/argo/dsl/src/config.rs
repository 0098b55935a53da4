//! Configuration for argo-dsl

use serde::{Deserialize, Serialize};

/// Main compiler configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DslConfig {
    /// Script template settings
    #[serde(default)]
    pub script: ScriptConfig,

    /// Output settings
    #[serde(default)]
    pub render: RenderConfig,
}

/// Script template configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScriptConfig {
    /// Image used when a script template names none
    #[serde(default)]
    pub default_image: String,

    /// Runtime for bash scripts
    #[serde(default = "default_bash_command")]
    pub bash_command: String,

    /// Runtime for python scripts
    #[serde(default = "default_python_command")]
    pub python_command: String,

    /// Runtime for plain scripts
    #[serde(default = "default_plain_command")]
    pub plain_command: String,

    /// Where the heredoc runner writes the script
    #[serde(default = "default_runner_path")]
    pub runner_path: String,

    #[serde(default = "default_heredoc_delimiter")]
    pub heredoc_delimiter: String,

    /// Shell run before the script; enables the heredoc runner
    #[serde(default)]
    pub pre_run: String,

    /// Shell run after the script; enables the heredoc runner
    #[serde(default)]
    pub post_run: String,

    /// Use the heredoc runner even without pre/post commands
    #[serde(default)]
    pub always_wrap: bool,
}

impl Default for ScriptConfig {
    fn default() -> Self {
        Self {
            default_image: String::new(),
            bash_command: default_bash_command(),
            python_command: default_python_command(),
            plain_command: default_plain_command(),
            runner_path: default_runner_path(),
            heredoc_delimiter: default_heredoc_delimiter(),
            pre_run: String::new(),
            post_run: String::new(),
            always_wrap: false,
        }
    }
}

fn default_bash_command() -> String {
    "bash".to_string()
}

fn default_python_command() -> String {
    "python".to_string()
}

fn default_plain_command() -> String {
    "sh".to_string()
}

fn default_runner_path() -> String {
    "/tmp/script".to_string()
}

fn default_heredoc_delimiter() -> String {
    "EOL".to_string()
}

/// Output configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RenderConfig {
    #[serde(default)]
    pub format: RenderFormat,
}

/// Serialization format for compiled templates and steps
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RenderFormat {
    #[default]
    Yaml,
    Json,
}

impl DslConfig {
    /// Load configuration from file
    pub fn load(path: Option<&str>) -> Result<Self, config::ConfigError> {
        let mut builder = config::Config::builder();

        // Add default configuration
        builder = builder.add_source(config::Config::try_from(&DslConfig::default())?);

        // Add file configuration if provided
        if let Some(path) = path {
            builder = builder.add_source(config::File::with_name(path).required(false));
        }

        // Add environment variables, e.g. ARGO_DSL_SCRIPT__DEFAULT_IMAGE
        builder = builder.add_source(
            config::Environment::with_prefix("ARGO_DSL")
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        );

        builder.build()?.try_deserialize()
    }
}
