use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use log::{info, warn};
use serde::{Deserialize, Serialize};

/// Main configuration structure for req_quality_analyzer
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Generation service settings
    #[serde(default)]
    pub generation: GenerationConfig,

    /// Where the report is saved
    #[serde(default)]
    pub output: OutputConfig,

    /// Prompt overrides
    #[serde(default)]
    pub prompt: PromptConfig,

    /// UI display configuration
    #[serde(default)]
    pub ui: UIConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerationConfig {
    /// Model identifier sent with every request
    #[serde(default = "default_model")]
    pub model: String,

    /// API root; model paths are joined onto it
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Environment variable holding the API key
    #[serde(default = "default_api_key_env")]
    pub api_key_env: String,

    /// Sampling temperature; the service default applies when unset
    pub temperature: Option<f32>,

    /// Whole-request timeout in seconds; unset means wait indefinitely
    pub request_timeout_secs: Option<u64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputConfig {
    /// Report file, overwritten on every successful run
    #[serde(default = "default_report_path")]
    pub report_path: PathBuf,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PromptConfig {
    /// File replacing the built-in analyze prompt; must contain {{REQUIREMENT}} once
    pub analyze_template: Option<PathBuf>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UIConfig {
    /// Enable colorful output
    #[serde(default = "default_colorful")]
    pub colorful: bool,

    /// Show a spinner while waiting on the model
    #[serde(default = "default_spinner")]
    pub spinner: bool,
}

// Default value functions
fn default_model() -> String { "gemini-2.5-flash".to_string() }
fn default_base_url() -> String { "https://generativelanguage.googleapis.com/v1beta/".to_string() }
fn default_api_key_env() -> String { "GEMINI_API_KEY".to_string() }
fn default_report_path() -> PathBuf { PathBuf::from("last_report.json") }
fn default_colorful() -> bool { true }
fn default_spinner() -> bool { true }

impl Default for GenerationConfig {
    fn default() -> Self {
        GenerationConfig {
            model: default_model(),
            base_url: default_base_url(),
            api_key_env: default_api_key_env(),
            temperature: None,
            request_timeout_secs: None,
        }
    }
}

impl Default for OutputConfig {
    fn default() -> Self {
        OutputConfig { report_path: default_report_path() }
    }
}

impl Default for UIConfig {
    fn default() -> Self {
        UIConfig { colorful: default_colorful(), spinner: default_spinner() }
    }
}

impl GenerationConfig {
    pub fn request_timeout(&self) -> Option<Duration> {
        self.request_timeout_secs.map(Duration::from_secs)
    }
}

impl Config {
    /// Load configuration from a TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let contents = fs::read_to_string(path.as_ref())
            .with_context(|| format!("Failed to read config file: {}", path.as_ref().display()))?;

        toml::from_str(&contents)
            .with_context(|| format!("Failed to parse config file: {}", path.as_ref().display()))
    }

    /// Load configuration from command line argument or default locations
    pub fn load(config_path: &Option<String>) -> Result<Self> {
        if let Some(path) = config_path {
            info!("Loading config from {}", path);
            return Self::from_file(path);
        }

        // Try loading from default locations
        let default_paths = [
            "req_quality_analyzer.toml",
            ".req_quality_analyzer.toml",
            "~/.config/req_quality_analyzer/config.toml",
        ];

        for path in default_paths {
            let expanded_path = shellexpand::tilde(path);
            if Path::new(expanded_path.as_ref()).exists() {
                match Self::from_file(expanded_path.as_ref()) {
                    Ok(config) => {
                        info!("Loaded config from {}", expanded_path);
                        return Ok(config);
                    }
                    Err(e) => warn!("Failed to load config from {}: {:#}", path, e),
                }
            }
        }

        info!("No config file found, using defaults");
        Ok(Self::default())
    }

    /// Apply the `GEMINI_MODEL` environment override
    pub fn apply_env(&mut self) {
        self.apply_model_override(env::var("GEMINI_MODEL").ok());
    }

    fn apply_model_override(&mut self, model: Option<String>) {
        if let Some(model) = model.filter(|m| !m.trim().is_empty()) {
            self.generation.model = model.trim().to_string();
        }
    }

    /// Merge with command-line arguments (CLI args take precedence)
    pub fn merge_with_args(
        &mut self,
        headless: bool,
        model: Option<String>,
        output: Option<PathBuf>,
    ) {
        self.apply_model_override(model);
        if let Some(output) = output {
            self.output.report_path = output;
        }
        if headless {
            self.ui.colorful = false;
            self.ui.spinner = false;
        }
    }
}
