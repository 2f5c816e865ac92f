use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use regex::Regex;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

/// Environment variable naming an explicit configuration file
pub const CONFIG_ENV: &str = "AGENT_BRIDGE_CONFIG";

const CONFIG_FILE_NAMES: &[&str] = &["agent-bridge.yaml", "agent-bridge.yml", "agent-bridge.json"];

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub bridge: BridgeSettings,
    #[serde(default)]
    pub library: LibraryConfig,
}

/// How many requests one process serves
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionMode {
    /// Read all of stdin as one request, answer once, exit
    #[default]
    Single,
    /// One request per line until EOF, sharing one session
    Lines,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BridgeSettings {
    #[serde(default)]
    pub session_mode: SessionMode,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LibraryConfig {
    #[serde(default = "default_provider")]
    pub provider: String,
    #[serde(default = "default_base_url")]
    pub base_url: String,
    #[serde(default)]
    pub api_key: Option<String>,
    #[serde(default = "default_tools")]
    pub tools: Vec<String>,
    #[serde(default)]
    pub timeout_secs: Option<u64>,
}

fn default_provider() -> String {
    "demo".to_string()
}

fn default_base_url() -> String {
    "https://api.openai.com/v1".to_string()
}

fn default_tools() -> Vec<String> {
    crate::agent::tools::BUILTIN_TOOLS
        .iter()
        .map(|s| s.to_string())
        .collect()
}

impl Default for LibraryConfig {
    fn default() -> Self {
        Self {
            provider: default_provider(),
            base_url: default_base_url(),
            api_key: None,
            tools: default_tools(),
            timeout_secs: None,
        }
    }
}

impl Config {
    /// Load a configuration file. `.json`/`.jsonld` files are parsed as JSON,
    /// anything else as YAML. `${VAR}` references are expanded first.
    pub fn load(path: &Path) -> Result<Self> {
        let content = load_text_file(path)?;
        let content = substitute_env_vars(&content)?;

        let is_json = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| matches!(e.to_lowercase().as_str(), "json" | "jsonld"))
            .unwrap_or(false);

        let config = if is_json {
            serde_json::from_str(&content)
                .with_context(|| format!("Invalid JSON config: {}", path.display()))?
        } else {
            serde_yaml::from_str(&content)
                .with_context(|| format!("Invalid YAML config: {}", path.display()))?
        };
        Ok(config)
    }

    /// Find and load the configuration, falling back to defaults (demo mode)
    /// when no file is present or the file cannot be used.
    pub fn discover() -> Self {
        if let Ok(path) = std::env::var(CONFIG_ENV) {
            return match Self::load(Path::new(&path)) {
                Ok(config) => {
                    info!("Loaded configuration from: {}", path);
                    config
                }
                Err(e) => {
                    warn!("Failed to load config from {}: {:#}", path, e);
                    Self::default()
                }
            };
        }

        for path in candidate_paths() {
            if !path.exists() {
                debug!("No config at {}", path.display());
                continue;
            }
            match Self::load(&path) {
                Ok(config) => {
                    info!("Loaded configuration from: {}", path.display());
                    return config;
                }
                Err(e) => {
                    warn!("Failed to load config from {}: {:#}", path.display(), e);
                    return Self::default();
                }
            }
        }

        debug!("No configuration file found, using defaults");
        Self::default()
    }
}

/// Working directory first, then next to the executable
fn candidate_paths() -> Vec<PathBuf> {
    let exe_dir = std::env::current_exe()
        .ok()
        .and_then(|p| p.parent().map(|p| p.to_path_buf()));

    let mut paths: Vec<PathBuf> = CONFIG_FILE_NAMES.iter().map(PathBuf::from).collect();
    if let Some(dir) = exe_dir {
        paths.extend(CONFIG_FILE_NAMES.iter().map(|name| dir.join(name)));
    }
    paths
}

/// Read a text file, dropping a UTF-8 BOM and decoding lossily if the bytes
/// are not valid UTF-8.
fn load_text_file(path: &Path) -> Result<String> {
    let bytes = fs::read(path)
        .with_context(|| format!("Configuration file not found: {}", path.display()))?;
    let bytes = bytes.strip_prefix(&[0xEF, 0xBB, 0xBF]).unwrap_or(&bytes);

    match std::str::from_utf8(bytes) {
        Ok(text) => Ok(text.to_string()),
        Err(_) => {
            let (cow, _, _) = encoding_rs::UTF_8.decode(bytes);
            Ok(cow.into_owned())
        }
    }
}

/// Replace `${VAR_NAME}` with the variable's value. Unset variables are left
/// as written.
fn substitute_env_vars(content: &str) -> Result<String> {
    let pattern = Regex::new(r"\$\{(\w+)\}")?;
    let replaced = pattern.replace_all(content, |caps: &regex::Captures| {
        std::env::var(&caps[1]).unwrap_or_else(|_| caps[0].to_string())
    });
    Ok(replaced.into_owned())
}
