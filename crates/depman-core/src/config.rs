use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use depman_util::errors::DepmanError;

/// Name of the configuration file looked up in a project root.
pub const CONFIG_FILE: &str = "depman.toml";

/// Dependency management settings loaded from `depman.toml`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ManagementConfig {
    #[serde(default)]
    pub management: ManagementSection,

    #[serde(default)]
    pub repository: RepositoryConfig,

    /// Project property source used while resolving imported BOMs.
    #[serde(default)]
    pub properties: BTreeMap<String, String>,
}

/// Behaviour switches from `[management]`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ManagementSection {
    /// Consult the exclusions declared in dependencies' POMs.
    #[serde(default = "default_true", rename = "apply-maven-exclusions")]
    pub apply_maven_exclusions: bool,
    /// Record concrete versions of direct dependencies as implicit managed
    /// versions, so they win over imported BOMs.
    #[serde(default = "default_true", rename = "overridden-by-dependencies")]
    pub overridden_by_dependencies: bool,
}

impl Default for ManagementSection {
    fn default() -> Self {
        Self {
            apply_maven_exclusions: true,
            overridden_by_dependencies: true,
        }
    }
}

fn default_true() -> bool {
    true
}

/// Local Maven repository settings from `[repository]`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RepositoryConfig {
    #[serde(default = "default_local_repository")]
    pub local: String,
}

impl Default for RepositoryConfig {
    fn default() -> Self {
        Self {
            local: default_local_repository(),
        }
    }
}

fn default_local_repository() -> String {
    "~/.m2/repository".to_string()
}

impl RepositoryConfig {
    /// The local repository root with a leading `~` expanded.
    pub fn local_path(&self) -> PathBuf {
        match self.local.strip_prefix("~/") {
            Some(rest) => home_dir().join(rest),
            None => PathBuf::from(&self.local),
        }
    }
}

impl ManagementConfig {
    /// Parse a configuration from TOML text.
    pub fn parse_toml(content: &str) -> miette::Result<Self> {
        toml::from_str(content).map_err(|e| {
            DepmanError::Config {
                message: format!("Failed to parse {CONFIG_FILE}: {e}"),
            }
            .into()
        })
    }

    /// Load the configuration at `path`, or return defaults if the file doesn't exist.
    pub fn from_path(path: &Path) -> miette::Result<Self> {
        if !path.is_file() {
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path).map_err(|e| DepmanError::Config {
            message: format!("Failed to read {}: {e}", path.display()),
        })?;
        Self::parse_toml(&content)
    }

    /// Load `depman.toml` from a project root.
    pub fn load(project_root: &Path) -> miette::Result<Self> {
        Self::from_path(&project_root.join(CONFIG_FILE))
    }
}

fn home_dir() -> PathBuf {
    let home = std::env::var("HOME")
        .or_else(|_| std::env::var("USERPROFILE"))
        .unwrap_or_else(|_| ".".to_string());
    PathBuf::from(home)
}
