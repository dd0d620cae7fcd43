//! Configuration loading and root folder resolution
//!
//! Bootstrap configuration only: where the data lives, where the catalogs
//! come from, how to log, and where to listen. Everything else is assessment
//! state and lives in the database.
//!
//! Root folder priority:
//! 1. Command-line argument
//! 2. `CMMC_ROOT_FOLDER`, then `CMMC_ROOT`
//! 3. `root_folder` in `~/.config/cmmc/<module>.toml`
//! 4. Compiled platform default
//!
//! Missing or unreadable TOML files are never fatal; defaults apply.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

use crate::catalog::CatalogSources;
use crate::{Error, Result};

/// Database file name inside the root folder
pub const DATABASE_FILE: &str = "cmmc.db";

/// Default listen port of the assessment tracker
pub const DEFAULT_PORT: u16 = 5741;

/// Bootstrap configuration loaded from TOML
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct TomlConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub root_folder: Option<PathBuf>,

    #[serde(default)]
    pub logging: LoggingConfig,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub catalog: Option<CatalogConfig>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bind_address: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub port: Option<u16>,
}

/// Logging configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Log file path (logs to stderr if not specified)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file: Option<PathBuf>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            file: None,
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

/// Catalog document locations (URLs or local paths)
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct CatalogConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub level1_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub level2_url: Option<String>,
}

impl CatalogConfig {
    /// Fill unset locations with the bundled files under the root folder
    pub fn resolve(&self, root_folder: &Path) -> CatalogSources {
        let catalogs = root_folder.join("catalogs");
        CatalogSources {
            level1_url: self
                .level1_url
                .clone()
                .unwrap_or_else(|| catalogs.join("cmmc_l1.json").display().to_string()),
            level2_url: self
                .level2_url
                .clone()
                .unwrap_or_else(|| catalogs.join("cmmc_l2.json").display().to_string()),
        }
    }
}

/// Compiled fallback values for the current platform
#[derive(Debug, Clone)]
pub struct CompiledDefaults {
    pub root_folder: PathBuf,
    pub log_level: String,
    pub log_file: Option<PathBuf>,
}

impl CompiledDefaults {
    pub fn for_current_platform() -> Self {
        let root_folder = if cfg!(target_os = "windows") {
            dirs::data_local_dir()
                .map(|d| d.join("cmmc"))
                .unwrap_or_else(|| PathBuf::from("C:\\ProgramData\\cmmc"))
        } else if cfg!(target_os = "macos") {
            dirs::data_dir()
                .map(|d| d.join("cmmc"))
                .unwrap_or_else(|| PathBuf::from("/Library/Application Support/cmmc"))
        } else {
            dirs::data_local_dir()
                .map(|d| d.join("cmmc"))
                .unwrap_or_else(|| PathBuf::from("/var/lib/cmmc"))
        };

        Self {
            root_folder,
            log_level: default_log_level(),
            log_file: None,
        }
    }
}

/// Path of a module's TOML file (`~/.config/cmmc/<module>.toml`)
pub fn config_file_path(module_name: &str) -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("cmmc").join(format!("{}.toml", module_name)))
}

/// Read and parse a TOML config file
pub fn load_toml_config(path: &Path) -> Result<TomlConfig> {
    let content = std::fs::read_to_string(path)
        .map_err(|e| Error::Config(format!("Read {} failed: {}", path.display(), e)))?;
    toml::from_str(&content)
        .map_err(|e| Error::Config(format!("Parse {} failed: {}", path.display(), e)))
}

/// Module TOML if present and valid, defaults otherwise
pub fn load_module_config(module_name: &str) -> TomlConfig {
    let Some(path) = config_file_path(module_name) else {
        return TomlConfig::default();
    };
    if !path.exists() {
        debug!("No config file at {}; using defaults", path.display());
        return TomlConfig::default();
    }
    match load_toml_config(&path) {
        Ok(config) => config,
        Err(e) => {
            warn!("{}; using defaults", e);
            TomlConfig::default()
        }
    }
}

/// Resolves the root folder for a module
pub struct RootFolderResolver {
    module_name: String,
    cli_arg: Option<PathBuf>,
}

impl RootFolderResolver {
    pub fn new(module_name: &str) -> Self {
        Self {
            module_name: module_name.to_string(),
            cli_arg: None,
        }
    }

    pub fn with_cli_arg(mut self, cli_arg: Option<PathBuf>) -> Self {
        self.cli_arg = cli_arg;
        self
    }

    pub fn resolve(&self) -> PathBuf {
        if let Some(path) = &self.cli_arg {
            return path.clone();
        }

        for var in ["CMMC_ROOT_FOLDER", "CMMC_ROOT"] {
            if let Ok(path) = std::env::var(var) {
                if !path.trim().is_empty() {
                    return PathBuf::from(path);
                }
            }
        }

        if let Some(root) = load_module_config(&self.module_name).root_folder {
            return root;
        }

        CompiledDefaults::for_current_platform().root_folder
    }
}

/// Prepares the root folder on disk
pub struct RootFolderInitializer {
    root_folder: PathBuf,
}

impl RootFolderInitializer {
    pub fn new(root_folder: PathBuf) -> Self {
        Self { root_folder }
    }

    pub fn root_folder(&self) -> &Path {
        &self.root_folder
    }

    /// Create the folder (and parents). Safe to call repeatedly.
    pub fn ensure_directory_exists(&self) -> Result<()> {
        std::fs::create_dir_all(&self.root_folder)?;
        Ok(())
    }

    pub fn database_path(&self) -> PathBuf {
        self.root_folder.join(DATABASE_FILE)
    }

    pub fn database_exists(&self) -> bool {
        self.database_path().exists()
    }
}

/// Write a TOML config atomically (temp file + rename), 0600 on Unix
pub fn write_toml_config(config: &TomlConfig, target: &Path) -> Result<()> {
    let content = toml::to_string_pretty(config)
        .map_err(|e| Error::Config(format!("Serialize TOML failed: {}", e)))?;

    if let Some(parent) = target.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let mut tmp_name = target.as_os_str().to_owned();
    tmp_name.push(".tmp");
    let tmp = PathBuf::from(tmp_name);

    std::fs::write(&tmp, content)?;

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        std::fs::set_permissions(&tmp, std::fs::Permissions::from_mode(0o600))?;
    }

    if let Err(e) = std::fs::rename(&tmp, target) {
        let _ = std::fs::remove_file(&tmp);
        return Err(e.into());
    }

    Ok(())
}
