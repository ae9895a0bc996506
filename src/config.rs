use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::errors::{ApiRefError, Result};
use crate::schema::DEFAULT_SCHEMA_AUTHORITY;

/// Name of the configuration file stored inside the `.apiref` directory.
pub const CONFIG_FILENAME: &str = "config.json";

/// Name of the hidden directory holding project settings.
pub const APIREF_DIR: &str = ".apiref";

/// Settings that shape a resolution walk.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ResolverConfig {
    /// Schema version of the configuration.
    pub version: u32,
    /// Also report external references, which are always left unresolved.
    pub strict: bool,
    /// Scheme and authority prefixed to schema pointers to build registry
    /// locators.
    pub schema_authority: String,
    /// Replace operation tags that name no declared tag with a bare tag
    /// instead of reporting them.
    pub synthesize_missing_tags: bool,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            version: 1,
            strict: false,
            schema_authority: DEFAULT_SCHEMA_AUTHORITY.to_string(),
            synthesize_missing_tags: true,
        }
    }
}

/// Returns the path to the `.apiref` directory within the given project root.
pub fn get_apiref_dir(project_root: &Path) -> PathBuf {
    project_root.join(APIREF_DIR)
}

/// Returns the path to the configuration file within the `.apiref` directory.
pub fn get_config_path(project_root: &Path) -> PathBuf {
    get_apiref_dir(project_root).join(CONFIG_FILENAME)
}

/// Loads the project's resolver settings.
///
/// A project without a config file resolves with [`ResolverConfig::default`].
pub fn load_config(project_root: &Path) -> Result<ResolverConfig> {
    let path = get_config_path(project_root);
    if !path.exists() {
        return Ok(ResolverConfig::default());
    }

    let text = fs::read_to_string(&path).map_err(|e| config_error("cannot read", &path, e))?;
    serde_json::from_str(&text).map_err(|e| config_error("invalid resolver settings in", &path, e))
}

/// Stores `config` under the project's `.apiref` directory.
///
/// The file is staged next to its final name and renamed into place.
pub fn save_config(project_root: &Path, config: &ResolverConfig) -> Result<()> {
    let dir = get_apiref_dir(project_root);
    fs::create_dir_all(&dir).map_err(|e| config_error("cannot create", &dir, e))?;

    let path = get_config_path(project_root);
    let staged = path.with_extension("json.partial");
    let json = serde_json::to_string_pretty(config).map_err(|e| ApiRefError::Config {
        message: format!("cannot encode resolver settings: {}", e),
    })?;

    fs::write(&staged, json).map_err(|e| config_error("cannot write", &staged, e))?;
    fs::rename(&staged, &path).map_err(|e| config_error("cannot move settings into", &path, e))
}

fn config_error(action: &str, path: &Path, cause: impl fmt::Display) -> ApiRefError {
    ApiRefError::Config {
        message: format!("{} '{}': {}", action, path.display(), cause),
    }
}
