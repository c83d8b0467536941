use std::fs;
use std::path::Path;

use tracing::{error, info};

use crate::config::RawConfig;
use crate::error::{Result, ServiceError};

/// Loads the static YAML config file. Secrets stay as `${ENV:NAME}`
/// placeholders here; they are resolved per provider at construction time.
pub fn load_config<P: AsRef<Path>>(path: P) -> Result<RawConfig> {
    let path_ref = path.as_ref();
    info!(config_path = ?path_ref, "Loading configuration from file");

    let config_content = match fs::read_to_string(path_ref) {
        Ok(content) => {
            info!(config_path = ?path_ref, "Config file read successfully");
            content
        }
        Err(e) => {
            error!(error = ?e, config_path = ?path_ref, "Failed to read config file");
            return Err(ServiceError::Config(format!(
                "failed to read config file {:?}: {e}",
                path_ref
            )));
        }
    };

    let config: RawConfig = match serde_yaml::from_str(&config_content) {
        Ok(config) => {
            info!(config_path = ?path_ref, "Parsed config YAML successfully");
            config
        }
        Err(e) => {
            error!(error = ?e, config_path = ?path_ref, "Failed to parse config YAML");
            return Err(ServiceError::Config(format!(
                "failed to parse config YAML: {e}"
            )));
        }
    };

    config.trace_loaded();
    Ok(config)
}
