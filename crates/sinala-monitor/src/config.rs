use std::path::Path;

use sinala_core::MonitorConfig;

use crate::error::{MonitorError, MonitorResult};

/// Load and validate a monitor config from a YAML file.
///
/// Without a path the built-in defaults are used. Fields missing from the
/// file keep their defaults.
pub async fn load(path: Option<&Path>) -> MonitorResult<MonitorConfig> {
    let config = match path {
        Some(path) => {
            let content = tokio::fs::read_to_string(path)
                .await
                .map_err(|e| MonitorError::Config(format!("read {}: {e}", path.display())))?;
            parse(&content)
                .map_err(|e| MonitorError::Config(format!("parse {}: {e}", path.display())))?
        }
        None => MonitorConfig::default(),
    };
    config.validate().map_err(sinala_core::Error::from)?;
    Ok(config)
}

fn parse(content: &str) -> Result<MonitorConfig, serde_yaml_ng::Error> {
    // An empty file deserializes to unit, not to an all-defaults mapping.
    if content.trim().is_empty() {
        return Ok(MonitorConfig::default());
    }
    serde_yaml_ng::from_str(content)
}
