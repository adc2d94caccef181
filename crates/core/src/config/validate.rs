use super::{types::Config, ConfigError};

/// Validate configuration
/// Currently validates:
/// - At least one eligible extension
/// - Metadata sources have labels
/// - Raw and organized roots differ and do not nest inside each other
pub fn validate_config(config: &Config) -> Result<(), ConfigError> {
    if config
        .organize
        .extensions
        .iter()
        .all(|e| e.trim_start_matches('.').trim().is_empty())
    {
        return Err(ConfigError::ValidationError(
            "organize.extensions cannot be empty".to_string(),
        ));
    }

    if let Some(source) = config.metadata.iter().find(|m| m.label.trim().is_empty()) {
        return Err(ConfigError::ValidationError(format!(
            "metadata source {} has an empty label",
            source.path.display()
        )));
    }

    let raw = &config.paths.raw_root;
    let organized = &config.paths.organized_root;
    if raw == organized {
        return Err(ConfigError::ValidationError(
            "paths.raw_root and paths.organized_root must differ".to_string(),
        ));
    }
    if organized.starts_with(raw) || raw.starts_with(organized) {
        return Err(ConfigError::ValidationError(
            "paths.raw_root and paths.organized_root cannot be nested".to_string(),
        ));
    }

    Ok(())
}
