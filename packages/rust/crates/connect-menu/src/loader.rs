use std::path::Path;

use crate::error::MenuError;
use crate::model::MenuConfig;
use crate::raw::RawLevels;

/// Read and convert a menu YAML file.
///
/// # Errors
/// Returns [`MenuError`] when the file cannot be read, is not valid YAML, or fails
/// integrity checks.
pub fn load_menu_config(path: impl AsRef<Path>) -> Result<MenuConfig, MenuError> {
    let path = path.as_ref();
    let content = std::fs::read_to_string(path).map_err(|source| MenuError::Io {
        path: path.display().to_string(),
        source,
    })?;
    let config = parse_menu_config(&content)?;
    tracing::info!(
        path = %path.display(),
        menus = config.menus.len(),
        qna_enabled = config.use_qna.enabled,
        "menu configuration loaded"
    );
    Ok(config)
}

/// Convert menu YAML text into a [`MenuConfig`].
///
/// # Errors
/// Returns [`MenuError`] on invalid YAML or failed integrity checks.
pub fn parse_menu_config(yaml: &str) -> Result<MenuConfig, MenuError> {
    let raw: RawLevels = serde_yaml::from_str(yaml)?;
    raw.into_config()
}
