use std::path::{Path, PathBuf};

use crate::CONFIG_LOCATION;

/// Used when no control file is given and none is configured.
pub const DEFAULT_CONTROL_FILE: &str = "control_active.txt";

/// Reads the option file `name` from the configuration directory.
pub fn get_config_option(name: &str) -> Option<String> {
    get_config_option_in(Path::new(CONFIG_LOCATION), name)
}

fn get_config_option_in(dir: &Path, name: &str) -> Option<String> {
    let path = dir.join(name);
    if !path.is_file() {
        return None;
    }
    match std::fs::read_to_string(&path) {
        Ok(out) if !out.trim().is_empty() => Some(out.trim().to_string()),
        Ok(_) => None,
        Err(e) => {
            log::warn!("Failed to read config option {}: {}", path.display(), e);
            None
        }
    }
}

pub fn get_default_control_file() -> PathBuf {
    control_file_from(get_config_option("control"))
}

fn control_file_from(option: Option<String>) -> PathBuf {
    match option {
        Some(x) => PathBuf::from(x),
        None => PathBuf::from(DEFAULT_CONTROL_FILE),
    }
}
