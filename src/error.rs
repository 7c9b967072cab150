use std::path::PathBuf;

use thiserror::Error;

/// Errors raised while reading settings out of a control file.
#[derive(Debug, Error)]
pub enum ControlError {
    #[error("control file {} does not exist", .path.display())]
    FileNotFound { path: PathBuf },

    #[error("failed to read control file {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("setting '{setting}' not found in {}", .path.display())]
    SettingNotFound { setting: String, path: PathBuf },

    /// The matching line has no `|` separating the key from its value.
    #[error(
        "line {line} of {} names setting '{setting}' but has no '|' separator",
        .path.display()
    )]
    MalformedLine {
        setting: String,
        line: usize,
        path: PathBuf,
    },
}

impl ControlError {
    pub(crate) fn io(path: &std::path::Path, source: std::io::Error) -> Self {
        if source.kind() == std::io::ErrorKind::NotFound {
            ControlError::FileNotFound {
                path: path.to_path_buf(),
            }
        } else {
            ControlError::Io {
                path: path.to_path_buf(),
                source,
            }
        }
    }
}

pub type Result<T> = std::result::Result<T, ControlError>;
