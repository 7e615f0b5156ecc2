use std::path::PathBuf;

/// Error type for loading settings and resolving tools
#[derive(Debug)]
pub enum ConfigError {
    /// The settings file exists but could not be read
    Read { path: PathBuf, source: std::io::Error },
    /// The settings file is not valid TOML for [`crate::Settings`]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },
    /// The build tool could not be located on PATH
    ToolNotFound(String),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::Read { path, source } => {
                write!(f, "Failed to read settings {}: {}", path.display(), source)
            }
            ConfigError::Parse { path, source } => {
                write!(f, "Failed to parse settings {}: {}", path.display(), source)
            }
            ConfigError::ToolNotFound(tool) => {
                write!(f, "Could not find '{}' on PATH", tool)
            }
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::Read { source, .. } => Some(source),
            ConfigError::Parse { source, .. } => Some(source),
            ConfigError::ToolNotFound(_) => None,
        }
    }
}
