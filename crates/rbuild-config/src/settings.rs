use crate::errors::ConfigError;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use which::which;

/// Environment variable that points at an alternative settings file
pub const CONFIG_ENV_VAR: &str = "RBUILD_CONFIG";

/// Suffix of the source tarball produced by `R CMD build`
pub const DEFAULT_ARTIFACT_SUFFIX: &str = ".tar.gz";

const DEFAULT_R_PROGRAM: &str = "R";

/// Behaviour profile.
///
/// `Strict` validates metadata, drops `Remotes` from DESCRIPTION and honours the
/// `user` input. `Lenient` does none of those.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Profile {
    #[default]
    Strict,
    Lenient,
}

impl Profile {
    pub fn validate_metadata(self) -> bool {
        self == Profile::Strict
    }

    pub fn drop_remotes(self) -> bool {
        self == Profile::Strict
    }

    pub fn honor_user(self) -> bool {
        self == Profile::Strict
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Profile::Strict => "strict",
            Profile::Lenient => "lenient",
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(default, rename_all = "kebab-case")]
pub struct Settings {
    pub profile: Profile,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub r_path: Option<String>,
    pub artifact_suffix: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub build_timeout_secs: Option<u64>,
    pub rollback_on_failure: bool,
    pub log_build_output: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            profile: Profile::Strict,
            r_path: None,
            artifact_suffix: DEFAULT_ARTIFACT_SUFFIX.to_string(),
            build_timeout_secs: None,
            rollback_on_failure: true,
            log_build_output: false,
        }
    }
}

impl Settings {
    /// Resolve the settings file location.
    ///
    /// Precedence: explicit path, then `RBUILD_CONFIG`, then
    /// `~/.config/rbuild/rbuild.toml`.
    pub fn path(explicit: Option<&Path>) -> Option<PathBuf> {
        Self::path_with_lookup(explicit, |key| std::env::var(key).ok())
    }

    pub fn path_with_lookup<F>(explicit: Option<&Path>, lookup: F) -> Option<PathBuf>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(path) = explicit {
            return Some(path.to_path_buf());
        }

        if let Some(env_path) = lookup(CONFIG_ENV_VAR) {
            let trimmed = env_path.trim();
            if !trimmed.is_empty() {
                return Some(PathBuf::from(trimmed));
            }
        }

        #[cfg(not(target_os = "windows"))]
        let default = dirs::home_dir().map(|home| home.join(".config").join("rbuild"));

        #[cfg(target_os = "windows")]
        let default = dirs::config_dir().map(|dir| dir.join("rbuild"));

        default.map(|dir| dir.join("rbuild.toml"))
    }

    /// Load settings from `path`; a missing file yields the defaults
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Ok(Settings::default());
        }

        let content = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;

        toml::from_str(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn load(explicit: Option<&Path>) -> Result<Self, ConfigError> {
        match Self::path(explicit) {
            Some(path) => Self::load_from(&path),
            None => Ok(Settings::default()),
        }
    }

    /// Locate the R executable, preferring the configured path
    pub fn resolve_r_path(&self) -> Result<PathBuf, ConfigError> {
        if let Some(ref configured) = self.r_path {
            return Ok(PathBuf::from(configured));
        }
        which(DEFAULT_R_PROGRAM).map_err(|_| ConfigError::ToolNotFound(DEFAULT_R_PROGRAM.into()))
    }

    pub fn build_timeout(&self) -> Option<Duration> {
        self.build_timeout_secs.map(Duration::from_secs)
    }

    pub fn values_iter(&self) -> Vec<(&str, String)> {
        let mut values = vec![("profile", self.profile.as_str().to_string())];
        if let Some(ref val) = self.r_path {
            values.push(("r-path", val.clone()));
        }
        values.push(("artifact-suffix", self.artifact_suffix.clone()));
        if let Some(secs) = self.build_timeout_secs {
            values.push(("build-timeout-secs", secs.to_string()));
        }
        values.push((
            "rollback-on-failure",
            self.rollback_on_failure.to_string(),
        ));
        values.push(("log-build-output", self.log_build_output.to_string()));
        values
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_defaults() {
        let settings = Settings::default();
        assert_eq!(settings.profile, Profile::Strict);
        assert_eq!(settings.artifact_suffix, ".tar.gz");
        assert!(settings.rollback_on_failure);
        assert_eq!(settings.build_timeout(), None);
    }

    #[test]
    fn test_missing_file_is_default() {
        let Ok(temp_dir) = TempDir::new() else {
            return;
        };
        let loaded = Settings::load_from(&temp_dir.path().join("absent.toml"));
        assert!(loaded.is_ok_and(|s| s == Settings::default()));
    }

    #[test]
    fn test_load_partial_file() {
        let Ok(temp_dir) = TempDir::new() else {
            return;
        };
        let path = temp_dir.path().join("rbuild.toml");
        let written = fs::write(
            &path,
            "profile = \"lenient\"\nr-path = \"/usr/lib/R/bin/R\"\nbuild-timeout-secs = 600\n",
        );
        assert!(written.is_ok());

        let Ok(settings) = Settings::load_from(&path) else {
            panic!("settings should parse");
        };
        assert_eq!(settings.profile, Profile::Lenient);
        assert!(!settings.profile.drop_remotes());
        assert_eq!(settings.r_path.as_deref(), Some("/usr/lib/R/bin/R"));
        assert_eq!(settings.build_timeout(), Some(Duration::from_secs(600)));
        assert_eq!(settings.artifact_suffix, ".tar.gz");
        assert!(settings.rollback_on_failure);
    }

    #[test]
    fn test_invalid_file_is_parse_error() {
        let Ok(temp_dir) = TempDir::new() else {
            return;
        };
        let path = temp_dir.path().join("rbuild.toml");
        assert!(fs::write(&path, "profile = \"sloppy\"\n").is_ok());
        assert!(matches!(
            Settings::load_from(&path),
            Err(ConfigError::Parse { .. })
        ));
    }

    #[test]
    fn test_path_precedence() {
        let explicit = PathBuf::from("/tmp/explicit.toml");
        assert_eq!(
            Settings::path_with_lookup(Some(&explicit), |_| Some("/tmp/env.toml".into())),
            Some(explicit)
        );
        assert_eq!(
            Settings::path_with_lookup(None, |_| Some("/tmp/env.toml".into())),
            Some(PathBuf::from("/tmp/env.toml"))
        );
    }

    #[test]
    fn test_configured_r_path_wins() {
        let settings = Settings {
            r_path: Some("/opt/R/bin/R".into()),
            ..Default::default()
        };
        assert!(settings
            .resolve_r_path()
            .is_ok_and(|p| p == Path::new("/opt/R/bin/R")));
    }
}
