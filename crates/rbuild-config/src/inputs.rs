//! Action inputs and CI environment
//!
//! Inputs follow the GitHub Actions convention: an input named `build-vignettes`
//! is read from `INPUT_BUILD-VIGNETTES`, with surrounding whitespace trimmed.

/// Environment variable holding the server URL (e.g. `https://github.com`)
pub const SERVER_URL_VAR: &str = "GITHUB_SERVER_URL";
/// Environment variable holding the `owner/repo` identifier
pub const REPOSITORY_VAR: &str = "GITHUB_REPOSITORY";
/// Environment variable holding the commit being built
pub const SHA_VAR: &str = "GITHUB_SHA";

/// Map an input name to the environment variable carrying it
pub fn input_env_name(name: &str) -> String {
    format!("INPUT_{}", name.replace(' ', "_").to_uppercase())
}

fn get_input<F>(lookup: &F, name: &str) -> String
where
    F: Fn(&str) -> Option<String>,
{
    lookup(&input_env_name(name))
        .map(|v| v.trim().to_string())
        .unwrap_or_default()
}

/// Inputs supplied by the workflow that invokes the action
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ActionInputs {
    /// Library path handed to the build tool
    pub library: String,
    /// Raw JSON text of the metadata input
    pub metadata: String,
    pub build_vignettes: bool,
    pub resave_data: bool,
    pub md5: bool,
    pub user: Option<String>,
}

impl ActionInputs {
    /// Read inputs from the process environment
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Read inputs through an arbitrary key lookup
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let metadata = get_input(&lookup, "metadata");
        let user = get_input(&lookup, "user");

        Self {
            library: get_input(&lookup, "library"),
            metadata: if metadata.is_empty() {
                "{}".to_string()
            } else {
                metadata
            },
            build_vignettes: get_input(&lookup, "build-vignettes") == "true",
            resave_data: get_input(&lookup, "resave-data") == "true",
            md5: get_input(&lookup, "md5") == "true",
            user: if user.is_empty() { None } else { Some(user) },
        }
    }
}

/// Source-control details exposed by the CI runner
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CiEnvironment {
    pub server_url: String,
    pub repository: String,
    pub sha: String,
}

impl CiEnvironment {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        Self {
            server_url: lookup(SERVER_URL_VAR).unwrap_or_default(),
            repository: lookup(REPOSITORY_VAR).unwrap_or_default(),
            sha: lookup(SHA_VAR).unwrap_or_default(),
        }
    }

    /// URL of the repository the package was built from
    pub fn git_origin(&self) -> String {
        format!("{}/{}", self.server_url, self.repository)
    }
}
