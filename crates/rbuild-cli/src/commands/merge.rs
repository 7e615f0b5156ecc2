//! `rbuild merge`: preview (or apply) the DESCRIPTION rewrite without building

use crate::commands::build::prepare_metadata;
use crate::errors::ActionError;
use crate::logger;
use crate::GlobalOpts;
use clap::Args;
use rbuild_config::{ActionInputs, CiEnvironment, Settings};
use rbuild_description::{
    read_description, write_description, Description, MergePolicy, DESCRIPTION_FILE,
};
use std::path::PathBuf;

#[derive(Args, Debug, Clone)]
pub struct MergeCommand {
    /// Directory containing the package's DESCRIPTION
    #[arg(long, value_name = "DIR", default_value = ".")]
    pub package_dir: PathBuf,

    /// Write the merged DESCRIPTION back instead of only printing it
    #[arg(long)]
    pub write: bool,
}

/// Merge action inputs into DESCRIPTION and return the merged text
pub fn merge_description(
    cmd: &MergeCommand,
    inputs: &ActionInputs,
    ci: &CiEnvironment,
    settings: &Settings,
) -> Result<String, ActionError> {
    let metadata = prepare_metadata(inputs, ci, settings.profile)?;
    let path = cmd.package_dir.join(DESCRIPTION_FILE);
    let original = read_description(&path)?;

    let outcome = Description::parse(&original).merge(
        &metadata,
        &MergePolicy {
            drop_remotes: settings.profile.drop_remotes(),
        },
    );
    for name in &outcome.dropped {
        logger::info(&format!("Dropped field: {}", name));
    }

    if cmd.write {
        write_description(&path, &outcome.text)?;
        logger::success(&format!("Updated {}", path.display()));
    }

    Ok(outcome.text)
}

pub fn handle_merge(cmd: MergeCommand, opts: &GlobalOpts) -> Result<String, ActionError> {
    let settings = Settings::load(opts.config.as_deref())?;
    merge_description(
        &cmd,
        &ActionInputs::from_env(),
        &CiEnvironment::from_env(),
        &settings,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn inputs() -> (ActionInputs, CiEnvironment) {
        (
            ActionInputs {
                metadata: r#"{"version": "2.0"}"#.into(),
                ..Default::default()
            },
            CiEnvironment {
                server_url: "https://git.example.org".into(),
                repository: "lab/pkg".into(),
                sha: "f00d".into(),
            },
        )
    }

    #[test]
    fn test_preview_leaves_file_alone() {
        let Ok(dir) = TempDir::new() else {
            return;
        };
        let path = dir.path().join(DESCRIPTION_FILE);
        assert!(fs::write(&path, "Package: pkg\nVersion: 1.0\n").is_ok());
        let cmd = MergeCommand {
            package_dir: dir.path().to_path_buf(),
            write: false,
        };
        let (inputs, ci) = inputs();

        let merged = merge_description(&cmd, &inputs, &ci, &Settings::default());
        assert!(merged.is_ok_and(|text| text
            == "Package: pkg\nVersion: 2.0\nGitOrigin: https://git.example.org/lab/pkg\nGitSHA: f00d\n"));
        assert!(fs::read_to_string(&path).is_ok_and(|c| c == "Package: pkg\nVersion: 1.0\n"));
    }

    #[test]
    fn test_write_persists_merge() {
        let Ok(dir) = TempDir::new() else {
            return;
        };
        let path = dir.path().join(DESCRIPTION_FILE);
        assert!(fs::write(&path, "Package: pkg\n").is_ok());
        let cmd = MergeCommand {
            package_dir: dir.path().to_path_buf(),
            write: true,
        };
        let (inputs, ci) = inputs();

        assert!(merge_description(&cmd, &inputs, &ci, &Settings::default()).is_ok());
        assert!(fs::read_to_string(&path).is_ok_and(|c| c.contains("GitSHA: f00d\n")));
    }

    #[test]
    fn test_missing_description() {
        let Ok(dir) = TempDir::new() else {
            return;
        };
        let cmd = MergeCommand {
            package_dir: dir.path().to_path_buf(),
            write: false,
        };
        let (inputs, ci) = inputs();
        assert!(matches!(
            merge_description(&cmd, &inputs, &ci, &Settings::default()),
            Err(ActionError::Description(_))
        ));
    }
}
