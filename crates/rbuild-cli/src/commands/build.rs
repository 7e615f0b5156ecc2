//! `rbuild build`: stamp DESCRIPTION, run the build, report the tarball

use crate::artifacts::{absolute_path, select_artifact, snapshot};
use crate::errors::ActionError;
use crate::invoker::{BuildOptions, BuildRunner, Deadline, RCmdBuild};
use crate::logger;
use crate::outputs::{GithubOutputs, OutputSink, TARBALL_NAME_OUTPUT, TARBALL_PATH_OUTPUT};
use crate::GlobalOpts;
use clap::Args;
use rbuild_config::{ActionInputs, CiEnvironment, Profile, Settings};
use rbuild_description::{
    read_description, Description, DescriptionGuard, MergePolicy, Metadata, DESCRIPTION_FILE,
};
use std::path::{Path, PathBuf};

pub const GIT_ORIGIN_FIELD: &str = "GitOrigin";
pub const GIT_SHA_FIELD: &str = "GitSHA";

#[derive(Args, Debug, Clone)]
pub struct BuildCommand {
    /// Directory containing the package's DESCRIPTION
    #[arg(long, value_name = "DIR", default_value = ".")]
    pub package_dir: PathBuf,
}

/// Everything one build run needs, gathered up front
#[derive(Debug, Clone)]
pub struct BuildRequest {
    pub package_dir: PathBuf,
    pub inputs: ActionInputs,
    pub ci: CiEnvironment,
    pub settings: Settings,
}

/// The artifact reported back to the pipeline
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtifactReport {
    pub name: String,
    pub path: PathBuf,
}

/// Parse the metadata input and add the source-control fields.
///
/// Validation happens here, before anything on disk is touched.
pub fn prepare_metadata(
    inputs: &ActionInputs,
    ci: &CiEnvironment,
    profile: Profile,
) -> Result<Metadata, ActionError> {
    let mut metadata = Metadata::from_json(&inputs.metadata, profile.validate_metadata())?;
    metadata.insert(GIT_ORIGIN_FIELD, ci.git_origin());
    metadata.insert(GIT_SHA_FIELD, ci.sha.clone());
    Ok(metadata)
}

pub fn build_options(inputs: &ActionInputs, profile: Profile) -> BuildOptions {
    let user = if profile.honor_user() {
        inputs.user.clone()
    } else {
        if let Some(ref user) = inputs.user {
            logger::debug(&format!(
                "Ignoring user '{}' under the {} profile",
                user,
                profile.as_str()
            ));
        }
        None
    };

    BuildOptions {
        library: inputs.library.clone(),
        build_vignettes: inputs.build_vignettes,
        resave_data: inputs.resave_data,
        md5: inputs.md5,
        user,
    }
}

/// Run the whole step: merge, build, detect the tarball.
///
/// DESCRIPTION is restored if anything after the rewrite fails, unless
/// `rollback-on-failure` is off.
pub fn run_build(
    request: &BuildRequest,
    runner: &dyn BuildRunner,
    deadline: &Deadline,
) -> Result<ArtifactReport, ActionError> {
    let settings = &request.settings;
    let profile = settings.profile;
    let dir = request.package_dir.as_path();

    let metadata = prepare_metadata(&request.inputs, &request.ci, profile)?;
    let options = build_options(&request.inputs, profile);

    logger::info(&format!("Library: {}", options.library));
    logger::info(&format!("Metadata: {}", metadata.to_json_string()));
    logger::info(&format!("Build vignettes: {}", options.build_vignettes));
    logger::info(&format!("Resave data: {}", options.resave_data));
    logger::info(&format!("md5: {}", options.md5));
    logger::info(&format!("User: {}", options.user.as_deref().unwrap_or("-")));

    let before = snapshot(dir, &settings.artifact_suffix)?;
    logger::debug(&format!("{} existing artifacts before build", before.len()));

    let description_path = dir.join(DESCRIPTION_FILE);
    let original = read_description(&description_path)?;
    let description = Description::parse(&original);
    if let (Some(package), Some(version)) = (description.get("Package"), description.get("Version")) {
        logger::info(&format!("Building {} {}", package, version));
    }

    let outcome = description.merge(
        &metadata,
        &MergePolicy {
            drop_remotes: profile.drop_remotes(),
        },
    );
    logger::step(&format!(
        "DESCRIPTION merged: {} replaced, {} appended, {} dropped",
        outcome.replaced.len(),
        outcome.appended.len(),
        outcome.dropped.len()
    ));

    let guard = DescriptionGuard::write(
        &description_path,
        original,
        &outcome.text,
        settings.rollback_on_failure,
    )?;

    logger::spinner_start("Running R CMD build");
    match runner.run(dir, &options, deadline) {
        Ok(_) => logger::spinner_success("R CMD build finished"),
        Err(e) => {
            logger::spinner_error("R CMD build failed");
            return Err(e.into());
        }
    }

    let after = snapshot(dir, &settings.artifact_suffix)?;
    let name = select_artifact(&before, &after)?;
    let path = absolute_path(&dir.join(&name))?;

    guard.commit();
    Ok(ArtifactReport { name, path })
}

/// Hand the result to the runner: outputs on success, a failure otherwise.
///
/// By now the tarball exists and DESCRIPTION is committed, so a failed
/// output write leaves the merged DESCRIPTION in place.
pub fn publish(
    result: Result<ArtifactReport, ActionError>,
    sink: &mut dyn OutputSink,
) -> Result<ArtifactReport, ActionError> {
    let report = match result {
        Ok(report) => report,
        Err(e) => {
            sink.fail(&e.to_string());
            return Err(e);
        }
    };

    let path = report.path.display().to_string();
    if let Err(e) = sink
        .set_output(TARBALL_PATH_OUTPUT, &path)
        .and_then(|()| sink.set_output(TARBALL_NAME_OUTPUT, &report.name))
    {
        let err = ActionError::Io(e);
        sink.fail(&err.to_string());
        return Err(err);
    }

    Ok(report)
}

fn resolve_runner(settings: &Settings) -> RCmdBuild {
    let program = settings.resolve_r_path().unwrap_or_else(|e| {
        // Let the spawn fail and report it as a build start failure
        logger::warn(&e.to_string());
        PathBuf::from("R")
    });
    RCmdBuild::new(program).echo_output(settings.log_build_output)
}

fn load_request(package_dir: &Path, opts: &GlobalOpts) -> Result<BuildRequest, ActionError> {
    let settings = Settings::load(opts.config.as_deref())?;
    Ok(BuildRequest {
        package_dir: package_dir.to_path_buf(),
        inputs: ActionInputs::from_env(),
        ci: CiEnvironment::from_env(),
        settings,
    })
}

pub fn handle_build(cmd: BuildCommand, opts: &GlobalOpts) -> Result<ArtifactReport, ActionError> {
    let mut sink = GithubOutputs::from_env();
    let result = load_request(&cmd.package_dir, opts).and_then(|request| {
        let runner = resolve_runner(&request.settings);
        let deadline = Deadline::new(request.settings.build_timeout());
        run_build(&request, &runner, &deadline)
    });
    publish(result, &mut sink)
}
