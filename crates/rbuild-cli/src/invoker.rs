//! `R CMD build` invocation
//!
//! The child gets its library paths through an explicit [`BuildEnv`] applied to
//! the `Command`; the parent's environment is never touched. Output is piped
//! and captured rather than streamed, and the wait can be bounded by a
//! [`Deadline`]. On unix the build runs in its own process group, which is
//! killed as a whole when the deadline passes.

use crate::logger;
use std::ffi::OsString;
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use std::process::{Child, Command, ExitStatus, Output, Stdio};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};
use thiserror::Error;

const POLL_INTERVAL: Duration = Duration::from_millis(50);

#[derive(Debug, Error)]
pub enum BuildError {
    #[error("Failed to start build.")]
    Spawn {
        program: String,
        #[source]
        source: io::Error,
    },

    #[error("Failed to build package:\nstdout:\n{stdout}\nstderr:{stderr}")]
    Failed {
        status: Option<i32>,
        stdout: String,
        stderr: String,
    },

    #[error("Build did not finish within {}s", .0.as_secs_f64())]
    TimedOut(Duration),

    #[error("Build was cancelled")]
    Cancelled,

    #[error("IO error while waiting for build: {0}")]
    Io(#[from] io::Error),
}

/// Flags derived from the action inputs
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BuildOptions {
    pub library: String,
    pub build_vignettes: bool,
    pub resave_data: bool,
    pub md5: bool,
    pub user: Option<String>,
}

impl BuildOptions {
    /// Arguments passed to the R executable
    pub fn args(&self) -> Vec<String> {
        let mut args: Vec<String> = vec!["CMD".into(), "build".into(), ".".into()];
        if !self.build_vignettes {
            args.push("--no-build-vignettes".into());
        }
        if !self.resave_data {
            args.push("--no-resave-data".into());
        }
        if self.md5 {
            args.push("--md5".into());
        }
        if let Some(ref user) = self.user {
            args.push(format!("--user={}", user));
        }
        args
    }
}

/// Environment overrides for the build child
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BuildEnv {
    vars: Vec<(OsString, OsString)>,
}

impl BuildEnv {
    /// Point both the site and user library search paths at `library`
    pub fn for_library(library: &str) -> Self {
        Self {
            vars: vec![
                ("R_LIBS_SITE".into(), library.into()),
                ("R_LIBS_USER".into(), library.into()),
            ],
        }
    }

    pub fn apply(&self, command: &mut Command) {
        command.envs(self.vars.iter().map(|(k, v)| (k, v)));
    }
}

/// Shared flag that aborts a running build
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// How long to wait for the build. The default waits forever.
#[derive(Debug, Clone, Default)]
pub struct Deadline {
    pub timeout: Option<Duration>,
    pub cancel: CancelToken,
}

impl Deadline {
    pub fn new(timeout: Option<Duration>) -> Self {
        Self {
            timeout,
            cancel: CancelToken::new(),
        }
    }
}

/// Captured output of a successful build
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BuildOutput {
    pub stdout: String,
    pub stderr: String,
}

/// Runs the package build inside a package directory
pub trait BuildRunner {
    fn run(
        &self,
        package_dir: &Path,
        options: &BuildOptions,
        deadline: &Deadline,
    ) -> Result<BuildOutput, BuildError>;
}

/// Production runner that shells out to `R CMD build`
#[derive(Debug, Clone)]
pub struct RCmdBuild {
    program: PathBuf,
    echo_output: bool,
}

impl RCmdBuild {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            echo_output: false,
        }
    }

    /// Print captured output to the console after a successful build
    pub fn echo_output(mut self, echo: bool) -> Self {
        self.echo_output = echo;
        self
    }
}

impl BuildRunner for RCmdBuild {
    fn run(
        &self,
        package_dir: &Path,
        options: &BuildOptions,
        deadline: &Deadline,
    ) -> Result<BuildOutput, BuildError> {
        let args = options.args();
        let command_line = format!("{} {}", self.program.display(), args.join(" "));
        logger::info(&format!(
            "Running \"{}\" and using {} as library",
            command_line, options.library
        ));

        let mut command = Command::new(&self.program);
        command
            .args(&args)
            .current_dir(package_dir)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());
        BuildEnv::for_library(&options.library).apply(&mut command);

        // Own process group, so a timeout can take down everything R started
        #[cfg(unix)]
        {
            use std::os::unix::process::CommandExt;
            command.process_group(0);
        }

        let mut child = command.spawn().map_err(|source| {
            logger::error(&format!(
                "Could not spawn {}: {:?} (os error {:?})",
                self.program.display(),
                source.kind(),
                source.raw_os_error()
            ));
            BuildError::Spawn {
                program: self.program.display().to_string(),
                source,
            }
        })?;

        let started = Instant::now();
        let (tx, rx) = mpsc::channel();
        let mut pending = 0;
        if let Some(pipe) = child.stdout.take() {
            drain(pipe, Stream::Stdout, tx.clone());
            pending += 1;
        }
        if let Some(pipe) = child.stderr.take() {
            drain(pipe, Stream::Stderr, tx.clone());
            pending += 1;
        }
        drop(tx);

        let status = wait_with_deadline(&mut child, deadline, started)?;
        // Background processes of the build may keep the pipes open after it
        // exits, so collecting output stays under the same deadline.
        let (stdout, stderr) = collect(&rx, pending, child.id(), deadline, started)?;

        let output = Output {
            status,
            stdout,
            stderr,
        };
        logger::capture_output(&command_line, &output, self.echo_output && status.success());

        let stdout = String::from_utf8_lossy(&output.stdout).into_owned();
        let stderr = String::from_utf8_lossy(&output.stderr).into_owned();

        if !status.success() {
            return Err(BuildError::Failed {
                status: status.code(),
                stdout,
                stderr,
            });
        }

        Ok(BuildOutput { stdout, stderr })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Stream {
    Stdout,
    Stderr,
}

fn drain<R>(mut pipe: R, stream: Stream, tx: Sender<(Stream, Vec<u8>)>)
where
    R: Read + Send + 'static,
{
    thread::spawn(move || {
        let mut buf = Vec::new();
        if let Err(e) = pipe.read_to_end(&mut buf) {
            logger::debug(&format!("Failed to read build {:?}: {}", stream, e));
        }
        // The receiver is gone once the run has given up on the build
        let _ = tx.send((stream, buf));
    });
}

/// Fail with `Cancelled` or `TimedOut` once the deadline has passed
fn check_deadline(deadline: &Deadline, started: Instant) -> Result<(), BuildError> {
    if deadline.cancel.is_cancelled() {
        return Err(BuildError::Cancelled);
    }
    match deadline.timeout {
        Some(timeout) if started.elapsed() >= timeout => Err(BuildError::TimedOut(timeout)),
        _ => Ok(()),
    }
}

fn wait_with_deadline(
    child: &mut Child,
    deadline: &Deadline,
    started: Instant,
) -> Result<ExitStatus, BuildError> {
    loop {
        if let Some(status) = child.try_wait()? {
            return Ok(status);
        }

        if let Err(e) = check_deadline(deadline, started) {
            terminate(child);
            return Err(e);
        }

        thread::sleep(POLL_INTERVAL);
    }
}

fn collect(
    rx: &Receiver<(Stream, Vec<u8>)>,
    mut pending: usize,
    group: u32,
    deadline: &Deadline,
    started: Instant,
) -> Result<(Vec<u8>, Vec<u8>), BuildError> {
    let mut stdout = Vec::new();
    let mut stderr = Vec::new();

    while pending > 0 {
        if let Err(e) = check_deadline(deadline, started) {
            kill_group(group);
            return Err(e);
        }

        match rx.recv_timeout(POLL_INTERVAL) {
            Ok((Stream::Stdout, buf)) => stdout = buf,
            Ok((Stream::Stderr, buf)) => stderr = buf,
            Err(RecvTimeoutError::Timeout) => continue,
            Err(RecvTimeoutError::Disconnected) => break,
        }
        pending -= 1;
    }

    Ok((stdout, stderr))
}

fn terminate(child: &mut Child) {
    kill_group(child.id());
    if let Err(e) = child.kill() {
        logger::debug(&format!("Failed to kill build process: {}", e));
    }
    let _ = child.wait();
}

/// Kill every process in the build's process group
#[cfg(unix)]
fn kill_group(group: u32) {
    use nix::sys::signal::{killpg, Signal};
    use nix::unistd::Pid;

    let Ok(pid) = i32::try_from(group) else {
        return;
    };
    if let Err(e) = killpg(Pid::from_raw(pid), Signal::SIGKILL) {
        logger::debug(&format!("Failed to kill build process group {}: {}", group, e));
    }
}

#[cfg(not(unix))]
fn kill_group(_group: u32) {}
