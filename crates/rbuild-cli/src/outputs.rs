//! Reporting results back to the CI runner

use std::fs::OpenOptions;
use std::io::{self, Write};
use std::path::PathBuf;

/// Environment variable naming the runner's output file
pub const OUTPUT_FILE_VAR: &str = "GITHUB_OUTPUT";

pub const TARBALL_NAME_OUTPUT: &str = "tarball_name";
pub const TARBALL_PATH_OUTPUT: &str = "tarball_path";

const MULTILINE_DELIMITER: &str = "rbuild_EOF";

/// Key/value sink for step outputs plus a failure channel
pub trait OutputSink {
    fn set_output(&mut self, name: &str, value: &str) -> io::Result<()>;

    /// Mark the step as failed with `message`
    fn fail(&mut self, message: &str);
}

/// Writes outputs the way GitHub Actions expects them
#[derive(Debug, Clone, Default)]
pub struct GithubOutputs {
    file: Option<PathBuf>,
}

impl GithubOutputs {
    pub fn new(file: Option<PathBuf>) -> Self {
        Self { file }
    }

    pub fn from_env() -> Self {
        Self::new(
            std::env::var_os(OUTPUT_FILE_VAR)
                .filter(|v| !v.is_empty())
                .map(PathBuf::from),
        )
    }
}

fn format_output(name: &str, value: &str) -> String {
    if value.contains('\n') {
        format!(
            "{name}<<{delim}\n{value}\n{delim}\n",
            name = name,
            value = value,
            delim = MULTILINE_DELIMITER
        )
    } else {
        format!("{}={}\n", name, value)
    }
}

/// Escape a workflow command message (`%`, CR and LF)
pub fn escape_data(message: &str) -> String {
    message
        .replace('%', "%25")
        .replace('\r', "%0D")
        .replace('\n', "%0A")
}

impl OutputSink for GithubOutputs {
    fn set_output(&mut self, name: &str, value: &str) -> io::Result<()> {
        let line = format_output(name, value);
        match self.file {
            Some(ref path) => {
                let mut file = OpenOptions::new().create(true).append(true).open(path)?;
                file.write_all(line.as_bytes())
            }
            None => {
                print!("{}", line);
                Ok(())
            }
        }
    }

    fn fail(&mut self, message: &str) {
        println!("::error::{}", escape_data(message));
    }
}

/// In-memory sink, handy for driving the orchestrator without a runner
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RecordedOutputs {
    pub outputs: Vec<(String, String)>,
    pub failure: Option<String>,
}

impl RecordedOutputs {
    pub fn get(&self, name: &str) -> Option<&str> {
        self.outputs
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }
}

impl OutputSink for RecordedOutputs {
    fn set_output(&mut self, name: &str, value: &str) -> io::Result<()> {
        self.outputs.push((name.to_string(), value.to_string()));
        Ok(())
    }

    fn fail(&mut self, message: &str) {
        self.failure = Some(message.to_string());
    }
}
