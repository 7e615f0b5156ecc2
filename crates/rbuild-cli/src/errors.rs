//! Error type for a single action run
//!
//! Every variant is terminal: the run reports the message and exits non-zero.

use crate::invoker::BuildError;
use rbuild_config::ConfigError;
use rbuild_description::DescriptionError;
use std::io;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ActionError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Description(#[from] DescriptionError),

    #[error(transparent)]
    Build(#[from] BuildError),

    #[error(
        "R CMD build created {} new tarballs, expected exactly one: [{}]",
        found.len(),
        found.join(", ")
    )]
    AmbiguousOutput { found: Vec<String> },

    #[error("IO error: {0}")]
    Io(#[from] io::Error),
}

#[cfg(test)]
mod tests {
    use crate::errors::*;

    #[test]
    fn test_ambiguous_output_lists_candidates() {
        let err = ActionError::AmbiguousOutput {
            found: vec!["a.tar.gz".into(), "b.tar.gz".into()],
        };
        assert_eq!(
            err.to_string(),
            "R CMD build created 2 new tarballs, expected exactly one: [a.tar.gz, b.tar.gz]"
        );
    }

    #[test]
    fn test_wrapped_errors_keep_their_message() {
        let err = ActionError::from(DescriptionError::InvalidMetadata);
        assert_eq!(
            err.to_string(),
            "Metadata is not a valid object: it should only contain string/number/boolean values."
        );
    }
}
