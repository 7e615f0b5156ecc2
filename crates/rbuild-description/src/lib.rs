//! R package DESCRIPTION handling
//!
//! A DESCRIPTION file is a sequence of `Name: value` fields, where lines that
//! start with whitespace continue the previous field. This crate parses that
//! format, overlays a scalar metadata map onto it, and writes the result back.
//!
//! Continuation lines are joined onto their field without a separator, so a
//! merged file merges again to identical text.

pub mod description;
pub mod description_writer;
pub mod errors;
pub mod field;
pub mod metadata;

pub use description::{merge, Description, MergeOutcome, MergePolicy};
pub use description_writer::{
    read_description, write_description, DescriptionGuard, DESCRIPTION_FILE,
};
pub use errors::DescriptionError;
pub use field::Field;
pub use metadata::{Metadata, MetadataValue};
