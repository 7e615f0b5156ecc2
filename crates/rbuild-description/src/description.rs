use crate::field::{parse_fields, Field};
use crate::metadata::Metadata;
use tracing::debug;

const REMOTES_FIELD: &str = "remotes";

/// Knobs that change which fields survive a merge
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MergePolicy {
    /// Drop `Remotes` entirely; it is neither re-emitted nor overridable
    pub drop_remotes: bool,
}

/// Result of overlaying metadata onto a DESCRIPTION
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MergeOutcome {
    pub text: String,
    /// Field names rewritten in place, in their original case
    pub replaced: Vec<String>,
    /// Metadata keys added at the end
    pub appended: Vec<String>,
    pub dropped: Vec<String>,
}

/// Parsed DESCRIPTION
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Description {
    fields: Vec<Field>,
}

impl Description {
    pub fn parse(content: &str) -> Self {
        Self {
            fields: parse_fields(content),
        }
    }

    pub fn fields(&self) -> &[Field] {
        &self.fields
    }

    /// Value-bearing text of the first field named `name` (case-insensitive)
    pub fn get(&self, name: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|f| f.name_matches(name))
            .map(|f| f.text()[f.name().len()..].trim_start_matches(':').trim())
    }

    /// Overlay `metadata` onto the fields.
    ///
    /// Matching fields are rewritten in place as `Name: value`, keeping the
    /// field's own spelling of the name. Metadata keys that matched nothing
    /// are appended afterwards in insertion order.
    pub fn merge(&self, metadata: &Metadata, policy: &MergePolicy) -> MergeOutcome {
        let mut outcome = MergeOutcome::default();
        let mut consumed = vec![false; metadata.len()];

        for field in &self.fields {
            let name = field.name();

            if policy.drop_remotes && name.to_lowercase() == REMOTES_FIELD {
                debug!("Dropping '{}' field from DESCRIPTION", name);
                outcome.dropped.push(name.to_string());
                continue;
            }

            match metadata.find_ignore_case(name) {
                Some((idx, key, value)) => {
                    debug!("Replacing DESCRIPTION field '{}' with metadata '{}'", name, key);
                    outcome.text.push_str(&format!("{}: {}\n", name, value));
                    outcome.replaced.push(name.to_string());
                    consumed[idx] = true;
                }
                None => {
                    outcome.text.push_str(field.text());
                    outcome.text.push('\n');
                }
            }
        }

        for (idx, (key, value)) in metadata.iter().enumerate() {
            if consumed[idx] {
                continue;
            }
            debug!("Appending metadata field '{}'", key);
            outcome.text.push_str(&format!("{}: {}\n", key, value));
            outcome.appended.push(key.to_string());
        }

        outcome
    }
}

/// Merge `metadata` into DESCRIPTION text and return the new text
pub fn merge(content: &str, metadata: &Metadata, policy: &MergePolicy) -> String {
    Description::parse(content).merge(metadata, policy).text
}
