/// One logical DESCRIPTION entry, possibly assembled from several physical lines
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Field {
    text: String,
}

impl Field {
    pub fn new(text: impl Into<String>) -> Self {
        Self { text: text.into() }
    }

    /// Field name: everything before the first colon, or the whole text if
    /// there is none
    pub fn name(&self) -> &str {
        match self.text.find(':') {
            Some(idx) => &self.text[..idx],
            None => &self.text,
        }
    }

    /// Full field text, continuations included
    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn name_matches(&self, key: &str) -> bool {
        self.name().to_lowercase() == key.to_lowercase()
    }
}

/// Group DESCRIPTION lines into fields.
///
/// A line starting with whitespace is appended verbatim to the open field; any
/// other line opens a new one. Empty lines hold no field and are skipped.
pub fn parse_fields(content: &str) -> Vec<Field> {
    let mut fields = Vec::new();
    let mut current = String::new();

    for line in content.split('\n') {
        if line.starts_with(char::is_whitespace) {
            current.push_str(line);
        } else {
            if !current.is_empty() {
                fields.push(Field::new(std::mem::take(&mut current)));
            }
            current = line.to_string();
        }
    }

    if !current.is_empty() {
        fields.push(Field::new(current));
    }

    fields
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_field_name() {
        assert_eq!(Field::new("Package: foo").name(), "Package");
        assert_eq!(Field::new("URL: https://example.org").name(), "URL");
        assert_eq!(Field::new("no colon here").name(), "no colon here");
    }

    #[test]
    fn test_name_matches_ignores_case() {
        let field = Field::new("SHA: abc");
        assert!(field.name_matches("sha"));
        assert!(field.name_matches("Sha"));
        assert!(!field.name_matches("sha1"));
    }

    #[test]
    fn test_continuations_are_joined_without_separator() {
        let fields = parse_fields("Title: A\nDescription: first\n    second\n\tthird\nLicense: MIT\n");
        assert_eq!(fields.len(), 3);
        assert_eq!(fields[1].text(), "Description: first    second\tthird");
        assert_eq!(fields[2].text(), "License: MIT");
    }

    #[test]
    fn test_leading_continuation_opens_blank_field() {
        let fields = parse_fields("  stray\nPackage: foo");
        assert_eq!(fields.len(), 2);
        assert_eq!(fields[0].text(), "  stray");
        assert_eq!(fields[1].name(), "Package");
    }

    #[test]
    fn test_empty_input_has_no_fields() {
        assert!(parse_fields("").is_empty());
        assert!(parse_fields("\n\n").is_empty());
    }
}
