use std::fmt;

/// PostgreSQL silently truncates identifiers longer than this (NAMEDATALEN - 1), which would
/// let two distinct field names collide on the same column.
pub const MAX_IDENTIFIER_BYTES: usize = 63;

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum IdentifierError {
    #[error("Identifier can not be empty")]
    Empty,

    #[error(
        "Identifier '{name}' is {length} bytes long, the maximum is {max}",
        max = MAX_IDENTIFIER_BYTES
    )]
    TooLong { name: String, length: usize },

    #[error("Identifier {0:?} contains a control character")]
    ControlCharacter(String),
}

/// A table or column name which is safe to put in a schema statement.
///
/// Names are kept exactly as they appear in the data (case and spaces included) and are
/// always rendered double-quoted, so `Invoice Number` and `select` are both fine as columns.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Identifier(String);

impl Identifier {
    pub fn new(name: impl Into<String>) -> Result<Self, IdentifierError> {
        let name = name.into();

        if name.is_empty() {
            return Err(IdentifierError::Empty);
        }

        if name.len() > MAX_IDENTIFIER_BYTES {
            let length = name.len();
            return Err(IdentifierError::TooLong { name, length });
        }

        if name.chars().any(char::is_control) {
            return Err(IdentifierError::ControlCharacter(name));
        }

        Ok(Identifier(name))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The identifier as a quoted SQL identifier, embedded quotes doubled.
    pub fn quoted(&self) -> String {
        format!("\"{}\"", self.0.replace('"', "\"\""))
    }
}

impl fmt::Display for Identifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quotes_plain_names() {
        assert_eq!(Identifier::new("documents").unwrap().quoted(), "\"documents\"");
        assert_eq!(Identifier::new("Invoice Number").unwrap().quoted(), "\"Invoice Number\"");
        assert_eq!(Identifier::new("select").unwrap().quoted(), "\"select\"");
    }

    #[test]
    fn test_escapes_embedded_quotes() {
        let identifier = Identifier::new("a\"; DROP TABLE documents; --").unwrap();
        assert_eq!(identifier.quoted(), "\"a\"\"; DROP TABLE documents; --\"");
        assert_eq!(identifier.as_str(), "a\"; DROP TABLE documents; --");
    }

    #[test]
    fn test_rejects_empty() {
        assert_eq!(Identifier::new(""), Err(IdentifierError::Empty));
    }

    #[test]
    fn test_rejects_control_characters() {
        assert!(matches!(Identifier::new("a\0b"), Err(IdentifierError::ControlCharacter(_))));
        assert!(matches!(
            Identifier::new("line\nbreak"),
            Err(IdentifierError::ControlCharacter(_))
        ));
    }

    #[test]
    fn test_length_limit_is_in_bytes() {
        assert!(Identifier::new("a".repeat(MAX_IDENTIFIER_BYTES)).is_ok());
        assert!(matches!(
            Identifier::new("a".repeat(MAX_IDENTIFIER_BYTES + 1)),
            Err(IdentifierError::TooLong { length: 64, .. })
        ));
        // 32 two-byte characters
        assert!(matches!(Identifier::new("é".repeat(32)), Err(IdentifierError::TooLong { .. })));
    }

    #[test]
    fn test_unicode_is_allowed() {
        assert_eq!(Identifier::new("número").unwrap().quoted(), "\"número\"");
    }
}
