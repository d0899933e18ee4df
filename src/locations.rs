//! Source location tracking
//!
//! This module carries the (URI, line, column) positions attached to rule
//! document nodes and instance events, used for diagnostics in compile and
//! validation errors.

use std::fmt;

/// A position in an XML source, optionally qualified by the source URI
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SourceLocation {
    /// URI of the source document, when known
    pub uri: Option<String>,
    /// One-based line number (0 when unknown)
    pub line: u64,
    /// One-based column number (0 when unknown)
    pub column: u64,
}

impl SourceLocation {
    /// Create a location from a line and column
    pub fn new(line: u64, column: u64) -> Self {
        Self {
            uri: None,
            line,
            column,
        }
    }

    /// Set the source URI
    pub fn with_uri(mut self, uri: impl Into<String>) -> Self {
        self.uri = Some(uri.into());
        self
    }

    /// Check whether any positional information is present
    pub fn is_known(&self) -> bool {
        self.uri.is_some() || self.line != 0 || self.column != 0
    }
}

impl fmt::Display for SourceLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.uri {
            Some(uri) => write!(f, "{}:{}:{}", uri, self.line, self.column),
            None => write!(f, "{}:{}", self.line, self.column),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_with_uri() {
        let loc = SourceLocation::new(12, 3).with_uri("rules.nvdl");
        assert_eq!(loc.to_string(), "rules.nvdl:12:3");
    }

    #[test]
    fn test_display_without_uri() {
        let loc = SourceLocation::new(12, 3);
        assert_eq!(loc.to_string(), "12:3");
    }

    #[test]
    fn test_is_known() {
        assert!(!SourceLocation::default().is_known());
        assert!(SourceLocation::new(1, 1).is_known());
        assert!(SourceLocation::default().with_uri("a").is_known());
    }
}
