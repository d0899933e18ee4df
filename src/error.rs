//! Error types for nvdl-rs
//!
//! This module defines all error types used throughout the library:
//! compile errors raised while simplifying a rule document, and validation
//! errors raised while dispatching an instance document.

use crate::locations::SourceLocation;
use std::fmt;
use thiserror::Error;

/// Result type alias using nvdl Error
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for NVDL operations
#[derive(Error, Debug)]
pub enum Error {
    /// Rule simplification error
    #[error("compile error: {0}")]
    Compile(#[from] CompileError),

    /// Instance validation error
    #[error("validation error: {0}")]
    Validation(#[from] ValidationError),

    /// Resource loading error
    #[error("resource error: {0}")]
    Resource(String),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// XML parsing error
    #[error("XML error: {0}")]
    Xml(String),

    /// URL parsing error
    #[error("URL error: {0}")]
    Url(#[from] url::ParseError),

    /// Violated engine invariant
    #[error("internal error: {0}")]
    Internal(String),
}

/// Error raised during rule simplification
///
/// Simplification is all-or-nothing: any compile error aborts it and no
/// partial rule set is produced.
#[derive(Debug, Clone)]
pub struct CompileError {
    /// Error message
    pub message: String,
    /// Position in the rule document that caused the error
    pub location: Option<SourceLocation>,
}

impl CompileError {
    /// Create a new compile error
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            location: None,
        }
    }

    /// Set the rule document location
    pub fn with_location(mut self, location: SourceLocation) -> Self {
        self.location = Some(location);
        self
    }
}

impl fmt::Display for CompileError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.location {
            Some(loc) if loc.is_known() => write!(f, "{} at {}", self.message, loc),
            _ => write!(f, "{}", self.message),
        }
    }
}

impl std::error::Error for CompileError {}

/// Error raised while validating an instance document
#[derive(Debug, Clone)]
pub struct ValidationError {
    /// Error message
    pub message: String,
    /// Position in the instance document
    pub location: Option<SourceLocation>,
    /// Name of the NVDL action whose validator rejected the input
    pub action: Option<String>,
}

impl ValidationError {
    /// Create a new validation error
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            location: None,
            action: None,
        }
    }

    /// Set the instance location
    pub fn with_location(mut self, location: SourceLocation) -> Self {
        self.location = Some(location);
        self
    }

    /// Set the originating action name
    pub fn with_action(mut self, action: impl Into<String>) -> Self {
        self.action = Some(action.into());
        self
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)?;

        if let Some(ref loc) = self.location {
            if loc.is_known() {
                write!(f, " at {}", loc)?;
            }
        }

        if let Some(ref action) = self.action {
            write!(f, " (action '{}')", action)?;
        }

        Ok(())
    }
}

impl std::error::Error for ValidationError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_compile_error_display() {
        let err = CompileError::new("mode 'attachments' is not defined")
            .with_location(SourceLocation::new(4, 10).with_uri("rules.nvdl"));

        let msg = format!("{}", err);
        assert!(msg.contains("mode 'attachments' is not defined"));
        assert!(msg.contains("rules.nvdl:4:10"));
    }

    #[test]
    fn test_compile_error_without_location() {
        let err = CompileError::new("no rules declared");
        assert_eq!(format!("{}", err), "no rules declared");
    }

    #[test]
    fn test_validation_error_display() {
        let err = ValidationError::new("element 'memo' in namespace 'urn:b' is rejected")
            .with_location(SourceLocation::new(7, 2))
            .with_action("reject");

        let msg = format!("{}", err);
        assert!(msg.contains("urn:b"));
        assert!(msg.contains("7:2"));
        assert!(msg.contains("action 'reject'"));
    }

    #[test]
    fn test_error_conversion() {
        let err: Error = CompileError::new("test").into();
        assert!(matches!(err, Error::Compile(_)));

        let err: Error = ValidationError::new("test").into();
        assert!(matches!(err, Error::Validation(_)));
    }
}
