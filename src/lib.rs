//! # nvdl
//!
//! A Rust implementation of NVDL (Namespace-based Validation Dispatching
//! Language, ISO/IEC 19757-4) for validating multi-namespace XML documents.
//!
//! An NVDL rule document maps namespaces to actions: hand a subtree to an
//! external validator, attach it to the enclosing validation, replace it
//! with a placeholder, unwrap it, or reject it outright. This crate parses
//! rule documents, simplifies them into a flat dispatch table, and drives
//! pluggable validators over the sections of an instance document.
//!
//! ## Features
//!
//! - NVDL rule document parsing and simplification
//! - Section dispatching with modes, contexts and triggers
//! - attach, attachPlaceholder, unwrap, allow and reject actions
//! - Pluggable validator providers negotiated by schema type
//! - Streaming validation over any event source
//!
//! ## Example
//!
//! ```rust,ignore
//! use nvdl::{validate, NvdlConfig};
//!
//! let config = NvdlConfig::default();
//! validate(&rules_text, &document_text, &config)?;
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

// Foundation
pub mod error;
pub mod locations;

// Event sources
pub mod readers;

// Rule documents
pub mod rules;
pub mod simplify;
pub mod wildcards;

// Validator plumbing
pub mod filters;
pub mod providers;

// Dispatching
pub mod dispatch;
pub mod validation;

// Re-exports for convenience
pub use error::{Error, Result};
pub use providers::NvdlConfig;
pub use readers::{DocumentReader, XmlEvent, XmlRead};
pub use rules::NvdlRules;
pub use simplify::SimpleRules;
pub use validation::{validate, NvdlValidatingReader};

/// Version of the nvdl library
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// The NVDL rule document namespace
pub const NVDL_NAMESPACE: &str = "http://purl.oclc.org/dsdl/nvdl/ns/structure/1.0";

/// Namespace of synthesized placeholder elements
pub const NVDL_INSTANCE_NAMESPACE: &str = "http://purl.oclc.org/dsdl/nvdl/ns/instance/1.0";

/// The XML namespace, bound to the `xml` prefix
pub const XML_NAMESPACE: &str = "http://www.w3.org/XML/1998/namespace";
