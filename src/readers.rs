//! XML pull-reader capability
//!
//! The dispatch engine is driven by a flat stream of namespace-resolved
//! events. This module defines that event model, the [`XmlRead`] contract the
//! engine pulls from, and a default implementation over `quick-xml`.
//!
//! Self-closing elements are expanded into a start/end event pair, and
//! `xmlns` declarations are consumed into the reader's namespace scopes
//! rather than surfaced as attributes.

use crate::error::{Error, Result};
use crate::locations::SourceLocation;
use crate::XML_NAMESPACE;
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use std::collections::VecDeque;

/// A namespace-resolved attribute
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct XmlAttribute {
    /// Namespace URI (empty for unqualified attributes)
    pub namespace: String,
    /// Local name
    pub local_name: String,
    /// Attribute value
    pub value: String,
}

impl XmlAttribute {
    /// Create a new attribute
    pub fn new(
        namespace: impl Into<String>,
        local_name: impl Into<String>,
        value: impl Into<String>,
    ) -> Self {
        Self {
            namespace: namespace.into(),
            local_name: local_name.into(),
            value: value.into(),
        }
    }
}

/// One namespace-resolved event pulled from an XML document
#[derive(Debug, Clone, PartialEq)]
pub enum XmlEvent {
    /// Element start tag
    StartElement {
        /// Namespace URI (empty for no namespace)
        namespace: String,
        /// Local name
        local_name: String,
        /// Attributes, excluding namespace declarations
        attributes: Vec<XmlAttribute>,
        /// Position of the tag
        location: SourceLocation,
    },
    /// Element end tag
    EndElement {
        /// Namespace URI
        namespace: String,
        /// Local name
        local_name: String,
        /// Position of the tag
        location: SourceLocation,
    },
    /// Character data with non-whitespace content
    Text {
        /// Unescaped text value
        value: String,
        /// Position of the text
        location: SourceLocation,
    },
    /// Whitespace-only character data
    Whitespace {
        /// The whitespace run
        value: String,
        /// Position of the text
        location: SourceLocation,
    },
}

impl XmlEvent {
    /// Get the source position of this event
    pub fn location(&self) -> &SourceLocation {
        match self {
            XmlEvent::StartElement { location, .. }
            | XmlEvent::EndElement { location, .. }
            | XmlEvent::Text { location, .. }
            | XmlEvent::Whitespace { location, .. } => location,
        }
    }
}

/// Forward-only pull reader producing namespace-resolved events
pub trait XmlRead {
    /// Pull the next event, or `None` at end of document
    fn next_event(&mut self) -> Result<Option<XmlEvent>>;
}

/// One element's worth of namespace declarations
type Scope = Vec<(String, String)>;

/// Default [`XmlRead`] implementation over a `quick-xml` reader
pub struct DocumentReader<'a> {
    reader: Reader<&'a [u8]>,
    input: &'a str,
    uri: Option<String>,
    scopes: Vec<Scope>,
    pending: VecDeque<XmlEvent>,
    // incremental line/column cursor over `input`
    offset: usize,
    line: u64,
    column: u64,
}

impl<'a> DocumentReader<'a> {
    /// Create a reader over an in-memory document
    pub fn new(input: &'a str) -> Self {
        Self {
            reader: Reader::from_str(input),
            input,
            uri: None,
            scopes: Vec::new(),
            pending: VecDeque::new(),
            offset: 0,
            line: 1,
            column: 1,
        }
    }

    /// Set the document URI reported in event locations
    pub fn with_uri(mut self, uri: impl Into<String>) -> Self {
        self.uri = Some(uri.into());
        self
    }

    fn location_at(&mut self, pos: usize) -> SourceLocation {
        let pos = pos.min(self.input.len());
        if pos < self.offset {
            self.offset = 0;
            self.line = 1;
            self.column = 1;
        }
        for c in self.input[self.offset..pos].chars() {
            if c == '\n' {
                self.line += 1;
                self.column = 1;
            } else {
                self.column += 1;
            }
        }
        self.offset = pos;
        let mut loc = SourceLocation::new(self.line, self.column);
        if let Some(ref uri) = self.uri {
            loc = loc.with_uri(uri.clone());
        }
        loc
    }

    fn resolve_prefix(&self, prefix: &str) -> Result<String> {
        if prefix == "xml" {
            return Ok(XML_NAMESPACE.to_string());
        }
        for scope in self.scopes.iter().rev() {
            for (p, uri) in scope.iter().rev() {
                if p == prefix {
                    return Ok(uri.clone());
                }
            }
        }
        if prefix.is_empty() {
            Ok(String::new())
        } else {
            Err(Error::Xml(format!("undeclared namespace prefix '{}'", prefix)))
        }
    }

    fn resolve_name(&self, qname: &str, is_attribute: bool) -> Result<(String, String)> {
        if let Some((prefix, local)) = qname.split_once(':') {
            Ok((self.resolve_prefix(prefix)?, local.to_string()))
        } else if is_attribute {
            // unprefixed attributes are never in the default namespace
            Ok((String::new(), qname.to_string()))
        } else {
            Ok((self.resolve_prefix("")?, qname.to_string()))
        }
    }

    /// Split an element tag into its namespace scope and real attributes
    fn open_element(
        &mut self,
        start: &BytesStart,
        location: SourceLocation,
    ) -> Result<XmlEvent> {
        let mut scope: Scope = Vec::new();
        let mut raw_attributes: Vec<(String, String)> = Vec::new();

        for attr_result in start.attributes() {
            let attr = attr_result
                .map_err(|e| Error::Xml(format!("failed to parse attribute: {}", e)))?;
            let key = std::str::from_utf8(attr.key.as_ref())
                .map_err(|e| Error::Xml(format!("invalid attribute name: {}", e)))?
                .to_string();
            let value = attr
                .unescape_value()
                .map_err(|e| Error::Xml(format!("failed to unescape attribute value: {}", e)))?
                .to_string();

            if key == "xmlns" {
                scope.push((String::new(), value));
            } else if let Some(prefix) = key.strip_prefix("xmlns:") {
                scope.push((prefix.to_string(), value));
            } else {
                raw_attributes.push((key, value));
            }
        }
        self.scopes.push(scope);

        let name = std::str::from_utf8(start.name().as_ref())
            .map_err(|e| Error::Xml(format!("invalid element name: {}", e)))?
            .to_string();
        let (namespace, local_name) = self.resolve_name(&name, false)?;

        let mut attributes = Vec::with_capacity(raw_attributes.len());
        for (key, value) in raw_attributes {
            let (ns, local) = self.resolve_name(&key, true)?;
            attributes.push(XmlAttribute::new(ns, local, value));
        }

        Ok(XmlEvent::StartElement {
            namespace,
            local_name,
            attributes,
            location,
        })
    }
}

impl XmlRead for DocumentReader<'_> {
    fn next_event(&mut self) -> Result<Option<XmlEvent>> {
        if let Some(event) = self.pending.pop_front() {
            return Ok(Some(event));
        }

        loop {
            let pos = self.reader.buffer_position();
            let location = self.location_at(pos);

            match self.reader.read_event() {
                Ok(Event::Start(e)) => {
                    return Ok(Some(self.open_element(&e, location)?));
                }
                Ok(Event::Empty(e)) => {
                    let start = self.open_element(&e, location.clone())?;
                    if let XmlEvent::StartElement {
                        ref namespace,
                        ref local_name,
                        ..
                    } = start
                    {
                        self.pending.push_back(XmlEvent::EndElement {
                            namespace: namespace.clone(),
                            local_name: local_name.clone(),
                            location,
                        });
                    }
                    self.scopes.pop();
                    return Ok(Some(start));
                }
                Ok(Event::End(e)) => {
                    let name = std::str::from_utf8(e.name().as_ref())
                        .map_err(|e| Error::Xml(format!("invalid element name: {}", e)))?
                        .to_string();
                    let (namespace, local_name) = self.resolve_name(&name, false)?;
                    self.scopes.pop();
                    return Ok(Some(XmlEvent::EndElement {
                        namespace,
                        local_name,
                        location,
                    }));
                }
                Ok(Event::Text(e)) => {
                    let value = e
                        .unescape()
                        .map_err(|e| Error::Xml(format!("failed to unescape text: {}", e)))?
                        .to_string();
                    if self.scopes.is_empty() && value.trim().is_empty() {
                        // prolog/epilog whitespace
                        continue;
                    }
                    let event = if value.trim().is_empty() {
                        XmlEvent::Whitespace { value, location }
                    } else {
                        XmlEvent::Text { value, location }
                    };
                    return Ok(Some(event));
                }
                Ok(Event::CData(e)) => {
                    let value = std::str::from_utf8(&e.into_inner())
                        .map_err(|e| Error::Xml(format!("invalid CDATA: {}", e)))?
                        .to_string();
                    return Ok(Some(XmlEvent::Text { value, location }));
                }
                Ok(Event::Eof) => return Ok(None),
                Ok(_) => continue, // declarations, comments, processing instructions
                Err(e) => {
                    return Err(Error::Xml(format!(
                        "error parsing XML at position {}: {}",
                        pos, e
                    )))
                }
            }
        }
    }
}
