//! Filtering reader with placeholder synthesis
//!
//! Each validate interpretation owns a [`FilteringReader`]: the dispatcher
//! pushes instance events into it and the interpretation's validator pulls
//! them back out, one node per `read`. The filter can also synthesize a
//! virtual `placeholder` element in place of real content, which is how the
//! `attachPlaceholder` result action presents foreign subtrees to a parent
//! validator as a namespace/name stub.

use crate::locations::SourceLocation;
use crate::readers::{XmlAttribute, XmlEvent};
use crate::NVDL_INSTANCE_NAMESPACE;
use std::collections::VecDeque;

/// Local name of the synthesized stand-in element
pub const PLACEHOLDER_LOCAL_NAME: &str = "placeholder";

/// Event conduit between the dispatcher and one validator
#[derive(Debug, Default)]
pub struct FilteringReader {
    queue: VecDeque<XmlEvent>,
    // nesting depth of attach calls; real events are hidden while > 0
    placeholder_depth: usize,
}

impl FilteringReader {
    /// Create an empty filter
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue one event for the validator, unless a placeholder is attached
    pub fn push(&mut self, event: XmlEvent) {
        if self.placeholder_depth == 0 {
            self.queue.push_back(event);
        }
    }

    /// Pull the next queued event
    pub fn read(&mut self) -> Option<XmlEvent> {
        self.queue.pop_front()
    }

    /// Check whether the validator has events left to consume
    pub fn has_pending(&self) -> bool {
        !self.queue.is_empty()
    }

    /// Check whether a placeholder is currently attached
    pub fn placeholder_attached(&self) -> bool {
        self.placeholder_depth > 0
    }

    /// Replace subsequent real content with a synthetic `placeholder`
    /// element carrying `ns` and `localName` attributes captured from the
    /// real element. Nested attaches are counted; only the outermost pair
    /// emits synthetic nodes.
    pub fn attach_placeholder(&mut self, ns: &str, local_name: &str, location: &SourceLocation) {
        if self.placeholder_depth == 0 {
            self.queue.push_back(XmlEvent::StartElement {
                namespace: NVDL_INSTANCE_NAMESPACE.to_string(),
                local_name: PLACEHOLDER_LOCAL_NAME.to_string(),
                attributes: vec![
                    XmlAttribute::new("", "ns", ns),
                    XmlAttribute::new("", "localName", local_name),
                ],
                location: location.clone(),
            });
        }
        self.placeholder_depth += 1;
    }

    /// Close the synthetic element and restore passthrough on the
    /// following push
    pub fn detach_placeholder(&mut self, location: &SourceLocation) {
        debug_assert!(self.placeholder_depth > 0, "detach without attach");
        self.placeholder_depth = self.placeholder_depth.saturating_sub(1);
        if self.placeholder_depth == 0 {
            self.queue.push_back(XmlEvent::EndElement {
                namespace: NVDL_INSTANCE_NAMESPACE.to_string(),
                local_name: PLACEHOLDER_LOCAL_NAME.to_string(),
                location: location.clone(),
            });
        }
    }
}
