//! Validating reader
//!
//! [`NvdlValidatingReader`] wraps any [`XmlRead`] source and feeds every
//! event through a [`Dispatcher`] before handing it back, so validation
//! happens as a side effect of reading. [`validate`] is the one-shot
//! convenience over string inputs.

use crate::dispatch::Dispatcher;
use crate::error::Result;
use crate::providers::NvdlConfig;
use crate::readers::{DocumentReader, XmlEvent, XmlRead};
use crate::rules::NvdlRules;
use crate::simplify::SimpleRules;

/// A reader that validates the document as it is consumed
pub struct NvdlValidatingReader<'r, R: XmlRead> {
    reader: R,
    dispatcher: Dispatcher<'r>,
    finished: bool,
}

impl<'r, R: XmlRead> NvdlValidatingReader<'r, R> {
    /// Wrap a reader with a compiled rule set
    pub fn new(reader: R, rules: &'r SimpleRules, config: &'r NvdlConfig) -> Self {
        NvdlValidatingReader {
            reader,
            dispatcher: Dispatcher::new(rules, config),
            finished: false,
        }
    }

    /// Register a callback fired with each action message as sections are
    /// dispatched
    pub fn with_action_callback(mut self, callback: impl FnMut(&str) + 'r) -> Self {
        self.dispatcher = self.dispatcher.with_action_callback(callback);
        self
    }

    /// Pull the next event, dispatching it through the rules first. Returns
    /// `None` once the document is exhausted and every section has closed.
    pub fn read(&mut self) -> Result<Option<XmlEvent>> {
        match self.reader.next_event()? {
            Some(event) => {
                self.dispatcher.dispatch(&event)?;
                Ok(Some(event))
            }
            None => {
                if !self.finished {
                    self.finished = true;
                    self.dispatcher.finish()?;
                }
                Ok(None)
            }
        }
    }

    /// Drain the document, keeping only the validation outcome
    pub fn validate_all(&mut self) -> Result<()> {
        while self.read()?.is_some() {}
        Ok(())
    }
}

/// Validate a document against an NVDL rule document, both given as text
pub fn validate(rules: &str, document: &str, config: &NvdlConfig) -> Result<()> {
    let raw = NvdlRules::parse(rules)?;
    let simple = SimpleRules::simplify(&raw, config)?;
    let mut reader =
        NvdlValidatingReader::new(DocumentReader::new(document), &simple, config);
    reader.validate_all()
}
