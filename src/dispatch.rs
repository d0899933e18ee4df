//! Section dispatching
//!
//! The [`Dispatcher`] walks a document's event stream and carves it into
//! sections at every namespace change (and at trigger elements). Each
//! section is handled by one or more interpretations, one per action of the
//! rule matching the section's namespace in the mode in effect. A `validate`
//! interpretation owns a [`FilteringReader`] and an external validator;
//! `attach`, `unwrap` and `attachPlaceholder` interpretations route or
//! suppress events on their ancestors' behalf.
//!
//! Interpretations live in an arena for the lifetime of the dispatch. When a
//! nested section would repeat an ancestor's mode and action, the ancestor
//! interpretation is reused so that a namespace toggling back and forth
//! feeds a single validator.

use crate::error::{Error, Result};
use crate::filters::FilteringReader;
use crate::locations::SourceLocation;
use crate::providers::{AttributeValidator, NvdlConfig, Validator};
use crate::readers::{XmlAttribute, XmlEvent};
use crate::simplify::{ActionId, ActionKind, ModeId, SimpleRules};
use indexmap::IndexMap;
use std::collections::{HashMap, HashSet};

/// Callback invoked with each resolved action message when an
/// interpretation starts
pub type ActionCallback<'r> = Box<dyn FnMut(&str) + 'r>;

/// One interpretation of a section
struct Interpretation {
    mode: ModeId,
    action: ActionId,
    parent: Option<usize>,
    kind: InterpKind,
}

enum InterpKind {
    Validate {
        filter: FilteringReader,
        validator: Box<dyn Validator>,
    },
    Attach,
    AttachPlaceholder,
    Unwrap,
}

/// An open section: one namespace-uniform element subtree
struct Section {
    namespace: String,
    /// Open element count; 1 means the boundary element itself
    depth: usize,
    interps: Vec<usize>,
    /// Local names of this section's open elements, for context matching
    ancestors: Vec<String>,
}

/// How a section event reaches an interpretation
enum Route {
    Deliver,
    Placeholder,
    Drop,
}

/// The dispatching state machine
pub struct Dispatcher<'r> {
    rules: &'r SimpleRules,
    config: &'r NvdlConfig,
    interps: Vec<Interpretation>,
    sections: Vec<Section>,
    /// One attribute validator per validate action, shared across elements
    attribute_validators: HashMap<ActionId, Option<Box<dyn AttributeValidator>>>,
    on_action_started: Option<ActionCallback<'r>>,
}

impl<'r> Dispatcher<'r> {
    /// Create a dispatcher over a compiled rule set
    pub fn new(rules: &'r SimpleRules, config: &'r NvdlConfig) -> Self {
        Dispatcher {
            rules,
            config,
            interps: Vec::new(),
            sections: Vec::new(),
            attribute_validators: HashMap::new(),
            on_action_started: None,
        }
    }

    /// Register a callback fired with each action message as the action
    /// starts
    pub fn with_action_callback(mut self, callback: impl FnMut(&str) + 'r) -> Self {
        self.on_action_started = Some(Box::new(callback));
        self
    }

    /// Feed one document event through the dispatcher
    pub fn dispatch(&mut self, event: &XmlEvent) -> Result<()> {
        match event {
            XmlEvent::StartElement {
                namespace,
                local_name,
                attributes,
                location,
            } => self.start_element(namespace, local_name, attributes, location),
            XmlEvent::EndElement {
                namespace,
                local_name,
                location,
            } => self.end_element(namespace, local_name, location),
            XmlEvent::Text { value, location } => self.text(value, location, false),
            XmlEvent::Whitespace { value, location } => self.text(value, location, true),
        }
    }

    /// Check that the document closed every section it opened
    pub fn finish(&mut self) -> Result<()> {
        if self.sections.is_empty() {
            Ok(())
        } else {
            Err(Error::Internal(format!(
                "document ended with {} unclosed section(s)",
                self.sections.len()
            )))
        }
    }

    fn start_element(
        &mut self,
        namespace: &str,
        local_name: &str,
        attributes: &[XmlAttribute],
        location: &SourceLocation,
    ) -> Result<()> {
        let new_section = match self.sections.last() {
            None => true,
            Some(section) => {
                section.namespace != namespace
                    || self
                        .rules
                        .triggers()
                        .iter()
                        .any(|t| t.fires(namespace, local_name))
            }
        };
        if new_section {
            self.start_section(namespace, location)?;
        }

        let (boundary, interp_ids) = {
            let section = self.current_section(local_name)?;
            section.depth += 1;
            section.ancestors.push(local_name.to_string());
            (section.depth == 1, section.interps.clone())
        };

        // one validation call per attribute namespace and action, however
        // many interpretations the section has
        let mut validated = HashSet::new();
        for id in interp_ids {
            match self.route(id, boundary) {
                Route::Drop => {}
                Route::Placeholder => {
                    if let Some(target) = self.nearest_validate(id)? {
                        if let InterpKind::Validate { filter, .. } = &mut self.interps[target].kind
                        {
                            filter.attach_placeholder(namespace, local_name, location);
                        }
                        self.advance(target, location)?;
                    }
                }
                Route::Deliver => {
                    let attached =
                        self.dispatch_attributes(id, attributes, &mut validated, location)?;
                    let event = XmlEvent::StartElement {
                        namespace: namespace.to_string(),
                        local_name: local_name.to_string(),
                        attributes: attached,
                        location: location.clone(),
                    };
                    self.deliver(id, event, location)?;
                }
            }
        }
        Ok(())
    }

    fn end_element(
        &mut self,
        namespace: &str,
        local_name: &str,
        location: &SourceLocation,
    ) -> Result<()> {
        let (boundary, interp_ids) = {
            let section = self.current_section(local_name)?;
            (section.depth == 1, section.interps.clone())
        };

        for id in interp_ids {
            match self.route(id, boundary) {
                Route::Drop => {}
                Route::Placeholder => {
                    if let Some(target) = self.nearest_validate(id)? {
                        if let InterpKind::Validate { filter, .. } = &mut self.interps[target].kind
                        {
                            filter.detach_placeholder(location);
                        }
                        self.advance(target, location)?;
                    }
                }
                Route::Deliver => {
                    let event = XmlEvent::EndElement {
                        namespace: namespace.to_string(),
                        local_name: local_name.to_string(),
                        location: location.clone(),
                    };
                    self.deliver(id, event, location)?;
                }
            }
        }

        let section = self.current_section(local_name)?;
        section.ancestors.pop();
        section.depth -= 1;
        if section.depth == 0 {
            self.sections.pop();
        }
        Ok(())
    }

    fn text(&mut self, value: &str, location: &SourceLocation, whitespace: bool) -> Result<()> {
        // character data before the root element is not part of any section
        let interp_ids = match self.sections.last() {
            Some(section) => section.interps.clone(),
            None => return Ok(()),
        };
        for id in interp_ids {
            match self.route(id, false) {
                Route::Deliver => {
                    let event = if whitespace {
                        XmlEvent::Whitespace {
                            value: value.to_string(),
                            location: location.clone(),
                        }
                    } else {
                        XmlEvent::Text {
                            value: value.to_string(),
                            location: location.clone(),
                        }
                    };
                    self.deliver(id, event, location)?;
                }
                _ => {}
            }
        }
        Ok(())
    }

    /// Open a section for a namespace, creating or reusing interpretations
    fn start_section(&mut self, namespace: &str, location: &SourceLocation) -> Result<()> {
        let rules = self.rules;
        let mut interps = Vec::new();

        match self.sections.last() {
            None => {
                let mode = rules.start_mode();
                let action_ids = rules.element_rule(mode, namespace)?.actions.clone();
                for action in action_ids {
                    interps.push(self.create_interp(mode, action, None, location)?);
                }
            }
            Some(parent) => {
                let parent_interps = parent.interps.clone();
                let ancestors = parent.ancestors.clone();
                for parent_id in parent_interps {
                    let parent_action = self.interps[parent_id].action;
                    let mode = rules.action(parent_action).mode_for(&ancestors);
                    let action_ids = rules.element_rule(mode, namespace)?.actions.clone();
                    for action in action_ids {
                        let id = match self.find_reusable(parent_id, mode, action) {
                            Some(existing) => existing,
                            None => self.create_interp(mode, action, Some(parent_id), location)?,
                        };
                        if !interps.contains(&id) {
                            interps.push(id);
                        }
                    }
                }
            }
        }

        self.sections.push(Section {
            namespace: namespace.to_string(),
            depth: 0,
            interps,
            ancestors: Vec::new(),
        });
        Ok(())
    }

    /// Walk the ancestor chain looking for an interpretation with the same
    /// mode and action; a hit means the namespace merely toggled back
    fn find_reusable(&self, from: usize, mode: ModeId, action: ActionId) -> Option<usize> {
        let mut current = Some(from);
        while let Some(id) = current {
            let interp = &self.interps[id];
            if interp.mode == mode && interp.action == action {
                return Some(id);
            }
            current = interp.parent;
        }
        None
    }

    fn create_interp(
        &mut self,
        mode: ModeId,
        action: ActionId,
        parent: Option<usize>,
        location: &SourceLocation,
    ) -> Result<usize> {
        let rules = self.rules;
        let compiled = rules.action(action);

        let kind = match &compiled.kind {
            ActionKind::Validate { generator } => {
                let validator = generator
                    .create_validator(self.config.resolver())
                    .map_err(|error| Self::wrap_error(rules, action, error, location))?;
                InterpKind::Validate {
                    filter: FilteringReader::new(),
                    validator,
                }
            }
            ActionKind::Attach => InterpKind::Attach,
            ActionKind::AttachPlaceholder => InterpKind::AttachPlaceholder,
            ActionKind::Unwrap => InterpKind::Unwrap,
        };

        if let Some(message) = compiled.message_for(self.config.locale()) {
            if let Some(callback) = &mut self.on_action_started {
                callback(message);
            }
        }

        let id = self.interps.len();
        self.interps.push(Interpretation {
            mode,
            action,
            parent,
            kind,
        });
        Ok(id)
    }

    fn route(&self, id: usize, boundary: bool) -> Route {
        match &self.interps[id].kind {
            InterpKind::AttachPlaceholder if boundary => Route::Placeholder,
            InterpKind::AttachPlaceholder => Route::Drop,
            InterpKind::Unwrap if boundary => Route::Drop,
            _ => Route::Deliver,
        }
    }

    /// Feed an event into an interpretation as content, following attach
    /// and unwrap chains up to the owning validator
    fn deliver(&mut self, id: usize, event: XmlEvent, location: &SourceLocation) -> Result<()> {
        let mut current = id;
        loop {
            let parent = self.interps[current].parent;
            match &mut self.interps[current].kind {
                InterpKind::Validate { filter, .. } => {
                    filter.push(event);
                    return self.advance(current, location);
                }
                InterpKind::Attach | InterpKind::Unwrap => match parent {
                    Some(next) => current = next,
                    // a result action at the root has nowhere to forward to
                    None => return Ok(()),
                },
                InterpKind::AttachPlaceholder => {
                    return Err(Error::Internal(
                        "forwarding content into a placeholder is not implemented".to_string(),
                    ))
                }
            }
        }
    }

    /// Drain an interpretation's pending events through its validator
    fn advance(&mut self, id: usize, location: &SourceLocation) -> Result<()> {
        let rules = self.rules;
        let action = self.interps[id].action;
        if let InterpKind::Validate { filter, validator } = &mut self.interps[id].kind {
            while filter.has_pending() {
                if let Err(error) = validator.read(filter) {
                    return Err(Self::wrap_error(rules, action, error, location));
                }
            }
        }
        Ok(())
    }

    /// The validator a placeholder lands in; `None` only at the root
    fn nearest_validate(&self, id: usize) -> Result<Option<usize>> {
        let mut current = self.interps[id].parent;
        while let Some(candidate) = current {
            match self.interps[candidate].kind {
                InterpKind::Validate { .. } => return Ok(Some(candidate)),
                InterpKind::Attach | InterpKind::Unwrap => {
                    current = self.interps[candidate].parent
                }
                InterpKind::AttachPlaceholder => {
                    return Err(Error::Internal(
                        "forwarding content into a placeholder is not implemented".to_string(),
                    ))
                }
            }
        }
        Ok(None)
    }

    /// Dispatch an element's attributes for one interpretation: unqualified
    /// attributes always travel with the element; qualified attributes are
    /// grouped per namespace and either attached or validated standalone
    /// according to the mode's attribute rules. `validated` spans the whole
    /// element, so a validate action fires once per namespace even when
    /// several interpretations share the rule.
    fn dispatch_attributes(
        &mut self,
        id: usize,
        attributes: &[XmlAttribute],
        validated: &mut HashSet<(ActionId, String)>,
        location: &SourceLocation,
    ) -> Result<Vec<XmlAttribute>> {
        let rules = self.rules;
        let mode = self.interps[id].mode;

        let mut attached: Vec<XmlAttribute> = attributes
            .iter()
            .filter(|a| a.namespace.is_empty())
            .cloned()
            .collect();

        let mut groups: IndexMap<&str, Vec<XmlAttribute>> = IndexMap::new();
        for attribute in attributes.iter().filter(|a| !a.namespace.is_empty()) {
            groups
                .entry(attribute.namespace.as_str())
                .or_default()
                .push(attribute.clone());
        }

        for (namespace, group) in groups {
            let action_ids = rules.attribute_rule(mode, namespace)?.actions.clone();
            for action in action_ids {
                match &rules.action(action).kind {
                    ActionKind::Attach => attached.extend(group.iter().cloned()),
                    ActionKind::Validate { generator } => {
                        if !validated.insert((action, namespace.to_string())) {
                            continue;
                        }
                        if !self.attribute_validators.contains_key(&action) {
                            let validator = generator
                                .create_attribute_validator(self.config.resolver())
                                .map_err(|e| Self::wrap_error(rules, action, e, location))?;
                            self.attribute_validators.insert(action, validator);
                        }
                        if let Some(Some(validator)) = self.attribute_validators.get_mut(&action)
                        {
                            if let Err(error) = validator.validate_attributes(namespace, &group) {
                                return Err(Self::wrap_error(rules, action, error, location));
                            }
                        }
                    }
                    // unwrap and attachPlaceholder are rejected for
                    // attribute rules at compile time
                    _ => {}
                }
            }
        }
        Ok(attached)
    }

    fn wrap_error(
        rules: &SimpleRules,
        action: ActionId,
        error: Error,
        location: &SourceLocation,
    ) -> Error {
        if let ActionKind::Validate { generator } = &rules.action(action).kind {
            if let Some(wrapped) = generator.handle_error(&error, Some(location)) {
                return wrapped;
            }
        }
        error
    }

    fn current_section(&mut self, local_name: &str) -> Result<&mut Section> {
        self.sections.last_mut().ok_or_else(|| {
            Error::Internal(format!(
                "element '{}' dispatched outside any section",
                local_name
            ))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::providers::{
        GeneratorLookup, Resolver, SchemaSource, ValidatorGenerator, ValidatorProvider,
    };
    use crate::readers::{DocumentReader, XmlRead};
    use crate::rules::NvdlRules;
    use pretty_assertions::assert_eq;
    use std::cell::RefCell;
    use std::rc::Rc;

    const NS: &str = crate::NVDL_NAMESPACE;

    /// Provider whose validators log every event they see
    struct RecordingProvider {
        log: Rc<RefCell<Vec<String>>>,
        validators_created: Rc<RefCell<usize>>,
    }

    struct RecordingGenerator {
        log: Rc<RefCell<Vec<String>>>,
        validators_created: Rc<RefCell<usize>>,
    }

    struct RecordingValidator {
        log: Rc<RefCell<Vec<String>>>,
    }

    impl ValidatorProvider for RecordingProvider {
        fn create_generator(
            &self,
            _source: &SchemaSource,
            schema_type: &str,
            _config: &NvdlConfig,
        ) -> Result<GeneratorLookup> {
            if schema_type == "application/x-record" {
                Ok(GeneratorLookup::Found(Box::new(RecordingGenerator {
                    log: Rc::clone(&self.log),
                    validators_created: Rc::clone(&self.validators_created),
                })))
            } else {
                Ok(GeneratorLookup::NotApplicable)
            }
        }
    }

    impl ValidatorGenerator for RecordingGenerator {
        fn create_validator(&self, _resolver: &dyn Resolver) -> Result<Box<dyn Validator>> {
            *self.validators_created.borrow_mut() += 1;
            Ok(Box::new(RecordingValidator {
                log: Rc::clone(&self.log),
            }))
        }

        fn create_attribute_validator(
            &self,
            _resolver: &dyn Resolver,
        ) -> Result<Option<Box<dyn AttributeValidator>>> {
            Ok(Some(Box::new(RecordingAttributeValidator {
                log: Rc::clone(&self.log),
            })))
        }
    }

    struct RecordingAttributeValidator {
        log: Rc<RefCell<Vec<String>>>,
    }

    impl AttributeValidator for RecordingAttributeValidator {
        fn validate_attributes(
            &mut self,
            namespace: &str,
            _attributes: &[XmlAttribute],
        ) -> Result<()> {
            self.log.borrow_mut().push(format!("attrs {}", namespace));
            Ok(())
        }
    }

    impl Validator for RecordingValidator {
        fn read(&mut self, source: &mut FilteringReader) -> Result<()> {
            while let Some(event) = source.read() {
                let entry = match &event {
                    XmlEvent::StartElement {
                        local_name,
                        attributes,
                        ..
                    } => {
                        let mut entry = format!("start {}", local_name);
                        for attribute in attributes {
                            entry.push_str(&format!(" @{}={}", attribute.local_name, attribute.value));
                        }
                        entry
                    }
                    XmlEvent::EndElement { local_name, .. } => format!("end {}", local_name),
                    XmlEvent::Text { value, .. } => format!("text {}", value),
                    XmlEvent::Whitespace { .. } => continue,
                };
                self.log.borrow_mut().push(entry);
            }
            Ok(())
        }
    }

    struct Fixture {
        log: Rc<RefCell<Vec<String>>>,
        validators_created: Rc<RefCell<usize>>,
        config: NvdlConfig,
    }

    fn fixture() -> Fixture {
        let log = Rc::new(RefCell::new(Vec::new()));
        let validators_created = Rc::new(RefCell::new(0));
        let config = NvdlConfig::new().with_provider(Box::new(RecordingProvider {
            log: Rc::clone(&log),
            validators_created: Rc::clone(&validators_created),
        }));
        Fixture {
            log,
            validators_created,
            config,
        }
    }

    fn run(rules_xml: &str, document: &str, config: &NvdlConfig) -> Result<()> {
        let raw = NvdlRules::parse(rules_xml)?;
        let simple = SimpleRules::simplify(&raw, config)?;
        let mut dispatcher = Dispatcher::new(&simple, config);
        let mut reader = DocumentReader::new(document);
        while let Some(event) = reader.next_event()? {
            dispatcher.dispatch(&event)?;
        }
        dispatcher.finish()
    }

    fn record_rules(extra: &str) -> String {
        format!(
            r#"<rules xmlns="{NS}">
                 <namespace ns="urn:x"><validate schema="x" schemaType="application/x-record"/></namespace>
                 {extra}
               </rules>"#
        )
    }

    #[test]
    fn test_validate_receives_section_events() {
        let f = fixture();
        run(
            &record_rules(""),
            r#"<r xmlns="urn:x"><c>hi</c></r>"#,
            &f.config,
        )
        .unwrap();
        assert_eq!(
            *f.log.borrow(),
            vec!["start r", "start c", "text hi", "end c", "end r"]
        );
    }

    #[test]
    fn test_attach_forwards_foreign_subtree() {
        let f = fixture();
        run(
            &record_rules(r#"<namespace ns="urn:y"><attach/></namespace>"#),
            r#"<r xmlns="urn:x"><y:e xmlns:y="urn:y">t</y:e></r>"#,
            &f.config,
        )
        .unwrap();
        assert_eq!(
            *f.log.borrow(),
            vec!["start r", "start e", "text t", "end e", "end r"]
        );
    }

    #[test]
    fn test_unwrap_drops_boundary_keeps_content() {
        let f = fixture();
        run(
            &record_rules(r#"<namespace ns="urn:y"><unwrap/></namespace>"#),
            r#"<r xmlns="urn:x"><y:w xmlns:y="urn:y">inner</y:w></r>"#,
            &f.config,
        )
        .unwrap();
        assert_eq!(*f.log.borrow(), vec!["start r", "text inner", "end r"]);
    }

    #[test]
    fn test_attach_placeholder_substitutes_stub() {
        let f = fixture();
        run(
            &record_rules(r#"<namespace ns="urn:y"><attachPlaceholder/></namespace>"#),
            r#"<r xmlns="urn:x"><y:p xmlns:y="urn:y">hidden<y:q/></y:p></r>"#,
            &f.config,
        )
        .unwrap();
        assert_eq!(
            *f.log.borrow(),
            vec![
                "start r",
                "start placeholder @ns=urn:y @localName=p",
                "end placeholder",
                "end r"
            ]
        );
    }

    #[test]
    fn test_namespace_toggle_reuses_interpretation() {
        let f = fixture();
        run(
            &record_rules(r#"<namespace ns="urn:y"><attach/></namespace>"#),
            r#"<r xmlns="urn:x"><y:a xmlns:y="urn:y"><b xmlns="urn:x"/></y:a></r>"#,
            &f.config,
        )
        .unwrap();
        // the inner urn:x section reuses the root validator
        assert_eq!(*f.validators_created.borrow(), 1);
        assert_eq!(
            *f.log.borrow(),
            vec!["start r", "start a", "start b", "end b", "end a", "end r"]
        );
    }

    #[test]
    fn test_reject_names_the_namespace() {
        let f = fixture();
        let err = run(
            &record_rules(""),
            r#"<r xmlns="urn:b"/>"#,
            &f.config,
        )
        .unwrap_err();
        assert!(err.to_string().contains("urn:b"));
    }

    #[test]
    fn test_trigger_splits_same_namespace_section() {
        let f = fixture();
        let rules = format!(
            r#"<rules xmlns="{NS}" startMode="root">
                 <trigger ns="urn:x" nameList="part"/>
                 <mode name="root">
                   <namespace ns="urn:x">
                     <validate schema="x" schemaType="application/x-record" useMode="inner"/>
                   </namespace>
                 </mode>
                 <mode name="inner">
                   <namespace ns="urn:x"><attachPlaceholder/></namespace>
                 </mode>
               </rules>"#
        );
        // without the trigger 'part' would stay in the root section; with it
        // the element starts a new section handled in mode 'inner'
        run(
            &rules,
            r#"<r xmlns="urn:x"><part>secret</part></r>"#,
            &f.config,
        )
        .unwrap();
        assert_eq!(
            *f.log.borrow(),
            vec![
                "start r",
                "start placeholder @ns=urn:x @localName=part",
                "end placeholder",
                "end r"
            ]
        );
    }

    #[test]
    fn test_content_attached_under_placeholder_is_an_internal_fault() {
        let f = fixture();
        let rules = format!(
            r#"<rules xmlns="{NS}" startMode="root">
                 <mode name="root">
                   <namespace ns="urn:x">
                     <validate schema="x" schemaType="application/x-record"/>
                   </namespace>
                   <namespace ns="urn:y"><attachPlaceholder useMode="inner"/></namespace>
                 </mode>
                 <mode name="inner">
                   <namespace ns="urn:z"><attach/></namespace>
                 </mode>
               </rules>"#
        );
        let err = run(
            &rules,
            r#"<r xmlns="urn:x"><y:p xmlns:y="urn:y"><z:e xmlns:z="urn:z"/></y:p></r>"#,
            &f.config,
        )
        .unwrap_err();
        assert!(matches!(err, Error::Internal(_)));
        assert!(err.to_string().contains("placeholder"));
    }

    #[test]
    fn test_attribute_validation_fires_once_per_namespace() {
        let f = fixture();
        // two validate interpretations share the section; the attribute
        // rule's validator must still run once per namespace
        let rules = format!(
            r#"<rules xmlns="{NS}">
                 <namespace ns="urn:x">
                   <validate schema="a" schemaType="application/x-record"/>
                   <validate schema="b" schemaType="application/x-record"/>
                 </namespace>
                 <namespace ns="urn:meta" match="attributes">
                   <validate schema="attrs" schemaType="application/x-record"/>
                 </namespace>
               </rules>"#
        );
        run(
            &rules,
            r#"<r xmlns="urn:x" xmlns:m="urn:meta" m:lang="en"/>"#,
            &f.config,
        )
        .unwrap();
        let calls = f
            .log
            .borrow()
            .iter()
            .filter(|entry| entry.as_str() == "attrs urn:meta")
            .count();
        assert_eq!(calls, 1);
    }

    #[test]
    fn test_attached_attributes_travel_with_element() {
        let f = fixture();
        run(
            &record_rules(
                r#"<namespace ns="urn:meta" match="attributes"><attach/></namespace>"#,
            ),
            r#"<r xmlns="urn:x" xmlns:m="urn:meta" id="1" m:lang="en"/>"#,
            &f.config,
        )
        .unwrap();
        assert_eq!(
            *f.log.borrow(),
            vec!["start r @id=1 @lang=en", "end r"]
        );
    }

    #[test]
    fn test_unmatched_attributes_are_allowed_and_dropped() {
        let f = fixture();
        run(
            &record_rules(""),
            r#"<r xmlns="urn:x" xmlns:m="urn:meta" m:lang="en"/>"#,
            &f.config,
        )
        .unwrap();
        // the synthesized allow rule accepts the group without attaching it
        assert_eq!(*f.log.borrow(), vec!["start r", "end r"]);
    }

    #[test]
    fn test_action_messages_reach_the_callback() {
        let f = fixture();
        let messages = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&messages);

        let rules_xml = record_rules(
            r#"<namespace ns="urn:y"><attach message="attaching extension"/></namespace>"#,
        );
        let raw = NvdlRules::parse(&rules_xml).unwrap();
        let simple = SimpleRules::simplify(&raw, &f.config).unwrap();
        let mut dispatcher = Dispatcher::new(&simple, &f.config)
            .with_action_callback(move |message| sink.borrow_mut().push(message.to_string()));
        let mut reader =
            DocumentReader::new(r#"<r xmlns="urn:x"><y:e xmlns:y="urn:y"/></r>"#);
        while let Some(event) = reader.next_event().unwrap() {
            dispatcher.dispatch(&event).unwrap();
        }
        dispatcher.finish().unwrap();
        assert_eq!(*messages.borrow(), vec!["attaching extension"]);
    }

    #[test]
    fn test_finish_reports_unclosed_sections() {
        let f = fixture();
        let raw = NvdlRules::parse(&record_rules("")).unwrap();
        let simple = SimpleRules::simplify(&raw, &f.config).unwrap();
        let mut dispatcher = Dispatcher::new(&simple, &f.config);
        dispatcher
            .dispatch(&XmlEvent::StartElement {
                namespace: "urn:x".to_string(),
                local_name: "r".to_string(),
                attributes: Vec::new(),
                location: SourceLocation::default(),
            })
            .unwrap();
        assert!(dispatcher.finish().is_err());
    }
}
