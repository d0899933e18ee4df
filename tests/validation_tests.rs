//! End-to-end validation tests: rule documents compiled from text, instance
//! documents dispatched through a recording validator provider.

use nvdl::error::Result;
use nvdl::filters::FilteringReader;
use nvdl::providers::{
    GeneratorLookup, NvdlConfig, Resolver, SchemaSource, Validator, ValidatorGenerator,
    ValidatorProvider,
};
use nvdl::readers::{DocumentReader, XmlEvent, XmlRead};
use nvdl::rules::NvdlRules;
use nvdl::simplify::SimpleRules;
use nvdl::{validate, NvdlValidatingReader, NVDL_NAMESPACE};
use pretty_assertions::assert_eq;
use std::cell::RefCell;
use std::rc::Rc;

const RECORD_TYPE: &str = "application/x-record";

/// Provider whose validators append every event they receive to a shared
/// log, tagged with the schema href they were created for
struct RecordingProvider {
    log: Rc<RefCell<Vec<String>>>,
    validators_created: Rc<RefCell<usize>>,
}

struct RecordingGenerator {
    tag: String,
    log: Rc<RefCell<Vec<String>>>,
    validators_created: Rc<RefCell<usize>>,
}

struct RecordingValidator {
    tag: String,
    log: Rc<RefCell<Vec<String>>>,
}

impl ValidatorProvider for RecordingProvider {
    fn create_generator(
        &self,
        source: &SchemaSource,
        schema_type: &str,
        _config: &NvdlConfig,
    ) -> Result<GeneratorLookup> {
        if schema_type != RECORD_TYPE {
            return Ok(GeneratorLookup::NotApplicable);
        }
        let tag = match source {
            SchemaSource::Uri { href, .. } => href.clone(),
            SchemaSource::Inline(_) => "inline".to_string(),
            SchemaSource::Builtin(_) => return Ok(GeneratorLookup::NotApplicable),
        };
        Ok(GeneratorLookup::Found(Box::new(RecordingGenerator {
            tag,
            log: Rc::clone(&self.log),
            validators_created: Rc::clone(&self.validators_created),
        })))
    }
}

impl ValidatorGenerator for RecordingGenerator {
    fn create_validator(&self, _resolver: &dyn Resolver) -> Result<Box<dyn Validator>> {
        *self.validators_created.borrow_mut() += 1;
        Ok(Box::new(RecordingValidator {
            tag: self.tag.clone(),
            log: Rc::clone(&self.log),
        }))
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
                    let mut entry = format!("{}: start {}", self.tag, local_name);
                    for attribute in attributes {
                        entry.push_str(&format!(" @{}={}", attribute.local_name, attribute.value));
                    }
                    entry
                }
                XmlEvent::EndElement { local_name, .. } => {
                    format!("{}: end {}", self.tag, local_name)
                }
                XmlEvent::Text { value, .. } => format!("{}: text {}", self.tag, value),
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

impl Fixture {
    fn entries(&self) -> Vec<String> {
        self.log.borrow().clone()
    }
}

fn rules(body: &str) -> String {
    format!(r#"<rules xmlns="{NVDL_NAMESPACE}">{body}</rules>"#)
}

#[test]
fn test_single_namespace_document_validates() {
    let f = fixture();
    let rules = rules(&format!(
        r#"<namespace ns="urn:doc"><validate schema="doc" schemaType="{RECORD_TYPE}"/></namespace>"#
    ));
    validate(
        &rules,
        r#"<book xmlns="urn:doc"><title>Rust</title></book>"#,
        &f.config,
    )
    .unwrap();
    assert_eq!(
        f.entries(),
        vec![
            "doc: start book",
            "doc: start title",
            "doc: text Rust",
            "doc: end title",
            "doc: end book"
        ]
    );
}

#[test]
fn test_attached_extension_is_seen_by_host_validator() {
    let f = fixture();
    let rules = rules(&format!(
        r#"<namespace ns="urn:doc"><validate schema="doc" schemaType="{RECORD_TYPE}"/></namespace>
           <namespace ns="urn:ext"><attach/></namespace>"#
    ));
    validate(
        &rules,
        r#"<book xmlns="urn:doc"><e:note xmlns:e="urn:ext">extra</e:note></book>"#,
        &f.config,
    )
    .unwrap();
    assert_eq!(
        f.entries(),
        vec![
            "doc: start book",
            "doc: start note",
            "doc: text extra",
            "doc: end note",
            "doc: end book"
        ]
    );
}

#[test]
fn test_foreign_sections_validate_independently() {
    let f = fixture();
    let rules = rules(&format!(
        r#"<namespace ns="urn:doc"><validate schema="doc" schemaType="{RECORD_TYPE}"/></namespace>
           <namespace ns="urn:ext">
             <validate schema="ext" schemaType="{RECORD_TYPE}"/>
             <unwrap/>
           </namespace>"#
    ));
    validate(
        &rules,
        r#"<book xmlns="urn:doc"><e:note xmlns:e="urn:ext">x</e:note></book>"#,
        &f.config,
    )
    .unwrap();
    // the ext validator sees the whole subtree; the host validator sees the
    // unwrapped content only
    assert_eq!(
        f.entries(),
        vec![
            "doc: start book",
            "ext: start note",
            "ext: text x",
            "doc: text x",
            "ext: end note",
            "doc: end book"
        ]
    );
}

#[test]
fn test_placeholder_replaces_hidden_subtree() {
    let f = fixture();
    let rules = rules(&format!(
        r#"<namespace ns="urn:doc"><validate schema="doc" schemaType="{RECORD_TYPE}"/></namespace>
           <namespace ns="urn:secret"><attachPlaceholder/></namespace>"#
    ));
    validate(
        &rules,
        r#"<book xmlns="urn:doc"><s:key xmlns:s="urn:secret">classified</s:key></book>"#,
        &f.config,
    )
    .unwrap();
    assert_eq!(
        f.entries(),
        vec![
            "doc: start book",
            "doc: start placeholder @ns=urn:secret @localName=key",
            "doc: end placeholder",
            "doc: end book"
        ]
    );
}

#[test]
fn test_namespace_toggle_feeds_one_validator() {
    let f = fixture();
    let rules = rules(&format!(
        r#"<namespace ns="urn:doc"><validate schema="doc" schemaType="{RECORD_TYPE}"/></namespace>
           <namespace ns="urn:ext"><attach/></namespace>"#
    ));
    validate(
        &rules,
        r#"<book xmlns="urn:doc" xmlns:e="urn:ext">
             <e:wrap><chapter xmlns="urn:doc">one</chapter></e:wrap>
           </book>"#,
        &f.config,
    )
    .unwrap();
    assert_eq!(*f.validators_created.borrow(), 1);
    assert!(f.entries().contains(&"doc: start chapter".to_string()));
}

#[test]
fn test_modes_switch_handling_of_nested_sections() {
    let f = fixture();
    let rules = format!(
        r#"<rules xmlns="{NVDL_NAMESPACE}" startMode="host">
             <mode name="host">
               <namespace ns="urn:doc">
                 <validate schema="doc" schemaType="{RECORD_TYPE}" useMode="strict"/>
               </namespace>
             </mode>
             <mode name="strict">
               <namespace ns="urn:ext"><attachPlaceholder/></namespace>
             </mode>
           </rules>"#
    );
    validate(
        &rules,
        r#"<book xmlns="urn:doc"><e:note xmlns:e="urn:ext">x</e:note></book>"#,
        &f.config,
    )
    .unwrap();
    assert_eq!(
        f.entries(),
        vec![
            "doc: start book",
            "doc: start placeholder @ns=urn:ext @localName=note",
            "doc: end placeholder",
            "doc: end book"
        ]
    );
}

#[test]
fn test_context_overrides_mode_by_ancestor_path() {
    let f = fixture();
    let rules = format!(
        r#"<rules xmlns="{NVDL_NAMESPACE}" startMode="host">
             <mode name="host">
               <namespace ns="urn:doc">
                 <validate schema="doc" schemaType="{RECORD_TYPE}">
                   <context path="appendix" useMode="loose"/>
                 </validate>
               </namespace>
               <namespace ns="urn:ext"><attachPlaceholder/></namespace>
             </mode>
             <mode name="loose">
               <namespace ns="urn:ext"><attach/></namespace>
             </mode>
           </rules>"#
    );
    validate(
        &rules,
        r#"<book xmlns="urn:doc" xmlns:e="urn:ext">
             <chapter><e:note>hidden</e:note></chapter>
             <appendix><e:note>kept</e:note></appendix>
           </book>"#,
        &f.config,
    )
    .unwrap();
    let entries = f.entries();
    assert!(entries.contains(&"doc: start placeholder @ns=urn:ext @localName=note".to_string()));
    assert!(entries.contains(&"doc: text kept".to_string()));
    assert!(!entries.contains(&"doc: text hidden".to_string()));
}

#[test]
fn test_wildcard_namespace_rule_matches_family() {
    let f = fixture();
    let rules = rules(&format!(
        r#"<namespace ns="urn:doc"><validate schema="doc" schemaType="{RECORD_TYPE}"/></namespace>
           <namespace ns="http://example.com/*"><attach/></namespace>"#
    ));
    validate(
        &rules,
        r#"<book xmlns="urn:doc"><x xmlns="http://example.com/v2">w</x></book>"#,
        &f.config,
    )
    .unwrap();
    assert!(f.entries().contains(&"doc: text w".to_string()));
}

#[test]
fn test_reject_fails_with_namespace_in_message() {
    let f = fixture();
    let rules = rules(&format!(
        r#"<namespace ns="urn:doc"><validate schema="doc" schemaType="{RECORD_TYPE}"/></namespace>
           <namespace ns="urn:bad"><reject/></namespace>"#
    ));
    let err = validate(
        &rules,
        r#"<book xmlns="urn:doc"><b:x xmlns:b="urn:bad"/></book>"#,
        &f.config,
    )
    .unwrap_err();
    assert!(err.to_string().contains("urn:bad"));
}

#[test]
fn test_unknown_namespace_rejected_by_default() {
    let f = fixture();
    let rules = rules(&format!(
        r#"<namespace ns="urn:doc"><validate schema="doc" schemaType="{RECORD_TYPE}"/></namespace>"#
    ));
    let err = validate(
        &rules,
        r#"<book xmlns="urn:doc"><u:x xmlns:u="urn:unknown"/></book>"#,
        &f.config,
    )
    .unwrap_err();
    assert!(err.to_string().contains("urn:unknown"));
}

#[test]
fn test_validating_reader_streams_original_events() {
    let f = fixture();
    let rules_xml = rules(&format!(
        r#"<namespace ns="urn:doc"><validate schema="doc" schemaType="{RECORD_TYPE}"/></namespace>
           <namespace ns="urn:secret"><attachPlaceholder/></namespace>"#
    ));
    let raw = NvdlRules::parse(&rules_xml).unwrap();
    let simple = SimpleRules::simplify(&raw, &f.config).unwrap();

    let reader =
        DocumentReader::new(r#"<book xmlns="urn:doc"><s:k xmlns:s="urn:secret"/></book>"#);
    let mut validating = NvdlValidatingReader::new(reader, &simple, &f.config);

    // the caller still sees the document as written, placeholder or not
    let mut names = Vec::new();
    while let Some(event) = validating.read().unwrap() {
        if let XmlEvent::StartElement { local_name, .. } = event {
            names.push(local_name);
        }
    }
    assert_eq!(names, vec!["book", "k"]);
}

#[test]
fn test_reader_wrapping_works_with_any_event_source() {
    struct TwoEvents {
        events: Vec<XmlEvent>,
    }
    impl XmlRead for TwoEvents {
        fn next_event(&mut self) -> Result<Option<XmlEvent>> {
            if self.events.is_empty() {
                Ok(None)
            } else {
                Ok(Some(self.events.remove(0)))
            }
        }
    }

    let f = fixture();
    let rules_xml = rules(&format!(
        r#"<namespace ns="urn:doc"><validate schema="doc" schemaType="{RECORD_TYPE}"/></namespace>"#
    ));
    let raw = NvdlRules::parse(&rules_xml).unwrap();
    let simple = SimpleRules::simplify(&raw, &f.config).unwrap();

    let source = TwoEvents {
        events: vec![
            XmlEvent::StartElement {
                namespace: "urn:doc".to_string(),
                local_name: "r".to_string(),
                attributes: Vec::new(),
                location: Default::default(),
            },
            XmlEvent::EndElement {
                namespace: "urn:doc".to_string(),
                local_name: "r".to_string(),
                location: Default::default(),
            },
        ],
    };
    NvdlValidatingReader::new(source, &simple, &f.config)
        .validate_all()
        .unwrap();
    assert_eq!(f.entries(), vec!["doc: start r", "doc: end r"]);
}
