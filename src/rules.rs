//! Raw NVDL rule document model
//!
//! This module parses a `<rules>` document into an immutable object tree.
//! Nothing here is resolved or checked beyond document shape; the
//! simplification pass in [`crate::simplify`] turns this tree into the
//! flattened, collision-checked rule set the dispatcher runs on.

use crate::error::{CompileError, Error, Result};
use crate::locations::SourceLocation;
use crate::NVDL_NAMESPACE;
use lazy_static::lazy_static;
use roxmltree::{Document, Node};
use std::collections::HashSet;

lazy_static! {
    /// Element names defined by the NVDL structure namespace
    static ref NVDL_ELEMENTS: HashSet<&'static str> = [
        "rules",
        "mode",
        "includedMode",
        "namespace",
        "anyNamespace",
        "validate",
        "allow",
        "reject",
        "attach",
        "attachPlaceholder",
        "unwrap",
        "cancelNestedActions",
        "message",
        "option",
        "context",
        "trigger",
        "schema",
    ]
    .into_iter()
    .collect();
}

/// A parsed `<rules>` document
#[derive(Debug, Clone)]
pub struct NvdlRules {
    /// `startMode` attribute, required when modes are declared
    pub start_mode: Option<String>,
    /// `schemaType` attribute inherited by `validate` actions
    pub schema_type: Option<String>,
    /// Declared named modes
    pub modes: Vec<NvdlMode>,
    /// Bare rules, used instead of modes
    pub rules: Vec<NvdlRule>,
    /// Declared triggers
    pub triggers: Vec<NvdlTrigger>,
    /// Position of the `rules` element
    pub location: SourceLocation,
}

/// A named `<mode>` declaration
#[derive(Debug, Clone)]
pub struct NvdlMode {
    /// The `name` attribute
    pub name: String,
    /// Rules and included modes
    pub body: NvdlModeBody,
    /// Position of the `mode` element
    pub location: SourceLocation,
}

/// The content shared by named, included, and anonymous nested modes
#[derive(Debug, Clone, Default)]
pub struct NvdlModeBody {
    /// Rules declared directly in this mode layer
    pub rules: Vec<NvdlRule>,
    /// `includedMode` layers, consumed transitively during simplification
    pub included_modes: Vec<NvdlModeBody>,
    /// Position of the containing element
    pub location: SourceLocation,
}

/// Which instance nodes a rule matches
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchTarget {
    /// Elements only (the default)
    Elements,
    /// Attributes only
    Attributes,
    /// Elements and attributes, as two independent rules
    Both,
}

impl MatchTarget {
    fn from_attr(value: Option<&str>, location: &SourceLocation) -> Result<Self> {
        match value {
            None | Some("elements") => Ok(MatchTarget::Elements),
            Some("attributes") => Ok(MatchTarget::Attributes),
            Some("both") => Ok(MatchTarget::Both),
            Some(other) => Err(CompileError::new(format!(
                "invalid match value '{}': must be 'elements', 'attributes' or 'both'",
                other
            ))
            .with_location(location.clone())
            .into()),
        }
    }
}

/// A `<namespace>` or `<anyNamespace>` rule
#[derive(Debug, Clone)]
pub struct NvdlRule {
    /// True for `anyNamespace` rules
    pub any_namespace: bool,
    /// The `ns` pattern (empty for `anyNamespace`)
    pub ns: String,
    /// The raw `wildCard` attribute; absent means the default `*`
    pub wildcard: Option<String>,
    /// The `match` target
    pub match_target: MatchTarget,
    /// Actions in document order
    pub actions: Vec<NvdlAction>,
    /// Position of the rule element
    pub location: SourceLocation,
}

/// One action inside a rule
#[derive(Debug, Clone)]
pub enum NvdlAction {
    /// `<validate>`: run an external schema validator
    Validate(NvdlValidate),
    /// `<allow>`: accept the matched content
    Allow(NvdlActionBody),
    /// `<reject>`: refuse the matched content
    Reject(NvdlActionBody),
    /// `<attach>`: keep content in the parent validator, recurse in a mode
    Attach(NvdlActionBody),
    /// `<attachPlaceholder>`: replace content with a placeholder stub
    AttachPlaceholder(NvdlActionBody),
    /// `<unwrap>`: drop the wrapping element, keep descendants
    Unwrap(NvdlActionBody),
    /// `<cancelNestedActions>`: suppress this rule during include consumption
    Cancel(SourceLocation),
}

/// Fields common to every action except `cancelNestedActions`
#[derive(Debug, Clone, Default)]
pub struct NvdlActionBody {
    /// Human-readable messages, keyed by language in document order
    pub messages: Vec<NvdlMessage>,
    /// Mode selection for nested sections
    pub mode_usage: NvdlModeUsage,
    /// Position of the action element
    pub location: SourceLocation,
}

/// A `<validate>` action
#[derive(Debug, Clone)]
pub struct NvdlValidate {
    /// Explicit `schemaType` attribute
    pub schema_type: Option<String>,
    /// External schema reference (`schema` attribute)
    pub schema_uri: Option<String>,
    /// Inline `<schema>` content
    pub inline_schema: Option<String>,
    /// `<option>` children in document order
    pub options: Vec<NvdlOption>,
    /// Shared action fields
    pub body: NvdlActionBody,
}

/// Mode selection carried by an action: `useMode`, a nested anonymous mode,
/// or neither (stay in the current mode), plus per-path context overrides
#[derive(Debug, Clone, Default)]
pub struct NvdlModeUsage {
    /// The `useMode` attribute
    pub use_mode: Option<String>,
    /// A nested anonymous `<mode>` child
    pub nested_mode: Option<NvdlModeBody>,
    /// `<context>` overrides in document order
    pub contexts: Vec<NvdlContext>,
}

/// A `<context>` path-to-mode override
#[derive(Debug, Clone)]
pub struct NvdlContext {
    /// The `path` attribute (`/`-separated local names, `|` alternatives)
    pub path: String,
    /// The `useMode` attribute
    pub use_mode: Option<String>,
    /// A nested anonymous `<mode>` child
    pub nested_mode: Option<NvdlModeBody>,
    /// Position of the `context` element
    pub location: SourceLocation,
}

/// A `<message>` child or `message` attribute
#[derive(Debug, Clone)]
pub struct NvdlMessage {
    /// `xml:lang` of the message, when given
    pub lang: Option<String>,
    /// Message text
    pub text: String,
}

/// A validator `<option>` tuning knob
#[derive(Debug, Clone)]
pub struct NvdlOption {
    /// Option name
    pub name: String,
    /// Optional argument
    pub arg: Option<String>,
    /// Whether an unsupported option is a compile error
    pub must_support: bool,
    /// Position of the `option` element
    pub location: SourceLocation,
}

/// A `<trigger>` declaration: element names that force a new section even
/// without a namespace change
#[derive(Debug, Clone)]
pub struct NvdlTrigger {
    /// Namespace the trigger applies to
    pub ns: String,
    /// Local names from the `nameList` attribute
    pub names: Vec<String>,
    /// Position of the `trigger` element
    pub location: SourceLocation,
}

impl NvdlRules {
    /// Parse a rule document from a string
    pub fn parse(text: &str) -> Result<Self> {
        Self::parse_with_uri(text, None)
    }

    /// Parse a rule document, recording `uri` in node locations
    pub fn parse_with_uri(text: &str, uri: Option<&str>) -> Result<Self> {
        let doc = Document::parse(text)
            .map_err(|e| Error::Xml(format!("failed to parse rule document: {}", e)))?;
        let parser = RulesParser { uri };
        parser.parse_rules(&doc, doc.root_element())
    }
}

struct RulesParser<'u> {
    uri: Option<&'u str>,
}

impl RulesParser<'_> {
    fn location(&self, doc: &Document, node: Node) -> SourceLocation {
        let pos = doc.text_pos_at(node.range().start);
        let mut loc = SourceLocation::new(pos.row as u64, pos.col as u64);
        if let Some(uri) = self.uri {
            loc = loc.with_uri(uri);
        }
        loc
    }

    fn check_nvdl_element(&self, doc: &Document, node: Node) -> Result<()> {
        let tag = node.tag_name();
        if tag.namespace() != Some(NVDL_NAMESPACE) {
            return Err(CompileError::new(format!(
                "element '{}' is not in the NVDL namespace",
                tag.name()
            ))
            .with_location(self.location(doc, node))
            .into());
        }
        if !NVDL_ELEMENTS.contains(tag.name()) {
            return Err(CompileError::new(format!(
                "unknown NVDL element '{}'",
                tag.name()
            ))
            .with_location(self.location(doc, node))
            .into());
        }
        Ok(())
    }

    fn parse_rules(&self, doc: &Document, root: Node) -> Result<NvdlRules> {
        self.check_nvdl_element(doc, root)?;
        let location = self.location(doc, root);
        if root.tag_name().name() != "rules" {
            return Err(CompileError::new(format!(
                "expected a 'rules' document element, found '{}'",
                root.tag_name().name()
            ))
            .with_location(location)
            .into());
        }

        let mut rules = NvdlRules {
            start_mode: root.attribute("startMode").map(String::from),
            schema_type: root.attribute("schemaType").map(String::from),
            modes: Vec::new(),
            rules: Vec::new(),
            triggers: Vec::new(),
            location,
        };

        for child in root.children().filter(Node::is_element) {
            self.check_nvdl_element(doc, child)?;
            match child.tag_name().name() {
                "mode" => rules.modes.push(self.parse_mode(doc, child)?),
                "namespace" | "anyNamespace" => {
                    rules.rules.push(self.parse_rule(doc, child)?)
                }
                "trigger" => rules.triggers.push(self.parse_trigger(doc, child)?),
                other => {
                    return Err(CompileError::new(format!(
                        "element '{}' is not allowed inside 'rules'",
                        other
                    ))
                    .with_location(self.location(doc, child))
                    .into())
                }
            }
        }

        Ok(rules)
    }

    fn parse_mode(&self, doc: &Document, node: Node) -> Result<NvdlMode> {
        let location = self.location(doc, node);
        let name = node
            .attribute("name")
            .ok_or_else(|| {
                CompileError::new("mode requires a 'name' attribute")
                    .with_location(location.clone())
            })?
            .to_string();
        Ok(NvdlMode {
            name,
            body: self.parse_mode_body(doc, node)?,
            location,
        })
    }

    fn parse_mode_body(&self, doc: &Document, node: Node) -> Result<NvdlModeBody> {
        let mut body = NvdlModeBody {
            rules: Vec::new(),
            included_modes: Vec::new(),
            location: self.location(doc, node),
        };
        for child in node.children().filter(Node::is_element) {
            self.check_nvdl_element(doc, child)?;
            match child.tag_name().name() {
                "namespace" | "anyNamespace" => body.rules.push(self.parse_rule(doc, child)?),
                "includedMode" => body.included_modes.push(self.parse_mode_body(doc, child)?),
                other => {
                    return Err(CompileError::new(format!(
                        "element '{}' is not allowed inside a mode",
                        other
                    ))
                    .with_location(self.location(doc, child))
                    .into())
                }
            }
        }
        Ok(body)
    }

    fn parse_rule(&self, doc: &Document, node: Node) -> Result<NvdlRule> {
        let location = self.location(doc, node);
        let any_namespace = node.tag_name().name() == "anyNamespace";
        let ns = if any_namespace {
            String::new()
        } else {
            node.attribute("ns")
                .ok_or_else(|| {
                    CompileError::new("namespace rule requires an 'ns' attribute")
                        .with_location(location.clone())
                })?
                .to_string()
        };

        let mut actions = Vec::new();
        for child in node.children().filter(Node::is_element) {
            self.check_nvdl_element(doc, child)?;
            actions.push(self.parse_action(doc, child)?);
        }

        Ok(NvdlRule {
            any_namespace,
            ns,
            wildcard: node.attribute("wildCard").map(String::from),
            match_target: MatchTarget::from_attr(node.attribute("match"), &location)?,
            actions,
            location,
        })
    }

    fn parse_action(&self, doc: &Document, node: Node) -> Result<NvdlAction> {
        let location = self.location(doc, node);
        match node.tag_name().name() {
            "validate" => Ok(NvdlAction::Validate(self.parse_validate(doc, node)?)),
            "allow" => Ok(NvdlAction::Allow(self.parse_action_body(doc, node)?)),
            "reject" => Ok(NvdlAction::Reject(self.parse_action_body(doc, node)?)),
            "attach" => Ok(NvdlAction::Attach(self.parse_action_body(doc, node)?)),
            "attachPlaceholder" => Ok(NvdlAction::AttachPlaceholder(
                self.parse_action_body(doc, node)?,
            )),
            "unwrap" => Ok(NvdlAction::Unwrap(self.parse_action_body(doc, node)?)),
            "cancelNestedActions" => Ok(NvdlAction::Cancel(location)),
            other => Err(CompileError::new(format!(
                "element '{}' is not an NVDL action",
                other
            ))
            .with_location(location)
            .into()),
        }
    }

    fn parse_action_body(&self, doc: &Document, node: Node) -> Result<NvdlActionBody> {
        let location = self.location(doc, node);
        let mut body = NvdlActionBody {
            messages: Vec::new(),
            mode_usage: NvdlModeUsage {
                use_mode: node.attribute("useMode").map(String::from),
                nested_mode: None,
                contexts: Vec::new(),
            },
            location,
        };

        if let Some(text) = node.attribute("message") {
            body.messages.push(NvdlMessage {
                lang: None,
                text: text.to_string(),
            });
        }

        for child in node.children().filter(Node::is_element) {
            self.check_nvdl_element(doc, child)?;
            match child.tag_name().name() {
                "message" => body.messages.push(self.parse_message(child)),
                "context" => body
                    .mode_usage
                    .contexts
                    .push(self.parse_context(doc, child)?),
                "mode" => {
                    if body.mode_usage.nested_mode.is_some() {
                        return Err(CompileError::new(
                            "an action may carry at most one nested mode",
                        )
                        .with_location(self.location(doc, child))
                        .into());
                    }
                    body.mode_usage.nested_mode = Some(self.parse_mode_body(doc, child)?);
                }
                // schema and option children are consumed by parse_validate
                "schema" | "option" => {}
                other => {
                    return Err(CompileError::new(format!(
                        "element '{}' is not allowed inside an action",
                        other
                    ))
                    .with_location(self.location(doc, child))
                    .into())
                }
            }
        }

        if body.mode_usage.use_mode.is_some() && body.mode_usage.nested_mode.is_some() {
            return Err(CompileError::new(
                "an action cannot carry both 'useMode' and a nested mode",
            )
            .with_location(body.location)
            .into());
        }

        Ok(body)
    }

    fn parse_validate(&self, doc: &Document, node: Node) -> Result<NvdlValidate> {
        let body = self.parse_action_body(doc, node)?;
        let mut options = Vec::new();
        let mut inline_schema = None;

        for child in node.children().filter(Node::is_element) {
            match child.tag_name().name() {
                "option" => options.push(self.parse_option(doc, child)?),
                "schema" => {
                    inline_schema = Some(self.inline_schema_text(doc, child));
                }
                _ => {}
            }
        }

        Ok(NvdlValidate {
            schema_type: node.attribute("schemaType").map(String::from),
            schema_uri: node.attribute("schema").map(String::from),
            inline_schema,
            options,
            body,
        })
    }

    /// Capture inline schema content: the raw markup of a single element
    /// child, or the text content for textual schema languages
    fn inline_schema_text(&self, doc: &Document, schema: Node) -> String {
        if let Some(element) = schema.children().find(Node::is_element) {
            doc.input_text()[element.range()].to_string()
        } else {
            schema.text().unwrap_or("").trim().to_string()
        }
    }

    fn parse_context(&self, doc: &Document, node: Node) -> Result<NvdlContext> {
        let location = self.location(doc, node);
        let path = node
            .attribute("path")
            .ok_or_else(|| {
                CompileError::new("context requires a 'path' attribute")
                    .with_location(location.clone())
            })?
            .to_string();

        let mut nested_mode = None;
        for child in node.children().filter(Node::is_element) {
            self.check_nvdl_element(doc, child)?;
            if child.tag_name().name() == "mode" {
                nested_mode = Some(self.parse_mode_body(doc, child)?);
            }
        }

        Ok(NvdlContext {
            path,
            use_mode: node.attribute("useMode").map(String::from),
            nested_mode,
            location,
        })
    }

    fn parse_message(&self, node: Node) -> NvdlMessage {
        NvdlMessage {
            lang: node
                .attribute(("http://www.w3.org/XML/1998/namespace", "lang"))
                .map(String::from),
            text: node.text().unwrap_or("").trim().to_string(),
        }
    }

    fn parse_option(&self, doc: &Document, node: Node) -> Result<NvdlOption> {
        let location = self.location(doc, node);
        let name = node
            .attribute("name")
            .ok_or_else(|| {
                CompileError::new("option requires a 'name' attribute")
                    .with_location(location.clone())
            })?
            .to_string();
        Ok(NvdlOption {
            name,
            arg: node.attribute("arg").map(String::from),
            must_support: matches!(node.attribute("mustSupport"), Some("true") | Some("1")),
            location,
        })
    }

    fn parse_trigger(&self, doc: &Document, node: Node) -> Result<NvdlTrigger> {
        let location = self.location(doc, node);
        let ns = node
            .attribute("ns")
            .ok_or_else(|| {
                CompileError::new("trigger requires an 'ns' attribute")
                    .with_location(location.clone())
            })?
            .to_string();
        let names = node
            .attribute("nameList")
            .ok_or_else(|| {
                CompileError::new("trigger requires a 'nameList' attribute")
                    .with_location(location.clone())
            })?
            .split_whitespace()
            .map(String::from)
            .collect();
        Ok(NvdlTrigger {
            ns,
            names,
            location,
        })
    }
}
