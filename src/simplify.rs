//! Rule simplification
//!
//! Turns a raw [`NvdlRules`] tree into the flattened [`SimpleRules`] the
//! dispatcher runs on. Simplification happens in three strictly ordered
//! phases:
//!
//! 1. normalize modes and rules, compiling actions and resolving every
//!    `validate` action's generator eagerly through the provider registry;
//! 2. consume `includedMode` layers, detect rule collisions, and synthesize
//!    the per-mode catch-all rules (reject unmatched elements, allow
//!    unmatched attributes);
//! 3. resolve named mode references into direct mode handles.
//!
//! Modes and actions live in arenas indexed by [`ModeId`] and [`ActionId`];
//! the result is immutable and may drive any number of dispatchers.

use crate::error::{CompileError, Error, Result};
use crate::locations::SourceLocation;
use crate::providers::{BuiltinSchema, NvdlConfig, SchemaSource, ValidatorGenerator, DEFAULT_SCHEMA_TYPE};
use crate::rules::{
    MatchTarget, NvdlAction, NvdlActionBody, NvdlModeBody, NvdlModeUsage, NvdlRule, NvdlRules,
};
use crate::wildcards::ns_matches;
use indexmap::IndexMap;
use std::collections::HashSet;
use std::fmt;

/// Name given to the implicit mode synthesized from bare top-level rules
const IMPLICIT_MODE_NAME: &str = "(startMode)";

/// Handle of a compiled mode in the [`SimpleRules`] arena
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ModeId(pub(crate) usize);

/// Handle of a compiled action in the [`SimpleRules`] arena
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ActionId(pub(crate) usize);

/// A section-splitting trigger: element names that start a new section even
/// inside an unchanged namespace
#[derive(Debug, Clone)]
pub struct Trigger {
    /// Namespace the trigger applies to
    pub namespace: String,
    /// Triggering element local names
    pub names: Vec<String>,
}

impl Trigger {
    /// Check whether an element starts a new section
    pub fn fires(&self, namespace: &str, local_name: &str) -> bool {
        self.namespace == namespace && self.names.iter().any(|n| n == local_name)
    }
}

/// The compiled, immutable rule set
#[derive(Debug)]
pub struct SimpleRules {
    modes: Vec<SimpleMode>,
    actions: Vec<SimpleAction>,
    start_mode: ModeId,
    triggers: Vec<Trigger>,
}

/// One compiled mode: ordered element and attribute rules, each list ending
/// with exactly one any-namespace catch-all after simplification
#[derive(Debug)]
pub struct SimpleMode {
    name: String,
    element_rules: Vec<SimpleRule>,
    attribute_rules: Vec<SimpleRule>,
}

impl SimpleMode {
    /// Mode name (empty for anonymous nested modes)
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Element rules in precedence order
    pub fn element_rules(&self) -> &[SimpleRule] {
        &self.element_rules
    }

    /// Attribute rules in precedence order
    pub fn attribute_rules(&self) -> &[SimpleRule] {
        &self.attribute_rules
    }
}

/// One compiled namespace rule
#[derive(Debug, Clone)]
pub struct SimpleRule {
    /// True for attribute-target rules
    pub match_attributes: bool,
    /// True for any-namespace rules
    pub is_any: bool,
    /// Namespace pattern (empty for any-namespace rules)
    pub namespace: String,
    /// The single wildcard character, when one is in effect
    pub wildcard: Option<char>,
    /// Actions in document order
    pub actions: Vec<ActionId>,
    /// Position of the source rule
    pub location: SourceLocation,
    // phase-2 working flag set by cancelNestedActions
    cancelled: bool,
}

impl SimpleRule {
    /// Check whether this rule matches a concrete namespace URI
    pub fn covers(&self, namespace: &str) -> bool {
        self.is_any || ns_matches(&self.namespace, self.wildcard, namespace, None)
    }

    fn signature(&self) -> (bool, bool, String, Option<char>) {
        (
            self.match_attributes,
            self.is_any,
            self.namespace.clone(),
            self.wildcard,
        )
    }
}

/// What a compiled action does when its rule matches
pub enum ActionKind {
    /// Drive an external validator over the section's content
    Validate {
        /// Generator resolved eagerly at compile time
        generator: Box<dyn ValidatorGenerator>,
    },
    /// Forward the section's content into the parent validator
    Attach,
    /// Replace the section's content with a placeholder stub
    AttachPlaceholder,
    /// Drop the section's boundary element, keep its descendants
    Unwrap,
}

impl ActionKind {
    /// Action name for diagnostics
    pub fn name(&self) -> &'static str {
        match self {
            ActionKind::Validate { .. } => "validate",
            ActionKind::Attach => "attach",
            ActionKind::AttachPlaceholder => "attachPlaceholder",
            ActionKind::Unwrap => "unwrap",
        }
    }
}

impl fmt::Debug for ActionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// One compiled action
#[derive(Debug)]
pub struct SimpleAction {
    /// The action variant
    pub kind: ActionKind,
    /// Messages keyed by locale (empty key for the default locale)
    pub messages: IndexMap<String, String>,
    /// Mode in effect for nested sections when no context matches
    pub default_mode: ModeId,
    /// Path-context overrides in document order
    pub contexts: Vec<SimpleContext>,
    /// Position of the source action
    pub location: SourceLocation,
}

impl SimpleAction {
    /// Select the mode for a nested section given the enclosing section's
    /// ancestor element names
    pub fn mode_for(&self, ancestors: &[String]) -> ModeId {
        self.contexts
            .iter()
            .find(|c| c.matches(ancestors))
            .map(|c| c.mode)
            .unwrap_or(self.default_mode)
    }

    /// Resolve the message for a locale, falling back to the default key
    pub fn message_for(&self, locale: Option<&str>) -> Option<&str> {
        locale
            .and_then(|l| self.messages.get(l))
            .or_else(|| self.messages.get(""))
            .map(String::as_str)
    }
}

/// A compiled context path override
#[derive(Debug, Clone)]
pub struct SimpleContext {
    /// Path alternatives, each a sequence of element local names
    pub alternatives: Vec<Vec<String>>,
    /// Mode selected when a path matches
    pub mode: ModeId,
}

impl SimpleContext {
    /// Check a path against a stack of open element local names
    pub fn matches(&self, ancestors: &[String]) -> bool {
        self.alternatives.iter().any(|steps| {
            steps.len() <= ancestors.len() && ancestors[ancestors.len() - steps.len()..] == steps[..]
        })
    }
}

impl SimpleRules {
    /// Compile a rule document against a configuration
    pub fn simplify(rules: &NvdlRules, config: &NvdlConfig) -> Result<Self> {
        let mut ctx = CompileContext {
            config,
            base_uri: rules.location.uri.clone(),
            inherited_schema_type: rules.schema_type.clone(),
            mode_names: IndexMap::new(),
            modes: Vec::new(),
            actions: Vec::new(),
            pending: Vec::new(),
        };

        // phase 1: normalize modes and compile rules eagerly
        let start_mode = ctx.normalize(rules)?;

        // phase 2: consume includes, check collisions, synthesize catch-alls
        for index in 0..ctx.modes.len() {
            ctx.consume_mode(ModeId(index))?;
        }

        // phase 3: resolve named mode references
        ctx.resolve_modes()?;

        Ok(SimpleRules {
            modes: ctx
                .modes
                .into_iter()
                .map(|work| SimpleMode {
                    name: work.name,
                    element_rules: work.element_rules,
                    attribute_rules: work.attribute_rules,
                })
                .collect(),
            actions: ctx.actions,
            start_mode,
            triggers: rules
                .triggers
                .iter()
                .map(|t| Trigger {
                    namespace: t.ns.clone(),
                    names: t.names.clone(),
                })
                .collect(),
        })
    }

    /// The mode the document root is dispatched in
    pub fn start_mode(&self) -> ModeId {
        self.start_mode
    }

    /// Look up a compiled mode
    pub fn mode(&self, id: ModeId) -> &SimpleMode {
        &self.modes[id.0]
    }

    /// Look up a compiled action
    pub fn action(&self, id: ActionId) -> &SimpleAction {
        &self.actions[id.0]
    }

    /// Declared triggers
    pub fn triggers(&self) -> &[Trigger] {
        &self.triggers
    }

    /// Find the element rule for a namespace: an exact (non-any) match wins
    /// over the any-namespace catch-all. Simplification guarantees a match;
    /// none is an engine invariant violation.
    pub fn element_rule(&self, mode: ModeId, namespace: &str) -> Result<&SimpleRule> {
        Self::rule_for(self.mode(mode).element_rules(), namespace).ok_or_else(|| {
            Error::Internal(format!(
                "no element rule matches namespace '{}' in mode '{}'",
                namespace,
                self.mode(mode).name()
            ))
        })
    }

    /// Find the attribute rule for a namespace, like [`Self::element_rule`]
    pub fn attribute_rule(&self, mode: ModeId, namespace: &str) -> Result<&SimpleRule> {
        Self::rule_for(self.mode(mode).attribute_rules(), namespace).ok_or_else(|| {
            Error::Internal(format!(
                "no attribute rule matches namespace '{}' in mode '{}'",
                namespace,
                self.mode(mode).name()
            ))
        })
    }

    fn rule_for<'a>(rules: &'a [SimpleRule], namespace: &str) -> Option<&'a SimpleRule> {
        rules
            .iter()
            .find(|r| !r.is_any && r.covers(namespace))
            .or_else(|| rules.iter().find(|r| r.is_any))
    }
}

/// Deferred mode reference, resolved in phase 3
enum ModeRef {
    /// The mode the owning rule lives in
    Current,
    /// A `useMode` name
    Named(String, SourceLocation),
    /// An anonymous nested mode compiled during phase 1
    Compiled(ModeId),
}

/// One action's unresolved mode usage
struct PendingUsage {
    action: ActionId,
    owner: ModeId,
    default_mode: ModeRef,
    contexts: Vec<ModeRef>,
}

/// A mode being compiled: include layers ordered nearest-first
struct WorkMode {
    name: String,
    layers: Vec<Vec<SimpleRule>>,
    element_rules: Vec<SimpleRule>,
    attribute_rules: Vec<SimpleRule>,
}

/// Shared compile-time lookup tables; write-once-per-key, read-only after
/// simplification completes
struct CompileContext<'c> {
    config: &'c NvdlConfig,
    base_uri: Option<String>,
    inherited_schema_type: Option<String>,
    mode_names: IndexMap<String, ModeId>,
    modes: Vec<WorkMode>,
    actions: Vec<SimpleAction>,
    pending: Vec<PendingUsage>,
}

impl CompileContext<'_> {
    fn normalize(&mut self, rules: &NvdlRules) -> Result<ModeId> {
        if !rules.modes.is_empty() {
            if !rules.rules.is_empty() {
                return Err(CompileError::new(
                    "a rule document cannot declare both modes and bare rules",
                )
                .with_location(rules.location.clone())
                .into());
            }
            let start_name = rules.start_mode.as_deref().ok_or_else(|| {
                CompileError::new("'startMode' is required when modes are declared")
                    .with_location(rules.location.clone())
            })?;

            for mode in &rules.modes {
                if self.mode_names.contains_key(&mode.name) {
                    return Err(CompileError::new(format!(
                        "mode '{}' is declared twice",
                        mode.name
                    ))
                    .with_location(mode.location.clone())
                    .into());
                }
                let id = self.reserve_mode(&mode.name);
                self.mode_names.insert(mode.name.clone(), id);
            }
            for mode in &rules.modes {
                let id = self.mode_names[&mode.name];
                self.compile_mode_body(id, &mode.body)?;
            }

            self.mode_names.get(start_name).copied().ok_or_else(|| {
                CompileError::new(format!("start mode '{}' is not defined", start_name))
                    .with_location(rules.location.clone())
                    .into()
            })
        } else {
            if rules.rules.is_empty() {
                return Err(CompileError::new("the rule document declares no rules")
                    .with_location(rules.location.clone())
                    .into());
            }
            let id = self.reserve_mode(IMPLICIT_MODE_NAME);
            self.mode_names.insert(IMPLICIT_MODE_NAME.to_string(), id);
            let body = NvdlModeBody {
                rules: rules.rules.clone(),
                included_modes: Vec::new(),
                location: rules.location.clone(),
            };
            self.compile_mode_body(id, &body)?;
            Ok(id)
        }
    }

    fn reserve_mode(&mut self, name: &str) -> ModeId {
        let id = ModeId(self.modes.len());
        self.modes.push(WorkMode {
            name: name.to_string(),
            layers: Vec::new(),
            element_rules: Vec::new(),
            attribute_rules: Vec::new(),
        });
        id
    }

    /// Compile one layer of rules, then the included layers beneath it.
    /// Layers end up ordered nearest-first, which is the shadowing order.
    fn compile_mode_body(&mut self, owner: ModeId, body: &NvdlModeBody) -> Result<()> {
        let mut layer = Vec::new();
        for raw in &body.rules {
            layer.extend(self.compile_rule(raw, owner)?);
        }
        self.modes[owner.0].layers.push(layer);

        for included in &body.included_modes {
            self.compile_mode_body(owner, included)?;
        }
        Ok(())
    }

    fn compile_rule(&mut self, raw: &NvdlRule, owner: ModeId) -> Result<Vec<SimpleRule>> {
        let wildcard = self.parse_wildcard(raw)?;

        let cancelled = raw
            .actions
            .iter()
            .any(|a| matches!(a, NvdlAction::Cancel(_)));
        if cancelled && raw.actions.len() > 1 {
            return Err(CompileError::new(
                "cancelNestedActions cannot be combined with other actions",
            )
            .with_location(raw.location.clone())
            .into());
        }

        let attribute_target =
            matches!(raw.match_target, MatchTarget::Attributes | MatchTarget::Both);
        if attribute_target {
            for action in &raw.actions {
                if matches!(
                    action,
                    NvdlAction::AttachPlaceholder(_) | NvdlAction::Unwrap(_)
                ) {
                    return Err(CompileError::new(
                        "only attach, validate, allow and reject may apply to attributes",
                    )
                    .with_location(raw.location.clone())
                    .into());
                }
            }
        }

        let mut actions = Vec::new();
        if !cancelled {
            for action in &raw.actions {
                actions.push(self.compile_action(action, owner)?);
            }
        }

        let make = |match_attributes: bool| SimpleRule {
            match_attributes,
            is_any: raw.any_namespace,
            namespace: raw.ns.clone(),
            wildcard: if raw.any_namespace { None } else { wildcard },
            actions: actions.clone(),
            location: raw.location.clone(),
            cancelled,
        };

        Ok(match raw.match_target {
            MatchTarget::Elements => vec![make(false)],
            MatchTarget::Attributes => vec![make(true)],
            // two independent rules sharing the same actions
            MatchTarget::Both => vec![make(false), make(true)],
        })
    }

    fn parse_wildcard(&self, raw: &NvdlRule) -> Result<Option<char>> {
        match raw.wildcard.as_deref() {
            None => Ok(Some('*')),
            Some("") => Ok(None),
            Some(s) => {
                let mut chars = s.chars();
                let first = chars.next();
                if chars.next().is_some() {
                    Err(CompileError::new(format!(
                        "wildCard '{}' must be at most one character",
                        s
                    ))
                    .with_location(raw.location.clone())
                    .into())
                } else {
                    Ok(first)
                }
            }
        }
    }

    fn compile_action(&mut self, raw: &NvdlAction, owner: ModeId) -> Result<ActionId> {
        let (kind, body) = match raw {
            NvdlAction::Validate(validate) => {
                let source = match (&validate.schema_uri, &validate.inline_schema) {
                    (Some(_), Some(_)) => {
                        return Err(CompileError::new(
                            "validate cannot carry both a 'schema' attribute and an inline schema",
                        )
                        .with_location(validate.body.location.clone())
                        .into())
                    }
                    (Some(href), None) => SchemaSource::Uri {
                        href: href.clone(),
                        base: self.base_uri.clone(),
                    },
                    (None, Some(inline)) => SchemaSource::Inline(inline.clone()),
                    (None, None) => {
                        return Err(CompileError::new("validate requires a schema")
                            .with_location(validate.body.location.clone())
                            .into())
                    }
                };
                let schema_type = validate
                    .schema_type
                    .as_deref()
                    .or(self.inherited_schema_type.as_deref())
                    .unwrap_or(DEFAULT_SCHEMA_TYPE);
                let generator = self.config.get_generator(
                    &source,
                    schema_type,
                    &validate.options,
                    &validate.body.location,
                )?;
                (ActionKind::Validate { generator }, &validate.body)
            }
            NvdlAction::Allow(body) => (self.builtin_action(BuiltinSchema::Allow, body)?, body),
            NvdlAction::Reject(body) => (self.builtin_action(BuiltinSchema::Reject, body)?, body),
            NvdlAction::Attach(body) => (ActionKind::Attach, body),
            NvdlAction::AttachPlaceholder(body) => (ActionKind::AttachPlaceholder, body),
            NvdlAction::Unwrap(body) => (ActionKind::Unwrap, body),
            NvdlAction::Cancel(location) => {
                return Err(Error::Internal(format!(
                    "cancelNestedActions at {} escaped rule compilation",
                    location
                )))
            }
        };

        let mut messages = IndexMap::new();
        for message in &body.messages {
            let key = message.lang.clone().unwrap_or_default();
            messages.entry(key).or_insert_with(|| message.text.clone());
        }

        let (default_mode, contexts, context_refs) =
            self.compile_mode_usage(&body.mode_usage, &body.location)?;

        let id = ActionId(self.actions.len());
        self.actions.push(SimpleAction {
            kind,
            messages,
            // placeholder until phase 3
            default_mode: ModeId(usize::MAX),
            contexts,
            location: body.location.clone(),
        });
        self.pending.push(PendingUsage {
            action: id,
            owner,
            default_mode,
            contexts: context_refs,
        });
        Ok(id)
    }

    /// Allow and reject compile to validate actions over the predefined
    /// built-in schemas
    fn builtin_action(
        &mut self,
        schema: BuiltinSchema,
        body: &NvdlActionBody,
    ) -> Result<ActionKind> {
        let generator = self.config.get_generator(
            &SchemaSource::Builtin(schema),
            DEFAULT_SCHEMA_TYPE,
            &[],
            &body.location,
        )?;
        Ok(ActionKind::Validate { generator })
    }

    fn compile_mode_usage(
        &mut self,
        usage: &NvdlModeUsage,
        location: &SourceLocation,
    ) -> Result<(ModeRef, Vec<SimpleContext>, Vec<ModeRef>)> {
        let default_mode = self.compile_mode_ref(
            usage.use_mode.as_deref(),
            usage.nested_mode.as_ref(),
            location,
        )?;

        let mut contexts = Vec::new();
        let mut context_refs = Vec::new();
        for context in &usage.contexts {
            let reference = self.compile_mode_ref(
                context.use_mode.as_deref(),
                context.nested_mode.as_ref(),
                &context.location,
            )?;
            contexts.push(SimpleContext {
                alternatives: parse_context_path(&context.path),
                mode: ModeId(usize::MAX),
            });
            context_refs.push(reference);
        }
        Ok((default_mode, contexts, context_refs))
    }

    fn compile_mode_ref(
        &mut self,
        use_mode: Option<&str>,
        nested: Option<&NvdlModeBody>,
        location: &SourceLocation,
    ) -> Result<ModeRef> {
        match (use_mode, nested) {
            (Some(name), _) => Ok(ModeRef::Named(name.to_string(), location.clone())),
            (None, Some(body)) => {
                let id = self.reserve_mode("");
                self.compile_mode_body(id, body)?;
                Ok(ModeRef::Compiled(id))
            }
            (None, None) => Ok(ModeRef::Current),
        }
    }

    /// Phase 2 for one mode: flatten include layers with signature
    /// shadowing, drop cancelled rules, check collisions, synthesize
    /// catch-alls
    fn consume_mode(&mut self, id: ModeId) -> Result<()> {
        let layers = std::mem::take(&mut self.modes[id.0].layers);
        let mode_name = self.modes[id.0].name.clone();

        let mut seen = HashSet::new();
        let mut element_rules = Vec::new();
        let mut attribute_rules = Vec::new();
        for layer in &layers {
            for rule in layer {
                if !seen.insert(rule.signature()) {
                    // shadowed by a nearer layer
                    continue;
                }
                if rule.cancelled {
                    continue;
                }
                if rule.match_attributes {
                    attribute_rules.push(rule.clone());
                } else {
                    element_rules.push(rule.clone());
                }
            }
        }

        check_collisions(&element_rules, &mode_name, "elements")?;
        check_collisions(&attribute_rules, &mode_name, "attributes")?;

        if !element_rules.iter().any(|r| r.is_any) {
            let action = self.synthesize_catch_all(BuiltinSchema::Reject, id)?;
            element_rules.push(SimpleRule {
                match_attributes: false,
                is_any: true,
                namespace: String::new(),
                wildcard: None,
                actions: vec![action],
                location: SourceLocation::default(),
                cancelled: false,
            });
        }
        if !attribute_rules.iter().any(|r| r.is_any) {
            let action = self.synthesize_catch_all(BuiltinSchema::Allow, id)?;
            attribute_rules.push(SimpleRule {
                match_attributes: true,
                is_any: true,
                namespace: String::new(),
                wildcard: None,
                actions: vec![action],
                location: SourceLocation::default(),
                cancelled: false,
            });
        }

        self.modes[id.0].element_rules = element_rules;
        self.modes[id.0].attribute_rules = attribute_rules;
        Ok(())
    }

    fn synthesize_catch_all(&mut self, schema: BuiltinSchema, owner: ModeId) -> Result<ActionId> {
        let generator = self.config.get_generator(
            &SchemaSource::Builtin(schema),
            DEFAULT_SCHEMA_TYPE,
            &[],
            &SourceLocation::default(),
        )?;
        let id = ActionId(self.actions.len());
        self.actions.push(SimpleAction {
            kind: ActionKind::Validate { generator },
            messages: IndexMap::new(),
            default_mode: ModeId(usize::MAX),
            contexts: Vec::new(),
            location: SourceLocation::default(),
        });
        self.pending.push(PendingUsage {
            action: id,
            owner,
            default_mode: ModeRef::Current,
            contexts: Vec::new(),
        });
        Ok(id)
    }

    /// Phase 3: write direct mode handles into every compiled action
    fn resolve_modes(&mut self) -> Result<()> {
        let pending = std::mem::take(&mut self.pending);
        for usage in pending {
            let default_mode = self.resolve_mode_ref(&usage.default_mode, usage.owner)?;
            self.actions[usage.action.0].default_mode = default_mode;
            for (index, reference) in usage.contexts.iter().enumerate() {
                let mode = self.resolve_mode_ref(reference, usage.owner)?;
                self.actions[usage.action.0].contexts[index].mode = mode;
            }
        }
        Ok(())
    }

    fn resolve_mode_ref(&self, reference: &ModeRef, owner: ModeId) -> Result<ModeId> {
        match reference {
            ModeRef::Current => Ok(owner),
            ModeRef::Compiled(id) => Ok(*id),
            ModeRef::Named(name, location) => {
                self.mode_names.get(name).copied().ok_or_else(|| {
                    CompileError::new(format!("mode '{}' is not defined", name))
                        .with_location(location.clone())
                        .into()
                })
            }
        }
    }
}

fn check_collisions(rules: &[SimpleRule], mode_name: &str, target: &str) -> Result<()> {
    let any_count = rules.iter().filter(|r| r.is_any).count();
    if any_count > 1 {
        let second = rules.iter().filter(|r| r.is_any).nth(1).unwrap();
        return Err(CompileError::new(format!(
            "mode '{}' declares more than one anyNamespace rule for {}",
            mode_name, target
        ))
        .with_location(second.location.clone())
        .into());
    }

    let concrete: Vec<&SimpleRule> = rules.iter().filter(|r| !r.is_any).collect();
    for (index, first) in concrete.iter().enumerate() {
        for second in &concrete[index + 1..] {
            if ns_matches(
                &first.namespace,
                first.wildcard,
                &second.namespace,
                second.wildcard,
            ) {
                return Err(CompileError::new(format!(
                    "rules for namespaces '{}' and '{}' in mode '{}' can match the same namespace",
                    first.namespace, second.namespace, mode_name
                ))
                .with_location(second.location.clone())
                .into());
            }
        }
    }
    Ok(())
}

/// Split a context path into alternatives of element local-name steps
fn parse_context_path(path: &str) -> Vec<Vec<String>> {
    path.split('|')
        .map(|alternative| {
            alternative
                .trim()
                .split('/')
                .filter(|step| !step.is_empty())
                .map(String::from)
                .collect()
        })
        .filter(|steps: &Vec<String>| !steps.is_empty())
        .collect()
}
