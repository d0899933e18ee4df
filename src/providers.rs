//! Validator providers and engine configuration
//!
//! Schema validation itself is pluggable: a [`ValidatorProvider`] inspects a
//! schema reference and a MIME-style schema type and either produces a
//! [`ValidatorGenerator`] or passes. Providers are tried in registration
//! order; the built-in provider for the predefined `allow` and `reject`
//! schemas is always first. [`NvdlConfig`] bundles the provider registry
//! with a [`Resolver`] for external schema references and the message
//! locale.

use crate::error::{CompileError, Error, Result, ValidationError};
use crate::filters::FilteringReader;
use crate::locations::SourceLocation;
use crate::readers::{XmlAttribute, XmlEvent};
use crate::rules::NvdlOption;
use std::fs;
use std::path::Path;
use url::Url;

/// Default schema type assumed when neither a `validate` action nor the
/// `rules` element declares one
pub const DEFAULT_SCHEMA_TYPE: &str = "application/xml";

/// One of the predefined no-op schemas
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BuiltinSchema {
    /// Accept everything
    Allow,
    /// Refuse every element
    Reject,
}

/// Where a `validate` action's schema comes from
#[derive(Debug, Clone)]
pub enum SchemaSource {
    /// External reference, resolved against the rule document URI
    Uri {
        /// The `schema` attribute value
        href: String,
        /// Base URI for relative resolution
        base: Option<String>,
    },
    /// Inline `<schema>` content
    Inline(String),
    /// Predefined allow/reject schema
    Builtin(BuiltinSchema),
}

/// Outcome of asking one provider for a generator
pub enum GeneratorLookup {
    /// The provider understood the schema and produced a generator
    Found(Box<dyn ValidatorGenerator>),
    /// The schema is not this provider's kind; try the next one
    NotApplicable,
}

/// Resolves and opens external schema references
pub trait Resolver {
    /// Resolve `href` against `base` and read the resource
    fn resolve(&self, href: &str, base: Option<&str>) -> Result<Vec<u8>>;
}

/// Default resolver reading `file:` URLs and plain filesystem paths
#[derive(Debug, Default)]
pub struct FileResolver;

impl Resolver for FileResolver {
    fn resolve(&self, href: &str, base: Option<&str>) -> Result<Vec<u8>> {
        let resolved = match base {
            Some(base) => match Url::parse(base) {
                Ok(base_url) => Some(base_url.join(href)?),
                // base is a plain path; join on the filesystem
                Err(_) => {
                    let joined = Path::new(base)
                        .parent()
                        .unwrap_or_else(|| Path::new(""))
                        .join(href);
                    return read_file(&joined);
                }
            },
            None => Url::parse(href).ok(),
        };

        match resolved {
            Some(url) if url.scheme() == "file" => {
                let path = url
                    .to_file_path()
                    .map_err(|_| Error::Resource(format!("invalid file URL '{}'", url)))?;
                read_file(&path)
            }
            Some(url) => Err(Error::Resource(format!(
                "remote schema loading is not supported: {}",
                url
            ))),
            None => read_file(Path::new(href)),
        }
    }
}

fn read_file(path: &Path) -> Result<Vec<u8>> {
    fs::read(path)
        .map_err(|e| Error::Resource(format!("failed to read '{}': {}", path.display(), e)))
}

/// Factory for validator instances of one compiled schema
pub trait ValidatorGenerator {
    /// Create a fresh validator advancing over one section's events
    fn create_validator(&self, resolver: &dyn Resolver) -> Result<Box<dyn Validator>>;

    /// Create an attribute validator, when the schema language has one
    fn create_attribute_validator(
        &self,
        resolver: &dyn Resolver,
    ) -> Result<Option<Box<dyn AttributeValidator>>> {
        let _ = resolver;
        Ok(None)
    }

    /// Apply a schema-specific option; `false` means unsupported
    fn add_option(&mut self, name: &str, arg: Option<&str>) -> bool {
        let _ = (name, arg);
        false
    }

    /// First right-of-refusal on a validation error raised by one of this
    /// generator's validators. Returning `Some` replaces the error with a
    /// more specific one; `None` lets it propagate unchanged.
    fn handle_error(&self, error: &Error, location: Option<&SourceLocation>) -> Option<Error> {
        let _ = (error, location);
        None
    }
}

/// A live validator, advanced exactly once per dispatched event
pub trait Validator {
    /// Consume the next node from the filter and validate it
    fn read(&mut self, source: &mut FilteringReader) -> Result<()>;
}

/// Validates one element's attributes, called once per distinct namespace
pub trait AttributeValidator {
    /// Validate the attributes of `namespace` on the current element
    fn validate_attributes(&mut self, namespace: &str, attributes: &[XmlAttribute])
        -> Result<()>;
}

/// Pluggable schema-language support
pub trait ValidatorProvider {
    /// Try to interpret `source` as this provider's kind of schema
    fn create_generator(
        &self,
        source: &SchemaSource,
        schema_type: &str,
        config: &NvdlConfig,
    ) -> Result<GeneratorLookup>;
}

/// Provider for the predefined `allow` and `reject` schemas
#[derive(Debug, Default)]
pub struct BuiltinProvider;

impl ValidatorProvider for BuiltinProvider {
    fn create_generator(
        &self,
        source: &SchemaSource,
        _schema_type: &str,
        _config: &NvdlConfig,
    ) -> Result<GeneratorLookup> {
        match source {
            SchemaSource::Builtin(schema) => Ok(GeneratorLookup::Found(Box::new(
                BuiltinGenerator { schema: *schema },
            ))),
            _ => Ok(GeneratorLookup::NotApplicable),
        }
    }
}

struct BuiltinGenerator {
    schema: BuiltinSchema,
}

impl ValidatorGenerator for BuiltinGenerator {
    fn create_validator(&self, _resolver: &dyn Resolver) -> Result<Box<dyn Validator>> {
        Ok(Box::new(BuiltinValidator {
            schema: self.schema,
        }))
    }

    fn create_attribute_validator(
        &self,
        _resolver: &dyn Resolver,
    ) -> Result<Option<Box<dyn AttributeValidator>>> {
        Ok(Some(Box::new(BuiltinValidator {
            schema: self.schema,
        })))
    }
}

struct BuiltinValidator {
    schema: BuiltinSchema,
}

impl Validator for BuiltinValidator {
    fn read(&mut self, source: &mut FilteringReader) -> Result<()> {
        let event = match source.read() {
            Some(event) => event,
            None => return Ok(()),
        };
        if self.schema == BuiltinSchema::Allow {
            return Ok(());
        }
        match event {
            XmlEvent::StartElement {
                namespace,
                local_name,
                location,
                ..
            } => Err(ValidationError::new(format!(
                "element '{}' in namespace '{}' is rejected",
                local_name, namespace
            ))
            .with_location(location)
            .with_action("reject")
            .into()),
            _ => Ok(()),
        }
    }
}

impl AttributeValidator for BuiltinValidator {
    fn validate_attributes(
        &mut self,
        namespace: &str,
        attributes: &[XmlAttribute],
    ) -> Result<()> {
        if self.schema == BuiltinSchema::Allow {
            return Ok(());
        }
        let names: Vec<&str> = attributes.iter().map(|a| a.local_name.as_str()).collect();
        Err(ValidationError::new(format!(
            "attributes [{}] in namespace '{}' are rejected",
            names.join(", "),
            namespace
        ))
        .with_action("reject")
        .into())
    }
}

/// Engine configuration: provider registry, resolver, message locale
pub struct NvdlConfig {
    providers: Vec<Box<dyn ValidatorProvider>>,
    resolver: Box<dyn Resolver>,
    locale: Option<String>,
}

impl Default for NvdlConfig {
    fn default() -> Self {
        Self {
            providers: vec![Box::new(BuiltinProvider)],
            resolver: Box::new(FileResolver),
            locale: system_locale(),
        }
    }
}

impl NvdlConfig {
    /// Create a configuration with the built-in provider and file resolver
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an additional provider, tried after the built-in one and
    /// any previously registered providers
    pub fn with_provider(mut self, provider: Box<dyn ValidatorProvider>) -> Self {
        self.providers.push(provider);
        self
    }

    /// Replace the schema resolver
    pub fn with_resolver(mut self, resolver: Box<dyn Resolver>) -> Self {
        self.resolver = resolver;
        self
    }

    /// Set the locale used to select action messages
    pub fn with_locale(mut self, locale: impl Into<String>) -> Self {
        self.locale = Some(locale.into());
        self
    }

    /// Get the schema resolver
    pub fn resolver(&self) -> &dyn Resolver {
        self.resolver.as_ref()
    }

    /// Get the message locale, when one is set
    pub fn locale(&self) -> Option<&str> {
        self.locale.as_deref()
    }

    /// Find a generator for a schema by trying providers in registration
    /// order, then apply the action's options to it. Exhausting every
    /// provider is a compile error naming the schema type.
    pub fn get_generator(
        &self,
        source: &SchemaSource,
        schema_type: &str,
        options: &[NvdlOption],
        location: &SourceLocation,
    ) -> Result<Box<dyn ValidatorGenerator>> {
        for provider in &self.providers {
            let mut generator = match provider.create_generator(source, schema_type, self)? {
                GeneratorLookup::Found(generator) => generator,
                GeneratorLookup::NotApplicable => continue,
            };
            for option in options {
                let supported = generator.add_option(&option.name, option.arg.as_deref());
                if !supported && option.must_support {
                    return Err(CompileError::new(format!(
                        "option '{}' is not supported by the validator for schema type '{}'",
                        option.name, schema_type
                    ))
                    .with_location(option.location.clone())
                    .into());
                }
            }
            return Ok(generator);
        }
        Err(CompileError::new(format!(
            "no registered validator provider supports schema type '{}'",
            schema_type
        ))
        .with_location(location.clone())
        .into())
    }
}

fn system_locale() -> Option<String> {
    let lang = std::env::var("LANG").ok()?;
    let tag = lang.split('.').next()?.trim();
    if tag.is_empty() || tag == "C" || tag == "POSIX" {
        return None;
    }
    Some(tag.replace('_', "-"))
}
