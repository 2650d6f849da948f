// src/models.rs

use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer};
use std::collections::BTreeMap;
use std::collections::btree_map::Entry;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

// --- COMMAND TYPES ---

/// A phase of the build pipeline. The declaration order is the execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum CommandType {
    /// Builds an image.
    Build,
    /// Runs the checks against a built image.
    Test,
    /// Publishes a built image.
    Push,
}

impl CommandType {
    /// Every command type, in pipeline order.
    pub const ALL: [Self; 3] = [Self::Build, Self::Test, Self::Push];

    /// The name used for this type in templates and on the command line.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Build => "build",
            Self::Test => "test",
            Self::Push => "push",
        }
    }
}

impl fmt::Display for CommandType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A verb that names no command type.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Unknown command type '{0}'.")]
pub struct UnknownCommandType(pub String);

impl FromStr for CommandType {
    type Err = UnknownCommandType;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "build" => Ok(Self::Build),
            "test" => Ok(Self::Test),
            "push" => Ok(Self::Push),
            other => Err(UnknownCommandType(other.to_string())),
        }
    }
}

// --- PARAMETER VALUES ---

/// A scalar parameter value as written in the manifest.
///
/// Nested mappings and sequences are rejected while loading, so a template can
/// only ever receive a plain value.
#[derive(Deserialize, Debug, Clone, PartialEq)]
#[serde(untagged)]
pub enum Scalar {
    /// `~` or an empty value; renders as nothing.
    Null,
    /// `true` or `false`.
    Bool(bool),
    /// An integer or float, rendered with its YAML text.
    Number(serde_yaml::Number),
    /// Any other text.
    String(String),
}

impl fmt::Display for Scalar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Null => Ok(()),
            Self::Bool(b) => write!(f, "{}", b),
            Self::Number(n) => write!(f, "{}", n),
            Self::String(s) => f.write_str(s),
        }
    }
}

impl From<&str> for Scalar {
    fn from(value: &str) -> Self {
        Self::String(value.to_string())
    }
}

impl From<String> for Scalar {
    fn from(value: String) -> Self {
        Self::String(value)
    }
}

/// How double-brace placeholders are substituted.
///
/// Triple-brace placeholders are always substituted verbatim.
#[derive(Deserialize, Debug, Clone, Copy, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Escaping {
    /// Verbatim substitution. Rendered commands are shell lines, not HTML.
    #[default]
    Raw,
    /// Mustache-style HTML escaping of `{{name}}` placeholders.
    Html,
}

// --- MANIFEST MODELS (What is read from the manifest file) ---

/// One level of the defaults hierarchy: parameter values and command templates.
#[derive(Deserialize, Debug, Clone, Default, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct Layer {
    /// Values available to the templates.
    #[serde(default, deserialize_with = "string_keyed")]
    pub parameters: BTreeMap<String, Scalar>,
    /// Command templates, keyed by command type name.
    #[serde(default, deserialize_with = "string_keyed")]
    pub templates: BTreeMap<String, String>,
}

/// The fully merged layer for a single (context, tag) pair.
pub type ResolvedTagMeta = Layer;

/// Parameter overrides declared for one tag. An empty YAML value is an empty override.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TagOverride {
    /// Parameters that win over every other layer for this tag.
    pub parameters: BTreeMap<String, Scalar>,
}

impl<'de> Deserialize<'de> for TagOverride {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        string_keyed(deserializer).map(|parameters| Self { parameters })
    }
}

/// Metadata declared for a single context.
#[derive(Deserialize, Debug, Clone, Default, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct ContextMeta {
    /// Name of the context. Filled in on lookup, never read from the document.
    #[serde(skip)]
    pub context: String,
    /// Parameters shared by every tag of the context.
    #[serde(default, deserialize_with = "string_keyed")]
    pub parameters: BTreeMap<String, Scalar>,
    /// Templates shared by every tag of the context.
    #[serde(default, deserialize_with = "string_keyed")]
    pub templates: BTreeMap<String, String>,
    #[serde(default, rename = "tagKeys")]
    tag_keys_camel: Option<Vec<String>>,
    #[serde(default, rename = "tag-keys")]
    tag_keys_kebab: Option<Vec<String>>,
    #[serde(default, rename = "tag_keys")]
    tag_keys_snake: Option<Vec<String>>,
    /// Declared tags. `None` when the context has no `tags` entry (or it is
    /// null), in which case the context has nothing to run.
    #[serde(default, deserialize_with = "optional_string_keyed")]
    pub tags: Option<BTreeMap<String, TagOverride>>,
}

impl ContextMeta {
    /// Metadata that carries nothing but the context name.
    pub fn named(context: impl Into<String>) -> Self {
        Self {
            context: context.into(),
            ..Default::default()
        }
    }

    /// Whether the context declares a `tags` mapping, even an empty one.
    pub fn declares_tags(&self) -> bool {
        self.tags.is_some()
    }

    /// The declared overrides of `tag`, if the tag is declared.
    pub fn tag(&self, tag: &str) -> Option<&TagOverride> {
        self.tags.as_ref().and_then(|tags| tags.get(tag))
    }

    /// The declared tag names, sorted.
    pub fn tag_names(&self) -> Vec<String> {
        self.tags
            .iter()
            .flat_map(|tags| tags.keys().cloned())
            .collect()
    }

    /// The tag keys as declared, honouring `tagKeys`, `tag-keys` and `tag_keys`
    /// in that order.
    pub fn declared_tag_keys(&self) -> Option<&[String]> {
        self.tag_keys_camel
            .as_deref()
            .or(self.tag_keys_kebab.as_deref())
            .or(self.tag_keys_snake.as_deref())
    }

    /// Replaces the declared tag keys (stored under the `tagKeys` spelling).
    pub fn with_tag_keys<I, S>(mut self, keys: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.tag_keys_camel = Some(keys.into_iter().map(Into::into).collect());
        self.tag_keys_kebab = None;
        self.tag_keys_snake = None;
        self
    }

    /// The context's own parameters and templates as a layer.
    pub fn layer(&self) -> Layer {
        Layer {
            parameters: self.parameters.clone(),
            templates: self.templates.clone(),
        }
    }
}

/// Root of the manifest document.
#[derive(Deserialize, Debug, Clone, Default, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct Manifest {
    /// Root layer, the lowest-precedence declared values.
    #[serde(default, deserialize_with = "null_as_default")]
    pub defaults: Layer,
    /// Declared contexts. A context with an empty body is empty metadata.
    #[serde(default, deserialize_with = "string_keyed_nullable")]
    pub contexts: BTreeMap<String, ContextMeta>,
    /// How `{{name}}` placeholders are substituted.
    #[serde(default, deserialize_with = "null_as_default")]
    pub escape: Escaping,
}

// --- DESERIALIZATION HELPERS ---

/// Treats an explicit YAML `null` the same as an absent field.
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// Reads a mapping whose keys may be written as strings, numbers or booleans.
///
/// Unquoted tags such as `1.0` or `2` parse as numbers in YAML; they are kept
/// in their textual form so they can be addressed by name. Two keys with the
/// same text (`1` and `'1'`) are rejected.
fn string_keyed<'de, D, V>(deserializer: D) -> Result<BTreeMap<String, V>, D::Error>
where
    D: Deserializer<'de>,
    V: DeserializeOwned,
{
    Ok(optional_string_keyed(deserializer)?.unwrap_or_default())
}

/// Like [`string_keyed`], keeping an absent or null mapping apart from an empty one.
fn optional_string_keyed<'de, D, V>(
    deserializer: D,
) -> Result<Option<BTreeMap<String, V>>, D::Error>
where
    D: Deserializer<'de>,
    V: DeserializeOwned,
{
    match Option::<serde_yaml::Mapping>::deserialize(deserializer)? {
        Some(raw) => collect_keyed(raw, serde_yaml::from_value).map(Some),
        None => Ok(None),
    }
}

/// Like [`string_keyed`], reading a null value as the default value.
fn string_keyed_nullable<'de, D, V>(deserializer: D) -> Result<BTreeMap<String, V>, D::Error>
where
    D: Deserializer<'de>,
    V: DeserializeOwned + Default,
{
    let raw = Option::<serde_yaml::Mapping>::deserialize(deserializer)?.unwrap_or_default();
    collect_keyed(raw, |value| {
        if value.is_null() {
            Ok(V::default())
        } else {
            serde_yaml::from_value(value)
        }
    })
}

fn collect_keyed<E, V>(
    raw: serde_yaml::Mapping,
    convert: impl Fn(serde_yaml::Value) -> Result<V, serde_yaml::Error>,
) -> Result<BTreeMap<String, V>, E>
where
    E: serde::de::Error,
{
    let mut map = BTreeMap::new();
    for (key, value) in raw {
        let key = scalar_key(&key)
            .ok_or_else(|| E::custom(format!("unsupported mapping key: {:?}", key)))?;
        let value = convert(value).map_err(|e| E::custom(format!("under key '{}': {}", key, e)))?;
        match map.entry(key) {
            Entry::Occupied(entry) => {
                return Err(E::custom(format!("duplicate key '{}'", entry.key())));
            }
            Entry::Vacant(entry) => {
                entry.insert(value);
            }
        }
    }
    Ok(map)
}

fn scalar_key(key: &serde_yaml::Value) -> Option<String> {
    match key {
        serde_yaml::Value::String(s) => Some(s.clone()),
        serde_yaml::Value::Number(n) => Some(n.to_string()),
        serde_yaml::Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use super::*;

    #[test]
    fn test_command_type_order_is_pipeline_order() {
        let mut types = vec![CommandType::Push, CommandType::Build, CommandType::Test];
        types.sort();
        assert_eq!(types, CommandType::ALL.to_vec());
    }

    #[test]
    fn test_command_type_parses_known_names_only() {
        assert_eq!("test".parse::<CommandType>().unwrap(), CommandType::Test);
        assert_eq!(
            "template".parse::<CommandType>(),
            Err(UnknownCommandType("template".to_string()))
        );
    }

    #[test]
    fn test_scalar_renders_yaml_text() {
        let values: BTreeMap<String, Scalar> =
            serde_yaml::from_str("a: text\nb: 42\nc: true\nd: ~\ne: 1.5").unwrap();
        let rendered: Vec<String> = values.values().map(ToString::to_string).collect();
        assert_eq!(rendered, vec!["text", "42", "true", "", "1.5"]);
    }

    #[test]
    fn test_tag_override_accepts_empty_value() {
        let yaml = "tags:\n  latest:\n  edge: {}\n  beta: { bar: baz }\n";
        let meta: ContextMeta = serde_yaml::from_str(yaml).unwrap();
        assert!(meta.tag("latest").unwrap().parameters.is_empty());
        assert!(meta.tag("edge").unwrap().parameters.is_empty());
        assert_eq!(meta.tag("beta").unwrap().parameters["bar"], Scalar::from("baz"));
    }

    #[test]
    fn test_numeric_tag_names_keep_their_text() {
        let yaml = "tags:\n  1: {}\n  2.5: {}\n  '1.6.1': {}\n";
        let meta: ContextMeta = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(meta.tag_names(), vec!["1", "1.6.1", "2.5"]);
    }

    #[test]
    fn test_tag_keys_first_spelling_wins() {
        let yaml = "tag_keys: [snake]\ntagKeys: [camel]\n";
        let meta: ContextMeta = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(meta.declared_tag_keys(), Some(&["camel".to_string()][..]));

        let yaml = "tag_keys: [snake]\ntag-keys: [kebab]\n";
        let meta: ContextMeta = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(meta.declared_tag_keys(), Some(&["kebab".to_string()][..]));
    }

    #[test]
    fn test_nested_parameter_value_is_rejected() {
        let yaml = "parameters:\n  bar: { nested: true }\n";
        let result: Result<ContextMeta, _> = serde_yaml::from_str(yaml);
        assert!(result.is_err());
    }

    #[test]
    fn test_unknown_context_field_is_rejected() {
        let yaml = "templat:\n  build: echo\n";
        let result: Result<ContextMeta, _> = serde_yaml::from_str(yaml);
        let error_msg = result.unwrap_err().to_string();
        assert!(
            error_msg.contains("unknown field `templat`"),
            "Error message was: {}",
            error_msg
        );
    }

    #[test]
    fn test_escape_mode_defaults_to_raw() {
        let manifest: Manifest = serde_yaml::from_str("contexts: {}").unwrap();
        assert_eq!(manifest.escape, Escaping::Raw);
        let manifest: Manifest = serde_yaml::from_str("escape: html").unwrap();
        assert_eq!(manifest.escape, Escaping::Html);
    }

    #[test]
    fn test_tags_presence_is_kept_apart_from_empty() {
        let absent: ContextMeta = serde_yaml::from_str("parameters: { a: b }").unwrap();
        let null: ContextMeta = serde_yaml::from_str("tags: ~").unwrap();
        let empty: ContextMeta = serde_yaml::from_str("tags: {}").unwrap();
        assert!(!absent.declares_tags());
        assert!(!null.declares_tags());
        assert!(empty.declares_tags());
        assert!(empty.tag_names().is_empty());
    }

    #[test]
    fn test_keys_with_the_same_text_are_rejected() {
        let yaml = "tags:\n  1: { bar: numeric }\n  '1': { bar: string }\n";
        let error = serde_yaml::from_str::<ContextMeta>(yaml).unwrap_err();
        assert!(
            error.to_string().contains("duplicate key '1'"),
            "Error message was: {}",
            error
        );
    }

    #[test]
    fn test_context_with_empty_body_is_empty_metadata() {
        let manifest: Manifest = serde_yaml::from_str("contexts:\n  stable:\n  edge: ~\n").unwrap();
        assert_eq!(manifest.contexts["stable"], ContextMeta::default());
        assert_eq!(manifest.contexts["edge"], ContextMeta::default());
    }
}
