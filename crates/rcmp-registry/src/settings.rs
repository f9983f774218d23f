//! Comparison settings loaded from YAML
//!
//! Only the declarative part of a policy can be expressed in a settings
//! file; custom equalities are closures and must be added to the builder
//! returned by [`ComparisonSettings::into_builder`].
//!
//! ```yaml
//! ignore_collection_order: true
//! strict_type_checking: false
//! ignored_fields: [id, home.address]
//! ignored_fields_matching: [".*_at"]
//! compared_fields: []
//! compared_types: [Address]
//! field_messages:
//!   name: "names must match"
//! ```

use crate::builder::RegistryBuilder;
use crate::error::{ConfigError, ConfigResult};
use crate::registry::{EquivalenceRegistry, RegistryFlags};
use indexmap::IndexMap;
use rcmp_core::TypeName;
use serde::Deserialize;
use std::fs;
use std::path::Path;
use tracing::debug;

/// Keys accepted besides the flag names
const RULE_KEYS: &[&str] = &[
    "ignored_fields",
    "ignored_fields_matching",
    "ignored_types",
    "compared_fields",
    "compared_types",
    "unordered_fields",
    "unordered_fields_matching",
    "overridden_equals_types",
    "field_messages",
    "type_messages",
];

/// Declarative comparison policy
///
/// Unknown keys are rejected when parsing, so a misspelled rule fails
/// instead of being silently dropped.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ComparisonSettings {
    /// Global switches, given at the top level of the document
    #[serde(flatten)]
    pub flags: RegistryFlags,
    pub ignored_fields: Vec<String>,
    pub ignored_fields_matching: Vec<String>,
    pub ignored_types: Vec<TypeName>,
    pub compared_fields: Vec<String>,
    /// Only differences in values of these types are reported
    pub compared_types: Vec<TypeName>,
    pub unordered_fields: Vec<String>,
    pub unordered_fields_matching: Vec<String>,
    /// Types compared with their native equality
    pub overridden_equals_types: Vec<TypeName>,
    pub field_messages: IndexMap<String, String>,
    pub type_messages: IndexMap<TypeName, String>,
}

impl ComparisonSettings {
    /// Parse settings from YAML text
    pub fn from_yaml_str(content: &str) -> ConfigResult<Self> {
        Self::parse(content, "<string>")
    }

    /// Load settings from a YAML file
    pub fn load(path: impl AsRef<Path>) -> ConfigResult<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|e| ConfigError::ReadFile {
            path: path.to_path_buf(),
            source: e,
        })?;
        let settings = Self::parse(&content, &path.display().to_string())?;
        debug!(
            ignored_fields = settings.ignored_fields.len(),
            compared_fields = settings.compared_fields.len(),
            "Loaded comparison settings from {:?}",
            path
        );
        Ok(settings)
    }

    fn parse(content: &str, origin: &str) -> ConfigResult<Self> {
        // An empty document means "all defaults"
        if content.trim().is_empty() {
            return Ok(Self::default());
        }
        let parse_error = |e| ConfigError::ParseYaml {
            origin: origin.to_string(),
            source: e,
        };
        let document: serde_yaml::Value = serde_yaml::from_str(content).map_err(parse_error)?;
        if let serde_yaml::Value::Mapping(mapping) = &document {
            for key in mapping.keys() {
                let known = key
                    .as_str()
                    .map(|name| RegistryFlags::NAMES.contains(&name) || RULE_KEYS.contains(&name))
                    .unwrap_or(false);
                if !known {
                    return Err(ConfigError::UnknownSetting {
                        origin: origin.to_string(),
                        key: key.as_str().map(str::to_string).unwrap_or_else(|| format!("{:?}", key)),
                    });
                }
            }
        }
        serde_yaml::from_value(document).map_err(parse_error)
    }

    /// Turn the settings into a builder, ready for more rules
    pub fn into_builder(self) -> RegistryBuilder {
        let mut builder = RegistryBuilder::new()
            .with_flags(self.flags)
            .ignoring_fields(self.ignored_fields)
            .ignoring_fields_matching_regexes(self.ignored_fields_matching)
            .ignoring_fields_of_types(self.ignored_types)
            .comparing_only_fields(self.compared_fields)
            .comparing_only_fields_of_types(self.compared_types)
            .ignoring_collection_order_in_fields(self.unordered_fields)
            .ignoring_collection_order_in_fields_matching_regexes(self.unordered_fields_matching)
            .using_overridden_equals_for_types(self.overridden_equals_types);

        for (path, message) in self.field_messages {
            builder = builder.with_error_message_for_fields(message, [path]);
        }
        for (type_name, message) in self.type_messages {
            builder = builder.with_error_message_for_type(message, type_name);
        }
        builder
    }

    /// Build a registry from these settings alone
    pub fn build(self) -> ConfigResult<EquivalenceRegistry> {
        self.into_builder().build()
    }
}
