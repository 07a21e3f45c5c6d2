//! Datasource configuration schemas and secret field detection.
//!
//! Providers describe their configuration as a [`ConfigSchema`] tree. A
//! field is secret when its description contains `secret:true` or its
//! string format is `password`; those fields are routed through the
//! secret vault by the datasource repository.

use std::collections::{BTreeMap, HashMap};

use serde::{Deserialize, Serialize};

/// Description marker flagging a secret field.
pub const SECRET_MARKER: &str = "secret:true";
const PASSWORD_FORMAT: &str = "password";

/// Configuration schema node.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ConfigSchema {
    Object {
        properties: BTreeMap<String, ConfigSchema>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        description: Option<String>,
    },
    Union {
        options: Vec<ConfigSchema>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        description: Option<String>,
    },
    Optional {
        inner: Box<ConfigSchema>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        description: Option<String>,
    },
    Nullable {
        inner: Box<ConfigSchema>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        description: Option<String>,
    },
    Default {
        inner: Box<ConfigSchema>,
        value: serde_json::Value,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        description: Option<String>,
    },
    String {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        description: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        format: Option<String>,
    },
    Number {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        description: Option<String>,
    },
    Boolean {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        description: Option<String>,
    },
    Array {
        items: Box<ConfigSchema>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        description: Option<String>,
    },
}

impl ConfigSchema {
    pub fn object<I, K>(properties: I) -> Self
    where
        I: IntoIterator<Item = (K, ConfigSchema)>,
        K: Into<String>,
    {
        ConfigSchema::Object {
            properties: properties
                .into_iter()
                .map(|(name, schema)| (name.into(), schema))
                .collect(),
            description: None,
        }
    }

    pub fn union(options: impl IntoIterator<Item = ConfigSchema>) -> Self {
        ConfigSchema::Union {
            options: options.into_iter().collect(),
            description: None,
        }
    }

    pub fn string() -> Self {
        ConfigSchema::String {
            description: None,
            format: None,
        }
    }

    pub fn number() -> Self {
        ConfigSchema::Number { description: None }
    }

    pub fn boolean() -> Self {
        ConfigSchema::Boolean { description: None }
    }

    /// A string field with the `password` format.
    pub fn password() -> Self {
        ConfigSchema::String {
            description: None,
            format: Some(PASSWORD_FORMAT.to_string()),
        }
    }

    pub fn optional(self) -> Self {
        ConfigSchema::Optional {
            inner: Box::new(self),
            description: None,
        }
    }

    pub fn nullable(self) -> Self {
        ConfigSchema::Nullable {
            inner: Box::new(self),
            description: None,
        }
    }

    pub fn with_default(self, value: serde_json::Value) -> Self {
        ConfigSchema::Default {
            inner: Box::new(self),
            value,
            description: None,
        }
    }

    /// Replace this node's description.
    pub fn describe(mut self, text: impl Into<String>) -> Self {
        *self.description_mut() = Some(text.into());
        self
    }

    /// Mark this node as secret.
    pub fn secret(self) -> Self {
        self.describe(SECRET_MARKER)
    }

    pub fn description(&self) -> Option<&str> {
        match self {
            ConfigSchema::Object { description, .. }
            | ConfigSchema::Union { description, .. }
            | ConfigSchema::Optional { description, .. }
            | ConfigSchema::Nullable { description, .. }
            | ConfigSchema::Default { description, .. }
            | ConfigSchema::String { description, .. }
            | ConfigSchema::Number { description }
            | ConfigSchema::Boolean { description }
            | ConfigSchema::Array { description, .. } => description.as_deref(),
        }
    }

    fn description_mut(&mut self) -> &mut Option<String> {
        match self {
            ConfigSchema::Object { description, .. }
            | ConfigSchema::Union { description, .. }
            | ConfigSchema::Optional { description, .. }
            | ConfigSchema::Nullable { description, .. }
            | ConfigSchema::Default { description, .. }
            | ConfigSchema::String { description, .. }
            | ConfigSchema::Number { description }
            | ConfigSchema::Boolean { description }
            | ConfigSchema::Array { description, .. } => description,
        }
    }

    /// Strip optional, nullable and default wrappers.
    pub fn unwrap_modifiers(&self) -> &ConfigSchema {
        let mut current = self;
        while let ConfigSchema::Optional { inner, .. }
        | ConfigSchema::Nullable { inner, .. }
        | ConfigSchema::Default { inner, .. } = current
        {
            current = inner;
        }
        current
    }

    /// True when this field, or any wrapper around it, is marked secret.
    pub fn is_secret(&self) -> bool {
        let mut current = self;
        loop {
            if current
                .description()
                .is_some_and(|text| text.contains(SECRET_MARKER))
            {
                return true;
            }
            match current {
                ConfigSchema::Optional { inner, .. }
                | ConfigSchema::Nullable { inner, .. }
                | ConfigSchema::Default { inner, .. } => current = inner,
                ConfigSchema::String {
                    format: Some(format),
                    ..
                } => return format == PASSWORD_FORMAT,
                _ => return false,
            }
        }
    }
}

/// Names of the secret fields declared by `schema`.
///
/// Objects contribute their secret properties; unions contribute the secret
/// fields of every branch. Names are deduplicated in order of appearance.
pub fn secret_fields(schema: &ConfigSchema) -> Vec<String> {
    let mut fields = Vec::new();
    collect_secret_fields(schema, &mut fields);
    fields
}

fn collect_secret_fields(schema: &ConfigSchema, fields: &mut Vec<String>) {
    match schema.unwrap_modifiers() {
        ConfigSchema::Object { properties, .. } => {
            for (name, property) in properties {
                if property.is_secret() && !fields.contains(name) {
                    fields.push(name.clone());
                }
            }
        }
        ConfigSchema::Union { options, .. } => {
            for option in options {
                collect_secret_fields(option, fields);
            }
        }
        _ => {}
    }
}

/// Configuration schemas keyed by datasource provider id.
#[derive(Debug, Clone, Default)]
pub struct ProviderSchemas {
    schemas: HashMap<String, ConfigSchema>,
}

impl ProviderSchemas {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, provider: impl Into<String>, schema: ConfigSchema) -> &mut Self {
        self.schemas.insert(provider.into(), schema);
        self
    }

    pub fn with(mut self, provider: impl Into<String>, schema: ConfigSchema) -> Self {
        self.register(provider, schema);
        self
    }

    pub fn get(&self, provider: &str) -> Option<&ConfigSchema> {
        self.schemas.get(provider)
    }

    /// Secret field names for `provider`; empty for unknown providers.
    pub fn secret_fields_for(&self, provider: &str) -> Vec<String> {
        self.get(provider).map(secret_fields).unwrap_or_default()
    }
}
