//! Schema
//!
//! Translates between a provider's typed state and canonical string pairs:
//! per-key codecs, defaults, and the optional namespace prefix that turns a
//! logical key (`bar`) into its canonical form (`pre.bar`).

pub mod codec;

pub use codec::{BoolCodec, Codec, DateCodec, EnumCodec, ListCodec, NumberCodec, TextCodec};

use crate::error::SchemaError;
use crate::types::{State, Value};
use std::collections::HashMap;
use std::sync::Arc;

/// Reserved key that declares the namespace prefix in `SchemaConfig::from_defaults`.
pub const PREFIX_KEY: &str = "_";

/// One declared key of a schema configuration.
#[derive(Debug, Clone)]
pub struct SchemaEntry {
    pub key: String,
    pub default: Value,
    pub codec: Arc<dyn Codec>,
}

/// Ordered schema declaration: entries plus an optional namespace prefix.
#[derive(Debug, Clone, Default)]
pub struct SchemaConfig {
    prefix: Option<String>,
    entries: Vec<SchemaEntry>,
}

impl SchemaConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = Some(prefix.into());
        self
    }

    /// Declare a key whose codec is inferred from the default value.
    pub fn field(self, key: impl Into<String>, default: impl Into<Value>) -> Self {
        let default = default.into();
        let codec = codec::infer(&default);
        self.field_with(key, default, codec)
    }

    /// Declare a key with an explicit codec.
    pub fn field_with(
        mut self,
        key: impl Into<String>,
        default: impl Into<Value>,
        codec: Arc<dyn Codec>,
    ) -> Self {
        self.entries.push(SchemaEntry {
            key: key.into(),
            default: default.into(),
            codec,
        });
        self
    }

    /// Build from plain `key -> default` pairs.
    ///
    /// The reserved key `_` carries the namespace prefix and must be text.
    pub fn from_defaults<I, K>(pairs: I) -> Result<Self, SchemaError>
    where
        I: IntoIterator<Item = (K, Value)>,
        K: Into<String>,
    {
        let mut config = Self::new();
        for (key, default) in pairs {
            let key = key.into();
            if key == PREFIX_KEY {
                match default {
                    Value::Text(prefix) => config.prefix = Some(prefix),
                    other => {
                        return Err(SchemaError::InvalidConfig(format!(
                            "prefix must be text, got {}",
                            other.kind()
                        )))
                    }
                }
            } else {
                config = config.field(key, default);
            }
        }
        Ok(config)
    }

    pub fn prefix(&self) -> Option<&str> {
        self.prefix.as_deref()
    }

    pub fn entries(&self) -> &[SchemaEntry] {
        &self.entries
    }
}

#[derive(Debug)]
struct Field {
    key: String,
    prefixed: String,
    default: Value,
    codec: Arc<dyn Codec>,
}

/// Validated, immutable schema owned by one provider.
#[derive(Debug)]
pub struct Schema {
    prefix: Option<String>,
    fields: Vec<Field>,
    index: HashMap<String, usize>,
}

impl Schema {
    /// Validate a configuration and precompute prefixed keys.
    ///
    /// `separator` joins prefix and key.
    pub fn new(config: SchemaConfig, separator: &str) -> Result<Self, SchemaError> {
        if let Some(prefix) = &config.prefix {
            if prefix.is_empty() {
                return Err(SchemaError::InvalidConfig(
                    "prefix cannot be empty".to_string(),
                ));
            }
        }

        let empty = State::new();
        let mut fields = Vec::with_capacity(config.entries.len());
        let mut index = HashMap::with_capacity(config.entries.len());
        for entry in config.entries {
            if entry.key.is_empty() || entry.key == PREFIX_KEY {
                return Err(SchemaError::InvalidConfig(format!(
                    "invalid key name {:?}",
                    entry.key
                )));
            }
            if index.contains_key(&entry.key) {
                return Err(SchemaError::DuplicateKey(entry.key));
            }
            entry
                .codec
                .encode(&entry.default, &empty)
                .map_err(|source| SchemaError::TypeMismatch {
                    key: entry.key.clone(),
                    source,
                })?;

            let prefixed = match &config.prefix {
                Some(prefix) => format!("{}{}{}", prefix, separator, entry.key),
                None => entry.key.clone(),
            };
            index.insert(entry.key.clone(), fields.len());
            fields.push(Field {
                key: entry.key,
                prefixed,
                default: entry.default,
                codec: entry.codec,
            });
        }

        Ok(Self {
            prefix: config.prefix,
            fields,
            index,
        })
    }

    fn field(&self, key: &str) -> Result<&Field, SchemaError> {
        self.index
            .get(key)
            .map(|&i| &self.fields[i])
            .ok_or_else(|| SchemaError::UnknownKey(key.to_string()))
    }

    pub fn prefix(&self) -> Option<&str> {
        self.prefix.as_deref()
    }

    pub fn contains(&self, key: &str) -> bool {
        self.index.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Encode `value` for `key`, giving the codec `context` for derived encodings.
    pub fn serialize(&self, key: &str, value: &Value, context: &State) -> Result<String, SchemaError> {
        let field = self.field(key)?;
        field
            .codec
            .encode(value, context)
            .map_err(|source| SchemaError::Encode {
                key: key.to_string(),
                source,
            })
    }

    pub fn deserialize(&self, key: &str, raw: &str) -> Result<Value, SchemaError> {
        let field = self.field(key)?;
        field.codec.decode(raw).map_err(|source| SchemaError::Decode {
            key: key.to_string(),
            source,
        })
    }

    pub fn default_for(&self, key: &str) -> Option<&Value> {
        self.index.get(key).map(|&i| &self.fields[i].default)
    }

    /// Canonical form of `key`: the key itself, or `prefix<sep>key`.
    pub fn prefixed(&self, key: &str) -> Option<&str> {
        self.index.get(key).map(|&i| self.fields[i].prefixed.as_str())
    }

    /// Logical keys with their prefixed form, in declaration order.
    pub fn keys(&self) -> impl Iterator<Item = (&str, &str)> {
        self.fields
            .iter()
            .map(|f| (f.key.as_str(), f.prefixed.as_str()))
    }

    /// First prefixed key this schema shares with `other`, if any.
    pub fn conflicts(&self, other: &Schema) -> Option<String> {
        let theirs: std::collections::HashSet<&str> =
            other.fields.iter().map(|f| f.prefixed.as_str()).collect();
        self.fields
            .iter()
            .find(|f| theirs.contains(f.prefixed.as_str()))
            .map(|f| f.prefixed.clone())
    }
}
