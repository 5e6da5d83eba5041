//! Value codecs: the per-kind encode/decode capability a schema entry carries.

use crate::error::CodecError;
use crate::types::{State, Value};
use chrono::{DateTime, SecondsFormat, Utc};
use std::fmt;
use std::sync::Arc;

/// Encode/decode capability for one kind of value.
///
/// `encode` receives the owning provider's state as context so a codec may
/// derive its output from sibling fields. `decode` failures are recoverable
/// for the store: the key falls back to its default.
pub trait Codec: fmt::Debug + Send + Sync {
    /// Short name used in error messages.
    fn kind(&self) -> &'static str;

    fn encode(&self, value: &Value, context: &State) -> Result<String, CodecError>;

    fn decode(&self, raw: &str) -> Result<Value, CodecError>;
}

/// Pick a codec for a default value when none is given explicitly.
pub fn infer(default: &Value) -> Arc<dyn Codec> {
    match default {
        Value::Number(_) => Arc::new(NumberCodec),
        Value::Text(_) => Arc::new(TextCodec),
        Value::Bool(_) => Arc::new(BoolCodec),
        Value::Date(_) => Arc::new(DateCodec),
        Value::List(items) => {
            let inner = items
                .first()
                .map(infer)
                .unwrap_or_else(|| Arc::new(TextCodec) as Arc<dyn Codec>);
            Arc::new(ListCodec::new(inner))
        }
    }
}

fn mismatch(expected: &'static str, found: &Value) -> CodecError {
    CodecError::Mismatch {
        expected,
        found: found.kind(),
    }
}

fn invalid(kind: &'static str, raw: &str, reason: impl Into<String>) -> CodecError {
    CodecError::Invalid {
        kind,
        raw: raw.to_string(),
        reason: reason.into(),
    }
}

/// Finite numbers, printed in shortest round-trip form (`42`, `0.5`).
#[derive(Debug, Clone, Copy, Default)]
pub struct NumberCodec;

impl Codec for NumberCodec {
    fn kind(&self) -> &'static str {
        "number"
    }

    fn encode(&self, value: &Value, _context: &State) -> Result<String, CodecError> {
        match value {
            Value::Number(n) => Ok(n.to_string()),
            other => Err(mismatch(self.kind(), other)),
        }
    }

    fn decode(&self, raw: &str) -> Result<Value, CodecError> {
        let n: f64 = raw
            .trim()
            .parse()
            .map_err(|e: std::num::ParseFloatError| invalid(self.kind(), raw, e.to_string()))?;
        if !n.is_finite() {
            return Err(invalid(self.kind(), raw, "not a finite number"));
        }
        Ok(Value::Number(n))
    }
}

/// Text passed through unchanged.
#[derive(Debug, Clone, Copy, Default)]
pub struct TextCodec;

impl Codec for TextCodec {
    fn kind(&self) -> &'static str {
        "text"
    }

    fn encode(&self, value: &Value, _context: &State) -> Result<String, CodecError> {
        match value {
            Value::Text(s) => Ok(s.clone()),
            other => Err(mismatch(self.kind(), other)),
        }
    }

    fn decode(&self, raw: &str) -> Result<Value, CodecError> {
        Ok(Value::Text(raw.to_string()))
    }
}

/// Booleans as `true`/`false`; `1`/`0` are accepted on decode.
#[derive(Debug, Clone, Copy, Default)]
pub struct BoolCodec;

impl Codec for BoolCodec {
    fn kind(&self) -> &'static str {
        "bool"
    }

    fn encode(&self, value: &Value, _context: &State) -> Result<String, CodecError> {
        match value {
            Value::Bool(b) => Ok(b.to_string()),
            other => Err(mismatch(self.kind(), other)),
        }
    }

    fn decode(&self, raw: &str) -> Result<Value, CodecError> {
        match raw.trim() {
            "true" | "1" => Ok(Value::Bool(true)),
            "false" | "0" => Ok(Value::Bool(false)),
            _ => Err(invalid(self.kind(), raw, "expected true or false")),
        }
    }
}

/// UTC timestamps as RFC 3339 with millisecond precision.
///
/// Encoding truncates to milliseconds, so two dates differing only below
/// that precision serialize identically and compare as unchanged.
#[derive(Debug, Clone, Copy, Default)]
pub struct DateCodec;

impl Codec for DateCodec {
    fn kind(&self) -> &'static str {
        "date"
    }

    fn encode(&self, value: &Value, _context: &State) -> Result<String, CodecError> {
        match value {
            Value::Date(d) => Ok(d.to_rfc3339_opts(SecondsFormat::Millis, true)),
            other => Err(mismatch(self.kind(), other)),
        }
    }

    fn decode(&self, raw: &str) -> Result<Value, CodecError> {
        DateTime::parse_from_rfc3339(raw.trim())
            .map(|d| Value::Date(d.with_timezone(&Utc)))
            .map_err(|e| invalid(self.kind(), raw, e.to_string()))
    }
}

/// Text restricted to a closed set of variants.
#[derive(Debug, Clone)]
pub struct EnumCodec {
    variants: Vec<String>,
}

impl EnumCodec {
    pub fn new<I, S>(variants: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            variants: variants.into_iter().map(Into::into).collect(),
        }
    }

    pub fn variants(&self) -> &[String] {
        &self.variants
    }

    fn contains(&self, candidate: &str) -> bool {
        self.variants.iter().any(|v| v == candidate)
    }
}

impl Codec for EnumCodec {
    fn kind(&self) -> &'static str {
        "enum"
    }

    fn encode(&self, value: &Value, _context: &State) -> Result<String, CodecError> {
        match value {
            Value::Text(s) if self.contains(s) => Ok(s.clone()),
            Value::Text(s) => Err(invalid(self.kind(), s, "not a declared variant")),
            other => Err(mismatch(self.kind(), other)),
        }
    }

    fn decode(&self, raw: &str) -> Result<Value, CodecError> {
        if self.contains(raw) {
            Ok(Value::Text(raw.to_string()))
        } else {
            Err(invalid(
                self.kind(),
                raw,
                format!("expected one of {}", self.variants.join(", ")),
            ))
        }
    }
}

/// Lists encoded item by item through an inner codec and joined by a separator.
///
/// An empty string decodes to an empty list. Items must not contain the
/// separator once encoded.
#[derive(Debug, Clone)]
pub struct ListCodec {
    inner: Arc<dyn Codec>,
    separator: char,
}

impl ListCodec {
    pub fn new(inner: Arc<dyn Codec>) -> Self {
        Self {
            inner,
            separator: ',',
        }
    }

    pub fn with_separator(mut self, separator: char) -> Self {
        self.separator = separator;
        self
    }
}

impl Codec for ListCodec {
    fn kind(&self) -> &'static str {
        "list"
    }

    fn encode(&self, value: &Value, context: &State) -> Result<String, CodecError> {
        let items = match value {
            Value::List(items) => items,
            other => return Err(mismatch(self.kind(), other)),
        };
        let mut parts = Vec::with_capacity(items.len());
        for item in items {
            let encoded = self.inner.encode(item, context)?;
            if encoded.contains(self.separator) {
                return Err(invalid(
                    self.kind(),
                    &encoded,
                    format!("item contains separator {:?}", self.separator),
                ));
            }
            parts.push(encoded);
        }
        Ok(parts.join(&self.separator.to_string()))
    }

    fn decode(&self, raw: &str) -> Result<Value, CodecError> {
        if raw.is_empty() {
            return Ok(Value::List(Vec::new()));
        }
        raw.split(self.separator)
            .map(|part| self.inner.decode(part))
            .collect::<Result<Vec<_>, _>>()
            .map(Value::List)
    }
}
