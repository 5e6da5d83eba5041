//! Registered providers and the per-provider reconciliation pass.

use crate::error::{SchemaError, StoreError};
use crate::schema::Schema;
use crate::types::{ProviderId, State, Value, Values};
use tracing::trace;

/// Callback receiving the keys whose values changed for one provider.
pub type ProviderCallback = Box<dyn FnMut(&State) + Send>;

pub(crate) struct Provider {
    pub(crate) id: ProviderId,
    pub(crate) schema: Schema,
    pub(crate) state: State,
    callback: ProviderCallback,
}

impl Provider {
    pub(crate) fn new(id: ProviderId, schema: Schema, callback: ProviderCallback) -> Self {
        Self {
            id,
            schema,
            state: State::new(),
            callback,
        }
    }

    /// Value the canonical mapping holds for `key`, or the schema default.
    ///
    /// Missing and undecodable entries both resolve to the default.
    fn resolve(&self, key: &str, prefixed: &str, values: &Values) -> Result<Value, SchemaError> {
        let decoded = values
            .get(prefixed)
            .and_then(|raw| self.schema.deserialize(key, raw).ok());
        match decoded {
            Some(value) => Ok(value),
            None => self
                .schema
                .default_for(key)
                .cloned()
                .ok_or_else(|| SchemaError::UnknownKey(key.to_string())),
        }
    }

    /// Compare the canonical mapping against `state` and record what changed.
    ///
    /// Existing keys are compared by serialized form, with the state built so
    /// far as context, so codecs decide what counts as equal. The state is
    /// only replaced once every key has been compared.
    pub(crate) fn diff(&mut self, values: &Values) -> Result<State, SchemaError> {
        let mut next_state = self.state.clone();
        let mut changed = State::new();
        for (key, prefixed) in self.schema.keys() {
            let next = self.resolve(key, prefixed, values)?;
            let differs = match next_state.get(key) {
                None => true,
                Some(current) => {
                    let incoming = self.schema.serialize(key, &next, &next_state)?;
                    let known = self.schema.serialize(key, current, &next_state)?;
                    incoming != known
                }
            };
            if differs {
                trace!(provider = %self.id, key, "value changed");
                next_state.insert(key.to_string(), next.clone());
                changed.insert(key.to_string(), next);
            }
        }
        self.state = next_state;
        Ok(changed)
    }

    /// Run a reconciliation pass and invoke the callback if anything changed.
    pub(crate) fn notify(&mut self, values: &Values) -> Result<bool, StoreError> {
        let changed = self.diff(values)?;
        if changed.is_empty() {
            return Ok(false);
        }
        (self.callback)(&changed);
        Ok(true)
    }

    /// Encode a provider-driven update into canonical pairs.
    ///
    /// Each value is encoded with the cumulative state, overlaid with the
    /// incoming values, as context. Nothing is returned unless every key
    /// encodes.
    pub(crate) fn encode(&self, update: &State) -> Result<Vec<(String, String)>, SchemaError> {
        let mut context = self.state.clone();
        for (key, value) in update {
            context.insert(key.clone(), value.clone());
        }

        let mut pairs = Vec::with_capacity(update.len());
        for (key, value) in update {
            let prefixed = self
                .schema
                .prefixed(key)
                .ok_or_else(|| SchemaError::UnknownKey(key.clone()))?;
            let encoded = self.schema.serialize(key, value, &context)?;
            pairs.push((prefixed.to_string(), encoded));
        }
        Ok(pairs)
    }

    /// Merge a provider-driven update into this provider's typed state.
    pub(crate) fn absorb(&mut self, update: State) {
        self.state.extend(update);
    }
}
