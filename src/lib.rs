//! Statemux: Typed Provider State over One Serialized Mapping
//!
//! Multiple independent providers register schemas describing their typed
//! state. The store serializes that state into a single string-keyed,
//! string-valued mapping (suitable for a URL query or a storage blob), detects
//! providers that would clobber each other's keys, reconciles external
//! replacements of the mapping back into per-provider diffs, and debounces
//! outbound notifications.

pub mod config;
pub mod driver;
pub mod error;
pub mod logging;
pub mod schema;
pub mod store;
pub mod types;

pub use config::{ConfigLoader, StoreConfig};
pub use driver::{SharedStore, StoreDriver};
pub use error::{CodecError, ConfigError, SchemaError, StoreError};
pub use schema::{Codec, Schema, SchemaConfig};
pub use store::Store;
pub use types::{ProviderId, State, Value, Values};
