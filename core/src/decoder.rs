//! JSON decoder factory with an explicit persistence context.
//!
//! # Design
//! A decoder may carry one persistence handle that record types use to
//! insert themselves into an object graph while decoding. The handle is a
//! typed `DecodeContext` passed alongside the decoder instead of a
//! string-keyed side channel, and the two kinds of handle are variants of
//! one enum, so a decoder never holds both.

use std::any::Any;
use std::fmt;
use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde_json::{Map, Value};

use crate::error::{ApiError, DecodingConfigurationError};

pub const MANAGED_OBJECT_CONTEXT_KEY: &str = "managedObjectContext";
pub const MODEL_CONTAINER_KEY: &str = "modelContainer";

/// How JSON object keys map onto Rust field names.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum KeyStrategy {
    /// Keys are used exactly as they appear.
    #[default]
    UseDefaultKeys,
    /// `snake_case` keys are rewritten to `camelCase` before deserializing.
    ConvertFromSnakeCase,
}

/// Persistence handle attached to a decode.
#[derive(Clone, Default)]
pub enum DecodeContext {
    #[default]
    None,
    ManagedObjectContext(Arc<dyn Any + Send + Sync>),
    ModelContainer(Arc<dyn Any + Send + Sync>),
}

impl DecodeContext {
    pub fn from_managed_object_context<C: Any + Send + Sync>(context: Arc<C>) -> Self {
        DecodeContext::ManagedObjectContext(context)
    }

    pub fn from_model_container<C: Any + Send + Sync>(container: Arc<C>) -> Self {
        DecodeContext::ModelContainer(container)
    }

    /// The well-known name of the attached handle, if any.
    pub fn key(&self) -> Option<&'static str> {
        match self {
            DecodeContext::None => None,
            DecodeContext::ManagedObjectContext(_) => Some(MANAGED_OBJECT_CONTEXT_KEY),
            DecodeContext::ModelContainer(_) => Some(MODEL_CONTAINER_KEY),
        }
    }

    /// Borrow the managed object context as `C`.
    ///
    /// Fails when no managed object context is attached or it is not a `C`.
    pub fn managed_object_context<C: Any>(&self) -> Result<&C, DecodingConfigurationError> {
        let found = match self {
            DecodeContext::ManagedObjectContext(handle) => (**handle).downcast_ref::<C>(),
            _ => None,
        };
        found.ok_or(DecodingConfigurationError::MissingManagedObjectContext)
    }

    pub fn model_container<C: Any>(&self) -> Result<&C, DecodingConfigurationError> {
        let found = match self {
            DecodeContext::ModelContainer(handle) => (**handle).downcast_ref::<C>(),
            _ => None,
        };
        found.ok_or(DecodingConfigurationError::MissingModelContainer)
    }
}

impl fmt::Debug for DecodeContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.key() {
            Some(key) => write!(f, "DecodeContext({key})"),
            None => write!(f, "DecodeContext(None)"),
        }
    }
}

/// Types decoded against the decoder's persistence context.
pub trait DecodeWithContext: Sized {
    fn decode_with_context(value: Value, context: &DecodeContext) -> Result<Self, ApiError>;
}

/// JSON decoder factory: a key strategy plus an optional persistence context.
///
/// There is no date strategy. Key conversion only rewrites object keys, so a
/// date reaches the target type as written and each field picks its format
/// through its own `Deserialize` impl.
#[derive(Debug, Clone, Default)]
pub struct JsonDecoder {
    key_strategy: KeyStrategy,
    context: DecodeContext,
}

impl JsonDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Factory mirroring the usual call site: pick a key strategy and an
    /// optional persistence handle in one go.
    pub fn configured(key_strategy: KeyStrategy, context: DecodeContext) -> Self {
        Self {
            key_strategy,
            context,
        }
    }

    pub fn with_key_strategy(mut self, key_strategy: KeyStrategy) -> Self {
        self.key_strategy = key_strategy;
        self
    }

    pub fn with_context(mut self, context: DecodeContext) -> Self {
        self.context = context;
        self
    }

    pub fn key_strategy(&self) -> KeyStrategy {
        self.key_strategy
    }

    pub fn context(&self) -> &DecodeContext {
        &self.context
    }

    pub fn decode<D: DeserializeOwned>(&self, body: &str) -> Result<D, serde_json::Error> {
        let value = self.prepare(body)?;
        serde_json::from_value(value)
    }

    pub fn decode_with_context<D: DecodeWithContext>(&self, body: &str) -> Result<D, ApiError> {
        let value = self.prepare(body).map_err(|e| ApiError::Decode(e.to_string()))?;
        D::decode_with_context(value, &self.context)
    }

    fn prepare(&self, body: &str) -> Result<Value, serde_json::Error> {
        let value: Value = serde_json::from_str(body)?;
        Ok(match self.key_strategy {
            KeyStrategy::UseDefaultKeys => value,
            KeyStrategy::ConvertFromSnakeCase => convert_keys(value),
        })
    }
}

fn convert_keys(value: Value) -> Value {
    match value {
        Value::Object(map) => Value::Object(
            map.into_iter()
                .map(|(key, value)| (snake_to_camel(&key), convert_keys(value)))
                .collect::<Map<String, Value>>(),
        ),
        Value::Array(items) => Value::Array(items.into_iter().map(convert_keys).collect()),
        other => other,
    }
}

/// `user_id` -> `userId`. Leading and trailing underscores survive.
pub fn snake_to_camel(key: &str) -> String {
    let core = key.trim_matches('_');
    if core.is_empty() || !core.contains('_') {
        return key.to_string();
    }
    let leading = &key[..key.len() - key.trim_start_matches('_').len()];
    let trailing = &key[key.trim_end_matches('_').len()..];

    let mut out = String::with_capacity(key.len());
    out.push_str(leading);
    for (i, part) in core.split('_').filter(|p| !p.is_empty()).enumerate() {
        if i == 0 {
            out.push_str(part);
            continue;
        }
        let mut chars = part.chars();
        if let Some(first) = chars.next() {
            out.extend(first.to_uppercase());
            out.push_str(&chars.as_str().to_lowercase());
        }
    }
    out.push_str(trailing);
    out
}
