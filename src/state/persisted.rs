use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Floats as JSON numbers, with NaN and the infinities spelled out as text
mod float_repr {
    use serde::de::Error;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &f64, serializer: S) -> Result<S::Ok, S::Error> {
        if value.is_nan() {
            serializer.serialize_str("NaN")
        } else if value.is_infinite() {
            serializer.serialize_str(if *value > 0.0 { "inf" } else { "-inf" })
        } else {
            serializer.serialize_f64(*value)
        }
    }

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Repr {
        Number(f64),
        Text(String),
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<f64, D::Error> {
        match Repr::deserialize(deserializer)? {
            Repr::Number(value) => Ok(value),
            Repr::Text(text) => match text.as_str() {
                "NaN" => Ok(f64::NAN),
                "inf" => Ok(f64::INFINITY),
                "-inf" => Ok(f64::NEG_INFINITY),
                other => Err(D::Error::custom(format!("invalid float '{}'", other))),
            },
        }
    }
}

/// A single primitive entry in a [`PersistedState`] bag
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum StateValue {
    Bool(bool),
    Int(i64),
    Float(#[serde(with = "float_repr")] f64),
    Text(String),
    Bytes(Vec<u8>),
    Bag(PersistedState),
}

/// Key/value bag a screen fills right before it is destroyed and reads back
/// right after it is recreated.
///
/// Getters take a default so that keys written by a newer version, or keys
/// that were never written, never break restoration. Unknown keys are simply
/// never read.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PersistedState {
    entries: BTreeMap<String, StateValue>,
}

impl PersistedState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn put(&mut self, key: impl Into<String>, value: StateValue) {
        self.entries.insert(key.into(), value);
    }

    pub fn put_bool(&mut self, key: impl Into<String>, value: bool) {
        self.put(key, StateValue::Bool(value));
    }

    pub fn put_int(&mut self, key: impl Into<String>, value: i64) {
        self.put(key, StateValue::Int(value));
    }

    pub fn put_float(&mut self, key: impl Into<String>, value: f64) {
        self.put(key, StateValue::Float(value));
    }

    pub fn put_text(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.put(key, StateValue::Text(value.into()));
    }

    pub fn put_bytes(&mut self, key: impl Into<String>, value: impl Into<Vec<u8>>) {
        self.put(key, StateValue::Bytes(value.into()));
    }

    pub fn put_bag(&mut self, key: impl Into<String>, value: PersistedState) {
        self.put(key, StateValue::Bag(value));
    }

    /// Store `Some` values, remove the key for `None`
    pub fn put_opt_text(&mut self, key: impl Into<String>, value: Option<&str>) {
        let key = key.into();
        match value {
            Some(text) => self.put_text(key, text),
            None => {
                self.entries.remove(&key);
            }
        }
    }

    pub fn get(&self, key: &str) -> Option<&StateValue> {
        self.entries.get(key)
    }

    pub fn get_bool(&self, key: &str, default: bool) -> bool {
        match self.entries.get(key) {
            Some(StateValue::Bool(value)) => *value,
            _ => default,
        }
    }

    pub fn get_int(&self, key: &str, default: i64) -> i64 {
        match self.entries.get(key) {
            Some(StateValue::Int(value)) => *value,
            _ => default,
        }
    }

    /// Integers written with `put_int` are accepted as floats too
    pub fn get_float(&self, key: &str, default: f64) -> f64 {
        match self.entries.get(key) {
            Some(StateValue::Float(value)) => *value,
            Some(StateValue::Int(value)) => *value as f64,
            _ => default,
        }
    }

    pub fn get_text(&self, key: &str) -> Option<&str> {
        match self.entries.get(key) {
            Some(StateValue::Text(value)) => Some(value.as_str()),
            _ => None,
        }
    }

    pub fn get_bytes(&self, key: &str) -> Option<&[u8]> {
        match self.entries.get(key) {
            Some(StateValue::Bytes(value)) => Some(value.as_slice()),
            _ => None,
        }
    }

    pub fn get_bag(&self, key: &str) -> Option<&PersistedState> {
        match self.entries.get(key) {
            Some(StateValue::Bag(value)) => Some(value),
            _ => None,
        }
    }

    pub fn contains(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    pub fn remove(&mut self, key: &str) -> Option<StateValue> {
        self.entries.remove(key)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Serialize the bag for the host's save mechanism
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }

    pub fn from_json(json: &str) -> serde_json::Result<Self> {
        serde_json::from_str(json)
    }
}
