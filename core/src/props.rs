//! Property values handed to elements and components by the tree builder.

use serde_json::Value;

use crate::backend::Listener;

/// A single property value: plain data or an event listener.
#[derive(Debug, Clone)]
pub enum PropValue {
    /// Structured or scalar data.
    Value(Value),
    /// An event callback.
    Listener(Listener),
}

impl PropValue {
    /// Returns the data value, or `None` for listeners.
    #[must_use]
    pub const fn as_value(&self) -> Option<&Value> {
        match self {
            Self::Value(value) => Some(value),
            Self::Listener(_) => None,
        }
    }

    /// Returns the listener, or `None` for data values.
    #[must_use]
    pub const fn as_listener(&self) -> Option<&Listener> {
        match self {
            Self::Listener(listener) => Some(listener),
            Self::Value(_) => None,
        }
    }
}

macro_rules! impl_from_value {
    ($($ty:ty),*) => {
        $(
            impl From<$ty> for PropValue {
                fn from(value: $ty) -> Self {
                    Self::Value(Value::from(value))
                }
            }
        )*
    };
}

impl_from_value!(&str, String, bool, i32, i64, u32, u64, f64, Value);

impl From<Listener> for PropValue {
    fn from(listener: Listener) -> Self {
        Self::Listener(listener)
    }
}

/// Renders a data value the way it is written into an output attribute.
///
/// Strings are used verbatim, `null` becomes the empty string and everything else uses
/// its JSON text.
#[must_use]
pub fn attribute_text(value: &Value) -> String {
    match value {
        Value::String(text) => text.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

/// Maps a listener key such as `onClick` to its event name (`click`).
///
/// Returns `None` when the key lacks the `on` prefix or has nothing after it.
#[must_use]
pub fn event_name(key: &str) -> Option<String> {
    let rest = key.strip_prefix("on")?;
    let mut chars = rest.chars();
    let first = chars.next()?;
    Some(first.to_lowercase().chain(chars).collect())
}

/// Ordered property map with unique keys.
#[derive(Debug, Clone, Default)]
pub struct Props {
    entries: Vec<(String, PropValue)>,
}

impl Props {
    /// Creates an empty map.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    /// Stores `value` under `key`, replacing an earlier value in place.
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<PropValue>) {
        let key = key.into();
        let value = value.into();
        if let Some(slot) = self.entries.iter_mut().find(|(existing, _)| *existing == key) {
            slot.1 = value;
        } else {
            self.entries.push((key, value));
        }
    }

    /// Returns the raw property stored under `key`.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&PropValue> {
        self.entries
            .iter()
            .find(|(existing, _)| existing == key)
            .map(|(_, value)| value)
    }

    /// Returns the data value stored under `key`, skipping listeners.
    #[must_use]
    pub fn value(&self, key: &str) -> Option<&Value> {
        self.get(key).and_then(PropValue::as_value)
    }

    /// Returns the listener stored under `key`, skipping data values.
    #[must_use]
    pub fn listener(&self, key: &str) -> Option<&Listener> {
        self.get(key).and_then(PropValue::as_listener)
    }

    /// Iterates entries in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &PropValue)> {
        self.entries
            .iter()
            .map(|(key, value)| (key.as_str(), value))
    }

    /// Returns the number of entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` when no property is set.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Attribute list passed to the tree builder, applied in order.
#[derive(Debug, Clone, Default)]
pub struct Attrs(Vec<(String, PropValue)>);

impl Attrs {
    /// Creates an empty attribute list.
    #[must_use]
    pub const fn new() -> Self {
        Self(Vec::new())
    }

    /// Appends an attribute.
    #[must_use]
    pub fn with(mut self, key: impl Into<String>, value: impl Into<PropValue>) -> Self {
        self.0.push((key.into(), value.into()));
        self
    }

    /// Returns `true` when the list is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<()> for Attrs {
    fn from((): ()) -> Self {
        Self::new()
    }
}

impl<K, V, const N: usize> From<[(K, V); N]> for Attrs
where
    K: Into<String>,
    V: Into<PropValue>,
{
    fn from(entries: [(K, V); N]) -> Self {
        entries.into_iter().collect()
    }
}

impl<K, V> FromIterator<(K, V)> for Attrs
where
    K: Into<String>,
    V: Into<PropValue>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self(
            iter.into_iter()
                .map(|(key, value)| (key.into(), value.into()))
                .collect(),
        )
    }
}

impl IntoIterator for Attrs {
    type Item = (String, PropValue);
    type IntoIter = std::vec::IntoIter<(String, PropValue)>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}
