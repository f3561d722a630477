//! Parameter values exchanged with the provider.
//!
//! Request fields and decoded response fields share one closed variant, [`Value`].
//! Each variant has a fixed wire rendering (see [`Value::to_wire_text`]), so neither
//! the signer nor the XML codec inspects types at runtime.

use std::collections::BTreeMap;

use serde::{Serialize, Serializer};

/// Field name to value mapping.
///
/// A `BTreeMap` keeps keys in byte-wise ascending order, which is exactly the order
/// the signature string is built in.
pub type ParamMap = BTreeMap<String, Value>;

/// Fields of a decoded XML document (the children of its root element).
pub type XmlMap = ParamMap;

/// A request or response field value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Value {
    /// Plain text.
    String(String),
    /// Integer amount, count or timestamp.
    Integer(i64),
    /// Ordered values (repeated XML siblings, or JSON arrays on the request side).
    List(Vec<Value>),
    /// Nested fields (XML children/attributes, or JSON objects on the request side).
    Map(ParamMap),
}

impl Value {
    /// Returns `true` for values that are left out of both the signature and the
    /// wire document: empty or whitespace-only text, empty lists and empty maps.
    ///
    /// Integers are never blank, so a `0` amount is signed and sent like any other.
    #[must_use]
    pub fn is_blank(&self) -> bool {
        match self {
            Self::String(s) => s.trim().is_empty(),
            Self::Integer(_) => false,
            Self::List(items) => items.is_empty(),
            Self::Map(fields) => fields.is_empty(),
        }
    }

    /// Renders the value as element text.
    ///
    /// Strings are trimmed, integers rendered in decimal, and lists/maps as compact
    /// JSON. The signer and the encoder both use this text, so a signature always
    /// covers exactly what is sent.
    ///
    /// # Examples
    ///
    /// ```
    /// use weixinpay::value::{ParamMap, Value};
    ///
    /// assert_eq!(Value::from(100).to_wire_text(), "100");
    ///
    /// let mut store = ParamMap::new();
    /// store.insert("id".to_owned(), Value::from("SZTX001"));
    /// let mut scene = ParamMap::new();
    /// scene.insert("store_info".to_owned(), Value::Map(store));
    /// assert_eq!(Value::Map(scene).to_wire_text(), r#"{"store_info":{"id":"SZTX001"}}"#);
    /// ```
    #[must_use]
    pub fn to_wire_text(&self) -> String {
        match self {
            Self::String(s) => s.trim().to_owned(),
            Self::Integer(i) => i.to_string(),
            Self::List(_) | Self::Map(_) => self.to_json().to_string(),
        }
    }

    /// Converts into a [`serde_json::Value`].
    #[must_use]
    pub fn to_json(&self) -> serde_json::Value {
        match self {
            Self::String(s) => serde_json::Value::String(s.clone()),
            Self::Integer(i) => serde_json::Value::from(*i),
            Self::List(items) => serde_json::Value::Array(items.iter().map(Self::to_json).collect()),
            Self::Map(fields) => serde_json::Value::Object(
                fields.iter().map(|(k, v)| (k.clone(), v.to_json())).collect(),
            ),
        }
    }

    /// Returns the text if this is a [`Value::String`].
    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) => Some(s),
            _ => None,
        }
    }

    /// Returns the items if this is a [`Value::List`].
    #[must_use]
    pub fn as_list(&self) -> Option<&[Self]> {
        match self {
            Self::List(items) => Some(items.as_slice()),
            _ => None,
        }
    }

    /// Returns the fields if this is a [`Value::Map`].
    #[must_use]
    pub fn as_map(&self) -> Option<&ParamMap> {
        match self {
            Self::Map(fields) => Some(fields),
            _ => None,
        }
    }
}

impl Serialize for Value {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        match self {
            Self::String(s) => serializer.serialize_str(s),
            Self::Integer(i) => serializer.serialize_i64(*i),
            Self::List(items) => items.serialize(serializer),
            Self::Map(fields) => fields.serialize(serializer),
        }
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Self::String(s.to_owned())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Self::String(s)
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Self::Integer(i)
    }
}

impl From<u32> for Value {
    fn from(i: u32) -> Self {
        Self::Integer(i64::from(i))
    }
}

impl From<i32> for Value {
    fn from(i: i32) -> Self {
        Self::Integer(i64::from(i))
    }
}

impl From<Vec<Value>> for Value {
    fn from(items: Vec<Value>) -> Self {
        Self::List(items)
    }
}

impl From<ParamMap> for Value {
    fn from(fields: ParamMap) -> Self {
        Self::Map(fields)
    }
}

/// Reads a text field from a decoded map.
pub(crate) fn text_field<'a>(map: &'a ParamMap, key: &str) -> Option<&'a str> {
    map.get(key).and_then(Value::as_str)
}
