//! Parameter codecs.
//!
//! Path and query values travel as strings. A codec turns such a raw string
//! into a [`serde_json::Value`] and back. Non-string codecs read the raw text
//! as a JSON literal, so one mechanism carries numbers, booleans, arrays and
//! objects. String codecs never parse JSON: `"3"` stays the string `"3"`.

use std::fmt;
use std::marker::PhantomData;
use std::str::FromStr;
use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use crate::error::{DecodeError, RouterError};

/// A user-supplied value schema backing a custom codec.
///
/// `decode` receives the raw URL string already read as a JSON literal
/// (or as a JSON string when it is not valid JSON) and returns the accepted
/// value, or a reason for rejecting it.
pub trait Schema: Send + Sync + fmt::Debug {
    /// Name of the schema, used in error messages.
    ///
    /// A schema named `"string"` is treated as a pass-through string codec.
    fn name(&self) -> &str;

    /// Validates and converts a parsed value.
    fn decode(&self, value: &Value) -> Result<Value, String>;

    /// Converts a value back to its wire form. `None` omits the parameter.
    fn encode(&self, value: &Value) -> Option<String> {
        encode_value(value)
    }

    /// Whether absent and `null` values are acceptable.
    fn is_optional(&self) -> bool {
        false
    }
}

/// The codec attached to a path or query parameter.
#[derive(Debug, Clone)]
pub enum ParamType {
    /// `string`: the raw value, unchanged.
    String,
    /// `string?`: like `String`, absence allowed.
    OptionalString,
    /// `number`: a JSON number.
    Number,
    /// `number?`: like `Number`, absence and `null` allowed.
    OptionalNumber,
    /// A custom schema.
    Custom(Arc<dyn Schema>),
}

impl ParamType {
    /// Wraps a custom schema.
    pub fn custom(schema: impl Schema + 'static) -> Self {
        Self::Custom(Arc::new(schema))
    }

    /// Returns the declaration tag of this codec.
    pub fn tag(&self) -> &str {
        match self {
            Self::String => "string",
            Self::OptionalString => "string?",
            Self::Number => "number",
            Self::OptionalNumber => "number?",
            Self::Custom(schema) => schema.name(),
        }
    }

    /// Whether the parameter may be absent.
    pub fn is_optional(&self) -> bool {
        match self {
            Self::OptionalString | Self::OptionalNumber => true,
            Self::String | Self::Number => false,
            Self::Custom(schema) => schema.is_optional(),
        }
    }

    fn is_pass_through(&self) -> bool {
        match self {
            Self::String | Self::OptionalString => true,
            Self::Number | Self::OptionalNumber => false,
            Self::Custom(schema) => schema.name() == "string",
        }
    }

    /// Decodes a raw URL value.
    ///
    /// `Ok(None)` means the parameter is legitimately absent: either no raw
    /// value was given, or the value was `null`, and the codec is optional.
    /// A custom schema that decodes to `null` also yields `Ok(None)`.
    pub fn decode(&self, raw: Option<&str>) -> Result<Option<Value>, DecodeError> {
        let Some(raw) = raw else {
            return if self.is_optional() {
                Ok(None)
            } else {
                Err(DecodeError::Missing)
            };
        };

        if self.is_pass_through() {
            return Ok(Some(Value::String(raw.to_string())));
        }

        let value = string_to_value(raw);
        if value.is_null() && self.is_optional() {
            return Ok(None);
        }

        match self {
            Self::Custom(schema) => {
                schema
                    .decode(&value)
                    .map(|decoded| (!decoded.is_null()).then_some(decoded))
                    .map_err(|reason| DecodeError::Rejected {
                        schema: schema.name().to_string(),
                        reason,
                    })
            }
            _ if self.validate(&value) => Ok(Some(value)),
            _ => Err(DecodeError::TypeMismatch {
                expected: "number",
                found: kind_of(&value).to_string(),
            }),
        }
    }

    /// Encodes a value for use in a URL. `None` omits the parameter.
    pub fn encode(&self, value: &Value) -> Option<String> {
        match self {
            Self::Custom(schema) => schema.encode(value),
            _ => encode_value(value),
        }
    }

    /// Structural check of an already parsed value.
    pub fn validate(&self, value: &Value) -> bool {
        match self {
            Self::String => value.is_string(),
            Self::OptionalString => value.is_string() || value.is_null(),
            Self::Number => value.is_number(),
            Self::OptionalNumber => value.is_number() || value.is_null(),
            Self::Custom(schema) => {
                (value.is_null() && schema.is_optional()) || schema.decode(value).is_ok()
            }
        }
    }
}

impl PartialEq for ParamType {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Custom(a), Self::Custom(b)) => Arc::ptr_eq(a, b),
            (Self::String, Self::String)
            | (Self::OptionalString, Self::OptionalString)
            | (Self::Number, Self::Number)
            | (Self::OptionalNumber, Self::OptionalNumber) => true,
            _ => false,
        }
    }
}

impl fmt::Display for ParamType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

impl FromStr for ParamType {
    type Err = RouterError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "string" => Ok(Self::String),
            "string?" => Ok(Self::OptionalString),
            "number" => Ok(Self::Number),
            "number?" => Ok(Self::OptionalNumber),
            other => Err(RouterError::UnknownParamType(other.to_string())),
        }
    }
}

impl<'de> Deserialize<'de> for ParamType {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let tag = String::deserialize(deserializer)?;
        tag.parse().map_err(serde::de::Error::custom)
    }
}

/// A schema backed by a serde type.
///
/// A value is accepted when it deserializes into `T`; the accepted value is
/// `T` serialized back, so `SerdeSchema::<u8>` rejects `300` and
/// `SerdeSchema::<Vec<u32>>` accepts `[1,2,3]`.
pub struct SerdeSchema<T> {
    name: String,
    optional: bool,
    _marker: PhantomData<fn() -> T>,
}

impl<T> SerdeSchema<T> {
    /// Creates a schema with the given name.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            optional: false,
            _marker: PhantomData,
        }
    }

    /// Allows the parameter to be absent or `null`.
    #[must_use]
    pub fn optional(mut self) -> Self {
        self.optional = true;
        self
    }
}

impl<T> fmt::Debug for SerdeSchema<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SerdeSchema")
            .field("name", &self.name)
            .field("optional", &self.optional)
            .finish()
    }
}

impl<T> Schema for SerdeSchema<T>
where
    T: Serialize + DeserializeOwned,
{
    fn name(&self) -> &str {
        &self.name
    }

    fn decode(&self, value: &Value) -> Result<Value, String> {
        let typed: T = serde_json::from_value(value.clone()).map_err(|e| e.to_string())?;
        serde_json::to_value(typed).map_err(|e| e.to_string())
    }

    fn is_optional(&self) -> bool {
        self.optional
    }
}

/// Reads a raw URL value as a JSON literal, falling back to a JSON string.
pub(crate) fn string_to_value(raw: &str) -> Value {
    serde_json::from_str(raw).unwrap_or_else(|_| Value::String(raw.to_string()))
}

/// Default wire form: strings as-is, other values as compact JSON.
pub(crate) fn encode_value(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(s) => Some(s.clone()),
        other => Some(other.to_string()),
    }
}

fn kind_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
