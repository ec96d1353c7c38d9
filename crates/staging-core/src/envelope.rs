//! # Response Envelope
//!
//! Every result or failure leaving the API is wrapped in a
//! [`ResponseEnvelope`]: a `status` of `success` or `fail`, an optional
//! `data` mapping, and an optional ordered list of `errors`.
//!
//! ## Contract
//!
//! - `status` is exactly one of `"success"`, `"fail"`.
//! - `data` is null or a mapping.
//! - `errors` is null or a sequence of text; a non-text element is a
//!   construction error, reported immediately.
//! - [`ResponseEnvelope::to_map`] always yields exactly the three keys
//!   `status`, `data`, `errors`, null-preserving.
//!
//! The typed setters make most violations unrepresentable; the
//! `*_value` setters accept untyped JSON and validate it, which is the
//! path used when an envelope is built from externally supplied values.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::ValidationError;

/// Envelope status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Status {
    Success,
    Fail,
}

impl Status {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Success => "success",
            Self::Fail => "fail",
        }
    }
}

impl std::str::FromStr for Status {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "success" => Ok(Self::Success),
            "fail" => Ok(Self::Fail),
            other => Err(ValidationError::InvalidStatus(other.to_string())),
        }
    }
}

impl std::fmt::Display for Status {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Validated success/fail wrapper for an API result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Value", into = "Value")]
pub struct ResponseEnvelope {
    status: Status,
    data: Option<Map<String, Value>>,
    errors: Option<Vec<String>>,
}

impl ResponseEnvelope {
    /// Construct an envelope with the given status and no data or errors.
    pub fn new(status: Status) -> Self {
        Self {
            status,
            data: None,
            errors: None,
        }
    }

    /// A `success` envelope carrying `data`.
    pub fn success(data: Map<String, Value>) -> Self {
        Self {
            status: Status::Success,
            data: Some(data),
            errors: None,
        }
    }

    /// A `fail` envelope carrying a single error message.
    pub fn fail(message: impl Into<String>) -> Self {
        Self {
            status: Status::Fail,
            data: None,
            errors: Some(vec![message.into()]),
        }
    }

    /// Construct from untyped parts, validating each one.
    ///
    /// # Errors
    ///
    /// Returns the first [`ValidationError`] encountered, checking
    /// `status`, then `data`, then `errors`.
    pub fn from_parts(status: &str, data: Value, errors: Value) -> Result<Self, ValidationError> {
        let mut envelope = Self::new(status.parse()?);
        envelope.set_data_value(data)?;
        envelope.set_errors_value(errors)?;
        Ok(envelope)
    }

    pub fn status(&self) -> Status {
        self.status
    }

    pub fn data(&self) -> Option<&Map<String, Value>> {
        self.data.as_ref()
    }

    pub fn errors(&self) -> Option<&[String]> {
        self.errors.as_deref()
    }

    pub fn set_status(&mut self, status: Status) {
        self.status = status;
    }

    /// Set `status` from text.
    ///
    /// # Errors
    ///
    /// [`ValidationError::InvalidStatus`] unless `status` is `"success"` or `"fail"`.
    pub fn set_status_str(&mut self, status: &str) -> Result<(), ValidationError> {
        self.status = status.parse()?;
        Ok(())
    }

    pub fn set_data(&mut self, data: Option<Map<String, Value>>) {
        self.data = data;
    }

    /// Set `data` from an untyped value.
    ///
    /// # Errors
    ///
    /// [`ValidationError::DataNotMapping`] for anything but null or an object.
    pub fn set_data_value(&mut self, data: Value) -> Result<(), ValidationError> {
        self.data = match data {
            Value::Null => None,
            Value::Object(map) => Some(map),
            _ => return Err(ValidationError::DataNotMapping),
        };
        Ok(())
    }

    /// Replace `errors`. `None` clears them.
    pub fn set_errors<I, S>(&mut self, errors: Option<I>)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.errors = errors.map(|e| e.into_iter().map(Into::into).collect());
    }

    /// Set `errors` from an untyped value.
    ///
    /// Null clears the errors. Otherwise the value must be an array and
    /// every element is passed through [`Self::add_error_value`]. On
    /// failure the envelope's previous errors are left untouched.
    ///
    /// # Errors
    ///
    /// [`ValidationError::ErrorsNotIterable`] if the value is not an array,
    /// [`ValidationError::ErrorNotText`] if any element is not a string.
    pub fn set_errors_value(&mut self, errors: Value) -> Result<(), ValidationError> {
        let items = match errors {
            Value::Null => {
                self.errors = None;
                return Ok(());
            }
            Value::Array(items) => items,
            _ => return Err(ValidationError::ErrorsNotIterable),
        };
        let mut staged = Self::new(self.status);
        staged.errors = Some(Vec::with_capacity(items.len()));
        for item in items {
            staged.add_error_value(item)?;
        }
        self.errors = staged.errors;
        Ok(())
    }

    /// Append one error message, creating the list if absent.
    pub fn add_error(&mut self, error: impl Into<String>) {
        self.errors.get_or_insert_with(Vec::new).push(error.into());
    }

    /// Append one untyped error element.
    ///
    /// # Errors
    ///
    /// [`ValidationError::ErrorNotText`] unless the value is a string.
    pub fn add_error_value(&mut self, error: Value) -> Result<(), ValidationError> {
        match error {
            Value::String(s) => {
                self.add_error(s);
                Ok(())
            }
            _ => Err(ValidationError::ErrorNotText),
        }
    }

    /// Serialize to a mapping with exactly `status`, `data` and `errors`.
    pub fn to_map(&self) -> Map<String, Value> {
        let mut map = Map::with_capacity(3);
        map.insert("status".into(), Value::String(self.status.as_str().into()));
        map.insert(
            "data".into(),
            self.data.clone().map(Value::Object).unwrap_or(Value::Null),
        );
        map.insert(
            "errors".into(),
            self.errors
                .as_ref()
                .map(|e| Value::Array(e.iter().cloned().map(Value::String).collect()))
                .unwrap_or(Value::Null),
        );
        map
    }
}

impl From<ResponseEnvelope> for Value {
    fn from(envelope: ResponseEnvelope) -> Self {
        Value::Object(envelope.to_map())
    }
}

impl TryFrom<Value> for ResponseEnvelope {
    type Error = ValidationError;

    fn try_from(value: Value) -> Result<Self, Self::Error> {
        let Value::Object(mut map) = value else {
            return Err(ValidationError::NotAnEnvelope);
        };
        let status = match map.remove("status") {
            Some(Value::String(s)) => s,
            Some(other) => return Err(ValidationError::InvalidStatus(other.to_string())),
            None => return Err(ValidationError::InvalidStatus(String::new())),
        };
        Self::from_parts(
            &status,
            map.remove("data").unwrap_or(Value::Null),
            map.remove("errors").unwrap_or(Value::Null),
        )
    }
}
