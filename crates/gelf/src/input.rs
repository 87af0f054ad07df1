// Copyright 2023-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! Caller-facing inputs to a log call.
//!
//! A log call takes one or two arguments ([`Args`]). Each argument is an [`Input`]: plain text,
//! a mapping of fields, or an error. Anything that can present itself as a mapping does so by
//! implementing [`AsFields`].

use std::backtrace::{Backtrace, BacktraceStatus};
use std::collections::{BTreeMap, HashMap};
use std::error::Error;
use std::fmt::Write as _;

use serde_json::{Map, Value};

use crate::errors::NotifyError;

/// Key of a caller-supplied field.
///
/// `Symbol` keys stand for identifiers that are stringified on the way into a record; a symbol
/// and a string with the same text in one mapping are ambiguous and rejected by the builder.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum FieldKey {
    Text(String),
    Symbol(String),
}

impl FieldKey {
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            FieldKey::Text(s) | FieldKey::Symbol(s) => s,
        }
    }
}

/// An ordered list of caller-supplied fields, keyed by string or symbol.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Fields {
    entries: Vec<(FieldKey, Value)>,
}

impl Fields {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a string-keyed field. A repeated string key replaces the earlier value.
    #[must_use]
    pub fn with(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.insert(FieldKey::Text(key.into()), value.into());
        self
    }

    /// Adds a symbol-keyed field.
    #[must_use]
    pub fn with_symbol(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.insert(FieldKey::Symbol(key.into()), value.into());
        self
    }

    pub fn insert(&mut self, key: FieldKey, value: Value) {
        match self.entries.iter_mut().find(|(k, _)| *k == key) {
            Some((_, existing)) => *existing = value,
            None => self.entries.push((key, value)),
        }
    }

    #[must_use]
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.entries
            .iter()
            .find(|(k, _)| k.as_str() == key)
            .map(|(_, v)| v)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Converts every key to a string.
    ///
    /// Fails with `InvalidArgument` when a symbol key stringifies to a string key that is also
    /// present.
    pub fn stringify(&self) -> Result<Map<String, Value>, NotifyError> {
        let mut map = Map::new();
        for (key, value) in &self.entries {
            if let FieldKey::Symbol(name) = key {
                let clashes = self
                    .entries
                    .iter()
                    .any(|(other, _)| matches!(other, FieldKey::Text(text) if text == name));
                if clashes {
                    return Err(NotifyError::InvalidArgument(format!(
                        "key '{name}' is present both as a symbol and as a string"
                    )));
                }
            }
            map.insert(key.as_str().to_string(), value.clone());
        }
        Ok(map)
    }
}

impl FromIterator<(String, Value)> for Fields {
    fn from_iter<I: IntoIterator<Item = (String, Value)>>(iter: I) -> Self {
        let mut fields = Fields::new();
        for (key, value) in iter {
            fields.insert(FieldKey::Text(key), value);
        }
        fields
    }
}

/// Capability of values that can present themselves as a field mapping.
pub trait AsFields {
    fn as_fields(&self) -> Fields;
}

impl AsFields for Fields {
    fn as_fields(&self) -> Fields {
        self.clone()
    }
}

impl AsFields for Map<String, Value> {
    fn as_fields(&self) -> Fields {
        self.iter().map(|(k, v)| (k.clone(), v.clone())).collect()
    }
}

impl<V: Clone + Into<Value>, S> AsFields for HashMap<String, V, S> {
    fn as_fields(&self) -> Fields {
        self.iter()
            .map(|(k, v)| (k.clone(), Into::<Value>::into(v.clone())))
            .collect()
    }
}

impl<V: Clone + Into<Value>> AsFields for BTreeMap<String, V> {
    fn as_fields(&self) -> Fields {
        self.iter()
            .map(|(k, v)| (k.clone(), Into::<Value>::into(v.clone())))
            .collect()
    }
}

/// An error value reduced to what a record needs from it.
#[derive(Clone, Debug, PartialEq)]
pub struct ErrorInput {
    pub type_name: String,
    pub message: String,
    /// Messages of the error's `source()` chain, outermost first.
    pub causes: Vec<String>,
    /// Rendered backtrace, if one was captured.
    pub backtrace: Option<String>,
}

impl ErrorInput {
    pub fn new(type_name: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            type_name: type_name.into(),
            message: message.into(),
            causes: Vec::new(),
            backtrace: None,
        }
    }

    #[must_use]
    pub fn with_backtrace(mut self, backtrace: impl Into<String>) -> Self {
        self.backtrace = Some(backtrace.into());
        self
    }

    /// Captures an error, naming it after the last path segment of its Rust type.
    pub fn from_error<E: Error + 'static>(err: &E) -> Self {
        let mut input = Self::new(short_type_name::<E>(), err.to_string());
        let mut source = err.source();
        while let Some(cause) = source {
            input.causes.push(cause.to_string());
            source = cause.source();
        }
        input
    }

    /// Like [`ErrorInput::from_error`], also rendering `backtrace` when it was captured.
    ///
    /// A disabled or unsupported backtrace leaves the record with the "not available" note.
    pub fn from_error_with_backtrace<E: Error + 'static>(
        err: &E,
        backtrace: &Backtrace,
    ) -> Self {
        let input = Self::from_error(err);
        match backtrace.status() {
            BacktraceStatus::Captured => input.with_backtrace(backtrace.to_string()),
            _ => input,
        }
    }

    /// `"<TypeName>: <message>"`
    #[must_use]
    pub fn short_message(&self) -> String {
        format!("{}: {}", self.type_name, self.message)
    }

    /// Message, cause chain and backtrace, or a note that no backtrace is available.
    #[must_use]
    pub fn full_message(&self) -> String {
        let mut full = self.message.clone();
        for cause in &self.causes {
            let _ = write!(full, "\nCaused by: {cause}");
        }
        match &self.backtrace {
            Some(backtrace) => {
                let _ = write!(full, "\nBacktrace:\n{backtrace}");
            }
            None => full.push_str("\nBacktrace is not available."),
        }
        full
    }
}

impl From<&NotifyError> for ErrorInput {
    fn from(err: &NotifyError) -> Self {
        ErrorInput::new(err.kind(), err.to_string())
    }
}

fn short_type_name<T: ?Sized>() -> String {
    let full = std::any::type_name::<T>();
    // strip generic parameters before taking the last path segment
    let base = full.split('<').next().unwrap_or(full);
    base.rsplit("::").next().unwrap_or(base).to_string()
}

/// One argument of a log call.
#[derive(Clone, Debug, PartialEq)]
pub enum Input {
    Text(String),
    Mapping(Fields),
    Error(ErrorInput),
}

impl Input {
    pub fn mapping<T: AsFields + ?Sized>(value: &T) -> Self {
        Input::Mapping(value.as_fields())
    }

    pub fn error<E: Error + 'static>(err: &E) -> Self {
        Input::Error(ErrorInput::from_error(err))
    }
}

impl From<&str> for Input {
    fn from(text: &str) -> Self {
        Input::Text(text.to_string())
    }
}

impl From<String> for Input {
    fn from(text: String) -> Self {
        Input::Text(text)
    }
}

impl From<Fields> for Input {
    fn from(fields: Fields) -> Self {
        Input::Mapping(fields)
    }
}

impl From<Map<String, Value>> for Input {
    fn from(map: Map<String, Value>) -> Self {
        Input::Mapping(map.as_fields())
    }
}

impl From<ErrorInput> for Input {
    fn from(err: ErrorInput) -> Self {
        Input::Error(err)
    }
}

/// The positional arguments of a log call. Valid calls carry one or two.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Args(Vec<Input>);

impl Args {
    #[must_use]
    pub fn empty() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub(crate) fn into_inner(self) -> Vec<Input> {
        self.0
    }
}

impl From<Vec<Input>> for Args {
    fn from(inputs: Vec<Input>) -> Self {
        Args(inputs)
    }
}

impl From<Input> for Args {
    fn from(input: Input) -> Self {
        Args(vec![input])
    }
}

impl From<&str> for Args {
    fn from(text: &str) -> Self {
        Input::from(text).into()
    }
}

impl From<String> for Args {
    fn from(text: String) -> Self {
        Input::from(text).into()
    }
}

impl From<Fields> for Args {
    fn from(fields: Fields) -> Self {
        Input::from(fields).into()
    }
}

impl From<Map<String, Value>> for Args {
    fn from(map: Map<String, Value>) -> Self {
        Input::from(map).into()
    }
}

impl From<ErrorInput> for Args {
    fn from(err: ErrorInput) -> Self {
        Input::from(err).into()
    }
}

impl<P: Into<Input>> From<(P, Fields)> for Args {
    fn from((primary, extra): (P, Fields)) -> Self {
        Args(vec![primary.into(), Input::Mapping(extra)])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[derive(Debug)]
    struct Outer(std::io::Error);

    impl std::fmt::Display for Outer {
        fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
            write!(f, "outer failed")
        }
    }

    impl Error for Outer {
        fn source(&self) -> Option<&(dyn Error + 'static)> {
            Some(&self.0)
        }
    }

    #[test]
    fn test_stringify_converts_symbol_keys() {
        let fields = Fields::new().with_symbol("_short_message", "message");
        let map = fields.stringify().unwrap();
        assert_eq!(map.get("_short_message"), Some(&json!("message")));
    }

    #[test]
    fn test_stringify_rejects_symbol_string_collision() {
        let fields = Fields::new()
            .with_symbol("_short_message", "message1")
            .with("_short_message", "message2");
        assert!(matches!(
            fields.stringify(),
            Err(NotifyError::InvalidArgument(_))
        ));
    }

    #[test]
    fn test_repeated_string_key_replaces_value() {
        let fields = Fields::new().with("a", 1).with("a", 2);
        assert_eq!(fields.len(), 1);
        assert_eq!(fields.get("a"), Some(&json!(2)));
    }

    #[test]
    fn test_hash_map_as_fields() {
        let mut map = HashMap::new();
        map.insert("_short_message".to_string(), "message");
        let fields = map.as_fields();
        assert_eq!(fields.get("_short_message"), Some(&json!("message")));
    }

    #[test]
    fn test_error_input_from_error() {
        let err = Outer(std::io::Error::other("disk full"));
        let input = ErrorInput::from_error(&err);
        assert_eq!(input.type_name, "Outer");
        assert_eq!(input.short_message(), "Outer: outer failed");
        assert_eq!(input.causes, vec!["disk full".to_string()]);
        assert_eq!(
            input.full_message(),
            "outer failed\nCaused by: disk full\nBacktrace is not available."
        );
    }

    #[test]
    fn test_error_input_with_backtrace() {
        let input = ErrorInput::new("RuntimeError", "message").with_backtrace("at main.rs:1");
        assert_eq!(input.full_message(), "message\nBacktrace:\nat main.rs:1");
    }

    #[test]
    fn test_error_input_from_captured_backtrace() {
        let err = Outer(std::io::Error::other("disk full"));
        let backtrace = Backtrace::force_capture();
        let input = ErrorInput::from_error_with_backtrace(&err, &backtrace);
        assert_eq!(input.causes, vec!["disk full".to_string()]);
        assert_eq!(input.backtrace, Some(backtrace.to_string()));
        assert!(input.full_message().contains("\nBacktrace:\n"));
    }

    #[test]
    fn test_error_input_from_disabled_backtrace() {
        let err = Outer(std::io::Error::other("disk full"));
        let input = ErrorInput::from_error_with_backtrace(&err, &Backtrace::disabled());
        assert_eq!(input.backtrace, None);
        assert!(input.full_message().ends_with("Backtrace is not available."));
    }

    #[test]
    fn test_args_conversions() {
        assert_eq!(Args::from("message").len(), 1);
        assert_eq!(Args::from(("message", Fields::new())).len(), 2);
        assert!(Args::empty().is_empty());
    }
}
