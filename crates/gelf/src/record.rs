// Copyright 2023-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! Normalization of log call arguments into a canonical GELF record.
//!
//! Field precedence, highest first:
//! 1. fields derived from the primary argument (mapping fields, or the message fields of an
//!    error or text)
//! 2. fields of the optional second mapping argument
//! 3. the notifier's default options
//! 4. built-in defaults (`_version`, `_level`, `_host`, `_facility`)
//!
//! The one exception is `_level`: an error or text primary only supplies a *default* level,
//! which a `_level` in the second mapping overrides.

use std::panic::Location;
use std::sync::OnceLock;
use std::time::{SystemTime, UNIX_EPOCH};

use serde::Serialize;
use serde_json::{Map, Value};
use tracing::error;

use crate::errors::NotifyError;
use crate::input::{Args, Fields, Input};
use crate::level::Level;

pub const GELF_VERSION: &str = "1.0";
pub const DEFAULT_FACILITY: &str = "gelf-rs";

pub const VERSION_KEY: &str = "_version";
pub const SHORT_MESSAGE_KEY: &str = "_short_message";
pub const FULL_MESSAGE_KEY: &str = "_full_message";
pub const TIMESTAMP_KEY: &str = "_timestamp";
pub const LEVEL_KEY: &str = "_level";
pub const HOST_KEY: &str = "_host";
pub const FACILITY_KEY: &str = "_facility";
pub const FILE_KEY: &str = "_file";
pub const LINE_KEY: &str = "_line";

const HOPTOAD_CLASS_KEY: &str = "error_class";
const HOPTOAD_MESSAGE_KEY: &str = "error_message";

static LOCAL_HOSTNAME: OnceLock<String> = OnceLock::new();

/// Hostname of this machine, resolved on first use and memoized for the process lifetime.
pub fn local_hostname() -> &'static str {
    LOCAL_HOSTNAME.get_or_init(|| match hostname::get() {
        Ok(name) => name.to_string_lossy().into_owned(),
        Err(e) => {
            error!("Failed to resolve hostname, using localhost: {}", e);
            "localhost".to_string()
        }
    })
}

/// A canonical GELF record: string keys, JSON values, serialized in sorted key order.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct Record(Map<String, Value>);

impl Record {
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    #[must_use]
    pub fn contains_key(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    pub fn set(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        self.0.insert(key.into(), value.into());
    }

    /// Numeric severity of the record, see [`Level::numeric_value`].
    #[must_use]
    pub fn level_value(&self) -> i64 {
        self.get(LEVEL_KEY).map_or(0, Level::numeric_value)
    }

    #[must_use]
    pub fn short_message(&self) -> Option<&str> {
        self.get(SHORT_MESSAGE_KEY).and_then(Value::as_str)
    }
}

/// Builds records from log call arguments.
#[derive(Clone, Debug)]
pub struct RecordBuilder {
    default_options: Fields,
    host: String,
    facility: String,
}

impl RecordBuilder {
    pub fn new(
        default_options: Fields,
        host: impl Into<String>,
        facility: impl Into<String>,
    ) -> Self {
        Self {
            default_options,
            host: host.into(),
            facility: facility.into(),
        }
    }

    #[must_use]
    pub fn default_options(&self) -> &Fields {
        &self.default_options
    }

    /// Normalizes `args` into a record, taking `_file`/`_line` from `location` when absent.
    pub fn build(&self, args: Args, location: &Location<'_>) -> Result<Record, NotifyError> {
        let mut inputs = args.into_inner().into_iter();
        let (primary, extra) = match (inputs.next(), inputs.next(), inputs.next()) {
            (Some(primary), extra, None) => (primary, extra),
            (None, _, _) => {
                return Err(NotifyError::InvalidArgument(
                    "expected 1 or 2 arguments, got 0".to_string(),
                ))
            }
            (Some(_), _, Some(_)) => {
                return Err(NotifyError::InvalidArgument(format!(
                    "expected 1 or 2 arguments, got {}",
                    3 + inputs.count()
                )))
            }
        };

        let mut extra = match extra {
            None => Map::new(),
            Some(Input::Mapping(fields)) => fields.stringify()?,
            Some(_) => {
                return Err(NotifyError::InvalidArgument(
                    "second argument must be a mapping".to_string(),
                ))
            }
        };

        let primary = match primary {
            Input::Mapping(fields) => fields.stringify()?,
            Input::Error(err) => {
                extra
                    .entry(LEVEL_KEY)
                    .or_insert_with(|| Level::Error.into());
                let mut derived = Map::new();
                derived.insert(SHORT_MESSAGE_KEY.to_string(), err.short_message().into());
                derived.insert(FULL_MESSAGE_KEY.to_string(), err.full_message().into());
                derived
            }
            Input::Text(text) => {
                extra.entry(LEVEL_KEY).or_insert_with(|| Level::Info.into());
                let mut derived = Map::new();
                derived.insert(SHORT_MESSAGE_KEY.to_string(), text.into());
                derived
            }
        };

        let mut fields = self.default_options.stringify()?;
        fields.extend(extra);
        fields.extend(primary);

        convert_hoptoad_keys(&mut fields);
        self.insert_builtin_defaults(&mut fields);
        fields
            .entry(FILE_KEY)
            .or_insert_with(|| location.file().into());
        fields
            .entry(LINE_KEY)
            .or_insert_with(|| location.line().into());
        fields
            .entry(TIMESTAMP_KEY)
            .or_insert_with(|| unix_timestamp().into());

        check_mandatory_fields(&fields)?;
        Ok(Record(fields))
    }

    fn insert_builtin_defaults(&self, fields: &mut Map<String, Value>) {
        fields
            .entry(VERSION_KEY)
            .or_insert_with(|| GELF_VERSION.into());
        fields
            .entry(LEVEL_KEY)
            .or_insert_with(|| Level::Info.into());
        fields
            .entry(HOST_KEY)
            .or_insert_with(|| self.host.clone().into());
        fields
            .entry(FACILITY_KEY)
            .or_insert_with(|| self.facility.clone().into());
    }
}

/// Hoptoad-style `error_class`/`error_message` pairs stand in for a missing short message.
fn convert_hoptoad_keys(fields: &mut Map<String, Value>) {
    let has_short_message = fields.get(SHORT_MESSAGE_KEY).is_some_and(|v| !is_blank(v));
    if has_short_message
        || !fields.contains_key(HOPTOAD_CLASS_KEY)
        || !fields.contains_key(HOPTOAD_MESSAGE_KEY)
    {
        return;
    }
    let class = fields.remove(HOPTOAD_CLASS_KEY).unwrap_or_default();
    let message = fields.remove(HOPTOAD_MESSAGE_KEY).unwrap_or_default();
    fields.insert(
        SHORT_MESSAGE_KEY.to_string(),
        format!("{}: {}", value_to_string(&class), value_to_string(&message)).into(),
    );
}

fn check_mandatory_fields(fields: &Map<String, Value>) -> Result<(), NotifyError> {
    for key in [VERSION_KEY, SHORT_MESSAGE_KEY, HOST_KEY] {
        if fields.get(key).map_or(true, is_blank) {
            return Err(NotifyError::InvalidArgument(format!(
                "{key} is missing. Options version, short_message and host must be set"
            )));
        }
    }
    Ok(())
}

fn is_blank(value: &Value) -> bool {
    value_to_string(value).is_empty()
}

fn value_to_string(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn unix_timestamp() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or_default()
}
