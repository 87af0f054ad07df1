// Copyright 2023-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! GELF severity levels.
//!
//! Levels are ordered from least to most severe and travel on the wire as integers:
//! - **DEBUG** = 0
//! - **INFO** = 1
//! - **WARN** = 2
//! - **ERROR** = 3
//! - **FATAL** = 4
//! - **UNKNOWN** = 5, used for records describing a failure of the notifier itself
//!
//! A notifier threshold can be set from a `Level`, from its number, or from its name
//! (case-insensitive).

use std::str::FromStr;

use derive_more::Display;
use serde_json::Value;

use crate::errors::NotifyError;

/// Record severity, ordered from least to most severe.
///
/// ```
/// use gelf::level::Level;
///
/// assert_eq!("warn".parse::<Level>().unwrap(), Level::Warn);
/// assert_eq!(Level::try_from(3u8).unwrap(), Level::Error);
/// assert!(Level::Debug < Level::Fatal);
/// ```
#[derive(Clone, Copy, Debug, Display, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
#[repr(u8)]
pub enum Level {
    #[display("DEBUG")]
    Debug = 0,
    #[default]
    #[display("INFO")]
    Info = 1,
    #[display("WARN")]
    Warn = 2,
    #[display("ERROR")]
    Error = 3,
    #[display("FATAL")]
    Fatal = 4,
    #[display("UNKNOWN")]
    Unknown = 5,
}

impl Level {
    pub const ALL: [Level; 6] = [
        Level::Debug,
        Level::Info,
        Level::Warn,
        Level::Error,
        Level::Fatal,
        Level::Unknown,
    ];

    #[must_use]
    pub fn as_u8(self) -> u8 {
        self as u8
    }

    /// Numeric severity of a `_level` record value.
    ///
    /// Integers are taken as-is, numeric strings are parsed, and anything else counts as 0
    /// so that malformed levels are never filtered above DEBUG.
    #[must_use]
    pub fn numeric_value(value: &Value) -> i64 {
        match value {
            Value::Number(n) => n
                .as_i64()
                .or_else(|| n.as_f64().map(|f| f as i64))
                .unwrap_or_default(),
            Value::String(s) => s.trim().parse::<i64>().unwrap_or_default(),
            _ => 0,
        }
    }
}

impl From<Level> for Value {
    fn from(level: Level) -> Value {
        Value::from(level.as_u8())
    }
}

impl TryFrom<u8> for Level {
    type Error = NotifyError;

    fn try_from(value: u8) -> Result<Self, NotifyError> {
        Level::ALL
            .into_iter()
            .find(|level| level.as_u8() == value)
            .ok_or_else(|| {
                NotifyError::InvalidArgument(format!(
                    "invalid level: {value}. Valid levels are 0 (DEBUG) to 5 (UNKNOWN)"
                ))
            })
    }
}

impl TryFrom<i64> for Level {
    type Error = NotifyError;

    fn try_from(value: i64) -> Result<Self, NotifyError> {
        u8::try_from(value)
            .map_err(|_| NotifyError::InvalidArgument(format!("invalid level: {value}")))
            .and_then(Level::try_from)
    }
}

impl TryFrom<&str> for Level {
    type Error = NotifyError;

    fn try_from(value: &str) -> Result<Self, NotifyError> {
        value.parse()
    }
}

impl FromStr for Level {
    type Err = NotifyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "debug" => Ok(Level::Debug),
            "info" => Ok(Level::Info),
            "warn" | "warning" => Ok(Level::Warn),
            "error" => Ok(Level::Error),
            "fatal" => Ok(Level::Fatal),
            "unknown" => Ok(Level::Unknown),
            other => match other.parse::<u8>() {
                Ok(n) => Level::try_from(n),
                Err(_) => Err(NotifyError::InvalidArgument(format!(
                    "invalid level: '{s}'. Valid levels are: debug, info, warn, error, fatal, unknown"
                ))),
            },
        }
    }
}
