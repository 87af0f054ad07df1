// Copyright 2023-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

use std::env;
use std::str::FromStr;

use tracing::error;

use crate::chunker::MAX_CHUNKS;
use crate::compressor::DEFAULT_COMPRESSION_LEVEL;
use crate::errors::NotifyError;
use crate::input::Fields;
use crate::level::Level;
use crate::record::DEFAULT_FACILITY;

pub const DEFAULT_HOST: &str = "localhost";
pub const DEFAULT_PORT: u16 = 12201;

/// Largest datagram the notifier will send.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum MaxChunkSize {
    /// 1420 bytes, safe across the internet.
    #[default]
    Wan,
    /// 8154 bytes, for local networks with jumbo-ish MTUs.
    Lan,
    Custom(usize),
}

impl MaxChunkSize {
    #[must_use]
    pub fn bytes(self) -> usize {
        match self {
            MaxChunkSize::Wan => 1420,
            MaxChunkSize::Lan => 8154,
            MaxChunkSize::Custom(size) => size,
        }
    }
}

impl From<usize> for MaxChunkSize {
    fn from(size: usize) -> Self {
        MaxChunkSize::Custom(size)
    }
}

/// Accepts `wan`, `lan` (case-insensitive) or a number of bytes; fractions are truncated.
impl FromStr for MaxChunkSize {
    type Err = NotifyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        match trimmed.to_lowercase().as_str() {
            "wan" => Ok(MaxChunkSize::Wan),
            "lan" => Ok(MaxChunkSize::Lan),
            _ => match trimmed.parse::<f64>() {
                Ok(size) if size.is_finite() && size >= 1.0 => {
                    Ok(MaxChunkSize::Custom(size.trunc() as usize))
                }
                _ => Err(NotifyError::InvalidArgument(format!(
                    "invalid max chunk size: '{s}'. Expected wan, lan or a positive number"
                ))),
            },
        }
    }
}

/// Notifier configuration.
#[derive(Clone, Debug)]
pub struct NotifierConfig {
    /// Destination host (e.g., "graylog.example.com")
    pub host: String,
    /// Destination UDP port
    pub port: u16,
    pub max_chunk_size: MaxChunkSize,
    pub max_chunks: usize,
    /// Fields merged into every record below the call's own fields.
    pub default_options: Fields,
    /// Records below this level are dropped.
    pub level: Level,
    /// Value for `_facility` when no other source sets it.
    pub facility: String,
    /// Overrides the resolved machine hostname for `_host`.
    pub hostname: Option<String>,
    /// zlib level, 0-9
    pub compression_level: u32,
}

impl Default for NotifierConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
            max_chunk_size: MaxChunkSize::default(),
            max_chunks: MAX_CHUNKS,
            default_options: Fields::new(),
            level: Level::Debug,
            facility: DEFAULT_FACILITY.to_string(),
            hostname: None,
            compression_level: DEFAULT_COMPRESSION_LEVEL,
        }
    }
}

impl NotifierConfig {
    /// Reads `GELF_*` environment variables over the defaults.
    ///
    /// Unparseable values are logged and ignored.
    #[must_use]
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Ok(host) = env::var("GELF_HOST") {
            config.host = host;
        }
        if let Some(port) = parse_env::<u16>("GELF_PORT") {
            config.port = port;
        }
        if let Some(size) = parse_env::<MaxChunkSize>("GELF_MAX_CHUNK_SIZE") {
            config.max_chunk_size = size;
        }
        if let Some(level) = parse_env::<Level>("GELF_LEVEL") {
            config.level = level;
        }
        if let Ok(facility) = env::var("GELF_FACILITY") {
            config.facility = facility;
        }
        config.hostname = env::var("GELF_HOSTNAME").ok().filter(|h| !h.is_empty());
        if let Some(level) = parse_env::<u32>("GELF_COMPRESSION_LEVEL") {
            config.compression_level = level;
        }
        if let Ok(tags) = env::var("GELF_TAGS") {
            config.default_options = parse_tags(&tags);
        }

        config
    }
}

fn parse_env<T>(name: &str) -> Option<T>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    let value = env::var(name).ok()?;
    match value.parse::<T>() {
        Ok(parsed) => Some(parsed),
        Err(e) => {
            error!("Ignoring {name}='{value}': {e}");
            None
        }
    }
}

/// Parses `key:value` pairs into default fields.
///
/// Pairs are space-separated; commas are accepted as separators too. Only the first `:` splits,
/// so values may contain colons. Pairs without a key are skipped.
#[must_use]
pub fn parse_tags(tags: &str) -> Fields {
    let normalized = tags.replace(',', " ");
    let mut fields = Fields::new();
    for kv in normalized.split_whitespace() {
        match kv.split_once(':') {
            Some((key, value)) if !key.is_empty() => {
                fields = fields.with(key, value);
            }
            _ => error!("Ignoring malformed tag '{kv}', expected key:value"),
        }
    }
    fields
}
