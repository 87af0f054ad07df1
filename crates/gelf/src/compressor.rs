// Copyright 2023-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

use std::io::Write;

use flate2::write::ZlibEncoder;
use flate2::Compression;

use crate::errors::NotifyError;
use crate::record::Record;

pub const DEFAULT_COMPRESSION_LEVEL: u32 = 6;

/// Serializes records to JSON and zlib-compresses them.
#[derive(Clone, Copy, Debug)]
pub struct Compressor {
    level: Compression,
}

impl Default for Compressor {
    fn default() -> Self {
        Self::new(DEFAULT_COMPRESSION_LEVEL)
    }
}

impl Compressor {
    /// Levels above 9 are clamped to 9.
    #[must_use]
    pub fn new(level: u32) -> Self {
        Self {
            level: Compression::new(level.min(9)),
        }
    }

    pub fn serialize(record: &Record) -> Result<Vec<u8>, NotifyError> {
        serde_json::to_vec(record)
            .map_err(|e| NotifyError::Internal(format!("failed to serialize record: {e}")))
    }

    pub fn compress(&self, record: &Record) -> Result<Vec<u8>, NotifyError> {
        let json = Self::serialize(record)?;
        let mut encoder = ZlibEncoder::new(Vec::with_capacity(json.len() / 2), self.level);
        encoder
            .write_all(&json)
            .map_err(|e| NotifyError::Internal(format!("failed to compress record: {e}")))?;
        encoder
            .finish()
            .map_err(|e| NotifyError::Internal(format!("failed to compress record: {e}")))
    }
}
