// Copyright 2023-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! Chunked GELF framing.
//!
//! A payload that fits in one datagram is sent as-is. A larger payload is split into chunks,
//! each prefixed by a 12 byte header:
//!
//! ```text
//! [0x1e 0x0f][message id: 8 bytes][sequence index: 1 byte][chunk count: 1 byte][payload...]
//! ```

use crate::errors::NotifyError;

pub const CHUNK_MAGIC: [u8; 2] = [0x1e, 0x0f];
pub const MESSAGE_ID_SIZE: usize = 8;
pub const CHUNK_HEADER_SIZE: usize = CHUNK_MAGIC.len() + MESSAGE_ID_SIZE + 2;
/// Most chunks a GELF receiver will reassemble.
pub const MAX_CHUNKS: usize = 128;

pub type MessageId = [u8; MESSAGE_ID_SIZE];

/// The datagrams for one record, in sequence order.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ChunkSet {
    message_id: Option<MessageId>,
    datagrams: Vec<Vec<u8>>,
}

impl ChunkSet {
    /// Message id shared by all chunks, `None` for an unframed single datagram.
    #[must_use]
    pub fn message_id(&self) -> Option<MessageId> {
        self.message_id
    }

    #[must_use]
    pub fn is_chunked(&self) -> bool {
        self.message_id.is_some()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.datagrams.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.datagrams.is_empty()
    }

    #[must_use]
    pub fn datagrams(&self) -> &[Vec<u8>] {
        &self.datagrams
    }
}

/// Splits `payload` into datagrams of at most `max_datagram_size` bytes, with a fresh random
/// message id when chunking is needed.
pub fn chunk(
    payload: Vec<u8>,
    max_datagram_size: usize,
    max_chunks: usize,
) -> Result<ChunkSet, NotifyError> {
    if payload.len() <= max_datagram_size {
        return Ok(unchunked(payload));
    }
    chunk_with_id(payload, max_datagram_size, max_chunks, rand::random())
}

/// Like [`chunk`], with a caller-supplied message id.
pub fn chunk_with_id(
    payload: Vec<u8>,
    max_datagram_size: usize,
    max_chunks: usize,
    message_id: MessageId,
) -> Result<ChunkSet, NotifyError> {
    if payload.len() <= max_datagram_size {
        return Ok(unchunked(payload));
    }

    let budget = max_datagram_size.saturating_sub(CHUNK_HEADER_SIZE);
    if budget == 0 {
        return Err(NotifyError::InvalidArgument(format!(
            "max datagram size {max_datagram_size} leaves no room for payload after the \
             {CHUNK_HEADER_SIZE} byte chunk header"
        )));
    }

    // the chunk count travels in a single byte
    let max_chunks = max_chunks.min(u8::MAX as usize);
    let count = payload.len().div_ceil(budget);
    if count > max_chunks {
        return Err(NotifyError::PayloadTooLarge {
            chunks: count,
            max_chunks,
        });
    }

    let datagrams = payload
        .chunks(budget)
        .enumerate()
        .map(|(index, slice)| {
            let mut datagram = Vec::with_capacity(CHUNK_HEADER_SIZE + slice.len());
            datagram.extend_from_slice(&CHUNK_MAGIC);
            datagram.extend_from_slice(&message_id);
            // both fit: index < count <= max_chunks <= u8::MAX
            datagram.push(index as u8);
            datagram.push(count as u8);
            datagram.extend_from_slice(slice);
            datagram
        })
        .collect();

    Ok(ChunkSet {
        message_id: Some(message_id),
        datagrams,
    })
}

fn unchunked(payload: Vec<u8>) -> ChunkSet {
    ChunkSet {
        message_id: None,
        datagrams: vec![payload],
    }
}
