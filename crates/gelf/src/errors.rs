// Copyright 2023-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! Error types for the GELF notifier.

/// Errors returned by the notifier pipeline.
#[derive(Debug, thiserror::Error)]
pub enum NotifyError {
    /// The call was malformed: wrong arity, ambiguous keys, or missing mandatory fields.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),
    /// Even full chunking cannot fit the payload in the maximum number of chunks.
    #[error("payload too large: {chunks} chunks needed, at most {max_chunks} allowed")]
    PayloadTooLarge { chunks: usize, max_chunks: usize },
    /// Serialization or compression failed.
    #[error("internal error: {0}")]
    Internal(String),
    /// The transport could not send a datagram.
    #[error("transport error: {0}")]
    Transport(#[from] std::io::Error),
}

impl NotifyError {
    /// Short kind name, used as the type name of the failure record sent by `notify`.
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Self::InvalidArgument(_) => "InvalidArgument",
            Self::PayloadTooLarge { .. } => "PayloadTooLarge",
            Self::Internal(_) => "InternalError",
            Self::Transport(_) => "TransportError",
        }
    }
}
