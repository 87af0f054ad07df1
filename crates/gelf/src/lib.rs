// Copyright 2023-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! GELF notifier.
//!
//! Turns log calls (text, field mappings or errors) into GELF records, compresses them with
//! zlib and ships them over UDP, splitting payloads that do not fit one datagram into chunks.
//!
//! ```no_run
//! use gelf::input::Fields;
//! use gelf::level::Level;
//! use gelf::notifier::Notifier;
//! use gelf::config::NotifierConfig;
//!
//! let notifier = Notifier::new(NotifierConfig::default()).expect("failed to create notifier");
//! notifier.set_level(Level::Info);
//! notifier.warn("disk usage above 90%").expect("send failed");
//! notifier
//!     .notify(("user signed in", Fields::new().with("_user_id", 42)))
//!     .expect("send failed");
//! ```

#![cfg_attr(not(test), deny(clippy::panic))]
#![cfg_attr(not(test), deny(clippy::unwrap_used))]
#![cfg_attr(not(test), deny(clippy::expect_used))]
#![cfg_attr(not(test), deny(clippy::todo))]
#![cfg_attr(not(test), deny(clippy::unimplemented))]

pub mod chunker;
pub mod compressor;
pub mod config;
pub mod errors;
pub mod input;
pub mod level;
pub mod notifier;
pub mod record;
pub mod sender;
