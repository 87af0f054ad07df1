// Copyright 2023-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! GELF notifier: builds a record from the call arguments, compresses it, chunks it and hands
//! the datagrams to a transport.
//!
//! Every call runs synchronously on the caller's thread. The only state shared between calls
//! is the enabled flag and the level threshold, both atomics owned by the notifier.

use std::panic::Location;
use std::sync::atomic::{AtomicBool, AtomicU8, Ordering};

use tracing::{debug, error, trace};

use crate::chunker;
use crate::compressor::Compressor;
use crate::config::NotifierConfig;
use crate::errors::NotifyError;
use crate::input::{Args, ErrorInput, Fields};
use crate::level::Level;
use crate::record::{local_hostname, Record, RecordBuilder, LEVEL_KEY};
use crate::sender::{Transport, UdpSender};

pub struct Notifier<T: Transport = UdpSender> {
    host: String,
    port: u16,
    max_chunk_size: usize,
    max_chunks: usize,
    builder: RecordBuilder,
    compressor: Compressor,
    transport: T,
    enabled: AtomicBool,
    level: AtomicU8,
}

impl Notifier<UdpSender> {
    /// Creates a notifier sending over UDP to `config.host:config.port`.
    pub fn new(config: NotifierConfig) -> Result<Self, NotifyError> {
        let transport = UdpSender::new(&config.host, config.port)?;
        Ok(Self::with_transport(config, transport))
    }
}

impl<T: Transport> Notifier<T> {
    pub fn with_transport(config: NotifierConfig, transport: T) -> Self {
        let hostname = config
            .hostname
            .unwrap_or_else(|| local_hostname().to_string());
        Notifier {
            host: config.host,
            port: config.port,
            max_chunk_size: config.max_chunk_size.bytes(),
            max_chunks: config.max_chunks,
            builder: RecordBuilder::new(config.default_options, hostname, config.facility),
            compressor: Compressor::new(config.compression_level),
            transport,
            enabled: AtomicBool::new(true),
            level: AtomicU8::new(config.level.as_u8()),
        }
    }

    #[must_use]
    pub fn host(&self) -> &str {
        &self.host
    }

    #[must_use]
    pub fn port(&self) -> u16 {
        self.port
    }

    #[must_use]
    pub fn max_chunk_size(&self) -> usize {
        self.max_chunk_size
    }

    #[must_use]
    pub fn default_options(&self) -> &Fields {
        self.builder.default_options()
    }

    #[must_use]
    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn enable(&self) {
        self.enabled.store(true, Ordering::Release);
    }

    pub fn disable(&self) {
        self.enabled.store(false, Ordering::Release);
    }

    #[must_use]
    pub fn is_enabled(&self) -> bool {
        self.enabled.load(Ordering::Acquire)
    }

    /// Current threshold.
    #[must_use]
    pub fn level(&self) -> Level {
        Level::try_from(self.level.load(Ordering::Acquire)).unwrap_or_default()
    }

    pub fn set_level(&self, level: Level) {
        self.level.store(level.as_u8(), Ordering::Release);
    }

    /// Sets the threshold from a level number or a case-insensitive level name.
    ///
    /// An invalid value leaves the threshold unchanged.
    pub fn set_level_from(
        &self,
        level: impl TryInto<Level, Error = NotifyError>,
    ) -> Result<(), NotifyError> {
        self.set_level(level.try_into()?);
        Ok(())
    }

    /// Sends a record, replacing any failure by an UNKNOWN record describing that failure.
    ///
    /// Only an error raised while sending the replacement is returned.
    #[track_caller]
    pub fn notify(&self, args: impl Into<Args>) -> Result<(), NotifyError> {
        self.notify_with_level(None, args.into(), Location::caller())
    }

    /// Sends a record, returning every error.
    #[track_caller]
    pub fn notify_strict(&self, args: impl Into<Args>) -> Result<(), NotifyError> {
        self.notify_with_level_strict(None, args.into(), Location::caller())
    }

    #[track_caller]
    pub fn debug(&self, args: impl Into<Args>) -> Result<(), NotifyError> {
        self.notify_with_level(Some(Level::Debug), args.into(), Location::caller())
    }

    #[track_caller]
    pub fn info(&self, args: impl Into<Args>) -> Result<(), NotifyError> {
        self.notify_with_level(Some(Level::Info), args.into(), Location::caller())
    }

    #[track_caller]
    pub fn warn(&self, args: impl Into<Args>) -> Result<(), NotifyError> {
        self.notify_with_level(Some(Level::Warn), args.into(), Location::caller())
    }

    #[track_caller]
    pub fn error(&self, args: impl Into<Args>) -> Result<(), NotifyError> {
        self.notify_with_level(Some(Level::Error), args.into(), Location::caller())
    }

    #[track_caller]
    pub fn fatal(&self, args: impl Into<Args>) -> Result<(), NotifyError> {
        self.notify_with_level(Some(Level::Fatal), args.into(), Location::caller())
    }

    #[track_caller]
    pub fn unknown(&self, args: impl Into<Args>) -> Result<(), NotifyError> {
        self.notify_with_level(Some(Level::Unknown), args.into(), Location::caller())
    }

    /// Non-strict entry point for an arbitrary level, `None` keeping the record's own level.
    #[track_caller]
    pub fn notify_at(
        &self,
        level: Option<Level>,
        args: impl Into<Args>,
    ) -> Result<(), NotifyError> {
        self.notify_with_level(level, args.into(), Location::caller())
    }

    fn notify_with_level(
        &self,
        level: Option<Level>,
        args: Args,
        location: &Location<'_>,
    ) -> Result<(), NotifyError> {
        match self.notify_with_level_strict(level, args, location) {
            Err(e) => {
                error!("Failed to notify, sending failure record instead: {}", e);
                let failure = Args::from(ErrorInput::from(&e));
                self.notify_with_level_strict(Some(Level::Unknown), failure, location)
            }
            Ok(()) => Ok(()),
        }
    }

    fn notify_with_level_strict(
        &self,
        level: Option<Level>,
        args: Args,
        location: &Location<'_>,
    ) -> Result<(), NotifyError> {
        if !self.is_enabled() {
            return Ok(());
        }

        let mut record = self.builder.build(args, location)?;
        if let Some(level) = level {
            record.set(LEVEL_KEY, level);
        }

        let threshold = i64::from(self.level.load(Ordering::Acquire));
        if record.level_value() < threshold {
            trace!(
                "Dropping record with level {} below threshold {}",
                record.level_value(),
                threshold
            );
            return Ok(());
        }

        self.send(&record)
    }

    fn send(&self, record: &Record) -> Result<(), NotifyError> {
        let compressed = self.compressor.compress(record)?;
        let chunks = chunker::chunk(compressed, self.max_chunk_size, self.max_chunks)?;
        debug!(
            "Sending GELF record '{}' as {} datagram(s)",
            record.short_message().unwrap_or_default(),
            chunks.len()
        );
        self.transport.send_datagrams(chunks.datagrams())?;
        Ok(())
    }
}
