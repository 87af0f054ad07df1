// Copyright 2023-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

#![cfg_attr(not(test), deny(clippy::panic))]
#![cfg_attr(not(test), deny(clippy::unwrap_used))]
#![cfg_attr(not(test), deny(clippy::expect_used))]
#![cfg_attr(not(test), deny(clippy::todo))]
#![cfg_attr(not(test), deny(clippy::unimplemented))]

use std::env;
use std::process::ExitCode;

use tracing::{debug, error, info};
use tracing_subscriber::EnvFilter;

use gelf::config::NotifierConfig;
use gelf::level::Level;
use gelf::notifier::Notifier;

pub fn main() -> ExitCode {
    let log_level = env::var("GELF_LOG_LEVEL")
        .map(|val| val.to_lowercase())
        .unwrap_or("info".to_string());

    let env_filter = match EnvFilter::try_new(&log_level) {
        Ok(filter) => filter,
        Err(e) => {
            eprintln!("could not parse GELF_LOG_LEVEL '{log_level}': {e}");
            EnvFilter::new("info")
        }
    };
    let subscriber = tracing_subscriber::fmt::Subscriber::builder()
        .with_env_filter(env_filter)
        .with_level(true)
        .with_thread_names(false)
        .with_thread_ids(false)
        .with_line_number(false)
        .with_file(false)
        .with_target(true)
        .without_time()
        .with_writer(std::io::stderr)
        .finish();

    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("setting default subscriber failed: {e}");
    }
    debug!("Logging subsystem enabled");

    let message = env::args().skip(1).collect::<Vec<String>>().join(" ");
    if message.is_empty() {
        error!("Usage: gelf-send <message>. Configure with GELF_HOST, GELF_PORT, GELF_MESSAGE_LEVEL, ...");
        return ExitCode::FAILURE;
    }

    // the record level, independent of the GELF_LEVEL threshold
    let message_level = match env::var("GELF_MESSAGE_LEVEL") {
        Ok(level) => match level.parse::<Level>() {
            Ok(level) => Some(level),
            Err(e) => {
                error!("Ignoring GELF_MESSAGE_LEVEL: {e}");
                None
            }
        },
        Err(_) => None,
    };

    let config = NotifierConfig::from_env();
    let destination = format!("{}:{}", config.host, config.port);
    let notifier = match Notifier::new(config) {
        Ok(notifier) => notifier,
        Err(e) => {
            error!("Error creating notifier for {destination}: {e}");
            return ExitCode::FAILURE;
        }
    };

    match notifier.notify_at(message_level, message) {
        Ok(()) => {
            info!("Sent GELF message to {destination}");
            ExitCode::SUCCESS
        }
        Err(e) => {
            error!("Failed to send GELF message to {destination}: {e}");
            ExitCode::FAILURE
        }
    }
}
