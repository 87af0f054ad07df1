// Copyright 2023-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

use flate2::read::ZlibDecoder;
use gelf::chunker::{CHUNK_HEADER_SIZE, CHUNK_MAGIC};
use gelf::config::{MaxChunkSize, NotifierConfig};
use gelf::input::{ErrorInput, Fields};
use gelf::level::Level;
use gelf::notifier::Notifier;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde_json::{json, Value};
use std::collections::BTreeMap;
use std::io::Read;
use std::net::UdpSocket;
use std::time::Duration;

fn start_receiver() -> (UdpSocket, u16) {
    let socket = UdpSocket::bind("127.0.0.1:0").expect("unable to bind UDP socket");
    socket
        .set_read_timeout(Some(Duration::from_secs(2)))
        .expect("unable to set read timeout");
    let port = socket.local_addr().expect("no local address").port();
    (socket, port)
}

fn notifier(port: u16, max_chunk_size: MaxChunkSize) -> Notifier {
    Notifier::new(NotifierConfig {
        host: "127.0.0.1".to_string(),
        port,
        max_chunk_size,
        hostname: Some("integration-host".to_string()),
        ..NotifierConfig::default()
    })
    .expect("failed to create notifier")
}

fn inflate(payload: &[u8]) -> Value {
    let mut json = Vec::new();
    ZlibDecoder::new(payload)
        .read_to_end(&mut json)
        .expect("payload is not zlib");
    serde_json::from_slice(&json).expect("payload is not JSON")
}

/// Receives one record, reassembling chunks by sequence index.
fn receive_record(socket: &UdpSocket) -> (Value, usize) {
    let mut buf = vec![0u8; 65_536];
    let (n, _) = socket.recv_from(&mut buf).expect("no datagram received");
    if n < 2 || buf[..2] != CHUNK_MAGIC {
        return (inflate(&buf[..n]), 1);
    }

    let count = buf[11] as usize;
    let id = buf[2..10].to_vec();
    let mut parts = BTreeMap::new();
    parts.insert(buf[10], buf[CHUNK_HEADER_SIZE..n].to_vec());
    while parts.len() < count {
        let (n, _) = socket.recv_from(&mut buf).expect("missing chunk");
        assert_eq!(&buf[..2], &CHUNK_MAGIC);
        assert_eq!(buf[2..10].to_vec(), id, "chunk from another message");
        assert_eq!(buf[11] as usize, count);
        parts.insert(buf[10], buf[CHUNK_HEADER_SIZE..n].to_vec());
    }
    assert_eq!(
        parts.keys().copied().collect::<Vec<u8>>(),
        (0..count as u8).collect::<Vec<u8>>()
    );
    let payload: Vec<u8> = parts.into_values().flatten().collect();
    (inflate(&payload), count)
}

#[test]
fn sends_short_record_in_one_datagram() {
    let (socket, port) = start_receiver();
    let notifier = notifier(port, MaxChunkSize::Wan);

    notifier.info("hello from the integration test").unwrap();

    let (record, datagrams) = receive_record(&socket);
    assert_eq!(datagrams, 1);
    assert_eq!(record["_short_message"], json!("hello from the integration test"));
    assert_eq!(record["_level"], json!(1));
    assert_eq!(record["_host"], json!("integration-host"));
    assert_eq!(record["_version"], json!("1.0"));
    assert_eq!(record["_facility"], json!("gelf-rs"));
    assert!(record["_file"]
        .as_str()
        .unwrap()
        .ends_with("integration_test.rs"));
}

#[test]
fn sends_long_record_in_chunks() {
    let (socket, port) = start_receiver();
    let notifier = notifier(port, MaxChunkSize::Custom(512));

    let mut rng = StdRng::seed_from_u64(7);
    let noise: String = (0..4000)
        .map(|_| char::from(b'A' + rng.gen_range(0..26u8)))
        .collect();
    notifier
        .notify_strict(Fields::new().with("_short_message", "big").with("_blob", noise.clone()))
        .unwrap();

    let (record, datagrams) = receive_record(&socket);
    assert!(datagrams > 1);
    assert_eq!(record["_blob"], json!(noise));
}

#[test]
fn sends_error_records() {
    let (socket, port) = start_receiver();
    let notifier = notifier(port, MaxChunkSize::Wan);

    notifier
        .notify((
            ErrorInput::new("TimeoutError", "upstream did not answer"),
            Fields::new().with("_request_id", "abc"),
        ))
        .unwrap();

    let (record, _) = receive_record(&socket);
    assert_eq!(
        record["_short_message"],
        json!("TimeoutError: upstream did not answer")
    );
    assert_eq!(record["_level"], json!(3));
    assert_eq!(record["_request_id"], json!("abc"));
    assert!(record["_full_message"]
        .as_str()
        .unwrap()
        .contains("Backtrace is not available"));
}

#[test]
fn threshold_filters_before_sending() {
    let (socket, port) = start_receiver();
    let notifier = notifier(port, MaxChunkSize::Wan);
    notifier.set_level(Level::Warn);

    notifier.debug("dropped").unwrap();
    notifier.warn("kept").unwrap();

    let (record, _) = receive_record(&socket);
    assert_eq!(record["_short_message"], json!("kept"));
}
