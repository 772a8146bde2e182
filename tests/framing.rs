/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2023-2025 ByteDance and/or its affiliates.
 */

//! Loopback tests exercising the transport's framing loop end to end,
//! against a real TCP socket rather than an in-memory buffer.

use std::net::SocketAddr;
use std::time::Duration;

use icap_client::{build, parse, Method, RequestEnvelope};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;

async fn server_writing(reply: &'static [u8], delay: Duration) -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        let (mut sock, _) = listener.accept().await.unwrap();
        for chunk in reply.chunks(32) {
            sock.write_all(chunk).await.unwrap();
            tokio::time::sleep(delay).await;
        }
    });
    addr
}

async fn echo_server_writing(reply: &'static [u8], delay: Duration) -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        let (mut sock, _) = listener.accept().await.unwrap();
        let mut scratch = [0u8; 4096];
        let _ = sock.read(&mut scratch).await;
        for chunk in reply.chunks(32) {
            sock.write_all(chunk).await.unwrap();
            tokio::time::sleep(delay).await;
        }
    });
    addr
}

const OPTIONS_REPLY: &[u8] = b"ICAP/1.0 200 OK\r\n\
Methods: RESPMOD\r\n\
ISTag: \"AAA-BBB-CCC\"\r\n\
Encapsulated: null-body=0\r\n\
Preview: 2048\r\n\r\n";

#[tokio::test]
async fn options_round_trip_over_loopback() {
    let addr = echo_server_writing(OPTIONS_REPLY, Duration::from_millis(0)).await;

    let url = icap_client::IcapUrl::parse("icap://icap.example.net/services").unwrap();
    let envelope = RequestEnvelope::new(Method::Options, url);
    let wire = build(&envelope).unwrap();
    assert!(String::from_utf8(wire).unwrap().starts_with("OPTIONS "));

    let mut transport = icap_client::IcapTransport::open(
        addr,
        Duration::from_secs(1),
        Duration::from_secs(1),
        Duration::from_secs(1),
    )
    .await
    .unwrap();
    transport.write(&build(&envelope).unwrap()).await.unwrap();
    let reply_bytes = transport.read().await.unwrap();

    let reply = parse::parse(&reply_bytes).unwrap();
    assert_eq!(reply.status_code, 200);
    assert_eq!(reply.preview_bytes, 2048);
    assert_eq!(reply.headers.get("Methods"), Some("RESPMOD"));
}

#[tokio::test]
async fn read_stops_at_the_reply_and_ignores_trailing_junk() {
    let mut wire = Vec::from(OPTIONS_REPLY);
    wire.extend_from_slice(b"JUNK AFTER THE REPLY THAT IS NOT PART OF THIS MESSAGE");
    let leaked: &'static [u8] = Box::leak(wire.into_boxed_slice());

    let addr = server_writing(leaked, Duration::from_millis(0)).await;
    let mut transport = icap_client::IcapTransport::open(
        addr,
        Duration::from_secs(1),
        Duration::from_secs(1),
        Duration::from_secs(1),
    )
    .await
    .unwrap();
    let got = transport.read().await.unwrap();
    assert_eq!(got, OPTIONS_REPLY);
}

// "HTTP/1.1 200 OK\r\n\r\n" is 19 bytes, so by invariant 1 res-body must
// advertise offset 19 (the res-hdr block's own length), not 20.
const RESPMOD_REPLY: &[u8] = b"ICAP/1.0 200 OK\r\n\
ISTag: \"AAA-BBB-CCC\"\r\n\
Encapsulated: res-hdr=0, res-body=19\r\n\r\n\
HTTP/1.1 200 OK\r\n\r\n2\r\nhi\r\n0\r\n\r\n";

#[tokio::test]
async fn read_survives_segmentation_at_every_double_crlf() {
    let addr = server_writing(RESPMOD_REPLY, Duration::from_millis(15)).await;
    let mut transport = icap_client::IcapTransport::open(
        addr,
        Duration::from_secs(2),
        Duration::from_secs(2),
        Duration::from_secs(2),
    )
    .await
    .unwrap();
    let got = transport.read().await.unwrap();
    assert_eq!(got, RESPMOD_REPLY);

    let reply = parse::parse(&got).unwrap();
    let resp = reply.http_response.unwrap();
    assert_eq!(resp.body.unwrap().as_ref(), b"hi");
}

#[tokio::test]
async fn read_stops_at_a_body_reply_and_ignores_trailing_junk() {
    let mut wire = Vec::from(RESPMOD_REPLY);
    wire.extend_from_slice(b"JUNK AFTER THE REPLY THAT IS NOT PART OF THIS MESSAGE");
    let leaked: &'static [u8] = Box::leak(wire.into_boxed_slice());

    let addr = server_writing(leaked, Duration::from_millis(0)).await;
    let mut transport = icap_client::IcapTransport::open(
        addr,
        Duration::from_secs(1),
        Duration::from_secs(1),
        Duration::from_secs(1),
    )
    .await
    .unwrap();
    let got = transport.read().await.unwrap();
    assert_eq!(got, RESPMOD_REPLY);
}
