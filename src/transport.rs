/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2023-2025 ByteDance and/or its affiliates.
 */

//! The transport (component A): a byte stream over TCP with read/write
//! deadlines, and a framing-aware read loop that knows when a full ICAP
//! reply has arrived without relying on a single "double CRLF" sentinel.

use std::net::SocketAddr;
use std::time::Duration;

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use tokio::time::Instant;

use crate::encapsulated;
use crate::error::{IcapError, Result};

/// Matches `original_source/transport.go`'s `MaxReadSocketLength`: the
/// chunk size used for each individual socket read in the framing loop.
const READ_CHUNK_LEN: usize = 1096;

/// A single TCP connection to an ICAP service.
///
/// Not `Clone`: one transport is owned by one logical caller at a time.
/// Multi-connection usage means instantiating more than one `IcapTransport`.
pub struct IcapTransport {
    stream: Option<TcpStream>,
    read_deadline: Instant,
    write_deadline: Instant,
}

impl IcapTransport {
    /// Dials `addr`, then computes absolute read/write deadlines from
    /// `read_timeout`/`write_timeout`. The deadlines are fixed at this
    /// point; they are not extended by subsequent activity on the socket.
    pub async fn open(
        addr: SocketAddr,
        dial_timeout: Duration,
        read_timeout: Duration,
        write_timeout: Duration,
    ) -> Result<Self> {
        let stream = tokio::time::timeout(dial_timeout, TcpStream::connect(addr))
            .await
            .map_err(|_| IcapError::Timeout)?
            .map_err(IcapError::Connect)?;
        let now = Instant::now();
        Ok(IcapTransport {
            stream: Some(stream),
            read_deadline: now + read_timeout,
            write_deadline: now + write_timeout,
        })
    }

    /// Like [`Self::open`], but `cancel` can resolve first to abort the
    /// dial. Cancellation after a successful open is expressed by dropping
    /// or closing the transport from the outside.
    pub async fn open_with_cancellation(
        addr: SocketAddr,
        dial_timeout: Duration,
        read_timeout: Duration,
        write_timeout: Duration,
        cancel: impl std::future::Future<Output = ()>,
    ) -> Result<Self> {
        tokio::select! {
            biased;
            _ = cancel => Err(IcapError::Io(std::io::Error::new(std::io::ErrorKind::Interrupted, "dial cancelled"))),
            res = Self::open(addr, dial_timeout, read_timeout, write_timeout) => res,
        }
    }

    fn stream_mut(&mut self) -> Result<&mut TcpStream> {
        self.stream.as_mut().ok_or(IcapError::ConnectionNotOpen)
    }

    /// Writes `data` in full before the write deadline elapses. A partial
    /// write (deadline elapsed mid-write) is surfaced as an error; callers
    /// must treat short writes as failures, not as a cue to retry.
    pub async fn write(&mut self, data: &[u8]) -> Result<usize> {
        let deadline = self.write_deadline;
        let stream = self.stream_mut()?;
        tokio::time::timeout_at(deadline, stream.write_all(data))
            .await
            .map_err(|_| IcapError::Timeout)??;
        log::trace!("wrote {} bytes to icap server", data.len());
        Ok(data.len())
    }

    /// Reads until the reply framing rule says the message is complete.
    ///
    /// A reply can contain more than one `CRLF CRLF`: one ending the ICAP
    /// header block, and (unless the encapsulated region is empty) another
    /// ending its last section. So a bare "ends in double CRLF" check is
    /// ambiguous, and a whole-buffer suffix check is wrong too: a reply and
    /// unrelated trailing junk can arrive in the same read, and the junk
    /// itself may not end in CRLF CRLF while the real reply boundary,
    /// earlier in the buffer, does.
    ///
    /// Once the ICAP header block's terminating blank line has arrived,
    /// the `Encapsulated` header gives the byte offset of the last
    /// section, measured from the start of the encapsulated region. If
    /// that section is `null-body`, it carries no bytes of its own and the
    /// reply ends exactly there. Otherwise it is a chunked body, and the
    /// reply ends wherever that chunked body's own terminator does —
    /// found by attempting to decode it, not by guessing a length.
    pub async fn read(&mut self) -> Result<Vec<u8>> {
        let deadline = self.read_deadline;
        let stream = self.stream_mut()?;

        let mut data = Vec::new();
        let mut chunk = [0u8; READ_CHUNK_LEN];
        loop {
            let n = tokio::time::timeout_at(deadline, stream.read(&mut chunk))
                .await
                .map_err(|_| IcapError::Timeout)??;
            if n == 0 {
                log::trace!("icap server closed connection after {} bytes", data.len());
                break;
            }
            data.extend_from_slice(&chunk[..n]);

            let Some(header_end) = memchr::memmem::find(&data, b"\r\n\r\n").map(|i| i + 4) else {
                continue;
            };
            let body_start = header_end + encapsulated::scan(&data);
            let has_trailing_body = encapsulated::last_section_label(&data)
                .is_some_and(|label| label != "null-body");

            if !has_trailing_body {
                if data.len() < body_start {
                    continue;
                }
                data.truncate(body_start);
                break;
            }

            if data.len() < body_start {
                continue;
            }
            if let Ok((_, consumed)) = crate::chunked::decode(&data[body_start..]) {
                data.truncate(body_start + consumed);
                break;
            }
        }
        log::trace!("read {} bytes from icap server", data.len());
        Ok(data)
    }

    /// Closes the connection. Idempotent only in the sense that a second
    /// call, after the first succeeded, returns [`IcapError::ConnectionNotOpen`]:
    /// the core guarantees at most one real close per successful open.
    pub async fn close(&mut self) -> Result<()> {
        let mut stream = self.stream.take().ok_or(IcapError::ConnectionNotOpen)?;
        stream.shutdown().await?;
        Ok(())
    }
}
