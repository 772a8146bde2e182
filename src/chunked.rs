/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2023-2025 ByteDance and/or its affiliates.
 */

//! HTTP/1.1 chunked transfer coding (RFC 7230 §4.1), used to frame every
//! body the builder emits and to decode every body the parser reads back:
//! ICAP always carries bodies chunk-encoded in the encapsulated region,
//! independent of how the origin message was actually encoded.

use bytes::Bytes;

use crate::error::{IcapError, Result};

pub const DEFAULT_CHUNK_LEN: usize = 512;

/// Appends `data` to `out` as one or more HTTP chunks of at most
/// `chunk_len` bytes each. Does not write the terminating chunk.
pub fn encode_chunks(data: &[u8], chunk_len: usize, out: &mut Vec<u8>) {
    for piece in data.chunks(chunk_len.max(1)) {
        write_chunk(piece, out);
    }
}

fn write_chunk(piece: &[u8], out: &mut Vec<u8>) {
    out.extend_from_slice(format!("{:x}", piece.len()).as_bytes());
    out.extend_from_slice(b"\r\n");
    out.extend_from_slice(piece);
    out.extend_from_slice(b"\r\n");
}

/// Writes the plain terminating chunk: `0\r\n\r\n`.
pub fn write_terminator(out: &mut Vec<u8>) {
    out.extend_from_slice(b"0\r\n\r\n");
}

/// Writes the early-ieof terminator: `0; ieof\r\n\r\n`, telling an ICAP
/// server that a preview already contained the entire body.
pub fn write_ieof_terminator(out: &mut Vec<u8>) {
    out.extend_from_slice(b"0; ieof\r\n\r\n");
}

/// Decodes a chunked body starting at `buf[0]`. Returns the decoded bytes
/// and the number of input bytes consumed (including the terminating
/// chunk and its trailing CRLF CRLF).
pub fn decode(buf: &[u8]) -> Result<(Bytes, usize)> {
    let mut pos = 0usize;
    let mut body = Vec::new();

    loop {
        let line_end = find_crlf(buf, pos)
            .ok_or_else(|| IcapError::Parse("truncated chunk size line".into()))?;
        let size_line = std::str::from_utf8(&buf[pos..line_end])
            .map_err(|_| IcapError::Parse("non-utf8 chunk size line".into()))?;
        // a chunk-size line may carry extensions after ';' (e.g. "0; ieof")
        let size_token = size_line.split(';').next().unwrap_or("").trim();
        let size = usize::from_str_radix(size_token, 16)
            .map_err(|_| IcapError::Parse(format!("invalid chunk size {size_token:?}")))?;
        pos = line_end + 2;

        if size == 0 {
            // terminator: optional trailer headers, then the final CRLF
            loop {
                let end = find_crlf(buf, pos)
                    .ok_or_else(|| IcapError::Parse("truncated chunk trailer".into()))?;
                if end == pos {
                    pos = end + 2;
                    return Ok((Bytes::from(body), pos));
                }
                pos = end + 2;
            }
        }

        if pos + size + 2 > buf.len() {
            return Err(IcapError::Parse("truncated chunk body".into()));
        }
        body.extend_from_slice(&buf[pos..pos + size]);
        pos += size;
        if &buf[pos..pos + 2] != b"\r\n" {
            return Err(IcapError::Parse("missing chunk trailing CRLF".into()));
        }
        pos += 2;
    }
}

fn find_crlf(buf: &[u8], from: usize) -> Option<usize> {
    memchr::memmem::find(&buf[from..], b"\r\n").map(|i| from + i)
}
