/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2023-2025 ByteDance and/or its affiliates.
 */

//! Minimal HTTP/1.1 request and response representations: just enough to
//! serialize an embedded message for the builder and rebuild one from the
//! parser. Not a general-purpose HTTP implementation.

pub mod request;
pub mod response;

pub use request::HttpRequest;
pub use response::HttpResponse;

use crate::error::{IcapError, Result};
use crate::headers::HeaderMap;

/// Splits a raw header block (request-line/status-line plus header lines,
/// each `CRLF`-terminated, no trailing blank line) into its start-line and
/// parsed headers.
pub(crate) fn split_head(block: &[u8]) -> Result<(&str, HeaderMap)> {
    let text =
        std::str::from_utf8(block).map_err(|_| IcapError::Parse("non-utf8 header block".into()))?;
    let mut lines = text.split("\r\n");
    let start_line = lines
        .next()
        .ok_or_else(|| IcapError::Parse("empty header block".into()))?;

    let mut headers = HeaderMap::new();
    for line in lines {
        if line.is_empty() {
            continue;
        }
        let Some((name, value)) = crate::headers::get_header_val(line) else {
            return Err(IcapError::Parse(format!("malformed header line {line:?}")));
        };
        headers.insert(name, value);
    }
    Ok((start_line, headers))
}

/// Serializes `headers`, stripping hop-by-hop fields, terminated by a
/// blank line.
pub(crate) fn serialize_headers(headers: &HeaderMap, out: &mut Vec<u8>) {
    for (name, value) in headers.iter() {
        if crate::headers::is_hop_by_hop(name) {
            continue;
        }
        out.extend_from_slice(name.as_bytes());
        out.extend_from_slice(b": ");
        out.extend_from_slice(value.as_bytes());
        out.extend_from_slice(b"\r\n");
    }
    out.extend_from_slice(b"\r\n");
}
