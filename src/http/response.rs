/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2023-2025 ByteDance and/or its affiliates.
 */

use bytes::Bytes;

use super::split_head;
use crate::error::{IcapError, Result};
use crate::headers::HeaderMap;

/// An embedded HTTP response, either sent to an ICAP server (RESPMOD) or
/// rebuilt from a RESPMOD reply.
#[derive(Debug, Clone)]
pub struct HttpResponse {
    pub version: String,
    pub status_code: u16,
    pub reason: String,
    pub headers: HeaderMap,
    pub body: Option<Bytes>,
}

impl HttpResponse {
    pub fn new(status_code: u16, reason: impl Into<String>) -> Self {
        HttpResponse {
            version: "HTTP/1.1".to_string(),
            status_code,
            reason: reason.into(),
            headers: HeaderMap::new(),
            body: None,
        }
    }

    pub fn with_body(mut self, body: impl Into<Bytes>) -> Self {
        self.body = Some(body.into());
        self
    }

    pub fn header_block_len(&self) -> usize {
        self.serialize_header_block().len()
    }

    pub(crate) fn serialize_header_block(&self) -> Vec<u8> {
        let mut out = Vec::new();
        out.extend_from_slice(self.version.as_bytes());
        out.push(b' ');
        let mut buf = itoa::Buffer::new();
        out.extend_from_slice(buf.format(self.status_code).as_bytes());
        out.push(b' ');
        out.extend_from_slice(self.reason.as_bytes());
        out.extend_from_slice(b"\r\n");
        super::serialize_headers(&self.headers, &mut out);
        out
    }

    /// Parses a status-line + header block (no trailing blank line).
    pub(crate) fn parse_head(block: &[u8]) -> Result<Self> {
        let (start_line, headers) = split_head(block)?;
        let mut parts = start_line.splitn(3, ' ');
        let version = parts
            .next()
            .ok_or_else(|| IcapError::Parse("missing version in status-line".into()))?
            .to_string();
        let code_str = parts
            .next()
            .ok_or_else(|| IcapError::Parse("missing status code".into()))?;
        let status_code: u16 = code_str
            .parse()
            .map_err(|_| IcapError::Parse(format!("invalid status code {code_str:?}")))?;
        let reason = parts.next().unwrap_or("").to_string();
        Ok(HttpResponse {
            version,
            status_code,
            reason,
            headers,
            body: None,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn serializes_status_line_and_headers() {
        let mut resp = HttpResponse::new(200, "OK");
        resp.headers.insert("Content-Length", "92");
        resp.headers.insert("Transfer-encoding", "identity");
        let block = resp.serialize_header_block();
        let text = String::from_utf8(block).unwrap();
        assert!(text.starts_with("HTTP/1.1 200 OK\r\n"));
        assert!(!text.contains("Transfer-encoding"));
    }

    #[test]
    fn parses_response_head() {
        let block = b"HTTP/1.1 200 OK\r\nContent-Length: 92\r\n";
        let resp = HttpResponse::parse_head(block).unwrap();
        assert_eq!(resp.status_code, 200);
        assert_eq!(resp.reason, "OK");
        assert_eq!(resp.headers.get("Content-Length"), Some("92"));
    }
}
