/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2023-2025 ByteDance and/or its affiliates.
 */

use bytes::Bytes;

use super::split_head;
use crate::error::{IcapError, Result};
use crate::headers::HeaderMap;

/// An embedded HTTP request, either sent to an ICAP server (REQMOD/RESPMOD
/// context) or rebuilt from a REQMOD reply.
#[derive(Debug, Clone)]
pub struct HttpRequest {
    pub method: String,
    pub target: String,
    pub version: String,
    pub headers: HeaderMap,
    pub body: Option<Bytes>,
}

impl HttpRequest {
    pub fn new(method: impl Into<String>, target: impl Into<String>) -> Self {
        HttpRequest {
            method: method.into(),
            target: target.into(),
            version: "HTTP/1.1".to_string(),
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
        out.extend_from_slice(self.method.as_bytes());
        out.push(b' ');
        out.extend_from_slice(self.target.as_bytes());
        out.push(b' ');
        out.extend_from_slice(self.version.as_bytes());
        out.extend_from_slice(b"\r\n");
        super::serialize_headers(&self.headers, &mut out);
        out
    }

    /// Parses a request-line + header block (no trailing blank line).
    pub(crate) fn parse_head(block: &[u8]) -> Result<Self> {
        let (start_line, headers) = split_head(block)?;
        let mut parts = start_line.split(' ').filter(|s| !s.is_empty());
        let method = parts
            .next()
            .ok_or_else(|| IcapError::Parse("missing method in request-line".into()))?
            .to_string();
        let target = parts
            .next()
            .ok_or_else(|| IcapError::Parse("missing target in request-line".into()))?
            .to_string();
        let version = parts.next().unwrap_or("HTTP/1.1").to_string();
        Ok(HttpRequest {
            method,
            target,
            version,
            headers,
            body: None,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn serializes_request_line_and_headers() {
        let mut req = HttpRequest::new("GET", "/modified-path");
        req.headers.insert("Host", "www.origin-server.com");
        req.headers.insert("Connection", "close");
        let block = req.serialize_header_block();
        let text = String::from_utf8(block).unwrap();
        assert!(text.starts_with("GET /modified-path HTTP/1.1\r\n"));
        assert!(text.contains("Host: www.origin-server.com\r\n"));
        assert!(!text.contains("Connection"));
        assert!(text.ends_with("\r\n\r\n"));
    }

    #[test]
    fn parses_request_head() {
        let block = b"GET /modified-path HTTP/1.1\r\nHost: www.origin-server.com\r\n";
        let req = HttpRequest::parse_head(block).unwrap();
        assert_eq!(req.method, "GET");
        assert_eq!(req.target, "/modified-path");
        assert_eq!(req.headers.get("Host"), Some("www.origin-server.com"));
    }
}
