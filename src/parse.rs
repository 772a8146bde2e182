/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2023-2025 ByteDance and/or its affiliates.
 */

//! The response parser (component D): rebuilds a structured reply from a
//! complete ICAP reply byte stream, including any embedded HTTP request
//! and/or response.

use crate::error::{IcapError, Result};
use crate::headers::{self, HeaderMap, HTTP_VERSION, ICAP_VERSION};
use crate::http::{HttpRequest, HttpResponse};

/// A parsed ICAP reply.
#[derive(Debug)]
pub struct IcapReply {
    pub status_code: u16,
    pub status_text: String,
    /// `-1` means the server did not advertise a preview size.
    pub preview_bytes: i64,
    pub headers: HeaderMap,
    pub http_request: Option<HttpRequest>,
    pub http_response: Option<HttpResponse>,
}

/// Walks `buf` line by line, yielding each line with its CRLF/LF stripped
/// and tracking the byte offset immediately following it.
struct LineCursor<'a> {
    buf: &'a [u8],
    pos: usize,
}

impl<'a> LineCursor<'a> {
    fn new(buf: &'a [u8]) -> Self {
        LineCursor { buf, pos: 0 }
    }

    fn next_line(&mut self) -> Option<&'a [u8]> {
        if self.pos >= self.buf.len() {
            return None;
        }
        match memchr::memchr(b'\n', &self.buf[self.pos..]) {
            Some(rel) => {
                let mut line = &self.buf[self.pos..self.pos + rel];
                if line.last() == Some(&b'\r') {
                    line = &line[..line.len() - 1];
                }
                self.pos += rel + 1;
                Some(line)
            }
            None => {
                let line = &self.buf[self.pos..];
                self.pos = self.buf.len();
                Some(line)
            }
        }
    }
}

fn as_text(line: &[u8]) -> Result<&str> {
    std::str::from_utf8(line).map_err(|_| IcapError::InvalidTcpMessage("non-utf8 line".into()))
}

pub fn parse(buf: &[u8]) -> Result<IcapReply> {
    let mut cur = LineCursor::new(buf);

    let status_line = cur
        .next_line()
        .ok_or_else(|| IcapError::InvalidTcpMessage("empty reply".into()))?;
    let status_text = as_text(status_line)?;
    if !headers::is_request_line(status_text) {
        return Err(IcapError::InvalidTcpMessage(status_text.to_string()));
    }
    let mut parts = status_text.splitn(3, ' ');
    let version = parts.next().unwrap_or("");
    if version != ICAP_VERSION {
        return Err(IcapError::InvalidTcpMessage(status_text.to_string()));
    }
    let code_str = parts
        .next()
        .ok_or_else(|| IcapError::InvalidTcpMessage(status_text.to_string()))?;
    let status_code: u16 = atoi::atoi(code_str.as_bytes())
        .filter(|c| (100..=599).contains(c))
        .ok_or_else(|| IcapError::InvalidTcpMessage(format!("bad status code {code_str:?}")))?;
    let status_text_reason = parts.next().unwrap_or("").to_string();

    let mut icap_headers = HeaderMap::new();
    let mut preview_bytes: i64 = -1;
    while let Some(line) = cur.next_line() {
        if line.is_empty() {
            break;
        }
        let text = as_text(line)?;
        let Some((name, value)) = headers::get_header_val(text) else {
            return Err(IcapError::InvalidTcpMessage(format!(
                "malformed icap header {text:?}"
            )));
        };
        if name.eq_ignore_ascii_case(headers::names::PREVIEW) {
            preview_bytes = atoi::atoi(value.as_bytes()).unwrap_or(-1);
        }
        icap_headers.insert(name, value);
    }

    let mut http_request = None;
    let mut http_response = None;
    let mut offset = cur.pos;

    while offset < buf.len() {
        let region = &buf[offset..];
        let mut probe = LineCursor::new(region);
        let Some(start_line) = probe.next_line() else {
            break;
        };
        if start_line.is_empty() {
            offset += probe.pos;
            continue;
        }
        let start_text = as_text(start_line)?;
        if !headers::is_request_line(start_text) {
            return Err(IcapError::Parse(format!(
                "expected a start-line in encapsulated region, got {start_text:?}"
            )));
        }

        let is_http_response = start_text.starts_with(HTTP_VERSION);
        let is_http_request = !is_http_response
            && start_text
                .split(' ')
                .rfind(|s| !s.is_empty())
                .map(|t| t.trim_end_matches(['\r', '\n']) == HTTP_VERSION)
                .unwrap_or(false);
        if !is_http_response && !is_http_request {
            return Err(IcapError::Parse(format!(
                "unrecognized start-line {start_text:?}"
            )));
        }

        // find the blank line ending the header block
        let mut header_end = probe.pos;
        loop {
            match probe.next_line() {
                Some([]) => break,
                Some(_) => header_end = probe.pos,
                None => {
                    header_end = probe.pos;
                    break;
                }
            }
        }
        let body_start = probe.pos;
        let head_block = &region[..header_end];

        if is_http_response {
            let mut resp = HttpResponse::parse_head(head_block)?;
            let consumed = attach_body(region, body_start, &mut resp.body)?;
            http_response = Some(resp);
            offset += consumed;
        } else {
            let mut req = HttpRequest::parse_head(head_block)?;
            let consumed = attach_body(region, body_start, &mut req.body)?;
            http_request = Some(req);
            offset += consumed;
        }
    }

    Ok(IcapReply {
        status_code,
        status_text: status_text_reason,
        preview_bytes,
        headers: icap_headers,
        http_request,
        http_response,
    })
}

/// Decodes a chunked body, if any bytes remain after the header block and
/// those bytes aren't themselves the start-line of the next encapsulated
/// section (the RESPMOD "req-hdr, res-hdr, res-body" layout has no body
/// between the request and response header blocks). Returns the total
/// number of region bytes consumed by this submessage.
fn attach_body(region: &[u8], body_start: usize, slot: &mut Option<bytes::Bytes>) -> Result<usize> {
    if body_start >= region.len() {
        return Ok(body_start);
    }
    if let Some(next_line) = LineCursor::new(&region[body_start..]).next_line() {
        if let Ok(text) = as_text(next_line) {
            if headers::is_request_line(text) {
                return Ok(body_start);
            }
        }
    }
    let (body, consumed) = crate::chunked::decode(&region[body_start..])?;
    *slot = Some(body);
    Ok(body_start + consumed)
}
