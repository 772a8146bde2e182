/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2023-2025 ByteDance and/or its affiliates.
 */

/// ICAP/HTTP version literals recognized when classifying a start-line.
pub const ICAP_VERSION: &str = "ICAP/1.0";
pub const HTTP_VERSION: &str = "HTTP/1.1";

/// Header names an OPTIONS reply commonly carries. Not parsed into typed
/// fields; kept as constants so callers can look them up by name without
/// retyping the RFC 3507 header strings.
pub mod names {
    pub const METHODS: &str = "Methods";
    pub const ALLOW: &str = "Allow";
    pub const SERVICE: &str = "Service";
    pub const ISTAG: &str = "ISTag";
    pub const OPT_BODY_TYPE: &str = "Opt-body-type";
    pub const MAX_CONNECTIONS: &str = "Max-Connections";
    pub const OPTIONS_TTL: &str = "Options-TTL";
    pub const SERVICE_ID: &str = "Service-ID";
    pub const TRANSFER_PREVIEW: &str = "Transfer-Preview";
    pub const TRANSFER_IGNORE: &str = "Transfer-Ignore";
    pub const TRANSFER_COMPLETE: &str = "Transfer-Complete";
    pub const PREVIEW: &str = "Preview";
    pub const ENCAPSULATED: &str = "Encapsulated";
    pub const PROXY_AUTHENTICATE: &str = "Proxy-Authenticate";
    pub const PROXY_AUTHORIZATION: &str = "Proxy-Authorization";
}

/// Headers whose meaning is local to one transport hop and must not be
/// forwarded verbatim across the ICAP hop (RFC 3507 §4.4.2).
const HOP_BY_HOP: &[&str] = &[
    "Connection",
    "Keep-Alive",
    "Proxy-Authenticate",
    "Proxy-Authorization",
    "Te",
    "Trailers",
    "Transfer-encoding",
    "Upgrade",
];

pub fn is_hop_by_hop(name: &str) -> bool {
    HOP_BY_HOP.iter().any(|h| h.eq_ignore_ascii_case(name))
}

/// An ordered, case-insensitive multimap of header name/value pairs.
///
/// Lookups are case-insensitive; insertion order is preserved, including
/// repeated insertions under keys that only differ in case.
#[derive(Debug, Clone, Default)]
pub struct HeaderMap {
    entries: Vec<(String, String)>,
}

impl HeaderMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.entries.push((name.into(), value.into()));
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    pub fn get_all<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a str> {
        self.entries
            .iter()
            .filter(move |(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }
}

/// True if `line` looks like a start-line: at least two spaces, and one of
/// its whitespace-separated tokens is a recognized version literal.
pub fn is_request_line(line: &str) -> bool {
    let line = line.trim_end_matches(['\r', '\n']);
    let tokens: Vec<&str> = line.split(' ').filter(|t| !t.is_empty()).collect();
    if tokens.len() < 3 {
        return false;
    }
    tokens
        .iter()
        .any(|t| *t == ICAP_VERSION || *t == HTTP_VERSION)
}

/// Splits `"Header: value"` on the first colon, trimming surrounding
/// whitespace from both sides. Returns `None` if there is no colon.
pub fn get_header_val(line: &str) -> Option<(String, String)> {
    let line = line.trim_end_matches(['\r', '\n']);
    let idx = line.find(':')?;
    let name = line[..idx].trim().to_string();
    let value = line[idx + 1..].trim().to_string();
    Some((name, value))
}
