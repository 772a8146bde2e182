/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2023-2025 ByteDance and/or its affiliates.
 */

//! Scans an `Encapsulated:` header value for the largest section offset,
//! and builds the section list the message builder needs to emit one.

/// A single `label=offset` entry of an `Encapsulated` header value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SectionLabel {
    ReqHdr,
    ReqBody,
    ResHdr,
    ResBody,
    NullBody,
    OptBody,
}

impl SectionLabel {
    fn as_str(&self) -> &'static str {
        match self {
            SectionLabel::ReqHdr => "req-hdr",
            SectionLabel::ReqBody => "req-body",
            SectionLabel::ResHdr => "res-hdr",
            SectionLabel::ResBody => "res-body",
            SectionLabel::NullBody => "null-body",
            SectionLabel::OptBody => "opt-body",
        }
    }
}

/// An ordered `(label, offset)` list, rendered as the value of an
/// `Encapsulated:` header.
#[derive(Debug, Default)]
pub struct SectionList {
    sections: Vec<(SectionLabel, usize)>,
}

impl SectionList {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, label: SectionLabel, offset: usize) -> &mut Self {
        self.sections.push((label, offset));
        self
    }

    pub fn render(&self) -> String {
        let mut out = String::new();
        for (i, (label, offset)) in self.sections.iter().enumerate() {
            if i > 0 {
                out.push_str(", ");
            }
            out.push_str(label.as_str());
            out.push('=');
            let mut buf = itoa::Buffer::new();
            out.push_str(buf.format(*offset));
        }
        out
    }
}

#[derive(PartialEq, Eq)]
enum ScanState {
    Identifier,
    Number,
}

/// Returns the largest offset advertised by an `Encapsulated:` header found
/// anywhere in `buf`, or `0` if the header is absent or malformed.
///
/// Grammar (one line): `Encapsulated: <token>=<digits> (, <token>=<digits>)*`
/// Token is letters plus `-`; whitespace between tokens is ignored; `CR`
/// terminates the scan.
pub fn scan(buf: &[u8]) -> usize {
    let Some(pos) = find_header_name(buf) else {
        return 0;
    };

    let mut state = ScanState::Identifier;
    let mut num: usize = 0;
    let mut max: usize = 0;

    let mut i = pos + "Encapsulated".len();
    // skip past the colon, if present, before scanning tokens
    if buf.get(i) == Some(&b':') {
        i += 1;
    }

    while i < buf.len() {
        let c = buf[i];
        if c == b' ' || c == b'\t' {
            i += 1;
            continue;
        }
        if c == b'\r' {
            break;
        }
        match state {
            ScanState::Identifier => {
                if c == b'=' {
                    state = ScanState::Number;
                    num = 0;
                } else if c.is_ascii_alphabetic() || c == b'-' {
                    // still inside the identifier, keep scanning
                } else {
                    return 0;
                }
            }
            ScanState::Number => {
                if c.is_ascii_digit() {
                    num = num * 10 + (c - b'0') as usize;
                } else if c == b',' {
                    state = ScanState::Identifier;
                    max = max.max(num);
                } else {
                    return 0;
                }
            }
        }
        i += 1;
    }

    if state == ScanState::Number {
        max = max.max(num);
    }
    max
}

fn find_header_name(buf: &[u8]) -> Option<usize> {
    memchr::memmem::find(buf, b"Encapsulated")
}

/// Returns the label of the highest-offset (last) section named in the
/// `Encapsulated` header found in `buf`, or `None` if the header is absent
/// or malformed. Used by the transport to tell apart a `null-body` tail
/// (the message ends with the header block that precedes it) from a body
/// section (the message continues with a chunked body after it).
pub fn last_section_label(buf: &[u8]) -> Option<String> {
    let pos = find_header_name(buf)?;
    let mut i = pos + "Encapsulated".len();
    if buf.get(i) == Some(&b':') {
        i += 1;
    }
    let end = buf[i..]
        .iter()
        .position(|&c| c == b'\r')
        .map(|p| i + p)
        .unwrap_or(buf.len());
    let value = std::str::from_utf8(&buf[i..end]).ok()?;
    let last_segment = value.split(',').next_back()?;
    let label = last_segment.split('=').next()?.trim();
    if label.is_empty() {
        None
    } else {
        Some(label.to_string())
    }
}
