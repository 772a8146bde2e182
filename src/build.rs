/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2023-2025 ByteDance and/or its affiliates.
 */

//! The message builder (component C): turns a [`RequestEnvelope`] into the
//! exact bytes to write to the wire, including bit-exact `Encapsulated`
//! offsets and chunked body framing.

use crate::chunked::{self, DEFAULT_CHUNK_LEN};
use crate::encapsulated::{SectionLabel, SectionList};
use crate::envelope::RequestEnvelope;
use crate::error::Result;
use crate::headers::names;
use crate::method::Method;

/// Builds the wire bytes for one ICAP request using the default 512-byte
/// chunk length.
pub fn build(envelope: &RequestEnvelope) -> Result<Vec<u8>> {
    build_with_chunk_len(envelope, DEFAULT_CHUNK_LEN)
}

pub fn build_with_chunk_len(envelope: &RequestEnvelope, chunk_len: usize) -> Result<Vec<u8>> {
    envelope.validate()?;

    let req_block = envelope.http_request.as_ref().map(|r| r.serialize_header_block());
    let resp_block = envelope
        .http_response
        .as_ref()
        .map(|r| r.serialize_header_block());

    let body: Option<&[u8]> = match envelope.method {
        Method::Reqmod => envelope.http_request.as_ref().and_then(|r| r.body.as_deref()),
        Method::Respmod => envelope.http_response.as_ref().and_then(|r| r.body.as_deref()),
        Method::Options => None,
    };

    let mut sections = SectionList::new();
    match envelope.method {
        Method::Options => {
            sections.push(SectionLabel::NullBody, 0);
        }
        Method::Reqmod => {
            let req_len = req_block.as_ref().map(|b| b.len()).unwrap_or(0);
            sections.push(SectionLabel::ReqHdr, 0);
            if body.is_some() {
                sections.push(SectionLabel::ReqBody, req_len);
            } else {
                sections.push(SectionLabel::NullBody, req_len);
            }
        }
        Method::Respmod => {
            let req_len = req_block.as_ref().map(|b| b.len()).unwrap_or(0);
            let resp_len = resp_block.as_ref().map(|b| b.len()).unwrap_or(0);
            if req_block.is_some() {
                sections.push(SectionLabel::ReqHdr, 0);
            }
            sections.push(SectionLabel::ResHdr, req_len);
            if body.is_some() {
                sections.push(SectionLabel::ResBody, req_len + resp_len);
            } else {
                sections.push(SectionLabel::NullBody, req_len + resp_len);
            }
        }
    }

    let mut out = Vec::new();
    out.extend_from_slice(envelope.method.as_str().as_bytes());
    out.push(b' ');
    out.extend_from_slice(envelope.url.request_target().as_bytes());
    out.extend_from_slice(b" ICAP/1.0\r\n");

    out.extend_from_slice(b"Host: ");
    out.extend_from_slice(host_header_value(&envelope.url).as_bytes());
    out.extend_from_slice(b"\r\n");

    for (name, value) in envelope.icap_headers.iter() {
        out.extend_from_slice(name.as_bytes());
        out.extend_from_slice(b": ");
        out.extend_from_slice(value.as_bytes());
        out.extend_from_slice(b"\r\n");
    }

    let embedded_headers = [
        envelope.http_request.as_ref().map(|r| &r.headers),
        envelope.http_response.as_ref().map(|r| &r.headers),
    ];
    for proxy_header in [names::PROXY_AUTHENTICATE, names::PROXY_AUTHORIZATION] {
        for block_headers in embedded_headers.iter().flatten() {
            if let Some(v) = block_headers.get(proxy_header) {
                out.extend_from_slice(proxy_header.as_bytes());
                out.extend_from_slice(b": ");
                out.extend_from_slice(v.as_bytes());
                out.extend_from_slice(b"\r\n");
            }
        }
    }

    let preview = if body.is_some() { envelope.preview } else { None };
    if let Some(p) = preview {
        out.extend_from_slice(names::PREVIEW.as_bytes());
        out.extend_from_slice(b": ");
        let mut buf = itoa::Buffer::new();
        out.extend_from_slice(buf.format(p).as_bytes());
        out.extend_from_slice(b"\r\n");
    }

    out.extend_from_slice(names::ENCAPSULATED.as_bytes());
    out.extend_from_slice(b": ");
    out.extend_from_slice(sections.render().as_bytes());
    out.extend_from_slice(b"\r\n");
    out.extend_from_slice(b"\r\n");

    if let Some(block) = &req_block {
        out.extend_from_slice(block);
    }
    if let Some(block) = &resp_block {
        out.extend_from_slice(block);
    }

    if let Some(body) = body {
        match preview {
            None => {
                chunked::encode_chunks(body, chunk_len, &mut out);
                chunked::write_terminator(&mut out);
            }
            Some(p) if p >= body.len() => {
                chunked::encode_chunks(body, chunk_len, &mut out);
                chunked::write_ieof_terminator(&mut out);
            }
            Some(p) => {
                chunked::encode_chunks(&body[..p], chunk_len, &mut out);
                chunked::write_terminator(&mut out);
            }
        }
    }

    Ok(out)
}

/// Builds the wire bytes for the remainder of a previewed body, to be
/// written after the server's `100 Continue` reply: the bytes from `P`
/// onward, chunk-framed, followed by the plain terminator.
pub fn build_preview_continuation(remaining: &[u8], chunk_len: usize) -> Vec<u8> {
    let mut out = Vec::new();
    chunked::encode_chunks(remaining, chunk_len, &mut out);
    chunked::write_terminator(&mut out);
    out
}

fn host_header_value(url: &crate::url::IcapUrl) -> String {
    if url.port() == 1344 {
        url.host().to_string()
    } else {
        format!("{}:{}", url.host(), url.port())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::envelope::RequestEnvelope;
    use crate::http::{HttpRequest, HttpResponse};
    use crate::url::IcapUrl;

    fn url() -> IcapUrl {
        IcapUrl::parse("icap://icap.example.net/reqmod").unwrap()
    }

    #[test]
    fn options_has_null_body_at_zero() {
        let env = RequestEnvelope::new(Method::Options, url());
        let bytes = build(&env).unwrap();
        let text = String::from_utf8(bytes).unwrap();
        assert!(text.starts_with("OPTIONS icap://icap.example.net/reqmod ICAP/1.0\r\n"));
        assert!(text.contains("Encapsulated: null-body=0\r\n"));
        assert!(text.ends_with("\r\n\r\n"));
    }

    #[test]
    fn reqmod_headers_only_offsets_match_request_block_len() {
        let mut req = HttpRequest::new("GET", "/");
        req.headers.insert("Host", "www.origin-server.com");
        let env = RequestEnvelope::new(Method::Reqmod, url()).with_http_request(req.clone());
        let bytes = build(&env).unwrap();
        let text = String::from_utf8(bytes).unwrap();
        let expected = format!("Encapsulated: req-hdr=0, null-body={}\r\n", req.header_block_len());
        assert!(text.contains(&expected), "{text}");
    }

    #[test]
    fn reqmod_with_body_uses_req_body_label_and_chunks_it() {
        let req = HttpRequest::new("POST", "/").with_body(&b"hello world"[..]);
        let env = RequestEnvelope::new(Method::Reqmod, url()).with_http_request(req.clone());
        let bytes = build(&env).unwrap();
        let text = String::from_utf8(bytes).unwrap();
        let expected = format!("Encapsulated: req-hdr=0, req-body={}\r\n", req.header_block_len());
        assert!(text.contains(&expected));
        assert!(text.contains("b\r\nhello world\r\n0\r\n\r\n"));
    }

    #[test]
    fn respmod_offsets_sum_request_and_response_block_lens() {
        let mut req = HttpRequest::new("GET", "/");
        req.headers.insert("Host", "www.origin-server.com");
        let resp = HttpResponse::new(200, "OK").with_body(&b"payload"[..]);
        let env = RequestEnvelope::new(Method::Respmod, url())
            .with_http_request(req.clone())
            .with_http_response(resp.clone());
        let bytes = build(&env).unwrap();
        let text = String::from_utf8(bytes).unwrap();
        let expected = format!(
            "Encapsulated: req-hdr=0, res-hdr={}, res-body={}\r\n",
            req.header_block_len(),
            req.header_block_len() + resp.header_block_len()
        );
        assert!(text.contains(&expected), "{text}");
    }

    #[test]
    fn hop_by_hop_headers_are_stripped_from_embedded_blocks() {
        let mut req = HttpRequest::new("GET", "/");
        req.headers.insert("Connection", "keep-alive");
        req.headers.insert("Transfer-encoding", "chunked");
        req.headers.insert("Host", "www.origin-server.com");
        let env = RequestEnvelope::new(Method::Reqmod, url()).with_http_request(req);
        let bytes = build(&env).unwrap();
        let text = String::from_utf8(bytes).unwrap();
        assert!(!text.contains("Connection"));
        assert!(!text.contains("Transfer-encoding"));
        assert!(text.contains("Host: www.origin-server.com"));
    }

    #[test]
    fn proxy_headers_are_promoted_to_icap_level() {
        let mut req = HttpRequest::new("GET", "/");
        req.headers.insert("Proxy-Authorization", "Basic abc");
        let env = RequestEnvelope::new(Method::Reqmod, url()).with_http_request(req);
        let bytes = build(&env).unwrap();
        let text = String::from_utf8(bytes).unwrap();
        // promoted once at the ICAP level, and stripped from the embedded block
        assert_eq!(text.matches("Proxy-Authorization: Basic abc").count(), 1);
        let icap_part = text.split("\r\n\r\n").next().unwrap();
        assert!(icap_part.contains("Proxy-Authorization: Basic abc"));
    }

    #[test]
    fn preview_full_body_emits_ieof() {
        let req = HttpRequest::new("POST", "/").with_body(&b"short"[..]);
        let env = RequestEnvelope::new(Method::Reqmod, url())
            .with_http_request(req)
            .with_preview(4096);
        let bytes = build(&env).unwrap();
        let text = String::from_utf8(bytes).unwrap();
        assert!(text.contains("Preview: 4096\r\n"));
        assert!(text.contains("0; ieof\r\n\r\n"));
    }

    #[test]
    fn preview_partial_body_sends_only_preview_bytes() {
        let req = HttpRequest::new("POST", "/").with_body(&b"hello world"[..]);
        let env = RequestEnvelope::new(Method::Reqmod, url())
            .with_http_request(req)
            .with_preview(4);
        let bytes = build(&env).unwrap();
        let text = String::from_utf8(bytes).unwrap();
        assert!(text.contains("Preview: 4\r\n"));
        assert!(text.contains("4\r\nhell\r\n0\r\n\r\n"));
        assert!(!text.contains("ieof"));
    }

    #[test]
    fn preview_continuation_sends_remaining_bytes_then_terminates() {
        let bytes = build_preview_continuation(b"o world", DEFAULT_CHUNK_LEN);
        let text = String::from_utf8(bytes).unwrap();
        assert_eq!(text, "7\r\no world\r\n0\r\n\r\n");
    }
}
