/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2023-2025 ByteDance and/or its affiliates.
 */

//! Client-side wire protocol engine for the Internet Content Adaptation
//! Protocol (RFC 3507): build ICAP requests, drive them over a transport,
//! and parse the replies that come back.
//!
//! This crate does not own a connection pool, TLS, or service discovery;
//! it is the protocol core that a proxy's adaptation layer builds on top
//! of, the same way [`g3-icap-client`] sits under `g3proxy`'s audit stack.

pub mod build;
pub mod chunked;
pub mod config;
pub mod encapsulated;
pub mod envelope;
pub mod error;
pub mod headers;
pub mod http;
pub mod method;
pub mod parse;
pub mod transport;
pub mod url;

pub use build::{build, build_preview_continuation, build_with_chunk_len};
pub use config::IcapServiceConfig;
pub use envelope::RequestEnvelope;
pub use error::{IcapError, Result};
pub use http::{HttpRequest, HttpResponse};
pub use method::Method;
pub use parse::{parse, IcapReply};
pub use transport::IcapTransport;
pub use url::IcapUrl;
