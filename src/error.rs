/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2023-2025 ByteDance and/or its affiliates.
 */

use thiserror::Error;

/// Stable error taxonomy for every fallible operation in this crate.
///
/// Variants map 1:1 onto the error kinds documented for the wire protocol
/// engine: building an envelope, opening/using a transport, and parsing a
/// reply can each fail in exactly one of these ways.
#[derive(Debug, Error)]
pub enum IcapError {
    #[error("icap url scheme must be 'icap'")]
    InvalidScheme,
    #[error("icap url host must not be empty")]
    InvalidHost,
    #[error("method is not one of OPTIONS, REQMOD, RESPMOD")]
    MethodNotRegistered,
    #[error("REQMOD envelope is missing an embedded http request")]
    ReqmodWithNoReq,
    #[error("REQMOD envelope must not carry an embedded http response")]
    ReqmodWithResp,
    #[error("RESPMOD envelope is missing an embedded http response")]
    RespmodWithNoResp,
    #[error("close called on a transport that was never opened")]
    ConnectionNotOpen,
    #[error("invalid tcp message: {0}")]
    InvalidTcpMessage(String),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("connect failed: {0}")]
    Connect(std::io::Error),
    #[error("deadline elapsed")]
    Timeout,
    #[error("failed to parse embedded http message: {0}")]
    Parse(String),
}

pub type Result<T> = std::result::Result<T, IcapError>;
