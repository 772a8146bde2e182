/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2023-2025 ByteDance and/or its affiliates.
 */

use crate::error::{IcapError, Result};
use crate::headers::HeaderMap;
use crate::http::{HttpRequest, HttpResponse};
use crate::method::Method;
use crate::url::IcapUrl;

/// A fully-specified ICAP request, ready to hand to [`crate::build::build`].
pub struct RequestEnvelope {
    pub method: Method,
    pub url: IcapUrl,
    pub http_request: Option<HttpRequest>,
    pub http_response: Option<HttpResponse>,
    /// `Some(n)` requests a preview of up to `n` body bytes; `None` sends
    /// the whole body without preview negotiation.
    pub preview: Option<usize>,
    pub icap_headers: HeaderMap,
}

impl RequestEnvelope {
    pub fn new(method: Method, url: IcapUrl) -> Self {
        RequestEnvelope {
            method,
            url,
            http_request: None,
            http_response: None,
            preview: None,
            icap_headers: HeaderMap::new(),
        }
    }

    pub fn with_http_request(mut self, req: HttpRequest) -> Self {
        self.http_request = Some(req);
        self
    }

    pub fn with_http_response(mut self, resp: HttpResponse) -> Self {
        self.http_response = Some(resp);
        self
    }

    pub fn with_preview(mut self, bytes: usize) -> Self {
        self.preview = Some(bytes);
        self
    }

    /// Checks the invariants from the data model: REQMOD requires a
    /// request and forbids a response; RESPMOD requires a response;
    /// OPTIONS carries no embedded HTTP.
    pub fn validate(&self) -> Result<()> {
        match self.method {
            Method::Options => Ok(()),
            Method::Reqmod => {
                if self.http_request.is_none() {
                    return Err(IcapError::ReqmodWithNoReq);
                }
                if self.http_response.is_some() {
                    return Err(IcapError::ReqmodWithResp);
                }
                Ok(())
            }
            Method::Respmod => {
                if self.http_response.is_none() {
                    return Err(IcapError::RespmodWithNoResp);
                }
                Ok(())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn url() -> IcapUrl {
        IcapUrl::parse("icap://icap.example.net/reqmod").unwrap()
    }

    #[test]
    fn reqmod_requires_request() {
        let env = RequestEnvelope::new(Method::Reqmod, url());
        assert!(matches!(env.validate(), Err(IcapError::ReqmodWithNoReq)));
    }

    #[test]
    fn reqmod_forbids_response() {
        let env = RequestEnvelope::new(Method::Reqmod, url())
            .with_http_request(HttpRequest::new("GET", "/"))
            .with_http_response(HttpResponse::new(200, "OK"));
        assert!(matches!(env.validate(), Err(IcapError::ReqmodWithResp)));
    }

    #[test]
    fn respmod_requires_response() {
        let env = RequestEnvelope::new(Method::Respmod, url());
        assert!(matches!(env.validate(), Err(IcapError::RespmodWithNoResp)));
    }

    #[test]
    fn options_needs_nothing() {
        let env = RequestEnvelope::new(Method::Options, url());
        assert!(env.validate().is_ok());
    }
}
