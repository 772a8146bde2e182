/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2023-2025 ByteDance and/or its affiliates.
 */

use crate::error::IcapError;

/// A validated `icap://host[:port]/path` target.
///
/// Validation is intentionally shallow: the path is opaque to the builder,
/// it is only ever echoed back onto the wire as-is.
#[derive(Debug, Clone)]
pub struct IcapUrl {
    inner: url::Url,
}

impl IcapUrl {
    pub fn parse(raw: &str) -> crate::error::Result<Self> {
        let inner = url::Url::parse(raw).map_err(|_| IcapError::InvalidScheme)?;
        let url = IcapUrl { inner };
        url.validate()?;
        Ok(url)
    }

    fn validate(&self) -> crate::error::Result<()> {
        if self.inner.scheme() != "icap" {
            return Err(IcapError::InvalidScheme);
        }
        match self.inner.host_str() {
            Some(h) if !h.is_empty() => Ok(()),
            _ => Err(IcapError::InvalidHost),
        }
    }

    pub fn host(&self) -> &str {
        self.inner.host_str().unwrap_or_default()
    }

    pub fn port(&self) -> u16 {
        self.inner.port().unwrap_or(1344)
    }

    /// The request-target as it should appear on the `<METHOD> ... ICAP/1.0` line.
    pub fn request_target(&self) -> String {
        self.inner.as_str().to_string()
    }

    pub fn as_str(&self) -> &str {
        self.inner.as_str()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_well_formed_icap_url() {
        let u = IcapUrl::parse("icap://icap.example.net:1344/reqmod").unwrap();
        assert_eq!(u.host(), "icap.example.net");
        assert_eq!(u.port(), 1344);
    }

    #[test]
    fn default_port_is_1344() {
        let u = IcapUrl::parse("icap://icap.example.net/reqmod").unwrap();
        assert_eq!(u.port(), 1344);
    }

    #[test]
    fn rejects_non_icap_scheme() {
        assert!(matches!(
            IcapUrl::parse("http://icap.example.net/reqmod"),
            Err(IcapError::InvalidScheme)
        ));
    }

    #[test]
    fn rejects_empty_host() {
        assert!(matches!(
            IcapUrl::parse("icap:///reqmod"),
            Err(IcapError::InvalidHost)
        ));
    }
}
