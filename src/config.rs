/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2023-2025 ByteDance and/or its affiliates.
 */

//! Ambient configuration for one ICAP service endpoint: where it lives,
//! how big a preview to offer it, and how long to wait on it.

use std::net::SocketAddr;
use std::time::Duration;

use crate::url::IcapUrl;

const DEFAULT_PREVIEW_SIZE: usize = 1024;
const DEFAULT_DIAL_TIMEOUT: Duration = Duration::from_secs(5);
const DEFAULT_READ_TIMEOUT: Duration = Duration::from_secs(30);
const DEFAULT_WRITE_TIMEOUT: Duration = Duration::from_secs(30);

/// Static configuration for one ICAP service, resolved once up front and
/// reused across [`crate::transport::IcapTransport::open`] calls.
#[derive(Debug, Clone)]
pub struct IcapServiceConfig {
    pub url: String,
    pub addr: SocketAddr,
    pub preview_size: Option<usize>,
    pub dial_timeout: Duration,
    pub read_timeout: Duration,
    pub write_timeout: Duration,
}

impl IcapServiceConfig {
    pub fn new(url: impl Into<String>, addr: SocketAddr) -> Self {
        IcapServiceConfig {
            url: url.into(),
            addr,
            preview_size: Some(DEFAULT_PREVIEW_SIZE),
            dial_timeout: DEFAULT_DIAL_TIMEOUT,
            read_timeout: DEFAULT_READ_TIMEOUT,
            write_timeout: DEFAULT_WRITE_TIMEOUT,
        }
    }

    /// Validates that `url` is a well-formed `icap://` URL, independent of
    /// `addr` (the two are resolved separately: the URL names the service
    /// and request path, `addr` is where to dial).
    pub fn icap_url(&self) -> crate::error::Result<IcapUrl> {
        IcapUrl::parse(&self.url)
    }
}

#[cfg(feature = "yaml")]
mod yaml {
    use std::net::ToSocketAddrs;

    use anyhow::{Context, anyhow};
    use yaml_rust::Yaml;

    use super::IcapServiceConfig;

    fn as_str<'a>(value: &'a Yaml, key: &str) -> anyhow::Result<&'a str> {
        value
            .as_str()
            .ok_or_else(|| anyhow!("invalid string value for key {key}"))
    }

    fn as_u64(value: &Yaml, key: &str) -> anyhow::Result<u64> {
        value
            .as_i64()
            .map(|v| v as u64)
            .ok_or_else(|| anyhow!("invalid integer value for key {key}"))
    }

    impl IcapServiceConfig {
        /// Parses a map of the form:
        /// ```yaml
        /// url: icap://icap.example.net:1344/reqmod
        /// preview_size: 1024
        /// dial_timeout: 5
        /// read_timeout: 30
        /// write_timeout: 30
        /// ```
        /// `addr` is resolved from the URL's host/port via the standard
        /// resolver; DNS-less callers should build [`IcapServiceConfig`]
        /// directly instead of going through yaml.
        pub fn parse_yaml(value: &Yaml) -> anyhow::Result<Self> {
            match value {
                Yaml::Hash(map) => {
                    let url_value = map
                        .iter()
                        .find(|(k, _)| k.as_str() == Some("url"))
                        .map(|(_, v)| v)
                        .ok_or_else(|| anyhow!("missing required key 'url'"))?;
                    let url = as_str(url_value, "url")?.to_string();

                    let parsed =
                        crate::url::IcapUrl::parse(&url).context("invalid icap url value for key url")?;
                    let host_port = format!("{}:{}", parsed.host(), parsed.port());
                    let addr = host_port
                        .to_socket_addrs()
                        .context("failed to resolve icap service address")?
                        .next()
                        .ok_or_else(|| anyhow!("no address found for {host_port}"))?;
                    let mut config = IcapServiceConfig::new(url, addr);

                    for (k, v) in map {
                        match as_str(k, "<key>")? {
                            "url" => {}
                            "preview_size" => config.preview_size = Some(as_u64(v, "preview_size")? as usize),
                            "dial_timeout" => {
                                config.dial_timeout =
                                    std::time::Duration::from_secs(as_u64(v, "dial_timeout")?)
                            }
                            "read_timeout" => {
                                config.read_timeout =
                                    std::time::Duration::from_secs(as_u64(v, "read_timeout")?)
                            }
                            "write_timeout" => {
                                config.write_timeout =
                                    std::time::Duration::from_secs(as_u64(v, "write_timeout")?)
                            }
                            key => return Err(anyhow!("invalid key {key}")),
                        }
                    }

                    Ok(config)
                }
                _ => Err(anyhow!("yaml type for 'icap service config' should be 'map'")),
            }
        }
    }
}
