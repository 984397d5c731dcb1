// SPDX-License-Identifier: MIT OR Apache-2.0

//! Target endpoint parsing.

use tracing::warn;
use url::Url;

use crate::error::{GnmiError, Result};

/// IANA-assigned gNMI port.
pub const DEFAULT_PORT: u16 = 9339;

/// A parsed `host:port` endpoint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Target {
    host: String,
    port: u16,
}

impl Target {
    /// Parse a target string.
    ///
    /// Accepts `host`, `host:port`, `[v6addr]:port` and bare IPv6
    /// addresses; a missing port falls back to [`DEFAULT_PORT`]. A scheme
    /// prefix is tolerated but ignored.
    pub fn parse(target: &str) -> Result<Self> {
        let target = target.trim();
        if target.is_empty() {
            return Err(GnmiError::Config("target must not be empty".to_string()));
        }
        let normalized = if target.contains("://") {
            warn!(target, "ignoring scheme in target");
            target.to_string()
        } else if target.matches(':').count() > 1 && !target.starts_with('[') {
            // Bare IPv6 address without a port.
            format!("gnmi://[{target}]")
        } else {
            format!("gnmi://{target}")
        };
        let url = Url::parse(&normalized)
            .map_err(|e| GnmiError::Config(format!("unable to parse target {target:?}: {e}")))?;
        let host = url
            .host_str()
            .ok_or_else(|| GnmiError::Config(format!("target {target:?} has no host")))?
            .trim_start_matches('[')
            .trim_end_matches(']')
            .to_string();
        Ok(Self {
            host,
            port: url.port().unwrap_or(DEFAULT_PORT),
        })
    }

    /// Host name or address, without IPv6 brackets.
    #[must_use]
    pub fn host(&self) -> &str {
        &self.host
    }

    #[must_use]
    pub fn port(&self) -> u16 {
        self.port
    }

    /// `host:port` form suitable for dialing, with IPv6 brackets restored.
    #[must_use]
    pub fn netloc(&self) -> String {
        if self.host.contains(':') {
            format!("[{}]:{}", self.host, self.port)
        } else {
            format!("{}:{}", self.host, self.port)
        }
    }
}

impl std::fmt::Display for Target {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.netloc())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_host_and_port() {
        let target = Target::parse("router1.example.com:57400").unwrap();
        assert_eq!(target.host(), "router1.example.com");
        assert_eq!(target.port(), 57400);
        assert_eq!(target.netloc(), "router1.example.com:57400");
    }

    #[test]
    fn test_default_port() {
        let target = Target::parse("192.0.2.1").unwrap();
        assert_eq!(target.port(), DEFAULT_PORT);
        assert_eq!(target.netloc(), "192.0.2.1:9339");
    }

    #[test]
    fn test_ipv6_with_port() {
        let target = Target::parse("[2001:db8::1]:57400").unwrap();
        assert_eq!(target.host(), "2001:db8::1");
        assert_eq!(target.port(), 57400);
        assert_eq!(target.netloc(), "[2001:db8::1]:57400");
    }

    #[test]
    fn test_bare_ipv6() {
        let target = Target::parse("2001:db8::1").unwrap();
        assert_eq!(target.host(), "2001:db8::1");
        assert_eq!(target.port(), DEFAULT_PORT);
    }

    #[test]
    fn test_scheme_ignored() {
        let target = Target::parse("http://192.0.2.1:9339").unwrap();
        assert_eq!(target.host(), "192.0.2.1");
        assert_eq!(target.port(), 9339);
    }

    #[test]
    fn test_empty_rejected() {
        assert!(matches!(
            Target::parse("  "),
            Err(GnmiError::Config(_))
        ));
    }
}
