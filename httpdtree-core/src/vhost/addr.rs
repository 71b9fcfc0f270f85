//! Listen address specifications as written in `<VirtualHost ...>`

use serde::Serialize;
use std::fmt;

/// Port component of an address
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Port {
    /// `*`
    Any,
    Number(u16),
    /// No port given
    Unspecified,
}

/// A `(host, port)` pair such as `*:80` or `[::1]:443`
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct Addr {
    pub host: String,
    pub port: Port,
}

/// Why an address could not be split
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AddrError {
    #[error("empty address")]
    Empty,

    #[error("unterminated IPv6 literal in {0:?}")]
    UnterminatedBracket(String),

    #[error("invalid port {port:?} in {addr:?}")]
    InvalidPort { addr: String, port: String },
}

impl Addr {
    pub fn new(host: impl Into<String>, port: Port) -> Self {
        Self {
            host: host.into(),
            port,
        }
    }

    /// Split an address specification into host and port.
    pub fn parse(spec: &str) -> Result<Self, AddrError> {
        let spec = spec.trim();
        if spec.is_empty() {
            return Err(AddrError::Empty);
        }

        let (host, port) = if let Some(rest) = spec.strip_prefix('[') {
            let close = rest
                .find(']')
                .ok_or_else(|| AddrError::UnterminatedBracket(spec.to_string()))?;
            let host = &spec[..close + 2];
            let tail = &rest[close + 1..];
            match tail.strip_prefix(':') {
                Some(port) => (host, Some(port)),
                None if tail.is_empty() => (host, None),
                None => {
                    return Err(AddrError::InvalidPort {
                        addr: spec.to_string(),
                        port: tail.to_string(),
                    });
                }
            }
        } else {
            match spec.rsplit_once(':') {
                Some((host, port)) => (host, Some(port)),
                None => (spec, None),
            }
        };

        let port = match port {
            None | Some("") => Port::Unspecified,
            Some("*") => Port::Any,
            Some(p) => p.parse().map(Port::Number).map_err(|_| AddrError::InvalidPort {
                addr: spec.to_string(),
                port: p.to_string(),
            })?,
        };
        Ok(Self::new(host, port))
    }

    /// `*` and `_default_` match every interface
    pub fn is_wildcard(&self) -> bool {
        self.host == "*" || self.host.eq_ignore_ascii_case("_default_")
    }

    pub fn port_number(&self) -> Option<u16> {
        match self.port {
            Port::Number(n) => Some(n),
            _ => None,
        }
    }

    /// Whether both addresses can receive the same connection
    pub fn overlaps(&self, other: &Addr) -> bool {
        let ports = match (self.port, other.port) {
            (Port::Any, _) | (_, Port::Any) => true,
            (a, b) => a == b,
        };
        ports && (self.host == other.host || self.is_wildcard() || other.is_wildcard())
    }
}

impl fmt::Display for Port {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Port::Any => write!(f, "*"),
            Port::Number(n) => write!(f, "{}", n),
            Port::Unspecified => Ok(()),
        }
    }
}

impl fmt::Display for Addr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.port {
            Port::Unspecified => write!(f, "{}", self.host),
            port => write!(f, "{}:{}", self.host, port),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_wildcard() {
        let addr = Addr::parse("*:80").unwrap();
        assert_eq!(addr, Addr::new("*", Port::Number(80)));
        assert!(addr.is_wildcard());
        assert_eq!(addr.to_string(), "*:80");
    }

    #[test]
    fn test_parse_ipv6() {
        let addr = Addr::parse("[2001:db8::1]:443").unwrap();
        assert_eq!(addr.host, "[2001:db8::1]");
        assert_eq!(addr.port_number(), Some(443));

        let bare = Addr::parse("[::1]").unwrap();
        assert_eq!(bare.port, Port::Unspecified);
        assert_eq!(bare.to_string(), "[::1]");
    }

    #[test]
    fn test_parse_without_port() {
        let addr = Addr::parse("_default_").unwrap();
        assert_eq!(addr.port, Port::Unspecified);
        assert!(addr.is_wildcard());
    }

    #[test]
    fn test_parse_empty_port() {
        let addr = Addr::parse("*:").unwrap();
        assert_eq!(addr, Addr::new("*", Port::Unspecified));
        assert_eq!(Addr::parse("[::1]:").unwrap().port, Port::Unspecified);
    }

    #[test]
    fn test_parse_any_port() {
        assert_eq!(Addr::parse("*:*").unwrap().port, Port::Any);
    }

    #[test]
    fn test_parse_errors() {
        assert_eq!(Addr::parse("  "), Err(AddrError::Empty));
        assert!(matches!(
            Addr::parse("example.com:http"),
            Err(AddrError::InvalidPort { .. })
        ));
        assert!(matches!(
            Addr::parse("[::1:80"),
            Err(AddrError::UnterminatedBracket(_))
        ));
        assert!(matches!(
            Addr::parse("[::1]80"),
            Err(AddrError::InvalidPort { .. })
        ));
    }

    #[test]
    fn test_overlaps() {
        let wild = Addr::parse("*:443").unwrap();
        let named = Addr::parse("10.0.0.1:443").unwrap();
        let other_port = Addr::parse("10.0.0.1:80").unwrap();
        assert!(wild.overlaps(&named));
        assert!(!named.overlaps(&other_port));
        assert!(Addr::parse("10.0.0.1:*").unwrap().overlaps(&other_port));
    }
}
