//! Per-request context shared by every pipeline stage.

use std::fmt;
use std::net::IpAddr;

use axum::http::{header, request::Parts, HeaderMap, Method};
use url::Url;

use crate::gateway::surface::SurfaceSignals;

pub const X_FORWARDED_PROTO: &str = "x-forwarded-proto";
pub const X_FORWARDED_PORT: &str = "x-forwarded-port";
pub const X_FORWARDED_HOST: &str = "x-forwarded-host";

/// URL scheme as perceived by the application.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Scheme {
    #[default]
    Http,
    Https,
}

impl Scheme {
    pub fn as_str(self) -> &'static str {
        match self {
            Scheme::Http => "http",
            Scheme::Https => "https",
        }
    }
}

impl fmt::Display for Scheme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Configured administrative origin, e.g. `https://admin.example.com:8443`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CanonicalOrigin {
    scheme: Scheme,
    /// Host with an optional `:port`, lowercased.
    authority: String,
}

impl CanonicalOrigin {
    /// Parse an origin URL. Only `http` and `https` are accepted; any path
    /// component is ignored.
    pub fn parse(raw: &str) -> Option<Self> {
        let url = Url::parse(raw).ok()?;
        let scheme = match url.scheme() {
            "http" => Scheme::Http,
            "https" => Scheme::Https,
            _ => return None,
        };
        let host = url.host_str().filter(|h| !h.is_empty())?;
        let authority = match url.port() {
            Some(port) => format!("{}:{}", host, port),
            None => host.to_string(),
        };
        Some(Self {
            scheme,
            authority: authority.to_ascii_lowercase(),
        })
    }

    pub fn scheme(&self) -> Scheme {
        self.scheme
    }

    pub fn authority(&self) -> &str {
        &self.authority
    }

    /// True when `url` is an absolute URL on this origin.
    pub fn owns(&self, url: &Url) -> bool {
        url.scheme() == self.scheme.as_str() && url_authority(url).as_deref() == Some(&*self.authority)
    }
}

impl fmt::Display for CanonicalOrigin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}://{}", self.scheme, self.authority)
    }
}

/// `host[:port]` of a parsed URL, without the default port.
pub(crate) fn url_authority(url: &Url) -> Option<String> {
    let host = url.host_str()?;
    Some(match url.port() {
        Some(port) => format!("{}:{}", host, port),
        None => host.to_string(),
    })
}

/// Split `host:port` when the part after the last colon is numeric.
/// Bracketed IPv6 literals without a port are left whole.
pub(crate) fn split_port(host: &str) -> Option<(&str, &str)> {
    host.rsplit_once(':')
        .filter(|(_, p)| !p.is_empty() && p.bytes().all(|b| b.is_ascii_digit()))
}

/// Raw `X-Forwarded-*` values. Empty headers count as absent.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ForwardedHeaders {
    pub proto: Option<String>,
    pub port: Option<String>,
    pub host: Option<String>,
}

impl ForwardedHeaders {
    /// The proto is kept byte for byte; only an exact `https` is secure.
    pub fn from_headers(headers: &HeaderMap) -> Self {
        Self {
            proto: headers
                .get(X_FORWARDED_PROTO)
                .and_then(|v| v.to_str().ok())
                .filter(|v| !v.is_empty())
                .map(str::to_string),
            port: header_text(headers, X_FORWARDED_PORT),
            host: header_text(headers, X_FORWARDED_HOST),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.proto.is_none() && self.port.is_none() && self.host.is_none()
    }
}

fn header_text(headers: &HeaderMap, name: impl header::AsHeaderName) -> Option<String> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

/// Everything the pipeline knows about one inbound request.
///
/// Built once from the transport view, then mutated by the origin normalizer
/// (scheme/host/port) and the redirect suppressor (`canonical_redirect`).
#[derive(Debug, Clone)]
pub struct RequestContext {
    pub method: Method,
    pub scheme: Scheme,
    pub host: Option<String>,
    /// Raw port text. Forwarded ports are copied without validation.
    pub port: Option<String>,
    pub path: String,
    pub query: Option<String>,
    /// Whether the connection itself was TLS.
    pub transport_tls: bool,
    pub peer: Option<IpAddr>,
    pub forwarded: ForwardedHeaders,
    pub signals: SurfaceSignals,
    /// Cleared for requests that must not be canonicalized.
    pub canonical_redirect: bool,
}

impl RequestContext {
    /// Build the transport view of a request. `signals` come from surface
    /// detection and are taken as given.
    pub fn from_parts(
        parts: &Parts,
        transport_tls: bool,
        peer: Option<IpAddr>,
        signals: SurfaceSignals,
    ) -> Self {
        let host = header_text(&parts.headers, header::HOST)
            .or_else(|| parts.uri.authority().map(|a| a.as_str().to_string()));
        let port = host.as_deref().and_then(split_port).map(|(_, p)| p.to_string());

        Self {
            method: parts.method.clone(),
            scheme: if transport_tls { Scheme::Https } else { Scheme::Http },
            host,
            port,
            path: parts.uri.path().to_string(),
            query: parts.uri.query().map(str::to_string),
            transport_tls,
            peer,
            forwarded: ForwardedHeaders::from_headers(&parts.headers),
            signals,
            canonical_redirect: true,
        }
    }

    /// Port parsed as a number, when it is one.
    pub fn port_number(&self) -> Option<u16> {
        self.port.as_deref().and_then(|p| p.parse().ok())
    }

    /// `host[:port]` the client addressed, lowercased, without the default
    /// port of the perceived scheme. A port inside `host` wins over `port`.
    pub fn authority(&self) -> Option<String> {
        let host = self.host.as_deref()?.to_ascii_lowercase();
        let (name, port) = match split_port(&host) {
            Some((name, port)) => (name.to_string(), Some(port.to_string())),
            None => (host.clone(), self.port.clone()),
        };
        let default_port = match self.scheme {
            Scheme::Https => "443",
            Scheme::Http => "80",
        };
        Some(match port.filter(|p| p != default_port) {
            Some(port) => format!("{}:{}", name, port),
            None => name,
        })
    }

    /// Path plus `?query` as sent by the client.
    pub fn path_and_query(&self) -> String {
        match &self.query {
            Some(q) => format!("{}?{}", self.path, q),
            None => self.path.clone(),
        }
    }

    /// Scheme used when rebuilding self-referential URLs: the raw forwarded
    /// proto when one was sent, otherwise the transport's.
    pub fn url_scheme(&self) -> &str {
        match &self.forwarded.proto {
            Some(proto) => proto,
            None if self.transport_tls => "https",
            None => "http",
        }
    }
}
