use std::collections::BTreeMap;
use std::fmt;

use reqwest::Url;
use serde::{Deserialize, Serialize};

/// Transport scheme of a push server endpoint
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Protocol {
    Http,
    Https,
}

impl Protocol {
    /// Match a scheme token including its trailing separator.
    ///
    /// Only `"http:"` and `"https:"` are accepted, compared exactly.
    pub fn from_scheme_token(token: &str) -> Option<Self> {
        match token {
            "http:" => Some(Protocol::Http),
            "https:" => Some(Protocol::Https),
            _ => None,
        }
    }

    pub fn scheme_token(&self) -> &'static str {
        match self {
            Protocol::Http => "http:",
            Protocol::Https => "https:",
        }
    }
}

/// HTTP method used against the registry endpoint
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum HttpMethod {
    Post,
    Delete,
}

impl HttpMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            HttpMethod::Post => "POST",
            HttpMethod::Delete => "DELETE",
        }
    }
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Low-level description of one request against the push server.
///
/// Built fresh for every call and consumed by the transport.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestDescriptor {
    pub protocol: Protocol,
    pub hostname: String,
    pub port: Option<u16>,
    pub path: String,
    pub headers: BTreeMap<String, String>,
    pub auth_token: String,
    pub method: HttpMethod,
}

impl RequestDescriptor {
    /// Absolute URL the descriptor points at
    pub fn url(&self) -> String {
        match self.port {
            Some(port) => format!(
                "{}//{}:{}{}",
                self.protocol.scheme_token(),
                self.hostname,
                port,
                self.path
            ),
            None => format!(
                "{}//{}{}",
                self.protocol.scheme_token(),
                self.hostname,
                self.path
            ),
        }
    }

    /// Split the auth token into HTTP Basic user and password
    pub fn basic_credentials(&self) -> (&str, &str) {
        self.auth_token
            .split_once(':')
            .unwrap_or((self.auth_token.as_str(), ""))
    }
}

/// Derive a [`RequestDescriptor`] from a parsed endpoint URL.
///
/// Returns `None` when the URL scheme is neither `http` nor `https`.
pub fn resolve_request(
    url: &Url,
    variant_id: &str,
    variant_secret: &str,
    method: HttpMethod,
) -> Option<RequestDescriptor> {
    let protocol = Protocol::from_scheme_token(&format!("{}:", url.scheme()))?;

    let mut headers = BTreeMap::new();
    headers.insert("Accept".to_string(), "application/json".to_string());
    headers.insert("Content-type".to_string(), "application/json".to_string());

    Some(RequestDescriptor {
        protocol,
        hostname: url.host_str().unwrap_or_default().to_string(),
        port: url.port(),
        path: url.path().to_string(),
        headers,
        auth_token: format!("{}:{}", variant_id, variant_secret),
        method,
    })
}
