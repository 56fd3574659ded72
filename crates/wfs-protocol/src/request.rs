//! Request descriptors and raw transport responses.

use std::fmt;

/// HTTP method of a descriptor. The service only speaks KVP over GET.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    Get,
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Method::Get => write!(f, "GET"),
        }
    }
}

/// Where a request is sent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Endpoint {
    /// Absolute URL of the remote service
    Remote(String),
    /// Path on the local proxy (e.g. "/proxy/wfs"), resolved by the transport
    Proxy(String),
}

/// A single-use description of one service request.
#[derive(Debug, Clone, PartialEq)]
pub struct RequestDescriptor {
    pub method: Method,
    pub endpoint: Endpoint,
    /// Query parameters in the order they are sent
    pub params: Vec<(String, String)>,
    pub headers: Vec<(String, String)>,
}

impl RequestDescriptor {
    pub fn get(endpoint: Endpoint) -> Self {
        Self {
            method: Method::Get,
            endpoint,
            params: Vec::new(),
            headers: Vec::new(),
        }
    }

    /// Builder-style parameter append.
    pub fn with_param(mut self, name: &str, value: impl Into<String>) -> Self {
        self.params.push((name.to_string(), value.into()));
        self
    }

    pub fn with_header(mut self, name: &str, value: &str) -> Self {
        self.headers.push((name.to_string(), value.to_string()));
        self
    }

    /// Look up a parameter by name, ignoring case.
    pub fn param(&self, name: &str) -> Option<&str> {
        self.params
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    /// Replace a parameter in place (keeping its position and spelling), or
    /// append it when absent.
    pub fn set_param(&mut self, name: &str, value: impl Into<String>) {
        let value = value.into();
        match self
            .params
            .iter_mut()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
        {
            Some((_, v)) => *v = value,
            None => self.params.push((name.to_string(), value)),
        }
    }

    /// Rewrite into the script-wrapped request used by the out-of-band
    /// fallback: always sent to the remote service, both output and
    /// exception formats switched to JavaScript, and the callback named.
    pub fn to_script_request(&self, service_url: &str, callback: &str) -> Self {
        let mut script = Self {
            method: self.method,
            endpoint: Endpoint::Remote(service_url.to_string()),
            params: self.params.clone(),
            headers: Vec::new(),
        };
        script.set_param("OUTPUT", "text/javascript");
        script.set_param("EXCEPTIONS", "text/javascript");
        script.set_param("callback", callback);
        script
    }

    /// Human-readable URL with parameters left unencoded, for logs.
    ///
    /// Proxy endpoints are shown as their path. The credential is masked.
    pub fn display_url(&self) -> String {
        let base = match &self.endpoint {
            Endpoint::Remote(url) => url.as_str(),
            Endpoint::Proxy(path) => path.as_str(),
        };
        let query = self
            .params
            .iter()
            .map(|(k, v)| {
                if k.eq_ignore_ascii_case("key") && !v.is_empty() {
                    format!("{}=***", k)
                } else {
                    format!("{}={}", k, v)
                }
            })
            .collect::<Vec<_>>()
            .join("&");
        if query.is_empty() {
            base.to_string()
        } else {
            format!("{}?{}", base, query)
        }
    }
}

/// What came back from one exchange: status, headers and body text.
#[derive(Debug, Clone, PartialEq)]
pub struct RawResponse {
    pub status: u16,
    pub headers: Vec<(String, String)>,
    pub body: String,
}

impl RawResponse {
    pub fn new(status: u16, content_type: &str, body: impl Into<String>) -> Self {
        Self {
            status,
            headers: vec![("content-type".to_string(), content_type.to_string())],
            body: body.into(),
        }
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    pub fn content_type(&self) -> &str {
        self.header("content-type").unwrap_or("")
    }

    /// Whether the declared content type is JSON-compatible.
    pub fn declares_json(&self) -> bool {
        self.content_type().to_ascii_lowercase().contains("json")
    }
}
