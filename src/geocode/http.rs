//! HTTP transport seam between providers and the network.

use super::types::GeocodeError;
use serde_json::Value;
use std::time::Duration;

/// A fully described GET request. Query values are encoded by the client.
#[derive(Debug, Clone, PartialEq)]
pub struct ProviderRequest {
    pub url: String,
    pub query: Vec<(&'static str, String)>,
    pub headers: Vec<(&'static str, String)>,
}

impl ProviderRequest {
    pub fn get(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            query: Vec::new(),
            headers: Vec::new(),
        }
    }

    pub fn param(mut self, key: &'static str, value: impl Into<String>) -> Self {
        self.query.push((key, value.into()));
        self
    }

    pub fn header(mut self, key: &'static str, value: impl Into<String>) -> Self {
        self.headers.push((key, value.into()));
        self
    }

    /// Look up a query parameter by name.
    pub fn query_value(&self, key: &str) -> Option<&str> {
        self.query
            .iter()
            .find(|(k, _)| *k == key)
            .map(|(_, v)| v.as_str())
    }

    pub fn header_value(&self, key: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(key))
            .map(|(_, v)| v.as_str())
    }
}

/// Issues a GET and decodes the body as JSON.
///
/// Transport failures map to [`GeocodeError::Network`], non-2xx responses to
/// [`GeocodeError::Status`] and undecodable bodies to
/// [`GeocodeError::InvalidResponse`].
pub trait HttpClient {
    fn get_json(&self, request: &ProviderRequest) -> Result<Value, GeocodeError>;
}

impl<C: HttpClient + ?Sized> HttpClient for &C {
    fn get_json(&self, request: &ProviderRequest) -> Result<Value, GeocodeError> {
        (**self).get_json(request)
    }
}

/// Blocking client backed by a shared `ureq` agent.
pub struct UreqClient {
    agent: ureq::Agent,
}

impl UreqClient {
    pub fn new(timeout: Duration) -> Self {
        let agent = ureq::AgentBuilder::new().timeout(timeout).build();
        Self { agent }
    }
}

impl HttpClient for UreqClient {
    fn get_json(&self, request: &ProviderRequest) -> Result<Value, GeocodeError> {
        let mut req = self.agent.get(&request.url);
        for (key, value) in &request.query {
            req = req.query(key, value);
        }
        for (key, value) in &request.headers {
            req = req.set(key, value);
        }

        let response = req.call().map_err(|e| match e {
            ureq::Error::Status(code, _) => GeocodeError::Status(code),
            ureq::Error::Transport(t) => GeocodeError::Network(t.to_string()),
        })?;

        response
            .into_json()
            .map_err(|e| GeocodeError::InvalidResponse(e.to_string()))
    }
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_builder() {
        let req = ProviderRequest::get("https://example.org/search")
            .param("q", "1 Main St")
            .param("limit", "1")
            .header("User-Agent", "test/1.0");

        assert_eq!(req.query_value("q"), Some("1 Main St"));
        assert_eq!(req.query_value("lang"), None);
        assert_eq!(req.header_value("user-agent"), Some("test/1.0"));
    }
}
