/// Minimal HTTP request/response model used by the cloud providers
use crate::error::{LinkspaceError, Result};
use serde::de::DeserializeOwned;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    Get,
    Post,
    Put,
    Patch,
}

impl Method {
    pub fn as_str(&self) -> &'static str {
        match self {
            Method::Get => "GET",
            Method::Post => "POST",
            Method::Put => "PUT",
            Method::Patch => "PATCH",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct HttpRequest {
    pub method: Method,
    pub url: String,
    pub headers: Vec<(String, String)>,
    pub body: Option<String>,
}

impl HttpRequest {
    pub fn new(method: Method, url: impl Into<String>) -> Self {
        HttpRequest {
            method,
            url: url.into(),
            headers: Vec::new(),
            body: None,
        }
    }

    pub fn get(url: impl Into<String>) -> Self {
        Self::new(Method::Get, url)
    }

    pub fn post(url: impl Into<String>) -> Self {
        Self::new(Method::Post, url)
    }

    pub fn put(url: impl Into<String>) -> Self {
        Self::new(Method::Put, url)
    }

    pub fn patch(url: impl Into<String>) -> Self {
        Self::new(Method::Patch, url)
    }

    pub fn header(mut self, name: &str, value: impl Into<String>) -> Self {
        self.headers.push((name.to_string(), value.into()));
        self
    }

    pub fn bearer(self, access_token: &str) -> Self {
        self.header("Authorization", format!("Bearer {}", access_token))
    }

    pub fn body(mut self, content_type: &str, body: impl Into<String>) -> Self {
        self.body = Some(body.into());
        self.header("Content-Type", content_type)
    }

    pub fn json_body(self, body: impl Into<String>) -> Self {
        self.body("application/json", body)
    }

    /// `application/x-www-form-urlencoded` body from key/value pairs
    pub fn form<'a>(self, pairs: impl IntoIterator<Item = (&'a str, &'a str)>) -> Self {
        let encoded = url::form_urlencoded::Serializer::new(String::new())
            .extend_pairs(pairs)
            .finish();
        self.body("application/x-www-form-urlencoded", encoded)
    }

    pub fn header_value(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct HttpResponse {
    pub status: u16,
    pub body: String,
}

impl HttpResponse {
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        HttpResponse {
            status,
            body: body.into(),
        }
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Fail with an `Http` error unless the status is 2xx.
    pub fn error_for_status(self, context: &'static str) -> Result<Self> {
        if self.is_success() {
            Ok(self)
        } else {
            Err(LinkspaceError::http(context, self.status))
        }
    }

    pub fn json<T: DeserializeOwned>(&self) -> Result<T> {
        Ok(serde_json::from_str(&self.body)?)
    }
}

/// Anything that can carry an [`HttpRequest`] to the network.
#[allow(async_fn_in_trait)]
pub trait HttpClient {
    /// Resolves with any status the server returns; only transport
    /// failures are errors.
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_form_body_is_url_encoded() {
        let req = HttpRequest::post("https://example.com/token").form([
            ("code", "a b&c"),
            ("redirect_uri", "https://x.chromiumapp.org/oauth2"),
        ]);

        assert_eq!(
            req.body.as_deref(),
            Some("code=a+b%26c&redirect_uri=https%3A%2F%2Fx.chromiumapp.org%2Foauth2")
        );
        assert_eq!(
            req.header_value("content-type"),
            Some("application/x-www-form-urlencoded")
        );
    }

    #[test]
    fn test_bearer_header() {
        let req = HttpRequest::get("https://example.com").bearer("tok");
        assert_eq!(req.header_value("Authorization"), Some("Bearer tok"));
        assert_eq!(req.method.as_str(), "GET");
    }

    #[test]
    fn test_error_for_status() {
        assert!(HttpResponse::new(204, "").error_for_status("Upload").is_ok());

        let err = HttpResponse::new(401, "").error_for_status("Upload").unwrap_err();
        assert!(matches!(err, LinkspaceError::Http { context: "Upload", status: 401 }));
    }
}
