//! Immutable request template; every probe gets a fresh [`Request`] from it.

use crate::config::ProbeConfig;
use crate::error::{ProbeError, Result};
use crate::url_model::Target;
use bytes::Bytes;
use http::header::{HeaderName, HeaderValue, CONNECTION, CONTENT_LENGTH, HOST, USER_AGENT};
use http::{HeaderMap, Method, Request, Uri};
use http_body_util::Full;

#[derive(Debug, Clone)]
pub struct RequestTemplate {
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    payload: Option<Bytes>,
}

impl RequestTemplate {
    /// Validates method and headers once; invalid values are fatal.
    pub fn new(cfg: &ProbeConfig, target: &Target) -> Result<Self> {
        let method = Method::from_bytes(cfg.effective_method().as_bytes())
            .map_err(|e| ProbeError::Request(format!("method {:?}: {}", cfg.effective_method(), e)))?;
        let uri: Uri = target
            .path_and_query()
            .parse()
            .map_err(|e| ProbeError::Request(format!("path {:?}: {}", target.path_and_query(), e)))?;

        let mut headers = HeaderMap::new();
        let host = cfg.host_override.as_deref().unwrap_or(target.authority());
        headers.insert(HOST, header_value(host)?);
        // Empty means suppressed; whitespace only goes out as an empty value.
        if !cfg.headers.user_agent().is_empty() {
            headers.insert(USER_AGENT, header_value(cfg.headers.user_agent())?);
        }
        for (name, value) in cfg.headers.iter() {
            let name = HeaderName::from_bytes(name.as_bytes())
                .map_err(|e| ProbeError::Request(format!("header name {:?}: {}", name, e)))?;
            headers.append(name, header_value(value)?);
        }
        // One cold connection per probe.
        headers.insert(CONNECTION, HeaderValue::from_static("close"));
        let payload = cfg.payload.as_ref().map(|p| Bytes::from(p.clone()));
        if let Some(p) = &payload {
            headers.insert(CONTENT_LENGTH, HeaderValue::from(p.len()));
        }
        Ok(Self {
            method,
            uri,
            headers,
            payload,
        })
    }

    pub fn method(&self) -> &Method {
        &self.method
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    pub fn payload_len(&self) -> Option<usize> {
        self.payload.as_ref().map(Bytes::len)
    }

    /// A new request with its own body buffer.
    pub fn build(&self) -> Request<Full<Bytes>> {
        let mut req = Request::new(Full::new(self.payload.clone().unwrap_or_default()));
        *req.method_mut() = self.method.clone();
        *req.uri_mut() = self.uri.clone();
        *req.headers_mut() = self.headers.clone();
        req
    }
}

fn header_value(raw: &str) -> Result<HeaderValue> {
    HeaderValue::from_str(raw.trim())
        .map_err(|e| ProbeError::Request(format!("header value {:?}: {}", raw, e)))
}
