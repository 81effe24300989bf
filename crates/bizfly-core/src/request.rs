//! Request construction.
//!
//! A [`RequestSpec`] names what to call: method, logical service, path suffix,
//! optional JSON body and query. [`PreparedRequest::prepare`] turns it into a
//! concrete URL and header set using a catalog base URL and one
//! [`CredentialSnapshot`].

use bytes::Bytes;
use reqwest::header::{
    HeaderMap, HeaderName, HeaderValue, ACCEPT, AUTHORIZATION, CONTENT_TYPE, USER_AGENT,
};
use reqwest::Method;
use secrecy::ExposeSecret;
use serde::Serialize;
use url::Url;

use crate::credentials::CredentialSnapshot;
use crate::error::{Error, Result};
use crate::query::{ListOptions, QueryParams};
use crate::types::ServiceName;

/// Content type sent and accepted on every request.
pub const JSON_CONTENT_TYPE: &str = "application/json; charset=utf-8";

/// Default `User-Agent` header value.
pub const DEFAULT_USER_AGENT: &str = concat!("bizfly-rust/", env!("CARGO_PKG_VERSION"));

/// Project scope header.
pub const X_PROJECT_ID: HeaderName = HeaderName::from_static("x-project-id");
/// Bearer token header.
pub const X_AUTH_TOKEN: HeaderName = HeaderName::from_static("x-auth-token");
/// Auth mode header.
pub const X_AUTH_TYPE: HeaderName = HeaderName::from_static("x-auth-type");

/// Description of a single API call.
#[derive(Debug, Clone)]
pub struct RequestSpec {
    method: Method,
    service: ServiceName,
    path: String,
    body: Option<Bytes>,
    query: QueryParams,
}

impl RequestSpec {
    /// Describe a call to `path` on `service`.
    ///
    /// The path must begin with `/`; this is checked when the request is
    /// prepared.
    #[must_use]
    pub fn new(method: Method, service: ServiceName, path: impl Into<String>) -> Self {
        Self {
            method,
            service,
            path: path.into(),
            body: None,
            query: QueryParams::new(),
        }
    }

    /// `GET` request.
    #[must_use]
    pub fn get(service: ServiceName, path: impl Into<String>) -> Self {
        Self::new(Method::GET, service, path)
    }

    /// `POST` request.
    #[must_use]
    pub fn post(service: ServiceName, path: impl Into<String>) -> Self {
        Self::new(Method::POST, service, path)
    }

    /// `PUT` request.
    #[must_use]
    pub fn put(service: ServiceName, path: impl Into<String>) -> Self {
        Self::new(Method::PUT, service, path)
    }

    /// `PATCH` request.
    #[must_use]
    pub fn patch(service: ServiceName, path: impl Into<String>) -> Self {
        Self::new(Method::PATCH, service, path)
    }

    /// `DELETE` request.
    #[must_use]
    pub fn delete(service: ServiceName, path: impl Into<String>) -> Self {
        Self::new(Method::DELETE, service, path)
    }

    /// Attach a JSON body.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Serialization`] if `body` cannot be encoded.
    pub fn json<B>(mut self, body: &B) -> Result<Self>
    where
        B: Serialize + ?Sized,
    {
        let encoded = serde_json::to_vec(body)
            .map_err(|err| Error::Serialization(format!("failed to encode request body: {err}")))?;
        self.body = Some(Bytes::from(encoded));
        Ok(self)
    }

    /// Append query parameters.
    #[must_use]
    pub fn query(mut self, params: QueryParams) -> Self {
        self.query.extend(params);
        self
    }

    /// Append pagination and filters.
    #[must_use]
    pub fn list_options(self, options: &ListOptions) -> Self {
        self.query(options.to_params())
    }

    /// HTTP method.
    #[must_use]
    pub const fn method(&self) -> &Method {
        &self.method
    }

    /// Target service.
    #[must_use]
    pub const fn service(&self) -> ServiceName {
        self.service
    }

    /// Path suffix.
    #[must_use]
    pub fn path(&self) -> &str {
        &self.path
    }
}

/// A fully composed request, reusable across retry attempts.
#[derive(Debug, Clone)]
pub struct PreparedRequest {
    method: Method,
    url: Url,
    headers: HeaderMap,
    body: Bytes,
}

impl PreparedRequest {
    /// Compose the URL, body and headers for `spec`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ValidationError`] if the path does not begin with `/`
    /// or a header value is not representable, and [`Error::InvalidEndpoint`]
    /// if the resulting URL does not parse.
    pub fn prepare(
        spec: &RequestSpec,
        base_url: &str,
        credentials: &CredentialSnapshot,
        user_agent: &str,
    ) -> Result<Self> {
        if !spec.path.starts_with('/') {
            return Err(Error::ValidationError(format!(
                "request path `{}` must begin with `/`",
                spec.path
            )));
        }

        let raw = format!("{}{}", base_url.trim_end_matches('/'), spec.path);
        let mut url = Url::parse(&raw)
            .map_err(|err| Error::InvalidEndpoint(format!("Invalid request URL `{raw}`: {err}")))?;
        if !spec.query.is_empty() {
            let mut pairs = url.query_pairs_mut();
            for (key, value) in spec.query.iter() {
                pairs.append_pair(key, value);
            }
        }

        let headers = standard_headers(credentials, user_agent)?;

        Ok(Self {
            method: spec.method.clone(),
            url,
            headers,
            body: spec.body.clone().unwrap_or_default(),
        })
    }

    /// HTTP method.
    #[must_use]
    pub const fn method(&self) -> &Method {
        &self.method
    }

    /// Target URL, including the query string.
    #[must_use]
    pub const fn url(&self) -> &Url {
        &self.url
    }

    /// Header set.
    #[must_use]
    pub const fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// Encoded body (empty when the call has none).
    #[must_use]
    pub const fn body(&self) -> &Bytes {
        &self.body
    }

    /// Build a `reqwest` request for one attempt.
    #[must_use]
    pub fn to_reqwest(&self, http: &reqwest::Client) -> reqwest::RequestBuilder {
        http.request(self.method.clone(), self.url.clone())
            .headers(self.headers.clone())
            .body(self.body.clone())
    }
}

fn standard_headers(credentials: &CredentialSnapshot, user_agent: &str) -> Result<HeaderMap> {
    let mut headers = HeaderMap::new();
    headers.insert(CONTENT_TYPE, HeaderValue::from_static(JSON_CONTENT_TYPE));
    headers.insert(ACCEPT, HeaderValue::from_static(JSON_CONTENT_TYPE));
    headers.insert(USER_AGENT, header_value("User-Agent", user_agent, false)?);
    headers.insert(
        X_PROJECT_ID,
        header_value("X-Project-Id", &credentials.project_id, false)?,
    );
    if let Some(material) = &credentials.basic_auth {
        let value = format!("Basic {}", material.expose_secret());
        headers.insert(AUTHORIZATION, header_value("Authorization", &value, true)?);
    }
    if let Some(token) = &credentials.token {
        headers.insert(X_AUTH_TOKEN, header_value("X-Auth-Token", token.secret(), true)?);
    }
    headers.insert(X_AUTH_TYPE, HeaderValue::from_static(credentials.auth_type));
    Ok(headers)
}

fn header_value(name: &str, value: &str, sensitive: bool) -> Result<HeaderValue> {
    let mut header = HeaderValue::from_str(value)
        .map_err(|_| Error::ValidationError(format!("invalid value for header {name}")))?;
    header.set_sensitive(sensitive);
    Ok(header)
}

/// Validate an identifier before interpolating it into a resource path.
///
/// Empty identifiers would otherwise collapse an item path onto its
/// collection endpoint.
///
/// # Errors
///
/// Returns [`Error::ValidationError`] if `value` is empty, consists only of
/// dots, or contains `/`, `?` or `#`.
pub fn path_segment<'a>(field: &str, value: &'a str) -> Result<&'a str> {
    if value.trim().is_empty() {
        return Err(Error::ValidationError(format!("{field} must not be empty")));
    }
    // URL parsing collapses dot segments onto the parent path.
    if value.chars().all(|c| c == '.') {
        return Err(Error::ValidationError(format!(
            "{field} `{value}` is not a valid identifier"
        )));
    }
    if value.contains(['/', '?', '#']) {
        return Err(Error::ValidationError(format!(
            "{field} `{value}` contains reserved characters"
        )));
    }
    Ok(value)
}
