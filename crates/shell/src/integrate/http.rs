//! Bearer-header injection for outgoing requests.
//!
//! [`AuthHeaderLayer`] decorates any tower HTTP client service and
//! [`AuthorizedClient`] decorates a `reqwest::Client`. Both read the token
//! per request rather than at construction, so a later login or logout is
//! picked up. Responses and errors from the wrapped client pass through
//! untouched.

use std::task::{Context, Poll};

use http::{HeaderMap, Method, Request};
use reqwest::{IntoUrl, RequestBuilder, Response};
use tower::{Layer, Service};

use crate::auth::Auth;

/// Layer producing [`AuthHeader`] services.
#[derive(Debug, Clone)]
pub struct AuthHeaderLayer {
    auth: Auth,
}

impl AuthHeaderLayer {
    #[must_use]
    pub const fn new(auth: Auth) -> Self {
        Self { auth }
    }
}

impl<S> Layer<S> for AuthHeaderLayer {
    type Service = AuthHeader<S>;

    fn layer(&self, inner: S) -> Self::Service {
        AuthHeader {
            inner,
            auth: self.auth.clone(),
        }
    }
}

/// Adds `Authorization: Bearer <token>` to each request when a token is
/// stored.
#[derive(Debug, Clone)]
pub struct AuthHeader<S> {
    inner: S,
    auth: Auth,
}

impl<S, B> Service<Request<B>> for AuthHeader<S>
where
    S: Service<Request<B>>,
{
    type Response = S::Response;
    type Error = S::Error;
    type Future = S::Future;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, mut request: Request<B>) -> Self::Future {
        *request.headers_mut() = self.auth.add_auth_header(request.headers());
        self.inner.call(request)
    }
}

/// A `reqwest::Client` whose requests carry the session's bearer header.
#[derive(Debug, Clone)]
pub struct AuthorizedClient {
    client: reqwest::Client,
    auth: Auth,
}

impl AuthorizedClient {
    #[must_use]
    pub const fn new(client: reqwest::Client, auth: Auth) -> Self {
        Self { client, auth }
    }

    /// The undecorated client.
    #[must_use]
    pub const fn inner(&self) -> &reqwest::Client {
        &self.client
    }

    /// Start a request with the bearer header already set.
    pub fn request<U: IntoUrl>(&self, method: Method, url: U) -> RequestBuilder {
        self.client
            .request(method, url)
            .headers(self.auth.add_auth_header(&HeaderMap::new()))
    }

    pub fn get<U: IntoUrl>(&self, url: U) -> RequestBuilder {
        self.request(Method::GET, url)
    }

    pub fn post<U: IntoUrl>(&self, url: U) -> RequestBuilder {
        self.request(Method::POST, url)
    }

    pub fn put<U: IntoUrl>(&self, url: U) -> RequestBuilder {
        self.request(Method::PUT, url)
    }

    pub fn delete<U: IntoUrl>(&self, url: U) -> RequestBuilder {
        self.request(Method::DELETE, url)
    }

    /// Add the bearer header to a request built elsewhere.
    pub fn authorize(&self, request: &mut reqwest::Request) {
        *request.headers_mut() = self.auth.add_auth_header(request.headers());
    }

    /// Send a prebuilt request, adding the bearer header first.
    ///
    /// # Errors
    ///
    /// Returns whatever error the underlying client returns.
    pub async fn execute(&self, mut request: reqwest::Request) -> reqwest::Result<Response> {
        self.authorize(&mut request);
        self.client.execute(request).await
    }
}
