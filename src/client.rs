//! HTTP client

use core::{fmt, future::Future};

use reqwest::{Request, Response, Url};

use crate::{
    credentials::{AuthorizationError, Credentials},
    execute::ExecuteRequest,
};

// CLIENT ERROR ////////////////////////////////////////////////////////////////

#[derive(Debug, thiserror::Error)]
pub enum ClientError<E = reqwest::Error> {
    #[error("failed to authorize request, {0}")]
    Authorize(#[from] AuthorizationError),
    #[error("failed to execute request, {0}")]
    Execute(E),
}

// CLIENT //////////////////////////////////////////////////////////////////////

/// Identity service client with optional [`Credentials`].
///
/// Every resource manager borrows the client, so a single client (and the
/// connection pool of its transport) is shared by all of them. When
/// credentials are provided, the client will ensure requests are authorized
/// before they are executed.
#[derive(Debug, Clone)]
#[must_use]
pub struct Client<T = reqwest::Client> {
    inner: T,
    endpoint: Url,
    credentials: Option<Credentials>,
}

impl Client {
    /// Returns a client for the identity service at `endpoint`, e.g.
    /// `https://keystone.example.com:5000/v3`.
    pub fn new(endpoint: Url) -> Self {
        Self::with_inner(reqwest::Client::new(), endpoint)
    }
}

impl<T> Client<T> {
    /// Returns a client executing its requests through `inner`.
    pub fn with_inner(inner: T, mut endpoint: Url) -> Self {
        if !endpoint.path().ends_with('/') {
            let path = format!("{}/", endpoint.path());
            endpoint.set_path(&path);
        }

        Self {
            inner,
            endpoint,
            credentials: None,
        }
    }

    /// Returns the base endpoint of the identity service, always ending with `/`.
    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }

    /// Returns a shared reference to the inner HTTP client.
    pub fn inner(&self) -> &T {
        &self.inner
    }
}

impl<T: fmt::Debug> Client<T> {
    /// Sets the `credentials` to be used by the client to authorize HTTP request,
    /// discarding the current value, if any.
    #[cfg_attr(feature = "tracing", tracing::instrument)]
    pub fn set_credentials(&mut self, credentials: Option<Credentials>) {
        self.credentials = credentials;
    }

    /// Fills the `credentials` to be used by the client to authorize HTTP request,
    /// discarding the current value, if any.
    pub fn with_credentials(mut self, credentials: impl Into<Option<Credentials>>) -> Self {
        self.set_credentials(credentials.into());
        self
    }

    /// Returns the credentials that will be used by this client to authorize
    /// subsequent HTTP requests.
    pub fn credentials(&self) -> Option<&Credentials> {
        self.credentials.as_ref()
    }

    /// Appends an authorization header to the `request`, if this client has
    /// credentials and unless it is already set.
    ///
    /// Returns `true` if a header was inserted.
    ///
    /// # Errors
    ///
    /// Upon failure to produce the header value.
    ///
    /// If the client doesn't have credentials, this method is infallible.
    #[cfg_attr(feature = "tracing", tracing::instrument(skip(request)))]
    pub fn authorize(&self, request: &mut Request) -> Result<bool, AuthorizationError> {
        match self.credentials() {
            None => Ok(false),
            Some(credentials) => credentials.authorize(request),
        }
    }
}

impl<T: ExecuteRequest> ExecuteRequest for Client<T> {
    type Error = ClientError<T::Error>;

    fn execute_request(
        &self,
        mut request: Request,
    ) -> impl Future<Output = Result<Response, Self::Error>> + Send + 'static {
        let result = self
            .authorize(&mut request)
            .map(|_| self.inner.execute_request(request));

        async move { result?.await.map_err(ClientError::Execute) }
    }
}

#[cfg(feature = "zeroize")]
impl<T> Drop for Client<T> {
    fn drop(&mut self) {
        use zeroize::Zeroize;

        if let Some(mut credentials) = self.credentials.take() {
            credentials.zeroize();
        }
    }
}
