//! Request tokens, the first leg of the delegated authorization exchange.

use core::fmt;

use reqwest::{
    Method, Request,
    header::{self, HeaderName, HeaderValue},
};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::{
    client::Client,
    execute::ExecuteRequest,
    manager::{ApiError, ApiResult, require, require_segment, unwrap_key},
    rest::{APPLICATION_FORM_URLENCODED, RestClient},
    signer::{HmacSha1, OAUTH1_CALLBACK_OUT_OF_BAND, Signer},
};

use super::{PATH_PREFIX, TokenResponse};

/// Header carrying the project a request token is scoped to.
pub const REQUESTED_PROJECT_ID: HeaderName = HeaderName::from_static("requested_project_id");

// REQUEST TOKEN ///////////////////////////////////////////////////////////////

/// Unauthorized token pair obtained with consumer credentials.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequestToken {
    pub key: String,
    pub secret: String,
    #[serde(default)]
    pub expires: Option<String>,
}

impl fmt::Debug for RequestToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RequestToken")
            .field("key", &self.key)
            .field("expires", &self.expires)
            .finish_non_exhaustive()
    }
}

impl From<TokenResponse> for RequestToken {
    fn from(response: TokenResponse) -> Self {
        Self {
            key: response.oauth_token,
            secret: response.oauth_token_secret,
            expires: response.oauth_expires_at,
        }
    }
}

impl RequestToken {
    pub fn id(&self) -> &str {
        &self.key
    }

    /// Authorizes this request token with the given roles on behalf of the
    /// user the `client` is authenticated as.
    ///
    /// # Errors
    ///
    /// See [`RequestTokenManager::authorize`].
    pub async fn authorize<T: ExecuteRequest>(
        &self,
        client: &Client<T>,
        role_ids: &[&str],
    ) -> ApiResult<Verifier, T> {
        client.request_tokens().authorize(&self.key, role_ids).await
    }
}

// VERIFIER ////////////////////////////////////////////////////////////////////

/// Proof that a user approved a request token. Single use.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Verifier {
    pub oauth_verifier: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Serialize)]
struct RoleRef<'a> {
    id: &'a str,
}

#[derive(Debug, Serialize)]
struct AuthorizeBody<'a> {
    roles: Vec<RoleRef<'a>>,
}

// REQUEST TOKEN MANAGER ///////////////////////////////////////////////////////

#[derive(Debug)]
pub struct RequestTokenManager<'a, T> {
    client: &'a Client<T>,
}

impl<T> Client<T> {
    pub fn request_tokens(&self) -> RequestTokenManager<'_, T> {
        RequestTokenManager { client: self }
    }
}

impl<T: ExecuteRequest> RequestTokenManager<'_, T> {
    /// Requests a new token pair for the consumer, scoped to `project_id`.
    ///
    /// The call is signed with the consumer credentials only and an
    /// out-of-band callback. The server answers with form encoded data.
    ///
    /// # Errors
    ///
    /// If an argument is empty, the signature cannot be computed, or the
    /// server rejects the request.
    #[cfg_attr(
        feature = "tracing",
        tracing::instrument(skip(self, consumer_secret))
    )]
    pub async fn create(
        &self,
        consumer_key: &str,
        consumer_secret: &str,
        project_id: &str,
    ) -> ApiResult<RequestToken, T> {
        require::<T>("consumer_key", consumer_key)?;
        require::<T>("project_id", project_id)?;

        let url = self
            .client
            .endpoint()
            .join(&format!("{PATH_PREFIX}/request_token"))?;

        let authorization = Signer::<HmacSha1>::new(consumer_key, consumer_secret)?
            .with_callback(OAUTH1_CALLBACK_OUT_OF_BAND)
            .sign(&Method::POST, &url)?;

        let mut authorization = authorization.parse::<HeaderValue>()?;
        authorization.set_sensitive(true);

        debug!(endpoint = %url, %consumer_key, %project_id, "request a request token");

        let mut request = Request::new(Method::POST, url);

        let headers = request.headers_mut();
        let _ = headers.try_insert(header::AUTHORIZATION, authorization)?;
        let _ = headers.try_insert(REQUESTED_PROJECT_ID, project_id.parse::<HeaderValue>()?)?;
        let _ = headers.try_insert(header::CONTENT_TYPE, APPLICATION_FORM_URLENCODED)?;

        let response: TokenResponse = self.client.form(request).await?;

        Ok(RequestToken::from(response))
    }

    /// Authorizes the request token `request_key` with the given roles and
    /// returns the verifier to hand back to the consumer.
    ///
    /// # Errors
    ///
    /// If no role is given, or the server rejects the request.
    #[cfg_attr(feature = "tracing", tracing::instrument(skip(self)))]
    pub async fn authorize(&self, request_key: &str, role_ids: &[&str]) -> ApiResult<Verifier, T> {
        require_segment::<T>("request_key", request_key)?;

        if role_ids.is_empty() {
            return Err(ApiError::Validation {
                field: "role_ids",
                reason: "at least one role is required",
            });
        }

        let url = self
            .client
            .endpoint()
            .join(&format!(
                "{PATH_PREFIX}/authorize/{}",
                urlencoding::encode(request_key)
            ))?;

        let body = AuthorizeBody {
            roles: role_ids.iter().map(|&id| RoleRef { id }).collect(),
        };

        let envelope: Map<String, Value> = self.client.put(url, &body).await?;

        unwrap_key::<Verifier, T>(envelope, "token")
    }
}
