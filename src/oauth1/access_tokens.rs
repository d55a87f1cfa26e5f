//! Access tokens, the last leg of the delegated authorization exchange, and
//! their administration on behalf of the authorizing user.

use core::fmt;

use reqwest::{
    Method, Request,
    header::{self, HeaderValue},
};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::{
    client::Client,
    credentials::Credentials,
    execute::ExecuteRequest,
    manager::{ApiResult, CrudManager, require, require_segment},
    resource::{Parent, Resource},
    rest::{APPLICATION_FORM_URLENCODED, RestClient},
    signer::{HmacSha1, Signer},
};

use super::{PATH_PREFIX, TokenResponse};

// ACCESS TOKEN ////////////////////////////////////////////////////////////////

/// Authorized token pair, usable to sign requests on behalf of the user who
/// approved the request token.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccessToken {
    pub key: String,
    pub secret: String,
    /// Expiry as sent by the server, if any.
    #[serde(default)]
    pub expires: Option<String>,
}

impl fmt::Debug for AccessToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AccessToken")
            .field("key", &self.key)
            .field("expires", &self.expires)
            .finish_non_exhaustive()
    }
}

impl From<TokenResponse> for AccessToken {
    fn from(response: TokenResponse) -> Self {
        Self {
            key: response.oauth_token,
            secret: response.oauth_token_secret,
            expires: response.oauth_expires_at,
        }
    }
}

impl AccessToken {
    pub fn id(&self) -> &str {
        &self.key
    }

    /// Returns credentials signing every request with this token and the
    /// consumer it was issued to.
    pub fn credentials(&self, consumer_key: &str, consumer_secret: &str) -> Credentials {
        Credentials::oauth1(&*self.key, &*self.secret, consumer_key, consumer_secret)
    }
}

// ACCESS TOKEN INFO ///////////////////////////////////////////////////////////

/// Access token as listed by the identity service. Never carries the secret.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccessTokenInfo {
    pub id: String,
    #[serde(default)]
    pub consumer_id: Option<String>,
    #[serde(default)]
    pub project_id: Option<String>,
    #[serde(default)]
    pub authorizing_user_id: Option<String>,
    #[serde(default)]
    pub expires_at: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl PartialEq for AccessTokenInfo {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for AccessTokenInfo {}

impl Resource for AccessTokenInfo {
    const COLLECTION_KEY: &'static str = "access_tokens";
    const KEY: &'static str = "access_token";

    fn id(&self) -> &str {
        &self.id
    }
}

// ACCESS TOKEN MANAGER ////////////////////////////////////////////////////////

#[derive(Debug)]
pub struct AccessTokenManager<'a, T> {
    crud: CrudManager<'a, T, AccessTokenInfo>,
}

impl<T> Client<T> {
    pub fn access_tokens(&self) -> AccessTokenManager<'_, T> {
        AccessTokenManager {
            crud: CrudManager::new(self),
        }
    }
}

fn user_base(user_id: &str) -> String {
    format!("{}/{PATH_PREFIX}", Parent::User(user_id).base_path())
}

impl<T: ExecuteRequest> AccessTokenManager<'_, T> {
    /// Exchanges an authorized request token and its verifier for an access
    /// token.
    ///
    /// The call is signed with the consumer credentials, the request token and
    /// the verifier. The server answers with form encoded data.
    ///
    /// # Errors
    ///
    /// If an argument is empty, the signature cannot be computed, or the
    /// server rejects the request (e.g. the verifier was already used).
    #[cfg_attr(
        feature = "tracing",
        tracing::instrument(skip(self, consumer_secret, request_secret, verifier))
    )]
    pub async fn create(
        &self,
        consumer_key: &str,
        consumer_secret: &str,
        request_key: &str,
        request_secret: &str,
        verifier: &str,
    ) -> ApiResult<AccessToken, T> {
        require::<T>("consumer_key", consumer_key)?;
        require::<T>("request_key", request_key)?;
        require::<T>("verifier", verifier)?;

        let client = self.crud.client();
        let url = client
            .endpoint()
            .join(&format!("{PATH_PREFIX}/access_token"))?;

        let authorization = Signer::<HmacSha1>::new(consumer_key, consumer_secret)?
            .with_token(request_key, request_secret)
            .with_verifier(verifier)
            .sign(&Method::POST, &url)?;

        let mut authorization = authorization.parse::<HeaderValue>()?;
        authorization.set_sensitive(true);

        debug!(endpoint = %url, %consumer_key, %request_key, "exchange a request token");

        let mut request = Request::new(Method::POST, url);

        let headers = request.headers_mut();
        let _ = headers.try_insert(header::AUTHORIZATION, authorization)?;
        let _ = headers.try_insert(header::CONTENT_TYPE, APPLICATION_FORM_URLENCODED)?;

        let response: TokenResponse = client.form(request).await?;

        Ok(AccessToken::from(response))
    }

    /// Lists the access tokens the user authorized.
    pub async fn list_for_user(&self, user_id: &str) -> ApiResult<Vec<AccessTokenInfo>, T> {
        require_segment::<T>("user_id", user_id)?;
        self.crud.list(Some(&user_base(user_id)), &()).await
    }

    pub async fn get_for_user(&self, user_id: &str, id: &str) -> ApiResult<AccessTokenInfo, T> {
        require_segment::<T>("user_id", user_id)?;
        self.crud.get(Some(&user_base(user_id)), id).await
    }

    /// Revokes an access token of the user.
    pub async fn delete_for_user(&self, user_id: &str, id: &str) -> ApiResult<(), T> {
        require_segment::<T>("user_id", user_id)?;
        self.crud.delete(Some(&user_base(user_id)), id).await
    }
}
