//! # OAuth 1.0a delegated authorization
//!
//! Three-legged exchange against the `OS-OAUTH1` extension of the identity
//! service:
//!
//! 1. a registered [`Consumer`] asks for a [`RequestToken`] scoped to a
//!    project, signing the call with its own key and secret;
//! 2. a user holding roles on the project authorizes the request token and
//!    gets back a [`Verifier`];
//! 3. the consumer exchanges the request token and the verifier for an
//!    [`AccessToken`].
//!
//! None of these steps is idempotent: posting twice to `request_token`
//! creates two token pairs, so failed steps are surfaced and never retried.
//! Each authorization flow must use its own request token.

use serde::Deserialize;

pub mod access_tokens;
pub mod consumers;
pub mod request_tokens;

pub use access_tokens::{AccessToken, AccessTokenInfo, AccessTokenManager};
pub use consumers::{Consumer, ConsumerManager, ConsumerUpdate};
pub use request_tokens::{RequestToken, RequestTokenManager, Verifier};

pub const PATH_PREFIX: &str = "OS-OAUTH1";

/// Form encoded body returned by the `request_token` and `access_token`
/// endpoints.
#[derive(Debug, Deserialize)]
pub(crate) struct TokenResponse {
    pub oauth_token: String,
    pub oauth_token_secret: String,
    #[serde(default)]
    pub oauth_expires_at: Option<String>,
}
