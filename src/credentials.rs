//! Credentials.

use core::fmt;

use reqwest::{
    Request,
    header::{self, HeaderName, HeaderValue},
};

use crate::signer::{HmacSha1, SignError, Signer};

pub const X_AUTH_TOKEN: HeaderName = HeaderName::from_static("x-auth-token");

// AUTHORIZATION ERROR /////////////////////////////////////////////////////////

#[derive(Debug, thiserror::Error)]
pub enum AuthorizationError {
    #[error(transparent)]
    OAuth10a(#[from] SignError<HmacSha1>),
    #[error(transparent)]
    ParseHeaderValue(#[from] header::InvalidHeaderValue),
    #[error("too many headers")]
    TooManyHeader(#[from] header::MaxSizeReached),
}

// CREDENTIALS KIND ////////////////////////////////////////////////////////////

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub enum CredentialsKind {
    Token,
    OAuth1,
}

// CREDENTIALS /////////////////////////////////////////////////////////////////

/// Credentials used to authorize an HTTP request against the identity service.
///
/// `Token` is a scoped identity token sent as `X-Auth-Token`. `OAuth1` is a
/// delegated access token, obtained through the three-legged exchange, used
/// to sign each request.
#[derive(Clone, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(untagged)]
#[cfg_attr(feature = "zeroize", derive(zeroize::Zeroize))]
pub enum Credentials {
    OAuth1 {
        #[serde(rename = "token", alias = "oauth-token", alias = "oauth_token")]
        token: String,
        #[serde(rename = "secret", alias = "oauth-secret", alias = "oauth_secret")]
        secret: String,
        #[serde(
            rename = "consumer-key",
            alias = "consumer_key",
            alias = "oauth-consumer-key",
            alias = "oauth_consumer_key"
        )]
        consumer_key: String,
        #[serde(
            rename = "consumer-secret",
            alias = "consumer_secret",
            alias = "oauth-consumer-secret",
            alias = "oauth_consumer_secret"
        )]
        consumer_secret: String,
    },
    Token {
        #[serde(rename = "token", alias = "auth-token", alias = "auth_token")]
        token: String,
    },
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(&self.kind(), f)
    }
}

impl Credentials {
    pub const fn kind(&self) -> CredentialsKind {
        match self {
            Self::Token { .. } => CredentialsKind::Token,
            Self::OAuth1 { .. } => CredentialsKind::OAuth1,
        }
    }

    pub fn token(token: impl Into<String>) -> Self {
        Self::Token {
            token: token.into(),
        }
    }

    pub fn oauth1(
        token: impl Into<String>,
        secret: impl Into<String>,
        consumer_key: impl Into<String>,
        consumer_secret: impl Into<String>,
    ) -> Self {
        Self::OAuth1 {
            token: token.into(),
            secret: secret.into(),
            consumer_key: consumer_key.into(),
            consumer_secret: consumer_secret.into(),
        }
    }

    /// Appends the authorization header matching these credentials to the
    /// `request`, unless the request is already authorized.
    ///
    /// Returns `true` if a header was inserted.
    ///
    /// # Errors
    ///
    /// Upon failure to produce the header value or if the request has too
    /// many headers.
    #[cfg_attr(feature = "tracing", tracing::instrument(skip(request)))]
    pub fn authorize(&self, request: &mut Request) -> Result<bool, AuthorizationError> {
        let headers = request.headers();
        if headers.contains_key(header::AUTHORIZATION) || headers.contains_key(X_AUTH_TOKEN) {
            return Ok(false);
        }

        let (name, mut value) = match self {
            Self::OAuth1 {
                token,
                secret,
                consumer_key,
                consumer_secret,
            } => {
                let authorization = Signer::<HmacSha1>::new(consumer_key, consumer_secret)?
                    .with_token(token, secret)
                    .sign(request.method(), request.url())?;

                (header::AUTHORIZATION, authorization.parse::<HeaderValue>()?)
            }
            Self::Token { token } => (X_AUTH_TOKEN, token.parse::<HeaderValue>()?),
        };

        value.set_sensitive(true);

        request.headers_mut().try_append(name, value)?;

        trace!(method = %request.method(), endpoint = %request.url(), "authorized request");

        Ok(true)
    }
}
