//! OAuth 1.0a signature implementation.
//!
//! Builds the `Authorization` header of signed requests following the OAuth
//! 1.0 core protocol: parameters are percent-encoded, sorted, joined with the
//! request method and base url, then digested with the two-part signing key
//! `{consumer_secret}&{token_secret}`.

use core::{fmt, marker::PhantomData};
use std::time::{SystemTime, SystemTimeError};

use base64::{Engine, engine::general_purpose::STANDARD as BASE64_ENGINE};
use crypto_common::InvalidLength;
use hmac::{Hmac, Mac};
use reqwest::{Method, Url};
use sha1::Sha1;
use uuid::Uuid;

#[cfg(feature = "metrics")]
use crate::metrics;

// SIGNATURE METHOD ////////////////////////////////////////////////////////////

pub trait SignatureMethod {
    type Error: fmt::Debug + fmt::Display;

    const SIGNATURE_METHOD: &'static str;

    /// Returns the base64-encoded signature.
    ///
    /// # Errors
    ///
    /// If digestion failed.
    fn digest(key: &str, base: &str) -> Result<String, Self::Error>;
}

// HMAC-SHA1 ///////////////////////////////////////////////////////////////////

pub type HmacSha1 = Hmac<Sha1>;

impl SignatureMethod for HmacSha1 {
    type Error = InvalidLength;

    const SIGNATURE_METHOD: &'static str = "HMAC-SHA1";

    #[inline]
    fn digest(key: &str, base: &str) -> Result<String, Self::Error> {
        let hash_value = {
            let mut hasher = HmacSha1::new_from_slice(key.as_bytes())?;
            hasher.update(base.as_bytes());
            hasher.finalize().into_bytes()
        };
        Ok(BASE64_ENGINE.encode(hash_value))
    }
}

// ERROR ///////////////////////////////////////////////////////////////////////

#[derive(Debug, thiserror::Error)]
pub enum SignError<T: SignatureMethod = HmacSha1> {
    #[error("failed to compute time since Unix Epoch, {0}")]
    Clock(#[from] SystemTimeError),
    #[error("failed to generate signature for {method}, {0}", method = T::SIGNATURE_METHOD)]
    Digest(T::Error),
}

// SIGNER //////////////////////////////////////////////////////////////////////

pub const OAUTH1_CALLBACK: &str = "oauth_callback";
pub const OAUTH1_CALLBACK_OUT_OF_BAND: &str = "oob";
pub const OAUTH1_CONSUMER_KEY: &str = "oauth_consumer_key";
pub const OAUTH1_NONCE: &str = "oauth_nonce";
pub const OAUTH1_SIGNATURE: &str = "oauth_signature";
pub const OAUTH1_SIGNATURE_METHOD: &str = "oauth_signature_method";
pub const OAUTH1_TIMESTAMP: &str = "oauth_timestamp";
pub const OAUTH1_TOKEN: &str = "oauth_token";
pub const OAUTH1_VERIFIER: &str = "oauth_verifier";
pub const OAUTH1_VERSION: &str = "oauth_version";
pub const OAUTH1_VERSION_1: &str = "1.0";

/// OAuth 1.0a signer.
///
/// A signer is consumed by [`Signer::sign`], so a nonce is never reused
/// across two requests.
pub struct Signer<'a, T = HmacSha1> {
    nonce: String,
    timestamp: String,
    consumer_key: &'a str,
    consumer_secret: &'a str,
    token: Option<(&'a str, &'a str)>,
    callback: Option<&'a str>,
    verifier: Option<&'a str>,
    _marker: PhantomData<T>,
}

impl<T> fmt::Debug for Signer<'_, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Signer")
            .field("nonce", &self.nonce)
            .field("timestamp", &self.timestamp)
            .field("consumer_key", &self.consumer_key)
            .field("token", &self.token.map(|(token, _)| token))
            .finish_non_exhaustive()
    }
}

impl<'a, T: SignatureMethod> Signer<'a, T> {
    /// Returns a new `Signer` with a random nonce and the current timestamp.
    ///
    /// # Errors
    ///
    /// If system's clock went backwards.
    pub fn new(consumer_key: &'a str, consumer_secret: &'a str) -> Result<Self, SignError<T>> {
        let nonce = Uuid::new_v4().simple().to_string();

        let timestamp = SystemTime::now()
            .duration_since(SystemTime::UNIX_EPOCH)?
            .as_secs()
            .to_string();

        Ok(Self::with_nonce_and_timestamp(
            consumer_key,
            consumer_secret,
            nonce,
            timestamp,
        ))
    }

    /// Returns a new `Signer` using the given `nonce` and `timestamp`.
    pub fn with_nonce_and_timestamp(
        consumer_key: &'a str,
        consumer_secret: &'a str,
        nonce: impl Into<String>,
        timestamp: impl Into<String>,
    ) -> Self {
        Self {
            nonce: nonce.into(),
            timestamp: timestamp.into(),
            consumer_key,
            consumer_secret,
            token: None,
            callback: None,
            verifier: None,
            _marker: PhantomData,
        }
    }

    /// Sets the resource owner credentials, i.e. a request or an access token.
    #[must_use]
    pub fn with_token(mut self, token: &'a str, secret: &'a str) -> Self {
        self.token = Some((token, secret));
        self
    }

    #[must_use]
    pub fn with_callback(mut self, callback: &'a str) -> Self {
        self.callback = Some(callback);
        self
    }

    #[must_use]
    pub fn with_verifier(mut self, verifier: &'a str) -> Self {
        self.verifier = Some(verifier);
        self
    }

    /// Returns OAuth 1.0a protocol parameters without the signature.
    fn params(&self) -> Vec<(&str, &str)> {
        let mut params = vec![
            (OAUTH1_CONSUMER_KEY, self.consumer_key),
            (OAUTH1_NONCE, self.nonce.as_str()),
            (OAUTH1_SIGNATURE_METHOD, T::SIGNATURE_METHOD),
            (OAUTH1_TIMESTAMP, self.timestamp.as_str()),
            (OAUTH1_VERSION, OAUTH1_VERSION_1),
        ];

        if let Some((token, _)) = self.token {
            params.push((OAUTH1_TOKEN, token));
        }
        if let Some(callback) = self.callback {
            params.push((OAUTH1_CALLBACK, callback));
        }
        if let Some(verifier) = self.verifier {
            params.push((OAUTH1_VERIFIER, verifier));
        }

        params
    }

    /// Returns the signature base string of a request.
    pub fn base_string(&self, method: &Method, endpoint: &Url) -> String {
        let query = endpoint.query_pairs().collect::<Vec<_>>();

        let mut params = self
            .params()
            .into_iter()
            .chain(query.iter().map(|(k, v)| (k.as_ref(), v.as_ref())))
            .map(|(k, v)| (urlencoding::encode(k), urlencoding::encode(v)))
            .collect::<Vec<_>>();

        params.sort();

        let params = params
            .iter()
            .map(|(k, v)| format!("{k}={v}"))
            .collect::<Vec<_>>()
            .join("&");

        let base_url = format!(
            "{}{}",
            endpoint.origin().ascii_serialization(),
            endpoint.path()
        );

        format!(
            "{}&{}&{}",
            urlencoding::encode(method.as_str()),
            urlencoding::encode(&base_url),
            urlencoding::encode(&params)
        )
    }

    fn signing_key(&self) -> String {
        let token_secret = self.token.map_or("", |(_, secret)| secret);

        format!(
            "{}&{}",
            urlencoding::encode(self.consumer_secret),
            urlencoding::encode(token_secret)
        )
    }

    /// Returns the base64-encoded signature of a request.
    ///
    /// # Errors
    ///
    /// If digestion failed.
    pub fn signature(&self, method: &Method, endpoint: &Url) -> Result<String, SignError<T>> {
        T::digest(&self.signing_key(), &self.base_string(method, endpoint))
            .map_err(SignError::Digest)
    }

    /// Returns the formatted value for the Authorization header.
    ///
    /// # Errors
    ///
    /// If signature failed.
    pub fn sign(self, method: &Method, endpoint: &Url) -> Result<String, SignError<T>> {
        let signature = self.signature(method, endpoint)?;

        #[cfg(feature = "metrics")]
        metrics::OAUTH1_SIGNATURE
            .with_label_values(&[endpoint.as_str()])
            .inc();

        let mut params = self.params();
        params.push((OAUTH1_SIGNATURE, signature.as_str()));

        let mut params = params
            .into_iter()
            .map(|(k, v)| format!("{k}=\"{}\"", urlencoding::encode(v)))
            .collect::<Vec<_>>();

        params.sort();

        Ok(format!("OAuth {}", params.join(", ")))
    }
}
