//! `RESTful` API client.

use core::{fmt, future::Future, str};
use std::borrow::Cow;

use bytes::Bytes;
use reqwest::{
    Method, Request, StatusCode, Url,
    header::{self, HeaderValue},
};
use serde::{Deserialize, Serialize, de::DeserializeOwned};

use crate::execute::ExecuteRequest;

pub const APPLICATION_JSON: HeaderValue = HeaderValue::from_static("application/json");

pub const APPLICATION_FORM_URLENCODED: HeaderValue =
    HeaderValue::from_static("application/x-www-form-urlencoded");

pub const UTF8: HeaderValue = HeaderValue::from_static("utf-8");

// STATUS KIND /////////////////////////////////////////////////////////////////

/// Classification of a non-successful status code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StatusKind {
    BadRequest,
    Unauthorized,
    Forbidden,
    NotFound,
    Conflict,
    /// Any other client error.
    Request,
    Server,
    Unexpected,
}

impl From<StatusCode> for StatusKind {
    fn from(status_code: StatusCode) -> Self {
        match status_code {
            StatusCode::BAD_REQUEST => Self::BadRequest,
            StatusCode::UNAUTHORIZED => Self::Unauthorized,
            StatusCode::FORBIDDEN => Self::Forbidden,
            StatusCode::NOT_FOUND => Self::NotFound,
            StatusCode::CONFLICT => Self::Conflict,
            _ if status_code.is_client_error() => Self::Request,
            _ if status_code.is_server_error() => Self::Server,
            _ => Self::Unexpected,
        }
    }
}

// ERROR RESPONSE //////////////////////////////////////////////////////////////

/// Non-successful response returned by the identity service.
#[derive(Debug, Clone, PartialEq, Eq, Hash, thiserror::Error)]
#[error("error response with status code {status_code}, {message}")]
pub struct ErrorResponse {
    pub status_code: StatusCode,
    pub kind: StatusKind,
    pub message: String,
}

#[derive(Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Deserialize)]
struct ErrorBody {
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    title: Option<String>,
}

impl ErrorResponse {
    /// Reads the message from the `{"error": {"message": ...}}` envelope,
    /// falling back to the raw body.
    pub fn from_body(status_code: StatusCode, body: &[u8]) -> Self {
        let message = match serde_json::from_slice::<ErrorEnvelope>(body) {
            Ok(ErrorEnvelope {
                error: ErrorBody {
                    message: Some(message),
                    ..
                },
            }) => message,
            Ok(ErrorEnvelope {
                error: ErrorBody {
                    title: Some(title), ..
                },
            }) => title,
            _ => String::from_utf8_lossy(body).trim().to_owned(),
        };

        Self {
            status_code,
            kind: StatusKind::from(status_code),
            message,
        }
    }
}

// REST ERROR //////////////////////////////////////////////////////////////////

#[derive(Debug, thiserror::Error)]
pub enum RestError<E> {
    #[error(transparent)]
    Execute(E),
    #[error("failed to serialize body, {0}")]
    Serialize(serde_json::Error),
    #[error("invalid url endpoint, {0}")]
    Url(#[from] url::ParseError),
    #[error("failed to aggregate body, {0}")]
    BodyAggregation(reqwest::Error),
    #[error("failed to insert header: too many entries")]
    TooManyHeaders(#[from] header::MaxSizeReached),
    #[error(transparent)]
    Response(#[from] ErrorResponse),
    #[error("malformed response, {0}")]
    MalformedResponse(String),
}

impl<E> RestError<E> {
    /// Returns the kind of the error response, if the service answered with
    /// a non-successful status code.
    pub fn status_kind(&self) -> Option<StatusKind> {
        match self {
            Self::Response(response) => Some(response.kind),
            _ => None,
        }
    }
}

// BODY DECODING ///////////////////////////////////////////////////////////////

/// Deserializes a JSON body.
///
/// # Errors
///
/// If the body is not JSON of the expected shape.
pub fn decode_json<O: DeserializeOwned>(body: &[u8]) -> Result<O, String> {
    serde_json::from_slice(body).map_err(|err| format!("expected a json body, {err}"))
}

/// Deserializes an `application/x-www-form-urlencoded` body.
///
/// Some deployments wrap the form data in a JSON string, which is unwrapped
/// first.
///
/// # Errors
///
/// If the body is not form data of the expected shape.
pub fn decode_form<O: DeserializeOwned>(body: &[u8]) -> Result<O, String> {
    let text = str::from_utf8(body)
        .map_err(|err| format!("expected an utf-8 body, {err}"))?
        .trim();

    let text = if text.starts_with('"') {
        Cow::Owned(
            serde_json::from_str::<String>(text)
                .map_err(|err| format!("expected a json string, {err}"))?,
        )
    } else {
        Cow::Borrowed(text)
    };

    serde_urlencoded::from_str(&text).map_err(|err| format!("expected a form body, {err}"))
}

// REST CLIENT /////////////////////////////////////////////////////////////////

/// Extension trait for HTTP clients for working with `RESTful` web APIs.
///
/// Non-successful status codes are turned into [`ErrorResponse`]s and bodies
/// that cannot be decoded into [`RestError::MalformedResponse`].
pub trait RestClient: ExecuteRequest {
    /// Executes the `request` and returns the aggregated body of a
    /// successful response.
    fn send(
        &self,
        request: Request,
    ) -> impl Future<Output = Result<Bytes, RestError<Self::Error>>> + Send;

    /// Creates and executes an HTTP request that expects to receive a response
    /// which JSON body deserializes to `O`.
    fn request<I, O>(
        &self,
        method: Method,
        endpoint: Url,
        payload: Option<&I>,
    ) -> impl Future<Output = Result<O, RestError<Self::Error>>> + Send
    where
        I: ?Sized + Serialize + fmt::Debug + Send + Sync,
        O: DeserializeOwned + fmt::Debug + Send + Sync;

    /// Executes the `request` and deserializes the form encoded body of the
    /// response to `O`.
    fn form<O>(
        &self,
        request: Request,
    ) -> impl Future<Output = Result<O, RestError<Self::Error>>> + Send
    where
        O: DeserializeOwned + fmt::Debug + Send + Sync;

    fn get<O>(
        &self,
        endpoint: Url,
    ) -> impl Future<Output = Result<O, RestError<Self::Error>>> + Send
    where
        O: DeserializeOwned + fmt::Debug + Send + Sync,
    {
        self.request::<(), O>(Method::GET, endpoint, None)
    }

    fn post<I, O>(
        &self,
        endpoint: Url,
        payload: &I,
    ) -> impl Future<Output = Result<O, RestError<Self::Error>>> + Send
    where
        I: ?Sized + Serialize + fmt::Debug + Send + Sync,
        O: DeserializeOwned + fmt::Debug + Send + Sync,
    {
        self.request(Method::POST, endpoint, Some(payload))
    }

    fn put<I, O>(
        &self,
        endpoint: Url,
        payload: &I,
    ) -> impl Future<Output = Result<O, RestError<Self::Error>>> + Send
    where
        I: ?Sized + Serialize + fmt::Debug + Send + Sync,
        O: DeserializeOwned + fmt::Debug + Send + Sync,
    {
        self.request(Method::PUT, endpoint, Some(payload))
    }

    fn patch<I, O>(
        &self,
        endpoint: Url,
        payload: &I,
    ) -> impl Future<Output = Result<O, RestError<Self::Error>>> + Send
    where
        I: ?Sized + Serialize + fmt::Debug + Send + Sync,
        O: DeserializeOwned + fmt::Debug + Send + Sync,
    {
        self.request(Method::PATCH, endpoint, Some(payload))
    }

    fn delete(&self, endpoint: Url) -> impl Future<Output = Result<(), RestError<Self::Error>>> + Send;
}

impl<T: ExecuteRequest> RestClient for T {
    #[cfg_attr(feature = "tracing", tracing::instrument(skip_all))]
    async fn send(&self, request: Request) -> Result<Bytes, RestError<Self::Error>> {
        #[cfg(feature = "logging")]
        let (endpoint, method) = (request.url().to_string(), request.method().to_string());

        let response = self
            .execute_request(request)
            .await
            .map_err(RestError::Execute)?;

        let status_code = response.status();

        let full = response.bytes().await.map_err(RestError::BodyAggregation)?;

        if !status_code.is_success() {
            let response = ErrorResponse::from_body(status_code, &full);

            debug!(
                %endpoint,
                %method,
                status_code = %status_code,
                message = %response.message,
                "identity service answered with an error"
            );

            return Err(RestError::Response(response));
        }

        Ok(full)
    }

    #[cfg_attr(feature = "tracing", tracing::instrument(skip(self, payload)))]
    async fn request<I, O>(
        &self,
        method: Method,
        endpoint: Url,
        payload: Option<&I>,
    ) -> Result<O, RestError<Self::Error>>
    where
        I: ?Sized + Serialize + fmt::Debug + Send + Sync,
        O: DeserializeOwned + fmt::Debug + Send + Sync,
    {
        let buf = payload
            .map(serde_json::to_vec)
            .transpose()
            .map_err(RestError::Serialize)?;

        let mut request = Request::new(method, endpoint);

        let headers = request.headers_mut();
        let _ = headers.try_insert(header::ACCEPT_CHARSET, UTF8)?;
        let _ = headers.try_insert(header::ACCEPT, APPLICATION_JSON)?;

        if let Some(buf) = buf {
            let _ = headers.try_insert(header::CONTENT_TYPE, APPLICATION_JSON)?;
            let _ = headers.try_insert(header::CONTENT_LENGTH, HeaderValue::from(buf.len()))?;
            *request.body_mut() = Some(buf.into());
        }

        let full = self.send(request).await?;

        decode_json(&full).map_err(RestError::MalformedResponse)
    }

    #[cfg_attr(feature = "tracing", tracing::instrument(skip_all))]
    async fn form<O>(&self, request: Request) -> Result<O, RestError<Self::Error>>
    where
        O: DeserializeOwned + fmt::Debug + Send + Sync,
    {
        let full = self.send(request).await?;

        decode_form(&full).map_err(RestError::MalformedResponse)
    }

    #[cfg_attr(feature = "tracing", tracing::instrument(skip(self)))]
    async fn delete(&self, endpoint: Url) -> Result<(), RestError<Self::Error>> {
        let mut request = Request::new(Method::DELETE, endpoint);

        let _ = request
            .headers_mut()
            .try_insert(header::ACCEPT, APPLICATION_JSON)?;

        self.send(request).await.map(|_| ())
    }
}

#[cfg(test)]
mod tests {
    use serde::Deserialize;

    use super::*;

    #[derive(Debug, PartialEq, Deserialize)]
    struct Token {
        oauth_token: String,
        oauth_token_secret: String,
        #[serde(default)]
        oauth_expires_at: Option<String>,
    }

    #[test]
    fn status_codes_are_classified() {
        assert_eq!(StatusKind::from(StatusCode::BAD_REQUEST), StatusKind::BadRequest);
        assert_eq!(StatusKind::from(StatusCode::UNAUTHORIZED), StatusKind::Unauthorized);
        assert_eq!(StatusKind::from(StatusCode::FORBIDDEN), StatusKind::Forbidden);
        assert_eq!(StatusKind::from(StatusCode::NOT_FOUND), StatusKind::NotFound);
        assert_eq!(StatusKind::from(StatusCode::CONFLICT), StatusKind::Conflict);
        assert_eq!(StatusKind::from(StatusCode::GONE), StatusKind::Request);
        assert_eq!(StatusKind::from(StatusCode::BAD_GATEWAY), StatusKind::Server);
        assert_eq!(StatusKind::from(StatusCode::PERMANENT_REDIRECT), StatusKind::Unexpected);
    }

    #[test]
    fn error_message_is_read_from_the_envelope() {
        let body = br#"{"error": {"code": 404, "title": "Not Found", "message": "Could not find consumer: c0ffee."}}"#;
        let response = ErrorResponse::from_body(StatusCode::NOT_FOUND, body);

        assert_eq!(response.kind, StatusKind::NotFound);
        assert_eq!(response.message, "Could not find consumer: c0ffee.");

        let body = br#"{"error": {"code": 409, "title": "Conflict"}}"#;
        let response = ErrorResponse::from_body(StatusCode::CONFLICT, body);
        assert_eq!(response.message, "Conflict");

        let response = ErrorResponse::from_body(StatusCode::BAD_GATEWAY, b" upstream down\n");
        assert_eq!(response.kind, StatusKind::Server);
        assert_eq!(response.message, "upstream down");
    }

    #[test]
    fn form_bodies_are_decoded() {
        let token: Token =
            decode_form(b"oauth_token=A&oauth_token_secret=B&oauth_expires_at=2026-10-16T10%3A00%3A00Z")
                .unwrap();

        assert_eq!(token.oauth_token, "A");
        assert_eq!(token.oauth_token_secret, "B");
        assert_eq!(token.oauth_expires_at.as_deref(), Some("2026-10-16T10:00:00Z"));
    }

    #[test]
    fn form_bodies_wrapped_in_a_json_string_are_decoded() {
        let token: Token = decode_form(br#""oauth_token=A&oauth_token_secret=B""#).unwrap();

        assert_eq!(
            token,
            Token {
                oauth_token: "A".to_owned(),
                oauth_token_secret: "B".to_owned(),
                oauth_expires_at: None,
            }
        );
    }

    #[test]
    fn incomplete_form_bodies_are_rejected() {
        assert!(decode_form::<Token>(b"oauth_token=A").is_err());
        assert!(decode_json::<Token>(b"oauth_token=A&oauth_token_secret=B").is_err());
    }
}
