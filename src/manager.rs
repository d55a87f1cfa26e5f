//! Generic CRUD executor.
//!
//! A [`CrudManager`] translates create/get/list/update/delete calls into
//! requests against `{base}/{collection_key}[/{id}]`, where `base` defaults to
//! the resource's path prefix and may be overridden for nested collections.
//! Bodies are enveloped under the resource's singular key, list responses
//! under its collection key.

use core::{fmt, marker::PhantomData};
use std::collections::BTreeMap;

use reqwest::{Url, header};
use serde::{Serialize, de::DeserializeOwned};
use serde_json::{Map, Value};

use crate::{
    client::{Client, ClientError},
    execute::ExecuteRequest,
    resource::Resource,
    rest::{ErrorResponse, RestClient, RestError, StatusKind},
    signer::SignError,
};

// API ERROR ///////////////////////////////////////////////////////////////////

#[derive(Debug, thiserror::Error)]
pub enum ApiError<E = ClientError> {
    #[error(transparent)]
    Rest(#[from] RestError<E>),
    #[error("invalid argument '{field}', {reason}")]
    Validation {
        field: &'static str,
        reason: &'static str,
    },
    #[error("failed to sign request, {0}")]
    Sign(#[from] SignError),
    #[error("failed to build header value, {0}")]
    HeaderValue(#[from] header::InvalidHeaderValue),
    #[error("failed to encode list filters as a query string, {0}")]
    Filters(#[from] serde_urlencoded::ser::Error),
}

impl<E> ApiError<E> {
    /// Returns the error response of the identity service, if any.
    pub fn response(&self) -> Option<&ErrorResponse> {
        match self {
            Self::Rest(RestError::Response(response)) => Some(response),
            _ => None,
        }
    }

    pub fn status_kind(&self) -> Option<StatusKind> {
        self.response().map(|response| response.kind)
    }

    pub fn is_not_found(&self) -> bool {
        self.status_kind() == Some(StatusKind::NotFound)
    }

    pub fn is_malformed_response(&self) -> bool {
        matches!(self, Self::Rest(RestError::MalformedResponse(_)))
    }

    pub fn is_validation(&self) -> bool {
        matches!(self, Self::Validation { .. })
    }
}

impl<E> From<url::ParseError> for ApiError<E> {
    fn from(err: url::ParseError) -> Self {
        Self::Rest(RestError::Url(err))
    }
}

impl<E> From<header::MaxSizeReached> for ApiError<E> {
    fn from(err: header::MaxSizeReached) -> Self {
        Self::Rest(RestError::TooManyHeaders(err))
    }
}

/// Result of an operation executed by a manager over a [`Client<T>`].
pub type ApiResult<O, T = reqwest::Client> =
    Result<O, ApiError<ClientError<<T as ExecuteRequest>::Error>>>;

/// Fails with a validation error, before any request is sent, if `value` is
/// empty.
pub(crate) fn require<T: ExecuteRequest>(field: &'static str, value: &str) -> ApiResult<(), T> {
    if value.trim().is_empty() {
        return Err(ApiError::Validation {
            field,
            reason: "must not be empty",
        });
    }

    Ok(())
}

/// Fails with a validation error if `value` cannot be used as a single url
/// path segment, i.e. is empty or a dot segment that the url parser would
/// resolve to another path.
pub(crate) fn require_segment<T: ExecuteRequest>(
    field: &'static str,
    value: &str,
) -> ApiResult<(), T> {
    require::<T>(field, value)?;

    if matches!(value, "." | "..") {
        return Err(ApiError::Validation {
            field,
            reason: "must not be a dot segment",
        });
    }

    Ok(())
}

/// Extracts and deserializes the value enveloped under `key`.
pub(crate) fn unwrap_key<O: DeserializeOwned, T: ExecuteRequest>(
    mut envelope: Map<String, Value>,
    key: &str,
) -> ApiResult<O, T> {
    let Some(value) = envelope.remove(key) else {
        return Err(ApiError::Rest(RestError::MalformedResponse(format!(
            "missing key '{key}'"
        ))));
    };

    serde_json::from_value(value).map_err(|err| {
        ApiError::Rest(RestError::MalformedResponse(format!(
            "unexpected '{key}', {err}"
        )))
    })
}

// CRUD MANAGER ////////////////////////////////////////////////////////////////

/// CRUD operations of the resource `R`.
pub struct CrudManager<'a, T, R> {
    client: &'a Client<T>,
    _resource: PhantomData<fn() -> R>,
}

impl<T: fmt::Debug, R> fmt::Debug for CrudManager<'_, T, R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CrudManager")
            .field("client", self.client)
            .field("collection", &core::any::type_name::<R>())
            .finish()
    }
}

impl<T, R> Clone for CrudManager<'_, T, R> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T, R> Copy for CrudManager<'_, T, R> {}

impl<'a, T, R> CrudManager<'a, T, R> {
    pub fn new(client: &'a Client<T>) -> Self {
        Self {
            client,
            _resource: PhantomData,
        }
    }

    pub fn client(&self) -> &'a Client<T> {
        self.client
    }
}

impl<'a, T: ExecuteRequest, R: Resource> CrudManager<'a, T, R> {

    /// Returns the url of the collection under `base`, or under the resource's
    /// path prefix if no `base` is given.
    pub fn collection_url(&self, base: Option<&str>) -> ApiResult<Url, T> {
        let path = match base.or(R::PATH_PREFIX) {
            Some(base) => format!("{}/{}", base.trim_matches('/'), R::COLLECTION_KEY),
            None => R::COLLECTION_KEY.to_owned(),
        };

        self.client
            .endpoint()
            .join(&path)
            .map_err(ApiError::from)
    }

    pub fn resource_url(&self, base: Option<&str>, id: &str) -> ApiResult<Url, T> {
        require_segment::<T>("id", id)?;

        let mut url = self.collection_url(base)?;
        let path = format!("{}/{}", url.path(), urlencoding::encode(id));
        url.set_path(&path);

        Ok(url)
    }

    /// Creates the resource described by `body`.
    #[cfg_attr(feature = "tracing", tracing::instrument(skip(self)))]
    pub async fn create<B>(&self, base: Option<&str>, body: &B) -> ApiResult<R, T>
    where
        B: Serialize + fmt::Debug + Send + Sync,
    {
        let url = self.collection_url(base)?;
        let payload = BTreeMap::from([(R::KEY, body)]);

        let envelope: Map<String, Value> = self.client.post(url, &payload).await?;
        let resource = unwrap_key::<R, T>(envelope, R::KEY)?;

        debug!(resource = R::KEY, "created resource");

        Ok(resource)
    }

    #[cfg_attr(feature = "tracing", tracing::instrument(skip(self)))]
    pub async fn get(&self, base: Option<&str>, id: &str) -> ApiResult<R, T> {
        let url = self.resource_url(base, id)?;

        let envelope: Map<String, Value> = self.client.get(url).await?;

        unwrap_key::<R, T>(envelope, R::KEY)
    }

    /// Lists resources matching the `filters`, in the order returned by the
    /// server.
    #[cfg_attr(feature = "tracing", tracing::instrument(skip(self)))]
    pub async fn list<Q>(&self, base: Option<&str>, filters: &Q) -> ApiResult<Vec<R>, T>
    where
        Q: Serialize + fmt::Debug + ?Sized,
    {
        let mut url = self.collection_url(base)?;

        let query = serde_urlencoded::to_string(filters)?;

        if !query.is_empty() {
            url.set_query(Some(&query));
        }

        let envelope: Map<String, Value> = self.client.get(url).await?;

        unwrap_key::<Vec<R>, T>(envelope, R::COLLECTION_KEY)
    }

    /// Updates the resource and returns its new state.
    #[cfg_attr(feature = "tracing", tracing::instrument(skip(self)))]
    pub async fn update<B>(&self, base: Option<&str>, id: &str, body: &B) -> ApiResult<R, T>
    where
        B: Serialize + fmt::Debug + Send + Sync,
    {
        let url = self.resource_url(base, id)?;
        let payload = BTreeMap::from([(R::KEY, body)]);

        let envelope: Map<String, Value> = self.client.patch(url, &payload).await?;

        unwrap_key::<R, T>(envelope, R::KEY)
    }

    #[cfg_attr(feature = "tracing", tracing::instrument(skip(self)))]
    pub async fn delete(&self, base: Option<&str>, id: &str) -> ApiResult<(), T> {
        let url = self.resource_url(base, id)?;

        self.client.delete(url).await?;

        debug!(resource = R::KEY, %id, "deleted resource");

        Ok(())
    }
}
