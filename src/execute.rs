use core::{fmt, future::Future};
#[cfg(feature = "metrics")]
use std::time::Instant;

use reqwest::header::HeaderName;

#[cfg(feature = "metrics")]
use crate::metrics;

/// Header in which the identity service echoes the id of the request, to
/// correlate client logs with server logs.
pub const X_OPENSTACK_REQUEST_ID: HeaderName = HeaderName::from_static("x-openstack-request-id");

/// HTTP transport used to reach the identity service.
///
/// Connection pooling, timeouts and proxies belong to the implementor; this
/// crate only builds requests and interprets responses.
pub trait ExecuteRequest: fmt::Debug + Send + Sync + 'static {
    type Error: Send + 'static;

    /// Sends the request and returns the response, whatever its status.
    ///
    /// # Errors
    ///
    /// If the transport fails to send the request or to receive the response
    /// head.
    fn execute_request(
        &self,
        request: reqwest::Request,
    ) -> impl Future<Output = Result<reqwest::Response, Self::Error>> + Send + 'static;
}

impl ExecuteRequest for reqwest::Client {
    type Error = reqwest::Error;

    #[inline]
    fn execute_request(
        &self,
        request: reqwest::Request,
    ) -> impl Future<Output = Result<reqwest::Response, Self::Error>> + Send + 'static {
        send(self.clone(), request)
    }
}

#[cfg_attr(feature = "tracing", tracing::instrument(skip_all))]
#[allow(clippy::cast_precision_loss)]
async fn send(
    client: reqwest::Client,
    request: reqwest::Request,
) -> Result<reqwest::Response, reqwest::Error> {
    #[cfg(any(feature = "logging", feature = "metrics"))]
    let (endpoint, method) = (request.url().to_string(), request.method().to_string());

    trace!(%endpoint, %method, "send request to the identity service");

    #[cfg(feature = "metrics")]
    let instant = Instant::now();

    let response = match client.execute(request).await {
        Ok(response) => response,
        Err(err) => {
            error!(%endpoint, %method, error = %err, "identity service is unreachable");
            return Err(err);
        }
    };

    #[cfg(any(feature = "logging", feature = "metrics"))]
    let status_code = response.status();

    #[cfg(feature = "logging")]
    let request_id = response
        .headers()
        .get(X_OPENSTACK_REQUEST_ID)
        .and_then(|value| value.to_str().ok())
        .unwrap_or("-");

    trace!(
        %endpoint,
        %method,
        status_code = %status_code,
        %request_id,
        "received response from the identity service"
    );

    #[cfg(feature = "metrics")]
    {
        let status_code = status_code.as_u16().to_string();

        metrics::CLIENT_REQUEST
            .with_label_values(&[&*endpoint, &*method, &*status_code])
            .inc();

        metrics::CLIENT_REQUEST_DURATION
            .with_label_values(&[&*endpoint, &*method, &*status_code, "us"])
            .inc_by(instant.elapsed().as_micros() as f64);
    }

    Ok(response)
}
