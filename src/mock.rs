//! Recording transport for unit tests.

use core::{convert::Infallible, fmt, future::Future};
use std::{
    collections::BTreeMap,
    sync::{Arc, Mutex},
};

use reqwest::{Method, Url, header::HeaderMap};

use crate::{client::Client, execute::ExecuteRequest};

pub(crate) const ENDPOINT: &str = "https://keystone.test/v3";

/// Request as seen by the transport.
#[derive(Debug, Clone)]
pub(crate) struct Recorded {
    pub method: Method,
    pub url: Url,
    pub headers: HeaderMap,
    pub body: Option<Vec<u8>>,
}

impl Recorded {
    pub fn json(&self) -> serde_json::Value {
        serde_json::from_slice(self.body.as_deref().unwrap_or_default()).unwrap()
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).map(|value| value.to_str().unwrap())
    }
}

type Responder = dyn Fn(&Recorded) -> (u16, String) + Send + Sync;

/// Transport answering every request through a responder function.
#[derive(Clone)]
pub(crate) struct MockTransport {
    responder: Arc<Responder>,
    requests: Arc<Mutex<Vec<Recorded>>>,
}

impl fmt::Debug for MockTransport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MockTransport").finish_non_exhaustive()
    }
}

impl MockTransport {
    pub fn new(responder: impl Fn(&Recorded) -> (u16, String) + Send + Sync + 'static) -> Self {
        Self {
            responder: Arc::new(responder),
            requests: Arc::default(),
        }
    }

    /// Answers every request with the same status and body.
    pub fn reply(status: u16, body: impl Into<String>) -> Self {
        let body = body.into();
        Self::new(move |_| (status, body.clone()))
    }

    pub fn client(&self) -> Client<Self> {
        Client::with_inner(self.clone(), Url::parse(ENDPOINT).unwrap())
    }

    pub fn requests(&self) -> Vec<Recorded> {
        self.requests.lock().unwrap().clone()
    }

    pub fn last(&self) -> Recorded {
        self.requests().pop().expect("no request was sent")
    }
}

impl ExecuteRequest for MockTransport {
    type Error = Infallible;

    fn execute_request(
        &self,
        request: reqwest::Request,
    ) -> impl Future<Output = Result<reqwest::Response, Self::Error>> + Send + 'static {
        let recorded = Recorded {
            method: request.method().clone(),
            url: request.url().clone(),
            headers: request.headers().clone(),
            body: request.body().and_then(|body| body.as_bytes()).map(<[u8]>::to_vec),
        };

        let (status, body) = (self.responder)(&recorded);
        self.requests.lock().unwrap().push(recorded);

        let response = http::Response::builder()
            .status(status)
            .body(body)
            .unwrap();

        async move { Ok(reqwest::Response::from(response)) }
    }
}

/// Parses the protocol parameters of an `OAuth` authorization header.
pub(crate) fn oauth_params(header: &str) -> BTreeMap<String, String> {
    header
        .strip_prefix("OAuth ")
        .expect("not an oauth header")
        .split(", ")
        .map(|pair| {
            let (k, v) = pair.split_once('=').unwrap();
            let v = urlencoding::decode(v.trim_matches('"')).unwrap();
            (k.to_owned(), v.into_owned())
        })
        .collect()
}
