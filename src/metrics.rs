use std::sync::LazyLock;

use prometheus::{CounterVec, opts, register_counter_vec};

pub(crate) static CLIENT_REQUEST: LazyLock<CounterVec> = LazyLock::new(|| {
    register_counter_vec!(
        opts!("keystone10a_client_request", "number of request on identity api"),
        &["endpoint", "method", "status"]
    )
    .expect("metrics 'keystone10a_client_request' to not be initialized")
});

pub(crate) static CLIENT_REQUEST_DURATION: LazyLock<CounterVec> = LazyLock::new(|| {
    register_counter_vec!(
        opts!(
            "keystone10a_client_request_duration",
            "duration of request on identity api"
        ),
        &["endpoint", "method", "status", "unit"]
    )
    .expect("metrics 'keystone10a_client_request_duration' to not be initialized")
});

pub(crate) static OAUTH1_SIGNATURE: LazyLock<CounterVec> = LazyLock::new(|| {
    register_counter_vec!(
        opts!(
            "keystone10a_oauth1_signature",
            "number of oauth 1.0a signatures computed"
        ),
        &["endpoint"]
    )
    .expect("metrics 'keystone10a_oauth1_signature' to not be initialized")
});
