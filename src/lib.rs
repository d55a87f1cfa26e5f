//! # Identity service client
//!
//! Typed resource managers for an OpenStack Keystone compatible identity
//! service, and the OAuth 1.0a delegated-authorization exchange of its
//! `OS-OAUTH1` extension.
//!
//! Every manager borrows a [`Client`](client::Client), built from the `v3`
//! endpoint of the service:
//!
//! ```no_run
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! use keystone10a::{client::Client, credentials::Credentials, sids::SidFilter};
//!
//! let client = Client::new("https://keystone.example.com:5000/v3".parse()?)
//!     .with_credentials(Credentials::token("gAAAAAB..."));
//!
//! let disabled = SidFilter {
//!     enabled: Some(false),
//!     ..SidFilter::default()
//! };
//!
//! for sid in client.sids().list(&disabled).await? {
//!     println!("{} {}", sid.id, sid.name);
//! }
//! # Ok(())
//! # }
//! ```

pub use reqwest;
pub use url;

#[macro_use]
mod logging;

#[cfg(feature = "metrics")]
mod metrics;

pub mod signer;

pub mod credentials;

pub mod execute;

pub mod client;

pub mod rest;

pub mod resource;

pub mod manager;

pub mod oauth1;

pub mod sids;

pub mod sips;

#[cfg(test)]
mod mock;
