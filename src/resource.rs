//! Resource descriptors.
//!
//! A [`Resource`] is an immutable value deserialized from a server response.
//! Its descriptor constants tell the generic CRUD executor where the resource
//! lives and how its bodies are enveloped.

use core::fmt;

use serde::{Serialize, Serializer, de::DeserializeOwned};
use serde_json::Value;

// RESOURCE ////////////////////////////////////////////////////////////////////

pub trait Resource: Serialize + DeserializeOwned + fmt::Debug + Send + Sync {
    /// Plural key, used as url path segment and list response envelope.
    const COLLECTION_KEY: &'static str;

    /// Singular key, used as single resource request/response envelope.
    const KEY: &'static str;

    /// Path prefix of the collection, if any (e.g. `OS-OAUTH1`).
    const PATH_PREFIX: Option<&'static str> = None;

    fn id(&self) -> &str;

    /// Returns the value of any attribute sent by the server, including the
    /// ones this crate does not model.
    fn attribute(&self, name: &str) -> Option<Value> {
        match serde_json::to_value(self) {
            Ok(Value::Object(mut attributes)) => attributes.remove(name),
            _ => None,
        }
    }
}

// PARENT //////////////////////////////////////////////////////////////////////

/// Owner of a nested collection, e.g. `/users/{user_id}/sids`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Parent<'a> {
    User(&'a str),
    Domain(&'a str),
}

impl Parent<'_> {
    /// Returns the base path of collections nested under this owner.
    pub fn base_path(&self) -> String {
        match self {
            Self::User(id) => format!("users/{}", urlencoding::encode(id)),
            Self::Domain(id) => format!("domains/{}", urlencoding::encode(id)),
        }
    }

    pub fn id(&self) -> &str {
        match *self {
            Self::User(id) | Self::Domain(id) => id,
        }
    }
}

// FILTERS /////////////////////////////////////////////////////////////////////

/// Serializes an `enabled` list filter.
///
/// `false` is sent as `0`: older identity services do not parse boolean
/// filter strings and would otherwise ignore the filter.
pub(crate) fn serialize_enabled_filter<S: Serializer>(
    enabled: &Option<bool>,
    serializer: S,
) -> Result<S::Ok, S::Error> {
    match enabled {
        Some(false) => serializer.serialize_u8(0),
        Some(true) => serializer.serialize_bool(true),
        None => serializer.serialize_none(),
    }
}

pub(crate) const fn enabled_by_default() -> bool {
    true
}
