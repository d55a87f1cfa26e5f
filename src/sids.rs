//! Sids, identity groups enumerable globally or under an owning user or
//! domain.
//!
//! Servers with domain scoping also report the `domain_id` and `members` of a
//! sid. Both are optional: they are omitted from request bodies when unset and
//! left empty when the server does not send them.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::{
    client::Client,
    execute::ExecuteRequest,
    manager::{ApiError, ApiResult, CrudManager, require, require_segment},
    resource::{Parent, Resource, enabled_by_default, serialize_enabled_filter},
};

// SID /////////////////////////////////////////////////////////////////////////

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Sid {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default = "enabled_by_default")]
    pub enabled: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub domain_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub members: Option<Vec<String>>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl PartialEq for Sid {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for Sid {}

impl Resource for Sid {
    const COLLECTION_KEY: &'static str = "sids";
    const KEY: &'static str = "sid";

    fn id(&self) -> &str {
        &self.id
    }
}

// REQUESTS ////////////////////////////////////////////////////////////////////

/// Body of a sid creation. Enabled unless told otherwise.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SidCreate {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub enabled: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub domain_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub members: Option<Vec<String>>,
}

impl SidCreate {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: None,
            enabled: true,
            domain_id: None,
            members: None,
        }
    }

    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    #[must_use]
    pub fn with_enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }

    #[must_use]
    pub fn with_domain(mut self, domain_id: impl Into<String>) -> Self {
        self.domain_id = Some(domain_id.into());
        self
    }

    #[must_use]
    pub fn with_members<I, S>(mut self, members: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.members = Some(members.into_iter().map(Into::into).collect());
        self
    }
}

/// Fields to change on a sid. Absent fields are left untouched by the server;
/// `description: Some(None)` clears the description.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SidUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<Option<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub enabled: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub members: Option<Vec<String>>,
}

/// Query filters of a sid listing.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SidFilter {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(
        serialize_with = "serialize_enabled_filter",
        skip_serializing_if = "Option::is_none"
    )]
    pub enabled: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub domain_id: Option<String>,
}

// SID MANAGER /////////////////////////////////////////////////////////////////

#[derive(Debug)]
pub struct SidManager<'a, T> {
    crud: CrudManager<'a, T, Sid>,
}

impl<T> Client<T> {
    pub fn sids(&self) -> SidManager<'_, T> {
        SidManager {
            crud: CrudManager::new(self),
        }
    }
}

impl<T: ExecuteRequest> SidManager<'_, T> {
    /// # Errors
    ///
    /// If the name is empty, or the server rejects the request.
    pub async fn create(&self, sid: &SidCreate) -> ApiResult<Sid, T> {
        require::<T>("name", &sid.name)?;

        self.crud.create(None, sid).await
    }

    pub async fn get(&self, id: &str) -> ApiResult<Sid, T> {
        self.crud.get(None, id).await
    }

    /// Lists all sids matching the `filters`.
    pub async fn list(&self, filters: &SidFilter) -> ApiResult<Vec<Sid>, T> {
        self.crud.list(None, filters).await
    }

    /// Lists the sids owned by `parent`, e.g. `/users/{user_id}/sids`.
    pub async fn list_in(&self, parent: Parent<'_>, filters: &SidFilter) -> ApiResult<Vec<Sid>, T> {
        require_segment::<T>("parent", parent.id())?;

        self.crud.list(Some(&parent.base_path()), filters).await
    }

    /// Applies `changes` and returns the sid as stored by the server.
    ///
    /// # Errors
    ///
    /// If the new name is empty, or the server rejects the request.
    pub async fn update(&self, id: &str, changes: &SidUpdate) -> ApiResult<Sid, T> {
        if let Some(name) = &changes.name {
            require::<T>("name", name)?;
        }

        if changes == &SidUpdate::default() {
            return Err(ApiError::Validation {
                field: "changes",
                reason: "at least one field must be set",
            });
        }

        self.crud.update(None, id, changes).await
    }

    pub async fn delete(&self, id: &str) -> ApiResult<(), T> {
        self.crud.delete(None, id).await
    }
}
