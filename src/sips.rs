//! Sips, subordinate groups each owned by exactly one [`Sid`](crate::sids::Sid).

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::{
    client::Client,
    execute::ExecuteRequest,
    manager::{ApiError, ApiResult, CrudManager, require, require_segment},
    resource::{Parent, Resource, enabled_by_default, serialize_enabled_filter},
};

// SIP /////////////////////////////////////////////////////////////////////////

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Sip {
    pub id: String,
    pub name: String,
    pub sid_id: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default = "enabled_by_default")]
    pub enabled: bool,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl PartialEq for Sip {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for Sip {}

impl Resource for Sip {
    const COLLECTION_KEY: &'static str = "sips";
    const KEY: &'static str = "sip";

    fn id(&self) -> &str {
        &self.id
    }
}

impl Sip {
    /// Updates this sip and returns its new state. The receiver is left as
    /// is.
    ///
    /// Name, description and enabled flag missing from `changes` are sent
    /// with their current value, so the server never resets them. A missing
    /// description is only sent when the sip has one.
    ///
    /// # Errors
    ///
    /// See [`SipManager::update`].
    pub async fn update<T: ExecuteRequest>(
        &self,
        client: &Client<T>,
        changes: SipUpdate,
    ) -> ApiResult<Self, T> {
        let changes = SipUpdate {
            name: changes.name.or_else(|| Some(self.name.clone())),
            description: changes
                .description
                .or_else(|| self.description.clone().map(Some)),
            enabled: changes.enabled.or(Some(self.enabled)),
            sid_id: changes.sid_id,
        };

        client.sips().update(&self.id, &changes).await
    }
}

// REQUESTS ////////////////////////////////////////////////////////////////////

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SipCreate {
    pub name: String,
    pub sid_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub enabled: bool,
}

impl SipCreate {
    pub fn new(name: impl Into<String>, sid_id: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            sid_id: sid_id.into(),
            description: None,
            enabled: true,
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
}

/// Fields to change on a sip. Setting `sid_id` moves the sip to another sid.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SipUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sid_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<Option<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub enabled: Option<bool>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SipFilter {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sid_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(
        serialize_with = "serialize_enabled_filter",
        skip_serializing_if = "Option::is_none"
    )]
    pub enabled: Option<bool>,
}

// SIP MANAGER /////////////////////////////////////////////////////////////////

#[derive(Debug)]
pub struct SipManager<'a, T> {
    crud: CrudManager<'a, T, Sip>,
}

impl<T> Client<T> {
    pub fn sips(&self) -> SipManager<'_, T> {
        SipManager {
            crud: CrudManager::new(self),
        }
    }
}

impl<T: ExecuteRequest> SipManager<'_, T> {
    /// # Errors
    ///
    /// If the name or the owning sid is empty, or the server rejects the
    /// request.
    pub async fn create(&self, sip: &SipCreate) -> ApiResult<Sip, T> {
        require::<T>("name", &sip.name)?;
        require::<T>("sid_id", &sip.sid_id)?;

        self.crud.create(None, sip).await
    }

    pub async fn get(&self, id: &str) -> ApiResult<Sip, T> {
        self.crud.get(None, id).await
    }

    pub async fn list(&self, filters: &SipFilter) -> ApiResult<Vec<Sip>, T> {
        self.crud.list(None, filters).await
    }

    /// Lists the sips of a user, i.e. `/users/{user_id}/sips`.
    pub async fn list_for_user(&self, user_id: &str, filters: &SipFilter) -> ApiResult<Vec<Sip>, T> {
        require_segment::<T>("user_id", user_id)?;

        self.crud
            .list(Some(&Parent::User(user_id).base_path()), filters)
            .await
    }

    /// # Errors
    ///
    /// If a new name or owning sid is empty, nothing is to be changed, or the
    /// server rejects the request.
    pub async fn update(&self, id: &str, changes: &SipUpdate) -> ApiResult<Sip, T> {
        if let Some(name) = &changes.name {
            require::<T>("name", name)?;
        }
        if let Some(sid_id) = &changes.sid_id {
            require::<T>("sid_id", sid_id)?;
        }

        if changes == &SipUpdate::default() {
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

#[cfg(test)]
mod tests {
    use reqwest::Method;
    use serde_json::json;

    use super::*;
    use crate::mock::MockTransport;

    fn sip() -> Sip {
        serde_json::from_value(json!({
            "id": "p1",
            "name": "web",
            "sid_id": "s1",
            "description": "frontends",
            "enabled": false,
        }))
        .unwrap()
    }

    #[tokio::test]
    async fn create_requires_an_owning_sid() {
        let mock = MockTransport::reply(201, "{}");

        let err = mock
            .client()
            .sips()
            .create(&SipCreate::new("web", ""))
            .await
            .unwrap_err();

        assert!(err.is_validation());
        assert!(mock.requests().is_empty());
    }

    #[tokio::test]
    async fn create_sends_the_owning_sid() {
        let mock = MockTransport::reply(
            201,
            r#"{"sip": {"id": "p1", "name": "web", "sid_id": "s1"}}"#,
        );

        let sip = mock
            .client()
            .sips()
            .create(&SipCreate::new("web", "s1").with_description("frontends"))
            .await
            .unwrap();

        assert_eq!(sip.sid_id, "s1");
        assert!(sip.enabled);
        assert_eq!(
            mock.last().json(),
            json!({"sip": {"name": "web", "sid_id": "s1", "description": "frontends", "enabled": true}})
        );
    }

    #[tokio::test]
    async fn list_filters_by_sid_and_user() {
        let mock = MockTransport::reply(200, r#"{"sips": []}"#);
        let client = mock.client();

        let filters = SipFilter {
            sid_id: Some("s1".to_owned()),
            enabled: Some(false),
            ..SipFilter::default()
        };

        client.sips().list(&filters).await.unwrap();
        assert_eq!(mock.last().url.path(), "/v3/sips");
        assert_eq!(mock.last().url.query(), Some("sid_id=s1&enabled=0"));

        client.sips().list_for_user("u1", &SipFilter::default()).await.unwrap();
        assert_eq!(mock.last().url.path(), "/v3/users/u1/sips");
        assert_eq!(mock.last().url.query(), None);
    }

    #[tokio::test]
    async fn update_merges_current_values_and_returns_a_new_sip() {
        let mock = MockTransport::reply(
            200,
            r#"{"sip": {"id": "p1", "name": "api", "sid_id": "s1", "description": "frontends", "enabled": false}}"#,
        );
        let current = sip();

        let changes = SipUpdate {
            name: Some("api".to_owned()),
            ..SipUpdate::default()
        };

        let updated = current.update(&mock.client(), changes).await.unwrap();

        assert_eq!(updated.name, "api");
        assert_eq!(current.name, "web");

        let request = mock.last();
        assert_eq!(request.method, Method::PATCH);
        assert_eq!(request.url.path(), "/v3/sips/p1");
        assert_eq!(
            request.json(),
            json!({"sip": {"name": "api", "description": "frontends", "enabled": false}})
        );
    }

    #[tokio::test]
    async fn update_does_not_send_an_absent_description() {
        let mock = MockTransport::reply(
            200,
            r#"{"sip": {"id": "p1", "name": "web", "sid_id": "s1", "enabled": true}}"#,
        );
        let current = Sip {
            description: None,
            ..sip()
        };

        let changes = SipUpdate {
            enabled: Some(true),
            ..SipUpdate::default()
        };

        let updated = current.update(&mock.client(), changes).await.unwrap();

        assert!(updated.enabled);
        assert_eq!(
            mock.last().json(),
            json!({"sip": {"name": "web", "enabled": true}})
        );
    }

    #[tokio::test]
    async fn list_for_user_rejects_dot_segments() {
        let mock = MockTransport::reply(200, r#"{"sips": []}"#);

        let err = mock
            .client()
            .sips()
            .list_for_user("..", &SipFilter::default())
            .await
            .unwrap_err();

        assert!(err.is_validation());
        assert!(mock.requests().is_empty());
    }

    #[tokio::test]
    async fn update_failures_are_surfaced() {
        let mock = MockTransport::reply(
            403,
            r#"{"error": {"code": 403, "title": "Forbidden", "message": "You are not authorized."}}"#,
        );

        let err = sip()
            .update(&mock.client(), SipUpdate::default())
            .await
            .unwrap_err();

        assert_eq!(err.response().unwrap().message, "You are not authorized.");
    }

    #[tokio::test]
    async fn move_to_another_sid() {
        let mock = MockTransport::reply(
            200,
            r#"{"sip": {"id": "p1", "name": "web", "sid_id": "s2"}}"#,
        );

        let changes = SipUpdate {
            sid_id: Some("s2".to_owned()),
            ..SipUpdate::default()
        };

        let sip = mock.client().sips().update("p1", &changes).await.unwrap();

        assert_eq!(sip.sid_id, "s2");
        assert_eq!(mock.last().json(), json!({"sip": {"sid_id": "s2"}}));
    }
}
