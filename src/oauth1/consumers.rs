//! Consumers, i.e. registered OAuth 1.0a clients.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::{
    client::Client,
    execute::ExecuteRequest,
    manager::{ApiError, ApiResult, CrudManager},
    resource::Resource,
};

use super::PATH_PREFIX;

// CONSUMER ////////////////////////////////////////////////////////////////////

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Consumer {
    pub id: String,
    /// `None` whether the server sent `null` or omitted the field.
    #[serde(default)]
    pub description: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl PartialEq for Consumer {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for Consumer {}

impl Resource for Consumer {
    const COLLECTION_KEY: &'static str = "consumers";
    const KEY: &'static str = "consumer";
    const PATH_PREFIX: Option<&'static str> = Some(PATH_PREFIX);

    fn id(&self) -> &str {
        &self.id
    }
}

#[derive(Debug, Serialize)]
struct ConsumerBody<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    description: Option<&'a str>,
}

/// Fields to change on a consumer. `Some(None)` clears the description.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ConsumerUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<Option<String>>,
}

// CONSUMER MANAGER ////////////////////////////////////////////////////////////

#[derive(Debug)]
pub struct ConsumerManager<'a, T> {
    crud: CrudManager<'a, T, Consumer>,
}

impl<T> Client<T> {
    pub fn consumers(&self) -> ConsumerManager<'_, T> {
        ConsumerManager {
            crud: CrudManager::new(self),
        }
    }
}

impl<T: ExecuteRequest> ConsumerManager<'_, T> {
    pub async fn create(&self, description: Option<&str>) -> ApiResult<Consumer, T> {
        self.crud.create(None, &ConsumerBody { description }).await
    }

    pub async fn get(&self, id: &str) -> ApiResult<Consumer, T> {
        self.crud.get(None, id).await
    }

    pub async fn list(&self) -> ApiResult<Vec<Consumer>, T> {
        self.crud.list(None, &()).await
    }

    /// # Errors
    ///
    /// If nothing is to be changed, or the server rejects the request.
    pub async fn update(&self, id: &str, changes: &ConsumerUpdate) -> ApiResult<Consumer, T> {
        if changes == &ConsumerUpdate::default() {
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
    use crate::{mock::MockTransport, rest::StatusKind};

    #[tokio::test]
    async fn description_is_optional() {
        let mock = MockTransport::reply(201, r#"{"consumer": {"description": null, "id": "c1"}}"#);

        let consumer = mock.client().consumers().create(None).await.unwrap();

        assert_eq!(consumer.id, "c1");
        assert_eq!(consumer.description, None);

        let request = mock.last();
        assert_eq!(request.method, Method::POST);
        assert_eq!(request.url.path(), "/v3/OS-OAUTH1/consumers");
        assert_eq!(request.json(), json!({"consumer": {}}));
    }

    #[tokio::test]
    async fn null_and_omitted_descriptions_are_equivalent() {
        let explicit = MockTransport::reply(201, r#"{"consumer": {"description": null, "id": "c1"}}"#);
        let omitted = MockTransport::reply(201, r#"{"consumer": {"id": "c1"}}"#);

        let explicit = explicit.client().consumers().create(None).await.unwrap();
        let omitted = omitted.client().consumers().create(None).await.unwrap();

        assert_eq!(explicit.description, omitted.description);
        assert_eq!(explicit, omitted);
    }

    #[tokio::test]
    async fn description_is_sent_and_read_back() {
        let mock = MockTransport::reply(
            201,
            r#"{"consumer": {"description": "my app", "id": "c1", "links": {"self": "x"}}}"#,
        );

        let consumer = mock.client().consumers().create(Some("my app")).await.unwrap();

        assert_eq!(consumer.description.as_deref(), Some("my app"));
        assert_eq!(consumer.attribute("links"), Some(json!({"self": "x"})));
        assert_eq!(mock.last().json(), json!({"consumer": {"description": "my app"}}));
    }

    #[tokio::test]
    async fn missing_consumer_is_not_found() {
        let mock = MockTransport::reply(
            404,
            r#"{"error": {"code": 404, "title": "Not Found", "message": "Could not find consumer: c0ffee."}}"#,
        );

        let err = mock.client().consumers().get("c0ffee").await.unwrap_err();

        assert_eq!(err.status_kind(), Some(StatusKind::NotFound));
        assert_eq!(mock.last().url.path(), "/v3/OS-OAUTH1/consumers/c0ffee");
    }

    #[tokio::test]
    async fn update_list_and_delete() {
        let mock = MockTransport::new(|request| match request.method {
            Method::PATCH => (200, r#"{"consumer": {"id": "c1", "description": "new"}}"#.to_owned()),
            Method::GET => (
                200,
                r#"{"consumers": [{"id": "c1"}, {"id": "c2", "description": "d"}]}"#.to_owned(),
            ),
            _ => (204, String::new()),
        });
        let client = mock.client();
        let consumers = client.consumers();

        let changes = ConsumerUpdate {
            description: Some(Some("new".to_owned())),
        };

        let updated = consumers.update("c1", &changes).await.unwrap();
        assert_eq!(updated.description.as_deref(), Some("new"));
        assert_eq!(mock.last().json(), json!({"consumer": {"description": "new"}}));

        let listed = consumers.list().await.unwrap();
        assert_eq!(listed.len(), 2);
        assert_eq!(listed[0].description, None);

        consumers.delete("c1").await.unwrap();
        assert_eq!(mock.last().method, Method::DELETE);
        assert_eq!(mock.requests().len(), 3);
    }

    #[tokio::test]
    async fn update_can_clear_the_description() {
        let mock = MockTransport::reply(200, r#"{"consumer": {"id": "c1", "description": null}}"#);

        let changes = ConsumerUpdate {
            description: Some(None),
        };

        let updated = mock.client().consumers().update("c1", &changes).await.unwrap();

        assert_eq!(updated.description, None);
        assert_eq!(mock.last().method, Method::PATCH);
        assert_eq!(mock.last().json(), json!({"consumer": {"description": null}}));
    }

    #[tokio::test]
    async fn empty_update_is_rejected() {
        let mock = MockTransport::reply(200, r#"{"consumer": {"id": "c1"}}"#);

        let err = mock
            .client()
            .consumers()
            .update("c1", &ConsumerUpdate::default())
            .await
            .unwrap_err();

        assert!(err.is_validation());
        assert!(mock.requests().is_empty());
    }
}
