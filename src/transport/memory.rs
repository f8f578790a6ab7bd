//! In-memory, scripted [`LinkClient`].
//!
//! [`InMemoryLinkClient`] plays the server side of the link contract without
//! any networking:
//!
//! - `create` assigns `ServerTasks-N` identifiers, fills in the standard task
//!   links and makes the new task fetchable through its `Self` link.
//! - `get` answers from a per-link response queue. Each call consumes the
//!   front response until one is left; the last response then repeats, so a
//!   task can be scripted as `Queued -> Executing -> Success`.
//! - Failures can be injected per link and apply to every method.
//! - Every request, including failed ones, is recorded for assertions.
//!
//! # Examples
//!
//! ```
//! use octopus_client::transport::memory::{InMemoryLinkClient, RequestMethod};
//! use octopus_client::transport::{LinkClient, QueryParameters};
//! use serde_json::json;
//!
//! # tokio::runtime::Runtime::new().unwrap().block_on(async {
//! let client = InMemoryLinkClient::new();
//! client.respond("/api/tasks/ServerTasks-1", json!({ "Name": "Health", "State": "Queued" }));
//! client.respond("/api/tasks/ServerTasks-1", json!({ "Name": "Health", "State": "Success" }));
//!
//! let query = QueryParameters::new();
//! let first = client.get("/api/tasks/ServerTasks-1", &query).await.unwrap();
//! let second = client.get("/api/tasks/ServerTasks-1", &query).await.unwrap();
//! let third = client.get("/api/tasks/ServerTasks-1", &query).await.unwrap();
//! assert_eq!(first["State"], "Queued");
//! assert_eq!(second["State"], "Success");
//! assert_eq!(third["State"], "Success");
//! assert_eq!(client.requests_by(RequestMethod::Get).len(), 3);
//! # });
//! ```

use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;
use serde_json::{json, Map, Value};

use super::{LinkClient, QueryParameters};
use crate::error::TransportError;
use crate::types::task::{links, TaskResource};

/// Kind of request recorded by [`InMemoryLinkClient`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RequestMethod {
    /// [`LinkClient::get`].
    Get,
    /// [`LinkClient::get_text`].
    GetText,
    /// [`LinkClient::post`].
    Post,
    /// [`LinkClient::create`].
    Create,
    /// [`LinkClient::list_all`].
    ListAll,
}

/// A request observed by [`InMemoryLinkClient`].
#[derive(Debug, Clone, PartialEq)]
pub struct RecordedRequest {
    /// Which contract method was called.
    pub method: RequestMethod,
    /// The link that was followed.
    pub link: String,
    /// Query parameters sent with the request.
    pub query: QueryParameters,
    /// JSON body, for `post` and `create`.
    pub body: Option<Value>,
}

/// Scripted in-process implementation of [`LinkClient`].
#[derive(Debug, Default)]
pub struct InMemoryLinkClient {
    responses: Mutex<HashMap<String, VecDeque<Value>>>,
    texts: Mutex<HashMap<String, String>>,
    lists: Mutex<HashMap<String, Vec<Value>>>,
    failures: Mutex<HashMap<String, TransportError>>,
    requests: Mutex<Vec<RecordedRequest>>,
    next_id: AtomicU64,
    latency: Option<Duration>,
}

impl InMemoryLinkClient {
    /// Creates an empty client.
    pub fn new() -> Self {
        Self::default()
    }

    /// Delays every request by `latency` (uses the tokio clock).
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = Some(latency);
        self
    }

    /// Queues a JSON response for GETs of `link`.
    pub fn respond(&self, link: impl Into<String>, response: Value) {
        self.responses
            .lock()
            .entry(link.into())
            .or_default()
            .push_back(response);
    }

    /// Queues `task` as the next response of its `Self` link.
    ///
    /// # Panics
    ///
    /// Panics if the task has no `Self` link or cannot be serialized.
    pub fn respond_with_task(&self, task: &TaskResource) {
        let link = task
            .link(links::SELF)
            .expect("scripted task needs a Self link")
            .to_string();
        let value = serde_json::to_value(task).expect("task serializes");
        self.respond(link, value);
    }

    /// Sets the text returned by `get_text` for `link`.
    pub fn respond_text(&self, link: impl Into<String>, text: impl Into<String>) {
        self.texts.lock().insert(link.into(), text.into());
    }

    /// Sets the items returned by `list_all` for `link`.
    pub fn respond_list(&self, link: impl Into<String>, items: Vec<Value>) {
        self.lists.lock().insert(link.into(), items);
    }

    /// Makes every request to `link` fail with `error`.
    pub fn fail(&self, link: impl Into<String>, error: TransportError) {
        self.failures.lock().insert(link.into(), error);
    }

    /// Every request observed so far, in arrival order.
    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.requests.lock().clone()
    }

    /// Requests of one kind, in arrival order.
    pub fn requests_by(&self, method: RequestMethod) -> Vec<RecordedRequest> {
        self.requests
            .lock()
            .iter()
            .filter(|r| r.method == method)
            .cloned()
            .collect()
    }

    /// Total number of requests observed.
    pub fn request_count(&self) -> usize {
        self.requests.lock().len()
    }

    async fn observe(
        &self,
        method: RequestMethod,
        link: &str,
        query: &QueryParameters,
        body: Option<&Value>,
    ) -> Result<(), TransportError> {
        self.requests.lock().push(RecordedRequest {
            method,
            link: link.to_string(),
            query: query.clone(),
            body: body.cloned(),
        });

        if let Some(latency) = self.latency {
            tokio::time::sleep(latency).await;
        }

        match self.failures.lock().get(link) {
            Some(err) => Err(err.clone()),
            None => Ok(()),
        }
    }

    fn not_found(link: &str) -> TransportError {
        TransportError::Http {
            status: 404,
            body: format!("no scripted response for {link}"),
        }
    }
}

#[async_trait]
impl LinkClient for InMemoryLinkClient {
    async fn get(&self, link: &str, query: &QueryParameters) -> Result<Value, TransportError> {
        self.observe(RequestMethod::Get, link, query, None).await?;

        let mut responses = self.responses.lock();
        let queue = responses
            .get_mut(link)
            .filter(|q| !q.is_empty())
            .ok_or_else(|| Self::not_found(link))?;
        if queue.len() > 1 {
            Ok(queue.pop_front().unwrap_or_default())
        } else {
            Ok(queue.front().cloned().unwrap_or_default())
        }
    }

    async fn get_text(
        &self,
        link: &str,
        query: &QueryParameters,
    ) -> Result<String, TransportError> {
        self.observe(RequestMethod::GetText, link, query, None)
            .await?;
        self.texts
            .lock()
            .get(link)
            .cloned()
            .ok_or_else(|| Self::not_found(link))
    }

    async fn post(&self, link: &str, body: Option<&Value>) -> Result<(), TransportError> {
        self.observe(RequestMethod::Post, link, &QueryParameters::new(), body)
            .await
    }

    async fn create(
        &self,
        collection_link: &str,
        resource: &Value,
    ) -> Result<Value, TransportError> {
        self.observe(
            RequestMethod::Create,
            collection_link,
            &QueryParameters::new(),
            Some(resource),
        )
        .await?;

        let id = format!("ServerTasks-{}", self.next_id.fetch_add(1, Ordering::SeqCst) + 1);
        let self_link = format!("{}/{}", collection_link.trim_end_matches('/'), id);

        let mut created = resource.clone();
        if let Value::Object(fields) = &mut created {
            fields.insert("Id".to_string(), json!(id));
            fields.insert("State".to_string(), json!("Queued"));
            fields.insert("IsCompleted".to_string(), json!(false));
            let task_links: Map<String, Value> = [
                (links::SELF, self_link.clone()),
                (links::DETAILS, format!("{self_link}/details{{?verbose,tail}}")),
                (links::RAW, format!("{self_link}/raw")),
                (links::RERUN, format!("{self_link}/rerun")),
                (links::CANCEL, format!("{self_link}/cancel")),
                (links::STATE, format!("{self_link}/state")),
                (links::QUEUED_BEHIND, format!("{self_link}/queued-behind{{?skip,take}}")),
            ]
            .into_iter()
            .map(|(name, href)| (name.to_string(), Value::String(href)))
            .collect();
            fields.insert("Links".to_string(), Value::Object(task_links));
        }

        self.respond(self_link, created.clone());
        Ok(created)
    }

    async fn list_all(
        &self,
        link: &str,
        query: &QueryParameters,
    ) -> Result<Vec<Value>, TransportError> {
        self.observe(RequestMethod::ListAll, link, query, None)
            .await?;
        Ok(self.lists.lock().get(link).cloned().unwrap_or_default())
    }

    async fn collection_link(
        &self,
        collection: &str,
        space_id: Option<&str>,
    ) -> Result<String, TransportError> {
        let collection = collection.to_lowercase();
        Ok(match space_id {
            Some(space) => format!("/api/{space}/{collection}"),
            None => format!("/api/{collection}"),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn create_assigns_ids_and_links() {
        let client = InMemoryLinkClient::new();
        let created = client
            .create("/api/Spaces-1/tasks", &json!({ "Name": "Health" }))
            .await
            .unwrap();
        assert_eq!(created["Id"], "ServerTasks-1");
        assert_eq!(created["Links"]["Self"], "/api/Spaces-1/tasks/ServerTasks-1");

        let again = client
            .create("/api/tasks", &json!({ "Name": "Backup" }))
            .await
            .unwrap();
        assert_eq!(again["Id"], "ServerTasks-2");

        let fetched = client
            .get("/api/Spaces-1/tasks/ServerTasks-1", &QueryParameters::new())
            .await
            .unwrap();
        assert_eq!(fetched["Name"], "Health");
    }

    #[tokio::test]
    async fn unscripted_get_is_not_found() {
        let client = InMemoryLinkClient::new();
        let err = client
            .get("/api/nowhere", &QueryParameters::new())
            .await
            .unwrap_err();
        assert!(matches!(err, TransportError::Http { status: 404, .. }));
        assert_eq!(client.request_count(), 1);
    }

    #[tokio::test]
    async fn failures_apply_to_every_method() {
        let client = InMemoryLinkClient::new();
        client.fail("/api/x", TransportError::Connection("reset".to_string()));
        assert!(client.post("/api/x", None).await.is_err());
        assert!(client.list_all("/api/x", &QueryParameters::new()).await.is_err());
        assert_eq!(client.requests().len(), 2);
    }

    #[tokio::test]
    async fn collection_links_are_space_scoped() {
        let client = InMemoryLinkClient::new();
        assert_eq!(
            client.collection_link("Tasks", Some("Spaces-3")).await.unwrap(),
            "/api/Spaces-3/tasks"
        );
        assert_eq!(client.collection_link("Tasks", None).await.unwrap(), "/api/tasks");
        assert_eq!(client.request_count(), 0);
    }
}
