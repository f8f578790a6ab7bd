//! Actions on existing tasks.
//!
//! Mutations (`rerun`, `cancel`, `modify_state`) check the task's space
//! against the current space context before any request is made. Reads follow
//! the task's links without that check; they carry the space context as a
//! query parameter instead.

use serde_json::Value;

use super::{TaskRepository, TASKS_COLLECTION};
use crate::error::Result;
use crate::transport::{LinkClientExt, QueryParameters};
use crate::types::{links, ModifyTaskState, TaskDetailsResource, TaskResource, TaskState};

impl TaskRepository {
    /// Re-fetches `task` through its `Self` link.
    pub async fn refresh(&self, task: &TaskResource) -> Result<TaskResource> {
        let link = task.link(links::SELF)?;
        let query = self.guard().query_parameters();
        Ok(self.client().get_as::<TaskResource>(link, &query).await?)
    }

    /// Fetches task details and activity logs.
    ///
    /// `verbose` and `tail` are only sent when given.
    pub async fn get_details(
        &self,
        task: &TaskResource,
        verbose: Option<bool>,
        tail: Option<u32>,
    ) -> Result<TaskDetailsResource> {
        let link = task.link(links::DETAILS)?;

        let mut extra = QueryParameters::new();
        if let Some(verbose) = verbose {
            extra.insert("verbose", verbose);
        }
        if let Some(tail) = tail {
            extra.insert("tail", tail);
        }
        let query = self.guard().query_parameters().merged(&extra);

        Ok(self
            .client()
            .get_as::<TaskDetailsResource>(link, &query)
            .await?)
    }

    /// Fetches the full raw output log as text.
    pub async fn get_raw_output_log(&self, task: &TaskResource) -> Result<String> {
        let link = task.link(links::RAW)?;
        let query = self.guard().query_parameters();
        Ok(self.client().get_text(link, &query).await?)
    }

    /// Re-runs a finished task.
    ///
    /// # Errors
    ///
    /// [`Error::OutOfScope`](crate::Error::OutOfScope) when the task's space
    /// is outside the current context.
    pub async fn rerun(&self, task: &TaskResource) -> Result<()> {
        self.post_action(task, links::RERUN, None).await
    }

    /// Cancels a queued or executing task.
    ///
    /// # Errors
    ///
    /// [`Error::OutOfScope`](crate::Error::OutOfScope) when the task's space
    /// is outside the current context.
    pub async fn cancel(&self, task: &TaskResource) -> Result<()> {
        self.post_action(task, links::CANCEL, None).await
    }

    /// Forces a task into `state`, recording `reason`.
    ///
    /// # Errors
    ///
    /// [`Error::OutOfScope`](crate::Error::OutOfScope) when the task's space
    /// is outside the current context.
    pub async fn modify_state(
        &self,
        task: &TaskResource,
        state: TaskState,
        reason: impl Into<String>,
    ) -> Result<()> {
        let body = serde_json::to_value(ModifyTaskState {
            state,
            reason: reason.into(),
        })
        .map_err(crate::error::TransportError::from)?;
        self.post_action(task, links::STATE, Some(&body)).await
    }

    /// Lists the tasks queued on the same execution queue as `task`.
    pub async fn get_queued_behind_tasks(&self, task: &TaskResource) -> Result<Vec<TaskResource>> {
        let link = task.link(links::QUEUED_BEHIND)?;
        let query = self.guard().query_parameters();
        Ok(self.client().list_all_as::<TaskResource>(link, &query).await?)
    }

    /// Lists every active task, fetching `page_size` tasks per page.
    pub async fn get_all_active(&self, page_size: u32) -> Result<Vec<TaskResource>> {
        let collection = self
            .client()
            .collection_link(TASKS_COLLECTION, None)
            .await?;
        let query = self.guard().query_parameters().merged(
            &QueryParameters::new()
                .with("active", true)
                .with("take", page_size),
        );
        Ok(self.client().list_all_as::<TaskResource>(&collection, &query).await?)
    }

    async fn post_action(
        &self,
        task: &TaskResource,
        link_name: &str,
        body: Option<&Value>,
    ) -> Result<()> {
        self.guard().authorize(task)?;
        let link = task.link(link_name)?;
        tracing::debug!(
            task_id = task.id.as_deref().unwrap_or_default(),
            action = link_name,
            "posting task action"
        );
        Ok(self.client().post(link, body).await?)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::error::Error;
    use crate::space::SpaceContext;
    use crate::transport::memory::{InMemoryLinkClient, RequestMethod};
    use crate::types::Links;

    fn task(space_id: Option<&str>) -> TaskResource {
        TaskResource {
            id: Some("ServerTasks-1".to_string()),
            space_id: space_id.map(String::from),
            links: Links::default()
                .with(links::SELF, "/api/tasks/ServerTasks-1")
                .with(links::CANCEL, "/api/tasks/ServerTasks-1/cancel"),
            ..TaskResource::new("Health", "Manual health check")
        }
    }

    #[tokio::test]
    async fn missing_link_fails_before_any_request() {
        let client = Arc::new(InMemoryLinkClient::new());
        let repository = TaskRepository::new(client.clone(), Arc::new(SpaceContext::AllSpaces));

        let err = repository.rerun(&task(None)).await.unwrap_err();
        assert!(matches!(err, Error::MissingLink { .. }));
        assert_eq!(client.request_count(), 0);
    }

    #[tokio::test]
    async fn cancel_posts_without_body() {
        let client = Arc::new(InMemoryLinkClient::new());
        let repository = TaskRepository::new(client.clone(), Arc::new(SpaceContext::single("S1")));

        repository.cancel(&task(Some("S1"))).await.unwrap();
        let posts = client.requests_by(RequestMethod::Post);
        assert_eq!(posts.len(), 1);
        assert_eq!(posts[0].link, "/api/tasks/ServerTasks-1/cancel");
        assert!(posts[0].body.is_none());
    }
}
