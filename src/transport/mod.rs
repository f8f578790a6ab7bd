//! Link-following transport contract.
//!
//! The task repository never builds URLs itself. It follows the named links
//! a resource exposes and asks a [`LinkClient`] to issue the request. The
//! contract is object safe and speaks `serde_json::Value` so it can be held
//! as `Arc<dyn LinkClient>`; [`LinkClientExt`] layers typed helpers on top.
//!
//! # Implementations
//!
//! - [`InMemoryLinkClient`](memory::InMemoryLinkClient) -- a scripted,
//!   in-process server that records every request. Used by the test-suite.
//! - [`HttpLinkClient`](http::HttpLinkClient) -- `reqwest` over HTTP(S).
//!   Available behind the `http-client` feature (on by default).
//!
//! Retry policy, authentication and wire encoding are transport concerns and
//! never appear in the task repository.

#[cfg(feature = "http-client")]
pub mod http;
pub mod memory;

use async_trait::async_trait;
use indexmap::IndexMap;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;

use crate::error::TransportError;

/// Ordered query-string parameters.
///
/// # Examples
///
/// ```
/// use octopus_client::QueryParameters;
///
/// let base = QueryParameters::new().with("spaces", "Spaces-1");
/// let query = base.merged(&QueryParameters::new().with("tail", 20).with("verbose", true));
///
/// let pairs: Vec<_> = query.iter().collect();
/// assert_eq!(pairs, vec![("spaces", "Spaces-1"), ("tail", "20"), ("verbose", "true")]);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QueryParameters(IndexMap<String, String>);

impl QueryParameters {
    /// Creates an empty parameter set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a parameter, replacing an existing one with the same name.
    pub fn with(mut self, name: impl Into<String>, value: impl ToString) -> Self {
        self.insert(name, value);
        self
    }

    /// Inserts a parameter, replacing an existing one with the same name.
    pub fn insert(&mut self, name: impl Into<String>, value: impl ToString) {
        self.0.insert(name.into(), value.to_string());
    }

    /// Returns a copy of `self` with every parameter of `other` applied on top.
    pub fn merged(&self, other: &QueryParameters) -> QueryParameters {
        let mut out = self.clone();
        for (name, value) in other.iter() {
            out.insert(name, value);
        }
        out
    }

    /// Looks up a parameter by name.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.0.get(name).map(String::as_str)
    }

    /// Iterates parameters in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Returns `true` when no parameters are set.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Number of parameters.
    pub fn len(&self) -> usize {
        self.0.len()
    }
}

/// Link-following client consumed by the task repository.
///
/// Every method issues exactly one logical request (`list_all` may span
/// several pages) and returns transport failures unchanged.
#[async_trait]
pub trait LinkClient: Send + Sync {
    /// Follows `link` with a GET and returns the JSON payload.
    async fn get(&self, link: &str, query: &QueryParameters) -> Result<Value, TransportError>;

    /// Follows `link` with a GET and returns the body as text.
    async fn get_text(&self, link: &str, query: &QueryParameters)
        -> Result<String, TransportError>;

    /// Follows `link` with a POST, optionally carrying a JSON body.
    async fn post(&self, link: &str, body: Option<&Value>) -> Result<(), TransportError>;

    /// Submits `resource` to a collection link and returns the created resource.
    async fn create(&self, collection_link: &str, resource: &Value)
        -> Result<Value, TransportError>;

    /// Follows `link` and every subsequent `Page.Next` link, returning all items.
    async fn list_all(
        &self,
        link: &str,
        query: &QueryParameters,
    ) -> Result<Vec<Value>, TransportError>;

    /// Resolves a named collection link, scoped to `space_id` when given.
    ///
    /// `None` yields the unscoped, system-level collection.
    async fn collection_link(
        &self,
        collection: &str,
        space_id: Option<&str>,
    ) -> Result<String, TransportError>;
}

/// Typed helpers over any [`LinkClient`].
#[async_trait]
pub trait LinkClientExt: LinkClient {
    /// GET `link` and deserialize the payload.
    async fn get_as<T>(&self, link: &str, query: &QueryParameters) -> Result<T, TransportError>
    where
        T: DeserializeOwned + Send + 'static,
    {
        let value = self.get(link, query).await?;
        Ok(serde_json::from_value(value)?)
    }

    /// Create `resource` under `collection_link` and deserialize the created resource.
    async fn create_as<T, B>(&self, collection_link: &str, resource: &B) -> Result<T, TransportError>
    where
        T: DeserializeOwned + Send + 'static,
        B: Serialize + Sync + ?Sized,
    {
        let body = serde_json::to_value(resource)?;
        let created = self.create(collection_link, &body).await?;
        Ok(serde_json::from_value(created)?)
    }

    /// List every item behind `link` and deserialize each.
    async fn list_all_as<T>(
        &self,
        link: &str,
        query: &QueryParameters,
    ) -> Result<Vec<T>, TransportError>
    where
        T: DeserializeOwned + Send + 'static,
    {
        self.list_all(link, query)
            .await?
            .into_iter()
            .map(|item| serde_json::from_value(item).map_err(TransportError::from))
            .collect()
    }
}

impl<C: LinkClient + ?Sized> LinkClientExt for C {}
