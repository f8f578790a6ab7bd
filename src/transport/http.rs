//! `reqwest`-backed [`LinkClient`].
//!
//! Links are resolved against [`ClientConfig::server_url`]:
//!
//! - URI templates are stripped (`/details{?verbose,tail}` -> `/details`),
//!   parameters are supplied through [`QueryParameters`] instead.
//! - `~/api/...` resolves under the server URL, keeping any virtual directory.
//! - `/api/...` resolves against the host root.
//! - Absolute `http(s)://` links are followed as-is.
//!
//! Non-success status codes become [`TransportError::Http`] carrying the
//! response body. No retries are attempted.

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue, USER_AGENT};
use serde::Deserialize;
use serde_json::Value;
use url::Url;

use super::{LinkClient, QueryParameters};
use crate::config::ClientConfig;
use crate::error::TransportError;
use crate::types::task::{links, Links};

/// One page of a server collection.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct ResourceCollection {
    #[serde(default)]
    items: Vec<Value>,
    #[serde(default)]
    links: Links,
}

/// HTTP(S) implementation of [`LinkClient`].
#[derive(Debug, Clone)]
pub struct HttpLinkClient {
    client: reqwest::Client,
    base_url: Url,
}

impl HttpLinkClient {
    /// Builds a client from configuration.
    ///
    /// Applies the request timeout and every configured header.
    pub fn new(config: &ClientConfig) -> Result<Self, TransportError> {
        let base_url = Url::parse(&config.server_url).map_err(|e| {
            TransportError::Configuration(format!(
                "invalid server url '{}': {}",
                config.server_url, e
            ))
        })?;

        let mut headers = HeaderMap::new();
        headers.insert(
            USER_AGENT,
            HeaderValue::from_static(concat!("octopus-client/", env!("CARGO_PKG_VERSION"))),
        );
        for (name, value) in &config.headers {
            let name = HeaderName::from_bytes(name.as_bytes()).map_err(|e| {
                TransportError::Configuration(format!("invalid header name '{}': {}", name, e))
            })?;
            let value = HeaderValue::from_str(value).map_err(|e| {
                TransportError::Configuration(format!("invalid value for header {}: {}", name, e))
            })?;
            headers.insert(name, value);
        }

        let client = reqwest::Client::builder()
            .timeout(config.timeout())
            .default_headers(headers)
            .build()
            .map_err(|e| {
                TransportError::Configuration(format!("failed to create HTTP client: {}", e))
            })?;

        Ok(Self::with_client(client, base_url))
    }

    /// Wraps an existing `reqwest` client.
    pub fn with_client(client: reqwest::Client, base_url: Url) -> Self {
        Self { client, base_url }
    }

    /// The server URL links are resolved against.
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Resolves a resource link into an absolute URL.
    ///
    /// # Examples
    ///
    /// ```
    /// use octopus_client::transport::http::HttpLinkClient;
    /// use url::Url;
    ///
    /// let client = HttpLinkClient::with_client(
    ///     reqwest::Client::new(),
    ///     Url::parse("https://octo.example.com/octopus/").unwrap(),
    /// );
    /// assert_eq!(
    ///     client.resolve("~/api/tasks/ServerTasks-1/details{?verbose,tail}").unwrap().as_str(),
    ///     "https://octo.example.com/octopus/api/tasks/ServerTasks-1/details"
    /// );
    /// assert_eq!(
    ///     client.resolve("/api/tasks").unwrap().as_str(),
    ///     "https://octo.example.com/api/tasks"
    /// );
    /// ```
    pub fn resolve(&self, link: &str) -> Result<Url, TransportError> {
        let link = strip_template(link);
        let invalid =
            |e: url::ParseError| TransportError::Configuration(format!("invalid link '{link}': {e}"));

        if link.starts_with("http://") || link.starts_with("https://") {
            return Url::parse(link).map_err(invalid);
        }

        match link.strip_prefix("~/") {
            Some(rest) => {
                let mut base = self.base_url.clone();
                if !base.path().ends_with('/') {
                    let path = format!("{}/", base.path());
                    base.set_path(&path);
                }
                base.join(rest).map_err(invalid)
            }
            None => self.base_url.join(link).map_err(invalid),
        }
    }

    fn url_with_query(&self, link: &str, query: &QueryParameters) -> Result<Url, TransportError> {
        let mut url = self.resolve(link)?;
        if !query.is_empty() {
            let mut pairs = url.query_pairs_mut();
            for (name, value) in query.iter() {
                pairs.append_pair(name, value);
            }
        }
        Ok(url)
    }

    async fn send(&self, request: reqwest::RequestBuilder) -> Result<String, TransportError> {
        let response = request
            .send()
            .await
            .map_err(|e| TransportError::Connection(e.to_string()))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| TransportError::Connection(e.to_string()))?;

        if !status.is_success() {
            return Err(TransportError::Http {
                status: status.as_u16(),
                body,
            });
        }
        Ok(body)
    }

    async fn send_json(&self, request: reqwest::RequestBuilder) -> Result<Value, TransportError> {
        let body = self.send(request).await?;
        if body.trim().is_empty() {
            return Ok(Value::Null);
        }
        Ok(serde_json::from_str(&body)?)
    }
}

fn strip_template(link: &str) -> &str {
    match link.find('{') {
        Some(idx) => &link[..idx],
        None => link,
    }
}

#[async_trait]
impl LinkClient for HttpLinkClient {
    async fn get(&self, link: &str, query: &QueryParameters) -> Result<Value, TransportError> {
        let url = self.url_with_query(link, query)?;
        tracing::trace!(method = "GET", url = %url, "following link");
        self.send_json(self.client.get(url)).await
    }

    async fn get_text(
        &self,
        link: &str,
        query: &QueryParameters,
    ) -> Result<String, TransportError> {
        let url = self.url_with_query(link, query)?;
        tracing::trace!(method = "GET", url = %url, "following link for text");
        self.send(self.client.get(url)).await
    }

    async fn post(&self, link: &str, body: Option<&Value>) -> Result<(), TransportError> {
        let url = self.resolve(link)?;
        tracing::trace!(method = "POST", url = %url, has_body = body.is_some(), "following link");
        let request = match body {
            Some(body) => self.client.post(url).json(body),
            None => self.client.post(url),
        };
        self.send(request).await.map(|_| ())
    }

    async fn create(
        &self,
        collection_link: &str,
        resource: &Value,
    ) -> Result<Value, TransportError> {
        let url = self.resolve(collection_link)?;
        tracing::trace!(method = "POST", url = %url, "creating resource");
        self.send_json(self.client.post(url).json(resource)).await
    }

    async fn list_all(
        &self,
        link: &str,
        query: &QueryParameters,
    ) -> Result<Vec<Value>, TransportError> {
        let mut items = Vec::new();
        let mut url = self.url_with_query(link, query)?;
        let mut visited = vec![url.clone()];

        loop {
            tracing::trace!(method = "GET", url = %url, page = visited.len(), "listing page");
            let page: ResourceCollection =
                serde_json::from_value(self.send_json(self.client.get(url)).await?)?;
            items.extend(page.items);

            let Some(next) = page.links.get(links::PAGE_NEXT) else {
                break;
            };
            let next = self.resolve(next)?;
            if visited.contains(&next) {
                break;
            }
            visited.push(next.clone());
            url = next;
        }

        Ok(items)
    }

    async fn collection_link(
        &self,
        collection: &str,
        space_id: Option<&str>,
    ) -> Result<String, TransportError> {
        let collection = collection.to_lowercase();
        Ok(match space_id {
            Some(space) => format!("~/api/{space}/{collection}"),
            None => format!("~/api/{collection}"),
        })
    }
}
