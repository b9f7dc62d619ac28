//! HTTP access to a running registry API.

use std::time::Duration;

use async_trait::async_trait;

use super::ClientError;
use crate::domain::{Component, ComponentUpdate};

/// Remote registry operations used by the client
#[async_trait]
pub trait RemoteRegistry: Send + Sync {
    /// Fetch the full component list
    async fn list(&self) -> Result<Vec<Component>, ClientError>;

    /// Register or update a component
    async fn put(&self, id: &str, update: &ComponentUpdate) -> Result<Component, ClientError>;

    /// Delete a component
    async fn delete(&self, id: &str) -> Result<(), ClientError>;
}

/// `RemoteRegistry` over the components REST API
pub struct HttpRemote {
    base_url: String,
    client: reqwest::Client,
}

impl HttpRemote {
    /// `base_url` points at the collection, e.g. `http://127.0.0.1:3000/api/components`
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self, ClientError> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            client,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn item_url(&self, id: &str) -> String {
        format!("{}/{}", self.base_url, id)
    }
}

async fn check_status(response: reqwest::Response) -> Result<reqwest::Response, ClientError> {
    let status = response.status();
    if status.is_success() {
        Ok(response)
    } else {
        let body = response.text().await.unwrap_or_default();
        Err(ClientError::Status {
            status: status.as_u16(),
            body,
        })
    }
}

#[async_trait]
impl RemoteRegistry for HttpRemote {
    async fn list(&self) -> Result<Vec<Component>, ClientError> {
        let response = self.client.get(&self.base_url).send().await?;
        Ok(check_status(response).await?.json().await?)
    }

    async fn put(&self, id: &str, update: &ComponentUpdate) -> Result<Component, ClientError> {
        let response = self.client.put(self.item_url(id)).json(update).send().await?;
        Ok(check_status(response).await?.json().await?)
    }

    async fn delete(&self, id: &str) -> Result<(), ClientError> {
        let response = self.client.delete(self.item_url(id)).send().await?;
        check_status(response).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_urls() {
        let remote = HttpRemote::new("http://localhost:3000/api/components/", Duration::from_secs(1)).unwrap();
        assert_eq!(remote.base_url(), "http://localhost:3000/api/components");
        assert_eq!(remote.item_url("quiz"), "http://localhost:3000/api/components/quiz");
    }

    #[tokio::test]
    async fn test_unreachable_server_is_error() {
        // Port 9 (discard) is not expected to run an HTTP server
        let remote = HttpRemote::new("http://127.0.0.1:9/api/components", Duration::from_secs(2)).unwrap();
        assert!(remote.list().await.is_err());
    }
}
