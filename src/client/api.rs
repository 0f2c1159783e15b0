use crate::models::{Category, ErrorBody, Item, MessageResponse, NewCategoryPayload};
use async_trait::async_trait;
use reqwest::Url;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("HTTP error! status: {status}: {message}")]
    Status { status: u16, message: String },
    #[error("request failed: {0}")]
    Transport(String),
    #[error("invalid response: {0}")]
    Decode(String),
}

impl From<reqwest::Error> for ClientError {
    fn from(value: reqwest::Error) -> Self {
        if value.is_decode() {
            Self::Decode(value.to_string())
        } else {
            Self::Transport(value.to_string())
        }
    }
}

pub type ClientResult<T> = Result<T, ClientError>;

/// Item fields as typed into a form. Quantity stays text; the server decides whether
/// it is a whole number.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ItemDraft {
    pub name: String,
    pub quantity: String,
    pub category: String,
}

impl ItemDraft {
    pub fn new(name: impl Into<String>, quantity: impl Into<String>, category: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            quantity: quantity.into(),
            category: category.into(),
        }
    }
}

#[async_trait]
pub trait InventoryApi: Send + Sync {
    async fn list_items(&self) -> ClientResult<Vec<Item>>;
    async fn create_item(&self, draft: &ItemDraft) -> ClientResult<Item>;
    async fn update_item(&self, id: &str, draft: &ItemDraft) -> ClientResult<MessageResponse>;
    async fn delete_item(&self, id: &str) -> ClientResult<MessageResponse>;
    async fn list_categories(&self) -> ClientResult<Vec<Category>>;
    async fn create_category(&self, name: &str) -> ClientResult<Category>;
}

/// Talks to the inventory server's JSON API.
#[derive(Debug, Clone)]
pub struct HttpInventoryApi {
    client: reqwest::Client,
    base_url: Url,
}

impl HttpInventoryApi {
    pub fn new(base_url: &str) -> ClientResult<Self> {
        let base_url = Url::parse(base_url)
            .map_err(|error| ClientError::Transport(format!("invalid base URL {base_url}: {error}")))?;
        if base_url.cannot_be_a_base() {
            return Err(ClientError::Transport(format!("{base_url} cannot be a base URL")));
        }
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(15))
            .build()
            .map_err(|error| ClientError::Transport(format!("failed to build HTTP client: {error}")))?;
        Ok(Self { client, base_url })
    }

    /// Appends path segments to the base URL, percent-encoding each one.
    fn url(&self, segments: &[&str]) -> ClientResult<Url> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| ClientError::Transport(format!("{} cannot be a base URL", self.base_url)))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    async fn send<T: DeserializeOwned>(&self, request: reqwest::RequestBuilder) -> ClientResult<T> {
        let response = request.send().await?;
        let status = response.status();
        if !status.is_success() {
            let message = match response.json::<ErrorBody>().await {
                Ok(body) => body.error,
                Err(_) => status.canonical_reason().unwrap_or("unknown error").to_string(),
            };
            return Err(ClientError::Status {
                status: status.as_u16(),
                message,
            });
        }
        Ok(response.json::<T>().await?)
    }
}

#[async_trait]
impl InventoryApi for HttpInventoryApi {
    async fn list_items(&self) -> ClientResult<Vec<Item>> {
        self.send(self.client.get(self.url(&["api", "items"])?)).await
    }

    async fn create_item(&self, draft: &ItemDraft) -> ClientResult<Item> {
        self.send(self.client.post(self.url(&["api", "items"])?).json(draft)).await
    }

    async fn update_item(&self, id: &str, draft: &ItemDraft) -> ClientResult<MessageResponse> {
        self.send(self.client.put(self.url(&["api", "items", id])?).json(draft))
            .await
    }

    async fn delete_item(&self, id: &str) -> ClientResult<MessageResponse> {
        self.send(self.client.delete(self.url(&["api", "items", id])?))
            .await
    }

    async fn list_categories(&self) -> ClientResult<Vec<Category>> {
        self.send(self.client.get(self.url(&["api", "categories"])?)).await
    }

    async fn create_category(&self, name: &str) -> ClientResult<Category> {
        let payload = NewCategoryPayload {
            category: name.to_string(),
        };
        self.send(self.client.post(self.url(&["api", "categories"])?).json(&payload))
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::{ClientError, HttpInventoryApi};

    #[test]
    fn item_ids_are_encoded_as_a_single_path_segment() {
        let api = HttpInventoryApi::new("http://localhost:3000/").expect("client");
        let url = api.url(&["api", "items", "a b/c?d"]).expect("url");
        assert_eq!(url.as_str(), "http://localhost:3000/api/items/a%20b%2Fc%3Fd");
    }

    #[test]
    fn base_path_prefix_is_kept() {
        let api = HttpInventoryApi::new("http://localhost:3000/inventory").expect("client");
        let url = api.url(&["api", "categories"]).expect("url");
        assert_eq!(url.as_str(), "http://localhost:3000/inventory/api/categories");
    }

    #[test]
    fn unusable_base_urls_are_rejected() {
        assert!(matches!(HttpInventoryApi::new("not a url"), Err(ClientError::Transport(_))));
        assert!(matches!(
            HttpInventoryApi::new("mailto:stock@example.com"),
            Err(ClientError::Transport(_))
        ));
    }
}
