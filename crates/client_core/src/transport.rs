use anyhow::{anyhow, Context};
use async_trait::async_trait;
use reqwest::Client;
use shared::{
    domain::CardId,
    error::ApiError,
    protocol::{
        CardPayload, CreateCardRequest, ReorderEntry, UpdateCardRequest, UploadImageResponse,
    },
};
use url::Url;

use crate::error::DeckError;

/// Seam between [`crate::DeckManager`] and the drawer backend. Tests swap in
/// an in-memory implementation.
#[async_trait]
pub trait ApiTransport: Send + Sync {
    async fn list_cards(&self) -> Result<Vec<CardPayload>, DeckError>;
    async fn create_card(&self, req: CreateCardRequest) -> Result<CardPayload, DeckError>;
    async fn update_card(
        &self,
        card_id: CardId,
        req: UpdateCardRequest,
    ) -> Result<CardPayload, DeckError>;
    async fn delete_card(&self, card_id: CardId) -> Result<(), DeckError>;
    async fn reorder_cards(&self, entries: Vec<ReorderEntry>) -> Result<(), DeckError>;
    async fn upload_image(
        &self,
        filename: &str,
        mime_type: &str,
        bytes: Vec<u8>,
    ) -> Result<UploadImageResponse, DeckError>;
}

/// reqwest-backed transport against the drawer REST API.
pub struct HttpTransport {
    client: Client,
    base_url: Url,
}

impl HttpTransport {
    pub fn new(base_url: &str) -> Result<Self, DeckError> {
        let base_url = Url::parse(base_url)
            .with_context(|| format!("invalid base url: {base_url}"))
            .map_err(DeckError::Network)?;
        Ok(Self {
            client: Client::new(),
            base_url,
        })
    }

    /// Resolves a card's `image_url` (usually a server-relative `/uploads/..`
    /// path) against the transport's base url.
    pub fn resolve_image_url(&self, image_url: &str) -> Result<Url, DeckError> {
        self.base_url
            .join(image_url)
            .with_context(|| format!("cannot resolve image url: {image_url}"))
            .map_err(DeckError::Network)
    }

    fn endpoint(&self, path: &str) -> Result<Url, DeckError> {
        self.base_url
            .join(path)
            .with_context(|| format!("cannot build endpoint url: {path}"))
            .map_err(DeckError::Network)
    }

    async fn decode<T: serde::de::DeserializeOwned>(
        response: reqwest::Response,
    ) -> Result<T, DeckError> {
        let status = response.status();
        if status.is_success() {
            return response
                .json::<T>()
                .await
                .context("failed to decode response body")
                .map_err(DeckError::Network);
        }
        Err(Self::decode_error(response).await)
    }

    async fn expect_no_content(response: reqwest::Response) -> Result<(), DeckError> {
        if response.status().is_success() {
            return Ok(());
        }
        Err(Self::decode_error(response).await)
    }

    async fn decode_error(response: reqwest::Response) -> DeckError {
        let status = response.status();
        match response.json::<ApiError>().await {
            Ok(err) => DeckError::from_api(err),
            Err(_) => DeckError::Network(anyhow!("server returned {status}")),
        }
    }
}

fn network(err: reqwest::Error) -> DeckError {
    DeckError::Network(anyhow::Error::new(err).context("request failed"))
}

#[async_trait]
impl ApiTransport for HttpTransport {
    async fn list_cards(&self) -> Result<Vec<CardPayload>, DeckError> {
        let url = self.endpoint("api/drawer-cards")?;
        let response = self.client.get(url).send().await.map_err(network)?;
        Self::decode(response).await
    }

    async fn create_card(&self, req: CreateCardRequest) -> Result<CardPayload, DeckError> {
        let url = self.endpoint("api/drawer-cards")?;
        let response = self
            .client
            .post(url)
            .json(&req)
            .send()
            .await
            .map_err(network)?;
        Self::decode(response).await
    }

    async fn update_card(
        &self,
        card_id: CardId,
        req: UpdateCardRequest,
    ) -> Result<CardPayload, DeckError> {
        let url = self.endpoint(&format!("api/drawer-cards/{card_id}"))?;
        let response = self
            .client
            .put(url)
            .json(&req)
            .send()
            .await
            .map_err(network)?;
        Self::decode(response).await
    }

    async fn delete_card(&self, card_id: CardId) -> Result<(), DeckError> {
        let url = self.endpoint(&format!("api/drawer-cards/{card_id}"))?;
        let response = self.client.delete(url).send().await.map_err(network)?;
        Self::expect_no_content(response).await
    }

    async fn reorder_cards(&self, entries: Vec<ReorderEntry>) -> Result<(), DeckError> {
        let url = self.endpoint("api/drawer-cards/reorder")?;
        let response = self
            .client
            .post(url)
            .json(&entries)
            .send()
            .await
            .map_err(network)?;
        Self::expect_no_content(response).await
    }

    async fn upload_image(
        &self,
        filename: &str,
        mime_type: &str,
        bytes: Vec<u8>,
    ) -> Result<UploadImageResponse, DeckError> {
        let url = self.endpoint("api/upload-image")?;
        let part = reqwest::multipart::Part::bytes(bytes)
            .file_name(filename.to_string())
            .mime_str(mime_type)
            .with_context(|| format!("invalid mime type: {mime_type}"))
            .map_err(DeckError::Network)?;
        let form = reqwest::multipart::Form::new().part("file", part);
        let response = self
            .client
            .post(url)
            .multipart(form)
            .send()
            .await
            .map_err(network)?;
        Self::decode(response).await
    }
}
