use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::{Card, CardId};

/// Wire shape of one drawer card, sorted ascending by `order` in list
/// responses.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CardPayload {
    pub id: CardId,
    pub title: String,
    pub link: String,
    pub image_url: String,
    pub order: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<Card> for CardPayload {
    fn from(card: Card) -> Self {
        Self {
            id: card.id,
            title: card.title,
            link: card.link,
            image_url: card.image_url,
            order: card.order,
            created_at: card.created_at,
            updated_at: card.updated_at,
        }
    }
}

impl From<CardPayload> for Card {
    fn from(payload: CardPayload) -> Self {
        Self {
            id: payload.id,
            title: payload.title,
            link: payload.link,
            image_url: payload.image_url,
            order: payload.order,
            created_at: payload.created_at,
            updated_at: payload.updated_at,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateCardRequest {
    pub title: String,
    pub link: String,
    pub image_url: String,
    #[serde(default)]
    pub order: i64,
}

/// Partial update; absent fields are left untouched.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateCardRequest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub link: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub order: Option<i64>,
}

impl UpdateCardRequest {
    pub fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.link.is_none()
            && self.image_url.is_none()
            && self.order.is_none()
    }
}

/// One entry of an atomic reorder request. The full target order set is
/// carried in a single request so partial application can never be observed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReorderEntry {
    pub id: CardId,
    pub order: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UploadImageResponse {
    pub filename: String,
    pub url: String,
}
