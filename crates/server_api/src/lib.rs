use shared::{
    domain::{is_allowed_image_mime, CardId},
    error::{ApiError, ErrorCode},
    protocol::{
        CardPayload, CreateCardRequest, ReorderEntry, UpdateCardRequest, UploadImageResponse,
    },
};
use storage::{CardChanges, ReorderOutcome, Storage, StoredCard};
use tracing::info;
use uuid::Uuid;

#[derive(Clone)]
pub struct ApiContext {
    pub storage: Storage,
}

pub async fn list_cards(ctx: &ApiContext) -> Result<Vec<CardPayload>, ApiError> {
    let cards = ctx.storage.list_cards().await.map_err(internal)?;
    Ok(cards.into_iter().map(payload_from_stored).collect())
}

pub async fn get_card(ctx: &ApiContext, card_id: CardId) -> Result<CardPayload, ApiError> {
    let card = ctx
        .storage
        .get_card(card_id)
        .await
        .map_err(internal)?
        .ok_or_else(|| ApiError::new(ErrorCode::NotFound, "card not found"))?;
    Ok(payload_from_stored(card))
}

pub async fn create_card(
    ctx: &ApiContext,
    req: CreateCardRequest,
) -> Result<CardPayload, ApiError> {
    let title = req.title.trim();
    let link = req.link.trim();
    let image_url = req.image_url.trim();
    if title.is_empty() {
        return Err(ApiError::new(ErrorCode::Validation, "title cannot be empty"));
    }
    if link.is_empty() {
        return Err(ApiError::new(ErrorCode::Validation, "link cannot be empty"));
    }
    if image_url.is_empty() {
        return Err(ApiError::new(
            ErrorCode::Validation,
            "image_url cannot be empty",
        ));
    }

    let card = ctx
        .storage
        .insert_card(title, link, image_url, req.order)
        .await
        .map_err(internal)?;
    info!(card_id = %card.id, order = card.order, "drawer card created");
    Ok(payload_from_stored(card))
}

pub async fn update_card(
    ctx: &ApiContext,
    card_id: CardId,
    req: UpdateCardRequest,
) -> Result<CardPayload, ApiError> {
    if let Some(title) = req.title.as_deref() {
        if title.trim().is_empty() {
            return Err(ApiError::new(ErrorCode::Validation, "title cannot be empty"));
        }
    }
    if let Some(link) = req.link.as_deref() {
        if link.trim().is_empty() {
            return Err(ApiError::new(ErrorCode::Validation, "link cannot be empty"));
        }
    }
    if let Some(image_url) = req.image_url.as_deref() {
        if image_url.trim().is_empty() {
            return Err(ApiError::new(
                ErrorCode::Validation,
                "image_url cannot be empty",
            ));
        }
    }

    let changes = CardChanges {
        title: req.title,
        link: req.link,
        image_url: req.image_url,
        order: req.order,
    };
    let card = ctx
        .storage
        .update_card(card_id, &changes)
        .await
        .map_err(internal)?
        .ok_or_else(|| ApiError::new(ErrorCode::NotFound, "card not found"))?;
    Ok(payload_from_stored(card))
}

pub async fn delete_card(ctx: &ApiContext, card_id: CardId) -> Result<(), ApiError> {
    let deleted = ctx.storage.delete_card(card_id).await.map_err(internal)?;
    if !deleted {
        return Err(ApiError::new(ErrorCode::NotFound, "card not found"));
    }
    info!(card_id = %card_id, "drawer card deleted");
    Ok(())
}

/// Applies the full target order set in one transaction. Unknown ids reject
/// the whole request; the stored deck is re-normalized dense before commit.
pub async fn reorder_cards(
    ctx: &ApiContext,
    entries: Vec<ReorderEntry>,
) -> Result<(), ApiError> {
    if entries.is_empty() {
        return Err(ApiError::new(
            ErrorCode::Validation,
            "reorder requires at least one entry",
        ));
    }

    match ctx
        .storage
        .apply_reorder(&entries)
        .await
        .map_err(internal)?
    {
        ReorderOutcome::Applied => {
            info!(entries = entries.len(), "drawer cards reordered");
            Ok(())
        }
        ReorderOutcome::UnknownCard(card_id) => Err(ApiError::new(
            ErrorCode::NotFound,
            format!("card {card_id} not found; reorder rejected"),
        )),
    }
}

/// Persists an uploaded card image and returns its public URL. Only PNG,
/// JPEG and WebP are accepted.
pub async fn store_image(
    ctx: &ApiContext,
    original_filename: Option<&str>,
    mime_type: &str,
    bytes: &[u8],
) -> Result<UploadImageResponse, ApiError> {
    if !is_allowed_image_mime(mime_type) {
        return Err(ApiError::new(
            ErrorCode::UnsupportedMedia,
            "invalid file type; allowed: PNG, JPEG, WebP",
        ));
    }
    if bytes.is_empty() {
        return Err(ApiError::new(
            ErrorCode::Validation,
            "image body cannot be empty",
        ));
    }

    let extension = original_filename
        .and_then(|name| name.rsplit_once('.').map(|(_, ext)| ext))
        .filter(|ext| !ext.is_empty() && ext.chars().all(|c| c.is_ascii_alphanumeric()))
        .unwrap_or("png");
    let filename = format!("{}.{extension}", Uuid::new_v4());

    ctx.storage
        .store_image(&filename, mime_type, bytes)
        .await
        .map_err(internal)?;
    info!(%filename, size_bytes = bytes.len(), "card image stored");

    Ok(UploadImageResponse {
        url: format!("/uploads/{filename}"),
        filename,
    })
}

fn payload_from_stored(card: StoredCard) -> CardPayload {
    CardPayload {
        id: card.id,
        title: card.title,
        link: card.link,
        image_url: card.image_url,
        order: card.order,
        created_at: card.created_at,
        updated_at: card.updated_at,
    }
}

fn internal(err: anyhow::Error) -> ApiError {
    ApiError::new(ErrorCode::Internal, err.to_string())
}

#[cfg(test)]
#[path = "tests/lib_tests.rs"]
mod tests;
