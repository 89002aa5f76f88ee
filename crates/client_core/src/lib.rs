use shared::{
    domain::{is_allowed_image_mime, Card, CardId, MoveDirection},
    protocol::{CreateCardRequest, ReorderEntry, UpdateCardRequest, UploadImageResponse},
};
use tokio::sync::{broadcast, Mutex};
use tracing::{debug, info};

pub mod error;
pub mod transport;

pub use error::DeckError;
pub use transport::{ApiTransport, HttpTransport};

const EVENT_CHANNEL_CAPACITY: usize = 64;

/// State change notifications for UI layers. Every event carries enough data
/// to re-render without another fetch.
#[derive(Debug, Clone)]
pub enum DeckEvent {
    Refreshed(Vec<Card>),
    CardCreated(Card),
    CardUpdated(Card),
    CardDeleted(CardId),
    Reordered(Vec<Card>),
}

#[derive(Default)]
struct DeckState {
    cards: Vec<Card>,
}

/// Owns the client-side card list and serializes every mutation: the state
/// lock is held across the network call and the follow-up refresh, so two
/// concurrent operations can never interleave their server round trips.
pub struct DeckManager<T: ApiTransport> {
    transport: T,
    state: Mutex<DeckState>,
    events: broadcast::Sender<DeckEvent>,
}

impl<T: ApiTransport> DeckManager<T> {
    pub fn new(transport: T) -> Self {
        let (events, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        Self {
            transport,
            state: Mutex::new(DeckState::default()),
            events,
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<DeckEvent> {
        self.events.subscribe()
    }

    /// Snapshot of the current deck, sorted ascending by `order`.
    pub async fn deck(&self) -> Vec<Card> {
        self.state.lock().await.cards.clone()
    }

    /// Replaces the local deck with the server's card list. On failure the
    /// previous deck is kept untouched.
    pub async fn refresh(&self) -> Result<Vec<Card>, DeckError> {
        let mut state = self.state.lock().await;
        let cards = self.fetch_normalized().await?;
        state.cards = cards.clone();
        self.emit(DeckEvent::Refreshed(cards.clone()));
        Ok(cards)
    }

    pub async fn create_card(
        &self,
        title: &str,
        link: &str,
        image_url: &str,
    ) -> Result<Card, DeckError> {
        let title = title.trim();
        let link = link.trim();
        let image_url = image_url.trim();
        if title.is_empty() {
            return Err(DeckError::Validation("title cannot be empty".into()));
        }
        if link.is_empty() {
            return Err(DeckError::Validation("link cannot be empty".into()));
        }
        if image_url.is_empty() {
            return Err(DeckError::Validation("image_url cannot be empty".into()));
        }

        let mut state = self.state.lock().await;
        let req = CreateCardRequest {
            title: title.to_string(),
            link: link.to_string(),
            image_url: image_url.to_string(),
            order: state.cards.len() as i64,
        };
        let created: Card = self.transport.create_card(req).await?.into();
        state.cards = self.fetch_normalized().await?;
        info!(card_id = %created.id, "card created");
        self.emit(DeckEvent::CardCreated(created.clone()));
        Ok(created)
    }

    pub async fn update_card(
        &self,
        card_id: CardId,
        changes: UpdateCardRequest,
    ) -> Result<Card, DeckError> {
        if changes.is_empty() {
            return Err(DeckError::Validation(
                "update must change at least one field".into(),
            ));
        }
        for (field, value) in [
            ("title", &changes.title),
            ("link", &changes.link),
            ("image_url", &changes.image_url),
        ] {
            if value.as_deref().is_some_and(|v| v.trim().is_empty()) {
                return Err(DeckError::Validation(format!(
                    "{field} cannot be blanked"
                )));
            }
        }

        let mut state = self.state.lock().await;
        ensure_in_deck(&state, card_id)?;
        let updated: Card = self.transport.update_card(card_id, changes).await?.into();
        state.cards = self.fetch_normalized().await?;
        self.emit(DeckEvent::CardUpdated(updated.clone()));
        Ok(updated)
    }

    pub async fn delete_card(&self, card_id: CardId) -> Result<(), DeckError> {
        let mut state = self.state.lock().await;
        ensure_in_deck(&state, card_id)?;
        self.transport.delete_card(card_id).await?;
        state.cards = self.fetch_normalized().await?;
        info!(%card_id, "card deleted");
        self.emit(DeckEvent::CardDeleted(card_id));
        Ok(())
    }

    /// Swaps the card with its neighbor in the given direction. Moving the
    /// first card up or the last card down is a no-op and touches no network.
    pub async fn move_card(
        &self,
        card_id: CardId,
        direction: MoveDirection,
    ) -> Result<Vec<Card>, DeckError> {
        let mut state = self.state.lock().await;
        let position = state
            .cards
            .iter()
            .position(|card| card.id == card_id)
            .ok_or_else(|| DeckError::NotFound(format!("card {card_id} not in deck")))?;

        let neighbor = match direction {
            MoveDirection::Up => position.checked_sub(1),
            MoveDirection::Down => {
                let below = position + 1;
                (below < state.cards.len()).then_some(below)
            }
        };
        let Some(neighbor) = neighbor else {
            debug!(%card_id, ?direction, "move at deck boundary ignored");
            return Ok(state.cards.clone());
        };

        let mut target: Vec<&Card> = state.cards.iter().collect();
        target.swap(position, neighbor);
        let entries: Vec<ReorderEntry> = target
            .iter()
            .enumerate()
            .map(|(index, card)| ReorderEntry {
                id: card.id,
                order: index as i64,
            })
            .collect();

        self.transport.reorder_cards(entries).await?;
        state.cards = self.fetch_normalized().await?;
        self.emit(DeckEvent::Reordered(state.cards.clone()));
        Ok(state.cards.clone())
    }

    /// Validates the MIME type locally before any bytes leave the client.
    pub async fn upload_image(
        &self,
        filename: &str,
        mime_type: &str,
        bytes: Vec<u8>,
    ) -> Result<UploadImageResponse, DeckError> {
        if !is_allowed_image_mime(mime_type) {
            return Err(DeckError::UnsupportedMedia(format!(
                "{mime_type} is not an accepted image type"
            )));
        }
        if bytes.is_empty() {
            return Err(DeckError::Validation("image file is empty".into()));
        }
        self.transport.upload_image(filename, mime_type, bytes).await
    }

    /// Fetches the server list and re-derives `order` from sorted position,
    /// so local state is dense even if the server ever reports gaps.
    async fn fetch_normalized(&self) -> Result<Vec<Card>, DeckError> {
        let mut cards: Vec<Card> = self
            .transport
            .list_cards()
            .await?
            .into_iter()
            .map(Card::from)
            .collect();
        cards.sort_by_key(|card| card.order);
        for (index, card) in cards.iter_mut().enumerate() {
            card.order = index as i64;
        }
        Ok(cards)
    }

    fn emit(&self, event: DeckEvent) {
        // Nobody listening is fine.
        let _ = self.events.send(event);
    }
}

/// Mutations target the last loaded deck; an id missing from it is rejected
/// before any network traffic.
fn ensure_in_deck(state: &DeckState, card_id: CardId) -> Result<(), DeckError> {
    if state.cards.iter().any(|card| card.id == card_id) {
        return Ok(());
    }
    Err(DeckError::NotFound(format!("card {card_id} not in deck")))
}

#[cfg(test)]
#[path = "tests/lib_tests.rs"]
mod tests;
