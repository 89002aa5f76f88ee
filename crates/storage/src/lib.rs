use anyhow::{anyhow, Context, Result};
use chrono::{DateTime, Utc};
use sqlx::{
    sqlite::{SqliteConnectOptions, SqlitePoolOptions, SqliteRow},
    Pool, Row, Sqlite,
};
use std::{
    fs,
    path::{Path, PathBuf},
    str::FromStr,
};
use uuid::Uuid;

use shared::{domain::CardId, protocol::ReorderEntry};

#[derive(Clone)]
pub struct Storage {
    pool: Pool<Sqlite>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct StoredCard {
    pub id: CardId,
    pub title: String,
    pub link: String,
    pub image_url: String,
    pub order: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct StoredImage {
    pub filename: String,
    pub mime_type: String,
    pub bytes: Vec<u8>,
    pub size_bytes: u64,
}

#[derive(Debug, Clone, Default)]
pub struct CardChanges {
    pub title: Option<String>,
    pub link: Option<String>,
    pub image_url: Option<String>,
    pub order: Option<i64>,
}

const SELECT_CARD_COLUMNS: &str =
    "SELECT id, title, link, image_url, display_order, created_at, updated_at FROM drawer_cards";

impl Storage {
    pub async fn new(database_url: &str) -> Result<Self> {
        ensure_sqlite_parent_dir_exists(database_url)?;

        let connect_options = SqliteConnectOptions::from_str(database_url)?.create_if_missing(true);
        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect_with(connect_options)
            .await?;
        sqlx::migrate!("./migrations").run(&pool).await?;
        Ok(Self { pool })
    }

    pub fn pool(&self) -> &Pool<Sqlite> {
        &self.pool
    }

    pub async fn health_check(&self) -> Result<()> {
        let _: i64 = sqlx::query_scalar("SELECT 1")
            .fetch_one(&self.pool)
            .await
            .context("sqlite ping failed")?;
        Ok(())
    }

    /// Full deck, ascending by display position.
    pub async fn list_cards(&self) -> Result<Vec<StoredCard>> {
        let rows = sqlx::query(&format!(
            "{SELECT_CARD_COLUMNS} ORDER BY display_order ASC, id ASC"
        ))
        .fetch_all(&self.pool)
        .await?;
        rows.into_iter().map(|r| card_from_row(&r)).collect()
    }

    pub async fn get_card(&self, card_id: CardId) -> Result<Option<StoredCard>> {
        let row = sqlx::query(&format!("{SELECT_CARD_COLUMNS} WHERE id = ?"))
            .bind(card_id.0.to_string())
            .fetch_optional(&self.pool)
            .await?;
        row.as_ref().map(card_from_row).transpose()
    }

    pub async fn card_count(&self) -> Result<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM drawer_cards")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }

    /// Inserts a card at the requested position and re-normalizes the whole
    /// deck dense inside the same transaction, so readers never observe
    /// duplicate or gapped order values.
    pub async fn insert_card(
        &self,
        title: &str,
        link: &str,
        image_url: &str,
        order: i64,
    ) -> Result<StoredCard> {
        let card_id = CardId::new();
        let mut tx = self.pool.begin().await?;

        sqlx::query(
            "INSERT INTO drawer_cards (id, title, link, image_url, display_order)
             VALUES (?, ?, ?, ?, ?)",
        )
        .bind(card_id.0.to_string())
        .bind(title)
        .bind(link)
        .bind(image_url)
        .bind(order)
        .execute(&mut *tx)
        .await?;

        compact_orders(&mut tx).await?;
        tx.commit().await?;

        self.get_card(card_id)
            .await?
            .ok_or_else(|| anyhow!("card {card_id} vanished after insert"))
    }

    pub async fn update_card(
        &self,
        card_id: CardId,
        changes: &CardChanges,
    ) -> Result<Option<StoredCard>> {
        let mut tx = self.pool.begin().await?;

        let updated = sqlx::query(
            "UPDATE drawer_cards SET
                title = COALESCE(?, title),
                link = COALESCE(?, link),
                image_url = COALESCE(?, image_url),
                display_order = COALESCE(?, display_order),
                updated_at = CURRENT_TIMESTAMP
             WHERE id = ?",
        )
        .bind(changes.title.as_deref())
        .bind(changes.link.as_deref())
        .bind(changes.image_url.as_deref())
        .bind(changes.order)
        .bind(card_id.0.to_string())
        .execute(&mut *tx)
        .await?
        .rows_affected();

        if updated == 0 {
            tx.rollback().await?;
            return Ok(None);
        }

        if changes.order.is_some() {
            compact_orders(&mut tx).await?;
        }
        tx.commit().await?;
        self.get_card(card_id).await
    }

    /// Removes a card and compacts the survivors to 0..n-2 before commit.
    /// Returns false when the id is unknown.
    pub async fn delete_card(&self, card_id: CardId) -> Result<bool> {
        let mut tx = self.pool.begin().await?;

        let deleted = sqlx::query("DELETE FROM drawer_cards WHERE id = ?")
            .bind(card_id.0.to_string())
            .execute(&mut *tx)
            .await?
            .rows_affected();

        if deleted == 0 {
            tx.rollback().await?;
            return Ok(false);
        }

        compact_orders(&mut tx).await?;
        tx.commit().await?;
        Ok(true)
    }

    /// Applies the full target order set atomically. Any unknown id aborts
    /// the transaction and the stored deck is left untouched.
    pub async fn apply_reorder(&self, entries: &[ReorderEntry]) -> Result<ReorderOutcome> {
        let mut tx = self.pool.begin().await?;

        for entry in entries {
            let updated = sqlx::query(
                "UPDATE drawer_cards
                 SET display_order = ?, updated_at = CURRENT_TIMESTAMP
                 WHERE id = ?",
            )
            .bind(entry.order)
            .bind(entry.id.0.to_string())
            .execute(&mut *tx)
            .await?
            .rows_affected();

            if updated == 0 {
                tx.rollback().await?;
                return Ok(ReorderOutcome::UnknownCard(entry.id));
            }
        }

        compact_orders(&mut tx).await?;
        tx.commit().await?;
        Ok(ReorderOutcome::Applied)
    }

    pub async fn store_image(
        &self,
        filename: &str,
        mime_type: &str,
        bytes: &[u8],
    ) -> Result<()> {
        let size_bytes = i64::try_from(bytes.len()).unwrap_or(i64::MAX);
        sqlx::query(
            "INSERT INTO uploaded_images (filename, mime_type, bytes, size_bytes)
             VALUES (?, ?, ?, ?)",
        )
        .bind(filename)
        .bind(mime_type)
        .bind(bytes)
        .bind(size_bytes)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    pub async fn load_image(&self, filename: &str) -> Result<Option<StoredImage>> {
        let row = sqlx::query(
            "SELECT filename, mime_type, bytes, size_bytes FROM uploaded_images WHERE filename = ?",
        )
        .bind(filename)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(|r| StoredImage {
            filename: r.get::<String, _>(0),
            mime_type: r.get::<String, _>(1),
            bytes: r.get::<Vec<u8>, _>(2),
            size_bytes: r.get::<i64, _>(3) as u64,
        }))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReorderOutcome {
    Applied,
    UnknownCard(CardId),
}

/// Rewrites display_order to the dense sequence 0..n-1 following the current
/// (display_order, rowid) sort. Runs inside the caller's transaction.
async fn compact_orders(tx: &mut sqlx::Transaction<'_, Sqlite>) -> Result<()> {
    sqlx::query(
        "WITH ranked AS (
            SELECT id, ROW_NUMBER() OVER (ORDER BY display_order ASC, rowid ASC) - 1 AS dense_order
            FROM drawer_cards
         )
         UPDATE drawer_cards
         SET display_order = (SELECT dense_order FROM ranked WHERE ranked.id = drawer_cards.id)",
    )
    .execute(&mut **tx)
    .await
    .context("failed to compact drawer card order")?;
    Ok(())
}

fn card_from_row(row: &SqliteRow) -> Result<StoredCard> {
    let raw_id = row.get::<String, _>(0);
    let id = Uuid::parse_str(&raw_id)
        .with_context(|| format!("invalid card id in drawer_cards: {raw_id}"))?;
    Ok(StoredCard {
        id: CardId(id),
        title: row.get::<String, _>(1),
        link: row.get::<String, _>(2),
        image_url: row.get::<String, _>(3),
        order: row.get::<i64, _>(4),
        created_at: row.get::<DateTime<Utc>, _>(5),
        updated_at: row.get::<DateTime<Utc>, _>(6),
    })
}

fn ensure_sqlite_parent_dir_exists(database_url: &str) -> Result<()> {
    let Some(path) = sqlite_path(database_url) else {
        return Ok(());
    };

    let Some(parent) = path.parent() else {
        return Ok(());
    };

    fs::create_dir_all(parent).with_context(|| {
        format!(
            "failed to create parent directory '{}' for database url '{database_url}'",
            parent.display()
        )
    })?;

    Ok(())
}

fn sqlite_path(database_url: &str) -> Option<PathBuf> {
    if database_url == "sqlite::memory:" || !database_url.starts_with("sqlite:") {
        return None;
    }

    let path = database_url
        .trim_start_matches("sqlite://")
        .trim_start_matches("sqlite:")
        .split('?')
        .next()
        .unwrap_or_default();

    if path.is_empty() {
        return None;
    }

    Some(Path::new(path).to_path_buf())
}

#[cfg(test)]
#[path = "tests/lib_tests.rs"]
mod tests;
