use super::*;

async fn mem() -> Storage {
    Storage::new("sqlite::memory:").await.expect("db")
}

async fn seed(storage: &Storage, titles: &[&str]) -> Vec<StoredCard> {
    let mut cards = Vec::new();
    for (i, title) in titles.iter().enumerate() {
        let card = storage
            .insert_card(title, "https://example.com", "/uploads/x.png", i as i64)
            .await
            .expect("insert");
        cards.push(card);
    }
    cards
}

fn orders(cards: &[StoredCard]) -> Vec<i64> {
    cards.iter().map(|c| c.order).collect()
}

#[tokio::test]
async fn health_check_succeeds_for_live_pool() {
    mem().await.health_check().await.expect("health check");
}

#[tokio::test]
async fn creates_database_file_when_missing() {
    let suffix = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .expect("clock")
        .as_nanos();
    let temp_root = std::env::temp_dir().join(format!("drawer_storage_test_{suffix}"));
    let db_path = temp_root.join("nested").join("drawer.db");
    let database_url = format!("sqlite://{}", db_path.to_string_lossy().replace('\\', "/"));

    let storage = Storage::new(&database_url).await.expect("db");
    drop(storage);

    assert!(
        db_path.exists(),
        "database file should exist: {}",
        db_path.display()
    );

    std::fs::remove_dir_all(temp_root).expect("cleanup");
}

#[tokio::test]
async fn lists_cards_sorted_by_order() {
    let storage = mem().await;
    seed(&storage, &["alpha", "beta", "gamma"]).await;

    let cards = storage.list_cards().await.expect("list");
    assert_eq!(cards.len(), 3);
    assert_eq!(orders(&cards), vec![0, 1, 2]);
    assert_eq!(cards[0].title, "alpha");
    assert_eq!(cards[2].title, "gamma");
}

#[tokio::test]
async fn insert_appends_with_dense_order() {
    let storage = mem().await;
    seed(&storage, &["alpha", "beta"]).await;

    // A stale client-side position well past the end still lands dense.
    let card = storage
        .insert_card("gamma", "https://example.com", "/uploads/g.png", 99)
        .await
        .expect("insert");
    assert_eq!(card.order, 2);
    assert_eq!(orders(&storage.list_cards().await.expect("list")), vec![0, 1, 2]);
}

#[tokio::test]
async fn update_changes_only_provided_fields() {
    let storage = mem().await;
    let cards = seed(&storage, &["alpha", "beta"]).await;

    let updated = storage
        .update_card(
            cards[0].id,
            &CardChanges {
                title: Some("alpha prime".into()),
                ..CardChanges::default()
            },
        )
        .await
        .expect("update")
        .expect("card exists");

    assert_eq!(updated.title, "alpha prime");
    assert_eq!(updated.link, cards[0].link);
    assert_eq!(updated.image_url, cards[0].image_url);
    assert_eq!(updated.order, 0);
    assert!(updated.updated_at >= cards[0].updated_at);
}

#[tokio::test]
async fn update_unknown_card_returns_none() {
    let storage = mem().await;
    seed(&storage, &["alpha"]).await;

    let missing = storage
        .update_card(
            CardId::new(),
            &CardChanges {
                title: Some("ghost".into()),
                ..CardChanges::default()
            },
        )
        .await
        .expect("update");
    assert!(missing.is_none());
}

#[tokio::test]
async fn delete_compacts_remaining_orders() {
    let storage = mem().await;
    let cards = seed(&storage, &["alpha", "beta", "gamma", "delta"]).await;

    assert!(storage.delete_card(cards[1].id).await.expect("delete"));

    let remaining = storage.list_cards().await.expect("list");
    assert_eq!(orders(&remaining), vec![0, 1, 2]);
    assert_eq!(
        remaining.iter().map(|c| c.title.as_str()).collect::<Vec<_>>(),
        vec!["alpha", "gamma", "delta"]
    );
}

#[tokio::test]
async fn delete_unknown_card_returns_false() {
    let storage = mem().await;
    seed(&storage, &["alpha"]).await;
    assert!(!storage.delete_card(CardId::new()).await.expect("delete"));
    assert_eq!(storage.card_count().await.expect("count"), 1);
}

#[tokio::test]
async fn reorder_applies_full_set_atomically() {
    let storage = mem().await;
    let cards = seed(&storage, &["alpha", "beta", "gamma"]).await;

    let outcome = storage
        .apply_reorder(&[
            ReorderEntry {
                id: cards[1].id,
                order: 0,
            },
            ReorderEntry {
                id: cards[0].id,
                order: 1,
            },
            ReorderEntry {
                id: cards[2].id,
                order: 2,
            },
        ])
        .await
        .expect("reorder");
    assert_eq!(outcome, ReorderOutcome::Applied);

    let cards = storage.list_cards().await.expect("list");
    assert_eq!(
        cards.iter().map(|c| c.title.as_str()).collect::<Vec<_>>(),
        vec!["beta", "alpha", "gamma"]
    );
    assert_eq!(orders(&cards), vec![0, 1, 2]);
}

#[tokio::test]
async fn reorder_with_unknown_id_rolls_back_everything() {
    let storage = mem().await;
    let cards = seed(&storage, &["alpha", "beta"]).await;
    let ghost = CardId::new();

    let outcome = storage
        .apply_reorder(&[
            ReorderEntry {
                id: cards[1].id,
                order: 0,
            },
            ReorderEntry {
                id: ghost,
                order: 1,
            },
        ])
        .await
        .expect("reorder");
    assert_eq!(outcome, ReorderOutcome::UnknownCard(ghost));

    let unchanged = storage.list_cards().await.expect("list");
    assert_eq!(
        unchanged.iter().map(|c| c.title.as_str()).collect::<Vec<_>>(),
        vec!["alpha", "beta"]
    );
    assert_eq!(orders(&unchanged), vec![0, 1]);
}

#[tokio::test]
async fn stores_and_loads_image_blob() {
    let storage = mem().await;
    storage
        .store_image("cover.png", "image/png", b"not-a-real-png")
        .await
        .expect("store");

    let image = storage
        .load_image("cover.png")
        .await
        .expect("load")
        .expect("image exists");
    assert_eq!(image.mime_type, "image/png");
    assert_eq!(image.bytes, b"not-a-real-png");
    assert_eq!(image.size_bytes, 14);

    assert!(storage.load_image("missing.png").await.expect("load").is_none());
}
