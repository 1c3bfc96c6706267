//! Order store: round-trip, idempotent replace semantics and atomicity

mod common;

use common::{item, order_created_at, sample_order, test_db};
use order_server::StoreError;

async fn item_rows(db: &order_server::DbService, uid: &str) -> i64 {
    sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM items WHERE order_uid = ?")
        .bind(uid)
        .fetch_one(&db.pool)
        .await
        .unwrap()
}

#[tokio::test]
async fn round_trip_returns_every_field() {
    let (_dir, db) = test_db().await;
    let store = db.order_store();

    let mut order = sample_order("b563feb7b2b84b6test");
    order.items = vec![item(100, "Lipstick"), item(200, "Mascaras"), item(300, "Blush")];

    store.upsert_order(&order).await.unwrap();
    let loaded = store.get_order_by_id(&order.order_uid).await.unwrap();

    assert_eq!(loaded, order);
}

#[tokio::test]
async fn order_without_items_round_trips() {
    let (_dir, db) = test_db().await;
    let store = db.order_store();

    let mut order = sample_order("no-items");
    order.items.clear();

    store.upsert_order(&order).await.unwrap();
    let loaded = store.get_order_by_id("no-items").await.unwrap();
    assert!(loaded.items.is_empty());
    assert_eq!(loaded, order);
}

#[tokio::test]
async fn items_are_returned_by_catalog_id() {
    let (_dir, db) = test_db().await;
    let store = db.order_store();

    let mut order = sample_order("unsorted");
    order.items = vec![item(30, "c"), item(10, "a"), item(20, "b")];
    store.upsert_order(&order).await.unwrap();

    let loaded = store.get_order_by_id("unsorted").await.unwrap();
    let ids: Vec<i64> = loaded.items.iter().map(|i| i.chrt_id).collect();
    assert_eq!(ids, vec![10, 20, 30]);
}

#[tokio::test]
async fn upsert_is_idempotent() {
    let (_dir, db) = test_db().await;
    let store = db.order_store();

    let mut order = sample_order("idem");
    order.items = vec![item(1, "one"), item(2, "two")];

    store.upsert_order(&order).await.unwrap();
    let once = store.get_order_by_id("idem").await.unwrap();
    store.upsert_order(&order).await.unwrap();
    let twice = store.get_order_by_id("idem").await.unwrap();

    assert_eq!(once, twice);
    assert_eq!(item_rows(&db, "idem").await, 2);
    assert_eq!(store.count().await.unwrap(), 1);
}

#[tokio::test]
async fn reingestion_replaces_children_wholesale() {
    let (_dir, db) = test_db().await;
    let store = db.order_store();

    let mut first = sample_order("replace");
    first.items = vec![item(1, "old-1"), item(2, "old-2"), item(3, "old-3")];
    store.upsert_order(&first).await.unwrap();

    let mut second = sample_order("replace");
    second.track_number = "NEWTRACK".into();
    second.delivery.city = "Haifa".into();
    second.payment.amount = 42;
    second.items = vec![item(7, "new-7")];
    store.upsert_order(&second).await.unwrap();

    let loaded = store.get_order_by_id("replace").await.unwrap();
    assert_eq!(loaded, second);
    assert_eq!(item_rows(&db, "replace").await, 1);
}

#[tokio::test]
async fn replacing_with_empty_items_clears_them() {
    let (_dir, db) = test_db().await;
    let store = db.order_store();

    let mut order = sample_order("clear");
    order.items = vec![item(1, "x"), item(2, "y")];
    store.upsert_order(&order).await.unwrap();

    order.items.clear();
    store.upsert_order(&order).await.unwrap();

    assert!(store.get_order_by_id("clear").await.unwrap().items.is_empty());
    assert_eq!(item_rows(&db, "clear").await, 0);
}

#[tokio::test]
async fn duplicate_items_are_kept() {
    let (_dir, db) = test_db().await;
    let store = db.order_store();

    let mut order = sample_order("dups");
    order.items = vec![item(5, "same"), item(5, "same")];
    store.upsert_order(&order).await.unwrap();

    let loaded = store.get_order_by_id("dups").await.unwrap();
    assert_eq!(loaded.items.len(), 2);
}

#[tokio::test]
async fn missing_order_is_not_found() {
    let (_dir, db) = test_db().await;
    let store = db.order_store();

    let err = store.get_order_by_id("nope").await.unwrap_err();
    assert!(matches!(err, StoreError::NotFound(ref id) if id == "nope"));
    assert!(err.is_not_found());
}

#[tokio::test]
async fn failed_write_rolls_back_every_table() {
    let (_dir, db) = test_db().await;
    let store = db.order_store();

    let mut original = sample_order("atomic");
    original.items = vec![item(1, "keep-1"), item(2, "keep-2")];
    store.upsert_order(&original).await.unwrap();

    // Make the item insert fail after header, delivery and payment were rewritten
    sqlx::query(
        "CREATE TRIGGER reject_item BEFORE INSERT ON items WHEN NEW.name = 'boom' \
         BEGIN SELECT RAISE(ABORT, 'rejected item'); END",
    )
    .execute(&db.pool)
    .await
    .unwrap();

    let mut broken = sample_order("atomic");
    broken.track_number = "SHOULD-NOT-PERSIST".into();
    broken.delivery.name = "Nobody".into();
    broken.payment.amount = 1;
    broken.items = vec![item(9, "fine"), item(10, "boom")];

    let err = store.upsert_order(&broken).await.unwrap_err();
    assert!(matches!(err, StoreError::Database(_)));

    let loaded = store.get_order_by_id("atomic").await.unwrap();
    assert_eq!(loaded, original);
    assert_eq!(item_rows(&db, "atomic").await, 2);
}

#[tokio::test]
async fn failed_first_write_leaves_no_rows() {
    let (_dir, db) = test_db().await;
    let store = db.order_store();

    // date_created is NOT NULL in storage
    let mut order = sample_order("never");
    order.date_created = None;

    assert!(store.upsert_order(&order).await.is_err());
    assert!(store.get_order_by_id("never").await.unwrap_err().is_not_found());
    assert_eq!(store.count().await.unwrap(), 0);
}

#[tokio::test]
async fn concurrent_writers_leave_one_complete_version() {
    let (_dir, db) = test_db().await;
    let store = db.order_store();

    let versions: Vec<_> = (0..8)
        .map(|v| {
            let mut order = sample_order("contended");
            order.track_number = format!("TRACK-{v}");
            order.items = (0..=v).map(|i| item(i64::from(i), &format!("v{v}"))).collect();
            order
        })
        .collect();

    let handles: Vec<_> = versions
        .iter()
        .cloned()
        .map(|order| {
            let store = store.clone();
            tokio::spawn(async move { store.upsert_order(&order).await })
        })
        .collect();
    for handle in handles {
        handle.await.unwrap().unwrap();
    }

    let loaded = store.get_order_by_id("contended").await.unwrap();
    assert!(
        versions.contains(&loaded),
        "stored state must equal exactly one written version"
    );
}

#[tokio::test]
async fn recent_ids_are_newest_first() {
    let (_dir, db) = test_db().await;
    let store = db.order_store();

    for (uid, day) in [("march-02", 2), ("march-09", 9), ("march-05", 5)] {
        store.upsert_order(&order_created_at(uid, day)).await.unwrap();
    }

    assert_eq!(
        store.recent_order_ids(10).await.unwrap(),
        vec!["march-09", "march-05", "march-02"]
    );
    assert_eq!(store.recent_order_ids(1).await.unwrap(), vec!["march-09"]);
    assert!(store.recent_order_ids(0).await.unwrap().is_empty());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn reads_never_mix_two_versions() {
    let (_dir, db) = test_db().await;
    let store = db.order_store();

    let mut v1 = sample_order("flip");
    v1.track_number = "A".into();
    v1.items = vec![item(1, "a")];
    let mut v2 = sample_order("flip");
    v2.track_number = "B".into();
    v2.items = vec![item(2, "b"), item(3, "b")];
    store.upsert_order(&v1).await.unwrap();

    let writer = {
        let store = store.clone();
        let (v1, v2) = (v1.clone(), v2.clone());
        tokio::spawn(async move {
            for round in 0..300 {
                let next = if round % 2 == 0 { &v2 } else { &v1 };
                store.upsert_order(next).await.unwrap();
            }
        })
    };

    let mut reads = 0;
    loop {
        let done = writer.is_finished();
        let loaded = store.get_order_by_id("flip").await.unwrap();
        assert!(
            loaded == v1 || loaded == v2,
            "read mixed versions: track {} with {} items",
            loaded.track_number,
            loaded.items.len()
        );
        reads += 1;
        if done {
            break;
        }
    }
    writer.await.unwrap();
    assert!(reads > 0);
}
