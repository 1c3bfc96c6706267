//! Shared fixtures for integration tests

#![allow(dead_code)]

use chrono::{TimeZone, Utc};
use order_server::DbService;
use shared::models::{Delivery, Item, Order, Payment};
use std::time::Duration;
use tempfile::TempDir;

/// Fresh migrated database in a temp directory (kept alive by the returned guard)
pub async fn test_db() -> (TempDir, DbService) {
    let dir = tempfile::tempdir().expect("create temp dir");
    let path = dir.path().join("orders.db");
    let db = DbService::new(path.to_str().expect("utf-8 path"), Duration::from_secs(2))
        .await
        .expect("open test database");
    (dir, db)
}

pub fn item(chrt_id: i64, name: &str) -> Item {
    Item {
        chrt_id,
        track_number: "WBILMTESTTRACK".into(),
        price: 453,
        rid: format!("ab4219087a764ae0btest{chrt_id}"),
        name: name.into(),
        sale: 30,
        size: "0".into(),
        total_price: 317,
        nm_id: 2389212,
        brand: "Vivienne Sabo".into(),
        status: 202,
    }
}

/// Fully populated order; items are sorted by `chrt_id`
pub fn sample_order(uid: &str) -> Order {
    Order {
        order_uid: uid.into(),
        track_number: "WBILMTESTTRACK".into(),
        entry: "WBIL".into(),
        delivery: Delivery {
            name: "Test Testov".into(),
            phone: "+9720000000".into(),
            zip: "2639809".into(),
            city: "Kiryat Mozkin".into(),
            address: "Ploshad Mira 15".into(),
            region: "Kraiot".into(),
            email: "test@gmail.com".into(),
        },
        payment: Payment {
            transaction: uid.into(),
            request_id: String::new(),
            currency: "USD".into(),
            provider: "wbpay".into(),
            amount: 1817,
            payment_dt: 1637907727,
            bank: "alpha".into(),
            delivery_cost: 1500,
            goods_total: 317,
            custom_fee: 0,
        },
        items: vec![item(9934930, "Mascaras")],
        locale: "en".into(),
        internal_signature: String::new(),
        customer_id: "test".into(),
        delivery_service: "meest".into(),
        shard_key: "9".into(),
        sm_id: 99,
        date_created: Some(Utc.with_ymd_and_hms(2021, 11, 26, 6, 22, 19).unwrap()),
        oof_shard: "1".into(),
    }
}

/// Same as [`sample_order`] with an explicit creation time
pub fn order_created_at(uid: &str, day: u32) -> Order {
    let mut order = sample_order(uid);
    order.date_created = Some(Utc.with_ymd_and_hms(2024, 3, day, 12, 0, 0).unwrap());
    order
}

/// Poll `cond` until it holds or two seconds pass
pub async fn wait_until(mut cond: impl FnMut() -> bool) -> bool {
    for _ in 0..200 {
        if cond() {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    cond()
}
