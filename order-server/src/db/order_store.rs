//! Order Store
//!
//! Persists the order aggregate across four tables (`orders`, `delivery`,
//! `payment`, `items`) and reassembles it for point lookups.
//!
//! Writes are idempotent replace-semantics: header, delivery and payment rows
//! are upserted on `order_uid`, and the item set is deleted and re-inserted,
//! all inside one transaction. A transaction dropped before `commit` rolls back.

use chrono::{DateTime, Utc};
use shared::models::{Item, Order};
use sqlx::SqlitePool;
use thiserror::Error;

/// Store error types
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("order not found: {0}")]
    NotFound(String),

    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

impl StoreError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, StoreError::NotFound(_))
    }
}

pub type StoreResult<T> = Result<T, StoreError>;

const ORDER_SELECT: &str = r#"
    SELECT o.order_uid, o.track_number, o.entry, o.locale, o.internal_signature,
           o.customer_id, o.delivery_service, o.shardkey, o.sm_id, o.date_created, o.oof_shard,
           d.name, d.phone, d.zip, d.city, d.address, d.region, d.email,
           p."transaction", p.request_id, p.currency, p.provider, p.amount, p.payment_dt,
           p.bank, p.delivery_cost, p.goods_total, p.custom_fee
    FROM orders o
    JOIN delivery d ON d.order_uid = o.order_uid
    JOIN payment p ON p.order_uid = o.order_uid
    WHERE o.order_uid = ?
"#;

const ITEMS_SELECT: &str = "SELECT chrt_id, track_number, price, rid, name, sale, size, total_price, nm_id, brand, status FROM items WHERE order_uid = ? ORDER BY chrt_id, position";

const ORDER_UPSERT: &str = r#"
    INSERT INTO orders (
        order_uid, track_number, entry, locale, internal_signature,
        customer_id, delivery_service, shardkey, sm_id, date_created, oof_shard
    )
    VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)
    ON CONFLICT (order_uid)
    DO UPDATE SET track_number = excluded.track_number,
                  entry = excluded.entry,
                  locale = excluded.locale,
                  internal_signature = excluded.internal_signature,
                  customer_id = excluded.customer_id,
                  delivery_service = excluded.delivery_service,
                  shardkey = excluded.shardkey,
                  sm_id = excluded.sm_id,
                  date_created = excluded.date_created,
                  oof_shard = excluded.oof_shard
"#;

const DELIVERY_UPSERT: &str = r#"
    INSERT INTO delivery (order_uid, name, phone, zip, city, address, region, email)
    VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
    ON CONFLICT (order_uid)
    DO UPDATE SET name = excluded.name,
                  phone = excluded.phone,
                  zip = excluded.zip,
                  city = excluded.city,
                  address = excluded.address,
                  region = excluded.region,
                  email = excluded.email
"#;

const PAYMENT_UPSERT: &str = r#"
    INSERT INTO payment (
        order_uid, "transaction", request_id, currency, provider, amount,
        payment_dt, bank, delivery_cost, goods_total, custom_fee
    )
    VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)
    ON CONFLICT (order_uid)
    DO UPDATE SET "transaction" = excluded."transaction",
                  request_id = excluded.request_id,
                  currency = excluded.currency,
                  provider = excluded.provider,
                  amount = excluded.amount,
                  payment_dt = excluded.payment_dt,
                  bank = excluded.bank,
                  delivery_cost = excluded.delivery_cost,
                  goods_total = excluded.goods_total,
                  custom_fee = excluded.custom_fee
"#;

const ITEM_INSERT: &str = r#"
    INSERT INTO items (
        order_uid, position, chrt_id, track_number, price, rid, name,
        sale, size, total_price, nm_id, brand, status
    )
    VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13)
"#;

/// Fixed-width UTC text so that `ORDER BY date_created` sorts chronologically
fn date_key(ts: &DateTime<Utc>) -> String {
    ts.format("%Y-%m-%dT%H:%M:%S%.9fZ").to_string()
}

/// Transactional order persistence
#[derive(Clone)]
pub struct OrderStore {
    pool: SqlitePool,
}

impl OrderStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Load the full aggregate (header, delivery, payment, items)
    ///
    /// Both queries run in one read transaction so they see the same
    /// committed version of the order.
    pub async fn get_order_by_id(&self, id: &str) -> StoreResult<Order> {
        let mut tx = self.pool.begin().await?;

        let mut order = sqlx::query_as::<_, Order>(ORDER_SELECT)
            .bind(id)
            .fetch_optional(&mut *tx)
            .await?
            .ok_or_else(|| StoreError::NotFound(id.to_string()))?;

        order.items = sqlx::query_as::<_, Item>(ITEMS_SELECT)
            .bind(id)
            .fetch_all(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(order)
    }

    /// Insert or fully replace an order and its children in one transaction
    pub async fn upsert_order(&self, order: &Order) -> StoreResult<()> {
        let mut tx = self.pool.begin().await?;

        sqlx::query(ORDER_UPSERT)
            .bind(&order.order_uid)
            .bind(&order.track_number)
            .bind(&order.entry)
            .bind(&order.locale)
            .bind(&order.internal_signature)
            .bind(&order.customer_id)
            .bind(&order.delivery_service)
            .bind(&order.shard_key)
            .bind(order.sm_id)
            .bind(order.date_created.as_ref().map(date_key))
            .bind(&order.oof_shard)
            .execute(&mut *tx)
            .await?;

        let d = &order.delivery;
        sqlx::query(DELIVERY_UPSERT)
            .bind(&order.order_uid)
            .bind(&d.name)
            .bind(&d.phone)
            .bind(&d.zip)
            .bind(&d.city)
            .bind(&d.address)
            .bind(&d.region)
            .bind(&d.email)
            .execute(&mut *tx)
            .await?;

        let p = &order.payment;
        sqlx::query(PAYMENT_UPSERT)
            .bind(&order.order_uid)
            .bind(&p.transaction)
            .bind(&p.request_id)
            .bind(&p.currency)
            .bind(&p.provider)
            .bind(p.amount)
            .bind(p.payment_dt)
            .bind(&p.bank)
            .bind(p.delivery_cost)
            .bind(p.goods_total)
            .bind(p.custom_fee)
            .execute(&mut *tx)
            .await?;

        // Items: replace the whole set
        sqlx::query("DELETE FROM items WHERE order_uid = ?")
            .bind(&order.order_uid)
            .execute(&mut *tx)
            .await?;

        for (position, item) in order.items.iter().enumerate() {
            sqlx::query(ITEM_INSERT)
                .bind(&order.order_uid)
                .bind(position as i64)
                .bind(item.chrt_id)
                .bind(&item.track_number)
                .bind(item.price)
                .bind(&item.rid)
                .bind(&item.name)
                .bind(item.sale)
                .bind(&item.size)
                .bind(item.total_price)
                .bind(item.nm_id)
                .bind(&item.brand)
                .bind(item.status)
                .execute(&mut *tx)
                .await?;
        }

        tx.commit().await?;
        Ok(())
    }

    /// Identifiers of the most recently created orders, newest first
    pub async fn recent_order_ids(&self, limit: i64) -> StoreResult<Vec<String>> {
        let ids = sqlx::query_scalar::<_, String>(
            "SELECT order_uid FROM orders ORDER BY date_created DESC, order_uid LIMIT ?",
        )
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;
        Ok(ids)
    }

    /// Number of persisted orders
    pub async fn count(&self) -> StoreResult<i64> {
        let n = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM orders")
            .fetch_one(&self.pool)
            .await?;
        Ok(n)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_date_key_is_fixed_width_and_sortable() {
        let a = Utc.with_ymd_and_hms(2021, 11, 26, 6, 22, 19).unwrap();
        let b = a + chrono::Duration::milliseconds(5);
        let c = Utc.with_ymd_and_hms(2022, 1, 1, 0, 0, 0).unwrap();

        assert_eq!(date_key(&a), "2021-11-26T06:22:19.000000000Z");
        assert_eq!(date_key(&a).len(), date_key(&b).len());
        assert!(date_key(&a) < date_key(&b));
        assert!(date_key(&b) < date_key(&c));
    }

    #[test]
    fn test_store_error_not_found() {
        assert!(StoreError::NotFound("x".into()).is_not_found());
        assert!(!StoreError::Database(sqlx::Error::RowNotFound).is_not_found());
    }
}
