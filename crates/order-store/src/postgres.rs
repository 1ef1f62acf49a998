use async_trait::async_trait;
use chrono::{DateTime, Utc};
use common::{ItemId, OrderId};
use sqlx::{PgPool, Row, postgres::PgRow};
use uuid::Uuid;

use crate::{
    Order, OrderFilter, OrderStatus, OrderStore, Page, PageRequest, Result, StoreError,
};

/// PostgreSQL-backed order store implementation.
///
/// Orders live in a single `orders` table with the item list stored as
/// a JSONB array, preserving append order.
#[derive(Clone)]
pub struct PostgresOrderStore {
    pool: PgPool,
}

impl PostgresOrderStore {
    /// Creates a new PostgreSQL order store.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Gets a reference to the underlying connection pool.
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Creates the `orders` table if it does not exist.
    pub async fn ensure_schema(&self) -> Result<()> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS orders (
                id UUID PRIMARY KEY,
                status TEXT NOT NULL,
                item_ids JSONB NOT NULL,
                created_at TIMESTAMPTZ NOT NULL,
                created_by TEXT NOT NULL,
                updated_at TIMESTAMPTZ,
                updated_by TEXT,
                deleted_at TIMESTAMPTZ,
                deleted_by TEXT
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    fn row_to_order(row: PgRow) -> Result<Order> {
        let status_str: String = row.try_get("status")?;
        let status = OrderStatus::parse(&status_str).ok_or_else(|| {
            StoreError::Serialization(serde_json::Error::io(std::io::Error::other(format!(
                "unknown order status '{status_str}'"
            ))))
        })?;

        let item_ids: Vec<ItemId> =
            serde_json::from_value(row.try_get::<serde_json::Value, _>("item_ids")?)?;

        Ok(Order {
            id: OrderId::from_uuid(row.try_get::<Uuid, _>("id")?),
            status,
            item_ids,
            created_at: row.try_get::<DateTime<Utc>, _>("created_at")?,
            created_by: row.try_get("created_by")?,
            updated_at: row.try_get("updated_at")?,
            updated_by: row.try_get("updated_by")?,
            deleted_at: row.try_get("deleted_at")?,
            deleted_by: row.try_get("deleted_by")?,
        })
    }

    fn item_filter_strings(filter: &OrderFilter) -> Option<Vec<String>> {
        filter.item_ids.as_ref().and_then(|ids| {
            if ids.is_empty() {
                None
            } else {
                Some(ids.iter().map(|id| id.as_uuid().to_string()).collect())
            }
        })
    }
}

#[async_trait]
impl OrderStore for PostgresOrderStore {
    async fn insert(&self, order: Order) -> Result<OrderId> {
        let item_ids = serde_json::to_value(&order.item_ids)?;

        sqlx::query(
            r#"
            INSERT INTO orders (id, status, item_ids, created_at, created_by,
                                updated_at, updated_by, deleted_at, deleted_by)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            "#,
        )
        .bind(order.id.as_uuid())
        .bind(order.status.as_str())
        .bind(item_ids)
        .bind(order.created_at)
        .bind(&order.created_by)
        .bind(order.updated_at)
        .bind(&order.updated_by)
        .bind(order.deleted_at)
        .bind(&order.deleted_by)
        .execute(&self.pool)
        .await?;

        Ok(order.id)
    }

    async fn find_by_id(&self, id: OrderId) -> Result<Option<Order>> {
        let row = sqlx::query(
            r#"
            SELECT id, status, item_ids, created_at, created_by,
                   updated_at, updated_by, deleted_at, deleted_by
            FROM orders
            WHERE id = $1 AND deleted_at IS NULL
            "#,
        )
        .bind(id.as_uuid())
        .fetch_optional(&self.pool)
        .await?;

        row.map(Self::row_to_order).transpose()
    }

    async fn search(&self, filter: &OrderFilter, page: PageRequest) -> Result<Page<Order>> {
        let item_strings = Self::item_filter_strings(filter);

        // Build the shared predicate incrementally
        let mut predicate = String::from(" FROM orders WHERE deleted_at IS NULL");
        let mut param_count = 0;

        if filter.status.is_some() {
            param_count += 1;
            predicate.push_str(&format!(" AND status = ${param_count}"));
        }
        if item_strings.is_some() {
            param_count += 1;
            // JSONB "any key present" operator over the item-id array
            predicate.push_str(&format!(" AND item_ids ?| ${param_count}"));
        }

        let count_sql = format!("SELECT COUNT(*){predicate}");
        let mut count_query = sqlx::query_scalar::<_, i64>(&count_sql);
        if let Some(status) = filter.status {
            count_query = count_query.bind(status.as_str());
        }
        if let Some(ref items) = item_strings {
            count_query = count_query.bind(items.clone());
        }
        let total = count_query.fetch_one(&self.pool).await?;

        let select_sql = format!(
            "SELECT id, status, item_ids, created_at, created_by, \
             updated_at, updated_by, deleted_at, deleted_by{predicate} \
             ORDER BY created_at ASC, id ASC LIMIT ${} OFFSET ${}",
            param_count + 1,
            param_count + 2
        );
        let mut select_query = sqlx::query(&select_sql);
        if let Some(status) = filter.status {
            select_query = select_query.bind(status.as_str());
        }
        if let Some(ref items) = item_strings {
            select_query = select_query.bind(items.clone());
        }
        // A saturated offset must stay non-negative after the cast.
        let rows = select_query
            .bind(i64::try_from(page.size).unwrap_or(i64::MAX))
            .bind(i64::try_from(page.offset()).unwrap_or(i64::MAX))
            .fetch_all(&self.pool)
            .await?;

        let items: Vec<Order> = rows
            .into_iter()
            .map(Self::row_to_order)
            .collect::<Result<_>>()?;

        Ok(Page::new(items, page, total as usize))
    }

    async fn save(&self, order: &Order) -> Result<()> {
        let item_ids = serde_json::to_value(&order.item_ids)?;

        sqlx::query(
            r#"
            INSERT INTO orders (id, status, item_ids, created_at, created_by,
                                updated_at, updated_by, deleted_at, deleted_by)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            ON CONFLICT (id) DO UPDATE SET
                status = EXCLUDED.status,
                item_ids = EXCLUDED.item_ids,
                updated_at = EXCLUDED.updated_at,
                updated_by = EXCLUDED.updated_by,
                deleted_at = EXCLUDED.deleted_at,
                deleted_by = EXCLUDED.deleted_by
            "#,
        )
        .bind(order.id.as_uuid())
        .bind(order.status.as_str())
        .bind(item_ids)
        .bind(order.created_at)
        .bind(&order.created_by)
        .bind(order.updated_at)
        .bind(&order.updated_by)
        .bind(order.deleted_at)
        .bind(&order.deleted_by)
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}
