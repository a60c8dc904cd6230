//! Purchase-order queries and creation.

use crate::error::StoreError;
use crate::rows::{PURCHASE_ORDER_COLUMNS, PurchaseOrderRow};
use chrono::NaiveDate;
use sqlx::PgPool;
use swimdesk_core::status::PoStatus;
use swimdesk_core::{FundingSourceId, PurchaseOrder, PurchaseOrderId, SwimmerId};

/// Fields for a new purchase order.
#[derive(Clone, Debug)]
pub struct NewPurchaseOrder {
    /// The swimmer this authorization covers.
    pub swimmer_id: SwimmerId,
    /// The authorizing funding source.
    pub funding_source_id: FundingSourceId,
    /// External reference number.
    pub po_number: String,
    /// Total sessions authorized.
    pub sessions_authorized: i32,
    /// First day of the validity window.
    pub start_date: NaiveDate,
    /// Last day of the validity window (inclusive).
    pub end_date: NaiveDate,
    /// Initial status.
    pub status: PoStatus,
}

/// Store for purchase orders.
#[derive(Clone)]
pub struct PurchaseOrderStore {
    pool: PgPool,
}

impl PurchaseOrderStore {
    /// Creates a store over the shared pool.
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Fetches one purchase order.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::NotFound`] when the id is unknown.
    pub async fn get(&self, id: PurchaseOrderId) -> Result<PurchaseOrder, StoreError> {
        let row: Option<PurchaseOrderRow> = sqlx::query_as(&format!(
            "SELECT {PURCHASE_ORDER_COLUMNS} FROM purchase_orders WHERE id = $1"
        ))
        .bind(id.as_uuid())
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.ok_or(StoreError::NotFound("purchase order"))?.try_into()?)
    }

    /// Lists purchase orders, optionally for one swimmer.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Database`] on query failure.
    pub async fn list(
        &self,
        swimmer_id: Option<SwimmerId>,
    ) -> Result<Vec<PurchaseOrder>, StoreError> {
        let rows: Vec<PurchaseOrderRow> = match swimmer_id {
            Some(id) => {
                sqlx::query_as(&format!(
                    "SELECT {PURCHASE_ORDER_COLUMNS} FROM purchase_orders \
                     WHERE swimmer_id = $1 ORDER BY start_date DESC"
                ))
                .bind(id.as_uuid())
                .fetch_all(&self.pool)
                .await?
            }
            None => {
                sqlx::query_as(&format!(
                    "SELECT {PURCHASE_ORDER_COLUMNS} FROM purchase_orders ORDER BY start_date DESC"
                ))
                .fetch_all(&self.pool)
                .await?
            }
        };
        rows.into_iter()
            .map(|row| row.try_into().map_err(StoreError::from))
            .collect()
    }

    /// Creates a purchase order.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Database`] on insert failure (including a
    /// violated `sessions_used <= sessions_authorized` check).
    pub async fn create(&self, po: &NewPurchaseOrder) -> Result<PurchaseOrder, StoreError> {
        let id = PurchaseOrderId::new();
        let row: PurchaseOrderRow = sqlx::query_as(&format!(
            "INSERT INTO purchase_orders \
                 (id, swimmer_id, funding_source_id, po_number, sessions_authorized, \
                  start_date, end_date, status) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8) \
             RETURNING {PURCHASE_ORDER_COLUMNS}"
        ))
        .bind(id.as_uuid())
        .bind(po.swimmer_id.as_uuid())
        .bind(po.funding_source_id.as_uuid())
        .bind(&po.po_number)
        .bind(po.sessions_authorized)
        .bind(po.start_date)
        .bind(po.end_date)
        .bind(po.status.as_str())
        .fetch_one(&self.pool)
        .await?;
        Ok(row.try_into()?)
    }
}
