//! Purchase-order endpoints.
//!
//! - GET /api/pos - List purchase orders (staff)
//! - POST /api/pos - Create a purchase order (staff)

use crate::auth::middleware::RequireStaff;
use crate::error::AppError;
use crate::server::state::AppState;
use axum::{
    Json,
    extract::{Query, State},
    http::StatusCode,
};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use swimdesk_core::status::PoStatus;
use swimdesk_core::{FundingSourceId, PurchaseOrder, SwimmerId};
use swimdesk_postgres::purchase_orders::NewPurchaseOrder;

/// Query parameters for listing purchase orders.
#[derive(Debug, Default, Deserialize)]
pub struct ListPurchaseOrdersQuery {
    /// Filter to one swimmer.
    pub swimmer_id: Option<SwimmerId>,
}

/// Response for listing purchase orders.
#[derive(Debug, Serialize)]
pub struct ListPurchaseOrdersResponse {
    /// Matching purchase orders, newest window first.
    pub purchase_orders: Vec<PurchaseOrder>,
}

/// Lists purchase orders, optionally for one swimmer.
pub async fn list_purchase_orders(
    State(state): State<AppState>,
    RequireStaff(_): RequireStaff,
    Query(query): Query<ListPurchaseOrdersQuery>,
) -> Result<Json<ListPurchaseOrdersResponse>, AppError> {
    let purchase_orders = state.purchase_orders.list(query.swimmer_id).await?;
    Ok(Json(ListPurchaseOrdersResponse { purchase_orders }))
}

/// Request to create a purchase order.
#[derive(Debug, Deserialize)]
pub struct CreatePurchaseOrderRequest {
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
    /// Initial status; defaults to pending until approved.
    pub status: Option<PoStatus>,
}

/// Creates a purchase order.
pub async fn create_purchase_order(
    State(state): State<AppState>,
    RequireStaff(_): RequireStaff,
    Json(request): Json<CreatePurchaseOrderRequest>,
) -> Result<(StatusCode, Json<PurchaseOrder>), AppError> {
    if request.sessions_authorized <= 0 {
        return Err(AppError::validation("sessions_authorized must be positive"));
    }
    if request.end_date < request.start_date {
        return Err(AppError::validation("end_date precedes start_date"));
    }
    let po = state
        .purchase_orders
        .create(&NewPurchaseOrder {
            swimmer_id: request.swimmer_id,
            funding_source_id: request.funding_source_id,
            po_number: request.po_number,
            sessions_authorized: request.sessions_authorized,
            start_date: request.start_date,
            end_date: request.end_date,
            status: request.status.unwrap_or(PoStatus::Pending),
        })
        .await?;
    Ok((StatusCode::CREATED, Json(po)))
}
