//! Deferred-payment sales.

use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use chrono::Utc;
use tally_core::ledger::default_due_date;
use tally_core::SaleDetail;
use tally_db::NewCreditSale;

use crate::dto::CreateCreditSaleRequest;
use crate::error::ApiError;
use crate::AppState;

/// `POST /api/sales/credit`
///
/// Records the sale, its items and the credit it opens in one go.
pub async fn create_credit_sale(
    State(state): State<AppState>,
    body: Result<Json<CreateCreditSaleRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<SaleDetail>), ApiError> {
    let Json(req) = body?;

    let due_date = req.due_date.unwrap_or_else(|| {
        default_due_date(
            Utc::now().date_naive(),
            state.config.ledger.default_credit_term_days,
        )
    });

    let detail = state
        .db
        .sales()
        .create_credit_sale(NewCreditSale {
            customer_id: req.customer_id,
            customer_name: req.customer_name,
            items: req.items.into_iter().map(Into::into).collect(),
            due_date,
            description: req.description,
            notes: req.notes,
        })
        .await?;

    Ok((StatusCode::CREATED, Json(detail)))
}

/// `GET /api/sales/:id`
pub async fn get_sale(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<SaleDetail>, ApiError> {
    let detail = state.db.sales().detail(&id).await?;
    Ok(Json(detail))
}
