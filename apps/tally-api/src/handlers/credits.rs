//! Credits, customer balances and payments.

use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use tally_core::{
    Credit, CreditStatement, CustomerCreditSummary, CustomerKey, Page, PaymentReceipt,
};
use tally_db::NewCredit;

use crate::dto::{
    CreateCreditRequest, CreditListQuery, CustomerQuery, PaymentRequest, TotalOutstandingResponse,
};
use crate::error::ApiError;
use crate::AppState;

/// `GET /api/credits?type=&status=&overdue=&search=&page=&limit=`
///
/// Customers who still owe money, sorted by name, one page at a time.
pub async fn list_outstanding(
    State(state): State<AppState>,
    query: Result<Query<CreditListQuery>, QueryRejection>,
) -> Result<Json<Page<CustomerCreditSummary>>, ApiError> {
    let Query(query) = query?;
    let page = query.page_request()?;

    let listing = state
        .db
        .credits()
        .outstanding_page(&query.filter(), query.search.as_deref(), page)
        .await?;
    Ok(Json(listing))
}

/// `GET /api/credits/total-outstanding`
pub async fn total_outstanding(
    State(state): State<AppState>,
) -> Result<Json<TotalOutstandingResponse>, ApiError> {
    let total = state.db.credits().total_outstanding().await?;
    Ok(Json(TotalOutstandingResponse {
        total_outstanding_cents: total.cents(),
    }))
}

/// `POST /api/credits`
pub async fn create_credit(
    State(state): State<AppState>,
    body: Result<Json<CreateCreditRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<Credit>), ApiError> {
    let Json(req) = body?;
    let credit = state
        .db
        .credits()
        .create_general_credit(NewCredit::try_from(req)?)
        .await?;
    Ok((StatusCode::CREATED, Json(credit)))
}

/// `GET /api/credits/:id`
pub async fn get_credit(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<CreditStatement>, ApiError> {
    let statement = state.db.credits().statement(&id).await?;
    Ok(Json(statement))
}

/// `GET /api/credits/customer/:key?type=`
///
/// 404 when the customer has no credits at all; an empty list when only
/// the type filter excludes everything.
pub async fn customer_statements(
    State(state): State<AppState>,
    Path(key): Path<String>,
    query: Result<Query<CustomerQuery>, QueryRejection>,
) -> Result<Json<Vec<CreditStatement>>, ApiError> {
    let Query(query) = query?;
    let key = CustomerKey::from_raw(key);

    let statements = state
        .db
        .credits()
        .customer_statements(&key, query.credit_type)
        .await?;

    if statements.is_empty() && query.credit_type.is_none() {
        return Err(ApiError::not_found("Customer credits", key.as_str()));
    }

    Ok(Json(statements))
}

/// `POST /api/credits/customer/:key/pay`
///
/// One payment spread over the customer's credits, oldest first.
pub async fn pay_customer(
    State(state): State<AppState>,
    Path(key): Path<String>,
    body: Result<Json<PaymentRequest>, JsonRejection>,
) -> Result<Json<PaymentReceipt>, ApiError> {
    let Json(req) = body?;
    let amount = req.amount()?;

    let receipt = state
        .db
        .credits()
        .pay_customer(&CustomerKey::from_raw(key), amount)
        .await?;
    Ok(Json(receipt))
}

/// `POST /api/credits/pay/:id`
pub async fn pay_credit(
    State(state): State<AppState>,
    Path(id): Path<String>,
    body: Result<Json<PaymentRequest>, JsonRejection>,
) -> Result<Json<PaymentReceipt>, ApiError> {
    let Json(req) = body?;
    let amount = req.amount()?;

    let receipt = state.db.credits().pay_credit(&id, amount).await?;
    Ok(Json(receipt))
}
