//! Purchase endpoints
//!
//! Deletion binds (PID, fLoginID) in that order; the login scope acts as an
//! authorization check inside the procedure, so a miss is reported as not
//! found rather than an error.

use axum::Json;
use axum::extract::{Query, State};
use axum::http::StatusCode;
use serde_json::{Value, json};

use crate::db::normalize::normalize;
use crate::db::procedure::call;
use crate::error::AppError;
use crate::state::AppState;

use super::{ApiResult, RangeQuery, body_param, fetch_rows, require_fields};

pub async fn insert_purchase(
    State(state): State<AppState>,
    Json(body): Json<Value>,
) -> Result<(StatusCode, Json<Value>), AppError> {
    require_fields(
        &body,
        &[
            "PurchaseDate",
            "fLID",
            "productID",
            "qty",
            "buyPrice",
            "fLoginID",
            "BillNo",
            "ProductName",
            "TotalSum",
            "Tax",
            "Taxable",
            "IGSTAmount",
            "SGST",
            "CGST",
        ],
    )?;

    let params = vec![
        body_param(&body, "PurchaseDate"),
        body_param(&body, "productID"),
        body_param(&body, "qty"),
        body_param(&body, "buyPrice"),
        body_param(&body, "description"),
        body_param(&body, "fLoginID"),
        body_param(&body, "fLID"),
        body_param(&body, "BillNo"),
        body_param(&body, "ProductName"),
        body_param(&body, "TotalSum"),
        body_param(&body, "Tax"),
        body_param(&body, "Taxable"),
        body_param(&body, "IGSTAmount"),
        body_param(&body, "SGST"),
        body_param(&body, "CGST"),
    ];

    call(&state.pool, "insertPurchase", params)
        .await
        .map_err(|e| AppError::database("Failed to insert purchase", e))?;

    Ok((
        StatusCode::CREATED,
        Json(json!({ "message": "Purchase inserted successfully" })),
    ))
}

pub async fn get_purchase_bill(
    State(state): State<AppState>,
    Json(body): Json<Value>,
) -> ApiResult<Value> {
    require_fields(&body, &["fLoginID", "fromDate", "toDate"])?;

    let rows = fetch_rows(
        &state,
        "getPurchaseBill",
        vec![
            body_param(&body, "fLoginID"),
            body_param(&body, "fromDate"),
            body_param(&body, "toDate"),
        ],
    )
    .await?;

    Ok(Json(json!({ "data": rows })))
}

async fn user_range_report(
    state: &AppState,
    procedure: &str,
    query: RangeQuery,
) -> ApiResult<Vec<Value>> {
    let Some(user_id) = query.user_id else {
        return Err(AppError::validation("Missing userId"));
    };
    let rows = fetch_rows(
        state,
        procedure,
        vec![
            user_id.into(),
            query.from_date.into(),
            query.to_date.into(),
        ],
    )
    .await?;
    Ok(Json(rows.into_iter().map(Value::Object).collect()))
}

pub async fn get_purchase_by_date(
    State(state): State<AppState>,
    Query(query): Query<RangeQuery>,
) -> ApiResult<Vec<Value>> {
    user_range_report(&state, "getPurchaseByDate", query).await
}

pub async fn get_purchase_item(
    State(state): State<AppState>,
    Query(query): Query<RangeQuery>,
) -> ApiResult<Vec<Value>> {
    user_range_report(&state, "getPurchaseItem", query).await
}

pub async fn party_purchase(
    State(state): State<AppState>,
    Query(query): Query<RangeQuery>,
) -> ApiResult<Vec<Value>> {
    user_range_report(&state, "getPartyPurchase", query).await
}

pub async fn update_purchase(
    State(state): State<AppState>,
    Json(body): Json<Value>,
) -> ApiResult<Value> {
    let params = vec![
        body_param(&body, "PurchaseDate"),
        body_param(&body, "fLID"),
        body_param(&body, "ProductID"),
        body_param(&body, "QTY"),
        body_param(&body, "BuyPrice"),
        body_param(&body, "Description"),
        body_param(&body, "fLoginID"),
        body_param(&body, "PID"),
    ];

    call(&state.pool, "UpdatePurchase", params)
        .await
        .map_err(|e| AppError::database("Failed to update purchase", e))?;

    Ok(Json(json!({
        "success": true,
        "message": "Purchase updated successfully",
    })))
}

async fn product_history(
    state: &AppState,
    procedure: &str,
    body: &Value,
) -> ApiResult<Vec<Value>> {
    require_fields(body, &["p_fProductID", "p_fLoginID"])?;
    // Login scope first, matching the procedure signatures
    let rows = fetch_rows(
        state,
        procedure,
        vec![
            body_param(body, "p_fLoginID"),
            body_param(body, "p_fProductID"),
        ],
    )
    .await?;
    Ok(Json(rows.into_iter().map(Value::Object).collect()))
}

pub async fn get_purchase_details(
    State(state): State<AppState>,
    Json(body): Json<Value>,
) -> ApiResult<Vec<Value>> {
    product_history(&state, "getProductPurchaseHistory", &body).await
}

pub async fn get_product_bill_history(
    State(state): State<AppState>,
    Json(body): Json<Value>,
) -> ApiResult<Vec<Value>> {
    product_history(&state, "getProductBillHistory", &body).await
}

pub async fn delete_purchase(
    State(state): State<AppState>,
    Json(body): Json<Value>,
) -> ApiResult<Value> {
    require_fields(&body, &["fLoginID", "PID"])?;

    let raw = call(
        &state.pool,
        "DeletePurchase",
        vec![body_param(&body, "PID"), body_param(&body, "fLoginID")],
    )
    .await
    .map_err(|e| AppError::database("Database operation failed", e))?;

    let outcome = normalize(&raw);
    if outcome.is_success() {
        return Ok(Json(json!({
            "success": true,
            "message": outcome.message_or("Purchase deleted successfully"),
            "affectedRows": outcome.affected_count,
        })));
    }

    Err(AppError::not_found("Purchase not found or unauthorized"))
}
