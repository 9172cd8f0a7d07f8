//! Billing endpoints
//!
//! A bill save stamps the server-side time in IST; the client never sends
//! the date. The multi-set procedures (one bill with its items and customer)
//! come back as a row-set list and are shipped to the client set by set.

use axum::Json;
use axum::extract::{Query, State};
use axum::http::StatusCode;
use serde::Deserialize;
use serde_json::{Value, json};

use crate::db::normalize::normalize;
use crate::db::procedure::call;
use crate::error::AppError;
use crate::state::AppState;
use crate::util::india_datetime;

use super::{ApiResult, RangeQuery, body_param, body_param_nullable, fetch_rows, require_present};

pub async fn save_bill(
    State(state): State<AppState>,
    Json(body): Json<Value>,
) -> Result<(StatusCode, Json<Value>), AppError> {
    require_present(
        &body,
        &[
            "ProductName",
            "MRP",
            "Price",
            "Qty",
            "Total",
            "fLoginID",
            "fProductID",
            "PointsParsent",
        ],
    )?;

    let params = vec![
        india_datetime().into(),
        body_param(&body, "ProductName"),
        body_param(&body, "MRP"),
        body_param(&body, "Price"),
        body_param(&body, "Qty"),
        body_param(&body, "Total"),
        body_param(&body, "Customer"),
        body_param(&body, "Phone"),
        body_param(&body, "fProductID"),
        body_param(&body, "fLoginID"),
        body_param(&body, "BillNumber"),
        body_param(&body, "Tax"),
        body_param(&body, "Taxable"),
        body_param(&body, "IGSTAmount"),
        body_param(&body, "StaffName"),
        body_param_nullable(&body, "selectedCustomerID"),
        body_param(&body, "PointsParsent"),
        body_param(&body, "SGST"),
        body_param(&body, "CGST"),
    ];

    call(&state.pool, "insertBill", params)
        .await
        .map_err(|e| AppError::database("Failed to save product data", e))?;

    Ok((
        StatusCode::CREATED,
        Json(json!({ "success": true, "message": "Bill saved successfully" })),
    ))
}

#[derive(Debug, Deserialize)]
pub struct UserQuery {
    #[serde(rename = "userId")]
    pub user_id: Option<String>,
}

pub async fn get_bill_number(
    State(state): State<AppState>,
    Query(query): Query<UserQuery>,
) -> ApiResult<Vec<Value>> {
    let rows = fetch_rows(&state, "getBillNumber", vec![query.user_id.into()]).await?;
    Ok(Json(rows.into_iter().map(Value::Object).collect()))
}

async fn range_report(
    state: &AppState,
    procedure: &str,
    query: RangeQuery,
) -> ApiResult<Vec<Value>> {
    let rows = fetch_rows(
        state,
        procedure,
        vec![
            query.user_id.into(),
            query.from_date.into(),
            query.to_date.into(),
        ],
    )
    .await?;
    Ok(Json(rows.into_iter().map(Value::Object).collect()))
}

pub async fn get_bills(
    State(state): State<AppState>,
    Query(query): Query<RangeQuery>,
) -> ApiResult<Vec<Value>> {
    range_report(&state, "getBills", query).await
}

pub async fn all_bill_items(
    State(state): State<AppState>,
    Query(query): Query<RangeQuery>,
) -> ApiResult<Vec<Value>> {
    range_report(&state, "getBillingItems", query).await
}

pub async fn get_sold_items(
    State(state): State<AppState>,
    Query(query): Query<RangeQuery>,
) -> ApiResult<Vec<Value>> {
    range_report(&state, "getSoldItems", query).await
}

pub async fn get_items_wise_purchase(
    State(state): State<AppState>,
    Query(query): Query<RangeQuery>,
) -> ApiResult<Vec<Value>> {
    range_report(&state, "getItemsWisePurchase", query).await
}

pub async fn delete_bill(
    State(state): State<AppState>,
    Json(body): Json<Value>,
) -> ApiResult<Value> {
    require_present(&body, &["fLoginID", "BillNumber"])?;

    let raw = call(
        &state.pool,
        "deleteBill",
        vec![body_param(&body, "fLoginID"), body_param(&body, "BillNumber")],
    )
    .await
    .map_err(|e| AppError::database("Database operation failed", e))?;

    let outcome = normalize(&raw);
    // Deletion must both report status 1 and touch rows
    let status_ok = matches!(
        outcome.status_flag.as_ref().and_then(Value::as_i64),
        Some(1)
    );
    if status_ok && outcome.affected_count.is_some_and(|n| n > 0) {
        return Ok(Json(json!({
            "success": true,
            "message": "Bill deleted successfully",
            "affectedRows": outcome.affected_count,
        })));
    }

    Err(AppError::not_found("Bill not found or unauthorized"))
}

#[derive(Debug, Deserialize)]
pub struct BillLookupQuery {
    #[serde(rename = "fLoginID")]
    pub f_login_id: Option<String>,
    #[serde(rename = "billNumber")]
    pub bill_number: Option<String>,
}

pub async fn get_bill_to_billing(
    State(state): State<AppState>,
    Query(query): Query<BillLookupQuery>,
) -> ApiResult<Value> {
    let (Some(f_login_id), Some(bill_number)) = (query.f_login_id, query.bill_number) else {
        return Err(AppError::validation(
            "Missing billNumber or fLoginID parameters",
        ));
    };

    let raw = call(
        &state.pool,
        "getOneBillItems",
        vec![f_login_id.into(), bill_number.into()],
    )
    .await
    .map_err(|e| AppError::database("Server error while fetching bill", e))?;

    let sets = raw.into_row_sets();
    if sets.first().and_then(|s| s.first()).is_none() {
        return Err(AppError::not_found("Bill not found"));
    }

    let items = sets.get(1).cloned().unwrap_or_default();
    let customer = sets
        .get(2)
        .and_then(|s| s.first())
        .cloned()
        .unwrap_or_default();

    Ok(Json(json!({
        "success": true,
        "bill": sets,
        "items": items,
        "customer": customer,
    })))
}

pub async fn all_customers(
    State(state): State<AppState>,
    Query(query): Query<UserQuery>,
) -> ApiResult<Vec<Value>> {
    let rows = fetch_rows(&state, "allCustomers", vec![query.user_id.into()]).await?;
    Ok(Json(rows.into_iter().map(Value::Object).collect()))
}
