//! Ledger (party/customer) endpoints
//!
//! Ledger deletion trusts the procedure's own status row when it returns
//! one; a delete that returns no row at all is treated as success, since
//! some deployments run a bare DELETE inside the procedure.

use axum::Json;
use axum::extract::{Query, State};
use axum::http::StatusCode;
use serde::Deserialize;
use serde_json::{Value, json};

use crate::db::procedure::call;
use crate::db::{Violation, violation};
use crate::error::AppError;
use crate::state::AppState;

use super::{ApiResult, body_param, fetch_rows, require_fields};

pub async fn insert_ledger(
    State(state): State<AppState>,
    Json(body): Json<Value>,
) -> Result<(StatusCode, Json<Value>), AppError> {
    require_fields(&body, &["Name", "Mobile", "fLoginID", "CustomerDetails"])?;

    let params = vec![
        body_param(&body, "Name"),
        body_param(&body, "Mobile"),
        body_param(&body, "Address"),
        body_param(&body, "GSTIN"),
        body_param(&body, "fLoginID"),
        body_param(&body, "CustomerDetails"),
        body_param(&body, "StateCode"),
    ];

    call(&state.pool, "insertLedger", params)
        .await
        .map_err(|e| AppError::database("Failed to save Ledger data", e))?;

    Ok((
        StatusCode::CREATED,
        Json(json!({ "message": "Ledger data saved successfully" })),
    ))
}

#[derive(Debug, Deserialize)]
pub struct UserQuery {
    #[serde(rename = "userId")]
    pub user_id: Option<String>,
}

async fn user_listing(
    state: &AppState,
    procedure: &str,
    user_id: Option<String>,
) -> ApiResult<Vec<Value>> {
    let Some(user_id) = user_id else {
        return Err(AppError::validation("Missing userId"));
    };
    let rows = fetch_rows(state, procedure, vec![user_id.into()]).await?;
    Ok(Json(rows.into_iter().map(Value::Object).collect()))
}

pub async fn get_ledger_items(
    State(state): State<AppState>,
    Query(query): Query<UserQuery>,
) -> ApiResult<Vec<Value>> {
    user_listing(&state, "getLedgerItem", query.user_id).await
}

pub async fn get_name_lid(
    State(state): State<AppState>,
    Query(query): Query<UserQuery>,
) -> ApiResult<Vec<Value>> {
    user_listing(&state, "getNameLIDtofID", query.user_id).await
}

pub async fn delete_ledger(
    State(state): State<AppState>,
    Json(body): Json<Value>,
) -> ApiResult<Value> {
    require_fields(&body, &["fLoginID", "LID"])?;

    let raw = call(
        &state.pool,
        "DeleteLedger",
        vec![body_param(&body, "LID"), body_param(&body, "fLoginID")],
    )
    .await
    .map_err(|e| match violation(&e) {
        Violation::Referenced => {
            AppError::referenced("Cannot delete ledger: it is referenced in a bill")
        }
        _ => AppError::database("Database operation failed", e),
    })?;

    let rows = raw.into_first_row_set();
    let Some(result) = rows.first() else {
        // No status row but no error either: the delete ran
        return Ok(Json(json!({
            "success": true,
            "message": "Ledger deleted successfully"
        })));
    };

    if result.get("status").and_then(Value::as_i64) == Some(1) {
        let message = result
            .get("message")
            .and_then(Value::as_str)
            .unwrap_or("Ledger deleted successfully");
        return Ok(Json(json!({ "success": true, "message": message })));
    }

    let error = result
        .get("error")
        .and_then(Value::as_str)
        .unwrap_or("Ledger deletion failed");
    Err(AppError::validation(error))
}

pub async fn update_ledger(
    State(state): State<AppState>,
    Json(body): Json<Value>,
) -> ApiResult<Value> {
    require_fields(&body, &["Name", "Mobile", "LID", "fLoginID", "CustomerDetails"])?;

    let params = vec![
        body_param(&body, "Name"),
        body_param(&body, "Mobile"),
        body_param(&body, "Address"),
        body_param(&body, "GSTIN"),
        body_param(&body, "LID"),
        body_param(&body, "fLoginID"),
        body_param(&body, "CustomerDetails"),
        body_param(&body, "StateCode"),
    ];

    call(&state.pool, "UpdateLedger", params)
        .await
        .map_err(|e| AppError::database("Failed to update ledger", e))?;

    Ok(Json(json!({
        "success": true,
        "message": "Ledger updated successfully",
    })))
}

#[derive(Debug, Deserialize)]
pub struct LoginQuery {
    #[serde(rename = "fLoginID")]
    pub f_login_id: Option<String>,
}

async fn login_listing(
    state: &AppState,
    procedure: &str,
    f_login_id: Option<String>,
) -> ApiResult<Vec<Value>> {
    let Some(f_login_id) = f_login_id else {
        return Err(AppError::validation("Missing fLoginID"));
    };
    let rows = fetch_rows(state, procedure, vec![f_login_id.into()]).await?;
    Ok(Json(rows.into_iter().map(Value::Object).collect()))
}

pub async fn get_party_list(
    State(state): State<AppState>,
    Query(query): Query<LoginQuery>,
) -> ApiResult<Vec<Value>> {
    login_listing(&state, "getParty", query.f_login_id).await
}

pub async fn get_customer_list(
    State(state): State<AppState>,
    Query(query): Query<LoginQuery>,
) -> ApiResult<Vec<Value>> {
    login_listing(&state, "getCustomer", query.f_login_id).await
}

#[derive(Debug, Deserialize)]
pub struct LedgerSummaryQuery {
    #[serde(rename = "fLoginID")]
    pub f_login_id: Option<String>,
    #[serde(rename = "LID")]
    pub lid: Option<String>,
    #[serde(rename = "fromDate")]
    pub from_date: Option<String>,
    #[serde(rename = "toDate")]
    pub to_date: Option<String>,
}

pub async fn get_ledger_summary(
    State(state): State<AppState>,
    Query(query): Query<LedgerSummaryQuery>,
) -> ApiResult<Vec<Value>> {
    let (Some(f_login_id), Some(lid), Some(from_date), Some(to_date)) =
        (query.f_login_id, query.lid, query.from_date, query.to_date)
    else {
        return Err(AppError::validation("Missing parameters"));
    };

    let rows = fetch_rows(
        &state,
        "getLedgerSummary",
        vec![
            f_login_id.into(),
            lid.into(),
            from_date.into(),
            to_date.into(),
        ],
    )
    .await?;
    Ok(Json(rows.into_iter().map(Value::Object).collect()))
}
