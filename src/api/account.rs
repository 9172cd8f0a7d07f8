//! Accounts (debit/credit) endpoints

use axum::Json;
use axum::extract::{Query, State};
use serde::Deserialize;
use serde_json::{Value, json};

use crate::db::procedure::call;
use crate::error::AppError;
use crate::state::AppState;

use super::{ApiResult, body_param, body_param_nullable, fetch_rows};

pub async fn insert_account(
    State(state): State<AppState>,
    Json(body): Json<Value>,
) -> ApiResult<Value> {
    let params = vec![
        body_param(&body, "fLedgerID"),
        body_param(&body, "Debit"),
        body_param(&body, "Credit"),
        body_param(&body, "Narration"),
        body_param_nullable(&body, "fBillNumber"),
        body_param(&body, "fLoginID"),
        body_param(&body, "DateTime"),
    ];

    call(&state.pool, "InsertAccounts", params)
        .await
        .map_err(|e| AppError::database("Failed to insert account.", e))?;

    Ok(Json(json!({
        "success": true,
        "message": "Account inserted successfully.",
    })))
}

pub async fn delete_account(
    State(state): State<AppState>,
    Json(body): Json<Value>,
) -> ApiResult<Value> {
    call(
        &state.pool,
        "DeleteAccounts",
        vec![
            body_param(&body, "fBillNumber"),
            body_param(&body, "fLoginID"),
        ],
    )
    .await
    .map_err(|e| AppError::database("Failed to delete account.", e))?;

    Ok(Json(json!({ "message": "Account deleted successfully." })))
}

#[derive(Debug, Deserialize)]
pub struct LoginQuery {
    #[serde(rename = "fLoginID")]
    pub f_login_id: Option<String>,
}

pub async fn get_all_ledger_names(
    State(state): State<AppState>,
    Query(query): Query<LoginQuery>,
) -> ApiResult<Value> {
    let rows = fetch_rows(&state, "getAllLedgerName", vec![query.f_login_id.into()]).await?;
    Ok(Json(json!({ "success": true, "data": rows })))
}

pub async fn get_balance_sheet(
    State(state): State<AppState>,
    Query(query): Query<LoginQuery>,
) -> ApiResult<Value> {
    let rows = fetch_rows(&state, "getBalanceSheet", vec![query.f_login_id.into()]).await?;
    Ok(Json(json!({ "success": true, "data": rows })))
}

#[derive(Debug, Deserialize)]
pub struct HistoryQuery {
    #[serde(rename = "fLoginID")]
    pub f_login_id: Option<String>,
    #[serde(rename = "fromDate")]
    pub from_date: Option<String>,
    #[serde(rename = "toDate")]
    pub to_date: Option<String>,
}

pub async fn get_accounts_history(
    State(state): State<AppState>,
    Query(query): Query<HistoryQuery>,
) -> ApiResult<Vec<Value>> {
    let rows = fetch_rows(
        &state,
        "getAccountsHistory",
        vec![
            query.f_login_id.into(),
            query.from_date.into(),
            query.to_date.into(),
        ],
    )
    .await?;
    Ok(Json(rows.into_iter().map(Value::Object).collect()))
}
