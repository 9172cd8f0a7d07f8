//! Customer loyalty points endpoints
//!
//! Both point writers stamp the server-side IST time, same as bill saves.
//! The redemption procedure is named `getEarnedPoints` despite being a
//! write; the name is part of the database contract.

use axum::Json;
use axum::extract::{Query, State};
use axum::http::StatusCode;
use serde::Deserialize;
use serde_json::{Value, json};

use crate::db::procedure::call;
use crate::error::AppError;
use crate::state::AppState;
use crate::util::india_datetime;

use super::{ApiResult, body_param, fetch_rows, require_present};

pub async fn insert_points(
    State(state): State<AppState>,
    Json(body): Json<Value>,
) -> Result<(StatusCode, Json<Value>), AppError> {
    require_present(&body, &["BillNumber", "fLoginID"])?;

    let params = vec![
        india_datetime().into(),
        body_param(&body, "BillNumber"),
        body_param(&body, "Points"),
        body_param(&body, "fLoginID"),
        body_param(&body, "fLedgerID"),
    ];

    call(&state.pool, "InsertPoints", params)
        .await
        .map_err(|e| AppError::database("Failed to save bill data", e))?;

    Ok((
        StatusCode::CREATED,
        Json(json!({ "message": "Bill data saved successfully" })),
    ))
}

#[derive(Debug, Deserialize)]
pub struct UserQuery {
    #[serde(rename = "userId")]
    pub user_id: Option<String>,
}

pub async fn get_customer_points(
    State(state): State<AppState>,
    Query(query): Query<UserQuery>,
) -> ApiResult<Vec<Value>> {
    let rows = fetch_rows(&state, "getCustomerPoints", vec![query.user_id.into()]).await?;
    Ok(Json(rows.into_iter().map(Value::Object).collect()))
}

#[derive(Debug, Deserialize)]
pub struct LedgerQuery {
    #[serde(rename = "fLoginID")]
    pub f_login_id: Option<String>,
    #[serde(rename = "fLedgerID")]
    pub f_ledger_id: Option<String>,
}

pub async fn get_customer_point_view(
    State(state): State<AppState>,
    Query(query): Query<LedgerQuery>,
) -> ApiResult<Vec<Value>> {
    let rows = fetch_rows(
        &state,
        "getCustomerPointView",
        vec![query.f_login_id.into(), query.f_ledger_id.into()],
    )
    .await?;
    Ok(Json(rows.into_iter().map(Value::Object).collect()))
}

pub async fn get_points_earned(
    State(state): State<AppState>,
    Query(query): Query<LedgerQuery>,
) -> ApiResult<Vec<Value>> {
    let rows = fetch_rows(
        &state,
        "getPointsEarned",
        vec![query.f_login_id.into(), query.f_ledger_id.into()],
    )
    .await?;
    Ok(Json(rows.into_iter().map(Value::Object).collect()))
}

pub async fn insert_earned_points(
    State(state): State<AppState>,
    Json(body): Json<Value>,
) -> Result<(StatusCode, Json<Value>), AppError> {
    require_present(&body, &["fLoginID"])?;

    let params = vec![
        india_datetime().into(),
        body_param(&body, "Points"),
        body_param(&body, "fLedgerID"),
        body_param(&body, "fLoginID"),
        body_param(&body, "Narration"),
    ];

    call(&state.pool, "getEarnedPoints", params)
        .await
        .map_err(|e| AppError::database("Failed to redeem points", e))?;

    Ok((
        StatusCode::CREATED,
        Json(json!({ "message": "Points redeemed successfully" })),
    ))
}

pub async fn get_single_customer_points(
    State(state): State<AppState>,
    Query(query): Query<LedgerQuery>,
) -> ApiResult<Vec<Value>> {
    let (Some(f_login_id), Some(f_ledger_id)) = (query.f_login_id, query.f_ledger_id) else {
        return Err(AppError::validation("fLoginID and fLedgerID are required"));
    };

    // Procedure name carries a historical typo; it is the deployed name
    let rows = fetch_rows(
        &state,
        "getSingleCusomterPoints",
        vec![f_login_id.into(), f_ledger_id.into()],
    )
    .await?;
    Ok(Json(rows.into_iter().map(Value::Object).collect()))
}
