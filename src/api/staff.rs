//! Staff endpoints
//!
//! UpdateStaff binds the login scope before the staff ID; DeleteStaff binds
//! them the other way round. Both orders are fixed by the procedure
//! signatures.

use axum::Json;
use axum::extract::{Query, State};
use axum::http::StatusCode;
use serde_json::{Value, json};

use crate::db::normalize::normalize;
use crate::db::procedure::call;
use crate::error::AppError;
use crate::state::AppState;

use super::{ApiResult, RangeQuery, body_param, fetch_rows, require_fields};

pub async fn insert_staff(
    State(state): State<AppState>,
    Json(body): Json<Value>,
) -> Result<(StatusCode, Json<Value>), AppError> {
    require_fields(&body, &["StaffUserName", "Password", "fLoginID"])?;

    let params = vec![
        body_param(&body, "StaffUserName"),
        body_param(&body, "Password"),
        body_param(&body, "Mobile"),
        body_param(&body, "Address"),
        body_param(&body, "fLoginID"),
    ];

    call(&state.pool, "insertStaff", params)
        .await
        .map_err(|e| AppError::database("Failed to save Staff data", e))?;

    Ok((
        StatusCode::CREATED,
        Json(json!({ "message": "Staff data saved successfully" })),
    ))
}

pub async fn get_staff(
    State(state): State<AppState>,
    Query(query): Query<RangeQuery>,
) -> ApiResult<Vec<Value>> {
    let Some(user_id) = query.user_id else {
        return Err(AppError::validation("Missing userId"));
    };
    let rows = fetch_rows(&state, "getStaff", vec![user_id.into()]).await?;
    Ok(Json(rows.into_iter().map(Value::Object).collect()))
}

pub async fn update_staff(
    State(state): State<AppState>,
    Json(body): Json<Value>,
) -> ApiResult<Value> {
    require_fields(&body, &["StaffUserName", "Password", "SID", "fLoginID"])?;

    let params = vec![
        body_param(&body, "StaffUserName"),
        body_param(&body, "Password"),
        body_param(&body, "Mobile"),
        body_param(&body, "Address"),
        body_param(&body, "fLoginID"),
        body_param(&body, "SID"),
    ];

    call(&state.pool, "UpdateStaff", params)
        .await
        .map_err(|e| AppError::database("Failed to update staff", e))?;

    Ok(Json(json!({
        "success": true,
        "message": "Staff updated successfully",
    })))
}

pub async fn delete_staff(
    State(state): State<AppState>,
    Json(body): Json<Value>,
) -> ApiResult<Value> {
    require_fields(&body, &["fLoginID", "SID"])?;

    let raw = call(
        &state.pool,
        "DeleteStaff",
        vec![body_param(&body, "SID"), body_param(&body, "fLoginID")],
    )
    .await
    .map_err(|e| AppError::database("Server error while deleting staff", e))?;

    let outcome = normalize(&raw);
    if outcome.affected_count.is_some_and(|n| n > 0) {
        return Ok(Json(json!({
            "success": true,
            "message": "Staff deleted successfully",
        })));
    }

    Err(AppError::not_found("Staff not found or deletion unauthorized"))
}

pub async fn staff_names_for_billing(
    State(state): State<AppState>,
    Query(query): Query<RangeQuery>,
) -> ApiResult<Vec<Value>> {
    let Some(user_id) = query.user_id else {
        return Err(AppError::validation("Missing userId"));
    };
    let rows = fetch_rows(&state, "StaffNameToBilling", vec![user_id.into()]).await?;
    Ok(Json(rows.into_iter().map(Value::Object).collect()))
}

pub async fn get_staff_sale(
    State(state): State<AppState>,
    Query(query): Query<RangeQuery>,
) -> ApiResult<Vec<Value>> {
    let Some(user_id) = query.user_id else {
        return Err(AppError::validation("Missing userId"));
    };
    let rows = fetch_rows(
        &state,
        "getStaffSale",
        vec![
            user_id.into(),
            query.from_date.into(),
            query.to_date.into(),
        ],
    )
    .await?;
    Ok(Json(rows.into_iter().map(Value::Object).collect()))
}
