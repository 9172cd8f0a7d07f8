//! Administration endpoints (tenant provisioning)
//!
//! The 19 tenant attributes bind in one fixed order shared by `Admin` and
//! `UpdateUsers` (which prepends LoginID). The order is the procedure
//! contract, not alphabetical or request order.

use axum::Json;
use axum::extract::State;
use axum::http::StatusCode;
use serde_json::{Value, json};

use crate::db::procedure::{ProcValue, call};
use crate::db::{Violation, violation};
use crate::error::AppError;
use crate::state::AppState;

use super::{ApiResult, body_param, require_fields};

const DUPLICATE_PHONE: &str =
    "Phone number already exists for another user. Please use a different number.";

/// The shared attribute order for `Admin` / `UpdateUsers`.
fn tenant_params(body: &Value) -> Vec<ProcValue> {
    vec![
        body_param(body, "businessName"),
        body_param(body, "phoneNumber"),
        body_param(body, "password"),
        body_param(body, "IsEnable"),
        body_param(body, "ValidityDate"),
        body_param(body, "Address"),
        body_param(body, "BillMobile"),
        body_param(body, "EnableStaff"),
        body_param(body, "BillFormat"),
        body_param(body, "GSTIN"),
        body_param(body, "EnableWhatsApp"),
        body_param(body, "WhatsAppAPI"),
        body_param(body, "EnablePoints"),
        body_param(body, "UPI"),
        body_param(body, "Details"),
        body_param(body, "RateTag"),
        body_param(body, "StateCode"),
        body_param(body, "EnableAccounts"),
        body_param(body, "OnlyRateTag"),
    ]
}

fn admin_write_error(err: sqlx::Error, fallback: &str) -> AppError {
    match violation(&err) {
        Violation::Duplicate => AppError::duplicate(DUPLICATE_PHONE),
        _ => AppError::database(fallback, err),
    }
}

pub async fn admin_login(
    State(state): State<AppState>,
    Json(body): Json<Value>,
) -> Result<(StatusCode, Json<Value>), AppError> {
    require_fields(&body, &["password", "phoneNumber", "businessName", "BillFormat"])?;

    call(&state.pool, "Admin", tenant_params(&body))
        .await
        .map_err(|e| admin_write_error(e, "Failed to create account"))?;

    Ok((
        StatusCode::CREATED,
        Json(json!({ "success": true, "message": "Created successfully" })),
    ))
}

pub async fn get_users(State(state): State<AppState>) -> ApiResult<Value> {
    let rows = super::fetch_rows(&state, "getUser", Vec::new()).await?;
    Ok(Json(json!({ "success": true, "data": rows })))
}

pub async fn update_user(
    State(state): State<AppState>,
    Json(body): Json<Value>,
) -> ApiResult<Value> {
    require_fields(&body, &["LoginID"])?;

    let mut params = vec![body_param(&body, "LoginID")];
    params.extend(tenant_params(&body));

    call(&state.pool, "UpdateUsers", params)
        .await
        .map_err(|e| admin_write_error(e, "Failed to update user"))?;

    Ok(Json(json!({
        "success": true,
        "message": "User updated successfully",
    })))
}

pub async fn delete_user(
    State(state): State<AppState>,
    Json(body): Json<Value>,
) -> ApiResult<Value> {
    require_fields(&body, &["LoginID"])?;
    let login_id = body.get("LoginID").cloned().unwrap_or(Value::Null);
    let display = match &login_id {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    };

    call(&state.pool, "DeleteUser", vec![ProcValue::from(&login_id)])
        .await
        .map_err(|e| AppError::database("Internal Server Error", e))?;

    Ok(Json(json!({
        "success": true,
        "message": format!("User with LoginID {display} deleted successfully"),
    })))
}
