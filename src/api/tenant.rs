//! Tenant account endpoints (signup, login, firm profile)

use axum::Json;
use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Deserialize;
use serde_json::{Value, json};

use crate::db::normalize::normalize;
use crate::db::procedure::call;
use crate::error::AppError;
use crate::flow::{FlowError, WriteExpectation, transactional_write};
use crate::state::AppState;

use super::{ApiResult, body_param, require_fields};

pub async fn signup(
    State(state): State<AppState>,
    Json(body): Json<Value>,
) -> Result<(StatusCode, Json<Value>), AppError> {
    require_fields(&body, &["password", "phoneNumber", "businessName"])?;

    let params = vec![
        body_param(&body, "businessName"),
        body_param(&body, "phoneNumber"),
        body_param(&body, "password"),
        body_param(&body, "Address"),
        body_param(&body, "GSTIN"),
        body_param(&body, "BillMobile"),
        body_param(&body, "BillFormat"),
    ];

    let outcome = transactional_write(
        &state.pool,
        "insertLogin",
        params,
        WriteExpectation::NewIdentifier,
    )
    .await
    .map_err(|err| match err {
        FlowError::Duplicate(_) => {
            AppError::duplicate("Phone number already exists. Please try logging in.")
        }
        FlowError::ExtractionFailed => AppError::internal("Failed to create account"),
        FlowError::Db(e) => AppError::database("Failed to create account", e),
        other => AppError::internal(other.to_string()),
    })?;

    Ok((
        StatusCode::CREATED,
        Json(json!({
            "success": true,
            "message": "Created successfully",
            "productId": outcome.identifier,
        })),
    ))
}

#[derive(Debug, Deserialize)]
pub struct LoginQuery {
    #[serde(rename = "phoneNumber")]
    pub phone_number: Option<String>,
    pub password: Option<String>,
}

pub async fn login(
    State(state): State<AppState>,
    Query(query): Query<LoginQuery>,
) -> Result<Response, AppError> {
    let (Some(phone_number), Some(password)) = (query.phone_number, query.password) else {
        return Err(AppError::validation(
            "Phone number and password are required",
        ));
    };

    let raw = call(
        &state.pool,
        "checkLogin",
        vec![phone_number.into(), password.into()],
    )
    .await
    .map_err(|e| AppError::database("Database error. Please try again.", e))?;

    let outcome = normalize(&raw);
    let rows = raw.into_first_row_set();
    let Some(row) = rows.into_iter().next() else {
        return Err(AppError::invalid_credentials());
    };

    // The first value of the row is the login identifier; a non-positive
    // value means the credentials were rejected.
    let status = if outcome.identifier.is_some_and(|id| id > 0) {
        StatusCode::OK
    } else {
        StatusCode::UNAUTHORIZED
    };
    Ok((status, Json(Value::Object(row))).into_response())
}

pub async fn update_password(
    State(state): State<AppState>,
    Json(body): Json<Value>,
) -> ApiResult<Value> {
    call(
        &state.pool,
        "UpdatePassword",
        vec![
            body_param(&body, "LoginID"),
            body_param(&body, "OldPassword"),
            body_param(&body, "NewPassword"),
        ],
    )
    .await
    .map_err(|e| AppError::database("Failed to update password.", e))?;

    Ok(Json(json!({
        "success": true,
        "message": "Password updated successfully.",
    })))
}

pub async fn update_firm(
    State(state): State<AppState>,
    Json(body): Json<Value>,
) -> ApiResult<Value> {
    require_fields(&body, &["LoginID", "BusinessName"])?;

    let params = vec![
        body_param(&body, "LoginID"),
        body_param(&body, "BusinessName"),
        body_param(&body, "Address"),
        body_param(&body, "GSTIN"),
        body_param(&body, "BillMobile"),
        body_param(&body, "BillFormat"),
        body_param(&body, "UPI"),
        body_param(&body, "StateCode"),
    ];

    call(&state.pool, "UpdateFirm", params)
        .await
        .map_err(|e| AppError::database("Failed to update profile", e))?;

    Ok(Json(json!({
        "success": true,
        "message": "Profile updated successfully",
    })))
}
