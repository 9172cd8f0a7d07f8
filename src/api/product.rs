//! Product catalog endpoints
//!
//! Create and update are multipart forms (optional `image` file). Both run
//! through the transactional write flow: the procedure outcome decides
//! commit vs rollback, and image cleanup happens strictly after that
//! decision. A failed write discards the fresh upload; a committed update
//! deletes the asset it replaced.

use axum::Json;
use axum::extract::{Multipart, Path, Query, State};
use axum::http::StatusCode;
use serde::Deserialize;
use serde_json::{Value, json};

use crate::db::procedure::ProcValue;
use crate::error::{AppError, ErrorCode};
use crate::flow::{FlowError, WriteExpectation, transactional_write, update_catalog_entry};
use crate::state::AppState;
use crate::uploads::ProductForm;

use super::{ApiResult, fetch_rows};

const DUPLICATE_BARCODE: &str = "Barcode must be unique. This barcode is already in use.";

/// Map a failed product write to the response contract.
fn product_write_error(err: FlowError) -> AppError {
    match err {
        FlowError::Rejected(outcome) => AppError::validation(outcome.message_or("Update failed.")),
        FlowError::ExtractionFailed => AppError::with_message(
            ErrorCode::ExtractionFailed,
            "Could not retrieve valid product ID from database",
        ),
        FlowError::Duplicate(_) => AppError::duplicate(DUPLICATE_BARCODE),
        FlowError::Referenced(_) => AppError::referenced(
            "This product is used in Sale/Purchase records and cannot be deleted.",
        ),
        FlowError::Db(e) => AppError::database("Something went wrong while saving the product.", e),
    }
}

pub async fn save_product(
    State(state): State<AppState>,
    multipart: Multipart,
) -> Result<(StatusCode, Json<Value>), AppError> {
    let form = crate::uploads::read_product_form(&state.uploads, multipart).await?;

    let Some(params) = create_params(&state, &form) else {
        if let Some(upload) = &form.upload {
            state.uploads.discard(upload).await;
        }
        return Err(AppError::validation("Product details are required"));
    };

    match transactional_write(
        &state.pool,
        "insertProduct",
        params,
        WriteExpectation::NewIdentifier,
    )
    .await
    {
        Ok(outcome) => Ok((
            StatusCode::CREATED,
            Json(json!({
                "success": true,
                "message": outcome.message_or("Product saved successfully"),
                "productId": outcome.identifier,
            })),
        )),
        Err(err) => {
            if let Some(upload) = &form.upload {
                state.uploads.discard(upload).await;
            }
            Err(product_write_error(err))
        }
    }
}

/// Positional parameters for `insertProduct`, or None when a required field
/// is missing or unparsable.
fn create_params(state: &AppState, form: &ProductForm) -> Option<Vec<ProcValue>> {
    let product_name = form.text("productName")?;
    let mrp: f64 = form.text("mrp")?.parse().ok()?;
    let price: f64 = form.text("price")?.parse().ok()?;
    let f_login_id: i64 = form.text("FLoginId")?.parse().ok()?;

    let image_name = state.uploads.resolve_create(
        form.upload.as_ref(),
        form.flag("useDefaultImage"),
        form.text("defaultImageName"),
    );

    Some(vec![
        product_name.into(),
        mrp.into(),
        price.into(),
        image_name.into(),
        f_login_id.into(),
        form.text("Barcode").into(),
        form.text("Tax").into(),
        form.text("Points").into(),
    ])
}

pub async fn update_product(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    multipart: Multipart,
) -> ApiResult<Value> {
    let form = crate::uploads::read_product_form(&state.uploads, multipart).await?;

    let (Some(mrp), Some(price), Some(f_login_id)) = (
        form.text("mrp").and_then(|v| v.parse::<f64>().ok()),
        form.text("price").and_then(|v| v.parse::<f64>().ok()),
        form.text("FLoginId").and_then(|v| v.parse::<i64>().ok()),
    ) else {
        if let Some(upload) = &form.upload {
            state.uploads.discard(upload).await;
        }
        return Err(AppError::validation("Missing required product information"));
    };

    let result = update_catalog_entry(
        &state.pool,
        "updateProduct",
        id,
        |existing| {
            state.uploads.resolve_update(
                existing,
                form.upload.as_ref(),
                form.flag("useDefaultImage"),
                form.text("defaultImageName"),
            )
        },
        |resolution| {
            vec![
                id.into(),
                mrp.into(),
                price.into(),
                resolution.image_name.as_str().into(),
                f_login_id.into(),
                form.text("Barcode").into(),
                form.text("Tax").into(),
                form.text("Points").into(),
            ]
        },
    )
    .await;

    match result {
        Ok((outcome, resolution)) => {
            state.uploads.remove_replaced(&resolution).await;
            Ok(Json(json!({
                "success": true,
                "message": outcome.message_or("Product updated successfully"),
            })))
        }
        Err(err) => {
            if let Some(upload) = &form.upload {
                state.uploads.discard(upload).await;
            }
            Err(match err {
                FlowError::Db(e) => AppError::database("Internal server error", e),
                other => product_write_error(other),
            })
        }
    }
}

pub async fn delete_product(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> ApiResult<Value> {
    let raw = crate::db::procedure::call(&state.pool, "deleteProduct", vec![id.into()])
        .await
        .map_err(|e| match crate::db::violation(&e) {
            crate::db::Violation::Referenced => AppError::referenced(
                "This product is used in Sale/Purchase records and cannot be deleted.",
            ),
            _ => AppError::database("Server error. Try again later.", e),
        })?;

    let outcome = crate::db::normalize::normalize(&raw);
    if outcome.is_success() {
        Ok(Json(json!({
            "success": true,
            "message": "Product deleted successfully"
        })))
    } else {
        Err(AppError::not_found(outcome.message_or("Product not found")))
    }
}

#[derive(Debug, Deserialize)]
pub struct UserQuery {
    #[serde(rename = "userId")]
    pub user_id: Option<String>,
}

pub async fn show_products(
    State(state): State<AppState>,
    Query(query): Query<UserQuery>,
) -> ApiResult<Vec<Value>> {
    let rows = fetch_rows(&state, "selectProduct", vec![query.user_id.into()]).await?;

    let products = rows
        .into_iter()
        .map(|mut row| {
            let image_url = row
                .get("ImageName")
                .and_then(Value::as_str)
                .filter(|name| !name.is_empty())
                .map(|name| format!("{}/uploads/{name}", state.public_base_url));
            row.insert(
                "imageUrl".to_string(),
                image_url.map(Value::String).unwrap_or(Value::Null),
            );
            Value::Object(row)
        })
        .collect();

    Ok(Json(products))
}

#[derive(Debug, Deserialize)]
pub struct BarcodeQuery {
    #[serde(rename = "fLoginID")]
    pub f_login_id: Option<String>,
    #[serde(rename = "BarCode")]
    pub bar_code: Option<String>,
}

pub async fn get_product_by_barcode(
    State(state): State<AppState>,
    Query(query): Query<BarcodeQuery>,
) -> ApiResult<Value> {
    let (Some(f_login_id), Some(bar_code)) = (query.f_login_id, query.bar_code) else {
        return Err(AppError::validation("Missing BarCode or fLoginID parameters"));
    };

    let raw = crate::db::procedure::call(
        &state.pool,
        "getProductByBarCode",
        vec![f_login_id.into(), bar_code.into()],
    )
    .await
    .map_err(|e| AppError::database("Server error while fetching Barcode", e))?;

    let sets = raw.into_row_sets();
    let header = sets.first().and_then(|s| s.first());
    if header.is_none() {
        return Err(AppError::not_found("Barcode is not valid"));
    }

    let items = sets.get(1).cloned().unwrap_or_default();
    let customer = sets
        .get(2)
        .and_then(|s| s.first())
        .cloned()
        .unwrap_or_default();

    Ok(Json(json!({
        "success": true,
        "productObj": sets,
        "items": items,
        "customer": customer,
    })))
}

pub async fn get_stocks(
    State(state): State<AppState>,
    Query(query): Query<UserQuery>,
) -> ApiResult<Vec<Value>> {
    let Some(user_id) = query.user_id else {
        return Err(AppError::validation("Missing userId"));
    };
    let rows = fetch_rows(&state, "getStocks", vec![user_id.into()]).await?;
    Ok(Json(rows.into_iter().map(Value::Object).collect()))
}

#[derive(Debug, Deserialize)]
pub struct RateTagQuery {
    #[serde(rename = "fLoginID")]
    pub f_login_id: Option<String>,
    #[serde(rename = "fProductID")]
    pub f_product_id: Option<String>,
    #[serde(rename = "Barcode")]
    pub barcode: Option<String>,
}

pub async fn get_rate_tag(
    State(state): State<AppState>,
    Query(query): Query<RateTagQuery>,
) -> ApiResult<Value> {
    let rows = fetch_rows(&state, "getRateTag", vec![query.f_login_id.into()]).await?;
    Ok(Json(json!({ "success": true, "data": rows })))
}

pub async fn get_rate_tag_stock(
    State(state): State<AppState>,
    Query(query): Query<RateTagQuery>,
) -> ApiResult<Value> {
    let rows = fetch_rows(
        &state,
        "getRateTagStock",
        vec![query.f_product_id.into(), query.f_login_id.into()],
    )
    .await?;
    Ok(Json(json!({ "success": true, "data": rows })))
}

pub async fn get_barcode_rate_tag(
    State(state): State<AppState>,
    Query(query): Query<RateTagQuery>,
) -> ApiResult<Value> {
    let rows = fetch_rows(
        &state,
        "getBarcodetoRateTag",
        vec![query.f_login_id.into(), query.barcode.into()],
    )
    .await?;

    // A single status=Error row is the procedure's own failure report
    if rows.len() == 1 && rows[0].get("status").and_then(Value::as_str) == Some("Error") {
        let message = rows[0]
            .get("message")
            .and_then(Value::as_str)
            .unwrap_or("Rate tag lookup failed")
            .to_string();
        return Ok(Json(json!({ "success": false, "message": message })));
    }

    if rows.is_empty() {
        return Ok(Json(json!({
            "success": false,
            "message": "No data found for this barcode."
        })));
    }

    Ok(Json(json!({ "success": true, "data": rows })))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::normalize::Normalized;

    #[test]
    fn test_rejected_write_maps_to_validation_error() {
        let outcome = Normalized {
            message: Some("Barcode missing".into()),
            ..Default::default()
        };
        let err = product_write_error(FlowError::Rejected(outcome));
        assert_eq!(err.code, ErrorCode::ValidationFailed);
        assert_eq!(err.message, "Barcode missing");
    }

    #[test]
    fn test_extraction_failure_maps_to_500() {
        let err = product_write_error(FlowError::ExtractionFailed);
        assert_eq!(err.code, ErrorCode::ExtractionFailed);
        assert_eq!(
            err.message,
            "Could not retrieve valid product ID from database"
        );
    }

    #[test]
    fn test_duplicate_barcode_maps_to_conflict() {
        let err = product_write_error(FlowError::Duplicate(sqlx::Error::PoolClosed));
        assert_eq!(err.code, ErrorCode::DuplicateEntry);
        assert_eq!(err.message, DUPLICATE_BARCODE);
    }

    #[test]
    fn test_referenced_product_maps_to_conflict() {
        let err = product_write_error(FlowError::Referenced(sqlx::Error::PoolClosed));
        assert_eq!(err.code, ErrorCode::RowReferenced);
        assert_eq!(
            err.message,
            "This product is used in Sale/Purchase records and cannot be deleted."
        );
    }

    #[test]
    fn test_plain_db_error_keeps_detail() {
        let err = product_write_error(FlowError::Db(sqlx::Error::PoolClosed));
        assert_eq!(err.code, ErrorCode::DatabaseError);
        assert!(err.detail.is_some());
    }
}
