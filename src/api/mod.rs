//! HTTP API
//!
//! One module per resource family. Handlers marshal query/body/form input
//! into positional procedure parameters, invoke the procedure, and shape the
//! response envelope. Route paths and parameter orders are part of the wire
//! contract with existing clients and must not change.

pub mod account;
pub mod admin;
pub mod billing;
pub mod health;
pub mod image;
pub mod ledger;
pub mod points;
pub mod product;
pub mod purchase;
pub mod staff;
pub mod tenant;

use std::time::Duration;

use axum::Router;
use axum::extract::DefaultBodyLimit;
use axum::routing::{delete, get, post, put};
use serde::Deserialize;
use serde_json::Value;
use tower::ServiceBuilder;
use tower_http::cors::CorsLayer;
use tower_http::services::ServeDir;
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;

use crate::db::procedure::{ProcRow, ProcValue, call};
use crate::error::AppError;
use crate::state::AppState;

pub type ApiResult<T> = Result<axum::Json<T>, AppError>;

pub fn create_router(state: AppState) -> Router {
    Router::new()
        // Health
        .route("/test", get(health::test))
        .route("/testing", get(health::test))
        // Profile images
        .route("/upload-image", post(image::upload_image))
        .route("/get-image/{loginID}", get(image::get_image))
        .route("/delete-image/{loginID}", delete(image::delete_image))
        // Products
        .route("/productSave", post(product::save_product))
        .route("/product/{id}", put(product::update_product))
        .route("/deleteproduct/{id}", delete(product::delete_product))
        .route("/showproducts", get(product::show_products))
        .route("/getProductByBarCode", get(product::get_product_by_barcode))
        .route("/getStocks", get(product::get_stocks))
        .route("/getRateTag", get(product::get_rate_tag))
        .route("/getRateTagStock", get(product::get_rate_tag_stock))
        .route("/getBarcodeRateTag", get(product::get_barcode_rate_tag))
        // Billing
        .route("/BillSave", post(billing::save_bill))
        .route("/getBillNumber", get(billing::get_bill_number))
        .route("/getbills", get(billing::get_bills))
        .route("/allBillItems", get(billing::all_bill_items))
        .route("/getsolidItems", get(billing::get_sold_items))
        .route("/getItemsWisePurchase", get(billing::get_items_wise_purchase))
        .route("/deleteBill", delete(billing::delete_bill))
        .route("/getsBillToBilling", get(billing::get_bill_to_billing))
        .route("/allCustomers", get(billing::all_customers))
        // Purchases
        .route("/insertpurchase", post(purchase::insert_purchase))
        .route("/getPurchaseBill", post(purchase::get_purchase_bill))
        .route("/getPurchaseByDate", get(purchase::get_purchase_by_date))
        .route("/updatePurchase", put(purchase::update_purchase))
        .route("/getPurchaseDetails", post(purchase::get_purchase_details))
        .route(
            "/getProductBillHistory",
            post(purchase::get_product_bill_history),
        )
        .route("/getPurchaseItem", get(purchase::get_purchase_item))
        .route("/PartyPurchase", get(purchase::party_purchase))
        .route("/deletepurchase", delete(purchase::delete_purchase))
        // Ledgers
        .route("/insertledger", post(ledger::insert_ledger))
        .route("/getledgeritems", get(ledger::get_ledger_items))
        .route("/getNameLIDtofID", get(ledger::get_name_lid))
        .route("/deleteledger", delete(ledger::delete_ledger))
        .route("/updateledger", put(ledger::update_ledger))
        .route("/getpartylist", get(ledger::get_party_list))
        .route("/getLedgerSummary", get(ledger::get_ledger_summary))
        .route("/getCustomerlist", get(ledger::get_customer_list))
        // Accounts
        .route("/insertaccount", post(account::insert_account))
        .route("/deleteaccount", delete(account::delete_account))
        .route("/getAllLedgerName", get(account::get_all_ledger_names))
        .route("/getBalanceSheet", get(account::get_balance_sheet))
        .route("/getAccountsHistory", get(account::get_accounts_history))
        // Staff
        .route("/insertStaff", post(staff::insert_staff))
        .route("/getStaff", get(staff::get_staff))
        .route("/updateStaff", put(staff::update_staff))
        .route("/deleteStaff", delete(staff::delete_staff))
        .route("/StaffNameToBilling", get(staff::staff_names_for_billing))
        .route("/getStaffSale", get(staff::get_staff_sale))
        // Points
        .route("/Points", post(points::insert_points))
        .route("/getCustomerPoints", get(points::get_customer_points))
        .route("/getCustomerPointView", get(points::get_customer_point_view))
        .route("/getPointsEarned", get(points::get_points_earned))
        .route("/getEarnedPoints", post(points::insert_earned_points))
        .route(
            "/getSingleCustomerPoints",
            get(points::get_single_customer_points),
        )
        // Tenants
        .route("/signup", post(tenant::signup))
        .route("/login", get(tenant::login))
        .route("/updatepassword", post(tenant::update_password))
        .route("/updateFirm", put(tenant::update_firm))
        // Administration
        .route("/AdminLogin", post(admin::admin_login))
        .route("/getUser", get(admin::get_users))
        .route("/updateUser", post(admin::update_user))
        .route("/DeleteUser", delete(admin::delete_user))
        // Static serving of uploaded images
        .nest_service("/uploads", ServeDir::new(state.uploads.dir()))
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(CorsLayer::permissive())
                .layer(TimeoutLayer::new(Duration::from_secs(30)))
                .layer(DefaultBodyLimit::max(10 * 1024 * 1024)),
        )
        .with_state(state)
}

/// Date-range listing query shared by the report endpoints
#[derive(Debug, Deserialize)]
pub struct RangeQuery {
    #[serde(rename = "userId")]
    pub user_id: Option<String>,
    #[serde(rename = "fromDate")]
    pub from_date: Option<String>,
    #[serde(rename = "toDate")]
    pub to_date: Option<String>,
}

/// Invoke a read procedure on the pool and return its first result set.
pub(crate) async fn fetch_rows(
    state: &AppState,
    procedure: &str,
    params: Vec<ProcValue>,
) -> Result<Vec<ProcRow>, AppError> {
    let raw = call(&state.pool, procedure, params)
        .await
        .map_err(|e| AppError::database("Database query failed", e))?;
    Ok(raw.into_first_row_set())
}

/// A body field as a positional parameter. Absent fields become NULL.
pub(crate) fn body_param(body: &Value, name: &str) -> ProcValue {
    body.get(name).map(ProcValue::from).unwrap_or(ProcValue::Null)
}

/// Like [`body_param`] but empty strings also become NULL.
pub(crate) fn body_param_nullable(body: &Value, name: &str) -> ProcValue {
    match body.get(name) {
        Some(Value::String(s)) if s.trim().is_empty() => ProcValue::Null,
        Some(v) => ProcValue::from(v),
        None => ProcValue::Null,
    }
}

/// Reject the request when any named field is missing or null. Empty
/// strings pass; some writers historically send them.
pub(crate) fn require_present(body: &Value, fields: &[&str]) -> Result<(), AppError> {
    let missing = fields
        .iter()
        .any(|f| matches!(body.get(*f), None | Some(Value::Null)));
    if missing {
        return Err(AppError::validation(
            "All required fields must be provided.",
        ));
    }
    Ok(())
}

/// Reject the request when any named field is missing, null or empty.
pub(crate) fn require_fields(body: &Value, fields: &[&str]) -> Result<(), AppError> {
    let missing = fields.iter().any(|f| match body.get(*f) {
        None | Some(Value::Null) => true,
        Some(Value::String(s)) => s.trim().is_empty(),
        Some(_) => false,
    });
    if missing {
        return Err(AppError::validation("All required fields must be provided"));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_require_fields_rejects_missing_null_and_empty() {
        let body = json!({"a": "x", "b": null, "c": "", "d": 0});
        assert!(require_fields(&body, &["a"]).is_ok());
        assert!(require_fields(&body, &["a", "d"]).is_ok());
        assert!(require_fields(&body, &["b"]).is_err());
        assert!(require_fields(&body, &["c"]).is_err());
        assert!(require_fields(&body, &["missing"]).is_err());
    }

    #[test]
    fn test_body_param_nullable_maps_empty_to_null() {
        let body = json!({"x": "", "y": "7", "z": 3});
        assert_eq!(body_param_nullable(&body, "x"), ProcValue::Null);
        assert_eq!(body_param_nullable(&body, "y"), ProcValue::Text("7".into()));
        assert_eq!(body_param(&body, "z"), ProcValue::Int(3));
        assert_eq!(body_param(&body, "absent"), ProcValue::Null);
    }
}
