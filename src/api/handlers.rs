//! HTTP request handlers for the Staff Incentive Engine API.
//!
//! This module contains the handler functions for all API endpoints.

use std::str::FromStr;
use std::time::Instant;

use axum::{
    Json, Router,
    extract::{Path, State, rejection::JsonRejection},
    http::{StatusCode, header},
    response::{IntoResponse, Response},
    routing::{get, post, put},
};
use chrono::NaiveDate;
use serde::Serialize;
use serde_json::json;
use tracing::{info, warn};
use uuid::Uuid;

use crate::error::{EngineError, EngineResult};
use crate::models::{RuleSubmission, RuleType, YearMonth};

use super::request::{ReviewRequest, SyncRequest};
use super::response::{ApiError, ApiErrorResponse, RulesUpdated};
use super::state::AppState;

/// Creates the API router with all endpoints.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health_handler))
        .route("/tenants/:tenant_id/sync", post(sync_handler))
        .route(
            "/tenants/:tenant_id/rules",
            get(get_rules_handler).put(set_rules_handler),
        )
        .route(
            "/tenants/:tenant_id/rules/:rule_type/history",
            get(rule_history_handler),
        )
        .route(
            "/tenants/:tenant_id/staff/:staff_id/balance",
            get(balance_handler),
        )
        .route(
            "/tenants/:tenant_id/staff/:staff_id/incentives/daily/:date",
            get(daily_incentive_handler),
        )
        .route(
            "/tenants/:tenant_id/staff/:staff_id/incentives/monthly/:year_month",
            get(monthly_incentive_handler),
        )
        .route(
            "/tenants/:tenant_id/staff/:staff_id/reviews/:date",
            put(reviews_handler),
        )
        .route(
            "/tenants/:tenant_id/staff/:staff_id/daily-sales",
            get(daily_sales_handler),
        )
        .with_state(state)
}

async fn health_handler() -> impl IntoResponse {
    Json(json!({ "status": "ok" }))
}

/// Handler for POST /tenants/:tenant_id/sync.
///
/// Recomputes the requested day for the listed staff and returns the sync
/// report. Any failure aborts the sync with no record written.
async fn sync_handler(
    State(state): State<AppState>,
    Path(tenant_id): Path<String>,
    payload: Result<Json<SyncRequest>, JsonRejection>,
) -> Response {
    let correlation_id = Uuid::new_v4();
    info!(
        correlation_id = %correlation_id,
        tenant_id = %tenant_id,
        "Processing sync request"
    );

    let request = match parse_json(payload, correlation_id) {
        Ok(request) => request,
        Err(response) => return response,
    };

    let start_time = Instant::now();
    match state
        .engine()
        .sync(&tenant_id, request.date, &request.staff_ids)
        .await
    {
        Ok(report) => {
            info!(
                correlation_id = %correlation_id,
                tenant_id = %tenant_id,
                date = %report.date,
                updated = report.updated_count(),
                duration_us = start_time.elapsed().as_micros(),
                "Sync completed"
            );
            json_response(StatusCode::OK, report)
        }
        Err(err) => error_response(correlation_id, err),
    }
}

/// Handler for GET /tenants/:tenant_id/rules.
async fn get_rules_handler(
    State(state): State<AppState>,
    Path(tenant_id): Path<String>,
) -> Response {
    let correlation_id = Uuid::new_v4();
    let start_time = Instant::now();
    let result = state.engine().get_rules(&tenant_id).await;
    finish(correlation_id, start_time, "get_rules", result)
}

/// Handler for PUT /tenants/:tenant_id/rules.
///
/// All four rule types must be present; the new versions are returned with
/// status 201.
async fn set_rules_handler(
    State(state): State<AppState>,
    Path(tenant_id): Path<String>,
    payload: Result<Json<RuleSubmission>, JsonRejection>,
) -> Response {
    let correlation_id = Uuid::new_v4();
    info!(
        correlation_id = %correlation_id,
        tenant_id = %tenant_id,
        "Processing rule update"
    );

    let submission = match parse_json(payload, correlation_id) {
        Ok(submission) => submission,
        Err(response) => return response,
    };

    match state.engine().set_rules(&tenant_id, submission).await {
        Ok(versions) => json_response(
            StatusCode::CREATED,
            RulesUpdated {
                tenant_id,
                versions,
            },
        ),
        Err(err) => error_response(correlation_id, err),
    }
}

/// Handler for GET /tenants/:tenant_id/rules/:rule_type/history.
async fn rule_history_handler(
    State(state): State<AppState>,
    Path((tenant_id, rule_type)): Path<(String, String)>,
) -> Response {
    let correlation_id = Uuid::new_v4();
    let start_time = Instant::now();
    let result = async {
        let rule_type = RuleType::from_str(&rule_type)?;
        state.engine().rule_history(&tenant_id, rule_type).await
    }
    .await;
    finish(correlation_id, start_time, "rule_history", result)
}

/// Handler for GET /tenants/:tenant_id/staff/:staff_id/balance.
async fn balance_handler(
    State(state): State<AppState>,
    Path((tenant_id, staff_id)): Path<(String, String)>,
) -> Response {
    let correlation_id = Uuid::new_v4();
    let start_time = Instant::now();
    let result = state
        .engine()
        .get_balance(&tenant_id, &staff_id)
        .await
        .map(|balance| balance.rounded(state.decimal_places()));
    finish(correlation_id, start_time, "get_balance", result)
}

/// Handler for GET /tenants/:tenant_id/staff/:staff_id/incentives/daily/:date.
async fn daily_incentive_handler(
    State(state): State<AppState>,
    Path((tenant_id, staff_id, date)): Path<(String, String, String)>,
) -> Response {
    let correlation_id = Uuid::new_v4();
    let start_time = Instant::now();
    let result = async {
        let date = parse_date(&date)?;
        state
            .engine()
            .get_daily_incentive(&tenant_id, &staff_id, date)
            .await
    }
    .await
    .map(|daily| daily.rounded(state.decimal_places()));
    finish(correlation_id, start_time, "get_daily_incentive", result)
}

/// Handler for GET /tenants/:tenant_id/staff/:staff_id/incentives/monthly/:year_month.
async fn monthly_incentive_handler(
    State(state): State<AppState>,
    Path((tenant_id, staff_id, year_month)): Path<(String, String, String)>,
) -> Response {
    let correlation_id = Uuid::new_v4();
    let start_time = Instant::now();
    let result = async {
        let year_month = YearMonth::from_str(&year_month)?;
        state
            .engine()
            .get_monthly_incentive(&tenant_id, &staff_id, year_month)
            .await
    }
    .await
    .map(|monthly| monthly.rounded(state.decimal_places()));
    finish(correlation_id, start_time, "get_monthly_incentive", result)
}

/// Handler for PUT /tenants/:tenant_id/staff/:staff_id/reviews/:date.
async fn reviews_handler(
    State(state): State<AppState>,
    Path((tenant_id, staff_id, date)): Path<(String, String, String)>,
    payload: Result<Json<ReviewRequest>, JsonRejection>,
) -> Response {
    let correlation_id = Uuid::new_v4();
    let request = match parse_json(payload, correlation_id) {
        Ok(request) => request,
        Err(response) => return response,
    };

    let start_time = Instant::now();
    let result = async {
        let date = parse_date(&date)?;
        state
            .engine()
            .record_reviews(&tenant_id, &staff_id, date, request.into())
            .await
    }
    .await;
    finish(correlation_id, start_time, "record_reviews", result)
}

/// Handler for GET /tenants/:tenant_id/staff/:staff_id/daily-sales.
async fn daily_sales_handler(
    State(state): State<AppState>,
    Path((tenant_id, staff_id)): Path<(String, String)>,
) -> Response {
    let correlation_id = Uuid::new_v4();
    let start_time = Instant::now();
    let result = state.engine().list_daily_sales(&tenant_id, &staff_id).await;
    finish(correlation_id, start_time, "list_daily_sales", result)
}

fn parse_date(value: &str) -> EngineResult<NaiveDate> {
    NaiveDate::parse_from_str(value, "%Y-%m-%d").map_err(|e| {
        EngineError::validation("date", format!("expected YYYY-MM-DD, got '{}': {}", value, e))
    })
}

/// Extracts a JSON body, turning rejections into the API's error format.
fn parse_json<T>(
    payload: Result<Json<T>, JsonRejection>,
    correlation_id: Uuid,
) -> Result<T, Response> {
    let rejection = match payload {
        Ok(Json(body)) => return Ok(body),
        Err(rejection) => rejection,
    };

    let error = match rejection {
        JsonRejection::JsonDataError(err) => {
            // The body text carries serde's detailed message
            let body_text = err.body_text();
            warn!(
                correlation_id = %correlation_id,
                error = %body_text,
                "JSON data error"
            );
            if body_text.contains("missing field") {
                ApiError::validation_error(body_text)
            } else {
                ApiError::malformed_json(body_text)
            }
        }
        JsonRejection::JsonSyntaxError(err) => {
            warn!(
                correlation_id = %correlation_id,
                error = %err,
                "JSON syntax error"
            );
            ApiError::malformed_json(format!("Invalid JSON syntax: {}", err))
        }
        JsonRejection::MissingJsonContentType(_) => {
            ApiError::new("MISSING_CONTENT_TYPE", "Content-Type must be application/json")
        }
        _ => ApiError::malformed_json("Failed to parse request body"),
    };
    Err(json_response(StatusCode::BAD_REQUEST, error))
}

fn finish<T: Serialize>(
    correlation_id: Uuid,
    start_time: Instant,
    operation: &str,
    result: EngineResult<T>,
) -> Response {
    match result {
        Ok(body) => {
            info!(
                correlation_id = %correlation_id,
                operation = operation,
                duration_us = start_time.elapsed().as_micros(),
                "Request completed"
            );
            json_response(StatusCode::OK, body)
        }
        Err(err) => error_response(correlation_id, err),
    }
}

fn error_response(correlation_id: Uuid, err: EngineError) -> Response {
    warn!(
        correlation_id = %correlation_id,
        error = %err,
        retryable = err.is_retryable(),
        "Request failed"
    );
    let api_error: ApiErrorResponse = err.into();
    json_response(api_error.status, api_error.error)
}

fn json_response<T: Serialize>(status: StatusCode, body: T) -> Response {
    (
        status,
        [(header::CONTENT_TYPE, "application/json")],
        Json(body),
    )
        .into_response()
}
