//! HTTP handler functions for the crime portal API.

use actix_web::{HttpResponse, web};
use crime_portal_facade::{Portal, PortalError};
use crime_portal_report_models::NewCrimeReport;
use crime_portal_server_models::{
    ApiError, ApiHealth, ApiMessage, PredictRequest, PredictionQueryParams, ReportQueryParams,
    SubmitReportRequest,
};

use crate::AppState;

/// Maps a portal failure onto a status code and `{ "error": ... }` body.
fn error_response(e: &PortalError) -> HttpResponse {
    match e {
        PortalError::Validation(_) => HttpResponse::UnprocessableEntity().json(ApiError::new(e)),
        PortalError::NotFound { .. } => HttpResponse::NotFound().json(ApiError::new(e)),
        PortalError::StorageUnavailable(_) | PortalError::ForecasterUnavailable(_) => {
            log::error!("Request failed: {e}");
            HttpResponse::ServiceUnavailable().json(ApiError::new(e))
        }
    }
}

/// `GET /api/`
pub async fn root() -> HttpResponse {
    HttpResponse::Ok().json(ApiMessage {
        message: "Crime Reporting and Prediction Portal API".to_string(),
    })
}

/// `GET /api/health`
pub async fn health() -> HttpResponse {
    HttpResponse::Ok().json(ApiHealth {
        healthy: true,
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

/// `GET /api/crime-types`
///
/// Returns the fixed crime type labels, in display order.
pub async fn crime_types() -> HttpResponse {
    let labels: Vec<String> = Portal::crime_types()
        .iter()
        .map(ToString::to_string)
        .collect();
    HttpResponse::Ok().json(labels)
}

/// `POST /api/reports`
pub async fn submit_report(
    state: web::Data<AppState>,
    body: web::Json<SubmitReportRequest>,
) -> HttpResponse {
    let input = NewCrimeReport::from(body.into_inner());

    match state.portal.submit_report(&input).await {
        Ok(report) => HttpResponse::Ok().json(report),
        Err(e) => error_response(&e),
    }
}

/// `GET /api/reports`
///
/// Lists reports newest-first, optionally filtered by area substring and
/// crime type.
pub async fn list_reports(
    state: web::Data<AppState>,
    params: web::Query<ReportQueryParams>,
) -> HttpResponse {
    let (limit, filter) = match (params.limit(), params.filter()) {
        (Ok(limit), Ok(filter)) => (limit, filter),
        (Err(e), _) | (_, Err(e)) => return error_response(&PortalError::from(e)),
    };

    match state.portal.list_reports(limit, &filter).await {
        Ok(reports) => HttpResponse::Ok().json(reports),
        Err(e) => error_response(&e),
    }
}

/// `GET /api/reports/{id}`
pub async fn get_report(state: web::Data<AppState>, path: web::Path<String>) -> HttpResponse {
    match state.portal.get_report(&path).await {
        Ok(report) => HttpResponse::Ok().json(report),
        Err(e) => error_response(&e),
    }
}

/// `GET /api/stats`
pub async fn stats(state: web::Data<AppState>) -> HttpResponse {
    HttpResponse::Ok().json(state.portal.stats().await)
}

/// `POST /api/predict`
pub async fn predict(
    state: web::Data<AppState>,
    body: web::Json<PredictRequest>,
) -> HttpResponse {
    match state.portal.generate_prediction(body.area.as_deref()).await {
        Ok(prediction) => HttpResponse::Ok().json(prediction),
        Err(e) => error_response(&e),
    }
}

/// `GET /api/predictions`
pub async fn list_predictions(
    state: web::Data<AppState>,
    params: web::Query<PredictionQueryParams>,
) -> HttpResponse {
    let limit = match params.limit() {
        Ok(limit) => limit,
        Err(e) => return error_response(&PortalError::from(e)),
    };

    match state
        .portal
        .list_predictions(limit, params.area.as_deref())
        .await
    {
        Ok(predictions) => HttpResponse::Ok().json(predictions),
        Err(e) => error_response(&e),
    }
}
