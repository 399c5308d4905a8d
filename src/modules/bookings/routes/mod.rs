//! HTTP handlers for availability and booking lifecycle endpoints.

use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, Path, Query, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use lodge_http::error::AppError;
use serde::Deserialize;

use super::error::BookingError;
use super::models::{Availability, BookingRecord, BookingRequest};
use super::service::BookingService;

type Service = State<Arc<BookingService>>;

pub fn router(service: Arc<BookingService>) -> Router {
    Router::new()
        .route("/dates", get(get_availability).delete(delete_dates))
        .route("/bookings", post(create_booking))
        .route(
            "/bookings/{id}",
            get(get_booking).put(update_booking).delete(delete_booking),
        )
        .with_state(service)
}

#[derive(Debug, Deserialize)]
struct AvailabilityQuery {
    from: Option<String>,
    to: Option<String>,
}

async fn get_availability(
    State(service): Service,
    Query(query): Query<AvailabilityQuery>,
) -> Result<Json<Availability>, AppError> {
    service
        .availability(query.from.as_deref(), query.to.as_deref())
        .await
        .map(Json)
        .map_err(|err| match err {
            BookingError::Storage(source) => AppError::Internal(source.into()),
            other => other.into(),
        })
}

async fn create_booking(
    State(service): Service,
    body: Result<Json<BookingRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<BookingRecord>), AppError> {
    let Json(request) = body.map_err(bad_body)?;
    let record = service.create(&request).await?;
    Ok((StatusCode::CREATED, Json(record)))
}

async fn get_booking(
    State(service): Service,
    Path(id): Path<String>,
) -> Result<Json<BookingRecord>, AppError> {
    Ok(Json(service.get(parse_id(&id)?).await?))
}

async fn update_booking(
    State(service): Service,
    Path(id): Path<String>,
    body: Result<Json<BookingRequest>, JsonRejection>,
) -> Result<Json<BookingRecord>, AppError> {
    let id = parse_id(&id)?;
    let Json(request) = body.map_err(bad_body)?;
    Ok(Json(service.update(id, &request).await?))
}

async fn delete_booking(
    State(service): Service,
    Path(id): Path<String>,
) -> Result<StatusCode, AppError> {
    service.delete(parse_id(&id)?).await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn delete_dates(State(service): Service) -> Result<StatusCode, AppError> {
    service.delete_all_dates().await?;
    Ok(StatusCode::OK)
}

fn parse_id(raw: &str) -> Result<i64, BookingError> {
    raw.parse().map_err(|_| BookingError::Parse {
        field: "id",
        value: raw.to_string(),
    })
}

/// Malformed bodies are bad requests, whatever the extractor would have answered.
fn bad_body(rejection: JsonRejection) -> AppError {
    AppError::bad_request_with_code("bad_parameters", rejection.body_text())
}
