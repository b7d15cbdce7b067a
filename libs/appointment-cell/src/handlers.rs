// libs/appointment-cell/src/handlers.rs
use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    Json,
};
use axum_extra::extract::WithRejection;
use chrono::Utc;
use chrono_tz::Tz;
use serde::Deserialize;
use serde_json::{json, Value};

use shared_models::error::AppError;

use crate::models::{
    parse_timezone, AppointmentError, AppointmentKind, BookAppointmentRequest, WeeklySchedule,
};
use crate::services::{AvailabilityService, BookingService, OpeningHoursService};
use crate::state::AppState;

impl From<AppointmentError> for AppError {
    fn from(err: AppointmentError) -> Self {
        match err {
            AppointmentError::NotConfigured(_) => AppError::NotFound(err.to_string()),
            AppointmentError::ConflictDetected => {
                AppError::Conflict("Appointment slot no longer available".to_string())
            }
            AppointmentError::InvalidTimeFormat(_)
            | AppointmentError::UnknownAppointmentKind(_)
            | AppointmentError::InvalidTimezone(_) => AppError::BadRequest(err.to_string()),
            AppointmentError::ValidationError(msg) => AppError::ValidationError(msg),
            AppointmentError::DatabaseError(msg) => AppError::Database(msg),
        }
    }
}

// ==============================================================================
// QUERY PARAMETER STRUCTS
// ==============================================================================

#[derive(Debug, Deserialize)]
pub struct AvailabilityQuery {
    pub kind: String,
    pub timezone: Option<String>,
}

fn resolve_timezone(state: &AppState, requested: Option<&str>) -> Result<Tz, AppointmentError> {
    parse_timezone(requested.unwrap_or(&state.config.default_timezone))
}

// ==============================================================================
// OPENING HOURS
// ==============================================================================

#[axum::debug_handler]
pub async fn get_opening_hours(
    State(state): State<Arc<AppState>>,
    Path(agent_id): Path<String>,
) -> Result<Json<Value>, AppError> {
    let service = OpeningHoursService::new(state.store.clone());
    let schedule = service.get_opening_hours(&agent_id).await?;

    Ok(Json(json!({
        "agent_id": agent_id,
        "opening_hours": schedule
    })))
}

#[axum::debug_handler]
pub async fn set_opening_hours(
    State(state): State<Arc<AppState>>,
    Path(agent_id): Path<String>,
    WithRejection(Json(schedule), _): WithRejection<Json<WeeklySchedule>, AppError>,
) -> Result<Json<Value>, AppError> {
    let service = OpeningHoursService::new(state.store.clone());
    let schedule = service.set_opening_hours(&agent_id, schedule).await?;

    Ok(Json(json!({
        "agent_id": agent_id,
        "opening_hours": schedule
    })))
}

// ==============================================================================
// AVAILABILITY
// ==============================================================================

#[axum::debug_handler]
pub async fn get_availability(
    State(state): State<Arc<AppState>>,
    Path(agent_id): Path<String>,
    WithRejection(Query(query), _): WithRejection<Query<AvailabilityQuery>, AppError>,
) -> Result<Json<Value>, AppError> {
    let kind: AppointmentKind = query.kind.parse()?;
    let timezone = resolve_timezone(&state, query.timezone.as_deref())?;

    let service = AvailabilityService::new(state.store.clone(), state.rules);
    let availability = service
        .get_availability(&agent_id, kind, timezone, Utc::now())
        .await?;

    Ok(Json(json!({
        "agent_id": agent_id,
        "appointment_kind": availability.appointment_kind,
        "duration_minutes": availability.duration_minutes,
        "timezone": availability.timezone.name(),
        "total_slots": availability.total_slots(),
        "days": availability.days
    })))
}

// ==============================================================================
// APPOINTMENTS
// ==============================================================================

#[axum::debug_handler]
pub async fn book_appointment(
    State(state): State<Arc<AppState>>,
    Path(agent_id): Path<String>,
    WithRejection(Json(request), _): WithRejection<Json<BookAppointmentRequest>, AppError>,
) -> Result<Json<Value>, AppError> {
    let timezone = resolve_timezone(&state, request.timezone.as_deref())?;

    let service = BookingService::new(state.store.clone(), state.rules);
    let appointment = service.book(&agent_id, request, timezone, Utc::now()).await?;

    Ok(Json(json!({
        "success": true,
        "appointment": appointment
    })))
}

#[axum::debug_handler]
pub async fn list_appointments(
    State(state): State<Arc<AppState>>,
    Path(agent_id): Path<String>,
) -> Result<Json<Value>, AppError> {
    let service = BookingService::new(state.store.clone(), state.rules);
    let appointments = service.list_appointments(&agent_id).await?;

    Ok(Json(json!({
        "agent_id": agent_id,
        "total": appointments.len(),
        "appointments": appointments
    })))
}
