use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use reqwest::Method;
use serde::Deserialize;
use serde_json::json;
use tracing::{debug, warn};
use uuid::Uuid;

use shared_config::AppConfig;
use shared_database::{SupabaseClient, SupabaseError};

use crate::models::{Appointment, AppointmentDetails, AppointmentError, BookedInterval, WeeklySchedule};
use crate::services::availability::find_conflict;
use crate::services::store::AppointmentStore;

#[derive(Debug, Deserialize)]
struct OpeningHoursRow {
    schedule: WeeklySchedule,
}

#[derive(Debug, Deserialize)]
struct BookedRow {
    date: NaiveDate,
    start_time: String,
    end_time: String,
}

impl From<BookedRow> for BookedInterval {
    fn from(row: BookedRow) -> Self {
        BookedInterval {
            date: row.date,
            from: row.start_time,
            to: row.end_time,
        }
    }
}

#[derive(Debug, Deserialize)]
struct AppointmentRow {
    id: Uuid,
    agent_id: String,
    date: NaiveDate,
    start_time: String,
    end_time: String,
    client_name: String,
    client_email: String,
    message: Option<String>,
    details: AppointmentDetails,
    created_at: DateTime<Utc>,
}

impl From<AppointmentRow> for Appointment {
    fn from(row: AppointmentRow) -> Self {
        Appointment {
            id: row.id,
            agent_id: row.agent_id,
            date: row.date,
            from: row.start_time,
            to: row.end_time,
            client_name: row.client_name,
            client_email: row.client_email,
            message: row.message,
            details: row.details,
            created_at: row.created_at,
        }
    }
}

fn database_error(err: SupabaseError) -> AppointmentError {
    if err.is_conflict() {
        AppointmentError::ConflictDetected
    } else {
        AppointmentError::DatabaseError(err.to_string())
    }
}

/// Store backed by the `opening_hours` and `appointments` tables over PostgREST.
///
/// The overlap check in `book_if_free` is a read followed by a write. An
/// exclusion constraint on `appointments` closes the remaining race; the 409
/// it produces is reported as `ConflictDetected`.
pub struct SupabaseAppointmentStore {
    supabase: SupabaseClient,
}

impl SupabaseAppointmentStore {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            supabase: SupabaseClient::new(config),
        }
    }

    async fn booked_on(&self, agent_id: &str, date: NaiveDate) -> Result<Vec<BookedInterval>, AppointmentError> {
        let path = format!(
            "/rest/v1/appointments?agent_id=eq.{}&date=eq.{}&select=date,start_time,end_time",
            urlencoding::encode(agent_id),
            date
        );
        let rows: Vec<BookedRow> = self
            .supabase
            .request(Method::GET, &path, None)
            .await
            .map_err(database_error)?;
        Ok(rows.into_iter().map(BookedInterval::from).collect())
    }
}

#[async_trait]
impl AppointmentStore for SupabaseAppointmentStore {
    async fn get_opening_hours(&self, agent_id: &str) -> Result<Option<WeeklySchedule>, AppointmentError> {
        debug!("Fetching opening hours for agent {}", agent_id);

        let path = format!(
            "/rest/v1/opening_hours?agent_id=eq.{}&select=schedule",
            urlencoding::encode(agent_id)
        );
        let rows: Vec<OpeningHoursRow> = self
            .supabase
            .request(Method::GET, &path, None)
            .await
            .map_err(database_error)?;

        Ok(rows.into_iter().next().map(|row| row.schedule))
    }

    async fn save_opening_hours(
        &self,
        agent_id: &str,
        schedule: WeeklySchedule,
    ) -> Result<WeeklySchedule, AppointmentError> {
        debug!("Saving opening hours for agent {}", agent_id);

        let body = json!({
            "agent_id": agent_id,
            "schedule": schedule,
            "updated_at": Utc::now().to_rfc3339(),
        });

        let rows: Vec<OpeningHoursRow> = self
            .supabase
            .request_with_headers(
                Method::POST,
                "/rest/v1/opening_hours?on_conflict=agent_id",
                Some(body),
                Some(SupabaseClient::merge_duplicates()),
            )
            .await
            .map_err(database_error)?;

        rows.into_iter()
            .next()
            .map(|row| row.schedule)
            .ok_or_else(|| AppointmentError::DatabaseError("Failed to save opening hours".to_string()))
    }

    async fn get_booked_intervals(
        &self,
        agent_id: &str,
        from: NaiveDate,
        until: NaiveDate,
    ) -> Result<Vec<BookedInterval>, AppointmentError> {
        let path = format!(
            "/rest/v1/appointments?agent_id=eq.{}&date=gte.{}&date=lt.{}&select=date,start_time,end_time&order=date.asc,start_time.asc",
            urlencoding::encode(agent_id),
            from,
            until
        );

        let rows: Vec<BookedRow> = self
            .supabase
            .request(Method::GET, &path, None)
            .await
            .map_err(database_error)?;

        Ok(rows.into_iter().map(BookedInterval::from).collect())
    }

    async fn list_appointments(&self, agent_id: &str) -> Result<Vec<Appointment>, AppointmentError> {
        let path = format!(
            "/rest/v1/appointments?agent_id=eq.{}&order=date.asc,start_time.asc",
            urlencoding::encode(agent_id)
        );

        let rows: Vec<AppointmentRow> = self
            .supabase
            .request(Method::GET, &path, None)
            .await
            .map_err(database_error)?;

        Ok(rows.into_iter().map(Appointment::from).collect())
    }

    async fn book_if_free(&self, appointment: Appointment) -> Result<Appointment, AppointmentError> {
        let existing = self.booked_on(&appointment.agent_id, appointment.date).await?;
        if let Some(taken) = find_conflict(&appointment.booked_interval(), &existing)? {
            warn!(
                "Slot {} {}-{} for agent {} overlaps booking {}-{}",
                appointment.date, appointment.from, appointment.to, appointment.agent_id, taken.from, taken.to
            );
            return Err(AppointmentError::ConflictDetected);
        }

        let body = json!({
            "id": appointment.id,
            "agent_id": appointment.agent_id,
            "date": appointment.date,
            "start_time": appointment.from,
            "end_time": appointment.to,
            "client_name": appointment.client_name,
            "client_email": appointment.client_email,
            "message": appointment.message,
            "details": appointment.details,
            "created_at": appointment.created_at.to_rfc3339(),
        });

        let rows: Vec<AppointmentRow> = self
            .supabase
            .request_with_headers(
                Method::POST,
                "/rest/v1/appointments",
                Some(body),
                Some(SupabaseClient::return_representation()),
            )
            .await
            .map_err(database_error)?;

        rows.into_iter()
            .next()
            .map(Appointment::from)
            .ok_or_else(|| AppointmentError::DatabaseError("Failed to create appointment".to_string()))
    }
}
