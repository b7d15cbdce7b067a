use std::sync::Arc;

use chrono::{DateTime, Datelike, Days, NaiveTime, Utc};
use chrono_tz::Tz;
use tracing::{debug, info, warn};
use uuid::Uuid;

use shared_utils::time::{format_minute_of_day, parse_minute_of_day, MINUTES_PER_DAY};

use crate::models::{Appointment, AppointmentError, BookAppointmentRequest, SchedulingRules};
use crate::services::availability::{earliest_bookable, MinuteSpan, ParsedSchedule};
use crate::services::store::AppointmentStore;

pub struct BookingService {
    store: Arc<dyn AppointmentStore>,
    rules: SchedulingRules,
}

impl BookingService {
    pub fn new(store: Arc<dyn AppointmentStore>, rules: SchedulingRules) -> Self {
        Self { store, rules }
    }

    /// Books a slot the availability calculator would offer at `now`.
    ///
    /// Availability may be stale by the time the client books, so the store
    /// re-checks overlap at write time and answers `ConflictDetected` when the
    /// slot was taken in between.
    pub async fn book(
        &self,
        agent_id: &str,
        request: BookAppointmentRequest,
        timezone: Tz,
        now: DateTime<Utc>,
    ) -> Result<Appointment, AppointmentError> {
        let kind = request.details.kind();
        debug!("Booking {} for agent {} on {} at {}", kind, agent_id, request.date, request.from);

        let start = parse_minute_of_day(&request.from)?;
        let end = start + kind.duration_minutes();
        if end > MINUTES_PER_DAY {
            return Err(AppointmentError::ValidationError(
                "Appointment must end on the day it starts".to_string(),
            ));
        }
        let proposed = MinuteSpan { start, end };

        let schedule = self
            .store
            .get_opening_hours(agent_id)
            .await?
            .ok_or_else(|| AppointmentError::NotConfigured(agent_id.to_string()))?;
        let parsed = ParsedSchedule::parse(&schedule)?;

        let granularity = self.rules.granularity_minutes.max(1);
        let offered = parsed
            .windows(request.date.weekday())
            .iter()
            .any(|window| window.contains(&proposed) && (start - window.start) % granularity == 0);
        if !offered {
            return Err(AppointmentError::ValidationError(format!(
                "{} on {} is outside opening hours",
                request.from, request.date
            )));
        }

        let earliest = earliest_bookable(now, timezone, &self.rules);
        let starts_at = NaiveTime::from_num_seconds_from_midnight_opt(start * 60, 0)
            .map(|time| request.date.and_time(time))
            .ok_or_else(|| AppointmentError::InvalidTimeFormat(request.from.clone()))?;
        if starts_at < earliest {
            return Err(AppointmentError::ValidationError(format!(
                "Appointments must be booked at least {} minutes in advance",
                self.rules.lead_time_minutes
            )));
        }

        let last_day = earliest.date() + Days::new(u64::from(self.rules.booking_window_days));
        if request.date >= last_day {
            return Err(AppointmentError::ValidationError(format!(
                "Appointments can be booked at most {} days ahead",
                self.rules.booking_window_days
            )));
        }

        let appointment = Appointment {
            id: Uuid::new_v4(),
            agent_id: agent_id.to_string(),
            date: request.date,
            from: format_minute_of_day(start),
            to: format_minute_of_day(end),
            client_name: request.client_name,
            client_email: request.client_email,
            message: request.message,
            details: request.details,
            created_at: now,
        };

        match self.store.book_if_free(appointment).await {
            Ok(appointment) => {
                info!("Booked appointment {} for agent {}", appointment.id, agent_id);
                Ok(appointment)
            }
            Err(AppointmentError::ConflictDetected) => {
                warn!("Slot {} {} for agent {} was taken", request.date, request.from, agent_id);
                Err(AppointmentError::ConflictDetected)
            }
            Err(e) => Err(e),
        }
    }

    pub async fn list_appointments(&self, agent_id: &str) -> Result<Vec<Appointment>, AppointmentError> {
        self.store.list_appointments(agent_id).await
    }
}
