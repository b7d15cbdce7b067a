use std::collections::HashMap;

use async_trait::async_trait;
use chrono::NaiveDate;
use tokio::sync::RwLock;
use tracing::{debug, warn};

use crate::models::{Appointment, AppointmentError, BookedInterval, WeeklySchedule};
use crate::services::availability::find_conflict;

/// Data-access handle injected into the services.
#[async_trait]
pub trait AppointmentStore: Send + Sync {
    /// `None` means the agent never configured opening hours.
    async fn get_opening_hours(&self, agent_id: &str) -> Result<Option<WeeklySchedule>, AppointmentError>;

    async fn save_opening_hours(
        &self,
        agent_id: &str,
        schedule: WeeklySchedule,
    ) -> Result<WeeklySchedule, AppointmentError>;

    /// Intervals booked on dates in `[from, until)`.
    async fn get_booked_intervals(
        &self,
        agent_id: &str,
        from: NaiveDate,
        until: NaiveDate,
    ) -> Result<Vec<BookedInterval>, AppointmentError>;

    async fn list_appointments(&self, agent_id: &str) -> Result<Vec<Appointment>, AppointmentError>;

    /// Persists the appointment unless it overlaps one already stored for the
    /// same agent and date, in which case `ConflictDetected` is returned.
    async fn book_if_free(&self, appointment: Appointment) -> Result<Appointment, AppointmentError>;
}

#[derive(Default)]
struct AgentRecords {
    opening_hours: Option<WeeklySchedule>,
    appointments: Vec<Appointment>,
}

/// Process-local store. The overlap check and the insert happen under one
/// write lock, so concurrent bookings of the same slot cannot both succeed.
#[derive(Default)]
pub struct InMemoryAppointmentStore {
    agents: RwLock<HashMap<String, AgentRecords>>,
}

impl InMemoryAppointmentStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl AppointmentStore for InMemoryAppointmentStore {
    async fn get_opening_hours(&self, agent_id: &str) -> Result<Option<WeeklySchedule>, AppointmentError> {
        let agents = self.agents.read().await;
        Ok(agents.get(agent_id).and_then(|records| records.opening_hours.clone()))
    }

    async fn save_opening_hours(
        &self,
        agent_id: &str,
        schedule: WeeklySchedule,
    ) -> Result<WeeklySchedule, AppointmentError> {
        let mut agents = self.agents.write().await;
        agents.entry(agent_id.to_string()).or_default().opening_hours = Some(schedule.clone());
        Ok(schedule)
    }

    async fn get_booked_intervals(
        &self,
        agent_id: &str,
        from: NaiveDate,
        until: NaiveDate,
    ) -> Result<Vec<BookedInterval>, AppointmentError> {
        let agents = self.agents.read().await;
        let booked: Vec<BookedInterval> = agents
            .get(agent_id)
            .map(|records| {
                records
                    .appointments
                    .iter()
                    .filter(|apt| apt.date >= from && apt.date < until)
                    .map(Appointment::booked_interval)
                    .collect()
            })
            .unwrap_or_default();
        Ok(booked)
    }

    async fn list_appointments(&self, agent_id: &str) -> Result<Vec<Appointment>, AppointmentError> {
        let agents = self.agents.read().await;
        let mut appointments = agents
            .get(agent_id)
            .map(|records| records.appointments.clone())
            .unwrap_or_default();
        appointments.sort_by(|a, b| (a.date, &a.from).cmp(&(b.date, &b.from)));
        Ok(appointments)
    }

    async fn book_if_free(&self, appointment: Appointment) -> Result<Appointment, AppointmentError> {
        let mut agents = self.agents.write().await;
        let records = agents.entry(appointment.agent_id.clone()).or_default();

        let existing: Vec<BookedInterval> = records
            .appointments
            .iter()
            .filter(|apt| apt.date == appointment.date)
            .map(Appointment::booked_interval)
            .collect();

        if let Some(taken) = find_conflict(&appointment.booked_interval(), &existing)? {
            warn!(
                "Slot {} {}-{} for agent {} overlaps booking {}-{}",
                appointment.date, appointment.from, appointment.to, appointment.agent_id, taken.from, taken.to
            );
            return Err(AppointmentError::ConflictDetected);
        }

        debug!("Stored appointment {} for agent {}", appointment.id, appointment.agent_id);
        records.appointments.push(appointment.clone());
        Ok(appointment)
    }
}
