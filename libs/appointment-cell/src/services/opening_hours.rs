use std::sync::Arc;

use tracing::debug;

use shared_utils::time::parse_minute_of_day;

use crate::models::{AppointmentError, WeeklySchedule};
use crate::services::store::AppointmentStore;

pub struct OpeningHoursService {
    store: Arc<dyn AppointmentStore>,
}

impl OpeningHoursService {
    pub fn new(store: Arc<dyn AppointmentStore>) -> Self {
        Self { store }
    }

    pub async fn get_opening_hours(&self, agent_id: &str) -> Result<WeeklySchedule, AppointmentError> {
        self.store
            .get_opening_hours(agent_id)
            .await?
            .ok_or_else(|| AppointmentError::NotConfigured(agent_id.to_string()))
    }

    /// Replaces the agent's weekly schedule. Windows may not be empty or inverted;
    /// overlapping windows on the same day are accepted as given.
    pub async fn set_opening_hours(
        &self,
        agent_id: &str,
        schedule: WeeklySchedule,
    ) -> Result<WeeklySchedule, AppointmentError> {
        debug!("Setting opening hours for agent {}", agent_id);
        validate_schedule(&schedule)?;
        self.store.save_opening_hours(agent_id, schedule).await
    }
}

pub fn validate_schedule(schedule: &WeeklySchedule) -> Result<(), AppointmentError> {
    for (day, windows) in schedule.iter() {
        for window in windows {
            let from = parse_minute_of_day(&window.from)?;
            let to = parse_minute_of_day(&window.to)?;
            if from >= to {
                return Err(AppointmentError::ValidationError(format!(
                    "Window {}-{} on {} must start before it ends",
                    window.from, window.to, day
                )));
            }
        }
    }
    Ok(())
}
