use std::sync::Arc;

use tracing::{info, warn};

use shared_config::AppConfig;

use crate::models::SchedulingRules;
use crate::services::{AppointmentStore, InMemoryAppointmentStore, SupabaseAppointmentStore};

/// Request-scoped handlers share this through `State<Arc<AppState>>`.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub store: Arc<dyn AppointmentStore>,
    pub rules: SchedulingRules,
}

impl AppState {
    pub fn new(config: AppConfig, store: Arc<dyn AppointmentStore>) -> Self {
        Self {
            config: Arc::new(config),
            store,
            rules: SchedulingRules::default(),
        }
    }

    /// Picks the Supabase store when credentials are present, memory otherwise.
    pub fn from_config(config: AppConfig) -> Self {
        let store: Arc<dyn AppointmentStore> = if config.is_configured() {
            info!("Using Supabase appointment store at {}", config.supabase_url);
            Arc::new(SupabaseAppointmentStore::new(&config))
        } else {
            warn!("Using in-memory appointment store; data is lost on restart");
            Arc::new(InMemoryAppointmentStore::new())
        };
        Self::new(config, store)
    }
}
