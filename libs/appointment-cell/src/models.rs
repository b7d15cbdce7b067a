// libs/appointment-cell/src/models.rs
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Duration, NaiveDate, Utc, Weekday};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use shared_utils::time::TimeOfDayError;

// ==============================================================================
// OPENING HOURS
// ==============================================================================

/// One contiguous span of opening hours, as local wall-clock strings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeWindow {
    pub from: String,
    pub to: String,
}

impl TimeWindow {
    pub fn new(from: impl Into<String>, to: impl Into<String>) -> Self {
        Self {
            from: from.into(),
            to: to.into(),
        }
    }
}

/// Recurring weekly opening hours. A weekday with no windows is closed.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WeeklySchedule {
    #[serde(default)]
    pub monday: Vec<TimeWindow>,
    #[serde(default)]
    pub tuesday: Vec<TimeWindow>,
    #[serde(default)]
    pub wednesday: Vec<TimeWindow>,
    #[serde(default)]
    pub thursday: Vec<TimeWindow>,
    #[serde(default)]
    pub friday: Vec<TimeWindow>,
    #[serde(default)]
    pub saturday: Vec<TimeWindow>,
    #[serde(default)]
    pub sunday: Vec<TimeWindow>,
}

impl WeeklySchedule {
    pub fn windows_for(&self, day: Weekday) -> &[TimeWindow] {
        match day {
            Weekday::Mon => &self.monday,
            Weekday::Tue => &self.tuesday,
            Weekday::Wed => &self.wednesday,
            Weekday::Thu => &self.thursday,
            Weekday::Fri => &self.friday,
            Weekday::Sat => &self.saturday,
            Weekday::Sun => &self.sunday,
        }
    }

    pub fn windows_for_mut(&mut self, day: Weekday) -> &mut Vec<TimeWindow> {
        match day {
            Weekday::Mon => &mut self.monday,
            Weekday::Tue => &mut self.tuesday,
            Weekday::Wed => &mut self.wednesday,
            Weekday::Thu => &mut self.thursday,
            Weekday::Fri => &mut self.friday,
            Weekday::Sat => &mut self.saturday,
            Weekday::Sun => &mut self.sunday,
        }
    }

    /// Builder-style helper used when assembling schedules in code.
    pub fn with_window(mut self, day: Weekday, from: &str, to: &str) -> Self {
        self.windows_for_mut(day).push(TimeWindow::new(from, to));
        self
    }

    pub fn iter(&self) -> impl Iterator<Item = (Weekday, &[TimeWindow])> + '_ {
        [
            Weekday::Mon,
            Weekday::Tue,
            Weekday::Wed,
            Weekday::Thu,
            Weekday::Fri,
            Weekday::Sat,
            Weekday::Sun,
        ]
        .into_iter()
        .map(move |day| (day, self.windows_for(day)))
    }
}

/// A committed appointment's span on a specific local date.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BookedInterval {
    pub date: NaiveDate,
    pub from: String,
    pub to: String,
}

// ==============================================================================
// APPOINTMENT KINDS
// ==============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AppointmentKind {
    #[serde(alias = "phone_call", alias = "call")]
    ShortCall,

    #[serde(alias = "house_touring", alias = "visit")]
    LongVisit,
}

impl AppointmentKind {
    pub fn duration_minutes(&self) -> u32 {
        match self {
            AppointmentKind::ShortCall => 30,
            AppointmentKind::LongVisit => 45,
        }
    }
}

impl fmt::Display for AppointmentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppointmentKind::ShortCall => write!(f, "short_call"),
            AppointmentKind::LongVisit => write!(f, "long_visit"),
        }
    }
}

impl FromStr for AppointmentKind {
    type Err = AppointmentError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "short_call" | "phone_call" | "call" => Ok(AppointmentKind::ShortCall),
            "long_visit" | "house_touring" | "visit" => Ok(AppointmentKind::LongVisit),
            _ => Err(AppointmentError::UnknownAppointmentKind(s.to_string())),
        }
    }
}

/// Per-kind booking data. Each variant carries exactly the fields its kind needs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum AppointmentDetails {
    PhoneCall { phone: String },
    HouseTouring { property_id: String },
}

impl AppointmentDetails {
    pub fn kind(&self) -> AppointmentKind {
        match self {
            AppointmentDetails::PhoneCall { .. } => AppointmentKind::ShortCall,
            AppointmentDetails::HouseTouring { .. } => AppointmentKind::LongVisit,
        }
    }
}

// ==============================================================================
// AVAILABILITY
// ==============================================================================

#[derive(Debug, Clone)]
pub struct AvailabilityRequest {
    pub appointment_kind: AppointmentKind,
    pub timezone: Tz,
    pub now: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DaySlots {
    pub date: NaiveDate,
    pub slots: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AvailabilityResult {
    pub appointment_kind: AppointmentKind,
    pub duration_minutes: u32,
    pub timezone: Tz,
    pub days: Vec<DaySlots>,
}

impl AvailabilityResult {
    pub fn day(&self, date: NaiveDate) -> Option<&DaySlots> {
        self.days.iter().find(|day| day.date == date)
    }

    pub fn total_slots(&self) -> usize {
        self.days.iter().map(|day| day.slots.len()).sum()
    }
}

/// Fixed booking policy. Durations come from [`AppointmentKind`], not from here.
#[derive(Debug, Clone, Copy)]
pub struct SchedulingRules {
    pub lead_time_minutes: u32,
    pub booking_window_days: u32,
    pub granularity_minutes: u32,
}

impl Default for SchedulingRules {
    fn default() -> Self {
        Self {
            lead_time_minutes: 60,
            booking_window_days: 30,
            granularity_minutes: 15,
        }
    }
}

impl SchedulingRules {
    pub fn lead_time(&self) -> Duration {
        Duration::minutes(i64::from(self.lead_time_minutes))
    }
}

// ==============================================================================
// APPOINTMENTS
// ==============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Appointment {
    pub id: Uuid,
    pub agent_id: String,
    pub date: NaiveDate,
    pub from: String,
    pub to: String,
    pub client_name: String,
    pub client_email: String,
    pub message: Option<String>,
    pub details: AppointmentDetails,
    pub created_at: DateTime<Utc>,
}

impl Appointment {
    pub fn kind(&self) -> AppointmentKind {
        self.details.kind()
    }

    pub fn booked_interval(&self) -> BookedInterval {
        BookedInterval {
            date: self.date,
            from: self.from.clone(),
            to: self.to.clone(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct BookAppointmentRequest {
    pub date: NaiveDate,
    pub from: String,
    pub client_name: String,
    pub client_email: String,
    pub message: Option<String>,
    pub details: AppointmentDetails,
    pub timezone: Option<String>,
}

// ==============================================================================
// ERROR TYPES
// ==============================================================================

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AppointmentError {
    #[error("Invalid time format: {0}")]
    InvalidTimeFormat(String),

    #[error("Unknown appointment kind: {0}")]
    UnknownAppointmentKind(String),

    #[error("Unknown timezone: {0}")]
    InvalidTimezone(String),

    #[error("Opening hours not configured for agent {0}")]
    NotConfigured(String),

    #[error("Appointment conflicts with existing booking")]
    ConflictDetected,

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Database error: {0}")]
    DatabaseError(String),
}

impl From<TimeOfDayError> for AppointmentError {
    fn from(err: TimeOfDayError) -> Self {
        AppointmentError::InvalidTimeFormat(err.0)
    }
}

pub fn parse_timezone(raw: &str) -> Result<Tz, AppointmentError> {
    raw.trim()
        .parse::<Tz>()
        .map_err(|_| AppointmentError::InvalidTimezone(raw.to_string()))
}
