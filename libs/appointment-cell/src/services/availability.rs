use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::{DateTime, Datelike, NaiveDate, NaiveDateTime, Timelike, Utc, Weekday};
use chrono_tz::Tz;
use tracing::{debug, warn};

use shared_utils::time::{format_minute_of_day, parse_minute_of_day};

use crate::models::{
    AppointmentError, AppointmentKind, AvailabilityRequest, AvailabilityResult, BookedInterval,
    DaySlots, SchedulingRules, WeeklySchedule,
};
use crate::services::store::AppointmentStore;

/// Half-open `[start, end)` span in minutes since local midnight.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MinuteSpan {
    pub start: u32,
    pub end: u32,
}

impl MinuteSpan {
    pub fn parse(from: &str, to: &str) -> Result<Self, AppointmentError> {
        Ok(Self {
            start: parse_minute_of_day(from)?,
            end: parse_minute_of_day(to)?,
        })
    }

    pub fn overlaps(&self, other: &MinuteSpan) -> bool {
        self.start < other.end && other.start < self.end
    }

    pub fn contains(&self, other: &MinuteSpan) -> bool {
        self.start <= other.start && other.end <= self.end
    }
}

/// Opening hours with every window parsed, indexed by weekday.
#[derive(Debug, Clone, Default)]
pub(crate) struct ParsedSchedule {
    days: [Vec<MinuteSpan>; 7],
}

impl ParsedSchedule {
    pub(crate) fn parse(schedule: &WeeklySchedule) -> Result<Self, AppointmentError> {
        let mut parsed = Self::default();

        for (day, windows) in schedule.iter() {
            let slot = &mut parsed.days[day.num_days_from_monday() as usize];
            for window in windows {
                let span = MinuteSpan::parse(&window.from, &window.to)?;
                if span.start >= span.end {
                    warn!("Ignoring empty opening window {}-{} on {}", window.from, window.to, day);
                    continue;
                }
                slot.push(span);
            }
        }

        Ok(parsed)
    }

    pub(crate) fn windows(&self, day: Weekday) -> &[MinuteSpan] {
        &self.days[day.num_days_from_monday() as usize]
    }
}

/// Start of the booking window: the local date of `now + lead_time`.
pub fn earliest_bookable(now: DateTime<Utc>, timezone: Tz, rules: &SchedulingRules) -> NaiveDateTime {
    (now + rules.lead_time()).with_timezone(&timezone).naive_local()
}

/// Returns the first stored interval on the same date that overlaps `candidate`.
pub fn find_conflict<'a>(
    candidate: &BookedInterval,
    existing: &'a [BookedInterval],
) -> Result<Option<&'a BookedInterval>, AppointmentError> {
    let span = MinuteSpan::parse(&candidate.from, &candidate.to)?;

    for booked in existing.iter().filter(|booked| booked.date == candidate.date) {
        if span.overlaps(&MinuteSpan::parse(&booked.from, &booked.to)?) {
            return Ok(Some(booked));
        }
    }

    Ok(None)
}

/// Free start times per day over the booking window, using the default rules.
pub fn compute_availability(
    schedule: &WeeklySchedule,
    booked: &[BookedInterval],
    request: &AvailabilityRequest,
) -> Result<AvailabilityResult, AppointmentError> {
    compute_availability_with_rules(schedule, booked, request, &SchedulingRules::default())
}

/// All arithmetic happens in wall-clock minutes of `request.timezone`, for
/// both opening hours and booked intervals. Candidates are sampled every
/// `granularity_minutes` regardless of duration, so neighbouring offers may
/// overlap each other.
pub fn compute_availability_with_rules(
    schedule: &WeeklySchedule,
    booked: &[BookedInterval],
    request: &AvailabilityRequest,
    rules: &SchedulingRules,
) -> Result<AvailabilityResult, AppointmentError> {
    let duration = request.appointment_kind.duration_minutes();
    let granularity = rules.granularity_minutes.max(1);

    let earliest = earliest_bookable(request.now, request.timezone, rules);
    let window_start = earliest.date();
    // ceil to the minute: a slot must not start before the lead time has elapsed
    let earliest_minute = (earliest.time().num_seconds_from_midnight() + 59) / 60;

    let parsed = ParsedSchedule::parse(schedule)?;
    let busy = busy_by_date(booked, window_start, rules.booking_window_days)?;

    debug!(
        "Computing {} availability from {} ({}) over {} days",
        request.appointment_kind, window_start, request.timezone, rules.booking_window_days
    );

    let days = window_start
        .iter_days()
        .take(rules.booking_window_days as usize)
        .map(|date| {
            let busy_today = busy.get(&date).map(Vec::as_slice).unwrap_or(&[]);
            let not_before = if date == window_start { earliest_minute } else { 0 };

            let mut slots = Vec::new();
            for window in parsed.windows(date.weekday()) {
                let mut start = window.start;
                while start + duration <= window.end {
                    let proposed = MinuteSpan { start, end: start + duration };
                    if start >= not_before && !busy_today.iter().any(|b| b.overlaps(&proposed)) {
                        slots.push(format_minute_of_day(start));
                    }
                    start += granularity;
                }
            }

            DaySlots { date, slots }
        })
        .collect();

    Ok(AvailabilityResult {
        appointment_kind: request.appointment_kind,
        duration_minutes: duration,
        timezone: request.timezone,
        days,
    })
}

/// Parses bookings inside the window; anything outside it cannot affect a slot.
fn busy_by_date(
    booked: &[BookedInterval],
    window_start: NaiveDate,
    window_days: u32,
) -> Result<BTreeMap<NaiveDate, Vec<MinuteSpan>>, AppointmentError> {
    let mut busy: BTreeMap<NaiveDate, Vec<MinuteSpan>> = BTreeMap::new();

    for interval in booked {
        let offset = (interval.date - window_start).num_days();
        if offset < 0 || offset >= i64::from(window_days) {
            continue;
        }
        busy.entry(interval.date)
            .or_default()
            .push(MinuteSpan::parse(&interval.from, &interval.to)?);
    }

    Ok(busy)
}

pub struct AvailabilityService {
    store: Arc<dyn AppointmentStore>,
    rules: SchedulingRules,
}

impl AvailabilityService {
    pub fn new(store: Arc<dyn AppointmentStore>, rules: SchedulingRules) -> Self {
        Self { store, rules }
    }

    /// Loads schedule and bookings for the agent and computes free slots.
    pub async fn get_availability(
        &self,
        agent_id: &str,
        appointment_kind: AppointmentKind,
        timezone: Tz,
        now: DateTime<Utc>,
    ) -> Result<AvailabilityResult, AppointmentError> {
        debug!("Fetching availability for agent {}", agent_id);

        let schedule = self
            .store
            .get_opening_hours(agent_id)
            .await?
            .ok_or_else(|| AppointmentError::NotConfigured(agent_id.to_string()))?;

        let window_start = earliest_bookable(now, timezone, &self.rules).date();
        let window_end = window_start + chrono::Days::new(u64::from(self.rules.booking_window_days));
        let booked = self
            .store
            .get_booked_intervals(agent_id, window_start, window_end)
            .await?;

        let request = AvailabilityRequest {
            appointment_kind,
            timezone,
            now,
        };

        compute_availability_with_rules(&schedule, &booked, &request, &self.rules)
    }
}
