// libs/appointment-cell/tests/booking_test.rs
use std::sync::Arc;

use assert_matches::assert_matches;
use chrono::{DateTime, NaiveDate, TimeZone, Utc, Weekday};

use appointment_cell::models::*;
use appointment_cell::services::{
    AppointmentStore, AvailabilityService, BookingService, InMemoryAppointmentStore, OpeningHoursService,
};

// ==============================================================================
// TEST FIXTURES AND UTILITIES
// ==============================================================================

const AGENT: &str = "agent-1";

struct TestSetup {
    store: Arc<dyn AppointmentStore>,
    booking: BookingService,
    availability: AvailabilityService,
}

impl TestSetup {
    async fn new() -> Self {
        let store: Arc<dyn AppointmentStore> = Arc::new(InMemoryAppointmentStore::new());
        let schedule = WeeklySchedule::default()
            .with_window(Weekday::Mon, "09:00", "12:00")
            .with_window(Weekday::Tue, "14:00", "15:00");
        OpeningHoursService::new(store.clone())
            .set_opening_hours(AGENT, schedule)
            .await
            .unwrap();

        Self {
            booking: BookingService::new(store.clone(), SchedulingRules::default()),
            availability: AvailabilityService::new(store.clone(), SchedulingRules::default()),
            store,
        }
    }
}

fn now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 6, 1, 0, 0, 0).unwrap()
}

fn monday() -> NaiveDate {
    NaiveDate::from_ymd_opt(2025, 6, 2).unwrap()
}

fn call_request(on: NaiveDate, from: &str) -> BookAppointmentRequest {
    BookAppointmentRequest {
        date: on,
        from: from.to_string(),
        client_name: "Jane Buyer".to_string(),
        client_email: "jane@example.com".to_string(),
        message: None,
        details: AppointmentDetails::PhoneCall {
            phone: "+1 555 0100".to_string(),
        },
        timezone: None,
    }
}

fn tour_request(on: NaiveDate, from: &str) -> BookAppointmentRequest {
    BookAppointmentRequest {
        details: AppointmentDetails::HouseTouring {
            property_id: "prop-42".to_string(),
        },
        message: Some("Is the garden south facing?".to_string()),
        ..call_request(on, from)
    }
}

// ==============================================================================
// BOOKING
// ==============================================================================

#[tokio::test]
async fn test_book_call_derives_end_from_kind() {
    let setup = TestSetup::new().await;

    let appointment = setup
        .booking
        .book(AGENT, call_request(monday(), "09:15"), chrono_tz::UTC, now())
        .await
        .unwrap();

    assert_eq!(appointment.agent_id, AGENT);
    assert_eq!(appointment.from, "09:15");
    assert_eq!(appointment.to, "09:45");
    assert_eq!(appointment.kind(), AppointmentKind::ShortCall);
}

#[tokio::test]
async fn test_book_tour_keeps_property() {
    let setup = TestSetup::new().await;

    let appointment = setup
        .booking
        .book(AGENT, tour_request(monday(), "11:15"), chrono_tz::UTC, now())
        .await
        .unwrap();

    assert_eq!(appointment.to, "12:00");
    assert_matches!(
        appointment.details,
        AppointmentDetails::HouseTouring { ref property_id } if property_id == "prop-42"
    );
}

#[tokio::test]
async fn test_overlapping_booking_is_a_conflict() {
    let setup = TestSetup::new().await;

    setup
        .booking
        .book(AGENT, tour_request(monday(), "10:00"), chrono_tz::UTC, now())
        .await
        .unwrap();

    let err = setup
        .booking
        .book(AGENT, call_request(monday(), "10:30"), chrono_tz::UTC, now())
        .await
        .unwrap_err();

    assert_eq!(err, AppointmentError::ConflictDetected);
    assert_eq!(setup.booking.list_appointments(AGENT).await.unwrap().len(), 1);
}

#[tokio::test]
async fn test_back_to_back_bookings_are_allowed() {
    let setup = TestSetup::new().await;

    for from in ["09:00", "09:30", "10:00"] {
        setup
            .booking
            .book(AGENT, call_request(monday(), from), chrono_tz::UTC, now())
            .await
            .unwrap();
    }

    let appointments = setup.booking.list_appointments(AGENT).await.unwrap();
    let starts: Vec<&str> = appointments.iter().map(|a| a.from.as_str()).collect();
    assert_eq!(starts, vec!["09:00", "09:30", "10:00"]);
}

#[tokio::test]
async fn test_concurrent_bookings_of_one_slot_admit_one() {
    let setup = TestSetup::new().await;
    let booking = Arc::new(setup.booking);

    let mut handles = Vec::new();
    for _ in 0..8 {
        let booking = booking.clone();
        handles.push(tokio::spawn(async move {
            booking
                .book(AGENT, call_request(monday(), "09:00"), chrono_tz::UTC, now())
                .await
        }));
    }

    let mut booked = 0;
    let mut conflicts = 0;
    for handle in handles {
        match handle.await.unwrap() {
            Ok(_) => booked += 1,
            Err(AppointmentError::ConflictDetected) => conflicts += 1,
            Err(other) => panic!("unexpected error: {other}"),
        }
    }

    assert_eq!(booked, 1);
    assert_eq!(conflicts, 7);
}

// ==============================================================================
// VALIDATION
// ==============================================================================

#[tokio::test]
async fn test_slot_outside_opening_hours_is_rejected() {
    let setup = TestSetup::new().await;

    // 11:30 + 45 runs past noon closing
    let err = setup
        .booking
        .book(AGENT, tour_request(monday(), "11:30"), chrono_tz::UTC, now())
        .await
        .unwrap_err();
    assert_matches!(err, AppointmentError::ValidationError(_));

    // Sunday is closed
    let sunday = NaiveDate::from_ymd_opt(2025, 6, 8).unwrap();
    let err = setup
        .booking
        .book(AGENT, call_request(sunday, "10:00"), chrono_tz::UTC, now())
        .await
        .unwrap_err();
    assert_matches!(err, AppointmentError::ValidationError(_));
}

#[tokio::test]
async fn test_slot_off_the_quarter_hour_grid_is_rejected() {
    let setup = TestSetup::new().await;

    let err = setup
        .booking
        .book(AGENT, call_request(monday(), "09:05"), chrono_tz::UTC, now())
        .await
        .unwrap_err();

    assert_matches!(err, AppointmentError::ValidationError(_));
}

#[tokio::test]
async fn test_slot_inside_lead_time_is_rejected() {
    let setup = TestSetup::new().await;
    let monday_early = Utc.with_ymd_and_hms(2025, 6, 2, 8, 30, 0).unwrap();

    let err = setup
        .booking
        .book(AGENT, call_request(monday(), "09:15"), chrono_tz::UTC, monday_early)
        .await
        .unwrap_err();
    assert_matches!(err, AppointmentError::ValidationError(msg) if msg.contains("60 minutes"));

    setup
        .booking
        .book(AGENT, call_request(monday(), "09:30"), chrono_tz::UTC, monday_early)
        .await
        .unwrap();
}

#[tokio::test]
async fn test_slot_beyond_booking_window_is_rejected() {
    let setup = TestSetup::new().await;
    let far_monday = NaiveDate::from_ymd_opt(2025, 7, 7).unwrap();

    let err = setup
        .booking
        .book(AGENT, call_request(far_monday, "09:00"), chrono_tz::UTC, now())
        .await
        .unwrap_err();

    assert_matches!(err, AppointmentError::ValidationError(msg) if msg.contains("30 days"));
}

#[tokio::test]
async fn test_unconfigured_agent_cannot_be_booked() {
    let setup = TestSetup::new().await;

    let err = setup
        .booking
        .book("agent-without-hours", call_request(monday(), "09:00"), chrono_tz::UTC, now())
        .await
        .unwrap_err();

    assert_eq!(err, AppointmentError::NotConfigured("agent-without-hours".to_string()));
}

#[tokio::test]
async fn test_malformed_start_time_is_rejected() {
    let setup = TestSetup::new().await;

    let err = setup
        .booking
        .book(AGENT, call_request(monday(), "nine"), chrono_tz::UTC, now())
        .await
        .unwrap_err();

    assert_eq!(err, AppointmentError::InvalidTimeFormat("nine".to_string()));
}

#[tokio::test]
async fn test_start_time_with_seconds_is_rejected() {
    let setup = TestSetup::new().await;

    let err = setup
        .booking
        .book(AGENT, call_request(monday(), "09:15:30"), chrono_tz::UTC, now())
        .await
        .unwrap_err();

    assert_eq!(err, AppointmentError::InvalidTimeFormat("09:15:30".to_string()));
    assert!(setup.booking.list_appointments(AGENT).await.unwrap().is_empty());
}

// ==============================================================================
// AVAILABILITY THROUGH THE STORE
// ==============================================================================

#[tokio::test]
async fn test_booked_slot_disappears_from_availability() {
    let setup = TestSetup::new().await;
    let tuesday = NaiveDate::from_ymd_opt(2025, 6, 3).unwrap();

    let before = setup
        .availability
        .get_availability(AGENT, AppointmentKind::ShortCall, chrono_tz::UTC, now())
        .await
        .unwrap();
    assert_eq!(before.day(tuesday).unwrap().slots, vec!["14:00", "14:15", "14:30"]);

    setup
        .booking
        .book(AGENT, call_request(tuesday, "14:15"), chrono_tz::UTC, now())
        .await
        .unwrap();

    let after = setup
        .availability
        .get_availability(AGENT, AppointmentKind::ShortCall, chrono_tz::UTC, now())
        .await
        .unwrap();
    assert!(after.day(tuesday).unwrap().slots.is_empty());
    assert_eq!(after.days.len(), 30);
}

#[tokio::test]
async fn test_availability_requires_opening_hours() {
    let setup = TestSetup::new().await;

    let err = setup
        .availability
        .get_availability("nobody", AppointmentKind::LongVisit, chrono_tz::UTC, now())
        .await
        .unwrap_err();

    assert_matches!(err, AppointmentError::NotConfigured(_));
}

#[tokio::test]
async fn test_store_only_returns_intervals_in_range() {
    let setup = TestSetup::new().await;
    setup
        .booking
        .book(AGENT, call_request(monday(), "09:00"), chrono_tz::UTC, now())
        .await
        .unwrap();

    let tuesday = NaiveDate::from_ymd_opt(2025, 6, 3).unwrap();
    let inside = setup.store.get_booked_intervals(AGENT, monday(), tuesday).await.unwrap();
    let outside = setup.store.get_booked_intervals(AGENT, tuesday, tuesday).await.unwrap();

    assert_eq!(
        inside,
        vec![BookedInterval {
            date: monday(),
            from: "09:00".to_string(),
            to: "09:30".to_string(),
        }]
    );
    assert!(outside.is_empty());
}
