pub mod availability;
pub mod booking;
pub mod opening_hours;
pub mod store;
pub mod supabase_store;

pub use availability::{compute_availability, compute_availability_with_rules, AvailabilityService};
pub use booking::BookingService;
pub use opening_hours::OpeningHoursService;
pub use store::{AppointmentStore, InMemoryAppointmentStore};
pub use supabase_store::SupabaseAppointmentStore;
