// Client-side booking flow for the costume rental service

pub mod api;
pub mod booking;
pub mod catalog;
pub mod notify;
pub mod session;

// Re-export key types for convenience
pub use api::{
    ApiError, CatalogApi, ClientConfig, HttpApiClient, Order, OrderCreate, OrderStatus,
    Reservation, ReservationApi,
};
pub use booking::{
    Availability, BookingConfig, BookingDraft, BookingEvent, BookingFlow, DateRange,
    SubmitOutcome, ValidationError,
};
pub use catalog::{load_catalog, CatalogItem, CatalogSnapshot};
pub use notify::{NoticeKind, Notifier, RecordingNotifier, TracingNotifier};
pub use session::{MemorySessionStore, SessionStore};
