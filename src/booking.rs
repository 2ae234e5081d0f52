// Booking dialog flow: date-range selection, advisory availability checks
// and order submission with conflict handling. The backend is always the
// final arbiter; everything client-side is optimistic validation.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use chrono::{Days, Local, NaiveDate};
use parking_lot::Mutex;
use thiserror::Error;
use tracing::{debug, warn};

use crate::api::{ApiError, Order, OrderCreate, OrderStatus, ReservationApi};
use crate::catalog::CatalogSnapshot;
use crate::notify::{NoticeKind, Notifier};
use crate::session::SessionStore;

// Local validation failures. Detected client-side; no network call is made.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Select booking dates")]
    MissingDates,

    #[error("Enter a contact phone number")]
    MissingPhone,

    #[error("The end date cannot be earlier than the start date")]
    EndBeforeStart,
}

/// Inclusive booking range. The constructor refuses end < start, so a value
/// of this type always holds the invariant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateRange {
    from: NaiveDate,
    to: NaiveDate,
}

impl DateRange {
    pub fn new(from: NaiveDate, to: NaiveDate) -> Result<Self, ValidationError> {
        if to < from {
            Err(ValidationError::EndBeforeStart)
        } else {
            Ok(Self { from, to })
        }
    }

    /// [today, today+1], the range a freshly opened dialog starts with.
    pub fn starting_today() -> Self {
        let today = Local::now().date_naive();
        let tomorrow = today.checked_add_days(Days::new(1)).unwrap_or(today);
        Self {
            from: today,
            to: tomorrow,
        }
    }

    pub fn start(&self) -> NaiveDate {
        self.from
    }

    pub fn end(&self) -> NaiveDate {
        self.to
    }
}

/// Transient, unsaved booking input. Exists only while the dialog is open;
/// closing, cancelling or submitting discards it.
#[derive(Debug, Clone, PartialEq)]
pub struct BookingDraft {
    pub item_id: u32,
    pub item_title: String,
    pub date_from: Option<NaiveDate>,
    pub date_to: Option<NaiveDate>,
    pub phone: String,
}

impl BookingDraft {
    fn range(&self) -> Result<DateRange, ValidationError> {
        match (self.date_from, self.date_to) {
            (Some(from), Some(to)) => DateRange::new(from, to),
            _ => Err(ValidationError::MissingDates),
        }
    }

    // Dates first, then phone, then ordering, each with its own message.
    fn validate(&self) -> Result<DateRange, ValidationError> {
        let (from, to) = match (self.date_from, self.date_to) {
            (Some(from), Some(to)) => (from, to),
            _ => return Err(ValidationError::MissingDates),
        };
        if self.phone.trim().is_empty() {
            return Err(ValidationError::MissingPhone);
        }
        DateRange::new(from, to)
    }
}

/// Verdict of the latest advisory availability check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Availability {
    /// No finished check for the current range (none run, or one in flight).
    Unknown,
    /// No conflicting reservations; submission is enabled.
    Available,
    /// Conflicts exist or the range is invalid; submission stays disabled.
    Blocked,
    /// The check itself failed; submission stays disabled until a retry.
    CheckFailed,
}

#[derive(Debug)]
enum DialogState {
    Closed,
    Open {
        draft: BookingDraft,
        availability: Availability,
    },
    Submitting {
        draft: BookingDraft,
    },
}

/// What the embedding shell should do after `submit`.
#[derive(Debug, Clone, PartialEq)]
pub enum SubmitOutcome {
    /// Order accepted. Close the dialog and refresh the catalog after
    /// `close_after`, giving the user time to read the confirmation.
    Created { order: Order, close_after: Duration },
    /// No bearer token; take the user to the sign-in page instead.
    SignInRequired,
    /// Rejected locally or by the backend; a notice was emitted and the
    /// dialog stays open.
    Rejected,
}

#[derive(Debug, Clone)]
pub struct BookingConfig {
    /// Delay before a successful submission closes the dialog.
    pub close_delay: Duration,
}

impl Default for BookingConfig {
    fn default() -> Self {
        Self {
            close_delay: Duration::from_secs(2),
        }
    }
}

/// Typed surface for UI events. Dispatch goes through a single handler, so
/// a wired-up shell cannot end up with duplicate registrations.
#[derive(Debug, Clone)]
pub enum BookingEvent {
    Open {
        item_id: u32,
    },
    DatesChanged {
        date_from: Option<NaiveDate>,
        date_to: Option<NaiveDate>,
    },
    PhoneChanged {
        phone: String,
    },
    Submit,
    Close,
}

pub struct BookingFlow {
    reservations: Arc<dyn ReservationApi>,
    session: Arc<dyn SessionStore>,
    notifier: Arc<dyn Notifier>,
    config: BookingConfig,
    state: Mutex<DialogState>,
    // Monotonic check token; only the response matching the newest check may
    // touch the dialog state, so a stale reply can never win.
    check_seq: AtomicU64,
}

impl BookingFlow {
    pub fn new(
        reservations: Arc<dyn ReservationApi>,
        session: Arc<dyn SessionStore>,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        Self::with_config(reservations, session, notifier, BookingConfig::default())
    }

    pub fn with_config(
        reservations: Arc<dyn ReservationApi>,
        session: Arc<dyn SessionStore>,
        notifier: Arc<dyn Notifier>,
        config: BookingConfig,
    ) -> Self {
        Self {
            reservations,
            session,
            notifier,
            config,
            state: Mutex::new(DialogState::Closed),
            check_seq: AtomicU64::new(0),
        }
    }

    pub fn is_open(&self) -> bool {
        !matches!(*self.state.lock(), DialogState::Closed)
    }

    pub fn draft(&self) -> Option<BookingDraft> {
        match &*self.state.lock() {
            DialogState::Open { draft, .. } | DialogState::Submitting { draft } => {
                Some(draft.clone())
            }
            DialogState::Closed => None,
        }
    }

    pub fn availability(&self) -> Option<Availability> {
        match &*self.state.lock() {
            DialogState::Open { availability, .. } => Some(*availability),
            _ => None,
        }
    }

    pub fn can_submit(&self) -> bool {
        self.availability() == Some(Availability::Available)
    }

    /// Opens the dialog for `item_id`, discarding any prior draft. Unknown
    /// ids fall back to a generic title. Kicks off an advisory availability
    /// check for [today, today+1].
    pub async fn open_dialog(&self, item_id: u32, catalog: &CatalogSnapshot) {
        let range = DateRange::starting_today();
        let draft = BookingDraft {
            item_id,
            item_title: catalog.title_for(item_id),
            date_from: Some(range.start()),
            date_to: Some(range.end()),
            phone: String::new(),
        };
        *self.state.lock() = DialogState::Open {
            draft,
            availability: Availability::Unknown,
        };
        debug!("booking dialog opened for item {item_id}");
        self.check_availability().await;
    }

    /// Records a new candidate range from the date inputs. An inverted range
    /// is rejected locally with no network call; a complete valid range
    /// triggers a fresh availability check.
    pub async fn dates_changed(&self, date_from: Option<NaiveDate>, date_to: Option<NaiveDate>) {
        enum Next {
            Check,
            Warn(ValidationError),
            Nothing,
        }

        let next = {
            let mut state = self.state.lock();
            let DialogState::Open {
                draft,
                availability,
            } = &mut *state
            else {
                return;
            };
            draft.date_from = date_from;
            draft.date_to = date_to;
            match draft.range() {
                Ok(_) => {
                    *availability = Availability::Unknown;
                    Next::Check
                }
                Err(err @ ValidationError::EndBeforeStart) => {
                    *availability = Availability::Blocked;
                    Next::Warn(err)
                }
                Err(_) => {
                    *availability = Availability::Unknown;
                    Next::Nothing
                }
            }
        };

        match next {
            Next::Check => self.check_availability().await,
            Next::Warn(err) => self.notifier.notify(NoticeKind::Warning, &err.to_string()),
            Next::Nothing => {}
        }
    }

    /// Queries for reservations overlapping the current range. Advisory
    /// only: the backend re-validates at submission time.
    pub async fn check_availability(&self) {
        let token = self.check_seq.fetch_add(1, Ordering::SeqCst) + 1;
        let (item_id, range) = {
            let state = self.state.lock();
            let DialogState::Open { draft, .. } = &*state else {
                return;
            };
            let Ok(range) = draft.range() else {
                return;
            };
            (draft.item_id, range)
        };

        // Lock released while the request is in flight.
        let result = self.reservations.availability(item_id, range).await;

        let notice = {
            let mut state = self.state.lock();
            let DialogState::Open {
                draft,
                availability,
            } = &mut *state
            else {
                return;
            };
            let stale = token != self.check_seq.load(Ordering::SeqCst)
                || draft.item_id != item_id
                || draft.range().ok() != Some(range);
            if stale {
                debug!("stale availability response for item {item_id} dropped");
                return;
            }
            match result {
                Ok(conflicts) if conflicts.is_empty() => {
                    *availability = Availability::Available;
                    (
                        NoticeKind::Success,
                        "Dates are available. You can book.".to_string(),
                    )
                }
                Ok(_) => {
                    *availability = Availability::Blocked;
                    (
                        NoticeKind::Error,
                        "The selected dates are already booked. Please pick different dates."
                            .to_string(),
                    )
                }
                Err(err) => {
                    *availability = Availability::CheckFailed;
                    warn!("availability check failed: {err}");
                    (
                        NoticeKind::Warning,
                        format!("Availability check failed: {err}"),
                    )
                }
            }
        };
        self.notifier.notify(notice.0, &notice.1);
    }

    /// Updates the contact phone on the open draft.
    pub fn set_phone(&self, phone: &str) {
        if let DialogState::Open { draft, .. } = &mut *self.state.lock() {
            draft.phone = phone.to_string();
        }
    }

    /// Validates locally, re-checks availability best-effort, then posts the
    /// order. A confirmed conflict from the re-check blocks; the re-check
    /// failing on its own does not, since the backend validates again.
    pub async fn submit(&self) -> SubmitOutcome {
        let Some(token) = self.session.token() else {
            return SubmitOutcome::SignInRequired;
        };

        let validated = {
            let mut state = self.state.lock();
            let draft = match &*state {
                DialogState::Open { draft, .. } => draft.clone(),
                _ => return SubmitOutcome::Rejected,
            };
            match draft.validate() {
                Ok(range) => {
                    *state = DialogState::Submitting {
                        draft: draft.clone(),
                    };
                    Ok((draft, range))
                }
                Err(err) => Err(err),
            }
        };
        let (draft, range) = match validated {
            Ok(pair) => pair,
            Err(err) => {
                self.notifier.notify(NoticeKind::Error, &err.to_string());
                return SubmitOutcome::Rejected;
            }
        };

        match self.reservations.availability(draft.item_id, range).await {
            Ok(conflicts) if !conflicts.is_empty() => {
                self.reopen(draft, Availability::Blocked);
                self.notifier.notify(
                    NoticeKind::Error,
                    "The selected dates are already booked. Please pick different dates.",
                );
                return SubmitOutcome::Rejected;
            }
            Ok(_) => {}
            Err(err) => {
                warn!("pre-submission availability check failed, proceeding: {err}");
            }
        }

        let order = OrderCreate {
            title: format!("Costume booking: {}", draft.item_title),
            status: OrderStatus::New,
            phone: draft.phone.trim().to_string(),
            costume_id: Some(draft.item_id),
            date_from: Some(range.start()),
            date_to: Some(range.end()),
        };

        match self.reservations.create_order(&order, &token).await {
            Ok(created) => {
                debug!("order {} created for item {}", created.id, draft.item_id);
                // Blocked until the scheduled close, so a double click cannot
                // post the same booking twice.
                self.reopen(draft, Availability::Blocked);
                self.notifier.notify(
                    NoticeKind::Success,
                    "Booking request sent! We will contact you to confirm.",
                );
                SubmitOutcome::Created {
                    order: created,
                    close_after: self.config.close_delay,
                }
            }
            Err(ApiError::Conflict(detail)) => {
                self.reopen(draft, Availability::Blocked);
                self.notifier.notify(
                    NoticeKind::Error,
                    &format!("Dates are no longer available: {detail}"),
                );
                SubmitOutcome::Rejected
            }
            Err(ApiError::Network(message)) => {
                self.reopen(draft, Availability::Available);
                self.notifier
                    .notify(NoticeKind::Error, &format!("Network error: {message}"));
                SubmitOutcome::Rejected
            }
            Err(ApiError::Server { message, .. }) => {
                self.reopen(draft, Availability::Available);
                self.notifier.notify(
                    NoticeKind::Error,
                    &format!("Failed to create the booking: {message}"),
                );
                SubmitOutcome::Rejected
            }
        }
    }

    /// Discards the draft and clears transient messages. Safe to call
    /// repeatedly; ignored while a submission is in flight.
    pub fn close_dialog(&self) {
        let mut state = self.state.lock();
        if matches!(&*state, DialogState::Submitting { .. }) {
            return;
        }
        *state = DialogState::Closed;
        drop(state);
        self.notifier.clear();
    }

    /// Single dispatch point for the typed event surface.
    pub async fn handle(
        &self,
        event: BookingEvent,
        catalog: &CatalogSnapshot,
    ) -> Option<SubmitOutcome> {
        match event {
            BookingEvent::Open { item_id } => {
                self.open_dialog(item_id, catalog).await;
                None
            }
            BookingEvent::DatesChanged { date_from, date_to } => {
                self.dates_changed(date_from, date_to).await;
                None
            }
            BookingEvent::PhoneChanged { phone } => {
                self.set_phone(&phone);
                None
            }
            BookingEvent::Submit => Some(self.submit().await),
            BookingEvent::Close => {
                self.close_dialog();
                None
            }
        }
    }

    fn reopen(&self, draft: BookingDraft, availability: Availability) {
        let mut state = self.state.lock();
        if matches!(&*state, DialogState::Submitting { .. }) {
            *state = DialogState::Open {
                draft,
                availability,
            };
        }
    }
}
