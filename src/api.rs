// Wire layer for the rental backend: error taxonomy, service traits,
// reqwest-backed client and the mock server used by tests.

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;

use crate::booking::DateRange;
use crate::catalog::CatalogItem;

// Error types surfaced by the wire layer. Local validation failures never
// reach this level; they are caught before any request is built.
#[derive(Error, Debug)]
pub enum ApiError {
    #[error("Network error: {0}")]
    Network(String),

    /// HTTP 409: the requested dates overlap an existing reservation.
    #[error("Dates conflict: {0}")]
    Conflict(String),

    #[error("API error: {status} - {message}")]
    Server { status: u16, message: String },
}

impl ApiError {
    pub fn is_conflict(&self) -> bool {
        matches!(self, ApiError::Conflict(_))
    }
}

// Client configuration
#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub base_url: String,
    pub timeout_ms: u64,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8000".to_string(),
            timeout_ms: 10_000,
        }
    }
}

/// One existing reservation returned by the availability endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Reservation {
    pub id: u32,
    pub costume_id: u32,
    pub date_from: NaiveDate,
    pub date_to: NaiveDate,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    New,
    InProgress,
    Completed,
}

impl Default for OrderStatus {
    fn default() -> Self {
        OrderStatus::New
    }
}

/// Payload for POST /orders.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderCreate {
    pub title: String,
    pub status: OrderStatus,
    pub phone: String,
    pub costume_id: Option<u32>,
    pub date_from: Option<NaiveDate>,
    pub date_to: Option<NaiveDate>,
}

/// Created order echoed back by the backend. Ownership stays server-side;
/// the client never mutates one.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Order {
    pub id: u32,
    pub title: String,
    pub status: OrderStatus,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub costume_id: Option<u32>,
    #[serde(default)]
    pub date_from: Option<NaiveDate>,
    #[serde(default)]
    pub date_to: Option<NaiveDate>,
}

// Catalog reads are public; no token required.
#[async_trait]
pub trait CatalogApi: Send + Sync + 'static {
    async fn list_items(&self) -> Result<Vec<CatalogItem>, ApiError>;

    async fn get_item(&self, id: u32) -> Result<CatalogItem, ApiError>;
}

#[async_trait]
pub trait ReservationApi: Send + Sync + 'static {
    /// Existing reservations overlapping the range. Empty means available.
    async fn availability(
        &self,
        item_id: u32,
        range: DateRange,
    ) -> Result<Vec<Reservation>, ApiError>;

    /// Creates the booking order. HTTP 409 maps to `ApiError::Conflict`.
    async fn create_order(&self, order: &OrderCreate, token: &str) -> Result<Order, ApiError>;
}

pub struct HttpApiClient {
    http: reqwest::Client,
    config: ClientConfig,
}

impl HttpApiClient {
    pub fn new(config: ClientConfig) -> Result<Self, ApiError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_millis(config.timeout_ms))
            .build()
            .map_err(|e| ApiError::Network(e.to_string()))?;
        Ok(Self { http, config })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.config.base_url.trim_end_matches('/'), path)
    }

    async fn error_from(response: reqwest::Response) -> ApiError {
        let status = response.status().as_u16();
        let body = response.text().await.unwrap_or_default();
        let message = extract_detail(&body);
        if status == 409 {
            ApiError::Conflict(message)
        } else {
            ApiError::Server { status, message }
        }
    }

    async fn decode<T: serde::de::DeserializeOwned>(
        response: reqwest::Response,
    ) -> Result<T, ApiError> {
        if !response.status().is_success() {
            return Err(Self::error_from(response).await);
        }
        response
            .json::<T>()
            .await
            .map_err(|e| ApiError::Network(e.to_string()))
    }
}

/// Pulls a human-readable message out of an error body, preferring the
/// backend's `{"detail": ...}` shape.
fn extract_detail(body: &str) -> String {
    if let Ok(value) = serde_json::from_str::<serde_json::Value>(body) {
        for key in ["detail", "message"] {
            if let Some(text) = value.get(key).and_then(|v| v.as_str()) {
                return text.to_string();
            }
        }
    }
    let trimmed = body.trim();
    if trimmed.is_empty() {
        "Unknown error".to_string()
    } else {
        trimmed.to_string()
    }
}

#[async_trait]
impl CatalogApi for HttpApiClient {
    async fn list_items(&self) -> Result<Vec<CatalogItem>, ApiError> {
        let response = self
            .http
            .get(self.url("/costumes"))
            .send()
            .await
            .map_err(|e| ApiError::Network(e.to_string()))?;
        Self::decode(response).await
    }

    async fn get_item(&self, id: u32) -> Result<CatalogItem, ApiError> {
        let response = self
            .http
            .get(self.url(&format!("/costumes/{id}")))
            .send()
            .await
            .map_err(|e| ApiError::Network(e.to_string()))?;
        Self::decode(response).await
    }
}

#[async_trait]
impl ReservationApi for HttpApiClient {
    async fn availability(
        &self,
        item_id: u32,
        range: DateRange,
    ) -> Result<Vec<Reservation>, ApiError> {
        let response = self
            .http
            .get(self.url(&format!("/costumes/{item_id}/availability")))
            .query(&[
                ("from_date", range.start().to_string()),
                ("to_date", range.end().to_string()),
            ])
            .send()
            .await
            .map_err(|e| ApiError::Network(e.to_string()))?;
        Self::decode(response).await
    }

    async fn create_order(&self, order: &OrderCreate, token: &str) -> Result<Order, ApiError> {
        let response = self
            .http
            .post(self.url("/orders"))
            .bearer_auth(token)
            .json(order)
            .send()
            .await
            .map_err(|e| ApiError::Network(e.to_string()))?;
        Self::decode(response).await
    }
}

// Mock backend for tests: scripted responses, failure injection and
// recorded orders, mirroring the endpoints the flow calls.
pub mod mock_server {
    use super::*;
    use parking_lot::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Default)]
    pub struct MockServer {
        items: Mutex<Vec<CatalogItem>>,
        reservations: Mutex<Vec<Reservation>>,
        orders: Mutex<Vec<Order>>,
        order_errors: Mutex<Vec<ApiError>>,
        fail_next_requests: AtomicUsize,
        availability_delay_ms: AtomicUsize,
        availability_calls: AtomicUsize,
        order_calls: AtomicUsize,
    }

    impl MockServer {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn add_item(&self, item: CatalogItem) {
            self.items.lock().push(item);
        }

        pub fn add_reservation(&self, reservation: Reservation) {
            self.reservations.lock().push(reservation);
        }

        /// The next `count` requests fail with a transport error.
        pub fn fail_next_requests(&self, count: usize) {
            self.fail_next_requests.store(count, Ordering::SeqCst);
        }

        /// Scripted rejection for the next order creation, e.g. a 409.
        pub fn push_order_error(&self, error: ApiError) {
            self.order_errors.lock().push(error);
        }

        /// Delay applied to availability calls until reset to zero.
        pub fn set_availability_delay(&self, delay_ms: usize) {
            self.availability_delay_ms.store(delay_ms, Ordering::SeqCst);
        }

        pub fn availability_calls(&self) -> usize {
            self.availability_calls.load(Ordering::SeqCst)
        }

        pub fn order_calls(&self) -> usize {
            self.order_calls.load(Ordering::SeqCst)
        }

        pub fn orders(&self) -> Vec<Order> {
            self.orders.lock().clone()
        }

        fn take_failure(&self) -> bool {
            let remaining = self.fail_next_requests.load(Ordering::SeqCst);
            if remaining > 0 {
                self.fail_next_requests.store(remaining - 1, Ordering::SeqCst);
                true
            } else {
                false
            }
        }

        fn overlapping(&self, costume_id: u32, from: NaiveDate, to: NaiveDate) -> Vec<Reservation> {
            self.reservations
                .lock()
                .iter()
                .filter(|r| r.costume_id == costume_id && r.date_from <= to && r.date_to >= from)
                .cloned()
                .collect()
        }
    }

    #[async_trait]
    impl CatalogApi for MockServer {
        async fn list_items(&self) -> Result<Vec<CatalogItem>, ApiError> {
            if self.take_failure() {
                return Err(ApiError::Network("Service unavailable".to_string()));
            }
            Ok(self.items.lock().clone())
        }

        async fn get_item(&self, id: u32) -> Result<CatalogItem, ApiError> {
            if self.take_failure() {
                return Err(ApiError::Network("Service unavailable".to_string()));
            }
            self.items
                .lock()
                .iter()
                .find(|item| item.id == id)
                .cloned()
                .ok_or_else(|| ApiError::Server {
                    status: 404,
                    message: "Costume not found".to_string(),
                })
        }
    }

    #[async_trait]
    impl ReservationApi for MockServer {
        async fn availability(
            &self,
            item_id: u32,
            range: DateRange,
        ) -> Result<Vec<Reservation>, ApiError> {
            self.availability_calls.fetch_add(1, Ordering::SeqCst);

            let delay = self.availability_delay_ms.load(Ordering::SeqCst);
            if delay > 0 {
                tokio::time::sleep(Duration::from_millis(delay as u64)).await;
            }

            if self.take_failure() {
                return Err(ApiError::Network("Service unavailable".to_string()));
            }
            Ok(self.overlapping(item_id, range.start(), range.end()))
        }

        async fn create_order(&self, order: &OrderCreate, _token: &str) -> Result<Order, ApiError> {
            self.order_calls.fetch_add(1, Ordering::SeqCst);

            if self.take_failure() {
                return Err(ApiError::Network("Service unavailable".to_string()));
            }
            {
                let mut scripted = self.order_errors.lock();
                if !scripted.is_empty() {
                    return Err(scripted.remove(0));
                }
            }

            // Authoritative conflict check, same overlap rule the backend runs.
            if let (Some(costume_id), Some(from), Some(to)) =
                (order.costume_id, order.date_from, order.date_to)
            {
                if !self.overlapping(costume_id, from, to).is_empty() {
                    return Err(ApiError::Conflict(
                        "The selected dates are unavailable".to_string(),
                    ));
                }
            }

            let id = rand::random::<u32>();
            let created = Order {
                id,
                title: order.title.clone(),
                status: order.status,
                created_at: Some(Utc::now()),
                phone: Some(order.phone.clone()),
                costume_id: order.costume_id,
                date_from: order.date_from,
                date_to: order.date_to,
            };

            // New bookings show up in later availability queries.
            if let (Some(costume_id), Some(from), Some(to)) =
                (order.costume_id, order.date_from, order.date_to)
            {
                self.reservations.lock().push(Reservation {
                    id,
                    costume_id,
                    date_from: from,
                    date_to: to,
                });
            }

            self.orders.lock().push(created.clone());
            Ok(created)
        }
    }
}
