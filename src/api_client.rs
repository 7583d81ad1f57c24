// Remote travel API client
// Thin typed wrappers over the REST endpoints. No retries: a failed call is reported to the
// caller, which logs it and degrades.

use std::{
    sync::atomic::{AtomicUsize, Ordering},
    time::{Duration, Instant},
};

use async_trait::async_trait;
use chrono::NaiveDate;
use parking_lot::RwLock;
use reqwest::{Method, RequestBuilder, StatusCode};
use serde::{de::DeserializeOwned, Serialize};
use thiserror::Error;
use tracing::{debug, error};
use url::Url;

use crate::{
    config::ClientConfig,
    datetime::DATE_FORMAT,
    i18n::Language,
    itinerary::ItineraryData,
    models::{
        ActivityDetails, ActivityPage, ActivitySummary, Destination, OrderItem, OrderItemDraft,
        PlaceDetails, PlacePrediction, ScheduleSlot, SearchFilters,
    },
    preferences::Currency,
};

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ApiError {
    #[error("Network error: {0}")]
    Network(String),

    #[error("Request timeout after {0}ms")]
    Timeout(u64),

    #[error("API error: {status_code} - {message}")]
    ApiResponseError { status_code: u16, message: String },

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Could not decode response: {0}")]
    Decode(String),

    #[error("Client error: {0}")]
    ClientError(String),
}

#[async_trait]
pub trait TravelApi: Send + Sync + 'static {
    async fn search_activities(&self, filters: &SearchFilters) -> Result<ActivityPage, ApiError>;

    async fn featured_activities(&self) -> Result<Vec<ActivitySummary>, ApiError>;

    async fn activity_details(&self, activity_id: &str) -> Result<ActivityDetails, ApiError>;

    async fn destinations(&self) -> Result<Vec<Destination>, ApiError>;

    // Start times available for one booking option on a local date
    async fn schedules_for_date(
        &self,
        activity_id: &str,
        booking_option_id: &str,
        date: NaiveDate,
    ) -> Result<Vec<ScheduleSlot>, ApiError>;

    async fn order_items(&self) -> Result<Vec<OrderItem>, ApiError>;

    async fn create_order_item(&self, draft: &OrderItemDraft) -> Result<OrderItem, ApiError>;

    // Sends the whole payload, never a partial patch
    async fn update_order_item(&self, item: &OrderItem) -> Result<OrderItem, ApiError>;

    async fn remove_order_item(&self, order_item_id: &str) -> Result<(), ApiError>;

    async fn place_autocomplete(&self, input: &str) -> Result<Vec<PlacePrediction>, ApiError>;

    async fn place_details(&self, place_id: &str) -> Result<PlaceDetails, ApiError>;

    async fn save_itinerary(
        &self,
        activity_id: &str,
        itinerary: &ItineraryData,
    ) -> Result<(), ApiError>;
}

#[derive(Debug, Default)]
pub struct ClientStats {
    pub requests_sent: AtomicUsize,
    pub requests_succeeded: AtomicUsize,
    pub requests_failed: AtomicUsize,
    pub requests_timeout: AtomicUsize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct StatsSnapshot {
    pub requests_sent: usize,
    pub requests_succeeded: usize,
    pub requests_failed: usize,
    pub requests_timeout: usize,
}

impl ClientStats {
    pub fn snapshot(&self) -> StatsSnapshot {
        StatsSnapshot {
            requests_sent: self.requests_sent.load(Ordering::SeqCst),
            requests_succeeded: self.requests_succeeded.load(Ordering::SeqCst),
            requests_failed: self.requests_failed.load(Ordering::SeqCst),
            requests_timeout: self.requests_timeout.load(Ordering::SeqCst),
        }
    }
}

pub struct HttpTravelApi {
    http: reqwest::Client,
    base_url: Url,
    api_key: Option<String>,
    timeout_ms: u64,
    session_token: RwLock<Option<String>>,
    locale: RwLock<(Language, Currency)>,
    stats: ClientStats,
}

impl HttpTravelApi {
    pub fn new(config: &ClientConfig) -> Result<Self, ApiError> {
        let base_url = Url::parse(&config.base_url)
            .map_err(|e| ApiError::ClientError(format!("invalid base url: {e}")))?;
        if base_url.cannot_be_a_base() {
            return Err(ApiError::ClientError(format!(
                "base url cannot be a base: {base_url}"
            )));
        }

        let http = reqwest::Client::builder()
            .timeout(Duration::from_millis(config.timeout_ms))
            .build()
            .map_err(|e| ApiError::ClientError(e.to_string()))?;

        Ok(Self {
            http,
            base_url,
            api_key: config.api_key.clone(),
            timeout_ms: config.timeout_ms,
            session_token: RwLock::new(None),
            locale: RwLock::new((config.default_language, config.default_currency)),
            stats: ClientStats::default(),
        })
    }

    pub fn stats(&self) -> StatsSnapshot {
        self.stats.snapshot()
    }

    pub fn set_session_token(&self, token: Option<String>) {
        *self.session_token.write() = token;
    }

    pub fn set_locale(&self, language: Language, currency: Currency) {
        *self.locale.write() = (language, currency);
    }

    // base + path segments, each percent-encoded, plus the current lang/currency
    pub fn endpoint(&self, segments: &[&str]) -> Url {
        let mut url = self.base_url.clone();
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        let (language, currency) = *self.locale.read();
        url.query_pairs_mut()
            .append_pair("lang", language.code())
            .append_pair("currency", currency.code());
        url
    }

    // Searches carry the client-wide locale; the filters never change it
    pub fn search_url(&self, filters: &SearchFilters) -> Url {
        let mut url = self.endpoint(&["activities"]);
        url.query_pairs_mut().extend_pairs(search_query_pairs(filters));
        url
    }

    fn request(&self, method: Method, url: Url) -> RequestBuilder {
        let mut builder = self.http.request(method, url);
        // A signed-in session takes precedence over the static api key
        let bearer = self.session_token.read().clone().or_else(|| self.api_key.clone());
        if let Some(token) = bearer {
            builder = builder.bearer_auth(token);
        }
        builder
    }

    fn map_transport_error(&self, e: reqwest::Error) -> ApiError {
        if e.is_timeout() {
            self.stats.requests_timeout.fetch_add(1, Ordering::SeqCst);
            ApiError::Timeout(self.timeout_ms)
        } else {
            ApiError::Network(e.to_string())
        }
    }

    async fn execute(&self, builder: RequestBuilder) -> Result<reqwest::Response, ApiError> {
        let request = builder
            .build()
            .map_err(|e| ApiError::ClientError(e.to_string()))?;
        let method = request.method().clone();
        let url = request.url().clone();

        self.stats.requests_sent.fetch_add(1, Ordering::SeqCst);
        let started = Instant::now();
        debug!(%method, %url, "api request");

        let result = match self.http.execute(request).await {
            Ok(response) => check_status(response).await,
            Err(e) => Err(self.map_transport_error(e)),
        };

        match &result {
            Ok(response) => {
                self.stats.requests_succeeded.fetch_add(1, Ordering::SeqCst);
                debug!(
                    %method,
                    %url,
                    status = response.status().as_u16(),
                    elapsed_ms = started.elapsed().as_millis() as u64,
                    "api response"
                );
            }
            Err(e) => {
                self.stats.requests_failed.fetch_add(1, Ordering::SeqCst);
                error!(%method, %url, error = %e, "api request failed");
            }
        }
        result
    }

    async fn get_json<T: DeserializeOwned>(&self, url: Url) -> Result<T, ApiError> {
        let response = self.execute(self.request(Method::GET, url)).await?;
        decode(response).await
    }

    async fn send_json<B, T>(&self, method: Method, url: Url, body: &B) -> Result<T, ApiError>
    where
        B: Serialize + Sync + ?Sized,
        T: DeserializeOwned,
    {
        let response = self.execute(self.request(method, url).json(body)).await?;
        decode(response).await
    }
}

async fn check_status(response: reqwest::Response) -> Result<reqwest::Response, ApiError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let url = response.url().to_string();
    let message = response.text().await.unwrap_or_default();
    if status == StatusCode::NOT_FOUND {
        return Err(ApiError::NotFound(url));
    }
    Err(ApiError::ApiResponseError {
        status_code: status.as_u16(),
        message,
    })
}

async fn decode<T: DeserializeOwned>(response: reqwest::Response) -> Result<T, ApiError> {
    let bytes = response
        .bytes()
        .await
        .map_err(|e| ApiError::Network(e.to_string()))?;
    serde_json::from_slice(&bytes).map_err(|e| ApiError::Decode(e.to_string()))
}

pub fn search_query_pairs(filters: &SearchFilters) -> Vec<(&'static str, String)> {
    let mut pairs = Vec::new();
    if let Some(destination) = &filters.destination {
        pairs.push(("destination", destination.clone()));
    }
    if let Some(date) = filters.date {
        pairs.push(("date", date.format(DATE_FORMAT).to_string()));
    }
    pairs.push(("adults", filters.travelers.adults.to_string()));
    pairs.push(("children", filters.travelers.children.to_string()));
    pairs.push(("infants", filters.travelers.infants.to_string()));
    pairs.push(("page", filters.page.to_string()));
    pairs.push(("pageSize", filters.page_size.to_string()));
    pairs
}

#[async_trait]
impl TravelApi for HttpTravelApi {
    async fn search_activities(&self, filters: &SearchFilters) -> Result<ActivityPage, ApiError> {
        self.get_json(self.search_url(filters)).await
    }

    async fn featured_activities(&self) -> Result<Vec<ActivitySummary>, ApiError> {
        self.get_json(self.endpoint(&["activities", "featured"])).await
    }

    async fn activity_details(&self, activity_id: &str) -> Result<ActivityDetails, ApiError> {
        self.get_json(self.endpoint(&["activities", activity_id])).await
    }

    async fn destinations(&self) -> Result<Vec<Destination>, ApiError> {
        self.get_json(self.endpoint(&["destinations"])).await
    }

    async fn schedules_for_date(
        &self,
        activity_id: &str,
        booking_option_id: &str,
        date: NaiveDate,
    ) -> Result<Vec<ScheduleSlot>, ApiError> {
        let mut url = self.endpoint(&["activities", activity_id, "schedules"]);
        url.query_pairs_mut()
            .append_pair("bookingOptionId", booking_option_id)
            .append_pair("date", &date.format(DATE_FORMAT).to_string());
        self.get_json(url).await
    }

    async fn order_items(&self) -> Result<Vec<OrderItem>, ApiError> {
        self.get_json(self.endpoint(&["order-items"])).await
    }

    async fn create_order_item(&self, draft: &OrderItemDraft) -> Result<OrderItem, ApiError> {
        self.send_json(Method::POST, self.endpoint(&["order-items"]), draft)
            .await
    }

    async fn update_order_item(&self, item: &OrderItem) -> Result<OrderItem, ApiError> {
        self.send_json(Method::PUT, self.endpoint(&["order-items", &item.id]), item)
            .await
    }

    async fn remove_order_item(&self, order_item_id: &str) -> Result<(), ApiError> {
        let url = self.endpoint(&["order-items", order_item_id]);
        self.execute(self.request(Method::DELETE, url)).await?;
        Ok(())
    }

    async fn place_autocomplete(&self, input: &str) -> Result<Vec<PlacePrediction>, ApiError> {
        let mut url = self.endpoint(&["places", "autocomplete"]);
        url.query_pairs_mut().append_pair("input", input);
        self.get_json(url).await
    }

    async fn place_details(&self, place_id: &str) -> Result<PlaceDetails, ApiError> {
        self.get_json(self.endpoint(&["places", place_id])).await
    }

    async fn save_itinerary(
        &self,
        activity_id: &str,
        itinerary: &ItineraryData,
    ) -> Result<(), ApiError> {
        let url = self.endpoint(&["extranet", "activities", activity_id, "itinerary"]);
        self.execute(self.request(Method::PUT, url).json(itinerary))
            .await?;
        Ok(())
    }
}

// In-memory stand-in for the remote API, with failure injection
pub mod mock_server {
    use super::*;
    use dashmap::DashMap;
    use parking_lot::Mutex;
    use std::collections::HashMap;

    #[derive(Debug, Default)]
    pub struct MockServer {
        activities: RwLock<Vec<ActivityDetails>>,
        destinations: RwLock<Vec<Destination>>,
        schedules: DashMap<(String, String, NaiveDate), Vec<ScheduleSlot>>,
        order_items: RwLock<Vec<OrderItem>>,
        places: DashMap<String, PlaceDetails>,
        itineraries: DashMap<String, ItineraryData>,
        update_log: Mutex<Vec<OrderItem>>,
        request_count: AtomicUsize,
        fail_next_requests: AtomicUsize,
        next_id: AtomicUsize,
        delay_ms: AtomicUsize,
    }

    impl MockServer {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn add_activity(&self, activity: ActivityDetails) {
            self.activities.write().push(activity);
        }

        pub fn add_destination(&self, destination: Destination) {
            self.destinations.write().push(destination);
        }

        pub fn add_schedules(
            &self,
            activity_id: &str,
            booking_option_id: &str,
            date: NaiveDate,
            slots: Vec<ScheduleSlot>,
        ) {
            self.schedules.insert(
                (activity_id.to_string(), booking_option_id.to_string(), date),
                slots,
            );
        }

        pub fn add_order_item(&self, item: OrderItem) {
            self.order_items.write().push(item);
        }

        pub fn add_place(&self, place: PlaceDetails) {
            self.places.insert(place.place_id.clone(), place);
        }

        pub fn fail_next_requests(&self, count: usize) {
            self.fail_next_requests.store(count, Ordering::SeqCst);
        }

        pub fn set_delay(&self, delay_ms: usize) {
            self.delay_ms.store(delay_ms, Ordering::SeqCst);
        }

        pub fn request_count(&self) -> usize {
            self.request_count.load(Ordering::SeqCst)
        }

        // Every payload received by update_order_item, in order
        pub fn updates(&self) -> Vec<OrderItem> {
            self.update_log.lock().clone()
        }

        pub fn stored_order_items(&self) -> Vec<OrderItem> {
            self.order_items.read().clone()
        }

        pub fn saved_itinerary(&self, activity_id: &str) -> Option<ItineraryData> {
            self.itineraries.get(activity_id).map(|e| e.value().clone())
        }

        async fn handle(&self) -> Result<(), ApiError> {
            self.request_count.fetch_add(1, Ordering::SeqCst);

            let delay = self.delay_ms.load(Ordering::SeqCst);
            if delay > 0 {
                tokio::time::sleep(Duration::from_millis(delay as u64)).await;
            }

            let failing = self
                .fail_next_requests
                .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
                .is_ok();
            if failing {
                return Err(ApiError::ApiResponseError {
                    status_code: 503,
                    message: "Service unavailable".to_string(),
                });
            }
            Ok(())
        }

        fn price_order_item(&self, item: &mut OrderItem) {
            let activities = self.activities.read();
            let Some(activity) = activities.iter().find(|a| a.summary.id == item.activity_id) else {
                return;
            };
            item.activity_title = activity.summary.title.clone();
            item.utc_offset_minutes = activity.utc_offset_minutes;

            let option_price = activity
                .summary
                .booking_options
                .iter()
                .find(|o| o.id == item.booking_option_id)
                .and_then(|o| crate::pricing::resolve_price(&o.price))
                .or_else(|| crate::pricing::resolve_price(&activity.summary.price));
            if let Some(price) = option_price {
                item.unit_price = price.amount;
                item.currency = price.currency;
            }
            let paying = item.travelers.adults + item.travelers.children;
            item.total_price = crate::pricing::round_cents(item.unit_price * paying as f64);
        }
    }

    #[async_trait]
    impl TravelApi for MockServer {
        async fn search_activities(
            &self,
            filters: &SearchFilters,
        ) -> Result<ActivityPage, ApiError> {
            self.handle().await?;
            let wanted = filters.destination.as_deref().map(str::to_lowercase);
            let matching: Vec<ActivitySummary> = self
                .activities
                .read()
                .iter()
                .filter(|a| match (&wanted, &a.summary.destination) {
                    (None, _) => true,
                    (Some(w), Some(d)) => d.to_lowercase() == *w,
                    (Some(_), None) => false,
                })
                .map(|a| a.summary.clone())
                .collect();

            let page_size = filters.page_size.max(1) as usize;
            let skip = (filters.page.max(1) as usize - 1) * page_size;
            Ok(ActivityPage {
                total: matching.len() as u64,
                items: matching.into_iter().skip(skip).take(page_size).collect(),
                page: filters.page,
                page_size: filters.page_size,
            })
        }

        async fn featured_activities(&self) -> Result<Vec<ActivitySummary>, ApiError> {
            self.handle().await?;
            Ok(self
                .activities
                .read()
                .iter()
                .filter(|a| a.summary.featured)
                .map(|a| a.summary.clone())
                .collect())
        }

        async fn activity_details(&self, activity_id: &str) -> Result<ActivityDetails, ApiError> {
            self.handle().await?;
            self.activities
                .read()
                .iter()
                .find(|a| a.summary.id == activity_id)
                .cloned()
                .ok_or_else(|| ApiError::NotFound(format!("activity {activity_id}")))
        }

        async fn destinations(&self) -> Result<Vec<Destination>, ApiError> {
            self.handle().await?;
            let mut counts: HashMap<String, u32> = HashMap::new();
            for activity in self.activities.read().iter() {
                if let Some(d) = &activity.summary.destination {
                    *counts.entry(d.to_lowercase()).or_default() += 1;
                }
            }
            Ok(self
                .destinations
                .read()
                .iter()
                .cloned()
                .map(|mut d| {
                    d.activity_count = counts.get(&d.name.to_lowercase()).copied().unwrap_or(0);
                    d
                })
                .collect())
        }

        async fn schedules_for_date(
            &self,
            activity_id: &str,
            booking_option_id: &str,
            date: NaiveDate,
        ) -> Result<Vec<ScheduleSlot>, ApiError> {
            self.handle().await?;
            let key = (activity_id.to_string(), booking_option_id.to_string(), date);
            Ok(self
                .schedules
                .get(&key)
                .map(|e| e.value().clone())
                .unwrap_or_default())
        }

        async fn order_items(&self) -> Result<Vec<OrderItem>, ApiError> {
            self.handle().await?;
            Ok(self.order_items.read().clone())
        }

        async fn create_order_item(&self, draft: &OrderItemDraft) -> Result<OrderItem, ApiError> {
            self.handle().await?;
            let id = self.next_id.fetch_add(1, Ordering::SeqCst) + 1;
            let mut item = OrderItem {
                id: format!("oi-{id}"),
                activity_id: draft.activity_id.clone(),
                booking_option_id: draft.booking_option_id.clone(),
                guide_language: draft.guide_language.clone(),
                meeting_point: draft.meeting_point.clone(),
                special_request: draft.special_request.clone(),
                booking_datetime: draft.booking_datetime.clone(),
                travelers: draft.travelers,
                ..Default::default()
            };
            self.price_order_item(&mut item);
            self.order_items.write().push(item.clone());
            Ok(item)
        }

        async fn update_order_item(&self, item: &OrderItem) -> Result<OrderItem, ApiError> {
            self.handle().await?;
            self.update_log.lock().push(item.clone());

            let mut updated = item.clone();
            self.price_order_item(&mut updated);

            let mut items = self.order_items.write();
            let slot = items
                .iter_mut()
                .find(|existing| existing.id == item.id)
                .ok_or_else(|| ApiError::NotFound(format!("order item {}", item.id)))?;
            *slot = updated.clone();
            Ok(updated)
        }

        async fn remove_order_item(&self, order_item_id: &str) -> Result<(), ApiError> {
            self.handle().await?;
            let mut items = self.order_items.write();
            let before = items.len();
            items.retain(|i| i.id != order_item_id);
            if items.len() == before {
                return Err(ApiError::NotFound(format!("order item {order_item_id}")));
            }
            Ok(())
        }

        async fn place_autocomplete(&self, input: &str) -> Result<Vec<PlacePrediction>, ApiError> {
            self.handle().await?;
            let needle = input.to_lowercase();
            let mut predictions: Vec<PlacePrediction> = self
                .places
                .iter()
                .filter(|e| e.value().name.to_lowercase().contains(&needle))
                .map(|e| PlacePrediction {
                    place_id: e.key().clone(),
                    description: match &e.value().address {
                        Some(address) => format!("{}, {}", e.value().name, address),
                        None => e.value().name.clone(),
                    },
                })
                .collect();
            predictions.sort_by(|a, b| a.description.cmp(&b.description));
            Ok(predictions)
        }

        async fn place_details(&self, place_id: &str) -> Result<PlaceDetails, ApiError> {
            self.handle().await?;
            self.places
                .get(place_id)
                .map(|e| e.value().clone())
                .ok_or_else(|| ApiError::NotFound(format!("place {place_id}")))
        }

        async fn save_itinerary(
            &self,
            activity_id: &str,
            itinerary: &ItineraryData,
        ) -> Result<(), ApiError> {
            self.handle().await?;
            self.itineraries
                .insert(activity_id.to_string(), itinerary.clone());
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::mock_server::MockServer;
    use super::*;
    use crate::models::Travelers;

    fn client(base_url: &str) -> HttpTravelApi {
        let config = ClientConfig {
            base_url: base_url.to_string(),
            ..Default::default()
        };
        HttpTravelApi::new(&config).unwrap()
    }

    #[test]
    fn test_endpoint_building() {
        let api = client("https://api.example.com/v1/");
        let url = api.endpoint(&["activities", "a b/c"]);
        assert_eq!(
            url.as_str(),
            "https://api.example.com/v1/activities/a%20b%2Fc?lang=en&currency=USD"
        );

        let api = client("https://api.example.com/v1");
        api.set_locale(Language::Ar, Currency::Aed);
        assert_eq!(
            api.endpoint(&["destinations"]).as_str(),
            "https://api.example.com/v1/destinations?lang=ar&currency=AED"
        );
    }

    #[tokio::test]
    async fn test_search_keeps_client_locale() {
        let api = client("http://127.0.0.1:9/api");
        api.set_locale(Language::Ar, Currency::Aed);

        let filters = SearchFilters {
            destination: Some("Cairo".to_string()),
            ..Default::default()
        };
        let url = api.search_url(&filters);
        assert!(url.as_str().contains("lang=ar&currency=AED"));
        assert!(!url.as_str().contains("lang=en"));
        assert!(url.as_str().contains("destination=Cairo"));

        assert!(api.search_activities(&filters).await.is_err());
        assert_eq!(
            api.endpoint(&["destinations"]).as_str(),
            "http://127.0.0.1:9/api/destinations?lang=ar&currency=AED"
        );
    }

    #[test]
    fn test_rejects_bad_base_url() {
        let config = ClientConfig {
            base_url: "mailto:someone@example.com".to_string(),
            ..Default::default()
        };
        assert!(HttpTravelApi::new(&config).is_err());
    }

    #[test]
    fn test_search_query_pairs() {
        let filters = SearchFilters {
            destination: Some("Dubai".to_string()),
            date: NaiveDate::from_ymd_opt(2025, 6, 10),
            travelers: Travelers {
                adults: 2,
                children: 1,
                infants: 0,
            },
            ..Default::default()
        };
        let pairs = search_query_pairs(&filters);
        assert_eq!(pairs[0], ("destination", "Dubai".to_string()));
        assert_eq!(pairs[1], ("date", "2025-06-10".to_string()));
        assert!(pairs.contains(&("pageSize", "12".to_string())));
    }

    #[tokio::test]
    async fn test_unreachable_server_is_network_error() {
        let api = client("http://127.0.0.1:9/api");
        let result = api.destinations().await;
        assert!(matches!(
            result,
            Err(ApiError::Network(_)) | Err(ApiError::Timeout(_))
        ));
        let stats = api.stats();
        assert_eq!(stats.requests_sent, 1);
        assert_eq!(stats.requests_failed, 1);
    }

    #[tokio::test]
    async fn test_mock_failure_injection() {
        let server = MockServer::new();
        server.fail_next_requests(1);
        assert!(matches!(
            server.destinations().await,
            Err(ApiError::ApiResponseError {
                status_code: 503,
                ..
            })
        ));
        tokio_test::assert_ok!(server.destinations().await);
        assert_eq!(server.request_count(), 2);
    }

    #[tokio::test]
    async fn test_mock_order_item_lifecycle() {
        let server = MockServer::new();
        let created = server
            .create_order_item(&OrderItemDraft {
                activity_id: "act-1".to_string(),
                booking_option_id: "opt-1".to_string(),
                booking_datetime: "2025-06-10T05:30:00Z".to_string(),
                travelers: Travelers {
                    adults: 1,
                    children: 0,
                    infants: 0,
                },
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(created.id, "oi-1");

        let mut changed = created.clone();
        changed.special_request = Some("Vegetarian lunch".to_string());
        server.update_order_item(&changed).await.unwrap();
        assert_eq!(server.updates(), vec![changed]);

        server.remove_order_item("oi-1").await.unwrap();
        assert!(matches!(
            server.remove_order_item("oi-1").await,
            Err(ApiError::NotFound(_))
        ));
    }
}
