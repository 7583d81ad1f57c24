// Home and Search listings
// Maps wire activities into display cards and wraps the listing calls. Listing failures are
// logged and degrade to empty results so the page still renders.

use std::sync::Arc;

use chrono::NaiveDate;
use tracing::{error, info};
use url::form_urlencoded;

use crate::{
    api_client::{ApiError, TravelApi},
    datetime::{ensure_not_in_past, parse_date, DurationParts, DATE_FORMAT},
    models::{ActivityDetails, ActivitySummary, Destination, SearchFilters},
    pricing::{self, Price},
    validation::{check_range, ValidationError},
};

pub const PLACEHOLDER_IMAGE: &str = "/images/activity-placeholder.jpg";

pub const MAX_ADULTS: u32 = 20;
pub const MAX_CHILDREN: u32 = 10;
pub const MAX_INFANTS: u32 = 10;
pub const MAX_PAGE_SIZE: u32 = 100;

impl SearchFilters {
    pub fn validate(&self, today: NaiveDate) -> Result<(), ValidationError> {
        let t = &self.travelers;
        check_range("adults", t.adults.into(), 1, MAX_ADULTS.into())?;
        check_range("children", t.children.into(), 0, MAX_CHILDREN.into())?;
        check_range("infants", t.infants.into(), 0, MAX_INFANTS.into())?;
        check_range("page", self.page.into(), 1, i64::from(u32::MAX))?;
        check_range("pageSize", self.page_size.into(), 1, MAX_PAGE_SIZE.into())?;
        if let Some(date) = self.date {
            ensure_not_in_past(date, today)?;
        }
        Ok(())
    }

    pub fn to_query_string(&self) -> String {
        let mut query = form_urlencoded::Serializer::new(String::new());
        if let Some(destination) = &self.destination {
            query.append_pair("destination", destination);
        }
        if let Some(date) = self.date {
            query.append_pair("date", &date.format(DATE_FORMAT).to_string());
        }
        query
            .append_pair("adults", &self.travelers.adults.to_string())
            .append_pair("children", &self.travelers.children.to_string())
            .append_pair("infants", &self.travelers.infants.to_string())
            .append_pair("page", &self.page.to_string())
            .append_pair("pageSize", &self.page_size.to_string())
            .append_pair("lang", self.language.code())
            .append_pair("currency", self.currency.code());
        query.finish()
    }

    // Unknown keys are ignored; malformed known values are errors
    pub fn from_query_string(query: &str) -> Result<Self, ValidationError> {
        let mut filters = Self::default();
        for (key, value) in form_urlencoded::parse(query.trim_start_matches('?').as_bytes()) {
            let value = value.trim();
            match &*key {
                "destination" if !value.is_empty() => filters.destination = Some(value.to_string()),
                "date" if !value.is_empty() => filters.date = Some(parse_date(value)?),
                "adults" => filters.travelers.adults = parse_count("adults", value)?,
                "children" => filters.travelers.children = parse_count("children", value)?,
                "infants" => filters.travelers.infants = parse_count("infants", value)?,
                "page" => filters.page = parse_count("page", value)?,
                "pageSize" => filters.page_size = parse_count("pageSize", value)?,
                "lang" => {
                    if let Ok(language) = value.parse() {
                        filters.language = language;
                    }
                }
                "currency" => {
                    if let Ok(currency) = value.parse() {
                        filters.currency = currency;
                    }
                }
                _ => {}
            }
        }
        Ok(filters)
    }
}

fn parse_count(field: &str, value: &str) -> Result<u32, ValidationError> {
    value.parse().map_err(|_| ValidationError::InvalidFormat {
        field: field.to_string(),
        value: value.to_string(),
    })
}

// Display-oriented shape for one listing card
#[derive(Debug, Clone, PartialEq)]
pub struct ActivityCard {
    pub id: String,
    pub title: String,
    pub destination: Option<String>,
    pub image_url: String,
    pub price: Option<Price>,
    pub original_price: Option<Price>,
    pub discount_percentage: Option<u32>,
    pub duration: Option<String>,
    pub rating: Option<f64>,
    pub review_count: u32,
}

fn non_empty(value: Option<&String>) -> Option<&str> {
    value.map(|s| s.trim()).filter(|s| !s.is_empty())
}

// cover image -> first gallery image -> placeholder
pub fn select_image(summary: &ActivitySummary) -> String {
    non_empty(summary.cover_image.as_ref())
        .or_else(|| summary.images.iter().find_map(|img| non_empty(Some(img))))
        .unwrap_or(PLACEHOLDER_IMAGE)
        .to_string()
}

// explicit parts -> total minutes -> first booking option with a duration
pub fn duration_label(summary: &ActivitySummary) -> Option<String> {
    summary
        .duration
        .filter(|d| d.total_minutes() > 0)
        .or_else(|| {
            summary
                .duration_minutes
                .filter(|m| *m > 0)
                .map(|m| DurationParts::from_minutes(m.into()))
        })
        .or_else(|| {
            summary
                .booking_options
                .iter()
                .find_map(|o| o.duration.filter(|d| d.total_minutes() > 0))
        })
        .map(|d| d.display())
}

impl From<&ActivitySummary> for ActivityCard {
    fn from(summary: &ActivitySummary) -> Self {
        let tiers = std::iter::once(&summary.price)
            .chain(summary.booking_options.iter().map(|o| &o.price));
        let price = pricing::from_price(tiers);

        // Strike-through only when the activity's own price is a reduced one
        let original_price = pricing::original_price(&summary.price).filter(|original| {
            pricing::resolve_price(&summary.price)
                .is_some_and(|current| original.amount > current.amount)
        });
        let discount_percentage = original_price
            .as_ref()
            .and_then(|_| pricing::discount_percentage(&summary.price));

        Self {
            id: summary.id.clone(),
            title: summary.title.clone(),
            destination: summary.destination.clone(),
            image_url: select_image(summary),
            price,
            original_price,
            discount_percentage,
            duration: duration_label(summary),
            rating: summary.rating,
            review_count: summary.review_count,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct SearchResults {
    pub cards: Vec<ActivityCard>,
    pub total: u64,
    pub page: u32,
    pub total_pages: u32,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct HomePage {
    pub featured: Vec<ActivityCard>,
    pub destinations: Vec<Destination>,
}

// Saturates at u32::MAX for totals the page counter cannot hold
pub fn total_pages(total: u64, page_size: u32) -> u32 {
    let page_size = u64::from(page_size.max(1));
    u32::try_from(total.div_ceil(page_size)).unwrap_or(u32::MAX)
}

pub struct ActivityCatalog {
    api: Arc<dyn TravelApi>,
}

impl ActivityCatalog {
    pub fn new(api: Arc<dyn TravelApi>) -> Self {
        Self { api }
    }

    pub async fn search(
        &self,
        filters: &SearchFilters,
        today: NaiveDate,
    ) -> Result<SearchResults, ValidationError> {
        filters.validate(today)?;

        match self.api.search_activities(filters).await {
            Ok(page) => {
                let total_pages = total_pages(page.total, filters.page_size);
                info!(total = page.total, page = filters.page, "activity search");
                Ok(SearchResults {
                    cards: page.items.iter().map(ActivityCard::from).collect(),
                    total: page.total,
                    page: filters.page,
                    total_pages,
                })
            }
            Err(e) => {
                error!(error = %e, "activity search failed");
                Ok(SearchResults {
                    page: filters.page,
                    ..Default::default()
                })
            }
        }
    }

    pub async fn destinations(&self) -> Vec<Destination> {
        self.api.destinations().await.unwrap_or_else(|e| {
            error!(error = %e, "loading destinations failed");
            Vec::new()
        })
    }

    pub async fn featured(&self) -> Vec<ActivityCard> {
        match self.api.featured_activities().await {
            Ok(items) => items.iter().map(ActivityCard::from).collect(),
            Err(e) => {
                error!(error = %e, "loading featured activities failed");
                Vec::new()
            }
        }
    }

    // Both sections load concurrently; either can come back empty on its own
    pub async fn home(&self) -> HomePage {
        let (featured, destinations) = futures::join!(self.featured(), self.destinations());
        HomePage {
            featured,
            destinations,
        }
    }

    // The detail page shows its own error message, so failures are returned
    pub async fn activity(&self, activity_id: &str) -> Result<ActivityDetails, ApiError> {
        self.api.activity_details(activity_id).await
    }
}
